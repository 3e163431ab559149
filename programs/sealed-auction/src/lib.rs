//! Sealed-Time Escrow Auction Program
//!
//! Bidders lock lamports in a program-owned treasury until the deadline; the
//! seller then collects the highest bid and everyone else reclaims theirs.

pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod utils;

use solana_program::{
    account_info::AccountInfo, entrypoint, entrypoint::ProgramResult, pubkey::Pubkey,
};

#[cfg(not(feature = "no-entrypoint"))]
entrypoint!(process_instruction);

/// Program entrypoint
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::process_instruction(program_id, accounts, instruction_data)
}

solana_program::declare_id!("BCjaSZNmYT4J9MtPuxTdSfG8qmkBFDE8si2RH93t4YwA");
