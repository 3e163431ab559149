//! Program instructions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::utils::{find_bidder_record_address, find_treasury_address};

/// Auction program instructions
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum AuctionInstruction {
    /// Create the auction and its treasury
    /// Accounts:
    /// 0. `[writable, signer]` Auction state (fresh keypair)
    /// 1. `[writable, signer]` Seller
    /// 2. `[writable]` Treasury PDA
    /// 3. `[]` System program
    Initialize { deadline: UnixTimestamp },

    /// Escrow a bid in the treasury
    /// Accounts:
    /// 0. `[writable]` Auction state
    /// 1. `[writable, signer]` Bidder
    /// 2. `[writable]` Treasury PDA
    /// 3. `[writable]` Bidder record PDA
    /// 4. `[]` System program
    PlaceBid { amount: u64 },

    /// Close bidding and pay the highest bid to the seller
    /// Accounts:
    /// 0. `[writable]` Auction state
    /// 1. `[writable, signer]` Seller
    /// 2. `[writable]` Treasury PDA
    EndAuction,

    /// Return a losing bid and close its record
    /// Accounts:
    /// 0. `[writable]` Auction state
    /// 1. `[writable, signer]` Bidder
    /// 2. `[writable]` Treasury PDA
    /// 3. `[writable]` Bidder record PDA
    Refund,
}

/// Build an `Initialize` instruction
pub fn initialize(
    program_id: &Pubkey,
    state: &Pubkey,
    seller: &Pubkey,
    deadline: UnixTimestamp,
) -> Result<Instruction, ProgramError> {
    let (treasury, _) = find_treasury_address(program_id);
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*state, true),
            AccountMeta::new(*seller, true),
            AccountMeta::new(treasury, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: AuctionInstruction::Initialize { deadline }.try_to_vec()?,
    })
}

/// Build a `PlaceBid` instruction
pub fn place_bid(
    program_id: &Pubkey,
    state: &Pubkey,
    bidder: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (treasury, _) = find_treasury_address(program_id);
    let (record, _) = find_bidder_record_address(program_id, bidder);
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*state, false),
            AccountMeta::new(*bidder, true),
            AccountMeta::new(treasury, false),
            AccountMeta::new(record, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: AuctionInstruction::PlaceBid { amount }.try_to_vec()?,
    })
}

/// Build an `EndAuction` instruction
pub fn end_auction(
    program_id: &Pubkey,
    state: &Pubkey,
    seller: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (treasury, _) = find_treasury_address(program_id);
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*state, false),
            AccountMeta::new(*seller, true),
            AccountMeta::new(treasury, false),
        ],
        data: AuctionInstruction::EndAuction.try_to_vec()?,
    })
}

/// Build a `Refund` instruction
pub fn refund(
    program_id: &Pubkey,
    state: &Pubkey,
    bidder: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (treasury, _) = find_treasury_address(program_id);
    let (record, _) = find_bidder_record_address(program_id, bidder);
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*state, false),
            AccountMeta::new(*bidder, true),
            AccountMeta::new(treasury, false),
            AccountMeta::new(record, false),
        ],
        data: AuctionInstruction::Refund.try_to_vec()?,
    })
}
