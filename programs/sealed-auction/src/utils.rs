//! Address derivation and account validation helpers

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction, system_program,
    sysvar::Sysvar,
};

use crate::{
    error::AuctionError,
    state::{AccountKey, BIDDER_SEED, TREASURY_SEED},
};

/// Treasury PDA and its bump
pub fn find_treasury_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[TREASURY_SEED], program_id)
}

/// Bidder record PDA and its bump
pub fn find_bidder_record_address(program_id: &Pubkey, bidder: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BIDDER_SEED, bidder.as_ref()], program_id)
}

pub fn assert_signer(account_info: &AccountInfo) -> ProgramResult {
    if !account_info.is_signer {
        msg!("Missing signature for {}", account_info.key);
        return Err(ProgramError::MissingRequiredSignature);
    }
    Ok(())
}

pub fn assert_owned_by(account_info: &AccountInfo, owner: &Pubkey) -> ProgramResult {
    if account_info.owner != owner {
        msg!("Account {} has the wrong owner", account_info.key);
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

/// Check that `account_info` sits at `expected` and return `bump` for re-signing
pub fn assert_derivation(
    account_info: &AccountInfo,
    (expected, bump): (Pubkey, u8),
) -> Result<u8, ProgramError> {
    if *account_info.key != expected {
        msg!("Derived address mismatch for {}", account_info.key);
        return Err(ProgramError::InvalidSeeds);
    }
    Ok(bump)
}

pub fn assert_system_program(account_info: &AccountInfo) -> ProgramResult {
    if !system_program::check_id(account_info.key) {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

/// An unused slot is still owned by the system program and holds no data
pub fn is_uninitialized(account_info: &AccountInfo) -> bool {
    system_program::check_id(account_info.owner) && account_info.data_is_empty()
}

pub fn assert_uninitialized(account_info: &AccountInfo) -> ProgramResult {
    if !is_uninitialized(account_info) {
        msg!("Account {} is already in use", account_info.key);
        return Err(ProgramError::AccountAlreadyInitialized);
    }
    Ok(())
}

/// Deserialize a program account after checking its owner and leading key byte
pub fn load_account<T: BorshDeserialize>(
    account_info: &AccountInfo,
    program_id: &Pubkey,
    key: AccountKey,
) -> Result<T, ProgramError> {
    assert_owned_by(account_info, program_id)?;
    let data = account_info.data.borrow();
    match AccountKey::deserialize(&mut &data[..]) {
        Ok(found) if found == key => {}
        Ok(AccountKey::Uninitialized) | Err(_) => return Err(ProgramError::UninitializedAccount),
        Ok(_) => return Err(ProgramError::InvalidAccountData),
    }
    Ok(T::deserialize(&mut &data[..])?)
}

pub fn save_account<T: BorshSerialize>(account_info: &AccountInfo, value: &T) -> ProgramResult {
    value.serialize(&mut &mut account_info.data.borrow_mut()[..])?;
    Ok(())
}

/// Fund, allocate and assign a new program account. Tolerates lamports that
/// were sent to the address ahead of time, which `create_account` rejects.
pub fn create_program_account<'a>(
    program_id: &Pubkey,
    new_account_info: &AccountInfo<'a>,
    payer_info: &AccountInfo<'a>,
    system_program_info: &AccountInfo<'a>,
    size: usize,
    signer_seeds: &[&[&[u8]]],
) -> ProgramResult {
    let rent = Rent::get()?;
    let required_lamports = rent
        .minimum_balance(size)
        .max(1)
        .saturating_sub(new_account_info.lamports());

    if required_lamports > 0 {
        invoke(
            &system_instruction::transfer(payer_info.key, new_account_info.key, required_lamports),
            &[
                payer_info.clone(),
                new_account_info.clone(),
                system_program_info.clone(),
            ],
        )?;
    }

    invoke_signed(
        &system_instruction::allocate(new_account_info.key, size as u64),
        &[new_account_info.clone(), system_program_info.clone()],
        signer_seeds,
    )?;

    invoke_signed(
        &system_instruction::assign(new_account_info.key, program_id),
        &[new_account_info.clone(), system_program_info.clone()],
        signer_seeds,
    )?;

    Ok(())
}

/// Lamports held above the rent-exempt minimum
pub fn spendable_lamports(account_info: &AccountInfo, size: usize) -> Result<u64, ProgramError> {
    let reserve = Rent::get()?.minimum_balance(size);
    Ok(account_info.lamports().saturating_sub(reserve))
}

/// Move lamports out of an account owned by this program
pub fn transfer_lamports(from: &AccountInfo, to: &AccountInfo, amount: u64) -> ProgramResult {
    let from_balance = from
        .lamports()
        .checked_sub(amount)
        .ok_or(AuctionError::InvalidBalance)?;
    let to_balance = to
        .lamports()
        .checked_add(amount)
        .ok_or(AuctionError::MathOverflow)?;
    **from.try_borrow_mut_lamports()? = from_balance;
    **to.try_borrow_mut_lamports()? = to_balance;
    Ok(())
}

/// Drain a program account into `destination` and wipe its data
pub fn close_account(account_info: &AccountInfo, destination: &AccountInfo) -> ProgramResult {
    transfer_lamports(account_info, destination, account_info.lamports())?;
    account_info.data.borrow_mut().fill(0);
    Ok(())
}
