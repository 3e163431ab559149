//! Instruction processor

use borsh::BorshDeserialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::{Clock, UnixTimestamp},
    entrypoint::ProgramResult,
    msg,
    program::invoke,
    pubkey::Pubkey,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    error::AuctionError,
    instruction::AuctionInstruction,
    state::{
        AccountKey, AuctionStage, AuctionState, BidderRecord, Treasury, BIDDER_SEED,
        TREASURY_SEED,
    },
    utils::{
        assert_derivation, assert_signer, assert_system_program, assert_uninitialized,
        close_account, create_program_account, find_bidder_record_address,
        find_treasury_address, is_uninitialized, load_account, save_account,
        spendable_lamports, transfer_lamports,
    },
};

/// Process program instruction
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = AuctionInstruction::try_from_slice(instruction_data)
        .map_err(|_| AuctionError::InvalidInstructionData)?;

    match instruction {
        AuctionInstruction::Initialize { deadline } => {
            process_initialize(program_id, accounts, deadline)
        }
        AuctionInstruction::PlaceBid { amount } => process_place_bid(program_id, accounts, amount),
        AuctionInstruction::EndAuction => process_end_auction(program_id, accounts),
        AuctionInstruction::Refund => process_refund(program_id, accounts),
    }
}

/// Create the auction state and the treasury
fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    deadline: UnixTimestamp,
) -> ProgramResult {
    let account_iter = &mut accounts.iter();
    let state_account = next_account_info(account_iter)?;
    let seller = next_account_info(account_iter)?;
    let treasury_account = next_account_info(account_iter)?;
    let system_program = next_account_info(account_iter)?;

    assert_signer(seller)?;
    assert_signer(state_account)?;
    assert_system_program(system_program)?;
    assert_uninitialized(state_account)?;

    let treasury_bump = assert_derivation(treasury_account, find_treasury_address(program_id))?;
    assert_uninitialized(treasury_account)?;

    let clock = Clock::get()?;
    if deadline <= clock.unix_timestamp {
        return Err(AuctionError::InvalidTime.into());
    }

    create_program_account(
        program_id,
        state_account,
        seller,
        system_program,
        AuctionState::LEN,
        &[],
    )?;
    create_program_account(
        program_id,
        treasury_account,
        seller,
        system_program,
        Treasury::LEN,
        &[&[TREASURY_SEED, &[treasury_bump]]],
    )?;

    save_account(state_account, &AuctionState::new(*seller.key, deadline))?;
    save_account(treasury_account, &Treasury::new(treasury_bump))?;

    msg!("Auction initialized by {}, deadline {}", seller.key, deadline);
    Ok(())
}

/// Escrow a bid and track the high bid
fn process_place_bid(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
    let account_iter = &mut accounts.iter();
    let state_account = next_account_info(account_iter)?;
    let bidder = next_account_info(account_iter)?;
    let treasury_account = next_account_info(account_iter)?;
    let record_account = next_account_info(account_iter)?;
    let system_program = next_account_info(account_iter)?;

    assert_signer(bidder)?;
    assert_system_program(system_program)?;

    let mut state: AuctionState =
        load_account(state_account, program_id, AccountKey::AuctionState)?;
    assert_derivation(treasury_account, find_treasury_address(program_id))?;
    let mut treasury: Treasury = load_account(treasury_account, program_id, AccountKey::Treasury)?;
    let record_bump = assert_derivation(
        record_account,
        find_bidder_record_address(program_id, bidder.key),
    )?;

    let clock = Clock::get()?;
    state.check_bid(amount, clock.unix_timestamp)?;

    if !is_uninitialized(record_account) {
        return Err(AuctionError::BidAlreadyPlaced.into());
    }

    invoke(
        &system_instruction::transfer(bidder.key, treasury_account.key, amount),
        &[
            bidder.clone(),
            treasury_account.clone(),
            system_program.clone(),
        ],
    )?;

    create_program_account(
        program_id,
        record_account,
        bidder,
        system_program,
        BidderRecord::LEN,
        &[&[BIDDER_SEED, bidder.key.as_ref(), &[record_bump]]],
    )?;
    save_account(
        record_account,
        &BidderRecord::new(*bidder.key, amount, record_bump),
    )?;

    treasury.deposit(amount)?;
    save_account(treasury_account, &treasury)?;

    state.record_bid(*bidder.key, amount);
    save_account(state_account, &state)?;

    msg!("Bid {} placed by {}", amount, bidder.key);
    Ok(())
}

/// Pay the highest bid to the seller and close bidding
fn process_end_auction(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_iter = &mut accounts.iter();
    let state_account = next_account_info(account_iter)?;
    let seller = next_account_info(account_iter)?;
    let treasury_account = next_account_info(account_iter)?;

    assert_signer(seller)?;

    let mut state: AuctionState =
        load_account(state_account, program_id, AccountKey::AuctionState)?;
    if state.seller != *seller.key {
        return Err(AuctionError::InvalidSigner.into());
    }

    assert_derivation(treasury_account, find_treasury_address(program_id))?;
    let mut treasury: Treasury = load_account(treasury_account, program_id, AccountKey::Treasury)?;

    let clock = Clock::get()?;
    state.check_end(clock.unix_timestamp)?;

    let payout = state.highest_bid;
    if spendable_lamports(treasury_account, Treasury::LEN)? < payout {
        return Err(AuctionError::InvalidBalance.into());
    }

    treasury.withdraw(payout)?;
    transfer_lamports(treasury_account, seller, payout)?;
    save_account(treasury_account, &treasury)?;

    state.stage = AuctionStage::Ended;
    save_account(state_account, &state)?;

    msg!("Auction ended, paid {} to {}", payout, seller.key);
    Ok(())
}

/// Return a losing bid to its bidder
fn process_refund(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let account_iter = &mut accounts.iter();
    let state_account = next_account_info(account_iter)?;
    let bidder = next_account_info(account_iter)?;
    let treasury_account = next_account_info(account_iter)?;
    let record_account = next_account_info(account_iter)?;

    assert_signer(bidder)?;

    let state: AuctionState = load_account(state_account, program_id, AccountKey::AuctionState)?;
    assert_derivation(treasury_account, find_treasury_address(program_id))?;
    let mut treasury: Treasury = load_account(treasury_account, program_id, AccountKey::Treasury)?;
    assert_derivation(
        record_account,
        find_bidder_record_address(program_id, bidder.key),
    )?;

    if state.stage != AuctionStage::Ended {
        return Err(AuctionError::InvalidTime.into());
    }

    let record: BidderRecord = load_account(record_account, program_id, AccountKey::BidderRecord)?;
    if record.bidder != *bidder.key || state.is_winner(bidder.key) {
        return Err(AuctionError::InvalidSigner.into());
    }
    if record.amount == 0 {
        return Err(AuctionError::InvalidBid.into());
    }

    treasury.withdraw(record.amount)?;
    transfer_lamports(treasury_account, bidder, record.amount)?;
    save_account(treasury_account, &treasury)?;

    // The record's rent goes back to the bidder along with the bid.
    close_account(record_account, bidder)?;

    msg!("Refunded {} to {}", record.amount, bidder.key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use borsh::{BorshDeserialize, BorshSerialize};
    use solana_program::{
        account_info::AccountInfo, program_error::ProgramError, pubkey::Pubkey,
    };

    use crate::{
        error::AuctionError,
        instruction::AuctionInstruction,
        state::{AccountKey, AuctionStage, AuctionState, BidderRecord, Treasury, MIN_BID},
        utils::{close_account, load_account, save_account, transfer_lamports},
    };

    const DEADLINE: i64 = 1_700_000_000;

    #[test]
    fn test_check_bid_order() {
        let state = AuctionState::new(Pubkey::new_unique(), DEADLINE);

        assert_eq!(state.check_bid(MIN_BID, DEADLINE - 1), Ok(()));
        assert_eq!(
            state.check_bid(MIN_BID - 1, DEADLINE - 1),
            Err(AuctionError::InvalidBid)
        );

        // Late bids report the time window even when the amount is also bad
        assert_eq!(state.check_bid(MIN_BID, DEADLINE), Err(AuctionError::InvalidTime));
        assert_eq!(state.check_bid(1, DEADLINE + 10), Err(AuctionError::InvalidTime));

        let mut ended = state.clone();
        ended.stage = AuctionStage::Ended;
        assert_eq!(ended.check_bid(MIN_BID, DEADLINE - 1), Err(AuctionError::InvalidTime));
    }

    #[test]
    fn test_record_bid_tracks_maximum() {
        let mut state = AuctionState::new(Pubkey::new_unique(), DEADLINE);
        let (a, b, c) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());

        assert_eq!(state.highest_bidder, None);

        state.record_bid(a, 100_000_000);
        state.record_bid(b, 500_000_000);
        state.record_bid(c, 200_000_000);
        assert_eq!(state.highest_bid, 500_000_000);
        assert_eq!(state.highest_bidder, Some(b));
        assert!(state.is_winner(&b));
        assert!(!state.is_winner(&a));

        // Equal bid does not displace the earlier bidder
        state.record_bid(c, 500_000_000);
        assert_eq!(state.highest_bidder, Some(b));
    }

    #[test]
    fn test_check_end() {
        let mut state = AuctionState::new(Pubkey::new_unique(), DEADLINE);

        assert_eq!(state.check_end(DEADLINE - 1), Err(AuctionError::InvalidTime));
        assert_eq!(state.check_end(DEADLINE), Ok(()));

        state.stage = AuctionStage::Ended;
        assert_eq!(state.check_end(DEADLINE + 1), Err(AuctionError::InvalidTime));
    }

    #[test]
    fn test_treasury_ledger() {
        let mut treasury = Treasury::new(254);

        treasury.deposit(100).unwrap();
        treasury.deposit(50).unwrap();
        assert_eq!(treasury.escrowed, 150);

        treasury.withdraw(120).unwrap();
        assert_eq!(treasury.escrowed, 30);
        assert_eq!(treasury.withdraw(31), Err(AuctionError::InvalidBalance));

        treasury.escrowed = u64::MAX;
        assert_eq!(treasury.deposit(1), Err(AuctionError::MathOverflow));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AuctionError::InvalidBid.code(), 6000);
        assert_eq!(AuctionError::InvalidTime.code(), 6001);
        assert_eq!(
            ProgramError::from(AuctionError::InvalidTime),
            ProgramError::Custom(6001)
        );
        assert_eq!(AuctionError::InvalidBid.to_string(), "Invalid bid");
    }

    #[test]
    fn test_account_sizes() {
        let mut state = AuctionState::new(Pubkey::new_unique(), DEADLINE);
        state.record_bid(Pubkey::new_unique(), MIN_BID);
        assert_eq!(state.try_to_vec().unwrap().len(), AuctionState::LEN);
        assert_eq!(Treasury::new(1).try_to_vec().unwrap().len(), Treasury::LEN);
        assert_eq!(
            BidderRecord::new(Pubkey::new_unique(), MIN_BID, 1)
                .try_to_vec()
                .unwrap()
                .len(),
            BidderRecord::LEN
        );
    }

    #[test]
    fn test_instruction_data() {
        let data = AuctionInstruction::PlaceBid { amount: MIN_BID }
            .try_to_vec()
            .unwrap();
        assert_eq!(data[0], 1);
        assert_eq!(
            AuctionInstruction::try_from_slice(&data).unwrap(),
            AuctionInstruction::PlaceBid { amount: MIN_BID }
        );

        let err = super::process_instruction(&crate::id(), &[], &[9]).unwrap_err();
        assert_eq!(err, ProgramError::from(AuctionError::InvalidInstructionData));
    }

    #[test]
    fn test_load_account_checks_owner_and_key() {
        let program_id = crate::id();
        let key = Pubkey::new_unique();
        let mut lamports = 1_000_000;
        let mut data = vec![0u8; AuctionState::LEN];
        let info = AccountInfo::new(
            &key, false, true, &mut lamports, &mut data, &program_id, false, 0,
        );

        // Zeroed data reads as an unused slot
        assert_eq!(
            load_account::<AuctionState>(&info, &program_id, AccountKey::AuctionState),
            Err(ProgramError::UninitializedAccount)
        );

        let state = AuctionState::new(Pubkey::new_unique(), DEADLINE);
        save_account(&info, &state).unwrap();
        assert_eq!(
            load_account::<AuctionState>(&info, &program_id, AccountKey::AuctionState),
            Ok(state)
        );
        assert_eq!(
            load_account::<Treasury>(&info, &program_id, AccountKey::Treasury),
            Err(ProgramError::InvalidAccountData)
        );
        assert_eq!(
            load_account::<AuctionState>(&info, &Pubkey::new_unique(), AccountKey::AuctionState),
            Err(ProgramError::IncorrectProgramId)
        );
    }

    #[test]
    fn test_lamport_moves() {
        let program_id = crate::id();
        let (from_key, to_key) = (Pubkey::new_unique(), Pubkey::new_unique());
        let (mut from_lamports, mut to_lamports) = (500, 10);
        let mut from_data = vec![7u8; BidderRecord::LEN];
        let mut to_data: Vec<u8> = vec![];
        let from = AccountInfo::new(
            &from_key, false, true, &mut from_lamports, &mut from_data, &program_id, false, 0,
        );
        let to = AccountInfo::new(
            &to_key, true, true, &mut to_lamports, &mut to_data, &program_id, false, 0,
        );

        transfer_lamports(&from, &to, 200).unwrap();
        assert_eq!((from.lamports(), to.lamports()), (300, 210));
        assert_eq!(
            transfer_lamports(&from, &to, 301),
            Err(ProgramError::from(AuctionError::InvalidBalance))
        );

        close_account(&from, &to).unwrap();
        assert_eq!((from.lamports(), to.lamports()), (0, 510));
        assert!(from.data.borrow().iter().all(|b| *b == 0));
    }
}
