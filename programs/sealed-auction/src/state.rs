//! Program state definitions

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};

use crate::error::AuctionError;

/// Smallest bid accepted, in lamports (0.01 SOL)
pub const MIN_BID: u64 = 10_000_000;

/// Seed for the treasury PDA
pub const TREASURY_SEED: &[u8] = b"treasury";

/// Seed prefix for bidder record PDAs, followed by the bidder's key
pub const BIDDER_SEED: &[u8] = b"bidder";

/// Leading byte of every program account, identifies the record type
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKey {
    Uninitialized,
    AuctionState,
    Treasury,
    BidderRecord,
}

/// Auction lifecycle, only ever moves forward
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionStage {
    /// Accepting bids until the deadline
    Bidding,
    /// Seller paid, losing bidders may refund
    Ended,
}

/// The auction singleton
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuctionState {
    pub key: AccountKey,
    /// Receives the winning bid
    pub seller: Pubkey,
    /// Bids are accepted strictly before this timestamp
    pub deadline: UnixTimestamp,
    pub stage: AuctionStage,
    /// Zero until the first accepted bid
    pub highest_bid: u64,
    /// Set iff `highest_bid > 0`
    pub highest_bidder: Option<Pubkey>,
}

impl AuctionState {
    /// Account size, `highest_bidder` counted as `Some`
    pub const LEN: usize = 1 + 32 + 8 + 1 + 8 + (1 + 32); // 83 bytes

    pub fn new(seller: Pubkey, deadline: UnixTimestamp) -> Self {
        Self {
            key: AccountKey::AuctionState,
            seller,
            deadline,
            stage: AuctionStage::Bidding,
            highest_bid: 0,
            highest_bidder: None,
        }
    }

    /// Validate a bid placed at `now`. The time window is checked before the
    /// amount, so a late bid reports `InvalidTime` whatever its size.
    pub fn check_bid(&self, amount: u64, now: UnixTimestamp) -> Result<(), AuctionError> {
        if self.stage != AuctionStage::Bidding || now >= self.deadline {
            return Err(AuctionError::InvalidTime);
        }
        if amount < MIN_BID {
            return Err(AuctionError::InvalidBid);
        }
        Ok(())
    }

    /// Track the bid if it beats the current high bid. Ties keep the earlier bidder.
    pub fn record_bid(&mut self, bidder: Pubkey, amount: u64) {
        if amount > self.highest_bid {
            self.highest_bid = amount;
            self.highest_bidder = Some(bidder);
        }
    }

    /// The auction can be closed once bidding is over
    pub fn check_end(&self, now: UnixTimestamp) -> Result<(), AuctionError> {
        if self.stage != AuctionStage::Bidding || now < self.deadline {
            return Err(AuctionError::InvalidTime);
        }
        Ok(())
    }

    pub fn is_winner(&self, bidder: &Pubkey) -> bool {
        self.highest_bidder.as_ref() == Some(bidder)
    }
}

/// Custody PDA; its lamports above the rent reserve are the escrowed bids
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Treasury {
    pub key: AccountKey,
    /// PDA bump seed
    pub bump: u8,
    /// Outstanding escrow, mirrors `lamports - reserve`
    pub escrowed: u64,
}

impl Treasury {
    /// Account size
    pub const LEN: usize = 1 + 1 + 8; // 10 bytes

    pub fn new(bump: u8) -> Self {
        Self {
            key: AccountKey::Treasury,
            bump,
            escrowed: 0,
        }
    }

    pub fn deposit(&mut self, amount: u64) -> Result<(), AuctionError> {
        self.escrowed = self
            .escrowed
            .checked_add(amount)
            .ok_or(AuctionError::MathOverflow)?;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: u64) -> Result<(), AuctionError> {
        self.escrowed = self
            .escrowed
            .checked_sub(amount)
            .ok_or(AuctionError::InvalidBalance)?;
        Ok(())
    }
}

/// Per-bidder escrow receipt
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BidderRecord {
    pub key: AccountKey,
    /// PDA bump seed
    pub bump: u8,
    pub bidder: Pubkey,
    /// Lamports held in the treasury for this bidder
    pub amount: u64,
}

impl BidderRecord {
    /// Account size
    pub const LEN: usize = 1 + 1 + 32 + 8; // 42 bytes

    pub fn new(bidder: Pubkey, amount: u64, bump: u8) -> Self {
        Self {
            key: AccountKey::BidderRecord,
            bump,
            bidder,
            amount,
        }
    }
}
