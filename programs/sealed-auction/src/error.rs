//! Program errors

use solana_program::program_error::ProgramError;
use thiserror::Error;

/// First custom error code, `InvalidBid` is 6000 and `InvalidTime` 6001
pub const ERROR_CODE_OFFSET: u32 = 6000;

/// Auction program errors
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuctionError {
    #[error("Invalid bid")]
    InvalidBid,

    #[error("Invalid time")]
    InvalidTime,

    #[error("Invalid balance")]
    InvalidBalance,

    #[error("Invalid signer")]
    InvalidSigner,

    #[error("Bidder already placed a bid")]
    BidAlreadyPlaced,

    #[error("Math overflow")]
    MathOverflow,

    #[error("Invalid instruction data")]
    InvalidInstructionData,
}

impl AuctionError {
    /// Code reported to the caller as `ProgramError::Custom`
    pub fn code(self) -> u32 {
        ERROR_CODE_OFFSET + self as u32
    }
}

impl From<AuctionError> for ProgramError {
    fn from(e: AuctionError) -> Self {
        ProgramError::Custom(e.code())
    }
}
