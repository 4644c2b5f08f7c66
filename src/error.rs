//! Error types for the Pari-Mutuel Program

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the Pari-Mutuel Program
#[derive(Clone, Copy, Debug, Eq, Error, FromPrimitive, PartialEq)]
pub enum PariMutuelError {
    // === General Errors (0-99) ===

    #[error("Invalid instruction")]
    InvalidInstruction = 0,

    #[error("Invalid account data")]
    InvalidAccountData = 1,

    #[error("Account not initialized")]
    AccountNotInitialized = 2,

    #[error("Already initialized")]
    AlreadyInitialized = 3,

    #[error("Invalid program address")]
    InvalidProgramAddress = 4,

    #[error("Invalid signer")]
    InvalidSigner = 5,

    #[error("Unauthorized")]
    Unauthorized = 6,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 7,

    #[error("Account not owned by this program")]
    InvalidAccountOwner = 8,

    #[error("Invalid PDA")]
    InvalidPDA = 9,

    // === Market Errors (100-199) ===

    #[error("Question too long")]
    QuestionTooLong = 100,

    #[error("Category too long")]
    CategoryTooLong = 101,

    #[error("Invalid cutoff time")]
    InvalidCutoff = 102,

    #[error("Market already resolved")]
    AlreadyResolved = 103,

    #[error("Betting is closed")]
    BettingClosed = 104,

    #[error("Market is paused")]
    MarketPaused = 105,

    #[error("Betting still open")]
    BettingStillOpen = 106,

    #[error("Market not resolved")]
    NotResolved = 107,

    #[error("Fee too high")]
    FeeTooHigh = 108,

    // === Bet / Position Errors (200-299) ===

    #[error("Bet amount below minimum")]
    AmountTooSmall = 200,

    #[error("Position exceeds bet limit")]
    BetLimitExceeded = 201,

    #[error("Cannot bet on the opposite side")]
    SideMismatch = 202,

    #[error("No position in this market")]
    NoPosition = 203,

    #[error("Position already claimed")]
    AlreadyClaimed = 204,

    // === Token / Custody Errors (300-399) ===

    #[error("Invalid token mint")]
    InvalidTokenMint = 300,

    #[error("Invalid token account")]
    InvalidTokenAccount = 301,

    #[error("Invalid market vault")]
    InvalidMarketVault = 302,

    #[error("Invalid fee receiver account")]
    InvalidFeeReceiver = 303,

    #[error("Vault balance below outstanding principal")]
    InsufficientVaultBalance = 304,
}

impl PariMutuelError {
    /// Map a `ProgramError::Custom` code back to the typed error
    pub fn from_code(code: u32) -> Option<Self> {
        Self::from_u32(code)
    }
}

impl From<PariMutuelError> for ProgramError {
    fn from(e: PariMutuelError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for PariMutuelError {
    fn type_of() -> &'static str {
        "PariMutuelError"
    }
}
