//! Pari-Mutuel Prediction Market Program
//!
//! Binary (YES/NO) pari-mutuel markets settled on Solana.
//!
//! ## Architecture
//!
//! - `Market`: per-question pools, cutoff, resolution and fee configuration
//! - `Vault`: SPL token account per market, token authority = Market PDA
//! - `Position`: one record per (market, participant)
//! - `ProgramStats`: global singleton with aggregate counters
//!
//! ## Key Features
//!
//! - Fee skimmed at bet time, left in the vault until swept
//! - Winners split the combined net pool pro rata
//! - Void and one-sided markets refund net stakes
//! - Per-market pause, cutoff extension and fee receiver rotation

pub mod error;
pub mod instruction;
pub mod math;
pub mod processor;
pub mod state;
pub mod utils;
pub mod cpi;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

// Re-export commonly used items
pub use error::PariMutuelError;
pub use instruction::PariMutuelInstruction;
pub use state::*;

// Program ID - will be updated after deployment
solana_program::declare_id!("PariMutue1111111111111111111111111111111111");
