//! Instruction definitions for the Pari-Mutuel Program

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::state::{Outcome, Side};

/// All instructions supported by the Pari-Mutuel Program
///
/// The leading borsh variant index is the instruction tag; new variants are
/// only ever appended.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub enum PariMutuelInstruction {
    /// Create the ProgramStats singleton; the signer becomes the global authority
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Authority (payer)
    /// 1. `[writable]` ProgramStats PDA
    /// 2. `[]` System Program
    InitializeProgram,

    /// Create a market, its vault and its metadata record (global authority only)
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Authority (payer)
    /// 1. `[writable]` ProgramStats PDA
    /// 2. `[writable]` Market PDA (["market", markets_created])
    /// 3. `[writable]` Vault PDA (["vault", market])
    /// 4. `[writable]` Metadata PDA (["metadata", market])
    /// 5. `[]` Staking token mint
    /// 6. `[]` Token Program
    /// 7. `[]` System Program
    CreateMarket(CreateMarketArgs),

    /// Move the betting cutoff (market authority only, while betting is open)
    ///
    /// Accounts:
    /// 0. `[signer]` Market authority
    /// 1. `[writable]` Market
    UpdateCutoff(UpdateCutoffArgs),

    /// Stake tokens on one side; fee stays in the vault, net goes to the pool
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Participant (pays position rent)
    /// 1. `[writable]` ProgramStats PDA
    /// 2. `[writable]` Market
    /// 3. `[writable]` Position PDA (["position", market, participant])
    /// 4. `[writable]` Participant's token account
    /// 5. `[writable]` Vault
    /// 6. `[]` Token Program
    /// 7. `[]` System Program
    PlaceBet(PlaceBetArgs),

    /// Resolve the market after cutoff (market authority only)
    ///
    /// Accounts:
    /// 0. `[signer]` Market authority
    /// 1. `[writable]` Market
    ResolveMarket(ResolveMarketArgs),

    /// Claim payout or refund for the signer's position
    ///
    /// Accounts:
    /// 0. `[signer]` Participant
    /// 1. `[writable]` Market
    /// 2. `[writable]` Position PDA
    /// 3. `[writable]` Participant's token account
    /// 4. `[writable]` Vault
    /// 5. `[]` Token Program
    ClaimWinnings,

    /// Toggle the pause flag (market authority only); gates betting only
    ///
    /// Accounts:
    /// 0. `[signer]` Market authority
    /// 1. `[writable]` Market
    EmergencyPause(EmergencyPauseArgs),

    /// Change the wallet credited with swept fees (market authority only)
    ///
    /// Accounts:
    /// 0. `[signer]` Market authority
    /// 1. `[writable]` Market
    UpdateFeeReceiver(UpdateFeeReceiverArgs),

    /// Move accrued fees from the vault to the fee receiver (market authority only).
    /// Succeeds without touching the destination when nothing has accrued.
    ///
    /// Accounts:
    /// 0. `[signer]` Market authority
    /// 1. `[writable]` Market
    /// 2. `[writable]` Vault
    /// 3. `[writable]` Fee receiver's associated token account
    /// 4. `[]` Token Program
    SweepFees,

    /// Advisory payout projection for a hypothetical stake; read-only.
    /// Result is returned as a borsh `PayoutQuote` via return data.
    ///
    /// Accounts:
    /// 0. `[]` Market
    QuotePayout(QuotePayoutArgs),
}

// ============================================================================
// Argument Structs
// ============================================================================

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct CreateMarketArgs {
    /// Question text (max 280 bytes)
    pub question: String,
    /// Category text (max 50 bytes)
    pub category: String,
    /// Betting cutoff (Unix timestamp)
    pub cutoff_time: i64,
    /// Fee override in basis points (default 300 = 3%, max 1000)
    pub fee_bps: Option<u16>,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct UpdateCutoffArgs {
    pub new_cutoff_time: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct PlaceBetArgs {
    pub side: Side,
    /// Gross amount in token base units, fee included
    pub amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct ResolveMarketArgs {
    pub outcome: Outcome,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct EmergencyPauseArgs {
    pub paused: bool,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct UpdateFeeReceiverArgs {
    pub new_receiver: Pubkey,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct QuotePayoutArgs {
    pub side: Side,
    pub stake: u64,
}
