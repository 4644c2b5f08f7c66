//! State definitions for the Pari-Mutuel Program
//!
//! All account structures used by the program.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    entrypoint::ProgramResult, msg, program_error::ProgramError, pubkey::Pubkey,
};

use crate::error::PariMutuelError;
use crate::utils::{deserialize_account, safe_add_u64, safe_sub_u64};

// ============================================================================
// Discriminators
// ============================================================================

pub const PROGRAM_STATS_DISCRIMINATOR: u64 = 0x504D5F5354415453; // "PM_STATS"
pub const MARKET_DISCRIMINATOR: u64 = 0x4D41524B45545F5F; // "MARKET__"
pub const POSITION_DISCRIMINATOR: u64 = 0x504F534954494F4E; // "POSITION"
pub const MARKET_METADATA_DISCRIMINATOR: u64 = 0x4D4B545F4D455441; // "MKT_META"

// ============================================================================
// PDA Seeds
// ============================================================================

pub const PROGRAM_STATS_SEED: &[u8] = b"program_stats";
pub const MARKET_SEED: &[u8] = b"market";
pub const VAULT_SEED: &[u8] = b"vault";
pub const METADATA_SEED: &[u8] = b"metadata";
pub const POSITION_SEED: &[u8] = b"position";

// ============================================================================
// Constants
// ============================================================================

/// Maximum length of market question (bytes)
pub const MAX_QUESTION_LEN: usize = 280;

/// Maximum length of market category (bytes)
pub const MAX_CATEGORY_LEN: usize = 50;

/// Maximum distance between market creation and cutoff (365 days)
pub const MAX_MARKET_DURATION: i64 = 365 * 24 * 60 * 60;

/// Basis point denominator (100%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Fee applied when a market does not override it (3%)
pub const DEFAULT_FEE_BPS: u16 = 300;

/// Upper bound for per-market fee overrides (10%)
pub const MAX_FEE_BPS: u16 = 1_000;

/// Smallest accepted bet, in token base units
pub const MIN_BET_AMOUNT: u64 = 1_000;

/// Per-position cap in whole tokens; scaled by mint decimals at market creation
pub const MAX_BET_TOKENS: u64 = 100;

/// Fixed-point precision of payout multipliers (1.0 = 1_000_000)
pub const MULTIPLIER_PRECISION: u64 = 1_000_000;

// ============================================================================
// Enums
// ============================================================================

/// Side a participant backs
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Yes = 0,
    No = 1,
}

/// Resolution outcome supplied by the market authority
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Yes = 0,
    No = 1,
    /// No side wins, all net stakes are refunded
    Void = 2,
}

/// Payout basis fixed once at resolution
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Winners split both pools pro rata
    Winner(Side),
    /// Every position gets its net stake back
    Refund,
}

// ============================================================================
// Record tagging
// ============================================================================

/// A program-owned record with a leading type tag
pub trait Record: BorshSerialize + BorshDeserialize {
    const DISCRIMINATOR: u64;
    /// Allocated account size (max serialized size plus reserved bytes)
    const SIZE: usize;

    fn discriminator(&self) -> u64;

    /// Deserialize and verify the type tag
    fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let record = deserialize_account::<Self>(data)?;
        if record.discriminator() != Self::DISCRIMINATOR {
            msg!("Error: Invalid record discriminator");
            return Err(PariMutuelError::InvalidAccountData.into());
        }
        Ok(record)
    }
}

/// Any record this program persists, keyed by its type tag
#[derive(Debug, Clone)]
pub enum AnyRecord {
    ProgramStats(ProgramStats),
    Market(Market),
    Position(Position),
    MarketMetadata(MarketMetadata),
}

impl AnyRecord {
    /// Decode raw account data by reading its type tag first
    pub fn decode(data: &[u8]) -> Result<Self, ProgramError> {
        if data.len() < 8 {
            return Err(PariMutuelError::AccountNotInitialized.into());
        }
        let mut tag = [0u8; 8];
        tag.copy_from_slice(&data[..8]);
        match u64::from_le_bytes(tag) {
            PROGRAM_STATS_DISCRIMINATOR => Ok(AnyRecord::ProgramStats(ProgramStats::load(data)?)),
            MARKET_DISCRIMINATOR => Ok(AnyRecord::Market(Market::load(data)?)),
            POSITION_DISCRIMINATOR => Ok(AnyRecord::Position(Position::load(data)?)),
            MARKET_METADATA_DISCRIMINATOR => {
                Ok(AnyRecord::MarketMetadata(MarketMetadata::load(data)?))
            }
            _ => Err(PariMutuelError::InvalidAccountData.into()),
        }
    }
}

// ============================================================================
// Account Structures
// ============================================================================

/// Global aggregate counters
///
/// PDA Seeds: ["program_stats"]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct ProgramStats {
    /// Account discriminator
    pub discriminator: u64,

    /// Global authority (allowed to create markets)
    pub authority: Pubkey,

    /// Markets created so far (also the next market id)
    pub markets_created: u64,

    /// Gross amount staked across all markets
    pub total_volume: u64,

    /// Fees skimmed across all markets
    pub total_fees: u64,

    /// Positions opened across all markets
    pub unique_participants: u64,

    /// PDA bump
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 32],
}

impl Record for ProgramStats {
    const DISCRIMINATOR: u64 = PROGRAM_STATS_DISCRIMINATOR;
    const SIZE: usize = 8   // discriminator
        + 32  // authority
        + 8   // markets_created
        + 8   // total_volume
        + 8   // total_fees
        + 8   // unique_participants
        + 1   // bump
        + 32; // reserved

    fn discriminator(&self) -> u64 {
        self.discriminator
    }
}

impl ProgramStats {
    pub fn new(authority: Pubkey, bump: u8) -> Self {
        Self {
            discriminator: PROGRAM_STATS_DISCRIMINATOR,
            authority,
            markets_created: 0,
            total_volume: 0,
            total_fees: 0,
            unique_participants: 0,
            bump,
            reserved: [0u8; 32],
        }
    }

    pub fn find_address(program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[PROGRAM_STATS_SEED], program_id)
    }

    pub fn check_authority(&self, signer: &Pubkey) -> ProgramResult {
        if self.authority != *signer {
            msg!("Error: {} is not the global authority", signer);
            return Err(PariMutuelError::Unauthorized.into());
        }
        Ok(())
    }

    /// Returns the id assigned to the new market
    pub fn record_market(&mut self) -> Result<u64, ProgramError> {
        let market_id = self.markets_created;
        self.markets_created = safe_add_u64(self.markets_created, 1)?;
        Ok(market_id)
    }

    pub fn record_bet(&mut self, amount: u64, fee: u64, new_participant: bool) -> ProgramResult {
        self.total_volume = safe_add_u64(self.total_volume, amount)?;
        self.total_fees = safe_add_u64(self.total_fees, fee)?;
        if new_participant {
            self.unique_participants = safe_add_u64(self.unique_participants, 1)?;
        }
        Ok(())
    }
}

/// A single YES/NO pari-mutuel market
///
/// PDA Seeds: ["market", market_id.to_le_bytes()]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct Market {
    /// Account discriminator
    pub discriminator: u64,

    /// Sequential market id
    pub market_id: u64,

    /// Creates, resolves, pauses and reconfigures this market
    pub authority: Pubkey,

    /// Wallet credited with swept fees
    pub fee_receiver: Pubkey,

    /// SPL mint accepted for staking
    pub token_mint: Pubkey,

    /// Custody token account (PDA, token authority = this market)
    pub vault: Pubkey,

    /// Question/category record (PDA)
    pub metadata: Pubkey,

    /// Creation timestamp, anchors the maximum duration
    pub created_at: i64,

    /// Bets are rejected at or after this timestamp
    pub cutoff_time: i64,

    /// Net staked on YES
    pub pool_yes: u64,

    /// Net staked on NO
    pub pool_no: u64,

    pub resolved: bool,

    /// Set together with `resolved`
    pub outcome: Option<Outcome>,

    /// Payout basis, set together with `resolved`
    pub settlement: Option<Settlement>,

    /// Gates new bets only
    pub paused: bool,

    /// Fee rate applied at bet time
    pub fee_bps: u16,

    /// Per-position cap on net stake (base units)
    pub max_stake: u64,

    /// Fees skimmed from bets on this market
    pub fees_collected: u64,

    /// Payouts and refunds released from the vault
    pub total_paid_out: u64,

    /// Fees moved to the fee receiver
    pub total_swept: u64,

    /// Market PDA bump
    pub bump: u8,

    /// Vault PDA bump
    pub vault_bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 32],
}

impl Record for Market {
    const DISCRIMINATOR: u64 = MARKET_DISCRIMINATOR;
    const SIZE: usize = 8   // discriminator
        + 8   // market_id
        + 32  // authority
        + 32  // fee_receiver
        + 32  // token_mint
        + 32  // vault
        + 32  // metadata
        + 8   // created_at
        + 8   // cutoff_time
        + 8   // pool_yes
        + 8   // pool_no
        + 1   // resolved
        + 2   // outcome (Option<Outcome>)
        + 3   // settlement (Option<Settlement>)
        + 1   // paused
        + 2   // fee_bps
        + 8   // max_stake
        + 8   // fees_collected
        + 8   // total_paid_out
        + 8   // total_swept
        + 1   // bump
        + 1   // vault_bump
        + 32; // reserved

    fn discriminator(&self) -> u64 {
        self.discriminator
    }
}

impl Market {
    pub fn find_address(market_id: u64, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[MARKET_SEED, &market_id.to_le_bytes()], program_id)
    }

    pub fn find_vault_address(market: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[VAULT_SEED, market.as_ref()], program_id)
    }

    pub fn find_metadata_address(market: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[METADATA_SEED, market.as_ref()], program_id)
    }

    pub fn check_authority(&self, signer: &Pubkey) -> ProgramResult {
        if self.authority != *signer {
            msg!("Error: {} is not the market authority", signer);
            return Err(PariMutuelError::Unauthorized.into());
        }
        Ok(())
    }

    pub fn check_not_resolved(&self) -> ProgramResult {
        if self.resolved {
            msg!("Error: Market {} already resolved", self.market_id);
            return Err(PariMutuelError::AlreadyResolved.into());
        }
        Ok(())
    }

    /// Gate for `PlaceBet`
    pub fn check_accepting_bets(&self, current_time: i64) -> ProgramResult {
        if self.paused {
            msg!("Error: Market {} is paused", self.market_id);
            return Err(PariMutuelError::MarketPaused.into());
        }
        self.check_not_resolved()?;
        if current_time >= self.cutoff_time {
            msg!("Error: Betting closed at {} (now {})", self.cutoff_time, current_time);
            return Err(PariMutuelError::BettingClosed.into());
        }
        Ok(())
    }

    /// Gate for `ResolveMarket`
    pub fn check_resolvable(&self, current_time: i64) -> ProgramResult {
        self.check_not_resolved()?;
        if current_time < self.cutoff_time {
            msg!("Error: Betting open until {} (now {})", self.cutoff_time, current_time);
            return Err(PariMutuelError::BettingStillOpen.into());
        }
        Ok(())
    }

    pub fn credit_pool(&mut self, side: Side, net: u64) -> ProgramResult {
        match side {
            Side::Yes => self.pool_yes = safe_add_u64(self.pool_yes, net)?,
            Side::No => self.pool_no = safe_add_u64(self.pool_no, net)?,
        }
        Ok(())
    }

    pub fn total_pool(&self) -> Result<u64, ProgramError> {
        safe_add_u64(self.pool_yes, self.pool_no)
    }

    /// Principal the vault still owes to participants
    pub fn outstanding_principal(&self) -> Result<u64, ProgramError> {
        safe_sub_u64(self.total_pool()?, self.total_paid_out)
    }

    /// One-way transition to resolved; fixes the payout basis
    pub fn resolve(&mut self, outcome: Outcome) {
        let settlement = match outcome {
            Outcome::Void => Settlement::Refund,
            _ if self.pool_yes == 0 || self.pool_no == 0 => Settlement::Refund,
            Outcome::Yes => Settlement::Winner(Side::Yes),
            Outcome::No => Settlement::Winner(Side::No),
        };
        self.resolved = true;
        self.outcome = Some(outcome);
        self.settlement = Some(settlement);
    }
}

/// One participant's stake in one market
///
/// PDA Seeds: ["position", market, owner]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct Position {
    /// Account discriminator
    pub discriminator: u64,

    /// Market this position belongs to
    pub market: Pubkey,

    /// Participant wallet
    pub owner: Pubkey,

    /// Fixed at first stake
    pub side: Side,

    /// Cumulative net stake
    pub staked: u64,

    pub claimed: bool,

    pub created_at: i64,

    pub updated_at: i64,

    /// PDA bump
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 16],
}

impl Record for Position {
    const DISCRIMINATOR: u64 = POSITION_DISCRIMINATOR;
    const SIZE: usize = 8   // discriminator
        + 32  // market
        + 32  // owner
        + 1   // side
        + 8   // staked
        + 1   // claimed
        + 8   // created_at
        + 8   // updated_at
        + 1   // bump
        + 16; // reserved

    fn discriminator(&self) -> u64 {
        self.discriminator
    }
}

impl Position {
    pub fn find_address(market: &Pubkey, owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[POSITION_SEED, market.as_ref(), owner.as_ref()], program_id)
    }

    pub fn new(market: Pubkey, owner: Pubkey, side: Side, bump: u8, created_at: i64) -> Self {
        Self {
            discriminator: POSITION_DISCRIMINATOR,
            market,
            owner,
            side,
            staked: 0,
            claimed: false,
            created_at,
            updated_at: created_at,
            bump,
            reserved: [0u8; 16],
        }
    }

    /// Add `net` to the stake, enforcing side immutability and the cap
    pub fn add_stake(
        &mut self,
        side: Side,
        net: u64,
        max_stake: u64,
        current_time: i64,
    ) -> ProgramResult {
        if side != self.side {
            msg!("Error: Position is {:?}, cannot bet {:?}", self.side, side);
            return Err(PariMutuelError::SideMismatch.into());
        }
        let staked = safe_add_u64(self.staked, net)?;
        if staked > max_stake {
            msg!("Error: Stake {} would exceed limit {}", staked, max_stake);
            return Err(PariMutuelError::BetLimitExceeded.into());
        }
        self.staked = staked;
        self.updated_at = current_time;
        Ok(())
    }
}

/// Human-readable market text, kept apart from the numeric Market record
///
/// PDA Seeds: ["metadata", market]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct MarketMetadata {
    /// Account discriminator
    pub discriminator: u64,

    pub market: Pubkey,

    pub question: String,

    pub category: String,

    /// PDA bump
    pub bump: u8,
}

impl Record for MarketMetadata {
    const DISCRIMINATOR: u64 = MARKET_METADATA_DISCRIMINATOR;
    const SIZE: usize = 8   // discriminator
        + 32                        // market
        + 4 + MAX_QUESTION_LEN      // question
        + 4 + MAX_CATEGORY_LEN      // category
        + 1;                        // bump

    fn discriminator(&self) -> u64 {
        self.discriminator
    }
}

impl MarketMetadata {
    pub fn new(market: Pubkey, question: String, category: String, bump: u8) -> Self {
        Self {
            discriminator: MARKET_METADATA_DISCRIMINATOR,
            market,
            question,
            category,
            bump,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
