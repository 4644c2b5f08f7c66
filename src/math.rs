//! Fee, payout and quote math
//!
//! All intermediate products are widened to u128; results that do not fit
//! back into u64 fail with `ArithmeticOverflow`.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::program_error::ProgramError;

use crate::error::PariMutuelError;
use crate::state::{Settlement, Side, BPS_DENOMINATOR, MAX_BET_TOKENS, MULTIPLIER_PRECISION};

/// Advisory projection returned by `QuotePayout`
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutQuote {
    /// Gross multiplier, scaled by MULTIPLIER_PRECISION
    pub multiplier_e6: u64,
    /// Projected payout for the hypothetical stake
    pub payout: u64,
}

fn to_u64(value: u128) -> Result<u64, ProgramError> {
    u64::try_from(value).map_err(|_| PariMutuelError::ArithmeticOverflow.into())
}

/// Split a gross bet into (fee, net). The fee is floored.
pub fn split_fee(amount: u64, fee_bps: u16) -> Result<(u64, u64), ProgramError> {
    let fee = (amount as u128) * (fee_bps as u128) / (BPS_DENOMINATOR as u128);
    let fee = to_u64(fee)?;
    let net = amount
        .checked_sub(fee)
        .ok_or(PariMutuelError::ArithmeticOverflow)?;
    Ok((fee, net))
}

/// Per-position stake cap of MAX_BET_TOKENS whole tokens, saturating at u64::MAX
pub fn max_stake_for_decimals(decimals: u8) -> u64 {
    10u128
        .checked_pow(decimals as u32)
        .and_then(|unit| unit.checked_mul(MAX_BET_TOKENS as u128))
        .map_or(u64::MAX, |cap| u64::try_from(cap).unwrap_or(u64::MAX))
}

/// Amount owed to a position under the settlement fixed at resolution
pub fn compute_payout(
    staked: u64,
    side: Side,
    pool_yes: u64,
    pool_no: u64,
    settlement: Settlement,
) -> Result<u64, ProgramError> {
    match settlement {
        Settlement::Refund => Ok(staked),
        Settlement::Winner(winner) if winner == side => {
            let winning_pool = match winner {
                Side::Yes => pool_yes,
                Side::No => pool_no,
            };
            if winning_pool == 0 {
                return Err(PariMutuelError::ArithmeticOverflow.into());
            }
            let total = (pool_yes as u128) + (pool_no as u128);
            to_u64((staked as u128) * total / (winning_pool as u128))
        }
        Settlement::Winner(_) => Ok(0),
    }
}

/// Vault balance above the principal still owed to participants
pub fn accrued_fees(vault_balance: u64, outstanding_principal: u64) -> Result<u64, ProgramError> {
    vault_balance
        .checked_sub(outstanding_principal)
        .ok_or_else(|| PariMutuelError::InsufficientVaultBalance.into())
}

/// `(pool_yes + pool_no + stake) / (pool_side + stake)` as of the given pools
pub fn quote_payout(
    pool_yes: u64,
    pool_no: u64,
    side: Side,
    stake: u64,
) -> Result<PayoutQuote, ProgramError> {
    let side_pool = match side {
        Side::Yes => pool_yes,
        Side::No => pool_no,
    };
    let denominator = (side_pool as u128) + (stake as u128);
    if denominator == 0 {
        return Err(PariMutuelError::AmountTooSmall.into());
    }
    let total = (pool_yes as u128) + (pool_no as u128) + (stake as u128);
    let multiplier_e6 = to_u64(total * (MULTIPLIER_PRECISION as u128) / denominator)?;
    let payout = to_u64((stake as u128) * total / denominator)?;
    Ok(PayoutQuote { multiplier_e6, payout })
}
