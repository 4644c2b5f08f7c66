//! Utility functions for the Pari-Mutuel Program

use borsh::BorshDeserialize;
use solana_program::{
    account_info::AccountInfo,
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::error::PariMutuelError;
use crate::state::{MAX_CATEGORY_LEN, MAX_MARKET_DURATION, MAX_QUESTION_LEN};

/// Safely deserialize account data using BorshDeserialize::deserialize
/// This does NOT require the slice to be fully consumed, which is important
/// when the account has padding bytes at the end.
pub fn deserialize_account<T: BorshDeserialize>(data: &[u8]) -> Result<T, ProgramError> {
    T::deserialize(&mut &data[..])
        .map_err(|_| ProgramError::InvalidAccountData)
}

/// Check if a signer is authorized
pub fn check_signer(account: &AccountInfo) -> ProgramResult {
    if !account.is_signer {
        msg!("Error: {} must sign", account.key);
        return Err(PariMutuelError::InvalidSigner.into());
    }
    Ok(())
}

/// Check that a record account is owned by this program
pub fn check_program_owner(account: &AccountInfo, program_id: &Pubkey) -> ProgramResult {
    if account.owner != program_id {
        msg!("Error: {} is owned by {}, not this program", account.key, account.owner);
        return Err(PariMutuelError::InvalidAccountOwner.into());
    }
    Ok(())
}

/// Check that a program account is the expected one
pub fn check_program_id(account: &AccountInfo, expected: &Pubkey) -> ProgramResult {
    if account.key != expected {
        msg!("Error: Expected program {}, got {}", expected, account.key);
        return Err(PariMutuelError::InvalidProgramAddress.into());
    }
    Ok(())
}

/// Verify PDA derivation
pub fn verify_pda(
    expected: &Pubkey,
    program_id: &Pubkey,
    seeds: &[&[u8]],
) -> Result<u8, ProgramError> {
    let (pda, bump) = Pubkey::find_program_address(seeds, program_id);
    if pda != *expected {
        msg!("PDA mismatch: expected {}, got {}", pda, expected);
        return Err(PariMutuelError::InvalidPDA.into());
    }
    Ok(bump)
}

/// Get current timestamp from Clock sysvar
pub fn get_current_timestamp() -> Result<i64, ProgramError> {
    let clock = Clock::get()?;
    Ok(clock.unix_timestamp)
}

/// Create a PDA account
///
/// An address that already holds lamports is topped up to rent exemption,
/// then allocated and assigned in place.
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    pda: &AccountInfo<'a>,
    space: usize,
    owner: &Pubkey,
    system_program: &AccountInfo<'a>,
    seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?;
    let lamports = rent.minimum_balance(space);

    if pda.lamports() == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer.key,
                pda.key,
                lamports,
                space as u64,
                owner,
            ),
            &[payer.clone(), pda.clone(), system_program.clone()],
            &[seeds],
        );
    }

    msg!("PDA {} is pre-funded with {} lamports", pda.key, pda.lamports());
    let top_up = lamports.saturating_sub(pda.lamports());
    if top_up > 0 {
        invoke(
            &system_instruction::transfer(payer.key, pda.key, top_up),
            &[payer.clone(), pda.clone(), system_program.clone()],
        )?;
    }

    invoke_signed(
        &system_instruction::allocate(pda.key, space as u64),
        &[pda.clone(), system_program.clone()],
        &[seeds],
    )?;

    invoke_signed(
        &system_instruction::assign(pda.key, owner),
        &[pda.clone(), system_program.clone()],
        &[seeds],
    )?;

    Ok(())
}

/// Validate market text against the metadata limits
pub fn validate_market_text(question: &str, category: &str) -> ProgramResult {
    if question.len() > MAX_QUESTION_LEN {
        msg!("Error: Question is {} bytes (max {})", question.len(), MAX_QUESTION_LEN);
        return Err(PariMutuelError::QuestionTooLong.into());
    }
    if category.len() > MAX_CATEGORY_LEN {
        msg!("Error: Category is {} bytes (max {})", category.len(), MAX_CATEGORY_LEN);
        return Err(PariMutuelError::CategoryTooLong.into());
    }
    Ok(())
}

/// Cutoff must lie in the future and within MAX_MARKET_DURATION of `created_at`
pub fn validate_cutoff(cutoff_time: i64, created_at: i64, current_time: i64) -> ProgramResult {
    if cutoff_time <= current_time {
        msg!("Error: Cutoff {} is not after now ({})", cutoff_time, current_time);
        return Err(PariMutuelError::InvalidCutoff.into());
    }
    let latest = safe_add_i64(created_at, MAX_MARKET_DURATION)?;
    if cutoff_time > latest {
        msg!("Error: Cutoff {} is past the maximum duration ({})", cutoff_time, latest);
        return Err(PariMutuelError::InvalidCutoff.into());
    }
    Ok(())
}

/// Safe addition for i64
pub fn safe_add_i64(a: i64, b: i64) -> Result<i64, ProgramError> {
    a.checked_add(b)
        .ok_or_else(|| PariMutuelError::ArithmeticOverflow.into())
}

/// Safe addition for u64
pub fn safe_add_u64(a: u64, b: u64) -> Result<u64, ProgramError> {
    a.checked_add(b)
        .ok_or_else(|| PariMutuelError::ArithmeticOverflow.into())
}

/// Safe subtraction for u64
pub fn safe_sub_u64(a: u64, b: u64) -> Result<u64, ProgramError> {
    a.checked_sub(b)
        .ok_or_else(|| PariMutuelError::ArithmeticOverflow.into())
}
