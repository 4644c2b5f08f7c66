//! CPI (Cross-Program Invocation) helpers for the Pari-Mutuel Program
//!
//! This module wraps the SPL Token calls that move custody:
//! - Vault creation (token account whose authority is the Market PDA)
//! - Participant -> vault transfers (participant signs)
//! - Vault -> participant / fee receiver transfers (Market PDA signs)

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
};
use spl_token::state::{Account as TokenAccount, Mint};

use crate::error::PariMutuelError;
use crate::utils::create_pda_account;

// ============================================================================
// Account inspection
// ============================================================================

/// Unpack an SPL mint
pub fn unpack_mint(mint_info: &AccountInfo) -> Result<Mint, ProgramError> {
    if *mint_info.owner != spl_token::id() {
        msg!("Error: Mint {} is not owned by the token program", mint_info.key);
        return Err(PariMutuelError::InvalidTokenMint.into());
    }
    Mint::unpack(&mint_info.data.borrow()).map_err(|_| {
        msg!("Error: {} is not an initialized mint", mint_info.key);
        ProgramError::from(PariMutuelError::InvalidTokenMint)
    })
}

/// Unpack an SPL token account
pub fn unpack_token_account(account_info: &AccountInfo) -> Result<TokenAccount, ProgramError> {
    if *account_info.owner != spl_token::id() {
        msg!("Error: {} is not owned by the token program", account_info.key);
        return Err(PariMutuelError::InvalidTokenAccount.into());
    }
    TokenAccount::unpack(&account_info.data.borrow()).map_err(|_| {
        msg!("Error: {} is not an initialized token account", account_info.key);
        ProgramError::from(PariMutuelError::InvalidTokenAccount)
    })
}

/// Check a token account holds `mint` and is controlled by `owner`
pub fn check_token_account(
    account_info: &AccountInfo,
    mint: &Pubkey,
    owner: &Pubkey,
) -> Result<TokenAccount, ProgramError> {
    let account = unpack_token_account(account_info)?;
    if account.mint != *mint || account.owner != *owner {
        msg!(
            "Error: Token account {} (mint {}, owner {}) does not match mint {} / owner {}",
            account_info.key, account.mint, account.owner, mint, owner
        );
        return Err(PariMutuelError::InvalidTokenAccount.into());
    }
    Ok(account)
}

// ============================================================================
// SPL Token CPI
// ============================================================================

/// Create the market vault at its PDA and hand token authority to the market
pub fn create_vault_account<'a>(
    payer: &AccountInfo<'a>,
    vault: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    market: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    vault_seeds: &[&[u8]],
) -> ProgramResult {
    create_pda_account(
        payer,
        vault,
        TokenAccount::LEN,
        token_program.key,
        system_program,
        vault_seeds,
    )?;

    invoke(
        &spl_token::instruction::initialize_account3(
            token_program.key,
            vault.key,
            mint.key,
            market.key, // token authority
        )?,
        &[vault.clone(), mint.clone(), token_program.clone()],
    )?;

    Ok(())
}

/// Move `amount` from a participant's token account into the vault
pub fn transfer_to_vault<'a>(
    source: &AccountInfo<'a>,
    vault: &AccountInfo<'a>,
    owner: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    msg!("CPI: Transfer {} into vault {}", amount, vault.key);

    invoke(
        &spl_token::instruction::transfer(
            token_program.key,
            source.key,
            vault.key,
            owner.key,
            &[],
            amount,
        )?,
        &[source.clone(), vault.clone(), owner.clone(), token_program.clone()],
    )
}

/// Move `amount` out of the vault; the Market PDA signs as token authority
pub fn transfer_from_vault<'a>(
    vault: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    market: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    amount: u64,
    market_seeds: &[&[u8]],
) -> ProgramResult {
    msg!("CPI: Transfer {} from vault {} to {}", amount, vault.key, destination.key);

    invoke_signed(
        &spl_token::instruction::transfer(
            token_program.key,
            vault.key,
            destination.key,
            market.key,
            &[],
            amount,
        )?,
        &[vault.clone(), destination.clone(), market.clone(), token_program.clone()],
        &[market_seeds],
    )
}
