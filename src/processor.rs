//! Instruction processor for the Pari-Mutuel Program

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::set_return_data,
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::cpi::{
    check_token_account, create_vault_account, transfer_from_vault, transfer_to_vault,
    unpack_mint, unpack_token_account,
};
use crate::error::PariMutuelError;
use crate::instruction::*;
use crate::math::{accrued_fees, compute_payout, max_stake_for_decimals, quote_payout, split_fee};
use crate::state::{
    Market, MarketMetadata, Position, ProgramStats, Record,
    DEFAULT_FEE_BPS, MARKET_DISCRIMINATOR, MARKET_SEED, MAX_FEE_BPS,
    METADATA_SEED, MIN_BET_AMOUNT, POSITION_SEED, PROGRAM_STATS_SEED, VAULT_SEED,
};
use crate::utils::{
    check_program_id, check_program_owner, check_signer, create_pda_account,
    get_current_timestamp, safe_add_u64, validate_cutoff, validate_market_text,
    verify_pda,
};

/// Process an instruction
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = PariMutuelInstruction::try_from_slice(instruction_data)
        .map_err(|_| PariMutuelError::InvalidInstruction)?;

    match instruction {
        PariMutuelInstruction::InitializeProgram => {
            msg!("Instruction: InitializeProgram");
            process_initialize_program(program_id, accounts)
        }
        PariMutuelInstruction::CreateMarket(args) => {
            msg!("Instruction: CreateMarket");
            process_create_market(program_id, accounts, args)
        }
        PariMutuelInstruction::UpdateCutoff(args) => {
            msg!("Instruction: UpdateCutoff");
            process_update_cutoff(program_id, accounts, args)
        }
        PariMutuelInstruction::PlaceBet(args) => {
            msg!("Instruction: PlaceBet");
            process_place_bet(program_id, accounts, args)
        }
        PariMutuelInstruction::ResolveMarket(args) => {
            msg!("Instruction: ResolveMarket");
            process_resolve_market(program_id, accounts, args)
        }
        PariMutuelInstruction::ClaimWinnings => {
            msg!("Instruction: ClaimWinnings");
            process_claim_winnings(program_id, accounts)
        }
        PariMutuelInstruction::EmergencyPause(args) => {
            msg!("Instruction: EmergencyPause");
            process_emergency_pause(program_id, accounts, args)
        }
        PariMutuelInstruction::UpdateFeeReceiver(args) => {
            msg!("Instruction: UpdateFeeReceiver");
            process_update_fee_receiver(program_id, accounts, args)
        }
        PariMutuelInstruction::SweepFees => {
            msg!("Instruction: SweepFees");
            process_sweep_fees(program_id, accounts)
        }
        PariMutuelInstruction::QuotePayout(args) => {
            msg!("Instruction: QuotePayout");
            process_quote_payout(program_id, accounts, args)
        }
    }
}

// ============================================================================
// Record loading
// ============================================================================

fn load_stats(stats_info: &AccountInfo, program_id: &Pubkey) -> Result<ProgramStats, ProgramError> {
    check_program_owner(stats_info, program_id)?;
    ProgramStats::load(&stats_info.data.borrow())
}

fn load_market(market_info: &AccountInfo, program_id: &Pubkey) -> Result<Market, ProgramError> {
    check_program_owner(market_info, program_id)?;
    Market::load(&market_info.data.borrow())
}

fn check_vault(market: &Market, vault_info: &AccountInfo) -> ProgramResult {
    if *vault_info.key != market.vault {
        msg!("Error: Vault {} does not belong to market {}", vault_info.key, market.market_id);
        return Err(PariMutuelError::InvalidMarketVault.into());
    }
    Ok(())
}

// ============================================================================
// Processor Implementations
// ============================================================================

fn process_initialize_program(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Authority (signer, payer)
    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    // Account 1: ProgramStats PDA (writable)
    let stats_info = next_account_info(account_info_iter)?;

    // Account 2: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    check_program_id(system_program_info, &system_program::ID)?;

    let stats_bump = verify_pda(stats_info.key, program_id, &[PROGRAM_STATS_SEED])?;

    if !stats_info.data_is_empty() {
        msg!("Error: ProgramStats already initialized");
        return Err(PariMutuelError::AlreadyInitialized.into());
    }

    create_pda_account(
        authority_info,
        stats_info,
        ProgramStats::SIZE,
        program_id,
        system_program_info,
        &[PROGRAM_STATS_SEED, &[stats_bump]],
    )?;

    let stats = ProgramStats::new(*authority_info.key, stats_bump);
    stats.serialize(&mut *stats_info.try_borrow_mut_data()?)?;

    msg!("ProgramStats initialized");
    msg!("Global Authority: {}", authority_info.key);

    Ok(())
}

fn process_create_market(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: CreateMarketArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Authority (signer, payer)
    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    // Account 1: ProgramStats (writable)
    let stats_info = next_account_info(account_info_iter)?;

    // Account 2: Market PDA (writable)
    let market_info = next_account_info(account_info_iter)?;

    // Account 3: Vault PDA (writable)
    let vault_info = next_account_info(account_info_iter)?;

    // Account 4: Metadata PDA (writable)
    let metadata_info = next_account_info(account_info_iter)?;

    // Account 5: Staking token mint
    let mint_info = next_account_info(account_info_iter)?;

    // Account 6: Token Program
    let token_program_info = next_account_info(account_info_iter)?;
    check_program_id(token_program_info, &spl_token::id())?;

    // Account 7: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    check_program_id(system_program_info, &system_program::ID)?;

    let mut stats = load_stats(stats_info, program_id)?;
    stats.check_authority(authority_info.key)?;

    validate_market_text(&args.question, &args.category)?;

    let current_time = get_current_timestamp()?;
    validate_cutoff(args.cutoff_time, current_time, current_time)?;

    let fee_bps = args.fee_bps.unwrap_or(DEFAULT_FEE_BPS);
    if fee_bps > MAX_FEE_BPS {
        msg!("Error: Fee {} bps exceeds {} bps", fee_bps, MAX_FEE_BPS);
        return Err(PariMutuelError::FeeTooHigh.into());
    }

    let mint = unpack_mint(mint_info)?;
    let max_stake = max_stake_for_decimals(mint.decimals);

    // Allocate market_id
    let market_id = stats.record_market()?;
    let market_id_bytes = market_id.to_le_bytes();

    let market_bump = verify_pda(market_info.key, program_id, &[MARKET_SEED, &market_id_bytes])?;
    let vault_bump = verify_pda(vault_info.key, program_id, &[VAULT_SEED, market_info.key.as_ref()])?;
    let metadata_bump =
        verify_pda(metadata_info.key, program_id, &[METADATA_SEED, market_info.key.as_ref()])?;

    if !market_info.data_is_empty() {
        msg!("Error: Market {} already exists", market_id);
        return Err(PariMutuelError::AlreadyInitialized.into());
    }

    // Create Market account
    create_pda_account(
        authority_info,
        market_info,
        Market::SIZE,
        program_id,
        system_program_info,
        &[MARKET_SEED, &market_id_bytes, &[market_bump]],
    )?;

    // Create Vault (token authority = Market PDA)
    create_vault_account(
        authority_info,
        vault_info,
        mint_info,
        market_info,
        token_program_info,
        system_program_info,
        &[VAULT_SEED, market_info.key.as_ref(), &[vault_bump]],
    )?;

    // Create Metadata account
    create_pda_account(
        authority_info,
        metadata_info,
        MarketMetadata::SIZE,
        program_id,
        system_program_info,
        &[METADATA_SEED, market_info.key.as_ref(), &[metadata_bump]],
    )?;

    let market = Market {
        discriminator: MARKET_DISCRIMINATOR,
        market_id,
        authority: *authority_info.key,
        fee_receiver: *authority_info.key,
        token_mint: *mint_info.key,
        vault: *vault_info.key,
        metadata: *metadata_info.key,
        created_at: current_time,
        cutoff_time: args.cutoff_time,
        pool_yes: 0,
        pool_no: 0,
        resolved: false,
        outcome: None,
        settlement: None,
        paused: false,
        fee_bps,
        max_stake,
        fees_collected: 0,
        total_paid_out: 0,
        total_swept: 0,
        bump: market_bump,
        vault_bump,
        reserved: [0u8; 32],
    };
    market.serialize(&mut *market_info.try_borrow_mut_data()?)?;

    let metadata = MarketMetadata::new(*market_info.key, args.question, args.category, metadata_bump);
    metadata.serialize(&mut *metadata_info.try_borrow_mut_data()?)?;

    stats.serialize(&mut *stats_info.try_borrow_mut_data()?)?;

    msg!("Market created successfully");
    msg!("Market ID: {}", market_id);
    msg!("Market: {}", market_info.key);
    msg!("Vault: {}", vault_info.key);
    msg!("Token Mint: {}", mint_info.key);
    msg!("Cutoff Time: {}", args.cutoff_time);
    msg!("Fee: {} bps", fee_bps);

    Ok(())
}

fn process_update_cutoff(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: UpdateCutoffArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    let market_info = next_account_info(account_info_iter)?;

    let mut market = load_market(market_info, program_id)?;
    market.check_authority(authority_info.key)?;
    market.check_not_resolved()?;

    let current_time = get_current_timestamp()?;
    if current_time >= market.cutoff_time {
        msg!("Error: Betting closed at {} (now {})", market.cutoff_time, current_time);
        return Err(PariMutuelError::BettingClosed.into());
    }
    validate_cutoff(args.new_cutoff_time, market.created_at, current_time)?;

    let old_cutoff = market.cutoff_time;
    market.cutoff_time = args.new_cutoff_time;
    market.serialize(&mut *market_info.try_borrow_mut_data()?)?;

    msg!(
        "Market {} cutoff moved from {} to {}",
        market.market_id, old_cutoff, args.new_cutoff_time
    );

    Ok(())
}

fn process_place_bet(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: PlaceBetArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Participant (signer, payer)
    let participant_info = next_account_info(account_info_iter)?;
    check_signer(participant_info)?;

    // Account 1: ProgramStats (writable)
    let stats_info = next_account_info(account_info_iter)?;

    // Account 2: Market (writable)
    let market_info = next_account_info(account_info_iter)?;

    // Account 3: Position PDA (writable)
    let position_info = next_account_info(account_info_iter)?;

    // Account 4: Participant's token account (writable)
    let participant_token_info = next_account_info(account_info_iter)?;

    // Account 5: Vault (writable)
    let vault_info = next_account_info(account_info_iter)?;

    // Account 6: Token Program
    let token_program_info = next_account_info(account_info_iter)?;
    check_program_id(token_program_info, &spl_token::id())?;

    // Account 7: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    check_program_id(system_program_info, &system_program::ID)?;

    let mut stats = load_stats(stats_info, program_id)?;
    let mut market = load_market(market_info, program_id)?;

    let current_time = get_current_timestamp()?;
    market.check_accepting_bets(current_time)?;

    if args.amount < MIN_BET_AMOUNT {
        msg!("Error: Bet {} below minimum {}", args.amount, MIN_BET_AMOUNT);
        return Err(PariMutuelError::AmountTooSmall.into());
    }

    check_vault(&market, vault_info)?;
    check_token_account(participant_token_info, &market.token_mint, participant_info.key)?;

    let position_bump = verify_pda(
        position_info.key,
        program_id,
        &[POSITION_SEED, market_info.key.as_ref(), participant_info.key.as_ref()],
    )?;

    let is_new_position = position_info.data_is_empty();
    let mut position = if is_new_position {
        Position::new(
            *market_info.key,
            *participant_info.key,
            args.side,
            position_bump,
            current_time,
        )
    } else {
        check_program_owner(position_info, program_id)?;
        Position::load(&position_info.data.borrow())?
    };

    let (fee, net) = split_fee(args.amount, market.fee_bps)?;

    // Validate and stage every record before moving tokens
    position.add_stake(args.side, net, market.max_stake, current_time)?;
    market.credit_pool(args.side, net)?;
    market.fees_collected = safe_add_u64(market.fees_collected, fee)?;
    stats.record_bet(args.amount, fee, is_new_position)?;

    transfer_to_vault(
        participant_token_info,
        vault_info,
        participant_info,
        token_program_info,
        args.amount,
    )?;

    if is_new_position {
        create_pda_account(
            participant_info,
            position_info,
            Position::SIZE,
            program_id,
            system_program_info,
            &[
                POSITION_SEED,
                market_info.key.as_ref(),
                participant_info.key.as_ref(),
                &[position_bump],
            ],
        )?;
    }

    position.serialize(&mut *position_info.try_borrow_mut_data()?)?;
    market.serialize(&mut *market_info.try_borrow_mut_data()?)?;
    stats.serialize(&mut *stats_info.try_borrow_mut_data()?)?;

    msg!("Bet placed successfully");
    msg!("Market ID: {}", market.market_id);
    msg!("Participant: {}", participant_info.key);
    msg!("Side: {:?}, Amount: {}, Fee: {}, Net: {}", args.side, args.amount, fee, net);
    msg!("Pools: YES={} NO={}", market.pool_yes, market.pool_no);

    Ok(())
}

fn process_resolve_market(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: ResolveMarketArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    let market_info = next_account_info(account_info_iter)?;

    let mut market = load_market(market_info, program_id)?;
    market.check_authority(authority_info.key)?;

    let current_time = get_current_timestamp()?;
    market.check_resolvable(current_time)?;

    market.resolve(args.outcome);
    market.serialize(&mut *market_info.try_borrow_mut_data()?)?;

    msg!("Market {} resolved", market.market_id);
    msg!("Outcome: {:?}", args.outcome);
    msg!("Settlement: {:?}", market.settlement);
    msg!("Pools: YES={} NO={}", market.pool_yes, market.pool_no);

    Ok(())
}

fn process_claim_winnings(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Participant (signer)
    let participant_info = next_account_info(account_info_iter)?;
    check_signer(participant_info)?;

    // Account 1: Market (writable)
    let market_info = next_account_info(account_info_iter)?;

    // Account 2: Position PDA (writable)
    let position_info = next_account_info(account_info_iter)?;

    // Account 3: Participant's token account (writable)
    let participant_token_info = next_account_info(account_info_iter)?;

    // Account 4: Vault (writable)
    let vault_info = next_account_info(account_info_iter)?;

    // Account 5: Token Program
    let token_program_info = next_account_info(account_info_iter)?;
    check_program_id(token_program_info, &spl_token::id())?;

    let mut market = load_market(market_info, program_id)?;

    let settlement = match (market.resolved, market.settlement) {
        (true, Some(settlement)) => settlement,
        _ => {
            msg!("Error: Market {} is not resolved", market.market_id);
            return Err(PariMutuelError::NotResolved.into());
        }
    };

    verify_pda(
        position_info.key,
        program_id,
        &[POSITION_SEED, market_info.key.as_ref(), participant_info.key.as_ref()],
    )?;
    if position_info.data_is_empty() {
        msg!("Error: {} has no position in market {}", participant_info.key, market.market_id);
        return Err(PariMutuelError::NoPosition.into());
    }
    check_program_owner(position_info, program_id)?;
    let mut position = Position::load(&position_info.data.borrow())?;

    if position.claimed {
        msg!("Error: Position already claimed");
        return Err(PariMutuelError::AlreadyClaimed.into());
    }

    check_vault(&market, vault_info)?;
    check_token_account(participant_token_info, &market.token_mint, participant_info.key)?;

    let payout = compute_payout(
        position.staked,
        position.side,
        market.pool_yes,
        market.pool_no,
        settlement,
    )?;

    if payout > 0 {
        let market_id_bytes = market.market_id.to_le_bytes();
        let market_seeds: &[&[u8]] = &[MARKET_SEED, &market_id_bytes, &[market.bump]];
        transfer_from_vault(
            vault_info,
            participant_token_info,
            market_info,
            token_program_info,
            payout,
            market_seeds,
        )?;
    }

    position.claimed = true;
    position.updated_at = get_current_timestamp()?;
    position.serialize(&mut *position_info.try_borrow_mut_data()?)?;

    market.total_paid_out = safe_add_u64(market.total_paid_out, payout)?;
    market.serialize(&mut *market_info.try_borrow_mut_data()?)?;

    msg!("Claim processed");
    msg!("Market ID: {}", market.market_id);
    msg!("Participant: {}", participant_info.key);
    msg!("Side: {:?}, Staked: {}, Payout: {}", position.side, position.staked, payout);

    Ok(())
}

fn process_emergency_pause(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: EmergencyPauseArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    let market_info = next_account_info(account_info_iter)?;

    let mut market = load_market(market_info, program_id)?;
    market.check_authority(authority_info.key)?;

    market.paused = args.paused;
    market.serialize(&mut *market_info.try_borrow_mut_data()?)?;

    msg!("Market {} paused={}", market.market_id, args.paused);

    Ok(())
}

fn process_update_fee_receiver(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: UpdateFeeReceiverArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    let market_info = next_account_info(account_info_iter)?;

    let mut market = load_market(market_info, program_id)?;
    market.check_authority(authority_info.key)?;

    let old_receiver = market.fee_receiver;
    market.fee_receiver = args.new_receiver;
    market.serialize(&mut *market_info.try_borrow_mut_data()?)?;

    msg!(
        "Market {} fee receiver changed from {} to {}",
        market.market_id, old_receiver, args.new_receiver
    );

    Ok(())
}

fn process_sweep_fees(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Market authority (signer)
    let authority_info = next_account_info(account_info_iter)?;
    check_signer(authority_info)?;

    // Account 1: Market (writable)
    let market_info = next_account_info(account_info_iter)?;

    // Account 2: Vault (writable)
    let vault_info = next_account_info(account_info_iter)?;

    // Account 3: Fee receiver's associated token account (writable)
    let fee_destination_info = next_account_info(account_info_iter)?;

    // Account 4: Token Program
    let token_program_info = next_account_info(account_info_iter)?;
    check_program_id(token_program_info, &spl_token::id())?;

    let mut market = load_market(market_info, program_id)?;
    market.check_authority(authority_info.key)?;
    check_vault(&market, vault_info)?;

    let vault_balance = unpack_token_account(vault_info)?.amount;
    let accrued = accrued_fees(vault_balance, market.outstanding_principal()?)?;

    if accrued == 0 {
        msg!("Market {}: no accrued fees to sweep", market.market_id);
        return Ok(());
    }

    let expected_destination = spl_associated_token_account::get_associated_token_address(
        &market.fee_receiver,
        &market.token_mint,
    );
    if *fee_destination_info.key != expected_destination {
        msg!(
            "Error: Fee destination must be {} (ATA of {})",
            expected_destination, market.fee_receiver
        );
        return Err(PariMutuelError::InvalidFeeReceiver.into());
    }
    check_token_account(fee_destination_info, &market.token_mint, &market.fee_receiver)?;

    let market_id_bytes = market.market_id.to_le_bytes();
    let market_seeds: &[&[u8]] = &[MARKET_SEED, &market_id_bytes, &[market.bump]];
    transfer_from_vault(
        vault_info,
        fee_destination_info,
        market_info,
        token_program_info,
        accrued,
        market_seeds,
    )?;

    market.total_swept = safe_add_u64(market.total_swept, accrued)?;
    market.serialize(&mut *market_info.try_borrow_mut_data()?)?;

    msg!("Fees swept");
    msg!("Market ID: {}", market.market_id);
    msg!("Amount: {}", accrued);
    msg!("Fee Receiver: {}", market.fee_receiver);

    Ok(())
}

fn process_quote_payout(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: QuotePayoutArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    let market_info = next_account_info(account_info_iter)?;
    let market = load_market(market_info, program_id)?;

    let quote = quote_payout(market.pool_yes, market.pool_no, args.side, args.stake)?;
    set_return_data(&quote.try_to_vec()?);

    msg!(
        "Quote: market {} {:?} stake {} -> multiplier_e6 {} payout {}",
        market.market_id, args.side, args.stake, quote.multiplier_e6, quote.payout
    );

    Ok(())
}
