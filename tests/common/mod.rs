//! Shared harness for program-test integration tests

#![allow(dead_code)]

use borsh::{BorshDeserialize, BorshSerialize};
use pari_mutuel_program::{
    instruction::*,
    math::PayoutQuote,
    processor::process_instruction,
    state::{Market, MarketMetadata, Position, ProgramStats, Record, Outcome, Side},
    PariMutuelError,
};
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::{
    clock::Clock,
    instruction::{AccountMeta, Instruction, InstructionError},
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction, system_program,
    transaction::{Transaction, TransactionError},
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};

pub const START_TIME: i64 = 1_700_000_000;
pub const DECIMALS: u8 = 6;
pub const ONE_TOKEN: u64 = 1_000_000;
pub const ONE_DAY: i64 = 24 * 60 * 60;
const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

// ============================================================================
// Instruction builders
// ============================================================================

fn build(program_id: &Pubkey, ix: PariMutuelInstruction, accounts: Vec<AccountMeta>) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts,
        data: ix.try_to_vec().unwrap(),
    }
}

pub fn initialize_program_ix(program_id: &Pubkey, authority: &Pubkey) -> Instruction {
    let (stats, _) = ProgramStats::find_address(program_id);
    build(
        program_id,
        PariMutuelInstruction::InitializeProgram,
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(stats, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

pub fn create_market_ix(
    program_id: &Pubkey,
    authority: &Pubkey,
    market_id: u64,
    mint: &Pubkey,
    args: CreateMarketArgs,
) -> Instruction {
    let (stats, _) = ProgramStats::find_address(program_id);
    let (market, _) = Market::find_address(market_id, program_id);
    let (vault, _) = Market::find_vault_address(&market, program_id);
    let (metadata, _) = Market::find_metadata_address(&market, program_id);
    build(
        program_id,
        PariMutuelInstruction::CreateMarket(args),
        vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(stats, false),
            AccountMeta::new(market, false),
            AccountMeta::new(vault, false),
            AccountMeta::new(metadata, false),
            AccountMeta::new_readonly(*mint, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

pub fn update_cutoff_ix(program_id: &Pubkey, authority: &Pubkey, market: &Pubkey, new_cutoff_time: i64) -> Instruction {
    build(
        program_id,
        PariMutuelInstruction::UpdateCutoff(UpdateCutoffArgs { new_cutoff_time }),
        vec![AccountMeta::new_readonly(*authority, true), AccountMeta::new(*market, false)],
    )
}

pub fn place_bet_ix(
    program_id: &Pubkey,
    participant: &Pubkey,
    market: &Pubkey,
    mint: &Pubkey,
    side: Side,
    amount: u64,
) -> Instruction {
    let (stats, _) = ProgramStats::find_address(program_id);
    let (position, _) = Position::find_address(market, participant, program_id);
    let (vault, _) = Market::find_vault_address(market, program_id);
    build(
        program_id,
        PariMutuelInstruction::PlaceBet(PlaceBetArgs { side, amount }),
        vec![
            AccountMeta::new(*participant, true),
            AccountMeta::new(stats, false),
            AccountMeta::new(*market, false),
            AccountMeta::new(position, false),
            AccountMeta::new(get_associated_token_address(participant, mint), false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
    )
}

pub fn resolve_market_ix(program_id: &Pubkey, authority: &Pubkey, market: &Pubkey, outcome: Outcome) -> Instruction {
    build(
        program_id,
        PariMutuelInstruction::ResolveMarket(ResolveMarketArgs { outcome }),
        vec![AccountMeta::new_readonly(*authority, true), AccountMeta::new(*market, false)],
    )
}

pub fn claim_winnings_ix(program_id: &Pubkey, participant: &Pubkey, market: &Pubkey, mint: &Pubkey) -> Instruction {
    let (position, _) = Position::find_address(market, participant, program_id);
    let (vault, _) = Market::find_vault_address(market, program_id);
    build(
        program_id,
        PariMutuelInstruction::ClaimWinnings,
        vec![
            AccountMeta::new_readonly(*participant, true),
            AccountMeta::new(*market, false),
            AccountMeta::new(position, false),
            AccountMeta::new(get_associated_token_address(participant, mint), false),
            AccountMeta::new(vault, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
    )
}

pub fn emergency_pause_ix(program_id: &Pubkey, authority: &Pubkey, market: &Pubkey, paused: bool) -> Instruction {
    build(
        program_id,
        PariMutuelInstruction::EmergencyPause(EmergencyPauseArgs { paused }),
        vec![AccountMeta::new_readonly(*authority, true), AccountMeta::new(*market, false)],
    )
}

pub fn update_fee_receiver_ix(program_id: &Pubkey, authority: &Pubkey, market: &Pubkey, new_receiver: Pubkey) -> Instruction {
    build(
        program_id,
        PariMutuelInstruction::UpdateFeeReceiver(UpdateFeeReceiverArgs { new_receiver }),
        vec![AccountMeta::new_readonly(*authority, true), AccountMeta::new(*market, false)],
    )
}

pub fn sweep_fees_ix(
    program_id: &Pubkey,
    signer: &Pubkey,
    market: &Pubkey,
    fee_destination: &Pubkey,
) -> Instruction {
    let (vault, _) = Market::find_vault_address(market, program_id);
    build(
        program_id,
        PariMutuelInstruction::SweepFees,
        vec![
            AccountMeta::new_readonly(*signer, true),
            AccountMeta::new(*market, false),
            AccountMeta::new(vault, false),
            AccountMeta::new(*fee_destination, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
    )
}

pub fn quote_payout_ix(program_id: &Pubkey, market: &Pubkey, side: Side, stake: u64) -> Instruction {
    build(
        program_id,
        PariMutuelInstruction::QuotePayout(QuotePayoutArgs { side, stake }),
        vec![AccountMeta::new_readonly(*market, false)],
    )
}

pub fn market_args(cutoff_time: i64, fee_bps: Option<u16>) -> CreateMarketArgs {
    CreateMarketArgs {
        question: "Will the test suite pass?".to_string(),
        category: "testing".to_string(),
        cutoff_time,
        fee_bps,
    }
}

// ============================================================================
// Error helpers
// ============================================================================

/// Typed program error carried by a failed transaction
pub fn program_error(err: BanksClientError) -> PariMutuelError {
    match err.unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
            PariMutuelError::from_code(code).expect("unknown custom error code")
        }
        other => panic!("Expected a program error, got {:?}", other),
    }
}

// ============================================================================
// Test environment
// ============================================================================

pub struct Participant {
    pub keypair: Keypair,
    pub token_account: Pubkey,
}

impl Participant {
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

pub struct TestEnv {
    pub ctx: ProgramTestContext,
    pub program_id: Pubkey,
    pub authority: Keypair,
    pub mint: Pubkey,
    mint_authority: Keypair,
}

impl TestEnv {
    /// Program started, clock at START_TIME, mint created, program not yet initialized
    pub async fn start() -> Self {
        let program_id = pari_mutuel_program::id();
        let program_test = ProgramTest::new(
            "pari_mutuel_program",
            program_id,
            processor!(process_instruction),
        );
        let ctx = program_test.start_with_context().await;

        let mut env = Self {
            ctx,
            program_id,
            authority: Keypair::new(),
            mint: Pubkey::default(),
            mint_authority: Keypair::new(),
        };
        env.set_time(START_TIME).await;

        let authority = env.authority.pubkey();
        env.airdrop(&authority, 10 * LAMPORTS_PER_SOL).await;
        env.mint = env.create_mint().await;
        env
    }

    /// Started and initialized, with the authority's fee ATA in place
    pub async fn initialized() -> Self {
        let mut env = Self::start().await;
        let authority = env.authority.insecure_clone();
        let ix = initialize_program_ix(&env.program_id, &authority.pubkey());
        env.process(&[ix], &[&authority]).await.unwrap();
        env.create_token_account(&authority.pubkey()).await;
        env
    }

    pub async fn process(
        &mut self,
        instructions: &[Instruction],
        signers: &[&Keypair],
    ) -> Result<(), BanksClientError> {
        let blockhash = self.ctx.get_new_latest_blockhash().await.unwrap();
        let mut all_signers: Vec<&Keypair> = vec![&self.ctx.payer];
        all_signers.extend_from_slice(signers);
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.ctx.payer.pubkey()),
            &all_signers[..],
            blockhash,
        );
        self.ctx.banks_client.process_transaction(tx).await
    }

    pub async fn set_time(&mut self, unix_timestamp: i64) {
        let mut clock: Clock = self.ctx.banks_client.get_sysvar().await.unwrap();
        clock.unix_timestamp = unix_timestamp;
        self.ctx.set_sysvar(&clock);
    }

    pub async fn airdrop(&mut self, to: &Pubkey, lamports: u64) {
        let ix = system_instruction::transfer(&self.ctx.payer.pubkey(), to, lamports);
        self.process(&[ix], &[]).await.unwrap();
    }

    async fn create_mint(&mut self) -> Pubkey {
        let mint = Keypair::new();
        let rent = self.ctx.banks_client.get_rent().await.unwrap();
        let ixs = [
            system_instruction::create_account(
                &self.ctx.payer.pubkey(),
                &mint.pubkey(),
                rent.minimum_balance(spl_token::state::Mint::LEN),
                spl_token::state::Mint::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint(
                &spl_token::id(),
                &mint.pubkey(),
                &self.mint_authority.pubkey(),
                None,
                DECIMALS,
            )
            .unwrap(),
        ];
        self.process(&ixs, &[&mint]).await.unwrap();
        mint.pubkey()
    }

    /// Create the associated token account of `owner` for the test mint
    pub async fn create_token_account(&mut self, owner: &Pubkey) -> Pubkey {
        let ix = create_associated_token_account(
            &self.ctx.payer.pubkey(),
            owner,
            &self.mint,
            &spl_token::id(),
        );
        self.process(&[ix], &[]).await.unwrap();
        get_associated_token_address(owner, &self.mint)
    }

    /// Funded wallet with `tokens` base units in its ATA
    pub async fn participant(&mut self, tokens: u64) -> Participant {
        let keypair = Keypair::new();
        self.airdrop(&keypair.pubkey(), LAMPORTS_PER_SOL).await;
        let token_account = self.create_token_account(&keypair.pubkey()).await;
        let mint_authority = self.mint_authority.insecure_clone();
        let ix = spl_token::instruction::mint_to(
            &spl_token::id(),
            &self.mint,
            &token_account,
            &mint_authority.pubkey(),
            &[],
            tokens,
        )
        .unwrap();
        self.process(&[ix], &[&mint_authority]).await.unwrap();
        Participant { keypair, token_account }
    }

    /// Create the next market as the global authority; returns its address
    pub async fn create_market(&mut self, cutoff_time: i64, fee_bps: Option<u16>) -> Pubkey {
        let market_id = self.stats().await.markets_created;
        let authority = self.authority.insecure_clone();
        let ix = create_market_ix(
            &self.program_id,
            &authority.pubkey(),
            market_id,
            &self.mint,
            market_args(cutoff_time, fee_bps),
        );
        self.process(&[ix], &[&authority]).await.unwrap();
        Market::find_address(market_id, &self.program_id).0
    }

    pub async fn bet(
        &mut self,
        participant: &Participant,
        market: &Pubkey,
        side: Side,
        amount: u64,
    ) -> Result<(), BanksClientError> {
        let ix = place_bet_ix(&self.program_id, &participant.pubkey(), market, &self.mint, side, amount);
        self.process(&[ix], &[&participant.keypair]).await
    }

    pub async fn claim(&mut self, participant: &Participant, market: &Pubkey) -> Result<(), BanksClientError> {
        let ix = claim_winnings_ix(&self.program_id, &participant.pubkey(), market, &self.mint);
        self.process(&[ix], &[&participant.keypair]).await
    }

    pub async fn resolve(&mut self, market: &Pubkey, outcome: Outcome) -> Result<(), BanksClientError> {
        let authority = self.authority.insecure_clone();
        let ix = resolve_market_ix(&self.program_id, &authority.pubkey(), market, outcome);
        self.process(&[ix], &[&authority]).await
    }

    pub async fn sweep(&mut self, market: &Pubkey) -> Result<(), BanksClientError> {
        let authority = self.authority.insecure_clone();
        let destination = self.fee_destination(market).await;
        let ix = sweep_fees_ix(&self.program_id, &authority.pubkey(), market, &destination);
        self.process(&[ix], &[&authority]).await
    }

    /// Simulate `QuotePayout` and decode its return data
    pub async fn quote(&mut self, market: &Pubkey, side: Side, stake: u64) -> PayoutQuote {
        let ix = quote_payout_ix(&self.program_id, market, side, stake);
        let blockhash = self.ctx.get_new_latest_blockhash().await.unwrap();
        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&self.ctx.payer.pubkey()),
            &[&self.ctx.payer],
            blockhash,
        );
        let simulation = self.ctx.banks_client.simulate_transaction(tx).await.unwrap();
        simulation.result.unwrap().unwrap();
        let return_data = simulation
            .simulation_details
            .and_then(|details| details.return_data)
            .expect("quote returned no data");
        assert_eq!(return_data.program_id, self.program_id);
        PayoutQuote::try_from_slice(&return_data.data).unwrap()
    }

    /// ATA of the market's current fee receiver
    pub async fn fee_destination(&mut self, market: &Pubkey) -> Pubkey {
        let fee_receiver = self.market(market).await.fee_receiver;
        get_associated_token_address(&fee_receiver, &self.mint)
    }

    // === Readers ===

    async fn account_data(&mut self, address: &Pubkey) -> Vec<u8> {
        self.ctx
            .banks_client
            .get_account(*address)
            .await
            .unwrap()
            .expect("account not found")
            .data
    }

    pub async fn stats(&mut self) -> ProgramStats {
        let (address, _) = ProgramStats::find_address(&self.program_id);
        ProgramStats::load(&self.account_data(&address).await).unwrap()
    }

    pub async fn market(&mut self, market: &Pubkey) -> Market {
        Market::load(&self.account_data(market).await).unwrap()
    }

    pub async fn metadata(&mut self, market: &Pubkey) -> MarketMetadata {
        let (address, _) = Market::find_metadata_address(market, &self.program_id);
        MarketMetadata::load(&self.account_data(&address).await).unwrap()
    }

    pub async fn position(&mut self, market: &Pubkey, owner: &Pubkey) -> Position {
        let (address, _) = Position::find_address(market, owner, &self.program_id);
        Position::load(&self.account_data(&address).await).unwrap()
    }

    pub async fn token_balance(&mut self, token_account: &Pubkey) -> u64 {
        let data = self.account_data(token_account).await;
        spl_token::state::Account::unpack(&data).unwrap().amount
    }

    pub async fn vault_balance(&mut self, market: &Pubkey) -> u64 {
        let (vault, _) = Market::find_vault_address(market, &self.program_id);
        self.token_balance(&vault).await
    }
}
