//! Crowdfund Demo CLI
//!
//! Drives a complete campaign lifecycle against the in-memory reference
//! ledger: create, fund, request, approve, fulfill. Useful for watching
//! the client's reconciliation and rule surface without a deployed
//! contract.

use std::sync::Arc;

use anyhow::Result;
use campaign_domain::{wei_to_ether, Address};
use clap::Parser;
use crowdfund_client::{ClientConfig, ContractDirectory, WalletSession, WorkflowEngine};
use ledger_gateway::InMemoryLedger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Stock development accounts the demo signs with. Account 0 owns the
/// campaign; the rest fund it.
const DEV_ACCOUNTS: [&str; 8] = [
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
    "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
    "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC",
    "0x90F79bf6EB2c4f870365E785982E1f101E93b906",
    "0x15d34AAf54267DB7D7c367839AAf71A00a2C6A65",
    "0x9965507D1a55bcC2695C58ba16FB37d819B0A4dc",
    "0x976EA74026E726554dB657fA54763abd0C3a0aa9",
    "0x14dC79964da2C08b23698B3D3cc7Ca32193d9955",
];

const DEMO_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Crowdfund campaign lifecycle demo
#[derive(Parser, Debug)]
#[command(name = "crowdfund")]
#[command(about = "Campaign lifecycle demo against an in-memory ledger", long_about = None)]
struct Args {
    /// Campaign name to create
    #[arg(long, default_value = "Community Well")]
    campaign_name: String,

    /// Network id the demo wallet reports
    #[arg(long, default_value = "31337")]
    network: u64,

    /// Number of funding accounts (1-7)
    #[arg(long, default_value = "3")]
    funders: usize,

    /// Contribution per funder, in wei
    #[arg(long, default_value = "1000000000000000000")]
    contribution_wei: u128,

    /// Gateway call timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    anyhow::ensure!(
        (1..DEV_ACCOUNTS.len()).contains(&args.funders),
        "--funders must be between 1 and {}",
        DEV_ACCOUNTS.len() - 1
    );

    run_demo(args).await
}

async fn run_demo(args: Args) -> Result<()> {
    let owner = Address::from(DEV_ACCOUNTS[0]);
    let funders: Vec<Address> = DEV_ACCOUNTS[1..=args.funders]
        .iter()
        .copied()
        .map(Address::from)
        .collect();

    tracing::info!("Starting crowdfund lifecycle demo");
    tracing::info!("  Campaign: {}", args.campaign_name);
    tracing::info!("  Network: {}", args.network);
    tracing::info!("  Owner: {}", owner.truncated());
    tracing::info!(
        "  Funders: {} x {} ether",
        funders.len(),
        wei_to_ether(args.contribution_wei)
    );

    // In-memory ledger and the directory entry for the demo network
    let contract = Address::from(DEMO_CONTRACT);
    let ledger = Arc::new(InMemoryLedger::new(contract.clone()));
    let mut directory = ContractDirectory::new();
    directory.insert(args.network, contract);

    let engine = WorkflowEngine::with_config(
        ledger,
        directory,
        ClientConfig {
            call_timeout_ms: args.timeout_ms,
        },
    );

    // Owner connects and creates the campaign
    engine
        .update_session(WalletSession::connected(owner.clone(), args.network))
        .await?;
    engine.create_campaign(&args.campaign_name).await?;
    let campaign = engine.campaigns().get(0)?;
    tracing::info!(
        "Campaign {} created at {}",
        campaign.index,
        campaign.address.truncated()
    );

    // Owner raises a spending request for half the expected pot
    let pot = args
        .contribution_wei
        .checked_mul(funders.len() as u128)
        .ok_or_else(|| anyhow::anyhow!("contribution too large"))?;
    let request_amount = pot / 2;
    engine
        .create_request(0, "Materials", "Supplies for the build", request_amount)
        .await?;
    tracing::info!(
        "Spending request raised for {} ether",
        wei_to_ether(request_amount)
    );

    // Funders contribute
    for funder in &funders {
        engine
            .update_session(WalletSession::connected(funder.clone(), args.network))
            .await?;
        engine.fund_campaign(0, args.contribution_wei).await?;
        tracing::info!(
            "{} funded {} ether",
            funder.truncated(),
            wei_to_ether(args.contribution_wei)
        );
    }

    let campaign = engine.campaigns().get(0)?;
    tracing::info!(
        "Campaign balance: {} ether from {} funders",
        campaign.display_balance(),
        campaign.funders_count
    );

    // A premature fulfillment shows the majority rule in action
    if funders.len() >= 3 {
        engine
            .update_session(WalletSession::connected(funders[0].clone(), args.network))
            .await?;
        engine.approve_request(0, 0).await?;
        engine
            .update_session(WalletSession::connected(owner.clone(), args.network))
            .await?;
        match engine.fulfill_request(0, 0).await {
            Err(e) => tracing::info!("Early fulfillment rejected as expected: {}", e),
            Ok(_) => anyhow::bail!("fulfillment without majority should have been rejected"),
        }
    }

    // Approvals until a strict majority is reached
    let already = if funders.len() >= 3 { 1 } else { 0 };
    let needed = funders.len() / 2 + 1;
    for funder in funders.iter().skip(already).take(needed - already) {
        engine
            .update_session(WalletSession::connected(funder.clone(), args.network))
            .await?;
        engine.approve_request(0, 0).await?;
        let requests = engine.requests().list_for_campaign(0).await?;
        tracing::info!(
            "{} approved ({}/{} funders)",
            funder.truncated(),
            requests[0].approval_count,
            funders.len()
        );
    }

    // Owner withdraws the approved amount
    engine
        .update_session(WalletSession::connected(owner.clone(), args.network))
        .await?;
    engine.fulfill_request(0, 0).await?;

    let view = engine.view_campaign(0).await?;
    tracing::info!("Request fulfilled: {}", view.requests[0].fulfilled);
    tracing::info!(
        "Remaining balance: {} ether",
        view.campaign.display_balance()
    );
    tracing::info!("Demo complete");

    Ok(())
}
