//! Tracer CLI: offline front end for the Tracer wallet client state.
//!
//! # Usage
//!
//! ```text
//! tracer chains
//! tracer launch "https://app.example/?vesting=0x...&chain=arbitrum-sepolia"
//! tracer render --chain-id 421614 --account 0x... --snapshot snap.yaml
//! tracer tui --chain-id 421614 --account 0x... --snapshot snap.yaml
//! tracer check transfer --to 0x... --amount 1.5
//! tracer query --account 0x... --snapshot snap.yaml voting-power --address 0x...
//! tracer paths
//! ```

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use tracing_subscriber::EnvFilter;

use tracer_core::data::Data;
use tracer_core::format::{deadline_input, short_address};
use tracer_core::infrastructure::file::FileReader;
use tracer_core::launch::LaunchParams;
use tracer_core::operations::Operation;
use tracer_core::queries::{run_query, watch_asset_request, Query};
use tracer_core::refresh::{refresh_token, refresh_vesting};
use tracer_core::state::{ObservableStore, KNOWN_PATHS};
use tracer_core::view::Dashboard;
use tracer_core::wallet::WalletSession;
use tracer_tui::tui::Tui;


#[derive(Parser, Debug)]
#[command(name = "tracer", version, about = "Tracer wallet client state tools")]
struct Cli {
    /// Configuration directory holding settings.yaml.
    #[arg(long, global = true, env = "TRACER_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the configured chains.
    Chains,
    /// Print the launch parameters parsed from a page URL.
    Launch { url: String },
    /// Connect an account, load a snapshot file and print the dashboard.
    Render {
        /// Defaults to the network named by the URL's `chain` parameter.
        #[arg(long)]
        chain_id: Option<u64>,
        #[arg(long)]
        account: Address,
        /// YAML or JSON snapshot of the token (and optional vesting) state.
        #[arg(long)]
        snapshot: PathBuf,
        /// Page URL supplying launch parameters.
        #[arg(long)]
        url: Option<String>,
        /// Print the whole state tree as JSON instead of the dashboard.
        #[arg(long)]
        json: bool,
    },
    /// Interactive dashboard over a snapshot file.
    Tui {
        #[arg(long)]
        chain_id: Option<u64>,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        url: Option<String>,
    },
    /// Validate an operation's input without sending anything.
    Check {
        #[command(subcommand)]
        op: CheckOp,
        /// Token decimals used to parse amounts.
        #[arg(long, global = true, default_value_t = 18)]
        decimals: u8,
    },
    /// Answer a read-only token query from a snapshot file.
    Query {
        #[arg(long)]
        chain_id: Option<u64>,
        #[arg(long)]
        account: Address,
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        url: Option<String>,
        #[command(subcommand)]
        query: QueryOp,
    },
    /// Print the recognized state paths.
    Paths,
}

#[derive(Subcommand, Debug)]
enum QueryOp {
    Allowance {
        /// Blank means `--account`.
        #[arg(long, default_value = "")]
        owner: String,
        #[arg(long, default_value = "")]
        spender: String,
    },
    VotingPower {
        /// Blank means `--account`.
        #[arg(long, default_value = "")]
        address: String,
    },
    Circulation {
        /// `YYYY-MM-DDTHH:MM` (UTC).
        #[arg(long, default_value = "")]
        at: String,
    },
    /// Print the wallet_watchAsset request for the token.
    WatchAsset,
}

#[derive(Subcommand, Debug)]
enum CheckOp {
    Transfer {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },
    Approve {
        #[arg(long)]
        spender: String,
        #[arg(long)]
        amount: String,
    },
    Permit {
        #[arg(long)]
        spender: String,
        #[arg(long)]
        amount: String,
        /// `YYYY-MM-DDTHH:MM` (UTC); defaults to the configured offset from now.
        #[arg(long)]
        deadline: Option<String>,
    },
    Delegate {
        /// Blank delegates to `--account`.
        #[arg(long, default_value = "")]
        delegatee: String,
        #[arg(long)]
        account: Address,
    },
    TransferOwnership {
        #[arg(long)]
        to: String,
    },
}


fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone().unwrap_or_else(resolve_config_dir);
    let output = run(&config_dir, cli.command)?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}


fn resolve_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("TRACER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".config").join("tracer")
}


fn run(config_dir: &Path, command: Command) -> Result<String> {
    let data = Data::new(config_dir)
        .wrap_err_with(|| format!("loading settings from {}", config_dir.display()))?;

    match command {
        Command::Chains => Ok(list_chains(&data)),
        Command::Launch { url } => {
            let params = LaunchParams::from_url(&url)?;
            Ok(serde_json::to_string_pretty(&params.to_value())?)
        }
        Command::Render {
            chain_id,
            account,
            snapshot,
            url,
            json,
        } => render(&data, chain_id, account, &snapshot, url.as_deref(), json),
        Command::Query {
            chain_id,
            account,
            snapshot,
            url,
            query,
        } => query_snapshot(&data, chain_id, account, &snapshot, url.as_deref(), query),
        Command::Tui {
            chain_id,
            account,
            snapshot,
            url,
        } => {
            let session = connect(&data, chain_id, account, url.as_deref())?;
            let reader = Box::new(FileReader::new(snapshot));
            Tui::new(session, reader)
                .and_then(|mut tui| tui.run())
                .wrap_err("terminal UI failed")?;
            Ok(String::new())
        }
        Command::Check { op, decimals } => check(&data, op, decimals),
        Command::Paths => Ok(KNOWN_PATHS.join("\n")),
    }
}


fn list_chains(data: &Data) -> String {
    data.settings()
        .chains
        .iter()
        .map(|(id, chain)| {
            let token = chain
                .token_address
                .map(|t| short_address(&t.to_string(), 4))
                .unwrap_or_else(|| "-".into());
            format!("{:<8} {:<18} token {:<13} {}", id, chain.name, token, chain.block_explorer)
        })
        .collect::<Vec<_>>()
        .join("\n")
}


/// Build an app store from the launch URL and connect `account`. Without
/// an explicit chain id the URL's `chain` parameter decides.
fn connect(
    data: &Data,
    chain_id: Option<u64>,
    account: Address,
    url: Option<&str>,
) -> Result<WalletSession> {
    let launch = match url {
        Some(url) => LaunchParams::from_url(url)?,
        None => LaunchParams::default(),
    };
    let chain_id = chain_id.unwrap_or_else(|| launch.chain.chain_id());
    let store = ObservableStore::for_app();
    launch.apply(&store)?;

    let session = WalletSession::new(store, data.settings().clone(), launch);
    if !session.connect(chain_id, account, now_ms())? {
        tracing::warn!(chain_id, "chain not configured; rendering without contract data");
    }
    Ok(session)
}


fn now_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}


fn render(
    data: &Data,
    chain_id: Option<u64>,
    account: Address,
    snapshot: &Path,
    url: Option<&str>,
    json: bool,
) -> Result<String> {
    let session = connect(data, chain_id, account, url)?;
    let store = session.store();
    let now_ms = now_ms();

    let reader = FileReader::new(snapshot);
    refresh_token(store, &reader)?;
    refresh_vesting(store, &reader, now_ms / 1000)?;

    if json {
        return Ok(serde_json::to_string_pretty(&store.snapshot())?);
    }
    Ok(Dashboard::from_store(store, &session.messages(), now_ms).to_string())
}


fn query_snapshot(
    data: &Data,
    chain_id: Option<u64>,
    account: Address,
    snapshot: &Path,
    url: Option<&str>,
    op: QueryOp,
) -> Result<String> {
    let session = connect(data, chain_id, account, url)?;
    let reader = FileReader::new(snapshot);
    let query = match op {
        QueryOp::Allowance { owner, spender } => Query::allowance(&owner, &spender, Some(account))?,
        QueryOp::VotingPower { address } => Query::voting_power(&address, Some(account))?,
        QueryOp::Circulation { at } => Query::circulation(&at)?,
        QueryOp::WatchAsset => {
            let asset = watch_asset_request(&session, &reader)?;
            return Ok(serde_json::to_string_pretty(&asset.to_rpc())?);
        }
    };
    Ok(run_query(&session, &reader, &query, now_ms())?.to_string())
}


fn check(data: &Data, op: CheckOp, decimals: u8) -> Result<String> {
    let now = chrono::Utc::now();
    let op = match op {
        CheckOp::Transfer { to, amount } => Operation::transfer(&to, &amount, decimals)?,
        CheckOp::Approve { spender, amount } => Operation::approve(&spender, &amount, decimals)?,
        CheckOp::Permit {
            spender,
            amount,
            deadline,
        } => {
            let deadline = deadline
                .unwrap_or_else(|| deadline_input(now, data.settings().deadline_minutes));
            let now_secs = u64::try_from(now.timestamp())
                .map_err(|_| eyre!("system clock before the epoch"))?;
            Operation::permit(&spender, &amount, &deadline, decimals, now_secs)?
        }
        CheckOp::Delegate { delegatee, account } => Operation::delegate(&delegatee, account)?,
        CheckOp::TransferOwnership { to } => Operation::transfer_ownership(&to)?,
    };
    Ok(format!("{}: {:?}", op.name(), op))
}


#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"
token:
  name: Tracer
  symbol: TRCR
  decimals: 18
  totalSupply: "1000000000000000000000000"
  balance: "1500000000000000000000"
  votingPower: "0"
  nonce: "0"
  delegates: "0x0000000000000000000000000000000000000000"
"#;

    const QUERY_SECTIONS: &str = r#"allowances:
  - owner: "0x1111111111111111111111111111111111111111"
    spender: "0x2222222222222222222222222222222222222222"
    amount: "40000000000000000000"
votes:
  - account: "0x3333333333333333333333333333333333333333"
    votes: "12000000000000000000"
circulation:
  - at: 1700000000
    supply: "250000000000000000000000"
"#;

    #[test]
    fn resolve_config_dir_default() {
        let old = std::env::var("TRACER_CONFIG_DIR").ok();
        std::env::remove_var("TRACER_CONFIG_DIR");
        let dir = resolve_config_dir();
        assert!(dir.to_string_lossy().contains(".config/tracer"));
        if let Some(v) = old {
            std::env::set_var("TRACER_CONFIG_DIR", v);
        }
    }

    #[test]
    fn cli_parses_render() {
        let cli = Cli::try_parse_from([
            "tracer",
            "render",
            "--chain-id",
            "421614",
            "--account",
            "0x1111111111111111111111111111111111111111",
            "--snapshot",
            "snap.yaml",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Render { chain_id: Some(421614), json: false, .. }));
    }

    #[test]
    fn chains_lists_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(dir.path(), Command::Chains).unwrap();
        assert!(out.contains("Arbitrum Sepolia"));
        assert!(out.contains("42161"));
    }

    #[test]
    fn launch_prints_mode() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(
            dir.path(),
            Command::Launch {
                url: "https://x/?vesting=0x2222222222222222222222222222222222222222".into(),
            },
        )
        .unwrap();
        assert!(out.contains("\"mode\": \"vesting\""));
    }

    #[test]
    fn render_from_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snap = dir.path().join("snap.yaml");
        std::fs::write(&snap, SNAPSHOT).unwrap();
        let out = run(
            dir.path(),
            Command::Render {
                chain_id: Some(421614),
                account: Address::repeat_byte(0x11),
                snapshot: snap,
                url: None,
                json: false,
            },
        )
        .unwrap();
        assert!(out.contains("Tracer (TRCR)"));
        assert!(out.contains("Balance:       1,500 TRCR"));
        assert!(out.contains("No delegate set"));
    }

    #[test]
    fn render_takes_chain_from_url() {
        let dir = tempfile::tempdir().unwrap();
        let snap = dir.path().join("snap.yaml");
        std::fs::write(&snap, SNAPSHOT).unwrap();
        let out = run(
            dir.path(),
            Command::Render {
                chain_id: None,
                account: Address::repeat_byte(0x11),
                snapshot: snap,
                url: Some("https://x/?chain=arbitrum-sepolia".into()),
                json: true,
            },
        )
        .unwrap();
        let tree: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(tree["wallet"]["chainId"], 421614);
        assert_eq!(tree["wallet"]["connected"], true);
    }

    fn query(dir: &Path, query: QueryOp) -> Result<String> {
        let snap = dir.join("snap.yaml");
        std::fs::write(&snap, format!("{}{}", SNAPSHOT, QUERY_SECTIONS)).unwrap();
        run(
            dir,
            Command::Query {
                chain_id: Some(421614),
                account: Address::repeat_byte(0x11),
                snapshot: snap,
                url: None,
                query,
            },
        )
    }

    #[test]
    fn query_voting_power_of_other_address() {
        let dir = tempfile::tempdir().unwrap();
        let out = query(
            dir.path(),
            QueryOp::VotingPower {
                address: "0x3333333333333333333333333333333333333333".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "Voting Power: 12 TRCR");
    }

    #[test]
    fn query_allowance_defaults_owner() {
        let dir = tempfile::tempdir().unwrap();
        let out = query(
            dir.path(),
            QueryOp::Allowance {
                owner: String::new(),
                spender: "0x2222222222222222222222222222222222222222".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "Allowance: 40 TRCR");
    }

    #[test]
    fn query_circulation_percentage() {
        let dir = tempfile::tempdir().unwrap();
        let out = query(
            dir.path(),
            QueryOp::Circulation {
                at: "2024-01-01T00:00".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "Circulation at 2024-01-01 00:00 UTC: 250,000 TRCR = 25%");
    }

    #[test]
    fn query_watch_asset_prints_request() {
        let dir = tempfile::tempdir().unwrap();
        let out = query(dir.path(), QueryOp::WatchAsset).unwrap();
        let rpc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(rpc["method"], "wallet_watchAsset");
        assert_eq!(rpc["params"]["options"]["symbol"], "TRCR");
        assert!(rpc["params"]["options"]["image"].as_str().unwrap().ends_with(".svg"));
    }

    #[test]
    fn query_rejects_missing_spender() {
        let dir = tempfile::tempdir().unwrap();
        let err = query(
            dir.path(),
            QueryOp::Allowance {
                owner: String::new(),
                spender: String::new(),
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Please enter spender address");
    }

    #[test]
    fn check_rejects_bad_address() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            dir.path(),
            Command::Check {
                op: CheckOp::Transfer {
                    to: "0x12".into(),
                    amount: "1".into(),
                },
                decimals: 18,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Invalid recipient address"));
    }

    #[test]
    fn paths_lists_known_paths() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(dir.path(), Command::Paths).unwrap();
        assert!(out.lines().any(|l| l == "wallet.account"));
    }
}
