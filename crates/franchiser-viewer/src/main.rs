//! `franchiser`: explore Franchiser delegation trees from the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;

use franchiser_chain::{DelegationFetcher, EnsResolver, FranchiserLens, JsonRpcClient};
use franchiser_names::NameCache;
use franchiser_tree::SortPolicy;
use franchiser_types::parse_address;
use franchiser_viewer::console::{run_console, ConsoleOptions};
use franchiser_viewer::{demo, init_logging, print, Explorer, LogTarget, ViewerConfig};

#[derive(Parser)]
#[command(name = "franchiser", version, about = "Explore Franchiser delegation trees")]
struct Cli {
    /// Owner address or ENS name.
    owner: Option<String>,

    /// Delegatee address or ENS name.
    delegatee: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint; overrides the config file and FRANCHISER_RPC_URL.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Lens contract address; overrides the config file.
    #[arg(long)]
    lens: Option<String>,

    /// Print the tree as text and exit.
    #[arg(long, conflicts_with = "json")]
    plain: bool,

    /// Print the tree as JSON and exit.
    #[arg(long)]
    json: bool,

    /// Use built-in sample data instead of a node.
    #[arg(long)]
    demo: bool,

    /// Sibling order: "lexicographic" or "first-char".
    #[arg(long)]
    sort: Option<SortPolicy>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ViewerConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.rpc_url {
        config.rpc_url = url.clone();
    }
    if let Some(lens) = &cli.lens {
        let address = parse_address(lens).with_context(|| format!("invalid --lens '{lens}'"))?;
        config.lens_address = Some(address);
    }
    if let Some(sort) = cli.sort {
        config.sort_policy = sort;
    }
    config.validate()?;

    let interactive = !cli.plain && !cli.json;
    let target = if interactive { LogTarget::console_default() } else { LogTarget::Stderr };
    init_logging(config.log_format()?, &config.log_level, target)?;

    let (explorer, endpoint) = if cli.demo {
        tracing::info!("Using built-in demo data");
        let chain = Arc::new(demo::demo_chain());
        let names = Arc::new(NameCache::new(chain.clone(), demo::demo_suspected_names()));
        (Explorer::new(DelegationFetcher::new(chain), names), "demo".to_string())
    } else {
        let lens_address = config.lens_address.ok_or_else(|| {
            anyhow!(
                "no lens contract configured; set lens_address in the config file or pass --lens"
            )
        })?;
        let rpc = Arc::new(JsonRpcClient::with_timeouts(
            config.rpc_url.clone(),
            config.request_timeout(),
            config.connect_timeout(),
        ));
        match rpc.chain_id().await {
            Ok(id) if id != config.chain_id => {
                tracing::warn!(
                    expected = config.chain_id,
                    actual = id,
                    "RPC endpoint serves a different chain"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(url = %config.rpc_url, error = %e, "Could not query chain id"),
        }

        let lens = FranchiserLens::new(rpc.clone(), lens_address);
        let ens = EnsResolver::new(rpc)
            .with_registry(config.ens_registry)
            .with_ipfs_gateway(config.ipfs_gateway.clone());
        let names = Arc::new(NameCache::new(Arc::new(ens), config.suspected()?));
        (Explorer::new(DelegationFetcher::new(Arc::new(lens)), names), config.rpc_url.clone())
    };
    let explorer = Arc::new(explorer);

    let (default_owner, default_delegatee) = if cli.demo {
        (Some(demo::DEMO_OWNER), Some(demo::DEMO_DELEGATEE))
    } else {
        (None, None)
    };
    let owner = match &cli.owner {
        Some(text) => Some(
            explorer
                .resolve_party(text)
                .await
                .ok_or_else(|| anyhow!("could not resolve owner '{text}'"))?,
        ),
        None => default_owner,
    };
    let delegatee = match &cli.delegatee {
        Some(text) => Some(
            explorer
                .resolve_party(text)
                .await
                .ok_or_else(|| anyhow!("could not resolve delegatee '{text}'"))?,
        ),
        None => default_delegatee,
    };

    if interactive {
        let _ = explorer.set_parties(owner, delegatee);
        return run_console(explorer, ConsoleOptions { sort: config.sort_policy, endpoint }).await;
    }

    if owner.is_none() || delegatee.is_none() {
        bail!("--plain and --json need both an owner and a delegatee");
    }
    if let Some(fetch) = explorer.set_parties(owner, delegatee) {
        fetch.await?;
    }
    if let Some(names) = explorer.request_names() {
        names.await?;
    }

    let snapshot = explorer.snapshot();
    let view = explorer.view(config.sort_policy);
    let selection = explorer.selection();
    if cli.json {
        println!("{}", print::json_report(&snapshot, view.as_ref(), selection.as_ref())?);
    } else {
        let report = print::plain_report(&snapshot, view.as_ref(), selection.as_ref(), |a| {
            explorer.display_name_for(a)
        });
        println!("{report}");
    }
    Ok(())
}
