mod cli;

use std::{env, fs, path::Path, sync::Arc};

use clap::Parser;
use cli::{Cli, Commands, RunConfig};
use poda_bundle::Item;
use poda_device::{Device, PeerTransport, PodaDevice};
use poda_exec_state::{ExecState, Pass};
use poda_executor::PodaExecutor;
use poda_router::{ComputeClient, ComputeError, Router, RouterRequest, ComputeRequest};
use poda_storage::ProcessCache;
use poda_wallet::Wallet;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let env_filter = match rust_log.is_empty() {
        true => EnvFilter::builder().parse_lossy("info"),
        false => EnvFilter::builder().parse_lossy(rust_log),
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(config) => run(config).await,
    }
}

async fn run(config: RunConfig) {
    let wallet = load_or_generate_wallet(config.data_dir.as_deref());
    info!(address = %wallet.to_address(), "node identity");

    let store = Arc::new(ProcessCache::with_capacity(config.cache_size));
    let executor = match PodaExecutor::new() {
        Ok(executor) => executor,
        Err(err) => {
            error!(%err, "failed to start executor");
            return;
        }
    };
    let transport = spawn_idle_transport();
    let device = PodaDevice::new(executor, transport);

    let process = match load_fixture(&config.process) {
        Ok(item) => item,
        Err(err) => {
            error!(%err, path = %config.process.display(), "failed to load process definition");
            return;
        }
    };
    // init runs once, at startup, against the hosting process's own tags —
    // not per message. A failure here is fatal (spec.md §7 InvalidOptions).
    let device_options = match device.init(&process, &wallet) {
        Ok(options) => options,
        Err(err) => {
            error!(%err, "fatal options error, aborting run");
            return;
        }
    };

    let outer = match load_fixture(&config.fixture) {
        Ok(item) => item,
        Err(err) => {
            error!(%err, path = %config.fixture.display(), "failed to load fixture");
            return;
        }
    };

    let state = ExecState::new(wallet, store).with_pass(Pass::PreExecution);
    let (outcome, state) = device.execute(&outer, state, &device_options).await;
    info!(?outcome, "pre-execution complete");

    let state = state.with_pass(Pass::PostResults);
    let state = device.push(&outer, state).await;
    info!(outbox = ?state.result("/Outbox"), "post-results complete");
}

fn load_fixture(path: &Path) -> anyhow::Result<Item> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Reads `<data_dir>/wallet.key`, generating and saving a new one if absent.
/// An ephemeral wallet is used when `data_dir` is omitted.
fn load_or_generate_wallet(data_dir: Option<&Path>) -> Wallet {
    let Some(data_dir) = data_dir else {
        return Wallet::generate();
    };
    let key_path = data_dir.join("wallet.key");

    if let Ok(bytes) = fs::read(&key_path) {
        if let Ok(wallet) = Wallet::from_bytes(&bytes) {
            return wallet;
        }
        error!(path = %key_path.display(), "wallet key is corrupt, generating a new one");
    }

    let wallet = Wallet::generate();
    if let Err(err) = fs::create_dir_all(data_dir).and_then(|()| fs::write(&key_path, wallet.to_bytes())) {
        error!(%err, path = %key_path.display(), "failed to persist wallet key");
    }
    wallet
}

/// No peer networking layer ships with this host: every route and compute
/// request resolves to "no peer" until a real transport is wired in.
fn spawn_idle_transport() -> PeerTransport {
    let (router_tx, mut router_rx) = mpsc::channel::<RouterRequest>(8);
    let (compute_tx, mut compute_rx) = mpsc::channel::<ComputeRequest>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                request = router_rx.recv() => match request {
                    Some(RouterRequest::FindComputeNode { reply, .. }) => {
                        let _ = reply.send(None);
                    }
                    None => break,
                },
                request = compute_rx.recv() => match request {
                    Some(ComputeRequest::Compute { reply, .. }) => {
                        let _ = reply.send(Err(ComputeError::Unreachable));
                    }
                    None => break,
                },
            }
        }
    });

    PeerTransport {
        router: Router::new(router_tx),
        compute_client: ComputeClient::new(compute_tx),
    }
}
