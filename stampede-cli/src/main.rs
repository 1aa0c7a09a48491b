//! Load-run harness: spawns virtual users, paces iterations, reports totals.
//!
//! Scheduling lives entirely here. The session engine only ever sees one
//! virtual user at a time; each user runs as an independent tokio task with
//! its own transport, session, and random source.

use anyhow::{Context, Result};
use clap::Parser;
use rand::seq::IndexedRandom;
use rand::{rngs::StdRng, Rng, SeedableRng};
use stampede_config::{ConfigLoader, StampedeConfig};
use stampede_core::{FlowCatalog, PageExtractor, RegexExtractor, VirtualUser};
use stampede_http::{Transport, WebTransport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::Cli;

/// Run-wide totals, updated by every virtual-user task
#[derive(Default)]
struct RunStats {
    completed: AtomicU64,
    failed: AtomicU64,
    aborted_users: AtomicU64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ConfigLoader::new()
        .load(cli.config.as_ref())
        .context("failed to load configuration")?;
    cli.apply(&mut config);
    config
        .validate_all()
        .context("configuration is invalid after command-line overrides")?;

    let catalog = Arc::new(FlowCatalog::with_builtin());
    for flow in &config.load.flows {
        if catalog.get(flow).is_none() {
            anyhow::bail!(
                "unknown flow '{}'; available flows: {}",
                flow,
                catalog.names().join(", ")
            );
        }
    }

    info!(
        users = config.load.users,
        host = %config.target.host,
        flows = ?config.load.flows,
        "starting load run"
    );

    let stats = Arc::new(RunStats::default());
    let extractor: Arc<dyn PageExtractor> = Arc::new(RegexExtractor);
    let ramp_up = config.load.ramp_up;
    let config = Arc::new(config);

    let mut handles = Vec::with_capacity(config.load.users);
    for index in 0..config.load.users {
        let user_config = config.clone();
        let catalog = catalog.clone();
        let extractor = extractor.clone();
        let stats = stats.clone();
        let seed = cli.seed.map(|seed| seed.wrapping_add(index as u64));

        handles.push(tokio::spawn(async move {
            run_virtual_user(index, user_config, catalog, extractor, stats, seed).await;
        }));

        if ramp_up > Duration::ZERO && index + 1 < config.load.users {
            sleep(ramp_up).await;
        }
    }

    for handle in handles {
        let _ = handle.await;
    }

    info!(
        completed = stats.completed.load(Ordering::Relaxed),
        failed = stats.failed.load(Ordering::Relaxed),
        aborted_users = stats.aborted_users.load(Ordering::Relaxed),
        "load run finished"
    );
    Ok(())
}

/// One virtual user's whole life: bootstrap once, then iterate flows with
/// think time in between until the iteration limit is reached or a fatal
/// session error ends the run.
async fn run_virtual_user(
    index: usize,
    config: Arc<StampedeConfig>,
    catalog: Arc<FlowCatalog>,
    extractor: Arc<dyn PageExtractor>,
    stats: Arc<RunStats>,
    seed: Option<u64>,
) {
    let transport: Arc<dyn Transport> =
        match WebTransport::new(&config.target.host, &config.http.clone().into()) {
            Ok(transport) => Arc::new(transport),
            Err(e) => {
                error!(user = index, "transport setup failed: {}", e);
                stats.aborted_users.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

    let mut user = match VirtualUser::bootstrap(
        index,
        transport,
        extractor,
        &config.target,
        catalog,
        seed,
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            error!(user = index, "bootstrap failed: {}", e);
            stats.aborted_users.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    // Separate stream from the session's own randomness so flow sampling
    // does not disturb in-flow draws under a fixed seed
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed.rotate_left(17)),
        None => StdRng::from_os_rng(),
    };

    let mut iteration: u64 = 0;
    loop {
        if let Some(limit) = config.load.iterations {
            if iteration >= limit {
                break;
            }
        }

        let Some(flow) = config.load.flows.choose(&mut rng).cloned() else {
            break;
        };

        match user.run_flow(&flow).await {
            Ok(()) => {
                stats.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if e.is_fatal() => {
                error!(user = index, flow = %flow, "fatal session error: {}", e);
                stats.aborted_users.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Err(e) => {
                warn!(user = index, flow = %flow, "flow iteration failed: {}", e);
                stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }

        iteration += 1;
        sleep(think_time(
            &mut rng,
            config.load.wait_min,
            config.load.wait_max,
        ))
        .await;
    }
}

/// Uniform think time within the configured bounds
fn think_time(rng: &mut StdRng, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let spread = (max - min).as_millis() as u64;
    min + Duration::from_millis(rng.random_range(0..=spread))
}
