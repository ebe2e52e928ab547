// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod input;
pub mod logging;
pub mod mana;
pub mod types;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, PickArgs, RunArgs};
use crate::config::{ConfigFile, SchedulerConfig, default_config_path, load_and_validate};
use crate::dag::Dispatched;
use crate::engine::{SchedulerHandle, spawn_scheduler};
use crate::errors::MsgschedError;
use crate::exec::{MessageHandler, WorkerPool};
use crate::input::{InputCommand, parse_line};
use crate::mana::WeightedSelector;

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Run(run_args) => run_scheduler(run_args).await,
        Command::Pick(pick_args) => {
            print_pick(pick_args);
            Ok(())
        }
    }
}

/// `msgsched run`.
///
/// This wires together:
/// - config loading
/// - the scheduler actor and its outbox
/// - the worker pool
/// - the stdin line protocol
/// - Ctrl-C handling
async fn run_scheduler(args: RunArgs) -> Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(workers) = args.workers {
        anyhow::ensure!(workers >= 1, "--workers must be >= 1");
        cfg.scheduler.workers = workers;
    }

    if args.dry_run {
        print_dry_run(&cfg.scheduler);
        return Ok(());
    }

    let running = spawn_scheduler(&cfg.scheduler);
    let handle = running.handle.clone();

    let printer = Arc::new(PrintingHandler {
        booker: args.auto_book.then(|| handle.clone()),
    });
    let workers = WorkerPool::spawn(cfg.scheduler.workers, running.outbox.clone(), printer);

    let mut discards = running.discards;
    let discard_printer = tokio::spawn(async move {
        while let Some(item) = discards.recv().await {
            println!("discarded {} {:?}", item.id, item.reason);
        }
    });

    read_commands(&handle).await?;

    if !handle.is_closed() {
        let report = handle.shutdown().await?;
        info!(
            released = report.released.len(),
            discarded = report.discarded.len(),
            "scheduler shut down"
        );
    }

    running
        .task
        .await
        .context("scheduler task panicked")??;
    workers.join().await;
    discard_printer.await.context("discard printer panicked")?;

    Ok(())
}

/// Feed stdin lines into the scheduler until EOF, `shutdown`, or Ctrl-C.
async fn read_commands(handle: &SchedulerHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            res = &mut ctrl_c => {
                res.context("listening for Ctrl+C")?;
                info!("Ctrl+C received");
                return Ok(());
            }
        };

        let Some(line) = line else {
            debug!("stdin closed");
            return Ok(());
        };

        let command = match parse_line(&line, Instant::now()) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                warn!(error = %err, "ignoring input line");
                continue;
            }
        };

        match command {
            InputCommand::Submit(message) => {
                let id = message.id.clone();
                if let Err(err) = handle.submit(message).await {
                    warn!(id = %id, error = %err, "submission rejected");
                }
            }
            InputCommand::Booked(id) => handle.notify_booked(id).await?,
            InputCommand::Shutdown => return Ok(()),
        }
    }
}

fn load_config(path: Option<&str>) -> Result<ConfigFile> {
    match path {
        Some(path) => {
            load_and_validate(path).with_context(|| format!("loading config from {path}"))
        }
        None => {
            let path = default_config_path();
            if path.exists() {
                load_and_validate(&path)
                    .with_context(|| format!("loading config from {}", path.display()))
            } else {
                debug!(path = %path.display(), "no config file; using defaults");
                Ok(ConfigFile {
                    scheduler: SchedulerConfig::default(),
                })
            }
        }
    }
}

/// Worker-side handler for `msgsched run`: print each dispatched message and,
/// with `--auto-book`, report it booked.
struct PrintingHandler {
    booker: Option<SchedulerHandle>,
}

impl MessageHandler for PrintingHandler {
    fn handle(
        &self,
        message: Dispatched,
    ) -> Pin<Box<dyn Future<Output = errors::Result<()>> + Send + '_>> {
        Box::pin(async move {
            println!("dispatched {} weight={}", message.id, message.weight);

            if let Some(booker) = &self.booker {
                match booker.notify_booked(message.id).await {
                    Ok(()) | Err(MsgschedError::Closed) => {}
                    Err(err) => return Err(err),
                }
            }
            Ok(())
        })
    }
}

fn print_pick(args: PickArgs) {
    let mut selector = WeightedSelector::build(args.choices);
    let picked = match args.seed {
        Some(seed) => selector.pick_n(args.n, &mut StdRng::seed_from_u64(seed)),
        None => selector.pick_n(args.n, &mut rand::rng()),
    };

    for item in picked {
        println!("{item}");
    }
}

/// Simple dry-run output: print the effective scheduler settings.
fn print_dry_run(cfg: &SchedulerConfig) {
    println!("msgsched dry-run");
    println!("  scheduler.inbox_capacity = {}", cfg.inbox_capacity);
    println!("  scheduler.outbox_capacity = {}", cfg.outbox_capacity);
    println!("  scheduler.workers = {}", cfg.workers);
    println!("  scheduler.stall_policy = {:?}", cfg.stall_policy);
    println!("  scheduler.shutdown_policy = {:?}", cfg.shutdown_policy);
    println!("  scheduler.booked_history = {}", cfg.booked_history);

    debug!("dry-run complete (scheduler not started)");
}
