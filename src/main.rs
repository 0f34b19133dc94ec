// src/main.rs

use std::io::{self, BufRead, Write as _};
use std::str::FromStr;
use std::sync::Arc;

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use orion::config::CONFIG;
use orion::context::SystemEnvironment;
use orion::identity::{self, DeviceKind, HostProbe};
use orion::llm::OpenAiClient;
use orion::memory::{MemoryManager, MemoryPolicy, TierClear};
use orion::persona::Mode;
use orion::prompt::builder::personality_summary;
use orion::session::{SessionController, SessionOptions};
use orion::storage::{FileStore, MemoryStore};

#[derive(Parser, Debug)]
#[command(name = "orion", version, about = "Personal assistant core with tiered memory")]
struct Args {
    /// Mode to start in: assistant, focus, creative, or technical
    #[arg(long)]
    mode: Option<String>,

    /// Send one message, print the reply, and exit instead of starting the REPL
    #[arg(long, short = 'm')]
    message: Option<String>,

    /// Override the data directory
    #[arg(long, env = "ORION_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = Level::from_str(&CONFIG.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting ORION");
    info!("Model: {}", CONFIG.model);

    let data_dir = args.data_dir.clone().unwrap_or_else(|| CONFIG.data_dir());
    let kv = FileStore::open(&data_dir)?;
    let identity = identity::get_or_create(&kv, &HostProbe);
    info!("Device: {} ({:?})", identity.id, identity.kind);

    let store = MemoryStore::new(Box::new(kv), &identity.id);
    let manager = MemoryManager::new(
        store,
        MemoryPolicy {
            short_term_cap: CONFIG.short_term_cap,
            medium_capacity: CONFIG.medium_capacity,
            decisions_cap: CONFIG.decisions_cap,
        },
    );

    let client = Arc::new(OpenAiClient::from_env(&CONFIG.api_base_url, &CONFIG.model)?);
    let environment = Box::new(SystemEnvironment::new(DeviceKind::Desktop, true));
    let options = SessionOptions {
        turn_timeout: CONFIG.turn_timeout(),
        medium_limit: CONFIG.medium_select_limit,
        long_limit: CONFIG.long_select_limit,
        fact_delta: CONFIG.fact_reinforce_delta,
    };
    let mut session = SessionController::new(manager, client, environment, options);

    // CLI flag wins; the configured default applies to a fresh install and
    // the persisted mode thereafter.
    match args.mode.as_deref() {
        Some(raw) => match Mode::from_str(raw) {
            Ok(mode) => session.set_mode(mode),
            Err(()) => anyhow::bail!(
                "unknown mode '{}' (expected assistant, focus, creative, or technical)",
                raw
            ),
        },
        None => {
            if session.manager().store().last_sync().is_none() {
                if let Ok(mode) = Mode::from_str(&CONFIG.default_mode) {
                    session.set_mode(mode);
                }
            }
        }
    }

    if let Some(message) = &args.message {
        run_one(&mut session, message).await;
        session.shutdown();
        return Ok(());
    }

    println!(
        "{} ready — mode: {} (/help for commands)",
        session.personality().name,
        session.mode()
    );

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(&mut session, command) {
                break;
            }
            continue;
        }
        run_one(&mut session, line).await;
    }

    session.shutdown();
    println!("goodbye");
    Ok(())
}

/// Run one turn; Ctrl-C while the model is thinking cancels just that turn.
async fn run_one(session: &mut SessionController, message: &str) {
    let token = session.cancellation_token();
    let turn = session.run_turn(message);
    tokio::pin!(turn);
    let result = tokio::select! {
        result = &mut turn => result,
        _ = tokio::signal::ctrl_c() => {
            token.cancel();
            turn.await
        }
    };
    match result {
        Ok(report) => {
            println!("\n{}\n", report.reply);
            for action in &report.suggested_actions {
                println!("  ↪ {}", action.label);
            }
        }
        Err(err) => eprintln!("turn failed: {}", err),
    }
}

/// Returns false when the REPL should exit.
fn handle_command(session: &mut SessionController, command: &str) -> bool {
    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or("") {
        "help" => {
            println!("/mode [name]   show or switch mode");
            println!("/reset         clear the current conversation");
            println!("/memory        show memory status");
            println!("/forget [tier] clear medium, long, or all durable memory");
            println!("/quit          save and exit");
        }
        "mode" => match parts.next() {
            Some(raw) => match Mode::from_str(raw) {
                Ok(mode) => {
                    session.set_mode(mode);
                    println!("mode: {} — {}", mode, mode.config().description);
                }
                Err(()) => println!("unknown mode; try assistant, focus, creative, technical"),
            },
            None => {
                for mode in Mode::ALL {
                    let marker = if mode == session.mode() { "*" } else { " " };
                    println!("{} {} — {}", marker, mode, mode.config().description);
                }
            }
        },
        "reset" => {
            session.reset_conversation();
            println!("conversation cleared");
        }
        "memory" => {
            let manager = session.manager();
            println!("persona: {}", personality_summary(manager.personality()));
            println!("short term: {} turns", manager.short_term().len());
            println!(
                "projects: {}",
                manager
                    .select_relevant_medium("", usize::MAX)
                    .iter()
                    .map(|(key, _)| key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("facts: {}", manager.select_relevant_long("", usize::MAX).len());
            match manager.store().last_sync() {
                Some(at) => println!("last sync: {}", at.to_rfc3339()),
                None => println!("last sync: never"),
            }
        }
        "forget" => match parts.next() {
            Some("medium") => {
                session.clear_memory(TierClear::Medium);
                println!("medium-term memory cleared");
            }
            Some("long") => {
                session.clear_memory(TierClear::Long);
                println!("long-term memory cleared");
            }
            Some("all") => {
                session.clear_memory(TierClear::All);
                println!("all durable memory cleared");
            }
            _ => println!("usage: /forget medium|long|all"),
        },
        "quit" | "exit" => return false,
        other => println!("unknown command '/{}' (try /help)", other),
    }
    true
}
