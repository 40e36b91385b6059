//! Helpdesk Pins - keep a durable set of pinned helpdesk records.
//!
//! Tickets, conversations, knowledge-base articles and agents fetched from
//! the content API can be pinned for quick access. Pins are kept in a local
//! key-value store and survive between sessions.
//!
//!   helpdesk-pins pin ticket '{"id":"42","title":"VPN down"}'
//!   helpdesk-pins list --kind ticket
//!   helpdesk-pins unpin ticket 42
//!   helpdesk-pins count --agent agent1 --input tickets.json

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use helpdesk_pins::application::{
    decode_tickets, format_pins_json, format_pins_markdown, format_pins_table, format_summary,
    format_tickets_table, format_workload, search_agents, ticket_count, tickets_for_agent,
    tickets_with_status, unassigned_tickets, workload_by_agent, OutputFormat, PinBoard,
};
use helpdesk_pins::cli::{Cli, Commands};
use helpdesk_pins::domain::settings::PathConfig;
use helpdesk_pins::domain::{
    self, AppConfig, PinKind, PinnedStore, StorageBackend, Ticket, TicketStatus,
};
use helpdesk_pins::infrastructure::{
    config_file_path, ensure_config_exists, load_config, load_config_from_file, open_store,
    save_config, KeyValueStore, LocalStorage,
};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli
        .output_format()
        .map_err(|message| domain::AppError::Config { message })?;

    let config_path = cli.config.clone().unwrap_or_else(config_file_path);

    if let Commands::InitConfig { data_dir } = &cli.command {
        return cmd_init_config(&config_path, data_dir.as_deref());
    }

    let config = if cli.config.is_some() {
        load_config_from_file(&config_path)
    } else {
        load_config()
    }
    .context("Failed to load configuration")?;

    if matches!(cli.command, Commands::Paths) {
        return cmd_paths(&config, &config_path);
    }

    let storage = open_store(&config).context("Failed to open pin storage")?;
    let mut board = PinBoard::open(storage, config.pin_policy());

    let result = match cli.command {
        Commands::List { kind } => cmd_list(&board, kind.as_deref(), format),
        Commands::Pin { kind, json, file } => {
            cmd_pin(&mut board, &kind, json.as_deref(), file.as_deref())
        }
        Commands::Unpin { kind, key } => cmd_unpin(&mut board, &kind, &key),
        Commands::Count { agent, input } => cmd_count(&board, &agent, input.as_deref(), format),
        Commands::Tickets {
            input,
            agent,
            status,
            unassigned,
        } => cmd_tickets(
            &board,
            input.as_deref(),
            agent.as_deref(),
            status,
            unassigned,
            format,
        ),
        Commands::Workload { input } => cmd_workload(&board, input.as_deref(), format),
        Commands::Agents { query } => cmd_agents(&board, &query, format),
        Commands::Clear => {
            board.clear();
            println!("{} Cleared all pins", "✓".green().bold());
            Ok(())
        }
        Commands::Summary => {
            println!("{}", format_summary(&board.snapshot()));
            Ok(())
        }
        Commands::Paths | Commands::InitConfig { .. } => Ok(()),
    };

    board.shutdown();
    result
}

/// List pinned items.
fn cmd_list(board: &PinBoard, kind: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    let kinds = match kind {
        Some(kind) => vec![kind.parse::<PinKind>()?],
        None => PinKind::ALL.to_vec(),
    };
    let snapshot = board.snapshot();

    let output = match format {
        OutputFormat::Table => format_pins_table(&snapshot, &kinds),
        OutputFormat::Markdown => format_pins_markdown(&snapshot, &kinds),
        OutputFormat::Json => format_pins_json(&snapshot).map_err(domain::AppError::json_parse)?,
    };

    println!("{output}");
    Ok(())
}

/// Pin a record from inline JSON or a file.
fn cmd_pin(
    board: &mut PinBoard,
    kind: &str,
    json: Option<&str>,
    file: Option<&Path>,
) -> anyhow::Result<()> {
    let raw = match (json, file) {
        (Some(json), _) => json.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .map_err(|e| domain::AppError::io(format!("Failed to read {}", path.display()), e))?,
        (None, None) => anyhow::bail!("Provide the record as JSON or with --file"),
    };

    let before = board.snapshot();
    board.pin_json(kind, &raw)?;
    let after = board.snapshot();

    let kind: PinKind = kind.parse()?;
    let verb = if board.policy().dedupe && before.len_of(kind) == after.len_of(kind) {
        "Refreshed"
    } else {
        "Pinned"
    };

    println!(
        "{} {} {} ({} {} pinned)",
        "✓".green().bold(),
        verb,
        kind,
        after.len_of(kind),
        kind.plural().to_lowercase()
    );
    Ok(())
}

/// Unpin a record by kind and identity key.
fn cmd_unpin(board: &mut PinBoard, kind: &str, key: &str) -> anyhow::Result<()> {
    let kind: PinKind = kind.parse()?;
    let before = board.snapshot().len_of(kind);

    board.unpin_key(kind, key);

    let removed = before - board.snapshot().len_of(kind);
    if removed == 0 {
        println!(
            "{} No pinned {} with {} '{}'",
            "!".yellow().bold(),
            kind,
            kind.identity_field(),
            key
        );
    } else {
        println!("{} Unpinned {} '{}'", "✓".green().bold(), kind, key);
    }
    Ok(())
}

/// Count tickets assigned to an agent.
fn cmd_count(
    board: &PinBoard,
    agent: &str,
    input: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let count = match input {
        Some(path) => {
            let tickets = read_tickets(path)?;
            ticket_count(Some(tickets.as_slice()), agent)
        }
        None => ticket_count(board.snapshot().tickets.as_deref(), agent),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "agent": agent, "count": count }));
        }
        OutputFormat::Table | OutputFormat::Markdown => {
            println!(
                "{} ticket(s) assigned to {}",
                count.to_string().cyan().bold(),
                agent
            );
        }
    }
    Ok(())
}

/// List tickets with optional filters.
fn cmd_tickets(
    board: &PinBoard,
    input: Option<&Path>,
    agent: Option<&str>,
    status: Option<String>,
    unassigned: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let tickets = load_tickets(board, input)?;

    let mut selected: Vec<&Ticket> = match agent {
        Some(agent) => tickets_for_agent(&tickets, agent),
        None if unassigned => unassigned_tickets(&tickets),
        None => tickets.iter().collect(),
    };

    if let Some(status) = status {
        selected = tickets_with_status(selected, &TicketStatus::from(status));
    }

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&selected).map_err(domain::AppError::json_parse)?;
            println!("{json}");
        }
        OutputFormat::Table | OutputFormat::Markdown => {
            println!("{}", format_tickets_table(&selected));
            println!("{} of {} ticket(s)", selected.len(), tickets.len());
        }
    }
    Ok(())
}

/// Show ticket counts per agent.
fn cmd_workload(
    board: &PinBoard,
    input: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let tickets = load_tickets(board, input)?;
    let workload = workload_by_agent(&tickets);

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&workload).map_err(domain::AppError::json_parse)?;
            println!("{json}");
        }
        OutputFormat::Table | OutputFormat::Markdown => println!("{}", format_workload(&workload)),
    }
    Ok(())
}

/// Search pinned agents.
fn cmd_agents(board: &PinBoard, query: &str, format: OutputFormat) -> anyhow::Result<()> {
    let snapshot = board.snapshot();
    let agents = snapshot.agents.as_deref().unwrap_or_default();
    let matches = search_agents(agents, query);

    if let OutputFormat::Json = format {
        let json = serde_json::to_string_pretty(&matches).map_err(domain::AppError::json_parse)?;
        println!("{json}");
        return Ok(());
    }

    let view = PinnedStore {
        agents: Some(matches.into_iter().cloned().collect()),
        ..PinnedStore::empty()
    };
    let output = match format {
        OutputFormat::Markdown => format_pins_markdown(&view, &[PinKind::Agent]),
        OutputFormat::Table | OutputFormat::Json => format_pins_table(&view, &[PinKind::Agent]),
    };
    println!("{output}");
    Ok(())
}

/// Show storage and configuration paths.
fn cmd_paths(config: &AppConfig, config_path: &Path) -> anyhow::Result<()> {
    println!("{}", "📂 Helpdesk Pins Paths".bold());
    println!();
    println!("  Data directory: {}", config.data_dir().display());
    println!("  Config file:    {}", config_path.display());

    match config.storage.backend {
        StorageBackend::Sqlite => {
            let db_path = config.storage_db_path();
            println!("  Database:       {}", db_path.display());

            if db_path.exists() {
                let storage = LocalStorage::open(&db_path)?;
                let keys = storage.keys()?;
                println!("  Stored keys:    {}", keys.join(", "));
                if let Some(raw) = storage.get(domain::PINNED_STORE_KEY)? {
                    println!("  Snapshot size:  {} bytes", raw.len());
                }
            }
        }
        StorageBackend::Memory => println!("  Database:       {}", "in-memory".dimmed()),
    }

    Ok(())
}

/// Write a configuration file if none exists.
fn cmd_init_config(path: &Path, data_dir: Option<&Path>) -> anyhow::Result<()> {
    let created = match data_dir {
        Some(dir) if !path.exists() => {
            let config = AppConfig {
                paths: PathConfig {
                    data_dir: Some(dir.to_path_buf()),
                },
                ..AppConfig::default()
            };
            save_config(&config, path)?;
            true
        }
        Some(_) => false,
        None => ensure_config_exists(path)?,
    };

    if created {
        println!("{} Created {}", "✓".green().bold(), path.display());
    } else {
        println!("{} {} already exists", "!".yellow().bold(), path.display());
    }
    Ok(())
}

/// Tickets from a JSON file, or the pinned tickets.
fn load_tickets(board: &PinBoard, input: Option<&Path>) -> anyhow::Result<Vec<Ticket>> {
    match input {
        Some(path) => read_tickets(path),
        None => Ok(board.snapshot().tickets.clone().unwrap_or_default()),
    }
}

fn read_tickets(path: &Path) -> anyhow::Result<Vec<Ticket>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tickets from {}", path.display()))?;
    let tickets = decode_tickets(&raw)
        .with_context(|| format!("Failed to parse tickets in {}", path.display()))?;
    tracing::debug!(count = tickets.len(), path = %path.display(), "Loaded tickets");
    Ok(tickets)
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
