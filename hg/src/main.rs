//! hg - Harada Method grid generator
//!
//! CLI entry point for generating, viewing, editing and exporting grids.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use harada::cli::{Cli, Command, KeyCommand};
use harada::config::{Config, GenerationConfig};
use harada::domain::{CellEdit, EditKey, GenerationState, GenerationStatus, Grid, Slot};
use harada::export::{ExportFormat, export, export_filename, import_json};
use harada::generation::{GenerationError, GenerationEvent, Pipeline};
use harada::layout::AnimationTiming;
use harada::llm::create_client;
use harada::render::{RenderOptions, render_grid, render_outline, reveal};
use harada::store::{CredentialSource, GridStore, resolve_credential};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, data_dir: &Path) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = data_dir.join("logs");
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("harada.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.storage.expanded_data_dir());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref(), &data_dir)
        .context("Failed to setup logging")?;
    info!(data_dir = %data_dir.display(), model = %config.llm.model, "hg loaded config");

    let store = GridStore::open(&data_dir)?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Generate {
            goal,
            api_key,
            save_key,
            no_delay,
        } => {
            debug!("main: matched Generate command");
            cmd_generate(&config, &store, &goal, api_key.as_deref(), save_key, no_delay).await
        }
        Command::Example => {
            debug!("main: matched Example command");
            cmd_example(&store)
        }
        Command::Show {
            outline,
            reveal,
            no_color,
        } => {
            debug!(outline, reveal, no_color, "main: matched Show command");
            cmd_show(&store, outline, reveal, no_color).await
        }
        Command::Edit { pillar, task, text } => {
            debug!(pillar, ?task, "main: matched Edit command");
            cmd_edit(&store, pillar, task, &text)
        }
        Command::Export { format, output } => {
            debug!(?format, ?output, "main: matched Export command");
            cmd_export(&store, format, output)
        }
        Command::Import { file } => {
            debug!(file = %file.display(), "main: matched Import command");
            cmd_import(&store, &file)
        }
        Command::Reset { yes } => {
            debug!(yes, "main: matched Reset command");
            cmd_reset(&store, yes)
        }
        Command::Key { command } => {
            debug!("main: matched Key command");
            cmd_key(&config, &store, command)
        }
    }
}

fn load_active(store: &GridStore) -> Result<Grid> {
    match store.load_grid()? {
        Some(grid) => Ok(grid),
        None => bail!("No active grid. Run `hg generate <GOAL>` or `hg example` first"),
    }
}

async fn cmd_generate(
    config: &Config,
    store: &GridStore,
    goal: &str,
    api_key: Option<&str>,
    save_key: bool,
    no_delay: bool,
) -> Result<()> {
    debug!(%goal, save_key, no_delay, "cmd_generate: called");

    // Reject a blank goal before touching credentials or the active grid
    let mut grid = Grid::new(goal)?;

    let stored = store.load_credential()?;
    let (key, source) = resolve_credential(api_key, stored.as_deref(), &config.llm.api_key_env)?;
    debug!(?source, "cmd_generate: resolved credential");

    if save_key && source == CredentialSource::Flag {
        store.save_credential(&key)?;
        println!("API key saved");
    }

    let client = create_client(&config.llm, &key).map_err(GenerationError::from)?;
    let generation = if no_delay {
        GenerationConfig::immediate()
    } else {
        config.generation.clone()
    };
    let pipeline = Pipeline::new(client, generation);

    // Generation replaces the active grid
    store.save_grid(&grid)?;
    println!("{} {}\n", "Goal:".bold(), grid.goal.bold().yellow());

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("cmd_generate: interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    let mut starting = GenerationState::new();
    starting.start();
    println!("{}", starting.status_line().dimmed());

    // The run writes into the stored grid only while that grid is still its own
    let run = grid.clone();
    let stop = cancel.clone();
    let mut detached = false;
    let state = pipeline
        .generate_into(&mut grid, cancel, |event, grid| {
            match event {
                GenerationEvent::PillarReady { pillar, title } => {
                    println!("  {} {}", format!("[{}]", pillar + 1).cyan(), title.bold());
                }
                GenerationEvent::TaskReady { pillar, task, text } => {
                    if *task == 0 {
                        println!("\n{}", grid.pillars[*pillar].title.cyan());
                    }
                    println!("    {}. {}", task + 1, text);
                }
                // Reported once, by the final status below
                GenerationEvent::Error { .. } | GenerationEvent::Done => {}
            }
            match store.sync_event(&run, event) {
                Ok(true) => {}
                Ok(false) => {
                    if !detached {
                        info!("cmd_generate: active grid was reset or replaced, stopping");
                        detached = true;
                        stop.cancel();
                    }
                }
                Err(e) => warn!(error = %e, "cmd_generate: failed to save grid"),
            }
        })
        .await?;

    info!(status = ?state.status, detached, "cmd_generate: finished");
    if detached {
        println!("\n{}", "The active grid was reset or replaced; generation stopped".yellow());
        return Ok(());
    }

    let saved = store.load_grid()?.unwrap_or(grid);
    match &state.status {
        GenerationStatus::Completed => {
            println!("\n{}\n", state.status_line().green());
            print!("{}", render_grid(&saved, RenderOptions::default()));
            Ok(())
        }
        GenerationStatus::Cancelled => {
            println!("\n{} ({} of 64 tasks kept)", state.status_line().yellow(), saved.filled_tasks());
            Ok(())
        }
        _ => {
            let message = state.error().unwrap_or("generation did not finish").to_string();
            bail!("{} ({} of 64 tasks kept)", message, saved.filled_tasks())
        }
    }
}

fn cmd_example(store: &GridStore) -> Result<()> {
    debug!("cmd_example: called");
    let grid = Grid::example();
    store.save_grid(&grid)?;
    println!("Loaded example grid: {}", grid.goal.bold());
    Ok(())
}

async fn cmd_show(store: &GridStore, outline: bool, animate: bool, no_color: bool) -> Result<()> {
    debug!(outline, animate, no_color, "cmd_show: called");
    if no_color {
        colored::control::set_override(false);
    }

    let grid = load_active(store)?;
    if outline {
        print!("{}", render_outline(&grid));
    } else if animate {
        let mut stdout = io::stdout();
        reveal(&grid, AnimationTiming::default(), &mut stdout).await?;
    } else {
        let options = RenderOptions {
            color: !no_color,
            ..RenderOptions::default()
        };
        print!("{}", render_grid(&grid, options));
    }
    Ok(())
}

fn cmd_edit(store: &GridStore, pillar: u8, task: Option<u8>, text: &str) -> Result<()> {
    debug!(pillar, ?task, "cmd_edit: called");
    let mut grid = load_active(store)?;

    let pillar = usize::from(pillar) - 1;
    let slot = match task {
        Some(t) => Slot::Task {
            pillar,
            task: usize::from(t) - 1,
        },
        None => Slot::Pillar(pillar),
    };

    let mut edit = CellEdit::begin(grid.get(slot).unwrap_or_default());
    edit.input(text);
    let outcome = edit.finish(EditKey::Commit);

    if grid.apply_edit(slot, &outcome)? {
        store.save_grid(&grid)?;
        println!("Updated {}: {}", slot, outcome.content());
    } else {
        println!("No change to {}", slot);
    }
    Ok(())
}

fn cmd_export(store: &GridStore, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    debug!(?format, ?output, "cmd_export: called");
    let grid = load_active(store)?;
    let content = export(&grid, format)?;

    let path = match output {
        Some(path) if path.as_os_str() == "-" => {
            print!("{}", content);
            return Ok(());
        }
        Some(path) => path,
        None => PathBuf::from(export_filename(&grid.goal, chrono::Utc::now(), format)),
    };

    fs::write(&path, content).context(format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "cmd_export: wrote export");
    println!("Exported to {}", path.display());
    Ok(())
}

fn cmd_import(store: &GridStore, file: &Path) -> Result<()> {
    debug!(file = %file.display(), "cmd_import: called");
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let grid = import_json(&content)?;
    store.save_grid(&grid)?;
    println!("Imported grid: {}", grid.goal.bold());
    Ok(())
}

fn cmd_reset(store: &GridStore, yes: bool) -> Result<()> {
    debug!(yes, "cmd_reset: called");
    if !yes {
        print!("Discard the active grid? [y/N] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Aborted");
            return Ok(());
        }
    }

    if store.clear_grid()? {
        println!("Active grid discarded");
    } else {
        println!("No active grid");
    }
    Ok(())
}

fn cmd_key(config: &Config, store: &GridStore, command: KeyCommand) -> Result<()> {
    match command {
        KeyCommand::Set { key } => {
            debug!("cmd_key: matched Set");
            if !key.trim().starts_with("sk-") {
                eprintln!("{} key does not start with `sk-`; storing it anyway", "warning:".yellow());
            }
            store.save_credential(&key)?;
            println!("API key saved");
        }
        KeyCommand::Clear => {
            debug!("cmd_key: matched Clear");
            if store.clear_credential()? {
                println!("API key removed");
            } else {
                println!("No stored API key");
            }
        }
        KeyCommand::Status => {
            debug!("cmd_key: matched Status");
            let stored = store.load_credential()?;
            match resolve_credential(None, stored.as_deref(), &config.llm.api_key_env) {
                Ok((key, source)) => {
                    let from = match source {
                        CredentialSource::Flag => "--api-key".to_string(),
                        CredentialSource::Stored => "stored key".to_string(),
                        CredentialSource::Environment => format!("${}", config.llm.api_key_env),
                    };
                    println!("API key {} (from {})", mask(&key), from);
                }
                Err(e) => println!("{}", e),
            }
        }
    }
    Ok(())
}

/// `sk-…abcd`
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}
