// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use cas_lookup::config::load_dotenv;
use cas_lookup::logging::{init_logger, level_for};
use cas_lookup::{bulk_lookup, lookup, Config, DataStore, Scope, SearchMatch};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cas-lookup")]
#[command(version)]
#[command(about = "Look up CAS numbers in the PMNACC and TSCA inventory tables", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a single CAS number
    Search {
        cas_number: String,

        /// all, pmnacc or tscainv
        #[arg(short, long, default_value = "all")]
        scope: String,

        #[arg(long)]
        json: bool,
    },

    /// Look up every CAS number found in a CSV or text file
    Bulk {
        file: PathBuf,

        #[arg(short, long, default_value = "all")]
        scope: String,

        #[arg(long)]
        json: bool,
    },

    /// Show which tables loaded and their record counts
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Interactive lookup screen (default)
    Ui,
}

fn main() -> Result<ExitCode> {
    load_dotenv();
    let cli = Cli::parse();

    // The TUI owns the terminal; keep log lines to warnings and above there
    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    init_logger(if interactive { "warn" } else { level_for(cli.verbose) });

    let store = DataStore::load(&cli.config);

    match cli.command {
        Some(Commands::Search { cas_number, scope, json }) => run_search(&store, &cas_number, &scope, json),
        Some(Commands::Bulk { file, scope, json }) => run_bulk(&store, &file, &scope, json),
        Some(Commands::Status { json }) => run_status(&store, json),
        None | Some(Commands::Ui) => run_ui_mode(store),
    }
}

fn run_search(store: &DataStore, cas_number: &str, scope: &str, json: bool) -> Result<ExitCode> {
    let outcome = scope
        .parse::<Scope>()
        .and_then(|scope| lookup(store, cas_number, scope));

    match outcome {
        Ok(results) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "results": results }))?);
            } else {
                println!("🔎 {} match(es) for {}\n", results.len(), cas_number.trim());
                print_matches(&results);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if json {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            } else {
                eprintln!("❌ {}", e);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_bulk(store: &DataStore, file: &Path, scope: &str, json: bool) -> Result<ExitCode> {
    let bytes = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let content = String::from_utf8(bytes).with_context(|| format!("{} is not valid UTF-8", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let outcome = scope
        .parse::<Scope>()
        .and_then(|scope| bulk_lookup(store, &content, &file_name, scope));

    match outcome {
        Ok(outcome) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!(
                    "📂 {}: {} candidate(s), {} match(es)\n",
                    file_name,
                    outcome.candidates.len(),
                    outcome.results.len()
                );
                print_matches(&outcome.results);
                if !outcome.unmatched.is_empty() {
                    println!("\n⚠️  No match for: {}", outcome.unmatched.join(", "));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if json {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            } else {
                eprintln!("❌ {}", e);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_status(store: &DataStore, json: bool) -> Result<ExitCode> {
    let status = store.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("📊 CAS Lookup v{} - {:?}", cas_lookup::VERSION, status.status);
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        for table in &status.tables {
            if table.loaded {
                println!("✓ {:<8} {:>8} records  ({})", table.table, table.records, table.origin.as_deref().unwrap_or("?"));
            } else {
                println!("✗ {:<8} not loaded", table.table);
            }
        }
    }

    Ok(if status.total_records > 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_matches(results: &[SearchMatch]) {
    for m in results {
        println!("[{}] {}", m.source, m.cas_number.as_deref().unwrap_or("-"));
        println!("    Name:     {}", m.chemical_name.as_deref().unwrap_or("-"));
        println!("    Flag:     {}", m.flag.as_deref().unwrap_or("-"));
        if let Some(description) = &m.flag_description {
            println!("              {}", description);
        }
        println!("    Activity: {}", m.activity.as_deref().unwrap_or("-"));
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: DataStore) -> Result<ExitCode> {
    if store.loaded_count() == 0 {
        eprintln!("❌ No reference tables could be loaded!");
        eprintln!("   Check PMNACC_PATH / TSCAINV_PATH, or run: cas-lookup status");
        return Ok(ExitCode::FAILURE);
    }

    let mut app = ui::App::new(store);
    ui::run_ui(&mut app)?;

    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: DataStore) -> Result<ExitCode> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: cas-lookup search <CAS>");
    Ok(ExitCode::FAILURE)
}
