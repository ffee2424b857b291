mod db;
mod error;
mod export;
mod input;
mod parser;
mod scraper;
mod settings;
mod table;

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use scraper::page::PageClient;
use scraper::{
    BatchRunner, ChromePage, ErrorLog, LookupOutcome, PageLookup, SelectorSet, TracingNotifier,
};
use settings::Settings;
use table::ResultTable;

#[derive(Parser)]
#[command(
    name = "brreg_scraper",
    about = "Look up entities in the Brønnøysund register and normalize their addresses"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up every row of a CSV file with columns supplier_id,vat_number
    Scrape {
        input: PathBuf,
        /// Field to skip (repeatable): name, address, municipality, postal_address
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,
        /// Add a country_code column after vat_number
        #[arg(long)]
        country_code: bool,
        /// Directory for the result table and error log
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Chrome binary to use instead of the one headless_chrome resolves
        #[arg(long)]
        local_browser: Option<PathBuf>,
        /// Show the browser window
        #[arg(long)]
        headful: bool,
        /// Skip recording the run in the history database
        #[arg(long)]
        no_db: bool,
    },
    /// Look up a single organisation number and print the normalized row
    Lookup {
        identifier: String,
        #[arg(long)]
        local_browser: Option<PathBuf>,
    },
    /// Show run history statistics
    Stats,
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    let log_file = matches!(cli.command, Commands::Scrape { .. }).then_some(settings.log_file.as_path());
    init_tracing(log_file)?;

    let t0 = Instant::now();
    let result = match cli.command {
        Commands::Scrape {
            input,
            exclude,
            country_code,
            output_dir,
            local_browser,
            headful,
            no_db,
        } => {
            settings.exclude.extend(exclude);
            settings.include_country_code |= country_code;
            settings.headless &= !headful;
            if let Some(dir) = output_dir {
                settings.output_dir = dir;
            }
            if let Some(path) = local_browser {
                settings.use_local_browser = true;
                settings.local_browser_path = path;
            }
            scrape(&settings, &input, !no_db)
        }
        Commands::Lookup {
            identifier,
            local_browser,
        } => {
            if let Some(path) = local_browser {
                settings.use_local_browser = true;
                settings.local_browser_path = path;
            }
            lookup_one(&settings, &identifier)
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Runs:          {}", s.runs);
            println!("Lookups:       {}", s.lookups);
            println!("Found:         {}", s.found);
            println!("Not found:     {}", s.not_found);
            println!("Distinct keys: {}", s.distinct_keys);
            println!("Last run:      {}", s.last_run.as_deref().unwrap_or("-"));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn scrape(settings: &Settings, input: &Path, record_history: bool) -> Result<()> {
    let records = input::read_records(input)
        .with_context(|| format!("reading {}", input.display()))?;
    std::fs::create_dir_all(&settings.output_dir)
        .with_context(|| format!("creating {}", settings.output_dir.display()))?;
    if records.is_empty() {
        println!("No records in {}.", input.display());
        return export::write_outputs(
            &ResultTable::default(),
            &ErrorLog::new(),
            &settings.table_path(),
            &settings.error_path(),
        );
    }

    let selectors = SelectorSet::brreg(settings.registry_url.clone(), &settings.exclude);
    let selector_set = format!("{}/{}", selectors.name, selectors.version);
    let page = ChromePage::launch(&settings.driver(), settings.headless)?;

    println!("Looking up {} records...", records.len());
    let started_at = Utc::now();
    let output = BatchRunner::new(page, PageLookup::new(selectors), TracingNotifier)
        .pacing(settings.pacing())
        .include_country_code(settings.include_country_code)
        .run(&records)?;
    let finished_at = Utc::now();

    export::write_outputs(
        &output.table,
        &output.errors,
        &settings.table_path(),
        &settings.error_path(),
    )?;

    if record_history {
        let mut conn = db::connect(&settings.db_path)?;
        db::init_schema(&conn)?;
        let id = db::new_run_id(started_at);
        let run = db::RunRecord {
            id: &id,
            selector_set: &selector_set,
            started_at,
            finished_at,
        };
        db::save_run(&mut conn, &run, &output.table, &output.errors)?;
    }

    println!(
        "Done: {} found, {} not found. Table: {}, errors: {}",
        output.table.len(),
        output.errors.len(),
        settings.table_path().display(),
        settings.error_path().display(),
    );
    Ok(())
}

fn lookup_one(settings: &Settings, identifier: &str) -> Result<()> {
    let lookup = PageLookup::new(SelectorSet::brreg(
        settings.registry_url.clone(),
        &settings.exclude,
    ));
    let mut page = ChromePage::launch(&settings.driver(), settings.headless)?;
    let outcome = lookup.lookup(&mut page, &TracingNotifier, identifier, identifier)?;
    page.close()?;

    match outcome {
        LookupOutcome::Found(record) => {
            let table = table::assemble(
                vec![record],
                lookup.selectors(),
                settings.include_country_code,
            );
            let first = table.rows().next();
            for (column, cell) in table.columns().iter().zip(first.unwrap_or_default()) {
                println!("{:<20} {}", column, cell.as_deref().unwrap_or("-"));
            }
        }
        LookupOutcome::NotFound { message, .. } => {
            println!("Not found: {}", message);
        }
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
