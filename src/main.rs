use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use climate_etl::config::{DATABASE_URL_ENV, DATA_DIR_ENV, DEFAULT_DATA_DIR};
use climate_etl::loader::SINK_TABLE;
use climate_etl::{converter, default_steps, generator, loader, logging};
use climate_etl::{Config, Orchestrator, ProcessRunner};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "climate-etl",
    version,
    about = "Bronze -> Silver -> Postgres climate sample pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Root directory holding the bronze/ and silver/ layers
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR, global = true)]
    data_dir: PathBuf,

    /// Postgres connection string (required by `load`)
    #[arg(long, env = DATABASE_URL_ENV, hide_env_values = true, global = true)]
    database_url: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the deterministic sample CSV to the bronze layer
    Generate {
        /// Output CSV (default: `<data-dir>/bronze/sample_climate_daily.csv`)
        #[arg(long)]
        out: Option<PathBuf>,
        /// First observation day
        #[arg(long, default_value = "2010-01-01")]
        start: NaiveDate,
        /// Number of days to generate
        #[arg(long, default_value_t = generator::DEFAULT_DAYS)]
        days: u32,
    },
    /// Cast the bronze CSV and write silver Parquet
    Convert {
        /// Input CSV (default: `<data-dir>/bronze/sample_climate_daily.csv`)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output Parquet (default: `<data-dir>/silver/climate_daily.parquet`)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace the Postgres staging table with the silver Parquet contents
    Load {
        /// Input Parquet (default: `<data-dir>/silver/climate_daily.parquet`)
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Run generate, convert and load in order, each as its own process
    Run {
        /// Working directory for every step
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    // Real environment variables win over .env entries.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging::init(&cli.log_level);
    let config = Config::new(cli.data_dir, cli.database_url);

    match cli.command {
        Commands::Generate { out, start, days } => {
            let out = out.unwrap_or_else(|| config.bronze_csv());
            let path = generator::generate_sample_csv(&out, start, days)?;
            let size = fs::metadata(&path)?.len();
            println!("[OK] Wrote Bronze CSV: {} ({size} bytes)", path.display());
        }
        Commands::Convert { input, output } => {
            let input = input.unwrap_or_else(|| config.bronze_csv());
            let output = output.unwrap_or_else(|| config.silver_parquet());
            let path = converter::csv_to_parquet(&input, &output)?;
            let size = fs::metadata(&path)?.len();
            println!("[OK] Wrote Silver Parquet: {} ({size} bytes)", path.display());
        }
        Commands::Load { input } => {
            let input = input.unwrap_or_else(|| config.silver_parquet());
            let rows = loader::load(&config, &input)?;
            println!("[OK] Loaded {rows} rows into Postgres table: {SINK_TABLE}");
        }
        Commands::Run { root } => {
            let runner = ProcessRunner::current_exe(&root, &config)?;
            info!(program = %runner.program().display(), root = %root.display(), "starting pipeline");
            let stdout = std::io::stdout();
            Orchestrator::new(runner).run(&default_steps(), &mut stdout.lock())?;
        }
    }
    Ok(())
}
