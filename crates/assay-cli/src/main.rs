mod commands;
mod output;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "assay",
    version,
    about = "Potency calculation and report validation for cannabis lab reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic potency report from a profile
    Generate {
        /// Predefined profile: high-potency, low-potency, hemp-compliant,
        /// decarboxylated, concentrate, edible
        #[arg(short, long, default_value = "high-potency")]
        profile: String,

        /// Custom JSON profile file (overrides --profile)
        #[arg(long, value_name = "FILE")]
        profile_file: Option<PathBuf>,

        /// Random seed; the same seed reproduces the same report
        #[arg(short, long)]
        seed: u64,

        #[arg(long)]
        sample_id: String,

        #[arg(long)]
        batch_id: String,

        /// Product type (flower, pre-roll, concentrate, vape, edible, gummy, beverage, ...)
        #[arg(long, default_value = "flower")]
        product: String,

        #[arg(long, value_name = "PERCENT")]
        thca_min: Option<Decimal>,

        #[arg(long, value_name = "PERCENT")]
        thca_max: Option<Decimal>,

        #[arg(long, value_name = "PERCENT")]
        d9_min: Option<Decimal>,

        #[arg(long, value_name = "PERCENT")]
        d9_max: Option<Decimal>,

        /// Measured moisture in %; drawn from the profile when omitted
        #[arg(long, value_name = "PERCENT")]
        moisture: Option<Decimal>,

        /// Serving unit weight in grams (edible, gummy, beverage)
        #[arg(long, value_name = "GRAMS")]
        unit_weight: Option<Decimal>,

        /// Serving units per package (edible, gummy, beverage)
        #[arg(long, value_name = "N")]
        units_per_package: Option<u32>,

        /// Generate this many reports with consecutive seeds
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Engine config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write generated report(s) to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Validate a report (or an array of reports) in JSON form
    Validate {
        /// Path to report JSON
        input_file: PathBuf,

        /// JSON array of previously issued reports, for the uniqueness check
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,

        /// Engine config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Show passing checks and informational flags
        #[arg(long)]
        verbose: bool,
    },
    /// Import hand-entered `name,value` lines into a report
    Import {
        /// Path to the result sheet
        input_file: PathBuf,

        #[arg(long)]
        sample_id: String,

        #[arg(long)]
        batch_id: String,

        #[arg(long, default_value = "flower")]
        product: String,

        /// Fill totals missing from the sheet with recomputed values
        #[arg(long)]
        fill_totals: bool,

        /// Engine config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the report JSON to a file instead of stdout
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Inspect and check product profiles
    Profiles {
        #[command(subcommand)]
        action: ProfilesAction,
    },
}

#[derive(Subcommand)]
enum ProfilesAction {
    /// List predefined profiles
    List,
    /// Explain a profile in plain language
    Explain {
        /// Preset name (e.g., "hemp-compliant")
        preset: String,
    },
    /// Print the JSON profile schema with field descriptions
    Schema,
    /// Validate a custom profile file
    Validate {
        /// Path to JSON profile file
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate {
            profile,
            profile_file,
            seed,
            sample_id,
            batch_id,
            product,
            thca_min,
            thca_max,
            d9_min,
            d9_max,
            moisture,
            unit_weight,
            units_per_package,
            count,
            config,
            output,
            out,
        } => commands::generate::run(commands::generate::Args {
            profile,
            profile_file,
            seed,
            sample_id,
            batch_id,
            product,
            thca: (thca_min, thca_max),
            d9_thc: (d9_min, d9_max),
            moisture,
            unit_weight,
            units_per_package,
            count,
            config,
            output,
            out,
        })
        .map(|()| true),
        Commands::Validate {
            input_file,
            history,
            config,
            output,
            verbose,
        } => commands::validate::run(input_file, history, config, &output, verbose),
        Commands::Import {
            input_file,
            sample_id,
            batch_id,
            product,
            fill_totals,
            config,
            out,
        } => commands::import::run(
            input_file,
            sample_id,
            batch_id,
            &product,
            fill_totals,
            config,
            out,
        )
        .map(|()| true),
        Commands::Profiles { action } => match action {
            ProfilesAction::List => commands::profiles::list(),
            ProfilesAction::Explain { preset } => commands::profiles::explain(&preset),
            ProfilesAction::Schema => commands::profiles::schema(),
            ProfilesAction::Validate { file } => commands::profiles::validate(&file),
        }
        .map(|()| true),
    };

    match result {
        Ok(true) => {}
        // Report blocked from publishing
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
