//! CLI for slipscan: do lottery draws fall on the slip the way chance says they should?

mod commands;

use clap::{Parser, Subcommand};
use slipscan_core::{AnalysisSettings, RawRetention};

#[derive(Parser)]
#[command(name = "slipscan")]
#[command(about = "slipscan: spatial randomness tests for lottery draws on the betting slip")]
#[command(version = slipscan_core::VERSION)]
struct Cli {
    /// Debug-level logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    /// JSON file with extra lottery variants, merged over the builtins
    #[arg(long, global = true)]
    variants: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known lottery variants
    Variants,

    /// Extract spatial features from a CSV of draws (`contest,n1,...,nk`)
    Features {
        /// Lottery variant slug
        #[arg(long, default_value = "megasena")]
        lottery: String,

        /// CSV file of observed draws
        #[arg(long)]
        input: String,

        /// Feature set: grid (default) or slip
        #[arg(long, default_value = "grid", value_parser = ["grid", "slip"])]
        schema: String,

        /// Write the feature table as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Run the Monte Carlo null model and print its baseline
    Simulate {
        /// Lottery variant slug
        #[arg(long, default_value = "megasena")]
        lottery: String,

        /// Number of simulated datasets
        #[arg(long, short = 'n', default_value = "10000")]
        n_simulations: usize,

        /// Draws per simulated dataset (default: number of draws in --input)
        #[arg(long, short = 'd')]
        n_draws: Option<usize>,

        /// Observed draws, used to size the simulated datasets
        #[arg(long)]
        input: Option<String>,

        /// Seed for reproducible runs
        #[arg(long, short = 's', default_value = "42")]
        seed: u64,

        /// Feature set: grid (default) or slip
        #[arg(long, default_value = "grid", value_parser = ["grid", "slip"])]
        schema: String,

        /// Run simulations on one thread
        #[arg(long)]
        sequential: bool,

        /// Write the baseline as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Full pipeline: features, simulation, baseline and hypothesis tests
    Validate {
        /// Lottery variant slug
        #[arg(long, default_value = "megasena")]
        lottery: String,

        /// CSV file of observed draws
        #[arg(long)]
        input: String,

        /// Number of simulated datasets
        #[arg(long, short = 'n', default_value = "10000")]
        n_simulations: usize,

        /// Draws per simulated dataset (default: number of observed draws)
        #[arg(long, short = 'd')]
        n_draws: Option<usize>,

        /// Seed for reproducible runs
        #[arg(long, short = 's', default_value = "42")]
        seed: u64,

        /// Feature set: grid (default) or slip
        #[arg(long, default_value = "grid", value_parser = ["grid", "slip"])]
        schema: String,

        /// Significance level
        #[arg(long, default_value = "0.05")]
        alpha: f64,

        /// Multiple-comparison correction: fdr (default), bonferroni, none
        #[arg(long, default_value = "fdr", value_parser = ["fdr", "bh", "bonferroni", "none"])]
        correction: String,

        /// Simulations whose raw draws are kept for the KS and Mann-Whitney tests
        #[arg(long, default_value = "100")]
        keep_raw: usize,

        /// Features listed in the summary's top list
        #[arg(long, default_value = "5")]
        top: usize,

        /// Run simulations on one thread
        #[arg(long)]
        sequential: bool,

        /// Write the full report as JSON
        #[arg(long)]
        output: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let registry = commands::load_registry(cli.variants.as_deref());

    match cli.command {
        Commands::Variants => commands::variants::run(&registry),
        Commands::Features {
            lottery,
            input,
            schema,
            output,
        } => commands::features::run(
            &commands::resolve_variant(&registry, &lottery),
            &input,
            commands::parse_schema(&schema),
            output.as_deref(),
        ),
        Commands::Simulate {
            lottery,
            n_simulations,
            n_draws,
            input,
            seed,
            schema,
            sequential,
            output,
        } => {
            let config = commands::resolve_variant(&registry, &lottery);
            let n_draws = match (n_draws, input.as_deref()) {
                (Some(n), _) => n,
                (None, Some(path)) => commands::load_draws(path, &config).len(),
                (None, None) => {
                    eprintln!("Either --n-draws or --input is required.");
                    std::process::exit(1);
                }
            };
            commands::simulate::run(
                &config,
                commands::simulate::SimulateCommandConfig {
                    schema: commands::parse_schema(&schema),
                    n_simulations,
                    n_draws,
                    seed,
                    parallel: !sequential,
                    output_path: output.as_deref(),
                },
            )
        }
        Commands::Validate {
            lottery,
            input,
            n_simulations,
            n_draws,
            seed,
            schema,
            alpha,
            correction,
            keep_raw,
            top,
            sequential,
            output,
        } => commands::validate::run(
            &commands::resolve_variant(&registry, &lottery),
            &input,
            AnalysisSettings {
                schema: commands::parse_schema(&schema),
                n_simulations,
                n_draws_per_sim: n_draws,
                seed,
                alpha,
                correction: commands::parse_correction(&correction),
                parallel: !sequential,
                retention: RawRetention::FirstRuns(keep_raw),
                top_n: top,
            },
            output.as_deref(),
        ),
    }
}
