use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use eval_table::layout::{LmEvalLayout, MathEvalLayout, ResultLayout};
use eval_table::table::CollisionPolicy;
use eval_table::{harvest, storage, HarvestOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eval-table", version, about = "Collect evaluation results into one CSV table")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// lm-evaluation-harness output (newest results_*.json per directory)
    LmEval {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value = "lm_eval_results.csv")]
        output: PathBuf,
    },
    /// math-evaluation-harness output (<model>/step<N>/math_eval<SEED>/<task>/*.json)
    MathEval {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value = "math_eval_results.csv")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Root directory of the harness output
    #[arg(long, default_value = "output")]
    root: PathBuf,
    /// Also write the table as Parquet
    #[arg(long)]
    parquet: Option<PathBuf>,
    /// Rows shown in the preview
    #[arg(long, default_value_t = 5)]
    head: usize,
    /// Suffix colliding column names instead of failing
    #[arg(long)]
    allow_collisions: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::LmEval { common, output } => run(&LmEvalLayout, &common, &output),
        Commands::MathEval { common, output } => run(&MathEvalLayout, &common, &output),
    }
}

fn run(layout: &dyn ResultLayout, args: &CommonArgs, output: &Path) -> Result<()> {
    let policy = if args.allow_collisions {
        CollisionPolicy::Suffix
    } else {
        CollisionPolicy::Reject
    };
    let options = HarvestOptions::builder().collision_policy(policy).build();

    let result = harvest(layout, &args.root, &options)
        .with_context(|| format!("failed to harvest {} results", layout.name()))?;
    let table = result.table();
    if table.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    storage::write_csv(table, output)
        .with_context(|| format!("cannot write {}", output.display()))?;
    if let Some(path) = &args.parquet {
        storage::write_parquet(table, path)
            .with_context(|| format!("cannot write {}", path.display()))?;
    }

    let (rows, cols) = table.shape();
    println!("Results saved. Shape: ({rows}, {cols})");
    println!("{}", storage::pretty(table, args.head)?);
    Ok(())
}
