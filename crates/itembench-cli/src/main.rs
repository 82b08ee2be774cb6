//! itembench CLI — batch generation and evaluation of content items.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "itembench",
    version,
    about = "Evaluation harness for machine-generated educational content items"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send generation requests to a generator and save the batch result
    Batch(BatchArgs),

    /// Validate and score the items of a batch result
    Eval(EvalArgs),

    /// Create a starter config and example prompt file
    Init,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Prompt file (.jsonl, or a JSON document)
    #[arg(long, short = 'i', default_value = "data/grade-5-ela-benchmark.json")]
    pub input: PathBuf,

    /// Process only the first N prompts
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Process N prompts drawn at random (wins over --limit)
    #[arg(long, short = 'r')]
    pub random: Option<usize>,

    /// Seed for --random
    #[arg(long)]
    pub seed: Option<u64>,

    /// Generation service base URL
    #[arg(long, short = 'e')]
    pub endpoint: Option<String>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Batch result path (default: <output_dir>/batch_results.json)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Log each response status
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct EvalArgs {
    /// Batch result file (default: <output_dir>/batch_results.json)
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Directory for eval_results.json and eval_summary.json
    #[arg(long, short = 'o')]
    pub output_dir: Option<PathBuf>,

    /// Skip InceptBench scoring, structure checks only
    #[arg(long)]
    pub no_inceptbench: bool,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Batch(args) if args.verbose);
    let directive = if verbose {
        "itembench=debug"
    } else {
        "itembench=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().expect("static directive")),
        )
        .init();

    let result = match cli.command {
        Commands::Batch(args) => commands::batch::execute(args).await,
        Commands::Eval(args) => commands::eval::execute(args).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
