use crate::demo::{run_analyze, run_demo, AnalyzeArgs, DemoArgs};
use crate::server;
use casework_ai::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Casework Document Intelligence",
    about = "Run and demonstrate the SEND casework document analysis service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Analyze one register document and print the judgment
    Analyze(AnalyzeArgs),
    /// Run a demonstration pass over a document register
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the document register from a CSV export instead of the samples
    #[arg(long)]
    pub(crate) register: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analyze(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
