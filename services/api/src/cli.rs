use crate::commands::{run_delta, run_notify, run_report, DeltaArgs, NotifyArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use team_probation::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "team-probation",
    about = "Track probation milestones and post-probation compliance for a render farm team",
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
    /// Evaluate every member of the latest snapshot and print the report
    Report(ReportArgs),
    /// Show point deltas between two snapshot dates
    Delta(DeltaArgs),
    /// Send failure notices for members who failed probation
    Notify(NotifyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args),
        Command::Delta(args) => run_delta(args),
        Command::Notify(args) => run_notify(args),
    }
}
