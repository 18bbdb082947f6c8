use crate::demo::{run_demo, run_feed_report, DemoArgs, FeedReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use listing_boost::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Listing Boost Engine",
    about = "Run and demonstrate the marketplace boost engine from the command line",
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
    /// Inspect the ranked feed from sample data
    Feed {
        #[command(subcommand)]
        command: FeedCommand,
    },
    /// Run an end-to-end CLI demo covering the boost lifecycle and feed
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum FeedCommand {
    /// Render a ranked feed with stats for sample listings
    Report(FeedReportArgs),
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
        Command::Feed {
            command: FeedCommand::Report(args),
        } => run_feed_report(args),
        Command::Demo(args) => run_demo(args),
    }
}
