use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use headline_pipeline::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "headline-pipeline", version, about = "Publish the day's headline as an on-chain token URI")]
struct Cli {
    /// More output (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full pipeline (default)
    Run {
        /// Run date used in names, YYYY-MM-DD. Defaults to today (local time).
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Check node connectivity, the signing account and the contract
    Check,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(command: Command) -> PipelineResult<()> {
    let config = Config::from_env()?;
    match command {
        Command::Run { date } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let pipeline = Pipeline::from_config(&config, date)?;
            let report = pipeline.run_report().await?;
            println!("headline:  {}", report.headline);
            println!("image:     {}", report.image);
            println!("metadata:  {}", report.metadata);
            println!("tx hash:   {}", report.tx_hash);
        }
        Command::Check => {
            let ctx = ChainContext::from_config(&config, HttpClient::new()?)?;
            let report = check(&ctx).await?;
            println!("{}", report);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli.command.unwrap_or(Command::Run { date: None });
    match execute(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
