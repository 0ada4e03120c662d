use crate::demo::{run_bank_validation, run_demo, BankValidateArgs, DemoArgs};
use crate::server;
use benefit_advisor::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Benefit Advisor",
    about = "Run the adaptive benefits questionnaire service or try it from the command line",
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
    /// Inspect question bank files before deploying them
    Bank {
        #[command(subcommand)]
        command: BankCommand,
    },
    /// Walk a sample household through the questionnaire and print the recommendations
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum BankCommand {
    /// Load a JSON question bank (and optional choice statistics) and report what was found
    Validate(BankValidateArgs),
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
        Command::Bank {
            command: BankCommand::Validate(args),
        } => run_bank_validation(args),
        Command::Demo(args) => run_demo(args),
    }
}
