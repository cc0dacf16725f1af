pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::analyze::AnalyzeArgs;
use commands::generate::GenerateArgs;
use commands::negotiation::{CreateArgs, ListArgs, SendArgs, TranscriptArgs};

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    about = "Parley negotiation and contract assistant CLI",
    long_about = "Operate the Parley store and run the negotiation assistant, contract drafter, \
                  and contract analyzer from the terminal.",
    after_help = "Examples:\n  parley doctor --json\n  parley seed\n  \
                  parley generate --type nda --party \"Acme Corp\" --party \"Jane Doe\"\n  \
                  parley analyze --file lease.txt"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo workspace (idempotent)")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, model client setup, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List negotiations, newest first")]
    Negotiations(ListArgs),
    #[command(about = "Create a draft negotiation")]
    NewNegotiation(CreateArgs),
    #[command(about = "Show the transcript of a negotiation")]
    Messages(TranscriptArgs),
    #[command(about = "Ask the negotiation assistant and record the exchange")]
    Send(SendArgs),
    #[command(about = "Draft a contract, optionally saving it or writing it to a file")]
    Generate(GenerateArgs),
    #[command(about = "Analyze contract text or a .txt file")]
    Analyze(AnalyzeArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Negotiations(args) => commands::negotiation::list(args),
        Command::NewNegotiation(args) => commands::negotiation::create(args),
        Command::Messages(args) => commands::negotiation::messages(args),
        Command::Send(args) => commands::negotiation::send(args),
        Command::Generate(args) => commands::generate::run(args),
        Command::Analyze(args) => commands::analyze::run(args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
