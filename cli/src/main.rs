use a2meter_cli::commands;
use a2meter_cli::readline;
use a2meter_cli::CliContext;
use clap::{Parser, Subcommand};
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ctx = CliContext::new().map_err(|e| e.to_string())?;

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "cli")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a captured byte dump through the pipeline
    Replay {
        #[arg(short, long)]
        path: String,
    },
    /// Show the current fight
    Snapshot,
    /// Queue and assembler health
    Status,
    Config,
    /// Discard all session state and start over
    Reset,
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "a2meter".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match &cli.command {
        Some(Commands::Replay { path }) => commands::replay(path, ctx).await,
        Some(Commands::Snapshot) => commands::show_snapshot(ctx),
        Some(Commands::Status) => commands::show_status(ctx),
        Some(Commands::Config) => commands::show_settings(ctx).await,
        Some(Commands::Reset) => commands::reset(ctx),
        Some(Commands::Exit) => {
            commands::exit();
            return Ok(true);
        }
        None => {}
    }
    Ok(false)
}
