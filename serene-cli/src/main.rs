use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use serene_cli::cli::Cli;
use serene_telemetry::LogFormat;

const LOG_FILTER: &str = "warn,serene_rag=info,serene_cli=info";

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let format = if cli.json_logs { LogFormat::Json } else { LogFormat::Pretty };
    if let Err(e) = serene_telemetry::init(format, LOG_FILTER) {
        eprintln!("warning: logging disabled: {e}");
    }

    let mut stdout = std::io::stdout().lock();
    let result = serene_cli::run(cli, &mut stdout).await;
    let _ = stdout.flush();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
