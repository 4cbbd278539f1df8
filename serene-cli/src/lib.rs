//! The `serene` management tool.
//!
//! Every command writes its result to the writer passed to [`try_run`], so
//! the whole command surface can be driven from tests.

pub mod cli;
pub mod commands;
pub mod runtime;

#[cfg(test)]
pub mod test_util;

use std::io::Write;

use clap::Parser;

use cli::{Cli, Command};
use runtime::Runtime;

/// Parse `args` (program name first) and run the selected command.
pub async fn try_run(args: &[&str], out: &mut dyn Write) -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(args)?;
    run(cli, out).await
}

/// Run an already parsed command line.
pub async fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let runtime = Runtime::from_cli(&cli)?;
    let json = cli.json;

    match cli.command {
        Command::Status => commands::inspect::run_status(&runtime, json, out).await,
        Command::Index { force } => commands::index::run_index(&runtime, force, json, out).await,
        Command::Reindex => commands::index::run_reindex(&runtime, json, out).await,
        Command::Search { query, category, k } => {
            commands::inspect::run_search(&runtime, &query, category, k, json, out).await
        }
        Command::Add { text, title, category } => {
            commands::index::run_add(&runtime, &text, title.as_deref(), category, json, out).await
        }
        Command::Remove { id } => commands::index::run_remove(&runtime, &id, json, out).await,
        Command::CreateExamples { overwrite } => {
            commands::examples::run_create_examples(&runtime, overwrite, json, out)
        }
        Command::ListDocs { category } => {
            commands::inspect::run_list_docs(&runtime, category, json, out).await
        }
        Command::Clean => commands::index::run_clean(&runtime, json, out).await,
        Command::Screen { message, keywords } => {
            commands::screen::run_screen(&message, keywords.as_deref(), json, out)
        }
    }
}
