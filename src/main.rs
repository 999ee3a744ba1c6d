use anyhow::Result;
use clap::Parser;

use navette::cli::commands::create::CreateCommand;
use navette::cli::commands::report::{HistoryCommand, ListCommand, ShowCommand};
use navette::cli::commands::transition::TransitionCommand;
use navette::cli::commands::{open_engine, show_how_to_get_started};
use navette::cli::{CmpAction, Cli, Commands};
use navette::config::{config, init_config, NavetteConfig};
use navette::shuttle::Command;
use navette::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config: &NavetteConfig = config()?;
    init_telemetry(&config.observability)?;
    init_config()?;

    tokio::runtime::Runtime::new()?.block_on(async {
        let Some(command) = cli.command else {
            return show_how_to_get_started().await;
        };

        let engine = open_engine(config, cli.storage_dir.as_deref()).await?;

        match command {
            Commands::Create {
                origin,
                title,
                reference,
                urgent,
            } => {
                CreateCommand::new(origin.into(), title, reference)
                    .with_urgency(urgent)
                    .execute(&engine)
                    .await
            }
            Commands::Advance { id } => TransitionCommand::new(id, Command::Advance).execute(&engine).await,
            Commands::Vote { id, chamber, outcome } => {
                let command = Command::Vote {
                    chamber: chamber.into(),
                    outcome: outcome.into(),
                };
                TransitionCommand::new(id, command).execute(&engine).await
            }
            Commands::Transmit { id } => TransitionCommand::new(id, Command::Transmit).execute(&engine).await,
            Commands::Cmp { action } => {
                let (id, command) = match action {
                    CmpAction::Convene { id } => (id, Command::ConveneCmp),
                    CmpAction::Open { id } => (id, Command::OpenCmp),
                    CmpAction::Resolve { id, result } => (id, Command::ResolveCmp { result: result.into() }),
                };
                TransitionCommand::new(id, command).execute(&engine).await
            }
            Commands::Promulgate { id } => TransitionCommand::new(id, Command::Promulgate).execute(&engine).await,
            Commands::Show { id, json } => ShowCommand { id, json }.execute(&engine).await,
            Commands::History { id, json } => HistoryCommand { id, json }.execute(&engine).await,
            Commands::List { json } => ListCommand { json }.execute(&engine).await,
        }
    })
}
