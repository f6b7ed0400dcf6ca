#[macro_use]
extern crate rocket;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod configuration;
mod setup;
mod store;
mod webserver;

#[cfg(test)]
mod test_helpers;

#[derive(Debug, Parser)]
#[command(name = "gazette", version, about = "Articles and their authors, over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Postgres connection string. Without one, data lives in memory.
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the web server (the default).
    Serve,
    /// Seed the demo authors and articles.
    LoadFixtures {
        /// Keep existing rows instead of purging them first.
        #[arg(long)]
        append: bool,
    },
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let store = store::connect(cli.database_url.as_deref()).await?;
            if cli.database_url.is_none() {
                setup::demo_fixtures::load(store.as_ref(), false).await?;
            }

            webserver::main(store)
                .await
                .map_err(|error| anyhow::anyhow!("error running server: {}", error))?;
        }
        Command::LoadFixtures { append } => {
            let database_url = cli
                .database_url
                .as_deref()
                .context("load-fixtures needs --database-url or DATABASE_URL")?;
            let store = store::connect(Some(database_url)).await?;
            setup::demo_fixtures::load(store.as_ref(), append).await?;
            println!("Demo authors and articles loaded.");
        }
    }

    Ok(())
}
