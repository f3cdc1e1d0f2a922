mod cli;

use clap::Parser;
use cli::Cli;
use common::config::Secrets;
use migration::{cli::run_migrate, sea_orm::Database};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let secrets = Secrets::from_env()?;

    info!("connecting to database");
    let db = Database::connect(&secrets.database_url).await?;
    info!("database connection established");

    run_migrate(migration::Migrator, &db, cli.command, false)
        .await
        .map_err(|err| anyhow::Error::msg(err.to_string()))?;

    Ok(())
}
