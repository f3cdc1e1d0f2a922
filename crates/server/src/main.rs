mod handlers;
mod pages;
mod validation;

#[cfg(test)]
mod testing;

use std::{path::PathBuf, sync::Arc};

use axum::{Extension, Router, Server};
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use common::{
    calendar::SystemClock,
    config::{Config, Secrets},
    logging,
};
use db::{directory::Directory, Database};
use payments::stripe::StripeClient;
use sales::Checkout;
use tracing::info;

/// Membership payment server.
#[derive(Parser)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let config = Config::new(cli.config)?;

    let _guard = logging::init(&config);

    let secrets = Secrets::from_env()?;

    let Some(payment_key) = secrets.payment_key else {
        return Err(anyhow::Error::msg("payment provider key is not set"));
    };

    if let Some(run_user) = &config.run_user {
        info!(%run_user, "server is expected to run as a non-root user");
    }

    info!("connecting to database");
    let database = Arc::new(Database::connect(&secrets.database_url).await?);
    let config = Arc::new(config);

    let checkout = Arc::new(Checkout::new(
        database,
        Arc::new(Directory::new()),
        Arc::new(StripeClient::new(payment_key)),
        Arc::new(SystemClock),
        config.clone(),
    ));

    let router = app_router(checkout, config.clone());

    if config.http {
        info!(address = %secrets.address, "serving plain http");

        Server::bind(&secrets.address)
            .serve(router.into_make_service())
            .await?;
    } else {
        let (Some(certificate), Some(key)) = (
            config.tls_certificate_file.as_ref(),
            config.tls_certificate_key_file.as_ref(),
        ) else {
            return Err(anyhow::Error::msg("tls certificate files are not configured"));
        };

        let tls = RustlsConfig::from_pem_file(certificate, key).await?;

        info!(address = %secrets.address, "serving https");

        axum_server::bind_rustls(secrets.address, tls)
            .serve(router.into_make_service())
            .await?;
    }

    Ok(())
}

fn app_router(checkout: Arc<Checkout>, config: Arc<Config>) -> Router {
    Router::new()
        .merge(handlers::routes())
        .layer(Extension(config))
        .with_state(checkout)
}
