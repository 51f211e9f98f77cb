pub mod config;
pub mod rotator;

pub use config::PluginConfig;
pub use rotator::{CertificateApi, CertificateRotator, Failure, RotationReport, Stage, LIST_KEYWORD};

use crate::auth::CredentialSource;
use crate::cli::args::Cli;
use crate::esa::EsaClient;
use crate::utils::errors::Result;

/// Build the ESA client for the configured endpoint and credentials.
pub async fn create_client(config: &PluginConfig) -> Result<EsaClient> {
    let credentials =
        CredentialSource::from_access_key(&config.access_key_id, &config.access_key_secret)?;
    let client = EsaClient::new(&config.endpoint, credentials)?;
    client.authenticate().await?;
    Ok(client)
}

/// One plugin run: configure, connect, rotate.
pub async fn run(cli: &Cli) -> std::result::Result<RotationReport, Failure> {
    let config = PluginConfig::from_args(cli).map_err(|e| Failure::new(Stage::Configure, e))?;
    tracing::debug!("Configuration: {config:?}");

    let client = create_client(&config)
        .await
        .map_err(|e| Failure::new(Stage::CreateClient, e))?;

    CertificateRotator::new(&client, &config).rotate().await
}
