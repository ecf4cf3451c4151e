use crate::{
    api,
    auth::{AuthConfig, SigningKey},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = Url::parse(&args.dsn).context("invalid database connection string")?;

    let key = SigningKey::from_secret(&args.secret).context("invalid signing secret")?;

    let auth_config = AuthConfig::new()
        .with_access_token_ttl_seconds(args.access_token_ttl_seconds)
        .with_refresh_token_ttl_seconds(args.refresh_token_ttl_seconds);
    auth_config.validate()?;

    debug!("Auth config: {:?}", auth_config);

    api::new(args.port, dsn.to_string(), key, auth_config).await
}
