use std::{net::SocketAddr, path::PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use rust_decimal::Decimal;
use serde::Deserialize;

#[cfg(feature = "logging")]
use tracing_subscriber::filter::LevelFilter;

/// Implementation of [`serde`]'s deserializer for [`FromStr`] types.
#[cfg(feature = "logging")]
fn deserialize_from_str<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error,
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
}

/// Logging configuration.
#[cfg(feature = "logging")]
#[derive(Deserialize)]
pub struct Logging {
    /// Log level.
    #[serde(deserialize_with = "deserialize_from_str")]
    pub level: LevelFilter,
}

#[cfg(feature = "logging")]
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
        }
    }
}

/// General configuration.
///
/// Only non-secret options live here, secrets are read
/// from the process environment by [`Secrets::from_env`].
#[derive(Deserialize)]
pub struct Config {
    /// Society name shown on every page.
    pub organisation_name: String,

    /// Serve plaintext HTTP instead of HTTPS.
    #[serde(default)]
    pub http: bool,

    /// Non-root user the server is expected to run as.
    #[serde(default)]
    pub run_user: Option<String>,

    /// TLS certificate chain, PEM encoded.
    #[serde(default)]
    pub tls_certificate_file: Option<PathBuf>,

    /// TLS private key, PEM encoded.
    #[serde(default)]
    pub tls_certificate_key_file: Option<PathBuf>,

    /// Public base URL of this service, used to build payment callback URLs.
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Enable associate member and friend of the museum fields.
    #[serde(default)]
    pub enable_other_member_types: bool,

    /// Enable the gift aid tickbox.
    #[serde(default)]
    pub enable_giftaid: bool,

    /// Address shown to customers with questions.
    pub email_address_for_questions: String,

    /// Address shown to customers whose payment could not be fulfilled.
    pub email_address_for_failures: String,

    /// Fee paid by the ordinary member.
    pub ordinary_member_fee: Decimal,

    /// Fee paid by the associate member.
    #[serde(default)]
    pub associate_member_fee: Decimal,

    /// Fee paid per friend of the museum.
    #[serde(default)]
    pub friend_fee: Decimal,

    /// Tag stored on every sale to identify the payment provider.
    #[serde(default = "default_payment_service")]
    pub payment_service: String,

    /// Directory for daily log files; logs go to stdout when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log file name prefix.
    #[serde(default = "default_log_leader")]
    pub log_leader: String,

    /// Logging configuration.
    #[cfg(feature = "logging")]
    #[serde(default)]
    pub logging: Logging,
}

fn default_site_url() -> String {
    String::from("http://localhost:8080")
}

fn default_payment_service() -> String {
    String::from("Stripe")
}

fn default_log_leader() -> String {
    String::from("membership")
}

impl Config {
    /// Create new config using default configuration file or environment variables.
    ///
    /// See [`Env`] for more details on how to use environment variables configuration.
    ///
    /// [`Env`]: figment::providers::Env
    pub fn new(path: Option<PathBuf>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: Option<PathBuf>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.unwrap_or(PathBuf::from("Config.toml"))))
            .merge(Env::prefixed("CONFIG_").split("__"))
    }

    /// URL the payment provider redirects to after a successful payment.
    ///
    /// The provider substitutes its session identifier into the placeholder.
    pub fn success_url(&self) -> String {
        format!(
            "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
            self.site_url.trim_end_matches('/')
        )
    }

    /// URL the payment provider redirects to when the customer cancels.
    pub fn cancel_url(&self) -> String {
        format!("{}/cancel", self.site_url.trim_end_matches('/'))
    }

    /// Create new config suitable for running unit tests.
    #[cfg(feature = "test-utils")]
    pub fn for_tests() -> Self {
        Self {
            organisation_name: String::from("Test Local History Society"),
            http: true,
            run_user: None,
            tls_certificate_file: None,
            tls_certificate_key_file: None,
            site_url: String::from("http://localhost:8080"),
            enable_other_member_types: true,
            enable_giftaid: true,
            email_address_for_questions: String::from("questions@example.org"),
            email_address_for_failures: String::from("failures@example.org"),
            ordinary_member_fee: Decimal::new(2400, 2),
            associate_member_fee: Decimal::new(600, 2),
            friend_fee: Decimal::new(500, 2),
            payment_service: default_payment_service(),
            log_dir: None,
            log_leader: default_log_leader(),
            #[cfg(feature = "logging")]
            logging: Logging::default(),
        }
    }
}

/// Process secrets, never read from the configuration file.
#[derive(Deserialize)]
pub struct Secrets {
    /// Database URL string.
    pub database_url: String,

    /// Payment provider API key, only required by the server.
    #[serde(default)]
    pub payment_key: Option<String>,

    /// Address, that HTTP server will listen on.
    #[serde(default = "default_address")]
    pub address: SocketAddr,
}

fn default_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

impl Secrets {
    /// Read secrets from `MEMBERSHIP_`-prefixed environment variables.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::from(Env::prefixed("MEMBERSHIP_")).extract()
    }
}
