use anyhow::Context;
use camino::Utf8PathBuf;
use config::Config;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

#[derive(Clone, Deserialize, Debug)]
pub struct Settings {
    pub environment: String,
    pub application: ServerSettings,
    pub database: DatabaseSettings,
    pub payments: PaymentSettings,
    pub email: EmailSettings,
    pub media: MediaSettings,
    pub checkout: CheckoutSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Clone, Deserialize, Debug)]
pub struct ServerSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub logs_directory: String,
    /// Where device-local preferences (favorites, theme, session) are kept.
    pub state_directory: String,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", &self.host, &self.port)
    }
}

#[derive(Clone, Deserialize, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

impl DatabaseSettings {
    pub fn without_db_name(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl { PgSslMode::Require } else { PgSslMode::Prefer };

        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(&self.password)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn with_db_name(&self) -> PgConnectOptions {
        self.without_db_name().database(&self.database_name)
    }
}

/// Payment gateway settings. The public key is handed to the hosted widget, the secret key never
/// leaves the server.
#[derive(Clone, Deserialize, Debug)]
pub struct PaymentSettings {
    pub api_base_url: String,
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
    pub currency: String,
    pub currency_symbol: String,
    pub provider: String,
    pub widget_title: String,
    pub lang: String,
}

#[derive(Clone, Deserialize, Debug)]
pub struct EmailSettings {
    pub api_base_url: String,
    /// Without a key receipts are logged and reported as simulated.
    pub api_key: Option<String>,
    pub from_address: String,
    pub brand_name: String,
}

#[derive(Clone, Deserialize, Debug)]
pub struct MediaSettings {
    pub api_base_url: String,
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct CheckoutSettings {
    /// Base URL of the deployed payment functions (`/process-payment`).
    pub functions_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub charge_timeout_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub success_display_ms: u64,
}

#[derive(Clone, Deserialize, Debug, Default)]
pub struct AuthSettings {
    pub seed_admin: Option<SeedAdmin>,
}

#[derive(Clone, Deserialize, Debug)]
pub struct SeedAdmin {
    pub email: String,
    pub name: String,
    pub password: String,
}

fn find_config_dir() -> anyhow::Result<Utf8PathBuf> {
    let current_dir =
        std::env::current_dir().context("Failed to determine the current directory.")?;
    let current_dir =
        Utf8PathBuf::try_from(current_dir).context("Could not convert PathBuf to Utf8PathBuf")?;

    let config_dir = current_dir
        .ancestors()
        .map(|p| p.join("config"))
        .find(|p| {
            let base_path = p.join("base.yaml");
            p.is_dir() && base_path.is_file()
        })
        .ok_or_else(|| anyhow::anyhow!("Cannot find config directory!"))?;

    config_dir
        .canonicalize_utf8()
        .with_context(|| format!("Could not canonicalize config directory {config_dir}"))
}

pub fn get_config_settings() -> anyhow::Result<Settings> {
    let config_directory = find_config_dir()?;

    // Detect the running environment - default to `development` if unspecified.
    let environment: String =
        std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".to_owned());

    let base_source = config::File::with_name(config_directory.join("base").as_str()).required(true);

    let env_source =
        config::File::with_name(config_directory.join(environment.as_str()).as_str()).required(true);

    // e.g. `APP_PAYMENTS__SECRET_KEY=sk_live_...` sets `Settings.payments.secret_key`.
    let overrides_source =
        config::Environment::with_prefix("app").prefix_separator("_").separator("__");

    let config = Config::builder()
        .add_source(base_source)
        .add_source(env_source)
        .add_source(overrides_source)
        .set_override("environment", environment)?
        .build()?;

    config
        .try_deserialize()
        .context("Could not deserialise config settings.")
}
