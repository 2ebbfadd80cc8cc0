use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_ORDER_PREFIX: &str = "ISP";
const DEV_DEFAULT_JWT_SECRET: &str = "storefront_development_secret_do_not_ship_7f3c9a1e";

/// Checkout pricing knobs. Amounts are in the store currency.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Flat tax rate applied to the discounted subtotal
    #[serde(default = "default_tax_rate")]
    #[validate(custom = "validate_tax_rate")]
    pub tax_rate: Decimal,

    /// Subtotal at or above which shipping is free
    #[serde(default = "default_free_shipping_threshold")]
    #[validate(custom = "validate_non_negative")]
    pub free_shipping_threshold: Decimal,

    /// Shipping fee charged below the threshold
    #[serde(default = "default_flat_shipping_fee")]
    #[validate(custom = "validate_non_negative")]
    pub flat_shipping_fee: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            free_shipping_threshold: default_free_shipping_threshold(),
            flat_shipping_fee: default_flat_shipping_fee(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CartConfig {
    /// Days a cart lives past its last mutation
    #[serde(default = "default_cart_expiry_days")]
    #[validate(range(min = 1, max = 365))]
    pub expiry_days: i64,

    /// How often the expired-cart sweeper runs
    #[serde(default = "default_cart_sweep_interval_secs")]
    #[validate(range(min = 1))]
    pub sweep_interval_secs: u64,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            expiry_days: default_cart_expiry_days(),
            sweep_interval_secs: default_cart_sweep_interval_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct OrdersConfig {
    /// Leading segment of every order number, e.g. `ISP-20250101-0001`
    #[serde(default = "default_order_prefix")]
    #[validate(length(min = 1, max = 10))]
    pub number_prefix: String,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            number_prefix: default_order_prefix(),
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Secret used to verify HS256 bearer tokens
    #[validate(length(min = 32), custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// Server host address
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[validate(custom = "validate_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// SQLite only: how long a writer waits on a locked database (milliseconds)
    #[serde(default = "default_db_sqlite_busy_timeout_ms")]
    pub db_sqlite_busy_timeout_ms: u64,

    #[serde(default = "default_event_channel_capacity")]
    #[validate(custom = "validate_event_channel_capacity")]
    pub event_channel_capacity: usize,

    #[serde(default = "default_auth_issuer")]
    pub auth_issuer: String,

    #[serde(default = "default_auth_audience")]
    pub auth_audience: String,

    #[serde(default)]
    #[validate]
    pub pricing: PricingConfig,

    #[serde(default)]
    #[validate]
    pub cart: CartConfig,

    #[serde(default)]
    #[validate]
    pub orders: OrdersConfig,
}

impl AppConfig {
    pub fn new(
        database_url: String,
        jwt_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            db_sqlite_busy_timeout_ms: default_db_sqlite_busy_timeout_ms(),
            event_channel_capacity: default_event_channel_capacity(),
            auth_issuer: default_auth_issuer(),
            auth_audience: default_auth_audience(),
            pricing: PricingConfig::default(),
            cart: CartConfig::default(),
            orders: OrdersConfig::default(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS for non-development environments or explicitly opt-in via APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message = Some(
                "The bundled development JWT secret must not be used outside development. Set APP__JWT_SECRET to a unique value."
                    .into(),
            );
            errors.add("jwt_secret", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_db_sqlite_busy_timeout_ms() -> u64 {
    5_000
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_auth_issuer() -> String {
    "storefront-auth".to_string()
}

fn default_auth_audience() -> String {
    "storefront-commerce".to_string()
}

fn default_tax_rate() -> Decimal {
    dec!(0.08)
}

fn default_free_shipping_threshold() -> Decimal {
    dec!(50.00)
}

fn default_flat_shipping_fee() -> Decimal {
    dec!(5.99)
}

fn default_cart_expiry_days() -> i64 {
    30
}

fn default_cart_sweep_interval_secs() -> u64 {
    3600
}

fn default_order_prefix() -> String {
    DEFAULT_ORDER_PREFIX.to_string()
}

fn validate_environment(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "development" | "test" | "staging" | "production" => Ok(()),
        _ => {
            let mut err = ValidationError::new("environment");
            err.message = Some("Must be one of: development, test, staging, production".into());
            Err(err)
        }
    }
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let trimmed = secret.trim();

    if trimmed.len() < 32 {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must be at least 32 characters".into());
        return Err(err);
    }

    const DISALLOWED: [&str; 4] = [
        "CHANGE_THIS_SECRET_IN_PRODUCTION",
        "INSECURE_DEFAULT_DO_NOT_USE_IN_PRODUCTION",
        "your-secret-key",
        "default-secret-key",
    ];
    if DISALLOWED
        .iter()
        .any(|&bad| trimmed.eq_ignore_ascii_case(bad))
    {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must be overridden with a secure random value".into());
        return Err(err);
    }

    if let Some(first) = trimmed.chars().next() {
        if trimmed.chars().all(|c| c == first) {
            let mut err = ValidationError::new("jwt_secret");
            err.message = Some("JWT secret cannot be a repeated character sequence".into());
            return Err(err);
        }
    }

    let unique_chars: std::collections::HashSet<char> = trimmed.chars().collect();
    if unique_chars.len() < 10 {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must have at least 10 unique characters".into());
        return Err(err);
    }

    Ok(())
}

fn validate_tax_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if rate.is_sign_negative() || *rate > Decimal::ONE {
        let mut err = ValidationError::new("tax_rate");
        err.message = Some("tax_rate must be between 0 and 1".into());
        return Err(err);
    }
    Ok(())
}

fn validate_non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        let mut err = ValidationError::new("amount");
        err.message = Some("amount must not be negative".into());
        return Err(err);
    }
    Ok(())
}

fn validate_event_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("event_channel_capacity");
        err.message = Some("event_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("storefront_commerce={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // jwt_secret has no default; it must come from a file or APP__JWT_SECRET.
    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET to the secret shared with the auth service.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured. Set APP__JWT_SECRET environment variable."
                .into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod cors_validation_tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite://storefront.db?mode=memory".into(),
            "super_secure_jwt_secret_that_is_long_enough_123".into(),
            "127.0.0.1".into(),
            8080,
            "production".into(),
        )
    }

    #[test]
    fn non_dev_requires_cors_origins() {
        let cfg = base_config();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn non_dev_allows_override_flag() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn non_dev_with_origins_passes() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://shop.example.com".into());
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn development_allows_permissive_cors() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn dev_secret_rejected_outside_development() {
        let mut cfg = base_config();
        cfg.cors_allow_any_origin = true;
        cfg.jwt_secret = DEV_DEFAULT_JWT_SECRET.into();
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("jwt_secret"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_config() -> AppConfig {
        AppConfig::new(
            "sqlite://storefront.db?mode=memory".into(),
            "a8Kd93jf0Qm2Lx7Zp4Rt6Vw1Yb5Nc3Hg".into(),
            "127.0.0.1".into(),
            8080,
            "development".into(),
        )
    }

    #[test]
    fn defaults_match_storefront_policy() {
        let cfg = valid_config();
        assert_eq!(cfg.pricing.tax_rate, dec!(0.08));
        assert_eq!(cfg.pricing.free_shipping_threshold, dec!(50.00));
        assert_eq!(cfg.pricing.flat_shipping_fee, dec!(5.99));
        assert_eq!(cfg.cart.expiry_days, 30);
        assert_eq!(cfg.orders.number_prefix, "ISP");
        assert!(cfg.validate().is_ok());
    }

    #[rstest]
    #[case("short")]
    #[case("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")]
    #[case("CHANGE_THIS_SECRET_IN_PRODUCTION")]
    #[case("abababababababababababababababab")]
    fn weak_jwt_secrets_are_rejected(#[case] secret: &str) {
        assert!(validate_jwt_secret(secret).is_err());
    }

    #[test]
    fn tax_rate_outside_unit_interval_is_rejected() {
        let mut cfg = valid_config();
        cfg.pricing.tax_rate = dec!(1.5);
        let errors = cfg.validate().unwrap_err();
        assert!(errors.errors().contains_key("pricing"));
    }

    #[test]
    fn negative_shipping_fee_is_rejected() {
        let mut cfg = valid_config();
        cfg.pricing.flat_shipping_fee = dec!(-1);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_environment_and_log_level_are_rejected() {
        let mut cfg = valid_config();
        cfg.environment = "moon".into();
        cfg.log_level = "loud".into();
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("environment"));
        assert!(errors.field_errors().contains_key("log_level"));
    }

    #[test]
    fn zero_event_channel_capacity_is_rejected() {
        let mut cfg = valid_config();
        cfg.event_channel_capacity = 0;
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("event_channel_capacity"));
    }

    #[test]
    fn empty_order_prefix_is_rejected() {
        let mut cfg = valid_config();
        cfg.orders.number_prefix = String::new();
        assert!(cfg.validate().is_err());
    }
}
