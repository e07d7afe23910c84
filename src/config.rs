use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::env;
use config; // Explicitly import the config crate

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // Populated from the .env file
    pub database_path: String,
    pub images_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub jwt_secret_key: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,
    pub password_hash_cost: u32,
}

fn required_var(name: &str) -> Result<String, config::ConfigError> {
    env::var(name).map_err(|_| config::ConfigError::Message(format!(
        "FATAL: Environment variable '{}' is not set in your .env file.", name
    )))
}

fn require_absolute(name: &str, value: &str) -> Result<(), config::ConfigError> {
    if Path::new(value).is_relative() {
        return Err(config::ConfigError::Message(format!(
            "FATAL: The '{}' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
            name, value
        )));
    }
    Ok(())
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        let database_path = required_var("DATABASE_PATH")?;
        let images_path = required_var("IMAGES_PATH")?;
        require_absolute("DATABASE_PATH", &database_path)?;
        require_absolute("IMAGES_PATH", &images_path)?;

        // HS256 keys shorter than the digest size are rejected outright.
        let jwt_secret_key = required_var("JWT_SECRET_KEY")?;
        if jwt_secret_key.len() < 32 {
            return Err(config::ConfigError::Message(
                "FATAL: 'JWT_SECRET_KEY' must be at least 32 characters long.".to_string()
            ));
        }

        let jwt_issuer = required_var("JWT_ISSUER")?;
        let jwt_audience = required_var("JWT_AUDIENCE")?;
        if jwt_issuer.trim().is_empty() || jwt_audience.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "FATAL: 'JWT_ISSUER' and 'JWT_AUDIENCE' must not be empty.".to_string()
            ));
        }

        let jwt_expiry_minutes = match env::var("JWT_EXPIRY_MINUTES") {
            Ok(raw) => match raw.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => return Err(config::ConfigError::Message(format!(
                    "FATAL: 'JWT_EXPIRY_MINUTES' must be a positive whole number, got '{}'.", raw
                ))),
            },
            Err(_) => 15,
        };

        let password_hash_cost = match env::var("PASSWORD_HASH_COST") {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => return Err(config::ConfigError::Message(format!(
                    "FATAL: 'PASSWORD_HASH_COST' must be between 4 and 31, got '{}'.", raw
                ))),
            },
            Err(_) => bcrypt::DEFAULT_COST,
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let builder = config::Config::builder()
            // Base settings (web host/port) come from the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("images_path", images_path)?
            .set_override("jwt_secret_key", jwt_secret_key)?
            .set_override("jwt_issuer", jwt_issuer)?
            .set_override("jwt_audience", jwt_audience)?
            .set_override("jwt_expiry_minutes", jwt_expiry_minutes)?
            .set_override("password_hash_cost", password_hash_cost as i64)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .build()?;

        builder.try_deserialize()
    }

    /// Returns the full path to the SQLite database file.
    pub fn database_file(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("blogbase.db")
    }

    pub fn images_dir(&self) -> PathBuf {
        PathBuf::from(&self.images_path)
    }
}
