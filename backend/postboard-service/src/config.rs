/// Configuration management for Postboard
///
/// All settings come from environment variables; `main` loads `.env` first
/// when one is present.
use anyhow::{bail, Context, Result};
use db_pool::env_utils::{non_empty_env, parse_env_with_default};
use std::fmt;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    /// `None` runs the service on the in-process store
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub media: MediaConfig,
    pub triggers: TriggerConfig,
}

/// Application settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .finish()
    }
}

/// RS256 key material. The private key is optional: without it the service
/// can validate tokens but signup and login fail.
#[derive(Clone)]
pub struct JwtConfig {
    pub private_key_pem: Option<String>,
    pub public_key_pem: String,
    pub access_ttl_secs: i64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("private_key_pem", &self.private_key_pem.as_ref().map(|_| "[REDACTED]"))
            .field("public_key_pem", &"[PEM]")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .finish()
    }
}

/// Profile image storage
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Directory uploaded images are written to
    pub dir: PathBuf,
    /// Public URL prefix the directory is served under
    pub base_url: String,
    /// Image URL assigned to new users
    pub default_image_url: String,
}

#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Change feed buffer; slower subscribers skip events beyond this
    pub channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: non_empty_env("APP_ENV").unwrap_or_else(|| "development".to_string()),
            host: non_empty_env("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_env_with_default("APP_PORT", 8080),
        };

        let cors = {
            let allowed_origins = match non_empty_env("CORS_ALLOWED_ORIGINS") {
                Some(value) => value,
                None if app.is_production() => {
                    bail!("CORS_ALLOWED_ORIGINS must be set in production")
                }
                None => "http://localhost:3000".to_string(),
            };
            if app.is_production() && allowed_origins == "*" {
                bail!("CORS_ALLOWED_ORIGINS cannot be '*' in production");
            }
            CorsConfig { allowed_origins }
        };

        let database = match non_empty_env("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig { url }),
            None if app.is_production() => bail!("DATABASE_URL must be set in production"),
            None => None,
        };

        let jwt = JwtConfig {
            private_key_pem: non_empty_env("JWT_PRIVATE_KEY_PEM").map(|pem| normalize_pem(&pem)),
            public_key_pem: non_empty_env("JWT_PUBLIC_KEY_PEM")
                .map(|pem| normalize_pem(&pem))
                .context("JWT_PUBLIC_KEY_PEM must be set")?,
            access_ttl_secs: parse_env_with_default("JWT_ACCESS_TTL_SECS", 3600),
        };

        let media = MediaConfig {
            dir: non_empty_env("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./media")),
            base_url: non_empty_env("MEDIA_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}/media", app.port))
                .trim_end_matches('/')
                .to_string(),
            default_image_url: non_empty_env("DEFAULT_USER_IMAGE_URL")
                .unwrap_or_else(|| "/media/no-img.png".to_string()),
        };

        let triggers = TriggerConfig {
            channel_capacity: parse_env_with_default("TRIGGER_CHANNEL_CAPACITY", 1024usize).max(1),
        };

        Ok(Config {
            app,
            cors,
            database,
            jwt,
            media,
            triggers,
        })
    }
}

/// PEM values are often passed through env files with escaped newlines.
fn normalize_pem(value: &str) -> String {
    value.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "APP_ENV",
        "APP_PORT",
        "CORS_ALLOWED_ORIGINS",
        "DATABASE_URL",
        "JWT_PRIVATE_KEY_PEM",
        "JWT_PUBLIC_KEY_PEM",
        "MEDIA_BASE_URL",
        "TRIGGER_CHANNEL_CAPACITY",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn development_defaults() {
        clear();
        std::env::set_var("JWT_PUBLIC_KEY_PEM", "-----BEGIN PUBLIC KEY-----\\nabc");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.port, 8080);
        assert!(config.database.is_none());
        assert_eq!(config.triggers.channel_capacity, 1024);
        assert_eq!(config.media.base_url, "http://localhost:8080/media");
        assert!(config.jwt.public_key_pem.contains('\n'));
        clear();
    }

    #[test]
    #[serial]
    fn production_requires_explicit_origins() {
        clear();
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("JWT_PUBLIC_KEY_PEM", "pem");
        std::env::set_var("DATABASE_URL", "postgres://localhost/postboard");
        assert!(Config::from_env().is_err());

        std::env::set_var("CORS_ALLOWED_ORIGINS", "*");
        assert!(Config::from_env().is_err());

        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://postboard.app");
        let config = Config::from_env().unwrap();
        assert_eq!(config.cors.origins().collect::<Vec<_>>(), ["https://postboard.app"]);
        clear();
    }

    #[test]
    #[serial]
    fn missing_public_key_is_an_error() {
        clear();
        assert!(Config::from_env().is_err());
    }

    #[test]
    fn database_url_is_redacted() {
        let db = DatabaseConfig {
            url: "postgres://user:secret@db/postboard".into(),
        };
        assert!(!format!("{:?}", db).contains("secret"));
    }
}
