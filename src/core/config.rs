use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub swagger: SwaggerConfig,
    pub session: SessionConfig,
    pub authority: AuthorityConfig,
    pub generative_ai: GenerativeAiConfig,
    pub geocoding: GeocodingConfig,
    pub minio: MinIOConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Signing secret and lifetime for portal login sessions
#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl: Duration,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"***")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Municipal authority account used by the admin dashboard
#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    pub email: String,
    /// Argon2id PHC string
    pub password_hash: String,
    pub display_name: String,
}

/// Generative-AI (Gemini) gateway settings
///
/// The API key is optional on purpose: the gateways report a
/// misconfiguration verdict instead of refusing to boot.
#[derive(Clone)]
pub struct GenerativeAiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub request_timeout: Duration,
    pub classification_temperature: f32,
    pub classification_max_tokens: u32,
    pub verification_temperature: f32,
    pub verification_max_tokens: u32,
    pub transcription_max_tokens: u32,
}

impl std::fmt::Debug for GenerativeAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Reverse geocoding (Nominatim) settings
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

/// MinIO/S3 storage configuration for report images
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL used when building image URLs (defaults to endpoint)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Prefix readable without credentials (e.g., "public")
    pub public_prefix: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            session: SessionConfig::from_env()?,
            authority: AuthorityConfig::from_env()?,
            generative_ai: GenerativeAiConfig::from_env()?,
            geocoding: GeocodingConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
        })
    }
}

/// Read an env var and parse it, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr + ToString,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|_| format!("{} must be a valid number", key))
}

impl AppConfig {
    // Base64 images inflate by a third, so the limit is generous
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 20 * 1024 * 1024; // 20MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size =
            parse_env("MAX_REQUEST_BODY_SIZE", Self::DEFAULT_MAX_REQUEST_BODY_SIZE)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_env("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_env(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_env("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_env("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Wastewise API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION").unwrap_or_else(|_| {
            "Citizen waste reporting, field worker tasks and authority dashboard API".to_string()
        });

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl SessionConfig {
    const DEFAULT_TTL_HOURS: u64 = 12;
    const MIN_SECRET_LEN: usize = 32;

    pub fn from_env() -> Result<Self, String> {
        let secret = env::var("SESSION_SECRET")
            .map_err(|_| "SESSION_SECRET environment variable is required".to_string())?;
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(format!(
                "SESSION_SECRET must be at least {} characters",
                Self::MIN_SECRET_LEN
            ));
        }

        let ttl_hours = parse_env("SESSION_TTL_HOURS", Self::DEFAULT_TTL_HOURS)?;

        Ok(Self {
            secret,
            ttl: Duration::from_secs(ttl_hours * 3600),
        })
    }
}

impl AuthorityConfig {
    pub fn from_env() -> Result<Self, String> {
        let email = env::var("AUTHORITY_EMAIL")
            .map_err(|_| "AUTHORITY_EMAIL environment variable is required".to_string())?;
        let password_hash = env::var("AUTHORITY_PASSWORD_HASH")
            .map_err(|_| "AUTHORITY_PASSWORD_HASH environment variable is required".to_string())?;
        if !password_hash.starts_with("$argon2") {
            return Err("AUTHORITY_PASSWORD_HASH must be an argon2 PHC string".to_string());
        }
        let display_name = env::var("AUTHORITY_NAME")
            .unwrap_or_else(|_| "Municipal Authority".to_string());

        Ok(Self {
            email: email.trim().to_lowercase(),
            password_hash,
            display_name,
        })
    }
}

impl GenerativeAiConfig {
    const DEFAULT_API_BASE: &'static str = "https://generativelanguage.googleapis.com/v1beta";
    const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_CLASSIFICATION_TEMPERATURE: f32 = 0.1;
    const DEFAULT_CLASSIFICATION_MAX_TOKENS: u32 = 512;
    const DEFAULT_VERIFICATION_TEMPERATURE: f32 = 0.2;
    const DEFAULT_VERIFICATION_MAX_TOKENS: u32 = 256;
    const DEFAULT_TRANSCRIPTION_MAX_TOKENS: u32 = 1024;

    pub fn from_env() -> Result<Self, String> {
        let api_key = env::var("GEMINI_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let api_base = env::var("GEMINI_API_BASE")
            .unwrap_or_else(|_| Self::DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string());

        let timeout_secs = parse_env("GEMINI_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS)?;

        let classification_temperature = parse_env(
            "CLASSIFICATION_TEMPERATURE",
            Self::DEFAULT_CLASSIFICATION_TEMPERATURE,
        )?;
        let verification_temperature = parse_env(
            "VERIFICATION_TEMPERATURE",
            Self::DEFAULT_VERIFICATION_TEMPERATURE,
        )?;
        for (name, value) in [
            ("CLASSIFICATION_TEMPERATURE", classification_temperature),
            ("VERIFICATION_TEMPERATURE", verification_temperature),
        ] {
            if !(0.0..=0.5).contains(&value) {
                return Err(format!("{} must be between 0.0 and 0.5", name));
            }
        }

        Ok(Self {
            api_key,
            api_base,
            model,
            request_timeout: Duration::from_secs(timeout_secs),
            classification_temperature,
            classification_max_tokens: parse_env(
                "CLASSIFICATION_MAX_TOKENS",
                Self::DEFAULT_CLASSIFICATION_MAX_TOKENS,
            )?,
            verification_temperature,
            verification_max_tokens: parse_env(
                "VERIFICATION_MAX_TOKENS",
                Self::DEFAULT_VERIFICATION_MAX_TOKENS,
            )?,
            transcription_max_tokens: parse_env(
                "TRANSCRIPTION_MAX_TOKENS",
                Self::DEFAULT_TRANSCRIPTION_MAX_TOKENS,
            )?,
        })
    }
}

impl GeocodingConfig {
    const DEFAULT_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("NOMINATIM_BASE_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string())
            .trim_end_matches('/')
            .to_string();
        let user_agent = env::var("GEOCODING_USER_AGENT")
            .unwrap_or_else(|_| "WastewiseCore/1.0 (civic-waste-reporting)".to_string());
        let timeout_secs = parse_env("GEOCODING_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS)?;

        Ok(Self {
            base_url,
            user_agent,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "wastewise-reports".to_string());
        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let public_prefix =
            env::var("MINIO_PUBLIC_PREFIX").unwrap_or_else(|_| "public".to_string());

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            public_prefix,
        })
    }
}
