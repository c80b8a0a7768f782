//! Configuration module
//!
//! Configuration is read from the environment (optionally seeded from a `.env`
//! file) once at startup and never mutated afterwards.

use std::env;

use crate::policy::{
    RollbackPolicy, TypePolicy, ValidationPolicy, DEFAULT_ALLOWED_TYPES,
    DEFAULT_MAX_FILES_PER_BATCH, DEFAULT_MAX_FILE_SIZE_BYTES,
};
use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_S3_BUCKET: &str = "my-go-micro-bucket";
const DEFAULT_STORAGE_PREFIX: &str = "images";
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub http_concurrency_limit: usize,
}

/// Upload gateway configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: String,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub storage_prefix: String,
    // Upload policy
    pub max_file_size_bytes: usize,
    pub max_files_per_batch: usize,
    pub allowed_types: TypePolicy,
    pub rollback_on_failure: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<GatewayConfig>);

impl Config {
    fn as_gateway(&self) -> &GatewayConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_gateway().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = GatewayConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_gateway().validate()
    }

    /// Immutable validation policy derived from this configuration.
    pub fn validation_policy(&self) -> ValidationPolicy {
        let gateway = self.as_gateway();
        ValidationPolicy {
            max_file_size_bytes: gateway.max_file_size_bytes,
            max_files_per_batch: gateway.max_files_per_batch,
            allowed_types: gateway.allowed_types.clone(),
        }
    }

    pub fn rollback_policy(&self) -> RollbackPolicy {
        RollbackPolicy::from_flag(self.as_gateway().rollback_on_failure)
    }

    pub fn server_port(&self) -> u16 {
        self.as_gateway().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_gateway().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_gateway().base.environment
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.as_gateway().base.http_concurrency_limit
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_gateway().storage_backend
    }

    pub fn s3_bucket(&self) -> &str {
        &self.as_gateway().s3_bucket
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_gateway().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_gateway().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_gateway().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_gateway().local_storage_path.as_deref()
    }

    pub fn storage_prefix(&self) -> &str {
        &self.as_gateway().storage_prefix
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_gateway().max_file_size_bytes
    }

    pub fn max_files_per_batch(&self) -> usize {
        self.as_gateway().max_files_per_batch
    }

    pub fn allowed_types(&self) -> &TypePolicy {
        &self.as_gateway().allowed_types
    }
}

fn is_production_env(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

/// Boolean env flag. Accepts `true/false`, `1/0`, `yes/no` and `on/off`.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: var("PORT")
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            http_concurrency_limit: var("HTTP_CONCURRENCY_LIMIT")
                .map(|s| s.parse::<usize>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("HTTP_CONCURRENCY_LIMIT must be a valid number"))?
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse()?,
            None => StorageBackend::S3,
        };

        let allowed_types = TypePolicy::parse(
            &var("ALLOWED_TYPES").unwrap_or_else(|| DEFAULT_ALLOWED_TYPES.to_string()),
        )
        .map_err(|e| anyhow::anyhow!("ALLOWED_TYPES is invalid: {}", e))?;

        let config = GatewayConfig {
            base,
            storage_backend,
            s3_bucket: var("S3_BUCKET").unwrap_or_else(|| DEFAULT_S3_BUCKET.to_string()),
            s3_region: var("S3_REGION"),
            s3_endpoint: var("S3_ENDPOINT"),
            aws_region: var("AWS_REGION"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            storage_prefix: var("STORAGE_PREFIX")
                .map(|s| s.trim_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_STORAGE_PREFIX.to_string()),
            max_file_size_bytes: var("MAX_FILE_SIZE_BYTES")
                .map(|s| s.parse::<usize>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("MAX_FILE_SIZE_BYTES must be a valid number"))?
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES),
            max_files_per_batch: var("MAX_FILES_PER_BATCH")
                .map(|s| s.parse::<usize>())
                .transpose()
                .map_err(|_| anyhow::anyhow!("MAX_FILES_PER_BATCH must be a valid number"))?
                .unwrap_or(DEFAULT_MAX_FILES_PER_BATCH),
            allowed_types,
            rollback_on_failure: var("ROLLBACK_ON_FAILURE")
                .map(|s| {
                    parse_flag(&s)
                        .ok_or_else(|| anyhow::anyhow!("ROLLBACK_ON_FAILURE must be true or false"))
                })
                .transpose()?
                .unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.http_concurrency_limit == 0 {
            return Err(anyhow::anyhow!(
                "HTTP_CONCURRENCY_LIMIT must be greater than zero"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_FILE_SIZE_BYTES must be greater than zero"
            ));
        }

        if self.max_files_per_batch == 0 {
            return Err(anyhow::anyhow!(
                "MAX_FILES_PER_BATCH must be greater than zero"
            ));
        }

        if self.storage_prefix.is_empty() || self.storage_prefix.contains("..") {
            return Err(anyhow::anyhow!(
                "STORAGE_PREFIX must be a non-empty path without '..'"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_empty() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
