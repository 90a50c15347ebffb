//! Storefront server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Default upload cap (20MB)
const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Storefront server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Bucket holding product, banner and post images
    pub media_bucket: String,
    /// Custom S3 endpoint (Cloudflare R2, MinIO); AWS default when unset
    pub media_endpoint: Option<String>,
    /// Public origin the bucket is served from
    pub media_public_base_url: String,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Origin allowed to call the API from a browser
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    /// Require a setting: must be set and non-empty in non-development environments.
    fn require_setting(
        name: &str,
        environment: &str,
        dev_default: &str,
    ) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                dev_default.to_string()
            }
        };
        if val.trim().is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            media_bucket: std::env::var("MEDIA_BUCKET")
                .unwrap_or_else(|_| "storefront-media".into()),
            media_endpoint: std::env::var("MEDIA_ENDPOINT").ok().filter(|s| !s.is_empty()),
            media_public_base_url: Self::require_setting(
                "MEDIA_PUBLIC_BASE_URL",
                &environment,
                "http://localhost:9000/storefront-media",
            )?,
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|s| !s.is_empty()),
            environment,
        })
    }
}

#[cfg(test)]
impl Config {
    /// Development config pointing at nothing; for router tests.
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/storefront_test".into(),
            http_port: 0,
            environment: "development".into(),
            media_bucket: "test-media".into(),
            media_endpoint: Some("http://127.0.0.1:9".into()),
            media_public_base_url: "https://media.test".into(),
            max_upload_bytes: 1024 * 1024,
            cors_allowed_origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_setting_defaults_only_in_development() {
        let name = "STOREFRONT_TEST_UNSET_SETTING";
        assert_eq!(
            Config::require_setting(name, "development", "fallback").unwrap(),
            "fallback"
        );
        assert!(Config::require_setting(name, "production", "fallback").is_err());
    }
}
