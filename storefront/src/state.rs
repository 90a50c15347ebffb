//! Application state for the storefront

use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use shared::media::ImageSet;
use sqlx::PgPool;

use crate::config::Config;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Object store holding uploaded media
#[derive(Clone)]
pub struct MediaStore {
    pub client: S3Client,
    pub bucket: String,
    /// Public origin objects are served from
    pub public_base_url: String,
}

impl MediaStore {
    pub async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BoxError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), BoxError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }

    /// Public URLs of every rendition of a stored image.
    pub fn image_set(&self, path: &str) -> Option<ImageSet> {
        ImageSet::resolve(&self.public_base_url, path)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Media bucket
    pub media: MediaStore,
    /// Largest accepted upload, in bytes
    pub max_upload_bytes: usize,
    /// Allowed browser origin, if any
    pub cors_allowed_origin: Option<String>,
}

impl AppState {
    /// Connect to Postgres, run migrations and build the S3 client.
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.media_endpoint {
            tracing::info!(endpoint = %endpoint, "Using custom media endpoint");
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }
        let client = S3Client::from_conf(s3_config.build());

        Ok(Self::from_parts(pool, client, config))
    }

    pub fn from_parts(pool: PgPool, client: S3Client, config: &Config) -> Self {
        Self {
            pool,
            media: MediaStore {
                client,
                bucket: config.media_bucket.clone(),
                public_base_url: config.media_public_base_url.clone(),
            },
            max_upload_bytes: config.max_upload_bytes,
            cors_allowed_origin: config.cors_allowed_origin.clone(),
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State with a lazy pool and an unreachable S3 endpoint.
    ///
    /// Handlers that never touch storage work normally; anything that does
    /// fails with a connection error.
    pub fn for_tests() -> Self {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let config = Config::for_tests();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy(&config.database_url)
            .expect("lazy pool never connects eagerly");
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .credentials_provider(Credentials::new("test", "test", None, None, "tests"))
            .endpoint_url(config.media_endpoint.clone().unwrap_or_default())
            .force_path_style(true)
            .build();
        Self::from_parts(pool, S3Client::from_conf(s3_config), &config)
    }
}
