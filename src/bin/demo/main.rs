use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use s3_artifacts::{
    app::{AppBuilder, AppConfig, StorageBackend},
    verify_presigned, BucketName, EndpointConfig, RunRequest, SignatureScheme,
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "s3-artifacts-demo")]
#[command(about = "Upload a run artifact to S3/MinIO, list it and print a presigned URL", long_about = None)]
struct Cli {
    /// S3 endpoint URL
    #[arg(long, env = "S3_ENDPOINT", default_value = "http://localhost:9000")]
    endpoint: String,

    /// Access key id
    #[arg(long, env = "AWS_ACCESS_KEY_ID", default_value = "minioadmin")]
    access_key: String,

    /// Secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", default_value = "minioadmin123", hide_env_values = true)]
    secret_key: String,

    /// Bucket that receives the artifact
    #[arg(long, env = "S3_BUCKET", default_value = "artifacts")]
    bucket: String,

    /// Region used for signing
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    region: String,

    /// Request signing scheme
    #[arg(long, env = "S3_SIGNATURE_VERSION", default_value = "s3v4")]
    signature: SignatureScheme,

    /// Per-call deadline in milliseconds
    #[arg(long, env = "S3_TIMEOUT_MS", default_value = "30000")]
    timeout_ms: u64,

    /// Lifetime of the presigned URL in seconds
    #[arg(long, env = "S3_PRESIGN_TTL_SECS", default_value = "300")]
    presign_ttl_secs: u64,

    /// Prefix listed after the upload
    #[arg(long, env = "S3_LIST_PREFIX", default_value = "runs/")]
    list_prefix: String,

    /// Download the presigned URL and compare it with the upload
    #[arg(long, env = "S3_VERIFY_PRESIGNED", default_value = "false")]
    verify: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let endpoint = EndpointConfig::builder()
            .endpoint(self.endpoint.clone())
            .access_key(self.access_key.clone())
            .secret_key(self.secret_key.clone())
            .region(self.region.clone())
            .signature(self.signature)
            .timeout(Duration::from_millis(self.timeout_ms))
            .build();

        let bucket = BucketName::new(self.bucket.clone())
            .with_context(|| format!("S3_BUCKET '{}' is not a valid bucket name", self.bucket))?;

        Ok(AppConfig {
            storage_backend: StorageBackend::S3(endpoint),
            bucket,
            list_prefix: self.list_prefix.clone(),
            presign_ttl: Duration::from_secs(self.presign_ttl_secs),
        })
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_new(self.log_level.to_lowercase())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

/// Whole minutes when the TTL divides evenly, seconds otherwise
fn describe_ttl(ttl: Duration) -> String {
    match ttl.as_secs() {
        1 => "1 second".to_string(),
        secs if secs % 60 != 0 => format!("{} seconds", secs),
        60 => "1 minute".to_string(),
        secs => format!("{} minutes", secs / 60),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    let config = cli.to_app_config()?;
    info!(endpoint = %cli.endpoint, bucket = %config.bucket, "Starting artifact demo");

    let app = AppBuilder::new()
        .with_config(config)
        .build()
        .context("Failed to build application")?;

    let run = RunRequest::default();
    let report = app
        .publisher
        .publish_run_request(
            app.config.bucket.clone(),
            &run,
            Utc::now(),
            app.config.list_prefix.clone(),
            app.config.presign_ttl,
        )
        .await
        .context("Failed to publish artifact")?;

    println!("Uploaded: {}", report.receipt.uri());

    for item in &report.listing {
        println!(" - {} {} bytes", item.key, item.size);
    }

    println!(
        "\nPresigned GET URL (valid {}):",
        describe_ttl(app.config.presign_ttl)
    );
    println!("{}", report.presigned);

    if cli.verify {
        let expected = run.to_json_bytes()?;
        verify_presigned(&reqwest::Client::new(), &report.presigned, &expected)
            .await
            .context("Presigned URL did not serve the uploaded artifact")?;
        info!("Presigned URL verified");
    }

    Ok(())
}
