use storesight_inference::{CameraConfig, HttpCamera, InferenceClient};
use storesight_server::ServerConfig;
use storesight_storage::S3Client;
use storesight_vision::FrameSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = ServerConfig::from_env();

    println!(
        "server-selfcheck: starting with spool={}",
        config.snapshot_root.display()
    );
    ensure_spool(&config).await?;
    ensure_env_present(&["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"])?;
    ensure_bucket().await?;
    ensure_inference().await?;
    ensure_camera().await?;

    println!("server-selfcheck: ok");
    Ok(())
}

async fn ensure_spool(config: &ServerConfig) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&config.snapshot_root).await?;
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}

async fn ensure_bucket() -> anyhow::Result<()> {
    let s3 = S3Client::from_env().await?;
    s3.check_bucket()
        .await
        .map_err(|e| anyhow::anyhow!("bucket {} not reachable: {}", s3.bucket(), e))?;
    println!("server-selfcheck: bucket {} reachable", s3.bucket());
    Ok(())
}

async fn ensure_inference() -> anyhow::Result<()> {
    let client = InferenceClient::from_env()?;
    if !client.health_check().await? {
        return Err(anyhow::anyhow!("inference sidecar reports unhealthy"));
    }
    println!("server-selfcheck: inference sidecar healthy");
    Ok(())
}

async fn ensure_camera() -> anyhow::Result<()> {
    let camera = HttpCamera::new(CameraConfig::from_env())?;
    let frame = camera.next_frame().await?;
    println!(
        "server-selfcheck: camera frame {}x{}",
        frame.width, frame.height
    );
    Ok(())
}
