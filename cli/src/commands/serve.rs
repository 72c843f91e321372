use anyhow::Result;
use progeny_core::Config;
use std::net::SocketAddr;
use std::path::PathBuf;

pub async fn execute(
    port: Option<u16>,
    host: Option<String>,
    models_dir: Option<PathBuf>,
) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = port {
        config.daemon.port = port;
    }
    if let Some(host) = host {
        config.daemon.host = host;
    }
    if let Some(dir) = models_dir {
        config.models.directory = dir;
    }

    let addr: SocketAddr = format!("{}:{}", config.daemon.host, config.daemon.port).parse()?;

    println!("Starting progeny daemon...");
    println!("Models directory: {}", config.models.directory.display());
    println!("Listening on http://{}", addr);
    println!("\nAPI endpoints:");
    println!("  GET  /health          - Health check and loaded crops");
    println!("  POST /predict         - Classify a leaf image (multipart: image, crop_type)");
    println!("  POST /remedies        - Remedies for a disease name");
    println!("  POST /api/chat        - Ask the farming assistant");
    println!("  POST /api/chat/voice  - Ask by voice (multipart: audio)");
    println!("\nPress Ctrl+C to stop.\n");

    progeny_daemon::run_server(addr, config).await?;

    Ok(())
}
