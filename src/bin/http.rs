#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use timeline_scheduler::{
        JsonSnapshotFile, PlanningSnapshot, SchedulerConfig, SnapshotSource, http_api,
        logging::init_tracing,
    };

    init_tracing("info");

    let addr: SocketAddr = std::env::var("TIMELINE_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let config = match std::env::var("TIMELINE_CONFIG") {
        Ok(path) => SchedulerConfig::from_json_file(&path)?,
        Err(_) => SchedulerConfig::default(),
    };
    let snapshot = match std::env::var("TIMELINE_SNAPSHOT") {
        Ok(path) => JsonSnapshotFile::new(path).load_snapshot()?,
        Err(_) => PlanningSnapshot::default(),
    };

    println!("timeline-scheduler HTTP API listening on http://{addr}");
    http_api::serve(addr, snapshot, config).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
