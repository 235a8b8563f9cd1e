use anyhow::Result;
use std::fs;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::server::rest::create_router;
use crate::shared::{initialize_app_state, HubConfig};

const PID_FILE: &str = "/tmp/labhub.pid";

pub async fn run_rest_server(config: HubConfig) -> Result<()> {
    // Write PID file for process management
    let pid = process::id();
    if let Err(e) = fs::write(PID_FILE, pid.to_string()) {
        warn!("Could not write PID file: {}", e);
    }

    ctrlc::set_handler(move || {
        info!("Shutting down Lab Hub server...");
        let _ = fs::remove_file(PID_FILE);
        std::process::exit(0);
    })?;

    info!(
        r#"
 _          _     _           _
| |    __ _| |__ | |__  _   _| |__
| |   / _` | '_ \| '_ \| | | | '_ \
| |__| (_| | |_) | | | | |_| | |_) |
|_____\__,_|_.__/|_| |_|\__,_|_.__/

Starting Lab Hub REST API service...
PID: {}
"#,
        pid
    );

    info!(
        registry = %config.registry_path.display(),
        runtime = ?config.runtime,
        "Connecting to container runtime..."
    );
    let app_state = match initialize_app_state(&config).await {
        Ok(state) => {
            info!("Container runtime connected");
            Arc::new(state)
        }
        Err(e) => {
            error!("Failed to initialize lab hub: {:#}", e);
            error!("Ensure the Docker daemon is reachable or set LABHUB_RUNTIME=memory");
            let _ = fs::remove_file(PID_FILE);
            return Err(e);
        }
    };

    match app_state.orchestrator.catalog() {
        Ok(catalog) => info!(labs = catalog.len(), "Lab registry loaded"),
        // Registry is re-read per request; a broken file is reported there too.
        Err(e) => warn!("Lab registry not usable yet: {}", e),
    }

    info!("Building REST API routes...");
    let app = create_router(app_state);

    let bind_addr = config.bind_addr();
    info!("Binding to: {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Server started successfully!");
    info!("REST API Endpoint: http://{}/api/v0", bind_addr);
    info!("Swagger UI: http://{}/swagger-ui/", bind_addr);
    info!("OpenAPI JSON: http://{}/api-docs/openapi.json", bind_addr);
    info!("Ready to accept requests...");

    let result = axum::serve(listener, app).await;

    let _ = fs::remove_file(PID_FILE);

    result?;
    Ok(())
}
