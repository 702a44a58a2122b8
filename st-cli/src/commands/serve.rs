//! Serve command - run the flow server.

use std::path::PathBuf;

use console::style;
use tokio::sync::watch;
use tracing::{info, warn};

use st_core::config::ConfigHandle;
use st_core::error::StResult;
use st_flows::FlowRegistry;
use st_server::{spawn_event_logger, FlowAuth, FlowServer};

pub async fn run(
    config: ConfigHandle,
    config_path: Option<PathBuf>,
    bind: Option<String>,
    port: Option<u16>,
) -> StResult<()> {
    {
        let mut cfg = config.write().await;
        if let Some(b) = bind {
            cfg.server.bind_address = b;
        }
        if let Some(p) = port {
            cfg.server.port = p;
        }
    }

    let token = config.read().await.server.auth_token.clone();
    let (auth, generated) = FlowAuth::from_config(&token);
    if generated {
        let new_token = auth.current_token().await;
        config.write().await.server.auth_token = new_token.clone();
        let saved = match &config_path {
            Some(path) => config.snapshot().await.save_to_file(path),
            None => config.save().await,
        };
        if let Err(e) = saved {
            warn!("could not persist generated auth token: {e}");
        }
        println!(
            "{} Generated flow server token: {}",
            style("NOTE").yellow().bold(),
            style(&new_token).cyan()
        );
    }

    let cfg = config.snapshot().await;
    if !cfg.is_model_configured() {
        warn!("model API key not configured; model-backed flows will fail");
    }
    if !cfg.is_fcm_configured() {
        info!("FCM not configured; mobile push targets will be reported as failed");
    }

    let ctx = st_flows::FlowContext::from_config(&cfg)?;
    let registry = FlowRegistry::new(ctx);
    let logger = spawn_event_logger(registry.event_bus());

    let server = FlowServer::bind(&cfg.server_addr(), auth, registry).await?;
    let addr = server.local_addr()?;
    println!(
        "{} Flow server listening on {}",
        style("OK").green().bold(),
        style(format!("http://{addr}")).cyan()
    );
    println!("  Press Ctrl-C to stop.");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C");
        }
        let _ = shutdown_tx.send(true);
    });

    server.serve(shutdown_rx).await?;
    logger.abort();

    println!("{} Flow server stopped.", style("OK").green().bold());
    Ok(())
}
