use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::get;
use axum::Json;
use clap::Args;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use certop_certificates::CertificatesPlugin;
use certop_config::ConfigPlugin;
use certop_core::plugin::PluginManager;
use certop_core::{CommandRunner, StorePaths};
use certop_logs::LogsPlugin;
use certop_monitoring::{liveness, MonitoringPlugin};

#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind the server to
    #[arg(long, default_value = "0.0.0.0:5000", env = "CERTOP_ADDRESS")]
    pub address: String,

    /// Directory holding the YAML configuration files
    #[arg(long, default_value = "/config", env = "CERTOP_CONFIG_DIR")]
    pub config_dir: PathBuf,

    /// Data directory (certificate store under certs/, logs under logs/)
    #[arg(long, default_value = "/data", env = "CERTOP_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Directory holding the provisioning and health-check scripts
    #[arg(long, default_value = "/scripts", env = "CERTOP_SCRIPTS_DIR")]
    pub scripts_dir: PathBuf,
}

impl ServeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.serve())
    }

    async fn serve(self) -> anyhow::Result<()> {
        let paths = StorePaths::new(&self.config_dir, &self.data_dir, &self.scripts_dir);
        paths.ensure_directories().await?;

        info!("Config directory: {}", paths.config_dir().display());
        info!("Data directory: {}", paths.data_dir().display());
        info!("Certificate store: {}", paths.cert_dir().display());

        let mut plugin_manager = PluginManager::new();

        // Core services available to every plugin
        plugin_manager
            .context()
            .register_service(Arc::new(paths.clone()));
        plugin_manager
            .context()
            .register_service(Arc::new(CommandRunner::new()));

        // Registration order matters: certificates depends on the config
        // plugin's ConfigStore.
        plugin_manager.register_plugin(Box::new(ConfigPlugin::new()));
        plugin_manager.register_plugin(Box::new(CertificatesPlugin::new()));
        plugin_manager.register_plugin(Box::new(LogsPlugin::new()));
        plugin_manager.register_plugin(Box::new(MonitoringPlugin::new()));

        plugin_manager.initialize_plugins().await?;
        debug!("Plugin system initialized");

        let openapi = plugin_manager.unified_openapi();
        let app = plugin_manager
            .build_application()
            .route("/health", get(liveness))
            .route(
                "/api/openapi.json",
                get(move || async move { Json(openapi) }),
            )
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&self.address).await?;
        info!("Certop API server listening on {}", self.address);
        axum::serve(listener, app).await?;
        Ok(())
    }
}
