use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use certop_core::plugin::{CertopPlugin, PluginContext, PluginError, PluginRoutes};
use certop_core::StorePaths;
use utoipa::{openapi::OpenApi, OpenApi as OpenApiTrait};

use crate::handler::{configure_routes, LogsApiDoc, LogsState};
use crate::service::LogStore;

/// Logs plugin: provides the [`LogStore`] service and the log endpoints.
pub struct LogsPlugin;

impl LogsPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CertopPlugin for LogsPlugin {
    fn name(&self) -> &'static str {
        "logs"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a PluginContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>> {
        Box::pin(async move {
            let paths = context.require_service::<StorePaths>();
            context.register_service(Arc::new(LogStore::new(paths.as_ref().clone())));

            tracing::debug!("Logs plugin services registered");
            Ok(())
        })
    }

    fn configure_routes(&self, context: &PluginContext) -> Option<PluginRoutes> {
        let store = context.require_service::<LogStore>();
        let state = Arc::new(LogsState { store });

        Some(PluginRoutes::new(configure_routes().with_state(state)))
    }

    fn openapi_schema(&self) -> Option<OpenApi> {
        Some(LogsApiDoc::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plugin_name() {
        let plugin = LogsPlugin::new();
        assert_eq!(plugin.name(), "logs");
    }
}
