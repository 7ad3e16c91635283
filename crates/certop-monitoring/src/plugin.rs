use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use certop_core::plugin::{CertopPlugin, PluginContext, PluginError, PluginRoutes};
use certop_core::{CommandRunner, StorePaths};
use utoipa::{openapi::OpenApi, OpenApi as OpenApiTrait};

use crate::handler::{configure_routes, MonitoringApiDoc, MonitoringState};
use crate::service::MonitoringProbe;

/// Monitoring plugin: provides the [`MonitoringProbe`] service and the
/// monitoring endpoint.
pub struct MonitoringPlugin;

impl MonitoringPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MonitoringPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CertopPlugin for MonitoringPlugin {
    fn name(&self) -> &'static str {
        "monitoring"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a PluginContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>> {
        Box::pin(async move {
            let paths = context.require_service::<StorePaths>();
            let runner = context.require_service::<CommandRunner>();

            context.register_service(Arc::new(MonitoringProbe::new(
                paths.as_ref().clone(),
                runner,
            )));

            tracing::debug!("Monitoring plugin services registered");
            Ok(())
        })
    }

    fn configure_routes(&self, context: &PluginContext) -> Option<PluginRoutes> {
        let probe = context.require_service::<MonitoringProbe>();
        let state = Arc::new(MonitoringState { probe });

        Some(PluginRoutes::new(configure_routes().with_state(state)))
    }

    fn openapi_schema(&self) -> Option<OpenApi> {
        Some(MonitoringApiDoc::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plugin_name() {
        let plugin = MonitoringPlugin::new();
        assert_eq!(plugin.name(), "monitoring");
    }
}
