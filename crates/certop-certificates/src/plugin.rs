use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use certop_config::ConfigStore;
use certop_core::plugin::{CertopPlugin, PluginContext, PluginError, PluginRoutes};
use certop_core::{CommandRunner, StorePaths};
use utoipa::{openapi::OpenApi, OpenApi as OpenApiTrait};

use crate::handlers::{configure_routes, CertificatesApiDoc, CertificatesState};
use crate::inventory::InventoryAggregator;
use crate::orchestrator::OrchestrationEngine;
use crate::resolver::CertificateResolver;

/// Certificates plugin: resolver, orchestration engine and inventory
/// services plus the certificate lifecycle endpoints.
///
/// Depends on the [`StorePaths`] and [`CommandRunner`] core services and on
/// the [`ConfigStore`] registered by the config plugin.
pub struct CertificatesPlugin;

impl CertificatesPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CertificatesPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CertopPlugin for CertificatesPlugin {
    fn name(&self) -> &'static str {
        "certificates"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a PluginContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>> {
        Box::pin(async move {
            let paths = context.require_service::<StorePaths>();
            let runner = context.require_service::<CommandRunner>();
            let config = context.require_service::<ConfigStore>();

            let resolver = Arc::new(CertificateResolver::new(paths.cert_dir(), runner.clone()));
            let engine = Arc::new(OrchestrationEngine::new(
                paths.as_ref().clone(),
                runner,
                config.clone(),
                resolver.clone(),
            ));
            let inventory = Arc::new(InventoryAggregator::new(config, resolver.clone()));

            context.register_service(resolver);
            context.register_service(engine);
            context.register_service(inventory);

            tracing::debug!("Certificates plugin services registered");
            Ok(())
        })
    }

    fn configure_routes(&self, context: &PluginContext) -> Option<PluginRoutes> {
        let state = Arc::new(CertificatesState {
            engine: context.require_service::<OrchestrationEngine>(),
            inventory: context.require_service::<InventoryAggregator>(),
        });

        Some(PluginRoutes::new(configure_routes().with_state(state)))
    }

    fn openapi_schema(&self) -> Option<OpenApi> {
        Some(CertificatesApiDoc::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plugin_name() {
        let plugin = CertificatesPlugin::new();
        assert_eq!(plugin.name(), "certificates");
    }
}
