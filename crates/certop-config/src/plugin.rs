use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use certop_core::plugin::{CertopPlugin, PluginContext, PluginError, PluginRoutes};
use certop_core::StorePaths;
use utoipa::{openapi::OpenApi, OpenApi as OpenApiTrait};

use crate::handler::{configure_routes, ConfigApiDoc, ConfigState};
use crate::service::ConfigStore;

/// Config plugin: provides the [`ConfigStore`] service and the
/// configuration editor endpoints.
pub struct ConfigPlugin;

impl ConfigPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfigPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl CertopPlugin for ConfigPlugin {
    fn name(&self) -> &'static str {
        "config"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a PluginContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>> {
        Box::pin(async move {
            let paths = context.require_service::<StorePaths>();

            let store = Arc::new(ConfigStore::new(paths.as_ref().clone()));
            context.register_service(store);

            tracing::debug!("Config plugin services registered");
            Ok(())
        })
    }

    fn configure_routes(&self, context: &PluginContext) -> Option<PluginRoutes> {
        let store = context.require_service::<ConfigStore>();
        let state = Arc::new(ConfigState { store });

        Some(PluginRoutes::new(
            configure_routes().with_state(state),
        ))
    }

    fn openapi_schema(&self) -> Option<OpenApi> {
        Some(ConfigApiDoc::openapi())
    }
}
