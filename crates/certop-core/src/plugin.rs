//! Plugin system for modular service registration and route configuration
//!
//! Each feature crate exposes a plugin that registers its services into a
//! type-safe registry and contributes an axum `Router` plus an OpenAPI
//! fragment. The manager initializes plugins in registration order (order
//! matters for dependencies), merges routes under `/api`, and aggregates the
//! OpenAPI document.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use axum::Router;
use thiserror::Error;
use tracing::debug;
use utoipa::openapi::{ComponentsBuilder, OpenApi};

/// Errors that can occur during plugin operations
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin registration failed for '{plugin_name}': {error}")]
    RegistrationFailed { plugin_name: String, error: String },

    #[error("Service '{service_type}' is required but not registered")]
    ServiceNotFound { service_type: String },
}

/// Core plugin trait implemented by each feature crate.
pub trait CertopPlugin: Send + Sync {
    /// Unique identifier for this plugin
    fn name(&self) -> &'static str;

    /// Register services that this plugin provides.
    ///
    /// Use `context.require_service::<T>()` to get dependencies and
    /// `context.register_service(service)` to provide services for plugins
    /// registered later.
    fn register_services<'a>(
        &'a self,
        context: &'a PluginContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>>;

    /// Configure HTTP routes for this plugin. Routes are nested under `/api`.
    fn configure_routes(&self, _context: &PluginContext) -> Option<PluginRoutes> {
        None
    }

    /// Provide the OpenAPI schema for this plugin's endpoints.
    fn openapi_schema(&self) -> Option<OpenApi> {
        None
    }
}

/// Route configuration returned by plugins
pub struct PluginRoutes {
    pub router: Router,
}

impl PluginRoutes {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

/// Type-safe service registry for dependency injection
#[derive(Default)]
pub struct ServiceRegistry {
    services: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Send + Sync + 'static + ?Sized>(&self, service: Arc<T>) {
        debug!("Registering service: {}", std::any::type_name::<T>());
        self.services
            .lock()
            .unwrap()
            .insert(TypeId::of::<T>(), Box::new(service));
    }

    pub fn get<T: Send + Sync + 'static + ?Sized>(&self) -> Option<Arc<T>> {
        self.services
            .lock()
            .unwrap()
            .get(&TypeId::of::<T>())
            .and_then(|any| any.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// Require a service - panics with a helpful error if not available
    pub fn require<T: Send + Sync + 'static + ?Sized>(&self) -> Arc<T> {
        self.get::<T>().unwrap_or_else(|| {
            panic!(
                "Service '{}' is required but not registered. \
                 Register the plugin providing it before the plugins that depend on it.",
                std::any::type_name::<T>()
            )
        })
    }
}

/// Context handed to plugins for service access and registration
#[derive(Clone)]
pub struct PluginContext {
    registry: Arc<ServiceRegistry>,
}

impl Default for PluginContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginContext {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ServiceRegistry::new()),
        }
    }

    pub fn register_service<T: Send + Sync + 'static + ?Sized>(&self, service: Arc<T>) {
        self.registry.register(service);
    }

    pub fn get_service<T: Send + Sync + 'static + ?Sized>(&self) -> Option<Arc<T>> {
        self.registry.get::<T>()
    }

    pub fn require_service<T: Send + Sync + 'static + ?Sized>(&self) -> Arc<T> {
        self.registry.require::<T>()
    }
}

/// Plugin manager: initialization, route assembly and OpenAPI aggregation
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Box<dyn CertopPlugin>>,
    context: PluginContext,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin (order matters for dependencies)
    pub fn register_plugin(&mut self, plugin: Box<dyn CertopPlugin>) {
        debug!("Registering plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    /// Access the shared context, e.g. to seed core services before
    /// plugin initialization.
    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    /// Initialize all plugins in registration order
    pub async fn initialize_plugins(&mut self) -> Result<(), PluginError> {
        debug!("Initializing {} plugins", self.plugins.len());

        for plugin in &self.plugins {
            debug!("Initializing plugin: {}", plugin.name());
            plugin
                .register_services(&self.context)
                .await
                .map_err(|e| PluginError::RegistrationFailed {
                    plugin_name: plugin.name().to_string(),
                    error: e.to_string(),
                })?;
        }

        Ok(())
    }

    /// Build the API router with all plugin routes nested under `/api`.
    pub fn build_application(&self) -> Router {
        let mut api_router = Router::new();

        for plugin in &self.plugins {
            if let Some(plugin_routes) = plugin.configure_routes(&self.context) {
                debug!("Adding routes for plugin: {}", plugin.name());
                api_router = api_router.merge(plugin_routes.router);
            }
        }

        Router::new().nest("/api", api_router)
    }

    /// Get the unified OpenAPI schema from all plugins
    pub fn unified_openapi(&self) -> OpenApi {
        use utoipa::openapi::*;

        let mut combined = OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title("Certop")
                    .description(Some(
                        "Operational control plane for domain TLS certificates",
                    ))
                    .version(env!("CARGO_PKG_VERSION"))
                    .build(),
            )
            .servers(Some(vec![ServerBuilder::new()
                .url("/api")
                .description(Some("Base path for all API endpoints"))
                .build()]))
            .build();

        for plugin in &self.plugins {
            if let Some(schema) = plugin.openapi_schema() {
                debug!("Merging OpenAPI schema for plugin: {}", plugin.name());
                combined = merge_openapi(combined, schema);
            }
        }

        combined
    }
}

fn merge_openapi(mut base: OpenApi, plugin_schema: OpenApi) -> OpenApi {
    for (path, path_item) in plugin_schema.paths.paths {
        base.paths.paths.insert(path, path_item);
    }

    if let Some(plugin_components) = plugin_schema.components {
        let base_components = base
            .components
            .get_or_insert_with(|| ComponentsBuilder::new().build());

        for (name, schema) in plugin_components.schemas {
            base_components.schemas.insert(name, schema);
        }
        for (name, response) in plugin_components.responses {
            base_components.responses.insert(name, response);
        }
    }

    if let Some(plugin_tags) = plugin_schema.tags {
        base.tags.get_or_insert_with(Vec::new).extend(plugin_tags);
    }

    base
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ProbePlugin;

    impl CertopPlugin for ProbePlugin {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn register_services<'a>(
            &'a self,
            context: &'a PluginContext,
        ) -> Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>> {
            Box::pin(async move {
                context.register_service(Arc::new("probe-service".to_string()));
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn registers_and_resolves_services() {
        let mut manager = PluginManager::new();
        manager.register_plugin(Box::new(ProbePlugin));
        manager.initialize_plugins().await.unwrap();

        let service = manager.context().require_service::<String>();
        assert_eq!(service.as_str(), "probe-service");
    }

    #[test]
    fn get_returns_none_for_missing_service() {
        let context = PluginContext::new();
        assert!(context.get_service::<String>().is_none());
    }
}
