//! Application assembly.
//!
//! [`App`] ties the pieces together in the order a service boots: load
//! configuration, set up templating and static files, mount routes, add
//! middleware, serve. Registration failures abort startup with a
//! [`RegistrationError`] instead of surfacing at request time.

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{RegistrationError, TemplateError};
use crate::route::RouteDef;
use crate::router::Router;
use crate::server::{AppService, HttpServer, ServerHandle};
use crate::static_files::StaticFiles;
use crate::templates::TemplateEngine;
use std::io;
use std::sync::{Arc, RwLock};
use tracing::info;

pub struct App {
    config: AppConfig,
    router: Arc<RwLock<Router>>,
    dispatcher: Arc<RwLock<Dispatcher>>,
    static_files: Option<StaticFiles>,
}

impl App {
    /// Assemble an application from configuration.
    ///
    /// Loads the template environment and static directory when the config
    /// names them.
    pub fn new(config: AppConfig) -> Result<Self, TemplateError> {
        let mut dispatcher = Dispatcher::new();
        if let Some(dir) = &config.template_dir {
            dispatcher.set_templates(Arc::new(TemplateEngine::from_dir(dir)?));
        }
        let static_files = config.static_dir.as_ref().map(StaticFiles::new);
        Ok(Self {
            config,
            router: Arc::new(RwLock::new(Router::new())),
            dispatcher: Arc::new(RwLock::new(dispatcher)),
            static_files,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register a set of route definitions.
    ///
    /// Definitions are sorted by handler name first so registration order -
    /// and therefore duplicate-route resolution and log output - is
    /// reproducible regardless of how the list was assembled.
    pub fn mount(&mut self, mut routes: Vec<RouteDef>) -> Result<(), RegistrationError> {
        routes.sort_by_key(|def| def.name);
        let mut router = self.router.write().unwrap();
        let mut dispatcher = self.dispatcher.write().unwrap();
        for def in routes {
            router.register(&def)?;
            // SAFETY: mounting happens during startup, before the server
            // accepts requests; the may runtime is ready once the process
            // runs.
            unsafe {
                dispatcher.register_handler(def.name, def.handler.clone());
            }
        }
        info!(routes = router.len(), "Routes mounted");
        Ok(())
    }

    /// Add middleware to the dispatch pipeline.
    pub fn add_middleware(&mut self, mw: Arc<dyn crate::middleware::Middleware>) {
        self.dispatcher.write().unwrap().add_middleware(mw);
    }

    /// Start the HTTP server on the configured address.
    pub fn serve(&self) -> io::Result<ServerHandle> {
        let service = AppService::new(
            self.router.clone(),
            self.dispatcher.clone(),
            self.static_files.clone(),
        );
        let addr = self.config.bind_addr();
        info!(addr = %addr, "Starting server");
        HttpServer(service).start(addr)
    }
}
