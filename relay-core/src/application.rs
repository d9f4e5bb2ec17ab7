//! Application: route table plus async handlers. Dispatches with or without HTTP.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::module::Module;
use crate::router::{PathParams, RouteId, RouteMatch, Router};
use crate::{CoreError, Response};

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response, CoreError>> + Send>>;

/// Async handler: receives the captured path parameters.
pub type Handler = Arc<dyn Fn(PathParams) -> HandlerFuture + Send + Sync>;

/// Registered route: method and path pattern as given.
#[derive(Clone, Debug)]
pub struct Route {
    pub method: String,
    pub path: String,
}

pub struct Application {
    router: Router,
    routes: Vec<Route>,
    handlers: HashMap<RouteId, Handler>,
    next_route_id: u32,
}

impl Application {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            routes: Vec::new(),
            handlers: HashMap::new(),
            next_route_id: 0,
        }
    }

    /// Register a route and its handler. Path e.g. "/feign/get/{value}".
    pub fn register_route(&mut self, method: &str, path: &str, handler: Handler) -> RouteId {
        let id = RouteId(self.next_route_id);
        self.next_route_id += 1;
        self.router.add(method, path, id);
        self.routes.push(Route {
            method: method.to_uppercase(),
            path: format!("/{}", path.trim_start_matches('/')),
        });
        self.handlers.insert(id, handler);
        id
    }

    /// Register a module (routes of one controller).
    pub fn register(&mut self, module: &mut dyn Module) -> Result<(), CoreError> {
        module.register_into(self)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Handle one request (for tests or when HTTP is external).
    pub async fn handle_request(&self, method: &str, path: &str) -> Result<Response, CoreError> {
        let (route_id, params) = match self.router.match_route(method, path) {
            RouteMatch::Found(id, params) => (id, params),
            RouteMatch::MethodNotAllowed => {
                return Err(CoreError::MethodNotAllowed(format!("{} {}", method, path)))
            }
            RouteMatch::NotFound => {
                return Err(CoreError::NotFound(format!("{} {}", method, path)))
            }
        };
        let handler = self
            .handlers
            .get(&route_id)
            .ok_or_else(|| CoreError::NotFound(format!("route_id {:?}", route_id)))?;
        handler(params).await
    }

    /// Run HTTP server (blocks until Ctrl-C).
    pub fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        crate::http::run(Arc::new(self), host, port)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}
