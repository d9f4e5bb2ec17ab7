//! HttpModule: routes grouped under a prefix.

use std::future::Future;
use std::sync::Arc;

use crate::application::{Application, Handler, HandlerFuture};
use crate::module::Module;
use crate::router::PathParams;
use crate::{CoreError, Response};

/// HTTP module (one controller): name + prefixed routes. Attach via app.register(module).
pub struct HttpModule {
    pub name: String,
    pub prefix: String,
    routes: Vec<(String, Handler, String)>,
}

impl HttpModule {
    /// Prefix defaults to "/{name}".
    pub fn new(name: &str, prefix: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.map_or_else(|| format!("/{}", name), str::to_string),
            routes: Vec::new(),
        }
    }

    /// Add a route. `path` is relative to the prefix; methods e.g. ["GET"].
    pub fn route<F, Fut>(mut self, path: &str, handler: F, methods: &[&str]) -> Self
    where
        F: Fn(PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, CoreError>> + Send + 'static,
    {
        let full_path = format!(
            "{}/{}",
            self.prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let handler: Handler =
            Arc::new(move |params| -> HandlerFuture { Box::pin(handler(params)) });
        for method in methods {
            self.routes
                .push((full_path.clone(), Arc::clone(&handler), method.to_string()));
        }
        self
    }
}

impl Module for HttpModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        for (path, handler, method) in self.routes.drain(..) {
            app.register_route(&method, &path, handler);
        }
        Ok(())
    }
}
