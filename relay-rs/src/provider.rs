//! Stub provider instance: the downstream side of the consumer, for local runs and tests.

use relay_core::{Application, CoreError, Endpoint, HttpModule, Module, PathParams, Response};

use crate::config::ProviderArgs;

/// Serves `/provide/{value}` ("<value>-reply") and `/ribbon` (the advertised host:port).
pub struct ProviderModule {
    advertise: Endpoint,
}

impl ProviderModule {
    pub fn new(advertise: Endpoint) -> Self {
        Self { advertise }
    }
}

impl Module for ProviderModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        let me = self.advertise.to_string();
        let mut routes = HttpModule::new("provider", Some("/"))
            .route(
                "provide/{value}",
                |params: PathParams| async move {
                    let value = params.get("value").unwrap_or_default();
                    Ok::<_, CoreError>(Response::text(format!("{}-reply", value)))
                },
                &["GET"],
            )
            .route(
                "ribbon",
                move |_| {
                    let me = me.clone();
                    async move { Ok::<_, CoreError>(Response::text(me)) }
                },
                &["GET"],
            );
        routes.register_into(app)
    }
}

pub fn build_app(args: &ProviderArgs) -> Result<Application, CoreError> {
    let advertise = args.advertised();
    tracing::info!(%advertise, "provider configured");
    let mut app = Application::new();
    app.register(&mut ProviderModule::new(advertise))?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> Application {
        let mut app = Application::new();
        app.register(&mut ProviderModule::new(Endpoint::new("10.0.0.7", 8081)))
            .unwrap();
        app
    }

    #[tokio::test]
    async fn provide_replies_with_value() {
        let resp = app().handle_request("GET", "/provide/hello").await.unwrap();
        assert_eq!(resp.body, b"hello-reply");
    }

    #[tokio::test]
    async fn ribbon_reports_advertised_endpoint() {
        let resp = app().handle_request("GET", "/ribbon").await.unwrap();
        assert_eq!(resp.body, b"10.0.0.7:8081");
    }
}
