//! Consumer controller: /feign/get/{value} and /feign/port, both forwarded through the
//! load-balanced client.

use std::sync::Arc;

use relay_core::{
    Application, CoreError, EndpointSelector, HttpModule, HyperTransport, Module, PathParams,
    RemoteServiceClient, Response, StaticRegistry,
};

use crate::config::ConsumerArgs;

pub struct ConsumerModule {
    client: Arc<RemoteServiceClient>,
    prefix: String,
}

impl ConsumerModule {
    pub fn new(client: Arc<RemoteServiceClient>) -> Self {
        Self {
            client,
            prefix: "/feign".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }
}

impl Module for ConsumerModule {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        let provide_client = Arc::clone(&self.client);
        let ribbon_client = Arc::clone(&self.client);
        let mut routes = HttpModule::new("feign", Some(self.prefix.as_str()))
            .route(
                "get/{value}",
                move |params: PathParams| {
                    let client = Arc::clone(&provide_client);
                    async move {
                        let value = params.get("value").unwrap_or_default();
                        Ok::<_, CoreError>(Response::text(client.provide(value).await?))
                    }
                },
                &["GET"],
            )
            .route(
                "port",
                move |_| {
                    let client = Arc::clone(&ribbon_client);
                    async move { Ok::<_, CoreError>(Response::text(client.ribbon().await?)) }
                },
                &["GET"],
            );
        routes.register_into(app)
    }
}

/// Wire registry, selector, transport and client from configuration.
pub fn build_app(args: &ConsumerArgs) -> Result<Application, CoreError> {
    let service = args.service_name();
    let registry = Arc::new(StaticRegistry::new());
    registry.replace(service.clone(), args.endpoints.clone());
    let selector = Arc::new(EndpointSelector::new(registry, args.strategy.build()));
    let transport = Arc::new(HyperTransport::new(args.timeout()));
    let client = Arc::new(RemoteServiceClient::new(
        service,
        selector,
        transport,
        args.remote_paths()?,
    ));
    tracing::info!(
        service = %client.service(),
        endpoints = args.endpoints.len(),
        strategy = %args.strategy,
        "consumer configured"
    );
    let mut app = Application::new();
    app.register(&mut ConsumerModule::new(client))?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relay_core::{
        ClientError, Endpoint, RemotePaths, ServiceName, Strategy, Transport, TransportError,
    };

    /// Provider stand-in: "<value>-reply" for provide calls, the endpoint for anything else.
    struct StubProvider;

    #[async_trait]
    impl Transport for StubProvider {
        async fn get(&self, endpoint: &Endpoint, path: &str) -> Result<String, TransportError> {
            if endpoint.port == 0 {
                return Err(TransportError::Connect("connection refused".into()));
            }
            match path.strip_prefix("/provide/") {
                Some(value) => Ok(format!("{}-reply", value)),
                None => Ok(endpoint.to_string()),
            }
        }
    }

    fn app(endpoints: Vec<Endpoint>, strategy: Strategy) -> Application {
        let service = ServiceName::new("service-provider");
        let registry = Arc::new(StaticRegistry::new());
        registry.replace(service.clone(), endpoints);
        let client = Arc::new(RemoteServiceClient::new(
            service,
            Arc::new(EndpointSelector::new(registry, strategy.build())),
            Arc::new(StubProvider),
            RemotePaths::default(),
        ));
        let mut app = Application::new();
        app.register(&mut ConsumerModule::new(client)).unwrap();
        app
    }

    fn body(resp: Response) -> String {
        String::from_utf8(resp.body).unwrap()
    }

    #[tokio::test]
    async fn get_forwards_value() {
        let app = app(vec![Endpoint::new("p1", 8081)], Strategy::RoundRobin);
        let resp = app.handle_request("GET", "/feign/get/hello").await.unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(body(resp), "hello-reply");
    }

    #[tokio::test]
    async fn port_rotates_through_instances() {
        let app = app(
            vec![Endpoint::new("p1", 8081), Endpoint::new("p2", 8082)],
            Strategy::RoundRobin,
        );
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(body(app.handle_request("GET", "/feign/port").await.unwrap()));
        }
        assert_eq!(seen, ["p1:8081", "p2:8082", "p1:8081"]);
    }

    #[tokio::test]
    async fn first_strategy_sticks_to_one_instance() {
        let app = app(
            vec![Endpoint::new("p1", 8081), Endpoint::new("p2", 8082)],
            Strategy::FirstAvailable,
        );
        for _ in 0..3 {
            assert_eq!(
                body(app.handle_request("GET", "/feign/port").await.unwrap()),
                "p1:8081"
            );
        }
    }

    #[tokio::test]
    async fn failures_map_to_gateway_statuses() {
        let err = app(Vec::new(), Strategy::RoundRobin)
            .handle_request("GET", "/feign/port")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Client(ClientError::Unavailable(_))));
        assert_eq!(err.status_code(), 503);

        let err = app(vec![Endpoint::new("down", 0)], Strategy::RoundRobin)
            .handle_request("GET", "/feign/get/hello")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Client(ClientError::Transport { .. })));
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn custom_prefix() {
        let registry = Arc::new(StaticRegistry::new());
        registry.register(ServiceName::new("svc"), Endpoint::new("p1", 1));
        let client = Arc::new(RemoteServiceClient::new(
            ServiceName::new("svc"),
            Arc::new(EndpointSelector::round_robin(registry)),
            Arc::new(StubProvider),
            RemotePaths::default(),
        ));
        let mut app = Application::new();
        app.register(&mut ConsumerModule::new(client).with_prefix("/api"))
            .unwrap();
        assert_eq!(
            body(app.handle_request("GET", "/api/port").await.unwrap()),
            "p1:1"
        );
        assert!(app.handle_request("GET", "/feign/port").await.is_err());
    }
}
