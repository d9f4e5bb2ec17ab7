//! Async HTTP server: tokio + hyper. Maps requests onto Application and errors onto status codes.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response as HyperResponse, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpListener;

use crate::application::Application;
use crate::{CoreError, Response};

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Accept loop on an already bound listener. One task per connection; returns when `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    app: Arc<Application>,
    shutdown: F,
) -> Result<(), CoreError>
where
    F: Future<Output = ()>,
{
    let addr = listener.local_addr()?;
    for route in app.routes() {
        tracing::info!(method = %route.method, path = %route.path, "route registered");
    }
    tracing::info!(%addr, "listening");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(%addr, "shutting down");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(x) => x,
                    Err(e) => {
                        tracing::error!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let app = Arc::clone(&app);
                tokio::task::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| {
                        let app = Arc::clone(&app);
                        async move { Ok::<_, Infallible>(dispatch(&app, req).await) }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                        tracing::error!(%peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }
}

async fn dispatch(app: &Application, req: Request<Incoming>) -> HyperResponse<Full<Bytes>> {
    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();
    match app.handle_request(&method, &path).await {
        Ok(resp) => into_hyper_response(resp),
        Err(e) => {
            tracing::debug!(%method, %path, status = e.status_code(), error = %e, "request failed");
            error_to_hyper(&e)
        }
    }
}

fn into_hyper_response(resp: Response) -> HyperResponse<Full<Bytes>> {
    let mut out = HyperResponse::new(Full::new(Bytes::from(resp.body)));
    *out.status_mut() =
        StatusCode::from_u16(resp.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = resp.content_type.as_deref();
    if let Some(ct) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
        out.headers_mut().insert(CONTENT_TYPE, ct);
    }
    out
}

fn error_to_hyper(e: &CoreError) -> HyperResponse<Full<Bytes>> {
    let msg = e.to_string();
    let body = serde_json::to_vec(&ErrorBody { error: &msg })
        .unwrap_or_else(|_| msg.clone().into_bytes());
    into_hyper_response(Response {
        status_code: e.status_code(),
        body,
        content_type: Some("application/json".to_string()),
    })
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed, never resolves.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

/// Start a multi-thread runtime, bind host:port and serve until Ctrl-C.
pub fn run(
    app: Arc<Application>,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr = format!("{}:{}", host, port);
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(async move {
        let listener = TcpListener::bind(&addr).await?;
        serve(listener, app, ctrl_c()).await?;
        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectError;
    use crate::transport::TransportError;
    use crate::{ClientError, Endpoint, ServiceName};

    #[test]
    fn error_statuses() {
        let unavailable = CoreError::Client(ClientError::Unavailable(SelectError::NoEndpoints(
            ServiceName::new("p"),
        )));
        assert_eq!(error_to_hyper(&unavailable).status(), StatusCode::SERVICE_UNAVAILABLE);

        let transport = CoreError::Client(ClientError::Transport {
            endpoint: Endpoint::new("h", 1),
            source: TransportError::Connect("refused".into()),
        });
        assert_eq!(error_to_hyper(&transport).status(), StatusCode::BAD_GATEWAY);

        let not_found = CoreError::NotFound("GET /x".into());
        let resp = error_to_hyper(&not_found);
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn text_response_headers() {
        let resp = into_hyper_response(Response::text("ok"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], Response::TEXT_PLAIN);
    }
}
