use axum::{
    body::{Body, BoxBody},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use serde_json::json;
use tower::{Layer, Service};

/// Rewrites error response bodies so internal detail does not leave the
/// server. Enabled in production; `obfuscate_all` extends the rewrite to
/// every 4xx/5xx instead of just the sensitive statuses.
#[derive(Clone)]
pub struct ObfuscateErrorLayer {
    enabled: bool,
    obfuscate_all: bool,
}

impl ObfuscateErrorLayer {
    pub fn new(enabled: bool, obfuscate_all: bool) -> ObfuscateErrorLayer {
        ObfuscateErrorLayer {
            enabled,
            obfuscate_all,
        }
    }
}

impl<S: Service<Request<Body>>> Layer<S> for ObfuscateErrorLayer {
    type Service = ObfuscateError<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ObfuscateError {
            inner,
            enabled: self.enabled,
            obfuscate_all: self.obfuscate_all,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObfuscateError<S> {
    inner: S,
    enabled: bool,
    obfuscate_all: bool,
}

impl<S> Service<Request<Body>> for ObfuscateError<S>
where
    S: Service<Request<Body>> + Send + 'static,
    S::Future: Send + 'static,
    S::Response: IntoResponse + Send + 'static,
{
    type Response = Response<BoxBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let enabled = self.enabled;
        let obfuscate_all = self.obfuscate_all;
        let fut = self.inner.call(req);
        Box::pin(async move {
            let res = fut.await?.into_response();
            if !enabled {
                return Ok(res);
            }

            let status = res.status();
            let (kind, message) = match status {
                StatusCode::INTERNAL_SERVER_ERROR => ("internal_server_error", "Internal error"),
                StatusCode::UNAUTHORIZED => ("unauthorized", "Unauthorized"),
                StatusCode::FORBIDDEN => ("forbidden", "Forbidden"),
                _ if obfuscate_all && (status.is_client_error() || status.is_server_error()) => {
                    ("error", "Request failed")
                }
                _ => ("", ""),
            };

            if message.is_empty() {
                return Ok(res);
            }

            let body = json!({
                "error": {
                    "kind": kind,
                    "message": message,
                }
            });

            let new_res = (status, axum::Json(body)).into_response();

            Ok(new_res)
        })
    }
}
