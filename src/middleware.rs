use crate::auth::CurrentUser;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::Request;
use rocket::{Data, Response};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Correlates the access log, error logs and the `X-Request-Id` response header.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuses a caller-supplied id when it is a UUID, so traces from the web client line up.
    pub fn from_header(value: Option<&str>) -> Self {
        value
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .map(|id| RequestId(id.to_string()))
            .unwrap_or_else(|| RequestId(Uuid::new_v4().to_string()))
    }
}

#[derive(Clone, Copy)]
struct RequestStart(Instant);

/// Access log: one line per request with route, user, status and latency.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let request_id = RequestId::from_header(request.headers().get_one(REQUEST_ID_HEADER));
        request.local_cache(|| Some(request_id.clone()));
        request.local_cache(|| Some(RequestStart(Instant::now())));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let request_id = request
            .local_cache(|| None::<RequestId>)
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let elapsed_ms = request
            .local_cache(|| None::<RequestStart>)
            .as_ref()
            .map(|start| start.0.elapsed().as_millis())
            .unwrap_or_default();
        // Only set once an auth guard has run.
        let user_id = request
            .local_cache(|| None::<CurrentUser>)
            .as_ref()
            .map(|u| u.id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());
        let route = request.route().and_then(|r| r.name.as_deref()).unwrap_or("-");
        let status = response.status();

        response.set_header(Header::new(REQUEST_ID_HEADER, request_id.clone()));
        response.set_header(Header::new("X-Content-Type-Options", "nosniff"));
        // Budgets and balances are per user.
        response.set_header(Header::new("Cache-Control", "no-store"));

        if status.class().is_server_error() {
            warn!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                route = route,
                user_id = %user_id,
                status = status.code,
                elapsed_ms = elapsed_ms as u64,
                "request failed"
            );
        } else {
            info!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                route = route,
                user_id = %user_id,
                status = status.code,
                elapsed_ms = elapsed_ms as u64,
                "request served"
            );
        }
    }
}
