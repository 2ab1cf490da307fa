use std::time::Duration;

use tracing::info;

use super::Middleware;
use crate::dispatcher::HandlerRequest;
use crate::reply::WireResponse;

/// Logs each dispatched request and its outcome.
pub struct RequestLogMiddleware;

impl Middleware for RequestLogMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<crate::reply::Reply> {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            handler = %req.handler_name,
            "Request"
        );
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut WireResponse, latency: Duration) {
        info!(
            request_id = %req.request_id,
            handler = %req.handler_name,
            status = res.status,
            latency_ms = latency.as_millis() as u64,
            "Response"
        );
    }
}
