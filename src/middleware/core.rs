use std::time::Duration;

use crate::dispatcher::HandlerRequest;
use crate::reply::{Reply, WireResponse};

pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<Reply> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut WireResponse, _latency: Duration) {}
}
