//! Wire-level response writing for `may_minihttp`.

use crate::reply::WireResponse;
use may_minihttp::Response;
use serde_json::Value;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Write a fully coerced [`WireResponse`].
pub fn write_wire_response(res: &mut Response, wire: WireResponse) {
    res.status_code(wire.status as usize, status_reason(wire.status));
    for (name, value) in &wire.headers {
        // may_minihttp takes &'static str headers; dynamic ones are leaked.
        let header = format!("{name}: {value}").into_boxed_str();
        res.header(Box::leak(header));
    }
    res.body_vec(wire.body);
}

/// Write a JSON error body: `{"error": ...}` plus request context.
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json; charset=utf-8");
    res.body_vec(body.to_string().into_bytes());
}

/// Write a plain-text 400 for a bind rejection.
pub fn write_bad_request(res: &mut Response, message: &str) {
    res.status_code(400, status_reason(400));
    res.header("Content-Type: text/plain; charset=utf-8");
    res.body_vec(message.as_bytes().to_vec());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(302), "Found");
        assert_eq!(status_reason(999), "OK");
    }
}
