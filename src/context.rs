//! Typed access to bound call arguments.
//!
//! A [`HandlerContext`] carries the per-request [`CallArgs`] mapping built
//! by the binder plus the optional raw-request snapshot. The `#[get]` /
//! `#[post]` adapters pull declared parameters out of it; conversion
//! failures surface as 400s.

use crate::error::HandlerError;
use crate::route::CallArgs;
use crate::server::request::RequestInfo;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct HandlerContext {
    args: CallArgs,
    request: Option<RequestInfo>,
}

impl HandlerContext {
    pub fn new(args: CallArgs, request: Option<RequestInfo>) -> Self {
        Self { args, request }
    }

    /// Peek at a bound argument without consuming it.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Remove and convert a required argument.
    ///
    /// The binder has already enforced presence for declared-required names,
    /// so a miss here means a framework misuse and is reported as a 400
    /// rather than a panic.
    pub fn take<T: DeserializeOwned>(&mut self, name: &str) -> Result<T, HandlerError> {
        let value = self
            .args
            .remove(name)
            .ok_or_else(|| HandlerError::BadRequest(format!("Missing argument: {name}")))?;
        convert(name, value)
    }

    /// Remove and convert an optional argument.
    pub fn take_opt<T: DeserializeOwned>(&mut self, name: &str) -> Result<Option<T>, HandlerError> {
        match self.args.remove(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => convert(name, value).map(Some),
        }
    }

    /// Drain whatever the declared parameters did not consume (catch-all).
    #[must_use]
    pub fn take_rest(&mut self) -> CallArgs {
        std::mem::take(&mut self.args)
    }

    /// The raw request snapshot, when the handler declared `request`.
    #[must_use]
    pub fn request(&self) -> Option<&RequestInfo> {
        self.request.as_ref()
    }

    /// Consume the raw request snapshot.
    #[must_use]
    pub fn take_request(&mut self) -> Option<RequestInfo> {
        self.request.take()
    }
}

/// Convert a bound JSON value into the declared parameter type.
///
/// Query, form and path values arrive as strings; a string that fails
/// direct deserialization is re-parsed as a JSON literal so `"42"` binds an
/// integer parameter and `"true"` a boolean. The reverse also holds: a
/// non-string body value binds a `String` parameter via stringification.
fn convert<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, HandlerError> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(v) => Ok(v),
        Err(_) => {
            let fallback = match value {
                Value::String(s) => serde_json::from_str::<T>(&s).ok(),
                other => serde_json::from_value::<T>(Value::String(other.to_string())).ok(),
            };
            fallback.ok_or_else(|| HandlerError::BadRequest(format!("Invalid argument: {name}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(pairs: &[(&str, Value)]) -> HandlerContext {
        let mut args = CallArgs::new();
        for (k, v) in pairs {
            args.insert(k.to_string(), v.clone());
        }
        HandlerContext::new(args, None)
    }

    #[test]
    fn test_take_string() {
        let mut c = ctx(&[("id", json!("abc"))]);
        let id: String = c.take("id").unwrap();
        assert_eq!(id, "abc");
    }

    #[test]
    fn test_take_parses_numeric_string() {
        let mut c = ctx(&[("id", json!("42"))]);
        let id: i64 = c.take("id").unwrap();
        assert_eq!(id, 42);
    }

    #[test]
    fn test_take_stringifies_number_for_string_param() {
        let mut c = ctx(&[("id", json!(42))]);
        let id: String = c.take("id").unwrap();
        assert_eq!(id, "42");
    }

    #[test]
    fn test_take_invalid_is_bad_request() {
        let mut c = ctx(&[("id", json!("not-a-number"))]);
        let err = c.take::<i64>("id").unwrap_err();
        assert!(matches!(err, HandlerError::BadRequest(_)));
    }

    #[test]
    fn test_take_opt_absent() {
        let mut c = ctx(&[]);
        let page: Option<u32> = c.take_opt("page").unwrap();
        assert!(page.is_none());
    }

    #[test]
    fn test_take_rest_drains() {
        let mut c = ctx(&[("a", json!(1)), ("b", json!(2))]);
        let _: i64 = c.take("a").unwrap();
        let rest = c.take_rest();
        assert_eq!(rest.len(), 1);
        assert!(rest.contains_key("b"));
        assert!(c.take_rest().is_empty());
    }
}
