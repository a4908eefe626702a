use log::debug;
use serde_json::Value;

use crate::error::AppError;

/// Pull the most useful message out of a FastAPI-style error body.
/// `detail` may be a plain string, an object with a `message`, or a list of
/// field errors carrying `msg`.
fn extract_detail_message(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Map a non-2xx response to an AppError. Prefers the server-supplied
/// message; the generic fallback keeps the status code visible for
/// diagnosability.
pub fn map_server_error(status: u16, body: &str) -> AppError {
    debug!("Mapping server error: status={}, body={}", status, body);

    let message =
        extract_detail_message(body).unwrap_or_else(|| format!("Request failed (HTTP {})", status));

    match status {
        400 | 422 => AppError::ValidationError(message),
        401 => AppError::AuthError(message),
        403 => AppError::AccessDenied(message),
        429 => AppError::RateLimitError(message),
        500..=599 => AppError::ServerError(message),
        _ => AppError::TransportError { status, message },
    }
}

/// Map a 200 response that carried `application/json` instead of an event
/// stream. The server answers this way when it rejects the request before
/// generation starts.
pub fn map_inband_error(body: &str) -> AppError {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if value.get("type").and_then(Value::as_str) == Some("error") {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Request rejected by server")
                .to_string();
            let code = value
                .get("code")
                .and_then(Value::as_str)
                .map(str::to_string);

            return match value.get("status").and_then(Value::as_str) {
                Some("validation_error") => AppError::ValidationError(message),
                _ => AppError::UpstreamError { message, code },
            };
        }
    }

    AppError::ServerError("Expected an event stream but received a JSON document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_string_detail() {
        let error = map_server_error(401, r#"{"detail":"Invalid token"}"#);
        match error {
            AppError::AuthError(message) => assert_eq!(message, "Invalid token"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn maps_object_detail_message() {
        let error = map_server_error(500, r#"{"detail":{"message":"upstream unavailable"}}"#);
        match error {
            AppError::ServerError(message) => assert_eq!(message, "upstream unavailable"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn maps_field_error_list() {
        let error = map_server_error(
            422,
            r#"{"detail":[{"loc":["body","input_code"],"msg":"field required"}]}"#,
        );
        match error {
            AppError::ValidationError(message) => assert_eq!(message, "field required"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn fallback_message_includes_status_code() {
        let error = map_server_error(503, "<html>gateway</html>");
        match error {
            AppError::ServerError(message) => assert!(message.contains("503"), "{}", message),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unclassified_status_keeps_the_code_as_data() {
        let error = map_server_error(418, "teapot");
        match error {
            AppError::TransportError { status, .. } => assert_eq!(status, 418),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn inband_validation_failure_maps_to_validation_error() {
        let error = map_inband_error(
            r#"{"type":"error","status":"validation_error","message":"input_code too long"}"#,
        );
        match error {
            AppError::ValidationError(message) => assert_eq!(message, "input_code too long"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn inband_error_keeps_machine_readable_code() {
        let error = map_inband_error(
            r#"{"type":"error","status":"quota_exhausted","message":"no credit","code":"INSUFFICIENT_BALANCE"}"#,
        );
        match error {
            AppError::UpstreamError { message, code } => {
                assert_eq!(message, "no credit");
                assert_eq!(code.as_deref(), Some("INSUFFICIENT_BALANCE"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unexpected_json_document_is_a_server_error() {
        assert!(matches!(
            map_inband_error(r#"{"hello":"world"}"#),
            AppError::ServerError(_)
        ));
    }
}
