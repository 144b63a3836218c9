use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::WorkshopError;

/// `axum::Json` whose rejections come back in the v1 error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(WorkshopError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for WorkshopError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> WorkshopError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                WorkshopError::Validation(format!("Missing required field: {field}"))
            } else {
                WorkshopError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            WorkshopError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            WorkshopError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(_) => {
            WorkshopError::Internal("Failed to read request body".to_string())
        }
        _ => WorkshopError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_missing_field_name() {
        let message = "Failed to deserialize the JSON body into the target type: missing field `age` at line 1 column 2";
        assert_eq!(extract_missing_field(message), Some("age"));
        assert_eq!(extract_missing_field("unknown variant `huge`"), None);
    }
}
