use serde::Deserialize;

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Pull the human-readable message out of a Google error body
///
/// Falls back to the raw body when it is not the standard envelope.
pub fn google_error_message(body: &str) -> String {
    match serde_json::from_str::<GoogleErrorResponse>(body) {
        Ok(GoogleErrorResponse {
            error: GoogleErrorDetail { message, status: Some(status) },
        }) if !message.is_empty() => format!("{status}: {message}"),
        Ok(GoogleErrorResponse { error }) if !error.message.is_empty() => error.message,
        _ if body.trim().is_empty() => "Unknown error".to_string(),
        _ => body.trim().to_string(),
    }
}

/// Consume a non-success response into its status and message
pub async fn read_upstream_error(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    (status, google_error_message(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_envelope() {
        let body = r#"{"error": {"code": 400, "message": "Invalid recognition 'config'", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(google_error_message(body), "INVALID_ARGUMENT: Invalid recognition 'config'");
    }

    #[test]
    fn envelope_without_status() {
        let body = r#"{"error": {"code": 403, "message": "Access denied"}}"#;
        assert_eq!(google_error_message(body), "Access denied");
    }

    #[test]
    fn plain_text_body() {
        assert_eq!(google_error_message("  upstream exploded \n"), "upstream exploded");
        assert_eq!(google_error_message(""), "Unknown error");
    }
}
