use axum::body;
use serde::de::DeserializeOwned;

/// Test helper which drains an HTTP response body and parses it as JSON into
/// the requested type, panicking with diagnostics if either step fails
pub async fn deserialize_body<T: DeserializeOwned>(response_body: body::Body) -> T {
    let body_bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Failed to drain the response body!");

    serde_json::from_slice(&body_bytes).unwrap_or_else(|parse_err| {
        panic!(
            "Response body did not parse as the expected type! Error: {}, raw body: {:?}",
            parse_err, body_bytes
        )
    })
}
