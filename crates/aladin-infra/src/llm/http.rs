//! Shared reqwest plumbing: client construction, timeouts, and mapping of
//! transport failures and non-200 statuses onto [`LlmError`].

use std::time::Duration;

use reqwest::StatusCode;

use aladin_types::llm::LlmError;

/// Connect timeout for chat requests.
pub(crate) const CHAT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall timeout for a chat request. Local models can be slow to answer.
pub(crate) const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

/// Connect and read timeouts for listing and credential probes.
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect and read timeouts for pure connectivity checks.
pub(crate) const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(3);

/// Build a client with the given connect timeout and total budget.
pub(crate) fn build_client(connect: Duration, total: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect)
        .timeout(total)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Client for probes: `timeout` to connect, and `timeout` for each read.
pub(crate) fn probe_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Classify a reqwest transport error.
pub(crate) fn classify_transport(err: &reqwest::Error) -> LlmError {
    let detail = err.to_string();
    if err.is_timeout() {
        LlmError::Timeout(detail)
    } else if err.is_connect() {
        LlmError::NetworkUnreachable(detail)
    } else if err.is_builder() {
        LlmError::EndpointMisconfigured(detail)
    } else if err.is_decode() {
        LlmError::Protocol(detail)
    } else if err.is_request() {
        LlmError::NetworkUnreachable(detail)
    } else {
        LlmError::Protocol(detail)
    }
}

/// Classify a non-200 response given the backend's error message.
///
/// A message mentioning "rate limit" wins over the status code.
pub(crate) fn classify_status(status: StatusCode, message: String) -> LlmError {
    if message.to_lowercase().contains("rate limit") {
        return LlmError::RateLimited(message);
    }
    match status.as_u16() {
        401 | 403 => LlmError::InvalidCredential(message),
        404 => LlmError::EndpointMisconfigured(message),
        429 => LlmError::RateLimited(message),
        code => LlmError::Protocol(format!("HTTP {code}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use aladin_types::llm::ErrorKind;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_status_classification() {
        let kind = |code: u16| {
            classify_status(StatusCode::from_u16(code).unwrap(), "boom".to_string()).kind()
        };
        assert_eq!(kind(401), ErrorKind::InvalidCredential);
        assert_eq!(kind(403), ErrorKind::InvalidCredential);
        assert_eq!(kind(404), ErrorKind::EndpointMisconfigured);
        assert_eq!(kind(429), ErrorKind::RateLimited);
        assert_eq!(kind(500), ErrorKind::ProtocolError);
    }

    #[test]
    fn test_rate_limit_message_wins() {
        let err = classify_status(
            StatusCode::BAD_REQUEST,
            "Rate Limit reached for requests".to_string(),
        );
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn test_protocol_error_carries_status() {
        let err = classify_status(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_unreachable() {
        // Port 9 (discard) on localhost is essentially never listening.
        let client = probe_client(CONNECTIVITY_TIMEOUT);
        let err = client
            .get("http://127.0.0.1:9/api/tags")
            .send()
            .await
            .unwrap_err();
        assert_eq!(classify_transport(&err).kind(), ErrorKind::NetworkUnreachable);
    }

    #[tokio::test]
    async fn test_bad_url_is_endpoint_misconfigured() {
        let client = probe_client(CONNECTIVITY_TIMEOUT);
        let err = client.get("not a url/models").send().await.unwrap_err();
        assert_eq!(
            classify_transport(&err).kind(),
            ErrorKind::EndpointMisconfigured
        );
    }

    #[tokio::test]
    async fn test_probe_client_enforces_read_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = probe_client(Duration::from_millis(200));
        let err = client.get(server.uri()).send().await.unwrap_err();
        assert_eq!(classify_transport(&err).kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_probe_client_allows_reply_within_read_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(50)))
            .mount(&server)
            .await;

        let client = probe_client(Duration::from_secs(2));
        let response = client.get(server.uri()).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
