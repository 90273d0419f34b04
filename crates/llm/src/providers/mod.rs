//! Completion provider implementations.

pub mod groq;
pub mod mock;
pub mod ollama;

pub use groq::GroqClient;
pub use mock::MockClient;
pub use ollama::OllamaClient;

use ragcourse_core::AppError;
use reqwest::StatusCode;

/// Map a failed HTTP send to a transport error.
pub(crate) fn send_error(provider: &str, err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Transport(format!("{} request timed out: {}", provider, err))
    } else {
        AppError::Transport(format!("Failed to send request to {}: {}", provider, err))
    }
}

/// Map an unreadable or malformed response body to a transport error.
pub(crate) fn decode_error(provider: &str, err: reqwest::Error) -> AppError {
    AppError::Transport(format!("Failed to decode {} response: {}", provider, err))
}

/// Map a non-success HTTP status to the matching error class.
pub(crate) fn status_error(provider: &str, status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Auth(format!(
            "{} rejected the API credential ({}): {}",
            provider, status, body
        )),
        StatusCode::TOO_MANY_REQUESTS => {
            AppError::RateLimit(format!("{} throttled the request: {}", provider, body))
        }
        s if s.is_server_error() => {
            AppError::Transport(format!("{} server error ({}): {}", provider, status, body))
        }
        _ => AppError::Llm(format!("{} API error ({}): {}", provider, status, body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LlmClient, LlmRequest};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one HTTP 200 response with `body` and return the server's base URL.
    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_malformed_groq_body_is_transport_error() {
        let url = serve_once("{\"choices\": [tru").await;
        let client = GroqClient::new(Some("gsk_test".to_string()))
            .unwrap()
            .with_base_url(url);

        let result = client.complete(&LlmRequest::new("hi", "m")).await;
        assert!(matches!(result, Err(AppError::Transport(_))), "{:?}", result);
    }

    #[tokio::test]
    async fn test_malformed_ollama_body_is_transport_error() {
        let url = serve_once("not json at all").await;
        let client = OllamaClient::with_base_url(url);

        let result = client.complete(&LlmRequest::new("hi", "m")).await;
        assert!(matches!(result, Err(AppError::Transport(_))), "{:?}", result);
    }

    #[test]
    fn test_status_error_classes() {
        assert!(matches!(
            status_error("groq", StatusCode::UNAUTHORIZED, ""),
            AppError::Auth(_)
        ));
        assert!(matches!(
            status_error("groq", StatusCode::FORBIDDEN, ""),
            AppError::Auth(_)
        ));
        assert!(matches!(
            status_error("groq", StatusCode::TOO_MANY_REQUESTS, "slow down"),
            AppError::RateLimit(_)
        ));
        assert!(matches!(
            status_error("groq", StatusCode::BAD_GATEWAY, ""),
            AppError::Transport(_)
        ));
        assert!(matches!(
            status_error("groq", StatusCode::BAD_REQUEST, "bad model"),
            AppError::Llm(_)
        ));
    }
}
