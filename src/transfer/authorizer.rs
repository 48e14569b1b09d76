//! Authorization Client
//!
//! Every transfer must be cleared by an external authorization oracle before
//! any balance is touched. The oracle answers `{ "data": { "authorization":
//! bool } }`; an explicit `false` is a business decision (`Unauthorized`),
//! everything else that goes wrong is a dependency fault
//! (`AuthorizationUnavailable`).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use super::error::TransferError;
use crate::config::AuthorizationConfig;

/// Seam for the external authorization oracle
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self) -> Result<(), TransferError>;
}

#[derive(Debug, Deserialize)]
struct AuthorizationResponse {
    data: AuthorizationDecision,
}

#[derive(Debug, Deserialize)]
struct AuthorizationDecision {
    authorization: bool,
}

/// HTTP client for the authorization oracle.
///
/// Transport errors and non-2xx statuses are transient: retried up to
/// `retries` times with a fixed backoff. An explicit negative decision is
/// never retried.
pub struct HttpAuthorizer {
    client: reqwest::Client,
    url: String,
    retries: u32,
    backoff: Duration,
}

impl HttpAuthorizer {
    pub fn new(config: &AuthorizationConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            retries: config.retries,
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }
}

#[async_trait]
impl Authorizer for HttpAuthorizer {
    async fn authorize(&self) -> Result<(), TransferError> {
        let mut last_failure = String::new();

        for attempt in 0..=self.retries {
            if attempt > 0 {
                tokio::time::sleep(self.backoff).await;
            }

            match self.client.get(&self.url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let payload: AuthorizationResponse = match resp.json().await {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "Malformed authorization payload");
                            return Err(TransferError::AuthorizationUnavailable(
                                "malformed authorization payload".to_string(),
                            ));
                        }
                    };

                    return if payload.data.authorization {
                        Ok(())
                    } else {
                        Err(TransferError::Unauthorized)
                    };
                }
                Ok(resp) => {
                    warn!(
                        status = %resp.status(),
                        attempt = attempt + 1,
                        "Authorization service returned failure status"
                    );
                    last_failure = format!("status {}", resp.status());
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempt + 1, "Authorization request failed");
                    last_failure = e.to_string();
                }
            }
        }

        Err(TransferError::AuthorizationUnavailable(last_failure))
    }
}

/// Scripted authorizer for tests
pub struct MockAuthorizer {
    outcome: MockOutcome,
    calls: std::sync::atomic::AtomicUsize,
}

/// Outcome a [`MockAuthorizer`] is scripted to produce
#[derive(Debug, Clone, Copy)]
pub enum MockOutcome {
    Approve,
    Deny,
    Unavailable,
}

impl MockAuthorizer {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of authorize() calls observed
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Authorizer for MockAuthorizer {
    async fn authorize(&self) -> Result<(), TransferError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.outcome {
            MockOutcome::Approve => Ok(()),
            MockOutcome::Deny => Err(TransferError::Unauthorized),
            MockOutcome::Unavailable => Err(TransferError::AuthorizationUnavailable(
                "scripted outage".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config(url: String) -> AuthorizationConfig {
        AuthorizationConfig {
            url,
            timeout_secs: 2,
            retries: 2,
            backoff_ms: 5,
        }
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/authorize", addr)
    }

    #[tokio::test]
    async fn approves_on_positive_decision() {
        let url = serve(Router::new().route(
            "/authorize",
            get(|| async {
                Json(serde_json::json!({"status": "success", "data": {"authorization": true}}))
            }),
        ))
        .await;

        let authorizer = HttpAuthorizer::new(&test_config(url)).unwrap();
        assert!(authorizer.authorize().await.is_ok());
    }

    #[tokio::test]
    async fn negative_decision_is_terminal_and_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let url = serve(Router::new().route(
            "/authorize",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({"status": "fail", "data": {"authorization": false}}))
                }
            }),
        ))
        .await;

        let authorizer = HttpAuthorizer::new(&test_config(url)).unwrap();
        let result = authorizer.authorize().await;
        assert!(matches!(result, Err(TransferError::Unauthorized)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_unavailable() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let url = serve(Router::new().route(
            "/authorize",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
                }
            }),
        ))
        .await;

        let authorizer = HttpAuthorizer::new(&test_config(url)).unwrap();
        let result = authorizer.authorize().await;
        assert!(matches!(
            result,
            Err(TransferError::AuthorizationUnavailable(_))
        ));
        // Initial attempt + 2 retries
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_failure_then_success() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let url = serve(Router::new().route(
            "/authorize",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(StatusCode::SERVICE_UNAVAILABLE)
                    } else {
                        Ok(Json(serde_json::json!({"data": {"authorization": true}})))
                    }
                }
            }),
        ))
        .await;

        let authorizer = HttpAuthorizer::new(&test_config(url)).unwrap();
        assert!(authorizer.authorize().await.is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn malformed_payload_is_unavailable() {
        let url = serve(Router::new().route(
            "/authorize",
            get(|| async { Json(serde_json::json!({"unexpected": true})) }),
        ))
        .await;

        let authorizer = HttpAuthorizer::new(&test_config(url)).unwrap();
        let result = authorizer.authorize().await;
        assert!(matches!(
            result,
            Err(TransferError::AuthorizationUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn mock_counts_calls() {
        let mock = MockAuthorizer::new(MockOutcome::Deny);
        assert!(matches!(
            mock.authorize().await,
            Err(TransferError::Unauthorized)
        ));
        assert_eq!(mock.calls(), 1);
    }
}
