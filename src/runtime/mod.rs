// Client for the external execution runtime that runs emitted strategies.
// Nothing in the catalog/composer/validation/codegen path depends on this
// module; it only forwards artifacts and reads back status.

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::future::Future;

pub const DEFAULT_RUNTIME_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("runtime request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("runtime rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("malformed runtime response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("runtime response has no `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeState {
    Running,
    Stopped,
    Error,
}

/// Bot status as reported by the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeStatus {
    #[serde(rename = "status")]
    pub state: RuntimeState,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub last_activity: Option<String>,
    #[serde(default)]
    pub total_trades: u64,
    #[serde(default)]
    pub profitable_trades: u64,
    #[serde(default)]
    pub total_profit: f64,
    #[serde(default)]
    pub current_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub message: String,
    #[serde(rename = "type", default = "default_level")]
    pub level: LogLevel,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

/// Result of a one-shot code execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub executed_at: Option<String>,
    #[serde(default)]
    pub symbols_processed: Vec<String>,
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub execution_time: f64,
    #[serde(default)]
    pub result: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ExecuteCodeRequest<'a> {
    code: &'a str,
    symbols: &'a [String],
    exchange: &'a str,
}

/// Shared `{success, message|error, ...}` envelope of every runtime endpoint
#[derive(Debug, Deserialize)]
struct RuntimeReply {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<RuntimeStatus>,
    #[serde(default)]
    logs: Option<Vec<LogEntry>>,
    #[serde(default)]
    data: Option<ExecutionReport>,
}

/// Control surface of an execution runtime
pub trait ExecutionRuntime: Send + Sync {
    fn start(&self) -> impl Future<Output = Result<RuntimeStatus, RuntimeError>> + Send;

    fn stop(&self) -> impl Future<Output = Result<RuntimeStatus, RuntimeError>> + Send;

    fn status(&self) -> impl Future<Output = Result<RuntimeStatus, RuntimeError>> + Send;

    /// Most recent entries first, at most `limit`
    fn logs(&self, limit: usize) -> impl Future<Output = Result<Vec<LogEntry>, RuntimeError>> + Send;

    fn clear_logs(&self) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Run an emitted artifact once against `symbols`
    fn submit_code(
        &self,
        code: &str,
        symbols: &[String],
        exchange: &str,
    ) -> impl Future<Output = Result<ExecutionReport, RuntimeError>> + Send;
}

/// HTTP client for the runtime's JSON API
///
/// No retries: every failure is returned to the caller as-is.
#[derive(Clone)]
pub struct HttpRuntimeClient {
    client: Client,
    base_url: String,
}

impl HttpRuntimeClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<RuntimeReply, RuntimeError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let reply: RuntimeReply = match serde_json::from_str(&body) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(RuntimeError::Rejected {
                    status: status.as_u16(),
                    message: if body.is_empty() {
                        status.to_string()
                    } else {
                        body
                    },
                })
            }
            Err(e) => return Err(e.into()),
        };

        if !status.is_success() || !reply.success {
            let message = reply
                .error
                .or(reply.message)
                .unwrap_or_else(|| status.to_string());
            tracing::warn!("Runtime rejected request: {}", message);
            return Err(RuntimeError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(reply)
    }

    async fn control(&self, path: &str) -> Result<RuntimeStatus, RuntimeError> {
        let reply = self.send(self.client.post(self.url(path))).await?;
        if let Some(message) = &reply.message {
            tracing::info!("Runtime: {}", message);
        }
        reply.status.ok_or(RuntimeError::MissingField("status"))
    }
}

impl Default for HttpRuntimeClient {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_URL)
    }
}

impl ExecutionRuntime for HttpRuntimeClient {
    async fn start(&self) -> Result<RuntimeStatus, RuntimeError> {
        self.control("/api/bot/start").await
    }

    async fn stop(&self) -> Result<RuntimeStatus, RuntimeError> {
        self.control("/api/bot/stop").await
    }

    async fn status(&self) -> Result<RuntimeStatus, RuntimeError> {
        let reply = self
            .send(self.client.get(self.url("/api/bot/status")))
            .await?;
        reply.status.ok_or(RuntimeError::MissingField("status"))
    }

    async fn logs(&self, limit: usize) -> Result<Vec<LogEntry>, RuntimeError> {
        let request = self
            .client
            .get(self.url("/api/bot/logs"))
            .query(&[("limit", limit)]);
        let reply = self.send(request).await?;
        let mut logs = reply.logs.ok_or(RuntimeError::MissingField("logs"))?;
        logs.truncate(limit);
        Ok(logs)
    }

    async fn clear_logs(&self) -> Result<(), RuntimeError> {
        self.send(self.client.post(self.url("/api/bot/clear-logs")))
            .await?;
        tracing::info!("Cleared runtime logs");
        Ok(())
    }

    async fn submit_code(
        &self,
        code: &str,
        symbols: &[String],
        exchange: &str,
    ) -> Result<ExecutionReport, RuntimeError> {
        let request = self
            .client
            .post(self.url("/api/trading/execute-code"))
            .json(&ExecuteCodeRequest {
                code,
                symbols,
                exchange,
            });
        let reply = self.send(request).await?;
        let report = reply.data.ok_or(RuntimeError::MissingField("data"))?;

        tracing::info!(
            "Runtime executed code for {} symbol(s) on {} in {:.2}s",
            report.symbols_processed.len(),
            report.exchange,
            report.execution_time
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const STATUS_BODY: &str = r#"{
        "success": true,
        "status": {
            "status": "running",
            "start_time": "2024-05-01 09:00:00",
            "last_activity": "2024-05-01 09:05:00",
            "total_trades": 4,
            "profitable_trades": 3,
            "total_profit": 1250.5,
            "current_balance": 1001250.5,
            "logs": []
        }
    }"#;

    #[tokio::test]
    async fn test_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/bot/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(STATUS_BODY)
            .create_async()
            .await;

        let client = HttpRuntimeClient::new(&server.url());
        let status = client.status().await.unwrap();

        assert_eq!(status.state, RuntimeState::Running);
        assert_eq!(status.total_trades, 4);
        assert_eq!(status.profitable_trades, 3);
        assert_eq!(status.current_balance, 1001250.5);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_start_rejected_when_already_running() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/bot/start")
            .with_status(200)
            .with_body(r#"{"success": false, "message": "already running", "status": {"status": "running"}}"#)
            .create_async()
            .await;

        let client = HttpRuntimeClient::new(&server.url());
        match client.start().await {
            Err(RuntimeError::Rejected { status, message }) => {
                assert_eq!(status, 200);
                assert_eq!(message, "already running");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stop_returns_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/bot/stop")
            .with_status(200)
            .with_body(r#"{"success": true, "message": "stopped", "status": {"status": "stopped"}}"#)
            .create_async()
            .await;

        let client = HttpRuntimeClient::new(&format!("{}/", server.url()));
        let status = client.stop().await.unwrap();
        assert_eq!(status.state, RuntimeState::Stopped);
        assert_eq!(status.total_trades, 0);
    }

    #[tokio::test]
    async fn test_logs_pass_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/bot/logs")
            .match_query(Matcher::UrlEncoded("limit".into(), "2".into()))
            .with_status(200)
            .with_body(
                r#"{"success": true, "logs": [
                    {"timestamp": "2024-05-01 09:05:00", "message": "bought", "type": "success"},
                    {"timestamp": "2024-05-01 09:00:00", "message": "started", "type": "info"},
                    {"timestamp": "2024-05-01 08:59:00", "message": "odd", "type": "debug"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = HttpRuntimeClient::new(&server.url());
        let logs = client.logs(2).await.unwrap();

        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].level, LogLevel::Success);
        assert_eq!(logs[1].message, "started");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_clear_logs() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/bot/clear-logs")
            .with_status(200)
            .with_body(r#"{"success": true, "message": "cleared"}"#)
            .create_async()
            .await;

        HttpRuntimeClient::new(&server.url())
            .clear_logs()
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_code() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/trading/execute-code")
            .match_body(Matcher::PartialJson(json!({
                "code": "print('hi')",
                "symbols": ["AAPL"],
                "exchange": "NASDAQ"
            })))
            .with_status(200)
            .with_body(
                r#"{"success": true, "data": {
                    "status": "success",
                    "message": "ok",
                    "executed_at": "2024-05-01T09:00:00",
                    "symbols_processed": ["AAPL"],
                    "exchange": "NASDAQ",
                    "execution_time": 0.42,
                    "result": {"orders": 0}
                }}"#,
            )
            .create_async()
            .await;

        let client = HttpRuntimeClient::new(&server.url());
        let report = client
            .submit_code("print('hi')", &["AAPL".to_string()], "NASDAQ")
            .await
            .unwrap();

        assert_eq!(report.symbols_processed, vec!["AAPL".to_string()]);
        assert_eq!(report.result, json!({"orders": 0}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_surfaces_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/trading/execute-code")
            .with_status(400)
            .with_body(r#"{"success": false, "error": "missing field: symbols"}"#)
            .create_async()
            .await;

        let client = HttpRuntimeClient::new(&server.url());
        let err = client.submit_code("x", &[], "NASDAQ").await.unwrap_err();
        match err {
            RuntimeError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "missing field: symbols");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/bot/status")
            .with_status(502)
            .with_body("Bad Gateway")
            .create_async()
            .await;

        let client = HttpRuntimeClient::new(&server.url());
        assert!(matches!(
            client.status().await,
            Err(RuntimeError::Rejected { status: 502, .. })
        ));
    }
}
