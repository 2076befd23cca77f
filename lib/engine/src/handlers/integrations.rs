//! Integration-family handlers.
//!
//! Everything here leaves the process through the `HttpSink` or
//! `NotificationSink` boundary and is non-fatal: a failed call becomes a
//! warning entry and the walk continues.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chatflow_integration::{
    HttpMethod, HttpRequestSpec, HttpSink, Notification, NotificationSink,
};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};
use crate::template;

fn resolve_json(value: &JsonValue, ctx: &ExecutionContext) -> JsonValue {
    match value {
        JsonValue::String(s) => JsonValue::String(template::resolve(s, ctx)),
        JsonValue::Array(items) => {
            JsonValue::Array(items.iter().map(|v| resolve_json(v, ctx)).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_json(v, ctx)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[derive(Debug, Deserialize)]
struct HttpRequestConfig {
    url: String,
    #[serde(default)]
    method: HttpMethod,
    #[serde(default)]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<JsonValue>,
    #[serde(default = "default_response_variable")]
    response_variable: String,
}

fn default_response_variable() -> String {
    "http_response".to_string()
}

/// Arbitrary outbound HTTP call; the response lands in a variable.
pub struct HttpRequest {
    http: Arc<dyn HttpSink>,
}

impl HttpRequest {
    #[must_use]
    pub fn new(http: Arc<dyn HttpSink>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NodeHandler for HttpRequest {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: HttpRequestConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("url"))?;

        let request = HttpRequestSpec {
            method: config.method,
            url: template::resolve(&config.url, ctx),
            headers: config.headers,
            body: config.body.map(|b| resolve_json(&b, ctx)),
        };
        let url = request.url.clone();

        match self.http.execute(request).await {
            Ok(result) => {
                let ok = result.is_success();
                ctx.variables.set(
                    config.response_variable,
                    json!({"status": result.status, "body": result.body}),
                );
                if ok {
                    Ok(HandlerOutcome::success(format!(
                        "Requête {} {url}: HTTP {}",
                        config.method, result.status
                    )))
                } else {
                    Ok(HandlerOutcome::warning(format!(
                        "Requête {} {url}: HTTP {}",
                        config.method, result.status
                    )))
                }
            }
            Err(err) => {
                debug!(error = %err, "http request failed");
                Ok(HandlerOutcome::warning(format!("Requête échouée: {err}")))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WebhookConfig {
    url: String,
}

/// Pushes the run snapshot to an authored webhook URL.
pub struct NotifyWebhook {
    http: Arc<dyn HttpSink>,
}

impl NotifyWebhook {
    #[must_use]
    pub fn new(http: Arc<dyn HttpSink>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NodeHandler for NotifyWebhook {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: WebhookConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("url"))?;
        let payload = json!({
            "message": ctx.message,
            "contact": ctx.contact,
            "variables": ctx.variables,
        });
        let url = template::resolve(&config.url, ctx);
        match self.http.execute(HttpRequestSpec::post(url.clone(), payload)).await {
            Ok(result) if result.is_success() => {
                Ok(HandlerOutcome::success(format!("Webhook notifié: {url}")))
            }
            Ok(result) => Ok(HandlerOutcome::warning(format!(
                "Webhook refusé (HTTP {})",
                result.status
            ))),
            Err(err) => Ok(HandlerOutcome::warning(format!("Webhook échoué: {err}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChannelConfig {
    #[serde(default = "default_channel")]
    channel: String,
    text: String,
}

fn default_channel() -> String {
    "#general".to_string()
}

/// Posts to a team chat channel through the notification sink.
pub struct NotifyChannel {
    notifier: Arc<dyn NotificationSink>,
}

impl NotifyChannel {
    #[must_use]
    pub fn new(notifier: Arc<dyn NotificationSink>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl NodeHandler for NotifyChannel {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: ChannelConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("text"))?;
        let notification = Notification::Channel {
            channel: config.channel.clone(),
            text: template::resolve(&config.text, ctx),
        };
        match self.notifier.notify(notification).await {
            Ok(()) => Ok(HandlerOutcome::success(format!(
                "Notification envoyée sur {}",
                config.channel
            ))),
            Err(err) => Ok(HandlerOutcome::warning(format!("Notification échouée: {err}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmailConfig {
    to: String,
    #[serde(default = "default_email_subject")]
    subject: String,
    body: String,
}

fn default_email_subject() -> String {
    "Notification du flux".to_string()
}

/// Sends a team email through the notification sink.
pub struct NotifyEmail {
    notifier: Arc<dyn NotificationSink>,
}

impl NotifyEmail {
    #[must_use]
    pub fn new(notifier: Arc<dyn NotificationSink>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl NodeHandler for NotifyEmail {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: EmailConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("to"))?;
        let notification = Notification::Email {
            to: config.to.clone(),
            subject: template::resolve(&config.subject, ctx),
            body: template::resolve(&config.body, ctx),
        };
        match self.notifier.notify(notification).await {
            Ok(()) => Ok(HandlerOutcome::success(format!("Email envoyé à {}", config.to))),
            Err(err) => Ok(HandlerOutcome::warning(format!("Email échoué: {err}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InternalConfig {
    title: String,
    #[serde(default = "default_priority")]
    priority: String,
}

fn default_priority() -> String {
    "normale".to_string()
}

/// Raises an internal dashboard alert.
pub struct NotifyInternal {
    notifier: Arc<dyn NotificationSink>,
}

impl NotifyInternal {
    #[must_use]
    pub fn new(notifier: Arc<dyn NotificationSink>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl NodeHandler for NotifyInternal {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: InternalConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("title"))?;
        let notification = Notification::Internal {
            title: template::resolve(&config.title, ctx),
            priority: config.priority,
        };
        match self.notifier.notify(notification).await {
            Ok(()) => Ok(HandlerOutcome::success("Alerte interne créée")),
            Err(err) => Ok(HandlerOutcome::warning(format!("Alerte échouée: {err}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SheetsConfig {
    /// Apps Script web-app URL acting as the sheet bridge.
    url: String,
    #[serde(default)]
    sheet: Option<String>,
    #[serde(default)]
    values: Vec<JsonValue>,
}

/// Appends a row to a spreadsheet via its webhook bridge.
pub struct GoogleSheets {
    http: Arc<dyn HttpSink>,
}

impl GoogleSheets {
    #[must_use]
    pub fn new(http: Arc<dyn HttpSink>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NodeHandler for GoogleSheets {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: SheetsConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("url"))?;
        let values: Vec<JsonValue> = if config.values.is_empty() {
            vec![
                json!(chrono::Utc::now().to_rfc3339()),
                json!(ctx.contact.name),
                json!(ctx.message),
            ]
        } else {
            config.values.iter().map(|v| resolve_json(v, ctx)).collect()
        };
        let payload = json!({"sheet": config.sheet, "values": values});
        match self.http.execute(HttpRequestSpec::post(config.url, payload)).await {
            Ok(result) if result.is_success() => {
                Ok(HandlerOutcome::success("Ligne ajoutée à la feuille"))
            }
            Ok(result) => Ok(HandlerOutcome::warning(format!(
                "Feuille injoignable (HTTP {})",
                result.status
            ))),
            Err(err) => Ok(HandlerOutcome::warning(format!("Feuille échouée: {err}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    /// Query-bridge endpoint; the engine never opens database connections.
    endpoint: String,
    query: String,
    #[serde(default)]
    params: Vec<JsonValue>,
    #[serde(default = "default_rows_variable")]
    response_variable: String,
}

fn default_rows_variable() -> String {
    "query_result".to_string()
}

/// Runs a parameterized query through the data bridge.
pub struct DatabaseQuery {
    http: Arc<dyn HttpSink>,
}

impl DatabaseQuery {
    #[must_use]
    pub fn new(http: Arc<dyn HttpSink>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NodeHandler for DatabaseQuery {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: DatabaseConfig = serde_json::from_value(node.config_value())
            .map_err(|_| HandlerError::missing_field("query"))?;
        let params: Vec<JsonValue> = config.params.iter().map(|p| resolve_json(p, ctx)).collect();
        let payload = json!({"query": config.query, "params": params});
        match self.http.execute(HttpRequestSpec::post(config.endpoint, payload)).await {
            Ok(result) if result.is_success() => {
                ctx.variables.set(config.response_variable, result.body);
                Ok(HandlerOutcome::success("Requête exécutée"))
            }
            Ok(result) => Ok(HandlerOutcome::warning(format!(
                "Requête refusée (HTTP {})",
                result.status
            ))),
            Err(err) => Ok(HandlerOutcome::warning(format!("Requête échouée: {err}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogStatus;
    use crate::testing::{FakeHttpSink, FakeNotifier};

    #[tokio::test]
    async fn http_request_stores_response_in_named_variable() {
        let node = Node::new(
            1,
            "http_request",
            json!({
                "url": "https://api.example.ci/orders/{{order_id}}",
                "response_variable": "commande"
            }),
        );
        let sink = Arc::new(FakeHttpSink::responding(200, json!({"data": {"id": "ord_9"}})));
        let mut ctx = ExecutionContext::new("");
        ctx.variables.set("order_id", json!("ord_9"));
        let outcome = HttpRequest::new(sink.clone()).handle(&node, &mut ctx).await.unwrap();
        assert_eq!(outcome.status, LogStatus::Success);
        assert_eq!(
            sink.requests.lock().unwrap()[0].url,
            "https://api.example.ci/orders/ord_9"
        );
        assert_eq!(
            ctx.variables.get_text("commande.body.data.id").as_deref(),
            Some("ord_9")
        );
    }

    #[tokio::test]
    async fn http_failure_is_a_warning_not_an_error() {
        let node = Node::new(1, "http_request", json!({"url": "https://down.invalid"}));
        let mut ctx = ExecutionContext::new("");
        let outcome = HttpRequest::new(Arc::new(FakeHttpSink::failing()))
            .handle(&node, &mut ctx)
            .await
            .unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
    }

    #[tokio::test]
    async fn non_2xx_status_is_a_warning() {
        let node = Node::new(1, "http_request", json!({"url": "https://api.example.ci/x"}));
        let mut ctx = ExecutionContext::new("");
        let outcome = HttpRequest::new(Arc::new(FakeHttpSink::responding(503, JsonValue::Null)))
            .handle(&node, &mut ctx)
            .await
            .unwrap();
        assert_eq!(outcome.status, LogStatus::Warning);
        // Response still stored for downstream conditions.
        assert_eq!(ctx.variables.get_text("http_response.status").as_deref(), Some("503"));
    }

    #[tokio::test]
    async fn channel_notification_resolves_template() {
        let node = Node::new(
            1,
            "notify_slack",
            json!({"channel": "#support", "text": "Plainte de {{prenom}}"}),
        );
        let notifier = Arc::new(FakeNotifier::default());
        let mut ctx = ExecutionContext::new("");
        ctx.contact.first_name = "Awa".into();
        NotifyChannel::new(notifier.clone()).handle(&node, &mut ctx).await.unwrap();
        let sent = notifier.sent.lock().unwrap();
        match &sent[0] {
            Notification::Channel { channel, text } => {
                assert_eq!(channel, "#support");
                assert_eq!(text, "Plainte de Awa");
            }
            other => panic!("unexpected notification {other:?}"),
        }
    }

    #[tokio::test]
    async fn database_rows_land_in_variable() {
        let node = Node::new(
            1,
            "database_query",
            json!({
                "endpoint": "https://bridge.internal/query",
                "query": "select * from orders where contact = $1",
                "params": ["{{email}}"]
            }),
        );
        let sink = Arc::new(FakeHttpSink::responding(200, json!([{"id": 1}])));
        let mut ctx = ExecutionContext::new("");
        ctx.contact.email = "awa@example.ci".into();
        DatabaseQuery::new(sink.clone()).handle(&node, &mut ctx).await.unwrap();
        assert_eq!(ctx.variables.get("query_result"), Some(&json!([{"id": 1}])));
        let body = sink.requests.lock().unwrap()[0].body.clone().unwrap();
        assert_eq!(body["params"][0], json!("awa@example.ci"));
    }
}
