//! Data-gathering handlers.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chatflow_integration::{HttpRequestSpec, HttpSink};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::debug;

use crate::context::ExecutionContext;
use crate::error::HandlerError;
use crate::node::Node;
use crate::registry::{HandlerOutcome, NodeHandler};
use crate::template;

#[derive(Debug, Deserialize, Default)]
struct ExtractConfig {
    #[serde(default)]
    urls: Vec<String>,
    // Single-page form.
    #[serde(default)]
    url: Option<String>,
}

/// Fetches a set of pages and collects the email addresses found in them.
///
/// All fetches run concurrently; a page that fails is skipped, not fatal.
/// Results land deduplicated and sorted in `extracted_emails`.
pub struct WebEmailExtract {
    http: Arc<dyn HttpSink>,
}

impl WebEmailExtract {
    #[must_use]
    pub fn new(http: Arc<dyn HttpSink>) -> Self {
        Self { http }
    }
}

fn is_email_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-' | '@')
}

/// Pulls `local@domain.tld`-shaped tokens out of arbitrary page text.
fn extract_emails(text: &str, into: &mut BTreeSet<String>) {
    for token in text.split(|c: char| !is_email_char(c)) {
        let token = token.trim_matches(|c: char| matches!(c, '.' | '-' | '_'));
        let Some(at) = token.find('@') else { continue };
        let (local, domain) = (&token[..at], &token[at + 1..]);
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            continue;
        }
        let Some(dot) = domain.rfind('.') else { continue };
        if dot == 0 || dot == domain.len() - 1 {
            continue;
        }
        into.insert(token.to_lowercase());
    }
}

fn body_text(body: &JsonValue) -> String {
    match body {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl NodeHandler for WebEmailExtract {
    async fn handle(
        &self,
        node: &Node,
        ctx: &mut ExecutionContext,
    ) -> Result<HandlerOutcome, HandlerError> {
        let config: ExtractConfig = serde_json::from_value(node.config_value()).unwrap_or_default();
        let mut urls: Vec<String> = config
            .urls
            .iter()
            .chain(config.url.iter())
            .map(|u| template::resolve(u, ctx))
            .filter(|u| !u.is_empty())
            .collect();
        urls.dedup();
        if urls.is_empty() {
            return Err(HandlerError::missing_field("urls"));
        }

        let fetches = urls
            .iter()
            .map(|url| self.http.execute(HttpRequestSpec::get(url.clone())));
        let results = join_all(fetches).await;

        let mut emails = BTreeSet::new();
        let mut fetched = 0usize;
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(page) if page.is_success() => {
                    fetched += 1;
                    extract_emails(&body_text(&page.body), &mut emails);
                }
                Ok(page) => debug!(url, status = page.status, "page refused"),
                Err(err) => debug!(url, error = %err, "page fetch failed"),
            }
        }

        let emails: Vec<String> = emails.into_iter().collect();
        let found = emails.len();
        ctx.variables.set("extracted_emails", json!(emails));
        if fetched == 0 {
            return Ok(HandlerOutcome::warning(format!(
                "Aucune page accessible sur {} URL(s)",
                urls.len()
            )));
        }
        Ok(HandlerOutcome::success(format!(
            "{found} email(s) extraits de {fetched}/{} page(s)",
            urls.len()
        )))
    }
}
