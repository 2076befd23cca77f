//! In-memory boundary fakes shared by the unit tests.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chatflow_ai::{CompletionBackend, CompletionError, CompletionRequest, CompletionResponse};
use chatflow_integration::{
    HttpRequestSpec, HttpResult, HttpSink, HttpSinkError, Notification, NotificationSink,
    NotifyError,
};
use serde_json::Value as JsonValue;

use crate::registry::Boundaries;

/// Completion fake: replays a fixed script, or fails every call.
pub struct FakeCompletion {
    script: Mutex<Vec<CompletionResponse>>,
    fail: bool,
    pub calls: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    pub fn scripted(responses: Vec<CompletionResponse>) -> Self {
        Self {
            script: Mutex::new(responses),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionBackend for FakeCompletion {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.calls.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(CompletionError::ProviderUnavailable {
                provider: "fake".to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            Ok(CompletionResponse::text("réponse générée", "fake-completion"))
        } else {
            Ok(script.remove(0))
        }
    }

    fn model(&self) -> &str {
        "fake-completion"
    }
}

/// HTTP fake: records requests and replays one canned result.
pub struct FakeHttpSink {
    pub requests: Mutex<Vec<HttpRequestSpec>>,
    result: Result<HttpResult, HttpSinkError>,
}

impl FakeHttpSink {
    pub fn responding(status: u16, body: JsonValue) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            result: Ok(HttpResult { status, body }),
        }
    }

    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            result: Err(HttpSinkError::SendFailed {
                url: "https://fake.invalid".into(),
                reason: "connexion refusée".into(),
            }),
        }
    }
}

#[async_trait]
impl HttpSink for FakeHttpSink {
    async fn execute(&self, request: HttpRequestSpec) -> Result<HttpResult, HttpSinkError> {
        self.requests.lock().unwrap().push(request);
        self.result.clone()
    }
}

/// Notification fake: records everything, always succeeds.
#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationSink for FakeNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Boundaries wired to defaults: echoing completion, 200 HTTP, recording
/// notifier.
pub fn fake_boundaries() -> Boundaries {
    Boundaries {
        completion: Arc::new(FakeCompletion::scripted(Vec::new())),
        http: Arc::new(FakeHttpSink::responding(200, JsonValue::Null)),
        notifier: Arc::new(FakeNotifier::default()),
    }
}

/// Boundaries where every outbound call fails.
pub fn failing_boundaries() -> Boundaries {
    Boundaries {
        completion: Arc::new(FakeCompletion::failing()),
        http: Arc::new(FakeHttpSink::failing()),
        notifier: Arc::new(FakeNotifier::default()),
    }
}
