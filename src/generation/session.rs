use futures::StreamExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::time::timeout;

use super::CompletionHook;
use crate::api_clients::{ByteStream, GenerationTransport};
use crate::auth::CredentialProvider;
use crate::constants::DEFAULT_IDLE_READ_TIMEOUT_SECS;
use crate::error::{AppError, AppResult};
use crate::events::{SessionEvent, SessionEvents};
use crate::models::{GenerateRequest, HistoryCandidate, HistoryEntry, StreamEvent};
use crate::services::HistoryStore;
use crate::streaming::SseDecoder;
use crate::validation::validate_generate_request;

/// Lifecycle of a generation attempt. `Streamed` and `Errored` are terminal
/// for the attempt; a new `start` on the same session begins a fresh one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Idle,
    Generating,
    Streamed,
    Errored,
}

/// Observable state of a session. Mutated only by the session itself;
/// everything outside reads copies.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: GenerationStatus,
    pub generated_code: String,
    pub error_message: Option<String>,
    pub error_code: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            status: GenerationStatus::Idle,
            generated_code: String::new(),
            error_message: None,
            error_code: None,
        }
    }
}

/// Owns one generation attempt end-to-end: validates the request, submits
/// it through the transport, decodes the response stream, accumulates the
/// generated text, and on success hands the result to the history store and
/// fires the completion hook.
///
/// Only one attempt may be in flight per session; a second `start` while
/// `Generating` is rejected. In-flight requests are never aborted from here.
pub struct GenerationSession {
    transport: Arc<dyn GenerationTransport>,
    credentials: Arc<dyn CredentialProvider>,
    history: Arc<dyn HistoryStore>,
    completion_hook: Option<Arc<dyn CompletionHook>>,
    events: SessionEvents,
    idle_read_timeout: Duration,
    state: RwLock<SessionSnapshot>,
}

impl GenerationSession {
    pub fn new(
        transport: Arc<dyn GenerationTransport>,
        credentials: Arc<dyn CredentialProvider>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            transport,
            credentials,
            history,
            completion_hook: None,
            events: SessionEvents::default(),
            idle_read_timeout: Duration::from_secs(DEFAULT_IDLE_READ_TIMEOUT_SECS),
            state: RwLock::new(SessionSnapshot::default()),
        }
    }

    pub fn with_completion_hook(mut self, hook: Arc<dyn CompletionHook>) -> Self {
        self.completion_hook = Some(hook);
        self
    }

    pub fn with_idle_read_timeout(mut self, idle_read_timeout: Duration) -> Self {
        self.idle_read_timeout = idle_read_timeout;
        self
    }

    /// Run one generation attempt to completion.
    ///
    /// Returns `Err` only for pre-flight failures (invalid request, missing
    /// credential, attempt already in flight); those leave the session state
    /// untouched. Transport and upstream failures resolve `Ok` with an
    /// `Errored` snapshot, and a retry is just another `start`.
    pub async fn start(&self, request: GenerateRequest) -> AppResult<SessionSnapshot> {
        validate_generate_request(&request)?;

        let Some(access_token) = self.credentials.access_token().await else {
            return Err(AppError::ValidationError(
                "No active credential; sign in before generating".to_string(),
            ));
        };

        {
            let mut state = self.state.write().await;
            if state.status == GenerationStatus::Generating {
                return Err(AppError::ConcurrentGeneration(
                    "another attempt is already in flight for this session".to_string(),
                ));
            }
            *state = SessionSnapshot {
                status: GenerationStatus::Generating,
                ..SessionSnapshot::default()
            };
        }
        self.events.publish(SessionEvent::Started);
        debug!(
            "Starting generation: language={}, model={}, {} bytes of input",
            request.language,
            request.model,
            request.input_code.len()
        );

        match self
            .transport
            .submit_generation(&request, &access_token)
            .await
        {
            Ok(stream) => self.consume_stream(&request, stream).await,
            Err(e) => self.fail(e.to_string(), machine_code(&e)).await,
        }

        Ok(self.snapshot().await)
    }

    /// Current state, as a copy
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.read().await.clone()
    }

    /// Lifecycle notifications, including a delta per appended fragment
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Return to `Idle` with cleared result and error, from any state
    pub async fn reset(&self) {
        {
            let mut state = self.state.write().await;
            *state = SessionSnapshot::default();
        }
        self.events.publish(SessionEvent::Reset);
    }

    /// Record an externally requested cancellation. The in-flight request is
    /// not aborted; the attempt is marked failed so the caller sees a
    /// consistent terminal state.
    pub async fn cancel(&self) {
        let cancelled = {
            let mut state = self.state.write().await;
            if state.status == GenerationStatus::Generating {
                state.status = GenerationStatus::Errored;
                state.error_message = Some("Generation cancelled".to_string());
                true
            } else {
                false
            }
        };
        if cancelled {
            self.events.publish(SessionEvent::Failed {
                message: "Generation cancelled".to_string(),
                code: None,
            });
        }
    }

    /// Load a past result back into the session for review, bypassing the
    /// transport and leaving history untouched
    pub async fn restore(&self, entry: &HistoryEntry) {
        {
            let mut state = self.state.write().await;
            *state = SessionSnapshot {
                status: GenerationStatus::Streamed,
                generated_code: entry.result_code.clone(),
                error_message: None,
                error_code: None,
            };
        }
        self.events.publish(SessionEvent::Completed);
    }

    async fn consume_stream(&self, request: &GenerateRequest, mut stream: ByteStream) {
        let mut decoder = SseDecoder::new();

        loop {
            let fragment = match timeout(self.idle_read_timeout, stream.next()).await {
                Err(_) => {
                    self.fail(
                        format!(
                            "No data received for {}s; the attempt was abandoned",
                            self.idle_read_timeout.as_secs()
                        ),
                        None,
                    )
                    .await;
                    return;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    self.fail(e.to_string(), machine_code(&e)).await;
                    return;
                }
                Ok(Some(Ok(fragment))) => fragment,
            };

            for event in decoder.feed(&fragment) {
                self.apply_event(request, event).await;
            }
            if decoder.is_finished() {
                // Dropping the stream closes the read side; nothing after a
                // terminal event is meaningful
                return;
            }
        }

        for event in decoder.close() {
            self.apply_event(request, event).await;
        }
        if !decoder.is_finished() {
            // The server may simply end the stream instead of sending an
            // explicit done frame; that still counts as a completed run
            self.complete(request).await;
        }
    }

    async fn apply_event(&self, request: &GenerateRequest, event: StreamEvent) {
        match event {
            StreamEvent::Chunk { content } | StreamEvent::RawText { content } => {
                {
                    let mut state = self.state.write().await;
                    state.generated_code.push_str(&content);
                }
                self.events.publish(SessionEvent::ResultDelta { content });
            }
            StreamEvent::Error { message, code } => self.fail(message, code).await,
            StreamEvent::Done => self.complete(request).await,
        }
    }

    async fn complete(&self, request: &GenerateRequest) {
        let generated_code = {
            let mut state = self.state.write().await;
            state.status = GenerationStatus::Streamed;
            state.generated_code.clone()
        };
        info!(
            "Generation finished with {} bytes of output",
            generated_code.len()
        );

        if !generated_code.is_empty() {
            let candidate = HistoryCandidate {
                input_code: request.input_code.clone(),
                result_code: generated_code,
                language: request.language,
            };
            if let Err(e) = self.history.add_entry(candidate).await {
                // History is best-effort; the result is already on screen
                warn!("Failed to record generation history: {}", e);
            }
        }

        if let Some(hook) = &self.completion_hook {
            hook.on_generation_complete().await;
        }
        self.events.publish(SessionEvent::Completed);
    }

    async fn fail(&self, message: String, code: Option<String>) {
        warn!("Generation failed: {}", message);
        {
            let mut state = self.state.write().await;
            state.status = GenerationStatus::Errored;
            state.error_message = Some(message.clone());
            state.error_code = code.clone();
        }
        self.events.publish(SessionEvent::Failed { message, code });
    }
}

fn machine_code(error: &AppError) -> Option<String> {
    match error {
        AppError::UpstreamError { code, .. } => code.clone(),
        _ => None,
    }
}
