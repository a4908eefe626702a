//! Client core for the TestGen service: submit source code, stream the
//! generated tests back over an `event:`/`data:` framed response body, and
//! keep a capped, offline-first history of results.
//!
//! The crate is UI-agnostic. A frontend owns rendering and routing; this
//! crate owns the stream decoding ([`streaming::SseDecoder`]), the
//! generation state machine ([`generation::GenerationSession`]), credential
//! bookkeeping ([`auth`]), and the history cache ([`services`]), all wired
//! together by [`app_setup`].

pub mod api_clients;
pub mod app_setup;
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod generation;
pub mod models;
pub mod services;
pub mod streaming;
pub mod validation;

pub use crate::config::ClientConfig;
pub use crate::error::{AppError, AppResult};
pub use crate::events::SessionEvent;
pub use crate::generation::{GenerationSession, GenerationStatus, SessionSnapshot};
pub use crate::models::{GenerateRequest, StreamEvent, SupportedLanguage};
pub use crate::streaming::SseDecoder;
