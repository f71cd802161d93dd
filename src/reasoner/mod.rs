//! External reasoner access
//!
//! The reasoner is a remote multimodal model reached over a `generateContent`
//! style JSON API. Everything here is synchronous:
//! - Transport seam and the reqwest-backed HTTP transport
//! - Client with bounded retry and envelope extraction
//! - Best-effort JSON recovery from free text
//! - Prompt builders

pub mod client;
pub mod parse;
pub mod prompts;
pub mod transport;

pub use client::{ImagePayload, ReasonerClient};
pub use parse::{parse_best_effort, ParsedResponse};
pub use transport::{HttpTransport, Transport};
