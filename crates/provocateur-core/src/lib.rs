//! Core types and error definitions for Agent Provocateur.
//!
//! This crate provides the foundational types shared across all Provocateur
//! crates: the unified error enum and the agent-to-agent (A2A) message
//! envelopes exchanged between the supervisor and worker agents.
//!
//! # Main types
//!
//! - [`ProvocateurError`] — Unified error enum for all Provocateur subsystems.
//! - [`ProvocateurResult`] — Convenience alias for `Result<T, ProvocateurError>`.
//! - [`AgentRequest`] — A request routed from one agent to another.
//! - [`AgentResponse`] — The reply to an [`AgentRequest`].

/// Error types.
pub mod error;
/// A2A message envelopes.
pub mod message;

pub use error::{ProvocateurError, ProvocateurResult};
pub use message::{AgentRequest, AgentResponse, ResponseStatus};
