//! Collaborator seams used by the Provocateur supervisor.
//!
//! The supervisor depends on two external capabilities: a text generator it
//! prompts to decompose goals, and an agent dispatcher it uses to send
//! intent-specific requests to worker agents. Both are async traits so the
//! orchestrator can be driven by real providers or by in-process mocks.

/// In-process A2A dispatch and agent handlers.
pub mod dispatch;
/// Built-in echo agent.
pub mod echo;
/// Text generation seam.
pub mod llm;

pub use dispatch::{AgentDispatcher, AgentHandler, LocalDispatcher};
pub use echo::EchoAgent;
pub use llm::TextGenerator;
