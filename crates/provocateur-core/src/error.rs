use thiserror::Error;

/// A convenience `Result` alias using [`ProvocateurError`].
pub type ProvocateurResult<T> = Result<T, ProvocateurError>;

/// Top-level error type for Agent Provocateur.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Error, Debug)]
pub enum ProvocateurError {
    /// An error raised by an agent while handling a request.
    #[error("Agent error: {0}")]
    Agent(String),

    /// A request could not be delivered to its target agent.
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// The text-generation collaborator failed or is unavailable.
    #[error("Generation error: {0}")]
    Generation(String),

    /// The agent capability registry is malformed.
    #[error("Registry error: {0}")]
    Registry(String),

    /// An invalid workflow lookup or state transition.
    #[error("Workflow error: {0}")]
    Workflow(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
