use async_trait::async_trait;
use provocateur_core::ProvocateurResult;

/// Black-box text generation capability (prompt in, text out).
///
/// Implementations wrap whatever provider the deployment uses. Errors should
/// be reported as [`ProvocateurError::Generation`](provocateur_core::ProvocateurError::Generation)
/// so callers can tell an unavailable generator apart from other failures.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt` under the given system prompt.
    async fn generate(&self, system_prompt: &str, prompt: &str) -> ProvocateurResult<String>;
}
