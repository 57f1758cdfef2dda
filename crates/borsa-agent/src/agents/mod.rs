//! Stage agents of the pipeline
//!
//! Each agent wraps the shared [`LLMProvider`] with one stage's model,
//! system prompt and output contract. They are thin on purpose: control
//! flow, timeouts and fallbacks live in the orchestrator.

mod actor;
mod planner;
mod router;
mod synthesizer;
mod validator;

pub use actor::Actor;
pub use planner::Planner;
pub use router::Router;
pub use synthesizer::Synthesizer;
pub use validator::Validator;

use borsa_core::{Result, UsageTracker};
use borsa_llm::{CompletionRequest, CompletionResponse, LLMProvider};

/// Run a completion and record its token usage.
pub(crate) async fn complete(
    provider: &dyn LLMProvider,
    request: CompletionRequest,
    usage: &UsageTracker,
) -> Result<CompletionResponse> {
    let response = provider
        .complete(request)
        .await
        .map_err(borsa_core::Error::from)?;
    usage.record(
        response.usage.input_tokens as u64,
        response.usage.output_tokens as u64,
    );
    Ok(response)
}
