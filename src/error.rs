use std::path::PathBuf;

use crate::models::BackendKind;

/// Failures inside the orchestrator. None of these reach callers of
/// `QaSystem::initialize` or `QaSystem::answer`; they are logged and
/// converted to a boolean or a canned reply.
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("failed to load resume data from {}: {cause:#}", .path.display())]
    ResumeLoad { path: PathBuf, cause: anyhow::Error },

    #[error("no search backend could be initialized ({})", summarize(.0))]
    NoBackend(Vec<(BackendKind, String)>),

    #[error("retrieval failed on every backend: {0:#}")]
    Retrieval(anyhow::Error),

    #[error("answer generation failed: {0:#}")]
    Generation(anyhow::Error),
}

fn summarize(failures: &[(BackendKind, String)]) -> String {
    if failures.is_empty() {
        return "no backends registered".to_string();
    }
    failures
        .iter()
        .map(|(kind, err)| format!("{kind}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}
