use anyhow::{Context, Result};
use std::path::Path;

use crate::models::ResumeDocument;

/// Read and parse the resume data file.
pub async fn load_resume(path: &Path) -> Result<ResumeDocument> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read resume data {}", path.display()))?;

    let doc: ResumeDocument =
        serde_json::from_str(&data).context("Failed to parse resume data JSON")?;

    if doc.resume_content.trim().is_empty() {
        anyhow::bail!("resume_content is empty in {}", path.display());
    }

    tracing::info!(
        "Loaded resume content ({} chars) from {}",
        doc.resume_content.chars().count(),
        path.display()
    );
    Ok(doc)
}
