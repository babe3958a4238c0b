use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// The candidate's CV. Read-only for the whole run; the engine shares it behind an `Arc`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cv {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    /// Original extracted CV text.
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub resume_path: Option<PathBuf>,
}

/// Loads a CV from a JSON file.
///
/// When the file carries no `raw_text` and `resume_path` points at a PDF, the text
/// is pulled out of the PDF. Extraction failures are logged and leave `raw_text` unset.
pub fn load_cv(path: &Path) -> Result<Cv> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CV file '{}'", path.display()))?;
    let mut cv: Cv = serde_json::from_str(&content)
        .with_context(|| format!("CV file '{}' is not valid JSON", path.display()))?;

    if cv.raw_text.as_deref().map_or(true, str::is_empty) {
        if let Some(resume) = cv.resume_path.as_deref().filter(|p| is_pdf(p)) {
            match pdf_extract::extract_text(resume) {
                Ok(text) => {
                    info!(
                        "Extracted {} chars of CV text from {}",
                        text.len(),
                        resume.display()
                    );
                    cv.raw_text = Some(text);
                }
                Err(e) => warn!("Could not extract text from {}: {e}", resume.display()),
            }
        }
    }

    Ok(cv)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
