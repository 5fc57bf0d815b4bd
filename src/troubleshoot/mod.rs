pub mod categories;
pub mod lookup;

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub use categories::{common_errors, CommonError, ErrorCategory};
pub use lookup::{DocCache, DocFetcher, ErrorCodeLookup, InMemoryDocCache, NoLookup, PgDocsErrorCodes};

static ERROR_CODE_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"ERROR:\s+(\d+)").ok());
static SYNTAX_EXCERPT_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"ERROR:[^\n]*\n[^\n]*").ok());

/// Classification of one error message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorAnalysis {
    pub error_type: String,
    pub explanation: String,
    pub solution: String,
    pub error_code: Option<String>,
}

impl ErrorAnalysis {
    fn no_input() -> Self {
        Self {
            error_type: "Unknown".to_string(),
            explanation: "No error text provided for analysis.".to_string(),
            solution: "Please provide the complete error message for analysis.".to_string(),
            error_code: None,
        }
    }
}

/// Maps free-text PostgreSQL errors to a known category with remediation text.
#[derive(Clone)]
pub struct ErrorClassifier {
    lookup: Arc<dyn ErrorCodeLookup>,
}

impl ErrorClassifier {
    pub fn new(lookup: Arc<dyn ErrorCodeLookup>) -> Self {
        Self { lookup }
    }

    /// Classifier that never reaches out for error-code details.
    pub fn offline() -> Self {
        Self::new(Arc::new(NoLookup))
    }

    /// Never fails; unrecognized input falls back to the unknown category.
    pub async fn classify(&self, error_text: &str) -> ErrorAnalysis {
        if error_text.is_empty() {
            return ErrorAnalysis::no_input();
        }
        log::debug!(
            "Analyzing error: {}...",
            error_text.chars().take(50).collect::<String>()
        );

        let error_code = extract_error_code(error_text);
        let category = ErrorCategory::detect(error_text);
        let (explanation, solution) = category.details();
        let mut explanation = explanation.to_string();

        if let Some(code) = &error_code {
            match self.lookup.describe(code).await {
                Some(details) => {
                    explanation.push_str("\n\nError Code Details: ");
                    explanation.push_str(&details);
                }
                None => log::debug!("No details found for error code {}", code),
            }
        }

        if category == ErrorCategory::SyntaxError {
            if let Some(excerpt) = syntax_excerpt(error_text) {
                explanation.push_str("\n\nSpecific Error: ");
                explanation.push_str(excerpt);
            }
        }

        ErrorAnalysis {
            error_type: category.title(),
            explanation,
            solution: solution.to_string(),
            error_code,
        }
    }
}

/// Digits following the first `ERROR:` marker, if any.
pub fn extract_error_code(text: &str) -> Option<String> {
    ERROR_CODE_RE
        .as_ref()?
        .captures(text)
        .map(|caps| caps[1].to_string())
}

fn syntax_excerpt(text: &str) -> Option<&str> {
    SYNTAX_EXCERPT_RE.as_ref()?.find(text).map(|m| m.as_str())
}
