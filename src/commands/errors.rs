use super::AppState;
use crate::db::connectors::CatalogConnector;
use crate::troubleshoot::{common_errors, CommonError, ErrorAnalysis};

/// Classify an error message. `offline` skips the error-code documentation lookup.
pub async fn analyze_error<C: CatalogConnector>(
    error_text: &str,
    offline: bool,
    state: &AppState<C>,
) -> ErrorAnalysis {
    state.classifier(offline).classify(error_text).await
}

pub fn get_common_errors() -> Vec<CommonError> {
    common_errors()
}
