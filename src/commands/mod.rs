pub mod errors;
pub mod query;
pub mod schema;

use std::sync::Arc;

use crate::config::Settings;
use crate::db::connectors::postgres::PostgresConnector;
use crate::db::connectors::CatalogConnector;
use crate::db::introspector::SchemaAnalyzer;
use crate::troubleshoot::{ErrorClassifier, InMemoryDocCache, PgDocsErrorCodes};

/// Shared state handed to every command.
pub struct AppState<C = PostgresConnector> {
    pub settings: Settings,
    pub analyzer: SchemaAnalyzer<C>,
    doc_cache: Arc<InMemoryDocCache>,
}

impl AppState<PostgresConnector> {
    pub fn new(settings: Settings) -> Self {
        Self::with_connector(settings, PostgresConnector)
    }
}

impl<C: CatalogConnector> AppState<C> {
    pub fn with_connector(settings: Settings, connector: C) -> Self {
        let analyzer = SchemaAnalyzer::new(connector, settings.connection.clone());
        Self {
            settings,
            analyzer,
            doc_cache: Arc::new(InMemoryDocCache::new()),
        }
    }

    /// Error classifier; online classifiers share this state's page cache.
    pub fn classifier(&self, offline: bool) -> ErrorClassifier {
        if offline {
            return ErrorClassifier::offline();
        }
        let lookup = PgDocsErrorCodes::from_settings(&self.settings.docs, self.doc_cache.clone());
        ErrorClassifier::new(Arc::new(lookup))
    }
}
