use crate::db::sql_generator::{self, QueryInput};
use crate::db::templates::{self, JoinExample, QueryTemplate};

/// Generate SQL from form input. Input problems come back as `-- Error:` lines.
pub fn generate_query(query_type: &str, input: &QueryInput) -> String {
    sql_generator::generate_query(query_type, input)
}

pub fn get_query_templates() -> Vec<QueryTemplate> {
    templates::query_templates()
}

pub fn get_join_examples() -> Vec<JoinExample> {
    templates::join_examples()
}
