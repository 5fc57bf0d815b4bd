use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// Known PostgreSQL error signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    ConnectionRefused,
    AuthenticationFailed,
    PermissionDenied,
    RelationNotFound,
    SyntaxError,
    DuplicateKey,
    ForeignKeyViolation,
    OutOfMemory,
    DiskFull,
    Unknown,
}

impl ErrorCategory {
    /// Match order. The first category with any matching pattern wins.
    pub const ORDERED: [ErrorCategory; 9] = [
        ErrorCategory::ConnectionRefused,
        ErrorCategory::AuthenticationFailed,
        ErrorCategory::PermissionDenied,
        ErrorCategory::RelationNotFound,
        ErrorCategory::SyntaxError,
        ErrorCategory::DuplicateKey,
        ErrorCategory::ForeignKeyViolation,
        ErrorCategory::OutOfMemory,
        ErrorCategory::DiskFull,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ErrorCategory::ConnectionRefused => "connection_refused",
            ErrorCategory::AuthenticationFailed => "authentication_failed",
            ErrorCategory::PermissionDenied => "permission_denied",
            ErrorCategory::RelationNotFound => "relation_not_found",
            ErrorCategory::SyntaxError => "syntax_error",
            ErrorCategory::DuplicateKey => "duplicate_key",
            ErrorCategory::ForeignKeyViolation => "foreign_key_violation",
            ErrorCategory::OutOfMemory => "out_of_memory",
            ErrorCategory::DiskFull => "disk_full",
            ErrorCategory::Unknown => "unknown",
        }
    }

    pub fn patterns(&self) -> &'static [&'static str] {
        match self {
            ErrorCategory::ConnectionRefused => &["connection refused", "could not connect to server"],
            ErrorCategory::AuthenticationFailed => &[
                "password authentication failed",
                "no password supplied",
                "role .* does not exist",
            ],
            ErrorCategory::PermissionDenied => &["permission denied", "insufficient privilege"],
            ErrorCategory::RelationNotFound => &["relation .* does not exist", "table .* does not exist"],
            ErrorCategory::SyntaxError => &["syntax error", "expected but found"],
            ErrorCategory::DuplicateKey => &[
                "duplicate key value violates unique constraint",
                "already exists",
            ],
            ErrorCategory::ForeignKeyViolation => {
                &["violates foreign key constraint", "is not present in table"]
            }
            ErrorCategory::OutOfMemory => &["out of memory", "insufficient memory"],
            ErrorCategory::DiskFull => &["no space left on device", "could not extend file"],
            ErrorCategory::Unknown => &[],
        }
    }

    /// Human label: underscores become spaces, each word capitalized.
    pub fn title(&self) -> String {
        self.key()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Static (explanation, solution) pair.
    pub fn details(&self) -> (&'static str, &'static str) {
        match self {
            ErrorCategory::ConnectionRefused => (
                "The PostgreSQL server is not accepting connections. This could be because the server is not running, \
                 network connectivity issues, or firewall rules blocking the connection.",
                "1. Verify that the PostgreSQL server is running\n\
                 2. Check network connectivity between your client and the server\n\
                 3. Ensure firewall rules allow connections to the PostgreSQL port (default: 5432)\n\
                 4. Confirm the correct host and port in your connection string",
            ),
            ErrorCategory::AuthenticationFailed => (
                "The provided credentials were rejected by the PostgreSQL server. This could be due to incorrect username/password, \
                 or the user may not have permission to connect to the database.",
                "1. Double-check your username and password\n\
                 2. Verify that the user exists in the PostgreSQL server\n\
                 3. Check pg_hba.conf configuration on the server\n\
                 4. Try connecting with a different authentication method if available",
            ),
            ErrorCategory::PermissionDenied => (
                "The authenticated user does not have sufficient privileges to perform the requested operation.",
                "1. Connect as a superuser or the object owner\n\
                 2. Grant the necessary permissions to the user:\n\
                 \x20  - For tables: GRANT SELECT, INSERT, UPDATE, DELETE ON table_name TO username;\n\
                 \x20  - For schemas: GRANT USAGE ON SCHEMA schema_name TO username;\n\
                 3. Check the user's role memberships and privileges",
            ),
            ErrorCategory::RelationNotFound => (
                "PostgreSQL cannot find the specified table, view, or other relation. This could be because it doesn't exist, \
                 or because it exists in a different schema that is not in your search_path.",
                "1. Check the spelling of the table/relation name\n\
                 2. Verify the schema name and search_path\n\
                 3. Use the fully qualified name: schema_name.table_name\n\
                 4. Check if the table exists with: \\dt schema_name.* (in psql)",
            ),
            ErrorCategory::SyntaxError => (
                "There is a syntax error in your SQL statement. PostgreSQL cannot parse the statement because it doesn't conform to SQL grammar rules.",
                "1. Check for missing or extra parentheses, commas, or quotes\n\
                 2. Verify keywords are spelled correctly\n\
                 3. Ensure identifiers are properly quoted if they contain special characters\n\
                 4. Compare your syntax with PostgreSQL documentation examples",
            ),
            ErrorCategory::DuplicateKey => (
                "The operation would create a duplicate value in a unique or primary key constraint. PostgreSQL enforces uniqueness and prevents the operation.",
                "1. Use a different key value that doesn't already exist\n\
                 2. Use ON CONFLICT clause with INSERT statements to handle duplicates\n\
                 3. If appropriate, consider using UPDATE instead of INSERT\n\
                 4. Check if the uniqueness constraint is still necessary for your application",
            ),
            ErrorCategory::ForeignKeyViolation => (
                "The operation would violate a foreign key constraint. This happens when you try to insert a reference to a non-existent parent row, \
                 or delete a parent row that is still referenced by child rows.",
                "1. For INSERTs: Ensure the referenced key exists in the parent table first\n\
                 2. For DELETEs: Either delete child rows first, or use CASCADE option\n\
                 3. Consider using ON DELETE SET NULL in your foreign key definition\n\
                 4. Verify the integrity of your data across related tables",
            ),
            ErrorCategory::OutOfMemory => (
                "The PostgreSQL server has run out of memory while processing your query. This can happen with complex queries, large data sets, \
                 or if the server's memory parameters are set too low.",
                "1. Optimize your query to use less memory (avoid large IN lists, use JOINs efficiently)\n\
                 2. Increase work_mem parameter in postgresql.conf\n\
                 3. Add more physical memory to your server\n\
                 4. Consider partitioning large tables to reduce memory requirements",
            ),
            ErrorCategory::DiskFull => (
                "The PostgreSQL server has run out of disk space. This prevents it from writing new data or temporary files needed for query execution.",
                "1. Free up disk space by removing unnecessary files\n\
                 2. Add additional storage to the server\n\
                 3. Move the PostgreSQL data directory to a larger volume\n\
                 4. Enable table autovacuum to reclaim space from deleted rows",
            ),
            ErrorCategory::Unknown => (
                "This is an unrecognized PostgreSQL error that doesn't match common error patterns.",
                "1. Check the PostgreSQL documentation for specific error codes\n\
                 2. Search PostgreSQL mailing lists or forums for similar errors\n\
                 3. Review server logs for additional context\n\
                 4. Try simplifying your operation to isolate the issue",
            ),
        }
    }

    /// First category whose patterns match `text`, or `Unknown`.
    pub fn detect(text: &str) -> ErrorCategory {
        MATCHERS
            .iter()
            .find(|(_, regexes)| regexes.iter().any(|re| re.is_match(text)))
            .map(|(category, _)| *category)
            .unwrap_or(ErrorCategory::Unknown)
    }
}

static MATCHERS: Lazy<Vec<(ErrorCategory, Vec<Regex>)>> = Lazy::new(|| {
    ErrorCategory::ORDERED
        .iter()
        .map(|category| {
            let regexes = category
                .patterns()
                .iter()
                .filter_map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| log::error!("Invalid error pattern {:?}: {}", pattern, e))
                        .ok()
                })
                .collect();
            (*category, regexes)
        })
        .collect()
});

/// A well-known error with a one-line remedy, for quick reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonError {
    pub title: &'static str,
    pub description: &'static str,
    pub solution: &'static str,
}

pub fn common_errors() -> Vec<CommonError> {
    let entry = |title, description, solution| CommonError {
        title,
        description,
        solution,
    };
    vec![
        entry(
            "Connection Refused",
            "Unable to connect to the PostgreSQL server.",
            "Check if the server is running, verify network connectivity, and ensure firewall rules allow connections.",
        ),
        entry(
            "Authentication Failed",
            "Server rejected the provided credentials.",
            "Verify username and password, ensure the user exists, and check pg_hba.conf configuration.",
        ),
        entry(
            "Permission Denied",
            "User lacks privileges for the requested operation.",
            "Grant necessary permissions to the user or connect as a superuser/object owner.",
        ),
        entry(
            "Relation Not Found",
            "The specified table or view does not exist.",
            "Check spelling, verify schema name, and use fully qualified names (schema.table).",
        ),
        entry(
            "Syntax Error",
            "SQL statement contains grammar errors.",
            "Check for missing/extra punctuation, verify keywords, and ensure proper quoting of identifiers.",
        ),
        entry(
            "Duplicate Key Violation",
            "Operation would create a duplicate in a unique constraint.",
            "Use different values, implement ON CONFLICT clauses, or update existing rows instead.",
        ),
        entry(
            "Foreign Key Violation",
            "Operation would break referential integrity.",
            "Ensure referenced keys exist in parent tables or delete child rows first.",
        ),
        entry(
            "Out of Memory",
            "Server ran out of memory processing a query.",
            "Optimize queries, increase work_mem parameter, or add more physical memory.",
        ),
        entry(
            "Disk Full",
            "Server has run out of disk space.",
            "Free up disk space, add storage, or move data directory to a larger volume.",
        ),
    ]
}
