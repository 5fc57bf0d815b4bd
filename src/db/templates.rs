use serde::Serialize;

use super::sql_generator::QueryKind;

/// A query kind's raw template with a worked example
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryTemplate {
    pub kind: QueryKind,
    pub title: &'static str,
    pub template: &'static str,
    pub explanation: &'static str,
    pub example: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinExample {
    pub title: &'static str,
    pub example: &'static str,
    pub explanation: &'static str,
}

/// Reference entries for every query kind, in `QueryKind::ALL` order.
pub fn query_templates() -> Vec<QueryTemplate> {
    QueryKind::ALL
        .into_iter()
        .map(|kind| {
            let (title, explanation, example) = describe(kind);
            QueryTemplate {
                kind,
                title,
                template: kind.template(),
                explanation,
                example,
            }
        })
        .collect()
}

fn describe(kind: QueryKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        QueryKind::Select => (
            "SELECT - Retrieve Data",
            "SELECT queries retrieve data from one or more tables. You can filter rows with WHERE, \
             sort with ORDER BY, limit results with LIMIT, and join tables to combine related data.",
            "SELECT first_name, last_name, email\n\
             FROM customers\n\
             WHERE status = 'active'\n\
             ORDER BY last_name ASC\n\
             LIMIT 10;",
        ),
        QueryKind::Insert => (
            "INSERT - Add Data",
            "INSERT queries add new rows to a table. You specify the table name, columns, and values. \
             The RETURNING clause can return the newly created data.",
            "INSERT INTO customers (first_name, last_name, email)\n\
             VALUES ('John', 'Doe', 'john.doe@example.com')\n\
             RETURNING id;",
        ),
        QueryKind::Update => (
            "UPDATE - Modify Data",
            "UPDATE queries modify existing rows in a table. You specify the table name, column-value \
             pairs to update, and conditions to identify which rows to update.",
            "UPDATE customers\n\
             SET status = 'inactive', last_updated = NOW()\n\
             WHERE last_login < '2023-01-01'\n\
             RETURNING id;",
        ),
        QueryKind::Delete => (
            "DELETE - Remove Data",
            "DELETE queries remove rows from a table. You specify the table name and conditions to \
             identify which rows to delete. Always use a WHERE clause to avoid deleting all rows.",
            "DELETE FROM customers\n\
             WHERE status = 'cancelled' AND last_updated < NOW() - INTERVAL '1 year'\n\
             RETURNING id;",
        ),
        QueryKind::CreateTable => (
            "CREATE TABLE - Define Schema",
            "CREATE TABLE statements define the structure of a new table. You specify column names, \
             data types, constraints, and indexes.",
            "CREATE TABLE customers (\n\
             \x20   id SERIAL PRIMARY KEY,\n\
             \x20   first_name VARCHAR(50) NOT NULL,\n\
             \x20   last_name VARCHAR(50) NOT NULL,\n\
             \x20   email VARCHAR(100) UNIQUE NOT NULL,\n\
             \x20   status VARCHAR(20) DEFAULT 'active',\n\
             \x20   created_at TIMESTAMP DEFAULT NOW()\n\
             );",
        ),
    }
}

pub fn join_examples() -> Vec<JoinExample> {
    vec![
        JoinExample {
            title: "INNER JOIN",
            example: "SELECT o.order_id, c.customer_name\nFROM orders o\nINNER JOIN customers c ON o.customer_id = c.id",
            explanation: "Returns only the rows where there is a match in both tables.",
        },
        JoinExample {
            title: "LEFT JOIN",
            example: "SELECT c.customer_name, o.order_id\nFROM customers c\nLEFT JOIN orders o ON c.id = o.customer_id",
            explanation: "Returns all rows from the left table and matching rows from the right table. \
                          If no match, NULL values are returned for right table columns.",
        },
        JoinExample {
            title: "RIGHT JOIN",
            example: "SELECT c.customer_name, o.order_id\nFROM orders o\nRIGHT JOIN customers c ON o.customer_id = c.id",
            explanation: "Returns all rows from the right table and matching rows from the left table. \
                          If no match, NULL values are returned for left table columns.",
        },
        JoinExample {
            title: "FULL OUTER JOIN",
            example: "SELECT c.customer_name, o.order_id\nFROM customers c\nFULL OUTER JOIN orders o ON c.id = o.customer_id",
            explanation: "Returns all rows when there is a match in either the left or right table. \
                          If no match, NULL values are returned for columns from the table without a match.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sql_generator::{generate_query, QueryInput};

    #[test]
    fn test_every_kind_has_a_template() {
        let templates = query_templates();
        assert_eq!(templates.len(), QueryKind::ALL.len());
        for t in &templates {
            assert!(t.template.contains("{table_name}"));
            assert!(t.title.starts_with(&t.kind.as_str().replace('_', " ").to_uppercase()));
        }
    }

    #[test]
    fn test_create_table_example_shape() {
        let create = query_templates()
            .into_iter()
            .find(|t| t.kind == QueryKind::CreateTable)
            .unwrap();
        assert!(create.example.starts_with("CREATE TABLE customers (\n    id SERIAL PRIMARY KEY,\n"));
    }

    #[test]
    fn test_templates_match_generator_output_shape() {
        let select = query_templates().remove(0);
        let generated = generate_query("select", &QueryInput::for_table("users"));
        assert_eq!(select.template.lines().count(), generated.lines().count());
    }

    #[test]
    fn test_join_examples() {
        let titles: Vec<_> = join_examples().iter().map(|j| j.title).collect();
        assert_eq!(titles, ["INNER JOIN", "LEFT JOIN", "RIGHT JOIN", "FULL OUTER JOIN"]);
        assert!(join_examples().iter().all(|j| j.example.contains(j.title)));
    }
}
