//! Validation and LIMIT injection.

use crate::error::GuardError;
use crate::parser::SqlAnalyzer;
use dbq_core::{GuardedQuery, MAX_ROWS};
use sqlparser::ast::{Expr, LimitClause, Query, Statement, Value};

/// Turns untrusted SQL text into a bounded, read-only statement.
///
/// Stateless: a single instance can be shared freely across tasks.
#[derive(Debug, Clone, Default)]
pub struct SqlGuard {
    analyzer: SqlAnalyzer,
}

impl SqlGuard {
    pub fn new() -> Self {
        Self {
            analyzer: SqlAnalyzer::new(),
        }
    }

    /// Validate `sql` and cap it at `MAX_ROWS` rows if it has no limit.
    pub fn guard(&self, sql: &str) -> Result<GuardedQuery, GuardError> {
        let mut stmt = self.analyzer.parse_single(sql)?;

        if let Err(e) = self.analyzer.read_only_query(&stmt) {
            if let GuardError::NotReadOnly { reason } = &e {
                tracing::warn!(reason = %reason, "Rejected non read-only SQL");
            }
            return Err(e);
        }

        let limit_added = match &mut stmt {
            Statement::Query(query) if !has_row_cap(query) => {
                apply_row_cap(query, MAX_ROWS);
                true
            }
            _ => false,
        };

        let patched_sql = stmt.to_string();
        tracing::debug!(
            original = %sql,
            patched = %patched_sql,
            limit_added,
            "SQL guarded"
        );

        Ok(GuardedQuery {
            patched_sql,
            limit_added,
        })
    }
}

/// Guard `sql` with a default [`SqlGuard`].
pub fn guard(sql: &str) -> Result<GuardedQuery, GuardError> {
    SqlGuard::new().guard(sql)
}

/// Whether the outermost query already bounds its row count.
///
/// `LIMIT ALL` parses to no limit and `LIMIT NULL` is unbounded in
/// PostgreSQL, so neither counts.
fn has_row_cap(query: &Query) -> bool {
    if query.fetch.is_some() {
        return true;
    }
    match &query.limit_clause {
        Some(LimitClause::LimitOffset { limit, .. }) => {
            limit.as_ref().is_some_and(|l| !is_null_literal(l))
        }
        Some(LimitClause::OffsetCommaLimit { .. }) => true,
        None => false,
    }
}

fn is_null_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Value(v) if v.value == Value::Null)
}

/// Set `LIMIT cap` on the outermost query, keeping any `OFFSET`.
fn apply_row_cap(query: &mut Query, cap: u64) {
    let cap_expr = Expr::value(Value::Number(cap.to_string(), false));
    if let Some(LimitClause::LimitOffset { limit, .. }) = query.limit_clause.as_mut() {
        *limit = Some(cap_expr);
        return;
    }
    query.limit_clause = Some(LimitClause::LimitOffset {
        limit: Some(cap_expr),
        offset: None,
        limit_by: Vec::new(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_limit_injected() {
        let guarded = guard("SELECT * FROM t").unwrap();
        assert_eq!(guarded.patched_sql, "SELECT * FROM t LIMIT 1000");
        assert!(guarded.limit_added);
        assert_eq!(guarded.patched_sql.matches("LIMIT 1000").count(), 1);
    }

    #[test]
    fn test_existing_limit_preserved() {
        let guarded = guard("SELECT * FROM t LIMIT 10").unwrap();
        assert_eq!(guarded.patched_sql, "SELECT * FROM t LIMIT 10");
        assert!(!guarded.limit_added);
    }

    #[test]
    fn test_canonical_rendering() {
        let guarded = guard("select id, name\n  from users\n where active = true").unwrap();
        assert_eq!(
            guarded.patched_sql,
            "SELECT id, name FROM users WHERE active = true LIMIT 1000"
        );
    }

    #[test]
    fn test_guard_is_idempotent_on_limited_output() {
        let inputs = [
            "SELECT * FROM t",
            "SELECT * FROM t LIMIT 5",
            "SELECT a FROM t UNION SELECT a FROM u",
            "WITH x AS (SELECT 1 AS n) SELECT n FROM x",
            "SELECT * FROM t ORDER BY id OFFSET 20",
        ];
        for sql in inputs {
            let first = guard(sql).unwrap();
            let second = guard(&first.patched_sql).unwrap();
            assert!(!second.limit_added, "{sql}");
            assert_eq!(second.patched_sql, first.patched_sql);
        }
    }

    #[test]
    fn test_union_capped_at_outermost_level() {
        let guarded = guard("SELECT a FROM t UNION SELECT a FROM u").unwrap();
        assert!(guarded.limit_added);
        assert!(guarded.patched_sql.ends_with("LIMIT 1000"));
        assert_eq!(guarded.patched_sql.matches("LIMIT").count(), 1);
    }

    #[test]
    fn test_offset_without_limit_keeps_offset() {
        let guarded = guard("SELECT * FROM t OFFSET 5").unwrap();
        assert!(guarded.limit_added);
        assert!(guarded.patched_sql.contains("LIMIT 1000"));
        assert!(guarded.patched_sql.contains("OFFSET 5"));
    }

    #[test]
    fn test_guard_clones_share_behavior() {
        let original = SqlGuard::default();
        let cloned = original.clone();
        assert_eq!(
            original.guard("SELECT 1").unwrap(),
            cloned.guard("SELECT 1").unwrap()
        );
    }

    #[test]
    fn test_limit_null_is_unbounded() {
        let guarded = guard("SELECT * FROM t LIMIT NULL").unwrap();
        assert!(guarded.limit_added);
        assert_eq!(guarded.patched_sql, "SELECT * FROM t LIMIT 1000");
    }

    #[test]
    fn test_fetch_first_counts_as_limit() {
        let guarded = guard("SELECT * FROM t FETCH FIRST 5 ROWS ONLY").unwrap();
        assert!(!guarded.limit_added);
        assert!(!guarded.patched_sql.contains("LIMIT"));
    }

    #[test]
    fn test_subquery_limit_is_not_outermost() {
        let guarded = guard("SELECT * FROM (SELECT * FROM t LIMIT 3) AS s").unwrap();
        assert!(guarded.limit_added);
        assert!(guarded.patched_sql.ends_with("AS s LIMIT 1000"));
    }

    #[test]
    fn test_mutations_rejected() {
        let inputs = [
            "INSERT INTO t VALUES (1)",
            "DROP TABLE t",
            "UPDATE t SET x=1",
            "DELETE FROM t WHERE id = 1",
            "CREATE TABLE t (id INT)",
            "ALTER TABLE t ADD COLUMN y INT",
            "TRUNCATE t",
            "GRANT SELECT ON t TO bob",
            "EXPLAIN ANALYZE DELETE FROM t",
        ];
        for sql in inputs {
            let err = guard(sql).unwrap_err();
            assert_eq!(err.to_string(), "Only SELECT statements are allowed", "{sql}");
        }
    }

    #[test]
    fn test_evasion_attempts_rejected() {
        let inputs = [
            "/* harmless */ dElEtE FROM t",
            "-- select\nDROP TABLE t",
            "SELECT 1; DROP TABLE t",
            "SELECT * INTO stolen FROM t",
            "SELECT * FROM t FOR UPDATE",
            "WITH d AS (DELETE FROM t RETURNING *) SELECT * FROM d",
            "WITH i AS (INSERT INTO t VALUES (1) RETURNING id) SELECT id FROM i",
            "SELECT * FROM (WITH d AS (DELETE FROM t RETURNING *) SELECT * FROM d) s",
            "SELECT * FROM t WHERE id IN (SELECT id FROM u FOR UPDATE)",
        ];
        for sql in inputs {
            assert!(guard(sql).is_err(), "{sql}");
        }
    }

    #[test]
    fn test_case_and_comments_on_select_allowed() {
        let guarded = guard("/* report */ sElEcT 1 -- trailing").unwrap();
        assert_eq!(guarded.patched_sql, "SELECT 1 LIMIT 1000");
    }

    #[test]
    fn test_parse_error_carries_diagnostic() {
        let err = guard("SELEC * FROM").unwrap_err();
        assert!(matches!(err, GuardError::Parse(_)));
        assert!(err.to_string().starts_with("SQL parse error: "));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(guard("").unwrap_err(), GuardError::Empty);
        assert_eq!(guard(" ; ").unwrap_err(), GuardError::Empty);
    }

    #[test]
    fn test_trailing_semicolon_single_statement() {
        let guarded = guard("SELECT 1;").unwrap();
        assert_eq!(guarded.patched_sql, "SELECT 1 LIMIT 1000");
    }
}
