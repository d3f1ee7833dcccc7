//! SQL parsing and read-only classification.

use crate::error::GuardError;
use sqlparser::ast::{Query, SetExpr, Statement, Visit, Visitor};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use std::ops::ControlFlow;

/// Parses SQL and decides whether a statement is a read-only query.
#[derive(Debug)]
pub struct SqlAnalyzer {
    dialect: PostgreSqlDialect,
}

impl Clone for SqlAnalyzer {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Default for SqlAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlAnalyzer {
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }

    /// Parse a SQL string into statements.
    pub fn parse(&self, sql: &str) -> Result<Vec<Statement>, GuardError> {
        Parser::parse_sql(&self.dialect, sql).map_err(|e| GuardError::Parse(e.to_string()))
    }

    /// Parse a SQL string that must hold exactly one statement.
    pub fn parse_single(&self, sql: &str) -> Result<Statement, GuardError> {
        let mut statements = self.parse(sql)?;
        match statements.len() {
            0 => Err(GuardError::Empty),
            1 => Ok(statements.remove(0)),
            count => Err(GuardError::MultipleStatements { count }),
        }
    }

    /// Get the type of SQL operation.
    pub fn get_operation(&self, stmt: &Statement) -> SqlOperation {
        match stmt {
            Statement::Query(_) => SqlOperation::Select,
            Statement::Insert { .. } => SqlOperation::Insert,
            Statement::Update { .. } => SqlOperation::Update,
            Statement::Delete(_) => SqlOperation::Delete,
            Statement::CreateTable { .. }
            | Statement::CreateIndex { .. }
            | Statement::CreateView { .. }
            | Statement::AlterTable { .. }
            | Statement::Drop { .. }
            | Statement::Truncate { .. } => SqlOperation::Ddl,
            _ => SqlOperation::Other,
        }
    }

    /// Borrow the query of a statement if, and only if, it is read-only.
    ///
    /// Every nested query is inspected: CTE bodies, derived tables and
    /// subqueries in expressions can all hide data-modifying statements or
    /// row locks in PostgreSQL.
    pub fn read_only_query<'a>(&self, stmt: &'a Statement) -> Result<&'a Query, GuardError> {
        let Statement::Query(query) = stmt else {
            return Err(GuardError::NotReadOnly {
                reason: format!("{:?} statement", self.get_operation(stmt)),
            });
        };
        match stmt.visit(&mut ReadOnlyCheck) {
            ControlFlow::Continue(()) => Ok(query),
            ControlFlow::Break(e) => Err(e),
        }
    }
}

/// Stops at the first nested statement or query that could write or lock.
struct ReadOnlyCheck;

impl Visitor for ReadOnlyCheck {
    type Break = GuardError;

    fn pre_visit_statement(&mut self, stmt: &Statement) -> ControlFlow<GuardError> {
        match stmt {
            Statement::Query(_) => ControlFlow::Continue(()),
            _ => ControlFlow::Break(not_read_only("nested data-modifying statement")),
        }
    }

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<GuardError> {
        if !query.locks.is_empty() {
            return ControlFlow::Break(not_read_only("row locking clause"));
        }
        match check_set_expr(&query.body) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => ControlFlow::Break(e),
        }
    }
}

/// Shallow check of one query body; nested queries get their own visit.
fn check_set_expr(body: &SetExpr) -> Result<(), GuardError> {
    match body {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                return Err(not_read_only("SELECT INTO"));
            }
            Ok(())
        }
        SetExpr::SetOperation { left, right, .. } => {
            check_set_expr(left)?;
            check_set_expr(right)
        }
        SetExpr::Query(_) | SetExpr::Values(_) | SetExpr::Table(_) => Ok(()),
        // INSERT / UPDATE / DELETE / MERGE used as a query body
        _ => Err(not_read_only("data-modifying query body")),
    }
}

fn not_read_only(reason: &str) -> GuardError {
    GuardError::NotReadOnly {
        reason: reason.to_string(),
    }
}

/// Types of SQL operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    Other,
}
