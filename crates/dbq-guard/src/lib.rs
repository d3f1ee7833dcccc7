//! # dbq-guard
//!
//! Validation and safety rewriting of untrusted SQL before it is sent to an
//! upstream database.
//!
//! The guard is a pure text-to-text transform:
//! - Parse the input with `sqlparser` under the PostgreSQL dialect
//! - Reject anything that is not a single read-only query
//! - Attach `LIMIT 1000` when the outermost query has no row cap
//! - Render the tree back to SQL
//!
//! **Before (from client):**
//! ```sql
//! select id, name from users where active
//! ```
//!
//! **After (to upstream):**
//! ```sql
//! SELECT id, name FROM users WHERE active LIMIT 1000
//! ```
//!
//! ## Classification
//!
//! | Input | Result |
//! |-------|--------|
//! | `SELECT`, `UNION`/`INTERSECT`/`EXCEPT`, `VALUES`, `TABLE t` | allowed |
//! | `WITH` whose CTEs are all read-only | allowed |
//! | `WITH d AS (DELETE ...) SELECT ...` | rejected |
//! | `SELECT ... INTO t`, `SELECT ... FOR UPDATE` | rejected |
//! | `INSERT`, `UPDATE`, `DELETE`, DDL, `EXPLAIN`, `SET`, ... | rejected |
//! | more than one statement | rejected |

pub mod error;
pub mod guard;
pub mod parser;

pub use error::GuardError;
pub use guard::{SqlGuard, guard};
pub use parser::{SqlAnalyzer, SqlOperation};
