//! # dbq-server
//!
//! HTTP boundary for the query gateway.
//!
//! | Method | Path | |
//! |--------|------|---|
//! | GET | `/health` | liveness |
//! | POST | `/api/metadata/sync` | introspect and store a connection |
//! | GET | `/api/metadata` | list connections |
//! | GET | `/api/metadata/{id}` | connection with its tables |
//! | PUT | `/api/metadata/{id}` | rename |
//! | DELETE | `/api/metadata/{id}` | forget a connection |
//! | POST | `/api/query` | run guarded SQL |

pub mod api_types;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
