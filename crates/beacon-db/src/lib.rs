//! Local storage layer for the Beacon telemetry pipeline.
//!
//! Provides SQLite connection pooling (via `r2d2`), durable WAL-mode
//! initialization, and schema setup for the on-device event queue.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode and `synchronous=FULL`**: the queue's contract
//!   is that an append that has returned survives an immediate process kill,
//!   so every commit is fsynced.
//! - **`r2d2` connection pool**: appends run on blocking worker threads while
//!   the flush task reads and acknowledges; the pool hands each a connection
//!   without manual lifetime management.
//! - **Embedded schema**: the DDL is compiled into the binary via
//!   `include_str!`, so the schema ships with the pipeline and cannot drift
//!   from the code that depends on it.

mod pool;
mod schema;

pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use schema::{ensure_schema, SchemaError};
