//! Trade audit log
//!
//! Append-only streams recording every executed trade: one stream per
//! market (`audit:market:<id>`) and one global stream (`audit:global`).
//! Entry ids are `<unix_millis>-<sequence>` and strictly increase within
//! a stream; when the clock regresses the id allocator holds the
//! millisecond and bumps the sequence.
//!
//! [`sink::AuditSink`] is the capability the submit path holds. The
//! Redis Streams implementation is the production sink; the in-memory
//! implementation backs tests and local development.

pub mod memory;
pub mod redis;
pub mod sink;

pub use memory::MemoryAuditLog;
pub use redis::RedisAuditLog;
pub use sink::{AuditError, AuditSink, DEFAULT_QUERY_LIMIT, MAX_QUERY_LIMIT};
