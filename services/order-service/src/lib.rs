//! Order submission service
//!
//! Orchestrates the submit path: validation, per-(user, market) admission
//! locking, the per-(market, outcome) matching lock, the serializable
//! persistence transaction with audit appends, post-commit book
//! mutation, and receipt signing.
//!
//! # Modules
//! - `validator`: pure request validation
//! - `admission`: short-TTL per-(user, market) locks
//! - `positions`: position deltas derived from a trade batch
//! - `store`: the submit storage capability and its Postgres / in-memory impls
//! - `submit`: the orchestrator

pub mod admission;
pub mod errors;
pub mod positions;
pub mod store;
pub mod submit;
pub mod validator;

pub use admission::{AdmissionGuard, AdmissionLocks};
pub use errors::SubmitError;
pub use store::{MemoryStore, PgSubmitStore, SubmitBatch, SubmitStore};
pub use submit::{OrderSubmitService, SignedReceipt, SubmitRequest};
pub use validator::AddressFormat;
