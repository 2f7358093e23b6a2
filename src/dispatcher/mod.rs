//! # Query Dispatcher
//!
//! A background worker that owns the search index. Callers talk to it only
//! through typed messages: they post a [`Request`] and later receive the
//! matching [`Response`]. The worker handles one message at a time, in
//! arrival order.
//!
//! ## Key Components
//!
//! - [`messages`] - Request and response variants
//! - [`worker`] - Dispatcher state machine, worker thread and caller handle

pub mod messages;
pub mod worker;

pub use messages::{Request, Response};
pub use worker::{DispatcherHandle, DispatcherState, QueryDispatcher, spawn_dispatcher};
