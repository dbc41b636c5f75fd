//! Storage abstractions the verification engine depends on.

pub mod session;

pub use session::{
    ExpiryPolicy, InMemorySessionStore, SessionFilter, SessionPatch, SessionStore,
};
