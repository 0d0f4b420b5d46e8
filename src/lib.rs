//! RAGSearch Engine — semantic search service for RAG applications.
//!
//! Library surface for the server binary and integration tests: the axum
//! API ([`api`]) and the server wiring ([`server`] — configuration, shared
//! state, router assembly).

#![forbid(unsafe_code)]

pub mod api;
pub mod server;
