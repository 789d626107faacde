//! Workspaces, threads, and the chat pipeline.
//!
//! A workspace owns its threads, model settings, and knowledge linkage.
//! Sending a message resolves every precondition fail-closed, appends the
//! user turn, assembles the knowledge context, and delegates to the
//! completion collaborator — one attempt, no retry, no cancellation.

pub mod chat;
pub mod store;

pub use chat::ChatService;
pub use store::WorkspaceStore;
