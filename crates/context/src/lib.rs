//! Context assembly — compiling selected knowledge into one prompt block.
//!
//! The assembler resolves an ordered list of entity IDs (a workspace's
//! `knowledge_in_context`) against the canonical folder and item
//! collections and renders one text block to concatenate onto the system
//! prompt.
//!
//! # Determinism
//!
//! Assembly is deterministic: identical inputs always produce byte-identical
//! output. IDs render in array order, folder contents in collection order,
//! and no random or time-dependent logic is used. Nothing is cached — the
//! block is recomputed on every invocation.
//!
//! # Resolution report
//!
//! Every input ID is accounted for: it lands either in `resolved` (with the
//! kind it resolved to) or in `unresolved`. Unresolved IDs are dropped from
//! the text and logged at `warn!` — never silently lost.

pub mod assembler;

pub use assembler::{
    AssembledKnowledge, AssemblyInput, ContextAssembler, ResolvedEntity, ResolvedKind,
};
