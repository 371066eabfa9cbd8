//! # trellis-core
//!
//! Core types for the Trellis element model, shared across all Trellis
//! crates:
//! - Composite element identifiers and branch namespaces with boundary
//!   validation
//! - The Element record, its linked `source`/`target` edge pair, and the
//!   lifecycle patch surface
//! - Cross-cutting error types, defined next to the types they guard

pub mod element;
pub mod ids;
