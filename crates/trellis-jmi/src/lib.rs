//! # trellis-jmi
//!
//! The branch-scoped hierarchy index and JMI (JSON Model Interchange)
//! converter for Trellis:
//! - Id lookup and parent→children adjacency over a possibly partial
//!   working set, with the orphan-promotion policy and on-demand cycle
//!   validation
//! - Conversion between the three JMI representation levels (flat,
//!   indexed, nested)
//! - The conversion request contract consumed from the HTTP layer
//! - The cross-reference resolver contract for `source`/`target` pointers
//!
//! Everything here is synchronous, stateless between calls, and free of
//! I/O; working sets are materialized by the persistence collaborator
//! before this crate runs.

pub mod convert;
pub mod error;
pub mod index;
pub mod request;
pub mod resolve;
