//! Shared identity types for the Vega semantic analyzer.
//!
//! Variable and field identity is established by the resolver; the analysis
//! crates only ever see the opaque records defined here.

mod var;

pub use crate::var::{Slot, Variable};
