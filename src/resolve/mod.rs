// This module groups the native resolution path: the primitive catalogue that describes what the
// target hardware provides, and the alias chain that maps a generic operation onto exactly one
// catalogue entry for the build's tier tuple.

//! Native primitive resolution.

pub mod catalogue;
pub mod chain;

pub use catalogue::{Primitive, PrimitiveCatalogue, PrimitiveKey, TableCatalogue};
pub use chain::{AliasChain, Binding, ElementOp};
