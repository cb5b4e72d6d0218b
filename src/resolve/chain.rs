// This module implements the three-layer alias resolution chain. Layer 1 generalizes a generic
// operation over the element axis, mapping the requested width onto the storage width chosen by
// the normalizer (16-bit requests run on the 32-bit path, and only float lanes have a widening
// path). Layer 2 specializes the element-level operation over the tier axis, producing the
// complete enum key. Layer 3 binds the key against the primitive catalogue. Every layer is a
// total function over its enum inputs except the final lookup, so the only way a request can
// fail here is a missing catalogue entry, reported with the exact combination. Resolution
// happens once per request at build time and adds nothing to the emitted code.

//! Alias resolution chain.

use super::catalogue::{Primitive, PrimitiveCatalogue, PrimitiveKey};
use crate::core::{ElementWidth, Family, GenericOp, ResolveError, ResolveResult, Variant};
use crate::normalize::TierTuple;
use std::fmt;

/// Layer 1 output: an operation pinned to a storage element width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementOp {
    pub family: Family,
    pub variant: Variant,
    /// Width the lanes are stored and computed in.
    pub element: ElementWidth,
    /// Width the build asked for.
    pub requested: ElementWidth,
}

impl fmt::Display for ElementOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family, self.variant.type_tag(self.element))?;
        if self.requested != self.element {
            write!(f, " (widened from {})", self.requested)?;
        }
        Ok(())
    }
}

/// A key bound to its catalogue entry.
#[derive(Debug, Clone, Copy)]
pub struct Binding<'c> {
    pub key: PrimitiveKey,
    pub primitive: &'c Primitive,
}

/// Resolution chain for one tier tuple.
pub struct AliasChain<'c, C: PrimitiveCatalogue + ?Sized> {
    catalogue: &'c C,
    tuple: TierTuple,
}

impl<'c, C: PrimitiveCatalogue + ?Sized> AliasChain<'c, C> {
    pub fn new(catalogue: &'c C, tuple: TierTuple) -> Self {
        Self { catalogue, tuple }
    }

    pub fn tuple(&self) -> TierTuple {
        self.tuple
    }

    /// Layer 1: element axis.
    pub fn generalize_element(&self, op: GenericOp) -> ResolveResult<ElementOp> {
        if self.tuple.is_widened() && !op.variant.is_float() {
            return Err(ResolveError::unresolved(format!(
                "{}.{}@{} (only float lanes widen from {})",
                op.family,
                op.variant.type_tag(self.tuple.element),
                self.tuple.tier,
                self.tuple.element
            )));
        }

        Ok(ElementOp {
            family: op.family,
            variant: op.variant,
            element: self.tuple.storage,
            requested: self.tuple.element,
        })
    }

    /// Layer 2: tier axis.
    pub fn specialize_tier(&self, op: ElementOp) -> PrimitiveKey {
        PrimitiveKey::new(op.family, op.variant, op.element, self.tuple.tier)
    }

    /// Layer 3: catalogue binding.
    pub fn bind(&self, key: PrimitiveKey) -> ResolveResult<Binding<'c>> {
        match self.catalogue.lookup(&key) {
            Some(primitive) => {
                log::trace!("Bound {} -> {}", key, primitive.symbol);
                Ok(Binding { key, primitive })
            }
            None => Err(ResolveError::unresolved(key)),
        }
    }

    /// All three layers.
    pub fn resolve(&self, op: GenericOp) -> ResolveResult<Binding<'c>> {
        let element_op = self.generalize_element(op)?;
        let key = self.specialize_tier(element_op);
        self.bind(key)
    }

    /// Whether `op` binds to a native primitive on this tuple.
    pub fn is_native(&self, op: GenericOp) -> bool {
        self.resolve(op).is_ok()
    }
}
