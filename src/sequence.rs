// A PrimitiveSequence is the resolver's answer to one request: the ordered calls into concrete
// backend primitives, each carrying its bound symbol, operands and explicit emit context. All
// slices live in the session arena. The sequence can audit its own scratch usage: a scratch
// slot must be written before it is read, which together with the exclusive scratch lease
// guarantees that no value leaks between sequences through the caller's spill regions.

//! Resolved primitive sequences.

use crate::core::{
    EmitContext, Family, GenericOp, Operand, ResolveError, ResolveResult, RoundingMode, ScratchSlot,
};
use crate::normalize::TierTuple;
use crate::resolve::PrimitiveKey;
use crate::synth::Strategy;
use std::fmt;

/// One call into a concrete backend primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveCall<'arena> {
    pub symbol: &'arena str,
    pub key: PrimitiveKey,
    pub dst: Operand,
    pub srcs: &'arena [Operand],
    pub ctx: EmitContext,
    pub in_place: bool,
}

impl<'arena> PrimitiveCall<'arena> {
    pub fn family(&self) -> Family {
        self.key.family
    }
}

impl fmt::Display for PrimitiveCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.symbol, self.dst)?;
        for src in self.srcs {
            write!(f, ", {src}")?;
        }
        if let Some(mask) = self.ctx.mask {
            write!(f, " {{k{}}}", mask.0)?;
        }
        if self.ctx.rounding != RoundingMode::NearestEven && self.family().is_rounded_arithmetic() {
            write!(f, " {{{}}}", self.ctx.rounding.mnemonic())?;
        }
        Ok(())
    }
}

/// Ordered primitive calls resolved for one request.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveSequence<'arena> {
    pub op: GenericOp,
    pub tuple: TierTuple,
    pub strategy: Strategy,
    calls: &'arena [PrimitiveCall<'arena>],
}

impl<'arena> PrimitiveSequence<'arena> {
    pub fn new(
        op: GenericOp,
        tuple: TierTuple,
        strategy: Strategy,
        calls: &'arena [PrimitiveCall<'arena>],
    ) -> Self {
        Self {
            op,
            tuple,
            strategy,
            calls,
        }
    }

    pub fn calls(&self) -> &'arena [PrimitiveCall<'arena>] {
        self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn symbols(&self) -> Vec<&'arena str> {
        self.calls.iter().map(|call| call.symbol).collect()
    }

    pub fn families(&self) -> Vec<Family> {
        self.calls.iter().map(PrimitiveCall::family).collect()
    }

    /// Scratch slots touched, in first-use order.
    pub fn scratch_slots(&self) -> Vec<ScratchSlot> {
        let mut used = Vec::new();
        for call in self.calls {
            for operand in std::iter::once(&call.dst).chain(call.srcs) {
                if let Operand::Scratch(slot) = operand {
                    if !used.contains(slot) {
                        used.push(*slot);
                    }
                }
            }
        }
        used
    }

    /// Every scratch read must follow a write to the same slot within this sequence.
    pub fn check_scratch_discipline(&self) -> ResolveResult<()> {
        let mut written = [false; 2];
        for (idx, call) in self.calls.iter().enumerate() {
            for src in call.srcs {
                if let Operand::Scratch(slot) = src {
                    if !written[slot.index()] {
                        return Err(ResolveError::ScratchDiscipline {
                            reason: format!("call {idx} ({}) reads {slot} before any write", call.symbol),
                        });
                    }
                }
            }
            if let Operand::Scratch(slot) = call.dst {
                written[slot.index()] = true;
            }
        }
        Ok(())
    }
}

impl fmt::Display for PrimitiveSequence<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; {} on {} [{}]", self.op, self.tuple, self.strategy)?;
        for call in self.calls {
            writeln!(f, "  {call}")?;
        }
        Ok(())
    }
}
