// This module defines the operand descriptors a caller hands to the resolver and that flow
// through to every emitted primitive call: vector registers, general-purpose base registers
// for memory operands with a displacement, the two caller-reserved scratch slots, and splat
// constants. EmitContext carries the rounding mode and the optional predicate mask explicitly,
// replacing ambient hardware state. Request bundles the generic operation, destination,
// sources, context and the caller's aliasing report, and validates its own shape before any
// resolution happens.

//! Operands, emit context and resolution requests.

use super::axis::RoundingMode;
use super::error::{ResolveError, ResolveResult};
use super::family::{Family, GenericOp};
use std::fmt;

/// Vector (or scalar FP) register name assigned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reg(pub u8);

/// General-purpose register used as a memory base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpReg(pub u8);

/// Predicate mask register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mask(pub u8);

/// One of the two caller-reserved spill regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScratchSlot {
    First,
    Second,
}

impl ScratchSlot {
    pub const ALL: [ScratchSlot; 2] = [ScratchSlot::First, ScratchSlot::Second];

    pub const fn index(self) -> usize {
        match self {
            ScratchSlot::First => 0,
            ScratchSlot::Second => 1,
        }
    }
}

impl fmt::Display for ScratchSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScratchSlot::First => f.write_str("scratch1"),
            ScratchSlot::Second => f.write_str("scratch2"),
        }
    }
}

/// Splat constants a `LoadConstant` can materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    /// 1.0 for float lanes, 1 for integer lanes.
    One,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Reg(Reg),
    Mem { base: GpReg, disp: i32 },
    Scratch(ScratchSlot),
    Const(Constant),
}

impl Operand {
    pub const fn reg(id: u8) -> Self {
        Operand::Reg(Reg(id))
    }

    pub const fn mem(base: u8, disp: i32) -> Self {
        Operand::Mem {
            base: GpReg(base),
            disp,
        }
    }

    pub const fn as_reg(&self) -> Option<Reg> {
        match self {
            Operand::Reg(reg) => Some(*reg),
            _ => None,
        }
    }

    /// Memory-like operands: addressed memory or a scratch slot.
    pub const fn is_memory(&self) -> bool {
        matches!(self, Operand::Mem { .. } | Operand::Scratch(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(Reg(id)) => write!(f, "v{id}"),
            Operand::Mem { base, disp } => write!(f, "[r{}{:+}]", base.0, disp),
            Operand::Scratch(slot) => write!(f, "[{slot}]"),
            Operand::Const(Constant::One) => f.write_str("#1"),
        }
    }
}

/// Explicit per-call state that would otherwise live in global control registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EmitContext {
    pub rounding: RoundingMode,
    pub mask: Option<Mask>,
}

impl EmitContext {
    pub fn with_rounding(mut self, rounding: RoundingMode) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }
}

/// Aliasing conflict reported by the caller's operand analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aliasing {
    #[default]
    None,
    /// The destination shares storage with the source at this index.
    Source(usize),
}

/// A caller's request for one generic operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub op: GenericOp,
    pub dst: Operand,
    pub srcs: Vec<Operand>,
    pub ctx: EmitContext,
    pub aliasing: Aliasing,
}

impl Request {
    pub fn new(op: GenericOp, dst: Operand, srcs: Vec<Operand>) -> Self {
        Self {
            op,
            dst,
            srcs,
            ctx: EmitContext::default(),
            aliasing: Aliasing::None,
        }
    }

    /// A request with the conventional operand shape for `op`: destination `v0`
    /// (memory for stores), sources `v1..`, memory for loads and `#1` for constants.
    pub fn canonical(op: GenericOp) -> Self {
        let dst = match op.family {
            Family::Store => Operand::mem(0, 0),
            _ => Operand::reg(0),
        };
        let srcs = (0..op.family.arity())
            .map(|i| match op.family {
                Family::Load => Operand::mem(1, 0),
                Family::LoadConstant => Operand::Const(Constant::One),
                _ => Operand::reg(i as u8 + 1),
            })
            .collect();
        Self::new(op, dst, srcs)
    }

    pub fn with_context(mut self, ctx: EmitContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Report that the destination aliases source `index`.
    pub fn aliasing_source(mut self, index: usize) -> Self {
        self.aliasing = Aliasing::Source(index);
        self
    }

    /// Check operand count, operand kinds and the aliasing report.
    pub fn validate(&self) -> ResolveResult<()> {
        let family = self.op.family;
        if self.srcs.len() != family.arity() {
            return Err(ResolveError::invalid_request(format!(
                "{} takes {} source operand(s), got {}",
                family,
                family.arity(),
                self.srcs.len()
            )));
        }

        match family {
            Family::Store => {
                if !self.dst.is_memory() {
                    return Err(ResolveError::invalid_request("store destination must be memory"));
                }
            }
            _ => {
                if self.dst.as_reg().is_none() {
                    return Err(ResolveError::invalid_request(format!(
                        "{} destination must be a register, got {}",
                        family, self.dst
                    )));
                }
            }
        }

        if let Aliasing::Source(index) = self.aliasing {
            if index >= self.srcs.len() {
                return Err(ResolveError::invalid_request(format!(
                    "aliasing report names source {index} of {}",
                    self.srcs.len()
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.dst)?;
        for src in &self.srcs {
            write!(f, ", {src}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::axis::Variant;

    #[test]
    fn test_request_arity_check() {
        let req = Request::new(
            GenericOp::float(Family::Add),
            Operand::reg(0),
            vec![Operand::reg(1)],
        );
        assert!(matches!(req.validate(), Err(ResolveError::InvalidRequest { .. })));
    }

    #[test]
    fn test_store_needs_memory_destination() {
        let req = Request::new(
            GenericOp::new(Family::Store, Variant::Signed),
            Operand::reg(0),
            vec![Operand::reg(1)],
        );
        assert!(req.validate().is_err());

        let req = Request::new(
            GenericOp::new(Family::Store, Variant::Signed),
            Operand::mem(3, 16),
            vec![Operand::reg(1)],
        );
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_aliasing_index_is_checked() {
        let req = Request::new(
            GenericOp::float(Family::FusedMulAdd),
            Operand::reg(0),
            vec![Operand::reg(0), Operand::reg(1), Operand::reg(2)],
        )
        .aliasing_source(3);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_operand_display() {
        assert_eq!(Operand::reg(3).to_string(), "v3");
        assert_eq!(Operand::mem(5, -8).to_string(), "[r5-8]");
        assert_eq!(Operand::Scratch(ScratchSlot::Second).to_string(), "[scratch2]");
        assert_eq!(Operand::Const(Constant::One).to_string(), "#1");
    }
}
