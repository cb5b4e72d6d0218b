// This module implements the emulation synthesizer for the four emulation-eligible families:
// reciprocal, reciprocal square root, fused multiply-add and fused multiply-subtract. Each
// family's compatibility level picks a strategy. EstimateRefine uses the hardware estimate plus
// one Newton-Raphson refinement step (or the native fused primitive); SoftwareFallback computes
// the result from exact divide/sqrt or a separate multiply and add; EstimateOnly binds the
// opaque refined-estimate primitive directly. When a level is left unset the synthesizer
// prefers the estimate path if the tier has one and falls back to software otherwise.
//
// Aliasing is only handled when the caller reports it. The estimate path stages the source in
// scratch slot 1 before overwriting the destination, and the reciprocal software fallback does
// the same. The reciprocal-sqrt fallback always stages its intermediate in slot 2. A fused
// multiply with a reported alias spills a multiplicand register that is neither the destination
// nor the addend to slot 1, computes the product through it and restores it last. When every
// multiplicand is the destination or the addend, the addend is staged in slot 1 instead and read
// back as a memory operand. Scratch slots are taken through an exclusive lease, so no slot can
// hold two values at once and every spilled value must be reloaded before the sequence ends.

//! Emulation synthesizer.

pub mod plan;

pub use plan::{Plan, PlannedCall, Strategy};

use crate::core::{
    Aliasing, CompatLevel, CompatLevels, Constant, EmulatedFamily, Family, GenericOp, Operand,
    Request, ResolveError, ResolveResult, ScratchLease, ScratchSlot, Variant,
};
use crate::resolve::{AliasChain, PrimitiveCatalogue};
use plan::PlanBuilder;

/// Plans primitive sequences for one tier tuple.
pub struct Synthesizer<'a, 'c, C: PrimitiveCatalogue + ?Sized> {
    chain: &'a AliasChain<'c, C>,
    levels: CompatLevels,
}

impl<'a, 'c, C: PrimitiveCatalogue + ?Sized> Synthesizer<'a, 'c, C> {
    pub fn new(chain: &'a AliasChain<'c, C>, levels: CompatLevels) -> Self {
        Self { chain, levels }
    }

    fn native(&self, family: Family, variant: Variant) -> bool {
        self.chain.is_native(GenericOp::new(family, variant))
    }

    /// The configured level, or the default for this tier when unset.
    pub fn effective_level(&self, family: EmulatedFamily, variant: Variant) -> CompatLevel {
        if let Some(level) = self.levels.get(family) {
            return level;
        }

        let estimate_path = match family {
            EmulatedFamily::Reciprocal => {
                self.native(Family::RecipEstimate, variant)
                    && self.native(Family::RecipRefine, variant)
            }
            EmulatedFamily::RecipSqrt => {
                self.native(Family::RsqrtEstimate, variant)
                    && self.native(Family::RsqrtRefine, variant)
            }
            EmulatedFamily::FusedMulAdd | EmulatedFamily::FusedMulSub => {
                self.native(family.family(), variant)
            }
        };

        if estimate_path {
            CompatLevel::EstimateRefine
        } else {
            CompatLevel::SoftwareFallback
        }
    }

    /// Plan the calls that satisfy `request`.
    pub fn plan(&self, request: &Request, lease: &mut ScratchLease<'_>) -> ResolveResult<Plan> {
        request.validate()?;
        let op = request.op;
        let emulated = match op.family.emulated() {
            Some(family) if op.variant.is_float() => family,
            _ => return Ok(Plan::native(request)),
        };

        let level = self.effective_level(emulated, op.variant);
        log::trace!("Synthesizing {} under {}", request, level);

        match emulated {
            EmulatedFamily::Reciprocal => self.plan_reciprocal(request, level, lease),
            EmulatedFamily::RecipSqrt => self.plan_recip_sqrt(request, level, lease),
            EmulatedFamily::FusedMulAdd | EmulatedFamily::FusedMulSub => {
                self.plan_fused(request, emulated, level, lease)
            }
        }
    }

    fn require(&self, request: &Request, level: CompatLevel, families: &[Family]) -> ResolveResult<()> {
        let variant = request.op.variant;
        match families.iter().find(|&&family| !self.native(family, variant)) {
            None => Ok(()),
            Some(missing) => {
                let tuple = self.chain.tuple();
                log::debug!(
                    "{} under {} needs {} which {} lacks",
                    request.op.family,
                    level,
                    missing,
                    tuple
                );
                Err(ResolveError::NoEmulationPath {
                    family: request.op.family.to_string(),
                    tier: tuple.tier.to_string(),
                    element: tuple.element.to_string(),
                    level: level.to_string(),
                })
            }
        }
    }

    fn plan_reciprocal(
        &self,
        request: &Request,
        level: CompatLevel,
        lease: &mut ScratchLease<'_>,
    ) -> ResolveResult<Plan> {
        let (dst, src) = (request.dst, request.srcs[0]);
        let aliased = request.aliasing == Aliasing::Source(0);
        let mut calls = PlanBuilder::new(request);

        match level {
            CompatLevel::EstimateRefine => {
                self.require(request, level, &[Family::RecipEstimate, Family::RecipRefine])?;
                if aliased {
                    self.require(request, level, &[Family::Store])?;
                    let staged = lease.stage(ScratchSlot::First)?;
                    calls.transfer(Family::Store, Operand::Scratch(staged.slot()), &[src]);
                    calls.compute(Family::RecipEstimate, dst, &[src]);
                    let saved = lease.consume(staged);
                    calls.compute(Family::RecipRefine, dst, &[dst, saved]);
                } else {
                    calls.compute(Family::RecipEstimate, dst, &[src]);
                    calls.compute(Family::RecipRefine, dst, &[dst, src]);
                }
                Ok(calls.finish(Strategy::EstimateRefine))
            }
            CompatLevel::SoftwareFallback => {
                self.require(request, level, &[Family::LoadConstant, Family::Div])?;
                let one = Operand::Const(Constant::One);
                if aliased {
                    self.require(request, level, &[Family::Store])?;
                    let staged = lease.stage(ScratchSlot::First)?;
                    calls.transfer(Family::Store, Operand::Scratch(staged.slot()), &[src]);
                    calls.compute(Family::LoadConstant, dst, &[one]);
                    let saved = lease.consume(staged);
                    calls.compute(Family::Div, dst, &[dst, saved]);
                } else {
                    calls.compute(Family::LoadConstant, dst, &[one]);
                    calls.compute(Family::Div, dst, &[dst, src]);
                }
                Ok(calls.finish(Strategy::SoftwareFallback))
            }
            CompatLevel::EstimateOnly => {
                self.require(request, level, &[Family::Reciprocal])?;
                calls.compute(Family::Reciprocal, dst, &[src]);
                Ok(calls.finish(Strategy::EstimateOnly))
            }
        }
    }

    fn plan_recip_sqrt(
        &self,
        request: &Request,
        level: CompatLevel,
        lease: &mut ScratchLease<'_>,
    ) -> ResolveResult<Plan> {
        let (dst, src) = (request.dst, request.srcs[0]);
        let aliased = request.aliasing == Aliasing::Source(0);
        let mut calls = PlanBuilder::new(request);

        match level {
            CompatLevel::EstimateRefine => {
                self.require(request, level, &[Family::RsqrtEstimate, Family::RsqrtRefine])?;
                if aliased {
                    self.require(request, level, &[Family::Store])?;
                    let staged = lease.stage(ScratchSlot::First)?;
                    calls.transfer(Family::Store, Operand::Scratch(staged.slot()), &[src]);
                    calls.compute(Family::RsqrtEstimate, dst, &[src]);
                    let saved = lease.consume(staged);
                    calls.compute(Family::RsqrtRefine, dst, &[dst, saved]);
                } else {
                    calls.compute(Family::RsqrtEstimate, dst, &[src]);
                    calls.compute(Family::RsqrtRefine, dst, &[dst, src]);
                }
                Ok(calls.finish(Strategy::EstimateRefine))
            }
            CompatLevel::SoftwareFallback => {
                self.require(
                    request,
                    level,
                    &[Family::Sqrt, Family::Store, Family::LoadConstant, Family::Div],
                )?;
                // sqrt is computed in place, so the source may alias freely
                calls.compute(Family::Sqrt, dst, &[src]);
                let staged = lease.stage(ScratchSlot::Second)?;
                calls.transfer(Family::Store, Operand::Scratch(staged.slot()), &[dst]);
                calls.compute(Family::LoadConstant, dst, &[Operand::Const(Constant::One)]);
                let root = lease.consume(staged);
                calls.compute(Family::Div, dst, &[dst, root]);
                Ok(calls.finish(Strategy::SoftwareFallback))
            }
            CompatLevel::EstimateOnly => {
                self.require(request, level, &[Family::RecipSqrt])?;
                calls.compute(Family::RecipSqrt, dst, &[src]);
                Ok(calls.finish(Strategy::EstimateOnly))
            }
        }
    }

    fn plan_fused(
        &self,
        request: &Request,
        family: EmulatedFamily,
        level: CompatLevel,
        lease: &mut ScratchLease<'_>,
    ) -> ResolveResult<Plan> {
        let combine = match family {
            EmulatedFamily::FusedMulSub => Family::Sub,
            _ => Family::Add,
        };

        if matches!(request.aliasing, Aliasing::Source(_)) {
            return self.plan_fused_alias(request, combine, level, lease);
        }

        let (dst, srcs) = (request.dst, &request.srcs);
        let mut calls = PlanBuilder::new(request);

        match level {
            CompatLevel::EstimateRefine | CompatLevel::EstimateOnly => {
                self.require(request, level, &[family.family()])?;
                calls.compute(family.family(), dst, srcs);
                Ok(calls.finish(Strategy::Native))
            }
            CompatLevel::SoftwareFallback => {
                self.require(request, level, &[Family::Mul, combine])?;
                calls.compute(Family::Mul, dst, &[srcs[0], srcs[1]]);
                calls.compute(combine, dst, &[dst, srcs[2]]);
                Ok(calls.finish(Strategy::SoftwareFallback))
            }
        }
    }

    /// `dst` aliases one of the sources. The product goes into a multiplicand register that
    /// is neither `dst` nor the addend; its original value is parked in scratch slot 1 and
    /// restored afterwards. Without such a register the addend is staged instead.
    fn plan_fused_alias(
        &self,
        request: &Request,
        combine: Family,
        level: CompatLevel,
        lease: &mut ScratchLease<'_>,
    ) -> ResolveResult<Plan> {
        let (dst, addend) = (request.dst, request.srcs[2]);
        let victim = (0..2).find_map(|idx| {
            let candidate = request.srcs[idx];
            match candidate.as_reg() {
                Some(reg) if candidate != dst && candidate != addend => Some((idx, reg)),
                _ => None,
            }
        });

        let Some((victim_idx, victim_reg)) = victim else {
            return self.plan_fused_staged_addend(request, combine, level, lease);
        };

        self.require(request, level, &[Family::Store, Family::Mul, combine, Family::Load])?;

        let victim = request.srcs[victim_idx];
        let other = request.srcs[1 - victim_idx];

        let mut calls = PlanBuilder::new(request);
        let spilled = lease.spill(ScratchSlot::First, victim_reg)?;
        calls.transfer(Family::Store, Operand::Scratch(spilled.slot()), &[victim]);
        calls.compute(Family::Mul, victim, &[victim, other]);
        calls.compute(combine, dst, &[victim, addend]);
        let (reg, slot) = lease.reload(spilled);
        calls.transfer(Family::Load, reg, &[slot]);

        Ok(calls.finish(Strategy::AliasSpill))
    }

    /// Every multiplicand is `dst` or the addend, as in `x = x * x + c` or `x = x * y + y`.
    /// The product is written straight into `dst`, so a register addend must survive in scratch.
    fn plan_fused_staged_addend(
        &self,
        request: &Request,
        combine: Family,
        level: CompatLevel,
        lease: &mut ScratchLease<'_>,
    ) -> ResolveResult<Plan> {
        let (dst, addend) = (request.dst, request.srcs[2]);
        let mut calls = PlanBuilder::new(request);

        // a memory addend cannot be clobbered by the product
        if addend.as_reg().is_none() {
            self.require(request, level, &[Family::Mul, combine])?;
            calls.compute(Family::Mul, dst, &[request.srcs[0], request.srcs[1]]);
            calls.compute(combine, dst, &[dst, addend]);
            return Ok(calls.finish(Strategy::SoftwareFallback));
        }

        self.require(request, level, &[Family::Store, Family::Mul, combine])?;

        let staged = lease.stage(ScratchSlot::First)?;
        calls.transfer(Family::Store, Operand::Scratch(staged.slot()), &[addend]);
        calls.compute(Family::Mul, dst, &[request.srcs[0], request.srcs[1]]);
        let saved = lease.consume(staged);
        calls.compute(combine, dst, &[dst, saved]);

        Ok(calls.finish(Strategy::AliasSpill))
    }
}
