// Plans are the synthesizer's output before binding: an ordered list of generic calls with their
// operands and per-call context, tagged with the strategy that produced them. Binding each
// planned call through the alias chain turns a plan into a PrimitiveSequence.

//! Unbound primitive plans.

use crate::core::{EmitContext, Family, GenericOp, Operand, Request};
use std::fmt;

/// How a request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One native primitive.
    Native,
    EstimateRefine,
    SoftwareFallback,
    EstimateOnly,
    /// Fused multiply with a destination alias, expanded through a spilled source.
    AliasSpill,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Strategy::Native => "native",
            Strategy::EstimateRefine => "estimate-refine",
            Strategy::SoftwareFallback => "software-fallback",
            Strategy::EstimateOnly => "estimate-only",
            Strategy::AliasSpill => "alias-spill",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCall {
    pub op: GenericOp,
    pub dst: Operand,
    pub srcs: Vec<Operand>,
    pub ctx: EmitContext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub strategy: Strategy,
    pub calls: Vec<PlannedCall>,
}

impl Plan {
    /// Forward the request unchanged.
    pub fn native(request: &Request) -> Self {
        Self {
            strategy: Strategy::Native,
            calls: vec![PlannedCall {
                op: request.op,
                dst: request.dst,
                srcs: request.srcs.clone(),
                ctx: request.ctx,
            }],
        }
    }
}

/// Accumulates calls that share a variant and the request's context.
pub(crate) struct PlanBuilder {
    request_ctx: EmitContext,
    template: GenericOp,
    calls: Vec<PlannedCall>,
}

impl PlanBuilder {
    pub(crate) fn new(request: &Request) -> Self {
        Self {
            request_ctx: request.ctx,
            template: request.op,
            calls: Vec::with_capacity(4),
        }
    }

    /// A computational step: carries the request's mask and rounding.
    pub(crate) fn compute(
        &mut self,
        family: Family,
        dst: Operand,
        srcs: &[Operand],
    ) -> &mut Self {
        self.push(family, dst, srcs, self.request_ctx)
    }

    /// A data movement step into or out of scratch; always unmasked.
    pub(crate) fn transfer(
        &mut self,
        family: Family,
        dst: Operand,
        srcs: &[Operand],
    ) -> &mut Self {
        self.push(family, dst, srcs, EmitContext::default())
    }

    fn push(
        &mut self,
        family: Family,
        dst: Operand,
        srcs: &[Operand],
        ctx: EmitContext,
    ) -> &mut Self {
        self.calls.push(PlannedCall {
            op: GenericOp::new(family, self.template.variant),
            dst,
            srcs: srcs.to_vec(),
            ctx,
        });
        self
    }

    pub(crate) fn finish(self, strategy: Strategy) -> Plan {
        Plan {
            strategy,
            calls: self.calls,
        }
    }
}
