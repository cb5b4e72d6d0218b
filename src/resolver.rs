// This module provides the Resolver facade: the single entry point a code emitter talks to.
// Construction normalizes the build configuration once, so every request in a build shares the
// same tier tuple. Each resolve call validates the request, lets the synthesizer plan the
// calls under an exclusive scratch lease, binds every planned call through the alias chain,
// checks each call's operands against the bound primitive's calling convention and its context
// against what the tier can honour, and finally audits the sequence's scratch usage. The
// resulting sequence and its symbols are allocated in the session arena; the session also
// records per-strategy statistics.

//! Resolver facade.
//!
//! ```
//! use bumpalo::Bump;
//! use vtier::core::{BuildConfig, Family, GenericOp, Request, ResolveSession, ScratchSlots, WidthSelector};
//! use vtier::resolve::TableCatalogue;
//! use vtier::Resolver;
//!
//! let arena = Bump::new();
//! let session = ResolveSession::new(&arena);
//! let config = BuildConfig::new(WidthSelector::Bits128, 32);
//! let resolver = Resolver::new(&session, &config, TableCatalogue::builtin()).unwrap();
//!
//! let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);
//! let request = Request::canonical(GenericOp::float(Family::Div));
//! let sequence = resolver.resolve(&request, &mut scratch).unwrap();
//! assert_eq!(sequence.symbols(), vec!["x128_div_f32"]);
//! ```

use crate::core::{
    BuildConfig, CompatLevels, EmitContext, Family, GenericOp, Operand, Request, ResolveError,
    ResolveResult, ResolveSession, RoundingMode, ScratchSlots, Tier, Variant,
};
use crate::normalize::{normalize, TierTuple};
use crate::resolve::{AliasChain, Primitive, PrimitiveCatalogue, TableCatalogue};
use crate::sequence::{PrimitiveCall, PrimitiveSequence};
use crate::synth::{PlannedCall, Synthesizer};

/// Resolves generic requests for one build.
pub struct Resolver<'s, 'arena, C: PrimitiveCatalogue = TableCatalogue> {
    session: &'s ResolveSession<'arena>,
    catalogue: C,
    tuple: TierTuple,
    levels: CompatLevels,
}

impl<'s, 'arena, C: PrimitiveCatalogue> Resolver<'s, 'arena, C> {
    /// Normalize `config` and bind the resolver to `catalogue`.
    pub fn new(
        session: &'s ResolveSession<'arena>,
        config: &BuildConfig,
        catalogue: C,
    ) -> ResolveResult<Self> {
        let tuple = normalize(config)?;
        log::info!("Resolving for {}", tuple);
        Ok(Self {
            session,
            catalogue,
            tuple,
            levels: config.levels,
        })
    }

    pub fn tuple(&self) -> TierTuple {
        self.tuple
    }

    pub fn levels(&self) -> CompatLevels {
        self.levels
    }

    pub fn catalogue(&self) -> &C {
        &self.catalogue
    }

    pub fn session(&self) -> &'s ResolveSession<'arena> {
        self.session
    }

    pub fn chain(&self) -> AliasChain<'_, C> {
        AliasChain::new(&self.catalogue, self.tuple)
    }

    /// Resolve one request into its primitive sequence.
    pub fn resolve(
        &self,
        request: &Request,
        scratch: &mut ScratchSlots,
    ) -> ResolveResult<PrimitiveSequence<'arena>> {
        self.session.record_request();

        match self.resolve_request(request, scratch) {
            Ok((sequence, staged)) => {
                self.session
                    .record_sequence(&sequence.strategy.to_string(), sequence.len(), staged);
                log::debug!(
                    "{} -> {} [{}]",
                    request,
                    sequence.symbols().join("; "),
                    sequence.strategy
                );
                Ok(sequence)
            }
            Err(e) => {
                self.session.record_failure();
                log::debug!("{} failed: {}", request, e);
                Err(e)
            }
        }
    }

    fn resolve_request(
        &self,
        request: &Request,
        scratch: &mut ScratchSlots,
    ) -> ResolveResult<(PrimitiveSequence<'arena>, usize)> {
        request.validate()?;

        let chain = self.chain();
        let synth = Synthesizer::new(&chain, self.levels);

        let mut lease = scratch.lease();
        let plan = synth.plan(request, &mut lease)?;
        let staged = lease.finish()?;

        let calls = plan
            .calls
            .iter()
            .map(|planned| self.bind_call(&chain, planned))
            .collect::<ResolveResult<Vec<_>>>()?;

        let sequence = PrimitiveSequence::new(
            request.op,
            self.tuple,
            plan.strategy,
            self.session.alloc_slice(&calls),
        );
        sequence.check_scratch_discipline()?;
        Ok((sequence, staged))
    }

    fn bind_call(
        &self,
        chain: &AliasChain<'_, C>,
        planned: &PlannedCall,
    ) -> ResolveResult<PrimitiveCall<'arena>> {
        let binding = chain.resolve(planned.op)?;
        check_context(self.tuple.tier, planned.op.family, &planned.ctx)?;
        check_operands(binding.primitive, planned)?;

        log::trace!("  {} -> {}", planned.op, binding.primitive.symbol);
        Ok(PrimitiveCall {
            symbol: self.session.intern_str(&binding.primitive.symbol),
            key: binding.key,
            dst: planned.dst,
            srcs: self.session.alloc_slice(&planned.srcs),
            ctx: planned.ctx,
            in_place: binding.primitive.in_place,
        })
    }

    /// Every generic operation that resolves with its conventional operand shape.
    pub fn supported_ops(&self) -> Vec<GenericOp> {
        let mut scratch = ScratchSlots::for_tier(self.tuple.tier);
        let mut ops = Vec::new();
        for family in Family::all() {
            for variant in Variant::ALL {
                let op = GenericOp::new(family, variant);
                if self
                    .resolve_request(&Request::canonical(op), &mut scratch)
                    .is_ok()
                {
                    ops.push(op);
                }
            }
        }
        ops
    }
}

/// Mask and rounding overrides must be expressible on the tier.
fn check_context(tier: Tier, family: Family, ctx: &EmitContext) -> ResolveResult<()> {
    if let Some(mask) = ctx.mask {
        if !tier.has_predication() {
            return Err(ResolveError::UnsupportedContext {
                tier: tier.to_string(),
                what: format!("predicate mask k{}", mask.0),
            });
        }
    }

    if ctx.rounding != RoundingMode::NearestEven
        && family.is_rounded_arithmetic()
        && !tier.has_static_rounding()
    {
        return Err(ResolveError::UnsupportedContext {
            tier: tier.to_string(),
            what: format!("static rounding {} on {}", ctx.rounding, family),
        });
    }

    Ok(())
}

/// Operand kinds must match the primitive's calling convention.
fn check_operands(primitive: &Primitive, planned: &PlannedCall) -> ResolveResult<()> {
    let family = planned.op.family;
    let srcs = &planned.srcs;

    if srcs.len() != primitive.arity {
        return Err(ResolveError::invalid_request(format!(
            "{} takes {} source(s), {} were planned",
            primitive.symbol,
            primitive.arity,
            srcs.len()
        )));
    }

    let bad = |what: &str, operand: &Operand| {
        ResolveError::invalid_request(format!("{} cannot take {} as {}", primitive.symbol, operand, what))
    };

    match family {
        Family::Load => {
            if !srcs[0].is_memory() {
                return Err(bad("its address", &srcs[0]));
            }
        }
        Family::Store => {
            if !planned.dst.is_memory() {
                return Err(bad("its destination", &planned.dst));
            }
            if srcs[0].as_reg().is_none() {
                return Err(bad("its value", &srcs[0]));
            }
        }
        Family::LoadConstant => {
            if !matches!(srcs[0], Operand::Const(_)) {
                return Err(bad("its constant", &srcs[0]));
            }
        }
        _ => {
            if planned.dst.as_reg().is_none() {
                return Err(bad("its destination", &planned.dst));
            }
            let last = srcs.len().saturating_sub(1);
            for (idx, src) in srcs.iter().enumerate() {
                let ok = match src {
                    Operand::Reg(_) => true,
                    Operand::Mem { .. } | Operand::Scratch(_) => {
                        idx == last && primitive.memory_form
                    }
                    Operand::Const(_) => false,
                };
                if !ok {
                    return Err(bad(&format!("source {idx}"), src));
                }
            }
        }
    }

    if primitive.in_place && srcs.first() != Some(&planned.dst) {
        return Err(ResolveError::invalid_request(format!(
            "{} overwrites its first source; destination {} must equal it",
            primitive.symbol, planned.dst
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ElementWidth, Mask, WidthSelector};
    use crate::resolve::PrimitiveKey;
    use crate::synth::Strategy;
    use bumpalo::Bump;

    #[test]
    fn test_native_resolution_records_stats() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let config = BuildConfig::new(WidthSelector::Bits256, 32);
        let resolver = Resolver::new(&session, &config, TableCatalogue::builtin()).unwrap();
        let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);

        let seq = resolver
            .resolve(&Request::canonical(GenericOp::float(Family::Add)), &mut scratch)
            .unwrap();
        assert_eq!(seq.strategy, Strategy::Native);
        assert_eq!(seq.symbols(), vec!["x256_add_f32"]);

        let stats = session.stats();
        assert_eq!(stats.requests, 1);
        assert_eq!(stats.sequences, 1);
        assert_eq!(stats.calls_emitted, 1);
    }

    #[test]
    fn test_mask_needs_predication() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let config = BuildConfig::new(WidthSelector::Bits128, 32);
        let resolver = Resolver::new(&session, &config, TableCatalogue::builtin()).unwrap();
        let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);

        let request = Request::canonical(GenericOp::float(Family::Add))
            .with_context(EmitContext::default().with_mask(Mask(1)));
        let err = resolver.resolve(&request, &mut scratch).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedContext { .. }));
        assert_eq!(session.stats().failures, 1);

        let config = BuildConfig::new(WidthSelector::Bits512, 32);
        let resolver = Resolver::new(&session, &config, TableCatalogue::builtin()).unwrap();
        assert!(resolver.resolve(&request, &mut scratch).is_ok());
    }

    #[test]
    fn test_static_rounding_only_on_wide_tiers() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let request = Request::canonical(GenericOp::float(Family::Mul))
            .with_context(EmitContext::default().with_rounding(RoundingMode::TowardZero));

        let resolver = Resolver::new(
            &session,
            &BuildConfig::new(WidthSelector::Bits256, 32),
            TableCatalogue::builtin(),
        )
        .unwrap();
        let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);
        assert!(resolver.resolve(&request, &mut scratch).is_err());

        let resolver = Resolver::new(
            &session,
            &BuildConfig::new(WidthSelector::Configurable, 32).with_scalable(true),
            TableCatalogue::builtin(),
        )
        .unwrap();
        let seq = resolver.resolve(&request, &mut scratch).unwrap();
        assert_eq!(seq.calls()[0].ctx.rounding, RoundingMode::TowardZero);
    }

    #[test]
    fn test_memory_operand_only_in_last_position() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let resolver = Resolver::new(&session, &BuildConfig::default(), TableCatalogue::builtin())
            .unwrap();
        let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);

        let ok = Request::new(
            GenericOp::float(Family::Add),
            Operand::reg(0),
            vec![Operand::reg(1), Operand::mem(2, 64)],
        );
        assert!(resolver.resolve(&ok, &mut scratch).is_ok());

        let bad = Request::new(
            GenericOp::float(Family::Add),
            Operand::reg(0),
            vec![Operand::mem(2, 64), Operand::reg(1)],
        );
        assert!(matches!(
            resolver.resolve(&bad, &mut scratch),
            Err(ResolveError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn test_in_place_primitive_requires_tied_destination() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let mut catalogue = TableCatalogue::new();
        catalogue
            .insert(
                PrimitiveKey::new(Family::Sub, Variant::Float, ElementWidth::W32, Tier::Fixed128),
                Primitive::new("subps", 2).in_place(),
            )
            .unwrap();
        let resolver = Resolver::new(&session, &BuildConfig::default(), catalogue).unwrap();
        let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);

        let untied = Request::canonical(GenericOp::float(Family::Sub));
        assert!(resolver.resolve(&untied, &mut scratch).is_err());

        let tied = Request::new(
            GenericOp::float(Family::Sub),
            Operand::reg(1),
            vec![Operand::reg(1), Operand::reg(2)],
        );
        let seq = resolver.resolve(&tied, &mut scratch).unwrap();
        assert!(seq.calls()[0].in_place);
    }

    #[test]
    fn test_supported_ops_cover_native_families() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let resolver = Resolver::new(&session, &BuildConfig::default(), TableCatalogue::builtin())
            .unwrap();
        let ops = resolver.supported_ops();
        assert!(ops.contains(&GenericOp::float(Family::Reciprocal)));
        assert!(ops.contains(&GenericOp::float(Family::FusedMulSub)));
        assert!(!ops.contains(&GenericOp::new(Family::Div, Variant::Signed)));
        // probing leaves the statistics untouched
        assert_eq!(session.stats().requests, 0);
    }
}
