//! Catalogue totality and normalizer determinism.
//!
//! Every combination the catalogue declares must resolve to exactly one
//! sequence, and the normalizer must be a pure function of its input.

use bumpalo::Bump;
use proptest::prelude::*;
use vtier::core::{
    BuildConfig, CompatLevel, CompatLevels, ElementWidth, GenericOp, Request, ResolveSession,
    ScratchSlots, WidthSelector,
};
use vtier::normalize::normalize;
use vtier::resolve::{PrimitiveCatalogue, PrimitiveKey, TableCatalogue};
use vtier::Resolver;

const SELECTORS: [WidthSelector; 7] = [
    WidthSelector::Scalar,
    WidthSelector::Bits128,
    WidthSelector::Bits256,
    WidthSelector::Bits512,
    WidthSelector::Bits1024,
    WidthSelector::Bits2048,
    WidthSelector::Configurable,
];

fn configs() -> Vec<BuildConfig> {
    let mut out = Vec::new();
    for width in SELECTORS {
        for bits in [32, 64] {
            let scalable = width == WidthSelector::Configurable;
            out.push(BuildConfig::new(width, bits).with_scalable(scalable));
        }
    }
    out
}

#[test]
fn test_every_declared_key_resolves_once() {
    let _ = env_logger::builder().is_test(true).try_init();
    let catalogue = TableCatalogue::builtin();

    for config in configs() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let resolver = Resolver::new(&session, &config, catalogue.clone()).unwrap();
        let tuple = resolver.tuple();
        let mut scratch = ScratchSlots::for_tier(tuple.tier);

        let keys: Vec<PrimitiveKey> = catalogue
            .keys()
            .into_iter()
            .filter(|key| key.tier == tuple.tier && key.element == tuple.storage)
            .collect();
        assert!(!keys.is_empty(), "no primitives for {tuple}");

        for key in keys {
            let request = Request::canonical(GenericOp::new(key.family, key.variant));
            let sequence = resolver
                .resolve(&request, &mut scratch)
                .unwrap_or_else(|e| panic!("{key} on {tuple}: {e}"));
            assert!(!sequence.is_empty());
            for call in sequence.calls() {
                assert_eq!(call.key.tier, tuple.tier);
                assert_eq!(catalogue.lookup(&call.key).map(|p| p.symbol.as_str()), Some(call.symbol));
            }
        }
    }
}

#[test]
fn test_emulated_families_resolve_under_default_levels() {
    let catalogue = TableCatalogue::builtin();
    for config in configs() {
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let resolver = Resolver::new(&session, &config, catalogue.clone()).unwrap();
        let ops = resolver.supported_ops();
        for family in vtier::Family::all().into_iter().filter(|f| f.emulated().is_some()) {
            assert!(
                ops.contains(&GenericOp::float(family)),
                "{family} missing on {}",
                resolver.tuple()
            );
        }
    }
}

#[test]
fn test_software_fallback_is_available_everywhere() {
    let catalogue = TableCatalogue::builtin();
    for config in configs() {
        let config = config.with_levels(CompatLevels::uniform(CompatLevel::SoftwareFallback));
        let arena = Bump::new();
        let session = ResolveSession::new(&arena);
        let resolver = Resolver::new(&session, &config, catalogue.clone()).unwrap();
        let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);
        for family in vtier::Family::all().into_iter().filter(|f| f.emulated().is_some()) {
            let request = Request::canonical(GenericOp::float(family));
            assert!(resolver.resolve(&request, &mut scratch).is_ok());
        }
    }
}

fn selector() -> impl Strategy<Value = WidthSelector> {
    prop::sample::select(SELECTORS.to_vec())
}

proptest! {
    // Property: normalization is a pure function of the configuration
    #[test]
    fn prop_normalizer_is_deterministic(
        width in selector(),
        bits in prop::sample::select(vec![8u32, 16, 32, 64, 128]),
        scalable in any::<bool>()
    ) {
        let config = BuildConfig::new(width, bits).with_scalable(scalable);
        let first = normalize(&config);
        let second = normalize(&config);
        prop_assert_eq!(first.clone(), second);

        if let Ok(tuple) = first {
            prop_assert_eq!(tuple.element.bits(), bits);
            if tuple.element == ElementWidth::W16 {
                prop_assert_eq!(tuple.storage, ElementWidth::W32);
                prop_assert!(tuple.tier.is_wide_capable());
            } else {
                prop_assert_eq!(tuple.storage, tuple.element);
            }
        }
    }

    // Property: the configurable selector only ever yields the scalable tier
    #[test]
    fn prop_configurable_requires_flag(bits in prop::sample::select(vec![16u32, 32, 64]), scalable in any::<bool>()) {
        let config = BuildConfig::new(WidthSelector::Configurable, bits).with_scalable(scalable);
        match normalize(&config) {
            Ok(tuple) => prop_assert!(scalable && tuple.tier == vtier::Tier::Scalable),
            Err(_) => prop_assert!(!scalable),
        }
    }
}
