//! vtier - build-time vector tier resolution.
//!
//! vtier maps width-agnostic SIMD operation requests (a family such as add,
//! reciprocal or fused multiply-add, plus a float/signed/unsigned variant)
//! onto exactly one sequence of concrete backend primitives for the vector
//! tier selected at build time. Resolution happens once per request and
//! leaves nothing behind in the emitted code.
//!
//! # Primary Usage
//!
//! ```
//! use bumpalo::Bump;
//! use vtier::core::{BuildConfig, Family, GenericOp, Request, ResolveSession, ScratchSlots, WidthSelector};
//! use vtier::resolve::TableCatalogue;
//! use vtier::Resolver;
//!
//! // Sequences and symbols live in the session arena
//! let arena = Bump::new();
//! let session = ResolveSession::new(&arena);
//!
//! let config = BuildConfig::new(WidthSelector::Bits128, 32);
//! let resolver = Resolver::new(&session, &config, TableCatalogue::builtin()).unwrap();
//! let mut scratch = ScratchSlots::for_tier(resolver.tuple().tier);
//!
//! let request = Request::canonical(GenericOp::float(Family::Reciprocal));
//! let sequence = resolver.resolve(&request, &mut scratch).unwrap();
//! assert_eq!(sequence.symbols(), vec!["x128_rcpe_f32", "x128_rcps_f32"]);
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Shared vocabulary (axes, families, operands, config, session)
//! - [`normalize`] - Build configuration to canonical tier tuple
//! - [`resolve`] - Primitive catalogue and the three-layer alias chain
//! - [`synth`] - Emulation of reciprocal, reciprocal-sqrt and fused multiply families
//! - [`resolver`] - The facade code emitters call
//! - [`compat`] - Cross-tier compatibility contracts
//! - [`verify`] - Reference interpreter for float sequences

pub mod compat;
pub mod core;
pub mod normalize;
pub mod resolve;
pub mod resolver;
pub mod sequence;
pub mod synth;
pub mod verify;

pub use crate::core::{
    BuildConfig, CompatLevel, ElementWidth, Family, GenericOp, Operand, Request, ResolveError,
    ResolveResult, ResolveSession, ScratchSlots, Tier, Variant,
};
pub use compat::{compatible, Contract};
pub use normalize::{normalize, TierTuple};
pub use resolve::{PrimitiveCatalogue, TableCatalogue};
pub use resolver::Resolver;
pub use sequence::{PrimitiveCall, PrimitiveSequence};
pub use synth::Strategy;
