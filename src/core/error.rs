// This module defines the error type for vtier using the thiserror crate. ResolveError covers
// every way resolution can fail at build time: an axis combination the normalizer cannot map
// onto a tier, an element width that is illegal for the active tier, a (family, tier, element,
// variant) tuple with no catalogue entry, an emulation-eligible family with no usable strategy,
// a catalogue that defines the same key twice, scratch-slot misuse inside one synthesized
// sequence, a context (mask, rounding) the tier cannot honour, malformed requests, and
// catalogue/setting parse failures. Each variant carries the offending combination so the
// message names exactly what must change. ResolveResult<T> is the convenience alias used
// throughout the crate. None of these errors is recoverable: callers abort the build.

//! Error types for tier resolution.
//!
//! Using thiserror for idiomatic error handling.

use thiserror::Error;

/// Main error type for resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unsupported axis combination: {reason}")]
    UnsupportedConfiguration { reason: String },

    #[error("Element width {bits}-bit is not legal on tier {tier}: {reason}")]
    IllegalElementWidth {
        bits: u32,
        tier: String,
        reason: &'static str,
    },

    #[error("Unresolved symbol: no primitive for {combination}")]
    UnresolvedSymbol { combination: String },

    #[error("No emulation path available for {family} on {tier} ({element}) under {level}")]
    NoEmulationPath {
        family: String,
        tier: String,
        element: String,
        level: String,
    },

    #[error("Ambiguous primitive: {combination} bound to both {first} and {second}")]
    AmbiguousPrimitive {
        combination: String,
        first: String,
        second: String,
    },

    #[error("Scratch slot {slot} already in use")]
    ScratchInUse { slot: String },

    #[error("Scratch discipline violated: {reason}")]
    ScratchDiscipline { reason: String },

    #[error("Tier {tier} cannot honour {what}")]
    UnsupportedContext { tier: String, what: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Invalid value {value:?} for {name}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("Catalogue line {line}: {reason}")]
    CatalogueParse { line: usize, reason: String },
}

impl ResolveError {
    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        ResolveError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub(crate) fn unresolved(combination: impl ToString) -> Self {
        ResolveError::UnresolvedSymbol {
            combination: combination.to_string(),
        }
    }
}

/// Result type alias for resolution operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
