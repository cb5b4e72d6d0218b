// This module implements the axis normalizer: a strict decision table that turns the raw build
// configuration into the canonical TierTuple used for every request in the build. Rules apply in
// priority order: (a) the scalable flag together with the configurable selector selects the
// scalable tier; (b) otherwise the selector must name a fixed tier exactly (scalar, 128, 256, or
// the variable-length tier at 512/1024/2048 bits); (c) anything else, in particular the
// configurable selector without the scalable flag, is an unsupported configuration. The element
// width is validated independently: the 16-bit path only exists by widening into 32-bit
// storage, which requires a tier that is at least 256-bit capable. The function is pure, so the
// same configuration always yields the same tuple.

//! Axis normalizer.

use crate::core::{
    BuildConfig, ElementWidth, ResolveError, ResolveResult, Tier, VarLength, WidthSelector,
};
use std::fmt;

/// Canonical axis tuple for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TierTuple {
    pub tier: Tier,
    /// Element width requested by the configuration.
    pub element: ElementWidth,
    /// Element width of the hardware path that actually stores the lanes.
    pub storage: ElementWidth,
}

impl TierTuple {
    /// Whether requests are widened into a different storage width.
    pub fn is_widened(&self) -> bool {
        self.element != self.storage
    }
}

impl fmt::Display for TierTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tier, self.element)?;
        if self.is_widened() {
            write!(f, " (stored as {})", self.storage)?;
        }
        Ok(())
    }
}

/// Normalize a build configuration into its tier tuple.
pub fn normalize(config: &BuildConfig) -> ResolveResult<TierTuple> {
    let tier = select_tier(config.width, config.scalable)?;
    let element = ElementWidth::from_bits(config.element_bits)?;
    let storage = storage_width(tier, element)?;

    let tuple = TierTuple {
        tier,
        element,
        storage,
    };
    log::debug!("Normalized {:?} -> {}", config.width, tuple);
    Ok(tuple)
}

/// Tier decision table.
pub fn select_tier(width: WidthSelector, scalable: bool) -> ResolveResult<Tier> {
    // (a) scalable flag at the wide threshold
    if scalable && width == WidthSelector::Configurable {
        return Ok(Tier::Scalable);
    }

    // (b) exact fixed match
    let fixed = match width {
        WidthSelector::Scalar => Some(Tier::Scalar),
        WidthSelector::Bits128 => Some(Tier::Fixed128),
        WidthSelector::Bits256 => Some(Tier::Fixed256),
        WidthSelector::Bits512 => Some(Tier::Var(VarLength::Bits512)),
        WidthSelector::Bits1024 => Some(Tier::Var(VarLength::Bits1024)),
        WidthSelector::Bits2048 => Some(Tier::Var(VarLength::Bits2048)),
        WidthSelector::Configurable => None,
    };

    match fixed {
        Some(tier) => {
            if scalable {
                log::warn!(
                    "Scalable extension flag ignored: width selector {} names a fixed tier",
                    width
                );
            }
            Ok(tier)
        }
        // (c)
        None => Err(ResolveError::UnsupportedConfiguration {
            reason: format!(
                "width selector {} requires the scalable-extension flag",
                width
            ),
        }),
    }
}

/// Validate the element width against the tier and return the storage width.
pub fn storage_width(tier: Tier, element: ElementWidth) -> ResolveResult<ElementWidth> {
    match element {
        ElementWidth::W16 if !tier.is_wide_capable() => Err(ResolveError::IllegalElementWidth {
            bits: 16,
            tier: tier.to_string(),
            reason: "16-bit lanes are widened into 32-bit storage, which needs a 256-bit capable tier",
        }),
        ElementWidth::W16 => Ok(ElementWidth::W32),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalable_rule_has_priority() {
        assert_eq!(
            select_tier(WidthSelector::Configurable, true).unwrap(),
            Tier::Scalable
        );
    }

    #[test]
    fn test_fixed_selectors() {
        assert_eq!(select_tier(WidthSelector::Scalar, false).unwrap(), Tier::Scalar);
        assert_eq!(select_tier(WidthSelector::Bits128, false).unwrap(), Tier::Fixed128);
        assert_eq!(
            select_tier(WidthSelector::Bits1024, false).unwrap(),
            Tier::Var(VarLength::Bits1024)
        );
        // flag ignored for a fixed selector
        assert_eq!(select_tier(WidthSelector::Bits256, true).unwrap(), Tier::Fixed256);
    }

    #[test]
    fn test_configurable_without_flag_fails() {
        let err = select_tier(WidthSelector::Configurable, false).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedConfiguration { .. }));
    }

    #[test]
    fn test_half_width_storage() {
        assert_eq!(
            storage_width(Tier::Fixed256, ElementWidth::W16).unwrap(),
            ElementWidth::W32
        );
        assert_eq!(
            storage_width(Tier::Scalable, ElementWidth::W16).unwrap(),
            ElementWidth::W32
        );
        assert!(storage_width(Tier::Fixed128, ElementWidth::W16).is_err());
        assert!(storage_width(Tier::Scalar, ElementWidth::W16).is_err());
        assert_eq!(
            storage_width(Tier::Scalar, ElementWidth::W64).unwrap(),
            ElementWidth::W64
        );
    }

    #[test]
    fn test_unknown_element_width() {
        let config = BuildConfig::new(WidthSelector::Bits128, 8);
        assert!(matches!(
            normalize(&config),
            Err(ResolveError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_tuple_display() {
        let tuple = normalize(&BuildConfig::new(WidthSelector::Bits256, 16)).unwrap();
        assert_eq!(tuple.to_string(), "x256/16-bit (stored as 32-bit)");
        assert!(tuple.is_widened());
    }
}
