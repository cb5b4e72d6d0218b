// This module holds the raw build configuration surface consumed by the axis normalizer: the
// vector-width selector, the element width in bits, the scalable-extension flag, and one
// optional compatibility level per emulation-eligible family. Configuration comes from
// VTIER_* environment variables (mirroring how build scripts read their knobs) or is assembled
// programmatically / by the CLI. Unset levels mean "use the tier's default strategy", which the
// synthesizer decides from catalogue availability.

//! Build configuration.

use super::axis::WidthSelector;
use super::error::{ResolveError, ResolveResult};
use super::family::EmulatedFamily;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Emulation strategy selected per family at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompatLevel {
    /// Hardware estimate followed by one exposed refinement step.
    EstimateRefine,
    /// Exact software sequence through the native divide.
    SoftwareFallback,
    /// Single opaque estimate whose contract includes the refinement.
    EstimateOnly,
}

impl CompatLevel {
    pub const ALL: [CompatLevel; 3] = [
        CompatLevel::EstimateRefine,
        CompatLevel::SoftwareFallback,
        CompatLevel::EstimateOnly,
    ];
}

impl fmt::Display for CompatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CompatLevel::EstimateRefine => "estimate-refine",
            CompatLevel::SoftwareFallback => "software-fallback",
            CompatLevel::EstimateOnly => "estimate-only",
        };
        f.write_str(text)
    }
}

impl FromStr for CompatLevel {
    type Err = ResolveError;

    fn from_str(s: &str) -> ResolveResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "estimate-refine" | "refine" | "0" => Ok(CompatLevel::EstimateRefine),
            "software-fallback" | "software" | "1" => Ok(CompatLevel::SoftwareFallback),
            "estimate-only" | "estimate" | "2" => Ok(CompatLevel::EstimateOnly),
            _ => Err(ResolveError::InvalidSetting {
                name: "compatibility level",
                value: s.to_string(),
            }),
        }
    }
}

/// One optional level per emulation-eligible family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompatLevels {
    pub reciprocal: Option<CompatLevel>,
    pub recip_sqrt: Option<CompatLevel>,
    pub fused_mul_add: Option<CompatLevel>,
    pub fused_mul_sub: Option<CompatLevel>,
}

impl CompatLevels {
    pub fn get(&self, family: EmulatedFamily) -> Option<CompatLevel> {
        match family {
            EmulatedFamily::Reciprocal => self.reciprocal,
            EmulatedFamily::RecipSqrt => self.recip_sqrt,
            EmulatedFamily::FusedMulAdd => self.fused_mul_add,
            EmulatedFamily::FusedMulSub => self.fused_mul_sub,
        }
    }

    pub fn set(&mut self, family: EmulatedFamily, level: Option<CompatLevel>) {
        let slot = match family {
            EmulatedFamily::Reciprocal => &mut self.reciprocal,
            EmulatedFamily::RecipSqrt => &mut self.recip_sqrt,
            EmulatedFamily::FusedMulAdd => &mut self.fused_mul_add,
            EmulatedFamily::FusedMulSub => &mut self.fused_mul_sub,
        };
        *slot = level;
    }

    /// Same level for every family.
    pub fn uniform(level: CompatLevel) -> Self {
        Self {
            reciprocal: Some(level),
            recip_sqrt: Some(level),
            fused_mul_add: Some(level),
            fused_mul_sub: Some(level),
        }
    }
}

/// Raw build configuration, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildConfig {
    pub width: WidthSelector,
    /// Element width in bits; validated by the normalizer.
    pub element_bits: u32,
    pub scalable: bool,
    pub levels: CompatLevels,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            width: WidthSelector::Bits128,
            element_bits: 32,
            scalable: false,
            levels: CompatLevels::default(),
        }
    }
}

impl BuildConfig {
    pub const ENV_WIDTH: &'static str = "VTIER_WIDTH";
    pub const ENV_ELEMENT: &'static str = "VTIER_ELEMENT";
    pub const ENV_SCALABLE: &'static str = "VTIER_SCALABLE";

    pub fn new(width: WidthSelector, element_bits: u32) -> Self {
        Self {
            width,
            element_bits,
            ..Self::default()
        }
    }

    pub fn with_scalable(mut self, scalable: bool) -> Self {
        self.scalable = scalable;
        self
    }

    pub fn with_level(mut self, family: EmulatedFamily, level: CompatLevel) -> Self {
        self.levels.set(family, Some(level));
        self
    }

    pub fn with_levels(mut self, levels: CompatLevels) -> Self {
        self.levels = levels;
        self
    }

    /// Environment variable naming the level for `family`.
    pub const fn level_env(family: EmulatedFamily) -> &'static str {
        match family {
            EmulatedFamily::Reciprocal => "VTIER_RECIP_LEVEL",
            EmulatedFamily::RecipSqrt => "VTIER_RSQRT_LEVEL",
            EmulatedFamily::FusedMulAdd => "VTIER_FMA_LEVEL",
            EmulatedFamily::FusedMulSub => "VTIER_FMS_LEVEL",
        }
    }

    /// Read configuration from `VTIER_*` variables, defaulting anything unset.
    pub fn from_env() -> ResolveResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary key lookup; `from_env` with an injectable source.
    pub fn from_lookup<F>(lookup: F) -> ResolveResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(width) = lookup(Self::ENV_WIDTH) {
            config.width = width.parse()?;
        }
        if let Some(element) = lookup(Self::ENV_ELEMENT) {
            config.element_bits =
                element
                    .trim()
                    .parse()
                    .map_err(|_| ResolveError::InvalidSetting {
                        name: "element width",
                        value: element.clone(),
                    })?;
        }
        if let Some(flag) = lookup(Self::ENV_SCALABLE) {
            config.scalable = parse_flag(&flag)?;
        }
        for family in EmulatedFamily::ALL {
            if let Some(level) = lookup(Self::level_env(family)) {
                config.levels.set(family, Some(level.parse()?));
            }
        }

        log::debug!("Build configuration: {:?}", config);
        Ok(config)
    }
}

fn parse_flag(value: &str) -> ResolveResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ResolveError::InvalidSetting {
            name: "scalable flag",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = BuildConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, BuildConfig::default());
        assert_eq!(config.levels.get(EmulatedFamily::Reciprocal), None);
    }

    #[test]
    fn test_full_lookup() {
        let config = BuildConfig::from_lookup(lookup_from(&[
            ("VTIER_WIDTH", "var"),
            ("VTIER_ELEMENT", "64"),
            ("VTIER_SCALABLE", "1"),
            ("VTIER_RECIP_LEVEL", "software-fallback"),
            ("VTIER_FMS_LEVEL", "estimate-only"),
        ]))
        .unwrap();

        assert_eq!(config.width, WidthSelector::Configurable);
        assert_eq!(config.element_bits, 64);
        assert!(config.scalable);
        assert_eq!(
            config.levels.get(EmulatedFamily::Reciprocal),
            Some(CompatLevel::SoftwareFallback)
        );
        assert_eq!(
            config.levels.get(EmulatedFamily::FusedMulSub),
            Some(CompatLevel::EstimateOnly)
        );
        assert_eq!(config.levels.get(EmulatedFamily::RecipSqrt), None);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        let err = BuildConfig::from_lookup(lookup_from(&[("VTIER_SCALABLE", "maybe")]));
        assert!(matches!(err, Err(ResolveError::InvalidSetting { .. })));

        let err = BuildConfig::from_lookup(lookup_from(&[("VTIER_FMA_LEVEL", "fast")]));
        assert!(err.is_err());

        let err = BuildConfig::from_lookup(lookup_from(&[("VTIER_ELEMENT", "thirty-two")]));
        assert!(err.is_err());
    }
}
