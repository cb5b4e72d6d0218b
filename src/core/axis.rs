// This module defines the orthogonal build-time axes that select a concrete primitive: the
// vector-width tier (scalar, fixed 128/256, the configurable variable-length tier at 512/1024/2048
// bits, and the scalable-extension tier), the element width (16/32/64), the variant tag that
// separates float, signed and unsigned interpretations of the same bits, the rounding mode,
// and the raw width selector read from the build configuration. Every axis is a small Copy enum
// with an ALL table for exhaustive enumeration, a short mnemonic used in primitive symbols and
// catalogue files, and a FromStr impl so configuration values parse into the same vocabulary.

//! Resolution axes.

use super::error::{ResolveError, ResolveResult};
use std::fmt;
use std::str::FromStr;

/// Lengths the configurable variable-length tier can be instantiated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VarLength {
    Bits512,
    Bits1024,
    Bits2048,
}

impl VarLength {
    pub const ALL: [VarLength; 3] = [VarLength::Bits512, VarLength::Bits1024, VarLength::Bits2048];

    pub const fn bits(self) -> u32 {
        match self {
            VarLength::Bits512 => 512,
            VarLength::Bits1024 => 1024,
            VarLength::Bits2048 => 2048,
        }
    }
}

/// Vector-width tier. Exactly one is active per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Scalar,
    Fixed128,
    Fixed256,
    Var(VarLength),
    /// Scalable vector extension; register length is only known on the target.
    Scalable,
}

impl Tier {
    pub const ALL: [Tier; 7] = [
        Tier::Scalar,
        Tier::Fixed128,
        Tier::Fixed256,
        Tier::Var(VarLength::Bits512),
        Tier::Var(VarLength::Bits1024),
        Tier::Var(VarLength::Bits2048),
        Tier::Scalable,
    ];

    /// Register width in bits, `None` for the scalable tier.
    pub const fn bits(self) -> Option<u32> {
        match self {
            Tier::Scalar => Some(64),
            Tier::Fixed128 => Some(128),
            Tier::Fixed256 => Some(256),
            Tier::Var(len) => Some(len.bits()),
            Tier::Scalable => None,
        }
    }

    /// Upper bound on the register width, used to size scratch slots.
    pub const fn max_bits(self) -> u32 {
        match self.bits() {
            Some(bits) => bits,
            None => 2048,
        }
    }

    pub const fn is_vector(self) -> bool {
        !matches!(self, Tier::Scalar)
    }

    /// Tiers whose storage can host the widened 16-bit path.
    pub const fn is_wide_capable(self) -> bool {
        matches!(self, Tier::Fixed256 | Tier::Var(_) | Tier::Scalable)
    }

    /// Predicate mask registers are only present on the wide configurable tiers.
    pub const fn has_predication(self) -> bool {
        matches!(self, Tier::Var(_) | Tier::Scalable)
    }

    /// Static (per-instruction) rounding overrides.
    pub const fn has_static_rounding(self) -> bool {
        matches!(self, Tier::Var(_) | Tier::Scalable)
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Tier::Scalar => "scalar",
            Tier::Fixed128 => "x128",
            Tier::Fixed256 => "x256",
            Tier::Var(VarLength::Bits512) => "v512",
            Tier::Var(VarLength::Bits1024) => "v1024",
            Tier::Var(VarLength::Bits2048) => "v2048",
            Tier::Scalable => "sve",
        }
    }

    /// Number of lanes for the given element width, `None` for scalable.
    pub fn lanes(self, element: ElementWidth) -> Option<usize> {
        match self {
            Tier::Scalar => Some(1),
            _ => self.bits().map(|bits| (bits / element.bits()) as usize),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Tier {
    type Err = ResolveError;

    fn from_str(s: &str) -> ResolveResult<Self> {
        Tier::ALL
            .iter()
            .copied()
            .find(|tier| tier.mnemonic() == s)
            .ok_or_else(|| ResolveError::InvalidSetting {
                name: "tier",
                value: s.to_string(),
            })
    }
}

/// Element width of a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementWidth {
    W16,
    W32,
    W64,
}

impl ElementWidth {
    pub const ALL: [ElementWidth; 3] = [ElementWidth::W16, ElementWidth::W32, ElementWidth::W64];

    /// Widths that can have hardware-native primitives.
    pub const NATIVE: [ElementWidth; 2] = [ElementWidth::W32, ElementWidth::W64];

    pub const fn bits(self) -> u32 {
        match self {
            ElementWidth::W16 => 16,
            ElementWidth::W32 => 32,
            ElementWidth::W64 => 64,
        }
    }

    pub fn from_bits(bits: u32) -> ResolveResult<Self> {
        match bits {
            16 => Ok(ElementWidth::W16),
            32 => Ok(ElementWidth::W32),
            64 => Ok(ElementWidth::W64),
            other => Err(ResolveError::InvalidSetting {
                name: "element width",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ElementWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Interpretation of a lane's bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    Float,
    Signed,
    Unsigned,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Float, Variant::Signed, Variant::Unsigned];

    pub const fn is_float(self) -> bool {
        matches!(self, Variant::Float)
    }

    pub const fn letter(self) -> char {
        match self {
            Variant::Float => 'f',
            Variant::Signed => 'i',
            Variant::Unsigned => 'u',
        }
    }

    /// Type tag such as `f32` or `u64`.
    pub fn type_tag(self, element: ElementWidth) -> String {
        format!("{}{}", self.letter(), element.bits())
    }

    /// Parse a type tag back into its variant and width.
    pub fn parse_type_tag(tag: &str) -> ResolveResult<(Variant, ElementWidth)> {
        let invalid = || ResolveError::InvalidSetting {
            name: "type tag",
            value: tag.to_string(),
        };
        let mut chars = tag.chars();
        let variant = match chars.next() {
            Some('f') => Variant::Float,
            Some('i') => Variant::Signed,
            Some('u') => Variant::Unsigned,
            _ => return Err(invalid()),
        };
        let bits: u32 = chars.as_str().parse().map_err(|_| invalid())?;
        let element = ElementWidth::from_bits(bits).map_err(|_| invalid())?;
        Ok((variant, element))
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Float => f.write_str("float"),
            Variant::Signed => f.write_str("signed"),
            Variant::Unsigned => f.write_str("unsigned"),
        }
    }
}

impl FromStr for Variant {
    type Err = ResolveError;

    fn from_str(s: &str) -> ResolveResult<Self> {
        match s {
            "float" | "f" => Ok(Variant::Float),
            "signed" | "i" => Ok(Variant::Signed),
            "unsigned" | "u" => Ok(Variant::Unsigned),
            other => Err(ResolveError::InvalidSetting {
                name: "variant",
                value: other.to_string(),
            }),
        }
    }
}

/// Rounding mode. Always passed explicitly, there is no ambient mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RoundingMode {
    #[default]
    NearestEven,
    TowardZero,
    Down,
    Up,
}

impl RoundingMode {
    pub const ALL: [RoundingMode; 4] = [
        RoundingMode::NearestEven,
        RoundingMode::TowardZero,
        RoundingMode::Down,
        RoundingMode::Up,
    ];

    pub const fn mnemonic(self) -> &'static str {
        match self {
            RoundingMode::NearestEven => "rn",
            RoundingMode::TowardZero => "rz",
            RoundingMode::Down => "rd",
            RoundingMode::Up => "ru",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for RoundingMode {
    type Err = ResolveError;

    fn from_str(s: &str) -> ResolveResult<Self> {
        RoundingMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.mnemonic() == s)
            .ok_or_else(|| ResolveError::InvalidSetting {
                name: "rounding mode",
                value: s.to_string(),
            })
    }
}

/// Raw vector-width selector as it appears in the build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidthSelector {
    Scalar,
    Bits128,
    Bits256,
    Bits512,
    Bits1024,
    Bits2048,
    /// The wide threshold: "configurable/variable", only meaningful with the scalable flag.
    Configurable,
}

impl FromStr for WidthSelector {
    type Err = ResolveError;

    fn from_str(s: &str) -> ResolveResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" | "0" => Ok(WidthSelector::Scalar),
            "128" => Ok(WidthSelector::Bits128),
            "256" => Ok(WidthSelector::Bits256),
            "512" => Ok(WidthSelector::Bits512),
            "1024" => Ok(WidthSelector::Bits1024),
            "2048" => Ok(WidthSelector::Bits2048),
            "var" | "variable" | "configurable" => Ok(WidthSelector::Configurable),
            _ => Err(ResolveError::InvalidSetting {
                name: "vector width",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WidthSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WidthSelector::Scalar => "scalar",
            WidthSelector::Bits128 => "128",
            WidthSelector::Bits256 => "256",
            WidthSelector::Bits512 => "512",
            WidthSelector::Bits1024 => "1024",
            WidthSelector::Bits2048 => "2048",
            WidthSelector::Configurable => "configurable",
        };
        f.write_str(text)
    }
}
