// This module defines the fixed operation vocabulary: Family names the semantic operation
// (moves and memory, bitwise, arithmetic, compares, rounding conversions, the reciprocal and
// reciprocal-sqrt families with their separate estimate/refine primitives, fused multiply
// add/subtract, shifts, and horizontal reductions). GenericOp pairs a family with a variant and
// is what callers request; EmulatedFamily marks the four families whose resolution may expand
// into a multi-step sequence. Families know their source arity, whether they accept float or
// integer variants, and the mnemonic that appears in primitive symbols and catalogue files.

//! Operation families.

use super::axis::{RoundingMode, Variant};
use super::error::{ResolveError, ResolveResult};
use std::fmt;
use std::str::FromStr;

/// Compare predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CmpPredicate {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpPredicate {
    pub const ALL: [CmpPredicate; 6] = [
        CmpPredicate::Eq,
        CmpPredicate::Ne,
        CmpPredicate::Lt,
        CmpPredicate::Le,
        CmpPredicate::Gt,
        CmpPredicate::Ge,
    ];

    pub const fn mnemonic(self) -> &'static str {
        match self {
            CmpPredicate::Eq => "eq",
            CmpPredicate::Ne => "ne",
            CmpPredicate::Lt => "lt",
            CmpPredicate::Le => "le",
            CmpPredicate::Gt => "gt",
            CmpPredicate::Ge => "ge",
        }
    }
}

/// Direction of a conversion between float and integer lanes of the same width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConvertTarget {
    ToInt,
    ToFloat,
}

/// Semantic operation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Move,
    Load,
    Store,
    LoadConstant,
    And,
    Or,
    Xor,
    Not,
    AndNot,
    Add,
    Sub,
    Mul,
    Div,
    Sqrt,
    Min,
    Max,
    Compare(CmpPredicate),
    /// The variant names the integer side of the conversion.
    Convert(ConvertTarget, RoundingMode),
    /// Reciprocal; bound natively to the refined-estimate primitive.
    Reciprocal,
    /// Reciprocal square root; bound natively to the refined-estimate primitive.
    RecipSqrt,
    RecipEstimate,
    RecipRefine,
    RsqrtEstimate,
    RsqrtRefine,
    FusedMulAdd,
    FusedMulSub,
    ShiftLeft,
    /// Arithmetic for signed variants, logical for unsigned.
    ShiftRight,
    HorizontalSum,
    HorizontalPairwise,
}

/// Families whose resolution is governed by a compatibility level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmulatedFamily {
    Reciprocal,
    RecipSqrt,
    FusedMulAdd,
    FusedMulSub,
}

impl EmulatedFamily {
    pub const ALL: [EmulatedFamily; 4] = [
        EmulatedFamily::Reciprocal,
        EmulatedFamily::RecipSqrt,
        EmulatedFamily::FusedMulAdd,
        EmulatedFamily::FusedMulSub,
    ];

    pub const fn family(self) -> Family {
        match self {
            EmulatedFamily::Reciprocal => Family::Reciprocal,
            EmulatedFamily::RecipSqrt => Family::RecipSqrt,
            EmulatedFamily::FusedMulAdd => Family::FusedMulAdd,
            EmulatedFamily::FusedMulSub => Family::FusedMulSub,
        }
    }

    pub const fn is_fused(self) -> bool {
        matches!(self, EmulatedFamily::FusedMulAdd | EmulatedFamily::FusedMulSub)
    }
}

impl fmt::Display for EmulatedFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.family(), f)
    }
}

impl Family {
    /// Every family, with each compare predicate and conversion mode spelled out.
    pub fn all() -> Vec<Family> {
        use Family::*;
        let mut families = vec![
            Move, Load, Store, LoadConstant, And, Or, Xor, Not, AndNot, Add, Sub, Mul, Div, Sqrt,
            Min, Max,
        ];
        families.extend(CmpPredicate::ALL.iter().map(|&p| Compare(p)));
        for target in [ConvertTarget::ToInt, ConvertTarget::ToFloat] {
            families.extend(RoundingMode::ALL.iter().map(|&mode| Convert(target, mode)));
        }
        families.extend([
            Reciprocal,
            RecipSqrt,
            RecipEstimate,
            RecipRefine,
            RsqrtEstimate,
            RsqrtRefine,
            FusedMulAdd,
            FusedMulSub,
            ShiftLeft,
            ShiftRight,
            HorizontalSum,
            HorizontalPairwise,
        ]);
        families
    }

    pub const fn emulated(self) -> Option<EmulatedFamily> {
        match self {
            Family::Reciprocal => Some(EmulatedFamily::Reciprocal),
            Family::RecipSqrt => Some(EmulatedFamily::RecipSqrt),
            Family::FusedMulAdd => Some(EmulatedFamily::FusedMulAdd),
            Family::FusedMulSub => Some(EmulatedFamily::FusedMulSub),
            _ => None,
        }
    }

    /// Number of source operands.
    pub const fn arity(self) -> usize {
        use Family::*;
        match self {
            Move | Load | Store | LoadConstant | Not | Sqrt | Convert(..) | Reciprocal
            | RecipSqrt | RecipEstimate | RsqrtEstimate | HorizontalSum => 1,
            And | Or | Xor | AndNot | Add | Sub | Mul | Div | Min | Max | Compare(_)
            | RecipRefine | RsqrtRefine | ShiftLeft | ShiftRight | HorizontalPairwise => 2,
            FusedMulAdd | FusedMulSub => 3,
        }
    }

    /// Whether the family is defined for the given lane interpretation.
    pub const fn accepts(self, variant: Variant) -> bool {
        use Family::*;
        match self {
            Sqrt | Reciprocal | RecipSqrt | RecipEstimate | RecipRefine | RsqrtEstimate
            | RsqrtRefine | FusedMulAdd | FusedMulSub => variant.is_float(),
            Convert(..) | ShiftLeft | ShiftRight => !variant.is_float(),
            _ => true,
        }
    }

    /// Families whose result depends on the rounding mode of the context.
    pub const fn is_rounded_arithmetic(self) -> bool {
        use Family::*;
        matches!(
            self,
            Add | Sub | Mul | Div | Sqrt | FusedMulAdd | FusedMulSub | HorizontalSum
                | HorizontalPairwise
        )
    }

    /// Families that are the memory-facing side of a move.
    pub const fn touches_memory(self) -> bool {
        matches!(self, Family::Load | Family::Store)
    }

    pub fn mnemonic(self) -> String {
        use Family::*;
        let base = match self {
            Move => "mov",
            Load => "ld",
            Store => "st",
            LoadConstant => "ldc",
            And => "and",
            Or => "or",
            Xor => "xor",
            Not => "not",
            AndNot => "andn",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => "div",
            Sqrt => "sqrt",
            Min => "min",
            Max => "max",
            Compare(p) => return format!("cmp{}", p.mnemonic()),
            Convert(ConvertTarget::ToInt, mode) => return format!("cvti.{}", mode.mnemonic()),
            Convert(ConvertTarget::ToFloat, mode) => return format!("cvtf.{}", mode.mnemonic()),
            Reciprocal => "rcp",
            RecipSqrt => "rsqrt",
            RecipEstimate => "rcpe",
            RecipRefine => "rcps",
            RsqrtEstimate => "rsqrte",
            RsqrtRefine => "rsqrts",
            FusedMulAdd => "fmadd",
            FusedMulSub => "fmsub",
            ShiftLeft => "shl",
            ShiftRight => "shr",
            HorizontalSum => "hsum",
            HorizontalPairwise => "hpadd",
        };
        base.to_string()
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mnemonic())
    }
}

impl FromStr for Family {
    type Err = ResolveError;

    fn from_str(s: &str) -> ResolveResult<Self> {
        Family::all()
            .into_iter()
            .find(|family| family.mnemonic() == s)
            .ok_or_else(|| ResolveError::InvalidSetting {
                name: "family",
                value: s.to_string(),
            })
    }
}

/// A width-agnostic operation request: family plus lane interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericOp {
    pub family: Family,
    pub variant: Variant,
}

impl GenericOp {
    pub const fn new(family: Family, variant: Variant) -> Self {
        Self { family, variant }
    }

    pub const fn float(family: Family) -> Self {
        Self::new(family, Variant::Float)
    }
}

impl fmt::Display for GenericOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.family, self.variant.letter())
    }
}
