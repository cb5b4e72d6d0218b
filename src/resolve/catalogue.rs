// This module defines the backend primitive catalogue consumed by the binding layer of the alias
// chain. PrimitiveKey is the enum tuple (family, variant, element width, tier) that identifies
// one concrete primitive; Primitive records its symbol and fixed-arity calling convention
// (source count, whether the last source may be a memory-plus-displacement operand, and whether
// it is an in-place form that destroys its first source). PrimitiveCatalogue is the seam to the
// external emitter: resolution only looks names up. TableCatalogue is the hash-table
// implementation, with a built-in catalogue describing the reference SIMD target and a
// line-oriented text format so a target can supply its own table. Inserting a second primitive
// for an existing key is rejected, which is how ambiguity is caught when the table is built.

//! Backend primitive catalogue.

use crate::core::{
    ElementWidth, Family, ResolveError, ResolveResult, Tier, Variant,
};
use hashbrown::HashMap;
use std::fmt;

/// Identifies exactly one concrete primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveKey {
    pub tier: Tier,
    pub family: Family,
    pub variant: Variant,
    pub element: ElementWidth,
}

impl PrimitiveKey {
    pub const fn new(family: Family, variant: Variant, element: ElementWidth, tier: Tier) -> Self {
        Self {
            tier,
            family,
            variant,
            element,
        }
    }
}

impl fmt::Display for PrimitiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}@{}",
            self.family,
            self.variant.type_tag(self.element),
            self.tier
        )
    }
}

/// A concrete backend primitive and its calling convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primitive {
    pub symbol: String,
    /// Number of source operands.
    pub arity: usize,
    /// The last source may be a memory operand.
    pub memory_form: bool,
    /// Destructive two-address form: the destination must be the first source.
    pub in_place: bool,
}

impl Primitive {
    pub fn new(symbol: impl Into<String>, arity: usize) -> Self {
        Self {
            symbol: symbol.into(),
            arity,
            memory_form: false,
            in_place: false,
        }
    }

    pub fn with_memory_form(mut self) -> Self {
        self.memory_form = true;
        self
    }

    pub fn in_place(mut self) -> Self {
        self.in_place = true;
        self
    }
}

/// Lookup interface to the externally supplied primitive catalogue.
pub trait PrimitiveCatalogue {
    /// The primitive bound to `key`, if the combination is hardware-native.
    fn lookup(&self, key: &PrimitiveKey) -> Option<&Primitive>;

    /// Every key the catalogue defines.
    fn keys(&self) -> Vec<PrimitiveKey>;

    fn contains(&self, key: &PrimitiveKey) -> bool {
        self.lookup(key).is_some()
    }
}

/// Hash-table catalogue.
#[derive(Debug, Clone, Default)]
pub struct TableCatalogue {
    entries: HashMap<PrimitiveKey, Primitive>,
}

impl TableCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a primitive, rejecting a second binding for the same key.
    pub fn insert(&mut self, key: PrimitiveKey, primitive: Primitive) -> ResolveResult<()> {
        if let Some(existing) = self.entries.get(&key) {
            return Err(ResolveError::AmbiguousPrimitive {
                combination: key.to_string(),
                first: existing.symbol.clone(),
                second: primitive.symbol,
            });
        }
        self.entries.insert(key, primitive);
        Ok(())
    }

    /// The catalogue of the reference SIMD target.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        for tier in Tier::ALL {
            for family in Family::all() {
                for variant in Variant::ALL {
                    for element in ElementWidth::NATIVE {
                        let key = PrimitiveKey::new(family, variant, element, tier);
                        if builtin_supports(&key) {
                            entries.insert(key, builtin_primitive(&key));
                        }
                    }
                }
            }
        }
        log::debug!("Built-in catalogue: {} primitives", entries.len());
        Self { entries }
    }

    /// Parse a catalogue file.
    ///
    /// One primitive per line: `<tier> <family> <type> <symbol> [mem] [inplace]`,
    /// e.g. `x128 div f32 divps mem`. `#` starts a comment.
    pub fn parse(text: &str) -> ResolveResult<Self> {
        let mut catalogue = Self::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let parse_err = |reason: String| ResolveError::CatalogueParse {
                line: line_no,
                reason,
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return Err(parse_err(format!(
                    "expected `<tier> <family> <type> <symbol>`, got {} field(s)",
                    fields.len()
                )));
            }

            let tier: Tier = fields[0].parse().map_err(|e: ResolveError| parse_err(e.to_string()))?;
            let family: Family = fields[1]
                .parse()
                .map_err(|e: ResolveError| parse_err(e.to_string()))?;
            let (variant, element) = Variant::parse_type_tag(fields[2])
                .map_err(|e| parse_err(e.to_string()))?;

            if element == ElementWidth::W16 {
                return Err(parse_err("16-bit lanes have no native primitives".to_string()));
            }
            if !family.accepts(variant) {
                return Err(parse_err(format!("{family} is not defined for {variant} lanes")));
            }

            let mut primitive = Primitive::new(fields[3], family.arity());
            for flag in &fields[4..] {
                match *flag {
                    "mem" => primitive.memory_form = true,
                    "inplace" => primitive.in_place = true,
                    other => return Err(parse_err(format!("unknown flag `{other}`"))),
                }
            }

            let key = PrimitiveKey::new(family, variant, element, tier);
            catalogue.insert(key, primitive).map_err(|e| match e {
                ResolveError::AmbiguousPrimitive { .. } => e,
                other => parse_err(other.to_string()),
            })?;
        }

        Ok(catalogue)
    }

    /// Render in the format accepted by [`TableCatalogue::parse`], sorted by key.
    pub fn to_text(&self) -> String {
        let mut keys: Vec<_> = self.entries.keys().copied().collect();
        keys.sort();

        let mut out = String::new();
        for key in keys {
            let primitive = &self.entries[&key];
            out.push_str(&format!(
                "{} {} {} {}",
                key.tier,
                key.family,
                key.variant.type_tag(key.element),
                primitive.symbol
            ));
            if primitive.memory_form {
                out.push_str(" mem");
            }
            if primitive.in_place {
                out.push_str(" inplace");
            }
            out.push('\n');
        }
        out
    }
}

impl PrimitiveCatalogue for TableCatalogue {
    fn lookup(&self, key: &PrimitiveKey) -> Option<&Primitive> {
        self.entries.get(key)
    }

    fn keys(&self) -> Vec<PrimitiveKey> {
        self.entries.keys().copied().collect()
    }
}

/// Coverage of the reference target.
fn builtin_supports(key: &PrimitiveKey) -> bool {
    use Family::*;

    let PrimitiveKey {
        tier,
        family,
        variant,
        element,
    } = *key;

    if element == ElementWidth::W16 || !family.accepts(variant) {
        return false;
    }

    let fixed = matches!(tier, Tier::Fixed128 | Tier::Fixed256);
    let wide = element == ElementWidth::W64;

    match family {
        Move | Load | Store | LoadConstant | And | Or | Xor | Not | AndNot | Add | Sub | Mul
        | Compare(_) | Sqrt | FusedMulAdd | FusedMulSub | Convert(..) | ShiftLeft => true,
        Min | Max => variant.is_float() || !(wide && fixed),
        Div => variant.is_float() || tier == Tier::Scalar,
        ShiftRight => variant != Variant::Signed || !(wide && fixed),
        Reciprocal | RecipSqrt | RecipEstimate | RecipRefine | RsqrtEstimate | RsqrtRefine => {
            match tier {
                Tier::Scalar => false,
                Tier::Fixed128 | Tier::Fixed256 => !wide,
                Tier::Var(_) | Tier::Scalable => true,
            }
        }
        HorizontalSum => tier.is_vector(),
        HorizontalPairwise => match tier {
            Tier::Scalar => false,
            Tier::Fixed128 | Tier::Fixed256 => true,
            Tier::Var(_) | Tier::Scalable => !wide,
        },
    }
}

fn builtin_primitive(key: &PrimitiveKey) -> Primitive {
    let symbol = format!(
        "{}_{}_{}",
        key.tier.mnemonic(),
        key.family.mnemonic().replace('.', "_"),
        key.variant.type_tag(key.element)
    );
    let primitive = Primitive::new(symbol, key.family.arity());
    if key.family.arity() >= 2 || key.family == Family::Load {
        primitive.with_memory_form()
    } else {
        primitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VarLength;

    #[test]
    fn test_builtin_symbols() {
        let catalogue = TableCatalogue::builtin();
        let key = PrimitiveKey::new(Family::Div, Variant::Float, ElementWidth::W32, Tier::Fixed128);
        let div = catalogue.lookup(&key).unwrap();
        assert_eq!(div.symbol, "x128_div_f32");
        assert_eq!(div.arity, 2);
        assert!(div.memory_form);
    }

    #[test]
    fn test_builtin_gaps() {
        let catalogue = TableCatalogue::builtin();
        let missing = [
            PrimitiveKey::new(Family::RecipEstimate, Variant::Float, ElementWidth::W32, Tier::Scalar),
            PrimitiveKey::new(Family::RecipEstimate, Variant::Float, ElementWidth::W64, Tier::Fixed256),
            PrimitiveKey::new(Family::Max, Variant::Signed, ElementWidth::W64, Tier::Fixed128),
            PrimitiveKey::new(Family::ShiftRight, Variant::Signed, ElementWidth::W64, Tier::Fixed256),
            PrimitiveKey::new(Family::Div, Variant::Signed, ElementWidth::W32, Tier::Fixed128),
            PrimitiveKey::new(
                Family::HorizontalPairwise,
                Variant::Float,
                ElementWidth::W64,
                Tier::Var(VarLength::Bits512),
            ),
            PrimitiveKey::new(Family::HorizontalSum, Variant::Float, ElementWidth::W32, Tier::Scalar),
            PrimitiveKey::new(Family::Sqrt, Variant::Signed, ElementWidth::W32, Tier::Fixed128),
        ];
        for key in missing {
            assert!(!catalogue.contains(&key), "{key} should not be native");
        }

        assert!(catalogue.contains(&PrimitiveKey::new(
            Family::ShiftRight,
            Variant::Unsigned,
            ElementWidth::W64,
            Tier::Fixed128
        )));
        assert!(catalogue.contains(&PrimitiveKey::new(
            Family::RsqrtRefine,
            Variant::Float,
            ElementWidth::W64,
            Tier::Scalable
        )));
    }

    #[test]
    fn test_duplicate_insert_is_ambiguous() {
        let mut catalogue = TableCatalogue::new();
        let key = PrimitiveKey::new(Family::Add, Variant::Float, ElementWidth::W32, Tier::Fixed128);
        catalogue.insert(key, Primitive::new("addps", 2)).unwrap();
        let err = catalogue.insert(key, Primitive::new("vaddps", 2)).unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousPrimitive { .. }));
        assert_eq!(catalogue.len(), 1);
    }

    #[test]
    fn test_parse_catalogue() {
        let text = "\
            # reference subset\n\
            x128 div f32 divps mem\n\
            x128 add f32 addps mem inplace\n\
            \n\
            x128 ldc f32 loadone   # splat constant\n";
        let catalogue = TableCatalogue::parse(text).unwrap();
        assert_eq!(catalogue.len(), 3);

        let add = catalogue
            .lookup(&PrimitiveKey::new(Family::Add, Variant::Float, ElementWidth::W32, Tier::Fixed128))
            .unwrap();
        assert!(add.in_place);
        assert!(add.memory_form);
        assert_eq!(add.symbol, "addps");
    }

    #[test]
    fn test_parse_errors_name_the_line() {
        let err = TableCatalogue::parse("x128 div f32 divps\nx999 add f32 addps\n").unwrap_err();
        assert!(matches!(err, ResolveError::CatalogueParse { line: 2, .. }));

        let err = TableCatalogue::parse("x128 sqrt i32 nope\n").unwrap_err();
        assert!(matches!(err, ResolveError::CatalogueParse { line: 1, .. }));

        let err = TableCatalogue::parse("x128 add f16 addph\n").unwrap_err();
        assert!(matches!(err, ResolveError::CatalogueParse { .. }));

        let err = TableCatalogue::parse("x128 add f32 addps fast\n").unwrap_err();
        assert!(matches!(err, ResolveError::CatalogueParse { .. }));

        let err = TableCatalogue::parse("x128 add f32 addps\nx128 add f32 vaddps\n").unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousPrimitive { .. }));
    }

    #[test]
    fn test_text_round_trip_of_builtin() {
        let builtin = TableCatalogue::builtin();
        let reparsed = TableCatalogue::parse(&builtin.to_text()).unwrap();
        assert_eq!(reparsed.len(), builtin.len());
        for key in builtin.keys() {
            assert_eq!(reparsed.lookup(&key), builtin.lookup(&key));
        }
    }
}
