// This module is the compatibility contract registry: documentation-as-data describing whether
// a value written under one tier can be consumed under another without re-encoding, and which
// operations leave lanes outside their result undefined. It is consulted by callers deciding
// whether a value may cross a tier boundary; the resolver itself never queries it. The 128-bit
// tier is memory-compatible with every wider tier in both directions, the fixed 256-bit tier
// and the variable-length tiers (all wider than 256 bits) disagree on memory layout, and a
// scalar write only defines the first lane of a later vector read.

//! Compatibility contract registry.

use crate::core::{Family, Tier};
use std::fmt;

/// Contract for consuming data written under one tier from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contract {
    Safe,
    /// Only the first lane is defined on the reading side.
    UnsafeUpperLanes,
    /// The layouts disagree; the value must be re-encoded.
    UnsafeReencode,
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Contract::Safe => "safe",
            Contract::UnsafeUpperLanes => "unsafe-upper-lanes",
            Contract::UnsafeReencode => "unsafe-reencode",
        };
        f.write_str(text)
    }
}

/// Which lanes of the destination an operation defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneEffect {
    AllLanes,
    /// Every lane but the first is undefined afterwards.
    FirstLaneOnly,
}

/// Can data written under `write` be read under `read` without re-encoding?
pub fn compatible(write: Tier, read: Tier) -> Contract {
    use Tier::*;

    if write == read {
        return Contract::Safe;
    }

    match (write, read) {
        (Scalar, _) => Contract::UnsafeUpperLanes,
        (_, Scalar) => Contract::Safe,
        (Fixed128, _) | (_, Fixed128) => Contract::Safe,
        // 256 against anything wider, and distinct variable/scalable layouts
        (Fixed256, Var(_) | Scalable)
        | (Var(_) | Scalable, Fixed256)
        | (Var(_), Var(_))
        | (Var(_), Scalable)
        | (Scalable, Var(_)) => Contract::UnsafeReencode,
        (Fixed256, Fixed256) | (Scalable, Scalable) => Contract::Safe,
    }
}

/// Lanes an operation of `family` defines on `tier`.
pub fn lane_effect(family: Family, tier: Tier) -> LaneEffect {
    match (family, tier) {
        (_, Tier::Scalar) => LaneEffect::FirstLaneOnly,
        (Family::HorizontalSum, _) => LaneEffect::FirstLaneOnly,
        _ => LaneEffect::AllLanes,
    }
}

/// The full write/read matrix over every tier.
#[derive(Debug, Clone)]
pub struct ContractTable {
    rows: Vec<(Tier, Vec<Contract>)>,
}

impl ContractTable {
    pub fn build() -> Self {
        let rows = Tier::ALL
            .iter()
            .map(|&write| {
                let row = Tier::ALL.iter().map(|&read| compatible(write, read)).collect();
                (write, row)
            })
            .collect();
        Self { rows }
    }

    pub fn get(&self, write: Tier, read: Tier) -> Option<Contract> {
        let column = Tier::ALL.iter().position(|&t| t == read)?;
        self.rows
            .iter()
            .find(|(t, _)| *t == write)
            .map(|(_, row)| row[column])
    }
}

impl fmt::Display for ContractTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "w \\ r")?;
        for tier in Tier::ALL {
            write!(f, " {:>8}", tier.mnemonic())?;
        }
        writeln!(f)?;

        for (write, row) in &self.rows {
            write!(f, "{:>8}", write.mnemonic())?;
            for contract in row {
                let mark = match contract {
                    Contract::Safe => "ok",
                    Contract::UnsafeUpperLanes => "lane0",
                    Contract::UnsafeReencode => "reenc",
                };
                write!(f, " {:>8}", mark)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::VarLength;

    #[test]
    fn test_identity_is_safe() {
        for tier in Tier::ALL {
            assert_eq!(compatible(tier, tier), Contract::Safe);
        }
    }

    #[test]
    fn test_scalar_write_leaves_upper_lanes() {
        assert_eq!(
            compatible(Tier::Scalar, Tier::Fixed256),
            Contract::UnsafeUpperLanes
        );
        assert_eq!(compatible(Tier::Fixed256, Tier::Scalar), Contract::Safe);
    }

    #[test]
    fn test_var_lengths_disagree() {
        assert_eq!(
            compatible(Tier::Var(VarLength::Bits512), Tier::Var(VarLength::Bits2048)),
            Contract::UnsafeReencode
        );
        assert_eq!(
            compatible(Tier::Scalable, Tier::Var(VarLength::Bits512)),
            Contract::UnsafeReencode
        );
    }

    #[test]
    fn test_lane_effects() {
        assert_eq!(lane_effect(Family::Add, Tier::Scalar), LaneEffect::FirstLaneOnly);
        assert_eq!(lane_effect(Family::Add, Tier::Fixed128), LaneEffect::AllLanes);
        assert_eq!(
            lane_effect(Family::HorizontalSum, Tier::Scalable),
            LaneEffect::FirstLaneOnly
        );
    }

    #[test]
    fn test_table_matches_queries() {
        let table = ContractTable::build();
        for write in Tier::ALL {
            for read in Tier::ALL {
                assert_eq!(table.get(write, read), Some(compatible(write, read)));
            }
        }
        let rendered = table.to_string();
        assert!(rendered.contains("reenc"));
        assert_eq!(rendered.lines().count(), Tier::ALL.len() + 1);
    }
}
