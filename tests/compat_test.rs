//! Compatibility contract tests.
//!
//! The registry is queried by upstream passes deciding whether a value may
//! cross a tier boundary, so these pin down the documented memory-layout
//! contract for every tier pair.

use vtier::compat::{compatible, lane_effect, Contract, ContractTable, LaneEffect};
use vtier::core::{Family, Tier, VarLength};

const V512: Tier = Tier::Var(VarLength::Bits512);
const V1024: Tier = Tier::Var(VarLength::Bits1024);

#[test]
fn test_128_is_universally_compatible() {
    assert_eq!(compatible(Tier::Fixed128, Tier::Fixed256), Contract::Safe);
    assert_eq!(compatible(Tier::Fixed128, V512), Contract::Safe);
    assert_eq!(compatible(V512, Tier::Fixed128), Contract::Safe);
    for tier in Tier::ALL.into_iter().filter(|t| t.is_vector()) {
        assert_eq!(compatible(Tier::Fixed128, tier), Contract::Safe);
        assert_eq!(compatible(tier, Tier::Fixed128), Contract::Safe);
    }
}

#[test]
fn test_256_against_variable_length_needs_reencode() {
    assert_eq!(compatible(Tier::Fixed256, V512), Contract::UnsafeReencode);
    assert_eq!(compatible(V1024, Tier::Fixed256), Contract::UnsafeReencode);
    assert_eq!(compatible(Tier::Fixed256, Tier::Scalable), Contract::UnsafeReencode);
}

#[test]
fn test_scalar_write_defines_first_lane_only() {
    for read in Tier::ALL.into_iter().filter(|t| t.is_vector()) {
        assert_eq!(compatible(Tier::Scalar, read), Contract::UnsafeUpperLanes);
    }
    assert_eq!(compatible(Tier::Scalar, Tier::Scalar), Contract::Safe);
    assert_eq!(lane_effect(Family::Add, Tier::Scalar), LaneEffect::FirstLaneOnly);
}

#[test]
fn test_asymmetry_only_from_scalar() {
    for write in Tier::ALL {
        for read in Tier::ALL {
            let forward = compatible(write, read);
            let backward = compatible(read, write);
            if write != Tier::Scalar && read != Tier::Scalar {
                assert_eq!(forward, backward, "{write} vs {read}");
            }
        }
    }
}

#[test]
fn test_horizontal_sum_leaves_upper_lanes() {
    for tier in Tier::ALL {
        assert_eq!(
            lane_effect(Family::HorizontalSum, tier),
            LaneEffect::FirstLaneOnly
        );
    }
    assert_eq!(lane_effect(Family::HorizontalPairwise, V512), LaneEffect::AllLanes);
}

#[test]
fn test_table_render() {
    let table = ContractTable::build();
    assert_eq!(table.get(Tier::Fixed128, V512), Some(Contract::Safe));
    assert_eq!(table.get(Tier::Scalar, V512), Some(Contract::UnsafeUpperLanes));

    let rendered = table.to_string();
    let header = rendered.lines().next().unwrap();
    assert!(header.contains("x128"));
    assert!(header.contains("sve"));
}
