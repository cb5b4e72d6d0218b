// This module serves as the central hub for vtier's shared vocabulary, providing the building
// blocks every other component speaks: the resolution axes (tier, element width, variant,
// rounding mode, width selector), the fixed family catalogue and generic operations, operand
// descriptors with explicit emit context, the raw build configuration and compatibility levels,
// scratch-slot leasing, the arena-backed resolution session, and the error type. Nothing here
// performs resolution; the normalizer, alias chain and synthesizer build on these types.

//! Core vtier infrastructure.
//!
//! # Key Components
//!
//! ## Axes (`axis`, `family`)
//! - Tier, element width, variant and rounding-mode enums with exhaustive `ALL` tables
//! - The fixed family catalogue and [`GenericOp`] requests
//!
//! ## Requests (`operand`, `config`)
//! - Operand descriptors, explicit [`EmitContext`] and caller aliasing reports
//! - [`BuildConfig`] read from `VTIER_*` variables
//!
//! ## Resources (`scratch`, `session`)
//! - Exclusive scratch-slot leases with move-only spill tokens
//! - Arena-based session using `bumpalo` with symbol interning and statistics

pub mod axis;
pub mod config;
pub mod error;
pub mod family;
pub mod operand;
pub mod scratch;
pub mod session;

pub use axis::{ElementWidth, RoundingMode, Tier, VarLength, Variant, WidthSelector};

pub use config::{BuildConfig, CompatLevel, CompatLevels};

pub use error::{ResolveError, ResolveResult};

pub use family::{CmpPredicate, ConvertTarget, EmulatedFamily, Family, GenericOp};

pub use operand::{
    Aliasing, Constant, EmitContext, GpReg, Mask, Operand, Reg, Request, ScratchSlot,
};

pub use scratch::{ScratchLease, ScratchSlots, Spilled, Staged};

pub use session::{ResolveSession, ResolveStats};
