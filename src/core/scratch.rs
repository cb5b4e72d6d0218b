//! Scratch slot leasing.
//!
//! The caller reserves two fixed-size memory regions per build. A synthesized
//! sequence leases them through an exclusive borrow, so two expansions can never
//! interleave their use of a slot. Values placed in a slot are represented by
//! move-only tokens: a [`Spilled`] register must be reloaded, a [`Staged`] value
//! must be consumed as a memory operand. Dropping a lease with a token still
//! outstanding is a discipline error reported by [`ScratchLease::finish`].

use super::axis::Tier;
use super::error::{ResolveError, ResolveResult};
use super::operand::{Operand, Reg, ScratchSlot};

/// The caller's pair of reserved spill regions.
#[derive(Debug)]
pub struct ScratchSlots {
    /// Size of each slot in bytes.
    slot_bytes: usize,
    /// Sequences that have leased the slots so far.
    leases: usize,
}

impl ScratchSlots {
    pub fn new(slot_bytes: usize) -> Self {
        Self {
            slot_bytes,
            leases: 0,
        }
    }

    /// Slots large enough for one register of the given tier.
    pub fn for_tier(tier: Tier) -> Self {
        Self::new((tier.max_bits() / 8) as usize)
    }

    pub fn slot_bytes(&self) -> usize {
        self.slot_bytes
    }

    pub fn leases(&self) -> usize {
        self.leases
    }

    /// Lease both slots for the duration of one synthesized sequence.
    pub fn lease(&mut self) -> ScratchLease<'_> {
        self.leases += 1;
        ScratchLease {
            slots: self,
            occupied: [false; 2],
            staged_total: 0,
        }
    }
}

/// A register value parked in a scratch slot; must be handed back to [`ScratchLease::reload`].
#[must_use = "a spilled register must be reloaded"]
#[derive(Debug)]
pub struct Spilled {
    slot: ScratchSlot,
    reg: Reg,
}

impl Spilled {
    pub fn slot(&self) -> ScratchSlot {
        self.slot
    }

    pub fn reg(&self) -> Reg {
        self.reg
    }
}

/// A value written to a scratch slot to be read back as a memory operand.
#[must_use = "a staged value must be consumed"]
#[derive(Debug)]
pub struct Staged {
    slot: ScratchSlot,
}

impl Staged {
    pub fn slot(&self) -> ScratchSlot {
        self.slot
    }
}

/// Exclusive use of both scratch slots for one sequence.
#[derive(Debug)]
pub struct ScratchLease<'s> {
    slots: &'s mut ScratchSlots,
    occupied: [bool; 2],
    staged_total: usize,
}

impl<'s> ScratchLease<'s> {
    pub fn slot_bytes(&self) -> usize {
        self.slots.slot_bytes
    }

    fn occupy(&mut self, slot: ScratchSlot) -> ResolveResult<()> {
        if self.occupied[slot.index()] {
            return Err(ResolveError::ScratchInUse {
                slot: slot.to_string(),
            });
        }
        self.occupied[slot.index()] = true;
        self.staged_total += 1;
        Ok(())
    }

    /// Park `reg` in `slot`; the token must be reloaded before the lease ends.
    pub fn spill(&mut self, slot: ScratchSlot, reg: Reg) -> ResolveResult<Spilled> {
        self.occupy(slot)?;
        Ok(Spilled { slot, reg })
    }

    /// Restore a spilled register, releasing its slot.
    pub fn reload(&mut self, spilled: Spilled) -> (Operand, Operand) {
        self.occupied[spilled.slot.index()] = false;
        (Operand::Reg(spilled.reg), Operand::Scratch(spilled.slot))
    }

    /// Reserve `slot` for a value that will be read back as a memory operand.
    pub fn stage(&mut self, slot: ScratchSlot) -> ResolveResult<Staged> {
        self.occupy(slot)?;
        Ok(Staged { slot })
    }

    /// Consume a staged value, yielding the memory operand that reads it.
    pub fn consume(&mut self, staged: Staged) -> Operand {
        self.occupied[staged.slot.index()] = false;
        Operand::Scratch(staged.slot)
    }

    /// Number of values that went through a slot during this lease.
    pub fn staged_total(&self) -> usize {
        self.staged_total
    }

    /// End the lease, failing if any slot still holds an outstanding value.
    pub fn finish(self) -> ResolveResult<usize> {
        if let Some(slot) = ScratchSlot::ALL
            .iter()
            .find(|slot| self.occupied[slot.index()])
        {
            return Err(ResolveError::ScratchDiscipline {
                reason: format!("{slot} still occupied at end of sequence"),
            });
        }
        Ok(self.staged_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_sizing() {
        assert_eq!(ScratchSlots::for_tier(Tier::Fixed128).slot_bytes(), 16);
        assert_eq!(ScratchSlots::for_tier(Tier::Scalable).slot_bytes(), 256);
        assert_eq!(ScratchSlots::for_tier(Tier::Scalar).slot_bytes(), 8);
    }

    #[test]
    fn test_spill_and_reload() {
        let mut slots = ScratchSlots::new(32);
        let mut lease = slots.lease();

        let spilled = lease.spill(ScratchSlot::First, Reg(4)).unwrap();
        assert_eq!(spilled.slot(), ScratchSlot::First);

        let (dst, src) = lease.reload(spilled);
        assert_eq!(dst, Operand::Reg(Reg(4)));
        assert_eq!(src, Operand::Scratch(ScratchSlot::First));
        assert_eq!(lease.finish().unwrap(), 1);
        assert_eq!(slots.leases(), 1);
    }

    #[test]
    fn test_double_occupation_is_rejected() {
        let mut slots = ScratchSlots::new(32);
        let mut lease = slots.lease();

        let staged = lease.stage(ScratchSlot::Second).unwrap();
        let err = lease.spill(ScratchSlot::Second, Reg(0)).unwrap_err();
        assert!(matches!(err, ResolveError::ScratchInUse { .. }));

        let operand = lease.consume(staged);
        assert_eq!(operand, Operand::Scratch(ScratchSlot::Second));
        assert!(lease.finish().is_ok());
    }

    #[test]
    fn test_outstanding_value_fails_finish() {
        let mut slots = ScratchSlots::new(32);
        let mut lease = slots.lease();

        let _leaked = lease.stage(ScratchSlot::First).unwrap();
        assert!(matches!(
            lease.finish(),
            Err(ResolveError::ScratchDiscipline { .. })
        ));
    }
}
