// This module is a reference interpreter for resolved sequences over float lanes. It executes a
// PrimitiveSequence on a small lane machine (vector registers, addressed memory and the two
// scratch slots) so that emulated sequences can be checked against their native counterparts
// without a code generator. Every lane value is held as f64 and rounded to the storage width
// after each primitive. Hardware estimates are modelled with a fixed relative error (12 bits of
// precision for 32-bit lanes, 14 for 64-bit lanes); the refinement steps follow the usual
// Newton-Raphson forms, with the step value pinned when an infinity meets a zero so that
// reciprocals of zero and infinity come out exact. Integer lanes, compares, conversions,
// masks and static rounding overrides are outside the model and report Unsupported.

//! Reference interpreter for float primitive sequences.

use crate::core::{
    Constant, ElementWidth, Family, Operand, Reg, RoundingMode, ScratchSlot, Variant,
};
use crate::sequence::{PrimitiveCall, PrimitiveSequence};
use hashbrown::HashMap;
use thiserror::Error;

/// Bits of precision of the reciprocal and reciprocal-sqrt estimates.
pub const fn estimate_bits(element: ElementWidth) -> i32 {
    match element {
        ElementWidth::W64 => 14,
        _ => 12,
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("read of undefined operand {0}")]
    Undefined(String),

    #[error("operand {0} is not writable")]
    NotWritable(String),

    #[error("no reference semantics for {0}")]
    Unsupported(String),
}

pub type VerifyResult<T> = Result<T, VerifyError>;

/// Lane machine executing primitive sequences.
#[derive(Debug, Clone)]
pub struct LaneMachine {
    lanes: usize,
    regs: HashMap<Reg, Vec<f64>>,
    memory: HashMap<(u8, i32), Vec<f64>>,
    scratch: [Option<Vec<f64>>; 2],
}

impl LaneMachine {
    pub fn new(lanes: usize) -> Self {
        Self {
            lanes,
            regs: HashMap::new(),
            memory: HashMap::new(),
            scratch: [None, None],
        }
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn set_reg(&mut self, reg: u8, values: &[f64]) {
        self.regs.insert(Reg(reg), self.fit(values));
    }

    /// Broadcast one value to every lane of `reg`.
    pub fn splat(&mut self, reg: u8, value: f64) {
        self.regs.insert(Reg(reg), vec![value; self.lanes]);
    }

    pub fn reg(&self, reg: u8) -> Option<&[f64]> {
        self.regs.get(&Reg(reg)).map(Vec::as_slice)
    }

    pub fn set_mem(&mut self, base: u8, disp: i32, values: &[f64]) {
        self.memory.insert((base, disp), self.fit(values));
    }

    pub fn mem(&self, base: u8, disp: i32) -> Option<&[f64]> {
        self.memory.get(&(base, disp)).map(Vec::as_slice)
    }

    pub fn scratch(&self, slot: ScratchSlot) -> Option<&[f64]> {
        self.scratch[slot.index()].as_deref()
    }

    /// Fill both scratch slots with `value`, as left behind by an unrelated sequence.
    pub fn poison_scratch(&mut self, value: f64) {
        self.scratch = [Some(vec![value; self.lanes]), Some(vec![value; self.lanes])];
    }

    fn fit(&self, values: &[f64]) -> Vec<f64> {
        (0..self.lanes)
            .map(|i| values.get(i).or(values.last()).copied().unwrap_or(0.0))
            .collect()
    }

    fn read(&self, operand: &Operand) -> VerifyResult<Vec<f64>> {
        let value = match operand {
            Operand::Reg(reg) => self.regs.get(reg).cloned(),
            Operand::Mem { base, disp } => self.memory.get(&(base.0, *disp)).cloned(),
            Operand::Scratch(slot) => self.scratch[slot.index()].clone(),
            Operand::Const(Constant::One) => Some(vec![1.0; self.lanes]),
        };
        value.ok_or_else(|| VerifyError::Undefined(operand.to_string()))
    }

    fn write(&mut self, operand: &Operand, value: Vec<f64>) -> VerifyResult<()> {
        match operand {
            Operand::Reg(reg) => {
                self.regs.insert(*reg, value);
            }
            Operand::Mem { base, disp } => {
                self.memory.insert((base.0, *disp), value);
            }
            Operand::Scratch(slot) => self.scratch[slot.index()] = Some(value),
            Operand::Const(_) => return Err(VerifyError::NotWritable(operand.to_string())),
        }
        Ok(())
    }

    /// Execute every call of `sequence` in order.
    pub fn run(&mut self, sequence: &PrimitiveSequence<'_>) -> VerifyResult<()> {
        for call in sequence.calls() {
            self.exec(call)?;
        }
        Ok(())
    }

    fn exec(&mut self, call: &PrimitiveCall<'_>) -> VerifyResult<()> {
        use Family::*;

        let key = call.key;
        if key.variant != Variant::Float
            || call.ctx.mask.is_some()
            || call.ctx.rounding != RoundingMode::NearestEven
        {
            return Err(VerifyError::Unsupported(call.to_string()));
        }

        let srcs = call
            .srcs
            .iter()
            .map(|src| self.read(src))
            .collect::<VerifyResult<Vec<_>>>()?;
        let bits = estimate_bits(key.element);

        let result = match key.family {
            Move | Load | Store | LoadConstant => srcs[0].clone(),
            Add => zip2(&srcs, |a, b| a + b),
            Sub => zip2(&srcs, |a, b| a - b),
            Mul => zip2(&srcs, |a, b| a * b),
            Div => zip2(&srcs, |a, b| a / b),
            Min => zip2(&srcs, f64::min),
            Max => zip2(&srcs, f64::max),
            Sqrt => map1(&srcs, f64::sqrt),
            RecipEstimate => map1(&srcs, |a| recip_estimate(a, bits)),
            RecipRefine => zip2(&srcs, recip_step),
            RsqrtEstimate => map1(&srcs, |a| rsqrt_estimate(a, bits)),
            RsqrtRefine => zip2(&srcs, rsqrt_step),
            Reciprocal => map1(&srcs, |a| recip_step(recip_estimate(a, bits), a)),
            RecipSqrt => map1(&srcs, |a| rsqrt_step(rsqrt_estimate(a, bits), a)),
            FusedMulAdd => zip3(&srcs, |a, b, c| a.mul_add(b, c)),
            FusedMulSub => zip3(&srcs, |a, b, c| a.mul_add(b, -c)),
            HorizontalSum => {
                let mut out = vec![f64::NAN; srcs[0].len()];
                if let Some(first) = out.first_mut() {
                    *first = srcs[0].iter().sum();
                }
                out
            }
            HorizontalPairwise => {
                let (a, b) = (&srcs[0], &srcs[1]);
                a.chunks(2)
                    .chain(b.chunks(2))
                    .map(|pair| pair.iter().sum::<f64>())
                    .collect()
            }
            And | Or | Xor | Not | AndNot | Compare(_) | Convert(..) | ShiftLeft | ShiftRight => {
                return Err(VerifyError::Unsupported(call.to_string()))
            }
        };

        let rounded = result.into_iter().map(|x| round_to(x, key.element)).collect();
        self.write(&call.dst, rounded)
    }
}

fn round_to(x: f64, element: ElementWidth) -> f64 {
    match element {
        ElementWidth::W64 => x,
        _ => x as f32 as f64,
    }
}

fn map1(srcs: &[Vec<f64>], f: impl Fn(f64) -> f64) -> Vec<f64> {
    srcs[0].iter().map(|&a| f(a)).collect()
}

fn zip2(srcs: &[Vec<f64>], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    srcs[0].iter().zip(&srcs[1]).map(|(&a, &b)| f(a, b)).collect()
}

fn zip3(srcs: &[Vec<f64>], f: impl Fn(f64, f64, f64) -> f64) -> Vec<f64> {
    srcs[0]
        .iter()
        .zip(&srcs[1])
        .zip(&srcs[2])
        .map(|((&a, &b), &c)| f(a, b, c))
        .collect()
}

fn recip_estimate(a: f64, bits: i32) -> f64 {
    (1.0 / a) * (1.0 - 2f64.powi(-bits))
}

fn rsqrt_estimate(a: f64, bits: i32) -> f64 {
    (1.0 / a.sqrt()) * (1.0 - 2f64.powi(-bits))
}

/// One Newton-Raphson step for `1/a` from estimate `x`.
fn recip_step(x: f64, a: f64) -> f64 {
    let step = if (a.is_infinite() && x == 0.0) || (a == 0.0 && x.is_infinite()) {
        2.0
    } else {
        2.0 - a * x
    };
    x * step
}

/// One Newton-Raphson step for `1/sqrt(a)` from estimate `x`.
fn rsqrt_step(x: f64, a: f64) -> f64 {
    let step = if (a.is_infinite() && x == 0.0) || (a == 0.0 && x.is_infinite()) {
        1.5
    } else {
        1.5 - 0.5 * a * x * x
    };
    x * step
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refinement_step_converges() {
        let a = 3.0;
        let x0 = recip_estimate(a, 12);
        let x1 = recip_step(x0, a);
        assert!((x1 - 1.0 / a).abs() < (x0 - 1.0 / a).abs());

        let y0 = rsqrt_estimate(a, 12);
        let y1 = rsqrt_step(y0, a);
        let exact = 1.0 / a.sqrt();
        assert!((y1 - exact).abs() < (y0 - exact).abs());
    }

    #[test]
    fn test_special_values_refine_exactly() {
        assert_eq!(recip_step(recip_estimate(f64::INFINITY, 12), f64::INFINITY), 0.0);
        assert_eq!(recip_step(recip_estimate(0.0, 12), 0.0), f64::INFINITY);
        assert_eq!(rsqrt_step(rsqrt_estimate(0.0, 12), 0.0), f64::INFINITY);
        assert!(recip_step(recip_estimate(f64::NAN, 12), f64::NAN).is_nan());
    }

    #[test]
    fn test_storage_rounding() {
        let third = 1.0 / 3.0;
        assert_eq!(round_to(third, ElementWidth::W64), third);
        assert_ne!(round_to(third, ElementWidth::W32), third);
    }

    #[test]
    fn test_fit_broadcasts_last_value() {
        let mut machine = LaneMachine::new(4);
        machine.set_reg(1, &[1.0, 2.0]);
        assert_eq!(machine.reg(1).unwrap(), &[1.0, 2.0, 2.0, 2.0]);
    }
}
