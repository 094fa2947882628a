//! Operand and result element types supported by the GEMM strategies.

use crate::config::DataType;
use half::f16;
use std::fmt::Debug;

pub trait Operand: Copy + Send + Sync + Debug + 'static {
    const DATA_TYPE: DataType;
}

/// Result type produced from operands of type `To`.
pub trait Accumulator<To: Operand>: Copy + Send + Sync + Debug + Default + 'static {
    const DATA_TYPE: DataType;

    /// `self + a * b`, widening the operands where the result type is wider.
    fn mul_add(self, a: To, b: To) -> Self;
}

impl Operand for f32 {
    const DATA_TYPE: DataType = DataType::F32;
}

impl Operand for f16 {
    const DATA_TYPE: DataType = DataType::F16;
}

impl Operand for i8 {
    const DATA_TYPE: DataType = DataType::S8;
}

impl Operand for u8 {
    const DATA_TYPE: DataType = DataType::U8;
}

impl Accumulator<f32> for f32 {
    const DATA_TYPE: DataType = DataType::F32;

    #[inline]
    fn mul_add(self, a: f32, b: f32) -> Self {
        self + a * b
    }
}

impl Accumulator<f16> for f16 {
    const DATA_TYPE: DataType = DataType::F16;

    #[inline]
    fn mul_add(self, a: f16, b: f16) -> Self {
        f16::from_f32(self.to_f32() + a.to_f32() * b.to_f32())
    }
}

impl Accumulator<i8> for i32 {
    const DATA_TYPE: DataType = DataType::S32;

    #[inline]
    fn mul_add(self, a: i8, b: i8) -> Self {
        self.wrapping_add(i32::from(a) * i32::from(b))
    }
}

impl Accumulator<u8> for u32 {
    const DATA_TYPE: DataType = DataType::U32;

    #[inline]
    fn mul_add(self, a: u8, b: u8) -> Self {
        self.wrapping_add(u32::from(a) * u32::from(b))
    }
}
