use super::*;

impl ScalarDType {
    /// Type a kernel widens this element to before doing arithmetic.
    ///
    /// Narrow floats are computed in `Float32`, byte-sized integers in `Float16`.
    /// Everything else is computed in place.
    pub const fn compute_dtype(self) -> Self {
        use ScalarDType::*;
        match self {
            FP8E4M3 | FP8E5M2 | Float16 | BFloat16 => Float32,
            Bool | Int8 | UInt8 => Float16,
            other => other,
        }
    }

    /// Whether arithmetic on this type needs a widened working copy.
    pub const fn is_promoted(self) -> bool {
        self.compute_dtype() as u8 != self as u8
    }

    /// How many input-tile-sized regions one scratch slot must hold.
    ///
    /// A promoted type keeps the raw tile and its widened copy side by side, so the
    /// slot is shared by `1 + compute.bytes() / bytes()` tile-sized regions.
    pub const fn working_buffer_factor(self) -> usize {
        if self.is_promoted() { 1 + self.compute_dtype().bytes() / self.bytes() } else { 1 }
    }
}
