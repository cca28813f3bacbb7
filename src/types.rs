use fixed::types::I32F32;

/// A vertical length in CSS pixels, quantized to 1/1000 px.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Px(I32F32);

impl Px {
    pub const ZERO: Px = Px(I32F32::from_bits(0));
    // 2^20 px; stands in for "no bottom edge" in virtual slot lists.
    pub const UNBOUNDED: Px = Px(I32F32::from_bits(1i64 << 52));

    pub fn from_f32(value: f32) -> Px {
        Px::from_f64(value as f64)
    }

    pub fn from_f64(value: f64) -> Px {
        if !value.is_finite() {
            return Px::ZERO;
        }
        let milli = (value * 1000.0).round();
        let milli = milli.clamp(i64::MIN as f64, i64::MAX as f64) as i64;
        Px::from_milli_i64(milli)
    }

    pub fn from_i32(value: i32) -> Px {
        Px::from_milli_i64((value as i64) * 1000)
    }

    pub fn to_f64(self) -> f64 {
        self.0.to_num()
    }

    pub fn to_milli_i64(self) -> i64 {
        let bits = self.0.to_bits() as i128;
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        let milli = (scaled + adj) / denom;
        milli.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn from_milli_i64(milli: i64) -> Px {
        Px::from_milli_i128(milli as i128)
    }

    fn from_milli_i128(milli: i128) -> Px {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli * denom + adj) / 1000;
        let bits = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Px(I32F32::from_bits(bits))
    }

    pub fn max(self, other: Px) -> Px {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Px) -> Px {
        if self <= other { self } else { other }
    }

    pub fn abs(self) -> Px {
        if self.to_milli_i64() < 0 { -self } else { self }
    }

    pub fn is_positive(self) -> bool {
        self.to_milli_i64() > 0
    }

    /// Converts a rendered length into the unscaled space of a node whose
    /// rendered/unscaled ratio is `scale`.
    pub fn unscale(self, scale: f64) -> Px {
        if scale == 0.0 || !scale.is_finite() {
            return self;
        }
        Px::from_f64(self.to_f64() / scale)
    }

    pub fn scale(self, scale: f64) -> Px {
        if !scale.is_finite() {
            return Px::ZERO;
        }
        Px::from_f64(self.to_f64() * scale)
    }
}

impl std::ops::Add for Px {
    type Output = Px;
    fn add(self, rhs: Px) -> Px {
        Px::from_milli_i128(self.to_milli_i64() as i128 + rhs.to_milli_i64() as i128)
    }
}

impl std::ops::AddAssign for Px {
    fn add_assign(&mut self, rhs: Px) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Px {
    type Output = Px;
    fn sub(self, rhs: Px) -> Px {
        Px::from_milli_i128(self.to_milli_i64() as i128 - rhs.to_milli_i64() as i128)
    }
}

impl std::ops::SubAssign for Px {
    fn sub_assign(&mut self, rhs: Px) {
        *self = *self - rhs;
    }
}

impl std::ops::Div<i32> for Px {
    type Output = Px;
    fn div(self, rhs: i32) -> Px {
        if rhs == 0 {
            Px::ZERO
        } else {
            let milli = self.to_milli_i64() as i128;
            Px::from_milli_i128(div_round_i128(milli, rhs as i128))
        }
    }
}

fn div_round_i128(num: i128, den: i128) -> i128 {
    if den == 0 {
        return 0;
    }
    let den_abs = den.abs();
    if num >= 0 {
        (num + (den_abs / 2)) / den
    } else {
        -(((-num) + (den_abs / 2)) / den)
    }
}

impl std::ops::Neg for Px {
    type Output = Px;
    fn neg(self) -> Px {
        Px::from_milli_i128(-(self.to_milli_i64() as i128))
    }
}

impl std::fmt::Display for Px {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.to_f64())
    }
}

/// Measured vertical extent of a fragment, in unscaled pixels of the
/// virtual stacked coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub top: Px,
    pub bottom: Px,
}

impl Extent {
    pub fn new(top: Px, bottom: Px) -> Self {
        Self {
            top,
            bottom: bottom.max(top),
        }
    }

    pub fn height(self) -> Px {
        self.bottom - self.top
    }

    pub fn union(self, other: Extent) -> Extent {
        Extent {
            top: self.top.min(other.top),
            bottom: self.bottom.max(other.bottom),
        }
    }

    pub fn merge(current: Option<Extent>, other: Option<Extent>) -> Option<Extent> {
        match (current, other) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Padding and border widths on the vertical axis, as computed style values
/// (unscaled).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub padding_top: Px,
    pub padding_bottom: Px,
    pub border_top: Px,
    pub border_bottom: Px,
}

impl Insets {
    pub fn top(&self) -> Px {
        self.padding_top + self.border_top
    }

    pub fn bottom(&self) -> Px {
        self.padding_bottom + self.border_bottom
    }

    pub fn total(&self) -> Px {
        self.top() + self.bottom()
    }
}
