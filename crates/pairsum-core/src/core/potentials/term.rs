use std::ops::{Add, AddAssign, Mul};

/// Energy and its first two radial derivatives for a single pair, evaluated together
/// so the squared separation is only computed once.
///
/// * `u`: pair energy
/// * `du`: `r·dU/dr`, the pair's virial contribution
/// * `d2u`: `r²·d²U/dr²`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairTerms {
    pub u: f64,
    pub du: f64,
    pub d2u: f64,
}

impl PairTerms {
    pub fn new(u: f64, du: f64, d2u: f64) -> Self {
        Self { u, du, d2u }
    }

    /// Terms of a pair that does not interact.
    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }

    /// Terms of an overlapping pair: infinitely repulsive.
    #[inline]
    pub fn overlap() -> Self {
        Self {
            u: f64::INFINITY,
            du: f64::NEG_INFINITY,
            d2u: f64::INFINITY,
        }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.u.is_finite() && self.du.is_finite() && self.d2u.is_finite()
    }
}

impl Add for PairTerms {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            u: self.u + rhs.u,
            du: self.du + rhs.du,
            d2u: self.d2u + rhs.d2u,
        }
    }
}

impl AddAssign for PairTerms {
    fn add_assign(&mut self, rhs: Self) {
        self.u += rhs.u;
        self.du += rhs.du;
        self.d2u += rhs.d2u;
    }
}

impl Mul<f64> for PairTerms {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            u: self.u * rhs,
            du: self.du * rhs,
            d2u: self.d2u * rhs,
        }
    }
}

/// Long-range integrals of a pair potential beyond a cutoff, per unit pair density:
/// `∫ 4πr² U(r) dr` and `∫ 4πr² r·dU/dr dr` from the cutoff to infinity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TailIntegral {
    pub energy: f64,
    pub virial: f64,
}

impl TailIntegral {
    pub fn new(energy: f64, virial: f64) -> Self {
        Self { energy, virial }
    }
}

impl Add for TailIntegral {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            energy: self.energy + rhs.energy,
            virial: self.virial + rhs.virial,
        }
    }
}

impl AddAssign for TailIntegral {
    fn add_assign(&mut self, rhs: Self) {
        self.energy += rhs.energy;
        self.virial += rhs.virial;
    }
}

impl Mul<f64> for TailIntegral {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            energy: self.energy * rhs,
            virial: self.virial * rhs,
        }
    }
}
