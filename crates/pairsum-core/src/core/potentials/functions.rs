use super::pair::PairPotential;
use super::term::{PairTerms, TailIntegral};
use std::f64::consts::PI;

const OVERLAP_R2: f64 = 1e-12;

/// Lennard-Jones 12-6 in the well-minimum form `D·[(r₀/r)¹² − 2(r₀/r)⁶]`,
/// with its minimum `-D` at `r = r₀`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LennardJones {
    r_min: f64,
    well_depth: f64,
}

impl LennardJones {
    pub fn new(r_min: f64, well_depth: f64) -> Self {
        Self { r_min, well_depth }
    }

    /// Builds the potential from the conventional `4ε[(σ/r)¹² − (σ/r)⁶]` parameters.
    pub fn from_sigma_epsilon(sigma: f64, epsilon: f64) -> Self {
        Self::new(sigma * 2f64.powf(1.0 / 6.0), epsilon)
    }

    pub fn r_min(&self) -> f64 {
        self.r_min
    }

    pub fn well_depth(&self) -> f64 {
        self.well_depth
    }

    #[inline]
    fn rho6(&self, r2: f64) -> f64 {
        let rho2 = self.r_min * self.r_min / r2;
        rho2 * rho2 * rho2
    }
}

impl PairPotential for LennardJones {
    #[inline]
    fn u(&self, r2: f64) -> f64 {
        if r2 < OVERLAP_R2 {
            return f64::INFINITY;
        }
        let rho6 = self.rho6(r2);
        self.well_depth * (rho6 * rho6 - 2.0 * rho6)
    }

    #[inline]
    fn u012(&self, r2: f64) -> PairTerms {
        if r2 < OVERLAP_R2 {
            return PairTerms::overlap();
        }
        let rho6 = self.rho6(r2);
        let rho12 = rho6 * rho6;
        PairTerms {
            u: self.well_depth * (rho12 - 2.0 * rho6),
            du: 12.0 * self.well_depth * (rho6 - rho12),
            d2u: self.well_depth * (156.0 * rho12 - 84.0 * rho6),
        }
    }

    fn tail_integral(&self, cutoff: f64) -> TailIntegral {
        if !cutoff.is_finite() {
            return TailIntegral::default();
        }
        let r0_6 = self.r_min.powi(6);
        let r0_12 = r0_6 * r0_6;
        let a9 = r0_12 / (9.0 * cutoff.powi(9));
        let a3 = r0_6 / (3.0 * cutoff.powi(3));
        TailIntegral {
            energy: 4.0 * PI * self.well_depth * (a9 - 2.0 * a3),
            virial: 48.0 * PI * self.well_depth * (a3 - a9),
        }
    }
}

/// Buckingham exponential-6 in the well-minimum form
/// `D·[6/(γ−6)·exp(γ(1 − r/r₀)) − γ/(γ−6)·(r₀/r)⁶]`.
///
/// The form turns over and diverges to `-∞` at short range. Separations inside the
/// inner turnover radius, where the force changes sign below `r₀`, are reported as
/// overlaps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Buckingham {
    r_min: f64,
    well_depth: f64,
    scale: f64,
    prefactor: f64,
    decay: f64,
    dispersion: f64,
    core_r2: f64,
}

impl Buckingham {
    /// `scale` is the steepness γ and must exceed 6.
    pub fn new(r_min: f64, well_depth: f64, scale: f64) -> Self {
        let prefactor = 6.0 * well_depth / (scale - 6.0) * scale.exp();
        let decay = scale / r_min;
        let dispersion = well_depth * scale / (scale - 6.0) * r_min.powi(6);
        let core = r_min * Self::turnover_fraction(scale);
        Self {
            r_min,
            well_depth,
            scale,
            prefactor,
            decay,
            dispersion,
            core_r2: core * core,
        }
    }

    /// Inner root `x = r/r₀ < 1` of `7·ln x + γ(1 − x) = 0`, the point where `du`
    /// changes sign. For `γ ≤ 7` the only root is `x = 1`.
    fn turnover_fraction(scale: f64) -> f64 {
        let g = |x: f64| 7.0 * x.ln() + scale * (1.0 - x);
        let mut hi = 7.0 / scale;
        if hi >= 1.0 {
            return 1.0;
        }
        let mut lo = 0.5 * hi;
        while g(lo) > 0.0 {
            hi = lo;
            lo *= 0.5;
        }
        for _ in 0..100 {
            let mid = 0.5 * (lo + hi);
            if g(mid) > 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }

    /// Separation below which the pair is treated as overlapping.
    pub fn core_radius(&self) -> f64 {
        self.core_r2.sqrt()
    }

    pub fn r_min(&self) -> f64 {
        self.r_min
    }

    pub fn well_depth(&self) -> f64 {
        self.well_depth
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    fn is_overlap(&self, r2: f64) -> bool {
        r2 < self.core_r2
    }
}

impl PairPotential for Buckingham {
    #[inline]
    fn u(&self, r2: f64) -> f64 {
        if self.is_overlap(r2) {
            return f64::INFINITY;
        }
        let r = r2.sqrt();
        let inv6 = 1.0 / (r2 * r2 * r2);
        self.prefactor * (-self.decay * r).exp() - self.dispersion * inv6
    }

    #[inline]
    fn u012(&self, r2: f64) -> PairTerms {
        if self.is_overlap(r2) {
            return PairTerms::overlap();
        }
        let r = r2.sqrt();
        let inv6 = 1.0 / (r2 * r2 * r2);
        let repulsion = self.prefactor * (-self.decay * r).exp();
        let dispersion = self.dispersion * inv6;
        let br = self.decay * r;
        PairTerms {
            u: repulsion - dispersion,
            du: -br * repulsion + 6.0 * dispersion,
            d2u: br * br * repulsion - 42.0 * dispersion,
        }
    }

    fn tail_integral(&self, cutoff: f64) -> TailIntegral {
        if !cutoff.is_finite() {
            return TailIntegral::default();
        }
        let b = self.decay;
        let rc = cutoff;
        let exp = self.prefactor * (-b * rc).exp();
        let m2 = rc * rc / b + 2.0 * rc / (b * b) + 2.0 / (b * b * b);
        let m3 = rc.powi(3) / b
            + 3.0 * rc * rc / (b * b)
            + 6.0 * rc / (b * b * b)
            + 6.0 / (b * b * b * b);
        let inv3 = 1.0 / rc.powi(3);
        TailIntegral {
            energy: 4.0 * PI * (exp * m2 - self.dispersion * inv3 / 3.0),
            virial: 4.0 * PI * (-b * exp * m3 + 2.0 * self.dispersion * inv3),
        }
    }
}

/// Purely repulsive inverse-power potential `ε·(σ/r)ⁿ`. Its tail integral only
/// converges for `n > 3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftSphere {
    epsilon: f64,
    sigma: f64,
    exponent: f64,
}

impl SoftSphere {
    pub fn new(epsilon: f64, sigma: f64, exponent: f64) -> Self {
        Self {
            epsilon,
            sigma,
            exponent,
        }
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }
}

impl PairPotential for SoftSphere {
    #[inline]
    fn u(&self, r2: f64) -> f64 {
        if r2 < OVERLAP_R2 {
            return f64::INFINITY;
        }
        self.epsilon * (self.sigma * self.sigma / r2).powf(0.5 * self.exponent)
    }

    #[inline]
    fn u012(&self, r2: f64) -> PairTerms {
        if r2 < OVERLAP_R2 {
            return PairTerms::overlap();
        }
        let u = self.u(r2);
        let n = self.exponent;
        PairTerms {
            u,
            du: -n * u,
            d2u: n * (n + 1.0) * u,
        }
    }

    fn tail_integral(&self, cutoff: f64) -> TailIntegral {
        if !cutoff.is_finite() {
            return TailIntegral::default();
        }
        let n = self.exponent;
        if n <= 3.0 {
            return TailIntegral::new(f64::INFINITY, f64::NEG_INFINITY);
        }
        let energy =
            4.0 * PI * self.epsilon * self.sigma.powf(n) * cutoff.powf(3.0 - n) / (n - 3.0);
        TailIntegral {
            energy,
            virial: -n * energy,
        }
    }
}
