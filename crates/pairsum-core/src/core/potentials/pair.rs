use super::term::{PairTerms, TailIntegral};
use std::fmt::Debug;
use std::sync::Arc;

/// A spherically symmetric pair potential, evaluated from the squared separation.
///
/// This is the only interface the compute engine uses to reach a functional form.
/// Implementations must be symmetric in their two atoms and must return exactly zero
/// beyond [`PairPotential::range`].
pub trait PairPotential: Debug + Send + Sync {
    /// Pair energy at squared separation `r2`.
    fn u(&self, r2: f64) -> f64;

    /// Energy, `r·dU/dr` and `r²·d²U/dr²` at squared separation `r2`.
    fn u012(&self, r2: f64) -> PairTerms;

    /// Distance beyond which the potential is zero. Infinite for untruncated forms.
    fn range(&self) -> f64 {
        f64::INFINITY
    }

    /// Analytic integrals of the potential from `cutoff` to infinity, used for the
    /// mean-field tail correction. Forms without a closed expression report zero.
    fn tail_integral(&self, cutoff: f64) -> TailIntegral {
        let _ = cutoff;
        TailIntegral::default()
    }
}

impl<P: PairPotential + ?Sized> PairPotential for Arc<P> {
    #[inline]
    fn u(&self, r2: f64) -> f64 {
        (**self).u(r2)
    }

    #[inline]
    fn u012(&self, r2: f64) -> PairTerms {
        (**self).u012(r2)
    }

    fn range(&self) -> f64 {
        (**self).range()
    }

    fn tail_integral(&self, cutoff: f64) -> TailIntegral {
        (**self).tail_integral(cutoff)
    }
}
