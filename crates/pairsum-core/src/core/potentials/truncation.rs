use super::pair::PairPotential;
use super::term::{PairTerms, TailIntegral};

/// Hard cutoff: the wrapped potential is used unchanged below `cutoff` and is
/// exactly zero at and beyond it.
#[derive(Debug, Clone)]
pub struct Truncated<P> {
    inner: P,
    cutoff: f64,
    cutoff2: f64,
}

impl<P: PairPotential> Truncated<P> {
    pub fn new(inner: P, cutoff: f64) -> Self {
        Self {
            inner,
            cutoff,
            cutoff2: cutoff * cutoff,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: PairPotential> PairPotential for Truncated<P> {
    #[inline]
    fn u(&self, r2: f64) -> f64 {
        if r2 >= self.cutoff2 {
            0.0
        } else {
            self.inner.u(r2)
        }
    }

    #[inline]
    fn u012(&self, r2: f64) -> PairTerms {
        if r2 >= self.cutoff2 {
            PairTerms::zero()
        } else {
            self.inner.u012(r2)
        }
    }

    fn range(&self) -> f64 {
        self.cutoff
    }

    fn tail_integral(&self, cutoff: f64) -> TailIntegral {
        self.inner.tail_integral(cutoff)
    }
}

/// Cutoff with the energy shifted by `U(rc)` so that it goes continuously to zero.
/// Derivatives are those of the unshifted potential.
#[derive(Debug, Clone)]
pub struct TruncatedShifted<P> {
    inner: P,
    cutoff: f64,
    cutoff2: f64,
    shift: f64,
}

impl<P: PairPotential> TruncatedShifted<P> {
    pub fn new(inner: P, cutoff: f64) -> Self {
        let cutoff2 = cutoff * cutoff;
        let shift = inner.u(cutoff2);
        Self {
            inner,
            cutoff,
            cutoff2,
            shift,
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn shift(&self) -> f64 {
        self.shift
    }
}

impl<P: PairPotential> PairPotential for TruncatedShifted<P> {
    #[inline]
    fn u(&self, r2: f64) -> f64 {
        if r2 >= self.cutoff2 {
            0.0
        } else {
            self.inner.u(r2) - self.shift
        }
    }

    #[inline]
    fn u012(&self, r2: f64) -> PairTerms {
        if r2 >= self.cutoff2 {
            return PairTerms::zero();
        }
        let mut terms = self.inner.u012(r2);
        terms.u -= self.shift;
        terms
    }

    fn range(&self) -> f64 {
        self.cutoff
    }

    fn tail_integral(&self, cutoff: f64) -> TailIntegral {
        self.inner.tail_integral(cutoff)
    }
}
