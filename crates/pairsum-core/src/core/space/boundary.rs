use nalgebra::{Point3, Vector3};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BoundaryError {
    #[error("Box dimension along axis {axis} must be positive and finite, got {value}")]
    NonPositiveDimension { axis: usize, value: f64 },
}

/// Geometry of the simulation cell as seen by the compute engine.
///
/// Implementations own the periodicity rules; the engine only ever asks for
/// minimum-image displacements, the cell volume and its edge lengths.
pub trait Boundary: Debug + Send + Sync {
    /// Replaces `dr` with its minimum-image equivalent.
    fn nearest_image(&self, dr: &mut Vector3<f64>);

    fn volume(&self) -> f64;

    fn dimensions(&self) -> Vector3<f64>;

    /// Maps a position back into the primary cell.
    fn wrap(&self, position: &mut Point3<f64>);

    /// Smallest edge length of the cell.
    fn min_dimension(&self) -> f64 {
        let d = self.dimensions();
        d.x.min(d.y).min(d.z)
    }
}

/// Rectangular cell centred on the origin, spanning `[-L/2, L/2)` along each axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicBox {
    dimensions: Vector3<f64>,
    periodic: [bool; 3],
}

impl PeriodicBox {
    pub fn new(dimensions: Vector3<f64>) -> Result<Self, BoundaryError> {
        for axis in 0..3 {
            let value = dimensions[axis];
            if !(value.is_finite() && value > 0.0) {
                return Err(BoundaryError::NonPositiveDimension { axis, value });
            }
        }
        Ok(Self {
            dimensions,
            periodic: [true; 3],
        })
    }

    pub fn cubic(edge: f64) -> Result<Self, BoundaryError> {
        Self::new(Vector3::new(edge, edge, edge))
    }

    /// Turns periodicity off along selected axes (e.g. a slit pore).
    pub fn with_periodicity(mut self, periodic: [bool; 3]) -> Self {
        self.periodic = periodic;
        self
    }

    pub fn periodicity(&self) -> [bool; 3] {
        self.periodic
    }
}

impl Boundary for PeriodicBox {
    #[inline]
    fn nearest_image(&self, dr: &mut Vector3<f64>) {
        for axis in 0..3 {
            if self.periodic[axis] {
                let edge = self.dimensions[axis];
                dr[axis] -= edge * (dr[axis] / edge).round();
            }
        }
    }

    fn volume(&self) -> f64 {
        self.dimensions.x * self.dimensions.y * self.dimensions.z
    }

    fn dimensions(&self) -> Vector3<f64> {
        self.dimensions
    }

    fn wrap(&self, position: &mut Point3<f64>) {
        for axis in 0..3 {
            if self.periodic[axis] {
                let edge = self.dimensions[axis];
                position[axis] -= edge * (position[axis] / edge).round();
            }
        }
    }
}
