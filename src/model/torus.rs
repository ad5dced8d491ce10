use std::f32::consts::TAU;

use crate::error::{Error, Result};
use crate::utils::{Mesh, Vertex};

/// Largest vertex count for 16-bit indices. `0xFFFF` itself is left unused
/// since WebGL2 and Metal treat it as a primitive restart marker.
pub const MAX_VERTICES: u64 = u16::MAX as u64;

/// Shape of the donut.
///
/// `rings` runs around the tube cross-section (angle θ), `sides` runs around
/// the main axis (angle φ). `tube_radius` should stay below `donut_radius` to
/// avoid self-intersection, but that is not enforced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusParameters {
    pub rings: u32,
    pub sides: u32,
    pub donut_radius: f32,
    pub tube_radius: f32,
}

impl Default for TorusParameters {
    fn default() -> Self {
        Self {
            rings: 16,
            sides: 32,
            donut_radius: 1.75,
            tube_radius: 0.75,
        }
    }
}

impl TorusParameters {
    pub fn validate(&self) -> Result<()> {
        if self.rings < 3 {
            return Err(Error::invalid("rings", format!("need at least 3, got {}", self.rings)));
        }
        if self.sides < 3 {
            return Err(Error::invalid("sides", format!("need at least 3, got {}", self.sides)));
        }
        if !(self.donut_radius.is_finite() && self.donut_radius > 0.0) {
            return Err(Error::invalid("donut_radius", format!("must be positive, got {}", self.donut_radius)));
        }
        if !(self.tube_radius.is_finite() && self.tube_radius > 0.0) {
            return Err(Error::invalid("tube_radius", format!("must be positive, got {}", self.tube_radius)));
        }
        if self.vertex_count() > MAX_VERTICES {
            return Err(Error::invalid(
                "rings",
                format!("{} vertices do not fit 16-bit indices", self.vertex_count()),
            ));
        }
        Ok(())
    }

    /// `(R + 1) * S`: the seam ring is emitted twice so v can run from 0 to 1.
    /// Computed in u64 so any pair of u32 counts fits, whatever the target.
    pub fn vertex_count(&self) -> u64 {
        (self.rings as u64 + 1) * self.sides as u64
    }

    pub fn index_count(&self) -> u64 {
        (6 * self.rings as u64).saturating_mul(self.sides as u64)
    }

    /// Build the interleaved vertex list and the CCW triangle list.
    pub fn generate(&self) -> Result<Mesh> {
        self.validate()?;

        let rings = self.rings as usize;
        let sides = self.sides as usize;

        // both counts are bounded by validate()
        let mut vertices = Vec::with_capacity(self.vertex_count() as usize);
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let (sin_theta, cos_theta) = (v * TAU).sin_cos();
            let offset = self.donut_radius + self.tube_radius * cos_theta;

            for side in 0..sides {
                let u = side as f32 / sides as f32;
                let (sin_phi, cos_phi) = (u * TAU).sin_cos();

                vertices.push(Vertex {
                    pos: [offset * cos_phi, offset * sin_phi, self.tube_radius * sin_theta],
                    uv: [u, v],
                });
            }
        }

        // validate() guarantees every index below fits in u16
        let mut indices = Vec::with_capacity(self.index_count() as usize);
        for ring in 0..rings {
            for side in 0..sides {
                let next_side = (side + 1) % sides;
                let a = (side + ring * sides) as u16;
                let b = (next_side + ring * sides) as u16;
                let c = (side + (ring + 1) * sides) as u16;
                let d = (next_side + (ring + 1) * sides) as u16;

                indices.extend_from_slice(&[a, b, c, c, b, d]);
            }
        }

        tracing::debug!(
            rings,
            sides,
            vertices = vertices.len(),
            triangles = indices.len() / 3,
            "generated torus mesh"
        );

        Ok(Mesh { vertices, indices })
    }
}
