//! Triangulated body surfaces.
//!
//! A [`Shape`] is authored in the body's [`BodyOrigin`] frame. Besides being
//! handed to renderers, a closed shape determines the body's mass moments
//! for a given material density.

use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::frame::BodyOrigin;
use crate::mass::{MassMoments, MassMomentsAtArm};
use crate::space::{RotationQuaternion, SpaceMatrix, SpaceVector};
use crate::{Result, SimError};

/// Volumes below this are treated as an open or degenerate surface (m³).
const MIN_VOLUME: f64 = 1e-12;

/// Vertex of a shape triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeVertex {
    /// Vertex position.
    pub position: SpaceVector<BodyOrigin>,
    /// Outward surface normal used for shading.
    pub normal: SpaceVector<BodyOrigin>,
}

impl ShapeVertex {
    /// Create a vertex.
    #[must_use]
    pub fn new(position: SpaceVector<BodyOrigin>, normal: SpaceVector<BodyOrigin>) -> Self {
        Self { position, normal }
    }
}

/// Triangle soup describing the surface of a body.
///
/// Triangles are wound counter-clockwise when seen from outside.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shape {
    triangles: Vec<[ShapeVertex; 3]>,
}

impl Shape {
    /// Empty shape.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shape from explicit triangles.
    #[must_use]
    pub fn from_triangles(triangles: Vec<[ShapeVertex; 3]>) -> Self {
        Self { triangles }
    }

    /// Cube centred on the origin.
    #[must_use]
    pub fn centered_cube(edge: f64) -> Self {
        Self::centered_cuboid(SpaceVector::new(edge, edge, edge))
    }

    /// Cuboid centred on the origin with full edge lengths `dimensions`.
    #[must_use]
    pub fn centered_cuboid(dimensions: SpaceVector<BodyOrigin>) -> Self {
        let h = dimensions / 2.0;
        let corner = |sx: f64, sy: f64, sz: f64| SpaceVector::new(sx * h.x(), sy * h.y(), sz * h.z());
        let mut builder = ConvexBuilder::default();

        for (axis, sign) in [(0, 1.0), (0, -1.0), (1, 1.0), (1, -1.0), (2, 1.0), (2, -1.0)] {
            // Four corners of the face, in cyclic order
            let quad: [SpaceVector<BodyOrigin>; 4] = match axis {
                0 => [
                    corner(sign, -1.0, -1.0),
                    corner(sign, 1.0, -1.0),
                    corner(sign, 1.0, 1.0),
                    corner(sign, -1.0, 1.0),
                ],
                1 => [
                    corner(-1.0, sign, -1.0),
                    corner(1.0, sign, -1.0),
                    corner(1.0, sign, 1.0),
                    corner(-1.0, sign, 1.0),
                ],
                _ => [
                    corner(-1.0, -1.0, sign),
                    corner(1.0, -1.0, sign),
                    corner(1.0, 1.0, sign),
                    corner(-1.0, 1.0, sign),
                ],
            };
            builder.push_flat_quad(quad);
        }

        builder.into_shape()
    }

    /// UV sphere centred on the origin.
    ///
    /// `slices` divide longitude, `stacks` divide latitude. Values below 3 and
    /// 2 respectively are raised to those minimums.
    #[must_use]
    pub fn centered_sphere(radius: f64, slices: usize, stacks: usize) -> Self {
        let slices = slices.max(3);
        let stacks = stacks.max(2);
        let point = |slice: usize, stack: usize| {
            let longitude = TAU * slice as f64 / slices as f64;
            let latitude = -PI / 2.0 + PI * stack as f64 / stacks as f64;
            SpaceVector::new(
                radius * latitude.cos() * longitude.cos(),
                radius * latitude.cos() * longitude.sin(),
                radius * latitude.sin(),
            )
        };
        let mut builder = ConvexBuilder::default();

        for stack in 0..stacks {
            for slice in 0..slices {
                let quad = [
                    point(slice, stack),
                    point(slice + 1, stack),
                    point(slice + 1, stack + 1),
                    point(slice, stack + 1),
                ];
                builder.push_smooth_quad(quad);
            }
        }

        builder.into_shape()
    }

    /// Closed cylinder along the Z axis, centred on the origin.
    #[must_use]
    pub fn centered_cylinder(radius: f64, length: f64, slices: usize) -> Self {
        let slices = slices.max(3);
        let half = length / 2.0;
        let rim = |slice: usize, z: f64| {
            let angle = TAU * slice as f64 / slices as f64;
            SpaceVector::new(radius * angle.cos(), radius * angle.sin(), z)
        };
        let mut builder = ConvexBuilder::default();

        for slice in 0..slices {
            builder.push_flat_quad([
                rim(slice, -half),
                rim(slice + 1, -half),
                rim(slice + 1, half),
                rim(slice, half),
            ]);
            for z in [-half, half] {
                builder.push_flat_triangle([SpaceVector::new(0.0, 0.0, z), rim(slice, z), rim(slice + 1, z)]);
            }
        }

        builder.into_shape()
    }

    /// Triangles of the surface.
    #[must_use]
    pub fn triangles(&self) -> &[[ShapeVertex; 3]] {
        &self.triangles
    }

    /// Number of triangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True when the shape has no triangles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append all triangles of `other`.
    pub fn merge(&mut self, other: &Self) {
        self.triangles.extend_from_slice(&other.triangles);
    }

    /// Move every vertex by `offset`.
    pub fn translate(&mut self, offset: SpaceVector<BodyOrigin>) {
        for vertex in self.triangles.iter_mut().flatten() {
            vertex.position += offset;
        }
    }

    /// Rotate every vertex and normal about the origin.
    pub fn rotate(&mut self, rotation: &RotationQuaternion<BodyOrigin, BodyOrigin>) {
        for vertex in self.triangles.iter_mut().flatten() {
            vertex.position = *rotation * vertex.position;
            vertex.normal = *rotation * vertex.normal;
        }
    }

    /// Signed enclosed volume (m³).
    ///
    /// Sum of signed tetrahedra spanned by each triangle and the origin.
    /// Positive for closed surfaces wound counter-clockwise from outside.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.triangles
            .iter()
            .map(|[a, b, c]| a.position.cross(&b.position).dot(&c.position) / 6.0)
            .sum()
    }

    /// Mass moments of the enclosed solid for a uniform `density` (kg/m³).
    ///
    /// The surface must be closed. Inside-out surfaces are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidMassProperties`] if the density is not
    /// positive or the surface encloses no volume.
    pub fn mass_moments(&self, density: f64) -> Result<MassMomentsAtArm<BodyOrigin>> {
        if !(density.is_finite() && density > 0.0) {
            return Err(SimError::invalid_mass(format!(
                "density must be positive, got {density}"
            )));
        }

        let mut volume = 0.0;
        let mut first_moment = Vector3::zeros();
        // Second moments ∫xx, ∫yy, ∫zz, ∫xy, ∫xz, ∫yz over the volume
        let mut second = [0.0_f64; 6];

        for [a, b, c] in &self.triangles {
            let (a, b, c) = (a.position.inner(), b.position.inner(), c.position.inner());
            let det = a.cross(b).dot(c);
            volume += det / 6.0;
            first_moment += (a + b + c) * (det / 24.0);

            let f60 = det / 60.0;
            let f120 = det / 120.0;
            let square = |i: usize| a[i] * a[i] + b[i] * b[i] + c[i] * c[i] + a[i] * b[i] + a[i] * c[i] + b[i] * c[i];
            let product = |i: usize, j: usize| {
                2.0 * (a[i] * a[j] + b[i] * b[j] + c[i] * c[j])
                    + a[i] * b[j]
                    + a[j] * b[i]
                    + a[i] * c[j]
                    + a[j] * c[i]
                    + b[i] * c[j]
                    + b[j] * c[i]
            };

            second[0] += f60 * square(0);
            second[1] += f60 * square(1);
            second[2] += f60 * square(2);
            second[3] += f120 * product(0, 1);
            second[4] += f120 * product(0, 2);
            second[5] += f120 * product(1, 2);
        }

        if volume.abs() < MIN_VOLUME {
            return Err(SimError::invalid_mass("shape encloses no volume"));
        }

        let center_of_mass = first_moment / volume;
        let [xx, yy, zz, xy, xz, yz] = second.map(|s| s * density);
        let mass = volume.abs() * density;
        // Signs of all integrals follow the winding, so a reversed surface
        // flips them together.
        let sign = volume.signum();
        #[rustfmt::skip]
        let about_origin = SpaceMatrix::from_inner(nalgebra::Matrix3::new(
            yy + zz, -xy, -xz,
            -xy, xx + zz, -yz,
            -xz, -yz, xx + yy,
        )) * sign;

        let d = SpaceVector::<BodyOrigin>::from_inner(center_of_mass);
        let shift = SpaceMatrix::from_inner(nalgebra::Matrix3::identity() * d.norm_squared()) - d.outer(&d);
        let about_com = about_origin - shift * mass;

        Ok(MassMomentsAtArm::new(MassMoments::new(mass, about_com), d))
    }
}

/// Collects outward-wound triangles of a convex surface centred on the origin.
#[derive(Default)]
struct ConvexBuilder {
    triangles: Vec<[ShapeVertex; 3]>,
}

impl ConvexBuilder {
    fn push_flat_triangle(&mut self, points: [SpaceVector<BodyOrigin>; 3]) {
        let [a, mut b, mut c] = points;
        let Some(mut normal) = (b - a).cross(&(c - a)).try_normalize(f64::EPSILON) else {
            return;
        };
        let centroid = (a + b + c) / 3.0;
        if normal.dot(&centroid) < 0.0 {
            std::mem::swap(&mut b, &mut c);
            normal = -normal;
        }
        self.triangles.push([
            ShapeVertex::new(a, normal),
            ShapeVertex::new(b, normal),
            ShapeVertex::new(c, normal),
        ]);
    }

    fn push_flat_quad(&mut self, quad: [SpaceVector<BodyOrigin>; 4]) {
        self.push_flat_triangle([quad[0], quad[1], quad[2]]);
        self.push_flat_triangle([quad[0], quad[2], quad[3]]);
    }

    fn push_smooth_quad(&mut self, quad: [SpaceVector<BodyOrigin>; 4]) {
        let first = self.triangles.len();
        self.push_flat_quad(quad);
        // Sphere normals point radially
        for vertex in self.triangles[first..].iter_mut().flatten() {
            if let Some(normal) = vertex.position.try_normalize(f64::EPSILON) {
                vertex.normal = normal;
            }
        }
    }

    fn into_shape(self) -> Shape {
        Shape::from_triangles(self.triangles)
    }
}
