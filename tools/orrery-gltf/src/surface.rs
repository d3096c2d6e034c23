//! Parametric surface generation (UV sphere, inverted skydome sphere, torus)
//!
//! Parameters are validated once by the `*Params::new` constructors; the
//! `generate` methods are then infallible.

use glam::DVec3;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::error::{AssetError, Result};

/// Largest vertex grid whose indices still fit the 2-byte index type
pub const MAX_VERTICES: u64 = u16::MAX as u64 + 1;

/// Which side of the sphere faces the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Normals point away from the center, front faces seen from outside
    #[default]
    Outward,
    /// Normals point at the center, front faces seen from inside (skydomes)
    Inward,
}

impl Orientation {
    fn normal_sign(self) -> f64 {
        match self {
            Orientation::Outward => 1.0,
            Orientation::Inward => -1.0,
        }
    }

    /// Emit the two triangles of the quad `i0-i1-i2-i3`
    fn push_quad(self, indices: &mut Vec<u32>, i0: u32, i1: u32, i2: u32, i3: u32) {
        match self {
            Orientation::Outward => indices.extend_from_slice(&[i0, i1, i2, i2, i3, i0]),
            Orientation::Inward => indices.extend_from_slice(&[i0, i2, i1, i2, i0, i3]),
        }
    }
}

/// Vertex streams and triangle list of one generated surface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Absent for surfaces that are never textured (torus)
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Validated UV-sphere parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    radius: f32,
    rings: u32,
    sectors: u32,
    orientation: Orientation,
}

impl SphereParams {
    /// Validate sphere parameters
    ///
    /// `rings` and `sectors` must both be at least 2, since the grid spacing
    /// divides by `rings - 1` and `sectors - 1`. The `rings × sectors` grid
    /// must fit in [`MAX_VERTICES`].
    pub fn new(radius: f32, rings: u32, sectors: u32, orientation: Orientation) -> Result<Self> {
        check_radius("radius", radius)?;
        check_count("rings", rings, 2)?;
        check_count("sectors", sectors, 2)?;
        check_grid("rings * sectors", rings, sectors)?;
        Ok(Self {
            radius,
            rings,
            sectors,
            orientation,
        })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of vertices `generate` will produce
    pub fn vertex_count(&self) -> usize {
        self.rings as usize * self.sectors as usize
    }

    /// Generate the sphere
    ///
    /// Produces a `rings × sectors` vertex grid. The first and last ring
    /// collapse onto the poles and the last sector repeats the first one's
    /// positions with a different U; these duplicates carry the texture seam
    /// and are kept as is.
    pub fn generate(&self) -> SurfaceMesh {
        let rings = self.rings as usize;
        let sectors = self.sectors as usize;
        let ring_step = 1.0 / (self.rings - 1) as f64;
        let sector_step = 1.0 / (self.sectors - 1) as f64;
        let radius = self.radius as f64;
        let sign = self.orientation.normal_sign();

        let mut positions = Vec::with_capacity(rings * sectors);
        let mut normals = Vec::with_capacity(rings * sectors);
        let mut uvs = Vec::with_capacity(rings * sectors);

        for r in 0..rings {
            let v = r as f64 * ring_step;
            for s in 0..sectors {
                let u = s as f64 * sector_step;
                let unit = DVec3::new(
                    (TAU * u).cos() * (PI * v).sin(),
                    (-FRAC_PI_2 + PI * v).sin(),
                    (TAU * u).sin() * (PI * v).sin(),
                );

                positions.push((unit * radius).as_vec3().to_array());
                normals.push((unit * sign).as_vec3().to_array());
                // Flipped so image row 0 lands on the top ring
                uvs.push([(1.0 - u) as f32, (1.0 - v) as f32]);
            }
        }

        let mut indices = Vec::with_capacity((rings - 1) * (sectors - 1) * 6);
        let stride = self.sectors;
        for r in 0..self.rings - 1 {
            for s in 0..self.sectors - 1 {
                let i0 = r * stride + s;
                let i1 = r * stride + s + 1;
                let i2 = (r + 1) * stride + s + 1;
                let i3 = (r + 1) * stride + s;
                self.orientation.push_quad(&mut indices, i0, i1, i2, i3);
            }
        }

        SurfaceMesh {
            positions,
            normals,
            uvs: Some(uvs),
            indices,
        }
    }
}

/// Validated torus parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorusParams {
    major_radius: f32,
    minor_radius: f32,
    major_segments: u32,
    minor_segments: u32,
}

impl TorusParams {
    /// Validate torus parameters (both segment counts at least 3, grid within
    /// [`MAX_VERTICES`])
    pub fn new(
        major_radius: f32,
        minor_radius: f32,
        major_segments: u32,
        minor_segments: u32,
    ) -> Result<Self> {
        check_radius("major_radius", major_radius)?;
        check_radius("minor_radius", minor_radius)?;
        check_count("major_segments", major_segments, 3)?;
        check_count("minor_segments", minor_segments, 3)?;
        check_grid("major_segments * minor_segments", major_segments, minor_segments)?;
        Ok(Self {
            major_radius,
            minor_radius,
            major_segments,
            minor_segments,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.major_segments as usize * self.minor_segments as usize
    }

    /// Generate the torus in the XZ plane
    ///
    /// No seam vertices: the index grid wraps with modulo arithmetic on both
    /// axes. No UVs are produced.
    pub fn generate(&self) -> SurfaceMesh {
        let major = self.major_segments;
        let minor = self.minor_segments;
        let big_r = self.major_radius as f64;
        let small_r = self.minor_radius as f64;

        let mut positions = Vec::with_capacity(self.vertex_count());
        let mut normals = Vec::with_capacity(self.vertex_count());

        for i in 0..major {
            let theta = TAU * i as f64 / major as f64;
            let (sin_theta, cos_theta) = theta.sin_cos();

            for j in 0..minor {
                let phi = TAU * j as f64 / minor as f64;
                let (sin_phi, cos_phi) = phi.sin_cos();

                let ring = big_r + small_r * cos_phi;
                let position = DVec3::new(ring * cos_theta, small_r * sin_phi, ring * sin_theta);
                let normal = DVec3::new(cos_phi * cos_theta, sin_phi, cos_phi * sin_theta);

                positions.push(position.as_vec3().to_array());
                normals.push(normal.as_vec3().to_array());
            }
        }

        let mut indices = Vec::with_capacity(6 * self.vertex_count());
        for i in 0..major {
            let i_next = (i + 1) % major;
            for j in 0..minor {
                let j_next = (j + 1) % minor;

                let v0 = i * minor + j;
                let v1 = i_next * minor + j;
                let v2 = i_next * minor + j_next;
                let v3 = i * minor + j_next;

                indices.extend_from_slice(&[v0, v1, v2, v0, v2, v3]);
            }
        }

        SurfaceMesh {
            positions,
            normals,
            uvs: None,
            indices,
        }
    }
}

fn check_radius(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AssetError::InvalidParameter {
            name,
            value: value.to_string(),
            requirement: "a finite value > 0",
        })
    }
}

fn check_count(name: &'static str, value: u32, min: u32) -> Result<()> {
    if value >= min {
        return Ok(());
    }
    Err(AssetError::InvalidParameter {
        name,
        value: value.to_string(),
        requirement: if min == 2 { ">= 2" } else { ">= 3" },
    })
}

fn check_grid(name: &'static str, a: u32, b: u32) -> Result<()> {
    let vertices = a as u64 * b as u64;
    if vertices <= MAX_VERTICES {
        return Ok(());
    }
    Err(AssetError::InvalidParameter {
        name,
        value: vertices.to_string(),
        requirement: "<= 65536 vertices for u16 indices",
    })
}
