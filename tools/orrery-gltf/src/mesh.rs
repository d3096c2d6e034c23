//! Packing a generated surface into one binary buffer

use crate::buffer::{BufferBuilder, PackedBuffer, RegionIndex};
use crate::error::{AssetError, Result};
use crate::surface::SurfaceMesh;
use crate::utils::{Bounds, compute_bounds};

/// Region handles for a packed mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRegions {
    pub positions: RegionIndex,
    pub normals: RegionIndex,
    pub uvs: Option<RegionIndex>,
    pub indices: RegionIndex,
}

/// A surface packed into its binary blob, ready for document assembly
#[derive(Debug, Clone)]
pub struct PackedMesh {
    pub buffer: PackedBuffer,
    pub regions: MeshRegions,
    pub vertex_count: usize,
    pub index_count: usize,
    /// Bounds computed from the packed positions
    pub bounds: Bounds,
}

/// Pack a surface in the fixed order positions, normals, UVs, indices
///
/// Attribute streams must agree on vertex count and every index must address
/// an existing vertex. All checks run before packing starts.
pub fn pack_surface(mesh: &SurfaceMesh) -> Result<PackedMesh> {
    let vertex_count = mesh.positions.len();

    check_count("NORMAL", vertex_count, mesh.normals.len())?;
    if let Some(uvs) = &mesh.uvs {
        check_count("TEXCOORD_0", vertex_count, uvs.len())?;
    }
    if let Some((position, &index)) = mesh
        .indices
        .iter()
        .enumerate()
        .find(|(_, i)| **i as usize >= vertex_count)
    {
        return Err(AssetError::IndexOutOfRange {
            index,
            position,
            vertex_count,
        });
    }

    let mut buffer = BufferBuilder::new();
    let positions = buffer.pack_floats(&mesh.positions);
    let normals = buffer.pack_floats(&mesh.normals);
    let uvs = mesh.uvs.as_ref().map(|uv| buffer.pack_floats(uv));
    let indices = buffer.pack_indices_u16(&mesh.indices)?;

    Ok(PackedMesh {
        buffer: buffer.finish(),
        regions: MeshRegions {
            positions,
            normals,
            uvs,
            indices,
        },
        vertex_count,
        index_count: mesh.indices.len(),
        bounds: compute_bounds(&mesh.positions),
    })
}

fn check_count(attribute: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(AssetError::AttributeCountMismatch {
            attribute,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{read_floats, read_indices_u16};
    use crate::surface::{Orientation, SphereParams, TorusParams};

    #[test]
    fn test_pack_sphere_roundtrip() {
        let mesh = SphereParams::new(0.5, 6, 7, Orientation::Outward)
            .unwrap()
            .generate();
        let packed = pack_surface(&mesh).unwrap();
        let buffer = &packed.buffer;

        assert_eq!(buffer.regions.len(), 4);
        assert_eq!(read_floats::<3>(buffer.bytes(packed.regions.positions)), mesh.positions);
        assert_eq!(read_floats::<3>(buffer.bytes(packed.regions.normals)), mesh.normals);
        assert_eq!(
            read_floats::<2>(buffer.bytes(packed.regions.uvs.unwrap())),
            mesh.uvs.clone().unwrap()
        );
        let indices: Vec<u32> = read_indices_u16(buffer.bytes(packed.regions.indices))
            .into_iter()
            .map(u32::from)
            .collect();
        assert_eq!(indices, mesh.indices);

        let total: usize = buffer.regions.iter().map(|r| r.byte_length).sum();
        assert_eq!(total, buffer.data.len());
        assert_eq!(buffer.data.len(), 42 * 12 + 42 * 12 + 42 * 8 + 180 * 2);
    }

    #[test]
    fn test_pack_torus_has_no_uv_region() {
        let mesh = TorusParams::new(1.0, 0.002, 64, 6).unwrap().generate();
        let packed = pack_surface(&mesh).unwrap();
        assert!(packed.regions.uvs.is_none());
        assert_eq!(packed.buffer.regions.len(), 3);
        assert_eq!(packed.index_count, 6 * 64 * 6);
    }

    #[test]
    fn test_bounds_touch_every_extreme() {
        let mesh = SphereParams::new(2.0, 9, 9, Orientation::Outward)
            .unwrap()
            .generate();
        let packed = pack_surface(&mesh).unwrap();
        let bounds = packed.bounds;

        for axis in 0..3 {
            assert!(mesh.positions.iter().all(|p| {
                bounds.min[axis] <= p[axis] && p[axis] <= bounds.max[axis]
            }));
            assert!(mesh.positions.iter().any(|p| p[axis] == bounds.min[axis]));
            assert!(mesh.positions.iter().any(|p| p[axis] == bounds.max[axis]));
        }
    }

    #[test]
    fn test_largest_sphere_grid_packs() {
        let mesh = SphereParams::new(1.0, 256, 256, Orientation::Outward)
            .unwrap()
            .generate();
        let packed = pack_surface(&mesh).unwrap();
        assert_eq!(packed.vertex_count, 65536);
    }

    #[test]
    fn test_index_past_u16_range_overflows() {
        let vertices = 65537;
        let mesh = SurfaceMesh {
            positions: vec![[0.0; 3]; vertices],
            normals: vec![[0.0, 1.0, 0.0]; vertices],
            uvs: None,
            indices: vec![0, 1, 65536],
        };
        assert!(matches!(
            pack_surface(&mesh),
            Err(AssetError::IndexOverflow {
                index: 65536,
                position: 2
            })
        ));
    }

    #[test]
    fn test_mismatched_attributes_rejected() {
        let mut mesh = TorusParams::new(1.0, 0.1, 3, 3).unwrap().generate();
        mesh.normals.pop();
        assert!(matches!(
            pack_surface(&mesh),
            Err(AssetError::AttributeCountMismatch {
                attribute: "NORMAL",
                expected: 9,
                actual: 8
            })
        ));

        let mut mesh = TorusParams::new(1.0, 0.1, 3, 3).unwrap().generate();
        mesh.indices.push(9);
        assert!(matches!(
            pack_surface(&mesh),
            Err(AssetError::IndexOutOfRange { index: 9, .. })
        ));
    }
}
