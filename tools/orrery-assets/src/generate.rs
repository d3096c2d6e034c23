//! Model generation
//!
//! Writes the reference sphere (external `.bin`), one inline document per
//! body, the skybox (external `.bin`) and the orbit ring (inline).

use anyhow::{Context, Result};
use orrery_gltf::{
    Bounds, BufferSource, GltfBuilder, PackedMesh, SurfaceMesh, TextureSlots, pack_surface,
    write_document,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::manifest::{Manifest, body_material};

const GENERATOR: &str = "orrery-assets";

/// Generate every model described by the manifest into `dir`
///
/// Returns the paths written, in order.
pub fn generate_all(manifest: &Manifest, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).context("Failed to create output directory")?;
    let mut written = Vec::new();

    let sphere = &manifest.sphere;
    let params = sphere.params().context("[sphere]")?;
    let packed = pack("sphere", &params.generate())?;
    let bounds = Bounds::cube(params.radius());

    written.push(write_bin(dir, &sphere.bin, &packed)?);
    let root = GltfBuilder::new(GENERATOR)
        .name("Sphere")
        .buffer_source(BufferSource::External(sphere.bin.clone()))
        .declared_bounds(bounds)
        .material(sphere.material.clone())
        .build(&packed);
    written.push(write_gltf(dir, &sphere.document, &root)?);

    for body in &manifest.bodies {
        let root = GltfBuilder::new(GENERATOR)
            .name("Sphere")
            .declared_bounds(bounds)
            .material(body_material())
            .texture(&body.texture(), TextureSlots::BaseAndEmissive)
            .build(&packed);
        written.push(write_gltf(dir, &format!("{}.gltf", body.name()), &root)?);
    }

    let skybox = &manifest.skybox;
    if skybox.enabled {
        let params = skybox.params().context("[skybox]")?;
        let packed = pack("skybox", &params.generate())?;
        let bin = format!("{}.bin", skybox.name);

        written.push(write_bin(dir, &bin, &packed)?);
        let root = GltfBuilder::new(GENERATOR)
            .name("Skybox")
            .buffer_source(BufferSource::External(bin))
            .declared_bounds(Bounds::cube(params.radius()))
            .material(skybox.material())
            .texture(&skybox.texture, TextureSlots::Base)
            .unlit()
            .build(&packed);
        written.push(write_gltf(dir, &format!("{}.gltf", skybox.name), &root)?);
    }

    let ring = &manifest.ring;
    if ring.enabled {
        let params = ring.params().context("[ring]")?;
        let packed = pack("ring", &params.generate())?;
        let root = GltfBuilder::new(GENERATOR)
            .material(ring.material.clone())
            .build(&packed);
        written.push(write_gltf(dir, &format!("{}.gltf", ring.name), &root)?);
    }

    Ok(written)
}

fn pack(label: &str, mesh: &SurfaceMesh) -> Result<PackedMesh> {
    info!(
        "Generated {label}: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    pack_surface(mesh).with_context(|| format!("Failed to pack {label}"))
}

fn write_bin(dir: &Path, name: &str, packed: &PackedMesh) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, &packed.buffer.data)
        .with_context(|| format!("Failed to write binary: {:?}", path))?;
    info!("Wrote {} ({} bytes)", path.display(), packed.buffer.data.len());
    Ok(path)
}

fn write_gltf(dir: &Path, name: &str, root: &orrery_gltf::json::Root) -> Result<PathBuf> {
    let path = dir.join(name);
    write_document(&path, root)?;
    info!("Wrote {}", path.display());
    Ok(path)
}
