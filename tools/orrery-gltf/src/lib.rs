//! Procedural glTF asset generation for the orrery scene
//!
//! The pipeline runs strictly in one direction:
//! - surface: parametric sphere / skydome / torus generation
//! - buffer + mesh: contiguous little-endian packing of the vertex and index streams
//! - document: GltfBuilder assembling buffers, views, accessors, material and extensions
//! - postprocess: idempotent in-place rewriting of persisted documents
//!
//! # Example
//!
//! ```no_run
//! use orrery_gltf::*;
//!
//! let sphere = SphereParams::new(0.5, 64, 64, Orientation::Outward)?.generate();
//! let packed = pack_surface(&sphere)?;
//!
//! let root = GltfBuilder::new("orrery-gltf")
//!     .name("Sphere")
//!     .buffer_source(BufferSource::External("sphere.bin".to_string()))
//!     .build(&packed);
//!
//! std::fs::write("sphere.bin", &packed.buffer.data).unwrap();
//! write_document(std::path::Path::new("ref_sphere.gltf"), &root)?;
//! # Ok::<(), AssetError>(())
//! ```

pub mod buffer;
pub mod document;
pub mod error;
pub mod mesh;
pub mod postprocess;
pub mod surface;
pub mod uri;
pub mod utils;

pub use buffer::{
    BufferBuilder, BufferRegion, ElementShape, PackedBuffer, RegionIndex, RegionUsage,
};
pub use document::{
    AlphaMode, BufferSource, GltfBuilder, KHR_LIGHTS_PUNCTUAL, KHR_MATERIALS_UNLIT, MaterialSpec,
    PointLight, TextureSlots,
};
pub use error::{AssetError, Result};
pub use mesh::{MeshRegions, PackedMesh, pack_surface};
pub use postprocess::{
    AssetReport, AssetStatus, BatchReport, LightConfig, ProcessOptions, embed_geometry,
    process_document, process_models,
};
pub use surface::{Orientation, SphereParams, SurfaceMesh, TorusParams};
pub use uri::{DataUri, decode_data_uri, encode_data_uri, is_data_uri};
pub use utils::{Bounds, compute_bounds, read_document, register_extension, write_document};

// Re-export commonly used gltf-json types
pub use gltf_json as json;
