//! In-place rewriting of previously generated documents
//!
//! Each document moves along two independent axes, geometry and textures,
//! each either external or embedded. Every transform is idempotent: applying
//! it to a document already in its target state changes nothing.
//!
//! Recoverable problems (no fresh binary, malformed inline image, missing
//! light node) are returned as warnings and never abort the batch.

use gltf_json as json;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::document::{KHR_LIGHTS_PUNCTUAL, PointLight};
use crate::error::{AssetError, Result};
use crate::uri::{OCTET_STREAM, decode_data_uri, encode_data_uri, extension_for_media_type, is_data_uri};
use crate::utils::{read_document, register_extension, write_document};

/// Which transforms to run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    /// Replace the buffer reference with an inline copy of the fresh binary
    pub embed_geometry: bool,
    /// Move inline images out to `<asset>_texture.<ext>` files
    pub externalize_textures: bool,
    /// Ensure the configured asset carries a point light
    pub attach_light: bool,
    pub light: LightConfig,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            embed_geometry: true,
            externalize_textures: true,
            attach_light: true,
            light: LightConfig::default(),
        }
    }
}

/// Light placement for `attach_light`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Logical asset name that receives the light
    pub asset: String,
    /// Node index the light is attached to
    pub node: u32,
    #[serde(flatten)]
    pub light: PointLight,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            asset: "sun".to_string(),
            node: 0,
            light: PointLight::default(),
        }
    }
}

/// Embed a fresh binary as the document's buffer
///
/// Returns the embedded byte length. Without a fresh binary the buffer is
/// left as is and `GeometryUnavailable` is returned for the caller to report.
pub fn embed_geometry(root: &mut json::Root, fresh: Option<&[u8]>) -> Result<u64> {
    let buffer = root.buffers.first_mut().ok_or(AssetError::MissingBuffer)?;

    let Some(bytes) = fresh else {
        let already_inline = buffer.uri.as_deref().is_some_and(is_data_uri);
        return Err(AssetError::GeometryUnavailable { already_inline });
    };

    let byte_length = bytes.len() as u64;
    buffer.uri = Some(encode_data_uri(OCTET_STREAM, bytes));
    buffer.byte_length = byte_length.into();
    Ok(byte_length)
}

/// Texture filename for the `index`-th externalized image of an asset
pub fn texture_file_name(asset: &str, index: usize, extension: &str) -> String {
    if index == 0 {
        format!("{asset}_texture.{extension}")
    } else {
        format!("{asset}_texture_{index}.{extension}")
    }
}

/// Write every inline image of `root` to `dir` and point the image at the file
///
/// Images that are already external are untouched, and no file name used by
/// another image of the document is reused. A malformed payload is reported
/// and that image keeps its inline data.
pub fn externalize_textures(root: &mut json::Root, asset: &str, dir: &Path) -> Vec<AssetError> {
    let mut warnings = Vec::new();
    let mut taken: HashSet<String> = root
        .images
        .iter()
        .filter_map(|image| image.uri.as_deref())
        .filter(|uri| !is_data_uri(uri))
        .map(str::to_string)
        .collect();
    let mut next = 0;

    for (image_index, image) in root.images.iter_mut().enumerate() {
        let Some(uri) = image.uri.as_deref().filter(|u| is_data_uri(u)) else {
            continue;
        };

        let decoded = match decode_data_uri(uri) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("{asset}: skipping image {image_index}: {e}");
                warnings.push(e);
                continue;
            }
        };

        let extension = extension_for_media_type(&decoded.media_type);
        let file_name = loop {
            let candidate = texture_file_name(asset, next, extension);
            next += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        let path = dir.join(&file_name);
        if let Err(e) = std::fs::write(&path, &decoded.data) {
            let e = AssetError::io(path, e);
            warn!("{asset}: {e}");
            warnings.push(e);
            continue;
        }

        info!("{asset}: externalized texture to {file_name}");
        taken.insert(file_name.clone());
        image.uri = Some(file_name);
        image.mime_type = None;
        image.buffer_view = None;
    }

    warnings
}

/// Ensure exactly one point light is declared and referenced by the target node
pub fn attach_light(root: &mut json::Root, config: &LightConfig) -> Result<()> {
    let node_count = root.nodes.len();
    let node = root
        .nodes
        .get_mut(config.node as usize)
        .ok_or(AssetError::MissingNode {
            node: config.node,
            node_count,
        })?;

    node.extensions
        .get_or_insert_with(Default::default)
        .khr_lights_punctual = Some(json::extensions::scene::khr_lights_punctual::KhrLightsPunctual {
        light: json::Index::new(0),
    });

    root.extensions
        .get_or_insert_with(Default::default)
        .khr_lights_punctual = Some(json::extensions::root::KhrLightsPunctual {
        lights: vec![config.light.to_json()],
    });

    register_extension(&mut root.extensions_used, KHR_LIGHTS_PUNCTUAL);
    Ok(())
}

/// Apply the enabled transforms to one document in memory
///
/// Returns the problems encountered; the document stays consistent whichever
/// transforms were skipped. Failed texture writes come back as `Io` errors,
/// which `process_models` treats as fatal.
pub fn process_document(
    root: &mut json::Root,
    asset: &str,
    dir: &Path,
    fresh: Option<&[u8]>,
    options: &ProcessOptions,
) -> Vec<AssetError> {
    let mut warnings = Vec::new();

    if options.embed_geometry {
        match embed_geometry(root, fresh) {
            Ok(byte_length) => info!("{asset}: embedded geometry ({byte_length} bytes)"),
            Err(e) => {
                warn!("{asset}: could not embed geometry: {e}");
                warnings.push(e);
            }
        }
    }

    if options.externalize_textures {
        warnings.extend(externalize_textures(root, asset, dir));
    }

    if options.attach_light && options.light.asset == asset {
        match attach_light(root, &options.light) {
            Ok(()) => info!("{asset}: ensured point light on node {}", options.light.node),
            Err(e) => {
                warn!("{asset}: could not attach light: {e}");
                warnings.push(e);
            }
        }
    }

    warnings
}

/// What happened to one asset of a batch
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AssetStatus {
    /// Document loaded, transformed and written back
    Rewritten,
    /// Document file not found; asset skipped
    Missing,
}

#[derive(Debug)]
pub struct AssetReport {
    pub name: String,
    pub status: AssetStatus,
    pub warnings: Vec<AssetError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub assets: Vec<AssetReport>,
}

impl BatchReport {
    pub fn rewritten(&self) -> usize {
        self.count(AssetStatus::Rewritten)
    }

    pub fn missing(&self) -> usize {
        self.count(AssetStatus::Missing)
    }

    pub fn warning_count(&self) -> usize {
        self.assets.iter().map(|a| a.warnings.len()).sum()
    }

    fn count(&self, status: AssetStatus) -> usize {
        self.assets.iter().filter(|a| a.status == status).count()
    }
}

/// Document path for a logical asset name
pub fn document_path(dir: &Path, asset: &str) -> PathBuf {
    dir.join(format!("{asset}.gltf"))
}

/// Post-process `<dir>/<asset>.gltf` for every asset, one at a time
///
/// `geometry_bin` is read once up front; when it is absent, embedding is
/// skipped with a warning per asset. Each document is written exactly once.
/// Unreadable or unwritable documents and texture files abort the batch
/// before the affected document is written.
pub fn process_models(
    dir: &Path,
    assets: &[String],
    geometry_bin: Option<&Path>,
    options: &ProcessOptions,
) -> Result<BatchReport> {
    let fresh = match geometry_bin {
        Some(path) if options.embed_geometry => match std::fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("geometry binary {:?} not found, embedding will be skipped", path);
                None
            }
            Err(e) => return Err(AssetError::io(path, e)),
        },
        _ => None,
    };

    let mut report = BatchReport::default();
    for asset in assets {
        let path = document_path(dir, asset);
        if !path.exists() {
            warn!("skipping {asset}, {:?} not found", path);
            report.assets.push(AssetReport {
                name: asset.clone(),
                status: AssetStatus::Missing,
                warnings: Vec::new(),
            });
            continue;
        }

        let mut root = read_document(&path)?;
        let mut warnings = process_document(&mut root, asset, dir, fresh.as_deref(), options);
        if let Some(fatal) = warnings.iter().position(|w| !w.is_recoverable()) {
            return Err(warnings.swap_remove(fatal));
        }
        write_document(&path, &root)?;

        report.assets.push(AssetReport {
            name: asset.clone(),
            status: AssetStatus::Rewritten,
            warnings,
        });
    }

    Ok(report)
}
