//! Manifest parsing
//!
//! Parses assets.toml. Every section is optional and defaults to the
//! shipped orrery models, so an empty manifest describes the full set.

use anyhow::{Context, Result};
use orrery_gltf::{
    AlphaMode, MaterialSpec, Orientation, ProcessOptions, SphereParams, TorusParams,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root manifest structure
#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sphere: SphereConfig,
    #[serde(default = "default_bodies")]
    pub bodies: Vec<BodyEntry>,
    #[serde(default)]
    pub skybox: SkyboxConfig,
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub process: ProcessConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("app/src/main/assets/models")
}

/// Reference sphere shared by every planet
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SphereConfig {
    pub radius: f32,
    pub rings: u32,
    pub sectors: u32,
    /// Binary written next to the reference document
    pub bin: String,
    /// Reference document (external buffer)
    pub document: String,
    pub material: MaterialSpec,
}

impl Default for SphereConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            rings: 64,
            sectors: 64,
            bin: "sphere.bin".to_string(),
            document: "ref_sphere.gltf".to_string(),
            material: MaterialSpec::default(),
        }
    }
}

impl SphereConfig {
    pub fn params(&self) -> orrery_gltf::Result<SphereParams> {
        SphereParams::new(self.radius, self.rings, self.sectors, Orientation::Outward)
    }
}

/// A textured celestial body built on the reference sphere
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum BodyEntry {
    Simple(String),
    Detailed {
        name: String,
        #[serde(default)]
        texture: Option<String>,
    },
}

impl BodyEntry {
    pub fn name(&self) -> &str {
        match self {
            BodyEntry::Simple(name) => name,
            BodyEntry::Detailed { name, .. } => name,
        }
    }

    /// Texture image, `<name>_texture.jpg` unless overridden
    pub fn texture(&self) -> String {
        match self {
            BodyEntry::Detailed {
                texture: Some(texture),
                ..
            } => texture.clone(),
            _ => format!("{}_texture.jpg", self.name()),
        }
    }
}

fn default_bodies() -> Vec<BodyEntry> {
    [
        "mercury", "venus", "earth", "mars", "jupiter", "saturn", "uranus", "neptune", "sun",
    ]
    .into_iter()
    .map(|name| BodyEntry::Simple(name.to_string()))
    .collect()
}

/// Material applied to every body document
pub fn body_material() -> MaterialSpec {
    MaterialSpec {
        roughness: 0.9,
        emissive: [0.3; 3],
        ..Default::default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SkyboxConfig {
    pub enabled: bool,
    pub name: String,
    pub radius: f32,
    pub rings: u32,
    pub sectors: u32,
    pub texture: String,
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "milky_way".to_string(),
            radius: 50.0,
            rings: 64,
            sectors: 64,
            texture: "milky_way_texture.jpg".to_string(),
        }
    }
}

impl SkyboxConfig {
    pub fn params(&self) -> orrery_gltf::Result<SphereParams> {
        SphereParams::new(self.radius, self.rings, self.sectors, Orientation::Inward)
    }

    pub fn material(&self) -> MaterialSpec {
        MaterialSpec {
            name: "SkyboxMaterial".to_string(),
            roughness: 1.0,
            double_sided: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub enabled: bool,
    pub name: String,
    pub major_radius: f32,
    pub minor_radius: f32,
    pub major_segments: u32,
    pub minor_segments: u32,
    pub material: MaterialSpec,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "ring".to_string(),
            major_radius: 1.0,
            minor_radius: 0.002,
            major_segments: 64,
            minor_segments: 6,
            material: MaterialSpec {
                name: "OrbitRingMaterial".to_string(),
                base_color: [0.7, 0.7, 0.8, 0.02],
                metallic: 0.0,
                roughness: 0.9,
                emissive: [0.2, 0.2, 0.25],
                alpha_mode: AlphaMode::Blend,
                double_sided: false,
            },
        }
    }
}

impl RingConfig {
    pub fn params(&self) -> orrery_gltf::Result<TorusParams> {
        TorusParams::new(
            self.major_radius,
            self.minor_radius,
            self.major_segments,
            self.minor_segments,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct ProcessConfig {
    /// Fresh binary embedded into each body document
    #[serde(default = "default_geometry_bin")]
    pub geometry_bin: String,
    #[serde(flatten)]
    pub options: ProcessOptions,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            geometry_bin: default_geometry_bin(),
            options: ProcessOptions::default(),
        }
    }
}

fn default_geometry_bin() -> String {
    "sphere.bin".to_string()
}

impl Manifest {
    /// Asset names handled by the post-processor
    pub fn body_names(&self) -> Vec<String> {
        self.bodies.iter().map(|b| b.name().to_string()).collect()
    }

    /// Output directory, optionally overridden on the command line
    pub fn output_dir<'a>(&'a self, cli_override: Option<&'a Path>) -> &'a Path {
        cli_override.unwrap_or(&self.output.dir)
    }
}

/// Load and parse a manifest file
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    parse_manifest(&content).with_context(|| format!("Failed to parse manifest: {:?}", path))
}

pub fn parse_manifest(content: &str) -> Result<Manifest> {
    Ok(toml::from_str(content)?)
}

/// Check every generator parameter without writing anything
pub fn validate(manifest: &Manifest) -> Result<()> {
    manifest.sphere.params().context("[sphere]")?;
    if manifest.skybox.enabled {
        manifest.skybox.params().context("[skybox]")?;
    }
    if manifest.ring.enabled {
        manifest.ring.params().context("[ring]")?;
    }

    let mut seen = std::collections::HashSet::new();
    for body in &manifest.bodies {
        if !seen.insert(body.name()) {
            anyhow::bail!("body '{}' listed more than once", body.name());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest_uses_defaults() {
        let manifest = parse_manifest("").unwrap();
        assert_eq!(manifest.bodies.len(), 9);
        assert_eq!(manifest.sphere.rings, 64);
        assert_eq!(manifest.sphere.bin, "sphere.bin");
        assert_eq!(manifest.skybox.radius, 50.0);
        assert_eq!(manifest.ring.minor_segments, 6);
        assert!(manifest.process.options.embed_geometry);
        assert_eq!(manifest.process.options.light.asset, "sun");
        validate(&manifest).unwrap();
    }

    #[test]
    fn test_shipped_manifest_parses() {
        let manifest = parse_manifest(include_str!("../assets.toml")).unwrap();
        validate(&manifest).unwrap();
        assert_eq!(manifest.body_names().len(), 9);
        assert_eq!(manifest.ring.material.alpha_mode, AlphaMode::Blend);
        assert_eq!(manifest.process.options.light.light.intensity, 2000.0);
    }

    #[test]
    fn test_body_entries() {
        let manifest = parse_manifest(
            r#"
            bodies = ["mars", { name = "earth", texture = "earth_daymap.png" }]
            "#,
        )
        .unwrap();
        assert_eq!(manifest.body_names(), vec!["mars", "earth"]);
        assert_eq!(manifest.bodies[0].texture(), "mars_texture.jpg");
        assert_eq!(manifest.bodies[1].texture(), "earth_daymap.png");
    }

    #[test]
    fn test_sections_override() {
        let manifest = parse_manifest(
            r#"
            [output]
            dir = "out"

            [sphere]
            rings = 8
            sectors = 12

            [ring]
            enabled = false

            [process]
            geometry_bin = "planet.bin"
            attach_light = false

            [process.light]
            asset = "earth"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.output.dir, PathBuf::from("out"));
        assert_eq!(manifest.sphere.sectors, 12);
        assert_eq!(manifest.sphere.radius, 0.5);
        assert!(!manifest.ring.enabled);
        assert_eq!(manifest.process.geometry_bin, "planet.bin");
        assert!(!manifest.process.options.attach_light);
        assert_eq!(manifest.process.options.light.asset, "earth");
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        let manifest = parse_manifest("[sphere]\nrings = 1").unwrap();
        assert!(validate(&manifest).is_err());

        let manifest = parse_manifest("[ring]\nminor_segments = 2").unwrap();
        assert!(validate(&manifest).is_err());

        let manifest = parse_manifest("[ring]\nenabled = false\nminor_segments = 2").unwrap();
        assert!(validate(&manifest).is_ok());

        let manifest = parse_manifest(r#"bodies = ["mars", "mars"]"#).unwrap();
        assert!(validate(&manifest).is_err());
    }

    #[test]
    fn test_validate_rejects_grid_past_u16_indices() {
        let manifest = parse_manifest("[sphere]\nrings = 300\nsectors = 300").unwrap();
        let err = validate(&manifest).unwrap_err();
        assert!(format!("{err:#}").contains("rings * sectors"));

        let manifest = parse_manifest("[skybox]\nrings = 256\nsectors = 256").unwrap();
        assert!(validate(&manifest).is_ok());

        let manifest = parse_manifest("[ring]\nmajor_segments = 1000\nminor_segments = 100").unwrap();
        assert!(validate(&manifest).is_err());
    }
}
