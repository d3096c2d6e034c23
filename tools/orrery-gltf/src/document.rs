//! GLTF document construction

use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::buffer::{BufferRegion, ElementShape, RegionIndex, RegionUsage};
use crate::mesh::PackedMesh;
use crate::uri::{OCTET_STREAM, encode_data_uri};
use crate::utils::{Bounds, register_extension};

pub const KHR_MATERIALS_UNLIT: &str = "KHR_materials_unlit";
pub const KHR_LIGHTS_PUNCTUAL: &str = "KHR_lights_punctual";

/// Where the document's single buffer lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferSource {
    /// Relative filename of a `.bin` written next to the document
    External(String),
    /// Base64 data URI stored in the document itself
    Inline,
}

/// Material blending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlphaMode {
    #[default]
    Opaque,
    Blend,
}

/// Metallic-roughness material parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MaterialSpec {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub alpha_mode: AlphaMode,
    pub double_sided: bool,
}

impl Default for MaterialSpec {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [1.0; 4],
            metallic: 0.0,
            roughness: 0.5,
            emissive: [0.0; 3],
            alpha_mode: AlphaMode::Opaque,
            double_sided: false,
        }
    }
}

/// Which material slots a texture feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSlots {
    Base,
    BaseAndEmissive,
}

/// KHR_lights_punctual point light
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: Option<f32>,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            intensity: 2000.0,
            range: Some(100.0),
        }
    }
}

impl PointLight {
    pub(crate) fn to_json(self) -> json::extensions::scene::khr_lights_punctual::Light {
        use json::extensions::scene::khr_lights_punctual::{Light, Type};
        Light {
            color: self.color,
            extensions: None,
            extras: Default::default(),
            intensity: self.intensity,
            name: None,
            range: self.range,
            spot: None,
            type_: Valid(Type::Point),
        }
    }
}

/// Builder for a single-mesh GLTF document
#[derive(Debug, Clone)]
pub struct GltfBuilder {
    generator: String,
    mesh_name: Option<String>,
    node_name: Option<String>,
    buffer_source: BufferSource,
    declared_bounds: Option<Bounds>,
    material: MaterialSpec,
    texture: Option<(String, TextureSlots)>,
    unlit: bool,
    light: Option<PointLight>,
    extensions_used: Vec<String>,
    extensions_required: Vec<String>,
}

impl GltfBuilder {
    pub fn new(generator: &str) -> Self {
        Self {
            generator: generator.to_string(),
            mesh_name: None,
            node_name: None,
            buffer_source: BufferSource::Inline,
            declared_bounds: None,
            material: MaterialSpec::default(),
            texture: None,
            unlit: false,
            light: None,
            extensions_used: Vec::new(),
            extensions_required: Vec::new(),
        }
    }

    /// Name both the mesh and its node
    pub fn name(mut self, name: &str) -> Self {
        self.mesh_name = Some(name.to_string());
        self.node_name = Some(name.to_string());
        self
    }

    pub fn buffer_source(mut self, source: BufferSource) -> Self {
        self.buffer_source = source;
        self
    }

    /// Declare bounds instead of using the ones computed from the geometry
    pub fn declared_bounds(mut self, bounds: Bounds) -> Self {
        self.declared_bounds = Some(bounds);
        self
    }

    pub fn material(mut self, material: MaterialSpec) -> Self {
        self.material = material;
        self
    }

    /// Reference an image by URI from the material
    pub fn texture(mut self, uri: &str, slots: TextureSlots) -> Self {
        self.texture = Some((uri.to_string(), slots));
        self
    }

    /// Mark the material KHR_materials_unlit
    pub fn unlit(mut self) -> Self {
        self.unlit = true;
        register_extension(&mut self.extensions_used, KHR_MATERIALS_UNLIT);
        register_extension(&mut self.extensions_required, KHR_MATERIALS_UNLIT);
        self
    }

    /// Attach a point light to the mesh node (replaces any earlier light)
    pub fn point_light(mut self, light: PointLight) -> Self {
        self.light = Some(light);
        register_extension(&mut self.extensions_used, KHR_LIGHTS_PUNCTUAL);
        self
    }

    /// Build the document around a packed mesh
    pub fn build(&self, packed: &PackedMesh) -> json::Root {
        let data = &packed.buffer.data;
        let uri = match &self.buffer_source {
            BufferSource::External(name) => name.clone(),
            BufferSource::Inline => encode_data_uri(OCTET_STREAM, data),
        };
        let buffers = vec![json::Buffer {
            byte_length: (data.len() as u64).into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: Some(uri),
        }];

        let buffer_views: Vec<json::buffer::View> =
            packed.buffer.regions.iter().map(buffer_view).collect();

        let regions = &packed.regions;
        let bounds = self.declared_bounds.unwrap_or(packed.bounds);
        let mut accessors = Vec::with_capacity(4);
        let mut attributes = BTreeMap::new();

        let position_region = packed.buffer.region(regions.positions);
        let mut positions = accessor(regions.positions, position_region);
        positions.min = Some(bounds.min_value());
        positions.max = Some(bounds.max_value());
        attributes.insert(
            Valid(json::mesh::Semantic::Positions),
            push_accessor(&mut accessors, positions),
        );

        attributes.insert(
            Valid(json::mesh::Semantic::Normals),
            push_accessor(
                &mut accessors,
                accessor(regions.normals, packed.buffer.region(regions.normals)),
            ),
        );

        if let Some(uvs) = regions.uvs {
            attributes.insert(
                Valid(json::mesh::Semantic::TexCoords(0)),
                push_accessor(&mut accessors, accessor(uvs, packed.buffer.region(uvs))),
            );
        }

        let indices = push_accessor(
            &mut accessors,
            accessor(regions.indices, packed.buffer.region(regions.indices)),
        );

        let primitive = json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(indices),
            material: Some(json::Index::new(0)),
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        };

        let (images, textures) = match &self.texture {
            Some((uri, _)) => (
                vec![json::Image {
                    buffer_view: None,
                    mime_type: None,
                    name: None,
                    uri: Some(uri.clone()),
                    extensions: Default::default(),
                    extras: Default::default(),
                }],
                vec![json::Texture {
                    name: None,
                    sampler: None,
                    source: json::Index::new(0),
                    extensions: Default::default(),
                    extras: Default::default(),
                }],
            ),
            None => (Vec::new(), Vec::new()),
        };

        let node_extensions = self.light.map(|_| json::extensions::scene::Node {
            khr_lights_punctual: Some(json::extensions::scene::khr_lights_punctual::KhrLightsPunctual {
                light: json::Index::new(0),
            }),
            ..Default::default()
        });
        let root_extensions = self.light.map(|light| json::extensions::root::Root {
            khr_lights_punctual: Some(json::extensions::root::KhrLightsPunctual {
                lights: vec![light.to_json()],
            }),
            ..Default::default()
        });

        json::Root {
            accessors,
            animations: Vec::new(),
            asset: json::Asset {
                copyright: None,
                extensions: Default::default(),
                extras: Default::default(),
                generator: Some(self.generator.clone()),
                min_version: None,
                version: "2.0".to_string(),
            },
            buffers,
            buffer_views,
            cameras: Vec::new(),
            extensions: root_extensions,
            extensions_required: self.extensions_required.clone(),
            extensions_used: self.extensions_used.clone(),
            extras: Default::default(),
            images,
            materials: vec![self.build_material()],
            meshes: vec![json::Mesh {
                extensions: Default::default(),
                extras: Default::default(),
                name: self.mesh_name.clone(),
                primitives: vec![primitive],
                weights: None,
            }],
            nodes: vec![json::Node {
                camera: None,
                children: None,
                extensions: node_extensions,
                extras: Default::default(),
                matrix: None,
                mesh: Some(json::Index::new(0)),
                name: self.node_name.clone(),
                rotation: None,
                scale: None,
                skin: None,
                translation: None,
                weights: None,
            }],
            samplers: Vec::new(),
            scene: Some(json::Index::new(0)),
            scenes: vec![json::Scene {
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                nodes: vec![json::Index::new(0)],
            }],
            skins: Vec::new(),
            textures,
        }
    }

    fn build_material(&self) -> json::Material {
        let spec = &self.material;
        let texture_info = || json::texture::Info {
            index: json::Index::new(0),
            tex_coord: 0,
            extensions: Default::default(),
            extras: Default::default(),
        };
        let base_color_texture = self.texture.as_ref().map(|_| texture_info());
        let emissive_texture = match &self.texture {
            Some((_, TextureSlots::BaseAndEmissive)) => Some(texture_info()),
            _ => None,
        };
        let extensions = self.unlit.then(|| json::extensions::material::Material {
            unlit: Some(json::extensions::material::Unlit {}),
            ..Default::default()
        });

        json::Material {
            alpha_cutoff: None,
            alpha_mode: Valid(match spec.alpha_mode {
                AlphaMode::Opaque => json::material::AlphaMode::Opaque,
                AlphaMode::Blend => json::material::AlphaMode::Blend,
            }),
            double_sided: spec.double_sided,
            name: Some(spec.name.clone()),
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_factor: json::material::PbrBaseColorFactor(spec.base_color),
                base_color_texture,
                metallic_factor: json::material::StrengthFactor(spec.metallic),
                roughness_factor: json::material::StrengthFactor(spec.roughness),
                metallic_roughness_texture: None,
                extensions: Default::default(),
                extras: Default::default(),
            },
            normal_texture: None,
            occlusion_texture: None,
            emissive_texture,
            emissive_factor: json::material::EmissiveFactor(spec.emissive),
            extensions,
            extras: Default::default(),
        }
    }
}

fn buffer_view(region: &BufferRegion) -> json::buffer::View {
    let target = match region.usage {
        RegionUsage::Vertex => json::buffer::Target::ArrayBuffer,
        RegionUsage::Index => json::buffer::Target::ElementArrayBuffer,
    };
    json::buffer::View {
        buffer: json::Index::new(0),
        byte_length: (region.byte_length as u64).into(),
        byte_offset: Some((region.byte_offset as u64).into()),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        target: Some(Valid(target)),
    }
}

/// Accessor over one region; views are created one per region, in region order
fn accessor(index: RegionIndex, region: &BufferRegion) -> json::Accessor {
    let component_type = match region.usage {
        RegionUsage::Vertex => json::accessor::ComponentType::F32,
        RegionUsage::Index => json::accessor::ComponentType::U16,
    };
    let type_ = match region.shape {
        ElementShape::Scalar => json::accessor::Type::Scalar,
        ElementShape::Vec2 => json::accessor::Type::Vec2,
        ElementShape::Vec3 => json::accessor::Type::Vec3,
        ElementShape::Vec4 => json::accessor::Type::Vec4,
    };
    json::Accessor {
        buffer_view: Some(json::Index::new(index.0)),
        byte_offset: Some(0u64.into()),
        count: region.element_count.into(),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min: None,
        max: None,
        name: None,
        normalized: false,
        sparse: None,
    }
}

fn push_accessor(
    accessors: &mut Vec<json::Accessor>,
    accessor: json::Accessor,
) -> json::Index<json::Accessor> {
    accessors.push(accessor);
    json::Index::new(accessors.len() as u32 - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferBuilder;
    use crate::mesh::pack_surface;
    use crate::surface::{Orientation, SphereParams, TorusParams};
    use crate::uri::decode_data_uri;

    fn packed_sphere() -> PackedMesh {
        let mesh = SphereParams::new(0.5, 4, 4, Orientation::Outward)
            .unwrap()
            .generate();
        pack_surface(&mesh).unwrap()
    }

    #[test]
    fn test_views_and_accessors_follow_regions() {
        let packed = packed_sphere();
        let root = GltfBuilder::new("test")
            .name("Sphere")
            .buffer_source(BufferSource::External("sphere.bin".to_string()))
            .build(&packed);

        assert_eq!(root.buffer_views.len(), 4);
        assert_eq!(root.accessors.len(), 4);
        assert_eq!(root.buffers[0].uri.as_deref(), Some("sphere.bin"));
        assert_eq!(root.buffers[0].byte_length.0, packed.buffer.data.len() as u64);

        for (view, region) in root.buffer_views.iter().zip(&packed.buffer.regions) {
            assert_eq!(view.byte_offset.map(|o| o.0), Some(region.byte_offset as u64));
            assert_eq!(view.byte_length.0, region.byte_length as u64);
        }
        assert_eq!(
            root.buffer_views[3].target,
            Some(Valid(json::buffer::Target::ElementArrayBuffer))
        );
        assert_eq!(
            root.buffer_views[0].target,
            Some(Valid(json::buffer::Target::ArrayBuffer))
        );

        assert_eq!(root.accessors[0].count.0, 16);
        assert_eq!(root.accessors[3].count.0, 54);
        assert!(root.accessors[0].min.is_some());
        assert!(root.accessors[1].min.is_none());
        assert_eq!(root.nodes[0].name.as_deref(), Some("Sphere"));

        let types: Vec<_> = root.accessors.iter().map(|a| a.type_.clone()).collect();
        assert_eq!(
            types,
            vec![
                Valid(json::accessor::Type::Vec3),
                Valid(json::accessor::Type::Vec3),
                Valid(json::accessor::Type::Vec2),
                Valid(json::accessor::Type::Scalar),
            ]
        );
    }

    #[test]
    fn test_four_component_region_maps_to_vec4() {
        let mut builder = BufferBuilder::new();
        let colors = builder.pack_floats(&[[1.0f32, 0.5, 0.25, 1.0]; 3]);
        let packed = builder.finish();

        let color_accessor = accessor(colors, packed.region(colors));
        assert_eq!(color_accessor.type_, Valid(json::accessor::Type::Vec4));
        assert_eq!(color_accessor.count.0, 3);
    }

    #[test]
    fn test_computed_bounds_by_default() {
        let packed = packed_sphere();
        let root = GltfBuilder::new("test").build(&packed);
        assert_eq!(root.accessors[0].min, Some(packed.bounds.min_value()));
        assert_eq!(root.accessors[0].max, Some(packed.bounds.max_value()));

        let root = GltfBuilder::new("test")
            .declared_bounds(Bounds::cube(50.0))
            .build(&packed);
        assert_eq!(root.accessors[0].max, Some(Bounds::cube(50.0).max_value()));
    }

    #[test]
    fn test_inline_buffer_roundtrips() {
        let packed = packed_sphere();
        let root = GltfBuilder::new("test").build(&packed);
        let uri = root.buffers[0].uri.as_deref().unwrap();
        let decoded = decode_data_uri(uri).unwrap();
        assert_eq!(decoded.media_type, OCTET_STREAM);
        assert_eq!(decoded.data, packed.buffer.data);
    }

    #[test]
    fn test_extensions_registered_once() {
        let packed = packed_sphere();
        let root = GltfBuilder::new("test")
            .unlit()
            .unlit()
            .point_light(PointLight::default())
            .point_light(PointLight {
                intensity: 10.0,
                ..Default::default()
            })
            .build(&packed);

        assert_eq!(root.extensions_used, vec![KHR_MATERIALS_UNLIT, KHR_LIGHTS_PUNCTUAL]);
        assert_eq!(root.extensions_required, vec![KHR_MATERIALS_UNLIT]);

        let lights = &root
            .extensions
            .as_ref()
            .unwrap()
            .khr_lights_punctual
            .as_ref()
            .unwrap()
            .lights;
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].intensity, 10.0);

        let node_light = root.nodes[0]
            .extensions
            .as_ref()
            .unwrap()
            .khr_lights_punctual
            .as_ref()
            .unwrap();
        assert_eq!(node_light.light.value(), 0);
        assert!(root.materials[0].extensions.as_ref().unwrap().unlit.is_some());
    }

    #[test]
    fn test_texture_slots() {
        let packed = packed_sphere();
        let root = GltfBuilder::new("test")
            .texture("mars_texture.jpg", TextureSlots::BaseAndEmissive)
            .build(&packed);
        assert_eq!(root.images[0].uri.as_deref(), Some("mars_texture.jpg"));
        assert_eq!(root.textures.len(), 1);
        assert!(root.materials[0].emissive_texture.is_some());

        let root = GltfBuilder::new("test")
            .texture("sky.jpg", TextureSlots::Base)
            .build(&packed);
        assert!(root.materials[0].emissive_texture.is_none());
        assert!(
            root.materials[0]
                .pbr_metallic_roughness
                .base_color_texture
                .is_some()
        );
    }

    #[test]
    fn test_torus_document_has_no_texcoords() {
        let mesh = TorusParams::new(1.0, 0.1, 8, 4).unwrap().generate();
        let packed = pack_surface(&mesh).unwrap();
        let root = GltfBuilder::new("test").build(&packed);
        let primitive = &root.meshes[0].primitives[0];

        assert_eq!(root.accessors.len(), 3);
        assert_eq!(primitive.attributes.len(), 2);
        assert_eq!(primitive.indices.map(|i| i.value()), Some(2));
        assert!(root.meshes[0].name.is_none());
    }
}
