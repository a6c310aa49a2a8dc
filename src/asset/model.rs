use std::path::{Path, PathBuf};

use glam::{Quat, Vec3, Vec4};
use hecs::Entity;

use super::{Assets, ImageData, MeshData, Vertex};
use crate::error::AssetError;
use crate::renderer::Material;
use crate::scene::{EntityBuilder, SceneRegistry, Transform};

/// One drawable piece of a node: geometry plus its base color inputs.
#[derive(Debug, Clone)]
pub struct RawPrimitive {
    pub mesh: MeshData,
    pub base_color: Vec4,
    /// Index into [`RawModel::images`].
    pub texture: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct RawNode {
    pub name: String,
    pub transform: Transform,
    /// Index of the parent in [`RawModel::nodes`]; parents always come first.
    pub parent: Option<usize>,
    pub primitives: Vec<RawPrimitive>,
}

/// A decoded glTF model that is not yet part of any scene. Built off the
/// main thread, then handed over whole.
#[derive(Debug, Clone)]
pub struct RawModel {
    pub source: PathBuf,
    pub nodes: Vec<RawNode>,
    pub images: Vec<Option<ImageData>>,
}

impl RawModel {
    /// Read and decode a `.glb`/`.gltf` file with embedded buffers.
    pub fn import(path: &Path) -> Result<Self, AssetError> {
        log::info!("=== Loading glTF: {:?} ===", path);
        let bytes = crate::io::load_binary(path)?;
        Self::from_slice(&bytes, path)
    }

    pub fn from_slice(bytes: &[u8], source: &Path) -> Result<Self, AssetError> {
        let (document, buffers, images) =
            gltf::import_slice(bytes).map_err(|err| AssetError::Gltf {
                path: source.to_path_buf(),
                source: err,
            })?;

        log::info!(
            "Document info: {} meshes, {} materials, {} images, {} scenes",
            document.meshes().len(),
            document.materials().len(),
            document.images().len(),
            document.scenes().len()
        );

        let images = images
            .into_iter()
            .enumerate()
            .map(|(i, data)| {
                let image = ImageData::from_gltf(format!("{}#image{}", source.display(), i), data);
                if image.is_none() {
                    log::warn!("  Image {} has an unsupported pixel format, ignoring", i);
                }
                image
            })
            .collect();

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| AssetError::NoGeometry {
                path: source.to_path_buf(),
            })?;

        let mut nodes = Vec::new();
        let mut stack: Vec<(gltf::Node, Option<usize>)> = scene.nodes().map(|n| (n, None)).collect();
        stack.reverse();
        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            nodes.push(Self::read_node(&node, parent, &buffers)?);
            let children: Vec<_> = node.children().collect();
            for child in children.into_iter().rev() {
                stack.push((child, Some(index)));
            }
        }

        let primitive_count: usize = nodes.iter().map(|n| n.primitives.len()).sum();
        if primitive_count == 0 {
            return Err(AssetError::NoGeometry {
                path: source.to_path_buf(),
            });
        }
        log::info!(
            "=== glTF decoded: {} nodes, {} primitives ===",
            nodes.len(),
            primitive_count
        );

        Ok(Self {
            source: source.to_path_buf(),
            nodes,
            images,
        })
    }

    fn read_node(
        node: &gltf::Node,
        parent: Option<usize>,
        buffers: &[gltf::buffer::Data],
    ) -> Result<RawNode, AssetError> {
        let name = node.name().unwrap_or("Unnamed").to_string();
        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform::from_trs(
            Vec3::from(translation),
            Quat::from_array(rotation),
            Vec3::from(scale),
        );
        log::debug!("  Node '{}' (parent: {:?}): {:?}", name, parent, transform);

        let mut primitives = Vec::new();
        if let Some(mesh) = node.mesh() {
            let mesh_name = mesh.name().unwrap_or("Unnamed");
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!(
                        "  Skipping non-triangle primitive {} of '{}'",
                        primitive.index(),
                        mesh_name
                    );
                    continue;
                }
                primitives.push(Self::read_primitive(mesh_name, &primitive, buffers)?);
            }
        }

        Ok(RawNode {
            name,
            transform,
            parent,
            primitives,
        })
    }

    fn read_primitive(
        mesh_name: &str,
        primitive: &gltf::Primitive,
        buffers: &[gltf::buffer::Data],
    ) -> Result<RawPrimitive, AssetError> {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|b| &b.0[..]));

        let positions = reader
            .read_positions()
            .ok_or_else(|| AssetError::MissingAttribute {
                mesh: mesh_name.to_string(),
                primitive: primitive.index(),
                attribute: "POSITION",
            })?
            .collect::<Vec<_>>();

        let normals = reader
            .read_normals()
            .map(|n| n.collect::<Vec<_>>())
            .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);

        let uvs = reader
            .read_tex_coords(0)
            .map(|uv| uv.into_f32().collect::<Vec<_>>())
            .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

        let indices = reader
            .read_indices()
            .map(|i| i.into_u32().collect::<Vec<_>>())
            .unwrap_or_else(|| (0..positions.len() as u32).collect());

        log::trace!(
            "    Primitive: {} vertices, {} indices",
            positions.len(),
            indices.len()
        );

        let vertices = positions
            .iter()
            .zip(normals.iter().chain(std::iter::repeat(&[0.0, 1.0, 0.0])))
            .zip(uvs.iter().chain(std::iter::repeat(&[0.0, 0.0])))
            .map(|((pos, normal), uv)| Vertex {
                pos: *pos,
                normal: *normal,
                uv: *uv,
            })
            .collect();

        let material = primitive.material();
        let pbr = material.pbr_metallic_roughness();
        let texture = pbr
            .base_color_texture()
            .map(|info| info.texture().source().index());

        Ok(RawPrimitive {
            mesh: MeshData::new(
                format!("{}#{}", mesh_name, primitive.index()),
                vertices,
                indices,
            ),
            base_color: Vec4::from(pbr.base_color_factor()),
            texture,
        })
    }

    /// Move the model into the scene under a new, hidden wrapper entity and
    /// return the wrapper. The wrapper stays hidden until the caller reveals
    /// it, so a half-placed model is never drawn.
    pub fn instantiate(self, registry: &mut SceneRegistry, assets: &mut Assets) -> Entity {
        let label = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());

        let textures: Vec<_> = self
            .images
            .into_iter()
            .map(|image| image.map(|i| assets.images.insert(i)))
            .collect();

        let wrapper = EntityBuilder::new()
            .with_name(label)
            .visible(false)
            .spawn(registry);

        let mut node_entities: Vec<Entity> = Vec::with_capacity(self.nodes.len());
        for node in self.nodes {
            let parent = node
                .parent
                .and_then(|p| node_entities.get(p).copied())
                .unwrap_or(wrapper);
            let entity = EntityBuilder::new()
                .with_name(node.name)
                .with_transform(node.transform)
                .child_of(parent)
                .spawn(registry);

            for primitive in node.primitives {
                let mut material = Material::default().with_base_color(primitive.base_color);
                material.texture = primitive.texture.and_then(|t| textures.get(t).copied().flatten());
                let label = primitive.mesh.label.clone();
                let mesh = assets.meshes.insert(primitive.mesh);
                EntityBuilder::new()
                    .with_name(label)
                    .with_mesh(mesh)
                    .with_material(material)
                    .child_of(entity)
                    .spawn(registry);
            }
            node_entities.push(entity);
        }

        wrapper
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Single triangle spanning (-2,-1,-3)..(4,5,1), nested one node deep.
    pub const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [
            { "name": "root", "children": [1] },
            { "name": "slice", "mesh": 0 }
        ],
        "meshes": [
            { "name": "cake", "primitives": [ { "attributes": { "POSITION": 0 } } ] }
        ],
        "accessors": [
            {
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [-2.0, -1.0, -3.0],
                "max": [4.0, 5.0, 1.0]
            }
        ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "buffers": [
            {
                "byteLength": 36,
                "uri": "data:application/octet-stream;base64,AAAAwAAAgL8AAEDAAACAQAAAoEAAAIA/AAAAAAAAAAAAAAAA"
            }
        ]
    }"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::TRIANGLE_GLTF;
    use super::*;

    #[test]
    fn imports_nodes_in_parent_first_order() {
        let model = RawModel::from_slice(TRIANGLE_GLTF.as_bytes(), Path::new("cake.gltf")).unwrap();
        assert_eq!(model.nodes.len(), 2);
        assert_eq!(model.nodes[0].name, "root");
        assert_eq!(model.nodes[1].parent, Some(0));
        assert_eq!(model.nodes[1].primitives.len(), 1);

        let mesh = &model.nodes[1].primitives[0].mesh;
        // No index accessor: sequential indices are generated.
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.vertices()[0].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn instantiated_model_is_hidden_until_revealed() {
        let model = RawModel::from_slice(TRIANGLE_GLTF.as_bytes(), Path::new("cake.gltf")).unwrap();
        let mut registry = SceneRegistry::new();
        let mut assets = Assets::new();
        let root = model.instantiate(&mut registry, &mut assets);

        assert_eq!(registry.name(root).as_deref(), Some("cake"));
        assert!(!registry.is_visible(root));
        assert_eq!(assets.meshes.len(), 1);

        let bounds = registry.subtree_bounds(root, &assets).unwrap();
        assert!(bounds.min.abs_diff_eq(Vec3::new(-2.0, -1.0, -3.0), 1e-6));
        assert!(bounds.max.abs_diff_eq(Vec3::new(4.0, 5.0, 1.0), 1e-6));
    }

    #[test]
    fn garbage_is_a_gltf_error() {
        let err = RawModel::from_slice(b"not a model", Path::new("x.glb")).unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }
}
