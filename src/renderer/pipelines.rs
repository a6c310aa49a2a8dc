// renderer/pipelines.rs
//! Pipeline state for the two passes: the lit scene and the screen-space
//! card overlay.

use std::mem;

use crate::asset::Vertex;
use crate::renderer::Material;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// position, normal, uv
const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2
];

pub fn mesh_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRIBUTES,
    }
}

/// Depth attachment sized to the surface. Recreated on every resize.
pub fn depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("SceneDepth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

/// Scene pipelines differ only in culling and depth writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub double_sided: bool,
    pub depth_write: bool,
}

impl PipelineKey {
    pub const ALL: [Self; 4] = [
        Self { double_sided: false, depth_write: true },
        Self { double_sided: true, depth_write: true },
        Self { double_sided: false, depth_write: false },
        Self { double_sided: true, depth_write: false },
    ];

    pub fn for_material(material: &Material) -> Self {
        Self {
            double_sided: material.is_double_sided(),
            depth_write: material.writes_depth(),
        }
    }

    fn cull_mode(&self) -> Option<wgpu::Face> {
        (!self.double_sided).then_some(wgpu::Face::Back)
    }

    fn depth_stencil(&self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: self.depth_write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

struct PassState<'a> {
    label: &'a str,
    buffers: &'a [wgpu::VertexBufferLayout<'a>],
    blend: wgpu::BlendState,
    cull_mode: Option<wgpu::Face>,
    depth_stencil: Option<wgpu::DepthStencilState>,
}

fn build(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    state: PassState<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(state.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: state.buffers,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(state.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: state.cull_mode,
            ..Default::default()
        },
        depth_stencil: state.depth_stencil,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Opaque lit pass over scene meshes.
pub fn scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    build(
        device,
        layout,
        shader,
        format,
        PassState {
            label: "ScenePipeline",
            buffers: &[mesh_vertex_layout()],
            blend: wgpu::BlendState::REPLACE,
            cull_mode: key.cull_mode(),
            depth_stencil: Some(key.depth_stencil()),
        },
    )
}

/// Alpha-blended quads generated from the vertex index; no vertex buffers
/// and no depth.
pub fn overlay_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    build(
        device,
        layout,
        shader,
        format,
        PassState {
            label: "OverlayPipeline",
            buffers: &[],
            blend: wgpu::BlendState::ALPHA_BLENDING,
            cull_mode: None,
            depth_stencil: None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MaterialFlags;

    #[test]
    fn mesh_layout_matches_vertex() {
        let layout = mesh_vertex_layout();
        assert_eq!(layout.array_stride, mem::size_of::<Vertex>() as u64);
        assert_eq!(MESH_ATTRIBUTES[1].offset, 12);
        assert_eq!(MESH_ATTRIBUTES[2].offset, 24);
    }

    #[test]
    fn sky_material_gets_unculled_read_only_depth() {
        let sky = Material::white()
            .double_sided()
            .with_flags(MaterialFlags::NO_DEPTH_WRITE);
        let key = PipelineKey::for_material(&sky);
        assert!(key.double_sided && !key.depth_write);
        assert_eq!(key.cull_mode(), None);
        assert!(!key.depth_stencil().depth_write_enabled);
        assert!(PipelineKey::ALL.contains(&key));
    }

    #[test]
    fn plain_material_is_back_face_culled() {
        let key = PipelineKey::for_material(&Material::white());
        assert_eq!(key.cull_mode(), Some(wgpu::Face::Back));
        assert!(key.depth_stencil().depth_write_enabled);
        assert!(PipelineKey::ALL.contains(&key));
    }
}
