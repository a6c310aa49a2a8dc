// renderer/gpu.rs
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::asset::{Assets, Handle, ImageData, MeshData};
use crate::error::RenderError;
use crate::frame::{Frame, OverlayDraw, RenderTarget};
use crate::renderer::pipelines::{self, PipelineKey};
use crate::renderer::texture::Texture;
use crate::renderer::uniforms::{GlobalsUniform, ObjectUniform, QuadFill, QuadUniform, UNIFORM_STRIDE};
use crate::scene::{collect_draws, DrawItem};

const INITIAL_OBJECTS_CAPACITY: u64 = 64;
/// Backdrop, card image and close control.
const OVERLAY_QUADS: u64 = 3;

const OVERLAY_BACKDROP_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.75];
const OVERLAY_CONTENT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const OVERLAY_CLOSE_COLOR: [f32; 4] = [0.12, 0.12, 0.12, 0.9];

fn binding_size<T>() -> Option<wgpu::BufferSize> {
    wgpu::BufferSize::new(mem::size_of::<T>() as u64)
}

fn uniform_layout_entry(
    visibility: wgpu::ShaderStages,
    dynamic: bool,
    min_binding_size: Option<wgpu::BufferSize>,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: dynamic,
            min_binding_size,
        },
        count: None,
    }
}

/// Bind group over one `T`-sized window of `buffer`, moved with dynamic
/// offsets.
fn dynamic_bind_group<T>(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: binding_size::<T>(),
            }),
        }],
    })
}

fn strided_buffer(device: &wgpu::Device, label: &str, count: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: count.max(1) * UNIFORM_STRIDE,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Pack `items` at `UNIFORM_STRIDE` intervals.
fn write_strided<T: bytemuck::Pod>(scratch: &mut Vec<u8>, items: impl IntoIterator<Item = T>) {
    scratch.clear();
    for item in items {
        let start = scratch.len();
        scratch.extend_from_slice(bytemuck::bytes_of(&item));
        scratch.resize(start + UNIFORM_STRIDE as usize, 0);
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, mesh: &MeshData) -> Option<Self> {
        if mesh.indices().is_empty() || mesh.vertices().is_empty() {
            return None;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&mesh.label),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&mesh.label),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices().len() as u32,
        })
    }
}

/// wgpu renderer for the greeting scene: one lit forward pass over the
/// draw list, then the card overlay in screen space.
pub struct Renderer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: wgpu::TextureView,
    pixel_ratio: f64,

    globals_buf: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    objects_layout: wgpu::BindGroupLayout,
    objects_buf: wgpu::Buffer,
    objects_capacity: u64,
    objects_bind_group: wgpu::BindGroup,
    scratch: Vec<u8>,

    texture_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    overlay_pipeline: wgpu::RenderPipeline,
    quads_buf: wgpu::Buffer,
    quads_bind_group: wgpu::BindGroup,

    meshes: HashMap<Handle<MeshData>, GpuMesh>,
    textures: HashMap<Handle<ImageData>, Texture>,
    white: Texture,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let backends = if cfg!(target_arch = "wasm32") {
            wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL
        } else {
            wgpu::Backends::all()
        };

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|err| RenderError::CreateSurface(err.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| RenderError::Adapter(err.to_string()))?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let required_limits = if cfg!(target_arch = "wasm32") {
            wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits())
        } else {
            wgpu::Limits::default()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| RenderError::Device(err.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| RenderError::CreateSurface("surface reports no formats".to_string()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth = pipelines::depth_view(&device, config.width, config.height);

        // Group 0: per-frame globals.
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("GlobalsBindLayout"),
            entries: &[uniform_layout_entry(
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                false,
                binding_size::<GlobalsUniform>(),
            )],
        });
        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("GlobalsBuffer"),
            size: mem::size_of::<GlobalsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GlobalsBindGroup"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        // Group 1: per-object uniforms at dynamic offsets.
        let objects_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ObjectsBindLayout"),
            entries: &[uniform_layout_entry(
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                true,
                binding_size::<ObjectUniform>(),
            )],
        });
        let objects_buf = strided_buffer(&device, "ObjectsBuffer", INITIAL_OBJECTS_CAPACITY);
        let objects_bind_group =
            dynamic_bind_group::<ObjectUniform>(&device, "ObjectsBindGroup", &objects_layout, &objects_buf);

        // Group 2: base color texture.
        let texture_layout = Texture::bind_group_layout(&device);
        let white = Texture::white(&device, &queue, &texture_layout);

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("SceneShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/scene.wgsl").into()),
        });
        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ScenePipelineLayout"),
            bind_group_layouts: &[&globals_layout, &objects_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let pipelines = PipelineKey::ALL
            .into_iter()
            .map(|key| {
                let pipeline =
                    pipelines::scene_pipeline(&device, &scene_layout, &scene_shader, config.format, key);
                (key, pipeline)
            })
            .collect();

        // Overlay: quad uniforms at dynamic offsets plus the card texture.
        let quads_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("OverlayBindLayout"),
            entries: &[uniform_layout_entry(
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                true,
                binding_size::<QuadUniform>(),
            )],
        });
        let quads_buf = strided_buffer(&device, "OverlayBuffer", OVERLAY_QUADS);
        let quads_bind_group =
            dynamic_bind_group::<QuadUniform>(&device, "OverlayBindGroup", &quads_layout, &quads_buf);
        let overlay_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("OverlayShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/overlay.wgsl").into()),
        });
        let overlay_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("OverlayPipelineLayout"),
            bind_group_layouts: &[&quads_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let overlay_pipeline =
            pipelines::overlay_pipeline(&device, &overlay_layout, &overlay_shader, config.format);

        log::info!(
            "Renderer ready: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth,
            pixel_ratio: 1.0,
            globals_buf,
            globals_bind_group,
            objects_layout,
            objects_buf,
            objects_capacity: INITIAL_OBJECTS_CAPACITY,
            objects_bind_group,
            scratch: Vec::new(),
            texture_layout,
            pipelines,
            overlay_pipeline,
            quads_buf,
            quads_bind_group,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            white,
        })
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth = pipelines::depth_view(&self.device, self.config.width, self.config.height);
    }

    fn upload_texture(&mut self, assets: &Assets, handle: Handle<ImageData>) {
        if self.textures.contains_key(&handle) {
            return;
        }
        if let Some(image) = assets.images.get(handle) {
            let texture = Texture::from_image(&self.device, &self.queue, &self.texture_layout, image);
            self.textures.insert(handle, texture);
        }
    }

    /// Mirror any meshes and textures this frame needs that are not on the
    /// GPU yet.
    fn upload_missing(&mut self, assets: &Assets, draws: &[DrawItem], overlay: Option<&OverlayDraw>) {
        for draw in draws {
            if !self.meshes.contains_key(&draw.mesh) {
                if let Some(mesh) = assets.meshes.get(draw.mesh).and_then(|m| GpuMesh::upload(&self.device, m)) {
                    self.meshes.insert(draw.mesh, mesh);
                }
            }
            if let Some(texture) = draw.material.texture {
                self.upload_texture(assets, texture);
            }
        }
        if let Some(texture) = overlay.and_then(|o| o.texture) {
            self.upload_texture(assets, texture);
        }
    }

    fn write_objects(&mut self, draws: &[DrawItem]) {
        let required = draws.len() as u64;
        if required > self.objects_capacity {
            let new_capacity = required.max(self.objects_capacity * 2);
            log::info!(
                "Growing objects buffer: {} -> {}",
                self.objects_capacity,
                new_capacity
            );
            self.objects_buf = strided_buffer(&self.device, "ObjectsBuffer", new_capacity);
            self.objects_bind_group = dynamic_bind_group::<ObjectUniform>(
                &self.device,
                "ObjectsBindGroup",
                &self.objects_layout,
                &self.objects_buf,
            );
            self.objects_capacity = new_capacity;
        }

        write_strided(
            &mut self.scratch,
            draws.iter().map(|d| ObjectUniform::new(d.model, &d.material)),
        );
        if !self.scratch.is_empty() {
            self.queue.write_buffer(&self.objects_buf, 0, &self.scratch);
        }
    }

    fn texture_for(&self, handle: Option<Handle<ImageData>>) -> &Texture {
        handle
            .and_then(|h| self.textures.get(&h))
            .unwrap_or(&self.white)
    }

    fn draw_overlay(&mut self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView, overlay: &OverlayDraw) {
        let layout = overlay.layout;
        let viewport = layout.backdrop;
        write_strided(
            &mut self.scratch,
            [
                QuadUniform::new(layout.backdrop, viewport, OVERLAY_BACKDROP_COLOR, QuadFill::Solid),
                QuadUniform::new(layout.content, viewport, OVERLAY_CONTENT_COLOR, QuadFill::Textured),
                QuadUniform::new(layout.close, viewport, OVERLAY_CLOSE_COLOR, QuadFill::Close),
            ],
        );
        self.queue.write_buffer(&self.quads_buf, 0, &self.scratch);

        let card = self.texture_for(overlay.texture);
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("OverlayPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.overlay_pipeline);
        for (index, texture) in [&self.white, card, &self.white].into_iter().enumerate() {
            let offset = (index as u64 * UNIFORM_STRIDE) as u32;
            pass.set_bind_group(0, &self.quads_bind_group, &[offset]);
            pass.set_bind_group(1, &texture.bind_group, &[]);
            pass.draw(0..6, 0..1);
        }
    }
}

impl RenderTarget for Renderer {
    fn set_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        if ratio != self.pixel_ratio {
            log::debug!("Pixel ratio {} -> {}", self.pixel_ratio, ratio);
        }
        self.pixel_ratio = ratio;
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        let draws = collect_draws(frame.registry, frame.assets, frame.camera);
        self.upload_missing(frame.assets, &draws, frame.overlay.as_ref());

        let globals = GlobalsUniform::new(frame.camera, frame.environment, frame.view_opacity);
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));
        self.write_objects(&draws);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Encoder"),
            });

        let clear = frame.environment.clear_color();
        let opacity = f64::from(frame.view_opacity.clamp(0.0, 1.0));
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ScenePass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r * opacity,
                            g: clear.g * opacity,
                            b: clear.b * opacity,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.globals_bind_group, &[]);
            for (index, draw) in draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&draw.mesh) else {
                    continue;
                };
                let Some(pipeline) = self.pipelines.get(&PipelineKey::for_material(&draw.material)) else {
                    continue;
                };
                let offset = (index as u64 * UNIFORM_STRIDE) as u32;

                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, &self.objects_bind_group, &[offset]);
                pass.set_bind_group(2, &self.texture_for(draw.material.texture).bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        if let Some(overlay) = frame.overlay.as_ref() {
            self.draw_overlay(&mut encoder, &view, overlay);
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strided_writes_pad_each_item() {
        let mut scratch = Vec::new();
        write_strided(&mut scratch, [1u32, 2, 3]);
        assert_eq!(scratch.len(), 3 * UNIFORM_STRIDE as usize);
        assert_eq!(&scratch[UNIFORM_STRIDE as usize..UNIFORM_STRIDE as usize + 4], &2u32.to_ne_bytes());
    }
}
