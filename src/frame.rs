//! Per-frame update and draw, independent of the GPU backend.

use crate::asset::{Assets, Handle, ImageData};
use crate::environment::Environment;
use crate::error::RenderError;
use crate::overlay::OverlayLayout;
use crate::scene::{Camera, SceneRegistry};
use crate::session::Session;

/// Card overlay drawn on top of the scene.
#[derive(Debug, Clone, Copy)]
pub struct OverlayDraw {
    pub layout: OverlayLayout,
    pub texture: Option<Handle<ImageData>>,
}

/// Everything a render target reads for one frame.
pub struct Frame<'a> {
    pub registry: &'a SceneRegistry,
    pub assets: &'a Assets,
    pub camera: &'a Camera,
    pub environment: &'a Environment,
    /// 0 keeps the 3D view hidden, 1 shows it fully.
    pub view_opacity: f32,
    pub overlay: Option<OverlayDraw>,
}

/// Something that can present frames: the wgpu renderer, or a recorder in
/// tests.
pub trait RenderTarget {
    fn set_size(&mut self, width: u32, height: u32);
    fn set_pixel_ratio(&mut self, ratio: f64);
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError>;
}

/// Advances controls and renders once per display refresh while running.
#[derive(Debug)]
pub struct FrameDriver {
    running: bool,
    frames: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self {
            running: true,
            frames: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Keep the camera aspect and the output size in step with the window.
    /// Zero-sized windows (minimized) are ignored.
    pub fn resize<T: RenderTarget + ?Sized>(
        &mut self,
        session: &mut Session,
        width: u32,
        height: u32,
        target: &mut T,
    ) -> bool {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return false;
        }
        session.set_viewport(width, height);
        target.set_size(width, height);
        true
    }

    pub fn set_pixel_ratio<T: RenderTarget + ?Sized>(
        &mut self,
        session: &mut Session,
        ratio: f64,
        target: &mut T,
    ) {
        session.set_pixel_ratio(ratio as f32);
        target.set_pixel_ratio(ratio);
    }

    /// One frame: damp the orbit controls, refresh world transforms, draw.
    pub fn tick<T: RenderTarget + ?Sized>(
        &mut self,
        session: &mut Session,
        target: &mut T,
    ) -> Result<(), RenderError> {
        if !self.running {
            return Ok(());
        }
        session.update_controls();
        target.render(&session.frame())?;
        self.frames += 1;
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.running {
            log::info!("Frame driver stopped after {} frames", self.frames);
        }
        self.running = false;
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use glam::Vec3;

    /// Records what it was asked to do instead of drawing.
    #[derive(Debug, Default)]
    pub struct RecordingTarget {
        pub sizes: Vec<(u32, u32)>,
        pub pixel_ratio: Option<f64>,
        pub frames: usize,
        pub last_eye: Option<Vec3>,
        pub last_aspect: Option<f32>,
        pub last_opacity: Option<f32>,
        pub overlay_frames: usize,
        pub fail_next: bool,
    }

    impl RenderTarget for RecordingTarget {
        fn set_size(&mut self, width: u32, height: u32) {
            self.sizes.push((width, height));
        }

        fn set_pixel_ratio(&mut self, ratio: f64) {
            self.pixel_ratio = Some(ratio);
        }

        fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
            if std::mem::take(&mut self.fail_next) {
                return Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory));
            }
            self.frames += 1;
            self.last_eye = Some(frame.camera.eye);
            self.last_aspect = Some(frame.camera.aspect);
            self.last_opacity = Some(frame.view_opacity);
            if frame.overlay.is_some() {
                self.overlay_frames += 1;
            }
            Ok(())
        }
    }
}
