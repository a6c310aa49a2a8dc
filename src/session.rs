//! The session context: every piece of mutable scene, camera and UI state,
//! created once at startup and passed to the component operations.

use std::time::Duration;

use glam::Vec2;
use hecs::Entity;

use crate::asset::{loader, Assets, Handle, ImageData, ModelLoad, PendingLoad};
use crate::controls::OrbitControls;
use crate::environment::Environment;
use crate::frame::{Frame, OverlayDraw};
use crate::input::{PointerAction, PointerButton, PointerTracker};
use crate::interaction::{ClickOutcome, InteractionResolver, PickScene, ScreenRect};
use crate::normalize::{AssetNormalizer, NormalizationResult, NormalizeTarget};
use crate::overlay::{OverlayLayout, OverlayState};
use crate::reveal::{RevealEffect, RevealSequencer};
use crate::scene::{dressing, Camera, SceneRegistry};
use crate::settings::SceneSettings;
use crate::surfaces::IntroSurface;

pub struct Session {
    settings: SceneSettings,
    registry: SceneRegistry,
    assets: Assets,
    camera: Camera,
    controls: OrbitControls,
    environment: Environment,
    viewport: ScreenRect,
    pixel_ratio: f32,
    /// Opacity of the 3D view; 0 until the reveal hands off.
    view_opacity: f32,
    reveal: RevealSequencer,
    resolver: InteractionResolver,
    pointer: PointerTracker,
    overlay: OverlayState,
    card_texture: Option<Handle<ImageData>>,
    pending_model: Option<PendingLoad>,
    next_load_id: u64,
    model_root: Option<Entity>,
}

impl Session {
    /// Build the static set for a `width` x `height` viewport. Textures are
    /// read synchronously; the model is loaded later by
    /// [`begin_model_load`](Self::begin_model_load).
    pub fn new(settings: SceneSettings, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        let mut registry = SceneRegistry::new();
        let mut assets = Assets::new();
        let dressing = dressing::dress(
            &mut registry,
            &mut assets,
            &settings.backdrop,
            &settings.photos,
            &settings.card,
        );
        registry.propagate_transforms();

        let camera = Camera::from_settings(&settings.camera, width as f32 / height as f32);
        let controls = OrbitControls::from_settings(&settings.camera);
        let reveal = RevealSequencer::from_settings(&settings.reveal);
        let resolver = InteractionResolver::new(settings.card.name.clone());

        Self {
            registry,
            assets,
            camera,
            controls,
            environment: Environment::default(),
            viewport: ScreenRect::from_size(width as f32, height as f32),
            pixel_ratio: 1.0,
            view_opacity: 0.0,
            reveal,
            resolver,
            pointer: PointerTracker::new(),
            overlay: OverlayState::default(),
            card_texture: dressing.card_texture,
            pending_model: None,
            next_load_id: 0,
            model_root: None,
            settings,
        }
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn viewport(&self) -> ScreenRect {
        self.viewport
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn reveal(&self) -> &RevealSequencer {
        &self.reveal
    }

    pub fn view_opacity(&self) -> f32 {
        self.view_opacity
    }

    pub fn is_interactive(&self) -> bool {
        self.resolver.is_enabled()
    }

    pub fn model_root(&self) -> Option<Entity> {
        self.model_root
    }

    pub fn pending_model(&self) -> Option<&PendingLoad> {
        self.pending_model.as_ref()
    }

    pub(crate) fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = ScreenRect::from_size(width as f32, height as f32);
        self.camera.aspect = width as f32 / height as f32;
    }

    pub(crate) fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    pub(crate) fn update_controls(&mut self) {
        self.controls.update(&mut self.camera);
    }

    /// Current overlay layout, also used for drawing.
    pub fn overlay_layout(&self) -> OverlayLayout {
        OverlayLayout::compute(self.viewport, self.settings.card.aspect(), self.pixel_ratio)
    }

    pub fn frame(&self) -> Frame<'_> {
        let overlay = self.overlay.is_visible().then(|| OverlayDraw {
            layout: self.overlay_layout(),
            texture: self.card_texture,
        });
        Frame {
            registry: &self.registry,
            assets: &self.assets,
            camera: &self.camera,
            environment: &self.environment,
            view_opacity: self.view_opacity,
            overlay,
        }
    }

    // Reveal

    pub fn start_reveal(&mut self, now: Duration) {
        self.reveal.start(now);
    }

    /// Run due reveal ticks and apply their effects. Returns `true` on the
    /// poll that performed the hand-off.
    pub fn poll_reveal(&mut self, now: Duration, intro: &mut dyn IntroSurface) -> bool {
        let mut handed_off = false;
        for effect in self.reveal.poll(now) {
            match effect {
                RevealEffect::Text(text) => intro.set_text(&text),
                RevealEffect::HandOff => {
                    intro.hand_off();
                    self.view_opacity = 1.0;
                    self.resolver.enable();
                    handed_off = true;
                }
            }
        }
        handed_off
    }

    pub fn next_reveal_deadline(&self) -> Option<Duration> {
        self.reveal.next_deadline()
    }

    // Model

    /// Start the single model load. `deliver` must route the outcome back
    /// to [`install_model`](Self::install_model) on the main loop.
    pub fn begin_model_load<F>(&mut self, deliver: F) -> &PendingLoad
    where
        F: FnOnce(ModelLoad) + loader::MaybeSend + 'static,
    {
        if let Some(previous) = self.pending_model.take() {
            previous.cancel();
        }
        self.next_load_id += 1;
        let path = self.settings.model.path.clone();
        log::info!("Loading model {:?}", path);
        self.pending_model
            .insert(loader::spawn_load(self.next_load_id, path, deliver))
    }

    /// Place a finished load. Failures and stale or cancelled results leave
    /// the scene as it was.
    pub fn install_model(&mut self, load: ModelLoad) -> Option<NormalizationResult> {
        if !self.pending_model.as_ref().is_some_and(|p| p.accepts(&load)) {
            log::debug!("Dropping stale model load {} ({:?})", load.id, load.path);
            return None;
        }
        self.pending_model = None;

        let raw = match load.result {
            Ok(raw) => raw,
            Err(err) => {
                log::error!("Model load failed: {}", err);
                return None;
            }
        };

        let target = match NormalizeTarget::from_settings(&self.settings.model) {
            Ok(target) => target,
            Err(err) => {
                log::error!("Cannot place model: {}", err);
                return None;
            }
        };

        let root = raw.instantiate(&mut self.registry, &mut self.assets);
        match AssetNormalizer::new(target).run(&mut self.registry, &self.assets, root) {
            Ok(result) => {
                self.model_root = Some(root);
                Some(result)
            }
            Err(err) => {
                log::error!("Model normalization failed: {}", err);
                self.registry.remove(root);
                None
            }
        }
    }

    // Input

    pub fn handle_click(&mut self, point: Vec2) -> ClickOutcome {
        let layout = self.overlay_layout();
        let scene = PickScene {
            registry: &self.registry,
            assets: &self.assets,
            camera: &self.camera,
        };
        self.resolver
            .handle_click(point, self.viewport, &layout, scene, &mut self.overlay)
    }

    pub fn pointer_moved(&mut self, position: Vec2) -> Option<ClickOutcome> {
        let action = self.pointer.moved(position)?;
        self.apply_pointer(action)
    }

    pub fn pointer_pressed(&mut self, button: PointerButton) {
        self.pointer.press(button);
    }

    pub fn pointer_released(&mut self, button: PointerButton) -> Option<ClickOutcome> {
        let action = self.pointer.release(button)?;
        self.apply_pointer(action)
    }

    pub fn pointer_left(&mut self) {
        self.pointer.left();
    }

    /// Wheel input; positive `steps` zoom in.
    pub fn scroll(&mut self, steps: f32) {
        if self.accepts_camera_input() {
            self.controls.zoom(steps);
        }
    }

    fn accepts_camera_input(&self) -> bool {
        self.resolver.is_enabled() && !self.overlay.is_visible()
    }

    fn apply_pointer(&mut self, action: PointerAction) -> Option<ClickOutcome> {
        match action {
            PointerAction::Click(point) => return Some(self.handle_click(point)),
            PointerAction::Rotate(delta) if self.accepts_camera_input() => {
                self.controls.rotate_by_drag(delta, self.viewport.height);
            }
            PointerAction::Pan(delta) if self.accepts_camera_input() => {
                self.controls
                    .pan_by_drag(delta, self.viewport.height, &self.camera);
            }
            PointerAction::Rotate(_) | PointerAction::Pan(_) => {}
        }
        None
    }

    /// Cancel anything in flight. The session stays readable afterwards.
    pub fn shutdown(&mut self) {
        if let Some(pending) = self.pending_model.take() {
            pending.cancel();
        }
    }
}
