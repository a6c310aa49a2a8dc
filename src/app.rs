// app.rs
use std::sync::Arc;

use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::*,
    event_loop::{ActiveEventLoop, EventLoopProxy},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::asset::ModelLoad;
use crate::error::RenderError;
use crate::frame::FrameDriver;
use crate::input::PointerButton;
use crate::interaction::ClickOutcome;
use crate::renderer::Renderer;
use crate::session::Session;
use crate::settings::SceneSettings;
use crate::time::{Clock, SystemClock};

#[cfg(not(target_arch = "wasm32"))]
type Intro = crate::surfaces::WindowIntro;
#[cfg(target_arch = "wasm32")]
type Intro = crate::surfaces::DomIntro;

/// Work finished off the main loop and handed back to it.
pub enum AppEvent {
    ModelLoaded(ModelLoad),
    /// The web renderer is created asynchronously.
    #[cfg(target_arch = "wasm32")]
    RendererReady(Result<Renderer, RenderError>),
}

pub struct App {
    settings: SceneSettings,
    proxy: EventLoopProxy<AppEvent>,
    clock: SystemClock,
    intro: Intro,
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    session: Option<Session>,
    driver: FrameDriver,
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

fn log_click(outcome: Option<ClickOutcome>) {
    match outcome {
        Some(ClickOutcome::Hit(hit)) => log::debug!("Clicked {:?}", hit.name),
        Some(ClickOutcome::Ignored) => log::debug!("Click ignored before hand-off"),
        _ => {}
    }
}

impl App {
    pub fn new(settings: SceneSettings, proxy: EventLoopProxy<AppEvent>) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let intro = Intro::new(settings.window.title.clone());
        #[cfg(target_arch = "wasm32")]
        let intro = Intro::new();

        Self {
            settings,
            proxy,
            clock: SystemClock::new(),
            intro,
            window: None,
            renderer: None,
            session: None,
            driver: FrameDriver::new(),
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn start_session(&mut self, window: &Window) {
        let size = window.inner_size();
        let mut session = Session::new(self.settings.clone(), size.width, size.height);
        session.start_reveal(self.clock.now());

        let proxy = self.proxy.clone();
        session.begin_model_load(move |load| {
            if proxy.send_event(AppEvent::ModelLoaded(load)).is_err() {
                log::warn!("Event loop closed before the model finished loading");
            }
        });
        self.session = Some(session);
    }

    fn install_renderer(&mut self, event_loop: &ActiveEventLoop, result: Result<Renderer, RenderError>) {
        let mut renderer = match result {
            Ok(renderer) => renderer,
            Err(err) => {
                log::error!("Failed to create renderer: {}", err);
                self.shutdown(event_loop);
                return;
            }
        };
        if let (Some(window), Some(session)) = (&self.window, self.session.as_mut()) {
            let size = window.inner_size();
            self.driver
                .set_pixel_ratio(session, window.scale_factor(), &mut renderer);
            self.driver
                .resize(session, size.width, size.height, &mut renderer);
        }
        self.renderer = Some(renderer);
        self.request_redraw();
    }

    fn poll_reveal(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.poll_reveal(self.clock.now(), &mut self.intro);
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.as_mut() {
            session.shutdown();
        }
        self.driver.stop();
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.poll_reveal();
        let (Some(session), Some(renderer)) = (self.session.as_mut(), self.renderer.as_mut()) else {
            return;
        };
        if let Err(err) = self.driver.tick(session, renderer) {
            log::error!("Fatal render error: {}", err);
            self.shutdown(event_loop);
            return;
        }
        if self.driver.is_running() {
            self.request_redraw();
        }
    }
}

impl ApplicationHandler<AppEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let resolution = self.settings.window.resolution;
        let attributes = Window::default_attributes()
            .with_title(self.settings.window.title.clone())
            .with_inner_size(LogicalSize::new(resolution.width, resolution.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.intro.attach(window.clone());
        #[cfg(target_arch = "wasm32")]
        self.intro.attach_canvas(&window);

        self.start_session(&window);
        self.window = Some(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = pollster::block_on(Renderer::new(window));
            self.install_renderer(event_loop, result);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = Renderer::new(window).await;
                if proxy.send_event(AppEvent::RendererReady(result)).is_err() {
                    log::warn!("Event loop closed before the renderer was ready");
                }
            });
        }

        self.request_redraw();
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::ModelLoaded(load) => {
                if let Some(session) = self.session.as_mut() {
                    session.install_model(load);
                }
                self.request_redraw();
            }
            #[cfg(target_arch = "wasm32")]
            AppEvent::RendererReady(result) => self.install_renderer(event_loop, result),
        }
        #[cfg(not(target_arch = "wasm32"))]
        let _ = event_loop;
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.window.as_ref().map(|w| w.id()) != Some(id) {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let (Some(session), Some(renderer)) = (self.session.as_mut(), self.renderer.as_mut()) {
                    self.driver
                        .resize(session, size.width, size.height, renderer);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let (Some(session), Some(renderer)) = (self.session.as_mut(), self.renderer.as_mut()) {
                    self.driver.set_pixel_ratio(session, scale_factor, renderer);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(session) = self.session.as_mut() {
                    let outcome = session.pointer_moved(Vec2::new(position.x as f32, position.y as f32));
                    log_click(outcome);
                }
            }
            WindowEvent::CursorLeft { .. } => {
                if let Some(session) = self.session.as_mut() {
                    session.pointer_left();
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let (Some(session), Some(button)) = (self.session.as_mut(), pointer_button(button)) else {
                    return;
                };
                match state {
                    ElementState::Pressed => session.pointer_pressed(button),
                    ElementState::Released => log_click(session.pointer_released(button)),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                if let Some(session) = self.session.as_mut() {
                    session.scroll(steps);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.shutdown(event_loop);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.poll_reveal();
        // Keep the loop turning while the reveal still has ticks to run.
        let reveal_pending = self
            .session
            .as_ref()
            .is_some_and(|s| s.next_reveal_deadline().is_some());
        if reveal_pending {
            self.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.as_mut() {
            session.shutdown();
        }
        log::info!("Session ended after {} frames", self.driver.frames());
    }
}
