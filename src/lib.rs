pub mod app;
pub mod asset;
pub mod controls;
pub mod environment;
pub mod error;
pub mod frame;
pub mod input;
pub mod interaction;
pub mod io;
pub mod normalize;
pub mod overlay;
pub mod renderer;
pub mod reveal;
pub mod scene;
pub mod session;
pub mod settings;
pub mod surfaces;
pub mod time;

use app::{App, AppEvent};
use settings::SceneSettings;
use winit::event_loop::EventLoop;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
fn init_logging() {
    // Panics show up in the browser console instead of as "unreachable".
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("Logger already set: {err}")));
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run() -> Result<(), winit::error::EventLoopError> {
    init_logging();

    let settings = SceneSettings::load();
    log::info!("Starting greeting scene");

    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    let mut app = App::new(settings, event_loop.create_proxy());

    let result = event_loop.run_app(&mut app);

    if let Err(ref err) = result {
        log::error!("Application error: {}", err);
    }

    log::info!("Application shutdown complete");

    result
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    use winit::platform::web::EventLoopExtWebSys;

    init_logging();
    log::info!("Starting greeting scene - WebAssembly");

    let event_loop = EventLoop::<AppEvent>::with_user_event()
        .build()
        .map_err(|err| JsValue::from_str(&err.to_string()))?;
    let app = App::new(SceneSettings::load(), event_loop.create_proxy());

    event_loop.spawn_app(app);

    Ok(())
}
