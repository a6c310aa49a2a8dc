//! The intro text surface and the 3D view surface it hands over to.

/// Where the intro text is shown. The 3D view's own opacity is owned by
/// the session and applied by the renderer.
pub trait IntroSurface {
    fn set_text(&mut self, text: &str);
    /// Take the intro text down and reveal the 3D view surface.
    fn hand_off(&mut self);
}

/// Native stand-in: the last typed line goes to the window title and the
/// full text to the log.
#[cfg(not(target_arch = "wasm32"))]
pub struct WindowIntro {
    window: Option<std::sync::Arc<winit::window::Window>>,
    title: String,
}

#[cfg(not(target_arch = "wasm32"))]
impl WindowIntro {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            window: None,
            title: title.into(),
        }
    }

    pub fn attach(&mut self, window: std::sync::Arc<winit::window::Window>) {
        self.window = Some(window);
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl IntroSurface for WindowIntro {
    fn set_text(&mut self, text: &str) {
        log::debug!("intro: {:?}", text);
        let line = text.lines().last().unwrap_or_default();
        if let Some(window) = &self.window {
            window.set_title(line);
        }
    }

    fn hand_off(&mut self) {
        log::info!("Intro finished, showing scene");
        if let Some(window) = &self.window {
            window.set_title(&self.title);
        }
    }
}

/// DOM surfaces: the `console` element for the text and the
/// `three-container` element holding the canvas.
#[cfg(target_arch = "wasm32")]
pub struct DomIntro {
    console: Option<web_sys::HtmlElement>,
    container: Option<web_sys::HtmlElement>,
}

#[cfg(target_arch = "wasm32")]
pub const CONSOLE_ID: &str = "console";
#[cfg(target_arch = "wasm32")]
pub const CONTAINER_ID: &str = "three-container";

#[cfg(target_arch = "wasm32")]
fn html_element(id: &str) -> Option<web_sys::HtmlElement> {
    use wasm_bindgen::JsCast;

    let element = web_sys::window()?.document()?.get_element_by_id(id);
    if element.is_none() {
        log::warn!("Element #{} not found", id);
    }
    element?.dyn_into::<web_sys::HtmlElement>().ok()
}

#[cfg(target_arch = "wasm32")]
impl DomIntro {
    pub fn new() -> Self {
        Self {
            console: html_element(CONSOLE_ID),
            container: html_element(CONTAINER_ID),
        }
    }

    /// Put the winit canvas inside the view container (or the body when
    /// the page has no container).
    pub fn attach_canvas(&self, window: &winit::window::Window) {
        use winit::platform::web::WindowExtWebSys;

        let Some(canvas) = window.canvas() else {
            log::warn!("Window has no canvas");
            return;
        };
        if canvas.parent_element().is_some() {
            return;
        }
        let parent: Option<web_sys::Node> = match &self.container {
            Some(container) => Some(container.clone().into()),
            None => web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.body())
                .map(Into::into),
        };
        if let Some(parent) = parent {
            if let Err(err) = parent.append_child(&canvas) {
                log::error!("Failed to attach canvas: {:?}", err);
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl IntroSurface for DomIntro {
    fn set_text(&mut self, text: &str) {
        if let Some(console) = &self.console {
            console.set_text_content(Some(text));
        }
    }

    fn hand_off(&mut self) {
        if let Some(console) = &self.console {
            let _ = console.style().set_property("display", "none");
        }
        if let Some(container) = &self.container {
            let _ = container.style().set_property("opacity", "1");
        }
        log::info!("Intro finished, showing scene");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::IntroSurface;

    /// Remembers every call, for asserting on hand-off behavior.
    #[derive(Debug, Default)]
    pub struct RecordingIntro {
        pub texts: Vec<String>,
        pub handoffs: usize,
    }

    impl IntroSurface for RecordingIntro {
        fn set_text(&mut self, text: &str) {
            self.texts.push(text.to_string());
        }

        fn hand_off(&mut self) {
            self.handoffs += 1;
        }
    }
}
