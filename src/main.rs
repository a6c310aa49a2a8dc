#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = greeting_scene::run() {
        eprintln!("Application error: {err}");
    }
}

// The web build starts from the library's `#[wasm_bindgen(start)]` entry.
#[cfg(target_arch = "wasm32")]
fn main() {}
