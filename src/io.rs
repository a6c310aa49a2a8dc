use std::path::Path;

use crate::error::AssetError;

fn io_error(path: &Path, message: impl Into<String>) -> AssetError {
    AssetError::Io {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

/// Read the raw bytes of an asset.
///
/// Natively this is a filesystem read. On the web the path is turned into
/// a URL relative to the page and fetched with a blocking XHR.
pub fn load_binary(path: &Path) -> Result<Vec<u8>, AssetError> {
    #[cfg(target_arch = "wasm32")]
    {
        let url = web_url(path)?;
        fetch_bytes(&url).map_err(|message| io_error(path, message))
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        std::fs::read(path).map_err(|err| io_error(path, err.to_string()))
    }
}

#[cfg(any(target_arch = "wasm32", test))]
fn web_url(path: &Path) -> Result<String, AssetError> {
    let mut url = path.to_string_lossy().replace('\\', "/");

    while let Some(stripped) = url.strip_prefix("./") {
        url = stripped.to_string();
    }
    if let Some(stripped) = url.strip_prefix("public/") {
        url = stripped.to_string();
    }
    let url = url.trim_start_matches('/').to_string();

    if url.is_empty() {
        return Err(io_error(path, "empty asset path"));
    }
    Ok(url)
}

#[cfg(target_arch = "wasm32")]
fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
    use web_sys::{XmlHttpRequest, XmlHttpRequestResponseType};

    let request = XmlHttpRequest::new().map_err(|err| format!("XMLHttpRequest: {:?}", err))?;
    request
        .open_with_async("GET", url, false)
        .map_err(|err| format!("open {}: {:?}", url, err))?;
    request.set_response_type(XmlHttpRequestResponseType::Arraybuffer);
    request
        .send()
        .map_err(|err| format!("send {}: {:?}", url, err))?;

    let status = request
        .status()
        .map_err(|err| format!("status {}: {:?}", url, err))?;
    if !(200..400).contains(&status) {
        return Err(format!("HTTP {} for {}", status, url));
    }

    let body = request
        .response()
        .map_err(|err| format!("response {}: {:?}", url, err))?;
    if body.is_null() || body.is_undefined() {
        return Err(format!("empty response for {}", url));
    }

    Ok(js_sys::Uint8Array::new(&body).to_vec())
}
