use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::RawModel;
use crate::error::AssetError;

/// Finished (or failed) model load, delivered back to the main loop.
#[derive(Debug)]
pub struct ModelLoad {
    pub id: u64,
    pub path: PathBuf,
    pub result: Result<RawModel, AssetError>,
}

/// Handle to a model load in flight. Cancelling drops the result on
/// arrival; the decode itself runs to completion.
#[derive(Debug, Clone)]
pub struct PendingLoad {
    id: u64,
    path: PathBuf,
    cancelled: Arc<AtomicBool>,
}

impl PendingLoad {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            log::info!("Cancelled model load {} ({:?})", self.id, self.path);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether `load` is the answer to this request and still wanted.
    pub fn accepts(&self, load: &ModelLoad) -> bool {
        load.id == self.id && !self.is_cancelled()
    }
}

fn decode(id: u64, path: PathBuf, cancelled: &AtomicBool) -> ModelLoad {
    let result = if cancelled.load(Ordering::SeqCst) {
        Err(AssetError::Cancelled { path: path.clone() })
    } else {
        RawModel::import(&path)
    };
    ModelLoad { id, path, result }
}

/// `Send` natively, where loads run on a worker thread; no bound on the
/// web, where they run on the page's event loop.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T> MaybeSend for T {}

/// Start loading the model at `path` in the background. `deliver` is called
/// once with the outcome; it must hand the result to the main loop rather
/// than touch the scene itself.
#[cfg(not(target_arch = "wasm32"))]
pub fn spawn_load<F>(id: u64, path: PathBuf, deliver: F) -> PendingLoad
where
    F: FnOnce(ModelLoad) + MaybeSend + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let pending = PendingLoad {
        id,
        path: path.clone(),
        cancelled: cancelled.clone(),
    };

    let spawned = std::thread::Builder::new()
        .name("model-loader".to_string())
        .spawn(move || deliver(decode(id, path, &cancelled)));
    if let Err(err) = spawned {
        log::error!("Failed to spawn model loader thread: {}", err);
        pending.cancel();
    }
    pending
}

#[cfg(target_arch = "wasm32")]
pub fn spawn_load<F>(id: u64, path: PathBuf, deliver: F) -> PendingLoad
where
    F: FnOnce(ModelLoad) + MaybeSend + 'static,
{
    let cancelled = Arc::new(AtomicBool::new(false));
    let pending = PendingLoad {
        id,
        path: path.clone(),
        cancelled: cancelled.clone(),
    };

    wasm_bindgen_futures::spawn_local(async move {
        deliver(decode(id, path, &cancelled));
    });
    pending
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A request that was never actually started.
    pub fn pending(id: u64, path: &str) -> PendingLoad {
        PendingLoad {
            id,
            path: PathBuf::from(path),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn missing_file_reports_io_error() {
        let (tx, rx) = mpsc::channel();
        let pending = spawn_load(7, PathBuf::from("no/such/model.glb"), move |load| {
            let _ = tx.send(load);
        });

        let load = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(pending.accepts(&load));
        assert!(matches!(load.result, Err(AssetError::Io { .. })));
    }

    fn failed_load(id: u64) -> ModelLoad {
        let path = PathBuf::from("a.glb");
        ModelLoad {
            id,
            path: path.clone(),
            result: Err(AssetError::NoGeometry { path }),
        }
    }

    #[test]
    fn cancelled_or_stale_loads_are_rejected() {
        let pending = super::testing::pending(1, "a.glb");
        assert!(!pending.accepts(&failed_load(0)));
        assert!(pending.accepts(&failed_load(1)));

        pending.cancel();
        assert!(pending.is_cancelled());
        assert!(!pending.accepts(&failed_load(1)));
    }
}
