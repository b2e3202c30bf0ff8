use crate::gltf::{AssetError, MeshData, load_gltf};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError, channel};
use std::time::Instant;

/// Loads a glTF document on a worker thread and hands the result to a
/// polling consumer. One shot: the result is delivered exactly once, and a
/// failure is never retried.
pub struct BackgroundLoader {
    rx: Receiver<Result<Vec<MeshData>, AssetError>>,
}

impl BackgroundLoader {
    /// Start loading `path`. Returns immediately.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, rx) = channel();
        std::thread::spawn(move || {
            let started = Instant::now();
            let result = load_gltf(&path);
            match &result {
                Ok(meshes) => tracing::info!(
                    path = %path.display(),
                    meshes = meshes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "asset load complete"
                ),
                Err(e) => tracing::error!(path = %path.display(), error = %e, "asset load failed"),
            }
            // The receiver may already be gone if the window closed.
            let _ = tx.send(result);
        });
        Self { rx }
    }

    /// Non-blocking check for completion. Returns `Some` exactly once when
    /// the load finishes; `None` before that and forever after.
    pub fn poll(&self) -> Option<Result<Vec<MeshData>, AssetError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_for(loader: &BackgroundLoader) -> Result<Vec<MeshData>, AssetError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = loader.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "loader never completed");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn missing_file_reports_io_error_once() {
        let loader = BackgroundLoader::spawn(PathBuf::from("/nonexistent/scene.gltf"));
        let result = wait_for(&loader);
        assert!(matches!(result, Err(AssetError::Io(_))));
        // Delivered exactly once.
        assert!(loader.poll().is_none());
    }

    #[test]
    fn poll_before_completion_is_none_and_nonblocking() {
        // A loader created against a missing path may complete arbitrarily
        // fast, so only assert that poll never blocks or panics.
        let loader = BackgroundLoader::spawn(PathBuf::from("/nonexistent/scene.gltf"));
        let _ = loader.poll();
        let _ = wait_for(&loader);
    }
}
