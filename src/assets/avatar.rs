use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;

use crate::assets::decode::{PreparedImage, decode_avatar_source};

type Slot = OnceLock<Option<Arc<PreparedImage>>>;

/// Avatar image that may still be decoding.
///
/// Readers never block: [`AvatarHandle::get`] returns `None` until the decode finishes, and
/// keeps returning `None` if it failed. Renderers treat `None` as "draw the placeholder".
#[derive(Clone, Debug)]
pub struct AvatarHandle {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    source: Option<String>,
    slot: Arc<Slot>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AvatarHandle {
    /// No avatar configured.
    pub fn none() -> Self {
        let slot = Arc::new(OnceLock::new());
        let _ = slot.set(None);
        Self::from_parts(None, slot, None)
    }

    pub fn ready(image: PreparedImage) -> Self {
        let slot = Arc::new(OnceLock::new());
        let _ = slot.set(Some(Arc::new(image)));
        Self::from_parts(None, slot, None)
    }

    /// Decode `source` on a background thread.
    pub fn spawn(source: impl Into<String>) -> Self {
        let source = source.into();
        let slot: Arc<Slot> = Arc::new(OnceLock::new());
        let worker_slot = Arc::clone(&slot);
        let worker_source = source.clone();
        let worker = std::thread::Builder::new()
            .name("memegif-avatar".to_owned())
            .spawn(move || {
                let _ = worker_slot.set(decode_logged(&worker_source));
            });
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "avatar decode thread failed to start; decoding inline");
                let _ = slot.set(decode_logged(&source));
                None
            }
        };
        Self::from_parts(Some(source), slot, worker)
    }

    /// Decode `source` on the calling thread.
    pub fn load_blocking(source: impl Into<String>) -> Self {
        let source = source.into();
        let slot = Arc::new(OnceLock::new());
        let _ = slot.set(decode_logged(&source));
        Self::from_parts(Some(source), slot, None)
    }

    /// Handle for an optional source, decoded in the background.
    pub fn for_source(source: Option<&str>) -> Self {
        match source {
            Some(s) => Self::spawn(s),
            None => Self::none(),
        }
    }

    fn from_parts(source: Option<String>, slot: Arc<Slot>, worker: Option<JoinHandle<()>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                slot,
                worker: Mutex::new(worker),
            }),
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.inner.source.as_deref()
    }

    /// The decoded image, if it is ready and decoding succeeded.
    pub fn get(&self) -> Option<Arc<PreparedImage>> {
        self.inner.slot.get().cloned().flatten()
    }

    /// Whether decoding has finished (successfully or not).
    pub fn is_settled(&self) -> bool {
        self.inner.slot.get().is_some()
    }

    /// Block until decoding has finished, then return the image.
    ///
    /// The worker lock is held across the join, so concurrent waiters on other clones block
    /// until the slot is filled.
    pub fn wait(&self) -> Option<Arc<PreparedImage>> {
        let mut worker = match self.inner.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                tracing::warn!("avatar decode thread panicked");
            }
            let _ = self.inner.slot.set(None);
        }
        drop(worker);
        self.get()
    }
}

fn decode_logged(source: &str) -> Option<Arc<PreparedImage>> {
    match decode_avatar_source(source) {
        Ok(img) => {
            tracing::debug!(width = img.width, height = img.height, "avatar decoded");
            Some(Arc::new(img))
        }
        Err(e) => {
            tracing::warn!(error = %e, "avatar decode failed; using placeholder");
            None
        }
    }
}
