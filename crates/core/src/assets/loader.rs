use std::{
    fmt,
    path::PathBuf,
    sync::{
        mpsc::{self, Receiver, Sender, TryRecvError},
        Arc,
    },
    thread,
};

use image::RgbaImage;

use crate::{timeline::CancellationToken, GalleryError, Result};

/// Source of encoded image bytes. Called from loader threads.
pub trait ImageFetcher: Send + Sync + fmt::Debug {
    fn fetch(&self, source: &str) -> Result<Vec<u8>>;
}

/// Reads images from the local filesystem. Accepts plain paths and `file://` URLs,
/// resolved against an optional root directory.
#[derive(Debug, Clone, Default)]
pub struct FsImageFetcher {
    root: Option<PathBuf>,
}

impl FsImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = PathBuf::from(source.strip_prefix("file://").unwrap_or(source));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

impl ImageFetcher for FsImageFetcher {
    fn fetch(&self, source: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.resolve(source))?)
    }
}

/// Result of one background image load.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { slot: usize, image: RgbaImage },
    Failed { slot: usize, source: String, reason: String },
}

/// Decodes images on background threads and hands them back through a channel.
///
/// Nothing is retried. Results produced after the token is cancelled are dropped.
pub struct ImageLoader {
    receiver: Receiver<LoadOutcome>,
    token: CancellationToken,
    requested: usize,
}

impl ImageLoader {
    /// Starts one load per `(slot, source)` pair.
    pub fn spawn(
        fetcher: Arc<dyn ImageFetcher>,
        sources: impl IntoIterator<Item = (usize, String)>,
        token: CancellationToken,
    ) -> Self {
        let (sender, receiver) = mpsc::channel();
        let mut requested = 0;

        for (slot, source) in sources {
            requested += 1;
            let worker_fetcher = Arc::clone(&fetcher);
            let worker_sender = sender.clone();
            let worker_token = token.clone();
            let worker_source = source.clone();
            let spawned = thread::Builder::new()
                .name(format!("texture-load-{slot}"))
                .spawn(move || {
                    load_one(worker_fetcher.as_ref(), slot, worker_source, &worker_sender, &worker_token)
                });

            if let Err(err) = spawned {
                let _ = sender.send(LoadOutcome::Failed {
                    slot,
                    source,
                    reason: format!("could not start loader thread: {err}"),
                });
            }
        }

        Self {
            receiver,
            token,
            requested,
        }
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Collects every load that has finished since the last call without blocking.
    pub fn drain(&self) -> Vec<LoadOutcome> {
        let mut finished = Vec::new();
        if self.token.is_cancelled() {
            return finished;
        }
        loop {
            match self.receiver.try_recv() {
                Ok(outcome) => finished.push(outcome),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        finished
    }
}

impl fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageLoader")
            .field("requested", &self.requested)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

fn load_one(
    fetcher: &dyn ImageFetcher,
    slot: usize,
    source: String,
    sender: &Sender<LoadOutcome>,
    token: &CancellationToken,
) {
    let outcome = match fetcher.fetch(&source).and_then(|bytes| decode(&bytes)) {
        Ok(image) => LoadOutcome::Loaded { slot, image },
        Err(err) => LoadOutcome::Failed {
            slot,
            source,
            reason: err.to_string(),
        },
    };

    if token.is_cancelled() {
        return;
    }
    // The receiver is gone once the engine has been torn down.
    let _ = sender.send(outcome);
}

fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    if bytes.is_empty() {
        return Err(GalleryError::InvalidInput("image source returned no data"));
    }
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}
