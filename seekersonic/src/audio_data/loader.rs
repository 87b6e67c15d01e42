use crate::audio_data::{LoadOptions, SeekerSonicAudioData};
use crate::error::{Result, SeekerSonicError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Asset source for decoded audio.
///
/// Implementations resolve a path to decodable audio and must report a path that
/// does not resolve as [`SeekerSonicError::ResourceNotFound`]. SeekerSonic ships
/// [`DefaultAudioLoader`](super::DefaultAudioLoader) for files on disk and
/// [`InMemoryLoader`] for preloaded or synthesized cues.
pub trait AudioDataLoader {
    /// Loads audio data from a path.
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` when nothing exists at `path`, a loading or format error
    /// when the asset exists but cannot be decoded.
    fn load(&self, path: &str, options: &LoadOptions) -> Result<Arc<SeekerSonicAudioData>>;
}

/// Asset source backed by a map of already decoded audio.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLoader {
    assets: HashMap<PathBuf, SeekerSonicAudioData>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, data: SeekerSonicAudioData) {
        self.assets.insert(path.as_ref().to_path_buf(), data);
    }

    pub fn with_asset(mut self, path: impl AsRef<Path>, data: SeekerSonicAudioData) -> Self {
        self.insert(path, data);
        self
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.assets.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AudioDataLoader for InMemoryLoader {
    fn load(&self, path: &str, options: &LoadOptions) -> Result<Arc<SeekerSonicAudioData>> {
        let data = self
            .assets
            .get(Path::new(path))
            .cloned()
            .ok_or_else(|| SeekerSonicError::not_found(path))?;
        Ok(Arc::new(data.conform(options)?))
    }
}
