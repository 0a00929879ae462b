//! Local cache for downloaded narration audio.
//!
//! Rendered audio lives behind short-lived signed URLs, so replaying a
//! reference should not depend on the backend keeping it alive. Files are
//! stored under `.cache/` using a hash of the audio URL as the filename.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const CACHE_DIR: &str = ".cache";

pub fn audio_path(root: &Path, url: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    root.join(format!("narration-{hash}.audio"))
}

/// Fetch cached bytes for a URL, if present.
pub fn load_audio(root: &Path, url: &str) -> Option<Vec<u8>> {
    let path = audio_path(root, url);
    match fs::read(&path) {
        Ok(bytes) => {
            debug!(path = %path.display(), size = bytes.len(), "Audio cache hit");
            Some(bytes)
        }
        Err(_) => None,
    }
}

/// Persist downloaded bytes. Errors are logged and swallowed; the cache is an
/// optimization, never a requirement.
pub fn store_audio(root: &Path, url: &str, bytes: &[u8]) {
    let path = audio_path(root, url);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Err(err) = fs::write(&path, bytes) {
        warn!(path = %path.display(), "Failed to cache audio: {err}");
    } else {
        debug!(path = %path.display(), size = bytes.len(), "Cached audio");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_per_url() {
        let root = Path::new(".cache");
        assert_eq!(
            audio_path(root, "https://x/a.mp3"),
            audio_path(root, "https://x/a.mp3")
        );
        assert_ne!(
            audio_path(root, "https://x/a.mp3"),
            audio_path(root, "https://x/b.mp3")
        );
    }

    #[test]
    fn store_then_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = "https://narrate.example/audio/42.mp3";
        assert!(load_audio(dir.path(), url).is_none());
        store_audio(dir.path(), url, b"fake audio bytes");
        assert_eq!(
            load_audio(dir.path(), url).as_deref(),
            Some(b"fake audio bytes".as_slice())
        );
    }
}
