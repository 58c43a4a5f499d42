//! Check image source
//!
//! Hands raw image bytes to the recognition collaborator. The harness
//! never decodes them; format detection and rendering live elsewhere.

use micracc_common::{CheckId, Error, Result};
use std::path::{Path, PathBuf};

/// Supplies the image bytes for a check id
pub trait ImageSource {
    fn load(&self, id: CheckId) -> Result<Vec<u8>>;
}

/// Reads `check-{id}.{extension}` from a directory
pub struct DirImageSource {
    dir: PathBuf,
    extension: String,
}

impl DirImageSource {
    pub fn new(dir: &Path, extension: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        }
    }

    fn path_for(&self, id: CheckId) -> PathBuf {
        self.dir.join(format!("check-{}.{}", id, self.extension))
    }
}

impl ImageSource for DirImageSource {
    fn load(&self, id: CheckId) -> Result<Vec<u8>> {
        let path = self.path_for(id);
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("no image for check {} at {}", id, path.display()))
            } else {
                Error::Io(e)
            }
        })
    }
}
