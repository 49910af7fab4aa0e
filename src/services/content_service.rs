use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, error, info, warn};

use crate::errors::WikiError;
use crate::utils::clean_url;

/// Read a page file as UTF-8 text
pub fn read_page(path: &Path) -> Result<String, WikiError> {
    debug!("Reading page file: {:?}", path);
    if !path.is_file() {
        warn!("Page file does not exist: {:?}", path);
        return Err(WikiError::NotFound(path.display().to_string()));
    }
    fs::read_to_string(path).map_err(|e| {
        error!("Failed to read page file {:?}: {}", path, e);
        WikiError::Io(e)
    })
}

/// Write a page file, creating parent directories as needed.
/// Writes go straight to the target path, not via a temp file.
pub fn write_page(path: &Path, text: &str) -> Result<(), WikiError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            error!("Failed to create directory {:?}: {}", parent, e);
            WikiError::Io(e)
        })?;
    }
    fs::write(path, text).map_err(|e| {
        error!("Failed to write page file {:?}: {}", path, e);
        WikiError::Io(e)
    })?;
    debug!("Wrote page file {:?}, {} bytes", path, text.len());
    Ok(())
}

/// Resolve `.` and `..` components without touching the filesystem
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Service for the on-disk Markdown content store
#[derive(Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Create a new content store rooted at `root`
    pub fn new(root: PathBuf) -> Self {
        debug!("Creating ContentStore with root directory: {:?}", root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path backing a page url
    pub fn page_path(&self, url: &str) -> PathBuf {
        self.root.join(format!("{}.md", url))
    }

    /// Check whether a page file exists
    pub fn exists(&self, url: &str) -> bool {
        let exists = self.page_path(url).is_file();
        debug!("Page exists check: {} -> {}", url, exists);
        exists
    }

    /// True when `path` stays inside the content root after lexical
    /// normalization
    pub fn contains(&self, path: &Path) -> bool {
        normalize_lexical(path).starts_with(normalize_lexical(&self.root))
    }

    /// Recursively collect every `.md` file under the root as (path, url)
    pub fn walk(&self) -> Result<Vec<(PathBuf, String)>, WikiError> {
        let mut found = Vec::new();
        self.walk_dir(&self.root, &mut found)?;
        info!("Walked content store, found {} pages", found.len());
        Ok(found)
    }

    fn walk_dir(
        &self,
        dir: &Path,
        found: &mut Vec<(PathBuf, String)>,
    ) -> Result<(), WikiError> {
        if !dir.is_dir() {
            return Ok(());
        }
        let entries = fs::read_dir(dir).map_err(|e| {
            error!("Failed to read directory {:?}: {}", dir, e);
            WikiError::Io(e)
        })?;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_dir() {
                self.walk_dir(&path, found)?;
            } else if path.extension().and_then(|ext| ext.to_str()) == Some("md") {
                if let Some(url) = self.url_for(&path) {
                    found.push((path, url));
                }
            }
        }
        Ok(())
    }

    /// Derive the logical url for a path inside the root
    fn url_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?.with_extension("");
        Some(clean_url(&rel.to_string_lossy()))
    }

    /// Move a page file, creating target directories as needed
    pub fn rename(&self, from: &Path, to: &Path) -> Result<(), WikiError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                error!("Failed to create directory {:?}: {}", parent, e);
                WikiError::Io(e)
            })?;
        }
        fs::rename(from, to).map_err(|e| {
            error!("Failed to move {:?} to {:?}: {}", from, to, e);
            WikiError::Io(e)
        })?;
        info!("Moved {:?} to {:?}", from, to);
        Ok(())
    }

    /// Remove a page file
    pub fn remove(&self, url: &str) -> Result<(), WikiError> {
        let path = self.page_path(url);
        fs::remove_file(&path).map_err(|e| {
            error!("Failed to remove page file {:?}: {}", path, e);
            WikiError::Io(e)
        })?;
        info!("Removed page file {:?}", path);
        Ok(())
    }
}
