//! Bookmark Manager for TabShell.
//!
//! Keeps the ordered bookmark list in memory and mirrors it to a
//! pretty-printed JSON file. Every mutation is followed by a save; a failed
//! save is reported but never rolls the in-memory list back.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::platform;
use crate::types::bookmark::Bookmark;
use crate::types::errors::BookmarkError;

/// File name of the bookmark store inside the data directory.
pub const BOOKMARKS_FILE: &str = "bookmarks.json";

/// Trait defining bookmark management operations.
///
/// Mutating operations return `Ok(false)` when the request was a no-op
/// (index out of range, or a move onto the same position).
pub trait BookmarkManagerTrait {
    fn load(&mut self) -> Result<(), BookmarkError>;
    fn save(&self) -> Result<(), BookmarkError>;
    fn add(&mut self, title: &str, url: &str) -> Result<bool, BookmarkError>;
    fn delete(&mut self, index: usize) -> Result<bool, BookmarkError>;
    fn edit(&mut self, index: usize, title: &str, url: &str) -> Result<bool, BookmarkError>;
    fn reorder(&mut self, from: usize, to: usize) -> Result<bool, BookmarkError>;
    fn get(&self, index: usize) -> Option<&Bookmark>;
    fn list(&self) -> &[Bookmark];
    fn path(&self) -> &Path;
}

/// Bookmark manager persisting to a JSON file.
pub struct BookmarkManager {
    path: PathBuf,
    bookmarks: Vec<Bookmark>,
}

impl BookmarkManager {
    /// Creates a new, empty `BookmarkManager`.
    ///
    /// If `path_override` is `Some`, that file is used. Otherwise the file is
    /// `bookmarks.json` in the platform data directory.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let path =
            path_override.unwrap_or_else(|| platform::get_data_dir().join(BOOKMARKS_FILE));
        Self {
            path,
            bookmarks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }
}

impl BookmarkManagerTrait for BookmarkManager {
    /// Loads bookmarks from disk.
    ///
    /// A missing file yields an empty list. A malformed file also leaves the
    /// list empty but is reported as `BookmarkError::Load`.
    fn load(&mut self) -> Result<(), BookmarkError> {
        self.bookmarks.clear();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BookmarkError::Load(format!("Failed to create data directory: {}", e))
            })?;
        }

        if !self.path.exists() {
            debug!(path = %self.path.display(), "no bookmark file, starting empty");
            return Ok(());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| BookmarkError::Load(format!("Failed to read bookmark file: {}", e)))?;

        let loaded: Option<Vec<Bookmark>> = serde_json::from_str(&content).map_err(|e| {
            warn!(path = %self.path.display(), "bookmark file is malformed: {}", e);
            BookmarkError::Load(format!("Failed to parse bookmark file: {}", e))
        })?;

        self.bookmarks = loaded.unwrap_or_default();
        info!(count = self.bookmarks.len(), "loaded bookmarks");
        Ok(())
    }

    /// Writes the full list, replacing the file.
    fn save(&self) -> Result<(), BookmarkError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BookmarkError::Save(format!("Failed to create data directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.bookmarks).map_err(|e| {
            BookmarkError::Save(format!("Failed to serialize bookmarks: {}", e))
        })?;

        fs::write(&self.path, json)
            .map_err(|e| BookmarkError::Save(format!("Failed to write bookmark file: {}", e)))?;

        debug!(count = self.bookmarks.len(), "saved bookmarks");
        Ok(())
    }

    fn add(&mut self, title: &str, url: &str) -> Result<bool, BookmarkError> {
        self.bookmarks.push(Bookmark::new(title, url));
        self.save()?;
        Ok(true)
    }

    fn delete(&mut self, index: usize) -> Result<bool, BookmarkError> {
        if index >= self.bookmarks.len() {
            return Ok(false);
        }
        self.bookmarks.remove(index);
        self.save()?;
        Ok(true)
    }

    fn edit(&mut self, index: usize, title: &str, url: &str) -> Result<bool, BookmarkError> {
        let Some(bookmark) = self.bookmarks.get_mut(index) else {
            return Ok(false);
        };
        bookmark.title = title.to_string();
        bookmark.url = url.to_string();
        self.save()?;
        Ok(true)
    }

    /// Moves the bookmark at `from` to the drop position `to`.
    ///
    /// `to` is measured against the list before removal and may equal the
    /// list length to drop after the last bookmark.
    fn reorder(&mut self, from: usize, to: usize) -> Result<bool, BookmarkError> {
        if !move_item(&mut self.bookmarks, from, to) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn get(&self, index: usize) -> Option<&Bookmark> {
        self.bookmarks.get(index)
    }

    fn list(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Moves `items[from]` to the drop index `to`, where `to` was computed
/// against the list before removal (`0..=len`).
///
/// Returns false and leaves `items` untouched when either index is out of
/// bounds or the move would not change the order.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to > items.len() {
        return false;
    }
    let target = if to > from { to - 1 } else { to };
    if target == from {
        return false;
    }
    let item = items.remove(from);
    items.insert(target, item);
    true
}
