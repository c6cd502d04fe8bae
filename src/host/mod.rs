//! Seams to the hosting editor.
//!
//! The engine never reads buffers or evaluates selectors itself: it asks a
//! [`ScopeProvider`] what is under the cursor, a [`SpecificityScorer`] how well
//! a selector matches, and a [`ResourceLoader`] for scheme files.

use std::io;

use thiserror::Error;

pub mod fs;
pub mod scorer;

pub use fs::FsResourceLoader;
pub use scorer::SimpleScorer;

pub type HostResult<T> = std::result::Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("failed to read resource {path}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("host service unavailable: {0}")]
    Unavailable(String),
}

/// Scores how specifically `selector` matches `scope_path`.
///
/// `0` means no match; larger values are more specific.
pub trait SpecificityScorer {
    fn score(&self, scope_path: &str, selector: &str) -> HostResult<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub begin: usize,
    pub end: usize,
}

/// Zero-based line and character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCol {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeAt {
    pub scope: String,
    pub extent: Extent,
    /// `extent` as line/character positions, when the host tracks them.
    pub rows: Option<(RowCol, RowCol)>,
}

pub trait ScopeProvider {
    /// Caret positions of the current selections, primary first.
    fn selections(&self) -> Vec<usize>;
    fn scope_at(&self, point: usize) -> HostResult<ScopeAt>;

    /// Syntax definition driving the buffer.
    fn syntax_file(&self) -> Option<String> {
        None
    }
}

pub trait ResourceLoader {
    fn load_bytes(&self, path: &str) -> HostResult<Vec<u8>>;
    /// Every resource named `file_name`, as logical `Packages/...` paths.
    fn find_resources(&self, file_name: &str) -> HostResult<Vec<String>>;
}
