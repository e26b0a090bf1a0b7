//! The list surface the harvester drives.
//!
//! A surface keeps a bounded window of the document list rendered. The
//! harvester alternates `visible_rows` and `advance` on it and never issues
//! two operations at once; `&mut self` receivers enforce that.

use std::fs;
use std::path::Path;

use well_harvest_core::{RowSnapshot, RowUnreadable};

use crate::extract::{contains_element, parse_rows, RowSelectors, SelectorError};

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("surface disconnected: {0}")]
    Disconnected(String),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
pub trait ListSurface: Send {
    /// Element the advance action is aimed at.
    type Anchor: Send + Sync;
    /// Live handle to a rendered row; may go stale after the view moves.
    type Row: Send + Sync;

    async fn find_anchor(&mut self, selector: &str) -> Result<Option<Self::Anchor>, SurfaceError>;

    /// Rows currently rendered. Reflects the view only after any prior
    /// `advance` has settled.
    async fn visible_rows(&mut self) -> Result<Vec<Self::Row>, SurfaceError>;

    async fn read_row(&mut self, row: &Self::Row) -> Result<RowSnapshot, RowUnreadable>;

    /// Scroll the view one step further down the list.
    async fn advance(&mut self, anchor: &Self::Anchor) -> Result<(), SurfaceError>;
}

/// Replays saved renderings of the list, one HTML page per scroll position.
///
/// `advance` moves to the next page and stays on the last one, like a list
/// scrolled to its end.
#[derive(Debug, Clone)]
pub struct SnapshotSurface {
    pages: Vec<String>,
    position: usize,
    selectors: RowSelectors,
}

impl SnapshotSurface {
    pub fn new(pages: Vec<String>, selectors: RowSelectors) -> Self {
        Self {
            pages,
            position: 0,
            selectors,
        }
    }

    /// Loads every `.html`/`.htm` file of `dir`, ordered by file name.
    pub fn from_dir(dir: &Path, selectors: RowSelectors) -> Result<Self, SurfaceError> {
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter(|e| {
                matches!(
                    e.path().extension().and_then(|s| s.to_str()),
                    Some("html" | "htm")
                )
            })
            .collect();
        entries.sort_by_key(|e| e.file_name());

        let pages = entries
            .iter()
            .map(|entry| fs::read_to_string(entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(pages, selectors))
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn current(&self) -> Option<&str> {
        self.pages.get(self.position).map(String::as_str)
    }
}

#[async_trait::async_trait]
impl ListSurface for SnapshotSurface {
    type Anchor = ();
    type Row = RowSnapshot;

    async fn find_anchor(&mut self, selector: &str) -> Result<Option<()>, SurfaceError> {
        match self.current() {
            Some(page) => Ok(contains_element(page, selector)?.then_some(())),
            None => Ok(None),
        }
    }

    async fn visible_rows(&mut self) -> Result<Vec<RowSnapshot>, SurfaceError> {
        match self.current() {
            Some(page) => Ok(parse_rows(page, &self.selectors)?),
            None => Ok(Vec::new()),
        }
    }

    async fn read_row(&mut self, row: &RowSnapshot) -> Result<RowSnapshot, RowUnreadable> {
        Ok(row.clone())
    }

    async fn advance(&mut self, _anchor: &()) -> Result<(), SurfaceError> {
        if self.position + 1 < self.pages.len() {
            self.position += 1;
        }
        Ok(())
    }
}
