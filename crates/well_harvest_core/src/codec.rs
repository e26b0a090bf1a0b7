use crate::record::{CandidateRecord, RowSnapshot};

/// Where the entry cell sits within a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub primary_cell: usize,
}

impl Default for RowLayout {
    fn default() -> Self {
        // Column 0 is the selection checkbox.
        Self { primary_cell: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowUnreadable {
    #[error("row has {cells} cells, primary cell {primary} is missing")]
    MissingPrimaryCell { cells: usize, primary: usize },
    #[error("primary cell has no entry link")]
    MissingEntry,
    #[error("entry link has no href")]
    MissingReference,
    #[error("row went stale before it could be read")]
    Stale,
}

/// Decode one row snapshot into a candidate record.
pub fn decode_row(row: &RowSnapshot, layout: RowLayout) -> Result<CandidateRecord, RowUnreadable> {
    let primary = row
        .cells
        .get(layout.primary_cell)
        .ok_or(RowUnreadable::MissingPrimaryCell {
            cells: row.cells.len(),
            primary: layout.primary_cell,
        })?;
    let entry = primary.entry.as_ref().ok_or(RowUnreadable::MissingEntry)?;
    let reference = entry
        .href
        .as_deref()
        .map(str::trim)
        .ok_or(RowUnreadable::MissingReference)?;

    let extras = row
        .cells
        .iter()
        .skip(layout.primary_cell + 1)
        .map(|cell| cell.text.trim().to_string())
        .collect();

    Ok(CandidateRecord::new(entry.text.trim(), reference, extras))
}

/// Pair a detail-page label cell with its value cell. Pairs missing either
/// side are dropped.
pub fn decode_field_pair(label: Option<&str>, value: Option<&str>) -> Option<(String, String)> {
    let label = label?.trim();
    let value = value?.trim();
    if label.is_empty() {
        return None;
    }
    Some((label.to_string(), value.to_string()))
}
