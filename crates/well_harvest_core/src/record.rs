/// Column headers of the discovery export, in order.
///
/// The first two columns come from the primary cell of a list row; the rest
/// are the row's remaining cells in rendering order.
pub const DISCOVERY_COLUMNS: [&str; 11] = [
    "Document Name",
    "Link",
    "Current Status",
    "ID #",
    "Version",
    "Facility/Project Name",
    "County",
    "Document Date",
    "Document Types",
    "Page count",
    "Linked",
];

/// Link embedded in the primary cell of a list row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryLink {
    pub text: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellSnapshot {
    pub text: String,
    pub entry: Option<EntryLink>,
}

impl CellSnapshot {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            entry: None,
        }
    }

    pub fn entry(text: impl Into<String>, href: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            entry: Some(EntryLink {
                text: text.clone(),
                href: Some(href.into()),
            }),
            text,
        }
    }
}

/// Point-in-time copy of one rendered list row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowSnapshot {
    pub cells: Vec<CellSnapshot>,
}

impl RowSnapshot {
    pub fn new(cells: Vec<CellSnapshot>) -> Self {
        Self { cells }
    }
}

/// One distinct row observed during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateRecord {
    name: String,
    reference: String,
    extras: Vec<String>,
}

impl CandidateRecord {
    pub fn new(name: impl Into<String>, reference: impl Into<String>, extras: Vec<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
            extras,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn extras(&self) -> &[String] {
        &self.extras
    }

    pub fn key(&self) -> RecordKey<'_> {
        RecordKey {
            name: &self.name,
            reference: &self.reference,
            extras: &self.extras,
        }
    }

    /// Flattens the record into export order: name, reference, extras.
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(2 + self.extras.len());
        row.push(self.name.clone());
        row.push(self.reference.clone());
        row.extend(self.extras.iter().cloned());
        row
    }
}

/// Value-equality key used for deduplication.
///
/// Two observations of a row are the same record only if every captured
/// field matches. Borrows from the record it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey<'a> {
    name: &'a str,
    reference: &'a str,
    extras: &'a [String],
}

/// Discovery row addressed by export column name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiscoveryRecord {
    values: Vec<String>,
}

impl DiscoveryRecord {
    /// Builds a record from values in `DISCOVERY_COLUMNS` order. Missing
    /// trailing values read as empty, surplus values are kept but unnamed.
    pub fn from_values(values: Vec<String>) -> Self {
        Self { values }
    }

    pub fn from_candidate(candidate: &CandidateRecord) -> Self {
        Self::from_values(candidate.to_row())
    }

    pub fn get(&self, column: &str) -> &str {
        DISCOVERY_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.get("Document Name")
    }

    pub fn link(&self) -> &str {
        self.get("Link")
    }

    pub fn well_id(&self) -> &str {
        self.get("ID #")
    }

    pub fn county(&self) -> &str {
        self.get("County")
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_view_maps_extras_by_position() {
        let candidate = CandidateRecord::new(
            "Well Construction Record",
            "/WaterResources/DocView.aspx?id=1",
            vec!["Final".into(), "U40Y1".into(), "1".into(), "Farm".into(), "Hoke".into()],
        );
        let view = DiscoveryRecord::from_candidate(&candidate);
        assert_eq!(view.name(), "Well Construction Record");
        assert_eq!(view.link(), "/WaterResources/DocView.aspx?id=1");
        assert_eq!(view.well_id(), "U40Y1");
        assert_eq!(view.county(), "Hoke");
        assert_eq!(view.get("Document Date"), "");
        assert_eq!(view.get("not a column"), "");
    }
}
