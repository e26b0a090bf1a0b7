use scraper::{ElementRef, Html, Selector};
use well_harvest_core::{decode_field_pair, CellSnapshot, EntryLink, RawFieldMap, RowSnapshot};

/// CSS selectors locating rows of the document list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSelectors {
    pub row: String,
    pub cell: String,
    /// Link inside the primary cell carrying the entry name and href.
    pub entry: String,
}

impl Default for RowSelectors {
    fn default() -> Self {
        Self {
            row: "tr.ui-widget-content".to_string(),
            cell: "td".to_string(),
            entry: "span.EntryNameColumn a".to_string(),
        }
    }
}

/// CSS selectors locating the label/value table of a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTableSelectors {
    pub table: String,
    pub row: String,
    /// The first match in a row is the label, the second the value.
    pub cell: String,
    /// Element inside a cell holding its text.
    pub text: String,
}

impl Default for FieldTableSelectors {
    fn default() -> Self {
        Self {
            table: "table#metadataTable".to_string(),
            row: "tr.fieldPane".to_string(),
            cell: "td.ng-star-inserted".to_string(),
            text: "div".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|err| SelectorError {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

/// Rendered text of an element with whitespace runs collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `selector` matches anything in the document.
pub fn contains_element(html: &str, selector: &str) -> Result<bool, SelectorError> {
    let selector = compile(selector)?;
    let doc = Html::parse_document(html);
    let found = doc.select(&selector).next().is_some();
    Ok(found)
}

/// Snapshot every list row rendered in the document.
pub fn parse_rows(html: &str, selectors: &RowSelectors) -> Result<Vec<RowSnapshot>, SelectorError> {
    let row_sel = compile(&selectors.row)?;
    let cell_sel = compile(&selectors.cell)?;
    let entry_sel = compile(&selectors.entry)?;
    let doc = Html::parse_document(html);

    let rows = doc
        .select(&row_sel)
        .map(|row| {
            let cells = row
                .select(&cell_sel)
                .map(|cell| CellSnapshot {
                    text: element_text(cell),
                    entry: cell.select(&entry_sel).next().map(|link| EntryLink {
                        text: element_text(link),
                        href: link.value().attr("href").map(str::to_string),
                    }),
                })
                .collect();
            RowSnapshot::new(cells)
        })
        .collect();
    Ok(rows)
}

/// Read the label/value table of a detail page. `Ok(None)` means the table
/// itself is absent; rows lacking a label or value are skipped.
pub fn extract_field_table(
    html: &str,
    selectors: &FieldTableSelectors,
) -> Result<Option<RawFieldMap>, SelectorError> {
    let table_sel = compile(&selectors.table)?;
    let row_sel = compile(&selectors.row)?;
    let cell_sel = compile(&selectors.cell)?;
    let text_sel = compile(&selectors.text)?;
    let doc = Html::parse_document(html);

    let Some(table) = doc.select(&table_sel).next() else {
        return Ok(None);
    };

    let block_text = |cell: ElementRef<'_>| cell.select(&text_sel).next().map(element_text);
    let mut fields = RawFieldMap::new();
    for row in table.select(&row_sel) {
        let mut cells = row.select(&cell_sel);
        let label = cells.next().and_then(block_text);
        let value = cells.next().and_then(block_text);
        if let Some((label, value)) = decode_field_pair(label.as_deref(), value.as_deref()) {
            fields.insert(label, value);
        }
    }
    Ok(Some(fields))
}
