//! Fixed-schema normalization of detail-page fields.
//!
//! Every output column has exactly one [`FieldRule`]. Rules never fail: a
//! missing or blank source value produces an empty string, so a
//! [`NormalizedRecord`] always carries the full schema.

use std::collections::BTreeMap;

/// Detail-page fields as rendered, keyed by label.
pub type RawFieldMap = BTreeMap<String, String>;

/// Output column headers, in export order.
pub const OUTPUT_COLUMNS: [&str; 16] = [
    "Well ID",
    "well types",
    "year of completion",
    "county",
    "Lat",
    "Long",
    "Ground elevation ft",
    "well depth ft",
    "static water level below ground ft",
    "yield gpm",
    "borehole diameter inches",
    "screen depth ft",
    "aquifer name",
    "number of clay layers above the screened zone",
    "material type in screened zone",
    "PFAS level",
];

/// Values joined in from the discovery stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    ExternalKey,
    County,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Copy the labelled value as is.
    Copy(&'static str),
    /// Keep the first whitespace-separated token, dropping a unit suffix.
    FirstToken(&'static str),
    /// Keep the first `len` characters.
    Prefix(&'static str, usize),
    /// Take the value from the discovery context.
    Context(ContextField),
    /// Filled by a later manual or cross-document step.
    Deferred,
}

/// One rule per entry of [`OUTPUT_COLUMNS`], same order.
pub const WELL_SCHEMA: [FieldRule; 16] = [
    FieldRule::Context(ContextField::ExternalKey),
    FieldRule::Copy("Well Type"),
    FieldRule::Prefix("Date Well Completed", 4),
    FieldRule::Context(ContextField::County),
    FieldRule::Copy("Latitude"),
    FieldRule::Copy("Longitude"),
    FieldRule::FirstToken("Ground Elevation"),
    FieldRule::FirstToken("Total Depth"),
    FieldRule::FirstToken("Static Water Level"),
    FieldRule::FirstToken("Yield"),
    FieldRule::FirstToken("Borehole Diameter"),
    FieldRule::Copy("Screen Depth"),
    FieldRule::Copy("Aquifer"),
    FieldRule::Deferred,
    FieldRule::Copy("Screen Material"),
    FieldRule::Deferred,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeContext<'a> {
    pub external_key: &'a str,
    pub county: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    values: [String; 16],
}

impl NormalizedRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        OUTPUT_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| self.values[idx].as_str())
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// `(column, value)` pairs in export order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        OUTPUT_COLUMNS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }
}

impl Default for NormalizedRecord {
    fn default() -> Self {
        Self {
            values: std::array::from_fn(|_| String::new()),
        }
    }
}

pub fn normalize(raw: &RawFieldMap, context: NormalizeContext<'_>) -> NormalizedRecord {
    NormalizedRecord {
        values: std::array::from_fn(|idx| apply_rule(WELL_SCHEMA[idx], raw, context)),
    }
}

fn apply_rule(rule: FieldRule, raw: &RawFieldMap, context: NormalizeContext<'_>) -> String {
    let source = |label: &str| raw.get(label).map(|v| v.trim()).unwrap_or("");
    match rule {
        FieldRule::Copy(label) => source(label).to_string(),
        FieldRule::FirstToken(label) => first_token(source(label)).to_string(),
        FieldRule::Prefix(label, len) => source(label).chars().take(len).collect(),
        FieldRule::Context(ContextField::ExternalKey) => context.external_key.trim().to_string(),
        FieldRule::Context(ContextField::County) => context.county.trim().to_string(),
        FieldRule::Deferred => String::new(),
    }
}

fn first_token(value: &str) -> &str {
    value.split_whitespace().next().unwrap_or("")
}
