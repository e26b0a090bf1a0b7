use url::Url;

use crate::record::DiscoveryRecord;

/// Counties enriched when no allow-list is configured.
pub const DEFAULT_COUNTIES: [&str; 5] = ["Hoke", "Robeson", "Bladen", "Sampson", "Cumberland"];

/// Accepts discovery records whose `County` is in the list (exact match,
/// surrounding whitespace ignored).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyAllowList {
    counties: Vec<String>,
}

impl CountyAllowList {
    pub fn new<I, S>(counties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            counties: counties
                .into_iter()
                .map(|c| c.into().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    pub fn counties(&self) -> &[String] {
        &self.counties
    }

    pub fn allows(&self, record: &DiscoveryRecord) -> bool {
        let county = record.county().trim();
        self.counties.iter().any(|allowed| allowed == county)
    }
}

impl Default for CountyAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTIES)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("empty reference")]
    Empty,
    #[error("cannot resolve {reference:?}: {message}")]
    Unresolvable { reference: String, message: String },
}

/// Resolve a discovery link against the portal base. Leading slashes are
/// dropped so the link lands under the base path; absolute links pass
/// through unchanged.
pub fn resolve_reference(base: &Url, reference: &str) -> Result<Url, ReferenceError> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(ReferenceError::Empty);
    }
    base.join(trimmed.trim_start_matches('/'))
        .map_err(|err| ReferenceError::Unresolvable {
            reference: trimmed.to_string(),
            message: err.to_string(),
        })
}
