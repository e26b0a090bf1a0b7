use url::Url;
use well_harvest_core::{resolve_reference, RawFieldMap, ReferenceError};

use crate::extract::{extract_field_table, FieldTableSelectors, SelectorError};
use crate::fetch::PageLoader;
use crate::FetchError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("detail fetch failed for {reference}: {cause}")]
pub struct FetchFailure {
    pub reference: String,
    pub cause: FailureCause,
}

impl FetchFailure {
    pub fn new(reference: impl Into<String>, cause: impl Into<FailureCause>) -> Self {
        Self {
            reference: reference.into(),
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureCause {
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Load(#[from] FetchError),
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error("field table not found")]
    MissingFieldTable,
    #[error("field table has no readable fields")]
    EmptyFieldTable,
}

/// Turns a record reference into the raw fields of its detail page.
#[async_trait::async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_detail(&self, reference: &str) -> Result<RawFieldMap, FetchFailure>;
}

/// Detail fetcher for the document portal: resolves references against the
/// portal base and reads the metadata table of the rendered page.
pub struct PortalDetailFetcher<L> {
    base_url: Url,
    loader: L,
    selectors: FieldTableSelectors,
}

impl<L: PageLoader> PortalDetailFetcher<L> {
    pub fn new(base_url: Url, loader: L) -> Self {
        Self::with_selectors(base_url, loader, FieldTableSelectors::default())
    }

    pub fn with_selectors(base_url: Url, loader: L, selectors: FieldTableSelectors) -> Self {
        Self {
            base_url,
            loader,
            selectors,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl<L: PageLoader> DetailFetcher for PortalDetailFetcher<L> {
    async fn fetch_detail(&self, reference: &str) -> Result<RawFieldMap, FetchFailure> {
        let fail = |cause: FailureCause| FetchFailure::new(reference, cause);

        let url = resolve_reference(&self.base_url, reference).map_err(|e| fail(e.into()))?;
        let page = self.loader.load(&url).await.map_err(|e| fail(e.into()))?;
        let fields = extract_field_table(&page.html, &self.selectors)
            .map_err(|e| fail(e.into()))?
            .ok_or_else(|| fail(FailureCause::MissingFieldTable))?;
        if fields.is_empty() {
            return Err(fail(FailureCause::EmptyFieldTable));
        }
        Ok(fields)
    }
}
