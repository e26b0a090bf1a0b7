//! Well harvest engine: surface driving, detail fetching and the enrichment
//! pipeline.
mod decode;
mod detail;
mod export;
mod extract;
mod fetch;
mod harvest;
mod pacing;
mod persist;
mod pipeline;
mod progress;
mod surface;
mod types;

pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use detail::{DetailFetcher, FailureCause, FetchFailure, PortalDetailFetcher};
pub use export::{
    read_discovery_csv, summary_path, write_discovery_csv, write_discovery_summary,
    write_enrichment_summary, write_normalized_csv, ExportError,
};
pub use extract::{
    contains_element, extract_field_table, parse_rows, FieldTableSelectors, RowSelectors,
    SelectorError,
};
pub use fetch::{FetchSettings, HttpPageLoader, PageLoader};
pub use harvest::{HarvestError, HarvestReport, HarvestSettings, Harvester, Termination};
pub use pacing::Pacer;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{EnrichSettings, EnrichmentReport, Enricher};
pub use progress::{LogProgressSink, NullSink, ProgressSink};
pub use surface::{ListSurface, SnapshotSurface, SurfaceError};
pub use types::{FailureKind, FetchError, FetchMetadata, LoadedPage, PipelineEvent};
