//! Well harvest core: pure records, dedup and normalization logic.
mod accumulator;
mod codec;
mod filter;
mod normalize;
mod record;
mod state;

pub use accumulator::Accumulator;
pub use codec::{decode_field_pair, decode_row, RowLayout, RowUnreadable};
pub use filter::{resolve_reference, CountyAllowList, ReferenceError, DEFAULT_COUNTIES};
pub use normalize::{
    normalize, ContextField, FieldRule, NormalizeContext, NormalizedRecord, RawFieldMap,
    OUTPUT_COLUMNS, WELL_SCHEMA,
};
pub use record::{
    CandidateRecord, CellSnapshot, DiscoveryRecord, EntryLink, RecordKey, RowSnapshot,
    DISCOVERY_COLUMNS,
};
pub use state::{CycleVerdict, HarvestLimits, HarvestState};
