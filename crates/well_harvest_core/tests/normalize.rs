use std::sync::Once;

use pretty_assertions::assert_eq;
use well_harvest_core::{normalize, NormalizeContext, RawFieldMap, OUTPUT_COLUMNS};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(harvest_logging::initialize_for_tests);
}

fn raw(pairs: &[(&str, &str)]) -> RawFieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const CONTEXT: NormalizeContext<'static> = NormalizeContext {
    external_key: "U40Y1",
    county: "Cumberland",
};

#[test]
fn empty_map_yields_full_schema_of_empty_values() {
    init_logging();
    let record = normalize(&RawFieldMap::new(), NormalizeContext::default());
    let columns: Vec<_> = record.iter().map(|(c, _)| c).collect();
    assert_eq!(columns, OUTPUT_COLUMNS.to_vec());
    assert!(record.values().iter().all(String::is_empty));
}

#[test]
fn strips_units_and_extracts_year() {
    init_logging();
    let record = normalize(
        &raw(&[("Total Depth", "120 ft"), ("Date Well Completed", "2019-05-01")]),
        CONTEXT,
    );
    assert_eq!(record.get("well depth ft"), Some("120"));
    assert_eq!(record.get("year of completion"), Some("2019"));
}

#[test]
fn full_detail_page_maps_every_column() {
    init_logging();
    let record = normalize(
        &raw(&[
            ("Well Type", "Monitoring"),
            ("Date Well Completed", "2021-11-30"),
            ("Latitude", "35.0521"),
            ("Longitude", "-78.8784"),
            ("Ground Elevation", "112 ft"),
            ("Total Depth", "45 ft"),
            ("Static Water Level", "12.5 ft"),
            ("Yield", "3 gpm"),
            ("Borehole Diameter", "8 in"),
            ("Screen Depth", "35-45 ft"),
            ("Aquifer", "Surficial"),
            ("Screen Material", "PVC"),
            ("Driller", "ignored"),
        ]),
        CONTEXT,
    );

    let expected = vec![
        "U40Y1",
        "Monitoring",
        "2021",
        "Cumberland",
        "35.0521",
        "-78.8784",
        "112",
        "45",
        "12.5",
        "3",
        "8",
        "35-45 ft",
        "Surficial",
        "",
        "PVC",
        "",
    ];
    assert_eq!(record.values().to_vec(), expected);
}

#[test]
fn blank_and_short_values_never_fail() {
    init_logging();
    let record = normalize(
        &raw(&[
            ("Total Depth", "   "),
            ("Date Well Completed", "19"),
            ("Yield", ""),
        ]),
        CONTEXT,
    );
    assert_eq!(record.get("well depth ft"), Some(""));
    assert_eq!(record.get("year of completion"), Some("19"));
    assert_eq!(record.get("yield gpm"), Some(""));
    assert_eq!(record.values().len(), OUTPUT_COLUMNS.len());
}

#[test]
fn deferred_columns_stay_empty_even_when_source_has_similar_labels() {
    init_logging();
    let record = normalize(
        &raw(&[("PFAS level", "4 ppt"), ("number of clay layers above the screened zone", "2")]),
        CONTEXT,
    );
    assert_eq!(record.get("PFAS level"), Some(""));
    assert_eq!(
        record.get("number of clay layers above the screened zone"),
        Some("")
    );
}

#[test]
fn labels_are_matched_exactly_as_rendered() {
    init_logging();
    let record = normalize(&raw(&[("total depth", "50 ft")]), CONTEXT);
    assert_eq!(record.get("well depth ft"), Some(""));
}

#[test]
fn unknown_column_lookup_is_none() {
    let record = normalize(&RawFieldMap::new(), CONTEXT);
    assert_eq!(record.get("borehole diameter, inches"), None);
    assert_eq!(record.get("Well ID"), Some("U40Y1"));
}
