use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use harvest_logging::harvest_info;
use serde::{Deserialize, Serialize};
use url::Url;
use well_harvest_core::{CountyAllowList, RowLayout, DEFAULT_COUNTIES};
use well_harvest_engine::{
    EnrichSettings, FetchSettings, FieldTableSelectors, HarvestSettings, RowSelectors,
};

use crate::cli::{EnrichOptions, HarvestOptions};

pub const DEFAULT_BASE_URL: &str = "https://edocs.deq.nc.gov/";

/// Everything a run can be tuned with. Loaded from RON; missing fields fall
/// back to the portal defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub base_url: String,
    pub counties: Vec<String>,
    pub harvest: HarvestConfig,
    pub enrich: EnrichConfig,
    pub fetch: FetchConfig,
    pub selectors: SelectorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub max_cycles: u32,
    pub stall_threshold: u32,
    pub settle_delay_ms: u64,
    pub anchor_selector: String,
    pub anchor_timeout_ms: u64,
    pub anchor_poll_ms: u64,
    pub primary_cell: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub concurrency: usize,
    pub pacing_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub row: String,
    pub cell: String,
    pub entry: String,
    pub field_table: String,
    pub field_row: String,
    pub field_cell: String,
    pub field_text: String,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            counties: DEFAULT_COUNTIES.iter().map(|c| c.to_string()).collect(),
            harvest: HarvestConfig::default(),
            enrich: EnrichConfig::default(),
            fetch: FetchConfig::default(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let settings = HarvestSettings::default();
        Self {
            max_cycles: settings.max_cycles,
            stall_threshold: settings.stall_threshold,
            settle_delay_ms: millis(settings.settle_delay),
            anchor_selector: settings.anchor_selector,
            anchor_timeout_ms: millis(settings.anchor_timeout),
            anchor_poll_ms: millis(settings.anchor_poll_interval),
            primary_cell: settings.layout.primary_cell,
        }
    }
}

impl Default for EnrichConfig {
    fn default() -> Self {
        let settings = EnrichSettings::default();
        Self {
            concurrency: settings.concurrency,
            pacing_delay_ms: millis(settings.pacing_delay),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_ms: millis(settings.connect_timeout),
            request_timeout_ms: millis(settings.request_timeout),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
            allowed_content_types: settings.allowed_content_types,
            user_agent: settings.user_agent,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        let rows = RowSelectors::default();
        let fields = FieldTableSelectors::default();
        Self {
            row: rows.row,
            cell: rows.cell,
            entry: rows.entry,
            field_table: fields.table,
            field_row: fields.row,
            field_cell: fields.cell,
            field_text: fields.text,
        }
    }
}

impl PipelineConfig {
    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        let config = Self::from_ron(&text)
            .with_context(|| format!("parsing configuration {}", path.display()))?;
        harvest_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::new(),
        )?)
    }

    pub fn apply_harvest_overrides(&mut self, options: &HarvestOptions) {
        if let Some(value) = options.stall_threshold {
            self.harvest.stall_threshold = value;
        }
        if let Some(value) = options.max_cycles {
            self.harvest.max_cycles = value;
        }
        if let Some(value) = options.settle_ms {
            self.harvest.settle_delay_ms = value;
        }
    }

    pub fn apply_enrich_overrides(&mut self, options: &EnrichOptions) {
        if !options.counties.is_empty() {
            self.counties = options.counties.clone();
        }
        if let Some(url) = &options.base_url {
            self.base_url = url.clone();
        }
        if let Some(value) = options.pacing_ms {
            self.enrich.pacing_delay_ms = value;
        }
        if let Some(value) = options.concurrency {
            self.enrich.concurrency = value;
        }
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("invalid base url {:?}", self.base_url))
    }

    pub fn county_filter(&self) -> CountyAllowList {
        CountyAllowList::new(&self.counties)
    }

    pub fn harvest_settings(&self) -> HarvestSettings {
        let h = &self.harvest;
        HarvestSettings {
            max_cycles: h.max_cycles,
            stall_threshold: h.stall_threshold,
            settle_delay: Duration::from_millis(h.settle_delay_ms),
            anchor_selector: h.anchor_selector.clone(),
            anchor_timeout: Duration::from_millis(h.anchor_timeout_ms),
            anchor_poll_interval: Duration::from_millis(h.anchor_poll_ms),
            layout: RowLayout {
                primary_cell: h.primary_cell,
            },
        }
    }

    pub fn enrich_settings(&self) -> EnrichSettings {
        EnrichSettings {
            concurrency: self.enrich.concurrency,
            pacing_delay: Duration::from_millis(self.enrich.pacing_delay_ms),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        let f = &self.fetch;
        FetchSettings {
            connect_timeout: Duration::from_millis(f.connect_timeout_ms),
            request_timeout: Duration::from_millis(f.request_timeout_ms),
            redirect_limit: f.redirect_limit,
            max_bytes: f.max_bytes,
            allowed_content_types: f.allowed_content_types.clone(),
            user_agent: f.user_agent.clone(),
        }
    }

    pub fn row_selectors(&self) -> RowSelectors {
        RowSelectors {
            row: self.selectors.row.clone(),
            cell: self.selectors.cell.clone(),
            entry: self.selectors.entry.clone(),
        }
    }

    pub fn field_selectors(&self) -> FieldTableSelectors {
        FieldTableSelectors {
            table: self.selectors.field_table.clone(),
            row: self.selectors.field_row.clone(),
            cell: self.selectors.field_cell.clone(),
            text: self.selectors.field_text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_portal_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(
            config.counties,
            vec!["Hoke", "Robeson", "Bladen", "Sampson", "Cumberland"]
        );
        assert_eq!(config.harvest_settings().max_cycles, 1000);
        assert_eq!(config.harvest_settings().stall_threshold, 10);
        assert_eq!(config.enrich_settings().pacing_delay, Duration::from_secs(1));
        assert_eq!(config.row_selectors(), RowSelectors::default());
        assert_eq!(config.field_selectors(), FieldTableSelectors::default());
    }

    #[test]
    fn partial_ron_keeps_remaining_defaults() {
        let config = PipelineConfig::from_ron(
            r#"(
                counties: ["Wake"],
                harvest: (stall_threshold: 3),
                enrich: (concurrency: 4),
            )"#,
        )
        .unwrap();

        assert_eq!(config.counties, vec!["Wake"]);
        assert_eq!(config.harvest.stall_threshold, 3);
        assert_eq!(config.harvest.max_cycles, 1000);
        assert_eq!(config.enrich.concurrency, 4);
        assert_eq!(config.enrich.pacing_delay_ms, 1000);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn ron_round_trip_preserves_config() {
        let mut config = PipelineConfig::default();
        config.selectors.field_text = "span".into();
        let text = config.to_ron().unwrap();
        assert_eq!(PipelineConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = PipelineConfig::default();
        config.apply_harvest_overrides(&HarvestOptions {
            stall_threshold: Some(2),
            ..HarvestOptions::default()
        });
        config.apply_enrich_overrides(&EnrichOptions {
            counties: vec!["Sampson".into()],
            base_url: Some("http://localhost:8080/".into()),
            pacing_ms: Some(0),
            concurrency: None,
        });

        assert_eq!(config.harvest.stall_threshold, 2);
        assert_eq!(config.counties, vec!["Sampson"]);
        assert_eq!(config.base_url().unwrap().port(), Some(8080));
        assert_eq!(config.enrich_settings().pacing_delay, Duration::ZERO);
        assert_eq!(config.enrich.concurrency, 1);
    }

    #[test]
    fn load_reads_file_and_reports_bad_syntax() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("harvest.ron");
        fs::write(&path, r#"(base_url: "http://portal.test/")"#).unwrap();
        let config = PipelineConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.base_url, "http://portal.test/");

        fs::write(&path, "(base_url: ").unwrap();
        let err = PipelineConfig::load(Some(path.as_path())).unwrap_err();
        assert!(format!("{err:#}").contains("parsing configuration"));

        assert_eq!(PipelineConfig::load(None).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let config = PipelineConfig {
            base_url: "not a url".into(),
            ..PipelineConfig::default()
        };
        assert!(config.base_url().is_err());
    }
}
