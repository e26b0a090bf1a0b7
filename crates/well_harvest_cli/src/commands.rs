use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use harvest_logging::{harvest_error, harvest_info, harvest_warn};
use tokio_util::sync::CancellationToken;
use well_harvest_engine::{
    read_discovery_csv, summary_path, write_discovery_csv, write_discovery_summary,
    write_enrichment_summary, write_normalized_csv, EnrichmentReport, Enricher, HarvestReport,
    Harvester, HttpPageLoader, LogProgressSink, PortalDetailFetcher, SnapshotSurface,
    Termination,
};

use crate::cli::{DiscoverArgs, EnrichArgs, RunArgs};
use crate::config::PipelineConfig;

fn generated_utc() -> String {
    Utc::now().to_rfc3339()
}

/// Cancel `token` on the first Ctrl-C. Running stages stop at their next
/// cycle or record boundary and still write what they have.
pub fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                harvest_warn!("Interrupt received; finishing the current step");
                token.cancel();
            }
            Err(err) => harvest_error!("Unable to listen for Ctrl-C: {}", err),
        }
    });
}

pub async fn discover(
    mut config: PipelineConfig,
    args: &DiscoverArgs,
    cancel: CancellationToken,
) -> Result<()> {
    config.apply_harvest_overrides(&args.harvest);
    discover_stage(&config, &args.snapshots, &args.output, cancel).await?;
    Ok(())
}

pub async fn enrich(
    mut config: PipelineConfig,
    args: &EnrichArgs,
    cancel: CancellationToken,
) -> Result<()> {
    config.apply_enrich_overrides(&args.enrich);
    enrich_stage(&config, &args.input, &args.output, cancel).await?;
    Ok(())
}

pub async fn run(mut config: PipelineConfig, args: &RunArgs, cancel: CancellationToken) -> Result<()> {
    config.apply_harvest_overrides(&args.harvest);
    config.apply_enrich_overrides(&args.enrich);

    let report = discover_stage(&config, &args.snapshots, &args.discovery_output, cancel.clone()).await?;
    if report.termination == Termination::Cancelled {
        harvest_warn!("Discovery was cancelled; skipping enrichment");
        return Ok(());
    }
    enrich_stage(&config, &args.discovery_output, &args.output, cancel).await?;
    Ok(())
}

async fn discover_stage(
    config: &PipelineConfig,
    snapshots: &Path,
    output: &Path,
    cancel: CancellationToken,
) -> Result<HarvestReport> {
    let mut surface = SnapshotSurface::from_dir(snapshots, config.row_selectors())
        .with_context(|| format!("loading list snapshots from {}", snapshots.display()))?;
    if surface.page_count() == 0 {
        bail!("no .html snapshots found in {}", snapshots.display());
    }
    harvest_info!(
        "Replaying {} list snapshots from {:?}",
        surface.page_count(),
        snapshots
    );

    let harvested = Harvester::new(config.harvest_settings())
        .with_sink(&LogProgressSink)
        .with_cancellation(cancel)
        .run(&mut surface)
        .await;

    let report = match harvested {
        Ok(report) => report,
        Err(err) => {
            // Keep what was collected; a surface that never became ready
            // still leaves a header-only export behind.
            let message = err.to_string();
            let partial = err.into_partial();
            write_discovery_csv(output, &partial)
                .with_context(|| format!("writing partial discovery export {}", output.display()))?;
            bail!(
                "discovery stopped with {} records (partial export at {}): {}",
                partial.len(),
                output.display(),
                message
            );
        }
    };

    let written = write_discovery_csv(output, &report.records)
        .with_context(|| format!("writing discovery export {}", output.display()))?;
    write_discovery_summary(&summary_path(output), &report, &generated_utc())
        .context("writing discovery summary")?;
    harvest_info!(
        "Wrote {} discovered records to {:?} after {} cycles ({:?})",
        report.records.len(),
        written,
        report.cycles,
        report.termination
    );
    Ok(report)
}

async fn enrich_stage(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
    cancel: CancellationToken,
) -> Result<EnrichmentReport> {
    let discovered = read_discovery_csv(input)
        .with_context(|| format!("reading discovery export {}", input.display()))?;
    let loader = HttpPageLoader::new(config.fetch_settings()).context("building http client")?;
    let fetcher = PortalDetailFetcher::with_selectors(config.base_url()?, loader, config.field_selectors());
    let filter = config.county_filter();
    harvest_info!(
        "Enriching records from {:?} for counties {:?}",
        input,
        filter.counties()
    );

    let report = Enricher::new(&fetcher, config.enrich_settings())
        .with_sink(&LogProgressSink)
        .with_cancellation(cancel)
        .run(&discovered, |record| filter.allows(record))
        .await;

    let written = write_normalized_csv(output, &report.records)
        .with_context(|| format!("writing normalized export {}", output.display()))?;
    write_enrichment_summary(&summary_path(output), &report, &generated_utc())
        .context("writing enrichment summary")?;
    harvest_info!(
        "Wrote {} normalized records to {:?}; {} detail pages failed",
        report.records.len(),
        written,
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn list_that_never_renders_leaves_a_header_only_export() {
        let temp = TempDir::new().unwrap();
        let snapshots = temp.path().join("snapshots");
        fs::create_dir(&snapshots).unwrap();
        fs::write(
            snapshots.join("01.html"),
            "<html><body><p>Loading...</p></body></html>",
        )
        .unwrap();
        let output = temp.path().join("discovery.csv");

        let mut config = PipelineConfig::default();
        config.harvest.anchor_timeout_ms = 0;

        let err = discover_stage(&config, &snapshots, &output, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("never appeared"), "{err}");

        let written = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Document Name,Link,"));
    }
}
