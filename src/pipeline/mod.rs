pub mod classify;
pub mod dedupe;
pub mod geocode;
pub mod normalize;
pub mod verify;

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::domain::ResourceRecord;
use crate::storage::RawRow;

use self::geocode::{CoordinateResolver, Geocoder, NominatimGeocoder};
use self::verify::{LinkProbe, LinkVerifier, ReqwestProbe};

/// Per-stage counts reported to the operator after a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub rows_read: usize,
    pub french_removed: usize,
    pub invalid_removed: usize,
    pub dead_links_removed: usize,
    pub employment_removed: usize,
    pub indigenous_overridden: usize,
    pub duplicates_removed: usize,
    pub unresolved_removed: usize,
    pub rows_written: usize,
}

/// Sequences the cleaning stages for one batch invocation. Network
/// collaborators sit behind ports so the whole pipeline runs against stubs
/// in tests.
pub struct Refinery {
    config: Config,
    probe: Arc<dyn LinkProbe>,
    geocoder: Arc<dyn Geocoder>,
}

impl Refinery {
    pub fn new(config: Config) -> Self {
        let probe = Arc::new(ReqwestProbe::new());
        let geocoder = Arc::new(NominatimGeocoder::new(&config.geocoding));
        Self::with_ports(config, probe, geocoder)
    }

    /// Injection point for test doubles of the network collaborators.
    pub fn with_ports(
        config: Config,
        probe: Arc<dyn LinkProbe>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            config,
            probe,
            geocoder,
        }
    }

    /// Normalize, classify, and merge-dedupe a batch. Rows of an existing
    /// dataset come first and win dedup collisions; the refined output is
    /// sorted for the sink.
    pub fn refine(
        &self,
        rows: &[RawRow],
        existing: Vec<ResourceRecord>,
        summary: &mut RunSummary,
    ) -> Vec<ResourceRecord> {
        summary.rows_read += rows.len();

        let outcome = normalize::normalize_batch(rows);
        summary.french_removed += outcome.french_removed;
        let mut invalid = outcome.invalid_removed;

        let mut records: Vec<ResourceRecord> = Vec::with_capacity(outcome.records.len());
        for record in outcome.records {
            if normalize::has_refine_content(&record) {
                records.push(record);
            } else {
                invalid += 1;
            }
        }
        summary.invalid_removed += invalid;
        info!(
            "Normalized {} rows ({} French, {} invalid removed)",
            records.len(),
            outcome.french_removed,
            invalid
        );

        classify::classify_batch(&mut records);

        let deduped = dedupe::merge_deduped(vec![existing, records], true);
        summary.duplicates_removed += deduped.removed;
        info!("Removed {} duplicate rows", deduped.removed);

        let mut records = deduped.records;
        sort_for_sink(&mut records);
        records
    }

    /// Drops records whose link fails the liveness probe, then applies the
    /// late keyword pass. The pass deliberately runs on already-verified
    /// records; do not reorder these two steps.
    pub async fn verify_links(
        &self,
        records: Vec<ResourceRecord>,
        summary: &mut RunSummary,
    ) -> Vec<ResourceRecord> {
        let verifier = LinkVerifier::new(&self.config.link_check, self.probe.clone());

        // Records without a link have nothing to verify and pass through.
        let urls: HashMap<usize, String> = records
            .iter()
            .enumerate()
            .filter_map(|(id, record)| record.link.clone().map(|link| (id, link)))
            .collect();
        let probed = urls.len();
        let verdicts = verifier.verify(urls).await;

        let before = records.len();
        let mut kept: Vec<ResourceRecord> = Vec::with_capacity(before);
        for (id, record) in records.into_iter().enumerate() {
            if verdicts.get(&id).copied().unwrap_or(true) {
                kept.push(record);
            }
        }
        summary.dead_links_removed += before - kept.len();
        info!(
            "Verified {} links, removed {} dead-link rows",
            probed,
            before - kept.len()
        );

        let late = classify::late_pass(&mut kept);
        summary.employment_removed += late.removed;
        summary.indigenous_overridden += late.overridden;
        info!(
            "Late pass removed {} employment rows, overrode {} to Indigenous Support",
            late.removed, late.overridden
        );

        kept
    }

    /// Backfills missing coordinates, then drops records that stayed
    /// unresolved; coordinates are mandatory in the terminal dataset.
    pub async fn resolve_coordinates(
        &self,
        mut records: Vec<ResourceRecord>,
        summary: &mut RunSummary,
    ) -> Vec<ResourceRecord> {
        let resolver = CoordinateResolver::new(&self.config.geocoding, self.geocoder.clone());
        let stats = resolver.resolve(&mut records).await;
        info!(
            "Geocoding queried {} rows, resolved {}",
            stats.queried, stats.resolved
        );

        let before = records.len();
        records.retain(|record| record.has_coordinates());
        summary.unresolved_removed += before - records.len();
        records
    }

    /// The full pipeline for one invocation: refine, verify links plus late
    /// pass, geocode. Output is handed back for a single write at the end.
    pub async fn run(
        &self,
        rows: &[RawRow],
        existing: Vec<ResourceRecord>,
    ) -> (Vec<ResourceRecord>, RunSummary) {
        let mut summary = RunSummary::default();
        let records = self.refine(rows, existing, &mut summary);
        let records = self.verify_links(records, &mut summary).await;
        let records = self.resolve_coordinates(records, &mut summary).await;
        summary.rows_written = records.len();
        (records, summary)
    }
}

/// Sink ordering of the original dataset: province, city, category, name.
fn sort_for_sink(records: &mut [ResourceRecord]) {
    records.sort_by(|a, b| {
        (
            a.province.as_str(),
            a.city.as_str(),
            a.category.as_str(),
            a.name.as_str(),
        )
            .cmp(&(
                b.province.as_str(),
                b.city.as_str(),
                b.category.as_str(),
                b.name.as_str(),
            ))
    });
}
