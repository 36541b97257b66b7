//! Checking a snapshot against what is installed before restoring it.

use crate::context::Context;
use crate::snapshot::{Snapshot, SourceInfo};
use hoard_model::Medium;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub series: usize,
    /// Sources referenced by the snapshot that are not installed.
    pub missing_sources: Vec<(Medium, SourceInfo)>,
    /// Every tracking service referenced by the snapshot.
    pub trackers: BTreeSet<i32>,
}
impl ValidationReport {
    /// Whether every series can have its units refreshed after a restore.
    pub fn all_sources_installed(&self) -> bool {
        self.missing_sources.is_empty()
    }
}

pub fn validate(ctx: &Context, snapshot: &Snapshot) -> ValidationReport {
    let mut report = ValidationReport::default();
    for library in ctx.libraries() {
        let section = snapshot.section(library.medium);
        let mut referenced: BTreeMap<i64, SourceInfo> =
            section.sources.iter().map(|source| (source.id, source.clone())).collect();
        for series in &section.series {
            referenced
                .entry(series.source)
                .or_insert_with(|| SourceInfo { id: series.source, name: series.source.to_string() });
            report.trackers.extend(series.tracks.iter().map(|track| track.sync_id));
        }
        report.series += section.series.len();
        report.missing_sources.extend(
            referenced
                .into_values()
                .filter(|source| !library.sources.is_installed(source.id))
                .map(|source| (library.medium, source)),
        );
    }
    report
}
