//! Restoring a whole snapshot.

use crate::context::{Context, Library};
use crate::error::{ErrorKind, Result};
use crate::prefs;
use crate::reconcile::{
    refresh_units, restore_categories, restore_history, restore_series, restore_series_categories, restore_tracks,
    restore_units,
};
use crate::selector::CaptureSelector;
use crate::snapshot::{Section, Snapshot, SourceInfo};
use derive_more::Display;
use exn::{OptionExt, ResultExt};
use hoard_model::Medium;
use tracing::instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Roll every store transaction back and leave preferences untouched.
    pub dry_run: bool,
    /// Fetch fresh unit lists from installed sources.
    pub refresh_units: bool,
}
impl Default for RestoreOptions {
    fn default() -> Self {
        Self { dry_run: false, refresh_units: true }
    }
}

/// Something that did not stop the restore but deserves a mention.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum RestoreIssue {
    #[display("{medium}: source {} is not installed, units were not refreshed", source.name)]
    StubSource { medium: Medium, source: SourceInfo },
    #[display("{medium}: could not refresh {series_url}: {message}")]
    FetchFailed { medium: Medium, series_url: String, message: String },
    #[display("{medium}: dropped {count} history entries for unknown units of {series_url}")]
    DroppedHistory { medium: Medium, series_url: String, count: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub series: usize,
    pub categories: usize,
    pub units_inserted: usize,
    pub units_updated: usize,
    pub history: usize,
    pub tracks_inserted: usize,
    pub tracks_updated: usize,
    pub preferences: usize,
    pub issues: Vec<RestoreIssue>,
}

/// Merge a snapshot into every library and the preference store.
///
/// Each library is restored inside one transaction: a failure leaves that
/// store exactly as it was. Only the slices enabled in `selector` are
/// written, whatever the snapshot carries.
#[instrument(skip(ctx, snapshot), fields(selector = %selector, dry_run = options.dry_run))]
pub async fn restore_snapshot(
    ctx: &Context,
    snapshot: &Snapshot,
    selector: CaptureSelector,
    options: RestoreOptions,
) -> Result<RestoreReport> {
    let mut report = RestoreReport::default();
    for library in ctx.libraries() {
        let section = snapshot.section(library.medium);
        if section.is_empty() {
            continue;
        }
        restore_section(library, section, selector, options, &mut report).await?;
    }

    if selector.preferences && !snapshot.preferences.is_empty() {
        if options.dry_run {
            tracing::info!(count = snapshot.preferences.len(), "dry run: not writing preferences");
        } else {
            prefs::restore(ctx.preferences.as_ref(), &snapshot.preferences).await?;
        }
        report.preferences = snapshot.preferences.len();
    }
    tracing::info!(
        series = report.series,
        units = report.units_inserted + report.units_updated,
        history = report.history,
        tracks = report.tracks_inserted + report.tracks_updated,
        issues = report.issues.len(),
        "restore complete"
    );
    Ok(report)
}

#[instrument(skip_all, fields(medium = %library.medium, series = section.series.len()))]
async fn restore_section(
    library: &Library,
    section: &Section,
    selector: CaptureSelector,
    options: RestoreOptions,
    report: &mut RestoreReport,
) -> Result<()> {
    let medium = library.medium;
    let repository = library.repository.clone().with_dry_run(options.dry_run || library.repository.is_dry_run());
    let mut tx = repository.begin().await.or_raise(|| ErrorKind::Store)?;

    let categories = if selector.categories {
        let categories = restore_categories(&mut tx, &section.categories).await?;
        let mut ids: Vec<i64> = categories.iter().filter_map(|category| category.id).collect();
        ids.sort_unstable();
        ids.dedup();
        report.categories += ids.len();
        categories
    } else {
        Vec::new()
    };

    for source in section.sources.iter().filter(|source| !library.sources.is_installed(source.id)) {
        tracing::warn!(source = source.id, name = %source.name, "source not installed");
        report.issues.push(RestoreIssue::StubSource { medium, source: source.clone() });
    }

    for entry in &section.series {
        let series = restore_series(&mut tx, entry).await?;
        let series_id = series.id.ok_or_raise(|| ErrorKind::Store)?;
        report.series += 1;

        if selector.categories {
            restore_series_categories(&mut tx, series_id, &entry.categories, &categories).await?;
        }
        if selector.units {
            let merge = restore_units(&mut tx, series_id, &entry.units).await?;
            report.units_inserted += merge.inserted.len();
            report.units_updated += merge.updated.len();

            let source = library.sources.resolve(series.source);
            if options.refresh_units && source.is_installed() {
                match refresh_units(&source, &mut tx, &series, &entry.units).await {
                    Ok(merge) => {
                        report.units_inserted += merge.inserted.len();
                        report.units_updated += merge.updated.len();
                    },
                    Err(e) if matches!(&*e, ErrorKind::Source | ErrorKind::SourceUnavailable(_)) => {
                        tracing::warn!(url = %series.url, error = ?e, "unit refresh failed");
                        report.issues.push(RestoreIssue::FetchFailed {
                            medium,
                            series_url: series.url.clone(),
                            message: (*e).to_string(),
                        });
                    },
                    Err(e) => return Err(e),
                }
            }
        }
        if selector.history {
            let merge = restore_history(&mut tx, series_id, &entry.history).await?;
            report.history += merge.written;
            if merge.dropped > 0 {
                report.issues.push(RestoreIssue::DroppedHistory {
                    medium,
                    series_url: series.url.clone(),
                    count: merge.dropped,
                });
            }
        }
        if selector.tracking {
            let merge = restore_tracks(&mut tx, series_id, &entry.tracks).await?;
            report.tracks_inserted += merge.inserted.len();
            report.tracks_updated += merge.updated.len();
        }
    }

    tx.commit().await.or_raise(|| ErrorKind::Store)
}
