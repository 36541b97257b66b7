use crate::error::{ErrorKind, Result};
use clap::Args;
use exn::{OptionExt, ResultExt};
use hoard_backup::prefs::JsonPreferences;
use hoard_backup::retention::snapshot_name;
use hoard_backup::{
    CaptureSelector, Context, Library, RestoreOptions, RestoreReport, Target, ValidationReport, create_snapshot,
    read_snapshot, restore_snapshot, validate,
};
use hoard_compress::Compression;
use hoard_config::Config;
use hoard_model::Medium;
use hoard_storage::backend::LocalBackend;
use hoard_storage::{FileInfo, StorageBackend};
use hoard_store::Database;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::UtcDateTime;
use tracing::instrument;

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Write an automatic snapshot and prune old ones
    #[arg(long, conflicts_with = "path")]
    pub auto: bool,
    /// Data to include, e.g. "categories,units" (defaults to the configured flags)
    #[arg(long, value_name = "LIST")]
    pub only: Option<String>,
    /// Override the configured compression (none, gzip, bzip2)
    #[arg(long)]
    pub compression: Option<String>,
    /// Destination file (defaults to a dated name in the snapshot directory)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RestoreArgs {
    pub path: PathBuf,
    /// Data to restore (defaults to everything)
    #[arg(long, value_name = "LIST")]
    pub only: Option<String>,
    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Do not fetch fresh unit lists from installed sources
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    pub path: PathBuf,
}

/// Both library stores plus the preference file, opened from configuration.
pub struct Session {
    ctx: Context,
    databases: [Database; 2],
}
impl Session {
    #[instrument(skip_all)]
    pub async fn open(config: &Config) -> Result<Self> {
        let manga = open_store(&config.stores.manga).await?;
        let anime = open_store(&config.stores.anime).await?;
        let ctx = Context {
            manga: Library::new(Medium::Manga, manga.repository()),
            anime: Library::new(Medium::Anime, anime.repository()),
            preferences: Arc::new(JsonPreferences::new(config.preferences.clone())),
        };
        Ok(Self { ctx, databases: [manga, anime] })
    }

    pub async fn close(self) {
        for database in &self.databases {
            database.close().await;
        }
    }
}

async fn open_store(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Store)?;
    }
    Database::connect(path).await.or_raise(|| ErrorKind::Store)
}

pub async fn create(config: &Config, session: &Session, args: CreateArgs) -> Result<()> {
    let selector = match &args.only {
        Some(list) => parse_selector(list)?,
        None => CaptureSelector::from_bits(config.backup.flags),
    };
    let compression = match &args.compression {
        Some(name) => name
            .parse::<Compression>()
            .or_raise(|| ErrorKind::InvalidArgument(format!("unknown compression `{name}`")))?,
        None => config.backup.compression,
    };

    let (root, target) = if args.auto {
        (config.backup.directory.clone(), Target::Automatic { keep: config.backup.max_automatic })
    } else {
        let path = args
            .path
            .unwrap_or_else(|| config.backup.directory.join(snapshot_name(UtcDateTime::now(), compression)));
        let (root, name) = locate(&path)?;
        (root, Target::Manual(name))
    };
    let backend = open_backend(&root)?;
    let written = create_snapshot(&session.ctx, &backend, target, selector, compression)
        .await
        .or_raise(|| ErrorKind::Backup)?;
    println!("{}", root.join(written).display());
    Ok(())
}

pub async fn restore(session: &Session, args: RestoreArgs) -> Result<()> {
    let selector = match &args.only {
        Some(list) => parse_selector(list)?,
        None => CaptureSelector::all(),
    };
    let (root, name) = locate(&args.path)?;
    let snapshot = read_snapshot(&open_backend(&root)?, &name).await.or_raise(|| ErrorKind::Backup)?;
    let options = RestoreOptions { dry_run: args.dry_run, refresh_units: !args.no_refresh };
    let report = restore_snapshot(&session.ctx, &snapshot, selector, options)
        .await
        .or_raise(|| ErrorKind::Backup)?;
    print!("{}", describe_restore(&report, args.dry_run));
    Ok(())
}

pub async fn validate_file(session: &Session, args: ValidateArgs) -> Result<()> {
    let (root, name) = locate(&args.path)?;
    let backend = open_backend(&root)?;
    let info = backend.stat(&name).await.or_raise(|| ErrorKind::InvalidPath(args.path.clone()))?;
    let snapshot = read_snapshot(&backend, &name).await.or_raise(|| ErrorKind::Backup)?;
    print!("{}", describe_file(&info));
    print!("{}", describe_validation(&validate(&session.ctx, &snapshot)));
    Ok(())
}

fn parse_selector(list: &str) -> Result<CaptureSelector> {
    list.parse::<CaptureSelector>()
        .or_raise(|| ErrorKind::InvalidArgument(format!("unknown data category in `{list}`")))
}

fn open_backend(root: &Path) -> Result<LocalBackend> {
    LocalBackend::new("snapshots", root).or_raise(|| ErrorKind::Directory(root.to_path_buf()))
}

/// Split a snapshot file path into an absolute backend root and the file
/// name below it.
fn locate(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?.join(path)
    };
    let name = absolute.file_name().ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
    let root = absolute.parent().ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
    Ok((root.to_path_buf(), PathBuf::from(name)))
}

fn describe_restore(report: &RestoreReport, dry_run: bool) -> String {
    let mut out = String::new();
    if dry_run {
        out.push_str("dry run, nothing was written\n");
    }
    out.push_str(&format!("series: {} (categories: {})\n", report.series, report.categories));
    out.push_str(&format!("units: {} inserted, {} updated\n", report.units_inserted, report.units_updated));
    out.push_str(&format!("history: {} written\n", report.history));
    out.push_str(&format!("tracks: {} inserted, {} updated\n", report.tracks_inserted, report.tracks_updated));
    out.push_str(&format!("preferences: {}\n", report.preferences));
    for issue in &report.issues {
        out.push_str(&format!("warning: {issue}\n"));
    }
    out
}

fn describe_file(info: &FileInfo) -> String {
    let at = info.modified;
    format!(
        "file: {} ({} bytes, {}, modified {:04}-{:02}-{:02} {:02}:{:02} UTC)\n",
        info.file_name().unwrap_or_default(),
        info.size,
        info.compression,
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
    )
}

fn describe_validation(report: &ValidationReport) -> String {
    let mut out = format!("series: {}\n", report.series);
    if !report.trackers.is_empty() {
        let trackers: Vec<String> = report.trackers.iter().map(i32::to_string).collect();
        out.push_str(&format!("trackers: {}\n", trackers.join(", ")));
    }
    if report.all_sources_installed() {
        out.push_str("all sources installed\n");
    }
    for (medium, source) in &report.missing_sources {
        out.push_str(&format!("missing {medium} source: {} ({})\n", source.name, source.id));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoard_backup::RestoreIssue;
    use hoard_backup::snapshot::SourceInfo;
    use rstest::rstest;
    use std::collections::BTreeSet;

    #[rstest]
    #[case("/var/backups/library.json.gz", "/var/backups", "library.json.gz")]
    #[case("/library.json", "/", "library.json")]
    fn test_locate_absolute(#[case] path: &str, #[case] root: &str, #[case] name: &str) {
        let (actual_root, actual_name) = locate(Path::new(path)).unwrap();
        assert_eq!(actual_root, PathBuf::from(root));
        assert_eq!(actual_name, PathBuf::from(name));
    }

    #[test]
    fn test_locate_relative_uses_working_directory() {
        let (root, name) = locate(Path::new("nested/library.json")).unwrap();
        assert_eq!(root, std::env::current_dir().unwrap().join("nested"));
        assert_eq!(name, PathBuf::from("library.json"));
    }

    #[test]
    fn test_locate_rejects_directory_root() {
        let err = locate(Path::new("/")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(parse_selector("categories, units").unwrap().bits(), 0x03);
        let err = parse_selector("units,covers").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn test_describe_restore_lists_issues() {
        let report = RestoreReport {
            series: 2,
            issues: vec![RestoreIssue::StubSource {
                medium: Medium::Anime,
                source: SourceInfo { id: 9, name: "9".to_string() },
            }],
            ..RestoreReport::default()
        };
        let text = describe_restore(&report, true);
        assert!(text.starts_with("dry run"));
        assert!(text.contains("series: 2"));
        assert!(text.contains("warning: anime: source 9 is not installed"));
    }

    #[test]
    fn test_describe_file() {
        let info = FileInfo::new("hoard_2024-03-07_09-05.snapshot.json.gz", 2048, UtcDateTime::new(
            time::Date::from_calendar_date(2024, time::Month::March, 7).unwrap(),
            time::Time::from_hms(9, 5, 30).unwrap(),
        ));
        assert_eq!(
            describe_file(&info),
            "file: hoard_2024-03-07_09-05.snapshot.json.gz (2048 bytes, gzip, modified 2024-03-07 09:05 UTC)\n"
        );
    }

    #[test]
    fn test_describe_validation() {
        let report = ValidationReport {
            series: 3,
            missing_sources: vec![(Medium::Manga, SourceInfo { id: 4, name: "4".to_string() })],
            trackers: BTreeSet::from([1, 2]),
        };
        let text = describe_validation(&report);
        assert!(text.contains("trackers: 1, 2"));
        assert!(text.contains("missing manga source: 4 (4)"));
        assert!(!text.contains("all sources installed"));
    }
}
