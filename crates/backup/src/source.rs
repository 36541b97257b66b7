//! Content sources: where fresh unit lists come from.
//!
//! The engine never fetches anything itself. Hosts register the sources
//! they have installed in a [`SourceRegistry`]; a series whose source is
//! missing resolves to a [`SourceRef::Stub`] that still has an id and a
//! printable name but cannot fetch.

use crate::error::{ErrorKind, Result};
use crate::snapshot::SourceInfo;
use async_trait::async_trait;
use hoard_model::{Series, Unit};
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait ContentSource: Send + Sync {
    fn id(&self) -> i64;

    fn name(&self) -> &str;

    /// Fetch the current unit list of a series, in source order.
    ///
    /// Implementations should raise [`ErrorKind::Source`] on failure.
    async fn fetch_units(&self, series: &Series) -> Result<Vec<Unit>>;
}

pub type SourceHandle = Arc<dyn ContentSource>;

/// A source as resolved for one series.
#[derive(Clone)]
pub enum SourceRef {
    Installed(SourceHandle),
    /// Not installed; only the id survives.
    Stub(i64),
}
impl SourceRef {
    pub fn id(&self) -> i64 {
        match self {
            SourceRef::Installed(source) => source.id(),
            SourceRef::Stub(id) => *id,
        }
    }

    /// Human readable name. Stubs are named after their id.
    pub fn name(&self) -> String {
        match self {
            SourceRef::Installed(source) => source.name().to_string(),
            SourceRef::Stub(id) => id.to_string(),
        }
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, SourceRef::Installed(_))
    }

    pub fn info(&self) -> SourceInfo {
        SourceInfo { id: self.id(), name: self.name() }
    }

    pub async fn fetch_units(&self, series: &Series) -> Result<Vec<Unit>> {
        match self {
            SourceRef::Installed(source) => source.fetch_units(series).await,
            SourceRef::Stub(id) => exn::bail!(ErrorKind::SourceUnavailable(*id)),
        }
    }
}

/// The sources installed for one medium.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<i64, SourceHandle>,
}
impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any source with the same id.
    pub fn register(&mut self, source: SourceHandle) {
        self.sources.insert(source.id(), source);
    }

    pub fn with(mut self, source: SourceHandle) -> Self {
        self.register(source);
        self
    }

    pub fn is_installed(&self, id: i64) -> bool {
        self.sources.contains_key(&id)
    }

    pub fn resolve(&self, id: i64) -> SourceRef {
        match self.sources.get(&id) {
            Some(source) => SourceRef::Installed(Arc::clone(source)),
            None => SourceRef::Stub(id),
        }
    }
}
