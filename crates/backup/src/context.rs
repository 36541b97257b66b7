use crate::prefs::PreferenceStore;
use crate::source::SourceRegistry;
use hoard_model::Medium;
use hoard_store::Repository;
use std::sync::Arc;

/// One library store and the sources installed for it.
#[derive(Clone)]
pub struct Library {
    pub medium: Medium,
    pub repository: Repository,
    pub sources: SourceRegistry,
}
impl Library {
    pub fn new(medium: Medium, repository: Repository) -> Self {
        Self { medium, repository, sources: SourceRegistry::new() }
    }

    pub fn with_sources(mut self, sources: SourceRegistry) -> Self {
        self.sources = sources;
        self
    }
}

/// Everything a capture or restore run reads from and writes to.
#[derive(Clone)]
pub struct Context {
    pub manga: Library,
    pub anime: Library,
    pub preferences: Arc<dyn PreferenceStore>,
}
impl Context {
    pub fn library(&self, medium: Medium) -> &Library {
        match medium {
            Medium::Manga => &self.manga,
            Medium::Anime => &self.anime,
        }
    }

    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        Medium::ALL.into_iter().map(|medium| self.library(medium))
    }
}
