//! Process-wide cached catalog
//!
//! The table is read on first use and kept for the process lifetime.
//! `reload` replaces the cached copy; readers holding the previous `Arc` keep it.

use super::CardCatalog;
use crate::config::{resolve_catalog_path, CATALOG_PATH_ENV};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;

static GLOBAL_CATALOG: Lazy<CatalogService> =
    Lazy::new(|| CatalogService::new(resolve_catalog_path()));

/// Cached card catalog bound to one table path.
#[derive(Debug)]
pub struct CatalogService {
    path: PathBuf,
    cached: RwLock<Option<Arc<CardCatalog>>>,
}

impl CatalogService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cached: RwLock::new(None) }
    }

    /// Service pre-filled with an already built catalog.
    pub fn with_catalog(path: impl Into<PathBuf>, catalog: CardCatalog) -> Self {
        Self { path: path.into(), cached: RwLock::new(Some(Arc::new(catalog))) }
    }

    /// Process-wide instance; the path comes from `CARD_MASTER_PATH`.
    pub fn global() -> &'static CatalogService {
        &GLOBAL_CATALOG
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached catalog, loading it on first call.
    pub fn get(&self) -> Arc<CardCatalog> {
        if let Some(catalog) = self.read_cached() {
            return catalog;
        }

        let mut guard = self.cached.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(catalog) = guard.as_ref() {
            return Arc::clone(catalog);
        }
        let catalog = Arc::new(CardCatalog::load_or_default(&self.path));
        *guard = Some(Arc::clone(&catalog));
        catalog
    }

    /// Re-read the table and replace the cached copy.
    pub fn reload(&self) -> Arc<CardCatalog> {
        let catalog = Arc::new(CardCatalog::load_or_default(&self.path));
        info!(path = %self.path.display(), env = CATALOG_PATH_ENV, cards = catalog.len(), "card master reloaded");
        let mut guard = self.cached.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(Arc::clone(&catalog));
        catalog
    }

    fn read_cached(&self) -> Option<Arc<CardCatalog>> {
        let guard = self.cached.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.as_ref().map(Arc::clone)
    }
}

/// Shared catalog of the process-wide service.
pub fn card_catalog() -> Arc<CardCatalog> {
    CatalogService::global().get()
}

pub fn reload_card_catalog() -> Arc<CardCatalog> {
    CatalogService::global().reload()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::TEST_TABLE;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_get_caches_first_load() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", TEST_TABLE).unwrap();

        let service = CatalogService::new(file.path());
        let first = service.get();
        assert_eq!(first.len(), 9);

        // later edits are invisible until reload
        file.as_file().set_len(0).unwrap();
        let second = service.get();
        assert!(Arc::ptr_eq(&first, &second));

        let reloaded = service.reload();
        assert!(reloaded.stats().rows_read == 0 || reloaded.stats().fallback_used);
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert!(Arc::ptr_eq(&reloaded, &service.get()));
    }

    #[test]
    fn test_unreadable_path_uses_embedded_table() {
        let service = CatalogService::new("/nonexistent/card_master.csv");
        let catalog = service.get();
        assert!(catalog.stats().fallback_used);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_with_catalog_skips_loading() {
        let catalog = CardCatalog::from_csv_str(TEST_TABLE);
        let service = CatalogService::with_catalog("/nonexistent/card_master.csv", catalog);
        assert!(!service.get().stats().fallback_used);
        assert_eq!(service.get().len(), 9);
    }
}
