// Load cycle orchestration: sources -> parser -> normalizer -> index -> reconciler.
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, SourceConfig};
use crate::index::ItemIndex;
use crate::model::{CatalogItem, CatalogSource, LoadedCatalog, SyncError};
use crate::normalizer::{normalize_all, normalize_id};
use crate::page::{updater, Document, NodeId};
use crate::parser::LazyParser;
use crate::pricing::PriceFormat;
use crate::reconciler::{ReconcileOutcome, Reconciler};
use crate::source::{Fetcher, SourceLoader};

/// Everything one successful load produced. Replaced as a unit, never edited.
#[derive(Debug)]
pub struct Snapshot {
    pub catalog: LoadedCatalog,
    pub index: ItemIndex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Reconciled {
        source: CatalogSource,
        outcome: ReconcileOutcome,
    },
    /// No source produced data. `fallback_shown` is set when the container now holds the failure message.
    Failed { fallback_shown: bool },
}

pub struct CatalogSync {
    loader: SourceLoader,
    source: SourceConfig,
    container_id: String,
    failure_message: String,
    format: PriceFormat,
    current: ArcSwapOption<Snapshot>,
}

impl CatalogSync {
    pub fn new(config: &AppConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_parser(config, fetcher, Arc::new(LazyParser::csv()))
    }

    pub fn with_parser(config: &AppConfig, fetcher: Arc<dyn Fetcher>, parser: Arc<LazyParser>) -> Self {
        let loader = SourceLoader::new(fetcher, parser, config.source.sheet_timeout())
            .with_backup_timeout(config.source.backup_timeout());
        Self {
            loader,
            source: config.source.clone(),
            container_id: config.container_id.clone(),
            failure_message: config.failure_message.clone(),
            format: config.price.clone(),
            current: ArcSwapOption::empty(),
        }
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler {
            container_id: &self.container_id,
            format: &self.format,
        }
    }

    /// Latest successfully loaded snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Runs one load cycle and swaps in the new snapshot. A failed cycle keeps the previous one.
    pub async fn load(&self) -> Result<Arc<Snapshot>, SyncError> {
        let addons_sheet = self.source.addons_sheet_id.as_deref();
        let (primary, addons) = tokio::join!(self.loader.load_sheet(&self.source.sheet_id), async {
            match addons_sheet {
                Some(sheet) => Some(self.loader.load_sheet(sheet).await),
                None => None,
            }
        });

        let addon_items = match addons {
            Some(Ok(rows)) => normalize_all(&rows),
            Some(Err(e)) => {
                warn!("Add-ons table unavailable, continuing without it: {}", e);
                Vec::new()
            }
            None => Vec::new(),
        };

        let (base_items, source) = match primary {
            Ok(rows) => (normalize_all(&rows), CatalogSource::Primary),
            Err(primary_err) => {
                warn!("Primary sheet failed: {}", primary_err);
                let Some(backup_url) = self.source.backup_url.as_deref() else {
                    return Err(SyncError::NoBackup(primary_err));
                };
                match self.loader.load_backup(backup_url).await {
                    Ok(rows) => {
                        info!("Serving catalog from backup");
                        (normalize_all(&rows), CatalogSource::Backup)
                    }
                    Err(backup_err) => {
                        return Err(SyncError::Exhausted {
                            primary: primary_err,
                            backup: backup_err,
                        });
                    }
                }
            }
        };

        let base_index = ItemIndex::build(&base_items);
        let addons_index = ItemIndex::build(&addon_items);
        let items = combine_items(base_items, addon_items, &base_index);
        let index = base_index.merge(addons_index);
        info!("Loaded {} items ({} indexed) from {:?}", items.len(), index.len(), source);

        let snapshot = Arc::new(Snapshot {
            catalog: LoadedCatalog {
                items,
                source,
                loaded_at: Utc::now(),
            },
            index,
        });
        self.current.store(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    /// Loads and reconciles against `doc`. Never fails: a terminal load failure becomes the
    /// fallback message in full-render mode and leaves hybrid pages as they are.
    pub async fn sync<D: Document>(&self, doc: &mut D) -> SyncOutcome {
        match self.load().await {
            Ok(snapshot) => {
                let outcome = self
                    .reconciler()
                    .reconcile(doc, &snapshot.catalog.items, &snapshot.index);
                SyncOutcome::Reconciled {
                    source: snapshot.catalog.source,
                    outcome,
                }
            }
            Err(e) => {
                error!("Catalog load failed: {}", e);
                SyncOutcome::Failed {
                    fallback_shown: self.show_failure(doc),
                }
            }
        }
    }

    fn show_failure<D: Document>(&self, doc: &mut D) -> bool {
        let root = doc.root();
        if !updater::marked_elements(doc, root).is_empty() {
            debug!("Hybrid page keeps its default content");
            return false;
        }
        match doc.element_by_id(&self.container_id) {
            Some(container) => {
                updater::show_failure(doc, container, &self.failure_message);
                true
            }
            None => false,
        }
    }

    /// Repaints price displays under `scope` (whole page when `None`) from the current snapshot.
    /// No network access.
    pub fn refresh<D: Document>(&self, doc: &mut D, scope: Option<NodeId>) -> usize {
        let Some(snapshot) = self.snapshot() else {
            debug!("Refresh requested before any catalog was loaded");
            return 0;
        };
        debug!(
            "Refreshing prices from {:?} catalog loaded at {}",
            snapshot.catalog.source, snapshot.catalog.loaded_at
        );
        let scope = scope.unwrap_or_else(|| doc.root());
        self.reconciler().refresh_prices(doc, scope, &snapshot.index)
    }

    /// Refresh for a size-selection event. Yields once first so every other handler of the
    /// same event, which may swap the active ids, runs before prices are resolved.
    pub async fn refresh_after_event<D: Document>(&self, page: &Mutex<D>, scope: Option<NodeId>) -> usize {
        tokio::task::yield_now().await;
        let mut doc = page.lock().await;
        self.refresh(&mut *doc, scope)
    }
}

/// Base items first, then add-on items whose id the base table does not already define.
fn combine_items(
    base: Vec<CatalogItem>,
    addons: Vec<CatalogItem>,
    base_index: &ItemIndex,
) -> Vec<CatalogItem> {
    let mut items = base;
    items.extend(addons.into_iter().filter(|item| {
        let key = normalize_id(&item.id);
        key.is_empty() || base_index.get(&key).is_none()
    }));
    items
}
