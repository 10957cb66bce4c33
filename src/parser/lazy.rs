use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::model::SourceError;
use crate::parser::{CsvTableParser, TableParser};

type ParserLoader =
    Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn TableParser>, SourceError>> + Send + Sync>;

/// Parser capability loaded on first use and shared afterwards.
///
/// Concurrent first callers wait on the same load. A failed load is not cached,
/// so the next caller tries again.
pub struct LazyParser {
    cell: OnceCell<Arc<dyn TableParser>>,
    loader: ParserLoader,
}

impl LazyParser {
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Arc<dyn TableParser>, SourceError>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(move || loader().boxed()),
        }
    }

    /// CSV parser with default settings.
    pub fn csv() -> Self {
        Self::new(|| async {
            let parser: Arc<dyn TableParser> = Arc::new(CsvTableParser::new());
            Ok(parser)
        })
    }

    pub async fn get(&self) -> Result<Arc<dyn TableParser>, SourceError> {
        let parser = self
            .cell
            .get_or_try_init(|| {
                debug!("Loading table parser...");
                (self.loader)()
            })
            .await
            .inspect_err(|e| warn!("Table parser failed to load: {}", e))?;
        Ok(Arc::clone(parser))
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}
