//! End-to-end load + reconcile cycles against a scripted fetcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use menu_sheet_sync::catalog::{CatalogSync, SyncOutcome};
use menu_sheet_sync::config::{AppConfig, DEFAULT_FAILURE_MESSAGE};
use menu_sheet_sync::model::{CatalogSource, SourceError};
use menu_sheet_sync::page::updater::{CARD_CLASS, PRODUCT_ID_ATTR, SOLD_OUT_CLASS};
use menu_sheet_sync::page::{Document, Page};
use menu_sheet_sync::reconciler::ReconcileOutcome;
use menu_sheet_sync::source::Fetcher;
use tokio::sync::Mutex;

const SHEET: &str = "https://sheets.test/base.csv";
const ADDONS: &str = "https://sheets.test/addons.csv";
const BACKUP: &str = "https://backup.test/menu.json";

enum Reply {
    Body(&'static str),
    Status(u16),
}

struct ScriptedFetcher {
    replies: HashMap<&'static str, (u64, Reply)>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn reply(mut self, url: &'static str, delay_ms: u64, reply: Reply) -> Self {
        self.replies.insert(url, (delay_ms, reply));
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some((delay, reply)) = self.replies.get(url) else {
            return Err(SourceError::Http(format!("unreachable: {url}")));
        };
        tokio::time::sleep(Duration::from_millis(*delay)).await;
        match reply {
            Reply::Body(body) => Ok(body.to_string()),
            Reply::Status(code) => Err(SourceError::BadResponse(*code)),
        }
    }
}

fn config(addons: bool) -> AppConfig {
    let addons = if addons { format!(r#""addons_sheet_id": "{ADDONS}","#) } else { String::new() };
    AppConfig::from_json(&format!(
        r#"{{ "sheet_id": "{SHEET}", {addons} "backup_url": "{BACKUP}",
             "page": {{ "input": "in.html", "output": "out.html" }} }}"#
    ))
    .expect("config")
}

fn full_render_page() -> Page {
    Page::parse(r#"<main><div id="sistema-menu-container"><p>Cargando...</p></div></main>"#)
}

const MENU_CSV: &str = "ID,Nombre,Descripción,Precio,Imagen,Disponible\n\
    pizza-1,Margherita,Tomate,5990,https://img.test/1.jpg,SI\n\
    pizza-2,Pepperoni,,6990,,no\n\
    pizza-3,Vegetariana,Verduras,6490,,Sí\n";

#[tokio::test]
async fn csv_with_unavailable_row_renders_two_cards() {
    let fetcher = Arc::new(ScriptedFetcher::new().reply(SHEET, 0, Reply::Body(MENU_CSV)));
    let sync = CatalogSync::new(&config(false), fetcher);
    let mut page = full_render_page();

    let outcome = sync.sync(&mut page).await;
    assert_eq!(
        outcome,
        SyncOutcome::Reconciled {
            source: CatalogSource::Primary,
            outcome: ReconcileOutcome::Rendered { cards: 2 },
        }
    );
    assert_eq!(page.all_by_class(CARD_CLASS).len(), 2);
    let html = page.to_html();
    assert!(html.contains("$5.990"));
    assert!(!html.contains("Pepperoni"));
    assert!(!html.contains("Cargando"));
}

#[tokio::test(start_paused = true)]
async fn primary_timeout_falls_back_to_backup() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(SHEET, 10_000, Reply::Body(MENU_CSV))
            .reply(BACKUP, 0, Reply::Body(r#"{"items":[{"id":"x","price":"500"}]}"#)),
    );
    let sync = CatalogSync::new(&config(false), fetcher);

    let mut page = full_render_page();
    let outcome = sync.sync(&mut page).await;
    assert_eq!(
        outcome,
        SyncOutcome::Reconciled {
            source: CatalogSource::Backup,
            outcome: ReconcileOutcome::Rendered { cards: 1 },
        }
    );
    assert!(page.to_html().contains(r#"<div class="sistema-menu-price">$500</div>"#));

    let mut hybrid = Page::parse(r#"<div data-producto-id="X"><span class="precio">-</span></div>"#);
    sync.sync(&mut hybrid).await;
    assert!(hybrid.to_html().contains(r#"<span class="precio">$500</span>"#));
}

#[tokio::test]
async fn size_suffixed_element_uses_size_price() {
    let csv = "id,nombre,precio,precio familiar\npizza-1,Margherita,5990,7990\n";
    let fetcher = Arc::new(ScriptedFetcher::new().reply(SHEET, 0, Reply::Body(csv)));
    let sync = CatalogSync::new(&config(false), fetcher);
    let mut page = Page::parse(
        r#"<div data-producto-id="pizza-1-fam"><h3 class="nombre">Pizza</h3><span class="precio">$0</span></div>"#,
    );

    let outcome = sync.sync(&mut page).await;
    assert!(matches!(
        outcome,
        SyncOutcome::Reconciled { outcome: ReconcileOutcome::Patched { marked: 1, matched: 1 }, .. }
    ));
    let html = page.to_html();
    assert!(html.contains(r#"<span class="precio">$7.990</span>"#));
    assert!(html.contains(r#"<h3 class="nombre">Margherita</h3>"#));
}

#[tokio::test]
async fn exhausted_sources_show_fallback_message() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(SHEET, 0, Reply::Status(500))
            .reply(BACKUP, 0, Reply::Status(404)),
    );
    let sync = CatalogSync::new(&config(false), fetcher);

    let mut page = full_render_page();
    let outcome = sync.sync(&mut page).await;
    assert_eq!(outcome, SyncOutcome::Failed { fallback_shown: true });
    let container = page.element_by_id("sistema-menu-container").expect("container");
    assert_eq!(page.text(container), DEFAULT_FAILURE_MESSAGE);
    assert!(sync.snapshot().is_none());

    let original = r#"<div data-producto-id="a"><span class="precio">$1.000</span></div>"#;
    let mut hybrid = Page::parse(original);
    let outcome = sync.sync(&mut hybrid).await;
    assert_eq!(outcome, SyncOutcome::Failed { fallback_shown: false });
    assert!(hybrid.to_html().contains(r#"<span class="precio">$1.000</span>"#));
}

#[tokio::test]
async fn primary_rows_win_over_add_ons() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(SHEET, 0, Reply::Body("id,precio\na,100\n"))
            .reply(ADDONS, 0, Reply::Body("id,precio\na,200\nextra-queso,900\n")),
    );
    let sync = CatalogSync::new(&config(true), fetcher);
    let snapshot = sync.load().await.expect("load");

    assert_eq!(snapshot.index.get("a").map(|i| i.base_price.as_str()), Some("100"));
    assert!(snapshot.index.get("extra-queso").is_some());
    assert_eq!(snapshot.catalog.items.len(), 2);
}

#[tokio::test]
async fn failing_add_ons_do_not_block_base_table() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .reply(SHEET, 0, Reply::Body("id,precio\na,100\n"))
            .reply(ADDONS, 0, Reply::Status(403)),
    );
    let sync = CatalogSync::new(&config(true), fetcher);
    let snapshot = sync.load().await.expect("load");
    assert_eq!(snapshot.catalog.source, CatalogSource::Primary);
    assert_eq!(snapshot.index.len(), 1);
}

#[tokio::test]
async fn repeated_sync_keeps_single_sold_out_marker() {
    let fetcher = Arc::new(ScriptedFetcher::new().reply(SHEET, 0, Reply::Body(MENU_CSV)));
    let sync = CatalogSync::new(&config(false), fetcher);
    let mut page = Page::parse(r#"<div data-producto-id="pizza-2"><span class="precio">-</span></div>"#);

    sync.sync(&mut page).await;
    sync.sync(&mut page).await;
    assert_eq!(page.all_by_class(SOLD_OUT_CLASS).len(), 1);
}

#[tokio::test]
async fn refresh_after_event_sees_host_changes_without_refetching() {
    let csv = "id,precio,precio_ind,precio_fam\npizza-1,5990,3990,7990\n";
    let fetcher = Arc::new(ScriptedFetcher::new().reply(SHEET, 0, Reply::Body(csv)));
    let sync = CatalogSync::new(&config(false), fetcher.clone());

    let mut page = Page::parse(
        r#"<div id="card" data-producto-id="pizza-1-ind"><span class="precio">-</span></div>"#,
    );
    sync.sync(&mut page).await;
    assert!(page.to_html().contains("$3.990"));
    let fetches = fetcher.calls.load(Ordering::SeqCst);

    let page = Mutex::new(page);
    let (repainted, ()) = tokio::join!(sync.refresh_after_event(&page, None), async {
        // Host handler for the same click switches the active size.
        let mut doc = page.lock().await;
        let card = doc.element_by_id("card").expect("card");
        doc.set_attr(card, PRODUCT_ID_ATTR, "pizza-1-fam");
    });

    assert_eq!(repainted, 1);
    assert!(page.lock().await.to_html().contains("$7.990"));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), fetches);
}
