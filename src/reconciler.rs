// Chooses between patching marked elements and rendering fresh cards, and matches items to elements.
use tracing::{debug, info, warn};

use crate::index::ItemIndex;
use crate::model::{Availability, CatalogItem, SizeKey};
use crate::page::updater;
use crate::page::{Document, NodeId};
use crate::pricing::{resolve_price, PriceFormat};

/// What gets painted for one item: display text with the price already resolved and formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub availability: Availability,
}

impl ItemView {
    pub fn resolve(item: &CatalogItem, size: Option<SizeKey>, format: &PriceFormat) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: resolve_price(item, size, format),
            image: item.image.clone(),
            availability: item.availability,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Hybrid,
    FullRender,
}

/// Hybrid whenever at least one marked element exists.
pub fn choose_strategy(marked: usize) -> Strategy {
    if marked > 0 {
        Strategy::Hybrid
    } else {
        Strategy::FullRender
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementMatch {
    pub node: NodeId,
    pub view: ItemView,
}

/// Pairs each marked element with its item. Unmatched elements are simply absent from the result.
pub fn match_elements(
    marked: &[(NodeId, String)],
    index: &ItemIndex,
    format: &PriceFormat,
) -> Vec<ElementMatch> {
    marked
        .iter()
        .filter_map(|(node, raw_id)| {
            let hit = index.resolve(raw_id)?;
            Some(ElementMatch {
                node: *node,
                view: ItemView::resolve(hit.item, hit.size, format),
            })
        })
        .collect()
}

/// Cards for a fresh render: available items only, in source order. Items without an id are kept.
pub fn render_views(items: &[CatalogItem], format: &PriceFormat) -> Vec<ItemView> {
    items
        .iter()
        .filter(|item| item.availability.is_available())
        .map(|item| ItemView::resolve(item, None, format))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Patched { marked: usize, matched: usize },
    Rendered { cards: usize },
    NoContainer,
}

pub struct Reconciler<'a> {
    pub container_id: &'a str,
    pub format: &'a PriceFormat,
}

impl Reconciler<'_> {
    pub fn reconcile<D: Document>(
        &self,
        doc: &mut D,
        items: &[CatalogItem],
        index: &ItemIndex,
    ) -> ReconcileOutcome {
        let root = doc.root();
        let marked = updater::marked_elements(doc, root);

        match choose_strategy(marked.len()) {
            Strategy::Hybrid => {
                let matches = match_elements(&marked, index, self.format);
                for m in &matches {
                    updater::patch_element(doc, m.node, &m.view);
                }
                info!("Hybrid sync: {} of {} marked elements matched", matches.len(), marked.len());
                ReconcileOutcome::Patched {
                    marked: marked.len(),
                    matched: matches.len(),
                }
            }
            Strategy::FullRender => {
                let Some(container) = doc.element_by_id(self.container_id) else {
                    warn!("Container #{} not found, nothing to render", self.container_id);
                    return ReconcileOutcome::NoContainer;
                };
                let views = render_views(items, self.format);
                updater::render_cards(doc, container, &views);
                info!("Rendered {} cards into #{}", views.len(), self.container_id);
                ReconcileOutcome::Rendered { cards: views.len() }
            }
        }
    }

    /// Re-resolves prices of marked elements under `scope` against `index`. No element is created.
    ///
    /// When `scope` sits inside a marked element (a size picker within a card, say), that
    /// element's price displays inside `scope` are repainted too.
    pub fn refresh_prices<D: Document>(&self, doc: &mut D, scope: NodeId, index: &ItemIndex) -> usize {
        let mut repainted = 0;
        if doc.attr(scope, updater::PRODUCT_ID_ATTR).is_none() {
            if let Some(owner) = updater::marked_ancestor(doc, scope) {
                for m in match_elements(&[owner], index, self.format) {
                    repainted += updater::repaint_prices_within(doc, m.node, scope, &m.view.price);
                }
            }
        }

        let marked = updater::marked_elements(doc, scope);
        for m in match_elements(&marked, index, self.format) {
            repainted += updater::repaint_prices(doc, m.node, &m.view.price);
        }
        debug!("Refresh repainted {} price displays", repainted);
        repainted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;

    fn item(id: &str, price: &str, availability: Availability) -> CatalogItem {
        CatalogItem {
            id: id.into(),
            name: format!("Item {id}"),
            base_price: price.into(),
            availability,
            ..Default::default()
        }
    }

    fn reconciler(format: &PriceFormat) -> Reconciler<'_> {
        Reconciler {
            container_id: "sistema-menu-container",
            format,
        }
    }

    #[test]
    fn strategy_follows_marked_count() {
        assert_eq!(choose_strategy(0), Strategy::FullRender);
        assert_eq!(choose_strategy(3), Strategy::Hybrid);
    }

    #[test]
    fn render_excludes_unavailable_but_keeps_idless_items() {
        let items = vec![
            item("a", "100", Availability::Available),
            item("b", "200", Availability::Unavailable),
            item("", "300", Availability::Available),
        ];
        let views = render_views(&items, &PriceFormat::default());
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].price, "$300");
    }

    #[test]
    fn hybrid_mode_never_creates_cards() {
        let mut page = Page::parse(
            r#"<div id="sistema-menu-container"></div>
               <div data-producto-id="a"><span class="precio">-</span></div>
               <div data-producto-id="zzz"><span class="precio">keep</span></div>"#,
        );
        let items = vec![item("a", "1990", Availability::Available)];
        let index = ItemIndex::build(&items);
        let format = PriceFormat::default();

        let outcome = reconciler(&format).reconcile(&mut page, &items, &index);
        assert_eq!(outcome, ReconcileOutcome::Patched { marked: 2, matched: 1 });
        let html = page.to_html();
        assert!(html.contains(r#"<span class="precio">$1.990</span>"#));
        assert!(html.contains(r#"<span class="precio">keep</span>"#));
        assert!(page.all_by_class(updater::CARD_CLASS).is_empty());
    }

    #[test]
    fn hybrid_reconcile_twice_keeps_one_marker() {
        let mut page = Page::parse(r#"<div data-producto-id="a"><span class="precio">-</span></div>"#);
        let items = vec![item("a", "1990", Availability::Unavailable)];
        let index = ItemIndex::build(&items);
        let format = PriceFormat::default();
        let reconciler = reconciler(&format);

        reconciler.reconcile(&mut page, &items, &index);
        reconciler.reconcile(&mut page, &items, &index);
        assert_eq!(page.all_by_class(updater::SOLD_OUT_CLASS).len(), 1);
    }

    #[test]
    fn full_render_without_container_is_reported() {
        let mut page = Page::parse("<main></main>");
        let items = vec![item("a", "1", Availability::Available)];
        let format = PriceFormat::default();
        let outcome = reconciler(&format).reconcile(&mut page, &items, &ItemIndex::build(&items));
        assert_eq!(outcome, ReconcileOutcome::NoContainer);
    }

    #[test]
    fn refresh_uses_size_from_current_id() {
        let mut page = Page::parse(
            r#"<section id="s"><div id="p" data-producto-id="pizza-1-ind"><span class="precio">-</span></div></section>"#,
        );
        let mut pizza = item("pizza-1", "5990", Availability::Available);
        pizza.size_prices.insert(SizeKey::Ind, "3990".into());
        pizza.size_prices.insert(SizeKey::Fam, "7990".into());
        let index = ItemIndex::build(&[pizza]);
        let format = PriceFormat::default();
        let reconciler = reconciler(&format);
        let scope = page.element_by_id("s").expect("scope");

        assert_eq!(reconciler.refresh_prices(&mut page, scope, &index), 1);
        assert!(page.to_html().contains("$3.990"));

        let node = page.element_by_id("p").expect("p");
        page.set_attr(node, updater::PRODUCT_ID_ATTR, "pizza-1-fam");
        reconciler.refresh_prices(&mut page, scope, &index);
        assert!(page.to_html().contains("$7.990"));
    }

    #[test]
    fn refresh_scoped_inside_a_card_repaints_its_prices() {
        let mut page = Page::parse(concat!(
            r#"<div data-producto-id="pizza-1-fam"><h3 class="nombre">Pizza</h3>"#,
            r#"<span class="precio">outside</span>"#,
            r#"<div id="sizes"><button>Familiar</button><span class="precio">-</span></div></div>"#,
        ));
        let mut pizza = item("pizza-1", "5990", Availability::Available);
        pizza.size_prices.insert(SizeKey::Fam, "7990".into());
        let index = ItemIndex::build(&[pizza]);
        let format = PriceFormat::default();
        let scope = page.element_by_id("sizes").expect("sizes");

        assert_eq!(reconciler(&format).refresh_prices(&mut page, scope, &index), 1);
        let html = page.to_html();
        assert!(html.contains(r#"<div id="sizes"><button>Familiar</button><span class="precio">$7.990</span></div>"#));
        assert!(html.contains(r#"<span class="precio">outside</span>"#));
    }

    #[test]
    fn refresh_scope_without_marked_owner_repaints_nothing() {
        let mut page = Page::parse(r#"<div id="loose"><span class="precio">-</span></div>"#);
        let index = ItemIndex::build(&[item("a", "100", Availability::Available)]);
        let format = PriceFormat::default();
        let scope = page.element_by_id("loose").expect("loose");

        assert_eq!(reconciler(&format).refresh_prices(&mut page, scope, &index), 0);
        assert!(page.to_html().contains(r#"<span class="precio">-</span>"#));
    }
}
