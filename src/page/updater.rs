// Applies resolved item views to a page: in-place patches and fresh card renders.
use crate::model::Availability;
use crate::page::{Document, NodeId};
use crate::reconciler::ItemView;

pub const PRODUCT_ID_ATTR: &str = "data-producto-id";
pub const CATALOG_ID_ATTR: &str = "data-catalog-id";

pub const NAME_CLASS: &str = "nombre";
pub const DESCRIPTION_CLASS: &str = "descripcion";
pub const PRICE_CLASS: &str = "precio";

pub const DIMMED_CLASS: &str = "opacity-50";
pub const SOLD_OUT_CLASS: &str = "sistema-menu-soldout-badge";
pub const SOLD_OUT_TEXT: &str = "Agotado";

pub const GRID_CLASS: &str = "sistema-menu-grid";
pub const CARD_CLASS: &str = "sistema-menu-card";
pub const CARD_IMAGE_CLASS: &str = "sistema-menu-image";
pub const CARD_BODY_CLASS: &str = "sistema-menu-body";
pub const CARD_TITLE_CLASS: &str = "sistema-menu-title";
pub const CARD_DESC_CLASS: &str = "sistema-menu-desc";
pub const CARD_PRICE_CLASS: &str = "sistema-menu-price";
const DEFAULT_IMAGE_ALT: &str = "Imagen de producto";

const FORM_CONTROLS: &[&str] = &["input", "select", "textarea", "button", "option", "optgroup"];

/// Marked elements in `scope` (inclusive) with their raw id attribute.
pub fn marked_elements<D: Document>(doc: &D, scope: NodeId) -> Vec<(NodeId, String)> {
    doc.elements(scope)
        .into_iter()
        .filter_map(|n| doc.attr(n, PRODUCT_ID_ATTR).map(|id| (n, id.to_string())))
        .collect()
}

/// Closest marked element strictly above `node`, with its raw id attribute.
pub fn marked_ancestor<D: Document>(doc: &D, node: NodeId) -> Option<(NodeId, String)> {
    let mut current = doc.parent(node);
    while let Some(candidate) = current {
        if let Some(id) = doc.attr(candidate, PRODUCT_ID_ATTR) {
            return Some((candidate, id.to_string()));
        }
        current = doc.parent(candidate);
    }
    None
}

fn is_within<D: Document>(doc: &D, node: NodeId, scope: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(candidate) = current {
        if candidate == scope {
            return true;
        }
        current = doc.parent(candidate);
    }
    false
}

/// Elements belonging to `node`: itself and its subtree, minus any nested marked element.
fn owned_elements<D: Document>(doc: &D, node: NodeId) -> Vec<NodeId> {
    let mut out = vec![node];
    let mut stack: Vec<NodeId> = doc.children(node).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        if doc.attr(current, PRODUCT_ID_ATTR).is_some() {
            continue;
        }
        out.push(current);
        stack.extend(doc.children(current).into_iter().rev());
    }
    out
}

/// Leaf elements that are not form controls may have their text replaced.
fn text_patchable<D: Document>(doc: &D, node: NodeId) -> bool {
    let is_control = doc
        .tag_name(node)
        .is_some_and(|tag| FORM_CONTROLS.contains(&tag));
    !is_control && !doc.has_element_children(node)
}

fn patch_text<D: Document>(doc: &mut D, owned: &[NodeId], class: &str, value: &str) -> usize {
    if value.is_empty() {
        return 0;
    }
    let mut patched = 0;
    for node in owned {
        if doc.has_class(*node, class) && text_patchable(doc, *node) {
            doc.set_text(*node, value);
            patched += 1;
        }
    }
    patched
}

/// Repaints the price displays of a marked element. Returns how many were written.
pub fn repaint_prices<D: Document>(doc: &mut D, node: NodeId, price: &str) -> usize {
    let owned = owned_elements(doc, node);
    patch_text(doc, &owned, PRICE_CLASS, price)
}

/// Like [`repaint_prices`], limited to the displays of `owner` that sit inside `scope`.
pub fn repaint_prices_within<D: Document>(
    doc: &mut D,
    owner: NodeId,
    scope: NodeId,
    price: &str,
) -> usize {
    let owned: Vec<NodeId> = owned_elements(doc, owner)
        .into_iter()
        .filter(|n| is_within(doc, *n, scope))
        .collect();
    patch_text(doc, &owned, PRICE_CLASS, price)
}

/// Updates an existing marked element in place. Structure and host markup stay as they are.
pub fn patch_element<D: Document>(doc: &mut D, node: NodeId, view: &ItemView) {
    let owned = owned_elements(doc, node);
    patch_text(doc, &owned, NAME_CLASS, &view.name);
    patch_text(doc, &owned, DESCRIPTION_CLASS, &view.description);
    patch_text(doc, &owned, PRICE_CLASS, &view.price);

    if !view.image.is_empty() {
        let image = owned
            .iter()
            .copied()
            .find(|n| doc.tag_name(*n) == Some("img"));
        if let Some(image) = image {
            doc.set_attr(image, "src", &view.image);
        }
    }

    apply_availability(doc, node, view.availability);
}

/// Dims and badges an unavailable element; clears both when it is available again.
pub fn apply_availability<D: Document>(doc: &mut D, node: NodeId, availability: Availability) {
    let badges: Vec<NodeId> = owned_elements(doc, node)
        .into_iter()
        .filter(|n| doc.has_class(*n, SOLD_OUT_CLASS))
        .collect();

    match availability {
        Availability::Unavailable => {
            doc.add_class(node, DIMMED_CLASS);
            if badges.is_empty() {
                let badge = doc.create_element("div");
                doc.set_attr(badge, "class", SOLD_OUT_CLASS);
                doc.set_text(badge, SOLD_OUT_TEXT);
                doc.append_child(node, badge);
            }
        }
        Availability::Available => {
            doc.remove_class(node, DIMMED_CLASS);
            for badge in badges {
                doc.detach(badge);
            }
        }
    }
}

/// Replaces the container's content with one card per view.
pub fn render_cards<D: Document>(doc: &mut D, container: NodeId, views: &[ItemView]) {
    doc.clear_children(container);
    doc.add_class(container, GRID_CLASS);
    for view in views {
        let card = build_card(doc, view);
        doc.append_child(container, card);
    }
}

fn build_card<D: Document>(doc: &mut D, view: &ItemView) -> NodeId {
    let card = element(doc, "div", CARD_CLASS);
    if !view.id.is_empty() {
        doc.set_attr(card, CATALOG_ID_ATTR, &view.id);
    }

    if !view.image.is_empty() {
        let img = element(doc, "img", CARD_IMAGE_CLASS);
        let alt = if view.name.is_empty() { DEFAULT_IMAGE_ALT } else { view.name.as_str() };
        doc.set_attr(img, "alt", alt);
        doc.set_attr(img, "src", &view.image);
        doc.append_child(card, img);
    }

    let body = element(doc, "div", CARD_BODY_CLASS);
    let title = element(doc, "div", CARD_TITLE_CLASS);
    doc.set_text(title, &view.name);
    doc.append_child(body, title);

    if !view.description.is_empty() {
        let desc = element(doc, "div", CARD_DESC_CLASS);
        doc.set_text(desc, &view.description);
        doc.append_child(body, desc);
    }
    if !view.price.is_empty() {
        let price = element(doc, "div", CARD_PRICE_CLASS);
        doc.set_text(price, &view.price);
        doc.append_child(body, price);
    }

    doc.append_child(card, body);
    card
}

fn element<D: Document>(doc: &mut D, tag: &str, class: &str) -> NodeId {
    let node = doc.create_element(tag);
    doc.set_attr(node, "class", class);
    node
}

pub fn show_failure<D: Document>(doc: &mut D, container: NodeId, message: &str) {
    doc.clear_children(container);
    let p = doc.create_element("p");
    doc.set_text(p, message);
    doc.append_child(container, p);
}
