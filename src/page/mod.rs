// Presentation port: everything the pipeline needs from a page, plus the in-memory HTML page.

pub mod dom;
pub mod updater;

pub use dom::Page;

/// Handle to an element or text node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Minimal mutable view of a page.
///
/// Only element nodes are addressed by the query methods; text is reached through
/// [`Document::text`] and [`Document::set_text`].
pub trait Document {
    fn root(&self) -> NodeId;
    fn element_by_id(&self, id: &str) -> Option<NodeId>;
    /// Element children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    /// `None` for the root and for detached nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn tag_name(&self, node: NodeId) -> Option<&str>;
    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;
    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);
    fn text(&self, node: NodeId) -> String;
    /// Replaces every child of `node` with a single text node.
    fn set_text(&mut self, node: NodeId, text: &str);
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    fn detach(&mut self, node: NodeId);
    fn clear_children(&mut self, node: NodeId);

    fn has_element_children(&self, node: NodeId) -> bool {
        !self.children(node).is_empty()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if self.has_class(node, class) {
            return;
        }
        let list = match self.attr(node, "class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr(node, "class", &list);
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        let Some(existing) = self.attr(node, "class") else {
            return;
        };
        if !existing.split_ascii_whitespace().any(|c| c == class) {
            return;
        }
        let list = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr(node, "class", &list);
    }

    /// `scope` and every element below it, in document order.
    fn elements(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(node) = stack.pop() {
            if self.tag_name(node).is_some() {
                out.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }
}
