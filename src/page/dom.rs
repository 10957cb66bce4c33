// Arena-backed HTML page built on top of the html5ever tree that `scraper` produces.
use std::io;

use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};
use scraper::{Html, Node};
use tracing::warn;

use crate::page::{Document, NodeId};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Doctype(String),
    Comment(String),
    Text(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Mutable HTML document. Detached nodes stay in the arena but are unreachable.
#[derive(Debug, Clone)]
pub struct Page {
    nodes: Vec<NodeData>,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        let source = Html::parse_document(html);
        let mut page = Page {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        };

        let mut stack = vec![(source.tree.root(), page.root())];
        while let Some((node, parent)) = stack.pop() {
            for child in node.children() {
                let kind = match child.value() {
                    Node::Doctype(doctype) => NodeKind::Doctype(doctype.name().to_string()),
                    Node::Comment(comment) => NodeKind::Comment(String::from(&**comment)),
                    Node::Text(text) => NodeKind::Text(String::from(&**text)),
                    Node::Element(element) => NodeKind::Element {
                        tag: element.name().to_string(),
                        attrs: element
                            .attrs()
                            .map(|(name, value)| (name.to_string(), value.to_string()))
                            .collect(),
                    },
                    _ => continue,
                };
                let id = page.push(kind);
                page.link(parent, id);
                stack.push((child, id));
            }
        }
        page
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0]
    }

    /// First element matching a class, searching the whole document.
    pub fn first_by_class(&self, class: &str) -> Option<NodeId> {
        self.elements(self.root())
            .into_iter()
            .find(|n| self.has_class(*n, class))
    }

    pub fn all_by_class(&self, class: &str) -> Vec<NodeId> {
        self.elements(self.root())
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    pub fn to_html(&self) -> String {
        let mut out = Vec::new();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        let root = PageNode { page: self, node: self.root() };
        if let Err(e) = serialize(&mut out, &root, opts) {
            warn!("Page serialization stopped early: {}", e);
        }
        String::from_utf8_lossy(&out).into_owned()
    }
}

/// A page node as seen by the html5ever serializer.
struct PageNode<'a> {
    page: &'a Page,
    node: NodeId,
}

impl PageNode<'_> {
    fn child(&self, node: NodeId) -> Self {
        PageNode { page: self.page, node }
    }

    fn write_children<S: Serializer>(&self, serializer: &mut S) -> io::Result<()> {
        for child in &self.page.data(self.node).children {
            self.child(*child).write(serializer)?;
        }
        Ok(())
    }

    fn write<S: Serializer>(&self, serializer: &mut S) -> io::Result<()> {
        match &self.page.data(self.node).kind {
            NodeKind::Document => self.write_children(serializer),
            NodeKind::Doctype(name) => serializer.write_doctype(name),
            NodeKind::Comment(text) => serializer.write_comment(text),
            NodeKind::Text(text) => serializer.write_text(text),
            NodeKind::Element { tag, attrs } => {
                let name = QualName::new(
                    None,
                    Namespace::from(HTML_NAMESPACE),
                    LocalName::from(tag.as_str()),
                );
                let attrs: Vec<(QualName, &str)> = attrs
                    .iter()
                    .map(|(n, v)| {
                        let qual = QualName::new(None, Namespace::from(""), LocalName::from(n.as_str()));
                        (qual, v.as_str())
                    })
                    .collect();
                serializer.start_elem(name.clone(), attrs.iter().map(|(n, v)| (n, *v)))?;
                self.write_children(serializer)?;
                serializer.end_elem(name)
            }
        }
    }
}

impl Serialize for PageNode<'_> {
    fn serialize<S: Serializer>(
        &self,
        serializer: &mut S,
        traversal_scope: TraversalScope,
    ) -> io::Result<()> {
        match traversal_scope {
            TraversalScope::IncludeNode => self.write(serializer),
            TraversalScope::ChildrenOnly(_) => self.write_children(serializer),
        }
    }
}

impl Document for Page {
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements(self.root())
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.data(node)
            .children
            .iter()
            .copied()
            .filter(|c| matches!(self.data(*c).kind, NodeKind::Element { .. }))
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.0].kind {
            match attrs.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let data = self.data(current);
            if let NodeKind::Text(text) = &data.kind {
                out.push_str(text);
            }
            stack.extend(data.children.iter().rev().copied());
        }
        out
    }

    fn set_text(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        let id = self.push(NodeKind::Text(text.to_string()));
        self.link(node, id);
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        })
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.link(parent, child);
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }
}
