//! Arena-based document model.
//!
//! html5ever parses markup into this arena; the navigation engine then
//! queries and mutates it in place. Nodes live in a contiguous vector and
//! reference each other by index, which keeps traversal cheap and lets
//! handles stay `Copy`.

use std::collections::{HashMap, HashSet};

use html5ever::{LocalName, Namespace, QualName};

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Node type in the document arena.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and attributes.
    Element {
        name: QualName,
        attrs: Vec<Attribute>,
        /// Pre-extracted id for fast lookup.
        id: Option<String>,
        /// Pre-extracted classes for fast matching.
        classes: Vec<String>,
    },
    /// Text content.
    Text(String),
    /// Comment (kept so swapped markup round-trips).
    Comment(String),
    /// Document type declaration.
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
}

/// HTML attribute.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QualName,
    pub value: String,
}

/// A node in the document arena.
#[derive(Debug)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// An in-memory HTML document.
///
/// Backs both the live page the session mutates and the offline documents
/// parsed from fetched markup during a navigation.
pub struct Document {
    /// All nodes in the arena. Detached nodes stay allocated; the arena only
    /// grows within a document session.
    nodes: Vec<Node>,
    /// Document root ID.
    root: NodeId,
    /// Map from id attribute to node ID, maintained across mutations so it
    /// only ever points at attached nodes.
    id_map: HashMap<String, NodeId>,
    /// Images the host has reported as fully loaded.
    complete_images: HashSet<NodeId>,
}

impl Document {
    /// Create a new empty document with just a root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId::NONE,
            id_map: HashMap::new(),
            complete_images: HashSet::new(),
        };
        doc.root = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document root ID.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    /// Create a new element node in the HTML namespace.
    pub fn create_element(&mut self, tag: &str, attrs: Vec<(&str, &str)>) -> NodeId {
        let name = QualName::new(None, html5ever::ns!(html), LocalName::from(tag));
        let attrs = attrs
            .into_iter()
            .map(|(n, v)| Attribute {
                name: QualName::new(None, html5ever::ns!(), LocalName::from(n)),
                value: v.to_string(),
            })
            .collect();
        self.create_element_qual(name, attrs)
    }

    /// Create a new element node from parser-supplied parts.
    pub fn create_element_qual(&mut self, name: QualName, attrs: Vec<Attribute>) -> NodeId {
        let mut id = None;
        let mut classes = Vec::new();

        for attr in &attrs {
            if attr.name.local.as_ref() == "id" {
                id = Some(attr.value.clone());
            } else if attr.name.local.as_ref() == "class" {
                classes = attr
                    .value
                    .split_whitespace()
                    .map(|s| s.to_string())
                    .collect();
            }
        }

        let node_id = self.alloc(Node::new(NodeData::Element {
            name,
            attrs,
            id: id.clone(),
            classes,
        }));

        if let Some(id_str) = id {
            self.id_map.insert(id_str, node_id);
        }

        node_id
    }

    /// Create a new text node.
    pub fn create_text(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Text(text)))
    }

    /// Create a new comment node.
    pub fn create_comment(&mut self, text: String) -> NodeId {
        self.alloc(Node::new(NodeData::Comment(text)))
    }

    /// Create a doctype node.
    pub fn create_doctype(&mut self, name: String, public_id: String, system_id: String) -> NodeId {
        self.alloc(Node::new(NodeData::Doctype {
            name,
            public_id,
            system_id,
        }))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if last_child.is_some()
            && let Some(last_node) = self.get_mut(last_child)
        {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let parent = self.get(sibling).map(|n| n.parent).unwrap_or(NodeId::NONE);
        let prev = self
            .get(sibling)
            .map(|n| n.prev_sibling)
            .unwrap_or(NodeId::NONE);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append text to an existing trailing text node, or create a new one.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_text(text.to_string());
        self.append(parent, text_node);
    }

    /// Detach a node from its parent, unregistering any ids in its subtree.
    pub fn detach(&mut self, target: NodeId) {
        self.unregister_subtree_ids(target);

        let (parent, prev, next) = {
            let node = match self.get(target) {
                Some(n) => n,
                None => return,
            };
            (node.parent, node.prev_sibling, node.next_sibling)
        };

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = next;
            }
        } else if parent.is_some()
            && let Some(p) = self.get_mut(parent)
        {
            p.first_child = next;
        }

        if next.is_some() {
            if let Some(n) = self.get_mut(next) {
                n.prev_sibling = prev;
            }
        } else if parent.is_some()
            && let Some(p) = self.get_mut(parent)
        {
            p.last_child = prev;
        }

        if let Some(node) = self.get_mut(target) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Detach every child of a node. The old children stay allocated but are
    /// no longer reachable from the root.
    pub fn detach_children(&mut self, parent: NodeId) {
        let children: Vec<_> = self.children(parent).collect();
        for child in children {
            self.detach(child);
        }
    }

    fn unregister_subtree_ids(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(elem_id) = self.element_id(id).map(|s| s.to_string())
                && self.id_map.get(&elem_id) == Some(&id)
            {
                self.id_map.remove(&elem_id);
            }
            stack.extend(self.children(id));
        }
    }

    pub(crate) fn register_subtree_ids(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(elem_id) = self.element_id(id).map(|s| s.to_string()) {
                self.id_map.insert(elem_id, id);
            }
            stack.extend(self.children(id));
        }
    }

    /// Deep-copy a subtree from another document into this arena and return
    /// the copy's root. Ids in the imported markup are registered here.
    pub fn import_node(&mut self, source: &Document, node: NodeId) -> Option<NodeId> {
        let data = source.get(node)?.data.clone();
        let copy = match data {
            NodeData::Element { name, attrs, .. } => self.create_element_qual(name, attrs),
            NodeData::Text(t) => self.create_text(t),
            NodeData::Comment(t) => self.create_comment(t),
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => self.create_doctype(name, public_id, system_id),
            NodeData::Document => return None,
        };
        for child in source.children(node) {
            if let Some(imported) = self.import_node(source, child) {
                self.append(copy, imported);
            }
        }
        Some(copy)
    }

    /// Get node by id attribute.
    pub fn get_by_id(&self, id: &str) -> Option<NodeId> {
        self.id_map.get(id).copied()
    }

    /// Register an id → node mapping (used by the parser sink).
    pub(crate) fn register_id(&mut self, id: String, node: NodeId) {
        self.id_map.insert(id, node);
    }

    /// Get the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the document is empty (only has the root).
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> ChildrenIter<'_> {
        let first = self.get(parent).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        ChildrenIter {
            doc: self,
            current: first,
        }
    }

    /// Find the first node matching a predicate (document-order DFS).
    pub fn find<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Node) -> bool,
    {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.get(id) {
                if predicate(node) {
                    return Some(id);
                }
                let mut children: Vec<_> = self.children(id).collect();
                children.reverse();
                stack.extend(children);
            }
        }
        None
    }

    /// Collect every element in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.is_element(id) {
                out.push(id);
            }
            let mut children: Vec<_> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Find first element by tag name.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find(|node| {
            if let NodeData::Element { name, .. } = &node.data {
                name.local.as_ref() == tag
            } else {
                false
            }
        })
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct ChildrenIter<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl<'a> Iterator for ChildrenIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

/// Element accessors.
impl Document {
    /// Get element's local name (tag).
    pub fn element_name(&self, id: NodeId) -> Option<&LocalName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.local),
            _ => None,
        })
    }

    /// Get element's namespace.
    pub fn element_namespace(&self, id: NodeId) -> Option<&Namespace> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(&name.ns),
            _ => None,
        })
    }

    /// Get an attribute value.
    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name.local.as_ref() == attr_name)
                .map(|a| a.value.as_str()),
            _ => None,
        })
    }

    /// Check whether an attribute is present at all.
    pub fn has_attr(&self, id: NodeId, attr_name: &str) -> bool {
        self.attr(id, attr_name).is_some()
    }

    /// Set an attribute, keeping the id map and class cache in sync.
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: &str) {
        if !self.is_element(id) {
            return;
        }
        if attr_name == "id" {
            if let Some(old) = self.element_id(id).map(|s| s.to_string())
                && self.id_map.get(&old) == Some(&id)
            {
                self.id_map.remove(&old);
            }
            self.id_map.insert(value.to_string(), id);
        }

        let Some(node) = self.get_mut(id) else { return };
        let NodeData::Element {
            attrs,
            id: elem_id,
            classes,
            ..
        } = &mut node.data
        else {
            return;
        };

        match attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
            Some(attr) => attr.value = value.to_string(),
            None => attrs.push(Attribute {
                name: QualName::new(None, html5ever::ns!(), LocalName::from(attr_name)),
                value: value.to_string(),
            }),
        }

        if attr_name == "id" {
            *elem_id = Some(value.to_string());
        } else if attr_name == "class" {
            *classes = value.split_whitespace().map(|s| s.to_string()).collect();
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, id: NodeId, attr_name: &str) {
        if attr_name == "id"
            && let Some(old) = self.element_id(id).map(|s| s.to_string())
            && self.id_map.get(&old) == Some(&id)
        {
            self.id_map.remove(&old);
        }

        let Some(node) = self.get_mut(id) else { return };
        let NodeData::Element {
            attrs,
            id: elem_id,
            classes,
            ..
        } = &mut node.data
        else {
            return;
        };

        attrs.retain(|a| a.name.local.as_ref() != attr_name);
        if attr_name == "id" {
            *elem_id = None;
        } else if attr_name == "class" {
            classes.clear();
        }
    }

    /// Get element's id attribute.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { id, .. } => id.as_deref(),
            _ => None,
        })
    }

    /// Get element's classes.
    pub fn classes(&self, id: NodeId) -> &[String] {
        static EMPTY: &[String] = &[];
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { classes, .. } => Some(classes.as_slice()),
                _ => None,
            })
            .unwrap_or(EMPTY)
    }

    /// Check whether an element carries a class.
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).iter().any(|c| c == class)
    }

    /// Add a class to an element (no-op when already present).
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let mut classes: Vec<String> = self.classes(id).to_vec();
        classes.push(class.to_string());
        self.set_attr(id, "class", &classes.join(" "));
    }

    /// Remove a class from an element (no-op when absent).
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let classes: Vec<String> = self
            .classes(id)
            .iter()
            .filter(|c| c.as_str() != class)
            .cloned()
            .collect();
        self.set_attr(id, "class", &classes.join(" "));
    }

    /// Check if node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Check if node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Text(_)))
    }

    /// Get text content of a single text node.
    pub fn text_node_content(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Collect the concatenated text of a subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(text) = self.text_node_content(current) {
                out.push_str(text);
            }
            let mut children: Vec<_> = self.children(current).collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Replace a node's children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.detach_children(id);
        let text_node = self.create_text(text.to_string());
        self.append(id, text_node);
    }
}

/// Document-level conveniences used by the navigation engine.
impl Document {
    pub fn head(&self) -> Option<NodeId> {
        self.find_by_tag("head")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.find_by_tag("body")
    }

    /// The single main content region the swap step operates on.
    pub fn main(&self) -> Option<NodeId> {
        self.find_by_tag("main")
    }

    /// The page title, empty when no `<title>` element exists.
    pub fn title(&self) -> String {
        self.find_by_tag("title")
            .map(|t| self.text_content(t))
            .unwrap_or_default()
    }

    /// Set the page title, creating the `<title>` element on demand.
    pub fn set_title(&mut self, title: &str) {
        if let Some(t) = self.find_by_tag("title") {
            self.set_text(t, title);
        } else if let Some(head) = self.head() {
            let t = self.create_element("title", vec![]);
            self.append(head, t);
            self.set_text(t, title);
        }
    }

    /// Read one property out of an element's inline `style` attribute.
    pub fn style_property(&self, id: NodeId, property: &str) -> Option<String> {
        let style = self.attr(id, "style")?;
        for declaration in style.split(';') {
            let mut parts = declaration.splitn(2, ':');
            let name = parts.next()?.trim();
            if name.eq_ignore_ascii_case(property) {
                return parts.next().map(|v| v.trim().to_string());
            }
        }
        None
    }

    /// Set one property in an element's inline `style` attribute, preserving
    /// the other declarations and their order.
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        let existing = self.attr(id, "style").unwrap_or_default();
        let mut declarations: Vec<(String, String)> = existing
            .split(';')
            .filter_map(|d| {
                let mut parts = d.splitn(2, ':');
                let name = parts.next()?.trim();
                let val = parts.next()?.trim();
                if name.is_empty() {
                    None
                } else {
                    Some((name.to_string(), val.to_string()))
                }
            })
            .collect();

        match declarations
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
        {
            Some((_, val)) => *val = value.to_string(),
            None => declarations.push((property.to_string(), value.to_string())),
        }

        let rendered = declarations
            .iter()
            .map(|(n, v)| format!("{}: {}", n, v))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(id, "style", &rendered);
    }

    /// Record that the host finished loading an image element.
    pub fn mark_image_complete(&mut self, id: NodeId) {
        self.complete_images.insert(id);
    }

    /// Whether the host has reported an image element as fully loaded.
    pub fn image_complete(&self, id: NodeId) -> bool {
        self.complete_images.contains(&id)
    }
}

/// Void elements per the HTML serialization rules.
fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

fn escape_attr(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

/// HTML serialization, mainly so hosts can sync the swapped document back
/// out (the WASM shell) and tests can snapshot regions.
impl Document {
    /// Serialize a subtree to HTML.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize_into(id, &mut out);
        out
    }

    /// Serialize the whole document to HTML.
    pub fn document_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root) {
            self.serialize_into(child, &mut out);
        }
        out
    }

    fn serialize_into(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else { return };
        match &node.data {
            NodeData::Document => {
                for child in self.children(id) {
                    self.serialize_into(child, out);
                }
            }
            NodeData::Doctype { name, .. } => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Text(text) => {
                let parent_tag = self
                    .get(node.parent)
                    .and_then(|p| match &p.data {
                        NodeData::Element { name, .. } => Some(name.local.as_ref()),
                        _ => None,
                    })
                    .unwrap_or("");
                // Raw-text elements carry their content unescaped
                if matches!(parent_tag, "script" | "style") {
                    out.push_str(text);
                } else {
                    escape_text(text, out);
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.as_ref();
                out.push('<');
                out.push_str(tag);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(attr.name.local.as_ref());
                    out.push_str("=\"");
                    escape_attr(&attr.value, out);
                    out.push('"');
                }
                out.push('>');
                if is_void_element(tag) {
                    return;
                }
                for child in self.children(id) {
                    self.serialize_into(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}
