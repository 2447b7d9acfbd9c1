use std::collections::HashMap;

/// Index of a node inside its [`HtmlTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: String,
    attributes: HashMap<String, String>,
    children: Vec<NodeId>,
    text: Option<String>,
    parent: Option<NodeId>,
}

/// Arena-backed element tree. Node 0 is the root; parents are plain indices,
/// children are owned by the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTree {
    nodes: Vec<Node>,
}

impl HtmlTree {
    pub fn new<K, V>(root_tag: &str, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            nodes: vec![Node {
                tag: root_tag.to_ascii_lowercase(),
                attributes: collect_attributes(attributes),
                children: Vec::new(),
                text: None,
                parent: None,
            }],
        }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: self.root_id(),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<NodeRef<'_>> {
        if id.0 < self.nodes.len() {
            Some(NodeRef { tree: self, id })
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Appends an element as the last child of `parent`. Tag and attribute
    /// names are lowercased; a repeated attribute overwrites the earlier one.
    pub fn append_element<K, V>(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> NodeId
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.push(
            parent,
            Node {
                tag: tag.to_ascii_lowercase(),
                attributes: collect_attributes(attributes),
                children: Vec::new(),
                text: None,
                parent: Some(parent),
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push(
            parent,
            Node {
                tag: String::new(),
                attributes: HashMap::new(),
                children: Vec::new(),
                text: Some(text.into()),
                parent: Some(parent),
            },
        )
    }

    fn push(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

fn collect_attributes<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> HashMap<String, String>
where
    K: AsRef<str>,
    V: Into<String>,
{
    let mut map = HashMap::new();
    for (name, value) in attributes {
        map.insert(name.as_ref().to_ascii_lowercase(), value.into());
    }
    map
}

/// Borrowed handle to one node of a tree.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a HtmlTree,
    id: NodeId,
}

impl<'a> PartialEq for NodeRef<'a> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a HtmlTree {
        self.tree
    }

    /// Lowercase tag name; empty for text nodes.
    pub fn tag(&self) -> &'a str {
        &self.tree.node(self.id).tag
    }

    pub fn is_element(&self) -> bool {
        self.tree.node(self.id).text.is_none()
    }

    pub fn is_text(&self) -> bool {
        !self.is_element()
    }

    pub fn get_attr(&self, name: &str) -> Option<&'a str> {
        let attributes = &self.tree.node(self.id).attributes;
        match attributes.get(name) {
            Some(value) => Some(value.as_str()),
            None => attributes.get(&name.to_ascii_lowercase()).map(String::as_str),
        }
    }

    pub fn attr<'b>(&self, name: &str, default: &'b str) -> &'b str
    where
        'a: 'b,
    {
        self.get_attr(name).unwrap_or(default)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.tree
            .node(self.id)
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let tree = self.tree;
        tree.node(self.id).parent.map(|id| NodeRef { tree, id })
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        tree.node(self.id)
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.parent(), |node| node.parent())
    }

    /// Pre-order traversal starting at (and including) this node.
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants {
            tree: self.tree,
            stack: vec![self.id],
        }
    }

    /// Lazily yields every node of the subtree matching `predicate`, in
    /// document order. Each call starts a fresh traversal.
    pub fn find<P>(&self, predicate: P) -> std::iter::Filter<Descendants<'a>, P>
    where
        P: FnMut(&NodeRef<'a>) -> bool,
    {
        self.descendants().filter(predicate)
    }

    /// Own text of a text node.
    pub fn own_text(&self) -> Option<&'a str> {
        self.tree.node(self.id).text.as_deref()
    }

    /// All descendant text concatenated in document order, untouched.
    pub fn text(&self) -> String {
        self.descendants().filter_map(|n| n.own_text()).collect()
    }

    /// `text()` with runs of ASCII whitespace collapsed to one space and the
    /// ends trimmed.
    pub fn text_content(&self) -> String {
        self.text().split_ascii_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.get_attr("class")
            .map(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
            .unwrap_or(false)
    }
}

pub struct Descendants<'a> {
    tree: &'a HtmlTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(NodeRef {
            tree: self.tree,
            id,
        })
    }
}

/// Criteria for matching elements. All criteria that are set must hold.
#[derive(Debug, Clone, Default)]
pub struct ElementFilter {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub text: Option<String>,
    pub attribute: Option<(String, Option<String>)>,
}

impl ElementFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_ascii_lowercase());
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class_name(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    /// Matches against the whitespace-normalized text content.
    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn has_attribute(mut self, name: &str) -> Self {
        self.attribute = Some((name.to_string(), None));
        self
    }

    pub fn attribute(mut self, name: &str, value: &str) -> Self {
        self.attribute = Some((name.to_string(), Some(value.to_string())));
        self
    }

    pub fn matches(&self, node: &NodeRef<'_>) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if node.tag() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.get_attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(class_name) = &self.class_name {
            if !node.has_class(class_name) {
                return false;
            }
        }
        if let Some((name, expected)) = &self.attribute {
            match (node.get_attr(name), expected) {
                (None, _) => return false,
                (Some(actual), Some(expected)) if actual != expected => return false,
                _ => {}
            }
        }
        if let Some(text) = &self.text {
            if &node.text_content() != text {
                return false;
            }
        }
        true
    }
}
