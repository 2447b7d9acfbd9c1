use crate::dom::node::{ElementFilter, HtmlTree, NodeId, NodeRef};
use crate::dom::parser;
use crate::errors::{BrowserError, Result};
use crate::forms::Form;
use encoding_rs::{Encoding, UTF_8};
use url::Url;
use uuid::Uuid;

/// A parsed page: the element tree plus the URLs needed to resolve links.
#[derive(Debug, Clone)]
pub struct Document {
    id: Uuid,
    url: Url,
    base_url: Url,
    encoding: &'static Encoding,
    tree: HtmlTree,
}

/// An `<a href>` element, detached from the tree so it can be handed back
/// to the browser while the document is still borrowed elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub document_id: Uuid,
    pub node: NodeId,
    pub href: String,
    /// `href` resolved against the base URL; `None` if it does not parse.
    pub url: Option<Url>,
    pub text: String,
    pub element_id: Option<String>,
    pub class_name: Option<String>,
}

impl Document {
    pub fn parse(bytes: &[u8], declared_charset: Option<&str>, url: Url) -> Self {
        let (tree, encoding) = parser::parse_bytes(bytes, declared_charset);
        Self::new(tree, url, encoding)
    }

    pub fn from_html(html: &str, url: Url) -> Self {
        Self::new(parser::parse_html(html), url, UTF_8)
    }

    pub fn new(tree: HtmlTree, url: Url, encoding: &'static Encoding) -> Self {
        let base_url = compute_base_url(&tree, &url);
        Self {
            id: Uuid::new_v4(),
            url,
            base_url,
            encoding,
            tree,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The URL the document was retrieved from, after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL relative references resolve against: the first `<base href>`
    /// if there is one, else the document URL, without fragment.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn charset(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn tree(&self) -> &HtmlTree {
        &self.tree
    }

    pub fn root(&self) -> NodeRef<'_> {
        self.tree.root()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.tree.get(id)
    }

    pub fn title(&self) -> Option<String> {
        self.root()
            .find(|n| n.tag() == "title")
            .next()
            .map(|n| n.text_content())
    }

    pub fn resolve(&self, reference: &str) -> Result<Url> {
        Ok(self.base_url.join(reference.trim())?)
    }

    pub fn find_all_elements<'a>(
        &'a self,
        filter: &'a ElementFilter,
    ) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.root().find(move |n| filter.matches(n))
    }

    /// Exactly one match when `n` is `None`, otherwise the n-th (0-based).
    pub fn find_element(&self, filter: &ElementFilter, n: Option<usize>) -> Result<NodeRef<'_>> {
        // Items borrow the document only, not the filter
        get_exactly_one(self.root().find(|node| filter.matches(node)), n, "element")
    }

    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        self.root()
            .find(|n| n.tag() == "a" && n.has_attr("href"))
            .map(move |n| self.link_from_node(n))
    }

    /// Links matching `filter`; the tag criterion is always `a`.
    pub fn find_links<'a>(&'a self, filter: &'a ElementFilter) -> impl Iterator<Item = Link> + 'a {
        self.root()
            .find(move |n| n.tag() == "a" && n.has_attr("href") && filter.matches(n))
            .map(move |n| self.link_from_node(n))
    }

    pub fn find_link(&self, filter: &ElementFilter, n: Option<usize>) -> Result<Link> {
        get_exactly_one(self.find_links(filter), n, "link")
    }

    pub fn forms(&self) -> impl Iterator<Item = Form> + '_ {
        self.root()
            .find(|n| n.tag() == "form")
            .map(move |n| Form::extract(self, n))
    }

    pub fn find_forms<'a>(&'a self, filter: &'a ElementFilter) -> impl Iterator<Item = Form> + 'a {
        self.root()
            .find(move |n| n.tag() == "form" && filter.matches(n))
            .map(move |n| Form::extract(self, n))
    }

    pub fn find_form(&self, filter: &ElementFilter, n: Option<usize>) -> Result<Form> {
        get_exactly_one(self.find_forms(filter), n, "form")
    }

    fn link_from_node(&self, node: NodeRef<'_>) -> Link {
        Link {
            document_id: self.id,
            node: node.id(),
            href: node.attr("href", "").to_string(),
            url: self.resolve(node.attr("href", "")).ok(),
            text: node.text_content(),
            element_id: node.get_attr("id").map(str::to_string),
            class_name: node.get_attr("class").map(str::to_string),
        }
    }
}

fn compute_base_url(tree: &HtmlTree, url: &Url) -> Url {
    let declared = tree
        .root()
        .find(|n| n.tag() == "base" && n.has_attr("href"))
        .next()
        .and_then(|base| url.join(base.attr("href", "").trim()).ok());

    let mut base = declared.unwrap_or_else(|| url.clone());
    base.set_fragment(None);
    base
}

fn get_exactly_one<T>(mut items: impl Iterator<Item = T>, n: Option<usize>, what: &str) -> Result<T> {
    match n {
        None => {
            let first = items.next().ok_or_else(|| {
                BrowserError::ElementNotFound(format!("expected one {}, found none", what))
            })?;
            if items.next().is_some() {
                return Err(BrowserError::TooManyElements(format!(
                    "expected exactly one {}, found more",
                    what
                )));
            }
            Ok(first)
        }
        Some(index) => {
            let mut found = 0;
            for item in items {
                if found == index {
                    return Ok(item);
                }
                found += 1;
            }
            Err(BrowserError::ElementNotFound(format!(
                "requested {} #{}, but only {} exist",
                what, index, found
            )))
        }
    }
}
