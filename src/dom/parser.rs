use crate::dom::node::{HtmlTree, NodeId};
use encoding_rs::{Encoding, WINDOWS_1252};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// How far into the document a `<meta>` charset declaration is looked for.
const META_PRESCAN_LIMIT: usize = 1024;

/// Parses a complete document. Recovery from malformed markup is left to
/// html5ever; the result always has an `<html>` root.
pub fn parse_html(html: &str) -> HtmlTree {
    let document = Html::parse_document(html);
    build_tree(document.root_element())
}

/// Decodes `bytes` and parses them. Returns the tree together with the
/// encoding that was actually used.
pub fn parse_bytes(bytes: &[u8], declared_charset: Option<&str>) -> (HtmlTree, &'static Encoding) {
    let encoding = detect_charset(bytes, declared_charset);
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "malformed byte sequences replaced while decoding");
    }
    (parse_html(&text), used)
}

/// Picks the document encoding: byte order mark, then the transport-level
/// declaration, then a `<meta>` prescan, then windows-1252.
pub fn detect_charset(bytes: &[u8], declared_charset: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if let Some(encoding) = declared_charset.and_then(|label| Encoding::for_label(label.as_bytes())) {
        return encoding;
    }

    if let Some(encoding) = prescan_meta_charset(bytes) {
        return encoding;
    }

    WINDOWS_1252
}

fn prescan_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_LIMIT)];
    let document = Html::parse_document(&String::from_utf8_lossy(head));
    let selector = Selector::parse("meta").ok()?;

    for meta in document.select(&selector) {
        let element = meta.value();
        let label = if let Some(charset) = element.attr("charset") {
            Some(charset)
        } else {
            let is_content_type = element
                .attr("http-equiv")
                .map(|h| h.trim().eq_ignore_ascii_case("content-type"))
                .unwrap_or(false);
            match element.attr("content") {
                Some(content) if is_content_type => charset_from_content_type(content),
                _ => None,
            }
        };

        // Labels we don't know are skipped in favor of the next <meta>
        let found = label
            .map(|l| l.trim_matches(|c: char| c == '"' || c == '\'' || c.is_ascii_whitespace()))
            .and_then(|l| Encoding::for_label(l.as_bytes()));
        if let Some(encoding) = found {
            // The document got this far as ASCII-compatible text, so a UTF-16
            // declaration cannot be right.
            return Some(encoding.output_encoding());
        }
    }

    None
}

fn charset_from_content_type(content: &str) -> Option<&str> {
    let lower = content.to_ascii_lowercase();
    let start = lower.rfind("charset=")? + "charset=".len();
    let rest = &content[start..];
    let end = rest.find(';').unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn build_tree(root: ElementRef<'_>) -> HtmlTree {
    let mut tree = HtmlTree::new(root.value().name(), root.value().attrs());
    let mut pending: Vec<(NodeId, ElementRef<'_>)> = vec![(tree.root_id(), root)];

    while let Some((parent, element)) = pending.pop() {
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                let value = child_element.value();
                let id = tree.append_element(parent, value.name(), value.attrs());
                pending.push((id, child_element));
            } else if let Some(text) = child.value().as_text() {
                let text: &str = text;
                tree.append_text(parent, text);
            }
        }
    }

    tree
}
