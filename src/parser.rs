//! Fragment parsing on top of `html5ever`.
//!
//! Markup is parsed with the HTML5 fragment algorithm in a `<body>` context,
//! so malformed input normalizes exactly the way a browser would read it and
//! every named character reference is decoded. The resulting
//! `markup5ever_rcdom` tree is converted into crate [`Node`]s.
//!
//! Nesting is capped at [`MAX_DEPTH`] elements. Deeper elements are dropped
//! and their content flows into the deepest kept element.
//!
//! The rest of this module mirrors the parts of the tree builder the filter
//! has to respect so that cleaned output parses back to the same tree:
//! start tags that implicitly close an open element, and content the parser
//! moves out of tables.

use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::dom::{Attribute, Element, Fragment, Node};

/// Maximum element nesting depth kept from the parsed tree.
pub const MAX_DEPTH: usize = 512;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content the tokenizer reads as unparsed text.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "noscript", "plaintext",
];

/// Elements that drop a newline directly after their start tag.
pub(crate) const LEADING_NEWLINE_ELEMENTS: &[&str] = &["pre", "listing", "textarea"];

/// Start tags that close an open `p`.
const CLOSES_P: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "center",
    "dd",
    "details",
    "dialog",
    "dir",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "hr",
    "li",
    "listing",
    "main",
    "menu",
    "nav",
    "ol",
    "p",
    "plaintext",
    "pre",
    "search",
    "section",
    "summary",
    "table",
    "ul",
    "xmp",
];

/// Elements that bound the search for an implicitly closed element.
const SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "th", "template",
];

/// The tree builder's "special" category, which stops the search for an
/// open `li`, `dd` or `dt`.
const SPECIAL: &[&str] = &[
    "address", "applet", "area", "article", "aside", "base", "basefont", "bgsound", "blockquote",
    "body", "br", "button", "caption", "center", "col", "colgroup", "dd", "details", "dir", "div",
    "dl", "dt", "embed", "fieldset", "figcaption", "figure", "footer", "form", "frame", "frameset",
    "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html", "iframe", "img",
    "input", "keygen", "li", "link", "listing", "main", "marquee", "menu", "meta", "nav",
    "noembed", "noframes", "noscript", "object", "ol", "p", "param", "plaintext", "pre", "script",
    "search", "section", "select", "source", "style", "summary", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "title", "tr", "track", "ul", "wbr", "xmp",
];

/// Elements closed by "generate implied end tags".
const IMPLIED_END: &[&str] = &[
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Table elements whose direct text and non-table children are moved
/// in front of the table.
const TABLE_CONTEXT: &[&str] = &["table", "tbody", "thead", "tfoot", "tr", "colgroup"];

/// Elements that may sit directly in any table context.
const TABLE_SAFE: &[&str] = &["script", "style", "template", "form"];

pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

pub(crate) fn is_raw_text(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name)
}

pub(crate) fn drops_leading_newline(name: &str) -> bool {
    LEADING_NEWLINE_ELEMENTS.contains(&name)
}

fn is_html_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C)
}

/// Parses `input` into a fragment. Never fails.
pub(crate) fn parse_fragment(input: &str) -> Fragment {
    let context = QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from("body"),
    );
    let dom = html5ever::parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        context,
        Vec::new(),
        false,
    )
    .one(input);

    // The fragment algorithm parses into a synthetic `<html>` root.
    let root = dom.document.children.borrow().first().cloned();
    match root {
        Some(root) => Fragment::from_nodes(convert(&root)),
        None => Fragment::default(),
    }
}

struct Open {
    pending: std::vec::IntoIter<Handle>,
    element: Option<Element>,
    nodes: Vec<Node>,
}

impl Open {
    fn new(children: Vec<Handle>, element: Option<Element>) -> Self {
        Self {
            pending: children.into_iter(),
            element,
            nodes: Vec::new(),
        }
    }
}

/// Converts the children of `root` without recursion.
fn convert(root: &Handle) -> Vec<Node> {
    let mut stack = vec![Open::new(children_of(root), None)];
    let mut depth = 0;

    loop {
        let Some(top) = stack.last_mut() else {
            return Vec::new();
        };

        match top.pending.next() {
            Some(handle) => match &handle.data {
                NodeData::Text { contents } => {
                    push_node(&mut top.nodes, Node::Text(contents.borrow().to_string()));
                }
                NodeData::Comment { contents } => {
                    top.nodes.push(Node::Comment(contents.to_string()));
                }
                NodeData::Element { name, attrs, .. } => {
                    let children = children_of(&handle);
                    if depth >= MAX_DEPTH {
                        stack.push(Open::new(children, None));
                    } else {
                        let attrs = attrs.borrow().iter().map(convert_attribute).collect();
                        let local: &str = &name.local;
                        let element = Element::from_parts(local.to_ascii_lowercase(), attrs);
                        depth += 1;
                        stack.push(Open::new(children, Some(element)));
                    }
                }
                NodeData::Document
                | NodeData::Doctype { .. }
                | NodeData::ProcessingInstruction { .. } => {}
            },
            None => {
                let Some(done) = stack.pop() else {
                    return Vec::new();
                };
                let nodes = match done.element {
                    Some(mut element) => {
                        depth -= 1;
                        element.set_children(done.nodes);
                        vec![Node::Element(element)]
                    }
                    None => done.nodes,
                };
                match stack.last_mut() {
                    Some(parent) => {
                        for node in nodes {
                            push_node(&mut parent.nodes, node);
                        }
                    }
                    None => return nodes,
                }
            }
        }
    }
}

/// Children of `handle`; for `<template>` these are its content fragment.
fn children_of(handle: &Handle) -> Vec<Handle> {
    if let NodeData::Element {
        template_contents, ..
    } = &handle.data
    {
        if let Some(contents) = template_contents.borrow().as_ref() {
            return contents.children.borrow().clone();
        }
    }
    handle.children.borrow().clone()
}

fn convert_attribute(attr: &html5ever::Attribute) -> Attribute {
    let local: &str = &attr.name.local;
    let local = local.to_ascii_lowercase();
    let name = match &attr.name.prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local,
    };
    Attribute::new(name, attr.value.to_string())
}

/// Appends `node`, merging adjacent text.
fn push_node(nodes: &mut Vec<Node>, node: Node) {
    match (nodes.last_mut(), node) {
        (_, Node::Text(text)) if text.is_empty() => {}
        (Some(Node::Text(prev)), Node::Text(text)) => prev.push_str(&text),
        (_, node) => nodes.push(node),
    }
}

/// Index of the outermost open element that a start tag `name` closes
/// implicitly, if any. `open` runs from the root to the innermost element.
pub(crate) fn implied_close<T>(
    open: &[T],
    name: &str,
    name_of: impl Fn(&T) -> &str,
) -> Option<usize> {
    let mut cut = None;
    let mut len = open.len();

    let implied = match name {
        "li" => find_list_item(open, &["li"], &name_of),
        "dd" | "dt" => find_list_item(open, &["dd", "dt"], &name_of),
        _ => None,
    };
    if let Some(idx) = implied {
        cut = Some(idx);
        len = idx;
    }

    if CLOSES_P.contains(&name) {
        if let Some(idx) = find_in_scope(&open[..len], &["p"], SCOPE_BOUNDARIES, &name_of) {
            cut = Some(idx);
            len = idx;
        }
    }

    let open = &open[..len];
    let implied = match name {
        "option" | "optgroup" => match open.last() {
            Some(top) if name_of(top) == "option" => Some(len - 1),
            _ => None,
        },
        "tr" => find_in_scope(open, &["tr"], &["table", "tbody", "thead", "tfoot"], &name_of),
        "td" | "th" => find_in_scope(open, &["td", "th"], &["tr", "table"], &name_of),
        "a" | "button" | "nobr" => find_in_scope(open, &[name], SCOPE_BOUNDARIES, &name_of),
        // A second form or select start tag is dropped or closes the first.
        "form" | "select" => find_in_scope(open, &[name], &[], &name_of),
        "rb" | "rtc" | "rp" | "rt" => ruby_close(open, name, &name_of),
        h if HEADINGS.contains(&h) => match open.last() {
            Some(top) if HEADINGS.contains(&name_of(top)) => Some(len - 1),
            _ => None,
        },
        _ => None,
    };

    implied.or(cut)
}

/// Finds an open element named in `targets` above the nearest element named
/// in `boundaries`.
fn find_in_scope<T>(
    open: &[T],
    targets: &[&str],
    boundaries: &[&str],
    name_of: &impl Fn(&T) -> &str,
) -> Option<usize> {
    for (idx, item) in open.iter().enumerate().rev() {
        let name = name_of(item);
        if targets.contains(&name) {
            return Some(idx);
        }
        if boundaries.contains(&name) {
            return None;
        }
    }
    None
}

/// The `li`/`dd`/`dt` search: stops at any special element other than
/// `address`, `div` and `p`.
fn find_list_item<T>(open: &[T], targets: &[&str], name_of: &impl Fn(&T) -> &str) -> Option<usize> {
    for (idx, item) in open.iter().enumerate().rev() {
        let name = name_of(item);
        if targets.contains(&name) {
            return Some(idx);
        }
        if SPECIAL.contains(&name) && !matches!(name, "address" | "div" | "p") {
            return None;
        }
    }
    None
}

/// Ruby annotations close the implied-end-tag elements on top of the stack
/// when a `ruby` is in scope. `rp` and `rt` leave an open `rtc` alone.
fn ruby_close<T>(open: &[T], name: &str, name_of: &impl Fn(&T) -> &str) -> Option<usize> {
    find_in_scope(open, &["ruby"], SCOPE_BOUNDARIES, name_of)?;
    let keeps_rtc = matches!(name, "rp" | "rt");
    let start = open
        .iter()
        .rposition(|item| {
            let n = name_of(item);
            !IMPLIED_END.contains(&n) || (keeps_rtc && n == "rtc")
        })
        .map_or(0, |idx| idx + 1);
    (start < open.len()).then_some(start)
}

/// Returns `true` if an element `name` written inside the open elements
/// `open` would not be read back as their child.
pub(crate) fn moves_on_reparse<T>(open: &[T], name: &str, name_of: impl Fn(&T) -> &str) -> bool {
    // Nothing closes `plaintext`, so its end tag would become content.
    name == "plaintext"
        || implied_close(open, name, &name_of).is_some()
        || misplaced_in_table(open.last().map(|t| name_of(t)), name)
}

/// Returns `true` if the parser would move text directly inside `parent` in
/// front of the enclosing table.
pub(crate) fn fosters_text(parent: &str, text: &str) -> bool {
    TABLE_CONTEXT.contains(&parent) && !text.bytes().all(is_html_space)
}

/// Returns `true` if an element `child` whose nearest element ancestor is
/// `parent` would end up elsewhere when parsed: table parts outside their
/// table, or ordinary elements directly inside table structure.
pub(crate) fn misplaced_in_table(parent: Option<&str>, child: &str) -> bool {
    let required: &[&str] = match child {
        "td" | "th" => &["tr", "tbody", "thead", "tfoot", "table"],
        "tr" => &["tbody", "thead", "tfoot", "table"],
        "tbody" | "thead" | "tfoot" | "caption" | "colgroup" => &["table"],
        "col" => &["colgroup", "table"],
        _ => {
            return match parent {
                Some("colgroup") => child != "template",
                Some(p) if TABLE_CONTEXT.contains(&p) => !TABLE_SAFE.contains(&child),
                _ => false,
            }
        }
    };
    !parent.is_some_and(|p| required.contains(&p))
}

/// Byte offset of the first end tag for raw-text element `name` in `text`.
///
/// The tag name must be followed by whitespace, `/` or `>`. A trailing
/// `</name` at the very end does not count: the serializer's own end tag
/// follows it.
pub(crate) fn find_raw_end(text: &str, name: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut search_from = 0;
    while let Some(i) = text[search_from..].find("</") {
        let at = search_from + i;
        let after = &bytes[at + 2..];
        let matches_name =
            after.len() >= name.len() && after[..name.len()].eq_ignore_ascii_case(name.as_bytes());
        let boundary = after
            .get(name.len())
            .is_some_and(|b| is_html_space(*b) || *b == b'/' || *b == b'>');
        if matches_name && boundary {
            return Some(at);
        }
        search_from = at + 2;
    }
    None
}

/// Returns `true` if `text` can be written verbatim inside raw-text element
/// `name` and read back unchanged.
pub(crate) fn is_safe_raw_text(text: &str, name: &str) -> bool {
    // `<!--` switches script data into its escaped states, where the
    // closing tag may no longer end the element.
    find_raw_end(text, name).is_none() && !(name == "script" && text.contains("<!--"))
}
