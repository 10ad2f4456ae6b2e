//! Tree to markup.
//!
//! Output is always well-formed: every attribute value is double-quoted and
//! escaped, every non-void element gets an end tag, and comment bodies can
//! never terminate early.

use crate::dom::{Element, Node};
use crate::entities::{escape_attr, escape_text};
use crate::parser::{drops_leading_newline, is_raw_text, is_safe_raw_text, is_void};

enum Step<'a> {
    /// Emit a node; `raw_parent` names the enclosing raw-text element.
    Node(&'a Node, Option<&'a str>),
    Close(&'a str),
}

/// Serializes `nodes` in document order.
pub(crate) fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    let mut stack: Vec<Step<'_>> = nodes.iter().rev().map(|n| Step::Node(n, None)).collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Node(Node::Text(text), raw_parent) => match raw_parent {
                Some(parent) if is_safe_raw_text(text, parent) => out.push_str(text),
                _ => escape_text(text, &mut out),
            },
            Step::Node(Node::Comment(body), _) => write_comment(body, &mut out),
            Step::Node(Node::Element(element), _) => {
                write_start_tag(element, &mut out);
                let name = element.name();
                if drops_leading_newline(name) && starts_with_newline(element) {
                    out.push('\n');
                }
                if !is_void(name) {
                    stack.push(Step::Close(name));
                }
                let raw = is_raw_text(name).then_some(name);
                stack.extend(element.children().iter().rev().map(|c| Step::Node(c, raw)));
            }
            Step::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }

    out
}

fn write_start_tag(element: &Element, out: &mut String) {
    out.push('<');
    out.push_str(element.name());
    for attr in element.attrs().iter().filter(|a| is_safe_attr_name(&a.name)) {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        escape_attr(&attr.value, out);
        out.push('"');
    }
    out.push('>');
}

fn starts_with_newline(element: &Element) -> bool {
    matches!(element.children().first(), Some(Node::Text(t)) if t.starts_with('\n'))
}

fn is_safe_attr_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '/' | '='))
}

fn write_comment(body: &str, out: &mut String) {
    out.push_str("<!--");
    if body.starts_with('>') || body.starts_with("->") {
        out.push(' ');
    }
    out.push_str(&body.replace("-->", "-- >").replace("--!>", "--! >"));
    out.push_str("-->");
}
