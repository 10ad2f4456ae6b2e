//! The cleaning pass: parse, transform, apply the policy, serialize.
//!
//! The walk is iterative. Each open frame holds the children still to visit
//! and the output built so far; an unwrapped element has no shell and its
//! output is spliced into the parent frame when it closes.

use std::collections::HashSet;
use std::vec;

use crate::dom::{Element, Fragment, Node};
use crate::error::Error;
use crate::parser::{fosters_text, moves_on_reparse};
use crate::policy::{Policy, Protocol};
use crate::report::{CleanReport, Removal};
use crate::serializer;
use crate::transform::TransformAction;

/// Cleans `input` under `policy` and returns the markup and a report.
pub(crate) fn clean(policy: &Policy, input: &str) -> Result<(String, CleanReport), Error> {
    let fragment = Fragment::parse(input);
    let mut report = CleanReport::default();

    let nodes = Walk::new(policy, &mut report).run(fragment.into_nodes())?;
    let mut html = serializer::serialize(&nodes);

    for (entity, replacement) in policy.entities_whitelist() {
        if html.contains(entity.as_str()) {
            html = html.replace(entity.as_str(), replacement);
        }
    }

    tracing::trace!(
        input_len = input.len(),
        output_len = html.len(),
        %report,
        "fragment cleaned"
    );
    Ok((html, report))
}

struct Frame {
    pending: vec::IntoIter<Node>,
    out: Vec<Node>,
    /// Kept element shell; `None` when unwrapping.
    shell: Option<Element>,
    /// Surround the output with line breaks (unwrapped whitespace elements).
    pad: bool,
}

impl Frame {
    fn new(children: Vec<Node>, shell: Option<Element>, pad: bool) -> Self {
        Self {
            pending: children.into_iter(),
            out: Vec::new(),
            shell,
            pad,
        }
    }

    fn close(self) -> Vec<Node> {
        match self.shell {
            Some(mut element) => {
                element.set_children(self.out);
                vec![Node::Element(element)]
            }
            None if self.pad => {
                let mut nodes = Vec::with_capacity(self.out.len() + 2);
                nodes.push(Node::text("\n"));
                nodes.extend(self.out);
                nodes.push(Node::text("\n"));
                nodes
            }
            None => self.out,
        }
    }
}

enum Visit {
    Emit(Node),
    Skip,
    Enter(Frame),
}

/// Outcome of the transformer pipeline for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Fate {
    Keep,
    Unwrap,
    Remove,
}

struct Walk<'a> {
    policy: &'a Policy,
    report: &'a mut CleanReport,
    /// Names of the kept elements enclosing the current position.
    kept: Vec<String>,
}

impl<'a> Walk<'a> {
    fn new(policy: &'a Policy, report: &'a mut CleanReport) -> Self {
        Self {
            policy,
            report,
            kept: Vec::new(),
        }
    }

    fn run(mut self, roots: Vec<Node>) -> Result<Vec<Node>, Error> {
        let mut stack = vec![Frame::new(roots, None, false)];

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.pending.next(),
                None => return Ok(Vec::new()),
            };

            match next {
                Some(node) => match self.visit(node)? {
                    Visit::Emit(node) => {
                        let target = self
                            .foster_target(&stack, &node)
                            .unwrap_or(stack.len().saturating_sub(1));
                        if let Some(frame) = stack.get_mut(target) {
                            frame.out.push(node);
                        }
                    }
                    Visit::Skip => {}
                    Visit::Enter(frame) => stack.push(frame),
                },
                None => {
                    let Some(frame) = stack.pop() else {
                        return Ok(Vec::new());
                    };
                    if frame.shell.is_some() {
                        self.kept.pop();
                    }
                    let nodes = frame.close();
                    match stack.last_mut() {
                        Some(parent) => parent.out.extend(nodes),
                        None => return Ok(nodes),
                    }
                }
            }
        }
    }

    /// Frame that receives text the parser would move out of a table: the
    /// one the nearest kept `table` is written into.
    fn foster_target(&self, stack: &[Frame], node: &Node) -> Option<usize> {
        let Node::Text(text) = node else {
            return None;
        };
        if !fosters_text(self.kept.last()?, text) {
            return None;
        }
        let table = stack
            .iter()
            .rposition(|f| f.shell.as_ref().is_some_and(|e| e.name() == "table"))?;
        table.checked_sub(1)
    }

    fn visit(&mut self, mut node: Node) -> Result<Visit, Error> {
        let fate = self.run_transformers(&mut node)?;

        match node {
            Node::Text(_) if fate == Fate::Remove => {
                self.report.record(Removal::Transformer, 1);
                Ok(Visit::Skip)
            }
            Node::Text(_) => Ok(Visit::Emit(node)),
            Node::Comment(_) if fate == Fate::Remove => {
                self.report.record(Removal::Transformer, 1);
                Ok(Visit::Skip)
            }
            Node::Comment(_) if !self.policy.allows_comments() => {
                self.report.record(Removal::Comment, 1);
                Ok(Visit::Skip)
            }
            Node::Comment(_) => Ok(Visit::Emit(node)),
            Node::Element(element) => Ok(self.visit_element(element, fate)),
        }
    }

    fn run_transformers(&self, node: &mut Node) -> Result<Fate, Error> {
        let mut fate = Fate::Keep;
        for (index, transformer) in self.policy.transformers().iter().enumerate() {
            let action = transformer.transform(node).map_err(|e| {
                tracing::warn!(index, error = %e, "transformer failed");
                Error::TransformerFailed {
                    index,
                    message: e.to_string(),
                }
            })?;
            match action {
                TransformAction::Continue => {}
                TransformAction::Rename(name) => {
                    if let Some(element) = node.as_element_mut() {
                        element.set_name(name);
                    }
                }
                TransformAction::Unwrap => fate = fate.max(Fate::Unwrap),
                TransformAction::Remove => fate = Fate::Remove,
            }
        }
        Ok(fate)
    }

    fn visit_element(&mut self, mut element: Element, fate: Fate) -> Visit {
        if fate == Fate::Remove {
            self.report.record(Removal::Transformer, 1);
            return Visit::Skip;
        }

        let name = element.name().to_string();
        let allowed = fate == Fate::Keep && self.policy.allows_element(&name);

        if !allowed && self.policy.removes_contents(&name) {
            self.report.record(Removal::Removed, 1);
            return Visit::Skip;
        }

        // Unwrap elements the parser would close implicitly or relocate on
        // re-read.
        let nests_cleanly = !moves_on_reparse(&self.kept, &name, String::as_str);

        if !allowed || !nests_cleanly {
            let removal = if fate == Fate::Unwrap {
                Removal::Transformer
            } else {
                Removal::Unwrapped
            };
            self.report.record(removal, 1);
            let pad = self.policy.is_whitespace_element(&name);
            return Visit::Enter(Frame::new(element.take_children(), None, pad));
        }

        self.apply_attribute_policy(&mut element);
        let children = element.take_children();
        self.kept.push(name);
        Visit::Enter(Frame::new(children, Some(element), false))
    }

    fn apply_attribute_policy(&mut self, element: &mut Element) {
        let policy = self.policy;
        let name = element.name().to_string();

        let before = element.attrs().len();
        element.retain_attrs(|a| policy.allows_attribute(&name, &a.name));
        let allowed = element.attrs().len();
        self.report.record(Removal::Attribute, before - allowed);

        element.retain_attrs(|a| match policy.protocols_for(&name, &a.name) {
            Some(protocols) => protocol_allowed(protocols, &a.value),
            None => true,
        });
        self.report
            .record(Removal::Protocol, allowed - element.attrs().len());

        for attr in policy.added_attributes(&name) {
            element.set_attr(attr.name.clone(), attr.value.clone());
        }
    }
}

/// Extracts the URI scheme of an attribute value, lowercased.
///
/// Leading whitespace and control characters are ignored, and tab, CR and LF
/// inside the scheme are dropped, matching how browsers read URLs. Returns
/// `None` for relative references: no `:` before the first `/`, `?` or `#`.
pub(crate) fn scheme_of(value: &str) -> Option<String> {
    let value = value.trim_start_matches(|c: char| c.is_whitespace() || c.is_control());
    let mut scheme = String::new();
    for ch in value.chars() {
        match ch {
            ':' => return Some(scheme.to_lowercase()),
            '/' | '?' | '#' => return None,
            '\t' | '\n' | '\r' => {}
            c => scheme.push(c),
        }
    }
    None
}

fn protocol_allowed(allowed: &HashSet<Protocol>, value: &str) -> bool {
    match scheme_of(value) {
        Some(scheme) => allowed.contains(&Protocol::Scheme(scheme)),
        None => allowed.contains(&Protocol::Relative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformerError;

    fn clean_with(policy: &Policy, input: &str) -> String {
        clean(policy, input).expect("clean").0
    }

    #[test]
    fn scheme_extraction() {
        assert_eq!(scheme_of("http://x"), Some("http".into()));
        assert_eq!(scheme_of("  JavaScript:alert(1)"), Some("javascript".into()));
        assert_eq!(scheme_of("java\tscript:alert(1)"), Some("javascript".into()));
        assert_eq!(scheme_of("\u{1}javascript:x"), Some("javascript".into()));
        assert_eq!(scheme_of("/path:with/colon"), None);
        assert_eq!(scheme_of("?q=a:b"), None);
        assert_eq!(scheme_of("#frag:x"), None);
        assert_eq!(scheme_of("page.html"), None);
        assert_eq!(scheme_of(":x"), Some(String::new()));
    }

    #[test]
    fn unwraps_disallowed_elements() {
        let policy = Policy::builder().elements(["b"]).build().expect("valid");
        assert_eq!(clean_with(&policy, "<i><b>x</b>y</i>"), "<b>x</b>y");
    }

    #[test]
    fn whitespace_elements_are_padded_when_unwrapped() {
        let policy = Policy::builder().elements(["b"]).build().expect("valid");
        assert_eq!(clean_with(&policy, "a<div>b</div>c"), "a\nb\nc");

        let keep_div = Policy::builder().elements(["div"]).build().expect("valid");
        assert_eq!(clean_with(&keep_div, "a<div>b</div>c"), "a<div>b</div>c");
    }

    #[test]
    fn remove_contents_drops_subtree() {
        let policy = Policy::builder()
            .elements(["p"])
            .remove_contents(["script", "style"])
            .build()
            .expect("valid");
        let (html, report) = clean(&policy, "<p>a<script>evil()</script><style>x{}</style>b</p>")
            .expect("clean");

        assert_eq!(html, "<p>ab</p>");
        assert_eq!(report.elements_removed, 2);
    }

    #[test]
    fn allowed_element_ignores_remove_contents() {
        let policy = Policy::builder()
            .elements(["b"])
            .remove_contents(["b"])
            .build()
            .expect("valid");
        assert_eq!(clean_with(&policy, "<b>x</b>"), "<b>x</b>");
    }

    #[test]
    fn comments_follow_policy() {
        let strip = Policy::builder().build().expect("valid");
        let (html, report) = clean(&strip, "a<!-- c -->b").expect("clean");
        assert_eq!(html, "ab");
        assert_eq!(report.comments_removed, 1);

        let keep = Policy::builder().allow_comments(true).build().expect("valid");
        assert_eq!(clean_with(&keep, "a<!-- c -->b"), "a<!-- c -->b");
    }

    #[test]
    fn attributes_are_filtered_then_added() {
        let policy = Policy::builder()
            .elements(["a"])
            .attributes("a", ["href", "rel"])
            .add_attribute("a", "rel", "nofollow")
            .build()
            .expect("valid");

        assert_eq!(
            clean_with(&policy, r#"<a rel="me" href="/x" onclick="y()">z</a>"#),
            r#"<a rel="nofollow" href="/x">z</a>"#
        );
    }

    #[test]
    fn protocols_are_checked_on_kept_attributes() {
        let policy = Policy::builder()
            .elements(["a"])
            .attributes("a", ["href"])
            .protocols("a", "href", ["https"])
            .build()
            .expect("valid");

        assert_eq!(
            clean_with(&policy, r#"<a href="https://ok">1</a><a href="/rel">2</a>"#),
            r#"<a href="https://ok">1</a><a>2</a>"#
        );
        assert_eq!(
            clean_with(&policy, r#"<a href="&#106;avascript:x()">3</a>"#),
            "<a>3</a>"
        );
    }

    #[test]
    fn transformer_rename_runs_before_policy() {
        let policy = Policy::builder()
            .elements(["span"])
            .transformer(|node: &mut Node| -> Result<TransformAction, TransformerError> {
                if node.name() == Some("font") {
                    return Ok(TransformAction::Rename("span".into()));
                }
                Ok(TransformAction::Continue)
            })
            .build()
            .expect("valid");

        assert_eq!(clean_with(&policy, "<font>hi</font>"), "<span>hi</span>");
    }

    #[test]
    fn transformers_see_earlier_edits() {
        let policy = Policy::builder()
            .elements(["p"])
            .attributes("p", ["class"])
            .transformer(|node: &mut Node| -> Result<TransformAction, TransformerError> {
                if let Some(el) = node.as_element_mut() {
                    el.set_attr("class", "one");
                }
                Ok(TransformAction::Continue)
            })
            .transformer(|node: &mut Node| -> Result<TransformAction, TransformerError> {
                if let Some(el) = node.as_element_mut() {
                    let class = format!("{} two", el.attr("class").unwrap_or_default());
                    el.set_attr("class", class);
                }
                Ok(TransformAction::Continue)
            })
            .build()
            .expect("valid");

        assert_eq!(clean_with(&policy, "<p>x</p>"), r#"<p class="one two">x</p>"#);
    }

    #[test]
    fn transformer_remove_and_unwrap() {
        let policy = Policy::builder()
            .elements(["b", "i"])
            .transformer(|node: &mut Node| -> Result<TransformAction, TransformerError> {
                Ok(match node.name() {
                    Some("b") => TransformAction::Unwrap,
                    Some("i") => TransformAction::Remove,
                    _ => TransformAction::Continue,
                })
            })
            .build()
            .expect("valid");

        let (html, report) = clean(&policy, "<b>1<i>2</i>3</b>").expect("clean");
        assert_eq!(html, "13");
        assert_eq!(report.transformer_removals, 2);
    }

    #[test]
    fn transformers_see_text_and_comments() {
        let policy = Policy::builder()
            .transformer(|node: &mut Node| -> Result<TransformAction, TransformerError> {
                if let Node::Text(t) = node {
                    if t.contains("secret") {
                        return Ok(TransformAction::Remove);
                    }
                }
                Ok(TransformAction::Continue)
            })
            .build()
            .expect("valid");

        assert_eq!(clean_with(&policy, "ok<b>secret</b>"), "ok");
    }

    #[test]
    fn transformer_failure_aborts() {
        let policy = Policy::builder()
            .transformer(|_: &mut Node| Ok::<_, TransformerError>(TransformAction::Continue))
            .transformer(|node: &mut Node| -> Result<TransformAction, TransformerError> {
                if node.name() == Some("x") {
                    return Err(TransformerError::new("no x"));
                }
                Ok(TransformAction::Continue)
            })
            .build()
            .expect("valid");

        let err = clean(&policy, "<p><x>1</x></p>").unwrap_err();
        assert!(matches!(
            err,
            Error::TransformerFailed { index: 1, ref message } if message == "no x"
        ));
    }

    #[test]
    fn entities_whitelist_rewrites_output() {
        let policy = Policy::builder()
            .entity("&amp;", "&")
            .build()
            .expect("valid");
        assert_eq!(clean_with(&policy, "<script>hello & world</script>"), "hello & world");
    }

    #[test]
    fn unwrapped_container_does_not_merge_implied_siblings() {
        let policy = Policy::builder().elements(["li"]).build().expect("valid");
        let once = clean_with(&policy, "<li>a<table><li>b</table>");
        let twice = clean_with(&policy, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn table_text_moves_in_front_of_table() {
        let policy = Policy::builder()
            .elements(["table", "tbody", "tr"])
            .build()
            .expect("valid");

        let once = clean_with(&policy, "a<table><tr><td>x</td></tr></table>");
        assert_eq!(once, "ax<table><tbody><tr></tr></tbody></table>");
        assert_eq!(clean_with(&policy, &once), once);
    }

    #[test]
    fn unwrapped_table_content_stays_stable() {
        let policy = Policy::relaxed();
        let once = clean_with(&policy, "<table><script>x</script><tr><td>y</table>");

        assert_eq!(once, "x<table><tbody><tr><td>y</td></tr></tbody></table>");
        assert_eq!(clean_with(&policy, &once), once);
    }

    #[test]
    fn table_parts_need_their_table() {
        let policy = Policy::builder().elements(["tr", "td", "b"]).build().expect("valid");
        assert_eq!(clean_with(&policy, "<table><tr><td><b>x</b></table>"), "<b>x</b>");
    }

    #[test]
    fn deep_input_is_handled_iteratively() {
        let policy = Policy::builder().elements(["b"]).build().expect("valid");
        let input = "<i><b>".repeat(1000);
        let html = clean_with(&policy, &input);
        assert!(html.starts_with("<b><b>"));
    }
}
