//! Property tests for the cleaning pipeline.
//!
//! These check the guarantees that must hold for any input: output is
//! stable under re-cleaning, only allowed names survive, and URL attributes
//! never carry a disallowed scheme.

use sanitize_policy::{Element, Fragment, Node, Policy, Protocol};
use proptest::prelude::*;

// Strategy: markup pieces mixing valid, malformed and hostile constructs
fn arb_piece() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9 .,;:!?&#=/\n-]{0,10}").unwrap(),
        prop::sample::select(vec![
            "<b>", "</b>", "<em>", "</em>", "<p>", "</p>", "<div>", "</div>", "<span>",
            "<ul>", "<ol>", "</ul>", "<li>", "</li>", "<dl>", "<dt>", "<dd>", "<table>",
            "<tr>", "<td>", "<th>", "</table>", "<h1>", "<h3>", "</h1>", "<br>", "<br/>",
            "</br>", "<hr>", "<img src=\"https://x/y.png\" alt=a>", "<img src=javascript:x>",
            "<a href=\"http://a.example\">", "<a href=\"/rel\" title=\"t\">",
            "<a href=\"JAVASCRIPT:alert(1)\">", "<a href=\"java\tscript:x\">",
            "<a href=\"&#106;avascript:x\">", "<a href=\" data:text/html,x\">", "</a>",
            "<q cite=\"vbscript:x\">", "</q>", "<blockquote cite=\"https://c\">",
            "<script>", "</script>", "<style>", "</style>", "<textarea>", "</textarea>",
            "<title>", "<!-- c -->", "<!--", "-->", "<!DOCTYPE html>", "<?pi?>", "<![CDATA[x]]>",
            "<b onclick=\"x()\" class=c>", "<p/>", "< p>", "</ b>", "<</b>>", "&amp;",
            "&lt;", "&gt;", "&quot;", "&nbsp;", "&#60;", "&#x3e;", "&#0;", "&copy", "&nosuch;",
            "\"", "'", "<", ">", "=",
        ])
        .prop_map(String::from),
    ]
}

fn arb_markup() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_piece(), 0..32).prop_map(|pieces| pieces.concat())
}

// Strategy: inline formatting the basic preset keeps, mixed with character
// references of every form
fn arb_inline_text() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        prop::string::string_regex("[a-zA-Z0-9 .,;:!?=#]{0,8}").unwrap(),
        prop::sample::select(vec![
            "<b>", "</b>", "<i>", "</i>", "<em>", "</em>", "<strong>", "</strong>", "&oacute;",
            "&Eacute;", "&alpha;", "&le;", "&beta;", "&copy", "&copy;", "&amp;", "&amp", "&lt;",
            "&gt;", "&nbsp;", "&hellip;", "&notin;", "&#233;", "&#x3b1;", "&#128;", "&#0;",
            "&nosuch;", "&", "&#",
        ])
        .prop_map(String::from),
    ];
    prop::collection::vec(piece, 0..24).prop_map(|pieces| pieces.concat())
}

fn arb_policy() -> impl Strategy<Value = Policy> {
    prop_oneof![
        Just(Policy::restricted()),
        Just(Policy::basic()),
        Just(Policy::relaxed()),
        Just(
            Policy::builder()
                .elements(["p", "b", "li", "a", "script"])
                .attributes("a", ["href"])
                .protocols("a", "href", ["https"])
                .remove_contents(["style", "textarea"])
                .allow_comments(true)
                .build()
                .expect("valid")
        ),
    ]
}

/// Visits every element of a fragment, depth first.
fn for_each_element(nodes: &[Node], mut f: impl FnMut(&Element)) {
    let mut stack: Vec<&Node> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        if let Node::Element(element) = node {
            f(element);
            stack.extend(element.children());
        }
    }
}

proptest! {
    /// Property: cleaning clean output changes nothing
    #[test]
    fn proptest_clean_is_idempotent(input in arb_markup(), policy in arb_policy()) {
        let once = policy.clean(&input).expect("no transformers");
        let twice = policy.clean(once.as_str()).expect("no transformers");

        prop_assert_eq!(once.as_str(), twice.as_str(), "input: {:?}", input);
    }

    /// Property: only allowed elements and attributes appear in the output
    #[test]
    fn proptest_output_respects_allowlist(input in arb_markup(), policy in arb_policy()) {
        let html = policy.clean(&input).expect("no transformers");
        let fragment = Fragment::parse(html.as_str());

        let mut violations = Vec::new();
        for_each_element(fragment.nodes(), |element| {
            if !policy.allows_element(element.name()) {
                violations.push(format!("element <{}>", element.name()));
            }
            for attr in element.attrs() {
                let added = policy
                    .added_attributes(element.name())
                    .iter()
                    .any(|a| a.name == attr.name);
                if !added && !policy.allows_attribute(element.name(), &attr.name) {
                    violations.push(format!("attribute {} on <{}>", attr.name, element.name()));
                }
            }
        });

        prop_assert!(violations.is_empty(), "{:?} in {:?}", violations, html.as_str());
    }

    /// Property: protocol-checked attributes only carry allowed schemes
    #[test]
    fn proptest_output_respects_protocols(input in arb_markup(), policy in arb_policy()) {
        let html = policy.clean(&input).expect("no transformers");
        let fragment = Fragment::parse(html.as_str());

        let mut violations = Vec::new();
        for_each_element(fragment.nodes(), |element| {
            for attr in element.attrs() {
                let Some(allowed) = policy.protocols_for(element.name(), &attr.name) else {
                    continue;
                };
                let value: String = attr
                    .value
                    .trim_start()
                    .chars()
                    .filter(|c| !matches!(c, '\t' | '\n' | '\r'))
                    .collect();
                let scheme = value
                    .split_once(':')
                    .filter(|(head, _)| !head.contains(|c| matches!(c, '/' | '?' | '#')))
                    .map(|(head, _)| Protocol::from(head));
                let ok = match scheme {
                    Some(scheme) => allowed.contains(&scheme),
                    None => allowed.contains(&Protocol::Relative),
                };
                if !ok {
                    violations.push(attr.value.clone());
                }
            }
        });

        prop_assert!(violations.is_empty(), "{:?} in {:?}", violations, html.as_str());
    }

    /// Property: nothing that looks like script survives the basic preset
    #[test]
    fn proptest_basic_output_has_no_active_content(input in arb_markup()) {
        let html = Policy::basic().clean(&input).expect("no transformers");
        let fragment = Fragment::parse(html.as_str());

        let has_comment = fragment.nodes().iter().any(|n| matches!(n, Node::Comment(_)));
        let mut active = Vec::new();
        for_each_element(fragment.nodes(), |element| {
            if matches!(element.name(), "script" | "style") {
                active.push(element.name().to_string());
            }
            if element.children().iter().any(|n| matches!(n, Node::Comment(_))) {
                active.push("comment".to_string());
            }
            for attr in element.attrs() {
                if attr.name.starts_with("on") {
                    active.push(attr.name.clone());
                }
                if attr.value.to_ascii_lowercase().contains("javascript:") {
                    active.push(attr.value.clone());
                }
            }
        });

        prop_assert!(!has_comment, "comment in {:?}", html.as_str());
        prop_assert!(active.is_empty(), "{:?} in {:?}", active, html.as_str());
    }

    /// Property: cleaning allowed inline markup never changes its rendered text
    #[test]
    fn proptest_allowed_text_keeps_rendered_text(input in arb_inline_text()) {
        let html = Policy::basic().clean(&input).expect("no transformers");

        prop_assert_eq!(
            Fragment::parse(html.as_str()).text_content(),
            Fragment::parse(&input).text_content(),
            "output: {:?}",
            html.as_str()
        );
    }

    /// Property: with no elements allowed, output reparses as text only
    #[test]
    fn proptest_empty_policy_yields_text_only(text in "[a-zA-Z0-9 <>&\"']{0,64}") {
        let html = Policy::builder().build().expect("valid").clean(&text).expect("clean");
        let fragment = Fragment::parse(html.as_str());

        prop_assert!(fragment.nodes().iter().all(|n| matches!(n, Node::Text(_))));
    }
}
