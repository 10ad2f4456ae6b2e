//! Inline `style` attribute sanitizer.
//!
//! A style value goes through three gates:
//!
//! 1. `url(...)` references are blanked out.
//! 2. The whole value must consist of safe characters and parse as a plain
//!    list of `property: value` declarations. Otherwise the attribute is
//!    emptied.
//! 3. Each declaration survives only if its property is allowed (exactly,
//!    or as a shorthand prefix such as `margin` for `margin-left`) and every
//!    token of its value is an allowed keyword, a hex colour, a number or
//!    length, or a call to an allowed function such as `rgb(...)`.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::dom::Node;
use crate::transform::{TransformAction, Transformer, TransformerError};

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)url\s*\(\s*[^\s)]+?\s*\)\s*").expect("valid regex"))
}

fn safe_chars_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^(?:[:,;#%.\sa-zA-Z0-9!]|[a-zA-Z0-9_]-[a-zA-Z0-9_]|'[\sa-zA-Z0-9_]+'|"[\sa-zA-Z0-9_]+"|\([0-9,.%\s]+\))*$"#,
        )
        .expect("valid regex")
    })
}

fn declaration_list_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:\s*[-a-zA-Z0-9_]+\s*:\s*[^:;]*(?:;|$)\s*)*$").expect("valid regex")
    })
}

fn declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([-a-zA-Z0-9_]+)\s*:\s*([^:;]*)").expect("valid regex"))
}

fn measure_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:#[0-9a-fA-F]{3,8}|-?[0-9]*\.?[0-9]+(?:cm|em|ex|in|mm|pc|pt|px|rem|vh|vw|%)?)$")
            .expect("valid regex")
    })
}

fn function_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([a-zA-Z-]+)\(([0-9,.%\s]*)\)$").expect("valid regex"))
}

/// Transformer that sanitizes the `style` attribute of every element.
///
/// # Examples
///
/// ```
/// use sanitize_policy::CssSanitizer;
///
/// let css = CssSanitizer::new()
///     .allow_properties(["text-align", "color"])
///     .allow_keywords(["center", "red", "rgb"]);
///
/// assert_eq!(css.sanitize("text-align: center; position: fixed"), "text-align: center;");
/// assert_eq!(css.sanitize("color: rgb(255, 0, 0)"), "color: rgb(255, 0, 0);");
/// assert_eq!(css.sanitize("width: expression(alert(1))"), "");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CssSanitizer {
    properties: HashSet<String>,
    shorthand: HashSet<String>,
    keywords: HashSet<String>,
}

impl CssSanitizer {
    /// A sanitizer that allows nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows the given properties by exact name.
    pub fn allow_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties
            .extend(names.into_iter().map(|n| n.into().to_ascii_lowercase()));
        self
    }

    /// Allows the given shorthand properties and every longhand that starts
    /// with `<name>-`.
    pub fn allow_shorthand<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shorthand
            .extend(names.into_iter().map(|n| n.into().to_ascii_lowercase()));
        self
    }

    /// Allows the given keyword values and function names.
    pub fn allow_keywords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords
            .extend(words.into_iter().map(|w| w.into().to_ascii_lowercase()));
        self
    }

    /// Returns the sanitized declaration list, possibly empty.
    pub fn sanitize(&self, style: &str) -> String {
        let style = url_regex().replace_all(style, " ");
        if !safe_chars_regex().is_match(&style) || !declaration_list_regex().is_match(&style) {
            return String::new();
        }

        let mut kept = Vec::new();
        for caps in declaration_regex().captures_iter(&style) {
            let property = caps[1].to_ascii_lowercase();
            let value = caps[2].trim();
            if value.is_empty() || !self.allows_property(&property) {
                continue;
            }
            if split_value(value).into_iter().all(|token| self.allows_token(token)) {
                kept.push(format!("{}: {};", property, value));
            }
        }
        kept.join(" ")
    }

    fn allows_property(&self, property: &str) -> bool {
        if self.properties.contains(property) {
            return true;
        }
        self.shorthand.iter().any(|short| {
            property == short
                || property
                    .strip_prefix(short.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        })
    }

    fn allows_token(&self, token: &str) -> bool {
        let lower = token.to_ascii_lowercase();
        if self.keywords.contains(&lower) || measure_regex().is_match(&lower) {
            return true;
        }
        function_regex()
            .captures(&lower)
            .is_some_and(|caps| self.keywords.contains(&caps[1]))
    }
}

/// Splits a value on whitespace and commas outside parentheses.
fn split_value(value: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = None;

    for (i, ch) in value.char_indices() {
        match ch {
            '(' => {
                depth += 1;
                start.get_or_insert(i);
            }
            ')' => depth = depth.saturating_sub(1),
            c if depth == 0 && (c.is_whitespace() || c == ',') => {
                if let Some(s) = start.take() {
                    tokens.push(&value[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        tokens.push(&value[s..]);
    }
    tokens
}

impl Transformer for CssSanitizer {
    fn transform(&self, node: &mut Node) -> Result<TransformAction, TransformerError> {
        if let Some(element) = node.as_element_mut() {
            if let Some(style) = element.attr("style") {
                let clean = self.sanitize(style);
                element.set_attr("style", clean);
            }
        }
        Ok(TransformAction::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn sanitizer() -> CssSanitizer {
        CssSanitizer::new()
            .allow_properties(["text-align", "color", "background-color"])
            .allow_shorthand(["margin"])
            .allow_keywords(["left", "center", "right", "justify", "red", "rgb", "auto"])
    }

    #[test]
    fn keeps_allowed_declarations() {
        assert_eq!(
            sanitizer().sanitize("TEXT-ALIGN: Center ; color:red"),
            "text-align: Center; color: red;"
        );
    }

    #[test]
    fn drops_unknown_properties() {
        assert_eq!(sanitizer().sanitize("color:red; position: fixed"), "color: red;");
        assert_eq!(CssSanitizer::new().sanitize("color:red"), "");
    }

    #[test]
    fn drops_unknown_keywords() {
        assert_eq!(sanitizer().sanitize("color: blue"), "");
        assert_eq!(sanitizer().sanitize("color: #ff0000"), "color: #ff0000;");
    }

    #[test]
    fn shorthand_covers_longhands() {
        let css = sanitizer();
        assert_eq!(css.sanitize("margin: 0 auto"), "margin: 0 auto;");
        assert_eq!(css.sanitize("margin-left: 2.5em"), "margin-left: 2.5em;");
        assert_eq!(css.sanitize("marginx: 1px"), "");
    }

    #[test]
    fn functions_need_allowed_names() {
        let css = sanitizer();
        assert_eq!(
            css.sanitize("background-color: rgb(10, 20, 30)"),
            "background-color: rgb(10, 20, 30);"
        );
        assert_eq!(css.sanitize("background-color: hsl(10, 20%, 30%)"), "");
    }

    #[test]
    fn rejects_dangerous_values() {
        let css = sanitizer();
        assert_eq!(css.sanitize("width: expression(alert(1))"), "");
        assert_eq!(css.sanitize("color: red; background: url(http://x/y.png)"), "color: red;");
        assert_eq!(css.sanitize("color: red; background: url(javascript:alert(1))"), "");
        assert_eq!(css.sanitize("color: red /* comment */"), "");
        assert_eq!(css.sanitize("behavior: x; color: red"), "color: red;");
        assert_eq!(css.sanitize("color: \\72 ed"), "");
    }

    #[test]
    fn splits_outside_parentheses() {
        assert_eq!(split_value("0 auto"), vec!["0", "auto"]);
        assert_eq!(split_value("rgb(1, 2, 3) 1px"), vec!["rgb(1, 2, 3)", "1px"]);
        assert_eq!(split_value("a,b"), vec!["a", "b"]);
    }

    #[test]
    fn transformer_rewrites_style_attribute() {
        let mut el = Element::new("p");
        el.set_attr("style", "color:red; position:absolute");
        let mut node: Node = el.into();

        let action = sanitizer().transform(&mut node).expect("ok");

        assert_eq!(action, TransformAction::Continue);
        assert_eq!(node.as_element().expect("element").attr("style"), Some("color: red;"));
    }

    #[test]
    fn elements_without_style_are_untouched() {
        let mut node: Node = Element::new("p").into();
        sanitizer().transform(&mut node).expect("ok");
        assert!(!node.as_element().expect("element").has_attr("style"));
    }
}
