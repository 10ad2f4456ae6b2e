//! Immutable sanitization policy.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::builder::PolicyBuilder;
use crate::dom::Attribute;
use crate::error::Error;
use crate::filter;
use crate::report::CleanReport;
use crate::safe_html::SafeHtml;
use crate::transform::Transformer;

/// Wildcard key for [`PolicyBuilder::attributes`] and
/// [`PolicyBuilder::protocols`]: the rule applies to every element.
pub const ALL: &str = "all";

/// Elements that get line boundaries around their content when unwrapped.
pub const DEFAULT_WHITESPACE_ELEMENTS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "br",
    "dd",
    "div",
    "dl",
    "dt",
    "footer",
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
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "ul",
];

/// An allowed URI scheme, or the sentinel for scheme-less references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// A lowercase scheme such as `https` or `mailto`
    Scheme(String),
    /// A relative reference (no scheme at all)
    Relative,
}

impl Protocol {
    /// Configuration spelling of the relative-reference sentinel.
    pub const RELATIVE: &'static str = "relative";
}

impl From<&str> for Protocol {
    /// `"relative"` maps to [`Protocol::Relative`]; anything else is a scheme.
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case(Self::RELATIVE) {
            Protocol::Relative
        } else {
            Protocol::Scheme(value.to_ascii_lowercase())
        }
    }
}

impl From<String> for Protocol {
    fn from(value: String) -> Self {
        Protocol::from(value.as_str())
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Scheme(s) => f.write_str(s),
            Protocol::Relative => f.write_str(Self::RELATIVE),
        }
    }
}

/// A complete, validated sanitization policy.
///
/// Policies are immutable once built and cheap to share behind an [`Arc`].
/// Use [`PolicyBuilder`] (or [`PolicyConfig`](crate::PolicyConfig)) to make
/// one, or start from a preset: [`restricted`](Self::restricted),
/// [`basic`](Self::basic) (the default) or [`relaxed`](Self::relaxed).
///
/// # Examples
///
/// ```
/// use sanitize_policy::{Policy, Protocol};
///
/// let policy = Policy::builder()
///     .elements(["a", "b"])
///     .attributes("a", ["href"])
///     .protocols("a", "href", ["https", Protocol::RELATIVE])
///     .build()
///     .expect("valid policy");
///
/// let html = policy.clean(r#"<a href="javascript:x()">hi</a> <i>there</i>"#).unwrap();
/// assert_eq!(html.as_str(), "<a>hi</a> there");
/// ```
#[derive(Clone)]
pub struct Policy {
    pub(crate) elements: HashSet<String>,
    pub(crate) attributes: HashMap<String, HashSet<String>>,
    pub(crate) add_attributes: HashMap<String, Vec<Attribute>>,
    pub(crate) protocols: HashMap<String, HashMap<String, HashSet<Protocol>>>,
    pub(crate) whitespace_elements: HashSet<String>,
    pub(crate) remove_contents: HashSet<String>,
    pub(crate) allow_comments: bool,
    pub(crate) entities_whitelist: Vec<(String, String)>,
    pub(crate) transformers: Vec<Arc<dyn Transformer>>,
}

impl Policy {
    /// Starts an empty policy: no elements, no attributes.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::new()
    }

    /// Only simple inline formatting, no attributes, no links.
    pub fn restricted() -> Self {
        restricted_rules().build_preset()
    }

    /// Inline formatting, lists, quotes and links with `rel="nofollow"`.
    pub fn basic() -> Self {
        basic_rules().build_preset()
    }

    /// Basic plus headings, tables and images.
    pub fn relaxed() -> Self {
        relaxed_rules().build_preset()
    }

    /// Cleans `input` under this policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransformerFailed`] if a transformer fails. Malformed
    /// markup is never an error.
    pub fn clean(&self, input: &str) -> Result<SafeHtml, Error> {
        self.clean_with_report(input).map(|(html, _)| html)
    }

    /// Cleans `input` and reports what was removed.
    pub fn clean_with_report(&self, input: &str) -> Result<(SafeHtml, CleanReport), Error> {
        let (html, report) = filter::clean(self, input)?;
        Ok((SafeHtml::new_unchecked(html), report))
    }

    /// Returns `true` if the element (any case) is allowed.
    pub fn allows_element(&self, name: &str) -> bool {
        self.elements.contains(&name.to_ascii_lowercase())
    }

    /// Returns `true` if `attribute` may stay on `element`, either through
    /// the element's own list or the [`ALL`] list.
    pub fn allows_attribute(&self, element: &str, attribute: &str) -> bool {
        [element, ALL].iter().any(|key| {
            self.attributes
                .get(*key)
                .is_some_and(|names| names.contains(attribute))
        })
    }

    /// Allowed protocols for an attribute. Element-specific rules take
    /// precedence over [`ALL`] rules. `None` means the attribute is not
    /// protocol-checked.
    pub fn protocols_for(&self, element: &str, attribute: &str) -> Option<&HashSet<Protocol>> {
        self.protocols
            .get(element)
            .and_then(|attrs| attrs.get(attribute))
            .or_else(|| self.protocols.get(ALL).and_then(|attrs| attrs.get(attribute)))
    }

    /// Attributes forced onto every `element`.
    pub fn added_attributes(&self, element: &str) -> &[Attribute] {
        self.add_attributes
            .get(element)
            .map_or(&[], |attrs| attrs.as_slice())
    }

    /// Returns `true` if the element gets line boundaries when unwrapped.
    pub fn is_whitespace_element(&self, name: &str) -> bool {
        self.whitespace_elements.contains(name)
    }

    /// Returns `true` if a disallowed element is dropped with its content
    /// instead of being unwrapped.
    pub fn removes_contents(&self, name: &str) -> bool {
        self.remove_contents.contains(name)
    }

    /// Returns `true` if comments survive cleaning.
    pub fn allows_comments(&self) -> bool {
        self.allow_comments
    }

    /// Literal substitutions applied to the serialized output.
    pub fn entities_whitelist(&self) -> &[(String, String)] {
        &self.entities_whitelist
    }

    /// The transformer pipeline, in execution order.
    pub fn transformers(&self) -> &[Arc<dyn Transformer>] {
        &self.transformers
    }

    /// Number of allowed elements.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
}

fn restricted_rules() -> PolicyBuilder {
    PolicyBuilder::new().elements(["b", "em", "i", "strong", "u"])
}

fn basic_rules() -> PolicyBuilder {
    PolicyBuilder::new()
        .elements([
            "a", "abbr", "b", "blockquote", "br", "cite", "code", "dd", "dfn", "dl", "dt", "em",
            "i", "kbd", "li", "mark", "ol", "p", "pre", "q", "s", "samp", "small", "strike",
            "strong", "sub", "sup", "time", "u", "ul", "var",
        ])
        .attributes("a", ["href"])
        .attributes("abbr", ["title"])
        .attributes("blockquote", ["cite"])
        .attributes("dfn", ["title"])
        .attributes("q", ["cite"])
        .attributes("time", ["datetime", "pubdate"])
        .add_attribute("a", "rel", "nofollow")
        .protocols("a", "href", ["ftp", "http", "https", "mailto", Protocol::RELATIVE])
        .protocols("blockquote", "cite", ["http", "https", Protocol::RELATIVE])
        .protocols("q", "cite", ["http", "https", Protocol::RELATIVE])
}

fn relaxed_rules() -> PolicyBuilder {
    PolicyBuilder::new()
        .elements([
            "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "col",
            "colgroup", "dd", "del", "dfn", "dl", "dt", "em", "figcaption", "figure", "h1",
            "h2", "h3", "h4", "h5", "h6", "hgroup", "i", "img", "ins", "kbd", "li", "mark",
            "ol", "p", "pre", "q", "rp", "rt", "ruby", "s", "samp", "small", "strike",
            "strong", "sub", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "time",
            "tr", "u", "ul", "var", "wbr",
        ])
        .attributes(ALL, ["dir", "lang", "title"])
        .attributes("a", ["href"])
        .attributes("blockquote", ["cite"])
        .attributes("col", ["span", "width"])
        .attributes("colgroup", ["span", "width"])
        .attributes("del", ["cite", "datetime"])
        .attributes("img", ["align", "alt", "height", "src", "width"])
        .attributes("ins", ["cite", "datetime"])
        .attributes("ol", ["start", "reversed", "type"])
        .attributes("q", ["cite"])
        .attributes("table", ["summary", "width"])
        .attributes("td", ["abbr", "axis", "colspan", "rowspan", "width"])
        .attributes("th", ["abbr", "axis", "colspan", "rowspan", "scope", "width"])
        .attributes("time", ["datetime", "pubdate"])
        .attributes("ul", ["type"])
        .protocols("a", "href", ["ftp", "http", "https", "mailto", Protocol::RELATIVE])
        .protocols("blockquote", "cite", ["http", "https", Protocol::RELATIVE])
        .protocols("del", "cite", ["http", "https", Protocol::RELATIVE])
        .protocols("img", "src", ["http", "https", Protocol::RELATIVE])
        .protocols("ins", "cite", ["http", "https", Protocol::RELATIVE])
        .protocols("q", "cite", ["http", "https", Protocol::RELATIVE])
}

impl Default for Policy {
    fn default() -> Self {
        Self::basic()
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut elements: Vec<&String> = self.elements.iter().collect();
        elements.sort();
        f.debug_struct("Policy")
            .field("elements", &elements)
            .field("attributes", &self.attributes)
            .field("add_attributes", &self.add_attributes)
            .field("protocols", &self.protocols)
            .field("remove_contents", &self.remove_contents)
            .field("allow_comments", &self.allow_comments)
            .field("entities_whitelist", &self.entities_whitelist)
            .field("transformers", &self.transformers.len())
            .finish()
    }
}
