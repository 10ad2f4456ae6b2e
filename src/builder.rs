//! Validated construction of [`Policy`] values.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::dom::Attribute;
use crate::error::{ConfigError, ConfigErrorKind};
use crate::policy::{Policy, Protocol, ALL, DEFAULT_WHITESPACE_ELEMENTS};
use crate::transform::Transformer;

/// Builder for [`Policy`].
///
/// `PolicyBuilder` is the only way to construct a `Policy` from parts. Every
/// name is validated in [`build`](Self::build), so a policy that exists is a
/// policy that can be serialized safely.
///
/// Repeated calls accumulate: `elements(["a"]).elements(["b"])` allows both.
///
/// # Examples
///
/// ```
/// use sanitize_policy::{Node, PolicyBuilder, Protocol, TransformAction, TransformerError};
///
/// let policy = PolicyBuilder::new()
///     .elements(["a", "p"])
///     .attributes("a", ["href"])
///     .add_attribute("a", "target", "_blank")
///     .protocols("a", "href", ["http", "https", Protocol::RELATIVE])
///     .transformer(|node: &mut Node| -> Result<TransformAction, TransformerError> {
///         if node.name() == Some("div") {
///             return Ok(TransformAction::Rename("p".into()));
///         }
///         Ok(TransformAction::Continue)
///     })
///     .build()
///     .expect("policy is valid");
///
/// let html = policy.clean("<div><a href='/x'>x</a></div>").unwrap();
/// assert_eq!(html.as_str(), r#"<p><a href="/x" target="_blank">x</a></p>"#);
/// ```
#[derive(Clone)]
pub struct PolicyBuilder {
    elements: Vec<String>,
    attributes: Vec<(String, String)>,
    add_attributes: Vec<(String, Attribute)>,
    protocols: Vec<(String, String, Protocol)>,
    whitespace_elements: Vec<String>,
    remove_contents: Vec<String>,
    allow_comments: bool,
    entities_whitelist: Vec<(String, String)>,
    transformers: Vec<Arc<dyn Transformer>>,
}

impl PolicyBuilder {
    /// Creates a builder that allows nothing and uses the default
    /// whitespace elements.
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            attributes: Vec::new(),
            add_attributes: Vec::new(),
            protocols: Vec::new(),
            whitespace_elements: DEFAULT_WHITESPACE_ELEMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            remove_contents: Vec::new(),
            allow_comments: false,
            entities_whitelist: Vec::new(),
            transformers: Vec::new(),
        }
    }

    /// Allows the given elements (case-insensitive).
    pub fn elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements.extend(names.into_iter().map(Into::into));
        self
    }

    /// Allows `names` as attributes of `element`, or of every element when
    /// `element` is [`ALL`].
    pub fn attributes<I, S>(mut self, element: &str, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.attributes.push((element.to_string(), name.into()));
        }
        self
    }

    /// Forces `name="value"` onto every surviving `element`, overwriting any
    /// existing value.
    pub fn add_attribute(
        mut self,
        element: &str,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.add_attributes
            .push((element.to_string(), Attribute::new(name, value)));
        self
    }

    /// Restricts the URI schemes of `attribute` on `element` (or on every
    /// element, with [`ALL`]). Use [`Protocol::RELATIVE`] to allow
    /// scheme-less references.
    pub fn protocols<I, P>(mut self, element: &str, attribute: &str, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Protocol>,
    {
        for protocol in protocols {
            self.protocols
                .push((element.to_string(), attribute.to_string(), protocol.into()));
        }
        self
    }

    /// Replaces the set of elements padded with line boundaries when
    /// unwrapped.
    pub fn whitespace_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitespace_elements = names.into_iter().map(Into::into).collect();
        self
    }

    /// Disallowed elements in this set are dropped with all their content
    /// instead of being unwrapped.
    pub fn remove_contents<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_contents.extend(names.into_iter().map(Into::into));
        self
    }

    /// Keeps comments in the output.
    pub fn allow_comments(mut self, allow: bool) -> Self {
        self.allow_comments = allow;
        self
    }

    /// Replaces every occurrence of `entity` in the serialized output with
    /// `replacement`.
    ///
    /// This is a raw string substitution with no knowledge of markup:
    /// `entity("&lt;", "<")` reintroduces tags. Only whitelist entities whose
    /// decoded form is harmless text.
    pub fn entity(mut self, entity: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.entities_whitelist
            .push((entity.into(), replacement.into()));
        self
    }

    /// Appends a transformer to the pipeline.
    pub fn transformer<T>(mut self, transformer: T) -> Self
    where
        T: Transformer + 'static,
    {
        self.transformers.push(Arc::new(transformer));
        self
    }

    /// Appends an already shared transformer.
    pub fn shared_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Validates the configuration and builds the policy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for the first invalid element name,
    /// attribute name or protocol.
    pub fn build(self) -> Result<Policy, ConfigError> {
        self.validate()?;
        Ok(self.assemble())
    }

    /// Builds one of the hard-coded presets without re-validating them.
    pub(crate) fn build_preset(self) -> Policy {
        self.assemble()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for name in self
            .elements
            .iter()
            .chain(&self.whitespace_elements)
            .chain(&self.remove_contents)
        {
            element_name(name)?;
        }
        for (element, name) in &self.attributes {
            element_key(element)?;
            validate_attribute_name(name)?;
        }
        for (element, attr) in &self.add_attributes {
            element_name(element)?;
            validate_attribute_name(&attr.name)?;
        }
        for (element, attribute, protocol) in &self.protocols {
            element_key(element)?;
            validate_attribute_name(attribute)?;
            validate_protocol(protocol)?;
        }
        Ok(())
    }

    /// Assembles the policy from names that already passed validation.
    fn assemble(self) -> Policy {
        let lower = |name: &String| name.to_ascii_lowercase();

        let mut attributes: HashMap<String, HashSet<String>> = HashMap::new();
        for (element, name) in self.attributes {
            attributes
                .entry(element.to_ascii_lowercase())
                .or_default()
                .insert(name);
        }

        let mut add_attributes: HashMap<String, Vec<Attribute>> = HashMap::new();
        for (element, attr) in self.add_attributes {
            let attrs = add_attributes.entry(element.to_ascii_lowercase()).or_default();
            match attrs.iter_mut().find(|a| a.name == attr.name) {
                Some(existing) => existing.value = attr.value,
                None => attrs.push(attr),
            }
        }

        let mut protocols: HashMap<String, HashMap<String, HashSet<Protocol>>> = HashMap::new();
        for (element, attribute, protocol) in self.protocols {
            protocols
                .entry(element.to_ascii_lowercase())
                .or_default()
                .entry(attribute)
                .or_default()
                .insert(protocol);
        }

        Policy {
            elements: self.elements.iter().map(lower).collect(),
            attributes,
            add_attributes,
            protocols,
            whitespace_elements: self.whitespace_elements.iter().map(lower).collect(),
            remove_contents: self.remove_contents.iter().map(lower).collect(),
            allow_comments: self.allow_comments,
            entities_whitelist: self
                .entities_whitelist
                .into_iter()
                .filter(|(entity, _)| !entity.is_empty())
                .collect(),
            transformers: self.transformers,
        }
    }
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates and lowercases an element name.
fn element_name(name: &str) -> Result<String, ConfigError> {
    let lower = name.to_ascii_lowercase();
    let mut chars = lower.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(lower)
    } else {
        Err(ConfigError::new(
            ConfigErrorKind::InvalidElementName,
            format!("`{}` is not a valid element name", name),
        ))
    }
}

/// Like [`element_name`], but also accepts the [`ALL`] wildcard.
fn element_key(name: &str) -> Result<String, ConfigError> {
    if name.eq_ignore_ascii_case(ALL) {
        Ok(ALL.to_string())
    } else {
        element_name(name)
    }
}

fn validate_attribute_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name.chars().all(|c| {
            !c.is_whitespace()
                && !c.is_control()
                && !matches!(c, '"' | '\'' | '<' | '>' | '/' | '=' | '&')
        });
    if valid {
        Ok(())
    } else {
        Err(ConfigError::new(
            ConfigErrorKind::InvalidAttributeName,
            format!("`{}` is not a valid attribute name", name),
        ))
    }
}

fn validate_protocol(protocol: &Protocol) -> Result<(), ConfigError> {
    let Protocol::Scheme(scheme) = protocol else {
        return Ok(());
    };
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::new(
            ConfigErrorKind::InvalidProtocol,
            format!("`{}` is not a valid URI scheme", scheme),
        ))
    }
}
