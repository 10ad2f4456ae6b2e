//! Declarative policy configuration.
//!
//! [`PolicyConfig`] is the serde form of a policy, suitable for JSON or any
//! other format with a serde deserializer. Unknown keys are rejected.
//!
//! ```
//! use sanitize_policy::PolicyConfig;
//!
//! let policy = PolicyConfig::from_json(r#"{
//!     "elements": ["a", "p"],
//!     "attributes": { "a": ["href", "title"] },
//!     "add_attributes": { "a": { "rel": "nofollow" } },
//!     "protocols": { "a": { "href": ["http", "https", "relative"] } },
//!     "remove_contents": ["script"]
//! }"#)
//! .and_then(PolicyConfig::into_policy)
//! .expect("valid configuration");
//!
//! assert_eq!(
//!     policy.clean("<p><a href='/x'>x</a><script>y</script></p>").unwrap().as_str(),
//!     r#"<p><a href="/x" rel="nofollow">x</a></p>"#
//! );
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::builder::PolicyBuilder;
use crate::error::{ConfigError, ConfigErrorKind};
use crate::policy::Policy;

/// Serializable description of a [`Policy`].
///
/// Every field is optional and defaults to "nothing allowed". Map-valued
/// fields are applied in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Allowed element names
    pub elements: Vec<String>,
    /// Allowed attributes per element, or for every element under `"all"`
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Attributes forced onto elements: element -> name -> value
    pub add_attributes: BTreeMap<String, BTreeMap<String, String>>,
    /// Allowed URI schemes: element -> attribute -> schemes; `"relative"`
    /// allows scheme-less references
    pub protocols: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    /// Elements padded with line breaks when unwrapped; `None` keeps the
    /// default set
    pub whitespace_elements: Option<Vec<String>>,
    /// Disallowed elements dropped together with their content
    pub remove_contents: Vec<String>,
    /// Keep comments
    pub allow_comments: bool,
    /// Output substitutions: entity -> replacement
    pub entities_whitelist: BTreeMap<String, String>,
}

impl PolicyConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigErrorKind::UnknownOption`] for unrecognized keys and
    /// [`ConfigErrorKind::Malformed`] for anything else serde rejects.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| {
            let message = e.to_string();
            let kind = if message.starts_with("unknown field") {
                ConfigErrorKind::UnknownOption
            } else {
                ConfigErrorKind::Malformed
            };
            ConfigError::new(kind, message)
        })
    }

    /// Converts the configuration into a builder, so transformers can be
    /// added before building.
    pub fn into_builder(self) -> PolicyBuilder {
        let mut builder = PolicyBuilder::new()
            .elements(self.elements)
            .remove_contents(self.remove_contents)
            .allow_comments(self.allow_comments);

        for (element, names) in self.attributes {
            builder = builder.attributes(&element, names);
        }
        for (element, attrs) in self.add_attributes {
            for (name, value) in attrs {
                builder = builder.add_attribute(&element, name, value);
            }
        }
        for (element, attrs) in self.protocols {
            for (attribute, protocols) in attrs {
                builder = builder.protocols(&element, &attribute, protocols);
            }
        }
        if let Some(names) = self.whitespace_elements {
            builder = builder.whitespace_elements(names);
        }
        for (entity, replacement) in self.entities_whitelist {
            builder = builder.entity(entity, replacement);
        }
        builder
    }

    /// Validates the configuration and builds the policy.
    ///
    /// # Errors
    ///
    /// See [`PolicyBuilder::build`].
    pub fn into_policy(self) -> Result<Policy, ConfigError> {
        self.into_builder().build()
    }
}

impl TryFrom<PolicyConfig> for Policy {
    type Error = ConfigError;

    fn try_from(config: PolicyConfig) -> Result<Self, Self::Error> {
        config.into_policy()
    }
}
