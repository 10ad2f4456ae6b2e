//! Shared, reconfigurable sanitizer.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::PolicyConfig;
use crate::error::Error;
use crate::policy::Policy;
use crate::report::CleanReport;
use crate::safe_html::SafeHtml;

/// A sanitizer holding the active [`Policy`].
///
/// `Engine` is meant to be created once and shared (for example in a
/// `static` or an `Arc`). [`configure`](Self::configure) swaps the whole
/// policy atomically: a clean call that is already running keeps the policy
/// it started with, and every later call sees the new one. There is no
/// partial update.
///
/// # Examples
///
/// ```
/// use sanitize_policy::{Engine, Policy};
///
/// let engine = Engine::default();
/// assert_eq!(engine.clean("<b>ok</b><script>x</script>").unwrap(), "<b>ok</b>x");
///
/// engine.configure(Policy::builder().build().unwrap());
/// assert_eq!(engine.clean("<b>ok</b>").unwrap(), "ok");
/// ```
pub struct Engine {
    policy: RwLock<Arc<Policy>>,
}

impl Engine {
    /// Creates an engine with the given policy.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy: RwLock::new(Arc::new(policy)),
        }
    }

    /// Replaces the active policy.
    pub fn configure(&self, policy: Policy) {
        tracing::debug!(
            elements = policy.element_count(),
            transformers = policy.transformers().len(),
            allow_comments = policy.allows_comments(),
            "sanitizer policy replaced"
        );
        *self.policy.write() = Arc::new(policy);
    }

    /// Builds a policy from `config` and makes it active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid. The active
    /// policy is left unchanged in that case.
    pub fn configure_from(&self, config: PolicyConfig) -> Result<(), Error> {
        let policy = config.into_policy().map_err(|e| {
            tracing::warn!(error = %e, "rejected sanitizer configuration");
            Error::from(e)
        })?;
        self.configure(policy);
        Ok(())
    }

    /// Parses a JSON configuration and makes it active.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the JSON is malformed, names an unknown
    /// option or describes an invalid policy.
    pub fn configure_json(&self, json: &str) -> Result<(), Error> {
        let config = PolicyConfig::from_json(json).map_err(|e| {
            tracing::warn!(error = %e, "rejected sanitizer configuration");
            Error::from(e)
        })?;
        self.configure_from(config)
    }

    /// A snapshot of the active policy.
    pub fn policy(&self) -> Arc<Policy> {
        Arc::clone(&self.policy.read())
    }

    /// Cleans `input` under the active policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransformerFailed`] if a transformer fails.
    pub fn clean(&self, input: &str) -> Result<SafeHtml, Error> {
        self.policy().clean(input)
    }

    /// Like [`clean`](Self::clean), with `None` treated as empty input.
    pub fn clean_optional(&self, input: Option<&str>) -> Result<SafeHtml, Error> {
        match input {
            Some(input) => self.clean(input),
            None => Ok(SafeHtml::default()),
        }
    }

    /// Cleans `input` and reports what was removed.
    pub fn clean_with_report(&self, input: &str) -> Result<(SafeHtml, CleanReport), Error> {
        self.policy().clean_with_report(input)
    }

    /// Replaces the contents of `buffer` with its cleaned form.
    ///
    /// # Errors
    ///
    /// On error `buffer` is left untouched.
    pub fn clean_in_place(&self, buffer: &mut String) -> Result<(), Error> {
        let clean = self.clean(buffer)?;
        *buffer = clean.into_string();
        Ok(())
    }
}

impl Default for Engine {
    /// An engine with [`Policy::basic`].
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("policy", &*self.policy.read())
            .finish()
    }
}
