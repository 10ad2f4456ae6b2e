use std::fmt;

/// A wrapper for untrusted markup that must be cleaned before use.
///
/// `Tainted<T>` marks data from untrusted sources (form fields, API payloads,
/// stored user content) so it cannot be rendered by accident. The only way to
/// get at the value is through a [`Sanitizer`](crate::Sanitizer), which hands
/// back [`SafeHtml`](crate::SafeHtml).
///
/// # Security Properties
///
/// - Does NOT implement `Deref` or any implicit conversion traits
/// - Inner value is inaccessible outside this crate
///
/// # Examples
///
/// ```
/// use sanitize_policy::{Policy, Sanitizer, Tainted};
///
/// let comment = Tainted::new("<b>hi</b><script>steal()</script>".to_string());
/// let safe = Policy::basic().sanitize(comment).expect("no transformers configured");
///
/// assert_eq!(safe.as_str(), "<b>hi</b>steal()");
/// ```
// Clone is needed so the same input can be cleaned under several policies.
#[derive(Clone)]
pub struct Tainted<T> {
    // Must stay private: a public field would let markup skip the sanitizer.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the inner value for cleaning.
    ///
    /// Only sanitizer implementations inside the crate call this.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

// No Deref, AsRef, Borrow, From<T> or Into<T>: any of them would let tainted
// markup reach a renderer without being cleaned.

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}

impl From<Option<String>> for Tainted<String> {
    /// Absent input becomes an empty document.
    fn from(value: Option<String>) -> Self {
        Self::new(value.unwrap_or_default())
    }
}
