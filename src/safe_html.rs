use std::fmt;

/// Markup that has been cleaned under a [`Policy`](crate::Policy) and may be
/// rendered without further escaping.
///
/// # Construction Invariants
///
/// `SafeHtml` cannot be constructed by external code. There is no public
/// constructor and no `From<String>`; the only producers are
/// [`Policy::clean`](crate::Policy::clean) and [`Engine`](crate::Engine).
///
/// # Access
///
/// - [`as_str`](Self::as_str) / [`AsRef<str>`] / [`Display`](fmt::Display)
/// - [`into_string`](Self::into_string) to consume it
///
/// # Examples
///
/// ```compile_fail
/// use sanitize_policy::SafeHtml;
///
/// // This will not compile - no public constructor:
/// let html = SafeHtml::new("<script></script>".to_string());
/// ```
///
/// ```
/// use sanitize_policy::Engine;
///
/// let engine = Engine::default();
/// let html = engine.clean("<em>ok</em>").expect("clean");
///
/// assert_eq!(html.as_str(), "<em>ok</em>");
/// assert_eq!(format!("{}", html), "<em>ok</em>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeHtml {
    inner: String,
}

impl SafeHtml {
    /// Wraps already-cleaned markup.
    ///
    /// Only the serializer output of a clean pass may be passed here.
    pub(crate) fn new_unchecked(value: String) -> Self {
        Self { inner: value }
    }

    /// Borrows the cleaned markup.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns `true` if cleaning produced no output.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Consumes the wrapper and returns the markup.
    pub fn into_string(self) -> String {
        self.inner
    }
}

impl AsRef<str> for SafeHtml {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl PartialEq<str> for SafeHtml {
    fn eq(&self, other: &str) -> bool {
        self.inner == other
    }
}

impl PartialEq<&str> for SafeHtml {
    fn eq(&self, other: &&str) -> bool {
        self.inner == *other
    }
}
