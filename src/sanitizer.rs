use std::sync::Arc;

use crate::{Engine, Error, Policy, SafeHtml, Tainted};

/// Trait for turning tainted markup into [`SafeHtml`].
///
/// Implemented by [`Policy`] (cleans under that policy) and [`Engine`]
/// (cleans under whatever policy is active at call time). Code that accepts
/// untrusted markup can take `&impl Sanitizer` and stay agnostic of where
/// the policy comes from.
///
/// # Invariants
///
/// Implementations MUST:
/// - Only build `SafeHtml` from the output of the cleaning pass
/// - Never return the input unchanged without cleaning it
/// - Keep input text out of error messages
///
/// # Examples
///
/// ```
/// use sanitize_policy::{Engine, Policy, Sanitizer, Tainted};
///
/// fn render_comment(sanitizer: &impl Sanitizer, body: String) -> String {
///     match sanitizer.sanitize(Tainted::new(body)) {
///         Ok(html) => format!("<div class=\"comment\">{}</div>", html),
///         Err(_) => String::new(),
///     }
/// }
///
/// let body = "<i>nice</i> <img src=x onerror=alert(1)>".to_string();
/// assert_eq!(render_comment(&Policy::restricted(), body.clone()), "<div class=\"comment\"><i>nice</i> </div>");
/// assert_eq!(render_comment(&Engine::default(), body), "<div class=\"comment\"><i>nice</i> </div>");
/// ```
pub trait Sanitizer {
    /// Cleans tainted markup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransformerFailed`] if a transformer fails.
    fn sanitize(&self, input: Tainted<String>) -> Result<SafeHtml, Error>;
}

impl Sanitizer for Policy {
    fn sanitize(&self, input: Tainted<String>) -> Result<SafeHtml, Error> {
        self.clean(&input.into_inner())
    }
}

impl Sanitizer for Engine {
    fn sanitize(&self, input: Tainted<String>) -> Result<SafeHtml, Error> {
        self.clean(&input.into_inner())
    }
}

impl<S: Sanitizer + ?Sized> Sanitizer for Arc<S> {
    fn sanitize(&self, input: Tainted<String>) -> Result<SafeHtml, Error> {
        (**self).sanitize(input)
    }
}

impl<S: Sanitizer + ?Sized> Sanitizer for &S {
    fn sanitize(&self, input: Tainted<String>) -> Result<SafeHtml, Error> {
        (**self).sanitize(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{TransformAction, TransformerError};
    use crate::Node;

    #[test]
    fn policy_sanitizes_tainted_input() {
        let tainted = Tainted::new("<b>bold</b><script>x()</script>".to_string());
        let html = Policy::basic().sanitize(tainted).expect("clean");
        assert_eq!(html, "<b>bold</b>x()");
    }

    #[test]
    fn engine_sanitizes_with_active_policy() {
        let engine = Engine::default();
        engine.configure(Policy::builder().build().expect("valid"));

        let html = engine
            .sanitize(Tainted::new("<b>bold</b>".to_string()))
            .expect("clean");
        assert_eq!(html, "bold");
    }

    #[test]
    fn shared_policy_is_a_sanitizer() {
        let shared: Arc<Policy> = Arc::new(Policy::restricted());
        let html = shared
            .sanitize(Tainted::new("<u>x</u><a>y</a>".to_string()))
            .expect("clean");
        assert_eq!(html, "<u>x</u>y");
    }

    #[test]
    fn trait_objects_work() {
        let sanitizers: Vec<Box<dyn Sanitizer>> =
            vec![Box::new(Policy::restricted()), Box::new(Engine::default())];

        for sanitizer in &sanitizers {
            let html = sanitizer
                .sanitize(Tainted::new("<em>e</em>".to_string()))
                .expect("clean");
            assert_eq!(html, "<em>e</em>");
        }
    }

    #[test]
    fn absent_input_is_empty() {
        let html = Policy::basic()
            .sanitize(Tainted::from(None::<String>))
            .expect("clean");
        assert!(html.is_empty());
    }

    #[test]
    fn transformer_errors_propagate() {
        let policy = Policy::builder()
            .transformer(|_: &mut Node| Err::<TransformAction, _>(TransformerError::new("fail")))
            .build()
            .expect("valid");

        let err = policy
            .sanitize(Tainted::new("x".to_string()))
            .unwrap_err();
        assert!(err.is_transformer_failure());
        assert!(!err.to_string().contains('x'));
    }
}
