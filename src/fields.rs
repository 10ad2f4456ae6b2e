//! Declarative cleaning of record fields.
//!
//! A [`FieldSanitizer`] names the text fields of a record type that must be
//! cleaned before the record is persisted, and the lifecycle point at which
//! that happens. Persistence layers call [`FieldSanitizer::apply`] from the
//! matching hook.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigErrorKind, Error};
use crate::sanitizer::Sanitizer;
use crate::tainted::Tainted;

/// When field cleaning runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CallbackPoint {
    /// Before every save (create and update)
    #[default]
    Save,
    /// Only before the first save
    Create,
}

impl CallbackPoint {
    /// Name of the persistence hook this point maps to.
    pub fn hook_name(&self) -> &'static str {
        match self {
            CallbackPoint::Save => "before_save",
            CallbackPoint::Create => "before_create",
        }
    }
}

impl fmt::Display for CallbackPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackPoint::Save => write!(f, "save"),
            CallbackPoint::Create => write!(f, "create"),
        }
    }
}

impl FromStr for CallbackPoint {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "save" => Ok(CallbackPoint::Save),
            "create" => Ok(CallbackPoint::Create),
            other => Err(ConfigError::new(
                ConfigErrorKind::InvalidCallbackPoint,
                format!("`{}` is not a callback point (expected `save` or `create`)", other),
            )),
        }
    }
}

type Getter<T> = Box<dyn Fn(&T) -> Option<&str> + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, String) + Send + Sync>;

struct Field<T> {
    name: String,
    get: Getter<T>,
    set: Setter<T>,
}

/// Cleans a fixed set of text fields on records of type `T`.
///
/// # Examples
///
/// ```
/// use sanitize_policy::{CallbackPoint, Engine, FieldSanitizer};
///
/// struct Post {
///     title: Option<String>,
///     body: Option<String>,
/// }
///
/// let fields = FieldSanitizer::new()
///     .field("title", |p: &Post| p.title.as_deref(), |p, v| p.title = Some(v))
///     .field("body", |p: &Post| p.body.as_deref(), |p, v| p.body = Some(v))
///     .on(CallbackPoint::Create);
///
/// assert_eq!(fields.name(), "sanitize_title_body");
/// assert_eq!(fields.point().hook_name(), "before_create");
///
/// let mut post = Post {
///     title: Some("<b>hi</b><script>x</script>".into()),
///     body: None,
/// };
/// let changed = fields.apply(&Engine::default(), &mut post).unwrap();
///
/// assert_eq!(changed, 1);
/// assert_eq!(post.title.as_deref(), Some("<b>hi</b>x"));
/// assert_eq!(post.body, None);
/// ```
pub struct FieldSanitizer<T> {
    fields: Vec<Field<T>>,
    point: CallbackPoint,
}

impl<T> FieldSanitizer<T> {
    /// Creates an empty field list that runs on [`CallbackPoint::Save`].
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            point: CallbackPoint::default(),
        }
    }

    /// Adds a field with its accessor pair.
    ///
    /// `get` returns `None` for an absent value; absent and blank values are
    /// never rewritten.
    pub fn field<G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        G: Fn(&T) -> Option<&str> + Send + Sync + 'static,
        S: Fn(&mut T, String) + Send + Sync + 'static,
    {
        self.fields.push(Field {
            name: name.into(),
            get: Box::new(get),
            set: Box::new(set),
        });
        self
    }

    /// Sets the lifecycle point.
    pub fn on(mut self, point: CallbackPoint) -> Self {
        self.point = point;
        self
    }

    /// The lifecycle point cleaning is bound to.
    pub fn point(&self) -> CallbackPoint {
        self.point
    }

    /// Registered field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Name of the generated hook: `sanitize_` followed by the field names
    /// joined with `_`.
    pub fn name(&self) -> String {
        let mut name = String::from("sanitize");
        for field in &self.fields {
            name.push('_');
            name.push_str(&field.name);
        }
        name
    }

    /// Cleans every non-blank field of `record` and writes the result back.
    ///
    /// Returns the number of fields rewritten.
    ///
    /// # Errors
    ///
    /// Stops at the first field whose cleaning fails. Fields before it have
    /// already been rewritten.
    pub fn apply<S>(&self, sanitizer: &S, record: &mut T) -> Result<usize, Error>
    where
        S: Sanitizer + ?Sized,
    {
        let mut changed = 0;
        for field in &self.fields {
            let value = match (field.get)(record) {
                Some(value) if !value.trim().is_empty() => value.to_string(),
                _ => continue,
            };
            let clean = sanitizer.sanitize(Tainted::new(value))?;
            (field.set)(record, clean.into_string());
            changed += 1;
        }
        tracing::debug!(hook = %self.name(), point = %self.point, changed, "fields cleaned");
        Ok(changed)
    }
}

impl<T> Default for FieldSanitizer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FieldSanitizer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSanitizer")
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .field("point", &self.point)
            .finish()
    }
}
