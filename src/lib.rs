//! Allowlist HTML sanitization.
//!
//! This crate cleans untrusted HTML fragments against an explicit
//! [`Policy`]: anything the policy does not name is removed.
//!
//! - **Elements** not in the allowlist are unwrapped (their children stay) or,
//!   if listed under `remove_contents`, dropped with everything inside.
//! - **Attributes** must be allowed for their element (or for `all`).
//! - **URL attributes** can be restricted to a set of schemes, including
//!   relative references.
//! - **Transformers** run on every node before the policy, and may edit,
//!   rename, unwrap or remove it.
//!
//! Parsing never fails. Malformed markup is normalized, and the output is
//! always well-formed: cleaning already-clean output does not change it.
//!
//! # Core Types
//!
//! - [`Policy`]: immutable allowlist, built with [`PolicyBuilder`] or
//!   [`PolicyConfig`], or one of the presets
//! - [`Engine`]: a shared, atomically reconfigurable sanitizer
//! - [`Tainted<T>`]: wrapper for untrusted markup
//! - [`SafeHtml`]: cleaned markup, only obtainable through a [`Sanitizer`]
//! - [`Transformer`]: per-node rewrite hook
//!
//! # Examples
//!
//! ```
//! use sanitize_policy::{Engine, Policy, Protocol};
//!
//! let engine = Engine::default();
//! assert_eq!(
//!     engine.clean(r#"<b>hi</b><a href="javascript:alert(1)">x</a>"#).unwrap(),
//!     r#"<b>hi</b><a rel="nofollow">x</a>"#
//! );
//!
//! engine.configure(
//!     Policy::builder()
//!         .elements(["p", "a"])
//!         .attributes("a", ["href"])
//!         .protocols("a", "href", ["https", Protocol::RELATIVE])
//!         .remove_contents(["script"])
//!         .build()
//!         .expect("valid policy"),
//! );
//! assert_eq!(
//!     engine.clean("<p>ok<script>alert(1)</script></p>").unwrap(),
//!     "<p>ok</p>"
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod dom;
mod engine;
mod entities;
mod error;
mod fields;
mod filter;
mod parser;
mod policy;
mod report;
mod safe_html;
mod sanitizer;
mod serializer;
mod tainted;
pub mod transform;

#[cfg(test)]
mod test_utils;

pub use builder::PolicyBuilder;
pub use config::PolicyConfig;
pub use dom::{Attribute, Element, Fragment, Node};
pub use engine::Engine;
pub use error::{ConfigError, ConfigErrorKind, Error};
pub use fields::{CallbackPoint, FieldSanitizer};
pub use parser::MAX_DEPTH;
pub use policy::{Policy, Protocol, ALL, DEFAULT_WHITESPACE_ELEMENTS};
pub use report::{CleanReport, Removal};
pub use safe_html::SafeHtml;
pub use sanitizer::Sanitizer;
pub use tainted::Tainted;
pub use transform::{
    AlignToStyle, CssSanitizer, RenameElement, TransformAction, Transformer, TransformerError,
};
