//! Per-node transformer pipeline.
//!
//! Transformers run in pre-order, once per node, before the policy decides
//! whether that node survives. Every transformer in the policy runs on every
//! node; a later transformer sees the edits and renames made by earlier ones.
//!
//! Any `Fn(&mut Node) -> Result<TransformAction, TransformerError>` closure
//! that is `Send + Sync` is a transformer.

use std::error::Error as StdError;
use std::fmt;

use crate::dom::Node;

pub mod css;
pub mod legacy;

pub use css::CssSanitizer;
pub use legacy::{AlignToStyle, RenameElement};

/// What should happen to a node after a transformer has looked at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformAction {
    /// Leave the node to the policy (it may still have been edited in place)
    Continue,
    /// Rename the element before the policy sees it; ignored for text and
    /// comments
    Rename(String),
    /// Drop the element but keep its children
    Unwrap,
    /// Drop the node and everything under it
    Remove,
}

/// A failure inside a transformer. Aborts the whole clean call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformerError {
    message: String,
}

impl TransformerError {
    /// Creates an error with a human-readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message passed to [`new`](Self::new).
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransformerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for TransformerError {}

/// A pluggable tree rewrite.
///
/// Transformers are shared between threads through the policy, so they must
/// not rely on per-call mutable state.
pub trait Transformer: Send + Sync {
    /// Inspects (and may edit) one node.
    ///
    /// Children of an element are visited after the element itself, and only
    /// if the element is kept or unwrapped.
    fn transform(&self, node: &mut Node) -> Result<TransformAction, TransformerError>;
}

impl<F> Transformer for F
where
    F: Fn(&mut Node) -> Result<TransformAction, TransformerError> + Send + Sync,
{
    fn transform(&self, node: &mut Node) -> Result<TransformAction, TransformerError> {
        self(node)
    }
}
