//! Transformers that rewrite legacy presentational markup.

use crate::dom::Node;
use crate::transform::{TransformAction, Transformer, TransformerError};

/// Renames every `from` element to `to`, e.g. `div` to `p` or `font` to
/// `span`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameElement {
    from: String,
    to: String,
}

impl RenameElement {
    /// Creates the transformer. Both names are lowercased.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into().to_ascii_lowercase(),
            to: to.into().to_ascii_lowercase(),
        }
    }
}

impl Transformer for RenameElement {
    fn transform(&self, node: &mut Node) -> Result<TransformAction, TransformerError> {
        if node.name() == Some(self.from.as_str()) {
            return Ok(TransformAction::Rename(self.to.clone()));
        }
        Ok(TransformAction::Continue)
    }
}

/// Rewrites `align="..."` into `style="text-align: ...;"`.
///
/// Only `left`, `center`, `right` and `justify` are converted. The `align`
/// attribute itself is left for the policy to keep or drop. An existing
/// `style` is replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignToStyle;

const ALIGNMENTS: &[&str] = &["left", "center", "right", "justify"];

impl Transformer for AlignToStyle {
    fn transform(&self, node: &mut Node) -> Result<TransformAction, TransformerError> {
        let Some(element) = node.as_element_mut() else {
            return Ok(TransformAction::Continue);
        };
        let align = match element.attr("align") {
            Some(value) => value.trim().to_ascii_lowercase(),
            None => return Ok(TransformAction::Continue),
        };
        if ALIGNMENTS.contains(&align.as_str()) {
            element.set_attr("style", format!("text-align: {};", align));
        }
        Ok(TransformAction::Continue)
    }
}
