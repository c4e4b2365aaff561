//! Field transformers for the categories that need more than a copy.
//!
//! Scalar fields go through pure `fn(&Value) -> Value` rewrites. Composite
//! fields go through a [`FragmentTransformer`], which may record warnings
//! and non-fatal errors while it works and fails with a [`TransformError`]
//! only when the fragment has the wrong overall shape.

pub mod hash;
pub mod identifier;
pub mod license;
pub mod metadata;
pub mod package;
pub mod relationship;

use crate::diagnostics::Diagnostics;
use crate::document::{Object, kind_of};
use crate::errors::TransformError;
use serde_json::Value;

pub use hash::HashTransformer;
pub use identifier::{IdentifierTransformer, SpdxIdMap, VersionTransformer};
pub use license::LicenseTransformer;
pub use metadata::{CreationInfoToMetadata, MetadataToCreationInfo};
pub use package::{ComponentsToPackages, PackagesToComponents};
pub use relationship::{DependenciesToRelationships, RelationshipsToDependencies};

/// Pure scalar rewrite.
pub type PureTransform = fn(&Value) -> Value;

pub trait FragmentTransformer: Send + Sync {
    /// Reported as the `component` of errors raised by this transformer.
    fn name(&self) -> &'static str;

    fn transform(
        &self,
        fragment: &Value,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError>;

    /// Called by the pipeline with the whole source document at hand, for
    /// transforms whose output must agree with other fields of the same
    /// document.
    fn transform_in(
        &self,
        fragment: &Value,
        _source: &Object,
        diagnostics: &mut Diagnostics,
    ) -> Result<Value, TransformError> {
        self.transform(fragment, diagnostics)
    }

    /// Value used when the source has no fragment at all. `None` when the
    /// target field may simply stay absent.
    fn default_fragment(&self) -> Option<Value> {
        None
    }
}

pub(crate) fn expect_array(fragment: &Value) -> Result<&Vec<Value>, TransformError> {
    fragment.as_array().ok_or(TransformError::UnexpectedShape {
        expected: "an array",
        found: kind_of(fragment),
    })
}

pub(crate) fn expect_object(fragment: &Value) -> Result<&Object, TransformError> {
    fragment.as_object().ok_or(TransformError::UnexpectedShape {
        expected: "an object",
        found: kind_of(fragment),
    })
}

/// SPDX placeholders that mean "no value".
pub(crate) fn is_no_assertion(value: &str) -> bool {
    matches!(value.trim(), "" | "NOASSERTION" | "NONE")
}
