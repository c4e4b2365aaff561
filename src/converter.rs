//! Conversion pipeline shared by both directions.
//!
//! A direction describes itself through [`ConversionPlan`]: its validator,
//! mapping table, target skeleton and transformers. [`run_conversion`]
//! drives every plan through the same sequence of steps:
//!
//! 1. decode the source text (Critical on failure, aborts)
//! 2. validate the source and check its discriminator field (Critical on
//!    failure, aborts)
//! 3. build the target skeleton
//! 4. map fields in table order
//! 5. warn about source fields the table does not know
//! 6. fill defaults for composite fields still missing
//! 7. synthesize derived data
//! 8. encode the target (Error on failure, content becomes `{}`)
//!
//! Every plan gets a [`Converter`] implementation for free.

use crate::diagnostics::{ConversionError, ConversionResult, Diagnostics, Severity};
use crate::document::{self, Document, Object, kind_of};
use crate::errors::ConverterError;
use crate::mapping::{FieldMapping, FieldTransform, is_known};
use crate::transformers::{FragmentTransformer, PureTransform};
use crate::validation::SchemaValidator;
use crate::version_detection::SbomFormat;
use log::{debug, info};
use serde_json::Value;

/// Public contract of a converter, as used by the factory and hosts.
pub trait Converter: Send + Sync {
    fn source_format(&self) -> SbomFormat;

    fn target_format(&self) -> SbomFormat;

    /// Converts `text` into the target format.
    ///
    /// Returns `Err` only when a Critical condition stops the run. Every
    /// other problem is reported inside the returned result.
    fn convert(&self, text: &str) -> Result<ConversionResult, ConverterError>;
}

/// A [`FieldTransform`] resolved to the code that implements it.
pub enum Resolved<'a> {
    Pure(PureTransform),
    Fragment(&'a dyn FragmentTransformer),
}

/// Capabilities one conversion direction provides to the pipeline.
pub trait ConversionPlan: Send + Sync {
    /// Component name reported on pipeline-level errors.
    fn name(&self) -> &'static str;

    fn source(&self) -> SbomFormat;

    fn target(&self) -> SbomFormat;

    fn validator(&self) -> &dyn SchemaValidator;

    /// Required top-level fields of the target schema.
    fn target_required_fields(&self) -> &'static [&'static str];

    fn mappings(&self) -> &'static [FieldMapping];

    /// Scaffold of the target document before any field is mapped.
    fn initial_skeleton(&self, source: &Object) -> Object;

    fn resolve(&self, transform: FieldTransform) -> Resolved<'_>;

    /// Puts the transformer default in place of every composite target
    /// field that is still missing after mapping.
    fn default_fill(&self, target: &mut Object, _diagnostics: &mut Diagnostics) {
        for mapping in self.mappings() {
            let (Some(dst), Some(transform)) = (mapping.target_field, mapping.transform) else {
                continue;
            };
            if target.contains_key(dst) {
                continue;
            }
            if let Resolved::Fragment(transformer) = self.resolve(transform)
                && let Some(default) = transformer.default_fragment()
            {
                debug!("Filling default {} from {}", dst, transformer.name());
                target.insert(dst.to_string(), default);
            }
        }
    }

    /// Adds data derived from the source as a whole. No-op by default.
    fn synthesize(&self, _source: &Object, _target: &mut Object, _diagnostics: &mut Diagnostics) {}
}

impl<P: ConversionPlan> Converter for P {
    fn source_format(&self) -> SbomFormat {
        self.source()
    }

    fn target_format(&self) -> SbomFormat {
        self.target()
    }

    fn convert(&self, text: &str) -> Result<ConversionResult, ConverterError> {
        run_conversion(self, text)
    }
}

fn abort<P: ConversionPlan + ?Sized>(
    plan: &P,
    reason: String,
    diagnostics: Diagnostics,
) -> ConverterError {
    ConverterError::Aborted {
        source_format: plan.source(),
        target_format: plan.target(),
        reason,
        errors: diagnostics.into_errors(),
    }
}

/// Runs the full pipeline for `plan` over `text`.
pub fn run_conversion<P: ConversionPlan + ?Sized>(
    plan: &P,
    text: &str,
) -> Result<ConversionResult, ConverterError> {
    info!("Converting {} -> {}", plan.source(), plan.target());
    let mut diagnostics = Diagnostics::new();

    // --- 1. Decode ---
    let source: Document = match document::decode(text) {
        Ok(doc) => doc,
        Err(e) => {
            let reason = format!("Failed to decode {} input: {}", plan.source(), e);
            diagnostics.record(
                ConversionError::new(Severity::Critical, "Decoder", reason.clone())
                    .with_code("DECODE_FAILED")
                    .with_context("line", e.line())
                    .with_context("column", e.column())
                    .with_cause(e),
            );
            return Err(abort(plan, reason, diagnostics));
        }
    };

    // --- 2. Validate ---
    let validator = plan.validator();
    for message in validator.validate(&source) {
        diagnostics.record(
            ConversionError::new(Severity::Error, "SchemaValidator", message)
                .with_code("SCHEMA_VIOLATION")
                .with_context("format", plan.source().name()),
        );
    }
    if let Err(reason) = validator.check_discriminator(&source) {
        let field = validator.discriminator_field();
        diagnostics.record(
            ConversionError::new(Severity::Critical, "SchemaValidator", reason.clone())
                .with_code("INVALID_DISCRIMINATOR")
                .with_context("field", field)
                .with_context("value", source.get(field).cloned().unwrap_or(Value::Null)),
        );
        return Err(abort(plan, reason, diagnostics));
    }

    let Some(source) = source.as_object() else {
        let reason = format!(
            "{} document root is {} after validation",
            plan.source(),
            kind_of(&source)
        );
        diagnostics.record(
            ConversionError::new(Severity::Critical, plan.name(), reason.clone()).with_code("INTERNAL"),
        );
        return Err(abort(plan, reason, diagnostics));
    };

    // --- 3. Skeleton ---
    let mut target = plan.initial_skeleton(source);

    // --- 4. Map fields ---
    map_fields(plan, source, &mut target, &mut diagnostics);

    // --- 5. Unknown fields ---
    scan_unknown_fields(plan.source(), plan.mappings(), source, &mut diagnostics);

    // --- 6. Defaults ---
    plan.default_fill(&mut target, &mut diagnostics);

    // --- 7. Derived data ---
    plan.synthesize(source, &mut target, &mut diagnostics);

    // --- 8. Encode ---
    let content = match document::encode(&Value::Object(target)) {
        Ok(content) => content,
        Err(e) => {
            diagnostics.record(
                ConversionError::new(
                    Severity::Error,
                    "Encoder",
                    format!("Failed to encode {} output: {}", plan.target(), e),
                )
                .with_code("ENCODE_FAILED")
                .with_cause(e),
            );
            "{}".to_string()
        }
    };

    let result = ConversionResult::new(content, plan.target(), diagnostics);
    info!(
        "Conversion {} -> {} finished: success={}, {} warnings, {} errors",
        plan.source(),
        plan.target(),
        result.success(),
        result.warnings().len(),
        result.errors().len()
    );
    Ok(result)
}

/// Applies the plan's mapping table, in order, from `source` into `target`.
pub fn map_fields<P: ConversionPlan + ?Sized>(
    plan: &P,
    source: &Object,
    target: &mut Object,
    diagnostics: &mut Diagnostics,
) {
    let required = plan.target_required_fields();

    for mapping in plan.mappings() {
        let Some(value) = source.get(mapping.source_field) else {
            if let Some(dst) = mapping.target_field
                && required.contains(&dst)
            {
                diagnostics.warn(format!(
                    "Missing required field '{}' for target field '{}'",
                    mapping.source_field, dst
                ));
            }
            continue;
        };
        let Some(dst) = mapping.target_field else {
            debug!("Dropping {} field {}", plan.source(), mapping.source_field);
            continue;
        };

        let Some(transform) = mapping.transform else {
            debug!("Copying {} -> {}", mapping.source_field, dst);
            target.insert(dst.to_string(), value.clone());
            continue;
        };

        match plan.resolve(transform) {
            Resolved::Pure(rewrite) => {
                debug!("Rewriting {} -> {}", mapping.source_field, dst);
                target.insert(dst.to_string(), rewrite(value));
            }
            Resolved::Fragment(transformer) => {
                debug!(
                    "Transforming {} -> {} with {}",
                    mapping.source_field,
                    dst,
                    transformer.name()
                );
                match transformer.transform_in(value, source, diagnostics) {
                    Ok(mapped) => {
                        target.insert(dst.to_string(), mapped);
                    }
                    Err(e) => {
                        let mut err = ConversionError::new(
                            Severity::Error,
                            transformer.name(),
                            format!("Failed to transform '{}': {}", mapping.source_field, e),
                        )
                        .with_code("TRANSFORM_FAILED")
                        .with_context("field", mapping.source_field);
                        if let Some(records) = value.as_array() {
                            err = err.with_context("records", records.len());
                        }
                        diagnostics.record(err.with_cause(e));
                        target.shift_remove(dst);
                    }
                }
            }
        }
    }
}

/// One warning per top-level source key the mapping table does not list.
pub fn scan_unknown_fields(
    format: SbomFormat,
    mappings: &[FieldMapping],
    source: &Object,
    diagnostics: &mut Diagnostics,
) {
    for key in source.keys() {
        if !is_known(mappings, key) {
            diagnostics.warn(format!("Unknown or unmapped {} field: {}", format, key));
        }
    }
}
