//! Resolves and caches converters by direction.

use crate::converter::Converter;
use crate::converter_cdx_to_spdx::CdxToSpdxConverter;
use crate::converter_spdx_to_cdx::SpdxToCdxConverter;
use crate::errors::ConverterError;
use crate::transformers::{
    ComponentsToPackages, CreationInfoToMetadata, DependenciesToRelationships, HashTransformer,
    LicenseTransformer, MetadataToCreationInfo, PackagesToComponents, RelationshipsToDependencies,
};
use crate::version_detection::{SbomFormat, detect_format_from_text};
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Defines the conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionDirection {
    /// Convert from CycloneDX to SPDX 2.x
    CdxToSpdx,
    /// Convert from SPDX 2.x to CycloneDX
    SpdxToCdx,
}

impl ConversionDirection {
    pub fn from_formats(source: SbomFormat, target: SbomFormat) -> Option<Self> {
        match (source, target) {
            (SbomFormat::CycloneDx, SbomFormat::Spdx) => Some(Self::CdxToSpdx),
            (SbomFormat::Spdx, SbomFormat::CycloneDx) => Some(Self::SpdxToCdx),
            _ => None,
        }
    }

    pub fn source(self) -> SbomFormat {
        match self {
            Self::CdxToSpdx => SbomFormat::CycloneDx,
            Self::SpdxToCdx => SbomFormat::Spdx,
        }
    }

    pub fn target(self) -> SbomFormat {
        match self {
            Self::CdxToSpdx => SbomFormat::Spdx,
            Self::SpdxToCdx => SbomFormat::CycloneDx,
        }
    }
}

static GLOBAL_FACTORY: Lazy<ConverterFactory> = Lazy::new(ConverterFactory::new);

/// Hands out one shared converter instance per direction.
#[derive(Default)]
pub struct ConverterFactory {
    cache: Mutex<HashMap<ConversionDirection, Arc<dyn Converter>>>,
}

impl ConverterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide factory.
    pub fn global() -> &'static ConverterFactory {
        &GLOBAL_FACTORY
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConversionDirection, Arc<dyn Converter>>> {
        // Cached converters are immutable, so a poisoned map is still usable.
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn build(direction: ConversionDirection) -> Arc<dyn Converter> {
        let licenses = LicenseTransformer::new();
        let hashes = HashTransformer::new();
        match direction {
            ConversionDirection::SpdxToCdx => Arc::new(SpdxToCdxConverter::new(
                CreationInfoToMetadata::new(),
                PackagesToComponents::new(licenses, hashes),
                RelationshipsToDependencies::new(),
            )),
            ConversionDirection::CdxToSpdx => Arc::new(CdxToSpdxConverter::new(
                MetadataToCreationInfo::new(),
                ComponentsToPackages::new(licenses, hashes),
                DependenciesToRelationships::new(),
            )),
        }
    }

    pub fn create_converter(
        &self,
        source: SbomFormat,
        target: SbomFormat,
    ) -> Result<Arc<dyn Converter>, ConverterError> {
        let direction = ConversionDirection::from_formats(source, target).ok_or_else(|| {
            ConverterError::UnsupportedConversion(format!(
                "No converter registered for {} -> {}",
                source, target
            ))
        })?;

        let mut cache = self.lock();
        let converter = cache.entry(direction).or_insert_with(|| {
            debug!("Creating converter for {:?}", direction);
            Self::build(direction)
        });
        Ok(Arc::clone(converter))
    }

    /// Detects the source format of `text`, then resolves the converter to
    /// `target`.
    pub fn create_converter_from_text(
        &self,
        text: &str,
        target: SbomFormat,
    ) -> Result<Arc<dyn Converter>, ConverterError> {
        let source = detect_format_from_text(text).ok_or_else(|| {
            ConverterError::Validation("Unable to detect SBOM format of input".to_string())
        })?;
        if source == target {
            return Err(ConverterError::InvalidArgument(format!(
                "Input is already {}, nothing to convert",
                target
            )));
        }
        self.create_converter(source, target)
    }

    /// Drops every cached converter.
    pub fn reset(&self) {
        self.lock().clear();
    }

    pub fn cached_count(&self) -> usize {
        self.lock().len()
    }
}
