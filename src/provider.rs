//! Codec provider: wire format selection plus schema bundle caching
//!
//! A [`CodecProvider`] pairs the chosen [`EncodingFormat`] with lazily
//! loaded schema bundles. Each bundle file is parsed once and shared
//! behind an `Arc`, so repeated encode and decode calls against the same
//! bundle never re-read the file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::bundle::BundleLocator;
use crate::codec::EncodingFormat;
use crate::error::{Result, YangBindError};
use crate::schema::RootSchema;

/// Provider backing a codec service with format and schema context.
///
/// Safe to share across threads behind an `Arc`; the schema cache is
/// guarded internally.
#[derive(Debug)]
pub struct CodecProvider {
    format: EncodingFormat,
    locator: BundleLocator,
    schemas: RwLock<HashMap<String, Arc<RootSchema>>>,
}

impl CodecProvider {
    /// Provider using the bundle search path from the environment
    pub fn new(format: EncodingFormat) -> Self {
        Self::with_locator(format, BundleLocator::from_env())
    }

    /// Provider over an explicit bundle locator
    pub fn with_locator(format: EncodingFormat, locator: BundleLocator) -> Self {
        CodecProvider {
            format,
            locator,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Wire format this provider encodes to and decodes from
    pub fn format(&self) -> EncodingFormat {
        self.format
    }

    /// Load a bundle from an explicit file and cache it under its name.
    ///
    /// Idempotent: a bundle that is already cached stays as loaded. The
    /// file must declare the given bundle name.
    pub fn initialize<P: AsRef<Path>>(&self, bundle: &str, location: P) -> Result<()> {
        {
            let cache = self.schemas.read().unwrap_or_else(|e| e.into_inner());
            if cache.contains_key(bundle) {
                return Ok(());
            }
        }

        let schema = RootSchema::from_file(location.as_ref())?;
        if schema.bundle_name() != bundle {
            return Err(YangBindError::Resolution(format!(
                "bundle file '{}' declares '{}', expected '{}'",
                location.as_ref().display(),
                schema.bundle_name(),
                bundle
            )));
        }

        let mut cache = self.schemas.write().unwrap_or_else(|e| e.into_inner());
        cache.entry(bundle.to_string()).or_insert_with(|| {
            debug!(bundle, location = %location.as_ref().display(), "cached schema bundle");
            Arc::new(schema)
        });
        Ok(())
    }

    /// Schema for a bundle, consulting the cache first and falling back
    /// to the locator's search path
    pub fn root_schema(&self, bundle: &str) -> Result<Arc<RootSchema>> {
        {
            let cache = self.schemas.read().unwrap_or_else(|e| e.into_inner());
            if let Some(schema) = cache.get(bundle) {
                return Ok(Arc::clone(schema));
            }
        }

        let loaded = Arc::new(self.locator.load(bundle)?);
        let mut cache = self.schemas.write().unwrap_or_else(|e| e.into_inner());
        // A racing loader may have beaten us; keep the first one
        let schema = cache
            .entry(bundle.to_string())
            .or_insert_with(|| {
                debug!(bundle, "cached schema bundle");
                loaded
            });
        Ok(Arc::clone(schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::YangBindError;
    use std::fs;

    const SAMPLE_BUNDLE: &str = r#"{
        "bundle": "demo",
        "modules": [
            {"name": "demo", "namespace": "urn:demo", "nodes": [
                {"name": "greeting", "kind": "container", "children": [
                    {"name": "author", "kind": "leaf", "type": "string"}
                ]}
            ]}
        ]
    }"#;

    fn provider_with_bundle() -> (tempfile::TempDir, CodecProvider) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("demo.json"), SAMPLE_BUNDLE).unwrap();
        let locator = BundleLocator::with_paths([dir.path()]);
        let provider = CodecProvider::with_locator(EncodingFormat::Json, locator);
        (dir, provider)
    }

    #[test]
    fn test_schema_is_loaded_once() {
        let (_dir, provider) = provider_with_bundle();
        let first = provider.root_schema("demo").unwrap();
        let second = provider.root_schema("demo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.bundle_name(), "demo");
    }

    #[test]
    fn test_initialize_preloads() {
        let (dir, provider) = provider_with_bundle();
        let path = dir.path().join("demo.json");
        provider.initialize("demo", &path).unwrap();
        // Even with the file gone, the cached schema keeps serving
        fs::remove_file(&path).unwrap();
        assert!(provider.root_schema("demo").is_ok());
        // Re-initializing a cached bundle is a no-op, even from a bad path
        provider.initialize("demo", dir.path().join("gone.json")).unwrap();
    }

    #[test]
    fn test_initialize_rejects_mismatched_declaration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.json");
        fs::write(&path, SAMPLE_BUNDLE).unwrap();

        let locator = BundleLocator::with_paths([dir.path()]);
        let provider = CodecProvider::with_locator(EncodingFormat::Xml, locator);
        let err = provider.initialize("other", &path).unwrap_err();
        assert!(matches!(err, YangBindError::Resolution(_)));
    }

    #[test]
    fn test_unknown_bundle_is_resolution_error() {
        let (_dir, provider) = provider_with_bundle();
        let err = provider.root_schema("absent").unwrap_err();
        assert!(matches!(err, YangBindError::Resolution(_)));
    }

    #[test]
    fn test_format_accessor() {
        let (_dir, provider) = provider_with_bundle();
        assert_eq!(provider.format(), EncodingFormat::Json);
    }
}
