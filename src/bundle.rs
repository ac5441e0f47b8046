//! Locating schema bundle files on disk
//!
//! Installed model packages name the bundle they were generated from; the
//! locator turns that name into a bundle file path. Files are searched as
//! `<bundle>.json` first, then as released snapshots `<bundle>@<version>.json`
//! with the newest version winning.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::entity::Entity;
use crate::error::{Result, YangBindError};
use crate::registry::ModelRegistry;
use crate::schema::RootSchema;

/// Environment variable holding a colon-separated bundle search path
pub const BUNDLE_PATH_VAR: &str = "YANGBIND_BUNDLE_PATH";

/// Bundle identity of one model object's owning package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDescriptor {
    /// Declared bundle name
    pub name: &'static str,
    /// Bundle file backing the schema
    pub location: PathBuf,
}

/// Resolve the bundle descriptor for a model object.
///
/// Identity comes from the object's type, never its runtime contents, so
/// every instance of a package's types resolves to the same descriptor.
pub fn resolve(
    registry: &ModelRegistry,
    locator: &BundleLocator,
    entity: &dyn Entity,
) -> Result<BundleDescriptor> {
    let id = entity.type_identity();
    let name = registry.bundle_of(id.package)?;
    let location = locator.resolve(name)?;
    Ok(BundleDescriptor { name, location })
}

/// Resolves bundle names to schema bundle files
#[derive(Debug, Clone)]
pub struct BundleLocator {
    search_paths: Vec<PathBuf>,
}

impl BundleLocator {
    /// Locator over an explicit list of directories
    pub fn with_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        BundleLocator {
            search_paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Locator configured from `YANGBIND_BUNDLE_PATH`, falling back to the
    /// current directory when the variable is unset
    pub fn from_env() -> Self {
        let paths = match std::env::var(BUNDLE_PATH_VAR) {
            Ok(raw) => raw
                .split(':')
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
                .collect(),
            Err(_) => vec![PathBuf::from(".")],
        };
        BundleLocator {
            search_paths: paths,
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the bundle file for a bundle name
    pub fn resolve(&self, bundle: &str) -> Result<PathBuf> {
        for dir in &self.search_paths {
            let exact = dir.join(format!("{}.json", bundle));
            if exact.is_file() {
                return Ok(exact);
            }
            if let Some(versioned) = newest_snapshot(dir, bundle) {
                return Ok(versioned);
            }
        }
        let searched = self
            .search_paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(YangBindError::Resolution(format!(
            "no bundle file for '{}' in [{}]",
            bundle, searched
        )))
    }

    /// Resolve and parse a bundle, verifying the file declares the
    /// requested bundle name
    pub fn load(&self, bundle: &str) -> Result<RootSchema> {
        let path = self.resolve(bundle)?;
        let schema = RootSchema::from_file(&path)?;
        if schema.bundle_name() != bundle {
            return Err(YangBindError::Resolution(format!(
                "bundle file '{}' declares '{}', expected '{}'",
                path.display(),
                schema.bundle_name(),
                bundle
            )));
        }
        debug!(
            bundle,
            version = schema.version(),
            path = %path.display(),
            "loaded schema bundle"
        );
        Ok(schema)
    }
}

/// Newest `<bundle>@<version>.json` in a directory
fn newest_snapshot(dir: &Path, bundle: &str) -> Option<PathBuf> {
    let prefix = format!("{}@", bundle);
    let entries = fs::read_dir(dir).ok()?;
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|p| {
            let version = p
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix(&prefix))
                .map(str::to_string)?;
            Some((version, p))
        })
        .max_by(|(a, _), (b, _)| compare_versions(a, b))
        .map(|(_, path)| path)
}

/// Dotted version order; segments compare numerically when both parse,
/// lexically otherwise, so `1.10.0` outranks `1.9.0`
fn compare_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(m), Ok(n)) => m.cmp(&n),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return Ordering::Equal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_bundle(dir: &Path, file: &str, bundle: &str) {
        let content = format!(
            r#"{{"bundle": "{}", "modules": [
                {{"name": "m", "namespace": "urn:m", "nodes": [
                    {{"name": "top", "kind": "container", "children": []}}
                ]}}
            ]}}"#,
            bundle
        );
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_resolves_exact_file() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "example.json", "example");

        let locator = BundleLocator::with_paths([dir.path()]);
        let path = locator.resolve("example").unwrap();
        assert_eq!(path, dir.path().join("example.json"));

        let schema = locator.load("example").unwrap();
        assert_eq!(schema.bundle_name(), "example");
    }

    #[test]
    fn test_prefers_newest_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "example@1.0.0.json", "example");
        write_bundle(dir.path(), "example@1.2.0.json", "example");
        write_bundle(dir.path(), "example@1.9.0.json", "example");
        write_bundle(dir.path(), "example@1.10.0.json", "example");

        let locator = BundleLocator::with_paths([dir.path()]);
        let path = locator.resolve("example").unwrap();
        assert_eq!(path, dir.path().join("example@1.10.0.json"));
    }

    #[test]
    fn test_version_order_is_component_wise() {
        assert!(compare_versions("1.10.0", "1.9.0").is_gt());
        assert!(compare_versions("1.2", "1.2.0").is_lt());
        assert!(compare_versions("1.2.0", "1.2.0").is_eq());
        assert!(compare_versions("2024-06-01", "2024-05-01").is_gt());
    }

    #[test]
    fn test_missing_bundle_lists_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let locator = BundleLocator::with_paths([dir.path()]);
        let err = locator.resolve("absent").unwrap_err();
        assert!(matches!(err, YangBindError::Resolution(_)));
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_rejects_mismatched_declaration() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "example.json", "other");

        let locator = BundleLocator::with_paths([dir.path()]);
        let err = locator.load("example").unwrap_err();
        assert!(err.to_string().contains("declares 'other'"));
    }

    #[test]
    fn test_search_order_is_first_hit() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_bundle(first.path(), "example.json", "example");
        write_bundle(second.path(), "example.json", "example");

        let locator = BundleLocator::with_paths([first.path(), second.path()]);
        assert_eq!(
            locator.resolve("example").unwrap(),
            first.path().join("example.json")
        );
    }

    mod descriptor {
        use super::*;
        use crate::entity::{Field, LeafValue, TypeIdentity};
        use crate::registry::{EntityRegistration, ModelPackage};
        use std::any::Any;

        #[derive(Debug, Default)]
        struct Top;

        impl Entity for Top {
            fn type_identity(&self) -> TypeIdentity {
                TypeIdentity {
                    package: "example-models",
                    module: "m",
                    namespace: "urn:m",
                    local_name: "top",
                }
            }

            fn fields(&self) -> Vec<Field<'_>> {
                Vec::new()
            }

            fn set_leaf(&mut self, name: &str, _value: LeafValue) -> Result<()> {
                Err(YangBindError::UnknownField(name.to_string()))
            }

            fn child_mut(&mut self, name: &str) -> Result<&mut dyn Entity> {
                Err(YangBindError::UnknownField(name.to_string()))
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }

        fn make_top() -> Box<dyn Entity> {
            Box::new(Top)
        }

        static REGS: [EntityRegistration; 1] = [EntityRegistration {
            module: "m",
            namespace: "urn:m",
            name: "top",
            factory: make_top,
        }];

        static PACKAGE: ModelPackage = ModelPackage {
            name: "example-models",
            bundle: "example",
            registrations: &REGS,
        };

        #[test]
        fn test_resolve_is_deterministic_per_type() {
            let dir = tempfile::tempdir().unwrap();
            write_bundle(dir.path(), "example.json", "example");

            let registry = ModelRegistry::new();
            registry.register(&PACKAGE).unwrap();
            let locator = BundleLocator::with_paths([dir.path()]);

            let a = resolve(&registry, &locator, &Top).unwrap();
            let b = resolve(&registry, &locator, &Top).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.name, "example");
            assert_eq!(a.location, dir.path().join("example.json"));
        }

        #[test]
        fn test_resolve_unregistered_package() {
            let registry = ModelRegistry::new();
            let locator = BundleLocator::with_paths([std::path::PathBuf::from(".")]);
            let err = resolve(&registry, &locator, &Top).unwrap_err();
            assert!(matches!(err, YangBindError::Resolution(_)));
        }
    }
}
