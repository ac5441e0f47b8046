//! Model package registration and top-level entity lookup
//!
//! Generated bindings ship one [`ModelPackage`] per released bundle: a
//! static table naming every top-level container the package can decode,
//! each with a factory that builds an empty instance. The registry indexes
//! every entry under both its namespace URI and its module name, so the
//! identity sniffed from an XML payload and the one sniffed from a JSON
//! payload resolve to the same registration.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use tracing::debug;

use crate::entity::Entity;
use crate::error::{Result, YangBindError};

/// Builds an empty instance of one registered model type
pub type EntityFactory = fn() -> Box<dyn Entity>;

/// One top-level container a model package can decode
#[derive(Debug, Clone, Copy)]
pub struct EntityRegistration {
    /// YANG module defining the container
    pub module: &'static str,
    /// Namespace URI of that module
    pub namespace: &'static str,
    /// Local name of the container
    pub name: &'static str,
    pub factory: EntityFactory,
}

/// Static registration table of one installed model package
#[derive(Debug, Clone, Copy)]
pub struct ModelPackage {
    /// Package name, as carried by [`TypeIdentity`](crate::TypeIdentity)
    pub name: &'static str,
    /// Schema bundle the package was generated from
    pub bundle: &'static str,
    pub registrations: &'static [EntityRegistration],
}

/// A lookup hit: the factory plus everything known about the registration
#[derive(Debug, Clone, Copy)]
pub struct ResolvedEntity {
    pub package: &'static str,
    pub bundle: &'static str,
    pub module: &'static str,
    pub namespace: &'static str,
    pub name: &'static str,
    pub factory: EntityFactory,
}

#[derive(Debug, Default)]
struct Inner {
    /// Package name to bundle name
    packages: HashMap<&'static str, &'static str>,
    /// (namespace or module, local name) to registration
    entities: HashMap<(String, String), ResolvedEntity>,
}

/// Thread-safe index of every registered model package
#[derive(Debug, Default)]
pub struct ModelRegistry {
    inner: RwLock<Inner>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        ModelRegistry::default()
    }

    /// Process-wide registry shared by default-constructed codec services
    pub fn global() -> Arc<ModelRegistry> {
        static GLOBAL: OnceLock<Arc<ModelRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ModelRegistry::new())))
    }

    /// Register a model package.
    ///
    /// Registering the same package again is a no-op. A different package
    /// claiming an already-taken package name or top-level name is rejected
    /// without touching the registry.
    pub fn register(&self, package: &ModelPackage) -> Result<()> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = inner.packages.get(package.name) {
            if *existing == package.bundle {
                debug!(package = package.name, "model package already registered");
                return Ok(());
            }
            return Err(YangBindError::Registration(format!(
                "package '{}' already registered for bundle '{}'",
                package.name, existing
            )));
        }

        // Validate the whole table before inserting anything
        for reg in package.registrations {
            for key in [reg.namespace, reg.module] {
                if let Some(taken) = inner.entities.get(&(key.to_string(), reg.name.to_string()))
                    && taken.package != package.name
                {
                    return Err(YangBindError::Registration(format!(
                        "top-level name '{}:{}' already registered by package '{}'",
                        key, reg.name, taken.package
                    )));
                }
            }
        }

        for reg in package.registrations {
            let resolved = ResolvedEntity {
                package: package.name,
                bundle: package.bundle,
                module: reg.module,
                namespace: reg.namespace,
                name: reg.name,
                factory: reg.factory,
            };
            for key in [reg.namespace, reg.module] {
                inner
                    .entities
                    .insert((key.to_string(), reg.name.to_string()), resolved);
            }
        }
        inner.packages.insert(package.name, package.bundle);

        debug!(
            package = package.name,
            bundle = package.bundle,
            entities = package.registrations.len(),
            "registered model package"
        );
        Ok(())
    }

    /// Resolve a sniffed (namespace or module, local name) pair
    pub fn lookup(&self, key: &str, name: &str) -> Result<ResolvedEntity> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .entities
            .get(&(key.to_string(), name.to_string()))
            .copied()
            .ok_or_else(|| YangBindError::EntityNotFound {
                namespace: key.to_string(),
                entity: name.to_string(),
            })
    }

    /// Build a fresh instance of the model type registered under a pair
    pub fn new_entity(&self, key: &str, name: &str) -> Result<Box<dyn Entity>> {
        let resolved = self.lookup(key, name)?;
        Ok((resolved.factory)())
    }

    /// Bundle name a package was generated from
    pub fn bundle_of(&self, package: &str) -> Result<&'static str> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.packages.get(package).copied().ok_or_else(|| {
            YangBindError::Resolution(format!("no package '{}' is registered", package))
        })
    }
}
