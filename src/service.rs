//! Codec service: encode and decode model objects through a provider
//!
//! The service is the user-facing surface. Encoding resolves the entity's
//! bundle through the registry, maps the object to a data tree and renders
//! it in the provider's format. Decoding sniffs the payload identity,
//! builds an empty instance from the registered factory and fills it from
//! the parsed tree. Batch variants work key by key and stop at the first
//! failure.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::codec::TreeCodec;
use crate::entity::Entity;
use crate::error::{Result, YangBindError};
use crate::mapper;
use crate::provider::CodecProvider;
use crate::registry::ModelRegistry;
use crate::schema::{RootSchema, SchemaNode};
use crate::sniff;

/// Encodes model objects to payloads and decodes payloads back
#[derive(Debug)]
pub struct CodecService {
    registry: Arc<ModelRegistry>,
    codec: TreeCodec,
}

impl CodecService {
    /// Service over the process-wide model registry
    pub fn new() -> Self {
        Self::with_registry(ModelRegistry::global())
    }

    /// Service over an explicit registry
    pub fn with_registry(registry: Arc<ModelRegistry>) -> Self {
        CodecService {
            registry,
            codec: TreeCodec::new(),
        }
    }

    /// Encode one model object in the provider's format
    pub fn encode(
        &self,
        provider: &CodecProvider,
        entity: &dyn Entity,
        pretty: bool,
    ) -> Result<String> {
        let id = entity.type_identity();
        debug!(
            entity = id.local_name,
            format = %provider.format(),
            "encoding entity to payload"
        );

        let bundle = self.registry.bundle_of(id.package)?;
        let schema = provider.root_schema(bundle)?;
        let root = find_root(&schema, bundle, id.namespace, id.module, id.local_name)?;

        let tree = mapper::entity_to_tree(entity, root)?;
        let payload = self.codec.encode(&tree, root, provider.format(), pretty)?;
        debug!(entity = id.local_name, "encoded payload: {}", payload);
        Ok(payload)
    }

    /// Encode a keyed batch, failing on the first bad entry
    pub fn encode_map(
        &self,
        provider: &CodecProvider,
        entities: &HashMap<String, Box<dyn Entity>>,
        pretty: bool,
    ) -> Result<HashMap<String, String>> {
        let mut payloads = HashMap::with_capacity(entities.len());
        for (key, entity) in entities {
            payloads.insert(key.clone(), self.encode(provider, entity.as_ref(), pretty)?);
        }
        Ok(payloads)
    }

    /// Decode one payload into a freshly built model object
    pub fn decode(&self, provider: &CodecProvider, payload: &str) -> Result<Box<dyn Entity>> {
        debug!(format = %provider.format(), "decoding payload: {}", payload);

        let identity = sniff::payload_identity(payload, provider.format())?;
        let resolved = self.registry.lookup(&identity.key, &identity.name)?;
        debug!(
            key = %identity.key,
            name = %identity.name,
            package = resolved.package,
            "resolved payload identity"
        );

        let schema = provider.root_schema(resolved.bundle)?;
        let root = find_root(
            &schema,
            resolved.bundle,
            resolved.namespace,
            resolved.module,
            resolved.name,
        )?;

        let tree = self.codec.decode(payload, root, provider.format())?;
        let mut entity = (resolved.factory)();
        mapper::tree_to_entity(&tree, root, entity.as_mut())?;
        Ok(entity)
    }

    /// Decode a keyed batch, failing on the first bad payload
    pub fn decode_map(
        &self,
        provider: &CodecProvider,
        payloads: &HashMap<String, String>,
    ) -> Result<HashMap<String, Box<dyn Entity>>> {
        let mut entities = HashMap::with_capacity(payloads.len());
        for (key, payload) in payloads {
            entities.insert(key.clone(), self.decode(provider, payload)?);
        }
        Ok(entities)
    }
}

impl Default for CodecService {
    fn default() -> Self {
        Self::new()
    }
}

/// Top-level schema node for a registered entity, trying both key forms
fn find_root<'a>(
    schema: &'a RootSchema,
    bundle: &str,
    namespace: &str,
    module: &str,
    name: &str,
) -> Result<&'a Arc<SchemaNode>> {
    schema
        .find_root(namespace, name)
        .or_else(|| schema.find_root(module, name))
        .ok_or_else(|| {
            YangBindError::Resolution(format!(
                "bundle '{}' does not define '{}:{}'",
                bundle, module, name
            ))
        })
}
