//! # rust-yangbind
//!
//! Codec bindings between YANG model objects and their XML / RFC 7951
//! JSON payload forms.
//!
//! Generated model bindings implement [`Entity`] and ship a static
//! [`ModelPackage`] table. Once a package is registered, a
//! [`CodecService`] can turn any of its top-level containers into payload
//! text and turn payload text back into typed objects, resolving the
//! schema bundle and the concrete type from the payload alone.
//!
//! ## Features
//!
//! - Encode model objects to XML or JSON, compact or pretty-printed
//! - Decode payloads to typed objects, sniffing which registered model
//!   the payload carries
//! - Keyed batch encode and decode with fail-fast semantics
//! - Schema-validated values: integer ranges, enums, base64 binaries
//! - Bundle files resolved from a configurable search path and cached
//!
//! ## Example
//!
//! ```ignore
//! use rust_yangbind::{CodecProvider, CodecService, EncodingFormat, ModelRegistry};
//! use example_models::{Interface, EXAMPLE_PACKAGE};
//!
//! ModelRegistry::global().register(&EXAMPLE_PACKAGE)?;
//! let provider = CodecProvider::new(EncodingFormat::Json);
//! provider.initialize("example", "models/example.json")?;
//!
//! let mut interface = Interface::default();
//! interface.name = Some("eth0".into());
//! interface.enabled = Some(true);
//!
//! let service = CodecService::new();
//! let payload = service.encode(&provider, &interface, false)?;
//! assert_eq!(
//!     payload,
//!     r#"{"example-if:interface":{"name":"eth0","enabled":true}}"#
//! );
//!
//! let decoded = service.decode(&provider, &payload)?;
//! let decoded = decoded
//!     .as_any()
//!     .downcast_ref::<Interface>()
//!     .expect("payload named an interface");
//! assert_eq!(decoded.name.as_deref(), Some("eth0"));
//! ```

pub mod bundle;
pub mod codec;
pub mod entity;
pub mod error;
pub mod mapper;
pub mod provider;
pub mod registry;
pub mod schema;
pub mod service;
pub mod sniff;
pub mod tree;
pub mod types;

pub use bundle::{BUNDLE_PATH_VAR, BundleDescriptor, BundleLocator};
pub use codec::{EncodingFormat, TreeCodec};
pub use entity::{Entity, Field, LeafValue, TypeIdentity};
pub use error::{Result, YangBindError};
pub use provider::CodecProvider;
pub use registry::{
    EntityFactory, EntityRegistration, ModelPackage, ModelRegistry, ResolvedEntity,
};
pub use schema::{ModuleSchema, NodeKind, RootSchema, SchemaNode};
pub use service::CodecService;
pub use sniff::{PayloadIdentity, payload_identity};
pub use tree::DataNode;
pub use types::YangType;
