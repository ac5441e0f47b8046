//! Payload identity sniffing
//!
//! Before a payload can be decoded, the codec must learn which model object
//! it carries. XML names the root element and its bound namespace URI; an
//! RFC 7951 JSON document qualifies its single top-level member with the
//! module name. Both come back as the same [`PayloadIdentity`] shape, and
//! the registry resolves either key form to the same registration.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use serde_json::Value;

use crate::codec::EncodingFormat;
use crate::error::{Result, YangBindError};

/// Identity of the single top-level container a payload carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadIdentity {
    /// Namespace URI (XML) or module name (JSON); empty when unqualified
    pub key: String,
    /// Local name of the top-level container
    pub name: String,
}

/// Determine which top-level container a payload holds.
///
/// Payloads carrying zero or more than one top-level container are rejected
/// with the offending count so callers can tell the user to split them.
pub fn payload_identity(payload: &str, format: EncodingFormat) -> Result<PayloadIdentity> {
    match format {
        EncodingFormat::Xml => sniff_xml(payload),
        EncodingFormat::Json => sniff_json(payload),
    }
}

fn sniff_xml(payload: &str) -> Result<PayloadIdentity> {
    let mut reader = NsReader::from_str(payload);
    let mut depth = 0usize;
    let mut roots: Vec<PayloadIdentity> = Vec::new();

    loop {
        let (resolve, event) = reader
            .read_resolved_event()
            .map_err(|e| YangBindError::MalformedPayload(e.to_string()))?;
        match event {
            Event::Start(start) => {
                if depth == 0 {
                    roots.push(element_identity(&resolve, start.local_name().as_ref()));
                }
                depth += 1;
            }
            Event::Empty(start) => {
                if depth == 0 {
                    roots.push(element_identity(&resolve, start.local_name().as_ref()));
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    single_root(roots)
}

fn element_identity(resolve: &ResolveResult<'_>, local: &[u8]) -> PayloadIdentity {
    let key = match resolve {
        ResolveResult::Bound(Namespace(ns)) => String::from_utf8_lossy(ns).into_owned(),
        _ => String::new(),
    };
    PayloadIdentity {
        key,
        name: String::from_utf8_lossy(local).into_owned(),
    }
}

fn sniff_json(payload: &str) -> Result<PayloadIdentity> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| YangBindError::MalformedPayload(e.to_string()))?;
    let obj = value.as_object().ok_or_else(|| {
        YangBindError::MalformedPayload("payload root is not a JSON object".into())
    })?;

    let roots = obj
        .keys()
        .map(|key| {
            let (prefix, local) = key.split_once(':').ok_or_else(|| {
                YangBindError::MalformedPayload(format!(
                    "top-level member '{}' is not module-qualified",
                    key
                ))
            })?;
            Ok(PayloadIdentity {
                key: prefix.to_string(),
                name: local.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    single_root(roots)
}

fn single_root(mut roots: Vec<PayloadIdentity>) -> Result<PayloadIdentity> {
    if roots.len() == 1 {
        Ok(roots.remove(0))
    } else {
        Err(YangBindError::PayloadStructure(roots.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_xml_root() {
        let id = payload_identity(
            "<interface xmlns=\"urn:example:if\"><name>eth0</name></interface>",
            EncodingFormat::Xml,
        )
        .unwrap();
        assert_eq!(id.key, "urn:example:if");
        assert_eq!(id.name, "interface");
    }

    #[test]
    fn test_sniff_xml_without_namespace() {
        let id = payload_identity("<interface/>", EncodingFormat::Xml).unwrap();
        assert_eq!(id.key, "");
        assert_eq!(id.name, "interface");
    }

    #[test]
    fn test_sniff_json_root() {
        let id = payload_identity(
            r#"{"example-if:interface":{"name":"eth0"}}"#,
            EncodingFormat::Json,
        )
        .unwrap();
        assert_eq!(id.key, "example-if");
        assert_eq!(id.name, "interface");
    }

    #[test]
    fn test_sniff_counts_extra_roots() {
        let err = payload_identity(
            r#"{"a:x":{},"b:y":{}}"#,
            EncodingFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, YangBindError::PayloadStructure(2)));

        let err = payload_identity(
            "<x xmlns=\"urn:a\"/><y xmlns=\"urn:b\"/>",
            EncodingFormat::Xml,
        )
        .unwrap_err();
        assert!(matches!(err, YangBindError::PayloadStructure(2)));
    }

    #[test]
    fn test_sniff_rejects_empty_payloads() {
        let err = payload_identity("{}", EncodingFormat::Json).unwrap_err();
        assert!(matches!(err, YangBindError::PayloadStructure(0)));

        let err = payload_identity("   \n", EncodingFormat::Xml).unwrap_err();
        assert!(matches!(err, YangBindError::PayloadStructure(0)));
    }

    #[test]
    fn test_sniff_rejects_unqualified_json_member() {
        let err =
            payload_identity(r#"{"interface":{}}"#, EncodingFormat::Json).unwrap_err();
        assert!(matches!(err, YangBindError::MalformedPayload(_)));
    }

    #[test]
    fn test_sniff_malformed_inputs() {
        assert!(payload_identity("{\"a\":", EncodingFormat::Json).is_err());
        assert!(payload_identity("<a><b></a>", EncodingFormat::Xml).is_err());
    }
}
