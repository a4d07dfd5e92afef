//! Mapping between [`KnowledgeRecord`] and Weaviate's wire shapes.
//!
//! Records serialize to flat property maps; reference edges travel as
//! beacon arrays inside the same map. Reading reverses both steps and
//! tolerates properties Weaviate returns as explicit nulls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use nebula_core::schema::{collection_spec, Vectorizer};
use nebula_types::error::StoreError;
use nebula_types::record::{KnowledgeRecord, RecordKind, References};

/// One object as sent to / received from `/v1/objects`.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct WeaviateObject {
    pub class: String,
    pub id: Uuid,
    pub properties: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

/// A beacon value pointing at another object.
pub(crate) fn beacon(target: RecordKind, id: Uuid) -> Value {
    serde_json::json!({
        "beacon": format!("weaviate://localhost/{}/{id}", target.collection_name()),
    })
}

/// Extract the object id from a beacon value, if it is one.
pub(crate) fn parse_beacon(value: &Value) -> Option<Uuid> {
    let beacon = value.get("beacon")?.as_str()?;
    beacon.rsplit('/').next()?.parse().ok()
}

/// Flatten a record into a Weaviate property map, with reference edges
/// rendered as beacon arrays. Rejects reference properties the schema
/// does not declare for this kind.
pub(crate) fn record_to_properties(
    record: &KnowledgeRecord,
    references: &References,
) -> Result<Map<String, Value>, StoreError> {
    let kind = record.kind();
    let Value::Object(mut properties) = serde_json::to_value(record)
        .map_err(|e| StoreError::Request(format!("failed to serialize record: {e}")))?
    else {
        return Err(StoreError::Request(
            "record did not serialize to an object".to_string(),
        ));
    };
    // The serde tag is not a store property.
    properties.remove("kind");

    for (ref_name, targets) in references.iter() {
        let Some(target_kind) = kind.reference_target(ref_name) else {
            return Err(StoreError::UnknownReference {
                kind,
                reference: ref_name.to_string(),
            });
        };
        let beacons: Vec<Value> = targets.iter().map(|id| beacon(target_kind, *id)).collect();
        properties.insert(ref_name.to_string(), Value::Array(beacons));
    }

    Ok(properties)
}

/// Property map for a PATCH merge. Optional fields the record no
/// longer carries are written as explicit nulls, otherwise the merge
/// would keep their old values. Reference properties are left out so
/// the merge never touches stored edges.
pub(crate) fn merge_properties(
    record: &KnowledgeRecord,
) -> Result<Map<String, Value>, StoreError> {
    let mut properties = record_to_properties(record, &References::new())?;
    for prop in collection_spec(record.kind(), Vectorizer::None).properties {
        properties.entry(prop.name).or_insert(Value::Null);
    }
    Ok(properties)
}

/// Rebuild a record and its reference edges from a Weaviate property
/// map. Declared reference properties are pulled out as beacons; nulls
/// are dropped so optional fields deserialize as absent.
pub(crate) fn properties_to_record(
    kind: RecordKind,
    mut properties: Map<String, Value>,
) -> Result<(KnowledgeRecord, References), StoreError> {
    let mut references = References::new();
    for (ref_name, _) in kind.reference_targets() {
        if let Some(Value::Array(beacons)) = properties.remove(*ref_name) {
            for value in &beacons {
                if let Some(id) = parse_beacon(value) {
                    references.add(ref_name, id);
                }
            }
        }
    }

    properties.retain(|_, value| !value.is_null());
    properties.insert(
        "kind".to_string(),
        Value::String(kind.collection_name().to_string()),
    );

    let record: KnowledgeRecord = serde_json::from_value(Value::Object(properties))
        .map_err(|e| StoreError::MalformedResponse(format!("{kind} object: {e}")))?;
    Ok((record, references))
}
