//! The Weaviate-backed knowledge store.
//!
//! One long-lived [`reqwest::Client`] serves every call. Schema and
//! object CRUD use the REST API; filtered fetch, similarity search, and
//! counts use GraphQL. Authentication is an optional bearer token;
//! without one the store is assumed to allow anonymous access.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use nebula_core::schema::{expected_shape, CollectionSpec};
use nebula_core::store::{BatchItem, CollectionStatus, KnowledgeStore};
use nebula_types::config::WeaviateConfig;
use nebula_types::error::{SchemaError, StoreError};
use nebula_types::query::{Filter, SearchHit};
use nebula_types::record::{
    KnowledgeRecord, RecordKind, References, ResolvedReference, StoredRecord,
};

use super::graphql::{self, NearClause};
use super::schema::{class_definition, observed_shape};
use super::types::{
    beacon, merge_properties, properties_to_record, record_to_properties, WeaviateObject,
};

/// Knowledge store backed by a Weaviate instance.
pub struct WeaviateStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

/// One object row parsed out of a GraphQL `Get` payload.
#[derive(Debug)]
struct GraphqlHit {
    id: Uuid,
    record: KnowledgeRecord,
    distance: Option<f32>,
}

/// Parse the `Get` payload for one collection into typed hits.
fn parse_get_results(kind: RecordKind, data: &Value) -> Result<Vec<GraphqlHit>, StoreError> {
    let rows = data["Get"][kind.collection_name()]
        .as_array()
        .ok_or_else(|| {
            StoreError::MalformedResponse(format!("missing Get.{kind} in GraphQL response"))
        })?;

    let mut hits = Vec::with_capacity(rows.len());
    for row in rows {
        let Value::Object(mut properties) = row.clone() else {
            return Err(StoreError::MalformedResponse(
                "GraphQL row is not an object".to_string(),
            ));
        };
        let additional = properties.remove("_additional").ok_or_else(|| {
            StoreError::MalformedResponse("GraphQL row has no _additional".to_string())
        })?;
        let id: Uuid = additional["id"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                StoreError::MalformedResponse("GraphQL row has no parseable id".to_string())
            })?;
        let distance = additional["distance"].as_f64().map(|d| d as f32);
        let (record, _) = properties_to_record(kind, properties)?;
        hits.push(GraphqlHit {
            id,
            record,
            distance,
        });
    }
    Ok(hits)
}

impl WeaviateStore {
    pub fn new(
        config: &WeaviateConfig,
        api_key: Option<SecretString>,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url(),
            api_key,
        })
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, format!("{}{path}", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }
        builder
    }

    async fn graphql(&self, query: &str) -> Result<Value, StoreError> {
        let response = self
            .request(Method::POST, "/v1/graphql")
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
        if !status.is_success() {
            return Err(StoreError::Request(format!("{status}: {body}")));
        }
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e["message"].as_str())
                    .collect();
                return Err(StoreError::Request(format!(
                    "GraphQL errors: {}",
                    messages.join("; ")
                )));
            }
        }
        Ok(body["data"].clone())
    }

    /// Fetch one object's record and reference edges. `None` on 404.
    async fn fetch_object(
        &self,
        kind: RecordKind,
        id: Uuid,
    ) -> Result<Option<(KnowledgeRecord, References)>, StoreError> {
        let response = self
            .request(
                Method::GET,
                &format!("/v1/objects/{}/{id}", kind.collection_name()),
            )
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Request(format!("{status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
        let properties = match body.get("properties") {
            Some(Value::Object(properties)) => properties.clone(),
            _ => Map::new(),
        };
        properties_to_record(kind, properties).map(Some)
    }

    fn object_payload(
        id: Uuid,
        record: &KnowledgeRecord,
        vector: Option<&[f32]>,
        references: &References,
    ) -> Result<WeaviateObject, StoreError> {
        Ok(WeaviateObject {
            class: record.kind().collection_name().to_string(),
            id,
            properties: record_to_properties(record, references)?,
            vector: vector.map(<[f32]>::to_vec),
        })
    }
}

impl KnowledgeStore for WeaviateStore {
    async fn ensure_schema(&self, specs: &[CollectionSpec]) -> Result<(), SchemaError> {
        for spec in specs {
            let definition = class_definition(spec);
            let response = self
                .request(Method::POST, "/v1/schema")
                .json(&definition)
                .send()
                .await
                .map_err(|e| SchemaError::CreateFailed {
                    collection: spec.name().to_string(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if status.is_success() {
                info!(collection = spec.name(), "created collection");
                continue;
            }
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNPROCESSABLE_ENTITY && body.contains("already exists") {
                debug!(collection = spec.name(), "collection already exists, skipping");
                continue;
            }
            return Err(SchemaError::CreateFailed {
                collection: spec.name().to_string(),
                message: format!("{status}: {body}"),
            });
        }
        Ok(())
    }

    async fn validate_schema(&self) -> Result<Vec<CollectionStatus>, StoreError> {
        let response = self
            .request(Method::GET, "/v1/schema")
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
        let classes = body["classes"].as_array().cloned().unwrap_or_default();

        let mut statuses = Vec::with_capacity(RecordKind::CREATION_ORDER.len());
        for kind in RecordKind::CREATION_ORDER {
            let class = classes
                .iter()
                .find(|c| c["class"] == kind.collection_name());
            let result = match class {
                None => Err(SchemaError::MissingCollection(
                    kind.collection_name().to_string(),
                )),
                Some(class) => {
                    let observed = observed_shape(class);
                    let expected = expected_shape(kind);
                    if observed == expected {
                        Ok(())
                    } else {
                        Err(SchemaError::ShapeMismatch {
                            collection: kind.collection_name().to_string(),
                            expected_properties: expected.properties,
                            actual_properties: observed.properties,
                            expected_references: expected.references,
                            actual_references: observed.references,
                        })
                    }
                }
            };
            statuses.push(CollectionStatus { kind, result });
        }
        Ok(statuses)
    }

    async fn insert(
        &self,
        record: &KnowledgeRecord,
        vector: Option<&[f32]>,
        references: &References,
    ) -> Result<Uuid, StoreError> {
        let kind = record.kind();
        let id = Uuid::now_v7();
        let payload = Self::object_payload(id, record, vector, references)?;

        let response = self
            .request(Method::POST, "/v1/objects")
            .json(&payload)
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                kind,
                message: format!("{status}: {body}"),
            });
        }
        Ok(id)
    }

    async fn insert_batch(
        &self,
        items: &[BatchItem],
    ) -> Result<Vec<Result<Uuid, StoreError>>, StoreError> {
        let mut outcomes: Vec<Option<Result<Uuid, StoreError>>> = Vec::new();
        let mut pending: Vec<(usize, Uuid)> = Vec::new();
        let mut objects: Vec<WeaviateObject> = Vec::new();

        for (idx, item) in items.iter().enumerate() {
            outcomes.push(None);
            let id = Uuid::now_v7();
            match Self::object_payload(id, &item.record, item.vector.as_deref(), &item.references)
            {
                Ok(payload) => {
                    pending.push((idx, id));
                    objects.push(payload);
                }
                Err(err) => outcomes[idx] = Some(Err(err)),
            }
        }

        if !objects.is_empty() {
            let response = self
                .request(Method::POST, "/v1/batch/objects")
                .json(&json!({ "objects": &objects }))
                .send()
                .await
                .map_err(|e| StoreError::Request(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(StoreError::Request(format!("{status}: {body}")));
            }
            let results: Vec<Value> = response
                .json()
                .await
                .map_err(|e| StoreError::MalformedResponse(e.to_string()))?;
            if results.len() != objects.len() {
                return Err(StoreError::MalformedResponse(format!(
                    "batch returned {} results for {} objects",
                    results.len(),
                    objects.len()
                )));
            }

            for (((idx, id), object), result) in
                pending.into_iter().zip(&objects).zip(results)
            {
                let errors = &result["result"]["errors"]["error"];
                let outcome = match errors.as_array().filter(|e| !e.is_empty()) {
                    Some(errors) => {
                        let messages: Vec<&str> = errors
                            .iter()
                            .filter_map(|e| e["message"].as_str())
                            .collect();
                        let kind: RecordKind = object
                            .class
                            .parse()
                            .map_err(StoreError::MalformedResponse)?;
                        Err(StoreError::Rejected {
                            kind,
                            message: messages.join("; "),
                        })
                    }
                    None => Ok(id),
                };
                outcomes[idx] = Some(outcome);
            }
        }

        Ok(outcomes
            .into_iter()
            .map(|o| o.unwrap_or(Err(StoreError::MalformedResponse(
                "batch result missing".to_string(),
            ))))
            .collect())
    }

    async fn update(
        &self,
        id: Uuid,
        record: &KnowledgeRecord,
        vector: Option<&[f32]>,
    ) -> Result<(), StoreError> {
        let kind = record.kind();
        let path = format!("/v1/objects/{}/{id}", kind.collection_name());

        // A full PUT without a vector would erase the stored one, so
        // vectorless updates merge via PATCH instead.
        let response = match vector {
            Some(vector) => {
                // PUT replaces the whole object, so the stored
                // reference edges have to ride along or they are lost.
                let references = match self.fetch_object(kind, id).await? {
                    Some((_, references)) => references,
                    None => return Err(StoreError::NotFound { kind, id }),
                };
                let payload = Self::object_payload(id, record, Some(vector), &references)?;
                self.request(Method::PUT, &path).json(&payload).send().await
            }
            None => {
                let payload = json!({
                    "class": kind.collection_name(),
                    "id": id,
                    "properties": merge_properties(record)?,
                });
                self.request(Method::PATCH, &path).json(&payload).send().await
            }
        }
        .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound { kind, id });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                kind,
                message: format!("{status}: {body}"),
            });
        }
        Ok(())
    }

    async fn delete(&self, kind: RecordKind, id: Uuid) -> Result<(), StoreError> {
        let response = self
            .request(
                Method::DELETE,
                &format!("/v1/objects/{}/{id}", kind.collection_name()),
            )
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound { kind, id });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Request(format!("{status}: {body}")));
        }
        Ok(())
    }

    async fn get(
        &self,
        kind: RecordKind,
        id: Uuid,
        expand_references: bool,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let Some((record, references)) = self.fetch_object(kind, id).await? else {
            return Ok(None);
        };

        let mut resolved = BTreeMap::new();
        if expand_references {
            for (ref_name, targets) in references.iter() {
                let Some(target_kind) = kind.reference_target(ref_name) else {
                    continue;
                };
                let mut entries = Vec::with_capacity(targets.len());
                for target_id in targets {
                    // Dangling edges are dropped rather than surfaced.
                    if let Some((record, _)) = self.fetch_object(target_kind, *target_id).await? {
                        entries.push(ResolvedReference {
                            id: *target_id,
                            record,
                        });
                    }
                }
                resolved.insert(ref_name.to_string(), entries);
            }
        }

        Ok(Some(StoredRecord {
            id,
            record,
            references,
            resolved,
        }))
    }

    async fn list(
        &self,
        kind: RecordKind,
        filter: Option<&Filter>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let query = graphql::get_query(kind, filter, None, limit)?;
        let data = self.graphql(&query).await?;
        let hits = parse_get_results(kind, &data)?;
        Ok(hits
            .into_iter()
            .map(|hit| StoredRecord {
                id: hit.id,
                record: hit.record,
                references: References::new(),
                resolved: BTreeMap::new(),
            })
            .collect())
    }

    async fn near_vector(
        &self,
        kind: RecordKind,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let query = graphql::get_query(kind, None, Some(NearClause::Vector(vector)), limit)?;
        let data = self.graphql(&query).await?;
        let hits = parse_get_results(kind, &data)?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchHit {
                id: hit.id,
                record: hit.record,
                distance: hit.distance.unwrap_or(f32::MAX),
            })
            .collect())
    }

    async fn near_text(
        &self,
        kind: RecordKind,
        text: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let query = graphql::get_query(kind, None, Some(NearClause::Text(text)), limit)?;
        let data = self.graphql(&query).await?;
        let hits = parse_get_results(kind, &data)?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchHit {
                id: hit.id,
                record: hit.record,
                distance: hit.distance.unwrap_or(f32::MAX),
            })
            .collect())
    }

    async fn add_reference(
        &self,
        kind: RecordKind,
        id: Uuid,
        reference: &str,
        target: Uuid,
    ) -> Result<(), StoreError> {
        let Some(target_kind) = kind.reference_target(reference) else {
            return Err(StoreError::UnknownReference {
                kind,
                reference: reference.to_string(),
            });
        };
        let response = self
            .request(
                Method::POST,
                &format!(
                    "/v1/objects/{}/{id}/references/{reference}",
                    kind.collection_name()
                ),
            )
            .json(&beacon(target_kind, target))
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound { kind, id });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                kind,
                message: format!("{status}: {body}"),
            });
        }
        Ok(())
    }

    async fn count(&self, kind: RecordKind) -> Result<u64, StoreError> {
        let data = self.graphql(&graphql::count_query(kind)).await?;
        data["Aggregate"][kind.collection_name()][0]["meta"]["count"]
            .as_u64()
            .ok_or_else(|| {
                StoreError::MalformedResponse(format!("missing Aggregate count for {kind}"))
            })
    }

    async fn drop_all(&self) -> Result<(), StoreError> {
        // Reverse creation order so reference sources go before targets.
        for kind in RecordKind::CREATION_ORDER.iter().rev() {
            let response = self
                .request(
                    Method::DELETE,
                    &format!("/v1/schema/{}", kind.collection_name()),
                )
                .send()
                .await
                .map_err(|e| StoreError::Request(e.to_string()))?;
            let status = response.status();
            if !status.is_success() && status != StatusCode::NOT_FOUND {
                let body = response.text().await.unwrap_or_default();
                return Err(StoreError::Request(format!(
                    "dropping {kind}: {status}: {body}"
                )));
            }
            info!(collection = kind.collection_name(), "dropped collection");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get_results_with_distance() {
        let data = json!({
            "Get": {
                "Insight": [{
                    "content": "Short meetings beat long ones.",
                    "domain": "work",
                    "status": "active",
                    "created_at": "2026-01-10T09:00:00Z",
                    "updated_at": "2026-01-10T09:00:00Z",
                    "source_name": null,
                    "_additional": {
                        "id": "018f00aa-0000-7000-8000-000000000001",
                        "distance": 0.12
                    }
                }]
            }
        });
        let hits = parse_get_results(RecordKind::Insight, &data).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record.label(), "Short meetings beat long ones.");
        assert_eq!(hits[0].distance, Some(0.12));
    }

    #[test]
    fn test_parse_get_results_missing_collection() {
        let data = json!({ "Get": {} });
        let err = parse_get_results(RecordKind::Entity, &data).unwrap_err();
        assert!(matches!(err, StoreError::MalformedResponse(_)));
    }

    #[test]
    fn test_replace_payload_carries_reference_edges() {
        use chrono::Utc;
        use nebula_types::record::Strategy;
        use nebula_types::taxonomy::{Domain, LifecycleStatus, StrategyType};

        let record = KnowledgeRecord::Strategy(Strategy {
            title: "Q1 2025 Product Priorities".to_string(),
            content: "Ship the governance workshop toolkit first.".to_string(),
            strategy_type: StrategyType::Priority,
            domain: Domain::Work,
            time_horizon: None,
            valid_from: None,
            valid_until: None,
            status: LifecycleStatus::Active,
            superseded_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        let target = Uuid::now_v7();
        let references = References::single("appliesToEntities", target);

        // The full-replace payload used by vector-carrying updates must
        // keep the stored edges, not drop them.
        let payload =
            WeaviateStore::object_payload(Uuid::now_v7(), &record, Some(&[0.1, 0.2]), &references)
                .unwrap();
        let beacons = payload.properties["appliesToEntities"].as_array().unwrap();
        assert_eq!(beacons.len(), 1);
        assert!(beacons[0]["beacon"]
            .as_str()
            .unwrap()
            .ends_with(&target.to_string()));
        assert!(payload.vector.is_some());
    }

    #[test]
    fn test_parse_get_results_empty() {
        let data = json!({ "Get": { "Event": [] } });
        let hits = parse_get_results(RecordKind::Event, &data).unwrap();
        assert!(hits.is_empty());
    }
}
