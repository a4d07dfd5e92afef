//! Collection spec to Weaviate class definition serialization, and the
//! reverse direction for schema validation.

use serde_json::{json, Value};

use nebula_core::schema::{CollectionShape, CollectionSpec, DataType, Vectorizer};

const TRANSFORMERS_MODULE: &str = "text2vec-transformers";

fn data_type_name(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Text => "text",
        DataType::TextArray => "text[]",
        DataType::Date => "date",
        DataType::Uuid => "uuid",
    }
}

pub(crate) fn vectorizer_name(vectorizer: Vectorizer) -> &'static str {
    match vectorizer {
        Vectorizer::None => "none",
        Vectorizer::Text2VecTransformers => TRANSFORMERS_MODULE,
    }
}

/// Render a collection spec as a `/v1/schema` class definition.
pub(crate) fn class_definition(spec: &CollectionSpec) -> Value {
    let mut properties: Vec<Value> = Vec::new();

    for prop in &spec.properties {
        let mut definition = json!({
            "name": prop.name,
            "dataType": [data_type_name(prop.data_type)],
            "description": prop.description,
            "indexFilterable": prop.filterable,
            "indexSearchable": prop.searchable,
        });
        if let Some(definition) = definition.as_object_mut() {
            // Searchable indexing only applies to text.
            if !matches!(prop.data_type, DataType::Text | DataType::TextArray) {
                definition.remove("indexSearchable");
            }
            if spec.vectorizer == Vectorizer::Text2VecTransformers {
                definition.insert(
                    "moduleConfig".to_string(),
                    json!({ TRANSFORMERS_MODULE: { "skip": prop.skip_vectorization } }),
                );
            }
        }
        properties.push(definition);
    }

    for reference in &spec.references {
        properties.push(json!({
            "name": reference.name,
            "dataType": [reference.target.collection_name()],
            "description": reference.description,
        }));
    }

    json!({
        "class": spec.name(),
        "description": spec.description,
        "vectorizer": vectorizer_name(spec.vectorizer),
        "properties": properties,
    })
}

/// Count properties and references in a class definition returned by
/// `/v1/schema`. Reference properties are recognized by their target
/// class data type, which Weaviate capitalizes.
pub(crate) fn observed_shape(class: &Value) -> CollectionShape {
    let mut shape = CollectionShape {
        properties: 0,
        references: 0,
    };
    let Some(properties) = class.get("properties").and_then(Value::as_array) else {
        return shape;
    };
    for prop in properties {
        let is_reference = prop
            .get("dataType")
            .and_then(Value::as_array)
            .and_then(|types| types.first())
            .and_then(Value::as_str)
            .is_some_and(|t| t.starts_with(char::is_uppercase));
        if is_reference {
            shape.references += 1;
        } else {
            shape.properties += 1;
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use nebula_core::schema::{collection_spec, expected_shape};
    use nebula_types::record::RecordKind;

    #[test]
    fn test_class_definition_shape() {
        let spec = collection_spec(RecordKind::Strategy, Vectorizer::None);
        let class = class_definition(&spec);

        assert_eq!(class["class"], "Strategy");
        assert_eq!(class["vectorizer"], "none");
        let properties = class["properties"].as_array().unwrap();
        // Scalar properties plus reference properties in one list.
        assert_eq!(properties.len(), 11 + 2);
        let applies = properties
            .iter()
            .find(|p| p["name"] == "appliesToEntities")
            .unwrap();
        assert_eq!(applies["dataType"][0], "Entity");
    }

    #[test]
    fn test_transformers_module_config_marks_skipped_fields() {
        let spec = collection_spec(RecordKind::Entity, Vectorizer::Text2VecTransformers);
        let class = class_definition(&spec);
        assert_eq!(class["vectorizer"], "text2vec-transformers");

        let properties = class["properties"].as_array().unwrap();
        let domain = properties.iter().find(|p| p["name"] == "domain").unwrap();
        assert_eq!(domain["moduleConfig"]["text2vec-transformers"]["skip"], true);
        let name = properties.iter().find(|p| p["name"] == "name").unwrap();
        assert_eq!(name["moduleConfig"]["text2vec-transformers"]["skip"], false);
    }

    #[test]
    fn test_no_module_config_without_vectorizer() {
        let spec = collection_spec(RecordKind::Entity, Vectorizer::None);
        let class = class_definition(&spec);
        for prop in class["properties"].as_array().unwrap() {
            assert!(prop.get("moduleConfig").is_none());
        }
    }

    #[test]
    fn test_observed_shape_roundtrip() {
        for kind in RecordKind::CREATION_ORDER {
            let spec = collection_spec(kind, Vectorizer::None);
            let class = class_definition(&spec);
            assert_eq!(observed_shape(&class), expected_shape(kind));
        }
    }
}
