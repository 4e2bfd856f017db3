//! JSON fixtures: a schema plus records, loaded into a [`MemoryBackend`].

use std::collections::BTreeMap;
use std::path::Path;

use projql_proto::Value;
use serde::Deserialize;
use serde_json::{Map, Value as Json};
use tracing::info;

use super::MemoryBackend;
use crate::catalog::{Catalog, EntityDef, RelationDef, ScalarType, SchemaBundle};
use crate::error::{Error, Result};
use crate::row::Row;

/// Schema and records in their JSON form.
///
/// ```json
/// {
///   "entities": [{ "name": "Customer", "identity_field": "id",
///                  "fields": [{ "name": "id", "field_type": { "Scalar": "Int64" } }] }],
///   "relations": [],
///   "records": { "Customer": [{ "id": 1 }] }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    /// Schema version.
    #[serde(default)]
    pub version: u64,
    /// Entity definitions.
    pub entities: Vec<EntityDef>,
    /// Relation definitions.
    #[serde(default)]
    pub relations: Vec<RelationDef>,
    /// Records per entity name, as JSON objects keyed by field name.
    #[serde(default)]
    pub records: BTreeMap<String, Vec<Map<String, Json>>>,
}

impl Fixture {
    /// Parse a fixture from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Fixture(e.to_string()))
    }

    /// Read and parse a fixture file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Fixture(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Build the catalog and load every record, converting JSON values to
    /// the declared field types.
    pub fn into_backend(self) -> Result<MemoryBackend> {
        let mut schema = SchemaBundle::new(self.version);
        for entity in self.entities {
            schema = schema.with_entity(entity);
        }
        for relation in self.relations {
            schema = schema.with_relation(relation);
        }
        let catalog = Catalog::new(schema)?;

        let mut typed = Vec::new();
        for (entity, records) in &self.records {
            let def = catalog.entity(entity)?;
            for record in records {
                let mut row = Row::new();
                for (name, json) in record {
                    let field = def.get_field(name).ok_or_else(|| Error::UnknownAttribute {
                        entity: entity.clone(),
                        attribute: name.clone(),
                    })?;
                    let value = convert(json, field.field_type.scalar_type()).ok_or_else(|| {
                        Error::Fixture(format!(
                            "{entity}.{name}: {json} is not a valid {:?}",
                            field.field_type.scalar_type()
                        ))
                    })?;
                    row.push(name.clone(), value);
                }
                typed.push((entity.clone(), row));
            }
        }

        let mut backend = MemoryBackend::new(catalog);
        let loaded = typed.len();
        for (entity, row) in typed {
            backend.insert(&entity, row)?;
        }
        info!(records = loaded, "loaded fixture");
        Ok(backend)
    }
}

fn convert(json: &Json, scalar: ScalarType) -> Option<Value> {
    if json.is_null() {
        return Some(Value::Null);
    }
    Some(match scalar {
        ScalarType::Bool => Value::Bool(json.as_bool()?),
        ScalarType::Int32 => Value::Int32(i32::try_from(json.as_i64()?).ok()?),
        ScalarType::Int64 => Value::Int64(json.as_i64()?),
        ScalarType::Float32 => Value::Float32(json.as_f64()? as f32),
        ScalarType::Float64 => Value::Float64(json.as_f64()?),
        ScalarType::String => Value::String(json.as_str()?.to_string()),
        ScalarType::Bytes => Value::Bytes(
            json.as_array()?
                .iter()
                .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()?,
        ),
        ScalarType::Timestamp => Value::Timestamp(json.as_i64()?),
        ScalarType::Uuid => Value::Uuid(parse_uuid(json.as_str()?)?),
    })
}

/// Parse a UUID in hex form, dashes optional.
fn parse_uuid(text: &str) -> Option<[u8; 16]> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| *b != b'-')
        .map(|b| (b as char).to_digit(16).map(|d| d as u8))
        .collect::<Option<_>>()?;
    if digits.len() != 32 {
        return None;
    }
    let mut out = [0u8; 16];
    for (i, pair) in digits.chunks(2).enumerate() {
        out[i] = (pair[0] << 4) | pair[1];
    }
    Some(out)
}
