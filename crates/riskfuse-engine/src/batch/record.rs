//! Per-entity input and output records.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use riskfuse_core::constants::AGGREGATE_RISK_FIELD;
use riskfuse_core::errors::RecordError;

use super::reader::RawLine;
use crate::fusion::{ConfidenceInterval, Detection, FusionMethod, FusionResult, FusionStep, RiskLevel};

/// Entity identifier as produced upstream: text or an integer key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Keys accepted for the entity identifier, in order of preference.
pub const ENTITY_ID_FIELDS: [&str; 2] = ["entity_id", "id"];

const DETECTIONS_FIELD: &str = "detections";

/// One entity and its detections.
///
/// The record keeps the object it was read from. Serializing writes that
/// object back unchanged (same keys, same numbers, explicit nulls) minus
/// any `aggregate_risk` field; the typed `entity_id` and `detections` are a
/// read-only view for fusion.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub entity_id: EntityId,
    pub detections: Vec<Detection>,
    fields: Map<String, Value>,
}

impl EntityRecord {
    pub fn new(entity_id: impl Into<String>, detections: Vec<Detection>) -> Self {
        let entity_id = EntityId::Text(entity_id.into());
        let mut fields = Map::new();
        fields.insert(ENTITY_ID_FIELDS[0].to_string(), Value::from(entity_id.to_string()));
        fields.insert(
            DETECTIONS_FIELD.to_string(),
            serde_json::to_value(&detections).unwrap_or_else(|_| Value::Array(Vec::new())),
        );
        Self {
            entity_id,
            detections,
            fields,
        }
    }

    /// Build the typed view over a parsed JSON object.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, String> {
        let (key, raw_id) = ENTITY_ID_FIELDS
            .iter()
            .find_map(|key| fields.get(*key).map(|value| (*key, value)))
            .ok_or_else(|| "missing field `entity_id`".to_string())?;
        let entity_id =
            EntityId::deserialize(raw_id).map_err(|e| format!("invalid `{key}`: {e}"))?;

        let detections = match fields.get(DETECTIONS_FIELD) {
            None | Some(Value::Null) => Vec::new(),
            Some(raw) => Vec::<Detection>::deserialize(raw)
                .map_err(|e| format!("invalid `{DETECTIONS_FIELD}`: {e}"))?,
        };

        Ok(Self {
            entity_id,
            detections,
            fields,
        })
    }

    /// Key the identifier was read from (`entity_id` or `id`).
    pub fn id_field(&self) -> &'static str {
        ENTITY_ID_FIELDS
            .iter()
            .copied()
            .find(|key| self.fields.contains_key(*key))
            .unwrap_or(ENTITY_ID_FIELDS[0])
    }

    /// The record as read, including fields fusion does not look at.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Parse one JSONL line. Blank lines yield `Ok(None)`.
    pub fn parse_line(raw: &RawLine) -> Result<Option<Self>, RecordError> {
        let text = std::str::from_utf8(&raw.bytes)
            .map_err(|_| RecordError::InvalidUtf8 { line: raw.number })?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        serde_json::from_str(text)
            .map(Some)
            .map_err(|e| RecordError::Malformed {
                line: raw.number,
                message: e.to_string(),
            })
    }
}

impl Serialize for EntityRecord {
    /// Writes the original fields back in input order. A stale
    /// `aggregate_risk` from an earlier run is left out.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.fields {
            if key != AGGREGATE_RISK_FIELD {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EntityRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(de::Error::custom)
    }
}

/// The `aggregate_risk` block attached to each output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRisk {
    pub posterior_probability: f64,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub confidence_interval_95: ConfidenceInterval,
    pub fusion_method: FusionMethod,
    pub effective_detections: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_detections: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detectors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion_log: Option<Vec<FusionStep>>,
}

impl AggregateRisk {
    /// Summarize a fusion result; the audit fields are kept only when
    /// `include_fusion_log` is set.
    pub fn from_result(result: FusionResult, include_fusion_log: bool) -> Self {
        let (num_detections, detectors, fusion_log) = if include_fusion_log {
            (
                Some(result.num_detections),
                Some(result.detectors),
                Some(result.fusion_log),
            )
        } else {
            (None, None, None)
        };
        Self {
            posterior_probability: result.posterior_probability,
            risk_score: result.risk_score,
            risk_level: result.risk_level,
            confidence_interval_95: result.confidence_interval_95,
            fusion_method: result.fusion_method,
            effective_detections: result.effective_detections,
            num_detections,
            detectors,
            fusion_log,
        }
    }
}

/// An input record plus its fusion summary, as written to the output stream.
#[derive(Debug, Serialize)]
pub struct EnrichedRecord<'a> {
    #[serde(flatten)]
    pub record: &'a EntityRecord,
    pub aggregate_risk: AggregateRisk,
}

impl EnrichedRecord<'_> {
    /// Encode as a single JSON line (no trailing newline).
    pub fn to_json_line(&self, line: usize) -> Result<String, RecordError> {
        serde_json::to_string(self).map_err(|e| RecordError::Encode {
            line,
            message: e.to_string(),
        })
    }
}
