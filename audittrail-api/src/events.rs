//! Audit event types
//!
//! This module holds the query filters sent to the audit events endpoint and the
//! schema that each returned event is decoded into. Decoding is strict about the
//! fields every event must carry (`timestamp`) and lenient about everything else:
//! unknown fields are ignored and optional objects may be missing.
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Sort order requested from the service (newest first)
pub const SORT_NEWEST_FIRST: &str = "-timestamp";

/// Filters for an audit event query
///
/// Absent and empty filters are never sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditEventQuery {
    /// Event name (e.g. "Create Project")
    pub event: Option<String>,
    /// Name of the user that performed the action
    pub actor_name: Option<String>,
    /// Name of the object that received the action
    pub target_name: Option<String>,
    /// Name of the project the action happened in
    pub project_name: Option<String>,
    /// Lower time bound, epoch milliseconds (UTC)
    pub start_timestamp: Option<i64>,
    /// Upper time bound, epoch milliseconds (UTC)
    pub end_timestamp: Option<i64>,
}

impl AuditEventQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    #[must_use]
    pub fn with_actor_name(mut self, actor_name: impl Into<String>) -> Self {
        self.actor_name = Some(actor_name.into());
        self
    }

    #[must_use]
    pub fn with_target_name(mut self, target_name: impl Into<String>) -> Self {
        self.target_name = Some(target_name.into());
        self
    }

    #[must_use]
    pub fn with_project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = Some(project_name.into());
        self
    }

    /// Restrict the query to events between two epoch-millisecond bounds
    #[must_use]
    pub fn with_time_range(mut self, start: Option<i64>, end: Option<i64>) -> Self {
        self.start_timestamp = start;
        self.end_timestamp = end;
        self
    }

    /// Filter parameters in the service's naming, skipping absent and empty values
    #[must_use]
    pub fn filter_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(6);

        let text_filters = [
            ("event", &self.event),
            ("actorName", &self.actor_name),
            ("targetName", &self.target_name),
            ("withinProjectName", &self.project_name),
        ];
        for (key, value) in text_filters {
            if let Some(value) = value
                && !value.trim().is_empty()
            {
                params.push((key, value.clone()));
            }
        }

        if let Some(start) = self.start_timestamp {
            params.push(("startTimestamp", start.to_string()));
        }
        if let Some(end) = self.end_timestamp {
            params.push(("endTimestamp", end.to_string()));
        }

        params
    }
}

/// Reference to an entity (user, project, dataset, ...)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub entity_type: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
}

impl EntityRef {
    /// Display name, falling back to the id
    #[must_use]
    pub fn name_or_id(&self) -> Option<&str> {
        self.name.as_deref().or(self.id.as_deref())
    }

    /// Whether the entity type equals any of `types`
    #[must_use]
    pub fn is_type(&self, types: &[&str]) -> bool {
        self.entity_type
            .as_deref()
            .is_some_and(|t| types.contains(&t))
    }
}

/// Action performed
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub event_name: Option<String>,
}

/// An item added to or removed from a collection field
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NamedValue {
    pub name: Option<String>,
}

/// One changed field of a target
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field_name: Option<String>,
    #[serde(default)]
    pub before: Value,
    #[serde(default)]
    pub after: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub added: Vec<NamedValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub removed: Vec<NamedValue>,
}

/// Object that received the action, with its field changes
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default, deserialize_with = "null_as_default")]
    pub entity: EntityRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_changes: Vec<FieldChange>,
}

/// Entity indirectly affected by the action
pub type AffectedEntity = EntityRef;

/// A single audit trail event
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Epoch milliseconds (UTC), fractional values truncated
    #[serde(deserialize_with = "millis_from_number")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actor: EntityRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: Action,
    /// Scope the action happened in (usually a project)
    #[serde(default, rename = "in", deserialize_with = "null_as_default")]
    pub within: EntityRef,
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<Target>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub affecting: Vec<AffectedEntity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
}

impl AuditEvent {
    /// Event time as a UTC datetime, `None` when out of chrono's range
    #[must_use]
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
    }

    /// Metadata value by key
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key).filter(|v| !v.is_null())
    }
}

/// Explicit `null` decodes the same as a missing key
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Epoch milliseconds from an integer or a float
fn millis_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(millis) = number.as_i64() {
        return Ok(millis);
    }
    match number.as_f64() {
        Some(millis) if millis.is_finite() && millis.abs() < i64::MAX as f64 => {
            Ok(millis.trunc() as i64)
        }
        _ => Err(D::Error::custom(format!(
            "timestamp {number} is out of range"
        ))),
    }
}

/// Raw response body of the audit events endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct EventsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<Value>,
}

/// One page of audit events
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Events in the order the service returned them (newest first)
    pub events: Vec<AuditEvent>,
    /// Offset this page was requested at
    pub offset: u64,
    /// Offset of the next page, `None` when this is the last page
    pub next_offset: Option<u64>,
}

impl PageResult {
    /// Build a page, deriving the continuation from the page size.
    ///
    /// A full page means more events may follow; a short page is the last one.
    #[must_use]
    pub fn new(events: Vec<AuditEvent>, offset: u64, limit: u32) -> Self {
        let received = events.len() as u64;
        let next_offset = if received > 0 && received >= u64::from(limit) {
            Some(offset.saturating_add(received))
        } else {
            None
        };
        Self {
            events,
            offset,
            next_offset,
        }
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.next_offset.is_none() || self.events.is_empty()
    }
}

/// Decode raw event objects into [`AuditEvent`]s, naming the first bad one
pub(crate) fn decode_events(
    raw_events: Vec<Value>,
    offset: u64,
) -> Result<Vec<AuditEvent>, String> {
    raw_events
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            serde_json::from_value::<AuditEvent>(raw).map_err(|e| {
                format!(
                    "audit event #{} of page at offset {offset} does not match the expected schema: {e}",
                    offset.saturating_add(index as u64)
                )
            })
        })
        .collect()
}
