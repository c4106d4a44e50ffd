//! Flattening of audit events into fixed CSV rows
//!
//! Every row has the same 15 columns whatever the event type, so the file keeps
//! a stable schema. Values the event does not carry become empty cells.
//! Metadata keys other than `command`, `schedule` and `query` are not exported.
use crate::datetime::format_utc_millis;
use audittrail_api::{AuditEvent, FieldChange, NamedValue, Target};
use serde_json::Value;

/// CSV header, in column order
pub const CSV_HEADERS: [&str; 15] = [
    "DATE & TIME (UTC)",
    "USER NAME",
    "EVENT",
    "TARGET NAME",
    "PROJECT NAME",
    "DATASET NAME",
    "FILE NAME",
    "TARGET USER",
    "FEATURE FLAG",
    "OLD VALUE",
    "NEW VALUE",
    "ADDED",
    "REMOVED",
    "JOBS",
    "COMMAND",
];

/// One audit event flattened into the export columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRow {
    pub timestamp: Option<String>,
    pub user_name: Option<String>,
    pub event: Option<String>,
    pub target_name: Option<String>,
    pub project_name: Option<String>,
    pub dataset_name: Option<String>,
    pub file_name: Option<String>,
    pub target_user: Option<String>,
    pub feature_flag: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub added: Option<String>,
    pub removed: Option<String>,
    pub jobs: Option<String>,
    pub command: Option<String>,
}

impl ExportRow {
    /// Cells in [`CSV_HEADERS`] order, absent values as empty strings
    #[must_use]
    pub fn to_record(&self) -> [&str; 15] {
        [
            &self.timestamp,
            &self.user_name,
            &self.event,
            &self.target_name,
            &self.project_name,
            &self.dataset_name,
            &self.file_name,
            &self.target_user,
            &self.feature_flag,
            &self.old_value,
            &self.new_value,
            &self.added,
            &self.removed,
            &self.jobs,
            &self.command,
        ]
        .map(|cell| cell.as_deref().unwrap_or(""))
    }

    /// Apply the first target of the event
    fn apply_target(&mut self, target: &Target, event: &AuditEvent) {
        let entity = &target.entity;
        let name = entity.name_or_id().map(str::to_string);
        let change = target.field_changes.first();

        self.target_name = name.clone();
        if let Some(change) = change {
            self.old_value = render_value(&change.before);
            self.new_value = render_value(&change.after);
            self.added = Some(join_names(&change.added));
            self.removed = Some(join_names(&change.removed));
        }

        if entity.is_type(&["user"]) {
            self.target_user = name;
        } else if entity.is_type(&["dataset", "datasetSnapshot"]) {
            self.dataset_name = name;
            if change.is_some_and(is_file_path_change) {
                self.file_name = change.and_then(|c| render_value(&c.after));
            }
        } else if entity.is_type(&["scheduledRun", "job"]) {
            self.jobs = name;
            self.command = event.metadata_value("command").and_then(render_value);
            if let Some(schedule) = event.metadata_value("schedule").and_then(render_value) {
                self.new_value = Some(schedule);
            }
        } else if entity.is_type(&["featureFlag"]) {
            self.feature_flag = name;
        }
    }
}

impl From<&AuditEvent> for ExportRow {
    fn from(event: &AuditEvent) -> Self {
        let mut row = ExportRow {
            timestamp: format_utc_millis(event.timestamp),
            user_name: event.actor.name_or_id().map(str::to_string),
            event: event.action.event_name.clone(),
            ..Default::default()
        };

        if event.within.is_type(&["project"]) {
            row.project_name = event.within.name_or_id().map(str::to_string);
        }

        if let Some(target) = event.targets.first() {
            row.apply_target(target, event);
        }

        for affected in &event.affecting {
            if affected.is_type(&["dataset"]) {
                row.dataset_name = affected.name_or_id().map(str::to_string);
            } else if affected.is_type(&["appliedUser", "user"]) {
                row.target_user = affected.name_or_id().map(str::to_string);
            } else if affected.is_type(&["file"]) {
                row.file_name = affected.name.clone();
            }
        }

        if row.command.as_deref().is_none_or(str::is_empty) {
            row.command = event.metadata_value("query").and_then(render_value);
        }

        row
    }
}

fn is_file_path_change(change: &FieldChange) -> bool {
    change.field_name.as_deref() == Some("filePath")
}

/// Comma-joined names, missing names as empty entries
fn join_names(values: &[NamedValue]) -> String {
    values
        .iter()
        .map(|v| v.name.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",")
}

/// Cell text for a JSON value: strings raw, null absent, anything else as compact JSON
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
