use serde::Serialize;

use crate::model::{Field, Fields, ItemKind, RemoteRecord, Snapshot, Value};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct RecordJson {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub completed: bool,
    pub fields: Fields,
}

#[derive(Serialize)]
pub struct CollectionJson {
    pub kind: ItemKind,
    pub records: Vec<RecordJson>,
}

pub fn record_to_json(record: &RemoteRecord) -> RecordJson {
    RecordJson {
        id: record.id.clone(),
        parent_id: record.parent_id.clone(),
        completed: record.completed,
        fields: record.fields.clone(),
    }
}

/// Records of one kind in display order (by parent, then `order`)
pub fn ordered_records(snapshot: &Snapshot, kind: ItemKind, all: bool) -> Vec<&RemoteRecord> {
    let mut records: Vec<&RemoteRecord> = snapshot
        .records(kind)
        .iter()
        .filter(|r| all || !r.completed)
        .collect();
    records.sort_by(|a, b| a.parent_id.cmp(&b.parent_id).then(a.order.cmp(&b.order)));
    records
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One line per record: `[x] Name  field · field  (id)`
pub fn format_record_line(snapshot: &Snapshot, kind: ItemKind, record: &RemoteRecord) -> String {
    let check = if record.completed { "[x]" } else { "[ ]" };
    let name = record
        .fields
        .get(&Field::Name)
        .and_then(Value::as_text)
        .unwrap_or("");
    let meta: Vec<String> = kind
        .steps()
        .iter()
        .skip(1)
        .filter_map(|field| {
            let value = record.fields.get(field)?;
            match value {
                Value::Null | Value::Flag(false) => None,
                Value::Goal(id) => Some(format!("goal {}", goal_name(snapshot, id).unwrap_or(id))),
                Value::Flag(true) => Some(field.label().to_lowercase()),
                other => Some(other.display()),
            }
        })
        .collect();

    let mut line = format!("{} {}", check, name);
    if !meta.is_empty() {
        line.push_str("  ");
        line.push_str(&meta.join(" \u{00B7} "));
    }
    line.push_str(&format!("  ({})", record.id));
    line
}

fn goal_name<'a>(snapshot: &'a Snapshot, id: &str) -> Option<&'a str> {
    snapshot
        .records(ItemKind::Goal)
        .iter()
        .find(|g| g.id == id)
        .and_then(|g| g.fields.get(&Field::Name))
        .and_then(Value::as_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, order: i64, fields: &[(Field, Value)]) -> RemoteRecord {
        RemoteRecord {
            id: id.to_string(),
            parent_id: None,
            order,
            completed: false,
            fields: fields.iter().cloned().collect(),
        }
    }

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.records.insert(
            ItemKind::Goal,
            vec![record("g1", 0, &[(Field::Name, Value::Text("Health".into()))])],
        );
        let mut done = record("p2", 0, &[(Field::Name, Value::Text("Old".into()))]);
        done.completed = true;
        snapshot.records.insert(
            ItemKind::Project,
            vec![
                record(
                    "p1",
                    1,
                    &[
                        (Field::Name, Value::Text("Run a 10k".into())),
                        (Field::Goal, Value::Goal("g1".into())),
                        (Field::Deadline, Value::Null),
                    ],
                ),
                done,
            ],
        );
        snapshot
    }

    #[test]
    fn line_resolves_goal_names_and_skips_nulls() {
        let snapshot = snapshot();
        let p1 = &snapshot.records(ItemKind::Project)[0];
        assert_eq!(
            format_record_line(&snapshot, ItemKind::Project, p1),
            "[ ] Run a 10k  goal Health  (p1)"
        );
    }

    #[test]
    fn completed_records_hidden_unless_all() {
        let snapshot = snapshot();
        let open: Vec<&str> = ordered_records(&snapshot, ItemKind::Project, false)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(open, vec!["p1"]);
        let all: Vec<&str> = ordered_records(&snapshot, ItemKind::Project, true)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(all, vec!["p2", "p1"]);
    }
}
