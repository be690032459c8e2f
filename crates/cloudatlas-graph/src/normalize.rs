//! Conversion of driver-native values into plain JSON.
//!
//! Nodes and relationships are replaced by their property maps and Bolt
//! integers become native `i64` numbers, so nothing downstream ever sees an
//! opaque driver handle. Temporal values become ISO-8601 strings.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use neo4rs::{BoltList, BoltMap, BoltType};
use serde_json::{json, Map, Number, Value};

use crate::client::GraphError;
use crate::query::Record;

/// Normalize the named columns of a row into a [`Record`].
pub fn record_from_row(row: &neo4rs::Row, columns: &[&'static str]) -> Result<Record, GraphError> {
    let mut record = Record::new();
    for &column in columns {
        let value: BoltType = row.get(column).map_err(|e| {
            GraphError::Serialization(format!("Failed to read column {column}: {e}"))
        })?;
        record.insert(column.to_string(), normalize_value(value));
    }
    Ok(record)
}

/// Convert a single driver value to JSON.
pub fn normalize_value(value: BoltType) -> Value {
    match value {
        BoltType::Null(_) => Value::Null,
        BoltType::Boolean(b) => Value::Bool(b.value),
        BoltType::Integer(i) => Value::Number(i.value.into()),
        BoltType::Float(f) => Number::from_f64(f.value)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        BoltType::String(s) => Value::String(s.value),
        BoltType::List(list) => normalize_list(list),
        BoltType::Map(map) => Value::Object(normalize_map(map)),
        BoltType::Node(node) => Value::Object(normalize_map(node.properties)),
        BoltType::Relation(rel) => Value::Object(normalize_map(rel.properties)),
        BoltType::UnboundedRelation(rel) => Value::Object(normalize_map(rel.properties)),
        BoltType::Path(path) => json!({
            "nodes": normalize_list(path.nodes),
            "relationships": normalize_list(path.rels),
        }),
        BoltType::Point2D(p) => json!({"srid": p.sr_id.value, "x": p.x.value, "y": p.y.value}),
        BoltType::Point3D(p) => json!({
            "srid": p.sr_id.value,
            "x": p.x.value,
            "y": p.y.value,
            "z": p.z.value,
        }),
        BoltType::Bytes(b) => Value::Array(b.value.iter().map(|byte| Value::from(*byte)).collect()),
        date @ BoltType::Date(_) => temporal(date, |d: NaiveDate| d.to_string()),
        datetime @ BoltType::DateTime(_) => {
            temporal(datetime, |dt: DateTime<FixedOffset>| dt.to_rfc3339())
        }
        local @ BoltType::LocalDateTime(_) => temporal(local, |dt: NaiveDateTime| {
            dt.format(LOCAL_DATETIME_FORMAT).to_string()
        }),
        zoned @ BoltType::DateTimeZoneId(_) => {
            temporal(zoned, |(dt, zone): (NaiveDateTime, String)| {
                format!("{}[{zone}]", dt.format(LOCAL_DATETIME_FORMAT))
            })
        }
        time @ (BoltType::Time(_) | BoltType::LocalTime(_)) => {
            temporal(time, |(t, offset): (NaiveTime, Option<FixedOffset>)| match offset {
                Some(offset) => format!("{t}{offset}"),
                None => t.to_string(),
            })
        }
        duration @ BoltType::Duration(_) => temporal(duration, |d: std::time::Duration| {
            format!("PT{}S", d.as_secs_f64())
        }),
    }
}

const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Render a temporal value through the driver's chrono conversion. A value
/// the driver cannot represent becomes null.
fn temporal<T>(value: BoltType, render: impl FnOnce(T) -> String) -> Value
where
    T: TryFrom<BoltType>,
{
    T::try_from(value).map_or(Value::Null, |t| Value::String(render(t)))
}

fn normalize_list(list: BoltList) -> Value {
    Value::Array(list.value.into_iter().map(normalize_value).collect())
}

fn normalize_map(map: BoltMap) -> Map<String, Value> {
    map.value
        .into_iter()
        .map(|(key, value)| (key.value, normalize_value(value)))
        .collect()
}
