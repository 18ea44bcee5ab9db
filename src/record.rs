//! Typed view of the records found in a Unity YAML document.
//!
//! Each block between `--- !u!<class> &<id>` separators holds a single-key
//! mapping whose key is the record kind. Only the kinds the hierarchy dump and
//! the script harvest need are modelled; everything else is kept raw.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_yaml::Value;

use crate::error::{Result, SceneError};

/// `fileID` value meaning "no target".
pub const NULL_FILE_ID: &str = "0";

/// A `{fileID: ..., guid: ..., type: ...}` pointer to another record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Reference {
    #[serde(rename = "fileID", deserialize_with = "scalar")]
    pub file_id: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub guid: Option<String>,
}

impl Reference {
    pub fn local(file_id: impl Into<String>) -> Self {
        Reference {
            file_id: file_id.into(),
            guid: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.file_id == NULL_FILE_ID
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameObject {
    #[serde(rename = "m_Name", default, deserialize_with = "present_scalar")]
    pub name: Option<String>,
}

/// Shared layout of `Transform` and `RectTransform`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Transform {
    #[serde(rename = "m_GameObject", default)]
    pub game_object: Option<Reference>,
    #[serde(rename = "m_Children", default, deserialize_with = "sequence")]
    pub children: Vec<Reference>,
    #[serde(rename = "m_Father", default)]
    pub father: Option<Reference>,
    #[serde(rename = "m_RootOrder", default)]
    pub root_order: Option<i64>,
}

impl Transform {
    /// A transform without a parent sits at the top of the scene.
    pub fn is_top_level(&self) -> bool {
        self.father.as_ref().map_or(true, Reference::is_null)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonoBehaviour {
    #[serde(rename = "m_Script", default)]
    pub script: Option<Reference>,
}

impl MonoBehaviour {
    /// GUID of the script asset, if the component still points at one.
    pub fn script_guid(&self) -> Option<&str> {
        self.script
            .as_ref()
            .and_then(|script| script.guid.as_deref())
            .filter(|guid| !guid.is_empty())
    }
}

/// Trailing manifest listing the top-level objects of a scene.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SceneRoots {
    #[serde(rename = "m_Roots", default, deserialize_with = "sequence")]
    pub roots: Vec<Reference>,
}

#[derive(Debug, Clone)]
pub enum Record {
    GameObject(GameObject),
    Transform(Transform),
    RectTransform(Transform),
    MonoBehaviour(MonoBehaviour),
    SceneRoots(SceneRoots),
    Unknown { kind: String, fields: Value },
}

impl Record {
    /// Parse one block of YAML text into a record. `id` is only used for
    /// error context.
    pub fn parse(id: &str, text: &str) -> Result<Record> {
        let value: Value = serde_yaml::from_str(text).map_err(|source| SceneError::RecordParse {
            id: id.to_string(),
            source,
        })?;

        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => return Err(SceneError::malformed(format!("record '{}' is empty", id))),
            _ => {
                return Err(SceneError::malformed(format!(
                    "record '{}' is not a mapping",
                    id
                )))
            }
        };

        if mapping.len() != 1 {
            return Err(SceneError::malformed(format!(
                "record '{}' has {} top-level keys, expected exactly one kind",
                id,
                mapping.len()
            )));
        }

        let Some((key, fields)) = mapping.into_iter().next() else {
            return Err(SceneError::malformed(format!("record '{}' is empty", id)));
        };
        let Value::String(kind) = key else {
            return Err(SceneError::malformed(format!(
                "record '{}' has a non-string kind",
                id
            )));
        };

        Record::from_fields(kind, fields, text).map_err(|source| SceneError::RecordParse {
            id: id.to_string(),
            source,
        })
    }

    fn from_fields(
        kind: String,
        fields: Value,
        text: &str,
    ) -> std::result::Result<Record, serde_yaml::Error> {
        // `Kind:` with nothing under it is an empty field mapping.
        let fields = match fields {
            Value::Null => Value::Mapping(Default::default()),
            other => other,
        };

        let record = match kind.as_str() {
            "GameObject" => {
                // A plain `m_Name: 1.50` resolves to a number; the name is the text as written.
                let resolved = matches!(
                    fields.get("m_Name"),
                    Some(Value::Number(_) | Value::Bool(_) | Value::Null)
                );
                let mut game_object: GameObject = serde_yaml::from_value(fields)?;
                if resolved {
                    if let Some(raw) = plain_field(text, "m_Name") {
                        game_object.name = Some(raw.to_string());
                    }
                }
                Record::GameObject(game_object)
            }
            "Transform" => Record::Transform(serde_yaml::from_value(fields)?),
            "RectTransform" => Record::RectTransform(serde_yaml::from_value(fields)?),
            "MonoBehaviour" => Record::MonoBehaviour(serde_yaml::from_value(fields)?),
            "SceneRoots" => Record::SceneRoots(serde_yaml::from_value(fields)?),
            _ => Record::Unknown { kind, fields },
        };
        Ok(record)
    }

    pub fn kind(&self) -> &str {
        match self {
            Record::GameObject(_) => "GameObject",
            Record::Transform(_) => "Transform",
            Record::RectTransform(_) => "RectTransform",
            Record::MonoBehaviour(_) => "MonoBehaviour",
            Record::SceneRoots(_) => "SceneRoots",
            Record::Unknown { kind, .. } => kind,
        }
    }

    /// Records that take part in the containment tree.
    pub fn as_container(&self) -> Option<&Transform> {
        match self {
            Record::Transform(transform) | Record::RectTransform(transform) => Some(transform),
            _ => None,
        }
    }
}

/// Source text of a top-level field holding a one-line plain scalar.
fn plain_field<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let mut depth = None;
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if indent == 0 || *depth.get_or_insert(indent) != indent {
            continue;
        }
        let Some(rest) = line[indent..]
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
        else {
            continue;
        };
        let value = rest.split(" #").next().unwrap_or(rest);
        return Some(value.trim());
    }
    None
}

/// Render a YAML scalar as text. Unity writes identifiers and names unquoted,
/// so `fileID: 123` and `m_Name: 2` arrive as numbers.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_text(&value).ok_or_else(|| de::Error::custom("expected a scalar value"))
}

fn present_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar(deserializer).map(Some)
}

fn optional_scalar<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        other => scalar_text(&other)
            .map(Some)
            .ok_or_else(|| de::Error::custom("expected a scalar value")),
    }
}

fn sequence<'de, D>(deserializer: D) -> std::result::Result<Vec<Reference>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Reference>>::deserialize(deserializer)?.unwrap_or_default())
}
