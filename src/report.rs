//! Unused script report built from `.meta` sidecar files.

use serde::Serialize;
use serde_yaml::Value;

use crate::error::MetaError;
use crate::harvest::ScriptUsage;
use crate::record::scalar_text;

pub const CSV_HEADER: &str = "RelativePath,GUID";

/// A script asset and the GUID its `.meta` file assigns to it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MetadataPair {
    /// Project-relative path of the asset, `.meta` suffix removed.
    pub path: String,
    pub guid: String,
}

impl MetadataPair {
    pub fn new(path: impl Into<String>, guid: impl Into<String>) -> Self {
        MetadataPair {
            path: path.into(),
            guid: guid.into(),
        }
    }
}

/// Extract the `guid` field of a `.meta` file.
pub fn read_meta_guid(text: &str) -> Result<String, MetaError> {
    let value: Value = serde_yaml::from_str(text)?;
    value
        .get("guid")
        .and_then(scalar_text)
        .filter(|guid| !guid.is_empty())
        .ok_or(MetaError::MissingGuid)
}

/// Pairs whose GUID no scene uses, in discovery order. Only meaningful once
/// every scene has been harvested into `usage`.
pub fn report(usage: &ScriptUsage, pairs: &[MetadataPair]) -> Vec<MetadataPair> {
    pairs
        .iter()
        .filter(|pair| !usage.contains(&pair.guid))
        .cloned()
        .collect()
}

pub fn render_csv(unused: &[MetadataPair]) -> String {
    let mut out = String::from(CSV_HEADER);
    for pair in unused {
        out.push('\n');
        out.push_str(&pair.path);
        out.push(',');
        out.push_str(&pair.guid);
    }
    out
}
