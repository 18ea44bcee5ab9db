//! Splits a Unity YAML document into addressable records.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, SceneError};
use crate::record::{Record, Reference, NULL_FILE_ID};

/// `--- !u!<classID> &<fileID>` optionally followed by `stripped`.
fn separator_re() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| {
        Regex::new(r"^---[^&]*&(?P<id>\S+)(?P<rest>.*)$")
            .expect("separator pattern is valid")
    })
}

/// Parsed separator line preceding each record.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Separator {
    id: String,
    stripped: bool,
}

impl Separator {
    fn parse(line: &str) -> Option<Separator> {
        let caps = separator_re().captures(line)?;
        Some(Separator {
            id: caps.name("id")?.as_str().to_string(),
            stripped: caps
                .name("rest")
                .map(|m| m.as_str().split_whitespace().any(|w| w == "stripped"))
                .unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    /// Placeholder for an object that lives in a prefab asset.
    pub stripped: bool,
    pub record: Record,
}

/// Where the top of the containment tree comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roots {
    /// Listed by a trailing `SceneRoots` manifest, in order.
    Declared(Vec<Reference>),
    /// No manifest; parentless transforms are the roots.
    Implicit,
}

/// One loaded document: its records plus how to find its roots.
#[derive(Debug)]
pub struct Scene {
    pub store: RecordStore,
    pub roots: Roots,
}

/// Arena of records in document order, addressable by identifier.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<StoredRecord>,
    index: HashMap<String, usize>,
}

impl RecordStore {
    /// Split `text` on `---` separator lines and parse every block.
    ///
    /// The last block is the scene manifest: a `SceneRoots` record is kept out
    /// of the store and supplies the declared roots. Any other trailing record
    /// is stored like the rest and the roots are left implicit.
    pub fn load(text: &str) -> Result<Scene> {
        let mut store = RecordStore::default();
        let mut current: Option<Separator> = None;
        let mut buffer = String::new();

        for (number, line) in text.lines().enumerate() {
            if line.starts_with("---") {
                let header = Separator::parse(line).ok_or_else(|| {
                    SceneError::malformed(format!(
                        "line {}: separator has no '&' identifier",
                        number + 1
                    ))
                })?;
                // Whatever precedes the first separator is the %YAML/%TAG preamble.
                if let Some(previous) = current.replace(header) {
                    let record = Record::parse(&previous.id, &buffer)?;
                    store.insert(previous, record)?;
                }
                buffer.clear();
            } else if current.is_none() && line.starts_with('%') {
                continue;
            } else {
                buffer.push_str(line);
                buffer.push('\n');
            }
        }

        let roots = match current {
            Some(header) => {
                let record = Record::parse(&header.id, &buffer)?;
                match record {
                    Record::SceneRoots(manifest) => Roots::Declared(manifest.roots),
                    other => {
                        store.insert(header, other)?;
                        Roots::Implicit
                    }
                }
            }
            None if buffer.trim().is_empty() => Roots::Declared(Vec::new()),
            None => match Record::parse("manifest", &buffer)? {
                Record::SceneRoots(manifest) => Roots::Declared(manifest.roots),
                other => {
                    return Err(SceneError::malformed(format!(
                        "{} record without a '---' separator",
                        other.kind()
                    )))
                }
            },
        };

        tracing::trace!(records = store.len(), "document split");
        Ok(Scene { store, roots })
    }

    fn insert(&mut self, header: Separator, record: Record) -> Result<()> {
        if self.index.contains_key(&header.id) {
            return Err(SceneError::malformed(format!(
                "identifier '{}' appears more than once",
                header.id
            )));
        }
        self.index.insert(header.id.clone(), self.records.len());
        self.records.push(StoredRecord {
            id: header.id,
            stripped: header.stripped,
            record,
        });
        Ok(())
    }

    /// Look up the record a reference points to.
    pub fn resolve(&self, reference: &Reference) -> Result<&Record> {
        self.resolve_id(&reference.file_id)
    }

    pub fn resolve_id(&self, id: &str) -> Result<&Record> {
        if id == NULL_FILE_ID {
            return Err(SceneError::InvalidReference);
        }
        self.get(id)
            .map(|stored| &stored.record)
            .ok_or_else(|| SceneError::DanglingReference(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&StoredRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    /// Records in document order.
    pub fn iter(&self) -> impl Iterator<Item = &StoredRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
