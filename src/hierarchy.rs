//! Renders the transform tree of a scene as indented object names.

use crate::error::{Result, SceneError};
use crate::record::{Record, Reference, Transform};
use crate::store::{RecordStore, Roots, Scene};

pub const DEFAULT_INDENT: &str = "--";

/// Dump the subtree rooted at transform `id`, one line per object, children
/// in `m_Children` order.
pub fn dump_node(id: &str, store: &RecordStore, depth: usize, indent: &str) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut ancestors = Vec::new();
    walk(store, id, depth, indent, &mut ancestors, &mut lines)?;
    Ok(lines)
}

fn walk<'a>(
    store: &'a RecordStore,
    id: &'a str,
    depth: usize,
    indent: &str,
    ancestors: &mut Vec<&'a str>,
    lines: &mut Vec<String>,
) -> Result<()> {
    if ancestors.contains(&id) {
        return Err(SceneError::CyclicReference(id.to_string()));
    }

    let transform = container(store, id)?;
    let name = object_name(store, id, transform)?;
    lines.push(format!("{}{}", indent.repeat(depth), name));

    ancestors.push(id);
    for child in transform.children.iter().filter(|child| !child.is_null()) {
        walk(store, &child.file_id, depth + 1, indent, ancestors, lines)?;
    }
    ancestors.pop();

    Ok(())
}

fn container<'a>(store: &'a RecordStore, id: &str) -> Result<&'a Transform> {
    let record = store.resolve_id(id)?;
    record.as_container().ok_or_else(|| SceneError::UnexpectedKind {
        id: id.to_string(),
        expected: "Transform",
        found: record.kind().to_string(),
    })
}

fn object_name<'a>(store: &'a RecordStore, id: &str, transform: &Transform) -> Result<&'a str> {
    let reference = transform
        .game_object
        .as_ref()
        .filter(|reference| !reference.is_null())
        .ok_or_else(|| SceneError::MissingField {
            id: id.to_string(),
            field: "m_GameObject",
        })?;

    match store.resolve(reference)? {
        Record::GameObject(game_object) => {
            game_object
                .name
                .as_deref()
                .ok_or_else(|| SceneError::MissingField {
                    id: reference.file_id.clone(),
                    field: "m_Name",
                })
        }
        other => Err(SceneError::UnexpectedKind {
            id: reference.file_id.clone(),
            expected: "GameObject",
            found: other.kind().to_string(),
        }),
    }
}

/// Dump every root tree in order, separated by a blank line.
pub fn dump_roots(roots: &[Reference], store: &RecordStore, indent: &str) -> Result<String> {
    let mut trees = Vec::with_capacity(roots.len());
    for root in roots.iter().filter(|root| !root.is_null()) {
        trees.push(dump_node(&root.file_id, store, 0, indent)?.join("\n"));
    }
    Ok(trees.join("\n\n"))
}

/// Roots of a scene: the manifest's list, or the parentless transforms when
/// the document predates `SceneRoots`.
pub fn scene_roots(scene: &Scene) -> Vec<Reference> {
    match &scene.roots {
        Roots::Declared(roots) => roots.clone(),
        Roots::Implicit => {
            let mut top: Vec<(i64, Reference)> = scene
                .store
                .iter()
                .filter(|stored| !stored.stripped)
                .filter_map(|stored| {
                    let transform = stored.record.as_container()?;
                    transform.is_top_level().then(|| {
                        (
                            transform.root_order.unwrap_or(i64::MAX),
                            Reference::local(stored.id.clone()),
                        )
                    })
                })
                .collect();
            // Stable, so document order breaks ties
            top.sort_by_key(|(order, _)| *order);
            top.into_iter().map(|(_, reference)| reference).collect()
        }
    }
}

pub fn dump_scene(scene: &Scene, indent: &str) -> Result<String> {
    dump_roots(&scene_roots(scene), &scene.store, indent)
}
