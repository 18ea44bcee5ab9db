//! Scene text shared by the unit tests.

pub const HEADER: &str = "%YAML 1.1\n%TAG !u! tag:unity3d.com,2011:\n";

/// Identifier Unity gives the `SceneRoots` manifest.
pub const MANIFEST_ID: &str = "9223372036854775807";

/// Root -> Child, one declared root.
pub const SIMPLE_SCENE: &str = "%YAML 1.1
%TAG !u! tag:unity3d.com,2011:
--- !u!4 &1
Transform:
  m_ObjectHideFlags: 0
  m_GameObject: {fileID: 2}
  m_LocalPosition: {x: 0, y: 0, z: 0}
  m_Children:
  - {fileID: 3}
  m_Father: {fileID: 0}
--- !u!1 &2
GameObject:
  m_ObjectHideFlags: 0
  m_Component:
  - component: {fileID: 1}
  m_Layer: 0
  m_Name: Root
  m_IsActive: 1
--- !u!4 &3
Transform:
  m_GameObject: {fileID: 4}
  m_Children: []
  m_Father: {fileID: 1}
--- !u!1 &4
GameObject:
  m_Name: Child
--- !u!1660057539 &9223372036854775807
SceneRoots:
  m_ObjectHideFlags: 0
  m_Roots:
  - {fileID: 1}
";

/// Build a scene document from `(id, class, body)` records. `roots` appends a
/// `SceneRoots` manifest; `None` leaves the last record as the trailing block.
pub fn document(records: &[(&str, u32, &str)], roots: Option<&[&str]>) -> String {
    let mut text = String::from(HEADER);
    for (id, class, body) in records {
        text.push_str(&format!("--- !u!{} &{}\n", class, id));
        text.push_str(body);
    }
    if let Some(roots) = roots {
        text.push_str(&format!("--- !u!1660057539 &{}\nSceneRoots:\n", MANIFEST_ID));
        if roots.is_empty() {
            text.push_str("  m_Roots: []\n");
        } else {
            text.push_str("  m_Roots:\n");
            for root in roots {
                text.push_str(&format!("  - {{fileID: {}}}\n", root));
            }
        }
    }
    text
}

/// Transform record body.
pub fn transform(game_object: &str, children: &[&str]) -> String {
    let mut body = format!("Transform:\n  m_GameObject: {{fileID: {}}}\n", game_object);
    if children.is_empty() {
        body.push_str("  m_Children: []\n");
    } else {
        body.push_str("  m_Children:\n");
        for child in children {
            body.push_str(&format!("  - {{fileID: {}}}\n", child));
        }
    }
    body
}

pub fn game_object(name: &str) -> String {
    format!("GameObject:\n  m_Name: {}\n", name)
}

pub fn mono_behaviour(game_object: &str, guid: &str) -> String {
    format!(
        "MonoBehaviour:\n  m_GameObject: {{fileID: {}}}\n  m_Enabled: 1\n  m_Script: {{fileID: 11500000, guid: {}, type: 3}}\n",
        game_object, guid
    )
}
