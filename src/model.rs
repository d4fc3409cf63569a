use serde::{Deserialize, Serialize};

/// An entry in the remote tree, as listed by the API or read off the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub id: String,
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub parent_id: String,
    pub path: String,
}

impl RemoteNode {
    /// Path of a child of this node; a node without a path acts as an unnamed root.
    pub fn child_path(&self, child_name: &str) -> String {
        if self.path.is_empty() {
            child_name.to_string()
        } else {
            format!("{}/{}", self.path, child_name)
        }
    }
}

/// A non-directory node whose extension is in the recognized media set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub parent_id: String,
    pub path: String,
}

impl From<&RemoteNode> for MediaFile {
    fn from(node: &RemoteNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            size: node.size,
            parent_id: node.parent_id.clone(),
            path: if node.path.is_empty() {
                node.name.clone()
            } else {
                node.path.clone()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePlanEntry {
    pub id: String,
    pub original_name: String,
    pub new_name: String,
}

/// An entry whose rename call succeeded; only these are eligible for the move phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedItem {
    pub id: String,
    pub new_name: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationStats {
    pub rename_success: usize,
    pub rename_fail: usize,
    pub move_success: usize,
    pub move_fail: usize,
}
