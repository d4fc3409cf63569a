use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Error;
use crate::media::looks_like_directory;
use crate::model::RemoteNode;
use crate::resolver::{NavigationSnapshot, PageSnapshot};

/// A row the host page shows for the current directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageEntry {
    /// Stable row identifier, normally the store's file id.
    #[serde(default)]
    pub row_key: Option<String>,
    #[serde(default)]
    pub name: String,
    /// Folder flag when the page marks it (icon, data attribute, ...).
    #[serde(default)]
    pub is_directory: Option<bool>,
}

/// The page the operator is looking at.
pub trait HostPage {
    fn visible_rows(&self) -> Vec<PageEntry>;

    /// Bare file-name labels, for pages that render no recognisable rows.
    fn filename_labels(&self) -> Vec<String> {
        Vec::new()
    }

    fn navigation(&self) -> NavigationSnapshot;

    fn page_snapshot(&self) -> PageSnapshot;
}

/// Turn the visible rows into scan roots. Without rows, file-name labels
/// that contain a dot are taken as plain files.
pub fn seed_roots(host: &dyn HostPage) -> Vec<RemoteNode> {
    let rows = host.visible_rows();
    if rows.is_empty() {
        return host
            .filename_labels()
            .into_iter()
            .enumerate()
            .filter(|(_, name)| name.contains('.'))
            .map(|(index, name)| RemoteNode {
                id: format!("direct-{}", index),
                path: name.clone(),
                name,
                is_directory: false,
                size: 0,
                parent_id: String::new(),
            })
            .collect();
    }

    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let name = row.name.trim().to_string();
            if name.is_empty() {
                debug!("Dropping unnamed row {}", index);
                return None;
            }
            let id = row
                .row_key
                .filter(|key| !key.is_empty())
                .unwrap_or_else(|| format!("row-{}", index));
            let is_directory = row
                .is_directory
                .unwrap_or_else(|| looks_like_directory(&name));
            debug!(
                "Root {} ({}) {}",
                name,
                id,
                if is_directory { "folder" } else { "file" }
            );
            Some(RemoteNode {
                id,
                path: name.clone(),
                name,
                is_directory,
                size: 0,
                parent_id: String::new(),
            })
        })
        .collect()
}

/// On-disk capture of the host page, as written by a browser helper.
#[derive(Debug, Clone, Deserialize)]
struct HostCapture {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    rows: Vec<PageEntry>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    links: Vec<String>,
    #[serde(default)]
    embedded: BTreeMap<String, Value>,
    #[serde(default)]
    scripts: Vec<String>,
    #[serde(default)]
    storage: BTreeMap<String, String>,
    #[serde(default)]
    requests: Vec<String>,
}

/// A host page frozen at capture time.
#[derive(Debug, Clone)]
pub struct SnapshotPage {
    navigation: NavigationSnapshot,
    page: PageSnapshot,
    rows: Vec<PageEntry>,
    labels: Vec<String>,
    requests: Vec<String>,
}

impl SnapshotPage {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let capture: HostCapture = serde_json::from_str(text)?;
        Ok(Self {
            navigation: NavigationSnapshot::parse(&capture.url)?,
            page: PageSnapshot {
                title: capture.title,
                links: capture.links,
                embedded: capture.embedded.into_iter().collect(),
                scripts: capture.scripts,
                storage: capture.storage.into_iter().collect(),
            },
            rows: capture.rows,
            labels: capture.labels,
            requests: capture.requests,
        })
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Request URLs the page issued, oldest first.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl HostPage for SnapshotPage {
    fn visible_rows(&self) -> Vec<PageEntry> {
        self.rows.clone()
    }

    fn filename_labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn navigation(&self) -> NavigationSnapshot {
        self.navigation.clone()
    }

    fn page_snapshot(&self) -> PageSnapshot {
        self.page.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_seed_roots_with_folder_fallback() {
        let page = SnapshotPage::from_json(
            r#"{
                "url": "https://pan.quark.cn/list#/list/all",
                "rows": [
                    {"row_key": "f1", "name": "video.mp4"},
                    {"row_key": "d1", "name": "S1"},
                    {"row_key": "d2", "name": "Season.2024", "is_directory": true},
                    {"name": "clip.MKV"},
                    {"row_key": "x", "name": "  "}
                ]
            }"#,
        )
        .unwrap();

        let roots = seed_roots(&page);
        assert_eq!(roots.len(), 4);
        assert!(!roots[0].is_directory);
        assert!(roots[1].is_directory);
        assert!(roots[2].is_directory);
        assert_eq!(roots[3].id, "row-3");
    }

    #[test]
    fn labels_used_when_no_rows() {
        let page = SnapshotPage::from_json(
            r#"{"url": "https://pan.quark.cn/list", "labels": ["a.mp4", "Folder", "b.mkv"]}"#,
        )
        .unwrap();
        let roots = seed_roots(&page);
        let ids: Vec<_> = roots.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["direct-0", "direct-2"]);
        assert!(roots.iter().all(|r| !r.is_directory));
    }

    #[test]
    fn capture_requires_valid_url() {
        assert!(matches!(
            SnapshotPage::from_json(r#"{"url": "not a url"}"#),
            Err(Error::InvalidUrl(_))
        ));
    }
}
