#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::time::Instant;

use pan_renumber::client::{Listing, RemoteStore};
use pan_renumber::model::RemoteNode;
use pan_renumber::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Rename(String, String),
    Move(Vec<String>, String),
}

/// In-memory store: directory listings keyed by id, plus switches for
/// failing particular calls.
#[derive(Default)]
pub struct FakeStore {
    children: HashMap<String, Vec<RemoteNode>>,
    failing_lists: HashSet<String>,
    failing_renames: HashSet<String>,
    fail_move: bool,
    missing_credential: bool,
    calls: Mutex<Vec<(Instant, Call)>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_children(mut self, dir_id: &str, children: Vec<RemoteNode>) -> Self {
        self.children.insert(dir_id.to_string(), children);
        self
    }

    pub fn failing_list(mut self, dir_id: &str) -> Self {
        self.failing_lists.insert(dir_id.to_string());
        self
    }

    pub fn failing_rename(mut self, id: &str) -> Self {
        self.failing_renames.insert(id.to_string());
        self
    }

    pub fn failing_move(mut self) -> Self {
        self.fail_move = true;
        self
    }

    pub fn without_credential(mut self) -> Self {
        self.missing_credential = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::List(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn move_calls(&self) -> Vec<(Vec<String>, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Move(ids, dest) => Some((ids, dest)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn list_children(&self, directory_id: &str) -> Result<Listing, Error> {
        if self.missing_credential {
            return Err(Error::MissingCredential);
        }
        self.record(Call::List(directory_id.to_string()));
        if self.failing_lists.contains(directory_id) {
            return Err(Error::HttpStatus(503));
        }
        Ok(Listing {
            entries: self.children.get(directory_id).cloned().unwrap_or_default(),
        })
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<(), Error> {
        if self.missing_credential {
            return Err(Error::MissingCredential);
        }
        self.record(Call::Rename(id.to_string(), new_name.to_string()));
        if self.failing_renames.contains(id) {
            return Err(Error::Api {
                code: 31001,
                message: "file name conflict".to_string(),
            });
        }
        Ok(())
    }

    async fn move_files(&self, ids: &[String], destination_id: &str) -> Result<(), Error> {
        if self.missing_credential {
            return Err(Error::MissingCredential);
        }
        self.record(Call::Move(ids.to_vec(), destination_id.to_string()));
        if self.fail_move {
            return Err(Error::Api {
                code: 41013,
                message: "move failed".to_string(),
            });
        }
        Ok(())
    }
}

pub fn file(id: &str, name: &str) -> RemoteNode {
    RemoteNode {
        id: id.to_string(),
        name: name.to_string(),
        is_directory: false,
        size: 1024,
        parent_id: String::new(),
        path: String::new(),
    }
}

pub fn dir(id: &str, name: &str) -> RemoteNode {
    RemoteNode {
        is_directory: true,
        size: 0,
        ..file(id, name)
    }
}

/// Root as seeded from the host page: path is the name.
pub fn root(node: RemoteNode) -> RemoteNode {
    RemoteNode {
        path: node.name.clone(),
        ..node
    }
}
