use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::media::looks_like_directory;
use crate::model::RemoteNode;

use super::Listing;

const DEFAULT_MESSAGE: &str = "unknown error";

fn server_message(body: &Value) -> String {
    ["message", "msg"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .filter(|message| !message.is_empty())
        .unwrap_or(DEFAULT_MESSAGE)
        .to_string()
}

fn parse_body(text: &str) -> Result<Value, Error> {
    serde_json::from_str(text)
        .map_err(|err| Error::MalformedResponse(format!("response is not JSON: {}", err)))
}

/// Decode a listing. Three envelope shapes are accepted: `{data: {list}}`,
/// `{list}` and `{data: [...]}`. A non-zero `code`, or a non-200 `status`,
/// is a semantic failure.
pub fn parse_listing(text: &str, directory_id: &str) -> Result<Listing, Error> {
    let body = parse_body(text)?;

    if let Some(code) = body.get("code").and_then(Value::as_i64) {
        if code != 0 {
            return Err(Error::Api {
                code,
                message: server_message(&body),
            });
        }
    } else if let Some(status) = body.get("status").and_then(Value::as_i64) {
        if status != 200 {
            return Err(Error::Api {
                code: status,
                message: server_message(&body),
            });
        }
    }

    let items = body
        .pointer("/data/list")
        .and_then(Value::as_array)
        .or_else(|| body.get("list").and_then(Value::as_array))
        .or_else(|| body.get("data").and_then(Value::as_array))
        .ok_or_else(|| {
            Error::MalformedResponse("listing carries no entry list".to_string())
        })?;

    let entries = items
        .iter()
        .filter_map(|item| {
            let node = node_from_item(item, directory_id);
            if node.is_none() {
                debug!("Skipping listing entry without id or name: {}", item);
            }
            node
        })
        .collect();

    Ok(Listing { entries })
}

/// Decode a rename/move answer: success is `status == 200 && code == 0`.
pub fn parse_write_result(text: &str) -> Result<(), Error> {
    let body = parse_body(text)?;
    let status = body.get("status").and_then(Value::as_i64);
    let code = body.get("code").and_then(Value::as_i64);

    match (status, code) {
        (Some(200), Some(0)) => Ok(()),
        (None, None) => Err(Error::MalformedResponse(
            "write result carries neither status nor code".to_string(),
        )),
        (status, code) => Err(Error::Api {
            code: code.or(status).unwrap_or_default(),
            message: server_message(&body),
        }),
    }
}

fn string_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// The server's own directory signal, if it sent one.
fn directory_signal(item: &Value) -> Option<bool> {
    let dir = item.get("dir").and_then(|value| match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n == 1),
        _ => None,
    });
    let file_type = item.get("file_type").and_then(Value::as_i64);

    match (dir, file_type) {
        (Some(true), _) | (_, Some(0)) => Some(true),
        (Some(false), _) | (_, Some(_)) => Some(false),
        (None, None) => None,
    }
}

pub fn node_from_item(item: &Value, directory_id: &str) -> Option<RemoteNode> {
    let id = string_field(item, &["fid", "id"])?;
    let name = string_field(item, &["file_name", "name", "filename"])?;
    let is_directory = directory_signal(item).unwrap_or_else(|| looks_like_directory(&name));
    let size = item.get("size").and_then(Value::as_u64).unwrap_or(0);
    let parent_id =
        string_field(item, &["pdir_fid"]).unwrap_or_else(|| directory_id.to_string());

    Some(RemoteNode {
        id,
        path: name.clone(),
        name,
        is_directory,
        size,
        parent_id,
    })
}
