//! Offline snapshot loading.
//!
//! Reads a multi-document YAML (or JSON) dump of cluster objects, such as the
//! output of `kubectl get ... -A -o yaml`, into an [`Inventory`]. `List`
//! wrappers are unpacked. Every kind the engine knows is treated as listed:
//! kinds missing from the snapshot become empty collections.

use crate::analyzer::inventory::Inventory;
use crate::error::{AuditError, Result};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::path::Path;

/// Parse snapshot content.
pub fn parse_snapshot(content: &str) -> Result<Inventory> {
    let mut inventory = Inventory::empty();
    let mut line_number = 1usize;

    for doc in split_documents(content) {
        let trimmed = doc.trim();
        if !trimmed.is_empty() && !is_comment_only(trimmed) {
            let value: Value = serde_yaml::from_str(doc).map_err(|e| AuditError::Snapshot {
                line: line_number,
                message: e.to_string(),
            })?;
            add_value(&mut inventory, value, line_number)?;
        }
        line_number += doc.lines().count() + 1;
    }

    Ok(inventory)
}

/// Parse a snapshot file.
pub fn parse_snapshot_file(path: &Path) -> Result<Inventory> {
    let content = std::fs::read_to_string(path)?;
    parse_snapshot(&content)
}

/// Split on `---` separator lines, keeping each document's own lines so line
/// numbers can be tracked.
fn split_documents(content: &str) -> Vec<&str> {
    let mut docs = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let end = offset + line.len();
        if line.trim_end() == "---" || line.starts_with("--- ") {
            docs.push(&content[start..offset]);
            start = end;
        }
        offset = end;
    }
    docs.push(&content[start..]);
    docs
}

fn is_comment_only(doc: &str) -> bool {
    doc.lines()
        .map(str::trim)
        .all(|l| l.is_empty() || l.starts_with('#'))
}

fn add_value(inventory: &mut Inventory, value: Value, line: usize) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if kind == "List" || kind.ends_with("List") {
        let items = match value.get("items") {
            Some(Value::Sequence(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(AuditError::Snapshot {
                    line,
                    message: format!("{} items must be a sequence", kind),
                });
            }
        };
        // Items of typed lists (PodList, ...) may omit their own kind.
        let item_kind = kind.strip_suffix("List").filter(|k| !k.is_empty());
        for mut item in items {
            if let (Some(item_kind), Value::Mapping(map)) = (item_kind, &mut item) {
                if !map.contains_key("kind") {
                    map.insert(Value::from("kind"), Value::from(item_kind));
                }
            }
            add_value(inventory, item, line)?;
        }
        return Ok(());
    }

    match kind.as_str() {
        "Namespace" => push(&mut inventory.namespaces, value, &kind, line),
        "ServiceAccount" => push(&mut inventory.service_accounts, value, &kind, line),
        "Pod" => push(&mut inventory.pods, value, &kind, line),
        "Role" => push(&mut inventory.roles, value, &kind, line),
        "ClusterRole" => push(&mut inventory.cluster_roles, value, &kind, line),
        "RoleBinding" => push(&mut inventory.role_bindings, value, &kind, line),
        "ClusterRoleBinding" => push(&mut inventory.cluster_role_bindings, value, &kind, line),
        "NetworkPolicy" => push(&mut inventory.network_policies, value, &kind, line),
        "Service" => push(&mut inventory.services, value, &kind, line),
        "Ingress" => push(&mut inventory.ingresses, value, &kind, line),
        "" => {
            log::debug!("Skipping document without kind at line {}", line);
            Ok(())
        }
        other => {
            log::debug!("Skipping unsupported kind {} at line {}", other, line);
            Ok(())
        }
    }
}

fn push<T: DeserializeOwned>(
    items: &mut Option<Vec<T>>,
    value: Value,
    kind: &str,
    line: usize,
) -> Result<()> {
    let item = serde_yaml::from_value(value).map_err(|e| AuditError::Snapshot {
        line,
        message: format!("invalid {}: {}", kind, e),
    })?;
    items.get_or_insert_with(Vec::new).push(item);
    Ok(())
}
