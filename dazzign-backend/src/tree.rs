//! Full-subtree materialisation
//!

use std::collections::HashMap;

use dazzign_shared::error::DazzignError;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;
use crate::entity::node;

/// A node together with all of its descendants, children in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NodeTree {
    #[serde(flatten)]
    pub node: node::Model,
    #[schema(no_recursion)]
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    /// Number of nodes in this tree, including the root.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeTree::node_count).sum::<usize>()
    }
}

/// Rebuild the nested tree under `root` from flat subtree rows. Rows are
/// grouped by parent once and each one is consumed when it is attached.
pub fn assemble_tree(root: node::Model, rows: Vec<node::Model>) -> NodeTree {
    let mut by_parent: HashMap<i32, Vec<node::Model>> = HashMap::new();
    for row in rows {
        if row.id == root.id {
            continue;
        }
        if let Some(parent_id) = row.parent_id {
            by_parent.entry(parent_id).or_default().push(row);
        }
    }
    for group in by_parent.values_mut() {
        group.sort_by_key(|n| n.id);
    }
    attach(root, &mut by_parent)
}

fn attach(node: node::Model, by_parent: &mut HashMap<i32, Vec<node::Model>>) -> NodeTree {
    let children = by_parent
        .remove(&node.id)
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach(child, by_parent))
        .collect();
    NodeTree { node, children }
}

/// `None` when the node doesn't exist.
pub async fn get_tree(
    conn: &DatabaseConnection,
    node_id: i32,
) -> Result<Option<NodeTree>, DazzignError> {
    let Some(root) = db::node::get_by_id(conn, node_id).await? else {
        return Ok(None);
    };
    let rows = db::node::subtree_rows(conn, node_id).await?;
    Ok(Some(assemble_tree(root, rows)))
}
