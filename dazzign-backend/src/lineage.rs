//! Ancestors and near descendants of a node
//!

use std::collections::HashSet;

use dazzign_shared::error::DazzignError;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::db;
use crate::entity::node;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NodeLineage {
    /// Nearest ancestor first, root last.
    pub ancestors: Vec<node::Model>,
    /// Children, followed by the children of each child. Two levels only.
    pub descendants: Vec<node::Model>,
}

/// An unknown `node_id` gives an empty lineage rather than an error.
pub async fn get_lineage(
    conn: &DatabaseConnection,
    node_id: i32,
) -> Result<NodeLineage, DazzignError> {
    let Some(node) = db::node::get_by_id(conn, node_id).await? else {
        debug!("Node {} not found, returning empty lineage", node_id);
        return Ok(NodeLineage::default());
    };

    let mut ancestors = Vec::new();
    let mut visited = HashSet::from([node.id]);
    let mut next = node.parent_id;
    while let Some(parent_id) = next {
        if !visited.insert(parent_id) {
            warn!(node_id, parent_id, "Cycle in parent chain, stopping ancestor walk");
            break;
        }
        match db::node::get_by_id(conn, parent_id).await? {
            Some(parent) => {
                next = parent.parent_id;
                ancestors.push(parent);
            }
            None => break,
        }
    }

    let children = db::node::children_of(conn, node.id).await?;
    let mut descendants = children.clone();
    for child in &children {
        descendants.extend(db::node::children_of(conn, child.id).await?);
    }

    Ok(NodeLineage {
        ancestors,
        descendants,
    })
}
