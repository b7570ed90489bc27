//! Node storage: insert, lookups, subtree fetch and root listing
//!

use chrono::Utc;
use dazzign_shared::error::DazzignError;
use dazzign_shared::node::{NodeDraft, DEFAULT_ACTION_TYPE};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait,
};
use tracing::{debug, error};

use crate::entity::node;

const SUBTREE_SQL: &str = r#"
WITH RECURSIVE subtree(id) AS (
    SELECT id FROM node WHERE id = ?
    UNION
    SELECT n.id FROM node n INNER JOIN subtree s ON n.parent_id = s.id
)
SELECT node.* FROM node WHERE node.id IN (SELECT id FROM subtree) ORDER BY node.id
"#;

/// Insert a new node. The parent check and the insert share one transaction,
/// `is_root` is derived from `parent_id` and `created_at` is stamped here.
pub async fn create(
    conn: &DatabaseConnection,
    draft: NodeDraft,
) -> Result<node::Model, DazzignError> {
    let txn = conn.begin().await?;

    if let Some(parent_id) = draft.parent_id {
        if node::Entity::find_by_id(parent_id).one(&txn).await?.is_none() {
            debug!("Cannot save node: parent {} not found", parent_id);
            return Err(DazzignError::NotFound(format!(
                "Parent node {} not found",
                parent_id
            )));
        }
    }

    let spec_json = draft.spec_json.map(serde_json::to_value).transpose()?;

    let model = node::ActiveModel {
        id: NotSet,
        is_root: Set(draft.parent_id.is_none()),
        parent_id: Set(draft.parent_id),
        prompt: Set(draft.prompt),
        negative_prompt: Set(draft.negative_prompt),
        spec_json: Set(spec_json),
        request_params: Set(draft.request_params),
        image_base64: Set(draft.image_base64),
        image_path: Set(draft.image_path),
        action_type: Set(draft
            .action_type
            .unwrap_or_else(|| DEFAULT_ACTION_TYPE.to_string())),
        created_at: Set(Utc::now()),
    }
    .insert(&txn)
    .await
    .inspect_err(|err| error!("Failed to insert node: {:?}", err))?;

    txn.commit().await?;
    debug!(id = model.id, parent_id = ?model.parent_id, "Saved node");
    Ok(model)
}

pub async fn get_by_id(
    conn: &DatabaseConnection,
    id: i32,
) -> Result<Option<node::Model>, DazzignError> {
    Ok(node::Entity::find_by_id(id).one(conn).await?)
}

/// Direct children, oldest first.
pub async fn children_of(
    conn: &DatabaseConnection,
    id: i32,
) -> Result<Vec<node::Model>, DazzignError> {
    Ok(node::Entity::find()
        .filter(node::Column::ParentId.eq(id))
        .order_by_asc(node::Column::Id)
        .all(conn)
        .await?)
}

/// The node itself plus every transitive descendant, as flat rows ordered by id.
pub async fn subtree_rows(
    conn: &DatabaseConnection,
    id: i32,
) -> Result<Vec<node::Model>, DazzignError> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        SUBTREE_SQL,
        [id.into()],
    );
    Ok(node::Entity::find()
        .from_raw_sql(stmt)
        .all(conn)
        .await
        .inspect_err(|err| error!("Failed to fetch subtree of {}: {:?}", id, err))?)
}

/// One page of root nodes, newest first, plus the total number of roots.
/// `page` is 1-based and may point past the last page.
pub async fn list_roots(
    conn: &DatabaseConnection,
    page: u64,
    page_size: u64,
) -> Result<(Vec<node::Model>, u64), DazzignError> {
    let roots = node::Entity::find().filter(node::Column::IsRoot.eq(true));

    let total = roots.clone().count(conn).await?;

    // a page past the end is empty, and keeps huge offsets away from the driver
    let offset = match page.saturating_sub(1).checked_mul(page_size) {
        Some(offset) if offset < total => offset,
        _ => {
            debug!(page, page_size, total, "Requested root page is past the end");
            return Ok((Vec::new(), total));
        }
    };

    let nodes = roots
        .order_by_desc(node::Column::CreatedAt)
        .order_by_desc(node::Column::Id)
        .offset(offset)
        .limit(page_size.min(i64::MAX as u64))
        .all(conn)
        .await?;

    Ok((nodes, total))
}
