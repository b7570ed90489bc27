use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One generation or edit step of a PC case design.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "node")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub is_root: bool,
    #[sea_orm(indexed)]
    pub parent_id: Option<i32>,
    #[sea_orm(column_type = "Text")]
    pub prompt: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub negative_prompt: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub spec_json: Option<Json>,
    #[schema(value_type = Option<Object>)]
    pub request_params: Option<Json>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_base64: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_path: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(20))")]
    pub action_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}
