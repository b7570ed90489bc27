use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Node::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Node::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Node::IsRoot).boolean().not_null())
                    .col(ColumnDef::new(Node::ParentId).integer())
                    .col(ColumnDef::new(Node::Prompt).text().not_null())
                    .col(ColumnDef::new(Node::NegativePrompt).text())
                    .col(ColumnDef::new(Node::SpecJson).json())
                    .col(ColumnDef::new(Node::RequestParams).json())
                    .col(ColumnDef::new(Node::ImageBase64).text())
                    .col(ColumnDef::new(Node::ImagePath).text())
                    .col(
                        ColumnDef::new(Node::ActionType)
                            .string_len(20)
                            .not_null()
                            .default("generate"),
                    )
                    .col(
                        ColumnDef::new(Node::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_node_parent")
                            .from(Node::Table, Node::ParentId)
                            .to(Node::Table, Node::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_node_parent_id")
                    .table(Node::Table)
                    .col(Node::ParentId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // root listing filters on is_root and sorts on created_at
        manager
            .create_index(
                Index::create()
                    .name("idx_node_is_root_created_at")
                    .table(Node::Table)
                    .col(Node::IsRoot)
                    .col(Node::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Node::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Node {
    Table,
    Id,
    IsRoot,
    ParentId,
    Prompt,
    NegativePrompt,
    SpecJson,
    RequestParams,
    ImageBase64,
    ImagePath,
    ActionType,
    CreatedAt,
}
