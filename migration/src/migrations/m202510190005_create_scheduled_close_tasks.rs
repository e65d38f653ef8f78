use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202510190005_create_scheduled_close_tasks"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Keyed by course: the primary key is the deduplication key.
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("scheduled_close_tasks"))
                    .if_not_exists()
                    .col(ColumnDef::new(Alias::new("course_id")).big_integer().not_null().primary_key())
                    .col(ColumnDef::new(Alias::new("fire_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("created_at")).timestamp().not_null().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("ix_scheduled_close_tasks_fire_at")
                    .table(Alias::new("scheduled_close_tasks"))
                    .col(Alias::new("fire_at"))
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("scheduled_close_tasks")).to_owned())
            .await
    }
}
