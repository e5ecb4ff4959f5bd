use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DaySchedules::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DaySchedules::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(DaySchedules::Date).date().not_null())
                    .col(ColumnDef::new(DaySchedules::Intervals).text().not_null())
                    .col(
                        ColumnDef::new(DaySchedules::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(DaySchedules::Version).big_integer().not_null())
                    .col(
                        ColumnDef::new(DaySchedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DaySchedules::OwnerId)
                            .col(DaySchedules::Date),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DaySchedules::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DaySchedules {
    Table,
    OwnerId,
    Date,
    Intervals,
    Active,
    Version,
    UpdatedAt,
}
