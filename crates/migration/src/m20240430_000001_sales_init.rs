use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum CustomerStatus {
    Table,
    Id,
    Title,
    Progress,
}

#[derive(DeriveIden)]
enum DecisionMaker {
    Table,
    Id,
    FirstName,
    LastName,
    MiddleName,
    Title,
    Phone,
    Email,
    Birthdate,
}

#[derive(DeriveIden)]
enum Customer {
    Table,
    Id,
    StatusUpdatedAt,
    Inn,
    Name,
    Source,
    TotalVolume,
    TargetVolume,
    CurrentSupplier,
    ConsumedItems,
    Problematic,
    PurchaseMethod,
    Note,
    CreatedAt,
    UpdatedAt,
    StatusId,
    DecisionMakerId,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CustomerStatus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerStatus::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CustomerStatus::Title).string_len(50).not_null())
                    .col(
                        ColumnDef::new(CustomerStatus::Progress)
                            .integer()
                            .not_null()
                            .check(
                                Expr::col(CustomerStatus::Progress)
                                    .gte(0)
                                    .and(Expr::col(CustomerStatus::Progress).lte(100)),
                            ),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_customer_status_progress")
                    .table(CustomerStatus::Table)
                    .col(CustomerStatus::Progress)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DecisionMaker::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DecisionMaker::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DecisionMaker::FirstName).string_len(70))
                    .col(ColumnDef::new(DecisionMaker::LastName).string_len(70))
                    .col(ColumnDef::new(DecisionMaker::MiddleName).string_len(70))
                    .col(ColumnDef::new(DecisionMaker::Title).string_len(100))
                    .col(ColumnDef::new(DecisionMaker::Phone).string_len(50))
                    .col(ColumnDef::new(DecisionMaker::Email).string_len(254))
                    .col(ColumnDef::new(DecisionMaker::Birthdate).date())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Customer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customer::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Customer::StatusUpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Customer::Inn)
                            .string_len(12)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Customer::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Customer::Source).string_len(15))
                    .col(ColumnDef::new(Customer::TotalVolume).integer())
                    .col(ColumnDef::new(Customer::TargetVolume).integer())
                    .col(ColumnDef::new(Customer::CurrentSupplier).string_len(200))
                    .col(ColumnDef::new(Customer::ConsumedItems).text().not_null())
                    .col(ColumnDef::new(Customer::Problematic).text().not_null())
                    .col(ColumnDef::new(Customer::PurchaseMethod).string_len(15))
                    .col(ColumnDef::new(Customer::Note).text().not_null())
                    .col(
                        ColumnDef::new(Customer::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Customer::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Customer::StatusId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Customer::DecisionMakerId)
                            .big_integer()
                            .unique_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_status")
                            .from(Customer::Table, Customer::StatusId)
                            .to(CustomerStatus::Table, CustomerStatus::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_decision_maker")
                            .from(Customer::Table, Customer::DecisionMakerId)
                            .to(DecisionMaker::Table, DecisionMaker::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_customer_status")
                    .table(Customer::Table)
                    .col(Customer::StatusId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DecisionMaker::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomerStatus::Table).to_owned())
            .await
    }
}
