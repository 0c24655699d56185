use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(User::Username)
                            .string_len(80)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::PasswordHash).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Restaurant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restaurant::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Restaurant::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubMenu::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubMenu::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubMenu::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Dish::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Dish::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Dish::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Dish::Description).text().not_null())
                    // REAL affinity, so whole prices still read back as floats
                    .col(ColumnDef::new(Dish::Price).double().not_null())
                    .col(
                        ColumnDef::new(Dish::Available)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Dish::ImageUrl).string_len(255).not_null())
                    .col(ColumnDef::new(Dish::RestaurantId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-dish-restaurant_id")
                            .from(Dish::Table, Dish::RestaurantId)
                            .to(Restaurant::Table, Restaurant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .col(ColumnDef::new(Dish::SubMenuId).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-dish-sub_menu_id")
                            .from(Dish::Table, Dish::SubMenuId)
                            .to(SubMenu::Table, SubMenu::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Dish::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubMenu::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Restaurant::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Username,
    PasswordHash,
}

#[derive(DeriveIden)]
enum Restaurant {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum SubMenu {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Dish {
    Table,
    Id,
    Name,
    Description,
    Price,
    Available,
    ImageUrl,
    RestaurantId,
    SubMenuId,
}
