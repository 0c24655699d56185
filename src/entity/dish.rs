use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "dish")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Double")]
    pub price: Decimal,
    pub available: bool,
    pub image_url: String,
    pub restaurant_id: i32,
    pub sub_menu_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::restaurant::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurant::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Restaurant,
    #[sea_orm(
        belongs_to = "super::sub_menu::Entity",
        from = "Column::SubMenuId",
        to = "super::sub_menu::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    SubMenu,
}

impl Related<super::restaurant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurant.def()
    }
}

impl Related<super::sub_menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubMenu.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
