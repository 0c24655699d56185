use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectOptions,
    Database as SeaOrmDatabase, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::path::Path;

use crate::{
    entity::{dish, restaurant, sub_menu, user},
    migration::Migrator,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(DbErr),
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error("File error: {0}")]
    File(#[from] std::io::Error),
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::UniqueViolation(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => Self::ForeignKeyViolation(msg),
            _ => Self::Database(err),
        }
    }
}

/// Column values of a dish as accepted from a validated form.
#[derive(Clone, Debug, PartialEq)]
pub struct DishRecord {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub available: bool,
    pub image_url: String,
    pub sub_menu_id: Option<i32>,
}

#[derive(Clone)]
pub struct Database {
    pool: DatabaseConnection,
}

impl Database {
    /// Opens the SQLite file at `db_path`, creating it and its directory when missing.
    pub async fn open(db_path: &Path) -> Result<Self, Error> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::connect(&format!("sqlite:{}?mode=rwc", db_path.display())).await
    }

    pub async fn connect(url: &str) -> Result<Self, Error> {
        let mut options = ConnectOptions::new(url.to_owned());
        if url.contains(":memory:") {
            // every pooled connection would otherwise get its own empty database
            options.max_connections(1).min_connections(1);
        }
        let pool = SeaOrmDatabase::connect(options).await?;
        Ok(Self { pool })
    }

    pub async fn apply_migrations(&self) -> Result<(), Error> {
        Ok(Migrator::up(&self.pool, None).await?)
    }

    pub async fn remove_migrations(&self) -> Result<(), Error> {
        Ok(Migrator::down(&self.pool, None).await?)
    }

    // ----- Users

    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<user::Model, Error> {
        let user = user::ActiveModel {
            id: NotSet,
            username: Set(username.to_owned()),
            password_hash: Set(password_hash.to_owned()),
        };

        Ok(user.insert(&self.pool).await?)
    }

    pub async fn get_user_by_id(&self, user_id: i32) -> Result<Option<user::Model>, Error> {
        Ok(user::Entity::find_by_id(user_id).one(&self.pool).await?)
    }

    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<user::Model>, Error> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.pool)
            .await?)
    }

    // ----- Restaurants

    pub async fn list_restaurants(&self) -> Result<Vec<restaurant::Model>, Error> {
        Ok(restaurant::Entity::find()
            .order_by_asc(restaurant::Column::Id)
            .all(&self.pool)
            .await?)
    }

    pub async fn first_restaurant(&self) -> Result<Option<restaurant::Model>, Error> {
        Ok(restaurant::Entity::find()
            .order_by_asc(restaurant::Column::Id)
            .one(&self.pool)
            .await?)
    }

    pub async fn get_restaurant_by_id(
        &self,
        restaurant_id: i32,
    ) -> Result<Option<restaurant::Model>, Error> {
        Ok(restaurant::Entity::find_by_id(restaurant_id)
            .one(&self.pool)
            .await?)
    }

    pub async fn insert_restaurant(&self, name: &str) -> Result<restaurant::Model, Error> {
        let restaurant = restaurant::ActiveModel {
            id: NotSet,
            name: Set(name.to_owned()),
        };

        Ok(restaurant.insert(&self.pool).await?)
    }

    /// Overwrites the name in place. Returns `None` when the restaurant does not exist.
    pub async fn update_restaurant(
        &self,
        restaurant_id: i32,
        name: &str,
    ) -> Result<Option<restaurant::Model>, Error> {
        let Some(existing) = self.get_restaurant_by_id(restaurant_id).await? else {
            return Ok(None);
        };
        let mut restaurant = existing.into_active_model();
        restaurant.name = Set(name.to_owned());

        Ok(Some(restaurant.update(&self.pool).await?))
    }

    /// Deletes the restaurant together with its dishes. Returns whether anything was deleted.
    pub async fn delete_restaurant(&self, restaurant_id: i32) -> Result<bool, Error> {
        let txn = self.pool.begin().await?;

        let dishes = dish::Entity::delete_many()
            .filter(dish::Column::RestaurantId.eq(restaurant_id))
            .exec(&txn)
            .await?;
        let deleted = restaurant::Entity::delete_by_id(restaurant_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;

        tracing::debug!(
            restaurant_id,
            dishes = dishes.rows_affected,
            "Deleted restaurant"
        );
        Ok(deleted.rows_affected > 0)
    }

    // ----- Dishes

    pub async fn list_dishes(&self) -> Result<Vec<dish::Model>, Error> {
        Ok(dish::Entity::find()
            .order_by_asc(dish::Column::Id)
            .all(&self.pool)
            .await?)
    }

    pub async fn get_dishes_in_restaurant(
        &self,
        restaurant_id: i32,
    ) -> Result<Vec<dish::Model>, Error> {
        Ok(dish::Entity::find()
            .filter(dish::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(dish::Column::Id)
            .all(&self.pool)
            .await?)
    }

    pub async fn get_dish_by_id(&self, dish_id: i32) -> Result<Option<dish::Model>, Error> {
        Ok(dish::Entity::find_by_id(dish_id).one(&self.pool).await?)
    }

    pub async fn insert_dish(
        &self,
        restaurant_id: i32,
        record: DishRecord,
    ) -> Result<dish::Model, Error> {
        let dish = dish::ActiveModel {
            id: NotSet,
            name: Set(record.name),
            description: Set(record.description),
            price: Set(record.price),
            available: Set(record.available),
            image_url: Set(record.image_url),
            restaurant_id: Set(restaurant_id),
            sub_menu_id: Set(record.sub_menu_id),
        };

        Ok(dish.insert(&self.pool).await?)
    }

    /// Overwrites every editable column in place. Returns `None` when the dish does not exist.
    pub async fn update_dish(
        &self,
        dish_id: i32,
        record: DishRecord,
    ) -> Result<Option<dish::Model>, Error> {
        let Some(existing) = self.get_dish_by_id(dish_id).await? else {
            return Ok(None);
        };
        let mut dish = existing.into_active_model();
        dish.name = Set(record.name);
        dish.description = Set(record.description);
        dish.price = Set(record.price);
        dish.available = Set(record.available);
        dish.image_url = Set(record.image_url);
        dish.sub_menu_id = Set(record.sub_menu_id);

        Ok(Some(dish.update(&self.pool).await?))
    }

    pub async fn delete_dish(&self, dish_id: i32) -> Result<bool, Error> {
        let deleted = dish::Entity::delete_by_id(dish_id).exec(&self.pool).await?;
        Ok(deleted.rows_affected > 0)
    }

    // ----- Sub-menus

    pub async fn list_sub_menus(&self) -> Result<Vec<sub_menu::Model>, Error> {
        Ok(sub_menu::Entity::find()
            .order_by_asc(sub_menu::Column::Name)
            .all(&self.pool)
            .await?)
    }

    pub async fn get_sub_menu_by_id(
        &self,
        sub_menu_id: i32,
    ) -> Result<Option<sub_menu::Model>, Error> {
        Ok(sub_menu::Entity::find_by_id(sub_menu_id)
            .one(&self.pool)
            .await?)
    }

    pub async fn insert_sub_menu(&self, name: &str) -> Result<sub_menu::Model, Error> {
        let sub_menu = sub_menu::ActiveModel {
            id: NotSet,
            name: Set(name.to_owned()),
        };

        Ok(sub_menu.insert(&self.pool).await?)
    }

    /// Detaches the sub-menu's dishes, then deletes it.
    pub async fn delete_sub_menu(&self, sub_menu_id: i32) -> Result<bool, Error> {
        let txn = self.pool.begin().await?;

        dish::Entity::update_many()
            .col_expr(
                dish::Column::SubMenuId,
                Expr::value(Option::<i32>::None).into(),
            )
            .filter(dish::Column::SubMenuId.eq(sub_menu_id))
            .exec(&txn)
            .await?;
        let deleted = sub_menu::Entity::delete_by_id(sub_menu_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(deleted.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    async fn memory_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.apply_migrations().await.unwrap();
        db
    }

    fn margherita() -> DishRecord {
        DishRecord {
            name: "Margherita".to_owned(),
            description: "Tomato, mozzarella, basil".to_owned(),
            price: Decimal::from_str("25.50").unwrap(),
            available: true,
            image_url: "https://img.example/margherita.png".to_owned(),
            sub_menu_id: None,
        }
    }

    #[tokio::test]
    async fn migrations_roll_back_and_reapply() {
        let db = memory_db().await;
        db.insert_restaurant("Pizzaria X").await.unwrap();

        db.remove_migrations().await.unwrap();
        assert!(db.list_restaurants().await.is_err());

        db.apply_migrations().await.unwrap();
        assert!(db.list_restaurants().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let db = memory_db().await;
        db.insert_user("ana", "hash-1").await.unwrap();

        let err = db.insert_user("ana", "hash-2").await.unwrap_err();
        assert!(matches!(err, Error::UniqueViolation(_)), "{err:?}");

        let stored = db.get_user_by_username("ana").await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash-1");
    }

    #[tokio::test]
    async fn duplicate_restaurant_name_is_a_unique_violation() {
        let db = memory_db().await;
        db.insert_restaurant("Pizzaria X").await.unwrap();

        let err = db.insert_restaurant("Pizzaria X").await.unwrap_err();
        assert!(matches!(err, Error::UniqueViolation(_)), "{err:?}");
    }

    #[tokio::test]
    async fn dish_requires_existing_restaurant() {
        let db = memory_db().await;

        let err = db.insert_dish(42, margherita()).await.unwrap_err();
        assert!(matches!(err, Error::ForeignKeyViolation(_)), "{err:?}");
        assert!(db.list_dishes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn price_survives_storage() {
        let db = memory_db().await;
        let restaurant = db.insert_restaurant("Pizzaria X").await.unwrap();
        let mut whole = margherita();
        whole.name = "Calzone".to_owned();
        whole.price = Decimal::from(30);

        db.insert_dish(restaurant.id, margherita()).await.unwrap();
        db.insert_dish(restaurant.id, whole).await.unwrap();

        let dishes = db.get_dishes_in_restaurant(restaurant.id).await.unwrap();
        assert_eq!(format!("{:.2}", dishes[0].price), "25.50");
        assert_eq!(format!("{:.2}", dishes[1].price), "30.00");
        assert!(dishes[0].available);
    }

    #[tokio::test]
    async fn largest_price_survives_storage() {
        let db = memory_db().await;
        let restaurant = db.insert_restaurant("Pizzaria X").await.unwrap();
        let mut dish = margherita();
        dish.price = Decimal::from_str("999999999.99").unwrap();

        let id = db.insert_dish(restaurant.id, dish).await.unwrap().id;

        let stored = db.get_dish_by_id(id).await.unwrap().unwrap();
        assert_eq!(format!("{:.2}", stored.price), "999999999.99");
    }

    #[tokio::test]
    async fn deleting_restaurant_removes_its_dishes() {
        let db = memory_db().await;
        let kept = db.insert_restaurant("Kept").await.unwrap();
        let doomed = db.insert_restaurant("Doomed").await.unwrap();
        db.insert_dish(kept.id, margherita()).await.unwrap();
        db.insert_dish(doomed.id, margherita()).await.unwrap();

        assert!(db.delete_restaurant(doomed.id).await.unwrap());
        assert!(!db.delete_restaurant(doomed.id).await.unwrap());

        let dishes = db.list_dishes().await.unwrap();
        assert_eq!(dishes.len(), 1);
        assert_eq!(dishes[0].restaurant_id, kept.id);
    }

    #[tokio::test]
    async fn update_overwrites_in_place() {
        let db = memory_db().await;
        let restaurant = db.insert_restaurant("Old").await.unwrap();
        let dish = db.insert_dish(restaurant.id, margherita()).await.unwrap();

        let renamed = db
            .update_restaurant(restaurant.id, "New")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.id, restaurant.id);
        assert_eq!(renamed.name, "New");

        let mut record = margherita();
        record.available = false;
        let updated = db.update_dish(dish.id, record).await.unwrap().unwrap();
        assert!(!updated.available);

        assert!(db.update_restaurant(999, "Nope").await.unwrap().is_none());
        assert!(db.update_dish(999, margherita()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_sub_menu_detaches_dishes() {
        let db = memory_db().await;
        let restaurant = db.insert_restaurant("Pizzaria X").await.unwrap();
        let pizzas = db.insert_sub_menu("Pizzas").await.unwrap();
        let mut record = margherita();
        record.sub_menu_id = Some(pizzas.id);
        let dish = db.insert_dish(restaurant.id, record).await.unwrap();

        assert!(db.delete_sub_menu(pizzas.id).await.unwrap());

        let dish = db.get_dish_by_id(dish.id).await.unwrap().unwrap();
        assert_eq!(dish.sub_menu_id, None);
        assert!(db.list_sub_menus().await.unwrap().is_empty());
    }
}
