// src/infrastructure/storage/sqlite.rs
// SQLite order repository

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

use crate::domain::errors::{RepositoryError, RepositoryResult};
use crate::domain::models::{
    DeliveryPoint, Location, NewOrder, Order, OrderId, OrderStatus, Phone, UserId,
};
use crate::domain::repository::OrderRepository;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL,
        owner_name TEXT NOT NULL,
        phone TEXT NOT NULL,
        products TEXT NOT NULL,
        total INTEGER NOT NULL,
        latitude REAL,
        longitude REAL,
        address TEXT,
        status TEXT NOT NULL
    )";

const SELECT_ORDER: &str = "SELECT id, owner_id, owner_name, phone, products, total, \
                            latitude, longitude, address, status FROM orders";

#[derive(Clone)]
pub struct SqliteOrderRepository {
    pool: Pool<Sqlite>,
}

impl SqliteOrderRepository {
    /// Opens (creating if missing) the database at `database_url` and ensures the
    /// `orders` table exists.
    pub async fn connect(database_url: &str) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to an in-memory database sees its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;
        log::info!("Order database ready at {}", database_url);
        Ok(Self { pool })
    }
}

fn row_to_order(row: &SqliteRow) -> RepositoryResult<Order> {
    let id: i64 = row.try_get("id")?;
    let corrupt = |what: &str| RepositoryError::Corrupt(format!("order #{}: {}", id, what));

    let phone: String = row.try_get("phone")?;
    let phone = Phone::parse(&phone).map_err(|_| corrupt("invalid phone"))?;

    let products: String = row.try_get("products")?;
    let products: Vec<String> =
        serde_json::from_str(&products).map_err(|_| corrupt("invalid product list"))?;

    let total: i64 = row.try_get("total")?;
    let total = u64::try_from(total).map_err(|_| corrupt("negative total"))?;

    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;
    let address: Option<String> = row.try_get("address")?;
    let delivery = match (latitude, longitude, address) {
        (Some(latitude), Some(longitude), _) => {
            DeliveryPoint::Location(Location::new(latitude, longitude))
        }
        (_, _, Some(address)) => DeliveryPoint::Address(address),
        _ => return Err(corrupt("no delivery point")),
    };

    let status: String = row.try_get("status")?;
    let status = status.parse::<OrderStatus>().map_err(|e| corrupt(&e))?;

    let details = NewOrder {
        owner: UserId(row.try_get("owner_id")?),
        owner_name: row.try_get("owner_name")?,
        phone,
        products,
        total,
        delivery,
    };
    Ok(Order::new(OrderId(id), details, status))
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn create(&self, order: NewOrder) -> RepositoryResult<Order> {
        let products = serde_json::to_string(&order.products)
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
        let total = i64::try_from(order.total)
            .map_err(|_| RepositoryError::Corrupt(format!("total out of range: {}", order.total)))?;
        let location = order.delivery.location();

        let row = sqlx::query(
            "INSERT INTO orders (owner_id, owner_name, phone, products, total, latitude, longitude, address, status)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(order.owner.0)
        .bind(&order.owner_name)
        .bind(order.phone.as_str())
        .bind(products)
        .bind(total)
        .bind(location.map(|l| l.latitude))
        .bind(location.map(|l| l.longitude))
        .bind(order.delivery.address())
        .bind(OrderStatus::New.as_str())
        .fetch_one(&self.pool)
        .await?;

        let id = OrderId(row.try_get::<i64, _>(0)?);
        Ok(Order::new(id, order, OrderStatus::New))
    }

    async fn get(&self, id: OrderId) -> RepositoryResult<Option<Order>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_ORDER))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_order).transpose()
    }

    async fn list_by_owner(&self, owner: UserId) -> RepositoryResult<Vec<Order>> {
        let rows = sqlx::query(&format!("{} WHERE owner_id = ? ORDER BY id", SELECT_ORDER))
            .bind(owner.0)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_order).collect()
    }

    async fn update_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> RepositoryResult<Option<Order>> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status = ?")
            .bind(next.as_str())
            .bind(id.0)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}
