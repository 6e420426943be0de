use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orders_types::domain::order::{Item, Order, OrderStatus, PaymentStatus};
use orders_types::ports::order_repository::{OrderRepository, RepoError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

const SELECT_ORDER: &str = "SELECT id, buyer_full_name, buyer_email, buyer_phone, delivery_address, \
     payment_status, order_status, created_at, updated_at, items_json FROM orders";

pub struct SqliteRepo {
    pool: SqlitePool,
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    buyer_full_name: String,
    buyer_email: String,
    buyer_phone: String,
    delivery_address: String,
    payment_status: String,
    order_status: String,
    created_at: String,
    updated_at: String,
    items_json: String,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        // Unknown status strings are a corrupt row, not a default.
        let payment_status = PaymentStatus::from_str(&self.payment_status).map_err(db_err)?;
        let order_status = OrderStatus::from_str(&self.order_status).map_err(db_err)?;
        let items: Vec<Item> = serde_json::from_str(&self.items_json).map_err(db_err)?;
        Ok(Order {
            order_id: Uuid::parse_str(&self.id).map_err(db_err)?,
            items,
            buyer_full_name: self.buyer_full_name,
            buyer_email: self.buyer_email,
            buyer_phone: self.buyer_phone,
            delivery_address: self.delivery_address,
            payment_status,
            order_status,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        let ddl = include_str!("../migrations/0001_create_orders.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn set_column(
        &self,
        id: Uuid,
        column: &'static str,
        value: &'static str,
    ) -> Result<Option<Order>, RepoError> {
        let sql = format!("UPDATE orders SET {column} = ?, updated_at = ? WHERE id = ?");
        let updated = sqlx::query(&sql)
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        let inserted = sqlx::query(
            "INSERT INTO orders (id, buyer_full_name, buyer_email, buyer_phone, delivery_address,
                                 payment_status, order_status, created_at, updated_at, items_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(order.order_id.to_string())
        .bind(&order.buyer_full_name)
        .bind(&order.buyer_email)
        .bind(&order.buyer_phone)
        .bind(&order.delivery_address)
        .bind(order.payment_status.as_str())
        .bind(order.order_status.as_str())
        .bind(order.created_at.to_rfc3339())
        .bind(order.updated_at.to_rfc3339())
        .bind(items_json)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if inserted.rows_affected() == 0 {
            return Err(RepoError::AlreadyExists(order.order_id));
        }
        Ok(order)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|r| r.into_order()).transpose()
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        let rows: Vec<DbOrder> = sqlx::query_as(&format!("{SELECT_ORDER} ORDER BY created_at DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter()
            .map(|r| r.into_order())
            .collect::<Result<Vec<_>, _>>()
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<Order>, RepoError> {
        // The guard lives in the WHERE clause so check and write are one statement.
        let updated = sqlx::query(
            "UPDATE orders SET payment_status = ?, updated_at = ?
             WHERE id = ? AND NOT (payment_status = ? AND ? = ?)",
        )
        .bind(status.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .bind(PaymentStatus::Completed.as_str())
        .bind(status.as_str())
        .bind(PaymentStatus::Incomplete.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() > 0 {
            return self.get(id).await;
        }
        match self.get(id).await? {
            None => Ok(None),
            Some(_) => Err(RepoError::PaymentRegression(id)),
        }
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        self.set_column(id, "order_status", status.as_str()).await
    }
}
