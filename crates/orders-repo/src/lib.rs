#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use orders_types::domain::order::*;
use orders_types::ports::order_repository::OrderRepository;
use orders_types::ports::order_repository::RepoError;
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub const DEFAULT_SQLITE_URL: &str = "sqlite://orders.db";

/// The store backend chosen at startup.
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

fn wants_memory(url: Option<&str>) -> bool {
    match url {
        None => cfg!(feature = "memory"),
        Some(u) => u.starts_with("memory"),
    }
}

impl Repo {
    /// `None` or a `memory://` url picks the in-memory store when it is compiled in;
    /// anything else is treated as a SQLite url.
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        if wants_memory(database_url) {
            return Self::memory();
        }
        Self::sqlite(database_url.unwrap_or(DEFAULT_SQLITE_URL)).await
    }

    #[cfg(feature = "memory")]
    fn memory() -> anyhow::Result<Self> {
        Ok(Self::Memory(crate::memory::InMemoryRepo::new()))
    }

    #[cfg(not(feature = "memory"))]
    fn memory() -> anyhow::Result<Self> {
        anyhow::bail!("in-memory store requested but the `memory` feature is disabled")
    }

    #[cfg(feature = "sqlite")]
    async fn sqlite(url: &str) -> anyhow::Result<Self> {
        Ok(Self::Sqlite(crate::sqlite::SqliteRepo::new(url).await?))
    }

    #[cfg(not(feature = "sqlite"))]
    async fn sqlite(url: &str) -> anyhow::Result<Self> {
        anyhow::bail!("database url {url:?} needs the `sqlite` feature")
    }

    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Self::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => "sqlite",
        }
    }

    /// Releases connections; the repo must not be used afterwards.
    pub async fn close(&self) {
        match self {
            #[cfg(feature = "memory")]
            Self::Memory(_) => {}
            #[cfg(feature = "sqlite")]
            Self::Sqlite(repo) => repo.close().await,
        }
    }

    fn inner(&self) -> &dyn OrderRepository {
        match self {
            #[cfg(feature = "memory")]
            Self::Memory(repo) => repo,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(repo) => repo,
        }
    }
}

#[async_trait::async_trait]
impl OrderRepository for Repo {
    async fn create(&self, order: Order) -> Result<Order, RepoError> {
        self.inner().create(order).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        self.inner().get(id).await
    }

    async fn list(&self) -> Result<Vec<Order>, RepoError> {
        self.inner().list().await
    }

    async fn update_payment_status(
        &self,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Option<Order>, RepoError> {
        self.inner().update_payment_status(id, status).await
    }

    async fn update_order_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepoError> {
        self.inner().update_order_status(id, status).await
    }
}
