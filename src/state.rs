use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::{AppConfig, StorageKind};
use crate::meals::{MealService, MealStore, MemoryMealStore, PgMealStore};
use crate::session::{OpaqueSessions, SessionIdentity};

pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub meals: MealService,
    pub sessions: Arc<dyn SessionIdentity>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let store: Arc<dyn MealStore> = match config.storage {
            StorageKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for postgres storage")?;
                let db = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                run_migrations(&db).await?;
                Arc::new(PgMealStore::new(db))
            }
            StorageKind::Memory => {
                tracing::warn!("using in-memory storage; meals are lost on restart");
                Arc::new(MemoryMealStore::default())
            }
        };

        Ok(Self::from_parts(store, Arc::new(OpaqueSessions), config))
    }

    pub fn from_parts(
        store: Arc<dyn MealStore>,
        sessions: Arc<dyn SessionIdentity>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            meals: MealService::new(store),
            sessions,
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::SessionConfig;

        let config = Arc::new(AppConfig {
            storage: StorageKind::Memory,
            database_url: None,
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            session: SessionConfig {
                cookie_name: "sessionId".into(),
                max_age_days: 7,
            },
        });
        Self::from_parts(
            Arc::new(MemoryMealStore::default()),
            Arc::new(OpaqueSessions),
            config,
        )
    }
}
