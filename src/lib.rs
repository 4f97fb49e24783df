pub mod config;
pub mod error;
pub mod import;
pub mod record;
pub mod schema;
pub mod source;

pub use config::{DatabaseConfig, ImportConfig};
pub use error::{ErrorKind, ImportError, ImportResult};
pub use import::{ImportStats, Importer};
pub use record::MedicineRecord;

pub mod test_support {
    use std::io::Write;

    use sqlx::PgPool;
    use tempfile::NamedTempFile;

    use crate::record::MedicineRecord;
    use crate::schema::COLUMNS;

    pub use database::{TestDatabase, TestDatabaseError};

    /// Write a CSV file with the declared header row followed by `rows`.
    pub fn medicines_csv(rows: &[&str]) -> NamedTempFile {
        let mut contents = COLUMNS.join(",");
        contents.push('\n');
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        csv_file(&contents)
    }

    /// Write arbitrary CSV text to a temporary file.
    pub fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp csv file");
        file.write_all(contents.as_bytes()).expect("write temp csv");
        file.flush().expect("flush temp csv");
        file
    }

    /// Convenience helpers for seeding and reading the `medicines` table.
    pub struct TestFixtures<'a> {
        pool: &'a PgPool,
    }

    impl<'a> TestFixtures<'a> {
        pub fn new(pool: &'a PgPool) -> Self {
            Self { pool }
        }

        /// Insert a row directly, bypassing the importer.
        pub async fn insert_medicine(&self, record: &MedicineRecord) -> Result<(), sqlx::Error> {
            sqlx::query(
                "INSERT INTO medicines (id, medicine_name, mrp, brand, pack_size, composition, category, popularity) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(record.id)
            .bind(&record.medicine_name)
            .bind(record.mrp)
            .bind(&record.brand)
            .bind(&record.pack_size)
            .bind(&record.composition)
            .bind(&record.category)
            .bind(record.popularity)
            .execute(self.pool)
            .await?;

            Ok(())
        }

        pub async fn medicine(&self, id: i64) -> Result<Option<MedicineRecord>, sqlx::Error> {
            sqlx::query_as::<_, MedicineRecord>("SELECT * FROM medicines WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await
        }

        pub async fn all_medicines(&self) -> Result<Vec<MedicineRecord>, sqlx::Error> {
            sqlx::query_as::<_, MedicineRecord>("SELECT * FROM medicines ORDER BY id")
                .fetch_all(self.pool)
                .await
        }

        pub async fn count(&self) -> Result<i64, sqlx::Error> {
            sqlx::query_scalar("SELECT COUNT(*) FROM medicines")
                .fetch_one(self.pool)
                .await
        }
    }

    pub mod database {
        use log::LevelFilter;
        use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use sqlx::{ConnectOptions, PgPool};
        use testcontainers::{ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner};
        use testcontainers_modules::postgres::Postgres;
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        use crate::config::DatabaseConfig;

        static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        impl TestDatabaseError {
            /// True when no PostgreSQL server could be reached or started at all.
            pub fn is_unavailable(&self) -> bool {
                matches!(
                    self,
                    TestDatabaseError::Container(_)
                        | TestDatabaseError::Sqlx(sqlx::Error::Io(_))
                        | TestDatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
                )
            }
        }

        /// Ephemeral database factory for integration tests.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            base_url: String,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Provision a fresh database on `TEST_DATABASE_URL`, or in a
            /// disposable Postgres container when the variable is unset.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                match std::env::var("TEST_DATABASE_URL") {
                    Ok(url) if !url.trim().is_empty() => Self::with_server(url, None).await,
                    _ => Self::new().await,
                }
            }

            /// Provision a fresh database inside a new container.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let base_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                Self::with_server(base_url, Some(container)).await
            }

            async fn with_server(
                base_url: String,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let base_options: PgConnectOptions =
                    base_url.parse().map_err(TestDatabaseError::Sqlx)?;
                let base_options = base_options.log_statements(LevelFilter::Off);

                let base_name = base_options
                    .get_database()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "postgres".to_string());

                let admin_options = base_options.clone().database("postgres");
                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                let new_db_name = format!("{}_{}", base_name, Uuid::new_v4().simple());
                let create_sql = format!("CREATE DATABASE \"{}\" TEMPLATE template0", new_db_name);
                sqlx::query(&create_sql)
                    .execute(&admin_pool)
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.clone().database(&new_db_name))
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    base_url,
                    database_name: new_db_name,
                    container,
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Connection settings pointing the importer at this database.
            pub fn database_config(&self) -> DatabaseConfig {
                DatabaseConfig {
                    url: Some(self.base_url.clone()),
                    database: Some(self.database_name.clone()),
                    ..Default::default()
                }
            }

            /// Close pool connections and drop the ephemeral database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }

                drop_database_with_fallback(self.admin_options.clone(), &self.database_name)
                    .await
                    .map_err(TestDatabaseError::Sqlx)?;

                if let Some(container) = self.container.take() {
                    drop(container);
                }

                Ok(())
            }
        }

        async fn drop_database_with_fallback(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), sqlx::Error> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;

            let drop_force = format!("DROP DATABASE \"{}\" WITH (FORCE)", database_name);
            match sqlx::query(&drop_force).execute(&admin_pool).await {
                Ok(_) => Ok(()),
                Err(err) if force_drop_unsupported(&err) => {
                    let drop_sql = format!("DROP DATABASE \"{}\"", database_name);
                    sqlx::query(&drop_sql).execute(&admin_pool).await?;
                    Ok(())
                }
                Err(err) => Err(err),
            }
        }

        fn force_drop_unsupported(err: &sqlx::Error) -> bool {
            matches!(
                err,
                sqlx::Error::Database(db_err)
                    if db_err
                        .code()
                        .map(|code| code == "42601" || code == "0A000")
                        .unwrap_or(false)
            )
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let db_name = self.database_name.clone();
                    if let Ok(handle) = Handle::try_current() {
                        handle.spawn(async move {
                            pool.close().await;
                            let _ = drop_database_with_fallback(admin_options, &db_name).await;
                        });
                    } else {
                        std::thread::spawn(move || {
                            if let Ok(rt) = tokio::runtime::Runtime::new() {
                                rt.block_on(async move {
                                    pool.close().await;
                                    let _ =
                                        drop_database_with_fallback(admin_options, &db_name).await;
                                });
                            }
                        });
                    }
                }

                if let Some(container) = self.container.take() {
                    drop(container);
                }
            }
        }
    }
}
