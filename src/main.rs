use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;

use medicine_importer::config::ImportConfig;
use medicine_importer::schema;
use medicine_importer::{ImportResult, ImportStats, Importer};

#[derive(Parser, Debug)]
#[command(
    name = "medicine-importer",
    about = "Upsert medicine records from a CSV file into the medicines table"
)]
struct Args {
    /// CSV file to import (defaults to MEDICINE_CSV_PATH, then `medicines.csv`).
    #[arg(long)]
    file: Option<PathBuf>,

    /// Database host, overriding MEDICINE_DB_HOST and DATABASE_URL.
    #[arg(long)]
    host: Option<String>,

    /// Database port, overriding MEDICINE_DB_PORT and DATABASE_URL.
    #[arg(long)]
    port: Option<u16>,

    /// Database user, overriding MEDICINE_DB_USER and DATABASE_URL.
    #[arg(long)]
    user: Option<String>,

    /// Database name, overriding MEDICINE_DB_NAME and DATABASE_URL.
    #[arg(long)]
    database: Option<String>,

    /// Read and coerce the file without touching the database.
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn into_config(self) -> ImportResult<ImportConfig> {
        let mut config = ImportConfig::from_env()?;

        if let Some(file) = self.file {
            config.csv_path = file;
        }
        if self.host.is_some() {
            config.database.host = self.host;
        }
        if self.port.is_some() {
            config.database.port = self.port;
        }
        if self.user.is_some() {
            config.database.username = self.user;
        }
        if self.database.is_some() {
            config.database.database = self.database;
        }
        config.dry_run = self.dry_run;

        Ok(config)
    }
}

fn summary_lines(config: &ImportConfig, stats: &ImportStats) -> Vec<String> {
    if config.dry_run {
        return vec![format!("Checked {} medicines ({stats})", stats.rows_read)];
    }
    vec![
        String::new(),
        format!("Successfully imported {} medicines", stats.rows_read),
        format!("Database: {}", config.database.database_name()),
        format!("Table: {}", schema::TABLE),
    ]
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(err) => {
            log::error!("import failed ({}): {}", err.kind(), err);
            return;
        }
    };

    let importer = Importer::new(config);
    match importer.run().await {
        Ok(stats) => {
            log::debug!("{}", stats);
            for line in summary_lines(importer.config(), &stats) {
                println!("{line}");
            }
        }
        Err(err) => log::error!("import failed ({}): {}", err.kind(), err),
    }
}
