use studyflow_core::{Config, RestStore, SessionStore, SqliteStore, StoreBackend};

/// Open the session store selected by the configuration.
pub fn open_store(config: &Config) -> Result<Box<dyn SessionStore>, Box<dyn std::error::Error>> {
    match config.store.backend {
        StoreBackend::Sqlite => Ok(Box::new(SqliteStore::open()?)),
        StoreBackend::Rest => {
            let base_url = config.store.base_url.as_deref().ok_or(
                "store.base_url is not set; run `studyflow config set store.base_url <url>`",
            )?;
            Ok(Box::new(RestStore::new(base_url)?))
        }
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
