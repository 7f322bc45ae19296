use std::time::Duration;

use alumnet_config::DatabaseSettings;
use mongodb::{Client, Database, options::ClientOptions};
use tracing::info;

/// Opens a pooled client and pings the server before handing out the database.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(&settings.url).await?;
    client_options.app_name = Some("alumnet".to_string());

    // Fail fast instead of hanging when the server is unreachable
    if client_options.server_selection_timeout.is_none() {
        client_options.server_selection_timeout = Some(Duration::from_secs(3));
    }
    if let Some(max_pool) = settings.max_pool_size {
        client_options.max_pool_size = Some(max_pool);
    }
    if let Some(min_pool) = settings.min_pool_size {
        client_options.min_pool_size = Some(min_pool);
    }

    let client = Client::with_options(client_options)?;

    client
        .database("admin")
        .run_command(bson::doc! { "ping": 1 })
        .await?;

    info!(db = %settings.name, "Connected to MongoDB");

    Ok(client.database(&settings.name))
}
