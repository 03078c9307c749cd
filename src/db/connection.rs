//! Store connection management.

use mongodb::bson::doc;
use mongodb::{Client, Database};
use tracing::info;

use crate::config::AppConfig;
use crate::errors::Result;

/// Connects to the document store and verifies the connection with a ping.
///
/// A failed ping is the fatal connectivity error: the run reports it and
/// exits without touching anything.
pub async fn connect(config: &AppConfig) -> Result<Database> {
    let client = Client::with_uri_str(&config.mongodb_uri).await?;
    let database = client.database(&config.database_name);
    database.run_command(doc! { "ping": 1 }).await?;
    info!(database = %config.database_name, "connected to document store");
    Ok(database)
}
