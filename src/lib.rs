pub mod api;
pub mod content;
pub mod error;
pub mod notion;
pub mod state;

use std::env;

use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use notion::NotionClient;
use state::AppState;

pub async fn run() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .with_env_filter(EnvFilter::from_env("NOTIONBLOG_LOG"))
        .init();

    let notion = NotionClient::new(notion_token(), notion_index_id());
    let app = AppState::new(notion, env::var("NOTIONBLOG_PREVIEW_SECRET").ok());

    api::run_server(app).await
}

fn notion_token() -> String {
    env::var("NOTION_TOKEN").expect("NOTION_TOKEN not set")
}

fn notion_index_id() -> String {
    env::var("NOTION_INDEX_ID").expect("NOTION_INDEX_ID not set")
}
