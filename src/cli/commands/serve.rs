//! Serve Command
//!
//! Usage:
//!   deepprd serve [--bind 0.0.0.0:3000]

use crate::ai::provider::create_provider;
use crate::config::ConfigLoader;
use crate::server;
use crate::types::Result;

pub async fn run(bind: Option<String>) -> Result<()> {
    let mut config = ConfigLoader::load()?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    // Missing credentials fail here, before any request is accepted
    let provider = create_provider(&config.llm)?;
    server::serve(config, provider).await
}
