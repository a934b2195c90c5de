use storyfeed_client::{
    config::{self, ConfigError},
    feed::{FeedController, FeedError, FeedOptions},
    service::HttpStoryService,
    session::SessionStore,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Error building http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Error loading feed: {0}")]
    Feed(#[from] FeedError),
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storyfeed_client=debug,storyfeed_common=debug,reqwest=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let config = config::load()?;
    info!(api = %config.api_base_url, page_size = config.page_size.get(), "Starting feed");

    let sessions = SessionStore::new();
    let service = HttpStoryService::new(&config, sessions)?;
    let feed = FeedController::new(service, FeedOptions::from(&config));

    feed.load().await?;

    let state = feed.snapshot();
    for story in state.stories() {
        info!(
            story = %story.id,
            author = %story.user.name,
            caption = %story.caption,
            likes = story.like_count(),
            comments = story.comment_count(),
            "Story"
        );
    }
    info!(
        stories = state.stories().len(),
        has_more = state.has_more(),
        "Feed loaded"
    );

    Ok(())
}
