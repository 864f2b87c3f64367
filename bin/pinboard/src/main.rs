use std::path::Path;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use pb_api::middleware::{security_headers, standard_middleware};
use pb_api::{configure_routes, handlers, AppState};
use pb_config::{LogFormat, LogSettings, Settings};
use pb_core::{DemoGenerator, RemoteFeed, SessionHandle};
use pb_store_json::JsonFileStore;
use tracing_subscriber::EnvFilter;

#[cfg(feature = "storage-local")]
use actix_files::Files;
#[cfg(feature = "ai-gemini")]
use pb_ai_gemini::GeminiMetadata;
#[cfg(feature = "auth-simple")]
use pb_auth_simple::SimpleIdentity;
#[cfg(feature = "remote-sqlite")]
use pb_remote_sqlite::SqliteRemoteFeed;
#[cfg(feature = "storage-local")]
use pb_storage_local::LocalMediaStore;
#[cfg(any(feature = "auth-simple", feature = "ai-gemini"))]
use secrecy::ExposeSecret;
#[cfg(feature = "ai-gemini")]
use secrecy::SecretString;

const MEDIA_PREFIX: &str = "/media";

fn init_tracing(log: &LogSettings) {
    // RUST_LOG wins over the configured filter.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Connects the remote collection. A failed connection degrades to demo mode.
#[cfg(feature = "remote-sqlite")]
async fn remote_feed(settings: &Settings) -> Option<Arc<dyn RemoteFeed>> {
    let remote = settings.remote.as_ref()?;
    let interval = std::time::Duration::from_millis(remote.poll_interval_ms);
    match SqliteRemoteFeed::new(&remote.database_url, interval).await {
        Ok(feed) => Some(Arc::new(feed)),
        Err(e) => {
            tracing::error!(error = %e, "remote collection unavailable, falling back to demo mode");
            None
        }
    }
}

#[cfg(not(feature = "remote-sqlite"))]
async fn remote_feed(settings: &Settings) -> Option<Arc<dyn RemoteFeed>> {
    if let Some(remote) = &settings.remote {
        tracing::warn!(url = %remote.database_url, "remote settings ignored, built without remote-sqlite");
    }
    None
}

#[cfg(feature = "storage-local")]
fn mount_media(cfg: &mut web::ServiceConfig, dir: &Path) {
    cfg.service(Files::new(MEDIA_PREFIX, dir));
}

#[cfg(not(feature = "storage-local"))]
fn mount_media(_cfg: &mut web::ServiceConfig, _dir: &Path) {}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.log);

    // 1. Interaction blobs and the session
    let store = JsonFileStore::open(settings.state_dir())?;
    let feed = remote_feed(&settings).await;
    let session = SessionHandle::new(Box::new(store), DemoGenerator::new(), feed);
    session.update(|s| s.set_language(settings.language));

    let mut state = AppState::new(session.clone());

    // 2. Media storage
    let media_dir = settings.media_dir();
    #[cfg(feature = "storage-local")]
    {
        std::fs::create_dir_all(&media_dir)?;
        state.media = Some(Box::new(LocalMediaStore::new(media_dir.clone(), MEDIA_PREFIX.into())));
    }

    // 3. Identity
    #[cfg(feature = "auth-simple")]
    {
        state.identity = Some(Box::new(SimpleIdentity::new(settings.auth.salt.expose_secret())));
    }

    // 4. Generative metadata
    #[cfg(feature = "ai-gemini")]
    {
        if let Some(gemini) = &settings.gemini {
            let key = SecretString::from(gemini.api_key.expose_secret().to_string());
            state.metadata = Some(Box::new(GeminiMetadata::new(key, gemini.model.clone())?));
            tracing::info!(model = %gemini.model, "autofill enabled");
        }
    }

    session.start();

    let state = web::Data::new(state);
    let (host, port) = settings.bind_address();
    tracing::info!("Pinboard starting on http://{host}:{port}");

    let served = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(security_headers())
            .wrap(standard_middleware())
            .configure(configure_routes)
            .configure(|cfg| mount_media(cfg, &media_dir))
            .default_service(web::to(handlers::not_found))
    })
    .bind((host, port))?
    .run()
    .await;

    session.shutdown();
    served?;
    Ok(())
}
