use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};

use hotel_survey::channels::{EmailChannel, NotificationChannel, WhatsAppChannel};
use hotel_survey::config::{AppConfig, EngineKind};
use hotel_survey::models::review::ReviewStore;
use hotel_survey::report::delivery::DeliveryCoordinator;
use hotel_survey::report::engine::builtin::UnicodeFont;
use hotel_survey::report::engine::{BuiltinPdfEngine, ChromiumEngine, RenderEngine};
use hotel_survey::report::{ReportPipeline, ReportSettings, TriggerController};
use hotel_survey::{db, handlers};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("{e}");
        io::Error::other(e)
    })?;

    let pool = db::init_pool(&config.database_url).await.map_err(|e| {
        log::error!("Failed to connect to database: {e}");
        io::Error::other(e)
    })?;
    db::run_migrations(&pool).await.map_err(|e| {
        log::error!("Failed to run migrations: {e}");
        io::Error::other(e)
    })?;

    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(io::Error::other)?;

    let channels = build_channels(&config, &client);
    let coordinator = DeliveryCoordinator::new(channels);
    log::info!("Report channels: {:?}", coordinator.channel_names());

    let engine: Arc<dyn RenderEngine> = match &config.engine {
        EngineKind::Builtin => Arc::new(builtin_engine(&config)?),
        EngineKind::Chromium { executable } => Arc::new(ChromiumEngine::new(executable.clone())),
    };
    log::info!("Report renderer: {}", engine.name());

    let store: Arc<dyn ReviewStore> = Arc::new(pool);
    let settings = ReportSettings {
        hotel_name: config.hotel_name.clone(),
        recent_limit: config.recent_limit,
        tiers: config.tiers,
        ..ReportSettings::default()
    };
    let pipeline = Arc::new(ReportPipeline::new(store.clone(), engine, coordinator, settings));
    let trigger = web::Data::new(TriggerController::new(config.reviews_threshold, pipeline));
    let store = web::Data::from(store);

    let static_dir = config.static_dir.clone();
    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(store.clone())
            .app_data(trigger.clone())
            .configure(handlers::configure)
            // Survey form (registered last so /api wins)
            .service(actix_files::Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}

/// A configured font that fails to load stops startup; otherwise the
/// engine searches the usual locations.
fn builtin_engine(config: &AppConfig) -> io::Result<BuiltinPdfEngine> {
    let Some(path) = &config.pdf_font else {
        return Ok(BuiltinPdfEngine::discover());
    };
    let font = UnicodeFont::load(path).map_err(|e| {
        log::error!("{e}");
        io::Error::other(e)
    })?;
    log::info!("PDF font: {}", path.display());
    Ok(BuiltinPdfEngine::with_font(Arc::new(font)))
}

fn build_channels(config: &AppConfig, client: &reqwest::Client) -> Vec<Arc<dyn NotificationChannel>> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();
    match &config.email {
        Some(settings) => channels.push(Arc::new(EmailChannel::new(client.clone(), settings.clone()))),
        None => log::warn!("Email channel disabled: EMAIL_API_URL, EMAIL_API_KEY, EMAIL_FROM and EMAIL_TO are required"),
    }
    match &config.whatsapp {
        Some(settings) => channels.push(Arc::new(WhatsAppChannel::new(client.clone(), settings.clone()))),
        None => log::warn!("WhatsApp channel disabled: WHATSAPP_PHONE_NUMBER_ID, WHATSAPP_TOKEN and WHATSAPP_RECIPIENT are required"),
    }
    channels
}
