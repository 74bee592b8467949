use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AccessTokenCodec, PasswordHasher, RefreshTokenStore, SessionOrchestrator};
use crate::clock::{Clock, SystemClock};
use crate::configuration::{JwtSettings, Platform};
use crate::error::{AppError, ValidationError};
use crate::middleware::{CountHits, HitCounter};
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login,
    metrics, refresh, reset, revoke, update_user,
};
use crate::store::{ChirpRepository, RefreshTokenRepository, UserRepository};

/// Persistence handles shared by every worker
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub chirps: Arc<dyn ChirpRepository>,
}

impl Repositories {
    /// All three repositories backed by the same store
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository + RefreshTokenRepository + ChirpRepository + 'static,
    {
        Self {
            users: store.clone(),
            refresh_tokens: store.clone(),
            chirps: store,
        }
    }
}

/// Process-wide settings injected into the server at startup
#[derive(Clone)]
pub struct ServerSettings {
    pub jwt: JwtSettings,
    pub platform: Platform,
    pub hasher: PasswordHasher,
    pub clock: Arc<dyn Clock>,
    /// Directory served under `/app`
    pub static_dir: String,
}

impl ServerSettings {
    pub fn new(jwt: JwtSettings, platform: Platform) -> Self {
        Self {
            jwt,
            platform,
            hasher: PasswordHasher::default(),
            clock: Arc::new(SystemClock),
            static_dir: "./public".to_string(),
        }
    }
}

pub fn build_sessions(repositories: &Repositories, settings: &ServerSettings) -> SessionOrchestrator {
    SessionOrchestrator::new(
        repositories.users.clone(),
        settings.hasher,
        AccessTokenCodec::new(&settings.jwt, settings.clock.clone()),
        RefreshTokenStore::new(repositories.refresh_tokens.clone(), settings.clock.clone()),
    )
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(ValidationError::MalformedBody(err.to_string())).into()
    })
}

pub fn run(
    listener: TcpListener,
    repositories: Repositories,
    settings: ServerSettings,
) -> Result<Server, std::io::Error> {
    let sessions = web::Data::new(build_sessions(&repositories, &settings));
    let users = web::Data::from(repositories.users);
    let chirps = web::Data::from(repositories.chirps);
    let platform = web::Data::new(settings.platform);
    let hits = web::Data::new(HitCounter::new());
    let static_dir = settings.static_dir;

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())

            // Shared state
            .app_data(json_config())
            .app_data(sessions.clone())
            .app_data(users.clone())
            .app_data(chirps.clone())
            .app_data(platform.clone())
            .app_data(hits.clone())

            .route("/api/healthz", web::get().to(health_check))
            .service(
                web::resource("/api/users")
                    .route(web::post().to(create_user))
                    .route(web::put().to(update_user)),
            )
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .service(
                web::resource("/api/chirps")
                    .route(web::get().to(list_chirps))
                    .route(web::post().to(create_chirp)),
            )
            .service(
                web::resource("/api/chirps/{chirp_id}")
                    .route(web::get().to(get_chirp))
                    .route(web::delete().to(delete_chirp)),
            )
            .route("/admin/metrics", web::get().to(metrics))
            .route("/admin/reset", web::post().to(reset))

            // Static files, counted for the admin metrics page
            .service(
                web::scope("/app")
                    .wrap(CountHits::new(hits.clone().into_inner()))
                    .service(fs::Files::new("/", &static_dir).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
