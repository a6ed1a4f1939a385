use std::sync::Arc;

use actix_web::web::{self, Data, JsonConfig, PathConfig, QueryConfig, ServiceConfig};
use actix_web::{App, HttpResponse, HttpServer};
use mongodb::Client;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

pub mod admin;
pub mod campaign;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod manager;
pub mod notice;
pub mod repository;
pub mod seed;
pub mod session;
pub mod settings;
pub mod storage;
pub mod sync;
pub mod team;
pub mod testimonial;
pub mod typedid;
pub mod unsaved;
pub mod utils;
pub mod video;
pub mod violations;

pub use error::Error;

use crate::config::{Backend, Config};
use crate::database::memory::MemoryDatabase;
use crate::database::{Database, MongoDatabase};
use crate::notice::Notices;
use crate::session::Session;
use crate::settings::Settings;
use crate::storage::LocalStorage;
use crate::sync::SyncContext;
use crate::unsaved::UnsavedChanges;

/// Everything the request handlers share.
#[derive(Clone)]
pub struct AppState {
    context: Arc<SyncContext>,
    session: Session,
    settings: Settings,
    unsaved: UnsavedChanges,
}

impl AppState {
    pub fn new(db: Arc<dyn Database>, storage: Arc<LocalStorage>) -> AppState {
        AppState {
            context: Arc::new(SyncContext::new(db, Arc::new(Notices::new()))),
            session: Session::new(Arc::clone(&storage)),
            settings: Settings::new(storage),
            unsaved: UnsavedChanges::new(),
        }
    }

    pub fn context(&self) -> &Arc<SyncContext> {
        &self.context
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn configure(&self, cfg: &mut ServiceConfig) {
        cfg.app_data(JsonConfig::default().error_handler(|err, _req| {
            // format json errors with custom format
            Error::InvalidJson(err).into()
        }))
        .app_data(PathConfig::default().error_handler(|err, _req| {
            // format path errors with custom format
            Error::InvalidPath(err).into()
        }))
        .app_data(QueryConfig::default().error_handler(|err, _req| {
            // format query errors with custom format
            Error::InvalidQuery(err).into()
        }))
        .app_data(Data::from(Arc::clone(&self.context)))
        .app_data(Data::new(self.session.clone()))
        .app_data(Data::new(self.settings.clone()))
        .app_data(Data::new(self.unsaved.clone()))
        .service(admin::login)
        .service(admin::logout)
        .service(admin::get_session)
        .service(admin::get_shell)
        .service(admin::set_unsaved_changes)
        .service(admin::before_unload)
        .service(admin::navigate)
        .service(admin::get_dashboard)
        .service(admin::refresh)
        .service(admin::get_notices)
        .service(admin::stream_notices)
        .service(admin::get_admins)
        .service(admin::add_admin)
        .service(admin::remove_admin)
        .service(admin::get_partner_form_url)
        .service(admin::set_partner_form_url)
        .service(admin::get_content)
        .service(campaign::get_campaigns)
        .service(campaign::create_campaign)
        .service(campaign::replace_campaigns)
        .service(campaign::update_campaign)
        .service(campaign::delete_campaign)
        .service(team::get_team_members)
        .service(team::create_team_member)
        .service(team::replace_team_members)
        .service(team::update_team_member)
        .service(team::delete_team_member)
        .service(testimonial::get_testimonials)
        .service(testimonial::create_testimonial)
        .service(testimonial::replace_testimonials)
        .service(testimonial::update_testimonial)
        .service(testimonial::delete_testimonial)
        .service(video::get_videos)
        .service(video::create_video)
        .service(video::replace_videos)
        .service(video::update_video)
        .service(video::delete_video);
    }
}

pub async fn path_not_found() -> Result<HttpResponse, Error> {
    Err(Error::PathNotFound)
}

pub async fn run(config: Config) -> Result<(), Error> {
    let db: Arc<dyn Database> = match config.backend {
        Backend::Mongo => {
            info!("connecting to db: {}", config.mongodb_uri);
            let client = Client::with_uri_str(&config.mongodb_uri).await?;
            let db = MongoDatabase::initialize(client.database(&config.database_name)).await?;
            db.ping().await?;
            Arc::new(db)
        }
        Backend::Memory => {
            warn!("using the in-memory store, content is lost on exit");
            Arc::new(MemoryDatabase::new())
        }
    };

    if config.seed_defaults {
        seed::seed_defaults(&*db).await?;
    }

    info!("opening local storage: {}", config.storage_path.display());
    let storage = Arc::new(LocalStorage::open(&config.storage_path)?);

    let state = AppState::new(db, storage);
    if let Some(admin) = &config.bootstrap_admin {
        state.session().ensure_admin(&admin.email, &admin.password)?;
    }

    state.context().load_all().await;
    let listeners = Arc::clone(state.context()).listen().await;

    info!("listening on {}", config.bind_address);
    let result = HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(TracingLogger::default())
            .configure(move |cfg| state.configure(cfg))
            .default_service(web::to(path_not_found))
    })
    .bind(&config.bind_address)?
    .run()
    .await;

    for listener in listeners {
        listener.abort();
    }

    result?;

    Ok(())
}
