use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::web::{Bytes, Data, Json, Path};
use actix_web::{delete, get, post, put, HttpResponse};
use futures::{stream, Stream};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::database::Table;
use crate::error::Error;
use crate::notice::Notice;
use crate::session::{AdminSession, Session};
use crate::settings::Settings;
use crate::sync::{Collections, SyncContext};
use crate::unsaved::{Navigation, UnloadDecision, UnsavedChanges};

use super::{menu, AdminPage, MenuItem};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBody {
    pub authenticated: bool,
    pub email: Option<String>,
}

impl SessionBody {
    fn render(session: &Session) -> SessionBody {
        SessionBody {
            authenticated: session.guard(),
            email: session.email(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellBody {
    pub email: Option<String>,
    pub menu: Vec<MenuItem>,
    pub has_unsaved_changes: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UnsavedChangesBody {
    pub pending: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NavigateBody {
    pub target: AdminPage,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct BeforeUnloadBody {
    pub decision: UnloadDecision,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSection {
    pub table: Table,
    pub label: &'static str,
    pub path: &'static str,
    pub count: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBody {
    pub is_loading: bool,
    pub sections: Vec<DashboardSection>,
}

impl DashboardBody {
    async fn render(context: &SyncContext) -> DashboardBody {
        let collections = context.snapshot().await;
        let sections = Table::ALL
            .iter()
            .map(|&table| {
                let page = AdminPage::for_table(table);
                DashboardSection {
                    table,
                    label: page.label(),
                    path: page.path(),
                    count: collections.count(table),
                }
            })
            .collect();

        DashboardBody {
            is_loading: context.is_loading(),
            sections,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NoticesBody {
    pub notices: Vec<Notice>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AdminsBody {
    pub admins: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PartnerFormUrlBody {
    pub url: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBody {
    #[serde(flatten)]
    pub collections: Collections,
    pub partner_form_url: String,
}

#[post("/admin/login")]
#[tracing::instrument(skip(session, body), fields(email = %body.email))]
pub async fn login(
    session: Data<Session>,
    body: Json<LoginBody>,
) -> Result<Json<SessionBody>, Error> {
    session.login(&body.email, &body.password)?;

    Ok(Json(SessionBody::render(&session)))
}

#[post("/admin/logout")]
#[tracing::instrument(skip(session, unsaved))]
pub async fn logout(
    session: Data<Session>,
    unsaved: Data<UnsavedChanges>,
) -> Result<Json<SessionBody>, Error> {
    session.logout()?;
    unsaved.reset();

    Ok(Json(SessionBody::render(&session)))
}

#[get("/admin/session")]
#[tracing::instrument(skip(session))]
pub async fn get_session(session: Data<Session>) -> Result<Json<SessionBody>, Error> {
    Ok(Json(SessionBody::render(&session)))
}

#[get("/admin/shell")]
#[tracing::instrument(skip(unsaved))]
pub async fn get_shell(
    admin: AdminSession,
    unsaved: Data<UnsavedChanges>,
) -> Result<Json<ShellBody>, Error> {
    Ok(Json(ShellBody {
        email: admin.email,
        menu: menu(),
        has_unsaved_changes: unsaved.is_pending(),
    }))
}

#[put("/admin/unsaved-changes")]
#[tracing::instrument(skip(unsaved))]
pub async fn set_unsaved_changes(
    admin: AdminSession,
    unsaved: Data<UnsavedChanges>,
    body: Json<UnsavedChangesBody>,
) -> Result<Json<UnsavedChangesBody>, Error> {
    unsaved.set(body.pending);

    Ok(Json(UnsavedChangesBody {
        pending: unsaved.is_pending(),
    }))
}

#[get("/admin/before-unload")]
#[tracing::instrument(skip(unsaved))]
pub async fn before_unload(
    admin: AdminSession,
    unsaved: Data<UnsavedChanges>,
) -> Result<Json<BeforeUnloadBody>, Error> {
    Ok(Json(BeforeUnloadBody {
        decision: unsaved.before_unload(),
    }))
}

#[post("/admin/navigate")]
#[tracing::instrument(skip(unsaved))]
pub async fn navigate(
    admin: AdminSession,
    unsaved: Data<UnsavedChanges>,
    body: Json<NavigateBody>,
) -> Result<Json<Navigation>, Error> {
    match unsaved.navigate(body.target, body.confirm) {
        Navigation::Stayed => Err(Error::UnsavedChangesPending),
        moved => Ok(Json(moved)),
    }
}

#[get("/admin/dashboard")]
#[tracing::instrument(skip(context))]
pub async fn get_dashboard(
    admin: AdminSession,
    context: Data<SyncContext>,
) -> Result<Json<DashboardBody>, Error> {
    Ok(Json(DashboardBody::render(&context).await))
}

#[post("/admin/refresh")]
#[tracing::instrument(skip(context))]
pub async fn refresh(
    admin: AdminSession,
    context: Data<SyncContext>,
) -> Result<Json<DashboardBody>, Error> {
    context.refresh().await;

    Ok(Json(DashboardBody::render(&context).await))
}

#[get("/admin/notices")]
#[tracing::instrument(skip(context))]
pub async fn get_notices(
    admin: AdminSession,
    context: Data<SyncContext>,
) -> Result<Json<NoticesBody>, Error> {
    Ok(Json(NoticesBody {
        notices: context.notices().drain(),
    }))
}

/// Server-sent events, one per notice raised while the client is connected.
#[get("/admin/notices/stream")]
#[tracing::instrument(skip(context))]
pub async fn stream_notices(
    admin: AdminSession,
    context: Data<SyncContext>,
) -> Result<HttpResponse, Error> {
    let events = notice_events(context.notices().subscribe());

    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(events))
}

fn notice_events(
    receiver: broadcast::Receiver<Notice>,
) -> impl Stream<Item = Result<Bytes, Error>> {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(notice) => {
                    let event = serde_json::to_string(&notice)
                        .map(|json| Bytes::from(format!("data: {}\n\n", json)))
                        .map_err(Error::from);
                    return Some((event, receiver));
                }
                // skipped notices are still in the polled buffer
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[get("/admin/users")]
#[tracing::instrument(skip(session))]
pub async fn get_admins(
    admin: AdminSession,
    session: Data<Session>,
) -> Result<Json<AdminsBody>, Error> {
    Ok(Json(AdminsBody {
        admins: session.admins()?,
    }))
}

#[post("/admin/users")]
#[tracing::instrument(skip(session, context, body), fields(email = %body.email))]
pub async fn add_admin(
    admin: AdminSession,
    session: Data<Session>,
    context: Data<SyncContext>,
    body: Json<LoginBody>,
) -> Result<Json<AdminsBody>, Error> {
    let admins = session.add_admin(&body.email, &body.password)?;
    context.notices().success(
        "Admin added",
        format!("{} was added as an admin", body.email),
    );

    Ok(Json(AdminsBody { admins }))
}

#[delete("/admin/users/{email}")]
#[tracing::instrument(skip(session, context))]
pub async fn remove_admin(
    admin: AdminSession,
    session: Data<Session>,
    context: Data<SyncContext>,
    params: Path<String>,
) -> Result<Json<AdminsBody>, Error> {
    let email = params.into_inner();

    let admins = session.remove_admin(&email)?;
    context
        .notices()
        .success("Admin removed", format!("{} was removed", email));

    Ok(Json(AdminsBody { admins }))
}

#[get("/admin/partner-form-url")]
#[tracing::instrument(skip(settings))]
pub async fn get_partner_form_url(
    admin: AdminSession,
    settings: Data<Settings>,
) -> Result<Json<PartnerFormUrlBody>, Error> {
    Ok(Json(PartnerFormUrlBody {
        url: settings.partner_form_url(),
    }))
}

#[put("/admin/partner-form-url")]
#[tracing::instrument(skip(settings, unsaved))]
pub async fn set_partner_form_url(
    admin: AdminSession,
    settings: Data<Settings>,
    unsaved: Data<UnsavedChanges>,
    body: Json<PartnerFormUrlBody>,
) -> Result<Json<PartnerFormUrlBody>, Error> {
    settings.set_partner_form_url(&body.url)?;
    unsaved.reset();

    Ok(Json(PartnerFormUrlBody {
        url: settings.partner_form_url(),
    }))
}

#[get("/content")]
#[tracing::instrument(skip(context, settings))]
pub async fn get_content(
    context: Data<SyncContext>,
    settings: Data<Settings>,
) -> Result<Json<ContentBody>, Error> {
    Ok(Json(ContentBody {
        collections: context.snapshot().await,
        partner_form_url: settings.partner_form_url(),
    }))
}
