use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, put};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::manager;
use crate::session::AdminSession;
use crate::sync::SyncContext;
use crate::typedid::RecordId;
use crate::unsaved::UnsavedChanges;
use crate::utils::{ConfirmQuery, ListBody, SuccessBody};

use super::{TeamMember, TeamMemberId};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamMemberBody {
    pub image_url: String,
}

impl CreateTeamMemberBody {
    fn into_team_member(self) -> TeamMember {
        TeamMember {
            id: RecordId::draft(),
            image_url: self.image_url.trim().to_string(),
        }
    }
}

#[get("/admin/team")]
#[tracing::instrument(skip(context))]
pub async fn get_team_members(
    session: AdminSession,
    context: Data<SyncContext>,
) -> Result<Json<ListBody<TeamMember>>, Error> {
    let items = manager::get_all::<TeamMember>(&context).await;

    Ok(Json(ListBody {
        is_loading: context.is_loading(),
        items,
    }))
}

#[post("/admin/team")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn create_team_member(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    body: Json<CreateTeamMemberBody>,
) -> Result<Json<TeamMember>, Error> {
    let member = manager::add(&context, body.into_inner().into_team_member()).await?;
    unsaved.reset();

    Ok(Json(member))
}

#[put("/admin/team")]
#[tracing::instrument(skip(context, unsaved, body))]
pub async fn replace_team_members(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    body: Json<Vec<TeamMember>>,
) -> Result<Json<ListBody<TeamMember>>, Error> {
    let items = manager::replace_all(&context, body.into_inner()).await?;
    unsaved.reset();

    Ok(Json(ListBody {
        is_loading: context.is_loading(),
        items,
    }))
}

#[put("/admin/team/{team_member_id}")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn update_team_member(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    params: Path<TeamMemberId>,
    body: Json<CreateTeamMemberBody>,
) -> Result<Json<TeamMember>, Error> {
    let team_member_id = params.into_inner();

    let member =
        manager::edit(&context, team_member_id, body.into_inner().into_team_member()).await?;
    unsaved.reset();

    Ok(Json(member))
}

#[delete("/admin/team/{team_member_id}")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn delete_team_member(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    params: Path<TeamMemberId>,
    query: Query<ConfirmQuery>,
) -> Result<Json<SuccessBody>, Error> {
    let team_member_id = params.into_inner();

    manager::remove::<TeamMember>(&context, team_member_id, query.confirm).await?;
    unsaved.reset();

    Ok(Json(SuccessBody::new()))
}
