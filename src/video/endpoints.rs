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

use super::{Video, VideoId};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoBody {
    pub title: String,
    pub url: String,
}

impl CreateVideoBody {
    fn into_video(self) -> Video {
        Video {
            id: RecordId::draft(),
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
        }
    }
}

#[get("/admin/videos")]
#[tracing::instrument(skip(context))]
pub async fn get_videos(
    session: AdminSession,
    context: Data<SyncContext>,
) -> Result<Json<ListBody<Video>>, Error> {
    let items = manager::get_all::<Video>(&context).await;

    Ok(Json(ListBody {
        is_loading: context.is_loading(),
        items,
    }))
}

#[post("/admin/videos")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn create_video(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    body: Json<CreateVideoBody>,
) -> Result<Json<Video>, Error> {
    let video = manager::add(&context, body.into_inner().into_video()).await?;
    unsaved.reset();

    Ok(Json(video))
}

#[put("/admin/videos")]
#[tracing::instrument(skip(context, unsaved, body))]
pub async fn replace_videos(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    body: Json<Vec<Video>>,
) -> Result<Json<ListBody<Video>>, Error> {
    let items = manager::replace_all(&context, body.into_inner()).await?;
    unsaved.reset();

    Ok(Json(ListBody {
        is_loading: context.is_loading(),
        items,
    }))
}

#[put("/admin/videos/{video_id}")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn update_video(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    params: Path<VideoId>,
    body: Json<CreateVideoBody>,
) -> Result<Json<Video>, Error> {
    let video_id = params.into_inner();

    let video = manager::edit(&context, video_id, body.into_inner().into_video()).await?;
    unsaved.reset();

    Ok(Json(video))
}

#[delete("/admin/videos/{video_id}")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn delete_video(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    params: Path<VideoId>,
    query: Query<ConfirmQuery>,
) -> Result<Json<SuccessBody>, Error> {
    let video_id = params.into_inner();

    manager::remove::<Video>(&context, video_id, query.confirm).await?;
    unsaved.reset();

    Ok(Json(SuccessBody::new()))
}
