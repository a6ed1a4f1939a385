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

use super::{CampaignId, MarketingCampaign};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignBody {
    pub image_url: String,
}

impl CreateCampaignBody {
    fn into_campaign(self) -> MarketingCampaign {
        MarketingCampaign {
            id: RecordId::draft(),
            image_url: self.image_url.trim().to_string(),
        }
    }
}

#[get("/admin/campaigns")]
#[tracing::instrument(skip(context))]
pub async fn get_campaigns(
    session: AdminSession,
    context: Data<SyncContext>,
) -> Result<Json<ListBody<MarketingCampaign>>, Error> {
    let items = manager::get_all::<MarketingCampaign>(&context).await;

    Ok(Json(ListBody {
        is_loading: context.is_loading(),
        items,
    }))
}

#[post("/admin/campaigns")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn create_campaign(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    body: Json<CreateCampaignBody>,
) -> Result<Json<MarketingCampaign>, Error> {
    let campaign = manager::add(&context, body.into_inner().into_campaign()).await?;
    unsaved.reset();

    Ok(Json(campaign))
}

#[put("/admin/campaigns")]
#[tracing::instrument(skip(context, unsaved, body))]
pub async fn replace_campaigns(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    body: Json<Vec<MarketingCampaign>>,
) -> Result<Json<ListBody<MarketingCampaign>>, Error> {
    let items = manager::replace_all(&context, body.into_inner()).await?;
    unsaved.reset();

    Ok(Json(ListBody {
        is_loading: context.is_loading(),
        items,
    }))
}

#[put("/admin/campaigns/{campaign_id}")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn update_campaign(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    params: Path<CampaignId>,
    body: Json<CreateCampaignBody>,
) -> Result<Json<MarketingCampaign>, Error> {
    let campaign_id = params.into_inner();

    let campaign = manager::edit(&context, campaign_id, body.into_inner().into_campaign()).await?;
    unsaved.reset();

    Ok(Json(campaign))
}

#[delete("/admin/campaigns/{campaign_id}")]
#[tracing::instrument(skip(context, unsaved))]
pub async fn delete_campaign(
    session: AdminSession,
    context: Data<SyncContext>,
    unsaved: Data<UnsavedChanges>,
    params: Path<CampaignId>,
    query: Query<ConfirmQuery>,
) -> Result<Json<SuccessBody>, Error> {
    let campaign_id = params.into_inner();

    manager::remove::<MarketingCampaign>(&context, campaign_id, query.confirm).await?;
    unsaved.reset();

    Ok(Json(SuccessBody::new()))
}
