use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CampaignId;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MarketingCampaignRow {
    #[serde(rename = "_id")]
    pub id: CampaignId,
    pub image_url: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
