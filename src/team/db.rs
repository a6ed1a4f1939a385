use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TeamMemberId;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TeamMemberRow {
    #[serde(rename = "_id")]
    pub id: TeamMemberId,
    pub image_url: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
