use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::VideoId;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VideoRow {
    #[serde(rename = "_id")]
    pub id: VideoId,
    pub title: String,
    pub url: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
