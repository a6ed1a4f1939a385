use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TestimonialId;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TestimonialRow {
    #[serde(rename = "_id")]
    pub id: TestimonialId,
    pub quote: String,
    pub author: String,
    pub business: String,
    pub location: String,
    pub logo_url: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
