use chrono::{DateTime, Utc};
use mongodb::bson::{self, Document};
use serde::{Deserialize, Serialize};

use crate::database::{Database, EntityStore, Table};
use crate::entity::Entity;
use crate::error::Error;
use crate::sync::Collections;
use crate::typedid::{RecordId, TypedId, TypedIdMarker};
use crate::violations::Violations;

pub mod db;
pub mod endpoints;
pub use endpoints::*;

use self::db::MarketingCampaignRow;

pub type CampaignId = TypedId<MarketingCampaign>;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingCampaign {
    pub id: RecordId<MarketingCampaign>,
    pub image_url: String,
}

impl TypedIdMarker for MarketingCampaign {
    fn tag() -> &'static str {
        "CPN"
    }

    fn draft_prefix() -> &'static str {
        "campaign"
    }
}

impl Entity for MarketingCampaign {
    type Row = MarketingCampaignRow;

    const TABLE: Table = Table::MarketingCampaigns;

    fn id(&self) -> &RecordId<Self> {
        &self.id
    }

    fn with_id(self, id: RecordId<Self>) -> Self {
        MarketingCampaign { id, ..self }
    }

    fn changes(&self) -> Document {
        bson::doc! { "image_url": self.image_url.clone() }
    }

    fn to_row(&self, id: CampaignId, now: DateTime<Utc>) -> MarketingCampaignRow {
        MarketingCampaignRow {
            id,
            image_url: self.image_url.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn from_row(row: MarketingCampaignRow) -> Self {
        MarketingCampaign {
            id: RecordId::Stored(row.id),
            image_url: row.image_url,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let mut violations = Violations::new();
        violations.image_url("imageUrl", &self.image_url);
        violations.into_result()
    }

    fn store(db: &dyn Database) -> &dyn EntityStore<Self> {
        db.campaigns()
    }

    fn collection(collections: &Collections) -> &Vec<Self> {
        &collections.marketing_campaigns
    }

    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.marketing_campaigns
    }
}
