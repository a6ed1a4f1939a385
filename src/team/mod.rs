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

use self::db::TeamMemberRow;

pub type TeamMemberId = TypedId<TeamMember>;

/// A team photo shown on the landing page.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: RecordId<TeamMember>,
    pub image_url: String,
}

impl TypedIdMarker for TeamMember {
    fn tag() -> &'static str {
        "TEM"
    }

    fn draft_prefix() -> &'static str {
        "team"
    }
}

impl Entity for TeamMember {
    type Row = TeamMemberRow;

    const TABLE: Table = Table::TeamMembers;

    fn id(&self) -> &RecordId<Self> {
        &self.id
    }

    fn with_id(self, id: RecordId<Self>) -> Self {
        TeamMember { id, ..self }
    }

    fn changes(&self) -> Document {
        bson::doc! { "image_url": self.image_url.clone() }
    }

    fn to_row(&self, id: TeamMemberId, now: DateTime<Utc>) -> TeamMemberRow {
        TeamMemberRow {
            id,
            image_url: self.image_url.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn from_row(row: TeamMemberRow) -> Self {
        TeamMember {
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
        db.team_members()
    }

    fn collection(collections: &Collections) -> &Vec<Self> {
        &collections.team_members
    }

    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.team_members
    }
}
