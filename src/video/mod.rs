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

use self::db::VideoRow;

pub type VideoId = TypedId<Video>;

const MINIMUM_TITLE_LENGTH: usize = 2;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: RecordId<Video>,
    pub title: String,
    pub url: String,
}

impl TypedIdMarker for Video {
    fn tag() -> &'static str {
        "VID"
    }

    fn draft_prefix() -> &'static str {
        "video"
    }
}

impl Entity for Video {
    type Row = VideoRow;

    const TABLE: Table = Table::Videos;

    fn id(&self) -> &RecordId<Self> {
        &self.id
    }

    fn with_id(self, id: RecordId<Self>) -> Self {
        Video { id, ..self }
    }

    fn changes(&self) -> Document {
        bson::doc! {
            "title": self.title.clone(),
            "url": self.url.clone(),
        }
    }

    fn to_row(&self, id: VideoId, now: DateTime<Utc>) -> VideoRow {
        VideoRow {
            id,
            title: self.title.clone(),
            url: self.url.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn from_row(row: VideoRow) -> Self {
        Video {
            id: RecordId::Stored(row.id),
            title: row.title,
            url: row.url,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let mut violations = Violations::new();
        violations
            .min_length("title", &self.title, MINIMUM_TITLE_LENGTH)
            .url("url", &self.url);
        violations.into_result()
    }

    fn store(db: &dyn Database) -> &dyn EntityStore<Self> {
        db.videos()
    }

    fn collection(collections: &Collections) -> &Vec<Self> {
        &collections.videos
    }

    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.videos
    }
}
