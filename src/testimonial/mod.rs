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

use self::db::TestimonialRow;

pub type TestimonialId = TypedId<Testimonial>;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: RecordId<Testimonial>,
    pub quote: String,
    pub author: String,
    pub business: String,
    pub location: String,
    pub logo_url: String,
}

impl TypedIdMarker for Testimonial {
    fn tag() -> &'static str {
        "TST"
    }

    fn draft_prefix() -> &'static str {
        "testimonial"
    }
}

impl Entity for Testimonial {
    type Row = TestimonialRow;

    const TABLE: Table = Table::Testimonials;

    fn id(&self) -> &RecordId<Self> {
        &self.id
    }

    fn with_id(self, id: RecordId<Self>) -> Self {
        Testimonial { id, ..self }
    }

    fn changes(&self) -> Document {
        bson::doc! {
            "quote": self.quote.clone(),
            "author": self.author.clone(),
            "business": self.business.clone(),
            "location": self.location.clone(),
            "logo_url": self.logo_url.clone(),
        }
    }

    fn to_row(&self, id: TestimonialId, now: DateTime<Utc>) -> TestimonialRow {
        TestimonialRow {
            id,
            quote: self.quote.clone(),
            author: self.author.clone(),
            business: self.business.clone(),
            location: self.location.clone(),
            logo_url: self.logo_url.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn from_row(row: TestimonialRow) -> Self {
        Testimonial {
            id: RecordId::Stored(row.id),
            quote: row.quote,
            author: row.author,
            business: row.business,
            location: row.location,
            logo_url: row.logo_url,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let mut violations = Violations::new();
        violations
            .required("quote", &self.quote)
            .required("author", &self.author)
            .required("business", &self.business)
            .required("location", &self.location)
            .url_or_site_path("logoUrl", &self.logo_url);
        violations.into_result()
    }

    fn store(db: &dyn Database) -> &dyn EntityStore<Self> {
        db.testimonials()
    }

    fn collection(collections: &Collections) -> &Vec<Self> {
        &collections.testimonials
    }

    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self> {
        &mut collections.testimonials
    }
}
