use std::fmt::Debug;

use chrono::{DateTime, Utc};
use mongodb::bson::Document;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::{Database, EntityStore, Table};
use crate::error::Error;
use crate::sync::Collections;
use crate::typedid::{RecordId, TypedId, TypedIdMarker};

/// A kind of content the admin panel edits. Each implementor maps between the
/// row persisted in its table and the record kept in memory and served to
/// the pages.
pub trait Entity:
    TypedIdMarker + Clone + Debug + PartialEq + Serialize + Send + Sync + Unpin + 'static
{
    type Row: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static;

    const TABLE: Table;

    fn id(&self) -> &RecordId<Self>;

    fn with_id(self, id: RecordId<Self>) -> Self;

    /// The editable columns, as written by an update.
    fn changes(&self) -> Document;

    fn to_row(&self, id: TypedId<Self>, now: DateTime<Utc>) -> Self::Row;

    fn from_row(row: Self::Row) -> Self;

    fn validate(&self) -> Result<(), Error>;

    fn store(db: &dyn Database) -> &dyn EntityStore<Self>;

    fn collection(collections: &Collections) -> &Vec<Self>;

    fn collection_mut(collections: &mut Collections) -> &mut Vec<Self>;

    fn same_content(&self, other: &Self) -> bool {
        self.changes() == other.changes()
    }
}
