use std::fmt::{self, Display};

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use mongodb::change_stream::event::OperationType;
use mongodb::options::FindOptions;
use mongodb::{bson, Collection, Database as MongoClientDatabase};
use serde::Serialize;

use crate::campaign::MarketingCampaign;
use crate::entity::Entity;
use crate::error::Error;
use crate::team::TeamMember;
use crate::testimonial::Testimonial;
use crate::typedid::TypedId;
use crate::video::Video;

pub mod memory;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    MarketingCampaigns,
    TeamMembers,
    Testimonials,
    Videos,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::MarketingCampaigns,
        Table::TeamMembers,
        Table::Testimonials,
        Table::Videos,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::MarketingCampaigns => "marketing_campaigns",
            Table::TeamMembers => "team_members",
            Table::Testimonials => "testimonials",
            Table::Videos => "videos",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Table::MarketingCampaigns => "marketing campaigns",
            Table::TeamMembers => "team members",
            Table::Testimonials => "testimonials",
            Table::Videos => "videos",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    Other,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
}

pub type ChangeFeed = BoxStream<'static, Result<ChangeEvent, Error>>;

#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// All rows, oldest first.
    async fn fetch_all(&self) -> Result<Vec<E>, Error>;

    /// Persists a new row and returns the record under its permanent id.
    async fn insert(&self, entity: &E) -> Result<E, Error>;

    /// Returns whether a row with that id existed.
    async fn update(&self, id: TypedId<E>, entity: &E) -> Result<bool, Error>;

    async fn delete_many(&self, ids: &[TypedId<E>]) -> Result<u64, Error>;

    async fn subscribe(&self) -> Result<ChangeFeed, Error>;
}

#[async_trait]
pub trait Database: Send + Sync {
    fn campaigns(&self) -> &dyn EntityStore<MarketingCampaign>;

    fn team_members(&self) -> &dyn EntityStore<TeamMember>;

    fn testimonials(&self) -> &dyn EntityStore<Testimonial>;

    fn videos(&self) -> &dyn EntityStore<Video>;

    async fn ping(&self) -> Result<(), Error>;

    async fn subscribe(&self, table: Table) -> Result<ChangeFeed, Error> {
        match table {
            Table::MarketingCampaigns => self.campaigns().subscribe().await,
            Table::TeamMembers => self.team_members().subscribe().await,
            Table::Testimonials => self.testimonials().subscribe().await,
            Table::Videos => self.videos().subscribe().await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MongoStore<E: Entity> {
    collection: Collection<E::Row>,
}

impl<E: Entity> MongoStore<E> {
    fn new(db: &MongoClientDatabase) -> MongoStore<E> {
        MongoStore {
            collection: db.collection(E::TABLE.name()),
        }
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for MongoStore<E> {
    #[tracing::instrument(skip(self), fields(table = %E::TABLE))]
    async fn fetch_all(&self) -> Result<Vec<E>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": 1 })
            .build();

        let rows: Vec<E::Row> = self
            .collection
            .find(None, options)
            .await?
            .try_collect()
            .await?;

        Ok(rows.into_iter().map(E::from_row).collect())
    }

    #[tracing::instrument(skip(self), fields(table = %E::TABLE))]
    async fn insert(&self, entity: &E) -> Result<E, Error> {
        let row = entity.to_row(TypedId::new(), Utc::now());
        self.collection.insert_one(&row, None).await?;

        Ok(E::from_row(row))
    }

    #[tracing::instrument(skip(self), fields(table = %E::TABLE))]
    async fn update(&self, id: TypedId<E>, entity: &E) -> Result<bool, Error> {
        let mut changes = entity.changes();
        changes.insert("updated_at", bson::DateTime::from_chrono(Utc::now()));

        let result = self
            .collection
            .update_one(bson::doc! { "_id": id }, bson::doc! { "$set": changes }, None)
            .await?;

        Ok(result.matched_count > 0)
    }

    #[tracing::instrument(skip(self), fields(table = %E::TABLE))]
    async fn delete_many(&self, ids: &[TypedId<E>]) -> Result<u64, Error> {
        let ids: Vec<bson::Bson> = ids.iter().copied().map(bson::Bson::from).collect();

        let result = self
            .collection
            .delete_many(bson::doc! { "_id": { "$in": ids } }, None)
            .await?;

        Ok(result.deleted_count)
    }

    #[tracing::instrument(skip(self), fields(table = %E::TABLE))]
    async fn subscribe(&self) -> Result<ChangeFeed, Error> {
        let table = E::TABLE;
        let stream = self
            .collection
            .clone_with_type::<bson::Document>()
            .watch(None, None)
            .await?;

        let feed = stream.map(move |event| {
            let event = event?;
            let kind = match event.operation_type {
                OperationType::Insert => ChangeKind::Insert,
                OperationType::Update | OperationType::Replace => ChangeKind::Update,
                OperationType::Delete => ChangeKind::Delete,
                _ => ChangeKind::Other,
            };

            Ok(ChangeEvent { table, kind })
        });

        Ok(feed.boxed())
    }
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    campaigns: MongoStore<MarketingCampaign>,
    team_members: MongoStore<TeamMember>,
    testimonials: MongoStore<Testimonial>,
    videos: MongoStore<Video>,
    db: MongoClientDatabase,
}

impl MongoDatabase {
    pub fn new(db: MongoClientDatabase) -> MongoDatabase {
        MongoDatabase {
            campaigns: MongoStore::new(&db),
            team_members: MongoStore::new(&db),
            testimonials: MongoStore::new(&db),
            videos: MongoStore::new(&db),
            db,
        }
    }

    pub async fn initialize(db: MongoClientDatabase) -> Result<MongoDatabase, Error> {
        for table in Table::ALL.iter() {
            db.run_command(
                bson::doc! {
                    "createIndexes": table.name(),
                    "indexes": [
                        { "key": { "created_at": 1 }, "name": "by_created_at" },
                    ]
                },
                None,
            )
            .await?;
        }

        Ok(MongoDatabase::new(db))
    }
}

#[async_trait]
impl Database for MongoDatabase {
    fn campaigns(&self) -> &dyn EntityStore<MarketingCampaign> {
        &self.campaigns
    }

    fn team_members(&self) -> &dyn EntityStore<TeamMember> {
        &self.team_members
    }

    fn testimonials(&self) -> &dyn EntityStore<Testimonial> {
        &self.testimonials
    }

    fn videos(&self) -> &dyn EntityStore<Video> {
        &self.videos
    }

    #[tracing::instrument(skip(self))]
    async fn ping(&self) -> Result<(), Error> {
        self.db.run_command(bson::doc! { "ping": 1 }, None).await?;

        Ok(())
    }
}
