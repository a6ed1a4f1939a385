//! In-process store with the same contract as the MongoDB backend. Used by the
//! tests and by the `memory` backend for running without a database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::campaign::MarketingCampaign;
use crate::entity::Entity;
use crate::error::Error;
use crate::team::TeamMember;
use crate::testimonial::Testimonial;
use crate::typedid::{RecordId, TypedId};
use crate::video::Video;

use super::{ChangeEvent, ChangeFeed, ChangeKind, Database, EntityStore, Table};

const CHANGE_FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteCounts {
    pub inserts: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl WriteCounts {
    pub fn total(&self) -> usize {
        self.inserts + self.updates + self.deletes
    }
}

#[derive(Debug)]
struct MemoryRow<E> {
    entity: E,
    updated_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct MemoryStore<E: Entity> {
    rows: Mutex<Vec<MemoryRow<E>>>,
    changes: broadcast::Sender<ChangeEvent>,
    unavailable: AtomicBool,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
}

impl<E: Entity> MemoryStore<E> {
    pub fn new() -> MemoryStore<E> {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        MemoryStore {
            rows: Mutex::new(vec![]),
            changes,
            unavailable: AtomicBool::new(false),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    /// Makes every following call fail as if the store could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn write_counts(&self) -> WriteCounts {
        WriteCounts {
            inserts: self.inserts.load(Ordering::SeqCst),
            updates: self.updates.load(Ordering::SeqCst),
            deletes: self.deletes.load(Ordering::SeqCst),
        }
    }

    pub fn last_updated_at(&self, id: TypedId<E>) -> Option<DateTime<Utc>> {
        self.rows()
            .iter()
            .find(|row| row.entity.id().stored() == Some(id))
            .map(|row| row.updated_at)
    }

    fn rows(&self) -> MutexGuard<'_, Vec<MemoryRow<E>>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::RemoteUnavailable {
                table: E::TABLE,
                reason: "the store is not reachable".to_string(),
            });
        }

        Ok(())
    }

    fn notify(&self, kind: ChangeKind) {
        // no subscribers is fine
        let _ = self.changes.send(ChangeEvent {
            table: E::TABLE,
            kind,
        });
    }
}

impl<E: Entity> Default for MemoryStore<E> {
    fn default() -> MemoryStore<E> {
        MemoryStore::new()
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for MemoryStore<E> {
    async fn fetch_all(&self) -> Result<Vec<E>, Error> {
        self.check_available()?;

        Ok(self.rows().iter().map(|row| row.entity.clone()).collect())
    }

    async fn insert(&self, entity: &E) -> Result<E, Error> {
        self.check_available()?;

        let now = Utc::now();
        let id = TypedId::new();
        let entity = E::from_row(entity.to_row(id, now));
        self.rows().push(MemoryRow {
            entity: entity.clone(),
            updated_at: now,
        });
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.notify(ChangeKind::Insert);

        Ok(entity)
    }

    async fn update(&self, id: TypedId<E>, entity: &E) -> Result<bool, Error> {
        self.check_available()?;

        let found = {
            let mut rows = self.rows();
            match rows
                .iter_mut()
                .find(|row| row.entity.id().stored() == Some(id))
            {
                Some(row) => {
                    row.entity = entity.clone().with_id(RecordId::Stored(id));
                    row.updated_at = Utc::now();
                    true
                }
                None => false,
            }
        };

        if found {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.notify(ChangeKind::Update);
        }

        Ok(found)
    }

    async fn delete_many(&self, ids: &[TypedId<E>]) -> Result<u64, Error> {
        self.check_available()?;

        let deleted = {
            let mut rows = self.rows();
            let before = rows.len();
            rows.retain(|row| match row.entity.id().stored() {
                Some(id) => !ids.contains(&id),
                None => true,
            });
            (before - rows.len()) as u64
        };

        self.deletes.fetch_add(deleted as usize, Ordering::SeqCst);
        for _ in 0..deleted {
            self.notify(ChangeKind::Delete);
        }

        Ok(deleted)
    }

    async fn subscribe(&self) -> Result<ChangeFeed, Error> {
        self.check_available()?;

        let receiver = self.changes.subscribe();
        let feed = stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                Ok(event) => Some((Ok(event), receiver)),
                // a lagging subscriber only needs to know something changed
                Err(RecvError::Lagged(_)) => {
                    let event = ChangeEvent {
                        table: E::TABLE,
                        kind: ChangeKind::Other,
                    };
                    Some((Ok(event), receiver))
                }
                Err(RecvError::Closed) => None,
            }
        });

        Ok(feed.boxed())
    }
}

#[derive(Debug, Default)]
pub struct MemoryDatabase {
    pub campaigns: MemoryStore<MarketingCampaign>,
    pub team_members: MemoryStore<TeamMember>,
    pub testimonials: MemoryStore<Testimonial>,
    pub videos: MemoryStore<Video>,
}

impl MemoryDatabase {
    pub fn new() -> MemoryDatabase {
        MemoryDatabase::default()
    }

    pub fn set_unavailable(&self, table: Table, unavailable: bool) {
        match table {
            Table::MarketingCampaigns => self.campaigns.set_unavailable(unavailable),
            Table::TeamMembers => self.team_members.set_unavailable(unavailable),
            Table::Testimonials => self.testimonials.set_unavailable(unavailable),
            Table::Videos => self.videos.set_unavailable(unavailable),
        }
    }

    pub fn write_counts(&self) -> WriteCounts {
        let counts = [
            self.campaigns.write_counts(),
            self.team_members.write_counts(),
            self.testimonials.write_counts(),
            self.videos.write_counts(),
        ];

        counts.iter().fold(WriteCounts::default(), |acc, c| WriteCounts {
            inserts: acc.inserts + c.inserts,
            updates: acc.updates + c.updates,
            deletes: acc.deletes + c.deletes,
        })
    }
}

#[async_trait]
impl Database for MemoryDatabase {
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

    async fn ping(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(title: &str) -> Video {
        Video {
            id: RecordId::draft(),
            title: title.to_string(),
            url: "https://youtube.com/x".to_string(),
        }
    }

    #[tokio::test]
    async fn rows_come_back_in_insertion_order_with_permanent_ids() {
        let store = MemoryStore::<Video>::new();
        store.insert(&video("First")).await.unwrap();
        store.insert(&video("Second")).await.unwrap();

        let rows = store.fetch_all().await.unwrap();
        let titles: Vec<_> = rows.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert!(rows.iter().all(|v| !v.id.is_draft()));
    }

    #[tokio::test]
    async fn unavailable_store_rejects_every_call() {
        let store = MemoryStore::<Video>::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.fetch_all().await,
            Err(Error::RemoteUnavailable {
                table: Table::Videos,
                ..
            })
        ));
        assert!(store.insert(&video("Promo")).await.is_err());
        assert_eq!(store.write_counts(), WriteCounts::default());
    }

    #[tokio::test]
    async fn writes_are_announced_on_the_change_feed() {
        let store = MemoryStore::<Video>::new();
        let mut feed = store.subscribe().await.unwrap();

        let inserted = store.insert(&video("Promo")).await.unwrap();
        let id = inserted.id.stored().unwrap();
        store.delete_many(&[id]).await.unwrap();

        let first = feed.next().await.unwrap().unwrap();
        let second = feed.next().await.unwrap().unwrap();
        assert_eq!(first.kind, ChangeKind::Insert);
        assert_eq!(second.kind, ChangeKind::Delete);
        assert_eq!(second.table, Table::Videos);
    }

    #[tokio::test]
    async fn update_refreshes_the_modification_time() {
        let store = MemoryStore::<Video>::new();
        let inserted = store.insert(&video("Promo")).await.unwrap();
        let id = inserted.id.stored().unwrap();
        let before = store.last_updated_at(id).unwrap();

        let mut edited = inserted.clone();
        edited.title = "Promo 2".to_string();
        assert!(store.update(id, &edited).await.unwrap());

        assert!(store.last_updated_at(id).unwrap() >= before);
        assert_eq!(store.fetch_all().await.unwrap()[0].title, "Promo 2");
        assert!(!store.update(TypedId::new(), &edited).await.unwrap());
    }

    #[tokio::test]
    async fn only_matched_rows_count_as_writes() {
        let store = MemoryStore::<Video>::new();
        let inserted = store.insert(&video("Promo")).await.unwrap();
        let id = inserted.id.stored().unwrap();

        assert!(!store.update(TypedId::new(), &inserted).await.unwrap());
        assert_eq!(store.delete_many(&[TypedId::new(), id]).await.unwrap(), 1);

        assert_eq!(
            store.write_counts(),
            WriteCounts {
                inserts: 1,
                updates: 0,
                deletes: 1,
            }
        );
    }
}
