use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::campaign::MarketingCampaign;
use crate::database::{ChangeFeed, Database, Table};
use crate::entity::Entity;
use crate::error::Error;
use crate::notice::Notices;
use crate::repository::{self, ReconcileReport};
use crate::team::TeamMember;
use crate::testimonial::Testimonial;
use crate::video::Video;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    pub marketing_campaigns: Vec<MarketingCampaign>,
    pub team_members: Vec<TeamMember>,
    pub testimonials: Vec<Testimonial>,
    pub videos: Vec<Video>,
}

impl Collections {
    pub fn count(&self, table: Table) -> usize {
        match table {
            Table::MarketingCampaigns => self.marketing_campaigns.len(),
            Table::TeamMembers => self.team_members.len(),
            Table::Testimonials => self.testimonials.len(),
            Table::Videos => self.videos.len(),
        }
    }
}

/// The admin's synchronized copy of every table.
///
/// Every change goes through [`SyncContext::update`], which reconciles the
/// table and then re-fetches it, so the copy always reflects what the store
/// accepted. Change feeds from the store trigger the same re-fetch.
pub struct SyncContext {
    db: Arc<dyn Database>,
    collections: RwLock<Collections>,
    loading: AtomicBool,
    notices: Arc<Notices>,
}

impl SyncContext {
    pub fn new(db: Arc<dyn Database>, notices: Arc<Notices>) -> SyncContext {
        SyncContext {
            db,
            collections: RwLock::new(Collections::default()),
            loading: AtomicBool::new(true),
            notices,
        }
    }

    pub fn database(&self) -> &dyn Database {
        &*self.db
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Collections {
        self.collections.read().await.clone()
    }

    pub async fn list<E: Entity>(&self) -> Vec<E> {
        E::collection(&*self.collections.read().await).clone()
    }

    /// Fetches every table concurrently. Tables that fail keep their previous
    /// contents; the context is ready afterwards either way.
    #[tracing::instrument(skip(self))]
    pub async fn load_all(&self) {
        self.loading.store(true, Ordering::SeqCst);

        let (campaigns, team_members, testimonials, videos) = futures::join!(
            self.fetch::<MarketingCampaign>(),
            self.fetch::<TeamMember>(),
            self.fetch::<Testimonial>(),
            self.fetch::<Video>(),
        );

        let failed = [
            campaigns.is_err(),
            team_members.is_err(),
            testimonials.is_err(),
            videos.is_err(),
        ]
        .iter()
        .filter(|failed| **failed)
        .count();

        self.loading.store(false, Ordering::SeqCst);
        info!(failed, "loaded collections");
    }

    pub async fn refresh(&self) {
        self.load_all().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn refresh_table(&self, table: Table) -> Result<(), Error> {
        match table {
            Table::MarketingCampaigns => self.fetch::<MarketingCampaign>().await,
            Table::TeamMembers => self.fetch::<TeamMember>().await,
            Table::Testimonials => self.fetch::<Testimonial>().await,
            Table::Videos => self.fetch::<Video>().await,
        }
    }

    /// Replaces `E`'s table with `desired`, then re-fetches it whether or not
    /// the write succeeded.
    #[tracing::instrument(skip(self, desired), fields(table = %E::TABLE))]
    pub async fn update<E: Entity>(&self, desired: Vec<E>) -> Result<ReconcileReport<E>, Error> {
        let result = repository::reconcile(E::store(&*self.db), desired).await;
        let _ = self.fetch::<E>().await;

        match result {
            Ok(report) if !report.missing.is_empty() => {
                warn!(missing = report.missing.len(), "some records no longer exist");
                self.notices.error(
                    "Some changes were not saved",
                    format!(
                        "{} of the {} no longer exist",
                        report.missing.len(),
                        E::TABLE.label()
                    ),
                );
                Ok(report)
            }
            Ok(report) => {
                self.notices.success(
                    "Changes saved",
                    format!("The {} were updated", E::TABLE.label()),
                );
                Ok(report)
            }
            Err(err) => {
                error!(%err, "failed to save changes");
                self.notices.error(
                    "Could not save changes",
                    format!("The {} could not be updated", E::TABLE.label()),
                );
                Err(err)
            }
        }
    }

    /// Opens a change feed per table and spawns a task re-fetching that table
    /// on every event. Feeds that fail to open are logged and skipped.
    pub async fn listen(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = vec![];

        for &table in Table::ALL.iter() {
            match self.db.subscribe(table).await {
                Ok(feed) => {
                    let context = Arc::clone(&self);
                    handles.push(tokio::spawn(context.follow(table, feed)));
                }
                Err(err) => {
                    error!(%table, %err, "failed to open change feed");
                }
            }
        }

        handles
    }

    async fn follow(self: Arc<Self>, table: Table, mut feed: ChangeFeed) {
        while let Some(event) = feed.next().await {
            match event {
                Ok(event) => {
                    debug!(table = %event.table, kind = ?event.kind, "received change");
                    let _ = self.refresh_table(event.table).await;
                }
                Err(err) => {
                    error!(%table, %err, "change feed failed");
                    break;
                }
            }
        }

        warn!(%table, "change feed closed");
    }

    async fn fetch<E: Entity>(&self) -> Result<(), Error> {
        match repository::list(E::store(&*self.db)).await {
            Ok(entities) => {
                *E::collection_mut(&mut *self.collections.write().await) = entities;
                Ok(())
            }
            Err(err) => {
                error!(table = %E::TABLE, %err, "failed to fetch");
                self.notices.error(
                    "Could not load content",
                    format!("The {} could not be loaded", E::TABLE.label()),
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::database::memory::MemoryDatabase;
    use crate::database::EntityStore;
    use crate::notice::NoticeLevel;
    use crate::typedid::RecordId;

    fn context(db: &Arc<MemoryDatabase>) -> Arc<SyncContext> {
        let db = Arc::clone(db) as Arc<dyn Database>;
        Arc::new(SyncContext::new(db, Arc::new(Notices::new())))
    }

    fn team_member(image_url: &str) -> TeamMember {
        TeamMember {
            id: RecordId::draft(),
            image_url: image_url.to_string(),
        }
    }

    #[tokio::test]
    async fn loading_until_the_first_load_completes() {
        let db = Arc::new(MemoryDatabase::new());
        db.videos
            .insert(&Video {
                id: RecordId::draft(),
                title: "Promo".into(),
                url: "https://youtube.com/x".into(),
            })
            .await
            .unwrap();
        let context = context(&db);
        assert!(context.is_loading());

        context.load_all().await;

        assert!(!context.is_loading());
        assert_eq!(context.list::<Video>().await.len(), 1);
    }

    #[tokio::test]
    async fn a_failing_table_does_not_block_the_others() {
        let db = Arc::new(MemoryDatabase::new());
        db.team_members
            .insert(&team_member("https://i.imgur.com/a.jpeg"))
            .await
            .unwrap();
        db.set_unavailable(Table::Videos, true);
        let context = context(&db);

        context.load_all().await;

        assert!(!context.is_loading());
        assert_eq!(context.snapshot().await.count(Table::TeamMembers), 1);
        let notices = context.notices().drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn update_refetches_and_reports_success() {
        let db = Arc::new(MemoryDatabase::new());
        let context = context(&db);

        let report = context
            .update(vec![team_member("https://i.imgur.com/a.jpeg")])
            .await
            .unwrap();

        assert_eq!(report.inserted.len(), 1);
        let members = context.list::<TeamMember>().await;
        assert_eq!(members.len(), 1);
        assert!(!members[0].id.is_draft());
        assert_eq!(context.notices().drain()[0].level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn failed_update_reports_an_error_and_keeps_the_list() {
        let db = Arc::new(MemoryDatabase::new());
        let context = context(&db);
        db.set_unavailable(Table::TeamMembers, true);

        let result = context
            .update(vec![team_member("https://i.imgur.com/a.jpeg")])
            .await;

        assert!(result.is_err());
        assert!(context.list::<TeamMember>().await.is_empty());
        assert!(context
            .notices()
            .drain()
            .iter()
            .all(|notice| notice.level == NoticeLevel::Error));
    }

    #[tokio::test]
    async fn vanished_records_are_reported_as_errors() {
        let db = Arc::new(MemoryDatabase::new());
        let context = context(&db);
        let mut stale = team_member("https://i.imgur.com/a.jpeg");
        stale.id = RecordId::Stored(crate::typedid::TypedId::new());

        let report = context.update(vec![stale]).await.unwrap();

        assert_eq!(report.missing.len(), 1);
        let notices = context.notices().drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn listeners_pick_up_changes_from_another_context() {
        let db = Arc::new(MemoryDatabase::new());
        let first = context(&db);
        let second = context(&db);
        second.load_all().await;
        let handles = Arc::clone(&second).listen().await;
        assert_eq!(handles.len(), 4);

        first
            .update(vec![team_member("https://i.imgur.com/a.jpeg")])
            .await
            .unwrap();

        let mut members = vec![];
        for _ in 0..100 {
            members = second.list::<TeamMember>().await;
            if !members.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].image_url, "https://i.imgur.com/a.jpeg");

        for handle in handles {
            handle.abort();
        }
    }
}
