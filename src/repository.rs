use std::collections::HashSet;

use tracing::{debug, warn};

use crate::database::EntityStore;
use crate::entity::Entity;
use crate::error::Error;
use crate::typedid::{RecordId, TypedId};

/// Writes needed to turn the persisted rows into a desired list.
#[derive(Debug)]
pub struct ReconcilePlan<E: Entity> {
    pub deletes: Vec<TypedId<E>>,
    pub writes: Vec<PlannedWrite<E>>,
    pub unchanged: usize,
    pub missing: Vec<TypedId<E>>,
}

#[derive(Debug)]
pub enum PlannedWrite<E: Entity> {
    Insert(E),
    Update(TypedId<E>, E),
}

impl<E: Entity> ReconcilePlan<E> {
    pub fn inserts(&self) -> usize {
        self.writes
            .iter()
            .filter(|write| matches!(write, PlannedWrite::Insert(_)))
            .count()
    }

    pub fn updates(&self) -> usize {
        self.writes.len() - self.inserts()
    }

    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.writes.is_empty()
    }
}

#[derive(Debug)]
pub struct ReconcileReport<E: Entity> {
    pub inserted: Vec<E>,
    pub updated: usize,
    pub deleted: u64,
    pub unchanged: usize,
    pub missing: Vec<TypedId<E>>,
}

/// Computes the set difference between `persisted` and `desired`.
///
/// Rows absent from `desired` are deleted, drafts are inserted and stored
/// records are updated only when their content differs. Stored ids that no
/// longer exist are reported as missing rather than written, and repeated ids
/// in `desired` keep their first occurrence.
pub fn plan<E: Entity>(persisted: &[E], desired: Vec<E>) -> ReconcilePlan<E> {
    let desired_ids: HashSet<TypedId<E>> = desired.iter().filter_map(|e| e.id().stored()).collect();

    let deletes = persisted
        .iter()
        .filter_map(|e| e.id().stored())
        .filter(|id| !desired_ids.contains(id))
        .collect();

    let mut seen: HashSet<RecordId<E>> = HashSet::new();
    let mut writes = vec![];
    let mut unchanged = 0;
    let mut missing = vec![];

    for entity in desired {
        if !seen.insert(entity.id().clone()) {
            warn!(table = %E::TABLE, id = %entity.id(), "skipping repeated id");
            continue;
        }

        match entity.id().stored() {
            None => writes.push(PlannedWrite::Insert(entity)),
            Some(id) => match persisted.iter().find(|p| p.id().stored() == Some(id)) {
                Some(current) if current.same_content(&entity) => unchanged += 1,
                Some(_) => writes.push(PlannedWrite::Update(id, entity)),
                None => missing.push(id),
            },
        }
    }

    ReconcilePlan {
        deletes,
        writes,
        unchanged,
        missing,
    }
}

#[tracing::instrument(skip(store), fields(table = %E::TABLE))]
pub async fn list<E: Entity>(store: &dyn EntityStore<E>) -> Result<Vec<E>, Error> {
    let entities = store.fetch_all().await?;

    Ok(entities)
}

/// Replaces the table's contents with `desired`. Not transactional: a failed
/// write leaves the writes before it in place.
#[tracing::instrument(skip(store, desired), fields(table = %E::TABLE, desired = desired.len()))]
pub async fn reconcile<E: Entity>(
    store: &dyn EntityStore<E>,
    desired: Vec<E>,
) -> Result<ReconcileReport<E>, Error> {
    let persisted = store.fetch_all().await?;
    let plan = plan(&persisted, desired);

    debug!(
        deletes = plan.deletes.len(),
        inserts = plan.inserts(),
        updates = plan.updates(),
        unchanged = plan.unchanged,
        "reconciling"
    );

    for id in &plan.missing {
        warn!(%id, "record no longer exists, skipping its update");
    }

    let mut report = ReconcileReport {
        inserted: vec![],
        updated: 0,
        deleted: 0,
        unchanged: plan.unchanged,
        missing: plan.missing,
    };

    if !plan.deletes.is_empty() {
        report.deleted = store.delete_many(&plan.deletes).await?;
    }

    for write in plan.writes {
        match write {
            PlannedWrite::Insert(entity) => {
                let inserted = store.insert(&entity).await?;
                report.inserted.push(inserted);
            }
            PlannedWrite::Update(id, entity) => {
                if store.update(id, &entity).await? {
                    report.updated += 1;
                } else {
                    warn!(%id, "record disappeared before its update");
                    report.missing.push(id);
                }
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::video::Video;

    fn draft(title: &str) -> Video {
        Video {
            id: RecordId::draft(),
            title: title.to_string(),
            url: format!("https://youtube.com/{}", title.to_lowercase()),
        }
    }

    async fn seeded(titles: &[&str]) -> MemoryStore<Video> {
        let store = MemoryStore::new();
        for title in titles {
            store.insert(&draft(title)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn reconciling_the_current_state_writes_nothing() {
        let store = seeded(&["Promo", "Launch"]).await;
        let current = list::<Video>(&store).await.unwrap();
        let before = store.write_counts();

        let report = reconcile::<Video>(&store, current.clone()).await.unwrap();

        assert_eq!(store.write_counts(), before);
        assert!(report.inserted.is_empty());
        assert_eq!(report.updated, 0);
        assert_eq!(report.deleted, 0);
        assert_eq!(report.unchanged, 2);
        assert_eq!(list::<Video>(&store).await.unwrap(), current);
    }

    #[tokio::test]
    async fn drafts_are_inserted_with_permanent_ids() {
        let store = seeded(&["Promo"]).await;
        let mut desired = list::<Video>(&store).await.unwrap();
        desired.push(draft("Launch"));

        let report = reconcile::<Video>(&store, desired).await.unwrap();

        assert_eq!(report.inserted.len(), 1);
        assert!(!report.inserted[0].id.is_draft());
        let titles: Vec<_> = list::<Video>(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.title)
            .collect();
        assert_eq!(titles, vec!["Promo".to_string(), "Launch".to_string()]);
    }

    #[tokio::test]
    async fn removed_ids_are_deleted_and_changed_ones_updated() {
        let store = seeded(&["Promo", "Launch", "Recap"]).await;
        let current = list::<Video>(&store).await.unwrap();

        let mut edited = current[0].clone();
        edited.title = "Promo 2".to_string();
        let desired = vec![edited, current[2].clone()];

        let report = reconcile::<Video>(&store, desired).await.unwrap();

        assert_eq!(report.deleted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);
        let after = list::<Video>(&store).await.unwrap();
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].title, "Promo 2");
        assert_eq!(after[0].url, current[0].url);
        assert!(!after.iter().any(|v| v.id == current[1].id));
    }

    #[tokio::test]
    async fn stale_ids_are_reported_instead_of_written() {
        let store = seeded(&["Promo"]).await;
        let mut stale = draft("Gone");
        stale.id = RecordId::Stored(TypedId::new());

        let report = reconcile::<Video>(&store, vec![stale.clone()]).await.unwrap();

        assert_eq!(report.missing, vec![stale.id.stored().unwrap()]);
        assert_eq!(report.deleted, 1);
        assert!(list::<Video>(&store).await.unwrap().is_empty());
    }

    #[test]
    fn repeated_ids_keep_their_first_occurrence() {
        let first = draft("Promo");
        let mut repeat = draft("Other");
        repeat.id = first.id.clone();

        let plan = plan(&[], vec![first, repeat]);

        assert_eq!(plan.inserts(), 1);
        assert_eq!(plan.updates(), 0);
    }

    #[tokio::test]
    async fn failures_surface_as_errors() {
        let store = seeded(&["Promo"]).await;
        store.set_unavailable(true);

        assert!(list::<Video>(&store).await.is_err());
        assert!(reconcile::<Video>(&store, vec![draft("Launch")]).await.is_err());
    }
}
