use std::collections::HashSet;

use crate::entity::Entity;
use crate::error::Error;
use crate::repository;
use crate::sync::SyncContext;
use crate::typedid::{RecordId, TypedId};
use crate::violations::{Violation, Violations};

#[tracing::instrument(skip(context), fields(table = %E::TABLE))]
pub async fn get_all<E: Entity>(context: &SyncContext) -> Vec<E> {
    context.list::<E>().await
}

/// Appends `entity` under a fresh draft id and returns it as stored.
#[tracing::instrument(skip(context), fields(table = %E::TABLE))]
pub async fn add<E: Entity>(context: &SyncContext, entity: E) -> Result<E, Error> {
    entity.validate()?;

    let mut desired = persisted::<E>(context).await?;
    desired.push(entity.with_id(RecordId::draft()));

    let report = context.update(desired).await?;

    report
        .inserted
        .into_iter()
        .next()
        .ok_or_else(|| Error::ExistentialState("the added record was not inserted".into()))
}

#[tracing::instrument(skip(context), fields(table = %E::TABLE))]
pub async fn edit<E: Entity>(context: &SyncContext, id: TypedId<E>, entity: E) -> Result<E, Error> {
    entity.validate()?;

    let mut desired = persisted::<E>(context).await?;
    let position = find(&desired, id)?;
    let edited = entity.with_id(RecordId::Stored(id));
    desired[position] = edited.clone();

    let report = context.update(desired).await?;
    if report.missing.contains(&id) {
        return Err(not_found::<E>(id));
    }

    Ok(edited)
}

/// Deleting requires the admin's explicit confirmation.
#[tracing::instrument(skip(context), fields(table = %E::TABLE))]
pub async fn remove<E: Entity>(
    context: &SyncContext,
    id: TypedId<E>,
    confirm: bool,
) -> Result<(), Error> {
    if !confirm {
        return Err(Error::DeleteNotConfirmed {
            table: E::TABLE,
            id: id.to_string(),
        });
    }

    let mut desired = persisted::<E>(context).await?;
    let position = find(&desired, id)?;
    desired.remove(position);

    context.update(desired).await?;

    Ok(())
}

/// Saves a whole edited list at once. Every entry is validated and ids must
/// not repeat; nothing is written if any check fails.
#[tracing::instrument(skip(context, desired), fields(table = %E::TABLE, desired = desired.len()))]
pub async fn replace_all<E: Entity>(
    context: &SyncContext,
    desired: Vec<E>,
) -> Result<Vec<E>, Error> {
    let mut violations = Violations::new();
    let mut seen = HashSet::new();

    for entity in &desired {
        match entity.validate() {
            Ok(()) => {}
            Err(Error::ValidationFailed { violations: found }) => {
                for violation in found {
                    violations.push(violation);
                }
            }
            Err(err) => return Err(err),
        }

        if !seen.insert(entity.id().clone()) {
            violations.push(Violation::DuplicateId {
                id: entity.id().to_string(),
            });
        }
    }

    violations.into_result()?;

    context.update(desired).await?;

    Ok(context.list::<E>().await)
}

/// Single-record changes start from the store's rows rather than the local
/// copy, which may be stale or missing a table that failed to load.
async fn persisted<E: Entity>(context: &SyncContext) -> Result<Vec<E>, Error> {
    repository::list(E::store(context.database())).await
}

fn find<E: Entity>(entities: &[E], id: TypedId<E>) -> Result<usize, Error> {
    entities
        .iter()
        .position(|entity| entity.id().stored() == Some(id))
        .ok_or_else(|| not_found::<E>(id))
}

fn not_found<E: Entity>(id: TypedId<E>) -> Error {
    Error::RecordNotFound {
        table: E::TABLE,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::database::memory::MemoryDatabase;
    use crate::database::{Database, EntityStore, Table};
    use crate::notice::Notices;
    use crate::team::TeamMember;
    use crate::testimonial::Testimonial;
    use crate::video::Video;

    fn setup() -> (Arc<MemoryDatabase>, SyncContext) {
        let db = Arc::new(MemoryDatabase::new());
        let context = SyncContext::new(
            Arc::clone(&db) as Arc<dyn Database>,
            Arc::new(Notices::new()),
        );
        (db, context)
    }

    fn video(title: &str, url: &str) -> Video {
        Video {
            id: RecordId::draft(),
            title: title.to_string(),
            url: url.to_string(),
        }
    }

    #[tokio::test]
    async fn video_can_be_added_edited_and_removed() {
        let (_db, context) = setup();

        let added = add(&context, video("Promo", "https://youtube.com/x"))
            .await
            .unwrap();
        let id = added.id.stored().unwrap();
        assert_eq!(get_all::<Video>(&context).await, vec![added.clone()]);

        let mut changed = added.clone();
        changed.title = "Promo 2".to_string();
        edit(&context, id, changed).await.unwrap();
        let videos = get_all::<Video>(&context).await;
        assert_eq!(videos[0].title, "Promo 2");
        assert_eq!(videos[0].url, "https://youtube.com/x");

        remove::<Video>(&context, id, true).await.unwrap();
        assert!(get_all::<Video>(&context).await.is_empty());
    }

    #[tokio::test]
    async fn adding_keeps_rows_the_local_copy_never_loaded() {
        let (db, context) = setup();
        db.videos
            .insert(&video("Existing A", "https://youtube.com/a"))
            .await
            .unwrap();
        db.videos
            .insert(&video("Existing B", "https://youtube.com/b"))
            .await
            .unwrap();
        db.set_unavailable(Table::Videos, true);
        context.load_all().await;
        db.set_unavailable(Table::Videos, false);
        assert!(get_all::<Video>(&context).await.is_empty());

        add(&context, video("New", "https://youtube.com/new"))
            .await
            .unwrap();

        let stored = db.videos.fetch_all().await.unwrap();
        let titles: Vec<_> = stored.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["Existing A", "Existing B", "New"]);
        assert_eq!(db.videos.write_counts().deletes, 0);
        assert_eq!(get_all::<Video>(&context).await, stored);
    }

    #[tokio::test]
    async fn removing_leaves_rows_added_elsewhere() {
        let (db, context) = setup();
        let added = add(&context, video("Promo", "https://youtube.com/x"))
            .await
            .unwrap();
        db.videos
            .insert(&video("Elsewhere", "https://youtube.com/e"))
            .await
            .unwrap();

        remove::<Video>(&context, added.id.stored().unwrap(), true)
            .await
            .unwrap();

        let stored = db.videos.fetch_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Elsewhere");
    }

    #[tokio::test]
    async fn malformed_urls_never_reach_the_store() {
        let (db, context) = setup();

        let result = add(&context, video("Promo", "not-a-url")).await;

        assert!(matches!(result, Err(Error::ValidationFailed { .. })));
        let result = add(
            &context,
            TeamMember {
                id: RecordId::draft(),
                image_url: "not-a-url".into(),
            },
        )
        .await;
        assert!(matches!(result, Err(Error::ValidationFailed { .. })));
        assert_eq!(db.write_counts().total(), 0);
    }

    #[tokio::test]
    async fn short_titles_are_rejected() {
        let (db, context) = setup();

        let result = add(&context, video("P", "https://youtube.com/x")).await;

        assert_eq!(
            result.unwrap_err(),
            Error::ValidationFailed {
                violations: vec![Violation::FieldTooShort {
                    field: "title".into(),
                    minimum_length: 2,
                    length: 1,
                }]
            }
        );
        assert_eq!(db.write_counts().total(), 0);
    }

    #[tokio::test]
    async fn removing_requires_confirmation() {
        let (_db, context) = setup();
        let added = add(&context, video("Promo", "https://youtube.com/x"))
            .await
            .unwrap();
        let id = added.id.stored().unwrap();

        let result = remove::<Video>(&context, id, false).await;

        assert_eq!(
            result.unwrap_err(),
            Error::DeleteNotConfirmed {
                table: Table::Videos,
                id: id.to_string(),
            }
        );
        assert_eq!(get_all::<Video>(&context).await.len(), 1);
    }

    #[tokio::test]
    async fn editing_an_unknown_record_fails() {
        let (db, context) = setup();
        let id = TypedId::new();

        let result = edit(&context, id, video("Promo", "https://youtube.com/x")).await;

        assert_eq!(
            result.unwrap_err(),
            Error::RecordNotFound {
                table: Table::Videos,
                id: id.to_string(),
            }
        );
        assert_eq!(db.write_counts().total(), 0);
    }

    #[tokio::test]
    async fn replace_all_reports_every_problem() {
        let (db, context) = setup();
        let first = Testimonial {
            id: RecordId::draft(),
            quote: "".into(),
            author: "José Pereira".into(),
            business: "JP LANCHES".into(),
            location: "Ibotirama/BA".into(),
            logo_url: "/lovable-uploads/logo.png".into(),
        };
        let repeated = first.clone();

        let result = replace_all(&context, vec![first.clone(), repeated]).await;

        let violations = match result {
            Err(Error::ValidationFailed { violations }) => violations,
            other => panic!("unexpected result: {:?}", other),
        };
        assert!(violations.contains(&Violation::FieldRequired {
            field: "quote".into()
        }));
        assert!(violations.contains(&Violation::DuplicateId {
            id: first.id.to_string()
        }));
        assert_eq!(db.write_counts().total(), 0);
    }

    #[tokio::test]
    async fn replace_all_saves_the_list_in_order() {
        let (_db, context) = setup();
        add(&context, video("Old", "https://youtube.com/old"))
            .await
            .unwrap();

        let saved = replace_all(
            &context,
            vec![
                video("Promo", "https://youtube.com/x"),
                video("Launch", "https://youtube.com/y"),
            ],
        )
        .await
        .unwrap();

        let titles: Vec<_> = saved.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["Promo", "Launch"]);
    }
}
