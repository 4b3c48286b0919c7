use super::*;
use std::collections::HashSet;

fn pair(catalog_id: &str, row: u32, title: &str) -> ReconciledPair {
    ReconciledPair {
        catalog_id: catalog_id.to_string(),
        watchlist_row: row,
        watchlist_title: title.to_string(),
        added_date: NaiveDate::from_ymd_opt(2020, 4, 26),
    }
}

async fn seeded_store() -> SqliteStore {
    let store = SqliteStore::in_memory().await.unwrap();
    let entries = vec![
        CatalogEntry::new("m1", "Lady Bird", 2017).with_rating(7.4).with_poster(b"bird".to_vec()),
        CatalogEntry::new("m2", "Columbus", 2017),
        CatalogEntry::new("m3", "Stalker", 1979),
    ];
    store.upsert_all(&entries).await.unwrap();
    store
}

#[tokio::test]
async fn test_upsert_and_get_by_id() {
    let store = seeded_store().await;

    let entry = store.get_by_id("m1").await.unwrap();
    assert_eq!(entry.title, "Lady Bird");
    assert_eq!(entry.release_year, 2017);
    assert_eq!(entry.community_rating, Some(7.4));
    assert_eq!(entry.poster_image.as_deref(), Some(&b"bird"[..]));

    let without_poster = store.get_by_id("m2").await.unwrap();
    assert!(without_poster.poster_image.is_none());
    assert!(without_poster.community_rating.is_none());

    assert_eq!(CatalogStore::count(&store).await.unwrap(), 3);
    assert_eq!(store.ids().await.unwrap(), vec!["m1", "m2", "m3"]);
}

#[tokio::test]
async fn test_get_by_id_missing() {
    let store = seeded_store().await;
    let err = store.get_by_id("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_upsert_conflict_is_a_no_op_but_adds_poster() {
    let store = seeded_store().await;

    let again = vec![
        CatalogEntry::new("m1", "Renamed", 1999).with_poster(b"other".to_vec()),
        CatalogEntry::new("m2", "Columbus", 2017).with_poster(b"columbus".to_vec()),
    ];
    store.upsert_all(&again).await.unwrap();

    let m1 = store.get_by_id("m1").await.unwrap();
    assert_eq!(m1.title, "Lady Bird");
    assert_eq!(m1.poster_image.as_deref(), Some(&b"bird"[..]));

    let m2 = store.get_by_id("m2").await.unwrap();
    assert_eq!(m2.poster_image.as_deref(), Some(&b"columbus"[..]));
    assert_eq!(CatalogStore::count(&store).await.unwrap(), 3);
}

#[tokio::test]
async fn test_catalog_random_sample_bounds() {
    let store = seeded_store().await;

    let two = CatalogStore::random_sample(&store, 2).await.unwrap();
    assert_eq!(two.len(), 2);
    assert!(two.iter().all(|e| e.poster_image.is_none()));

    let all = CatalogStore::random_sample(&store, 10).await.unwrap();
    let ids: HashSet<_> = all.iter().map(|e| e.external_id.clone()).collect();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_pairs_insert_and_sample() {
    let store = seeded_store().await;
    let pairs = vec![pair("m1", 1, "Lady Bird"), pair("m1", 4, "Lady Bird"), pair("m2", 2, "Columbus")];
    store.insert_all(&pairs).await.unwrap();
    // Writing the same set again leaves it as it was
    store.insert_all(&pairs).await.unwrap();

    let sample = PairingStore::random_sample(&store, 10).await.unwrap();
    assert_eq!(sample.len(), 3);
    assert_eq!(sample.iter().filter(|p| p.catalog_id == "m1").count(), 2);
    assert!(sample.iter().all(|p| p.added_date == NaiveDate::from_ymd_opt(2020, 4, 26)));

    assert_eq!(store.distinct_catalog_count().await.unwrap(), 2);

    let distinct = store.distinct_by_catalog().await.unwrap();
    assert_eq!(distinct.len(), 2);
    assert_eq!(distinct[0].catalog_id, "m1");
    assert_eq!(distinct[0].watchlist_row, 1);
    assert_eq!(distinct[1].catalog_id, "m2");
}

#[tokio::test]
async fn test_pair_insert_is_all_or_nothing() {
    let store = seeded_store().await;
    // The second pair points at an unknown movie and violates the foreign key
    let pairs = vec![pair("m1", 1, "Lady Bird"), pair("missing", 2, "Ghost")];
    assert!(store.insert_all(&pairs).await.is_err());

    assert_eq!(store.distinct_catalog_count().await.unwrap(), 0);
    assert!(PairingStore::random_sample(&store, 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_pair_insert_replaces_previous_set() {
    let store = seeded_store().await;
    store
        .insert_all(&[pair("m1", 1, "Lady Bird"), pair("m2", 2, "Columbus")])
        .await
        .unwrap();

    // The watchlist dropped Lady Bird and Stalker took row 1
    store.insert_all(&[pair("m3", 1, "Stalker"), pair("m2", 2, "Columbus")]).await.unwrap();

    let ids: HashSet<_> = PairingStore::random_sample(&store, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|p| (p.catalog_id, p.watchlist_row))
        .collect();
    assert_eq!(ids, HashSet::from([("m3".to_string(), 1), ("m2".to_string(), 2)]));

    store.insert_all(&[]).await.unwrap();
    assert_eq!(store.distinct_catalog_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_failed_replace_keeps_previous_set() {
    let store = seeded_store().await;
    store.insert_all(&[pair("m1", 1, "Lady Bird")]).await.unwrap();

    let pairs = vec![pair("m2", 1, "Columbus"), pair("missing", 2, "Ghost")];
    assert!(store.insert_all(&pairs).await.is_err());

    let sample = PairingStore::random_sample(&store, 10).await.unwrap();
    assert_eq!(sample.len(), 1);
    assert_eq!(sample[0].catalog_id, "m1");
}

#[tokio::test]
async fn test_clear() {
    let store = seeded_store().await;
    store.insert_all(&[pair("m3", 1, "Stalker")]).await.unwrap();

    PairingStore::clear(&store).await.unwrap();
    assert_eq!(store.distinct_catalog_count().await.unwrap(), 0);
    assert_eq!(CatalogStore::count(&store).await.unwrap(), 3);

    store.insert_all(&[pair("m3", 1, "Stalker")]).await.unwrap();
    CatalogStore::clear(&store).await.unwrap();
    assert_eq!(CatalogStore::count(&store).await.unwrap(), 0);
    assert_eq!(store.distinct_catalog_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_file_database_persists() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("data").join("reelpick.db");

    {
        let store = SqliteStore::connect(&path, 2).await.unwrap();
        store.upsert_all(&[CatalogEntry::new("m1", "Heat", 1995)]).await.unwrap();
        store.close().await;
    }

    let reopened = SqliteStore::connect(&path, 2).await.unwrap();
    assert_eq!(reopened.list_all().await.unwrap()[0].title, "Heat");
}
