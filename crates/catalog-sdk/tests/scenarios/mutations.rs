//! Mutation Tests
//!
//! Verifies optimistic rendering, reconciliation outcomes and the event
//! stream as seen through the client.

use anyhow::Result;
use catalog_sdk::{
    CatalogEvent, Client, Config, DispatchOutcome, Error, GroupId, GroupSelector, ItemId,
    MutationAction, Row,
};
use catalog_testing::assertions::{assert_partition_exclusive, assert_unassigned_complete};
use catalog_testing::fixtures;
use futures::stream::StreamExt;
use std::sync::{Arc, Mutex};

fn ids(raw: impl IntoIterator<Item = u64>) -> Vec<ItemId> {
    raw.into_iter().map(ItemId::new).collect()
}

fn move_items(from: u64, to: u64, raw: impl IntoIterator<Item = u64>) -> MutationAction {
    MutationAction::MoveItems {
        from_group_id: GroupId::new(from),
        to_group_id: GroupId::new(to),
        item_ids: ids(raw),
    }
}

fn unassigned_ids(rows: &[Row]) -> Vec<ItemId> {
    rows.iter()
        .filter(|row| row.group() == GroupSelector::Unassigned)
        .filter_map(Row::item_id)
        .collect()
}

#[tokio::test]
async fn test_move_notifies_listeners_once() -> Result<()> {
    let world = fixtures::bebidas();
    let mut client = Client::connect(world.memory_store(), Config::default()).await?;

    let seen: Arc<Mutex<Vec<Vec<ItemId>>>> = Arc::default();
    let sink = Arc::clone(&seen);
    client.on_visible_items_changed(move |ids| sink.lock().unwrap().push(ids.to_vec()));

    let outcome = client.dispatch(move_items(1, 2, [10])).await?;
    assert!(outcome.committed());

    // Optimistic render announces the new order; the confirmed refetch matches it.
    assert_eq!(*seen.lock().unwrap(), vec![ids([11, 10, 12])]);
    assert_eq!(unassigned_ids(client.rows()), ids([12]));

    let sources = client.runtime().sources();
    assert_partition_exclusive(&sources.groups)?;
    assert_unassigned_complete(&sources)?;
    Ok(())
}

#[tokio::test]
async fn test_bulk_partial_failure_shows_confirmed_split() -> Result<()> {
    let world = fixtures::bulk(600);
    let store = world.flaky_store();
    let mut client = Client::connect(Arc::clone(&store), Config::default()).await?;
    let mut events = client.subscribe();

    store.fail_mutation(2);
    let outcome = client.dispatch(move_items(1, 2, 1..=600)).await?;

    let DispatchOutcome::Partial {
        succeeded_count,
        failed_ids,
        refetched,
    } = outcome
    else {
        anyhow::bail!("expected a partial outcome, got {:?}", outcome);
    };
    assert_eq!(succeeded_count, 250);
    assert_eq!(failed_ids, ids(251..=600));
    assert!(refetched);

    assert_eq!(
        client.rows()[0],
        Row::Header {
            group: GroupSelector::Explicit(GroupId::new(2)),
            group_label: "Destino".to_string(),
            count: 250,
        }
    );
    let events = events.drain();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, CatalogEvent::MutationPartial { .. }))
    );
    assert!(
        events
            .iter()
            .any(|event| matches!(event, CatalogEvent::VisibleItemsChanged { .. }))
    );
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_restores_rows() -> Result<()> {
    let world = fixtures::bebidas();
    let store = world.flaky_store();
    let mut client = Client::connect(Arc::clone(&store), Config::default()).await?;
    let before = client.rows().to_vec();

    store.fail_mutation(1);
    let outcome = client.dispatch(move_items(1, 2, [10, 11])).await?;

    assert!(matches!(
        outcome,
        DispatchOutcome::RolledBack { retryable: true, .. }
    ));
    assert_eq!(client.rows(), before.as_slice());
    Ok(())
}

#[tokio::test]
async fn test_exclusion_operations() -> Result<()> {
    let world = fixtures::bebidas();
    let mut client = Client::connect(world.memory_store(), Config::default()).await?;

    assert!(client.exclude(ids([12])).await?.committed());
    assert!(unassigned_ids(client.rows()).is_empty());

    assert!(client.include(ids([12])).await?.committed());
    assert_eq!(unassigned_ids(client.rows()), ids([12]));

    assert!(client.unassign(ids([10])).await?.committed());
    assert_eq!(unassigned_ids(client.rows()), ids([10, 12]));
    Ok(())
}

#[tokio::test]
async fn test_create_group_with_items() -> Result<()> {
    let world = fixtures::bebidas();
    let mut client = Client::connect(world.memory_store(), Config::default()).await?;

    let outcome = client
        .dispatch(MutationAction::CreateGroup {
            id: GroupId::new(3),
            name: "Almacén".to_string(),
            item_ids: ids([11, 12]),
        })
        .await?;
    assert!(outcome.committed());

    let headers: Vec<(String, usize)> = client
        .rows()
        .iter()
        .filter_map(|row| match row {
            Row::Header {
                group_label, count, ..
            } => Some((group_label.clone(), *count)),
            Row::Item { .. } => None,
        })
        .collect();
    assert_eq!(
        headers,
        vec![
            ("Almacén".to_string(), 2),
            ("Bebidas".to_string(), 1),
            ("Snacks".to_string(), 0),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_validation_error_leaves_rows_untouched() -> Result<()> {
    let world = fixtures::bebidas();
    let mut client = Client::connect(world.memory_store(), Config::default()).await?;
    let before = client.rows().to_vec();

    let err = client
        .dispatch(MutationAction::AppendItems {
            group_id: GroupId::new(2),
            item_ids: Vec::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Runtime(catalog_runtime::Error::Validation(
            catalog_runtime::ValidationError::EmptySelection
        ))
    ));
    assert_eq!(client.rows(), before.as_slice());
    Ok(())
}

#[tokio::test]
async fn test_event_stream_starts_with_optimistic_snapshot() -> Result<()> {
    let world = fixtures::bebidas();
    let mut client = Client::connect(world.memory_store(), Config::default()).await?;
    let mut events = client.subscribe();

    client.dispatch(move_items(1, 2, [11])).await?;

    let first = events.next().await;
    assert!(matches!(
        first,
        Some(CatalogEvent::GroupsReplaced { revision }) if !revision.is_confirmed()
    ));
    assert!(
        events
            .drain()
            .iter()
            .any(|event| matches!(event, CatalogEvent::MutationCommitted { .. }))
    );
    Ok(())
}
