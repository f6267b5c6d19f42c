use anyhow::Result;
use catalog_runtime::{
    CatalogEvent, Config, DispatchOutcome, Error, Operation, StoreError, ValidationError, execute,
};
use catalog_testing::assertions::{
    assert_members, assert_partition_exclusive, assert_unassigned_complete,
};
use catalog_testing::fixtures;
use catalog_types::{GroupId, GroupSelector, ItemId, MutationAction};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

fn ids(raw: impl IntoIterator<Item = u64>) -> Vec<ItemId> {
    raw.into_iter().map(ItemId::new).collect()
}

fn move_items(from: u64, to: u64, raw: impl IntoIterator<Item = u64>) -> Operation {
    Operation::from(MutationAction::MoveItems {
        from_group_id: GroupId::new(from),
        to_group_id: GroupId::new(to),
        item_ids: ids(raw),
    })
}

fn drain(rx: &mut UnboundedReceiver<CatalogEvent>) -> Vec<CatalogEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_bebidas_move_is_committed_and_refetched() -> Result<()> {
    let world = fixtures::bebidas();
    let store = world.memory_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;
    let mut events = runtime.subscribe();

    let outcome = runtime.dispatch(move_items(1, 2, [10])).await?;
    assert!(outcome.committed());

    let current = runtime.state().current();
    assert!(current.revision.is_confirmed());
    assert_members(current, 1, &[11])?;
    assert_members(current, 2, &[10])?;
    assert_partition_exclusive(current)?;

    let sources = runtime.sources();
    assert_unassigned_complete(&sources)?;
    assert_eq!(
        sources.inputs().membership(GroupSelector::Unassigned).ids(),
        ids([12]).as_slice()
    );

    assert_eq!(store.members(GroupId::new(2)).await, ids([10]));
    assert!(matches!(
        drain(&mut events).last(),
        Some(CatalogEvent::MutationCommitted { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_bulk_move_reports_partial_failure() -> Result<()> {
    let world = fixtures::bulk(600);
    let store = world.flaky_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;
    let mut events = runtime.subscribe();

    store.fail_mutation(2);
    let outcome = runtime.dispatch(move_items(1, 2, 1..=600)).await?;

    assert_eq!(
        outcome,
        DispatchOutcome::Partial {
            succeeded_count: 250,
            failed_ids: ids(251..=600),
            refetched: true,
        }
    );

    // The display is the refetched server truth, not the optimistic guess.
    let current = runtime.state().current();
    let destination: Vec<u64> = (1..=250).collect();
    let source: Vec<u64> = (251..=600).collect();
    assert_members(current, 2, &destination)?;
    assert_members(current, 1, &source)?;
    assert_partition_exclusive(current)?;

    assert_eq!(store.inner().calls().await, vec!["move_items(1, 2, 250)"]);
    assert!(drain(&mut events).iter().any(|event| matches!(
        event,
        CatalogEvent::MutationPartial { succeeded_count: 250, failed_ids, .. } if failed_ids.len() == 350
    )));
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_rolls_back() -> Result<()> {
    let world = fixtures::bebidas();
    let store = world.flaky_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;
    let mut events = runtime.subscribe();

    store.fail_mutation(1);
    let outcome = runtime.dispatch(move_items(1, 2, [10])).await?;

    assert!(matches!(
        outcome,
        DispatchOutcome::RolledBack { retryable: true, .. }
    ));
    assert_eq!(**runtime.state().current(), **runtime.state().confirmed());
    assert_members(runtime.state().current(), 1, &[10, 11])?;
    assert!(drain(&mut events).iter().any(|event| matches!(
        event,
        CatalogEvent::MutationRolledBack { retryable: true, .. }
    )));
    Ok(())
}

#[tokio::test]
async fn test_duplicate_name_is_rejected_without_retry() -> Result<()> {
    let mut runtime = fixtures::bebidas().runtime(Config::default()).await?;

    let outcome = runtime
        .dispatch(Operation::from(MutationAction::CreateGroup {
            id: GroupId::new(3),
            name: " BEBIDAS ".to_string(),
            item_ids: ids([12]),
        }))
        .await?;

    assert!(matches!(
        outcome,
        DispatchOutcome::RolledBack {
            retryable: false,
            ..
        }
    ));
    assert!(runtime.state().current().find(GroupId::new(3)).is_none());
    Ok(())
}

#[tokio::test]
async fn test_failed_refetch_keeps_partial_counts() -> Result<()> {
    let world = fixtures::bulk(600);
    let store = world.flaky_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;
    let mut events = runtime.subscribe();

    let pending = runtime.begin(move_items(1, 2, 1..=600))?;
    store.fail_mutation(2);
    let report = execute(store.as_ref(), &pending.plan, 250).await;
    store.set_offline(true);
    let outcome = runtime.finish(&pending, report).await;

    assert_eq!(
        outcome,
        DispatchOutcome::Partial {
            succeeded_count: 250,
            failed_ids: ids(251..=600),
            refetched: false,
        }
    );
    // Without server truth the display falls back to the last confirmed state.
    assert_eq!(**runtime.state().current(), **runtime.state().confirmed());

    let events = drain(&mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        CatalogEvent::MutationPartial { succeeded_count: 250, failed_ids, .. } if failed_ids.len() == 350
    )));
    assert!(
        events
            .iter()
            .any(|event| matches!(event, CatalogEvent::RefetchFailed { operation, .. } if *operation == pending.id))
    );
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, CatalogEvent::MutationRolledBack { .. }))
    );

    // Once the store is back, a refresh shows the acknowledged chunk.
    store.set_offline(false);
    assert!(runtime.refresh().await?);
    let destination: Vec<u64> = (1..=250).collect();
    assert_members(runtime.state().current(), 2, &destination)?;
    Ok(())
}

#[tokio::test]
async fn test_committed_move_survives_failed_refetch() -> Result<()> {
    let world = fixtures::bebidas();
    let store = world.flaky_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;
    let mut events = runtime.subscribe();

    let pending = runtime.begin(move_items(1, 2, [10]))?;
    let report = execute(store.as_ref(), &pending.plan, 250).await;
    store.set_offline(true);
    let outcome = runtime.finish(&pending, report).await;

    assert_eq!(outcome, DispatchOutcome::Committed);
    assert_members(runtime.state().current(), 1, &[11])?;
    assert_members(runtime.state().current(), 2, &[10])?;
    assert!(!runtime.state().current().revision.is_confirmed());

    let events = drain(&mut events);
    assert!(events.contains(&CatalogEvent::RefetchFailed {
        operation: pending.id,
        reason: "Store error: transport failure: connection reset".to_string(),
    }));
    assert!(events.contains(&CatalogEvent::MutationCommitted {
        operation: pending.id,
    }));
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, CatalogEvent::MutationRolledBack { .. }))
    );
    Ok(())
}

#[tokio::test]
async fn test_out_of_order_completions_converge() -> Result<()> {
    let world = fixtures::bebidas();
    let store = world.memory_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;

    let first = runtime.begin(move_items(1, 2, [10]))?;
    let second = runtime.begin(move_items(1, 2, [11]))?;
    assert_members(runtime.state().current(), 2, &[10, 11])?;

    let first_report = execute(store.as_ref(), &first.plan, 250).await;
    let second_report = execute(store.as_ref(), &second.plan, 250).await;

    // The later operation resolves first; the earlier one is still replayed.
    assert!(runtime.finish(&second, second_report).await.committed());
    assert_eq!(runtime.state().pending_len(), 1);
    assert!(runtime.finish(&first, first_report).await.committed());

    let current = runtime.state().current();
    assert_eq!(runtime.state().pending_len(), 0);
    assert_members(current, 1, &[])?;
    assert_members(current, 2, &[10, 11])?;
    Ok(())
}

#[tokio::test]
async fn test_completion_after_division_switch_is_stale() -> Result<()> {
    let world = fixtures::bebidas().with_division(5, "Norte", [2]);
    let store = world.memory_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;
    let mut events = runtime.subscribe();

    let pending = runtime.begin(move_items(1, 2, [10]))?;
    runtime.switch_division(Some(catalog_types::DivisionId::new(5)))?;
    // The optimistic effect belongs to the old scope.
    assert_members(runtime.state().current(), 1, &[10, 11])?;

    let report = execute(store.as_ref(), &pending.plan, 250).await;
    let outcome = runtime.finish(&pending, report).await;
    assert_eq!(outcome, DispatchOutcome::Stale);

    // Server truth is still adopted.
    assert_members(runtime.state().current(), 2, &[10])?;
    let events = drain(&mut events);
    assert!(events.contains(&CatalogEvent::ScopeChanged {
        division_id: Some(catalog_types::DivisionId::new(5)),
    }));
    assert!(events.contains(&CatalogEvent::StaleResultDiscarded {
        operation: pending.id,
    }));
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, CatalogEvent::MutationCommitted { .. }))
    );
    Ok(())
}

#[tokio::test]
async fn test_validation_errors_never_reach_the_store() -> Result<()> {
    let world = fixtures::bebidas();
    let store = world.memory_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;

    let err = runtime.dispatch(move_items(1, 99, [10])).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::UnknownGroup(id)) if id == GroupId::new(99)
    ));

    let err = runtime.dispatch(move_items(1, 2, [])).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::EmptySelection)
    ));

    assert!(store.calls().await.is_empty());
    assert_eq!(runtime.state().pending_len(), 0);
    Ok(())
}

#[tokio::test]
async fn test_exclude_and_unassign_round_trip() -> Result<()> {
    let world = fixtures::bebidas();
    let store = world.memory_store();
    let mut runtime = world.runtime_on(Arc::clone(&store), Config::default()).await?;

    let outcome = runtime
        .dispatch(Operation::Exclude { item_ids: ids([12]) })
        .await?;
    assert!(outcome.committed());
    assert!(
        runtime
            .sources()
            .inputs()
            .membership(GroupSelector::Unassigned)
            .is_empty()
    );

    let outcome = runtime
        .dispatch(move_items(1, catalog_testing::world::UNASSIGNED_BACKING, [10, 12]))
        .await?;
    assert!(outcome.committed());

    let sources = runtime.sources();
    assert_unassigned_complete(&sources)?;
    assert_eq!(
        sources.inputs().membership(GroupSelector::Unassigned).ids(),
        ids([10, 12]).as_slice()
    );
    assert_members(&sources.groups, 1, &[11])?;
    assert_eq!(
        store.calls().await,
        vec![
            "add_exclusions(9000, 1)",
            "remove_items(1, 1)",
            "remove_exclusions(9000, 2)",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_division_is_invalid() -> Result<()> {
    let mut runtime = fixtures::bebidas().runtime(Config::default()).await?;
    let err = runtime
        .switch_division(Some(catalog_types::DivisionId::new(42)))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
    assert!(runtime.scope().is_main());
    Ok(())
}

#[tokio::test]
async fn test_offline_connect_fails_with_store_error() {
    let world = fixtures::bebidas();
    let store = world.flaky_store();
    store.set_offline(true);
    let err = world
        .runtime_on(store, Config::default())
        .await
        .err()
        .map(|err| err.downcast::<Error>());
    assert!(matches!(
        err,
        Some(Ok(Error::Store(StoreError::Transport(_))))
    ));
}
