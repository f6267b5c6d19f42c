//! Row Listing Tests
//!
//! Verifies grouped rows across selections, division scopes and view modes.

use anyhow::Result;
use catalog_runtime::MemoryStore;
use catalog_sdk::{Client, Config, DivisionId, DivisionScope, Error, GroupId, GroupSelector, Row, ViewMode};
use catalog_testing::fixtures;
use std::sync::Arc;

async fn almacen() -> Result<Client<MemoryStore>> {
    let snapshot = fixtures::load_fixture("almacen.json")?;
    let store = Arc::new(MemoryStore::from_snapshot(snapshot));
    Ok(Client::connect(store, Config::default()).await?)
}

fn render(rows: &[Row]) -> String {
    rows.iter()
        .map(|row| match row {
            Row::Header {
                group_label, count, ..
            } => format!("[{}] {}", group_label, count),
            Row::Item { item_id, .. } => format!("  #{}", item_id),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::test]
async fn test_main_scope_lists_every_visible_group() -> Result<()> {
    let client = almacen().await?;

    // 14 is excluded and everything else active is grouped: no Unassigned section.
    insta::assert_snapshot!(render(client.rows()), @r"
    [Bebidas] 2
      #10
      #11
    [snacks] 1
      #12
    [Discontinuados] 2
      #15
      #16
    ");
    Ok(())
}

#[tokio::test]
async fn test_division_scope_shows_its_groups_and_derived_ones() -> Result<()> {
    let mut client = almacen().await?;
    client.switch_division(Some(DivisionId::new(4)))?;

    insta::assert_snapshot!(render(client.rows()), @r"
    [Depósito] 1
      #13
    [Discontinuados] 2
      #15
      #16
    ");
    Ok(())
}

#[tokio::test]
async fn test_selected_group_renders_header_and_items() -> Result<()> {
    let mut client = almacen().await?;
    client.select_group(Some(GroupSelector::Explicit(GroupId::new(1))))?;

    insta::assert_snapshot!(render(client.rows()), @r"
    [Bebidas] 2
      #10
      #11
    ");
    Ok(())
}

#[tokio::test]
async fn test_division_switch_clears_hidden_selection() -> Result<()> {
    let mut client = almacen().await?;
    client.select_group(Some(GroupSelector::Explicit(GroupId::new(1))))?;
    client.switch_division(Some(DivisionId::new(4)))?;

    assert_eq!(client.selected(), None);
    assert_eq!(client.runtime().scope().division_id, Some(DivisionId::new(4)));

    client.select_group(Some(GroupSelector::Discontinued))?;
    client.switch_division(None)?;
    assert_eq!(client.selected(), Some(GroupSelector::Discontinued));
    Ok(())
}

#[tokio::test]
async fn test_unknown_targets_are_not_found() -> Result<()> {
    let mut client = almacen().await?;

    let err = client
        .select_group(Some(GroupSelector::Explicit(GroupId::new(77))))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = client.switch_division(Some(DivisionId::new(77))).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert!(client.runtime().scope().is_main());
    Ok(())
}

#[tokio::test]
async fn test_row_query_leaves_displayed_list_alone() -> Result<()> {
    let mut client = almacen().await?;
    let displayed = client.rows().to_vec();

    let rows = client.visible_rows(Some(GroupSelector::Discontinued), &DivisionScope::main());
    insta::assert_snapshot!(render(&rows), @r"
    [Discontinuados] 2
      #15
      #16
    ");

    // An explicit group owned by a division is hidden from the main scope.
    let hidden = client.visible_rows(
        Some(GroupSelector::Explicit(GroupId::new(3))),
        &DivisionScope::main(),
    );
    assert!(hidden.is_empty());
    assert_eq!(client.rows(), displayed.as_slice());
    Ok(())
}

#[tokio::test]
async fn test_discontinued_view_mode_filters_explicit_groups() -> Result<()> {
    let mut client = almacen().await?;
    client.set_view_mode(ViewMode::Discontinued);

    insta::assert_snapshot!(render(client.rows()), @r"
    [Bebidas] 1
      #15
    [snacks] 0
    [Discontinuados] 2
      #15
      #16
    ");
    Ok(())
}

#[tokio::test]
async fn test_repeated_renders_hit_the_partition_cache() -> Result<()> {
    let mut client = almacen().await?;
    let before = client.cache_stats();

    client.visible_rows(None, &DivisionScope::main());
    let after = client.cache_stats();

    assert_eq!(after.misses, before.misses);
    assert!(after.hits > before.hits);
    Ok(())
}
