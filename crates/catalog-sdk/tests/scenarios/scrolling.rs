//! Scrolling Tests
//!
//! Verifies the windowed slice over large catalogs and scroll-to-item.

use anyhow::Result;
use catalog_runtime::MemoryStore;
use catalog_sdk::{CatalogEvent, Client, Config, Error, GroupId, GroupSelector, ItemId};
use catalog_testing::{CatalogWorld, fixtures};

async fn ungrouped(count: u64) -> Result<Client<MemoryStore>> {
    let world = fixtures::ungrouped(count);
    Ok(Client::connect(world.memory_store(), Config::default()).await?)
}

#[tokio::test]
async fn test_ten_thousand_rows_scrolled_to_4800() -> Result<()> {
    // One Unassigned header plus 9999 item rows.
    let mut client = ungrouped(9999).await?;
    assert_eq!(client.rows().len(), 10_000);

    client.scroll(4800);

    let range = client.list().range().expect("non-empty list has a range");
    assert!((96..=100).contains(&range.start));
    // ceil(600 / 48) + 2 * 4, inclusive of both ends.
    assert!((21..=22).contains(&client.visible_slice().len()));
    assert_eq!(client.visible_slice()[0], client.rows()[range.start]);
    Ok(())
}

#[tokio::test]
async fn test_scroll_to_item_materializes_its_row() -> Result<()> {
    let mut client = ungrouped(9999).await?;
    let mut events = client.subscribe();

    assert!(client.scroll_to(ItemId::new(7500)));

    let visible: Vec<ItemId> = client.visible_slice().iter().filter_map(|row| row.item_id()).collect();
    assert!(visible.contains(&ItemId::new(7500)));
    assert!(events.drain().iter().any(|event| matches!(
        event,
        CatalogEvent::VisibleItemsChanged { item_ids } if item_ids.contains(&ItemId::new(7500))
    )));
    Ok(())
}

#[tokio::test]
async fn test_scroll_to_absent_item_is_a_no_op() -> Result<()> {
    let mut client = ungrouped(500).await?;
    client.scroll(4800);
    let before = client.visible_slice().to_vec();

    assert!(!client.scroll_to(ItemId::new(90_000)));
    assert_eq!(client.list().window().scroll_offset(), 4800);
    assert_eq!(client.visible_slice(), before.as_slice());
    Ok(())
}

#[tokio::test]
async fn test_narrowing_selection_clamps_offset() -> Result<()> {
    let world = CatalogWorld::new()
        .with_active_items(1..=5000)
        .with_group(1, "Chico", [1, 2, 3]);
    let mut client = Client::connect(world.memory_store(), Config::default()).await?;
    client.scroll(200_000);

    client.select_group(Some(GroupSelector::Explicit(GroupId::new(1))))?;

    assert_eq!(client.list().window().scroll_offset(), 0);
    assert_eq!(client.visible_slice().len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_resize_rejects_zero_height() -> Result<()> {
    let mut client = ungrouped(10).await?;
    assert!(matches!(client.resize(0), Err(Error::InvalidInput(_))));

    client.resize(96)?;
    assert_eq!(client.list().window().config().viewport_height, 96);
    Ok(())
}
