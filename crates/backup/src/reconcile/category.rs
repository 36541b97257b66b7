use crate::error::{ErrorKind, Result};
use crate::snapshot::SnapshotCategory;
use exn::ResultExt;
use hoard_model::Category;
use hoard_store::Transaction;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// Match snapshot categories to the store by name, inserting the missing
/// ones.
///
/// Returns one category per incoming entry, aligned with `incoming`, so a
/// membership position indexes straight into it. Matched entries are the
/// local category. Inserted ones keep their snapshot display order unless
/// the store already uses it, in which case they go after the last one.
#[instrument(skip_all, fields(count = incoming.len(), inserted))]
pub async fn restore_categories(tx: &mut Transaction, incoming: &[SnapshotCategory]) -> Result<Vec<Category>> {
    let existing = tx.categories().await.or_raise(|| ErrorKind::Store)?;
    let mut orders: HashSet<i32> = existing.iter().map(|category| category.order).collect();
    let mut by_name: HashMap<String, Category> = existing
        .into_iter()
        .filter(|category| category.id.is_some())
        .map(|category| (category.name.clone(), category))
        .collect();

    let mut inserted = 0_usize;
    let mut resolved: Vec<Category> = Vec::with_capacity(incoming.len());
    for snapshot in incoming {
        if let Some(category) = by_name.get(&snapshot.name) {
            resolved.push(category.clone());
            continue;
        }
        let mut category = Category::from(snapshot);
        if !orders.insert(category.order) {
            category.order = orders.iter().copied().max().unwrap_or_default() + 1;
            orders.insert(category.order);
        }
        category.id = Some(tx.insert_category(&category).await.or_raise(|| ErrorKind::Store)?);
        inserted += 1;
        by_name.insert(category.name.clone(), category.clone());
        resolved.push(category);
    }
    tracing::Span::current().record("inserted", inserted);
    Ok(resolved)
}

/// Replace the category memberships of a series.
///
/// `positions` index into the snapshot's category list, resolved through
/// `categories` (as returned by [`restore_categories`]) to local ids.
/// Existing memberships are only replaced if at least one position
/// resolves. Returns the number of memberships written.
pub async fn restore_series_categories(
    tx: &mut Transaction,
    series_id: i64,
    positions: &[i32],
    categories: &[Category],
) -> Result<usize> {
    let mut ids: Vec<i64> = Vec::with_capacity(positions.len());
    for position in positions {
        let category = usize::try_from(*position).ok().and_then(|index| categories.get(index));
        let Some(id) = category.and_then(|category| category.id) else {
            tracing::debug!(series_id, position, "no snapshot category at position");
            continue;
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    if ids.is_empty() {
        return Ok(0);
    }
    tx.replace_series_categories(series_id, &ids).await.or_raise(|| ErrorKind::Store)?;
    Ok(ids.len())
}
