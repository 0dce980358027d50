use serde::Serialize;
use serde_json::json;

use crate::query::ListSnapshot;

use super::ConsoleError;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), ConsoleError> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

/// Render a list snapshot: the rows plus derived pagination.
pub fn print_list(snapshot: &ListSnapshot) -> Result<(), ConsoleError> {
    let items = snapshot
        .data
        .as_ref()
        .map(|page| page.items.as_slice())
        .unwrap_or_default();
    let pagination = snapshot.pagination.as_ref().map(|p| {
        json!({
            "page": p.page,
            "limit": p.limit,
            "total": p.total,
            "totalPages": p.total_pages,
        })
    });
    print_json(&json!({
        "items": items,
        "pagination": pagination,
    }))
}
