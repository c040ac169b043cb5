//! Shared store fixture for integration tests

use salesql_store::fixtures::{SaleRow, TempStore};

/// 20 North, 5 South and 3 East orders.
///
/// North: alternating Laptop/Smartphone, 100.0 x 1, profit 10.0 each.
/// South: Tablet, 50.0 x 2, profit 4.0 each.
/// East: Smartphone, 200.0 x 1, profit -6.0 each.
pub fn sample_rows() -> Vec<SaleRow> {
    let mut rows = Vec::new();
    for i in 0..20 {
        let product = if i % 2 == 0 { "Laptop" } else { "Smartphone" };
        rows.push(SaleRow::new(
            &format!("2024-01-{:02}", i + 1),
            "North",
            product,
            100.0,
            1,
            0.0,
            10.0,
        ));
    }
    for i in 0..5 {
        rows.push(SaleRow::new(
            &format!("2024-02-{:02}", i + 1),
            "South",
            "Tablet",
            50.0,
            2,
            5.0,
            4.0,
        ));
    }
    for i in 0..3 {
        rows.push(SaleRow::new(
            &format!("2024-03-{:02}", i + 1),
            "East",
            "Smartphone",
            200.0,
            1,
            0.0,
            -6.0,
        ));
    }
    rows
}

/// Seeded store, deleted when the returned guard drops
pub fn seeded_store(name: &str) -> TempStore {
    TempStore::create(name, &sample_rows()).expect("fixture store should be created")
}
