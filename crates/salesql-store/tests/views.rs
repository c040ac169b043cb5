//! Aggregate views over a seeded store

mod common;

use salesql_store::views::ProfitGroup;
use salesql_store::{filter_options, load_sales, overview, SalesFilter};
use serde_json::json;

fn group(name: &str, total_profit: f64) -> ProfitGroup {
    ProfitGroup {
        name: name.to_string(),
        total_profit,
    }
}

#[test]
fn test_load_sales_newest_first() {
    let path = common::seeded_store("load_all");
    let result = load_sales(&path, &SalesFilter::default()).unwrap();

    assert_eq!(result.row_count, 28);
    let date_idx = result.columns.iter().position(|c| c == "order_date").unwrap();
    assert_eq!(result.rows[0][date_idx], json!("2024-03-03"));
    assert_eq!(result.rows[27][date_idx], json!("2024-01-01"));
}

#[test]
fn test_load_sales_filtered() {
    let path = common::seeded_store("load_filtered");
    let filter = SalesFilter {
        regions: vec!["North".to_string(), "East".to_string()],
        products: vec!["Smartphone".to_string()],
        min_profit: Some(0.0),
        max_profit: None,
    };

    let result = load_sales(&path, &filter).unwrap();

    // North smartphones only; East rows have negative profit
    assert_eq!(result.row_count, 10);
}

#[test]
fn test_profit_bounds_are_inclusive() {
    let path = common::seeded_store("load_bounds");

    // -6.0 and 10.0 are the lowest and highest profits in the store
    let both = SalesFilter {
        min_profit: Some(-6.0),
        max_profit: Some(10.0),
        ..SalesFilter::default()
    };
    assert_eq!(load_sales(&path, &both).unwrap().row_count, 28);

    // South rows sit exactly on the bound
    let upper = SalesFilter {
        max_profit: Some(4.0),
        ..SalesFilter::default()
    };
    assert_eq!(load_sales(&path, &upper).unwrap().row_count, 8);

    let exact = SalesFilter {
        min_profit: Some(4.0),
        max_profit: Some(4.0),
        ..SalesFilter::default()
    };
    let overview = overview(&path, &exact).unwrap();
    assert_eq!(overview.metrics.total_records, 5);
    assert_eq!(overview.profit_by_region, vec![group("South", 20.0)]);
}

#[test]
fn test_overview_whole_store() {
    let path = common::seeded_store("overview_all");
    let overview = overview(&path, &SalesFilter::default()).unwrap();

    assert_eq!(overview.metrics.total_records, 28);
    assert!((overview.metrics.total_profit - 202.0).abs() < 1e-9);
    assert!((overview.metrics.average_order_value - 3100.0 / 28.0).abs() < 1e-9);
    assert_eq!(overview.metrics.distinct_products, 3);

    assert_eq!(
        overview.top_products,
        vec![group("Laptop", 100.0), group("Smartphone", 82.0), group("Tablet", 20.0)]
    );
    assert_eq!(
        overview.profit_by_region,
        vec![group("North", 200.0), group("South", 20.0), group("East", -18.0)]
    );
}

#[test]
fn test_overview_filtered_by_region() {
    let path = common::seeded_store("overview_north");
    let filter = SalesFilter {
        regions: vec!["North".to_string()],
        ..SalesFilter::default()
    };

    let overview = overview(&path, &filter).unwrap();

    assert_eq!(overview.metrics.total_records, 20);
    assert!((overview.metrics.average_order_value - 100.0).abs() < 1e-9);
    assert_eq!(overview.metrics.distinct_products, 2);
    assert_eq!(overview.profit_by_region, vec![group("North", 200.0)]);
}

#[test]
fn test_overview_of_nothing() {
    let path = common::seeded_store("overview_empty");
    let filter = SalesFilter {
        min_profit: Some(1000.0),
        ..SalesFilter::default()
    };

    let overview = overview(&path, &filter).unwrap();

    assert_eq!(overview.metrics.total_records, 0);
    assert_eq!(overview.metrics.total_profit, 0.0);
    assert_eq!(overview.metrics.average_order_value, 0.0);
    assert!(overview.top_products.is_empty());
}

#[test]
fn test_filter_options() {
    let path = common::seeded_store("options");
    let options = filter_options(&path).unwrap();

    assert_eq!(options.regions, vec!["East", "North", "South"]);
    assert_eq!(options.products, vec!["Laptop", "Smartphone", "Tablet"]);
    assert_eq!(options.min_profit, Some(-6.0));
    assert_eq!(options.max_profit, Some(10.0));
}

#[test]
fn test_views_fail_on_missing_store() {
    let path = salesql_store::fixtures::temp_store_path("views_missing");
    assert!(overview(&path, &SalesFilter::default()).is_err());
    assert!(!path.exists());
}
