//! End-to-end checks of the search plan surface: raw query-string maps in,
//! compiled plans and projected rows out.

use std::collections::HashMap;

use serde_json::json;
use server_core::domains::properties::query::{
    CompareOp, Condition, FilterValue, ListingField, ListingQuery, Projection, QueryDefaults,
    SortDirection,
};

fn compile(pairs: &[(&str, &str)]) -> ListingQuery {
    let params: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ListingQuery::compile(params, QueryDefaults::default())
}

#[test]
fn typical_buyer_search_compiles_fully() {
    let plan = compile(&[
        ("priceRange", "100000-250000"),
        ("bedrooms", "3"),
        ("propertyType", "residential"),
        ("sort", "-price,area"),
        ("fields", "title,price,city"),
        ("page", "2"),
        ("limit", "6"),
    ]);

    // Filter: price bounds, bedrooms threshold, equality on type; nothing
    // reserved leaks through
    assert_eq!(plan.conditions.len(), 4);
    assert!(plan.conditions.contains(&Condition::new(
        ListingField::Price,
        CompareOp::Gte,
        FilterValue::Int(100_000)
    )));
    assert!(plan.conditions.contains(&Condition::new(
        ListingField::Price,
        CompareOp::Lte,
        FilterValue::Int(250_000)
    )));
    assert!(plan.conditions.contains(&Condition::new(
        ListingField::Bedrooms,
        CompareOp::Gte,
        FilterValue::Int(3)
    )));
    assert!(plan.conditions.contains(&Condition::new(
        ListingField::PropertyType,
        CompareOp::Eq,
        FilterValue::Text("residential".into())
    )));
    // Sort: descending price, then ascending area
    assert_eq!(plan.sort.len(), 2);
    assert_eq!(plan.sort[0].field, ListingField::Price);
    assert_eq!(plan.sort[0].direction, SortDirection::Desc);
    assert_eq!(plan.sort[1].field, ListingField::Area);
    assert_eq!(plan.sort[1].direction, SortDirection::Asc);

    // Window: page 2 of 6
    assert_eq!(plan.window.offset(), 6);
    assert_eq!(plan.window.limit(), 6);

    // Projection: the named fields plus id
    let row = json!({
        "id": "abc",
        "title": "Garden duplex",
        "price": 210_000,
        "city": "Haifa",
        "bedrooms": 3,
        "rowVersion": 2
    });
    assert_eq!(
        plan.projection.apply(row),
        json!({"id": "abc", "title": "Garden duplex", "price": 210_000, "city": "Haifa"})
    );
}

#[test]
fn empty_query_string_gets_safe_defaults() {
    let plan = compile(&[]);

    assert!(plan.conditions.is_empty());
    assert_eq!(plan.sort.len(), 1);
    assert_eq!(plan.sort[0].field, ListingField::Price);
    assert_eq!(plan.sort[0].direction, SortDirection::Asc);
    assert_eq!(plan.window.offset(), 0);
    assert_eq!(plan.window.limit(), 8);
    assert_eq!(plan.projection, Projection::Default);
}

#[test]
fn hostile_input_degrades_to_a_harmless_plan() {
    let plan = compile(&[
        ("priceRange", "lots-of-money"),
        ("bedrooms", "NaN"),
        ("page", "-1"),
        ("limit", "1e9"),
        ("sort", "'; DROP TABLE properties; --"),
        ("title[exec]", "x"),
    ]);

    assert!(plan.conditions.is_empty());
    // Defaults take over everywhere
    assert_eq!(plan.sort[0].field, ListingField::Price);
    assert_eq!(plan.window.offset(), 0);
    assert_eq!(plan.window.limit(), 8);
}

#[test]
fn price_range_key_is_never_passed_through_literally() {
    let plan = compile(&[("priceRange", "100000-250000")]);
    for cond in &plan.conditions {
        assert_eq!(cond.field, ListingField::Price);
    }
}
