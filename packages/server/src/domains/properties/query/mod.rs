//! Query-string compiler for listing search.
//!
//! Turns the raw key/value parameters of a search request into a typed query
//! plan: filter conditions, sort keys, a field projection, and a pagination
//! window. The four stages mirror the request surface and can be chained in
//! any order; pagination is conventionally applied last.
//!
//! ```rust,ignore
//! let plan = ListingQuery::compile(params, QueryDefaults::default());
//! let (rows, total) = Property::search(&plan, &pool).await?;
//! ```
//!
//! Malformed input never fails a search: clauses that do not parse are
//! dropped and pagination/sort fall back to their defaults.

pub mod filter;

use std::collections::HashMap;

use tracing::debug;

use crate::common::pagination::{PageDefaults, PageWindow};

pub use filter::{CompareOp, Condition, FilterValue, ListingField};

/// Parameter names with structural meaning. Never interpreted as filters.
pub const RESERVED_PARAMS: [&str; 4] = ["sort", "fields", "page", "limit"];

/// Response-body key of the internal version counter, hidden by the default
/// projection.
pub const ROW_VERSION_KEY: &str = "rowVersion";

/// Sort direction, encoded in the query string as an optional leading `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One element of the compiled ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: ListingField,
    pub direction: SortDirection,
}

/// Which fields of a listing the response carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Every field except the internal row version counter.
    Default,
    /// Only the named response keys; `id` is always kept.
    Include(Vec<String>),
}

impl Projection {
    /// Apply the projection to one serialized listing.
    pub fn apply(&self, mut value: serde_json::Value) -> serde_json::Value {
        let Some(obj) = value.as_object_mut() else {
            return value;
        };
        match self {
            Projection::Default => {
                obj.remove(ROW_VERSION_KEY);
            }
            Projection::Include(fields) => {
                obj.retain(|key, _| key == "id" || fields.iter().any(|f| f == key));
            }
        }
        value
    }
}

/// Documented defaults the compiler falls back to.
///
/// All implicit behavior of the search surface lives here rather than being
/// scattered across call sites.
#[derive(Debug, Clone)]
pub struct QueryDefaults {
    /// Ordering applied when the client sends no usable `sort`.
    pub sort: SortKey,
    /// Pagination fallbacks and the page-size cap.
    pub page: PageDefaults,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            sort: SortKey {
                field: ListingField::Price,
                direction: SortDirection::Asc,
            },
            page: PageDefaults::default(),
        }
    }
}

/// A compiled listing search: conditions, ordering, projection, window.
#[derive(Debug, Clone)]
pub struct ListingQuery {
    params: HashMap<String, String>,
    defaults: QueryDefaults,
    pub conditions: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub window: PageWindow,
}

/// Split `price[gte]` into `("price", Some("gte"))`; plain names carry no
/// operator token.
fn split_operator(key: &str) -> (&str, Option<&str>) {
    if let Some((name, rest)) = key.split_once('[') {
        if let Some(op) = rest.strip_suffix(']') {
            return (name, Some(op));
        }
    }
    (key, None)
}

impl ListingQuery {
    pub fn new(params: HashMap<String, String>, defaults: QueryDefaults) -> Self {
        let window = PageWindow::resolve(None, None, &defaults.page);
        let sort = vec![defaults.sort];
        Self {
            params,
            defaults,
            conditions: Vec::new(),
            sort,
            projection: Projection::Default,
            window,
        }
    }

    /// Run all four stages in the conventional order.
    pub fn compile(params: HashMap<String, String>, defaults: QueryDefaults) -> Self {
        Self::new(params, defaults)
            .filter()
            .sort()
            .select_fields()
            .paginate()
    }

    /// Build the filter predicate from every non-reserved parameter.
    pub fn filter(mut self) -> Self {
        let mut conditions = Vec::new();

        for (key, raw) in &self.params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }

            // priceRange="<min>-<max>" is consumed here and replaced by a
            // range on price; each bound is kept only if it parses.
            if key == "priceRange" {
                let (min, max) = raw.split_once('-').unwrap_or((raw.as_str(), ""));
                if let Ok(min) = min.trim().parse::<i64>() {
                    conditions.push(Condition::new(
                        ListingField::Price,
                        CompareOp::Gte,
                        FilterValue::Int(min),
                    ));
                }
                if let Ok(max) = max.trim().parse::<i64>() {
                    conditions.push(Condition::new(
                        ListingField::Price,
                        CompareOp::Lte,
                        FilterValue::Int(max),
                    ));
                }
                continue;
            }

            // A bare bedrooms=3 historically means "3 or more"; every other
            // count is an exact match.
            if key == "bedrooms" {
                match raw.trim().parse::<i64>() {
                    Ok(3) => conditions.push(Condition::new(
                        ListingField::Bedrooms,
                        CompareOp::Gte,
                        FilterValue::Int(3),
                    )),
                    Ok(n) => conditions.push(Condition::new(
                        ListingField::Bedrooms,
                        CompareOp::Eq,
                        FilterValue::Int(n),
                    )),
                    Err(_) => debug!(value = %raw, "Dropping non-numeric bedrooms filter"),
                }
                continue;
            }

            let (name, op_token) = split_operator(key);
            let Some(field) = ListingField::from_param(name) else {
                debug!(param = %key, "Dropping unknown filter field");
                continue;
            };
            let op = match op_token {
                None => CompareOp::Eq,
                Some(token) => match CompareOp::from_token(token) {
                    Some(op) => op,
                    None => {
                        debug!(param = %key, "Dropping unknown filter operator");
                        continue;
                    }
                },
            };
            let value = if field.is_numeric() {
                match raw.trim().parse::<i64>() {
                    Ok(n) => FilterValue::Int(n),
                    Err(_) => {
                        debug!(param = %key, value = %raw, "Dropping non-numeric filter value");
                        continue;
                    }
                }
            } else {
                FilterValue::Text(raw.clone())
            };
            conditions.push(Condition::new(field, op, value));
        }

        // Parameter maps are unordered; a stable condition order keeps the
        // generated SQL deterministic.
        conditions.sort();
        self.conditions = conditions;
        self
    }

    /// Build the ordering from the comma-separated `sort` parameter.
    pub fn sort(mut self) -> Self {
        let mut keys = Vec::new();
        if let Some(raw) = self.params.get("sort") {
            for part in raw.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                let (name, direction) = match part.strip_prefix('-') {
                    Some(name) => (name, SortDirection::Desc),
                    None => (part, SortDirection::Asc),
                };
                match ListingField::from_param(name) {
                    Some(field) => keys.push(SortKey { field, direction }),
                    None => debug!(field = %part, "Dropping unknown sort field"),
                }
            }
        }
        if keys.is_empty() {
            keys.push(self.defaults.sort);
        }
        self.sort = keys;
        self
    }

    /// Build the projection from the comma-separated `fields` parameter.
    pub fn select_fields(mut self) -> Self {
        self.projection = match self.params.get("fields") {
            Some(raw) => {
                let fields: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect();
                if fields.is_empty() {
                    Projection::Default
                } else {
                    Projection::Include(fields)
                }
            }
            None => Projection::Default,
        };
        self
    }

    /// Resolve the pagination window from `page`/`limit`.
    pub fn paginate(mut self) -> Self {
        self.window = PageWindow::resolve(
            self.params.get("page").map(String::as_str),
            self.params.get("limit").map(String::as_str),
            &self.defaults.page,
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn compile(pairs: &[(&str, &str)]) -> ListingQuery {
        ListingQuery::compile(params(pairs), QueryDefaults::default())
    }

    fn has_condition(plan: &ListingQuery, field: ListingField, op: CompareOp, value: FilterValue) -> bool {
        plan.conditions
            .contains(&Condition::new(field, op, value))
    }

    #[test]
    fn reserved_params_never_become_filters() {
        let plan = compile(&[
            ("sort", "price"),
            ("fields", "title"),
            ("page", "2"),
            ("limit", "4"),
            ("city", "Haifa"),
        ]);
        assert_eq!(plan.conditions.len(), 1);
        assert!(has_condition(
            &plan,
            ListingField::City,
            CompareOp::Eq,
            FilterValue::Text("Haifa".into())
        ));
    }

    #[test]
    fn price_range_compiles_to_bounds_and_is_consumed() {
        let plan = compile(&[("priceRange", "100000-250000")]);
        assert_eq!(plan.conditions.len(), 2);
        assert!(has_condition(
            &plan,
            ListingField::Price,
            CompareOp::Gte,
            FilterValue::Int(100_000)
        ));
        assert!(has_condition(
            &plan,
            ListingField::Price,
            CompareOp::Lte,
            FilterValue::Int(250_000)
        ));
    }

    #[test]
    fn price_range_with_missing_max_keeps_only_min() {
        let plan = compile(&[("priceRange", "100000-")]);
        assert_eq!(plan.conditions.len(), 1);
        assert!(has_condition(
            &plan,
            ListingField::Price,
            CompareOp::Gte,
            FilterValue::Int(100_000)
        ));
    }

    #[test]
    fn bedrooms_three_means_three_or_more() {
        let plan = compile(&[("bedrooms", "3")]);
        assert_eq!(plan.conditions.len(), 1);
        assert!(has_condition(
            &plan,
            ListingField::Bedrooms,
            CompareOp::Gte,
            FilterValue::Int(3)
        ));
    }

    #[test]
    fn bedrooms_other_counts_are_exact() {
        let plan = compile(&[("bedrooms", "2")]);
        assert!(has_condition(
            &plan,
            ListingField::Bedrooms,
            CompareOp::Eq,
            FilterValue::Int(2)
        ));

        // The threshold only triggers at exactly 3
        let plan = compile(&[("bedrooms", "4")]);
        assert!(has_condition(
            &plan,
            ListingField::Bedrooms,
            CompareOp::Eq,
            FilterValue::Int(4)
        ));
    }

    #[test]
    fn bracketed_operators_become_range_conditions() {
        let plan = compile(&[("area", "120"), ("price[lte]", "900000")]);
        assert!(has_condition(
            &plan,
            ListingField::Area,
            CompareOp::Eq,
            FilterValue::Int(120)
        ));
        assert!(has_condition(
            &plan,
            ListingField::Price,
            CompareOp::Lte,
            FilterValue::Int(900_000)
        ));
    }

    #[test]
    fn unknown_fields_and_operators_are_dropped() {
        let plan = compile(&[
            ("favoriteColor", "blue"),
            ("price[regex]", "1"),
            ("price;DROP TABLE properties", "1"),
        ]);
        assert!(plan.conditions.is_empty());
    }

    #[test]
    fn non_numeric_values_on_numeric_fields_are_dropped() {
        let plan = compile(&[("price", "cheap"), ("bedrooms", "many")]);
        assert!(plan.conditions.is_empty());
    }

    #[test]
    fn default_sort_is_ascending_price() {
        let plan = compile(&[]);
        assert_eq!(
            plan.sort,
            vec![SortKey {
                field: ListingField::Price,
                direction: SortDirection::Asc
            }]
        );
    }

    #[test]
    fn sort_list_preserves_order_and_sign() {
        let plan = compile(&[("sort", "price,-bedrooms")]);
        assert_eq!(
            plan.sort,
            vec![
                SortKey {
                    field: ListingField::Price,
                    direction: SortDirection::Asc
                },
                SortKey {
                    field: ListingField::Bedrooms,
                    direction: SortDirection::Desc
                },
            ]
        );
    }

    #[test]
    fn sort_with_only_unknown_fields_falls_back_to_default() {
        let plan = compile(&[("sort", "shoeSize,-karma")]);
        assert_eq!(
            plan.sort,
            vec![SortKey {
                field: ListingField::Price,
                direction: SortDirection::Asc
            }]
        );
    }

    #[test]
    fn pagination_defaults_and_explicit_values() {
        let plan = compile(&[]);
        assert_eq!(plan.window.offset(), 0);
        assert_eq!(plan.window.limit(), 8);

        let plan = compile(&[("page", "2"), ("limit", "5")]);
        assert_eq!(plan.window.offset(), 5);
        assert_eq!(plan.window.limit(), 5);
    }

    #[test]
    fn non_numeric_page_falls_back_to_first() {
        let plan = compile(&[("page", "abc"), ("limit", "5")]);
        assert_eq!(plan.window.offset(), 0);
        assert_eq!(plan.window.limit(), 5);
    }

    #[test]
    fn default_projection_hides_row_version() {
        let plan = compile(&[]);
        let projected = plan.projection.apply(serde_json::json!({
            "id": "x",
            "title": "Sea view flat",
            "rowVersion": 4
        }));
        assert_eq!(
            projected,
            serde_json::json!({"id": "x", "title": "Sea view flat"})
        );
    }

    #[test]
    fn explicit_projection_keeps_only_named_fields_and_id() {
        let plan = compile(&[("fields", "title,price")]);
        let projected = plan.projection.apply(serde_json::json!({
            "id": "x",
            "title": "Sea view flat",
            "price": 1_200_000,
            "city": "Tel Aviv",
            "rowVersion": 4
        }));
        assert_eq!(
            projected,
            serde_json::json!({"id": "x", "title": "Sea view flat", "price": 1_200_000})
        );
    }

    #[test]
    fn stages_commute() {
        let a = ListingQuery::new(
            params(&[("city", "Haifa"), ("sort", "-price"), ("page", "3")]),
            QueryDefaults::default(),
        )
        .paginate()
        .select_fields()
        .sort()
        .filter();
        let b = compile(&[("city", "Haifa"), ("sort", "-price"), ("page", "3")]);

        assert_eq!(a.conditions, b.conditions);
        assert_eq!(a.sort, b.sort);
        assert_eq!(a.projection, b.projection);
        assert_eq!(a.window, b.window);
    }
}
