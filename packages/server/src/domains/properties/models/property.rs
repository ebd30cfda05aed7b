use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::common::{AgentId, PropertyId};
use crate::domains::properties::geocode::GeoPoint;
use crate::domains::properties::query::{Condition, FilterValue, ListingQuery};

/// Image shown when a listing is created without photos. Upload and
/// thumbnailing happen in a separate service; this table only stores paths.
pub const DEFAULT_PROPERTY_IMAGE: &str = "/img/properties/default-property-image.jpg";

/// Property - a listed home, office, or plot
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub agent_id: AgentId,

    // Content
    pub title: String,
    pub description: String,

    // Hot path fields (validated against the enums below at the edge)
    pub property_type: String, // 'residential', 'commercial', 'industrial', ...
    pub status: String,        // 'available', 'pending', 'sold', 'rented'
    pub sale_type: String,     // 'sell', 'rent'

    // Numbers buyers filter on
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i32,

    // Address
    pub house_number: String,
    pub street: String,
    pub city: String,

    // Resolved map position
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: i32,

    pub images: Vec<String>,

    // Internal version counter; the default search projection hides it
    pub row_version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Enums for type-safe edges
// =============================================================================

/// Property type enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    Residential,
    Commercial,
    Industrial,
    Land,
    MixedUse,
    Retail,
    Hospitality,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyType::Residential => write!(f, "residential"),
            PropertyType::Commercial => write!(f, "commercial"),
            PropertyType::Industrial => write!(f, "industrial"),
            PropertyType::Land => write!(f, "land"),
            PropertyType::MixedUse => write!(f, "mixed-use"),
            PropertyType::Retail => write!(f, "retail"),
            PropertyType::Hospitality => write!(f, "hospitality"),
        }
    }
}

impl std::str::FromStr for PropertyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "residential" => Ok(PropertyType::Residential),
            "commercial" => Ok(PropertyType::Commercial),
            "industrial" => Ok(PropertyType::Industrial),
            "land" => Ok(PropertyType::Land),
            "mixed-use" => Ok(PropertyType::MixedUse),
            "retail" => Ok(PropertyType::Retail),
            "hospitality" => Ok(PropertyType::Hospitality),
            _ => Err(anyhow::anyhow!(
                "Property type must be one of: residential, commercial, industrial, land, mixed-use, retail, hospitality"
            )),
        }
    }
}

/// Listing status enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Available,
    Pending,
    Sold,
    Rented,
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingStatus::Available => write!(f, "available"),
            ListingStatus::Pending => write!(f, "pending"),
            ListingStatus::Sold => write!(f, "sold"),
            ListingStatus::Rented => write!(f, "rented"),
        }
    }
}

impl std::str::FromStr for ListingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(ListingStatus::Available),
            "pending" => Ok(ListingStatus::Pending),
            "sold" => Ok(ListingStatus::Sold),
            "rented" => Ok(ListingStatus::Rented),
            _ => Err(anyhow::anyhow!(
                "Status must be one of: available, pending, sold, rented"
            )),
        }
    }
}

/// Sale type enum
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SaleType {
    Sell,
    Rent,
}

impl std::fmt::Display for SaleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleType::Sell => write!(f, "sell"),
            SaleType::Rent => write!(f, "rent"),
        }
    }
}

impl std::str::FromStr for SaleType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sell" => Ok(SaleType::Sell),
            "rent" => Ok(SaleType::Rent),
            _ => Err(anyhow::anyhow!("Sale type must be either 'sell' or 'rent'")),
        }
    }
}

/// Fields for a new listing, validated at the edge before insertion.
#[derive(Debug, Clone)]
pub struct NewProperty {
    pub agent_id: AgentId,
    pub title: String,
    pub property_type: String,
    pub description: String,
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i32,
    pub status: String,
    pub sale_type: String,
    pub images: Vec<String>,
    pub house_number: String,
    pub street: String,
    pub city: String,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Property {
    /// Find property by ID
    pub async fn find_by_id(id: PropertyId, pool: &PgPool) -> Result<Option<Self>> {
        let property =
            sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(property)
    }

    /// Execute a compiled search: total match count over the filtered set,
    /// then the requested page with ordering applied.
    ///
    /// The count runs before LIMIT/OFFSET so pagination metadata reflects
    /// the whole result set, not the page.
    pub async fn search(plan: &ListingQuery, pool: &PgPool) -> Result<(Vec<Self>, i64)> {
        let total = Self::count_matching(plan, pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM properties");
        push_filter(&mut qb, &plan.conditions);

        qb.push(" ORDER BY ");
        for (i, key) in plan.sort.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            // Column names come from the closed ListingField enum, never
            // from client text.
            qb.push(key.field.column());
            qb.push(" ");
            qb.push(key.direction.sql());
        }

        qb.push(" LIMIT ");
        qb.push_bind(plan.window.limit());
        qb.push(" OFFSET ");
        qb.push_bind(plan.window.offset());

        let properties = qb.build_query_as::<Property>().fetch_all(pool).await?;
        Ok((properties, total))
    }

    /// Count matches of a compiled filter without materializing rows.
    pub async fn count_matching(plan: &ListingQuery, pool: &PgPool) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties");
        push_filter(&mut qb, &plan.conditions);
        let total: i64 = qb.build_query_scalar().fetch_one(pool).await?;
        Ok(total)
    }

    /// Create a new listing with its resolved map position.
    pub async fn create(new: NewProperty, point: GeoPoint, pool: &PgPool) -> Result<Self> {
        let property = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties (
                id,
                agent_id,
                title,
                description,
                property_type,
                status,
                sale_type,
                price,
                bedrooms,
                bathrooms,
                area,
                house_number,
                street,
                city,
                latitude,
                longitude,
                zoom,
                images
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(PropertyId::new())
        .bind(new.agent_id)
        .bind(new.title)
        .bind(new.description)
        .bind(new.property_type)
        .bind(new.status)
        .bind(new.sale_type)
        .bind(new.price)
        .bind(new.bedrooms)
        .bind(new.bathrooms)
        .bind(new.area)
        .bind(new.house_number)
        .bind(new.street)
        .bind(new.city)
        .bind(point.lat)
        .bind(point.lng)
        .bind(point.zoom)
        .bind(new.images)
        .fetch_one(pool)
        .await?;

        Ok(property)
    }

    /// Persist the current in-memory state of an edited listing, bumping the
    /// internal version counter.
    pub async fn update(&self, pool: &PgPool) -> Result<Self> {
        let property = sqlx::query_as::<_, Property>(
            r#"
            UPDATE properties SET
                title = $1,
                description = $2,
                property_type = $3,
                status = $4,
                sale_type = $5,
                price = $6,
                bedrooms = $7,
                bathrooms = $8,
                area = $9,
                house_number = $10,
                street = $11,
                city = $12,
                latitude = $13,
                longitude = $14,
                zoom = $15,
                images = $16,
                row_version = row_version + 1,
                updated_at = NOW()
            WHERE id = $17
            RETURNING *
            "#,
        )
        .bind(&self.title)
        .bind(&self.description)
        .bind(&self.property_type)
        .bind(&self.status)
        .bind(&self.sale_type)
        .bind(self.price)
        .bind(self.bedrooms)
        .bind(self.bathrooms)
        .bind(self.area)
        .bind(&self.house_number)
        .bind(&self.street)
        .bind(&self.city)
        .bind(self.latitude)
        .bind(self.longitude)
        .bind(self.zoom)
        .bind(&self.images)
        .bind(self.id)
        .fetch_one(pool)
        .await?;

        Ok(property)
    }

    /// Delete a listing, returning the removed row if it existed.
    pub async fn delete(id: PropertyId, pool: &PgPool) -> Result<Option<Self>> {
        let property =
            sqlx::query_as::<_, Property>("DELETE FROM properties WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(property)
    }
}

/// Render compiled conditions into a WHERE clause with bound values.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, conditions: &[Condition]) {
    for (i, cond) in conditions.iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(cond.field.column());
        qb.push(" ");
        qb.push(cond.op.sql());
        qb.push(" ");
        match &cond.value {
            FilterValue::Int(n) => {
                qb.push_bind(*n);
            }
            FilterValue::Text(s) => {
                qb.push_bind(s.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::properties::query::QueryDefaults;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn compile(pairs: &[(&str, &str)]) -> ListingQuery {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ListingQuery::compile(params, QueryDefaults::default())
    }

    #[test]
    fn filter_renders_bound_parameters_only() {
        let plan = compile(&[("priceRange", "100000-250000"), ("city", "Haifa")]);
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM properties");
        push_filter(&mut qb, &plan.conditions);

        assert_eq!(
            qb.sql(),
            "SELECT * FROM properties WHERE price >= $1 AND price <= $2 AND city = $3"
        );
    }

    #[test]
    fn empty_filter_renders_no_where_clause() {
        let plan = compile(&[]);
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM properties");
        push_filter(&mut qb, &plan.conditions);

        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM properties");
    }

    #[test]
    fn hostile_field_names_never_reach_the_sql() {
        let plan = compile(&[("city\"; DROP TABLE properties; --", "x")]);
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM properties");
        push_filter(&mut qb, &plan.conditions);

        assert_eq!(qb.sql(), "SELECT * FROM properties");
    }

    #[test]
    fn property_type_round_trips() {
        for s in [
            "residential",
            "commercial",
            "industrial",
            "land",
            "mixed-use",
            "retail",
            "hospitality",
        ] {
            assert_eq!(PropertyType::from_str(s).unwrap().to_string(), s);
        }
        assert!(PropertyType::from_str("castle").is_err());
    }

    #[test]
    fn status_and_sale_type_round_trip() {
        for s in ["available", "pending", "sold", "rented"] {
            assert_eq!(ListingStatus::from_str(s).unwrap().to_string(), s);
        }
        assert!(ListingStatus::from_str("demolished").is_err());

        for s in ["sell", "rent"] {
            assert_eq!(SaleType::from_str(s).unwrap().to_string(), s);
        }
        assert!(SaleType::from_str("lease").is_err());
    }

    #[test]
    fn property_serializes_camel_case() {
        let property = Property {
            id: PropertyId::nil(),
            agent_id: AgentId::nil(),
            title: "Sea view flat".into(),
            description: "Bright and airy".into(),
            property_type: "residential".into(),
            status: "available".into(),
            sale_type: "sell".into(),
            price: 1_200_000,
            bedrooms: 3,
            bathrooms: 2,
            area: 95,
            house_number: "10".into(),
            street: "Main St".into(),
            city: "Haifa".into(),
            latitude: 32.79404,
            longitude: 34.98957,
            zoom: 17,
            images: vec![DEFAULT_PROPERTY_IMAGE.into()],
            row_version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let value = serde_json::to_value(&property).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("propertyType"));
        assert!(obj.contains_key("saleType"));
        assert!(obj.contains_key("houseNumber"));
        assert!(obj.contains_key("rowVersion"));
        assert!(!obj.contains_key("property_type"));
    }
}
