use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{AgeGroup, BudgetTier, Gift};

use super::{decode_json_list, parse_timestamp};

const GIFT_COLUMNS: &str = "id, name, description, price_cents, budget, age_groups, tags, created_at";

pub struct GiftRepository;

impl GiftRepository {
    pub async fn create(conn: &Connection, gift: &Gift) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO gifts (
                id, name, description, price_cents, budget, age_groups, tags, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                gift.id.clone(),
                gift.name.clone(),
                gift.description.clone(),
                gift.price_cents,
                gift.budget.to_string(),
                serde_json::to_string(&gift.age_groups)?,
                serde_json::to_string(&gift.tags)?,
                gift.created_at.to_rfc3339(),
            ],
        )
        .await?;

        Ok(())
    }

    pub async fn get(conn: &Connection, id: &str) -> Result<Option<Gift>> {
        let sql = format!("SELECT {GIFT_COLUMNS} FROM gifts WHERE id = ?1");
        let mut rows = conn.query(&sql, params![id]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_gift(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Catalog ordered by name. `budget` keeps gifts at or below the tier.
    pub async fn list(
        conn: &Connection,
        age_group: Option<AgeGroup>,
        budget: Option<BudgetTier>,
    ) -> Result<Vec<Gift>> {
        let sql = format!("SELECT {GIFT_COLUMNS} FROM gifts ORDER BY name ASC, id ASC");
        let mut rows = conn.query(&sql, ()).await?;

        let mut gifts = Vec::new();
        while let Some(row) = rows.next().await? {
            let gift = Self::row_to_gift(&row)?;
            // age_groups is a JSON column, filter after decoding
            if age_group.is_some_and(|group| !gift.age_groups.contains(&group)) {
                continue;
            }
            if budget.is_some_and(|tier| gift.budget > tier) {
                continue;
            }
            gifts.push(gift);
        }
        Ok(gifts)
    }

    pub async fn count(conn: &Connection) -> Result<i64> {
        let mut rows = conn.query("SELECT COUNT(*) FROM gifts", ()).await?;
        if let Some(row) = rows.next().await? {
            Ok(row.get(0)?)
        } else {
            Ok(0)
        }
    }

    fn row_to_gift(row: &libsql::Row) -> Result<Gift> {
        let age_groups: String = row.get(5)?;
        let tags: String = row.get(6)?;

        Ok(Gift {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price_cents: row.get(3)?,
            budget: row.get::<String>(4)?.parse().unwrap_or_default(),
            age_groups: serde_json::from_str(&age_groups).unwrap_or_default(),
            tags: decode_json_list(Some(&tags)),
            created_at: parse_timestamp(&row.get::<String>(7)?),
        })
    }
}
