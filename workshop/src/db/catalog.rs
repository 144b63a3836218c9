use crate::error::Result;
use crate::models::{AgeGroup, BudgetTier, Gift};

use super::traits::DatabaseBackend;

use AgeGroup::*;
use BudgetTier::*;

// name, description, price in cents, tier, age groups, tags
type CatalogEntry = (
    &'static str,
    &'static str,
    i64,
    BudgetTier,
    &'static [AgeGroup],
    &'static [&'static str],
);

const DEFAULT_CATALOG: &[CatalogEntry] = &[
    (
        "Soft stacking blocks",
        "Squishy numbered blocks for stacking and toppling",
        1999,
        Low,
        &[Toddler],
        &["building", "counting", "colors"],
    ),
    (
        "Board book animal collection",
        "Sturdy picture books about farm and jungle animals",
        1499,
        Low,
        &[Toddler, Preschool],
        &["animals", "reading", "stories"],
    ),
    (
        "Push-along wooden walker",
        "Wooden walker with a bead maze and spinning gears",
        4999,
        Medium,
        &[Toddler],
        &["walking", "music", "building"],
    ),
    (
        "Dinosaur figure set",
        "Twelve hand-painted dinosaurs with a fact card for each",
        1899,
        Low,
        &[Preschool, SchoolAge],
        &["dinosaurs", "animals", "pretend play"],
    ),
    (
        "Dino dig excavation kit",
        "Plaster block with hidden fossils, brush and chisel",
        1299,
        Low,
        &[Preschool, SchoolAge, Tween],
        &["dinosaurs", "science", "digging"],
    ),
    (
        "Washable finger paint set",
        "Six bright washable paints with an apron and paper pad",
        1599,
        Low,
        &[Toddler, Preschool],
        &["painting", "art", "colors"],
    ),
    (
        "Magnetic tile builder",
        "Sixty translucent magnetic tiles for towers and castles",
        5999,
        Medium,
        &[Preschool, SchoolAge],
        &["building", "engineering", "colors"],
    ),
    (
        "Balance bike",
        "Pedal-free bike with adjustable seat for first riders",
        8999,
        High,
        &[Preschool],
        &["outdoors", "bikes", "sports"],
    ),
    (
        "Junior science lab",
        "Twenty safe experiments with goggles and test tubes",
        3499,
        Medium,
        &[SchoolAge, Tween],
        &["science", "chemistry", "experiments"],
    ),
    (
        "Glow-in-the-dark star projector",
        "Night light projecting constellations on the ceiling",
        2499,
        Low,
        &[Preschool, SchoolAge, Tween],
        &["space", "stars", "bedtime"],
    ),
    (
        "Beginner telescope",
        "70mm refractor telescope with a moon map",
        11999,
        High,
        &[SchoolAge, Tween, Teen],
        &["space", "stars", "science"],
    ),
    (
        "Friendship bracelet studio",
        "Loom, embroidery thread and bead assortment",
        1799,
        Low,
        &[SchoolAge, Tween],
        &["crafts", "jewelry", "friends"],
    ),
    (
        "Graphic novel box set",
        "Four-volume adventure series in full color",
        3999,
        Medium,
        &[Tween, Teen],
        &["reading", "comics", "stories"],
    ),
    (
        "Programmable robot kit",
        "Build-your-own robot with block-based and Python coding",
        14999,
        High,
        &[Tween, Teen],
        &["robots", "coding", "engineering"],
    ),
    (
        "Wireless headphones",
        "Over-ear headphones with volume limiting",
        7999,
        High,
        &[Teen],
        &["music", "gaming", "podcasts"],
    ),
    (
        "Sketchbook and marker set",
        "Dual-tip alcohol markers with a hardcover sketchbook",
        2999,
        Medium,
        &[Tween, Teen],
        &["drawing", "art", "design"],
    ),
];

/// The built-in gift catalog, with fresh ids.
pub fn default_catalog() -> Vec<Gift> {
    DEFAULT_CATALOG
        .iter()
        .map(|(name, description, price_cents, budget, age_groups, tags)| {
            let mut gift = Gift::new(*name, *budget, age_groups.to_vec());
            gift.description = description.to_string();
            gift.price_cents = *price_cents;
            gift.tags = tags.iter().map(|t| t.to_string()).collect();
            gift
        })
        .collect()
}

/// Insert the built-in catalog when the gifts table is empty.
/// Returns the number of gifts inserted.
pub async fn seed_default_catalog(db: &dyn DatabaseBackend) -> Result<usize> {
    if db.count_gifts().await? > 0 {
        tracing::debug!("Gift catalog already populated, skipping seed");
        return Ok(0);
    }

    let gifts = default_catalog();
    for gift in &gifts {
        db.create_gift(gift).await?;
    }

    tracing::info!(count = gifts.len(), "Seeded default gift catalog");
    Ok(gifts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::{Database, GiftStore, LibSqlBackend};

    #[test]
    fn test_default_catalog_covers_every_age_group() {
        let catalog = default_catalog();
        for group in AgeGroup::ALL {
            assert!(
                catalog.iter().any(|g| g.age_groups.contains(&group)),
                "no gift for {group}"
            );
        }
    }

    #[test]
    fn test_default_catalog_has_low_budget_preschool_dinosaurs() {
        let catalog = default_catalog();
        assert!(catalog.iter().any(|g| g.is_compatible(Preschool, Low)
            && g.tags.iter().any(|t| t == "dinosaurs")));
    }

    #[tokio::test]
    async fn test_seeding_twice_inserts_once() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            DatabaseConfig::local(format!("file:{}", dir.path().join("seed.db").display()));
        let backend = LibSqlBackend::new(Database::new(&config).await.unwrap());

        let first = seed_default_catalog(&backend).await.unwrap();
        let second = seed_default_catalog(&backend).await.unwrap();

        assert_eq!(first, DEFAULT_CATALOG.len());
        assert_eq!(second, 0);
        assert_eq!(
            backend.count_gifts().await.unwrap(),
            DEFAULT_CATALOG.len() as i64
        );
    }
}
