//! Subscription package catalog, carried as data.
//!
//! Prompts, retrieval seeding, and tests all read the same plan records
//! instead of each hard-coding their own copy of the price list.

use serde::{Deserialize, Serialize};

use crate::collaborators::{RetrievalError, VectorIndex};

/// One subscription plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagePlan {
    /// Plan size label (S, M, L, XL, 4XL).
    pub name: String,
    /// Monthly price in Thai baht.
    pub monthly_price_thb: u32,
    /// Number of Facebook pages the plan can connect.
    pub facebook_pages: u32,
    /// LINE connection entitlement, as shown to customers.
    pub line_connections: String,
    /// Admin support entitlement, as shown to customers.
    pub admin_support: String,
}

impl PackagePlan {
    /// One-line summary used for retrieval seeding and prompt context.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Package {} - ฿{}/month. Facebook Pages: {}, {}, {}",
            self.name,
            format_thb(self.monthly_price_thb),
            self.facebook_pages,
            self.line_connections,
            self.admin_support
        )
    }
}

/// The full plan lineup offered to customers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCatalog {
    pub plans: Vec<PackagePlan>,
}

impl Default for PackageCatalog {
    /// The published lineup: S through 4XL, all with unlimited LINE
    /// connections and 24-hour admin support.
    fn default() -> Self {
        let plan = |name: &str, price: u32, pages: u32| PackagePlan {
            name: name.to_string(),
            monthly_price_thb: price,
            facebook_pages: pages,
            line_connections: "เชื่อมต่อ Line Official/Line My shop ได้ไม่จำกัด".to_string(),
            admin_support: "แอดมินดูแล 24 ชม.".to_string(),
        };
        Self {
            plans: vec![
                plan("S", 990, 5),
                plan("M", 1_900, 10),
                plan("L", 4_900, 20),
                plan("XL", 12_500, 30),
                plan("4XL", 25_000, 50),
            ],
        }
    }
}

impl PackageCatalog {
    /// Looks up a plan by its size label, ignoring case.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PackagePlan> {
        self.plans
            .iter()
            .find(|plan| plan.name.eq_ignore_ascii_case(name))
    }

    /// Summaries for every plan, in lineup order.
    #[must_use]
    pub fn summaries(&self) -> Vec<String> {
        self.plans.iter().map(PackagePlan::summary).collect()
    }
}

/// Embeds every plan summary into `index`, with the plan record itself as
/// document metadata.
pub async fn seed_package_index(
    index: &VectorIndex,
    catalog: &PackageCatalog,
) -> Result<(), RetrievalError> {
    for plan in &catalog.plans {
        let metadata = serde_json::to_value(plan).unwrap_or(serde_json::Value::Null);
        index.add_document(plan.summary(), metadata).await?;
    }
    Ok(())
}

/// Thousands-separated baht amount: `12500` renders as `"12,500"`.
fn format_thb(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_matches_the_published_lineup() {
        let catalog = PackageCatalog::default();
        assert_eq!(catalog.plans.len(), 5);

        let s = catalog.find("s").unwrap();
        assert_eq!(s.monthly_price_thb, 990);
        assert_eq!(s.facebook_pages, 5);

        let xxxxl = catalog.find("4XL").unwrap();
        assert_eq!(xxxxl.monthly_price_thb, 25_000);
        assert_eq!(xxxxl.facebook_pages, 50);
    }

    #[test]
    fn summary_renders_separated_price_and_entitlements() {
        let catalog = PackageCatalog::default();
        let summary = catalog.find("M").unwrap().summary();
        assert_eq!(
            summary,
            "Package M - ฿1,900/month. Facebook Pages: 10, \
             เชื่อมต่อ Line Official/Line My shop ได้ไม่จำกัด, แอดมินดูแล 24 ชม."
        );
    }

    #[test]
    fn thb_formatting_groups_thousands() {
        assert_eq!(format_thb(990), "990");
        assert_eq!(format_thb(1_900), "1,900");
        assert_eq!(format_thb(25_000), "25,000");
        assert_eq!(format_thb(1_234_567), "1,234,567");
    }
}
