//! Account profile: owned library, wishlist and order history
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::checkout::Order;
use crate::product::Product;

/// A game the account owns together with its activation key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedGame {
    pub product_id: u32,
    pub platform: String,
    pub key: String,
    pub order_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    #[serde(default = "enabled")]
    pub wishlist_sales: bool,
    #[serde(default = "enabled")]
    pub order_confirmations: bool,
}

const fn enabled() -> bool {
    true
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            wishlist_sales: true,
            order_confirmations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub joined: NaiveDate,
    #[serde(default)]
    pub library: Vec<OwnedGame>,
    #[serde(default)]
    pub wishlist: Vec<u32>,
    /// Newest first
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub notifications: NotificationPrefs,
}

impl Profile {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>, joined: NaiveDate) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            joined,
            library: Vec::new(),
            wishlist: Vec::new(),
            orders: Vec::new(),
            notifications: NotificationPrefs::default(),
        }
    }

    /// Add the order's games to the library and put the order at the top of
    /// the history. Games bought here leave the wishlist. A product already
    /// owned keeps its first key.
    pub fn record_order(&mut self, order: &Order) {
        for line in &order.lines {
            if !self.owns(line.product_id) {
                self.library.push(OwnedGame {
                    product_id: line.product_id,
                    platform: line.platform.clone(),
                    key: line.key.clone(),
                    order_id: order.id.clone(),
                });
            }
            self.wishlist.retain(|id| *id != line.product_id);
        }
        self.orders.insert(0, order.clone());
        log::debug!(
            "profile {} recorded {}: {} owned",
            self.email,
            order.id,
            self.library.len()
        );
    }

    #[must_use]
    pub fn owns(&self, product_id: u32) -> bool {
        self.library.iter().any(|g| g.product_id == product_id)
    }

    #[must_use]
    pub fn key_for(&self, product_id: u32) -> Option<&str> {
        self.library
            .iter()
            .find(|g| g.product_id == product_id)
            .map(|g| g.key.as_str())
    }

    /// Owned games joined with the catalog, in purchase order.
    #[must_use]
    pub fn library<'a>(&self, catalog: &'a Catalog) -> Vec<(&'a Product, &str)> {
        self.library
            .iter()
            .filter_map(|g| catalog.get(g.product_id).map(|p| (p, g.key.as_str())))
            .collect()
    }

    #[must_use]
    pub fn wishlist_items<'a>(&self, catalog: &'a Catalog) -> Vec<&'a Product> {
        self.wishlist
            .iter()
            .filter_map(|id| catalog.get(*id))
            .collect()
    }

    /// Add or remove a product. Returns whether it is now wishlisted.
    pub fn toggle_wishlist(&mut self, product_id: u32) -> bool {
        if let Some(pos) = self.wishlist.iter().position(|id| *id == product_id) {
            self.wishlist.remove(pos);
            false
        } else {
            self.wishlist.push(product_id);
            true
        }
    }

    #[must_use]
    pub fn total_spent_cents(&self) -> i64 {
        self.orders.iter().map(Order::total_cents).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartSummary;
    use crate::checkout::{OrderLine, OrderStatus};

    fn profile() -> Profile {
        Profile::new(
            "Alex Johnson",
            "alex.johnson@example.com",
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
        )
    }

    fn order(id: &str, products: &[(u32, &str)], total_cents: i64) -> Order {
        Order {
            id: id.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            email: "alex.johnson@example.com".to_string(),
            lines: products
                .iter()
                .map(|(product_id, key)| OrderLine {
                    product_id: *product_id,
                    title: format!("Game {product_id}"),
                    platform: "Steam".to_string(),
                    price_cents: 0,
                    key: (*key).to_string(),
                })
                .collect(),
            summary: CartSummary {
                total_cents,
                ..CartSummary::default()
            },
            payment_reference: "mock".to_string(),
            status: OrderStatus::Completed,
        }
    }

    #[test]
    fn record_order_fills_library_and_history() {
        let mut p = profile();
        p.toggle_wishlist(1);
        p.toggle_wishlist(2);
        p.record_order(&order("ORD-2356198", &[(3, "AAAAA-AAAAA-AAAAA")], 2599));
        p.record_order(&order(
            "ORD-2458613",
            &[(1, "BBBBB-BBBBB-BBBBB"), (3, "CCCCC-CCCCC-CCCCC")],
            8998,
        ));

        assert!(p.owns(1));
        assert!(p.owns(3));
        assert!(!p.owns(2));
        assert_eq!(p.key_for(3), Some("AAAAA-AAAAA-AAAAA"));
        assert_eq!(p.key_for(2), None);
        assert_eq!(p.library.len(), 2);
        assert_eq!(p.orders[0].id, "ORD-2458613");
        assert_eq!(p.wishlist, vec![2]);
        assert_eq!(p.total_spent_cents(), 2599 + 8998);
    }

    #[test]
    fn joins_with_catalog() {
        let catalog = Catalog::load_from_static();
        let mut p = profile();
        p.record_order(&order("ORD-1", &[(7, "K"), (404, "LOST")], 0));
        for id in [2, 5, 8, 10] {
            p.toggle_wishlist(id);
        }
        let library = p.library(catalog);
        assert_eq!(library.len(), 1);
        assert_eq!(library[0].0.title, "The Elder Scrolls V: Skyrim Special Edition");
        assert_eq!(library[0].1, "K");
        let wishlist: Vec<u32> = p.wishlist_items(catalog).iter().map(|g| g.id).collect();
        assert_eq!(wishlist, vec![2, 5, 8, 10]);
    }

    #[test]
    fn toggle_wishlist_round_trips() {
        let mut p = profile();
        assert!(p.toggle_wishlist(5));
        assert!(!p.toggle_wishlist(5));
        assert!(p.wishlist.is_empty());
    }

    #[test]
    fn notifications_default_on() {
        let p: Profile = serde_json::from_str(
            r#"{"name":"A","email":"a@b.co","joined":"2023-03-01"}"#,
        )
        .unwrap();
        assert_eq!(p.notifications, NotificationPrefs::default());
        assert!(p.notifications.wishlist_sales);
    }
}
