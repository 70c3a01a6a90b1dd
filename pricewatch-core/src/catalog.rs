//! Mock catalog plus the search / sort / platform-filter operations the
//! comparison views run over it.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MenuItem, Platform, PricingOption, Restaurant};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("At least one platform must be selected")]
    NoPlatformSelected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    PriceLow,
    PriceHigh,
    Rating,
    DeliveryTime,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    pub items: Vec<MenuItem>,
    pub restaurants: Vec<Restaurant>,
}

impl Catalog {
    pub fn demo() -> Self {
        Self {
            items: demo_items(),
            restaurants: demo_restaurants(),
        }
    }
}

// ============================================================================
// Search / sort / filter
// ============================================================================

/// Case-insensitive substring match on name, restaurant and cuisine.
pub fn search_items(items: &[MenuItem], query: &str) -> Vec<MenuItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || item.restaurant.to_lowercase().contains(&needle)
                || item.cuisine.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn search_restaurants(restaurants: &[Restaurant], query: &str) -> Vec<Restaurant> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return restaurants.to_vec();
    }
    restaurants
        .iter()
        .filter(|r| {
            r.name.to_lowercase().contains(&needle)
                || r.cuisines.iter().any(|c| c.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Stable sort. Items without pricing sort last for price and delivery orders.
pub fn sort_items(items: &mut [MenuItem], order: SortOrder) {
    match order {
        SortOrder::PriceLow => items.sort_by(|a, b| cmp_missing_last(a.min_price(), b.min_price())),
        SortOrder::PriceHigh => items.sort_by(|a, b| match (a.min_price(), b.min_price()) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (x, y) => cmp_missing_last(x, y),
        }),
        SortOrder::Rating => items.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortOrder::DeliveryTime => items.sort_by(|a, b| {
            cmp_missing_last(
                a.min_estimated_minutes().map(f64::from),
                b.min_estimated_minutes().map(f64::from),
            )
        }),
    }
}

fn cmp_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Items with at least one pricing entry on an active platform.
pub fn filter_items_by_platforms(
    items: &[MenuItem],
    platforms: &[Platform],
) -> Result<Vec<MenuItem>, CatalogError> {
    if platforms.is_empty() {
        return Err(CatalogError::NoPlatformSelected);
    }
    Ok(items
        .iter()
        .filter(|item| item.offered_on_any(platforms))
        .cloned()
        .collect())
}

pub fn filter_restaurants_by_platforms(
    restaurants: &[Restaurant],
    platforms: &[Platform],
) -> Result<Vec<Restaurant>, CatalogError> {
    if platforms.is_empty() {
        return Err(CatalogError::NoPlatformSelected);
    }
    Ok(restaurants
        .iter()
        .filter(|r| r.listed_on_any(platforms))
        .cloned()
        .collect())
}

/// Items served by the named restaurant.
pub fn items_for_restaurant(items: &[MenuItem], restaurant: &str) -> Vec<MenuItem> {
    items
        .iter()
        .filter(|i| i.restaurant == restaurant)
        .cloned()
        .collect()
}

// ============================================================================
// Demo data
// ============================================================================

fn opt(
    platform: Platform,
    price: f64,
    delivery_fee: f64,
    estimated_minutes: u32,
    discount_code: Option<&str>,
) -> PricingOption {
    PricingOption {
        platform,
        price,
        delivery_fee,
        estimated_minutes,
        discount_code: discount_code.map(str::to_string),
    }
}

fn dish(
    id: &str,
    name: &str,
    restaurant: &str,
    cuisine: &str,
    description: &str,
    rating: f32,
    pricing: Vec<PricingOption>,
) -> MenuItem {
    MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        restaurant: restaurant.to_string(),
        cuisine: cuisine.to_string(),
        description: description.to_string(),
        rating,
        pricing,
    }
}

pub fn demo_items() -> Vec<MenuItem> {
    use Platform::*;
    vec![
        dish(
            "1",
            "Chicken Biryani",
            "Biryani House",
            "Indian",
            "Aromatic basmati rice cooked with tender chicken pieces and authentic spices.",
            4.5,
            vec![
                opt(Swiggy, 12.99, 1.99, 35, Some("FIRST50")),
                opt(Zomato, 13.49, 0.0, 40, None),
                opt(UberEats, 14.99, 2.49, 30, None),
            ],
        ),
        dish(
            "2",
            "Margherita Pizza",
            "Pizza Paradise",
            "Italian",
            "Classic pizza with tomato sauce, mozzarella, fresh basil, salt, and olive oil.",
            4.2,
            vec![
                opt(Swiggy, 10.99, 1.49, 25, None),
                opt(Zomato, 9.99, 1.99, 30, Some("PIZZA10")),
                opt(UberEats, 11.49, 0.0, 35, None),
            ],
        ),
        dish(
            "3",
            "Butter Chicken",
            "Punjab Grill",
            "Indian",
            "Tender chicken in a creamy tomato sauce with butter and aromatic spices.",
            4.7,
            vec![
                opt(Swiggy, 14.99, 1.99, 40, None),
                opt(Zomato, 13.99, 2.49, 35, Some("TASTY15")),
                opt(UberEats, 15.49, 0.0, 45, None),
            ],
        ),
        dish(
            "4",
            "Sushi Platter",
            "Tokyo Bites",
            "Japanese",
            "Assorted fresh sushi including salmon, tuna, and avocado rolls with pickled ginger and wasabi.",
            4.8,
            vec![
                opt(Swiggy, 22.99, 2.99, 45, None),
                opt(Zomato, 24.99, 0.0, 50, Some("SUSHI20")),
                opt(UberEats, 23.49, 3.49, 40, None),
            ],
        ),
        dish(
            "5",
            "Double Cheeseburger",
            "Burger Junction",
            "American",
            "Two juicy beef patties with melted cheese, lettuce, tomato, onions, and special sauce.",
            4.3,
            vec![
                opt(Swiggy, 8.99, 1.49, 25, Some("BURGER5")),
                opt(Zomato, 9.49, 0.99, 30, None),
                opt(UberEats, 8.49, 1.99, 20, None),
            ],
        ),
        dish(
            "6",
            "Pad Thai",
            "Thai Spice",
            "Thai",
            "Stir-fried rice noodles with eggs, tofu, bean sprouts, peanuts, and lime in a sweet-savory sauce.",
            4.4,
            vec![
                opt(Swiggy, 11.99, 1.99, 35, None),
                opt(Zomato, 10.99, 2.49, 40, None),
                opt(UberEats, 12.49, 0.0, 30, Some("THAI10")),
            ],
        ),
    ]
}

pub fn demo_restaurants() -> Vec<Restaurant> {
    use Platform::*;
    let r = |id: &str,
             name: &str,
             cuisines: &[&str],
             rating: f32,
             delivery_minutes: u32,
             distance: &str,
             platforms: Vec<Platform>| Restaurant {
        id: id.to_string(),
        name: name.to_string(),
        cuisines: cuisines.iter().map(|c| c.to_string()).collect(),
        rating,
        delivery_minutes,
        distance: distance.to_string(),
        platforms,
    };
    vec![
        r(
            "1",
            "Biryani House",
            &["Indian", "Mughlai"],
            4.5,
            35,
            "1.2 km",
            vec![Swiggy, Zomato, UberEats],
        ),
        r(
            "2",
            "Pizza Paradise",
            &["Italian", "Fast Food"],
            4.2,
            25,
            "0.8 km",
            vec![Swiggy, Zomato],
        ),
        r(
            "3",
            "Punjab Grill",
            &["Indian", "North Indian"],
            4.7,
            40,
            "1.5 km",
            vec![Swiggy, Zomato, UberEats],
        ),
        r(
            "4",
            "Tokyo Bites",
            &["Japanese", "Sushi"],
            4.8,
            45,
            "2.1 km",
            vec![Zomato, UberEats],
        ),
        r(
            "5",
            "Burger Junction",
            &["American", "Fast Food"],
            4.3,
            25,
            "1.0 km",
            vec![Swiggy, Zomato, UberEats],
        ),
        r(
            "6",
            "Thai Spice",
            &["Thai", "Asian"],
            4.4,
            35,
            "1.8 km",
            vec![Swiggy, UberEats],
        ),
    ]
}
