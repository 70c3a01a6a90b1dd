use crate::models::{MenuItem, Session};

/// Pricing entries the caller may see.
///
/// No session, or a logged-out one, sees everything. A logged-in session sees
/// only connected platforms, and items with nothing left to show are dropped.
pub fn visible(items: &[MenuItem], session: Option<&Session>) -> Vec<MenuItem> {
    let session = match session {
        Some(s) if s.logged_in => s,
        _ => return items.to_vec(),
    };

    items
        .iter()
        .filter_map(|item| {
            let pricing: Vec<_> = item
                .pricing
                .iter()
                .filter(|o| session.is_connected(o.platform))
                .cloned()
                .collect();
            if pricing.is_empty() {
                None
            } else {
                Some(MenuItem {
                    pricing,
                    ..item.clone()
                })
            }
        })
        .collect()
}
