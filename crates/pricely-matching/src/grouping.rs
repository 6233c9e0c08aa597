//! Single-pass grouping of listings into candidate [`ProductGroup`]s (§4.6).
//!
//! A listing joins the first still-open group whose representative it is
//! close enough to on three independent axes: price, quantity, and name.
//! Within a group, no two listings share a platform — §8's "offers come
//! from distinct platforms" invariant, which the grouping rule alone
//! doesn't guarantee since two distinct products from the same store can
//! coincidentally land inside the same price/quantity/name window.

use pricely_core::quantity::{price_close, quantity_similar};
use pricely_core::{ParsedQuantity, ProductListing};

/// Symmetric relative price tolerance (§4.6).
pub const PRICE_TOLERANCE: f64 = 0.20;
/// Relative quantity tolerance within the same canonical unit (§4.6).
pub const QUANTITY_TOLERANCE: f64 = 0.10;

/// Group listing indices using `name_sim(i, j)` as the name-similarity axis.
/// Returns one `Vec<usize>` per group, in first-seen order.
pub fn group_indices(
    listings: &[ProductListing],
    quantities: &[Option<ParsedQuantity>],
    name_sim: impl Fn(usize, usize) -> f64,
    threshold: f64,
) -> Vec<Vec<usize>> {
    let n = listings.len();
    let mut seen = vec![false; n];
    let mut groups = Vec::new();

    for i in 0..n {
        if seen[i] {
            continue;
        }
        seen[i] = true;
        let mut group = vec![i];
        let mut platforms_in_group = vec![listings[i].platform];

        for j in (i + 1)..n {
            if seen[j] {
                continue;
            }
            if platforms_in_group.contains(&listings[j].platform) {
                continue;
            }
            let close = price_close(listings[i].price_minor, listings[j].price_minor, PRICE_TOLERANCE)
                && quantity_similar(quantities[i], quantities[j], QUANTITY_TOLERANCE)
                && name_sim(i, j) >= threshold;
            if close {
                seen[j] = true;
                platforms_in_group.push(listings[j].platform);
                group.push(j);
            }
        }

        groups.push(group);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricely_core::{CanonicalUnit, Platform};

    fn listing(platform: Platform, name: &str, price: i64) -> ProductListing {
        ProductListing {
            platform,
            name: name.to_string(),
            price_minor: Some(price),
            image_url: String::new(),
            product_url: String::new(),
            raw_quantity: String::new(),
        }
    }

    fn qty(value: f64) -> Option<ParsedQuantity> {
        Some(ParsedQuantity { value, unit: CanonicalUnit::G })
    }

    #[test]
    fn groups_matching_listings_across_distinct_platforms() {
        let listings = vec![
            listing(Platform::Bigbasket, "Aashirvaad Atta 5kg", 250),
            listing(Platform::Blinkit, "Aashirvaad Atta 5kg", 255),
            listing(Platform::Zepto, "Tata Salt 1kg", 28),
        ];
        let quantities = vec![qty(5000.0), qty(5000.0), qty(1000.0)];
        let groups = group_indices(&listings, &quantities, |_, _| 1.0, 0.90);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], vec![0, 1]);
        assert_eq!(groups[1], vec![2]);
    }

    #[test]
    fn never_merges_two_listings_from_the_same_platform() {
        let listings = vec![
            listing(Platform::Bigbasket, "Aashirvaad Atta 5kg", 250),
            listing(Platform::Bigbasket, "Aashirvaad Atta 5kg (combo)", 251),
        ];
        let quantities = vec![qty(5000.0), qty(5000.0)];
        let groups = group_indices(&listings, &quantities, |_, _| 1.0, 0.90);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn price_outside_tolerance_splits_the_group() {
        let listings = vec![
            listing(Platform::Bigbasket, "Aashirvaad Atta 5kg", 100),
            listing(Platform::Blinkit, "Aashirvaad Atta 5kg", 200),
        ];
        let quantities = vec![qty(5000.0), qty(5000.0)];
        let groups = group_indices(&listings, &quantities, |_, _| 1.0, 0.90);
        assert_eq!(groups.len(), 2);
    }
}
