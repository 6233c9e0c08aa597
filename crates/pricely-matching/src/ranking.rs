//! Ranks [`ProductGroup`]s and truncates to [`MAX_GROUPS`] (§4.6).
//!
//! Sort key, ascending: `(-query_similarity, -store_count, min_price,
//! min_quantity_value)`. `None` sorts last on both price and quantity.

use std::cmp::Ordering;

use pricely_core::ProductGroup;

/// Hard cap on the number of groups returned to a caller (§4.6).
pub const MAX_GROUPS: usize = 35;

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn cmp_option<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_groups(a: &ProductGroup, b: &ProductGroup) -> Ordering {
    cmp_f64(b.query_similarity, a.query_similarity)
        .then_with(|| b.store_count.cmp(&a.store_count))
        .then_with(|| cmp_option(a.min_price, b.min_price))
        .then_with(|| cmp_option(a.min_quantity_value, b.min_quantity_value))
}

/// Sort `groups` by the ranking key and truncate to [`MAX_GROUPS`].
pub fn rank_and_truncate(mut groups: Vec<ProductGroup>) -> Vec<ProductGroup> {
    groups.sort_by(compare_groups);
    groups.truncate(MAX_GROUPS);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricely_core::{Offer, Platform};

    fn group(query_similarity: f64, store_count: usize, min_price: Option<i64>) -> ProductGroup {
        ProductGroup {
            representative_name: "x".to_string(),
            representative_image: String::new(),
            offers: vec![Offer {
                store: Platform::Bigbasket,
                price: min_price,
                quantity: String::new(),
                url: String::new(),
            }],
            min_price,
            min_quantity_value: None,
            query_similarity,
            store_count,
        }
    }

    #[test]
    fn ranks_by_query_similarity_first() {
        let groups = vec![group(0.5, 2, Some(100)), group(0.9, 1, Some(200))];
        let ranked = rank_and_truncate(groups);
        assert!((ranked[0].query_similarity - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_break_on_store_count_then_price() {
        let groups = vec![group(0.8, 2, Some(300)), group(0.8, 3, Some(100)), group(0.8, 3, Some(50))];
        let ranked = rank_and_truncate(groups);
        assert_eq!(ranked[0].store_count, 3);
        assert_eq!(ranked[0].min_price, Some(50));
        assert_eq!(ranked[2].store_count, 2);
    }

    #[test]
    fn missing_price_sorts_last() {
        let groups = vec![group(0.8, 2, None), group(0.8, 2, Some(10))];
        let ranked = rank_and_truncate(groups);
        assert_eq!(ranked[0].min_price, Some(10));
        assert_eq!(ranked[1].min_price, None);
    }

    #[test]
    fn truncates_to_max_groups() {
        let groups: Vec<ProductGroup> = (0..40).map(|i| group(1.0 - (i as f64) * 0.001, 1, Some(i))).collect();
        let ranked = rank_and_truncate(groups);
        assert_eq!(ranked.len(), MAX_GROUPS);
    }
}
