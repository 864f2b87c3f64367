//! # Filter/View Engine
//!
//! Pure derivation of the visible pins from the repository sequence, the
//! active criteria and the interaction maps. Steps run in a fixed order:
//! text query, category, quick filter. Category and quick filter are applied
//! independently even when both are set.

use crate::interactions::Interactions;
use crate::models::{FilterCriteria, Pin, QuickFilter};

/// Upper bound on the `recent` shortcut.
pub const RECENT_LIMIT: usize = 24;

/// Returns the visible subset in repository order, except under `recent`,
/// which re-sorts by `created_at` descending (stable) and truncates.
pub fn visible_pins<'a>(
    pins: &'a [Pin],
    criteria: &FilterCriteria,
    interactions: &Interactions,
) -> Vec<&'a Pin> {
    let query = criteria.query.trim().to_lowercase();

    let mut list: Vec<&Pin> = pins
        .iter()
        .filter(|pin| query.is_empty() || matches_query(pin, &query))
        .filter(|pin| criteria.category.as_deref().map_or(true, |cat| pin.cat == cat))
        .collect();

    match criteria.quick {
        Some(QuickFilter::Saved) => list.retain(|pin| interactions.is_saved(&pin.id)),
        Some(QuickFilter::Liked) => list.retain(|pin| interactions.is_liked(&pin.id)),
        Some(QuickFilter::Recent) => {
            list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            list.truncate(RECENT_LIMIT);
        }
        None => {}
    }

    list
}

/// Case-insensitive substring match; `query` must already be lowercase.
fn matches_query(pin: &Pin, query: &str) -> bool {
    pin.title.to_lowercase().contains(query)
        || pin.desc.to_lowercase().contains(query)
        || pin.author.to_lowercase().contains(query)
        || pin.tags.iter().any(|tag| tag.to_lowercase().contains(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LikeEntry;

    fn pin(id: &str, title: &str, cat: &str, created_at: i64) -> Pin {
        Pin {
            id: id.into(),
            src: format!("https://img/{id}"),
            w: 400,
            h: 600,
            title: title.into(),
            desc: String::new(),
            author: "Anónimo".into(),
            cat: cat.into(),
            tags: vec![],
            created_at,
        }
    }

    fn ids(list: &[&Pin]) -> Vec<String> {
        list.iter().map(|p| p.id.clone()).collect()
    }

    fn sample() -> Vec<Pin> {
        let mut tagged = pin("c", "Gamma", "Arte", 30);
        tagged.tags = vec!["Neon".into()];
        let mut described = pin("d", "Delta", "Moda", 10);
        described.desc = "a NEON sign".into();
        vec![pin("a", "Alpha", "Arte", 20), pin("b", "Beta neon", "Cocina", 40), tagged, described]
    }

    #[test]
    fn empty_criteria_return_everything_in_order() {
        let pins = sample();
        let out = visible_pins(&pins, &FilterCriteria::default(), &Interactions::default());
        assert_eq!(ids(&out), ["a", "b", "c", "d"]);
    }

    #[test]
    fn query_is_trimmed_case_insensitive_substring() {
        let pins = sample();
        let criteria = FilterCriteria { query: "  NeOn ".into(), ..Default::default() };
        let out = visible_pins(&pins, &criteria, &Interactions::default());
        assert_eq!(ids(&out), ["b", "c", "d"]);
    }

    #[test]
    fn query_matches_author() {
        let mut pins = sample();
        pins[0].author = "ana@pins.io".into();
        let criteria = FilterCriteria { query: "ANA@".into(), ..Default::default() };
        assert_eq!(ids(&visible_pins(&pins, &criteria, &Interactions::default())), ["a"]);
    }

    #[test]
    fn category_is_exact_and_case_sensitive() {
        let pins = sample();
        let criteria = FilterCriteria { category: Some("Arte".into()), ..Default::default() };
        assert_eq!(ids(&visible_pins(&pins, &criteria, &Interactions::default())), ["a", "c"]);

        let lower = FilterCriteria { category: Some("arte".into()), ..Default::default() };
        assert!(visible_pins(&pins, &lower, &Interactions::default()).is_empty());
    }

    #[test]
    fn saved_and_liked_use_the_interaction_maps() {
        let pins = sample();
        let mut interactions = Interactions::default();
        interactions.saved.insert("b".into(), true);
        interactions.saved.insert("c".into(), false);
        interactions.likes.insert("d".into(), LikeEntry { count: 1 });
        interactions.likes.insert("a".into(), LikeEntry { count: 0 });

        let saved = FilterCriteria { quick: Some(QuickFilter::Saved), ..Default::default() };
        assert_eq!(ids(&visible_pins(&pins, &saved, &interactions)), ["b"]);

        let liked = FilterCriteria { quick: Some(QuickFilter::Liked), ..Default::default() };
        assert_eq!(ids(&visible_pins(&pins, &liked, &interactions)), ["d"]);
    }

    #[test]
    fn recent_sorts_descending_and_caps() {
        let pins: Vec<Pin> = (0..40).map(|i| pin(&format!("p{i}"), "x", "Arte", (i * 7 % 40) as i64)).collect();
        let criteria = FilterCriteria { quick: Some(QuickFilter::Recent), ..Default::default() };
        let out = visible_pins(&pins, &criteria, &Interactions::default());
        assert_eq!(out.len(), RECENT_LIMIT);
        assert!(out.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert_eq!(out[0].created_at, 39);
    }

    #[test]
    fn category_and_quick_filter_both_apply() {
        let pins = sample();
        let criteria = FilterCriteria {
            category: Some("Arte".into()),
            quick: Some(QuickFilter::Recent),
            ..Default::default()
        };
        assert_eq!(ids(&visible_pins(&pins, &criteria, &Interactions::default())), ["c", "a"]);
    }

    #[test]
    fn whitespace_only_query_filters_nothing() {
        let pins = sample();
        let criteria = FilterCriteria { query: "   ".into(), ..Default::default() };
        assert_eq!(visible_pins(&pins, &criteria, &Interactions::default()).len(), 4);
    }
}
