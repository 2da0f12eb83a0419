use std::cmp::Ordering;

use proptest::prelude::*;
use tabler::{Record, SelectionMode, TableViewState};

fn table(weights: &[u8], mode: SelectionMode) -> TableViewState {
    let records = weights
        .iter()
        .enumerate()
        .map(|(idx, w)| Record::new(format!("r{idx}")).with("weight", f64::from(*w)))
        .collect();
    TableViewState::new(records, mode).unwrap()
}

fn ids(state: &TableViewState) -> Vec<String> {
    state.records().iter().map(|r| r.id().to_string()).collect()
}

fn weight(r: &Record) -> f64 {
    r.get("weight").and_then(|v| v.as_number()).unwrap_or_default()
}

fn by_weight(a: &Record, b: &Record) -> Ordering {
    weight(a).total_cmp(&weight(b))
}

proptest! {
    #[test]
    fn second_sort_reverses_the_first(weights in prop::collection::vec(any::<u8>(), 0..24)) {
        let mut state = table(&weights, SelectionMode::Single);
        state.sort_by("weight", by_weight);
        let ascending = state.records().to_vec();
        prop_assert!(ascending.windows(2).all(|w| weight(&w[0]) <= weight(&w[1])));

        state.sort_by("weight", by_weight);
        let descending = state.records().to_vec();
        prop_assert!(descending.windows(2).all(|w| weight(&w[0]) >= weight(&w[1])));

        let mut distinct = weights.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() == weights.len() {
            let mut reversed = ascending.clone();
            reversed.reverse();
            prop_assert_eq!(descending, reversed);
        }
    }

    #[test]
    fn ties_keep_their_relative_order(weights in prop::collection::vec(0u8..4, 0..24)) {
        let mut state = table(&weights, SelectionMode::Single);
        for _ in 0..2 {
            let before = ids(&state);
            state.sort_by("weight", by_weight);
            // Rows with the same weight appear in the order they had before the sort.
            for w in 0u8..4 {
                let rank = |order: &[String]| -> Vec<String> {
                    order
                        .iter()
                        .filter(|id| state.get(id).map(weight) == Some(f64::from(w)))
                        .cloned()
                        .collect()
                };
                prop_assert_eq!(rank(&before), rank(&ids(&state)));
            }
        }
    }

    #[test]
    fn toggle_twice_is_identity(
        weights in prop::collection::vec(any::<u8>(), 1..12),
        preselect in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
        target in 0usize..16,
    ) {
        let mut state = table(&weights, SelectionMode::Multiple);
        for idx in preselect {
            let id = format!("r{}", idx.index(weights.len()));
            if !state.is_selected(&id) {
                state.toggle(&id);
            }
        }
        let before = state.selection().clone();
        // Targets past the end are ids that do not exist.
        let id = format!("r{target}");
        state.toggle(&id);
        state.toggle(&id);
        prop_assert_eq!(state.selection(), &before);
    }

    #[test]
    fn move_back_restores_order(
        weights in prop::collection::vec(any::<u8>(), 1..16),
        from in any::<prop::sample::Index>(),
        to in any::<prop::sample::Index>(),
    ) {
        let mut state = table(&weights, SelectionMode::Single);
        let from = from.index(weights.len());
        let to = to.index(weights.len());
        let original = ids(&state);
        state.move_row(from, to).unwrap();
        prop_assert_eq!(state.records()[to].id(), original[from].as_str());
        state.move_row(to, from).unwrap();
        prop_assert_eq!(ids(&state), original);
    }

    #[test]
    fn removed_rows_are_neither_selected_nor_hovered(
        weights in prop::collection::vec(any::<u8>(), 1..12),
        victim in any::<prop::sample::Index>(),
        multiple in any::<bool>(),
    ) {
        let mode = if multiple { SelectionMode::Multiple } else { SelectionMode::Single };
        let mut state = table(&weights, mode);
        let id = format!("r{}", victim.index(weights.len()));
        state.toggle(&id);
        state.set_hover(Some(&id));
        prop_assert!(state.is_selected(&id));

        state.remove(&id).unwrap();
        prop_assert!(!state.is_selected(&id));
        prop_assert!(!state.is_hovered(&id));
        prop_assert_eq!(state.len(), weights.len() - 1);
    }
}
