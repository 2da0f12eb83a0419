//! The table view state: which rows exist, their order, and the sort,
//! selection and hover overlays a rendering layer draws on top of them.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use tracing::trace;

use crate::display::{DisplayOptions, Emphasis, RowStyleHint, SelectionMode};
use crate::domain::TableError;
use crate::record::{ID_FIELD, Record, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    /// `None` means insertion order.
    pub key: Option<String>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: None,
            ascending: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortIndicator {
    None,
    Ascending,
    Descending,
}

impl SortIndicator {
    /// Glyph for a column header.
    pub fn glyph(&self) -> &'static str {
        match self {
            SortIndicator::None => "",
            SortIndicator::Ascending => "▲",
            SortIndicator::Descending => "▼",
        }
    }
}

/// Selected ids. Ids are weak references into the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Single(Option<String>),
    Multiple(BTreeSet<String>),
}

impl Selection {
    pub fn empty(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::Single => Selection::Single(None),
            SelectionMode::Multiple => Selection::Multiple(BTreeSet::new()),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        match self {
            Selection::Single(_) => SelectionMode::Single,
            Selection::Multiple(_) => SelectionMode::Multiple,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        match self {
            Selection::Single(current) => current.as_deref() == Some(id),
            Selection::Multiple(set) => set.contains(id),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Selection::Single(current) => usize::from(current.is_some()),
            Selection::Multiple(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge(&mut self, id: &str) -> bool {
        match self {
            Selection::Single(current) if current.as_deref() == Some(id) => {
                *current = None;
                true
            }
            Selection::Single(_) => false,
            Selection::Multiple(set) => set.remove(id),
        }
    }
}

/// Emitted to listeners after every state change.
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    Sorted { key: String, ascending: bool },
    OrderReset,
    Selection,
    SelectionMode(SelectionMode),
    Hover(Option<String>),
    Moved { from: usize, to: usize },
    FieldUpdated { id: String, field: String },
    Inserted(String),
    Removed(String),
}

type Listener = Box<dyn FnMut(&StateChange)>;

pub struct TableViewState {
    records: Vec<Record>,
    // Insertion sequence per id, used to restore the default order.
    sequence: HashMap<String, u64>,
    next_sequence: u64,
    sort: SortState,
    selection: Selection,
    hovered: Option<String>,
    revision: u64,
    listeners: Vec<Listener>,
}

impl fmt::Debug for TableViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableViewState")
            .field("records", &self.records.len())
            .field("sort", &self.sort)
            .field("selection", &self.selection)
            .field("hovered", &self.hovered)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl TableViewState {
    pub fn new(records: Vec<Record>, mode: SelectionMode) -> Result<Self, TableError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in records.iter() {
            if !seen.insert(record.id()) {
                return Err(TableError::DuplicateId(record.id().to_string()));
            }
        }
        let sequence = records
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.id().to_string(), idx as u64))
            .collect();
        Ok(Self {
            next_sequence: records.len() as u64,
            records,
            sequence,
            sort: SortState::default(),
            selection: Selection::empty(mode),
            hovered: None,
            revision: 0,
            listeners: Vec::new(),
        })
    }

    // -------------------- Read access ---------------------- //

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Increases by one with every change. Renderers can compare it to
    /// decide whether to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn sort_indicator(&self, field: &str) -> SortIndicator {
        match &self.sort.key {
            Some(key) if key == field => {
                if self.sort.ascending {
                    SortIndicator::Ascending
                } else {
                    SortIndicator::Descending
                }
            }
            _ => SortIndicator::None,
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    /// Selected ids in collection order.
    pub fn selected_ids(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.id())
            .filter(|id| self.selection.contains(id))
            .collect()
    }

    pub fn is_hovered(&self, id: &str) -> bool {
        self.hovered.as_deref() == Some(id)
    }

    pub fn row_style_hint(&self, id: &str, options: &DisplayOptions) -> RowStyleHint {
        let Some(record) = self.get(id) else {
            return RowStyleHint::default();
        };
        let selected = self.is_selected(id);
        let background = if selected {
            Emphasis::Strong
        } else if self.is_hovered(id) {
            Emphasis::Subtle
        } else {
            Emphasis::None
        };
        let tint = if options.colorize {
            record
                .get(&options.tint_field)
                .and_then(|v| v.as_color())
        } else {
            None
        };
        RowStyleHint {
            background,
            border: selected && options.colorize,
            tint,
        }
    }

    // -------------------- Change notification ---------------------- //

    pub fn subscribe(&mut self, listener: impl FnMut(&StateChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self, change: StateChange) {
        self.revision += 1;
        trace!("State change #{}: {:?}", self.revision, change);
        for listener in self.listeners.iter_mut() {
            listener(&change);
        }
    }

    // -------------------- Sorting ---------------------- //

    /// Sorts by `field` using `compare`. Sorting the active field again flips
    /// the direction. The sort is stable in both directions.
    pub fn sort_by<F>(&mut self, field: &str, mut compare: F)
    where
        F: FnMut(&Record, &Record) -> Ordering,
    {
        if self.sort.key.as_deref() == Some(field) {
            self.sort.ascending = !self.sort.ascending;
        } else {
            self.sort.key = Some(field.to_string());
            self.sort.ascending = true;
        }

        let ascending = self.sort.ascending;
        self.records.sort_by(|a, b| {
            let ord = compare(a, b);
            if ascending { ord } else { ord.reverse() }
        });

        self.notify(StateChange::Sorted {
            key: field.to_string(),
            ascending,
        });
    }

    /// Sorts by the natural order of the field values.
    pub fn sort_by_field(&mut self, field: &str) {
        let key = field.to_string();
        self.sort_by(field, |a, b| a.cmp_field(b, &key));
    }

    /// Restores insertion order and clears the sort state.
    pub fn reset_order(&mut self) {
        let sequence = &self.sequence;
        let rank = |r: &Record| sequence.get(r.id()).copied().unwrap_or(u64::MAX);
        if self.sort.key.is_none() && self.records.is_sorted_by_key(rank) {
            return;
        }
        self.records.sort_by_key(rank);
        self.sort = SortState::default();
        self.notify(StateChange::OrderReset);
    }

    // -------------------- Selection and hover ---------------------- //

    /// Selects `id`. Selecting the selected row again deselects it. In
    /// multiple mode the selection is replaced by `id` alone. Unknown ids are
    /// ignored.
    pub fn select(&mut self, id: &str) {
        if !self.contains(id) {
            trace!("Ignoring select of unknown id {id}");
            return;
        }
        match &mut self.selection {
            Selection::Single(current) => {
                if current.as_deref() == Some(id) {
                    *current = None;
                } else {
                    *current = Some(id.to_string());
                }
            }
            Selection::Multiple(set) => {
                if set.len() == 1 && set.contains(id) {
                    return;
                }
                set.clear();
                set.insert(id.to_string());
            }
        }
        self.notify(StateChange::Selection);
    }

    /// Adds or removes `id` from a multiple selection. In single mode this is
    /// `select`. Unknown ids are ignored.
    pub fn toggle(&mut self, id: &str) {
        if !self.contains(id) {
            trace!("Ignoring toggle of unknown id {id}");
            return;
        }
        if self.selection.mode() == SelectionMode::Single {
            self.select(id);
            return;
        }
        if let Selection::Multiple(set) = &mut self.selection
            && !set.remove(id)
        {
            set.insert(id.to_string());
        }
        self.notify(StateChange::Selection);
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.selection = Selection::empty(self.selection.mode());
        self.notify(StateChange::Selection);
    }

    /// Switches selection cardinality, keeping what fits in the new mode.
    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        if self.selection.mode() == mode {
            return;
        }
        let selected: Vec<String> = self.selected_ids().into_iter().map(String::from).collect();
        self.selection = match mode {
            SelectionMode::Single => Selection::Single(selected.into_iter().next()),
            SelectionMode::Multiple => Selection::Multiple(selected.into_iter().collect()),
        };
        self.notify(StateChange::SelectionMode(mode));
    }

    /// Sets the hovered row. `None` or an unknown id clears it.
    pub fn set_hover(&mut self, id: Option<&str>) {
        let hovered = id.filter(|id| self.contains(id)).map(String::from);
        if hovered == self.hovered {
            return;
        }
        self.hovered = hovered;
        self.notify(StateChange::Hover(self.hovered.clone()));
    }

    // -------------------- Collection mutation ---------------------- //

    /// Moves the record at `from` so it ends up at `to`, counted after the
    /// record was taken out. `to == len` moves it to the end. Clears the sort.
    pub fn move_row(&mut self, from: usize, to: usize) -> Result<(), TableError> {
        let len = self.records.len();
        if from >= len {
            return Err(TableError::IndexOutOfRange { index: from, len });
        }
        if to > len {
            return Err(TableError::IndexOutOfRange { index: to, len });
        }

        let record = self.records.remove(from);
        let dest = std::cmp::min(to, self.records.len());
        self.records.insert(dest, record);
        self.sort = SortState::default();

        self.notify(StateChange::Moved { from, to: dest });
        Ok(())
    }

    /// Sets one field of a record. Order and selection are not affected.
    pub fn update_field(
        &mut self,
        id: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), TableError> {
        if field == ID_FIELD {
            return Err(TableError::ImmutableField(field.to_string()));
        }
        let idx = self
            .position(id)
            .ok_or_else(|| TableError::NotFound(id.to_string()))?;
        self.records[idx].set(field, value.into());

        self.notify(StateChange::FieldUpdated {
            id: id.to_string(),
            field: field.to_string(),
        });
        Ok(())
    }

    /// Appends a record.
    pub fn insert(&mut self, record: Record) -> Result<(), TableError> {
        if self.contains(record.id()) {
            return Err(TableError::DuplicateId(record.id().to_string()));
        }
        let id = record.id().to_string();
        self.sequence.insert(id.clone(), self.next_sequence);
        self.next_sequence += 1;
        self.records.push(record);

        self.notify(StateChange::Inserted(id));
        Ok(())
    }

    /// Removes a record and drops it from the selection and hover.
    pub fn remove(&mut self, id: &str) -> Result<Record, TableError> {
        let idx = self
            .position(id)
            .ok_or_else(|| TableError::NotFound(id.to_string()))?;
        let record = self.records.remove(idx);
        self.sequence.remove(id);
        self.selection.purge(id);
        if self.is_hovered(id) {
            self.hovered = None;
        }

        self.notify(StateChange::Removed(id.to_string()));
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::record::ColorTag;

    fn fruit(id: &str, name: &str, weight: f64, color: ColorTag) -> Record {
        Record::new(id)
            .with("name", name)
            .with("weight", weight)
            .with("color", color)
    }

    fn three_fruits(mode: SelectionMode) -> TableViewState {
        TableViewState::new(
            vec![
                fruit("🍌", "Banana", 118.0, ColorTag::Brown),
                fruit("🍓", "Strawberry", 12.0, ColorTag::Red),
                fruit("🍊", "Orange", 190.0, ColorTag::Orange),
            ],
            mode,
        )
        .unwrap()
    }

    fn names(state: &TableViewState) -> Vec<String> {
        state
            .records()
            .iter()
            .map(|r| r.get("name").unwrap().to_string())
            .collect()
    }

    fn by_weight(a: &Record, b: &Record) -> Ordering {
        let wa = a.get("weight").and_then(|v| v.as_number()).unwrap();
        let wb = b.get("weight").and_then(|v| v.as_number()).unwrap();
        wa.total_cmp(&wb)
    }

    #[test]
    fn sorting_the_same_field_twice_flips_direction() {
        let mut state = three_fruits(SelectionMode::Single);
        assert_eq!(state.sort_indicator("weight"), SortIndicator::None);

        state.sort_by("weight", by_weight);
        assert_eq!(names(&state), ["Strawberry", "Banana", "Orange"]);
        assert_eq!(state.sort_indicator("weight"), SortIndicator::Ascending);

        state.sort_by("weight", by_weight);
        assert_eq!(names(&state), ["Orange", "Banana", "Strawberry"]);
        assert_eq!(state.sort_indicator("weight"), SortIndicator::Descending);
        assert_eq!(state.sort_indicator("name"), SortIndicator::None);
    }

    #[test]
    fn sorting_a_new_field_starts_ascending() {
        let mut state = three_fruits(SelectionMode::Single);
        state.sort_by_field("weight");
        state.sort_by_field("weight");
        state.sort_by_field("name");
        assert_eq!(state.sort_state().key.as_deref(), Some("name"));
        assert!(state.sort_state().ascending);
        assert_eq!(names(&state), ["Banana", "Orange", "Strawberry"]);
    }

    #[test]
    fn sort_keeps_ties_in_place_both_ways() {
        let mut state = TableViewState::new(
            vec![
                Record::new("a").with("w", 1.0),
                Record::new("b").with("w", 2.0),
                Record::new("c").with("w", 1.0),
            ],
            SelectionMode::Single,
        )
        .unwrap();
        state.sort_by_field("w");
        let ids: Vec<_> = state.records().iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
        state.sort_by_field("w");
        let ids: Vec<_> = state.records().iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn sorting_empty_table_only_updates_state() {
        let mut state = TableViewState::new(Vec::new(), SelectionMode::Single).unwrap();
        state.sort_by_field("weight");
        assert!(state.is_empty());
        assert_eq!(state.sort_indicator("weight"), SortIndicator::Ascending);
    }

    #[test]
    fn reset_order_restores_insertion_order() {
        let mut state = three_fruits(SelectionMode::Single);
        state.sort_by_field("weight");
        state.insert(fruit("🥝", "Kiwi", 75.0, ColorTag::Green)).unwrap();
        state.reset_order();
        assert_eq!(names(&state), ["Banana", "Strawberry", "Orange", "Kiwi"]);
        assert_eq!(state.sort_state(), &SortState::default());
    }

    #[test]
    fn multiple_selection_toggles() {
        let mut state = three_fruits(SelectionMode::Multiple);
        state.toggle("🍌");
        assert_eq!(state.selected_ids(), ["🍌"]);
        state.toggle("🍓");
        assert_eq!(state.selected_ids(), ["🍌", "🍓"]);
        state.toggle("🍌");
        assert_eq!(state.selected_ids(), ["🍓"]);
        assert!(!state.is_selected("🍌"));
        assert!(state.is_selected("🍓"));
    }

    #[test]
    fn single_selection_replaces_and_reselect_deselects() {
        let mut state = three_fruits(SelectionMode::Single);
        state.select("🍌");
        state.select("🍓");
        assert_eq!(state.selection(), &Selection::Single(Some("🍓".into())));
        state.select("🍓");
        assert_eq!(state.selection(), &Selection::Single(None));
    }

    #[test]
    fn selecting_unknown_ids_is_a_no_op() {
        let mut state = three_fruits(SelectionMode::Multiple);
        let revision = state.revision();
        state.select("🍍");
        state.toggle("🍍");
        assert!(state.selection().is_empty());
        assert_eq!(state.revision(), revision);
    }

    #[test]
    fn select_in_multiple_mode_replaces_set() {
        let mut state = three_fruits(SelectionMode::Multiple);
        state.toggle("🍌");
        state.toggle("🍓");
        state.select("🍊");
        assert_eq!(state.selected_ids(), ["🍊"]);
    }

    #[test]
    fn switching_modes_converts_selection() {
        let mut state = three_fruits(SelectionMode::Multiple);
        state.toggle("🍊");
        state.toggle("🍓");
        state.set_selection_mode(SelectionMode::Single);
        // First selected in collection order
        assert_eq!(state.selection(), &Selection::Single(Some("🍓".into())));
        state.set_selection_mode(SelectionMode::Multiple);
        assert_eq!(state.selected_ids(), ["🍓"]);
    }

    #[test]
    fn hover_follows_last_writer_and_ignores_unknown_ids() {
        let mut state = three_fruits(SelectionMode::Single);
        state.set_hover(Some("🍌"));
        state.set_hover(Some("🍓"));
        assert!(state.is_hovered("🍓"));
        assert!(!state.is_hovered("🍌"));
        state.set_hover(Some("🍍"));
        assert_eq!(state.hovered(), None);
        state.set_hover(Some("🍓"));
        state.set_hover(None);
        assert_eq!(state.hovered(), None);
    }

    #[test]
    fn move_uses_post_removal_indices() {
        let mut state = TableViewState::new(
            vec![Record::new("A"), Record::new("B"), Record::new("C")],
            SelectionMode::Single,
        )
        .unwrap();
        let ids = |s: &TableViewState| {
            s.records()
                .iter()
                .map(|r| r.id().to_string())
                .collect::<Vec<_>>()
        };

        state.move_row(0, 2).unwrap();
        assert_eq!(ids(&state), ["B", "C", "A"]);
        state.move_row(2, 0).unwrap();
        assert_eq!(ids(&state), ["A", "B", "C"]);
        state.move_row(2, 0).unwrap();
        assert_eq!(ids(&state), ["C", "A", "B"]);
        state.move_row(0, 3).unwrap();
        assert_eq!(ids(&state), ["A", "B", "C"]);
    }

    #[test]
    fn move_out_of_range_leaves_state_unchanged() {
        let mut state = three_fruits(SelectionMode::Single);
        state.sort_by_field("name");
        let before = names(&state);
        assert_eq!(
            state.move_row(3, 0),
            Err(TableError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            state.move_row(0, 4),
            Err(TableError::IndexOutOfRange { index: 4, len: 3 })
        );
        assert_eq!(names(&state), before);
        assert_eq!(state.sort_indicator("name"), SortIndicator::Ascending);
    }

    #[test]
    fn move_clears_sort() {
        let mut state = three_fruits(SelectionMode::Single);
        state.sort_by_field("weight");
        state.move_row(0, 1).unwrap();
        assert_eq!(state.sort_state().key, None);
        assert_eq!(state.sort_indicator("weight"), SortIndicator::None);
    }

    #[test]
    fn update_field_changes_only_the_value() {
        let mut state = three_fruits(SelectionMode::Single);
        state.select("🍌");
        state.update_field("🍌", "name", "Plantain").unwrap();
        assert_eq!(names(&state), ["Plantain", "Strawberry", "Orange"]);
        assert!(state.is_selected("🍌"));
        assert_eq!(
            state.update_field("missing", "name", "x"),
            Err(TableError::NotFound("missing".into()))
        );
        assert_eq!(
            state.update_field("🍌", "id", "🍍"),
            Err(TableError::ImmutableField("id".into()))
        );
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut state = three_fruits(SelectionMode::Single);
        let err = state.insert(Record::new("🍌")).unwrap_err();
        assert_eq!(err, TableError::DuplicateId("🍌".into()));
        assert_eq!(state.len(), 3);
        assert!(TableViewState::new(
            vec![Record::new("x"), Record::new("x")],
            SelectionMode::Single
        )
        .is_err());
    }

    #[test]
    fn remove_purges_selection_and_hover() {
        let mut state = three_fruits(SelectionMode::Multiple);
        state.toggle("🍌");
        state.toggle("🍓");
        state.set_hover(Some("🍌"));
        let removed = state.remove("🍌").unwrap();
        assert_eq!(removed.id(), "🍌");
        assert!(!state.is_selected("🍌"));
        assert!(!state.is_hovered("🍌"));
        assert_eq!(state.selected_ids(), ["🍓"]);
        assert_eq!(
            state.remove("🍌").unwrap_err(),
            TableError::NotFound("🍌".into())
        );
    }

    #[test]
    fn row_style_hint_combines_selection_hover_and_colorize() {
        let mut state = three_fruits(SelectionMode::Single);
        let plain = DisplayOptions::default();
        let colorized = DisplayOptions::default().colorize(true);

        state.select("🍌");
        state.set_hover(Some("🍓"));

        let hint = state.row_style_hint("🍌", &plain);
        assert_eq!(hint.background, Emphasis::Strong);
        assert!(!hint.border);
        assert_eq!(hint.tint, None);

        let hint = state.row_style_hint("🍌", &colorized);
        assert!(hint.border);
        assert_eq!(hint.tint, Some(ColorTag::Brown));

        let hint = state.row_style_hint("🍓", &colorized);
        assert_eq!(hint.background, Emphasis::Subtle);
        assert!(!hint.border);
        assert_eq!(hint.tint, Some(ColorTag::Red));

        assert_eq!(state.row_style_hint("🍊", &plain), RowStyleHint::default());
        assert_eq!(state.row_style_hint("🍍", &colorized), RowStyleHint::default());
    }

    #[test]
    fn listeners_see_every_change_but_not_failures() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut state = three_fruits(SelectionMode::Single);
        let sink = Rc::clone(&seen);
        state.subscribe(move |change| sink.borrow_mut().push(change.clone()));

        state.reset_order();
        state.set_hover(Some("🍍"));
        state.sort_by_field("weight");
        state.select("🍊");
        let _ = state.move_row(9, 0);
        let _ = state.update_field("missing", "name", "x");
        state.remove("🍊").unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![
                StateChange::Sorted {
                    key: "weight".into(),
                    ascending: true
                },
                StateChange::Selection,
                StateChange::Removed("🍊".into()),
            ]
        );
        assert_eq!(state.revision(), 3);
    }
}
