use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use ratatui::text::Span;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::display::{DisplayOptions, Layout, SelectionMode};
use crate::domain::{EditTarget, HELP_TEXT, Message, TVConfig, TVError};
use crate::inputter::{InputResult, Inputter};
use crate::loader;
use crate::record::{Column, ID_FIELD, Record};
use crate::sample;
use crate::state::TableViewState;
use crate::ui::{
    BORDER_WIDTH, COLUMN_WIDTH_MARGIN, HIGHLIGHT_SYMBOL, MAX_COLUMN_WIDTH, STATUSLINE_HEIGHT,
};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    EDIT,
    POPUP,
}

/// Screen geometry of the last frame, used for drawing and mouse hit tests.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub header_y: Option<usize>,
    pub rows_y: usize,
    pub table_height: usize,
    pub footer_y: Option<usize>,
    pub statusline_y: usize,
    pub symbol_width: usize,
    pub column_spacing: usize,
    pub columns: Vec<(usize, usize)>, // x and width of each column
}

impl UILayout {
    pub fn from_model(model: &Model, ui_width: usize, ui_height: usize) -> Self {
        let content_widths = model
            .columns
            .iter()
            .map(|c| Self::content_width(c, model.state.records()))
            .collect::<Vec<usize>>();
        UILayout::from_values(&content_widths, &model.config.display, ui_width, ui_height)
    }

    pub fn from_values(
        content_widths: &[usize],
        display: &DisplayOptions,
        ui_width: usize,
        ui_height: usize,
    ) -> Self {
        let inner_width = ui_width.saturating_sub(2 * BORDER_WIDTH);
        let inner_height = ui_height.saturating_sub(STATUSLINE_HEIGHT + 2 * BORDER_WIDTH);
        let header_height = usize::from(display.headerize);
        let footer_height = usize::from(display.footerize);
        let table_height = inner_height.saturating_sub(header_height + footer_height);

        let (symbol_width, column_spacing) = match display.layout {
            Layout::List => (Span::raw(HIGHLIGHT_SYMBOL).width(), 1),
            Layout::Stack => (0, 0),
            Layout::Grid => (0, 1),
        };

        let ncols = content_widths.len();
        let widths: Vec<usize> = match display.layout {
            Layout::Grid if ncols > 0 => {
                let spacing = column_spacing * (ncols - 1);
                let cell = inner_width.saturating_sub(spacing) / ncols;
                vec![cell; ncols]
            }
            _ => content_widths.to_vec(),
        };

        let mut x = BORDER_WIDTH + symbol_width;
        let mut columns = Vec::with_capacity(ncols);
        for w in widths {
            columns.push((x, w));
            x += w + column_spacing;
        }

        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            header_y: display.headerize.then_some(BORDER_WIDTH),
            rows_y: BORDER_WIDTH + header_height,
            table_height,
            footer_y: display
                .footerize
                .then_some(BORDER_WIDTH + header_height + table_height),
            statusline_y: ui_height.saturating_sub(STATUSLINE_HEIGHT),
            symbol_width,
            column_spacing,
            columns,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }

    fn content_width(column: &Column, records: &[Record]) -> usize {
        let title = Span::raw(column.title.as_str()).width() + 2; // room for the sort glyph
        let cells = records
            .iter()
            .map(|r| Span::raw(column.format(r)).width())
            .max()
            .unwrap_or(0);
        let width = std::cmp::max(title, cells) + COLUMN_WIDTH_MARGIN;
        std::cmp::min(width, MAX_COLUMN_WIDTH)
    }

    /// Index of the column under screen column `x`.
    pub fn column_at(&self, x: usize) -> Option<usize> {
        self.columns
            .iter()
            .position(|&(cx, w)| x >= cx && x < cx + w)
    }

    /// Visible row slot under screen row `y`.
    pub fn row_slot_at(&self, y: usize) -> Option<usize> {
        if y >= self.rows_y && y < self.rows_y + self.table_height {
            Some(y - self.rows_y)
        } else {
            None
        }
    }
}

pub struct Model {
    config: TVConfig,
    pub status: Status,
    name: String,
    state: TableViewState,
    columns: Vec<Column>,
    modus: Modus,
    previous_modus: Modus,
    cursor_row: usize, // Index into the records
    cursor_column: usize,
    offset_row: usize,
    uilayout: UILayout,
    clipboard: Option<Clipboard>,
    input: Inputter,
    last_input: InputResult,
    edit_target: Option<EditTarget>,
    pointer: Option<(usize, usize)>, // last mouse position
    popup_message: Option<String>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &TVConfig, ui_width: usize, ui_height: usize) -> Result<Self, TVError> {
        let (name, records, columns) = match &config.data_file {
            Some(path) => {
                let table = loader::load_records(path)?;
                info!("Loaded {} records from {}", table.records.len(), table.name);
                (table.name, table.records, table.columns)
            }
            None => ("Fruits".to_string(), sample::bootstrap(), sample::columns()),
        };
        let mode = config.selection.unwrap_or(SelectionMode::Single);
        let state = TableViewState::new(records, mode)?;
        Self::with_state(config, name, state, columns, ui_width, ui_height)
    }

    pub fn with_state(
        config: &TVConfig,
        name: String,
        state: TableViewState,
        columns: Vec<Column>,
        ui_width: usize,
        ui_height: usize,
    ) -> Result<Self, TVError> {
        let clipboard = match Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Clipboard unavailable: {e}");
                None
            }
        };
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            name,
            state,
            columns,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            cursor_row: 0,
            cursor_column: 0,
            offset_row: 0,
            uilayout: UILayout::default(),
            clipboard,
            input: Inputter::default(),
            last_input: InputResult::default(),
            edit_target: None,
            pointer: None,
            popup_message: None,
            status_message: String::new(),
            last_status_message_update: Instant::now(),
        };
        model.uilayout = UILayout::from_model(&model, ui_width, ui_height);
        let rows = model.state.len();
        model.set_status_message(format!("Loaded {rows} rows. Press ? for help."));
        Ok(model)
    }

    // -------------------- Read access for the UI ---------------------- //

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &TableViewState {
        &self.state
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn display(&self) -> &DisplayOptions {
        &self.config.display
    }

    pub fn selection_mode(&self) -> Option<SelectionMode> {
        self.config.selection
    }

    pub fn read_only(&self) -> bool {
        self.config.read_only
    }

    pub fn uilayout(&self) -> &UILayout {
        &self.uilayout
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_column)
    }

    /// Range of record indices visible in the table area.
    pub fn visible_rows(&self) -> std::ops::Range<usize> {
        let end = std::cmp::min(self.offset_row + self.uilayout.table_height, self.state.len());
        self.offset_row.min(end)..end
    }

    pub fn editing(&self) -> Option<(&EditTarget, &InputResult)> {
        self.edit_target.as_ref().map(|t| (t, &self.last_input))
    }

    pub fn popup(&self) -> Option<&str> {
        self.popup_message.as_deref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::EDIT
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    fn cursor_id(&self) -> Option<String> {
        self.state
            .records()
            .get(self.cursor_row)
            .map(|r| r.id().to_string())
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TVError> {
        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
        match self.modus {
            Modus::TABLE => match msg {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_cursor_up(1),
                Message::MoveDown => self.move_cursor_down(1),
                Message::MoveLeft => self.cursor_column = self.cursor_column.saturating_sub(1),
                Message::MoveRight => {
                    if self.cursor_column + 1 < self.columns.len() {
                        self.cursor_column += 1;
                    }
                }
                Message::MoveBeginning => self.set_cursor_row(0),
                Message::MoveEnd => self.set_cursor_row(self.state.len().saturating_sub(1)),
                Message::SortCurrentColumn => self.sort_column(self.cursor_column),
                Message::SortColumn(idx) => self.sort_column(idx),
                Message::ResetOrder => self.reset_order(),
                Message::Select => self.select_cursor_row(),
                Message::ClearSelection | Message::Exit => self.state.clear_selection(),
                Message::MoveRowUp => self.move_cursor_record(false),
                Message::MoveRowDown => self.move_cursor_record(true),
                Message::Edit => self.start_edit(),
                Message::Delete => self.delete_cursor_row(),
                Message::Add => self.add_missing_fruit(),
                Message::CopySelection => self.copy_selection(),
                Message::ToggleColorize => {
                    self.config.display.colorize = !self.config.display.colorize;
                }
                Message::ToggleHeader => {
                    self.config.display.headerize = !self.config.display.headerize;
                    self.relayout();
                }
                Message::ToggleFooter => {
                    self.config.display.footerize = !self.config.display.footerize;
                    self.relayout();
                }
                Message::CycleLayout => {
                    self.config.display.layout = self.config.display.layout.next();
                    self.relayout();
                    let layout = self.config.display.layout.name();
                    self.set_status_message(format!("Layout: {layout}"));
                }
                Message::CycleSelectionMode => self.cycle_selection_mode(),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Hover(x, y) => self.hover(x as usize, y as usize),
                Message::Click(x, y) => self.click(x as usize, y as usize),
                Message::RawKey(_) => (),
            },
            Modus::EDIT => match msg {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::Help => self.close_popup(),
                _ => (),
            },
        }
        // Rows may have moved under a pointer that did not.
        self.refresh_hover();
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn relayout(&mut self) {
        self.ui_resize(self.uilayout.width, self.uilayout.height);
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_model(self, width, height);
        self.set_cursor_row(self.cursor_row);
    }

    /// Moves the cursor and scrolls so it stays visible.
    fn set_cursor_row(&mut self, row: usize) {
        let len = self.state.len();
        self.cursor_row = if len == 0 { 0 } else { std::cmp::min(row, len - 1) };
        let height = std::cmp::max(self.uilayout.table_height, 1);
        if self.cursor_row < self.offset_row {
            self.offset_row = self.cursor_row;
        } else if self.cursor_row >= self.offset_row + height {
            self.offset_row = self.cursor_row + 1 - height;
        }
        self.offset_row = std::cmp::min(self.offset_row, len.saturating_sub(1));
    }

    fn follow(&mut self, id: Option<String>) {
        if let Some(row) = id.and_then(|id| self.state.position(&id)) {
            self.set_cursor_row(row);
        }
    }

    fn move_cursor_up(&mut self, size: usize) {
        self.set_cursor_row(self.cursor_row.saturating_sub(size));
    }

    fn move_cursor_down(&mut self, size: usize) {
        self.set_cursor_row(self.cursor_row + size);
    }

    fn sort_column(&mut self, idx: usize) {
        let Some(column) = self.columns.get(idx) else {
            return;
        };
        if !column.sortable {
            let title = column.title.clone();
            self.set_status_message(format!("{title} is not sortable"));
            return;
        }
        let key = column.key.clone();
        let title = column.title.clone();
        let tracked = self.cursor_id();
        let start_time = Instant::now();
        self.state.sort_by_field(&key);
        debug!("Sorting by {} took {}ms", key, start_time.elapsed().as_millis());
        self.follow(tracked);
        let glyph = self.state.sort_indicator(&key).glyph();
        self.set_status_message(format!("Sorted by {title} {glyph}"));
    }

    fn reset_order(&mut self) {
        let tracked = self.cursor_id();
        self.state.reset_order();
        self.follow(tracked);
        self.set_status_message("Insertion order");
    }

    fn select_cursor_row(&mut self) {
        let Some(mode) = self.config.selection else {
            self.set_status_message("Selection is disabled");
            return;
        };
        let Some(id) = self.cursor_id() else {
            return;
        };
        match mode {
            SelectionMode::Single => self.state.select(&id),
            SelectionMode::Multiple => self.state.toggle(&id),
        }
    }

    fn cycle_selection_mode(&mut self) {
        let next = match self.config.selection {
            None => Some(SelectionMode::Single),
            Some(SelectionMode::Single) => Some(SelectionMode::Multiple),
            Some(SelectionMode::Multiple) => None,
        };
        self.config.selection = next;
        match next {
            Some(mode) => self.state.set_selection_mode(mode),
            None => self.state.clear_selection(),
        }
        let label = match next {
            None => "none",
            Some(SelectionMode::Single) => "single",
            Some(SelectionMode::Multiple) => "multiple",
        };
        self.set_status_message(format!("Selection: {label}"));
    }

    fn move_cursor_record(&mut self, down: bool) {
        let from = self.cursor_row;
        let to = if down {
            from + 1
        } else if let Some(to) = from.checked_sub(1) {
            to
        } else {
            self.set_status_message("Already at the top");
            return;
        };
        if down && to >= self.state.len() {
            self.set_status_message("Already at the bottom");
            return;
        }
        match self.state.move_row(from, to) {
            Ok(()) => self.set_cursor_row(to),
            Err(e) => {
                warn!("Moving row failed: {e}");
                self.set_status_message(format!("Cannot move row: {e}"));
            }
        }
    }

    fn start_edit(&mut self) {
        if self.config.read_only {
            self.set_status_message("Rows are read only");
            return;
        }
        let Some(id) = self.cursor_id() else {
            return;
        };
        let Some(column) = self.columns.get(self.cursor_column) else {
            return;
        };
        if column.key == ID_FIELD {
            self.set_status_message("The ID cannot be edited");
            return;
        }
        let current = self
            .state
            .get(&id)
            .and_then(|r| r.get(&column.key))
            .map(|v| v.to_string())
            .unwrap_or_default();

        trace!("Editing {}:{}", id, column.key);
        self.edit_target = Some(EditTarget {
            id,
            field: column.key.clone(),
        });
        self.input.set(&current);
        self.last_input = self.input.get();
        self.previous_modus = self.modus;
        self.modus = Modus::EDIT;
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.modus = self.previous_modus;
            self.previous_modus = Modus::EDIT;
            if let Some(target) = self.edit_target.take()
                && !self.last_input.canceled
            {
                self.commit_edit(target);
            }
            self.input.clear();
        }
    }

    fn commit_edit(&mut self, target: EditTarget) {
        let Some(column) = self.columns.iter().find(|c| c.key == target.field) else {
            return;
        };
        let Some(value) = column.parse(&self.last_input.input) else {
            let title = column.title.clone();
            self.set_status_message(format!(
                "\"{}\" is not a valid {}",
                self.last_input.input, title
            ));
            return;
        };
        match self.state.update_field(&target.id, &target.field, value) {
            Ok(()) => {
                self.relayout();
                self.set_status_message(format!("Updated {} of {}", target.field, target.id));
            }
            Err(e) => {
                warn!("Edit failed: {e}");
                self.set_status_message(e.to_string());
            }
        }
    }

    fn delete_cursor_row(&mut self) {
        let Some(id) = self.cursor_id() else {
            return;
        };
        match self.state.remove(&id) {
            Ok(_) => {
                self.set_cursor_row(self.cursor_row);
                self.set_status_message(format!("Removed {id}"));
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    fn add_missing_fruit(&mut self) {
        let missing = sample::bootstrap()
            .into_iter()
            .find(|r| !self.state.contains(r.id()));
        let Some(record) = missing else {
            self.set_status_message("The basket is full");
            return;
        };
        let id = record.id().to_string();
        match self.state.insert(record) {
            Ok(()) => {
                self.relayout();
                self.set_cursor_row(self.state.len() - 1);
                self.set_status_message(format!("Added {id}"));
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    fn hover(&mut self, x: usize, y: usize) {
        self.pointer = Some((x, y));
        self.refresh_hover();
    }

    /// Hovers whatever row is under the last known pointer position.
    fn refresh_hover(&mut self) {
        let Some((x, y)) = self.pointer else {
            return;
        };
        let inside = x >= BORDER_WIDTH && x + BORDER_WIDTH < self.uilayout.width;
        let id = self
            .uilayout
            .row_slot_at(y)
            .filter(|_| inside)
            .map(|slot| self.offset_row + slot)
            .and_then(|row| self.state.records().get(row))
            .map(|r| r.id().to_string());
        self.state.set_hover(id.as_deref());
    }

    fn click(&mut self, x: usize, y: usize) {
        self.pointer = Some((x, y));
        if self.uilayout.header_y == Some(y) {
            if let Some(idx) = self.uilayout.column_at(x) {
                self.cursor_column = idx;
                self.sort_column(idx);
            }
            return;
        }
        if let Some(slot) = self.uilayout.row_slot_at(y) {
            let row = self.offset_row + slot;
            if row < self.state.len() {
                self.set_cursor_row(row);
                if let Some(idx) = self.uilayout.column_at(x) {
                    self.cursor_column = idx;
                }
                self.select_cursor_row();
            }
        }
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.contains('"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    /// Selected rows (or the cursor row) as CSV, with a header line.
    pub fn selection_as_csv(&self) -> String {
        let mut ids: Vec<String> = self
            .state
            .selected_ids()
            .into_iter()
            .map(String::from)
            .collect();
        if ids.is_empty() {
            ids.extend(self.cursor_id());
        }
        let mut lines = vec![
            self.columns
                .iter()
                .map(|c| Model::wrap_cell_content(&c.title))
                .collect::<Vec<String>>()
                .join(","),
        ];
        for record in ids.iter().filter_map(|id| self.state.get(id)) {
            let line = self
                .columns
                .iter()
                .map(|c| match record.get(&c.key) {
                    Some(v) => Model::wrap_cell_content(&v.to_string()),
                    None => String::new(),
                })
                .collect::<Vec<String>>()
                .join(",");
            lines.push(line);
        }
        lines.join("\n")
    }

    fn copy_selection(&mut self) {
        let content = self.selection_as_csv();
        let nrows = content.lines().count().saturating_sub(1);
        let Some(clipboard) = self.clipboard.as_mut() else {
            self.set_status_message("No clipboard available");
            return;
        };
        match clipboard.set_text(content) {
            Ok(_) => {
                trace!("Copied {nrows} rows to clipboard.");
                self.set_status_message(format!("Copied {nrows} rows"));
            }
            Err(e) => {
                warn!("Error copying to clipboard: {:?}", e);
                self.set_status_message("Copying to the clipboard failed");
            }
        }
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.popup_message = Some(HELP_TEXT.to_string());
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.popup_message = None;
    }
}
