use std::time::Duration;

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout as RLayout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, HighlightSpacing, Paragraph, Row, Table, TableState},
};

use crate::display::{DisplayOptions, Emphasis, Layout, RowStyleHint, SelectionMode};
use crate::domain::TVConfig;
use crate::model::Model;
use crate::record::{ColorTag, Column, ColumnKind, Record};
use crate::state::TableViewState;

pub const STATUSLINE_HEIGHT: usize = 1;
pub const BORDER_WIDTH: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const MAX_COLUMN_WIDTH: usize = 40;
pub const HIGHLIGHT_SYMBOL: &str = "▶ ";
const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// What a front-end has to provide to draw a table from its state.
pub trait RowRenderer {
    fn render_header(&self, columns: &[Column], state: &TableViewState) -> Row<'static>;
    fn render_row(
        &self,
        record: &Record,
        columns: &[Column],
        hint: RowStyleHint,
        options: &DisplayOptions,
    ) -> Row<'static>;
    fn render_footer(&self, state: &TableViewState, options: &DisplayOptions) -> Line<'static>;
}

pub fn tag_color(tag: ColorTag) -> Color {
    match tag {
        ColorTag::Black => Color::Black,
        ColorTag::Blue => Color::Blue,
        ColorTag::Brown => Color::Rgb(150, 75, 0),
        ColorTag::Gray => Color::Gray,
        ColorTag::Green => Color::Green,
        ColorTag::Orange => Color::Rgb(255, 165, 0),
        ColorTag::Pink => Color::Rgb(255, 105, 180),
        ColorTag::Purple => Color::Magenta,
        ColorTag::Red => Color::Red,
        ColorTag::White => Color::White,
        ColorTag::Yellow => Color::Yellow,
    }
}

#[derive(Debug)]
pub struct TableUI {
    highlight: Style,
    hover: Style,
}

impl TableUI {
    pub fn new(_config: &TVConfig) -> Self {
        Self {
            highlight: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            hover: Style::default().bg(Color::Indexed(236)),
        }
    }

    fn row_style(&self, hint: RowStyleHint) -> Style {
        let mut style = match hint.tint {
            Some(tag) => Style::default().bg(tag_color(tag)).fg(Color::Black),
            None => Style::default(),
        };
        style = match (hint.background, hint.tint) {
            (Emphasis::Strong, None) => style.patch(self.highlight),
            (Emphasis::Strong, Some(_)) => style.add_modifier(Modifier::BOLD),
            (Emphasis::Subtle, None) => style.patch(self.hover),
            (Emphasis::Subtle, Some(_)) => style.add_modifier(Modifier::ITALIC),
            (Emphasis::None, _) => style,
        };
        if hint.border {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        style
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let area = frame.area();
        let [table_area, status_area] = RLayout::vertical([
            Constraint::Min(0),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(area);

        self.draw_table(model, frame, table_area);
        self.draw_statusline(model, frame, status_area);

        if let Some(message) = model.popup() {
            self.draw_popup(message, frame, area);
        }
    }

    fn draw_table(&self, model: &Model, frame: &mut Frame, area: Rect) {
        let display = model.display();
        let state = model.state();
        let layout = model.uilayout();

        let title = Line::from(vec![" Tabler Demo · ".bold(), model.name().yellow(), " ".into()]);
        let selection = match model.selection_mode() {
            None => "no selection",
            Some(SelectionMode::Single) => "single",
            Some(SelectionMode::Multiple) => "multiple",
        };
        let mut info: Vec<Span> = vec![
            format!(" {} ", display.layout.name()).into(),
            format!("[{selection}] ").into(),
        ];
        if !model.read_only() {
            info.push("[bound] ".into());
        }
        if display.colorize {
            info.push("[colorize] ".magenta());
        }
        info.push("? help ".blue().bold());

        let mut block = Block::bordered()
            .title(title.centered())
            .title_bottom(Line::from(info).right_aligned());
        block = match display.layout {
            Layout::Grid => block.border_set(border::DOUBLE),
            Layout::List | Layout::Stack => block.border_set(border::ROUNDED),
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let footer_height = u16::from(display.footerize);
        let [rows_area, footer_area] =
            RLayout::vertical([Constraint::Min(0), Constraint::Length(footer_height)]).areas(inner);

        let rows = model.visible_rows();
        let (cursor_row, cursor_column) = model.cursor();
        let table_rows: Vec<Row> = state.records()[rows.clone()]
            .iter()
            .map(|r| {
                let hint = state.row_style_hint(r.id(), display);
                self.render_row(r, model.columns(), hint, display)
            })
            .collect();

        let widths = layout
            .columns
            .iter()
            .map(|&(_, w)| Constraint::Length(w as u16));
        let mut table = Table::new(table_rows, widths)
            .column_spacing(layout.column_spacing as u16)
            .flex(Flex::Start);
        if display.headerize {
            table = table.header(self.render_header(model.columns(), state));
        }
        table = match display.layout {
            Layout::List => table
                .highlight_symbol(HIGHLIGHT_SYMBOL)
                .highlight_spacing(HighlightSpacing::Always)
                .cell_highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            Layout::Stack | Layout::Grid => table
                .highlight_spacing(HighlightSpacing::Never)
                .cell_highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
        };

        let mut table_state = TableState::default()
            .with_selected(cursor_row.checked_sub(rows.start))
            .with_selected_column(Some(cursor_column));
        frame.render_stateful_widget(table, rows_area, &mut table_state);

        if display.footerize {
            frame.render_widget(Paragraph::new(self.render_footer(state, display)), footer_area);
        }
    }

    fn draw_statusline(&self, model: &Model, frame: &mut Frame, area: Rect) {
        if let Some((target, input)) = model.editing() {
            let prompt = format!("{} of {}: ", target.field, target.id);
            let prompt_width = Span::raw(prompt.as_str()).width();
            let before_cursor: String = input.input.chars().take(input.cursor_pos).collect();
            let cursor_x = prompt_width + Span::raw(before_cursor).width();
            let line = Line::from(vec![prompt.bold(), input.input.clone().into()]);
            frame.render_widget(Paragraph::new(line), area);
            frame.set_cursor_position(Position::new(area.x + cursor_x as u16, area.y));
            return;
        }

        if model.last_status_message_update().elapsed() < STATUS_MESSAGE_TIMEOUT {
            frame.render_widget(
                Paragraph::new(model.status_message().to_string()).italic(),
                area,
            );
        }
    }

    fn draw_popup(&self, message: &str, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = message.lines().map(Line::from).collect();
        let height = lines.len() as u16 + 2;
        let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 4;

        let [popup] = RLayout::vertical([Constraint::Length(height)])
            .flex(Flex::Center)
            .areas(area);
        let [popup] = RLayout::horizontal([Constraint::Length(width)])
            .flex(Flex::Center)
            .areas(popup);

        let block = Block::bordered()
            .title(Line::from(" Help ".bold()).centered())
            .border_set(border::THICK);
        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

impl RowRenderer for TableUI {
    fn render_header(&self, columns: &[Column], state: &TableViewState) -> Row<'static> {
        let cells = columns.iter().map(|c| {
            let glyph = state.sort_indicator(&c.key).glyph();
            let title = if glyph.is_empty() {
                c.title.clone()
            } else {
                format!("{} {}", c.title, glyph)
            };
            let style = if c.sortable {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD | Modifier::DIM)
            };
            Cell::from(title).style(style)
        });
        Row::new(cells).style(Style::default().fg(Color::Cyan))
    }

    fn render_row(
        &self,
        record: &Record,
        columns: &[Column],
        hint: RowStyleHint,
        options: &DisplayOptions,
    ) -> Row<'static> {
        let record_color = record
            .get(&options.tint_field)
            .and_then(|v| v.as_color())
            .map(tag_color);

        let cells = columns.iter().map(|c| {
            let text = c.format(record);
            match c.kind {
                ColumnKind::Color => {
                    let swatch = match record.get(&c.key).and_then(|v| v.as_color()) {
                        Some(tag) => Span::styled("■ ", Style::default().fg(tag_color(tag))),
                        None => Span::raw(""),
                    };
                    Cell::from(Line::from(vec![swatch, Span::raw(text)]))
                }
                ColumnKind::Number => Cell::from(Line::from(text).right_aligned()),
                // Names carry the record color unless the whole row is tinted.
                ColumnKind::Text if c.key == "name" && !options.colorize => match record_color {
                    Some(color) => Cell::from(text).style(Style::default().fg(color)),
                    None => Cell::from(text),
                },
                ColumnKind::Text => Cell::from(text),
            }
        });

        Row::new(cells).style(self.row_style(hint))
    }

    fn render_footer(&self, state: &TableViewState, options: &DisplayOptions) -> Line<'static> {
        let mut parts = vec![format!("{} rows", state.len())];
        let selected = state.selection().len();
        if selected > 0 {
            parts.push(format!("{selected} selected"));
        }
        match &state.sort_state().key {
            Some(key) => parts.push(format!(
                "sorted by {} {}",
                key,
                state.sort_indicator(key).glyph()
            )),
            None => parts.push("insertion order".to_string()),
        }
        if let Some(id) = state.hovered() {
            parts.push(format!("hover {id}"));
        }
        parts.push(format!("layout {}", options.layout.name()));
        Line::from(parts.join(" · ")).dim()
    }
}
