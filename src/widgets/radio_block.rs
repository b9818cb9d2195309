//! Bordered block with a grid of radio options (● selected, ○ unselected).
//! Used for the breakdown and measure selectors.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

/// Options are laid out `columns` per row. The selected option is reversed while the block has focus.
pub struct RadioBlock<'a> {
    pub title: &'a str,
    pub options: &'a [&'a str],
    pub selected: usize,
    pub focused: bool,
    pub columns: usize,
    pub border_color: Color,
    pub active_color: Color,
}

impl<'a> RadioBlock<'a> {
    pub fn new(title: &'a str, options: &'a [&'a str], selected: usize) -> Self {
        Self {
            title,
            options,
            selected,
            focused: false,
            columns: options.len().max(1),
            border_color: Color::DarkGray,
            active_color: Color::Cyan,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }

    pub fn colors(mut self, border_color: Color, active_color: Color) -> Self {
        self.border_color = border_color;
        self.active_color = active_color;
        self
    }

    /// Rows needed to draw every option plus the border.
    pub fn height(&self) -> u16 {
        let cols = self.columns.min(self.options.len()).max(1);
        self.options.len().div_ceil(cols) as u16 + 2
    }

    fn render_inner(&self, area: Rect, buf: &mut Buffer) {
        if self.options.is_empty() {
            return;
        }
        let n = self.options.len();
        let cols = self.columns.min(n);
        let rows = n.div_ceil(cols);

        let row_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints((0..rows).map(|_| Constraint::Length(1)))
            .split(area);
        let col_width = area.width / cols as u16;

        for (idx, label) in self.options.iter().enumerate() {
            let row = idx / cols;
            if row >= row_chunks.len() {
                break;
            }
            let col_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints((0..cols).map(|_| Constraint::Length(col_width)))
                .split(row_chunks[row]);
            let cell = col_chunks[idx % cols];

            let is_selected = idx == self.selected;
            let marker = if is_selected { "●" } else { "○" };
            let mut style = Style::default().fg(if is_selected {
                self.active_color
            } else {
                self.border_color
            });
            if self.focused && is_selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Paragraph::new(Line::from(Span::styled(format!("{} {}", marker, label), style)))
                .render(cell, buf);
        }
    }
}

impl Widget for RadioBlock<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            self.active_color
        } else {
            self.border_color
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(self.title)
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);
        self.render_inner(inner, buf);
    }
}
