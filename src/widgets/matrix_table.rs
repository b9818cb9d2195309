//! Matrix as a table: category column followed by one right-aligned column per year.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Row, Table, Widget},
};

use crate::matrix::{format_cell, Matrix};

pub struct MatrixTable<'a> {
    matrix: &'a Matrix,
    header_fg: Color,
    header_bg: Color,
    border_color: Color,
    dimmed: Color,
}

impl<'a> MatrixTable<'a> {
    pub fn new(matrix: &'a Matrix) -> Self {
        Self {
            matrix,
            header_fg: Color::White,
            header_bg: Color::Reset,
            border_color: Color::DarkGray,
            dimmed: Color::DarkGray,
        }
    }

    pub fn with_colors(
        mut self,
        header_fg: Color,
        header_bg: Color,
        border_color: Color,
        dimmed: Color,
    ) -> Self {
        self.header_fg = header_fg;
        self.header_bg = header_bg;
        self.border_color = border_color;
        self.dimmed = dimmed;
        self
    }

    fn widths(&self, cells: &[Vec<String>]) -> Vec<Constraint> {
        let label_width = self
            .matrix
            .rows
            .iter()
            .map(|r| r.label.trim_end().chars().count())
            .chain(std::iter::once("Category".len()))
            .max()
            .unwrap_or(0);
        let mut widths = vec![Constraint::Length(label_width as u16)];
        for (col, year) in self.matrix.years.iter().enumerate() {
            let w = cells
                .iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(year.to_string().len()))
                .max()
                .unwrap_or(4);
            widths.push(Constraint::Length(w as u16));
        }
        widths
    }
}

impl Widget for MatrixTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.border_color))
            .title(format!(" {} ", self.matrix.grouping));

        let cells: Vec<Vec<String>> = self
            .matrix
            .rows
            .iter()
            .map(|r| r.values.iter().map(|v| format_cell(*v)).collect())
            .collect();
        let widths = self.widths(&cells);

        let header_style = if self.header_bg == Color::Reset {
            Style::default().fg(self.header_fg)
        } else {
            Style::default().bg(self.header_bg).fg(self.header_fg)
        }
        .add_modifier(Modifier::BOLD);
        let header = Row::new(
            std::iter::once(Cell::from("Category")).chain(
                self.matrix
                    .years
                    .iter()
                    .map(|y| Cell::from(Line::from(y.to_string()).right_aligned())),
            ),
        )
        .style(header_style);

        let missing = Style::default().fg(self.dimmed);
        let rows: Vec<Row> = self
            .matrix
            .rows
            .iter()
            .zip(cells)
            .map(|(row, texts)| {
                let values = row.values.iter().zip(texts).map(|(v, text)| {
                    let span = match v {
                        Some(_) => Span::raw(text),
                        None => Span::styled(text, missing),
                    };
                    Cell::from(Line::from(span).right_aligned())
                });
                Row::new(std::iter::once(Cell::from(row.label.trim_end().to_string())).chain(values))
            })
            .collect();

        Widget::render(
            Table::new(rows, widths)
                .header(header)
                .column_spacing(2)
                .block(block),
            area,
            buf,
        );
    }
}
