use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph, Widget},
};

const DEFAULT_CONTROLS: [(&str, &str); 7] = [
    ("Tab", "Focus"),
    ("←/→", "Change"),
    ("1-4", "Breakdown"),
    ("i", "Indexed"),
    ("t", "Chart/Table"),
    ("e/E", "Export PNG/EPS"),
    ("q", "Quit"),
];

/// Bottom bar: key hints on the left, a status message on the right.
pub struct Controls<'a> {
    pub status: Option<&'a str>,
    pub status_is_error: bool,
    pub bg_color: Color,
    pub key_color: Color,
    pub label_color: Color,
    pub error_color: Color,
}

impl Default for Controls<'_> {
    fn default() -> Self {
        Self {
            status: None,
            status_is_error: false,
            bg_color: Color::Indexed(236),
            key_color: Color::Cyan,
            label_color: Color::White,
            error_color: Color::Red,
        }
    }
}

impl<'a> Controls<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Option<&'a str>, is_error: bool) -> Self {
        self.status = status;
        self.status_is_error = is_error;
        self
    }

    pub fn with_colors(
        mut self,
        bg_color: Color,
        key_color: Color,
        label_color: Color,
        error_color: Color,
    ) -> Self {
        self.bg_color = bg_color;
        self.key_color = key_color;
        self.label_color = label_color;
        self.error_color = error_color;
        self
    }
}

impl Widget for &Controls<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let base = if self.bg_color == Color::Reset {
            Style::default()
        } else {
            Block::default()
                .style(Style::default().bg(self.bg_color))
                .render(area, buf);
            Style::default().bg(self.bg_color)
        };

        // Pairs are never shrunk: show as many as fit, keep room for the status.
        let pair_width = |(key, action): &(&str, &str)| -> u16 {
            (key.chars().count() as u16 + 1) + (action.chars().count() as u16 + 1)
        };
        let status_width = self
            .status
            .map(|s| s.chars().count() as u16 + 1)
            .unwrap_or(0);
        let mut available = area.width.saturating_sub(status_width);
        let mut n_show = 0;
        for pair in DEFAULT_CONTROLS.iter() {
            let need = pair_width(pair);
            if available < need {
                break;
            }
            available -= need;
            n_show += 1;
        }

        let mut constraints: Vec<Constraint> = DEFAULT_CONTROLS
            .iter()
            .take(n_show)
            .flat_map(|(key, action)| {
                [
                    Constraint::Length(key.chars().count() as u16 + 1),
                    Constraint::Length(action.chars().count() as u16 + 1),
                ]
            })
            .collect();
        constraints.push(Constraint::Fill(1));
        let layout = Layout::new(Direction::Horizontal, constraints).split(area);

        let key_style = base.fg(self.key_color);
        let label_style = base.fg(self.label_color);
        for (i, (key, action)) in DEFAULT_CONTROLS.iter().take(n_show).enumerate() {
            Paragraph::new(*key).style(key_style).render(layout[i * 2], buf);
            Paragraph::new(*action)
                .style(label_style)
                .render(layout[i * 2 + 1], buf);
        }

        if let Some(status) = self.status {
            let style = if self.status_is_error {
                base.fg(self.error_color)
            } else {
                label_style
            };
            Paragraph::new(status)
                .style(style)
                .right_aligned()
                .render(layout[n_show * 2], buf);
        }
    }
}
