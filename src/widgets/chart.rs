//! Terminal line chart for a [`ChartFigure`]: one coloured line per category, gaps left open.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        Axis, Block, BorderType, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph,
        Widget,
    },
};

use crate::config::Theme;
use crate::series::ChartFigure;

pub struct GvaChart<'a> {
    figure: &'a ChartFigure,
    theme: &'a Theme,
    show_legend: bool,
    show_markers: bool,
}

impl<'a> GvaChart<'a> {
    pub fn new(figure: &'a ChartFigure, theme: &'a Theme) -> Self {
        Self {
            figure,
            theme,
            show_legend: true,
            show_markers: true,
        }
    }

    pub fn show_legend(mut self, show: bool) -> Self {
        self.show_legend = show;
        self
    }

    pub fn show_markers(mut self, show: bool) -> Self {
        self.show_markers = show;
        self
    }
}

impl Widget for GvaChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text_primary = self.theme.get("text_primary");
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(self.theme.get("table_border")))
            .title(Span::styled(
                format!(" {} ", self.figure.title),
                Style::default().fg(text_primary).add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(bounds) = self.figure.bounds() else {
            Paragraph::new(format!("No data for {}", self.figure.title))
                .style(Style::default().fg(self.theme.get("text_secondary")))
                .centered()
                .render(inner, buf);
            return;
        };

        // Datasets borrow their points, so collect every segment up front.
        let segments: Vec<(usize, Vec<Vec<(f64, f64)>>)> = self
            .figure
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.segments()))
            .collect();

        let mut datasets = Vec::new();
        for (i, series_segments) in &segments {
            let series = &self.figure.series[*i];
            let style = Style::default().fg(self.theme.series_color(*i));
            for (j, points) in series_segments.iter().enumerate() {
                let mut line = Dataset::default()
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(style)
                    .data(points);
                // Legend entries come from named datasets; name only the first segment.
                if j == 0 {
                    line = line.name(series.name.clone());
                }
                datasets.push(line);
                if self.show_markers {
                    datasets.push(
                        Dataset::default()
                            .marker(Marker::Dot)
                            .graph_type(GraphType::Scatter)
                            .style(style)
                            .data(points),
                    );
                }
            }
        }

        let label_style = Style::default().fg(text_primary);
        let x_mid = ((bounds.x_min + bounds.x_max) / 2.0).round();
        let x_labels = vec![
            Span::styled(format_year(bounds.x_min), label_style),
            Span::styled(format_year(x_mid), label_style),
            Span::styled(format_year(bounds.x_max), label_style),
        ];
        let y_labels = vec![
            Span::styled(format_value(bounds.y_min), label_style),
            Span::styled(
                format_value((bounds.y_min + bounds.y_max) / 2.0),
                label_style,
            ),
            Span::styled(format_value(bounds.y_max), label_style),
        ];

        let axis_style = Style::default().fg(self.theme.get("dimmed"));
        let x_axis = Axis::default()
            .title(Span::styled(self.figure.x_label.clone(), label_style))
            .style(axis_style)
            .bounds([bounds.x_min, bounds.x_max])
            .labels(x_labels);
        let y_axis = Axis::default()
            .title(Span::styled(self.figure.y_label.clone(), label_style))
            .style(axis_style)
            .bounds([bounds.y_min, bounds.y_max])
            .labels(y_labels);

        let mut chart = Chart::new(datasets).x_axis(x_axis).y_axis(y_axis);
        chart = if self.show_legend {
            chart
                .legend_position(Some(LegendPosition::TopLeft))
                .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(3, 4)))
        } else {
            chart.legend_position(None)
        };
        chart.render(inner, buf);
    }
}

fn format_year(v: f64) -> String {
    format!("{:.0}", v.round())
}

fn format_value(v: f64) -> String {
    if v.abs() >= 1e6 {
        format!("{:.2e}", v)
    } else if v.abs() >= 100.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::ChartSeries;

    fn screen(buf: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn figure(series: Vec<ChartSeries>) -> ChartFigure {
        ChartFigure {
            title: "Cultural Sector".to_string(),
            x_label: "Year".to_string(),
            y_label: "GVA (£m)".to_string(),
            series,
        }
    }

    #[test]
    fn empty_figure_shows_placeholder() {
        let area = Rect::new(0, 0, 60, 10);
        let mut buf = Buffer::empty(area);
        let theme = Theme::default();
        GvaChart::new(&figure(vec![]), &theme).render(area, &mut buf);
        assert!(screen(&buf).contains("No data for Cultural Sector"));
    }

    #[test]
    fn renders_title_and_legend() {
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        let theme = Theme::default();
        let fig = figure(vec![ChartSeries {
            name: "Arts".to_string(),
            x: vec![2010, 2011, 2012],
            y: vec![Some(1.0), None, Some(3.0)],
        }]);
        GvaChart::new(&fig, &theme).render(area, &mut buf);
        let text = screen(&buf);
        assert!(text.contains("Cultural Sector"));
        assert!(text.contains("Arts"));
        assert!(text.contains("2010"));
    }

    #[test]
    fn value_labels_scale_with_magnitude() {
        assert_eq!(format_value(12.345), "12.3");
        assert_eq!(format_value(8123.9), "8124");
        assert_eq!(format_year(2010.4), "2010");
    }
}
