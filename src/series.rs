//! Turn a matrix into named line series for charting: one line per category.

use serde::Serialize;

use crate::aggregator::BASE_YEAR;
use crate::matrix::Matrix;

/// One line: `y[i]` is the value at year `x[i]`; `None` leaves a gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub x: Vec<i32>,
    pub y: Vec<Option<f64>>,
}

impl ChartSeries {
    /// Finite (x, y) points, gaps dropped.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x
            .iter()
            .zip(&self.y)
            .filter_map(|(x, y)| y.filter(|v| v.is_finite()).map(|v| (*x as f64, v)))
            .collect()
    }

    /// Runs of consecutive non-missing points. Lines are drawn per segment so gaps stay visible.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (x, y) in self.x.iter().zip(&self.y) {
            match y.filter(|v| v.is_finite()) {
                Some(v) => current.push((*x as f64, v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn is_empty(&self) -> bool {
        self.y.iter().all(|v| v.is_none())
    }
}

/// Everything a chart needs: title, axis label and the series in row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFigure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

impl ChartFigure {
    pub fn from_matrix(matrix: &Matrix) -> Self {
        let series = matrix
            .rows
            .iter()
            .map(|row| ChartSeries {
                name: row.label.trim_end().to_string(),
                x: matrix.years.clone(),
                y: row.values.clone(),
            })
            .collect();

        Self {
            title: matrix.grouping.label().to_string(),
            x_label: "Year".to_string(),
            y_label: y_axis_label(matrix.indexed),
            series,
        }
    }

    pub fn has_points(&self) -> bool {
        self.series.iter().any(|s| !s.is_empty())
    }

    pub fn bounds(&self) -> Option<ChartBounds> {
        ChartBounds::from_series(&self.series)
    }
}

pub fn y_axis_label(indexed: bool) -> String {
    if indexed {
        format!("Index ({} = 100)", BASE_YEAR)
    } else {
        "GVA (£m)".to_string()
    }
}

/// Axis ranges over all finite points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ChartBounds {
    /// `None` when there is nothing to plot. Degenerate ranges are widened so axes stay drawable.
    pub fn from_series(series: &[ChartSeries]) -> Option<Self> {
        let mut points = series.iter().flat_map(|s| s.points());
        let (x0, y0) = points.next()?;
        let mut b = Self {
            x_min: x0,
            x_max: x0,
            y_min: y0,
            y_max: y0,
        };
        for (x, y) in points {
            b.x_min = b.x_min.min(x);
            b.x_max = b.x_max.max(x);
            b.y_min = b.y_min.min(y);
            b.y_max = b.y_max.max(y);
        }
        if b.x_max <= b.x_min {
            b.x_min -= 0.5;
            b.x_max += 0.5;
        }
        let pad = if b.y_max > b.y_min {
            (b.y_max - b.y_min) * 0.05
        } else {
            b.y_max.abs().max(1.0) * 0.05
        };
        b.y_min -= pad;
        b.y_max += pad;
        Some(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Grouping;
    use crate::matrix::MatrixRow;

    fn matrix(indexed: bool) -> Matrix {
        Matrix {
            grouping: Grouping::DigitalSector,
            indexed,
            years: vec![2010, 2011, 2012, 2013],
            rows: vec![
                MatrixRow {
                    label: "Telecommunications        ".to_string(),
                    values: vec![Some(10.0), None, Some(12.0), Some(13.0)],
                },
                MatrixRow {
                    label: "Software publishing       ".to_string(),
                    values: vec![None, None, None, None],
                },
            ],
        }
    }

    #[test]
    fn one_series_per_row_in_order() {
        let fig = ChartFigure::from_matrix(&matrix(false));
        assert_eq!(fig.title, "Digital Sector");
        assert_eq!(fig.y_label, "GVA (£m)");
        assert_eq!(fig.series.len(), 2);
        assert_eq!(fig.series[0].name, "Telecommunications");
        assert_eq!(fig.series[0].x, vec![2010, 2011, 2012, 2013]);
        assert!(fig.series[1].is_empty());
        assert!(fig.has_points());
    }

    #[test]
    fn indexed_label_mentions_base_year() {
        let fig = ChartFigure::from_matrix(&matrix(true));
        assert_eq!(fig.y_label, "Index (2010 = 100)");
    }

    #[test]
    fn gaps_split_segments() {
        let fig = ChartFigure::from_matrix(&matrix(false));
        let s = &fig.series[0];
        assert_eq!(s.points().len(), 3);
        assert_eq!(
            s.segments(),
            vec![
                vec![(2010.0, 10.0)],
                vec![(2012.0, 12.0), (2013.0, 13.0)]
            ]
        );
        assert!(fig.series[1].segments().is_empty());
    }

    #[test]
    fn bounds_cover_points_with_padding() {
        let fig = ChartFigure::from_matrix(&matrix(false));
        let b = fig.bounds().unwrap();
        assert_eq!(b.x_min, 2010.0);
        assert_eq!(b.x_max, 2013.0);
        assert!(b.y_min < 10.0 && b.y_max > 13.0);

        let empty = ChartFigure {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            series: vec![],
        };
        assert!(empty.bounds().is_none());
    }
}
