//! Chart export to PNG (plotters bitmap) and EPS (minimal PostScript, no deps).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::series::{ChartBounds, ChartFigure};

/// Line colors, cycled by series index.
pub const SERIES_PALETTE: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

pub fn series_color(idx: usize) -> (u8, u8, u8) {
    SERIES_PALETTE[idx % SERIES_PALETTE.len()]
}

/// Size and decorations for exported charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartExportOptions {
    pub width: u32,
    pub height: u32,
    pub show_markers: bool,
    pub show_legend: bool,
}

impl Default for ChartExportOptions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            show_markers: true,
            show_legend: true,
        }
    }
}

/// Export format for chart: PNG or EPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartExportFormat {
    Png,
    Eps,
}

impl ChartExportFormat {
    pub const ALL: [Self; 2] = [Self::Png, Self::Eps];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Eps => "eps",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Eps => "EPS",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }
}

/// Write the figure to `path`, picking the format from the extension.
pub fn export_chart(path: &Path, figure: &ChartFigure, options: &ChartExportOptions) -> Result<()> {
    let format = ChartExportFormat::from_path(path).ok_or_else(|| {
        eyre!(
            "Unsupported chart file '{}': use a .png or .eps extension",
            path.display()
        )
    })?;
    match format {
        ChartExportFormat::Png => write_chart_png(path, figure, options)?,
        ChartExportFormat::Eps => write_chart_eps(path, figure, options)?,
    }
    info!(path = %path.display(), format = format.as_str(), "exported chart");
    Ok(())
}

fn export_bounds(figure: &ChartFigure) -> Result<ChartBounds> {
    figure.bounds().ok_or_else(|| eyre!("No data to export"))
}

/// Escape a string for PostScript ( and ) and \. The pound sign becomes its
/// StandardEncoding octal code so Helvetica shows it.
fn ps_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('£', "\\243")
}

/// Generate "nice" tick values in [min, max] with roughly max_ticks steps.
fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let range = if max > min { max - min } else { 1.0 };
    if max_ticks == 0 {
        return vec![min];
    }
    let raw_step = range / (max_ticks as f64).max(1.0);
    let mag = 10.0_f64.powf(raw_step.log10().floor());
    let norm = if mag > 0.0 { raw_step / mag } else { raw_step };
    let step = if norm <= 1.0 {
        mag
    } else if norm <= 2.0 {
        2.0 * mag
    } else if norm <= 5.0 {
        5.0 * mag
    } else {
        10.0 * mag
    };
    let step = step.max(f64::EPSILON);
    let mut ticks = Vec::new();
    let mut v = (min / step).floor() * step;
    while v <= max + step * 0.001 {
        if v >= min - step * 0.001 {
            ticks.push(v);
        }
        v += step;
        if ticks.len() > max_ticks + 2 {
            break;
        }
    }
    if ticks.is_empty() {
        ticks.push(min);
    }
    ticks
}

/// Format a tick value: whole numbers (years, £m) without decimals.
fn format_tick(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let abs = v.abs();
    if (v - v.round()).abs() < 1e-9 && abs < 1e9 {
        format!("{:.0}", v)
    } else if abs >= 1e6 || abs <= 0.01 {
        format!("{:e}", v)
    } else if abs >= 1.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

/// Write chart to EPS (Encapsulated PostScript). No external dependencies.
pub fn write_chart_eps(path: &Path, figure: &ChartFigure, options: &ChartExportOptions) -> Result<()> {
    let bounds = export_bounds(figure)?;

    const W: f64 = 560.0;
    const H: f64 = 320.0;
    const MARGIN_LEFT: f64 = 60.0;
    const MARGIN_BOTTOM: f64 = 40.0;
    const LEGEND_W: f64 = 150.0;
    const PLOT_W: f64 = W - MARGIN_LEFT - LEGEND_W - 20.0;
    const PLOT_H: f64 = H - MARGIN_BOTTOM - 40.0;

    let ChartBounds {
        x_min,
        x_max,
        y_min,
        y_max,
    } = bounds;
    let x_range = if x_max > x_min { x_max - x_min } else { 1.0 };
    let y_range = if y_max > y_min { y_max - y_min } else { 1.0 };

    let to_x = |x: f64| MARGIN_LEFT + (x - x_min) / x_range * PLOT_W;
    let to_y = |y: f64| MARGIN_BOTTOM + (y - y_min) / y_range * PLOT_H;

    let mut f = File::create(path)?;

    writeln!(f, "%!PS-Adobe-3.0 EPSF-3.0")?;
    writeln!(f, "%%BoundingBox: 0 0 {} {}", W as i32, H as i32)?;
    writeln!(f, "%%Creator: gvadash")?;
    writeln!(f, "%%Title: ({})", ps_escape(&figure.title))?;
    writeln!(f, "%%EndComments")?;
    writeln!(f, "gsave")?;
    writeln!(f, "1 setlinewidth")?;

    const MAX_TICKS: usize = 8;
    let x_ticks = nice_ticks(x_min, x_max, MAX_TICKS);
    let y_ticks = nice_ticks(y_min, y_max, MAX_TICKS);
    let in_x = |px: f64| (MARGIN_LEFT..=MARGIN_LEFT + PLOT_W).contains(&px);
    let in_y = |py: f64| (MARGIN_BOTTOM..=MARGIN_BOTTOM + PLOT_H).contains(&py);

    // Grid
    writeln!(f, "0.9 setgray")?;
    writeln!(f, "0.5 setlinewidth")?;
    for px in x_ticks.iter().map(|&v| to_x(v)).filter(|&px| in_x(px)) {
        writeln!(f, "{} {} moveto 0 {} rlineto stroke", px, MARGIN_BOTTOM, PLOT_H)?;
    }
    for py in y_ticks.iter().map(|&v| to_y(v)).filter(|&py| in_y(py)) {
        writeln!(f, "{} {} moveto {} 0 rlineto stroke", MARGIN_LEFT, py, PLOT_W)?;
    }
    writeln!(f, "1 setlinewidth")?;
    writeln!(f, "0 setgray")?;

    // Axis box
    writeln!(f, "{} {} moveto", MARGIN_LEFT, MARGIN_BOTTOM)?;
    writeln!(f, "{} 0 rlineto", PLOT_W)?;
    writeln!(f, "0 {} rlineto", PLOT_H)?;
    writeln!(f, "{} 0 rlineto", -PLOT_W)?;
    writeln!(f, "closepath stroke")?;

    // Tick labels
    writeln!(f, "/Helvetica findfont 9 scalefont setfont")?;
    let char_w: f64 = 5.0;
    for &v in &x_ticks {
        let px = to_x(v);
        if in_x(px) {
            let s = format_tick(v);
            let tx = px - s.len() as f64 * char_w / 2.0;
            writeln!(
                f,
                "{} {} moveto 0 -4 rlineto stroke {} {} moveto ({}) show",
                px,
                MARGIN_BOTTOM,
                tx,
                MARGIN_BOTTOM - 14.0,
                ps_escape(&s)
            )?;
        }
    }
    for &v in &y_ticks {
        let py = to_y(v);
        if in_y(py) {
            let s = format_tick(v);
            let tx = (MARGIN_LEFT - s.len() as f64 * char_w - 6.0).max(2.0);
            writeln!(
                f,
                "{} {} moveto -4 0 rlineto stroke {} {} moveto ({}) show",
                MARGIN_LEFT,
                py,
                tx,
                py - 3.0,
                ps_escape(&s)
            )?;
        }
    }

    // Title and axis titles
    writeln!(f, "/Helvetica-Bold findfont 11 scalefont setfont")?;
    writeln!(
        f,
        "{} {} moveto ({}) show",
        MARGIN_LEFT,
        MARGIN_BOTTOM + PLOT_H + 14.0,
        ps_escape(&figure.title)
    )?;
    writeln!(f, "/Helvetica findfont 10 scalefont setfont")?;
    let x_center = MARGIN_LEFT + PLOT_W / 2.0;
    writeln!(
        f,
        "{} {} moveto ({}) show",
        x_center - figure.x_label.len() as f64 * char_w / 2.0,
        MARGIN_BOTTOM - 30.0,
        ps_escape(&figure.x_label)
    )?;
    writeln!(f, "gsave")?;
    writeln!(f, "14 {} translate 90 rotate", MARGIN_BOTTOM + PLOT_H / 2.0)?;
    writeln!(
        f,
        "{} 0 moveto ({}) show",
        -(figure.y_label.chars().count() as f64) * char_w / 2.0,
        ps_escape(&figure.y_label)
    )?;
    writeln!(f, "grestore")?;

    writeln!(f, "/Helvetica findfont 8 scalefont setfont")?;
    let mut legend_row = 0.0;
    for (idx, s) in figure.series.iter().enumerate() {
        let (r, g, b) = series_color(idx);
        writeln!(
            f,
            "{} {} {} setrgbcolor",
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0
        )?;

        for segment in s.segments() {
            let (px, py) = segment[0];
            writeln!(f, "{} {} moveto", to_x(px), to_y(py))?;
            for &(px, py) in &segment[1..] {
                writeln!(f, "{} {} lineto", to_x(px), to_y(py))?;
            }
            writeln!(f, "stroke")?;
            if options.show_markers {
                for &(px, py) in &segment {
                    writeln!(f, "{} {} 2 0 360 arc fill", to_x(px), to_y(py))?;
                }
            }
        }

        if options.show_legend {
            let lx = MARGIN_LEFT + PLOT_W + 12.0;
            let ly = MARGIN_BOTTOM + PLOT_H - legend_row * 12.0;
            writeln!(f, "{} {} moveto 14 0 rlineto stroke", lx, ly + 3.0)?;
            writeln!(f, "0 setgray")?;
            writeln!(f, "{} {} moveto ({}) show", lx + 18.0, ly, ps_escape(&s.name))?;
            legend_row += 1.0;
        }
    }

    writeln!(f, "grestore")?;
    writeln!(f, "%%EOF")?;
    f.sync_all()?;
    Ok(())
}

/// Write chart to PNG using plotters bitmap backend.
pub fn write_chart_png(path: &Path, figure: &ChartFigure, options: &ChartExportOptions) -> Result<()> {
    use plotters::prelude::*;

    let bounds = export_bounds(figure)?;

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(figure.title.as_str(), ("sans-serif", 22))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(bounds.x_min..bounds.x_max, bounds.y_min..bounds.y_max)?;

    chart
        .configure_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .x_label_formatter(&|x| format_tick(*x))
        .y_label_formatter(&|y| format_tick(*y))
        .draw()?;

    for (idx, s) in figure.series.iter().enumerate() {
        let (r, g, b) = series_color(idx);
        let color = RGBColor(r, g, b);

        for (seg_idx, segment) in s.segments().into_iter().enumerate() {
            let anno = chart.draw_series(LineSeries::new(
                segment.iter().copied(),
                color.stroke_width(2),
            ))?;
            if seg_idx == 0 && options.show_legend {
                anno.label(s.name.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }
            if options.show_markers {
                chart.draw_series(
                    segment
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
                )?;
            }
        }
    }

    if options.show_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::ChartSeries;

    fn figure() -> ChartFigure {
        ChartFigure {
            title: "Cultural Sector".to_string(),
            x_label: "Year".to_string(),
            y_label: "GVA (£m)".to_string(),
            series: vec![
                ChartSeries {
                    name: "Arts".to_string(),
                    x: vec![2010, 2011, 2012],
                    y: vec![Some(1.0), None, Some(1.5)],
                },
                ChartSeries {
                    name: "Film, TV (and) music".to_string(),
                    x: vec![2010, 2011, 2012],
                    y: vec![Some(3.0), Some(3.5), Some(4.0)],
                },
            ],
        }
    }

    #[test]
    fn eps_contains_desired_elements() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("chart.eps");
        write_chart_eps(&path, &figure(), &ChartExportOptions::default()).expect("write eps");
        let content = std::fs::read_to_string(&path).expect("read");

        assert!(content.contains("%!PS-Adobe-3.0 EPSF-3.0"));
        assert!(content.contains("%%Creator: gvadash"));
        assert!(content.contains("0.9 setgray"), "grid");
        assert!(content.contains("closepath stroke"), "axis box");
        assert!(content.contains("(2010) show"), "year ticks are whole numbers");
        assert!(content.contains("(Year) show"));
        assert!(content.contains("(Film, TV \\(and\\) music) show"), "escaped legend");
        assert!(content.contains("arc fill"), "markers");
        assert!(content.contains("lineto"));
        assert!(content.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn eps_without_markers_or_legend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.eps");
        let options = ChartExportOptions {
            show_markers: false,
            show_legend: false,
            ..Default::default()
        };
        write_chart_eps(&path, &figure(), &options).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("arc fill"));
        assert!(!content.contains("(Arts) show"));
    }

    #[test]
    fn empty_figure_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut fig = figure();
        for s in &mut fig.series {
            s.y = vec![None; s.x.len()];
        }
        let err = write_chart_eps(&dir.path().join("x.eps"), &fig, &Default::default());
        assert!(err.is_err());
    }

    #[test]
    fn eps_writes_pound_sign_as_octal() {
        assert_eq!(ps_escape("GVA (£m)"), "GVA \\(\\243m\\)");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pound.eps");
        write_chart_eps(&path, &figure(), &Default::default()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("(GVA \\(\\243m\\)) show"));
        assert!(!content.contains('£'));
    }

    #[test]
    fn png_has_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.png");
        export_chart(&path, &figure(), &ChartExportOptions::default()).expect("write png");
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
    }

    #[test]
    fn png_of_empty_figure_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut fig = figure();
        for s in &mut fig.series {
            s.y = vec![None; s.x.len()];
        }
        let path = dir.path().join("empty.png");
        let err = export_chart(&path, &fig, &Default::default()).unwrap_err();
        assert!(err.to_string().contains("No data to export"), "got: {}", err);
        assert!(!path.exists());
    }

    #[test]
    fn format_detection_and_unknown_extension() {
        assert_eq!(
            ChartExportFormat::from_path(Path::new("a/b.PNG")),
            Some(ChartExportFormat::Png)
        );
        assert_eq!(
            ChartExportFormat::from_path(Path::new("chart.eps")),
            Some(ChartExportFormat::Eps)
        );
        assert_eq!(ChartExportFormat::from_path(Path::new("chart.svg")), None);
        let dir = tempfile::tempdir().unwrap();
        assert!(export_chart(&dir.path().join("c.svg"), &figure(), &Default::default()).is_err());
    }

    #[test]
    fn tick_formatting() {
        assert_eq!(format_tick(2010.0), "2010");
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(12.5), "12.5");
        assert_eq!(format_tick(0.25), "0.25");
        assert_eq!(nice_ticks(2010.0, 2016.0, 8).first(), Some(&2010.0));
    }
}
