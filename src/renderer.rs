//! # ASCII Page Rendering
//!
//! Development mode: prints each composed page to the terminal as a character
//! grid, so layout changes can be checked without opening a PDF. Text lands in
//! the cell nearest its position and tide curves are plotted as dots. Moon icons
//! and rules are left out.

use crate::layout::{Align, DrawCommand, TextItem};
use crate::page::Page;
use kurbo::{Affine, PathEl, Point};

/// Horizontal points per character cell.
const CHAR_PT: f64 = 6.0;
/// Vertical points per character row.
const ROW_PT: f64 = 10.0;
/// Flattening tolerance for plotted curves, in points.
const PLOT_TOLERANCE: f64 = 1.0;

struct Grid {
    cells: Vec<Vec<char>>,
}

impl Grid {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            cells: vec![vec![' '; cols]; rows],
        }
    }

    fn cell(&self, p: Point) -> Option<(usize, usize)> {
        let col = (p.x / CHAR_PT).floor();
        let row = (p.y / ROW_PT).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        let width = self.cells.first().map_or(0, Vec::len);
        (row < self.cells.len() && col < width).then_some((col, row))
    }

    fn put(&mut self, p: Point, ch: char) {
        if let Some((col, row)) = self.cell(p) {
            self.cells[row][col] = ch;
        }
    }

    fn write(&mut self, item: &TextItem, ctm: Affine) {
        let len = item.text.chars().count() as f64 * CHAR_PT;
        let x = match item.align {
            Align::Left => item.origin.x,
            Align::Center => item.origin.x + (item.width - len) / 2.0,
            Align::Right => item.origin.x + item.width - len,
        };
        let start = ctm * Point::new(x, item.origin.y);
        for (i, ch) in item.text.chars().enumerate() {
            self.put(Point::new(start.x + i as f64 * CHAR_PT, start.y), ch);
        }
    }

    /// Blank-trimmed rows, with runs of empty rows collapsed into one.
    fn lines(self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        for row in self.cells {
            let line = row.into_iter().collect::<String>().trim_end().to_string();
            if line.is_empty() && lines.last().is_some_and(|l| l.is_empty()) {
                continue;
            }
            lines.push(line);
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }
}

/// The page as text lines.
pub fn page_lines(page: &Page) -> Vec<String> {
    let cols = (page.size.width / CHAR_PT).ceil() as usize;
    let rows = (page.size.height / ROW_PT).ceil() as usize;
    let mut grid = Grid::new(cols, rows);
    let mut ctm = Affine::IDENTITY;
    let mut stack = Vec::new();

    for command in &page.commands {
        match command {
            DrawCommand::Text(item) => grid.write(item, ctm),
            DrawCommand::StrokePath { path, .. } => {
                let mut path = path.clone();
                path.apply_affine(ctm);
                kurbo::flatten(path.iter(), PLOT_TOLERANCE, |el| {
                    if let PathEl::MoveTo(p) | PathEl::LineTo(p) = el {
                        grid.put(p, '•');
                    }
                });
            }
            DrawCommand::PushTransform(affine) => {
                stack.push(ctm);
                ctm *= *affine;
            }
            DrawCommand::PopTransform => {
                ctm = stack.pop().unwrap_or(Affine::IDENTITY);
            }
            DrawCommand::Line { .. } | DrawCommand::FillPath { .. } | DrawCommand::FillCircle { .. } => {}
        }
    }
    grid.lines()
}

/// Print every page to stdout, separated by a rule.
pub fn draw_ascii(pages: &[Page]) {
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            println!("{}", "─".repeat((page.size.width / CHAR_PT) as usize));
        }
        for line in page_lines(page) {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::AlmanacData;
    use crate::config::Config;
    use crate::layout::{Font, PLACEHOLDER};
    use crate::page::{Almanac, Ephemeris};
    use crate::solar::SunTimes;
    use crate::HourlySample;
    use chrono::NaiveDate;
    use kurbo::{BezPath, Size};

    struct Sky;

    impl Ephemeris for Sky {
        fn sun_times(&self, _date: NaiveDate) -> SunTimes {
            SunTimes {
                sunrise: "07:58".to_string(),
                sunset: "16:29".to_string(),
            }
        }

        fn cycle_fraction(&self, _date: NaiveDate) -> f64 {
            0.5
        }
    }

    fn blank(width: f64, height: f64, commands: Vec<DrawCommand>) -> Page {
        Page {
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            size: Size::new(width, height),
            commands,
        }
    }

    #[test]
    fn aligned_text_lands_in_its_cells() {
        let item = |text: &str, align| {
            DrawCommand::text(TextItem::new(text, Point::new(0.0, 15.0), 60.0, align, Font::regular(9.0)))
        };
        for (align, expected) in [
            (Align::Left, "ab"),
            (Align::Center, "    ab"),
            (Align::Right, "        ab"),
        ] {
            let lines = page_lines(&blank(60.0, 20.0, vec![item("ab", align)]));
            assert_eq!(lines, ["", expected]);
        }
    }

    #[test]
    fn transforms_move_text() {
        let commands = vec![
            DrawCommand::PushTransform(Affine::translate((12.0, 10.0))),
            DrawCommand::text(TextItem::new("x", Point::new(0.0, 5.0), 6.0, Align::Left, Font::regular(9.0))),
            DrawCommand::PopTransform,
            DrawCommand::text(TextItem::new("y", Point::new(0.0, 5.0), 6.0, Align::Left, Font::regular(9.0))),
        ];
        let lines = page_lines(&blank(60.0, 20.0, commands));
        assert_eq!(lines, ["y", "  x"]);
    }

    #[test]
    fn curves_are_plotted() {
        let mut path = BezPath::new();
        path.move_to((0.0, 5.0));
        path.line_to((59.0, 5.0));
        let lines = page_lines(&blank(60.0, 10.0, vec![DrawCommand::StrokePath { path, width: 1.0, gray: 0.0 }]));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with('•'));
        assert!(lines[0].ends_with('•'));
    }

    #[test]
    fn composed_page_reads_top_to_bottom() {
        let config = Config::default();
        let mut data = AlmanacData::new();
        let hourly = (0..24)
            .map(|h| HourlySample::new(format!("2026-01-01 {h:02}:00"), (h as f64 / 3.0).cos() * 4.0 + 5.0))
            .collect();
        data.insert_hourly("9447130", hourly);
        let page = Almanac::new(&config, &data, Sky).compose_page(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        let lines = page_lines(&page);

        let header = lines.iter().find(|l| l.contains("Thursday")).unwrap();
        assert!(header.contains("Sunrise 07:58"));
        assert!(lines.iter().any(|l| l.contains("Full Moon")));
        assert!(lines.iter().any(|l| l.contains("Currents") && l.contains("Tides")));
        assert!(lines.iter().any(|l| l.contains(PLACEHOLDER)));
        assert!(lines.iter().any(|l| l.contains('•')));

        let row = |needle: &str| lines.iter().position(|l| l.contains(needle)).unwrap();
        assert!(row("Thursday") < row("Currents"));
        assert!(row("Currents") < row("Admiralty Inlet"));
    }
}
