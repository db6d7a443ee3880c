//! # PDF Backend
//!
//! Writes the almanac as a PDF with one page per day. Text uses the standard
//! Helvetica faces, so nothing is embedded; alignment is computed from their
//! AFM advance widths. Content streams are Flate-compressed.
//!
//! Draw commands use a top-left origin with y down. Each page's content stream
//! starts by flipping the PDF coordinate system to match, and text is flipped
//! back so glyphs stay upright.

use crate::canvas::{Canvas, RenderError};
use crate::layout::{Align, Font, TextItem, INK};
use kurbo::{BezPath, PathEl, Point, QuadBez, Size};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};
use std::fs;
use std::path::Path;
use tracing::info;

const REGULAR: Name<'static> = Name(b"F1");
const BOLD: Name<'static> = Name(b"F2");

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for ASCII 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Replace anything outside printable ASCII, which the base fonts can't show.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { '?' })
        .collect()
}

/// Advance width of `text` in points.
pub fn text_width(text: &str, font: Font) -> f64 {
    let widths = if font.bold {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    let units: u32 = printable(text)
        .bytes()
        .map(|b| widths[(b - b' ') as usize] as u32)
        .sum();
    units as f64 * font.size / 1000.0
}

/// Left edge of the text run inside its box.
fn aligned_x(item: &TextItem) -> f64 {
    let slack = item.width - text_width(&item.text, item.font);
    match item.align {
        Align::Left => item.origin.x,
        Align::Center => item.origin.x + slack / 2.0,
        Align::Right => item.origin.x + slack,
    }
}

/// A [`Canvas`] accumulating one content stream per page.
pub struct PdfCanvas {
    size: Size,
    finished: Vec<Content>,
    current: Content,
}

impl PdfCanvas {
    /// Start a document whose pages are `size` points; the first page is open.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            finished: Vec::new(),
            current: Self::page_content(size),
        }
    }

    fn page_content(size: Size) -> Content {
        let mut content = Content::new();
        content.transform([1.0, 0.0, 0.0, -1.0, 0.0, size.height as f32]);
        content
    }

    pub fn page_count(&self) -> usize {
        self.finished.len() + 1
    }

    fn append_path(&mut self, path: &BezPath) {
        let mut last = Point::ZERO;
        let mut start = Point::ZERO;
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => {
                    self.current.move_to(p.x as f32, p.y as f32);
                    last = p;
                    start = p;
                }
                PathEl::LineTo(p) => {
                    self.current.line_to(p.x as f32, p.y as f32);
                    last = p;
                }
                PathEl::QuadTo(p1, p2) => {
                    let cubic = QuadBez::new(last, p1, p2).raise();
                    self.current.cubic_to(
                        cubic.p1.x as f32,
                        cubic.p1.y as f32,
                        cubic.p2.x as f32,
                        cubic.p2.y as f32,
                        p2.x as f32,
                        p2.y as f32,
                    );
                    last = p2;
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    self.current.cubic_to(
                        p1.x as f32,
                        p1.y as f32,
                        p2.x as f32,
                        p2.y as f32,
                        p3.x as f32,
                        p3.y as f32,
                    );
                    last = p3;
                }
                PathEl::ClosePath => {
                    self.current.close_path();
                    last = start;
                }
            }
        }
    }

    /// Assemble the document.
    pub fn finish(mut self) -> Vec<u8> {
        let mut contents = std::mem::take(&mut self.finished);
        contents.push(self.current);
        let n = contents.len();

        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();
        let regular_id = alloc();
        let bold_id = alloc();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);
        pdf.type1_font(regular_id).base_font(Name(b"Helvetica"));
        pdf.type1_font(bold_id).base_font(Name(b"Helvetica-Bold"));

        for (i, content) in contents.into_iter().enumerate() {
            let raw = content.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);

            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, self.size.width as f32, self.size.height as f32))
                .parent(pages_id)
                .contents(content_ids[i]);
            page.resources()
                .fonts()
                .pair(REGULAR, regular_id)
                .pair(BOLD, bold_id);
        }

        pdf.finish()
    }

    /// Assemble the document and write it to `path`.
    pub fn write_to<P: AsRef<Path>>(self, path: P) -> Result<(), RenderError> {
        let pages = self.page_count();
        let bytes = self.finish();
        fs::write(&path, &bytes)?;
        info!(
            path = %path.as_ref().display(),
            pages,
            bytes = bytes.len(),
            "wrote PDF"
        );
        Ok(())
    }
}

impl Canvas for PdfCanvas {
    fn text(&mut self, item: &TextItem) {
        let font_name = if item.font.bold { BOLD } else { REGULAR };
        let x = aligned_x(item);
        let text = printable(&item.text);
        self.current
            .set_fill_gray(INK as f32)
            .begin_text()
            .set_font(font_name, item.font.size as f32)
            .set_text_matrix([1.0, 0.0, 0.0, -1.0, x as f32, item.origin.y as f32])
            .show(Str(text.as_bytes()))
            .end_text();
    }

    fn stroke(&mut self, path: &BezPath, width: f64, gray: f64) {
        self.current
            .set_line_width(width as f32)
            .set_stroke_gray(gray as f32);
        self.append_path(path);
        self.current.stroke();
    }

    fn fill(&mut self, path: &BezPath, gray: f64) {
        self.current.set_fill_gray(gray as f32);
        self.append_path(path);
        self.current.fill_nonzero();
    }

    fn save(&mut self) {
        self.current.save_state();
    }

    fn transform(&mut self, affine: kurbo::Affine) {
        let c = affine.as_coeffs();
        self.current.transform([
            c[0] as f32,
            c[1] as f32,
            c[2] as f32,
            c[3] as f32,
            c[4] as f32,
            c[5] as f32,
        ]);
    }

    fn restore(&mut self) {
        self.current.restore_state();
    }

    fn new_page(&mut self) {
        let next = Self::page_content(self.size);
        self.finished.push(std::mem::replace(&mut self.current, next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::render;
    use crate::layout::DrawCommand;
    use crate::page::Page;
    use chrono::NaiveDate;
    use kurbo::Affine;

    const LETTER: Size = Size::new(612.0, 792.0);

    fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn day_page(day: u32) -> Page {
        Page {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            size: LETTER,
            commands: vec![
                DrawCommand::text(TextItem::new(
                    "Tides",
                    Point::new(300.0, 128.0),
                    240.0,
                    Align::Center,
                    Font::bold(13.0),
                )),
                DrawCommand::PushTransform(Affine::translate((10.0, 10.0))),
                DrawCommand::rule(Point::ZERO, Point::new(100.0, 0.0), 0.8),
                DrawCommand::PopTransform,
                DrawCommand::FillCircle {
                    center: Point::new(306.0, 60.0),
                    radius: 18.0,
                    gray: 0.2,
                },
            ],
        }
    }

    #[test]
    fn text_width_uses_afm_metrics() {
        // T i d e s in Helvetica-Bold: 611 + 278 + 611 + 556 + 556
        let width = text_width("Tides", Font::bold(13.0));
        assert!((width - 2.612 * 13.0).abs() < 1e-9);
        // Regular digits are all 556
        assert!((text_width("06:49", Font::regular(10.0)) - (4.0 * 5.56 + 2.78)).abs() < 1e-9);
        assert_eq!(text_width("", Font::regular(12.0)), 0.0);
    }

    #[test]
    fn alignment_places_run_inside_box() {
        let item = |align| TextItem::new("Sunrise 07:58", Point::new(36.0, 56.0), 540.0, align, Font::regular(11.0));
        let run = text_width("Sunrise 07:58", Font::regular(11.0));
        assert_eq!(aligned_x(&item(Align::Left)), 36.0);
        assert!((aligned_x(&item(Align::Right)) + run - 576.0).abs() < 1e-9);
        assert!((aligned_x(&item(Align::Center)) + run / 2.0 - 306.0).abs() < 1e-9);
    }

    #[test]
    fn non_ascii_is_replaced() {
        assert_eq!(printable("Mukilteo — Whidbey"), "Mukilteo ? Whidbey");
        assert_eq!(
            text_width("é", Font::regular(10.0)),
            text_width("?", Font::regular(10.0))
        );
    }

    #[test]
    fn one_pdf_page_per_almanac_page() {
        let pages: Vec<Page> = (1..=3).map(day_page).collect();
        let mut canvas = PdfCanvas::new(LETTER);
        render(&pages, &mut canvas);
        assert_eq!(canvas.page_count(), 3);

        let bytes = canvas.finish();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(occurrences(&bytes, b"/Count 3") == 1);
        assert_eq!(occurrences(&bytes, b"/FlateDecode"), 3);
        assert!(occurrences(&bytes, b"/Helvetica-Bold") == 1);
        assert!(occurrences(&bytes, b"/MediaBox") == 3);
    }

    #[test]
    fn writes_document_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("almanac.pdf");
        let mut canvas = PdfCanvas::new(LETTER);
        render(&[day_page(1)], &mut canvas);
        canvas.write_to(&path).unwrap();

        let written = fs::read(&path).unwrap();
        assert!(written.starts_with(b"%PDF-"));
        assert!(occurrences(&written, b"/Count 1") == 1);
    }
}
