//! # Raster Previews
//!
//! Renders pages into 1-bit framebuffers with `embedded-graphics`, for quick
//! previews without a PDF viewer. Each page can be written as a binary PBM (P4).
//!
//! Gray levels are thresholded: anything darker than mid gray is ink, anything
//! lighter is paper. Light fills therefore punch holes in dark ones, which is
//! what the moon overlays rely on.

use crate::canvas::{Canvas, RenderError};
use crate::layout::{Align, TextItem};
use crate::page::Page;
use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point as PixelPoint, Size as PixelSize},
    mono_font::{
        ascii::{
            FONT_10X20, FONT_5X8, FONT_6X10, FONT_7X13, FONT_7X13_BOLD, FONT_9X15,
            FONT_9X15_BOLD, FONT_9X18_BOLD,
        },
        MonoFont, MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    primitives::{Circle, Line, Primitive, PrimitiveStyle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
    Drawable, Pixel,
};
use kurbo::{Affine, BezPath, PathEl, Point, Shape, Size};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Flattening tolerance in device pixels.
const FLATTEN_TOLERANCE: f64 = 0.25;

/// 1-bit framebuffer, rows packed MSB first, 1 = ink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let bytes_per_row = width.div_ceil(8);
        Self {
            width,
            height,
            bits: vec![0x00; (bytes_per_row * height) as usize], // blank paper
        }
    }

    fn index(&self, x: u32, y: u32) -> (usize, u8) {
        let bytes_per_row = self.width.div_ceil(8);
        ((y * bytes_per_row + x / 8) as usize, 0x80 >> (x % 8))
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, ink: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (byte, mask) = self.index(x, y);
        if ink {
            self.bits[byte] |= mask;
        } else {
            self.bits[byte] &= !mask;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (byte, mask) = self.index(x, y);
        self.bits[byte] & mask != 0
    }

    pub fn ink_count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Binary PBM: the P4 bit layout is the same as ours.
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        out.extend_from_slice(&self.bits);
        out
    }
}

impl OriginDimensions for Framebuffer {
    fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }
}

impl DrawTarget for Framebuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

fn ink(gray: f64) -> BinaryColor {
    if gray < 0.5 {
        BinaryColor::On
    } else {
        BinaryColor::Off
    }
}

fn to_pixel(p: Point) -> PixelPoint {
    PixelPoint::new(p.x.round() as i32, p.y.round() as i32)
}

/// Closest mono font for a pixel size.
fn mono_font(pixels: f64, bold: bool) -> &'static MonoFont<'static> {
    match (pixels, bold) {
        (p, _) if p < 9.0 => &FONT_5X8,
        (p, _) if p < 12.0 => &FONT_6X10,
        (p, false) if p < 15.0 => &FONT_7X13,
        (p, true) if p < 15.0 => &FONT_7X13_BOLD,
        (p, false) if p < 19.0 => &FONT_9X15,
        (p, true) if p < 19.0 => &FONT_9X15_BOLD,
        (_, true) => &FONT_9X18_BOLD,
        (_, false) => &FONT_10X20,
    }
}

/// A [`Canvas`] drawing into one framebuffer per page.
pub struct RasterCanvas {
    scale: f64,
    width: u32,
    height: u32,
    finished: Vec<Framebuffer>,
    current: Framebuffer,
    ctm: Affine,
    stack: Vec<Affine>,
}

impl RasterCanvas {
    /// `scale` is device pixels per point.
    pub fn new(size: Size, scale: f64) -> Self {
        let width = (size.width * scale).ceil() as u32;
        let height = (size.height * scale).ceil() as u32;
        Self {
            scale,
            width,
            height,
            finished: Vec::new(),
            current: Framebuffer::new(width, height),
            ctm: Affine::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.finished.len() + 1
    }

    pub fn into_pages(mut self) -> Vec<Framebuffer> {
        self.finished.push(self.current);
        self.finished
    }

    /// Write one `<date>.pbm` per page into `dir`.
    pub fn write_previews(self, dir: &Path, pages: &[Page]) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();
        for (buffer, page) in self.into_pages().iter().zip(pages) {
            let path = dir.join(format!("{}.pbm", page.date));
            fs::write(&path, buffer.to_pbm())?;
            written.push(path);
        }
        info!(dir = %dir.display(), pages = written.len(), "wrote previews");
        Ok(written)
    }

    fn device(&self) -> Affine {
        Affine::scale(self.scale) * self.ctm
    }

    /// Linear scale of the device transform.
    fn device_scale(&self) -> f64 {
        self.device().determinant().abs().sqrt()
    }

    fn device_path(&self, path: &BezPath) -> BezPath {
        let mut path = path.clone();
        path.apply_affine(self.device());
        path
    }
}

impl Canvas for RasterCanvas {
    fn text(&mut self, item: &TextItem) {
        let font = mono_font(item.font.size * self.device_scale(), item.font.bold);
        let style = MonoTextStyle::new(font, BinaryColor::On);
        let (anchor, alignment) = match item.align {
            Align::Left => (item.origin.x, Alignment::Left),
            Align::Center => (item.origin.x + item.width / 2.0, Alignment::Center),
            Align::Right => (item.origin.x + item.width, Alignment::Right),
        };
        let text_style = TextStyleBuilder::new()
            .alignment(alignment)
            .baseline(Baseline::Alphabetic)
            .build();
        let position = to_pixel(self.device() * Point::new(anchor, item.origin.y));

        Text::with_text_style(&item.text, position, style, text_style)
            .draw(&mut self.current)
            .ok();
    }

    fn stroke(&mut self, path: &BezPath, width: f64, gray: f64) {
        let px = (width * self.device_scale()).round().max(1.0) as u32;
        let style = PrimitiveStyle::with_stroke(ink(gray), px);
        let mut segments = Vec::new();
        let mut last = Point::ZERO;
        let mut start = Point::ZERO;
        kurbo::flatten(self.device_path(path).iter(), FLATTEN_TOLERANCE, |el| match el {
            PathEl::MoveTo(p) => {
                last = p;
                start = p;
            }
            PathEl::LineTo(p) => {
                segments.push((last, p));
                last = p;
            }
            PathEl::ClosePath => {
                segments.push((last, start));
                last = start;
            }
            _ => {}
        });
        for (from, to) in segments {
            Line::new(to_pixel(from), to_pixel(to))
                .into_styled(style)
                .draw(&mut self.current)
                .ok();
        }
    }

    fn fill(&mut self, path: &BezPath, gray: f64) {
        let path = self.device_path(path);
        let bounds = path.bounding_box();
        let x0 = bounds.x0.floor().max(0.0) as u32;
        let y0 = bounds.y0.floor().max(0.0) as u32;
        let x1 = (bounds.x1.ceil().max(0.0) as u32).min(self.width);
        let y1 = (bounds.y1.ceil().max(0.0) as u32).min(self.height);
        let on = ink(gray).is_on();
        for y in y0..y1 {
            for x in x0..x1 {
                if path.contains(Point::new(x as f64 + 0.5, y as f64 + 0.5)) {
                    self.current.set_pixel(x, y, on);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, gray: f64) {
        let diameter = (2.0 * radius * self.device_scale()).round() as u32;
        Circle::with_center(to_pixel(self.device() * center), diameter)
            .into_styled(PrimitiveStyle::with_fill(ink(gray)))
            .draw(&mut self.current)
            .ok();
    }

    fn save(&mut self) {
        self.stack.push(self.ctm);
    }

    fn transform(&mut self, affine: Affine) {
        self.ctm *= affine;
    }

    fn restore(&mut self) {
        if let Some(ctm) = self.stack.pop() {
            self.ctm = ctm;
        }
    }

    fn new_page(&mut self) {
        let next = Framebuffer::new(self.width, self.height);
        self.finished.push(std::mem::replace(&mut self.current, next));
        self.ctm = Affine::IDENTITY;
        self.stack.clear();
    }
}
