//! Drawing backend seam.
//!
//! Backends implement [`Canvas`]; [`render`] replays composed pages onto one.
//! The first page is assumed to be open already, so a backend sees
//! `new_page` exactly once per additional day.

use crate::layout::{DrawCommand, TextItem};
use crate::page::Page;
use kurbo::{Affine, BezPath, Circle, Line, Point, Shape};
use std::io;
use thiserror::Error;

/// Flattening tolerance for shapes turned into paths, in points.
pub const PATH_TOLERANCE: f64 = 0.05;

/// Errors writing rendered output.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("output IO: {0}")]
    Io(#[from] io::Error),
}

/// The operations a drawing backend must support.
///
/// Gray levels run from 0 (black) to 1 (white).
pub trait Canvas {
    fn text(&mut self, item: &TextItem);

    fn stroke(&mut self, path: &BezPath, width: f64, gray: f64);

    fn fill(&mut self, path: &BezPath, gray: f64);

    fn fill_circle(&mut self, center: Point, radius: f64, gray: f64) {
        self.fill(&Circle::new(center, radius).to_path(PATH_TOLERANCE), gray);
    }

    /// Push the graphics state.
    fn save(&mut self);

    /// Concatenate `affine` onto the current transform.
    fn transform(&mut self, affine: Affine);

    /// Pop the graphics state pushed by the matching `save`.
    fn restore(&mut self);

    /// Finish the current page and start a blank one.
    fn new_page(&mut self);
}

/// Replay one page's commands in order.
pub fn replay<C: Canvas + ?Sized>(commands: &[DrawCommand], canvas: &mut C) {
    for command in commands {
        match command {
            DrawCommand::Text(item) => canvas.text(item),
            DrawCommand::Line {
                from,
                to,
                width,
                gray,
            } => canvas.stroke(&Line::new(*from, *to).to_path(PATH_TOLERANCE), *width, *gray),
            DrawCommand::StrokePath { path, width, gray } => canvas.stroke(path, *width, *gray),
            DrawCommand::FillPath { path, gray } => canvas.fill(path, *gray),
            DrawCommand::FillCircle {
                center,
                radius,
                gray,
            } => canvas.fill_circle(*center, *radius, *gray),
            DrawCommand::PushTransform(affine) => {
                canvas.save();
                canvas.transform(*affine);
            }
            DrawCommand::PopTransform => canvas.restore(),
        }
    }
}

/// Render every page, opening a new page before each one after the first.
pub fn render<C: Canvas + ?Sized>(pages: &[Page], canvas: &mut C) {
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            canvas.new_page();
        }
        replay(&page.commands, canvas);
    }
}
