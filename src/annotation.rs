use std::collections::HashSet;

use serde::Serialize;

/// Canvas bounds text annotations are clamped to.
pub const CANVAS_WIDTH: u32 = 1000;
pub const CANVAS_HEIGHT: u32 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanvasAnnotation {
    pub text: String,
    pub x: u32,
    pub y: u32,
}

/// Notes attached to one dashboard run. Owned by the caller and passed to
/// the renderers explicitly; nothing outlives the invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationSet {
    pub text_annotations: Vec<String>,
    pub canvas_annotations: Vec<CanvasAnnotation>,
}

impl AnnotationSet {
    /// Add a sidebar note. Blank notes are ignored; returns whether the note
    /// was kept.
    pub fn add_note(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.text_annotations.push(text.to_owned());
        true
    }

    /// Remove the sidebar notes at `indices`; unknown indices are ignored.
    pub fn remove_notes(&mut self, indices: &[usize]) {
        let drop: HashSet<usize> = indices.iter().copied().collect();
        let mut index = 0;
        self.text_annotations.retain(|_| {
            let keep = !drop.contains(&index);
            index += 1;
            keep
        });
    }

    /// Place text on the canvas, clamping the position to its bounds.
    pub fn add_canvas_text(&mut self, text: &str, x: u32, y: u32) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.canvas_annotations.push(CanvasAnnotation {
            text: text.to_owned(),
            x: x.min(CANVAS_WIDTH),
            y: y.min(CANVAS_HEIGHT),
        });
        true
    }

    pub fn is_empty(&self) -> bool {
        self.text_annotations.is_empty() && self.canvas_annotations.is_empty()
    }
}

/// Parse a `TEXT@X,Y` canvas annotation argument.
pub fn parse_canvas_arg(arg: &str) -> Option<(String, u32, u32)> {
    let (text, pos) = arg.rsplit_once('@')?;
    let (x, y) = pos.split_once(',')?;
    Some((text.to_owned(), x.trim().parse().ok()?, y.trim().parse().ok()?))
}
