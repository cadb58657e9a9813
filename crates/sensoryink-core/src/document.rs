//! Drawing document: stroke list, selection set, and action-log undo/redo.

use crate::stroke::{Color, InkPoint, Stroke};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of undo actions to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// One reversible document mutation.
///
/// Each variant carries everything needed to apply it in either direction,
/// so the same value moves between the undo and redo stacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DocAction {
    /// A stroke was appended to the end of the list.
    Add(Stroke),
    /// Strokes were removed; entries are `(index, stroke)` in ascending
    /// index order.
    Delete(Vec<(usize, Stroke)>),
    /// Stroke colors were replaced; entries pair each index with its prior
    /// color.
    Recolor {
        entries: Vec<(usize, Color)>,
        color: Color,
    },
    /// Strokes were translated by a world-space delta.
    Translate { indices: Vec<usize>, delta: Vec2 },
    /// Strokes were scaled about a world-space pivot. Entries carry each
    /// stroke's pre-scale points so undo restores geometry exactly.
    Scale {
        entries: Vec<(usize, Vec<InkPoint>)>,
        pivot: Point,
        sx: f64,
        sy: f64,
    },
}

/// An ordered list of strokes plus edit history and selection.
///
/// Render order equals list order: later strokes paint over earlier ones.
/// Committing any new action clears the redo log.
#[derive(Debug, Clone, Default)]
pub struct Document {
    strokes: Vec<Stroke>,
    selection: HashSet<usize>,
    undo_log: Vec<DocAction>,
    redo_log: Vec<DocAction>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke(&self, index: usize) -> Option<&Stroke> {
        self.strokes.get(index)
    }

    pub fn stroke_mut(&mut self, index: usize) -> Option<&mut Stroke> {
        self.strokes.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Bounding box of all strokes, or `None` for an empty document.
    pub fn bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for stroke in &self.strokes {
            let bounds = stroke.bounds();
            result = Some(match result {
                Some(r) => r.union(bounds),
                None => bounds,
            });
        }
        result
    }

    // --- selection ---

    pub fn selection(&self) -> &HashSet<usize> {
        &self.selection
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    pub fn select(&mut self, index: usize, additive: bool) {
        if !additive {
            self.selection.clear();
        }
        if index < self.strokes.len() {
            self.selection.insert(index);
        }
    }

    pub fn select_many(&mut self, indices: impl IntoIterator<Item = usize>, additive: bool) {
        if !additive {
            self.selection.clear();
        }
        let len = self.strokes.len();
        self.selection.extend(indices.into_iter().filter(|&i| i < len));
    }

    pub fn select_all(&mut self) {
        self.selection = (0..self.strokes.len()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selection indices in ascending order.
    pub fn selection_sorted(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.selection.iter().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Union bounds of the selected strokes.
    pub fn selection_bounds(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for &index in &self.selection {
            let Some(stroke) = self.strokes.get(index) else {
                continue;
            };
            let bounds = stroke.bounds();
            result = Some(match result {
                Some(r) => r.union(bounds),
                None => bounds,
            });
        }
        result
    }

    // --- commits ---

    fn push_action(&mut self, action: DocAction) {
        self.undo_log.push(action);
        self.redo_log.clear();
        if self.undo_log.len() > MAX_UNDO_HISTORY {
            self.undo_log.remove(0);
        }
    }

    /// Append a stroke and log the addition.
    pub fn commit_stroke(&mut self, stroke: Stroke) {
        self.strokes.push(stroke.clone());
        self.push_action(DocAction::Add(stroke));
    }

    /// Remove the given strokes and log one delete action. Clears the
    /// selection. Indices that are out of range are ignored.
    pub fn delete_strokes(&mut self, indices: &[usize]) {
        let mut sorted: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.strokes.len())
            .collect();
        sorted.sort_unstable();
        sorted.dedup();
        if sorted.is_empty() {
            return;
        }

        let mut entries = Vec::with_capacity(sorted.len());
        for &index in sorted.iter().rev() {
            entries.push((index, self.strokes.remove(index)));
        }
        entries.reverse();

        self.selection.clear();
        self.push_action(DocAction::Delete(entries));
    }

    /// Replace the color of the given strokes and log one recolor action.
    /// A no-op (and nothing is logged) when `indices` is empty.
    pub fn recolor_strokes(&mut self, indices: &[usize], color: Color) {
        let mut entries = Vec::new();
        for &index in indices {
            if let Some(stroke) = self.strokes.get_mut(index) {
                entries.push((index, stroke.config.color));
                stroke.config.color = color;
            }
        }
        if entries.is_empty() {
            return;
        }
        self.push_action(DocAction::Recolor { entries, color });
    }

    /// Log a translation that was already applied to the strokes during an
    /// interactive drag.
    pub fn log_translate(&mut self, indices: Vec<usize>, delta: Vec2) {
        if indices.is_empty() {
            return;
        }
        self.push_action(DocAction::Translate { indices, delta });
    }

    /// Log a scale that was already applied to the strokes during an
    /// interactive handle drag. `entries` pair each index with the
    /// stroke's pre-scale points.
    pub fn log_scale(
        &mut self,
        entries: Vec<(usize, Vec<InkPoint>)>,
        pivot: Point,
        sx: f64,
        sy: f64,
    ) {
        if entries.is_empty() || sx == 0.0 || sy == 0.0 {
            return;
        }
        self.push_action(DocAction::Scale {
            entries,
            pivot,
            sx,
            sy,
        });
    }

    /// Delete every stroke as one reversible action.
    pub fn clear_all(&mut self) {
        let all: Vec<usize> = (0..self.strokes.len()).collect();
        self.delete_strokes(&all);
    }

    /// Replace the entire document, dropping history and selection. Used by
    /// deserialization.
    pub fn replace_strokes(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes;
        self.selection.clear();
        self.undo_log.clear();
        self.redo_log.clear();
    }

    // --- undo/redo ---

    pub fn can_undo(&self) -> bool {
        !self.undo_log.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_log.is_empty()
    }

    /// Undo the most recent action. Returns false when the log is empty.
    /// Selection is cleared because indices may no longer hold.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo_log.pop() else {
            return false;
        };
        self.selection.clear();

        match action {
            DocAction::Add(_) => {
                if let Some(stroke) = self.strokes.pop() {
                    self.redo_log.push(DocAction::Add(stroke));
                }
            }
            DocAction::Delete(entries) => {
                for (index, stroke) in &entries {
                    let at = (*index).min(self.strokes.len());
                    self.strokes.insert(at, stroke.clone());
                }
                self.redo_log.push(DocAction::Delete(entries));
            }
            DocAction::Recolor { entries, color } => {
                for (index, old_color) in &entries {
                    if let Some(stroke) = self.strokes.get_mut(*index) {
                        stroke.config.color = *old_color;
                    }
                }
                self.redo_log.push(DocAction::Recolor { entries, color });
            }
            DocAction::Translate { indices, delta } => {
                for &index in &indices {
                    if let Some(stroke) = self.strokes.get_mut(index) {
                        stroke.translate(-delta);
                    }
                }
                self.redo_log.push(DocAction::Translate { indices, delta });
            }
            DocAction::Scale {
                entries,
                pivot,
                sx,
                sy,
            } => {
                for (index, original) in &entries {
                    if let Some(stroke) = self.strokes.get_mut(*index) {
                        stroke.points = original.clone();
                    }
                }
                self.redo_log.push(DocAction::Scale {
                    entries,
                    pivot,
                    sx,
                    sy,
                });
            }
        }
        true
    }

    /// Redo the most recently undone action. Returns false when the redo
    /// log is empty.
    pub fn redo(&mut self) -> bool {
        let Some(action) = self.redo_log.pop() else {
            return false;
        };
        self.selection.clear();

        match action {
            DocAction::Add(stroke) => {
                self.strokes.push(stroke.clone());
                self.undo_log.push(DocAction::Add(stroke));
            }
            DocAction::Delete(entries) => {
                for (index, _) in entries.iter().rev() {
                    if *index < self.strokes.len() {
                        self.strokes.remove(*index);
                    }
                }
                self.undo_log.push(DocAction::Delete(entries));
            }
            DocAction::Recolor { entries, color } => {
                for (index, _) in &entries {
                    if let Some(stroke) = self.strokes.get_mut(*index) {
                        stroke.config.color = color;
                    }
                }
                self.undo_log.push(DocAction::Recolor { entries, color });
            }
            DocAction::Translate { indices, delta } => {
                for &index in &indices {
                    if let Some(stroke) = self.strokes.get_mut(index) {
                        stroke.translate(delta);
                    }
                }
                self.undo_log.push(DocAction::Translate { indices, delta });
            }
            DocAction::Scale {
                entries,
                pivot,
                sx,
                sy,
            } => {
                for (index, _) in &entries {
                    if let Some(stroke) = self.strokes.get_mut(*index) {
                        stroke.scale_about(pivot, sx, sy);
                    }
                }
                self.undo_log.push(DocAction::Scale {
                    entries,
                    pivot,
                    sx,
                    sy,
                });
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{InkPoint, StrokeConfig};

    fn stroke_at(x: f64, y: f64) -> Stroke {
        Stroke::from_points(
            StrokeConfig::default(),
            vec![
                InkPoint::new(x, y, 0.5, 0.0),
                InkPoint::new(x + 10.0, y, 0.5, 10.0),
            ],
        )
    }

    #[test]
    fn test_commit_and_undo_add() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(0.0, 0.0));
        assert_eq!(doc.len(), 1);
        assert!(doc.can_undo());

        assert!(doc.undo());
        assert!(doc.is_empty());
        assert!(doc.can_redo());

        assert!(doc.redo());
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_delete_restores_original_indices() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(0.0, 0.0));
        doc.commit_stroke(stroke_at(100.0, 0.0));
        doc.commit_stroke(stroke_at(200.0, 0.0));

        doc.delete_strokes(&[0, 2]);
        assert_eq!(doc.len(), 1);
        assert!((doc.stroke(0).unwrap().points[0].x - 100.0).abs() < f64::EPSILON);

        assert!(doc.undo());
        assert_eq!(doc.len(), 3);
        assert!((doc.stroke(0).unwrap().points[0].x - 0.0).abs() < f64::EPSILON);
        assert!((doc.stroke(2).unwrap().points[0].x - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recolor_empty_is_skipped() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(0.0, 0.0));
        doc.recolor_strokes(&[], Color::new(255, 0, 0, 255));
        // Nothing logged: one undo pops the add.
        assert!(doc.undo());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_recolor_undo_restores_colors() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(0.0, 0.0));
        let red = Color::new(255, 0, 0, 255);
        doc.recolor_strokes(&[0], red);
        assert_eq!(doc.stroke(0).unwrap().config.color, red);

        assert!(doc.undo());
        assert_eq!(doc.stroke(0).unwrap().config.color, Color::black());
        assert!(doc.redo());
        assert_eq!(doc.stroke(0).unwrap().config.color, red);
    }

    #[test]
    fn test_translate_roundtrip() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(0.0, 0.0));
        if let Some(stroke) = doc.stroke_mut(0) {
            stroke.translate(Vec2::new(5.0, 7.0));
        }
        doc.log_translate(vec![0], Vec2::new(5.0, 7.0));

        assert!(doc.undo());
        assert!((doc.stroke(0).unwrap().points[0].x).abs() < f64::EPSILON);
        assert!(doc.redo());
        assert!((doc.stroke(0).unwrap().points[0].x - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_scale_undo_restores_geometry_exactly() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(10.0, 10.0));
        let original = doc.stroke(0).unwrap().points.clone();
        let pivot = Point::new(10.0, 10.0);
        // An awkward factor whose division would not round-trip in floats.
        let (sx, sy) = (1.3, 0.7);
        if let Some(stroke) = doc.stroke_mut(0) {
            stroke.scale_about(pivot, sx, sy);
        }
        doc.log_scale(vec![(0, original.clone())], pivot, sx, sy);

        assert!(doc.undo());
        assert_eq!(doc.stroke(0).unwrap().points, original);

        // Redo reproduces the scaled geometry deterministically.
        assert!(doc.redo());
        let p = doc.stroke(0).unwrap().points[1];
        assert_eq!(p.x, 10.0 + (original[1].x - 10.0) * sx);
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(0.0, 0.0));
        assert!(doc.undo());
        assert!(doc.can_redo());

        doc.commit_stroke(stroke_at(50.0, 0.0));
        assert!(!doc.can_redo());
    }

    #[test]
    fn test_undo_clears_selection() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(0.0, 0.0));
        doc.select(0, false);
        assert!(doc.is_selected(0));
        assert!(doc.undo());
        assert!(doc.selection().is_empty());
    }

    #[test]
    fn test_clear_all_is_reversible() {
        let mut doc = Document::new();
        doc.commit_stroke(stroke_at(0.0, 0.0));
        doc.commit_stroke(stroke_at(50.0, 0.0));
        doc.clear_all();
        assert!(doc.is_empty());
        assert!(doc.undo());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_undo_empty_stack() {
        let mut doc = Document::new();
        assert!(!doc.undo());
        assert!(!doc.redo());
    }
}
