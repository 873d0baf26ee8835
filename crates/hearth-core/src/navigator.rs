//! Directional focus movement between free-form icons.
//!
//! Candidates must lie strictly on the requested side of the current icon
//! along the movement axis. Among those, the one with the smallest distance
//! along that axis wins; the orthogonal offset is ignored. Ties go to the
//! candidate seen first, which for a `BTreeMap` is the lowest index.

use std::collections::BTreeMap;

use hearth_types::input::Direction;

/// Icon anchor in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Nearest icon from `from` in `direction`, or `None` if nothing qualifies.
pub fn navigate(points: &BTreeMap<usize, Point>, from: usize, direction: Direction) -> Option<usize> {
    let current = points.get(&from)?;
    let mut best: Option<(usize, f32)> = None;
    for (&index, p) in points {
        let distance = match direction {
            Direction::Up if p.y < current.y => current.y - p.y,
            Direction::Down if p.y > current.y => p.y - current.y,
            Direction::Left if p.x < current.x => current.x - p.x,
            Direction::Right if p.x > current.x => p.x - current.x,
            _ => continue,
        };
        // Strict `<` keeps the first-seen candidate on ties.
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

/// Keyboard focus on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusCursor {
    focused: Option<usize>,
}

impl FocusCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn focus(&mut self, index: usize) {
        self.focused = Some(index);
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }

    /// Move focus in `direction`. With nothing focused, the lowest index is
    /// focused instead. Returns the focus after the step.
    pub fn step(&mut self, points: &BTreeMap<usize, Point>, direction: Direction) -> Option<usize> {
        match self.focused {
            Some(current) if points.contains_key(&current) => {
                if let Some(next) = navigate(points, current, direction) {
                    self.focused = Some(next);
                }
            },
            _ => {
                self.focused = points.keys().next().copied();
            },
        }
        self.focused
    }
}
