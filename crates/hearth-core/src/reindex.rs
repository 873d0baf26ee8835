//! Shifting per-page records when the page list changes shape.
//!
//! Every per-page manager implements [`PageScoped`]. A structural change is
//! described by a [`Shift`]; [`reindex`] captures each populated page in the
//! affected span, erases the span, and writes the captured records back at
//! their new indices in a single batch.
//!
//! Each batch also records the sequence number of the change it applied, so
//! replaying a change after a crash skips managers that already applied it.
//! The change itself is recorded as a [`Journal`] in the page registry's
//! namespace before any manager is touched.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use crate::codec::{FIELD_SEPARATOR, LIST_SEPARATOR};
use crate::index::index_after_move;

/// Key each manager uses to remember the last change it applied.
pub const APPLIED_SEQ_KEY: &str = "reindex_seq";

/// A structural change to an indexed list of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// The page at `index` was deleted, leaving `new_count` pages.
    Removed { index: usize, new_count: usize },
    /// A page was inserted at `index`, giving `new_count` pages.
    Inserted { index: usize, new_count: usize },
    /// The page at `from` moved to `to` in a list of `count` pages.
    Moved { from: usize, to: usize, count: usize },
}

impl Shift {
    /// Indices whose records are captured and erased.
    pub fn span(&self) -> RangeInclusive<usize> {
        match *self {
            Self::Removed { new_count, .. } | Self::Inserted { new_count, .. } => 0..=new_count,
            Self::Moved { count, .. } => 0..=count,
        }
    }

    /// New index of the record captured at `old`; `None` if it is discarded.
    pub fn destination(&self, old: usize) -> Option<usize> {
        match *self {
            Self::Removed { index, .. } => match old.cmp(&index) {
                std::cmp::Ordering::Less => Some(old),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some(old - 1),
            },
            Self::Inserted { index, .. } => Some(if old < index { old } else { old + 1 }),
            Self::Moved { from, to, count } => {
                if old < count {
                    Some(index_after_move(old, from, to))
                } else {
                    Some(old)
                }
            },
        }
    }

    fn encode(&self) -> String {
        match *self {
            Self::Removed { index, new_count } => format!("removed,{index},{new_count}"),
            Self::Inserted { index, new_count } => format!("inserted,{index},{new_count}"),
            Self::Moved { from, to, count } => format!("moved,{from},{to},{count}"),
        }
    }

    fn decode(raw: &str) -> Option<Self> {
        let fields: Vec<&str> = raw.split(LIST_SEPARATOR).collect();
        let num = |i: usize| fields.get(i).and_then(|f| f.parse::<usize>().ok());
        match *fields.first()? {
            "removed" => Some(Self::Removed {
                index: num(1)?,
                new_count: num(2)?,
            }),
            "inserted" => Some(Self::Inserted {
                index: num(1)?,
                new_count: num(2)?,
            }),
            "moved" => Some(Self::Moved {
                from: num(1)?,
                to: num(2)?,
                count: num(3)?,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A per-page store whose records follow the page list.
pub trait PageScoped {
    /// Everything the manager keeps for one page.
    type Record: Clone;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Record held for `page`, or `None` when the page has default state.
    fn capture(&self, page: usize) -> Option<Self::Record>;

    /// Sequence number of the last change applied by [`PageScoped::replace_pages`].
    fn applied_seq(&self) -> u64;

    /// In one batch: erase `erase`, write `records`, and record `seq`.
    fn replace_pages(&mut self, erase: &[usize], records: Vec<(usize, Self::Record)>, seq: u64);
}

/// Apply `shift` to `manager` as change number `seq`.
///
/// Returns `false` when the manager already applied `seq` and was left alone.
pub fn reindex<M: PageScoped>(manager: &mut M, shift: Shift, seq: u64) -> bool {
    if manager.applied_seq() >= seq {
        log::debug!("{} already applied change {seq}", manager.name());
        return false;
    }
    let mut captured = BTreeMap::new();
    for page in shift.span() {
        if let Some(record) = manager.capture(page) {
            captured.insert(page, record);
        }
    }
    let erase: Vec<usize> = shift.span().collect();
    let records: Vec<(usize, M::Record)> = captured
        .into_iter()
        .filter_map(|(old, record)| shift.destination(old).map(|new| (new, record)))
        .collect();
    log::debug!(
        "{}: {shift} moves {} record(s) as change {seq}",
        manager.name(),
        records.len()
    );
    manager.replace_pages(&erase, records, seq);
    true
}

/// A structural change in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Journal {
    pub seq: u64,
    /// Shift applied to managers keyed by page position.
    pub pages: Shift,
    /// Shift applied to managers keyed by widget-page index, if any.
    pub widgets: Option<Shift>,
}

impl Journal {
    /// `seq~~pageShift~~widgetShift` (the widget field may be empty).
    pub fn encode(&self) -> String {
        [
            self.seq.to_string(),
            self.pages.encode(),
            self.widgets.map(|w| w.encode()).unwrap_or_default(),
        ]
        .join(FIELD_SEPARATOR)
    }

    pub fn decode(raw: &str) -> Option<Self> {
        let fields: Vec<&str> = raw.split(FIELD_SEPARATOR).collect();
        if fields.len() < 2 {
            return None;
        }
        let seq = fields[0].parse().ok()?;
        let pages = Shift::decode(fields[1])?;
        let widgets = match fields.get(2) {
            Some(w) if !w.is_empty() => Some(Shift::decode(w)?),
            _ => None,
        };
        Some(Self {
            seq,
            pages,
            widgets,
        })
    }
}
