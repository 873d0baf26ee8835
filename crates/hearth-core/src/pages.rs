//! Ordered registry of pager pages.
//!
//! The registry is the single source of truth for page count and order. It
//! persists `(page_count, page_type_<i>)` pairs plus the home tab and any
//! reindex journal in the `pages` namespace; a structural change and its
//! journal always land in the same batch.

use hearth_store::{Preferences, StoreHandle};
use hearth_types::page::{MAX_PAGE_COUNT, PageType};

use crate::codec::page_key;
use crate::index::{home_tab_after_insert, home_tab_after_removal, index_after_move};
use crate::observe::Observable;
use crate::reindex::Journal;

pub const NAMESPACE: &str = "pages";

const KEY_PAGE_COUNT: &str = "page_count";
const KEY_PAGE_TYPE: &str = "page_type_";
const KEY_HOME_TAB: &str = "home_tab";
const KEY_JOURNAL: &str = "reindex_journal";
const KEY_LAST_SEQ: &str = "last_reindex_seq";

/// Snapshot published after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagesSnapshot {
    pub pages: Vec<PageType>,
    pub home_tab: usize,
}

/// Ordered list of page kinds with persisted mirroring.
#[derive(Debug)]
pub struct PageRegistry {
    prefs: Preferences,
    pages: Vec<PageType>,
    home_tab: usize,
    /// Highest page index accepted.
    max_index: usize,
    observers: Observable<PagesSnapshot>,
}

impl PageRegistry {
    /// Open with the default capacity.
    pub fn open(store: StoreHandle) -> Self {
        Self::with_capacity(store, MAX_PAGE_COUNT)
    }

    /// Open, accepting pages up to index `max_index`.
    ///
    /// A store with no pages (first run) gets a single `AppsOnly` page,
    /// persisted immediately.
    pub fn with_capacity(store: StoreHandle, max_index: usize) -> Self {
        let prefs = Preferences::open(store, NAMESPACE);
        let count = usize::try_from(prefs.get_int(KEY_PAGE_COUNT, 0)).unwrap_or(0);
        let pages: Vec<PageType> = (0..count)
            .map(|i| {
                let key = page_key(KEY_PAGE_TYPE, i);
                match prefs.get_string(&key).and_then(PageType::from_key) {
                    Some(t) => t,
                    None => {
                        log::warn!("Page {i} has no readable type, treating as apps_only");
                        PageType::AppsOnly
                    },
                }
            })
            .collect();
        if pages.len() > max_index + 1 {
            log::warn!(
                "Store holds {} pages, more than the configured {}",
                pages.len(),
                max_index + 1
            );
        }
        let home_tab = usize::try_from(prefs.get_int(KEY_HOME_TAB, 0)).unwrap_or(0);
        let mut registry = Self {
            prefs,
            pages,
            home_tab,
            max_index,
            observers: Observable::new(),
        };
        if registry.pages.is_empty() {
            log::info!("No pages stored, creating the first apps page");
            registry.pages.push(PageType::AppsOnly);
            registry.home_tab = 0;
            registry.persist(0, None);
        } else if registry.home_tab >= registry.pages.len() {
            registry.home_tab = 0;
        }
        registry
    }

    pub fn pages(&self) -> &[PageType] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_type(&self, index: usize) -> Option<PageType> {
        self.pages.get(index).copied()
    }

    /// Whether another page fits.
    pub fn can_add(&self) -> bool {
        self.pages.len() <= self.max_index
    }

    pub fn home_tab(&self) -> usize {
        self.home_tab
    }

    /// Set the home tab. Out-of-range indices are ignored.
    pub fn set_home_tab(&mut self, index: usize) -> bool {
        if index >= self.pages.len() {
            return false;
        }
        self.home_tab = index;
        self.prefs.put_int(KEY_HOME_TAB, index as i64);
        self.notify();
        true
    }

    pub fn subscribe(&mut self) -> crossbeam_channel::Receiver<PagesSnapshot> {
        self.observers.subscribe()
    }

    pub fn snapshot(&self) -> PagesSnapshot {
        PagesSnapshot {
            pages: self.pages.clone(),
            home_tab: self.home_tab,
        }
    }

    /// Append a page. Returns its index, or `None` when the pager is full.
    pub fn add_page(&mut self, page_type: PageType) -> Option<usize> {
        if !self.can_add() {
            log::debug!("Pager full, not adding {page_type}");
            return None;
        }
        let old_len = self.pages.len();
        self.pages.push(page_type);
        self.persist(old_len, None);
        log::info!("Added {page_type} page at {}", old_len);
        Some(old_len)
    }

    /// Insert a page at `index` (clamped to the end). Returns the index used.
    pub fn insert_page(&mut self, index: usize, page_type: PageType) -> Option<usize> {
        self.insert_page_journaled(index, page_type, None)
    }

    /// Remove the page at `index`. Invalid indices are a no-op.
    pub fn remove_page(&mut self, index: usize) -> Option<PageType> {
        self.remove_page_journaled(index, None)
    }

    /// Move the page at `from` to `to`. Returns `false` for invalid indices.
    pub fn move_page(&mut self, from: usize, to: usize) -> bool {
        self.move_page_journaled(from, to, None)
    }

    pub(crate) fn insert_page_journaled(
        &mut self,
        index: usize,
        page_type: PageType,
        journal: Option<&Journal>,
    ) -> Option<usize> {
        if !self.can_add() {
            return None;
        }
        let old_len = self.pages.len();
        let index = index.min(old_len);
        self.pages.insert(index, page_type);
        if old_len > 0 {
            self.home_tab = home_tab_after_insert(self.home_tab, index);
        }
        self.persist(old_len, journal);
        log::info!("Inserted {page_type} page at {index}");
        Some(index)
    }

    pub(crate) fn remove_page_journaled(
        &mut self,
        index: usize,
        journal: Option<&Journal>,
    ) -> Option<PageType> {
        if index >= self.pages.len() {
            log::debug!("Ignoring removal of missing page {index}");
            return None;
        }
        let old_len = self.pages.len();
        let removed = self.pages.remove(index);
        self.home_tab = home_tab_after_removal(self.home_tab, index);
        if self.pages.is_empty() {
            log::warn!("Last page removed; a fresh page is created on next start");
        }
        self.persist(old_len, journal);
        log::info!("Removed {removed} page at {index}");
        Some(removed)
    }

    pub(crate) fn move_page_journaled(
        &mut self,
        from: usize,
        to: usize,
        journal: Option<&Journal>,
    ) -> bool {
        let len = self.pages.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }
        let page = self.pages.remove(from);
        self.pages.insert(to, page);
        self.home_tab = index_after_move(self.home_tab, from, to);
        self.persist(len, journal);
        log::info!("Moved page {from} to {to}");
        true
    }

    /// Journal of a structural change whose manager updates may be incomplete.
    pub fn pending_journal(&self) -> Option<Journal> {
        let raw = self.prefs.get_string(KEY_JOURNAL)?;
        let journal = Journal::decode(raw);
        if journal.is_none() {
            log::warn!("Unreadable reindex journal {raw:?}");
        }
        journal
    }

    /// Sequence number of the last journaled change, 0 if none was recorded.
    pub fn last_seq(&self) -> u64 {
        u64::try_from(self.prefs.get_int(KEY_LAST_SEQ, 0)).unwrap_or(0)
    }

    pub(crate) fn clear_journal(&mut self) {
        self.prefs.remove(KEY_JOURNAL);
    }

    /// Rewrite every entry, drop the stale slot past the new tail, and record
    /// `journal` (if any) in the same batch.
    fn persist(&mut self, old_len: usize, journal: Option<&Journal>) {
        let mut edit = self
            .prefs
            .edit()
            .put_int(KEY_PAGE_COUNT, self.pages.len() as i64)
            .put_int(KEY_HOME_TAB, self.home_tab as i64);
        for (i, page) in self.pages.iter().enumerate() {
            edit = edit.put_string(&page_key(KEY_PAGE_TYPE, i), page.as_key());
        }
        for stale in self.pages.len()..old_len {
            edit = edit.remove(&page_key(KEY_PAGE_TYPE, stale));
        }
        if let Some(journal) = journal {
            edit = edit
                .put_string(KEY_JOURNAL, journal.encode())
                .put_int(KEY_LAST_SEQ, journal.seq as i64);
        }
        edit.commit();
        self.notify();
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot();
        self.observers.publish(snapshot);
    }
}
