//! Named snapshots of a page's icon arrangement.
//!
//! Each page keeps up to a fixed number of saved layouts plus an optional
//! active one. The active id always names a layout stored on the same page.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use hearth_store::{Editor, Preferences, StoreHandle};
use hearth_types::app::AppPosition;
use hearth_types::config::MAX_LAYOUTS_PER_PAGE;

use crate::codec::{decode_layouts, encode_layouts, page_key, parse_page_key};
use crate::observe::{Observable, PageUpdate};
use crate::reindex::{APPLIED_SEQ_KEY, PageScoped};

pub const NAMESPACE: &str = "app_layouts";

const KEY_LAYOUTS: &str = "layouts_page_";
const KEY_ACTIVE: &str = "active_layout_page_";

/// A saved arrangement.
#[derive(Debug, Clone, PartialEq)]
pub struct AppLayout {
    pub id: Uuid,
    pub name: String,
    /// Keyed by package name.
    pub positions: BTreeMap<String, AppPosition>,
    /// Milliseconds since the Unix epoch at save time.
    pub timestamp: i64,
}

impl AppLayout {
    pub fn new<I>(name: impl Into<String>, positions: I) -> Self
    where
        I: IntoIterator<Item = AppPosition>,
    {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            positions: positions
                .into_iter()
                .map(|p| (p.package_name.clone(), p))
                .collect(),
            timestamp: now_millis(),
        }
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Layouts of one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayouts {
    pub layouts: Vec<AppLayout>,
    pub active: Option<Uuid>,
}

impl PageLayouts {
    fn is_default(&self) -> bool {
        self.layouts.is_empty() && self.active.is_none()
    }

    fn find(&self, id: Uuid) -> Option<&AppLayout> {
        self.layouts.iter().find(|l| l.id == id)
    }
}

/// Owns the `app_layouts` namespace.
#[derive(Debug)]
pub struct AppLayoutManager {
    prefs: Preferences,
    pages: BTreeMap<usize, PageLayouts>,
    max_per_page: usize,
    observers: Observable<PageUpdate<PageLayouts>>,
}

impl AppLayoutManager {
    pub fn open(store: StoreHandle) -> Self {
        Self::with_capacity(store, MAX_LAYOUTS_PER_PAGE)
    }

    pub fn with_capacity(store: StoreHandle, max_per_page: usize) -> Self {
        let prefs = Preferences::open(store, NAMESPACE);
        let mut pages: BTreeMap<usize, PageLayouts> = BTreeMap::new();
        for key in prefs.keys_with_prefix(KEY_LAYOUTS) {
            if let (Some(page), Some(raw)) = (parse_page_key(key, KEY_LAYOUTS), prefs.get_string(key)) {
                pages.entry(page).or_default().layouts = decode_layouts(raw);
            }
        }
        for key in prefs.keys_with_prefix(KEY_ACTIVE) {
            let Some(page) = parse_page_key(key, KEY_ACTIVE) else {
                continue;
            };
            let Some(id) = prefs.get_string(key).and_then(|raw| Uuid::parse_str(raw).ok()) else {
                log::warn!("Ignoring unreadable active layout for page {page}");
                continue;
            };
            let state = pages.entry(page).or_default();
            if state.find(id).is_some() {
                state.active = Some(id);
            } else {
                log::warn!("Page {page}: active layout {id} is not stored, dropping it");
            }
        }
        pages.retain(|_, p| !p.is_default());
        Self {
            prefs,
            pages,
            max_per_page,
            observers: Observable::new(),
        }
    }

    pub fn subscribe(&mut self) -> crossbeam_channel::Receiver<PageUpdate<PageLayouts>> {
        self.observers.subscribe()
    }

    /// Saved layouts of `page`, oldest first.
    pub fn layouts(&self, page: usize) -> Vec<AppLayout> {
        self.pages
            .get(&page)
            .map(|p| p.layouts.clone())
            .unwrap_or_default()
    }

    pub fn layout_count(&self, page: usize) -> usize {
        self.pages.get(&page).map_or(0, |p| p.layouts.len())
    }

    pub fn layout(&self, page: usize, id: Uuid) -> Option<AppLayout> {
        self.pages.get(&page)?.find(id).cloned()
    }

    /// Positions stored in a layout, sorted by package name.
    pub fn layout_positions(&self, page: usize, id: Uuid) -> Option<Vec<AppPosition>> {
        let layout = self.pages.get(&page)?.find(id)?;
        Some(layout.positions.values().cloned().collect())
    }

    /// Whether `page` has room for another layout.
    pub fn can_save(&self, page: usize) -> bool {
        self.layout_count(page) < self.max_per_page
    }

    /// Save a new layout on `page`.
    ///
    /// Returns its id, or `None` (leaving the page untouched) when the page
    /// already holds the maximum number of layouts.
    pub fn save_layout<I>(&mut self, page: usize, name: &str, positions: I) -> Option<Uuid>
    where
        I: IntoIterator<Item = AppPosition>,
    {
        if !self.can_save(page) {
            log::debug!("Page {page} already has {} layouts", self.max_per_page);
            return None;
        }
        let layout = AppLayout::new(name, positions);
        let id = layout.id;
        log::info!("Page {page}: saved layout {name:?} ({id})");
        self.pages.entry(page).or_default().layouts.push(layout);
        self.save(page);
        Some(id)
    }

    pub fn rename_layout(&mut self, page: usize, id: Uuid, name: &str) -> bool {
        let Some(layout) = self
            .pages
            .get_mut(&page)
            .and_then(|p| p.layouts.iter_mut().find(|l| l.id == id))
        else {
            return false;
        };
        layout.name = name.to_string();
        self.save(page);
        true
    }

    /// Delete a layout, clearing the active selection if it pointed there.
    pub fn delete_layout(&mut self, page: usize, id: Uuid) -> bool {
        let Some(state) = self.pages.get_mut(&page) else {
            return false;
        };
        let before = state.layouts.len();
        state.layouts.retain(|l| l.id != id);
        if state.layouts.len() == before {
            return false;
        }
        if state.active == Some(id) {
            state.active = None;
        }
        self.save(page);
        true
    }

    /// Select the active layout; `None` clears it. Unknown ids are rejected.
    pub fn set_active_layout(&mut self, page: usize, id: Option<Uuid>) -> bool {
        match id {
            Some(id) => {
                let Some(state) = self.pages.get_mut(&page).filter(|p| p.find(id).is_some()) else {
                    return false;
                };
                state.active = Some(id);
            },
            None => match self.pages.get_mut(&page) {
                Some(state) if state.active.is_some() => state.active = None,
                _ => return true,
            },
        }
        self.save(page);
        true
    }

    pub fn active_layout_id(&self, page: usize) -> Option<Uuid> {
        self.pages.get(&page)?.active
    }

    pub fn active_layout(&self, page: usize) -> Option<AppLayout> {
        let state = self.pages.get(&page)?;
        state.find(state.active?).cloned()
    }

    fn save(&mut self, page: usize) {
        let state = self.pages.get(&page).cloned().unwrap_or_default();
        if state.is_default() {
            self.pages.remove(&page);
        }
        write_page(self.prefs.edit(), page, &state).commit();
        self.observers.publish(PageUpdate { page, value: state });
    }
}

fn write_page<'a>(edit: Editor<'a>, page: usize, state: &PageLayouts) -> Editor<'a> {
    let layouts_key = page_key(KEY_LAYOUTS, page);
    let active_key = page_key(KEY_ACTIVE, page);
    let edit = if state.layouts.is_empty() {
        edit.remove(&layouts_key)
    } else {
        edit.put_string(&layouts_key, encode_layouts(&state.layouts))
    };
    match state.active {
        Some(id) => edit.put_string(&active_key, id.to_string()),
        None => edit.remove(&active_key),
    }
}

impl PageScoped for AppLayoutManager {
    type Record = PageLayouts;

    fn name(&self) -> &'static str {
        NAMESPACE
    }

    fn capture(&self, page: usize) -> Option<PageLayouts> {
        self.pages.get(&page).cloned()
    }

    fn applied_seq(&self) -> u64 {
        u64::try_from(self.prefs.get_int(APPLIED_SEQ_KEY, 0)).unwrap_or(0)
    }

    fn replace_pages(&mut self, erase: &[usize], records: Vec<(usize, PageLayouts)>, seq: u64) {
        let empty = PageLayouts::default();
        let mut edit = self.prefs.edit();
        for &page in erase {
            self.pages.remove(&page);
            edit = write_page(edit, page, &empty);
        }
        for (page, record) in &records {
            edit = write_page(edit, *page, record);
        }
        edit.put_int(APPLIED_SEQ_KEY, seq as i64).commit();
        let mut touched: Vec<usize> = erase
            .iter()
            .copied()
            .chain(records.iter().map(|(page, _)| *page))
            .collect();
        touched.sort_unstable();
        touched.dedup();
        self.pages.extend(records);
        for page in touched {
            let value = self.pages.get(&page).cloned().unwrap_or_default();
            self.observers.publish(PageUpdate { page, value });
        }
    }
}
