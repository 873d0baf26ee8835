//! Apps shown on each widget page, and whether they render above the widgets.
//!
//! Records are keyed by widget-page index (see [`crate::index`]), not by
//! pager position.

use std::collections::{BTreeMap, BTreeSet};

use hearth_store::{Editor, Preferences, StoreHandle};

use crate::codec::{decode_set, encode_set, page_key, parse_page_key};
use crate::observe::{Observable, PageUpdate};
use crate::reindex::{APPLIED_SEQ_KEY, PageScoped};

pub const NAMESPACE: &str = "widget_apps";

const KEY_VISIBLE: &str = "visible_apps_page_";
const KEY_APPS_FIRST: &str = "apps_first_page_";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetPageApps {
    pub visible: BTreeSet<String>,
    /// Apps section renders before the widgets.
    pub apps_first: bool,
}

impl WidgetPageApps {
    fn is_default(&self) -> bool {
        self.visible.is_empty() && !self.apps_first
    }
}

/// Owns the `widget_apps` namespace.
#[derive(Debug)]
pub struct WidgetAppsManager {
    prefs: Preferences,
    pages: BTreeMap<usize, WidgetPageApps>,
    observers: Observable<PageUpdate<WidgetPageApps>>,
}

impl WidgetAppsManager {
    pub fn open(store: StoreHandle) -> Self {
        let prefs = Preferences::open(store, NAMESPACE);
        let mut pages: BTreeMap<usize, WidgetPageApps> = BTreeMap::new();
        for key in prefs.keys_with_prefix(KEY_VISIBLE) {
            if let (Some(page), Some(raw)) = (parse_page_key(key, KEY_VISIBLE), prefs.get_string(key)) {
                pages.entry(page).or_default().visible = decode_set(raw);
            }
        }
        for key in prefs.keys_with_prefix(KEY_APPS_FIRST) {
            if let Some(page) = parse_page_key(key, KEY_APPS_FIRST) {
                pages.entry(page).or_default().apps_first = prefs.get_bool(key, false);
            }
        }
        pages.retain(|_, p| !p.is_default());
        Self {
            prefs,
            pages,
            observers: Observable::new(),
        }
    }

    pub fn subscribe(&mut self) -> crossbeam_channel::Receiver<PageUpdate<WidgetPageApps>> {
        self.observers.subscribe()
    }

    pub fn visible_apps(&self, widget_page: usize) -> BTreeSet<String> {
        self.pages
            .get(&widget_page)
            .map(|p| p.visible.clone())
            .unwrap_or_default()
    }

    pub fn is_app_visible(&self, widget_page: usize, package_name: &str) -> bool {
        self.pages
            .get(&widget_page)
            .is_some_and(|p| p.visible.contains(package_name))
    }

    pub fn show_app(&mut self, widget_page: usize, package_name: &str) {
        if package_name.is_empty() {
            return;
        }
        let inserted = self
            .pages
            .entry(widget_page)
            .or_default()
            .visible
            .insert(package_name.to_string());
        if inserted {
            self.save(widget_page);
        }
    }

    pub fn hide_app(&mut self, widget_page: usize, package_name: &str) {
        let removed = self
            .pages
            .get_mut(&widget_page)
            .is_some_and(|p| p.visible.remove(package_name));
        if removed {
            self.save(widget_page);
        }
    }

    /// Flip an app's membership. Returns whether it is now shown.
    pub fn toggle_app(&mut self, widget_page: usize, package_name: &str) -> bool {
        if self.is_app_visible(widget_page, package_name) {
            self.hide_app(widget_page, package_name);
            false
        } else {
            self.show_app(widget_page, package_name);
            self.is_app_visible(widget_page, package_name)
        }
    }

    pub fn set_visible_apps(&mut self, widget_page: usize, apps: BTreeSet<String>) {
        self.pages.entry(widget_page).or_default().visible = apps;
        self.save(widget_page);
    }

    /// Drop every app from the page, keeping the section order.
    pub fn clear(&mut self, widget_page: usize) {
        if let Some(p) = self.pages.get_mut(&widget_page) {
            if !p.visible.is_empty() {
                p.visible.clear();
                self.save(widget_page);
            }
        }
    }

    pub fn apps_first(&self, widget_page: usize) -> bool {
        self.pages.get(&widget_page).is_some_and(|p| p.apps_first)
    }

    pub fn set_apps_first(&mut self, widget_page: usize, apps_first: bool) {
        if self.apps_first(widget_page) == apps_first {
            return;
        }
        self.pages.entry(widget_page).or_default().apps_first = apps_first;
        self.save(widget_page);
    }

    fn save(&mut self, widget_page: usize) {
        let state = self.pages.get(&widget_page).cloned().unwrap_or_default();
        if state.is_default() {
            self.pages.remove(&widget_page);
        }
        write_page(self.prefs.edit(), widget_page, &state).commit();
        self.observers.publish(PageUpdate {
            page: widget_page,
            value: state,
        });
    }
}

fn write_page<'a>(edit: Editor<'a>, widget_page: usize, state: &WidgetPageApps) -> Editor<'a> {
    let visible_key = page_key(KEY_VISIBLE, widget_page);
    let order_key = page_key(KEY_APPS_FIRST, widget_page);
    let edit = if state.visible.is_empty() {
        edit.remove(&visible_key)
    } else {
        edit.put_string(&visible_key, encode_set(&state.visible))
    };
    if state.apps_first {
        edit.put_bool(&order_key, true)
    } else {
        edit.remove(&order_key)
    }
}

impl PageScoped for WidgetAppsManager {
    type Record = WidgetPageApps;

    fn name(&self) -> &'static str {
        NAMESPACE
    }

    fn capture(&self, page: usize) -> Option<WidgetPageApps> {
        self.pages.get(&page).cloned()
    }

    fn applied_seq(&self) -> u64 {
        u64::try_from(self.prefs.get_int(APPLIED_SEQ_KEY, 0)).unwrap_or(0)
    }

    fn replace_pages(&mut self, erase: &[usize], records: Vec<(usize, WidgetPageApps)>, seq: u64) {
        let empty = WidgetPageApps::default();
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
