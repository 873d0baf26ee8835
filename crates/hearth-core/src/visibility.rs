//! Per-page hidden-app sets.

use std::collections::{BTreeMap, BTreeSet};

use hearth_store::{Editor, Preferences, StoreHandle};
use hearth_types::app::AppInfo;

use crate::codec::{decode_set, encode_set, page_key, parse_page_key};
use crate::observe::{Observable, PageUpdate};
use crate::reindex::{APPLIED_SEQ_KEY, PageScoped};

pub const NAMESPACE: &str = "app_visibility";

const KEY_HIDDEN: &str = "hidden_apps_page_";
const KEY_KNOWN: &str = "known_apps_page_";
const KEY_NEW_VISIBLE: &str = "new_apps_visible_by_default";

/// Visibility state of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageVisibility {
    pub hidden: BTreeSet<String>,
    /// Packages already seen by [`AppVisibilityManager::reconcile`].
    pub known: BTreeSet<String>,
}

impl PageVisibility {
    fn is_default(&self) -> bool {
        self.hidden.is_empty() && self.known.is_empty()
    }
}

/// Owns the `app_visibility` namespace.
#[derive(Debug)]
pub struct AppVisibilityManager {
    prefs: Preferences,
    pages: BTreeMap<usize, PageVisibility>,
    new_apps_visible: bool,
    observers: Observable<PageUpdate<BTreeSet<String>>>,
}

impl AppVisibilityManager {
    pub fn open(store: StoreHandle) -> Self {
        Self::with_default(store, true)
    }

    /// Open; `new_apps_visible` seeds the global flag when none is stored.
    pub fn with_default(store: StoreHandle, new_apps_visible: bool) -> Self {
        let prefs = Preferences::open(store, NAMESPACE);
        let mut pages: BTreeMap<usize, PageVisibility> = BTreeMap::new();
        for key in prefs.keys_with_prefix(KEY_HIDDEN) {
            if let (Some(page), Some(raw)) = (parse_page_key(key, KEY_HIDDEN), prefs.get_string(key)) {
                pages.entry(page).or_default().hidden = decode_set(raw);
            }
        }
        for key in prefs.keys_with_prefix(KEY_KNOWN) {
            if let (Some(page), Some(raw)) = (parse_page_key(key, KEY_KNOWN), prefs.get_string(key)) {
                pages.entry(page).or_default().known = decode_set(raw);
            }
        }
        pages.retain(|_, v| !v.is_default());
        let new_apps_visible = prefs.get_bool(KEY_NEW_VISIBLE, new_apps_visible);
        Self {
            prefs,
            pages,
            new_apps_visible,
            observers: Observable::new(),
        }
    }

    pub fn subscribe(&mut self) -> crossbeam_channel::Receiver<PageUpdate<BTreeSet<String>>> {
        self.observers.subscribe()
    }

    pub fn new_apps_visible_by_default(&self) -> bool {
        self.new_apps_visible
    }

    pub fn set_new_apps_visible_by_default(&mut self, visible: bool) {
        self.new_apps_visible = visible;
        self.prefs.put_bool(KEY_NEW_VISIBLE, visible);
    }

    pub fn hidden_apps(&self, page: usize) -> BTreeSet<String> {
        self.pages
            .get(&page)
            .map(|v| v.hidden.clone())
            .unwrap_or_default()
    }

    pub fn is_visible(&self, page: usize, package_name: &str) -> bool {
        !self
            .pages
            .get(&page)
            .is_some_and(|v| v.hidden.contains(package_name))
    }

    /// Hide an app. Hiding twice leaves the set unchanged.
    pub fn hide_app(&mut self, page: usize, package_name: &str) {
        self.set_visible(page, package_name, false);
    }

    pub fn show_app(&mut self, page: usize, package_name: &str) {
        self.set_visible(page, package_name, true);
    }

    pub fn set_visible(&mut self, page: usize, package_name: &str, visible: bool) {
        if package_name.is_empty() {
            return;
        }
        let entry = self.pages.entry(page).or_default();
        let changed = if visible {
            entry.hidden.remove(package_name)
        } else {
            entry.hidden.insert(package_name.to_string())
        };
        if changed {
            log::debug!("Page {page}: {package_name} visible={visible}");
            self.save(page);
        } else if entry.is_default() {
            self.pages.remove(&page);
        }
    }

    /// Replace the hidden set of `page`. Empty package names are dropped.
    pub fn set_hidden(&mut self, page: usize, mut hidden: BTreeSet<String>) {
        hidden.retain(|p| !p.is_empty());
        self.pages.entry(page).or_default().hidden = hidden;
        self.save(page);
    }

    /// Show every app on `page`.
    pub fn clear(&mut self, page: usize) {
        if let Some(v) = self.pages.get_mut(&page) {
            if !v.hidden.is_empty() {
                v.hidden.clear();
                self.save(page);
            }
        }
    }

    /// Sync `page` with the installed app list.
    ///
    /// First-seen packages become known and, when new apps are hidden by
    /// default, hidden. Uninstalled packages are forgotten. Returns how many
    /// packages were newly hidden.
    pub fn reconcile(&mut self, page: usize, installed: &[AppInfo]) -> usize {
        let installed_names: BTreeSet<&str> =
            installed.iter().map(|a| a.package_name.as_str()).collect();
        let hide_new = !self.new_apps_visible;
        let entry = self.pages.entry(page).or_default();
        let before = entry.clone();
        entry.hidden.retain(|p| installed_names.contains(p.as_str()));
        entry.known.retain(|p| installed_names.contains(p.as_str()));
        let mut newly_hidden = 0;
        for name in &installed_names {
            if entry.known.insert((*name).to_string()) && hide_new {
                entry.hidden.insert((*name).to_string());
                newly_hidden += 1;
            }
        }
        if *entry != before {
            log::debug!("Page {page}: reconciled, {newly_hidden} new app(s) hidden");
            self.save(page);
        } else if entry.is_default() {
            self.pages.remove(&page);
        }
        newly_hidden
    }

    /// `installed` filtered to what `page` shows, in input order.
    pub fn visible_apps(&self, page: usize, installed: &[AppInfo]) -> Vec<AppInfo> {
        installed
            .iter()
            .filter(|a| self.is_visible(page, &a.package_name))
            .cloned()
            .collect()
    }

    fn save(&mut self, page: usize) {
        let state = self.pages.get(&page).cloned().unwrap_or_default();
        if state.is_default() {
            self.pages.remove(&page);
        }
        write_page(self.prefs.edit(), page, &state).commit();
        self.observers.publish(PageUpdate {
            page,
            value: state.hidden,
        });
    }
}

fn write_page<'a>(edit: Editor<'a>, page: usize, state: &PageVisibility) -> Editor<'a> {
    let hidden_key = page_key(KEY_HIDDEN, page);
    let known_key = page_key(KEY_KNOWN, page);
    let edit = if state.hidden.is_empty() {
        edit.remove(&hidden_key)
    } else {
        edit.put_string(&hidden_key, encode_set(&state.hidden))
    };
    if state.known.is_empty() {
        edit.remove(&known_key)
    } else {
        edit.put_string(&known_key, encode_set(&state.known))
    }
}

impl PageScoped for AppVisibilityManager {
    type Record = PageVisibility;

    fn name(&self) -> &'static str {
        NAMESPACE
    }

    fn capture(&self, page: usize) -> Option<PageVisibility> {
        self.pages.get(&page).cloned()
    }

    fn applied_seq(&self) -> u64 {
        u64::try_from(self.prefs.get_int(APPLIED_SEQ_KEY, 0)).unwrap_or(0)
    }

    fn replace_pages(&mut self, erase: &[usize], records: Vec<(usize, PageVisibility)>, seq: u64) {
        let empty = PageVisibility::default();
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
            let value = self.hidden_apps(page);
            self.observers.publish(PageUpdate { page, value });
        }
    }
}
