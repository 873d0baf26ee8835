//! Free-form icon positions and folders, per page.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use hearth_store::{Preferences, StoreHandle};
use hearth_types::app::{AppPosition, DEFAULT_ICON_SIZE};

use crate::codec::{
    decode_folders, decode_position_map, encode_folders, encode_positions, page_key,
    parse_page_key,
};
use crate::folders::AppFolder;
use crate::navigator::Point;
use crate::observe::{Observable, PageUpdate};
use crate::reindex::{APPLIED_SEQ_KEY, PageScoped};

pub const NAMESPACE: &str = "app_positions";

const KEY_POSITIONS: &str = "positions_page_";
const KEY_FOLDERS: &str = "folders_page_";
const KEY_FREEFORM: &str = "freeform_page_";

/// What a page looks like in free-form mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePositions {
    /// Keyed by package name.
    pub positions: BTreeMap<String, AppPosition>,
    pub folders: Vec<AppFolder>,
    pub freeform: bool,
}

impl PagePositions {
    fn is_default(&self) -> bool {
        self.positions.is_empty() && self.folders.is_empty() && !self.freeform
    }
}

/// Owns the `app_positions` namespace.
#[derive(Debug)]
pub struct AppPositionManager {
    prefs: Preferences,
    pages: BTreeMap<usize, PagePositions>,
    default_icon_size: f32,
    observers: Observable<PageUpdate<PagePositions>>,
}

impl AppPositionManager {
    pub fn open(store: StoreHandle) -> Self {
        Self::with_icon_size(store, DEFAULT_ICON_SIZE)
    }

    /// Open, using `default_icon_size` for newly placed icons.
    pub fn with_icon_size(store: StoreHandle, default_icon_size: f32) -> Self {
        let prefs = Preferences::open(store, NAMESPACE);
        let mut pages: BTreeMap<usize, PagePositions> = BTreeMap::new();
        for key in prefs.keys_with_prefix(KEY_POSITIONS) {
            if let (Some(page), Some(raw)) = (parse_page_key(key, KEY_POSITIONS), prefs.get_string(key)) {
                pages.entry(page).or_default().positions = decode_position_map(raw);
            }
        }
        for key in prefs.keys_with_prefix(KEY_FOLDERS) {
            if let (Some(page), Some(raw)) = (parse_page_key(key, KEY_FOLDERS), prefs.get_string(key)) {
                pages.entry(page).or_default().folders = decode_folders(raw);
            }
        }
        for key in prefs.keys_with_prefix(KEY_FREEFORM) {
            if let Some(page) = parse_page_key(key, KEY_FREEFORM) {
                pages.entry(page).or_default().freeform = prefs.get_bool(key, false);
            }
        }
        pages.retain(|_, p| !p.is_default());
        Self {
            prefs,
            pages,
            default_icon_size,
            observers: Observable::new(),
        }
    }

    pub fn subscribe(&mut self) -> crossbeam_channel::Receiver<PageUpdate<PagePositions>> {
        self.observers.subscribe()
    }

    /// Everything stored for `page` (default when absent).
    pub fn page(&self, page: usize) -> PagePositions {
        self.pages.get(&page).cloned().unwrap_or_default()
    }

    /// Pages that hold any state.
    pub fn populated_pages(&self) -> Vec<usize> {
        self.pages.keys().copied().collect()
    }

    // -- Free-form mode ----------------------------------------------------

    pub fn is_freeform(&self, page: usize) -> bool {
        self.pages.get(&page).is_some_and(|p| p.freeform)
    }

    pub fn set_freeform(&mut self, page: usize, enabled: bool) {
        self.pages.entry(page).or_default().freeform = enabled;
        self.save(page);
    }

    // -- Positions ---------------------------------------------------------

    /// Positions on `page`, sorted by package name.
    pub fn positions(&self, page: usize) -> Vec<AppPosition> {
        self.pages
            .get(&page)
            .map(|p| p.positions.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn position(&self, page: usize, package_name: &str) -> Option<AppPosition> {
        self.pages.get(&page)?.positions.get(package_name).cloned()
    }

    /// Place or move an icon, keeping its size if it was already placed.
    pub fn place(&mut self, page: usize, package_name: &str, x: f32, y: f32) {
        let size = self
            .position(page, package_name)
            .map_or(self.default_icon_size, |p| p.icon_size);
        self.set_position(
            page,
            AppPosition::new(package_name, x, y).with_icon_size(size),
        );
    }

    /// Store `position`, overwriting any previous one for the same package.
    pub fn set_position(&mut self, page: usize, position: AppPosition) {
        if position.package_name.is_empty() {
            log::debug!("Ignoring position without a package name");
            return;
        }
        log::debug!(
            "Page {page}: {} at ({}, {})",
            position.package_name,
            position.x,
            position.y
        );
        self.pages
            .entry(page)
            .or_default()
            .positions
            .insert(position.package_name.clone(), position);
        self.save(page);
    }

    /// Replace every position on `page`.
    pub fn set_positions<I>(&mut self, page: usize, positions: I)
    where
        I: IntoIterator<Item = AppPosition>,
    {
        let entry = self.pages.entry(page).or_default();
        entry.positions = positions
            .into_iter()
            .filter(|p| !p.package_name.is_empty())
            .map(|p| (p.package_name.clone(), p))
            .collect();
        self.save(page);
    }

    pub fn remove_position(&mut self, page: usize, package_name: &str) -> bool {
        let removed = self
            .pages
            .get_mut(&page)
            .and_then(|p| p.positions.remove(package_name))
            .is_some();
        if removed {
            self.save(page);
        }
        removed
    }

    /// Drop every position and folder on `page`. Free-form mode is kept.
    pub fn clear_positions(&mut self, page: usize) {
        if let Some(p) = self.pages.get_mut(&page) {
            p.positions.clear();
            p.folders.clear();
            self.save(page);
        }
    }

    /// Round every icon and folder on `page` to the nearest multiple of `cell`.
    pub fn snap_to_grid(&mut self, page: usize, cell: f32) {
        if !(cell.is_finite() && cell > 0.0) {
            return;
        }
        let snap = |v: f32| (v / cell).round() * cell;
        let Some(p) = self.pages.get_mut(&page) else {
            return;
        };
        for pos in p.positions.values_mut() {
            pos.x = snap(pos.x);
            pos.y = snap(pos.y);
        }
        for folder in &mut p.folders {
            folder.x = snap(folder.x);
            folder.y = snap(folder.y);
        }
        self.save(page);
    }

    /// Icon anchors on `page` keyed by their rank in package order.
    ///
    /// The returned names map each rank back to its package.
    pub fn focus_points(&self, page: usize) -> (Vec<String>, BTreeMap<usize, Point>) {
        let mut names = Vec::new();
        let mut points = BTreeMap::new();
        for (i, pos) in self.positions(page).into_iter().enumerate() {
            points.insert(i, Point::new(pos.x, pos.y));
            names.push(pos.package_name);
        }
        (names, points)
    }

    // -- Folders -----------------------------------------------------------

    pub fn folders(&self, page: usize) -> Vec<AppFolder> {
        self.pages
            .get(&page)
            .map(|p| p.folders.clone())
            .unwrap_or_default()
    }

    pub fn folder(&self, page: usize, id: Uuid) -> Option<AppFolder> {
        self.pages
            .get(&page)?
            .folders
            .iter()
            .find(|f| f.id == id)
            .cloned()
    }

    /// Create a folder from `apps`. Returns `None` if no valid app was given.
    ///
    /// Apps moved into the folder lose their loose position on the page.
    pub fn create_folder<I, S>(&mut self, page: usize, name: &str, apps: I, x: f32, y: f32) -> Option<Uuid>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut folder = AppFolder::new(name, apps, x, y);
        if folder.is_empty() {
            return None;
        }
        folder.icon_size = self.default_icon_size;
        let id = folder.id;
        let entry = self.pages.entry(page).or_default();
        for app in &folder.apps {
            entry.positions.remove(app);
        }
        entry.folders.push(folder);
        log::info!("Page {page}: created folder {name:?}");
        self.save(page);
        Some(id)
    }

    pub fn add_to_folder(&mut self, page: usize, id: Uuid, package_name: &str) -> bool {
        let Some(entry) = self.pages.get_mut(&page) else {
            return false;
        };
        let Some(folder) = entry.folders.iter_mut().find(|f| f.id == id) else {
            return false;
        };
        if !folder.add_app(package_name) {
            return false;
        }
        entry.positions.remove(package_name);
        self.save(page);
        true
    }

    /// Remove an app from a folder; the folder is deleted once it is empty.
    pub fn remove_from_folder(&mut self, page: usize, id: Uuid, package_name: &str) -> bool {
        let Some(entry) = self.pages.get_mut(&page) else {
            return false;
        };
        let Some(idx) = entry.folders.iter().position(|f| f.id == id) else {
            return false;
        };
        if !entry.folders[idx].remove_app(package_name) {
            return false;
        }
        if entry.folders[idx].is_empty() {
            let gone = entry.folders.remove(idx);
            log::info!("Page {page}: folder {:?} emptied and deleted", gone.name);
        }
        self.save(page);
        true
    }

    pub fn rename_folder(&mut self, page: usize, id: Uuid, name: &str) -> bool {
        self.update_folder(page, id, |f| f.name = name.to_string())
    }

    pub fn move_folder(&mut self, page: usize, id: Uuid, x: f32, y: f32) -> bool {
        self.update_folder(page, id, |f| {
            f.x = x;
            f.y = y;
        })
    }

    pub fn delete_folder(&mut self, page: usize, id: Uuid) -> bool {
        let Some(entry) = self.pages.get_mut(&page) else {
            return false;
        };
        let before = entry.folders.len();
        entry.folders.retain(|f| f.id != id);
        let removed = entry.folders.len() != before;
        if removed {
            self.save(page);
        }
        removed
    }

    /// Packages held in any folder on `page`.
    pub fn foldered_apps(&self, page: usize) -> BTreeSet<String> {
        self.pages
            .get(&page)
            .map(|p| p.folders.iter().flat_map(|f| f.apps.iter().cloned()).collect())
            .unwrap_or_default()
    }

    fn update_folder(&mut self, page: usize, id: Uuid, f: impl FnOnce(&mut AppFolder)) -> bool {
        let Some(folder) = self
            .pages
            .get_mut(&page)
            .and_then(|p| p.folders.iter_mut().find(|f| f.id == id))
        else {
            return false;
        };
        f(folder);
        self.save(page);
        true
    }

    /// Persist `page` and notify subscribers.
    fn save(&mut self, page: usize) {
        let state = self.pages.get(&page).cloned().unwrap_or_default();
        if state.is_default() {
            self.pages.remove(&page);
        }
        let mut edit = self.prefs.edit();
        edit = write_page(edit, page, &state);
        edit.commit();
        self.observers.publish(PageUpdate { page, value: state });
    }
}

fn write_page<'a>(
    mut edit: hearth_store::Editor<'a>,
    page: usize,
    state: &PagePositions,
) -> hearth_store::Editor<'a> {
    let positions_key = page_key(KEY_POSITIONS, page);
    let folders_key = page_key(KEY_FOLDERS, page);
    let freeform_key = page_key(KEY_FREEFORM, page);
    edit = if state.positions.is_empty() {
        edit.remove(&positions_key)
    } else {
        edit.put_string(&positions_key, encode_positions(state.positions.values()))
    };
    edit = if state.folders.is_empty() {
        edit.remove(&folders_key)
    } else {
        edit.put_string(&folders_key, encode_folders(&state.folders))
    };
    if state.freeform {
        edit.put_bool(&freeform_key, true)
    } else {
        edit.remove(&freeform_key)
    }
}

impl PageScoped for AppPositionManager {
    type Record = PagePositions;

    fn name(&self) -> &'static str {
        NAMESPACE
    }

    fn capture(&self, page: usize) -> Option<PagePositions> {
        self.pages.get(&page).cloned()
    }

    fn applied_seq(&self) -> u64 {
        u64::try_from(self.prefs.get_int(APPLIED_SEQ_KEY, 0)).unwrap_or(0)
    }

    fn replace_pages(&mut self, erase: &[usize], records: Vec<(usize, PagePositions)>, seq: u64) {
        let empty = PagePositions::default();
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
            let value = self.page(page);
            self.observers.publish(PageUpdate { page, value });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hearth_store::{KeyValueStore, MemoryStore, PrefValue};

    use super::*;

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    fn open(store: &Arc<MemoryStore>) -> AppPositionManager {
        AppPositionManager::open(Arc::clone(store) as StoreHandle)
    }

    #[test]
    fn place_persists_and_reloads() {
        let s = store();
        let mut m = open(&s);
        m.place(0, "org.mail", 10.0, 20.0);
        m.place(1, "org.maps", 5.0, 5.0);
        let m2 = open(&s);
        assert_eq!(m2.position(0, "org.mail"), Some(AppPosition::new("org.mail", 10.0, 20.0)));
        assert_eq!(m2.positions(1).len(), 1);
        assert_eq!(m2.populated_pages(), vec![0, 1]);
    }

    #[test]
    fn drag_overwrites_and_keeps_size() {
        let s = store();
        let mut m = open(&s);
        m.set_position(0, AppPosition::new("a", 0.0, 0.0).with_icon_size(80.0));
        m.place(0, "a", 50.0, 60.0);
        let p = m.position(0, "a").unwrap();
        assert_eq!((p.x, p.y, p.icon_size), (50.0, 60.0, 80.0));
        assert_eq!(m.positions(0).len(), 1);
    }

    #[test]
    fn wire_format_in_store() {
        let s = store();
        let mut m = open(&s);
        m.place(2, "b", 1.0, 2.0);
        m.place(2, "a", 3.0, 4.0);
        let raw = s.load(NAMESPACE).unwrap();
        assert_eq!(
            raw.get("positions_page_2"),
            Some(&PrefValue::Str("a,3,4,64;b,1,2,64".into()))
        );
    }

    #[test]
    fn remove_and_clear() {
        let s = store();
        let mut m = open(&s);
        m.place(0, "a", 0.0, 0.0);
        m.place(0, "b", 1.0, 1.0);
        assert!(m.remove_position(0, "a"));
        assert!(!m.remove_position(0, "a"));
        m.clear_positions(0);
        assert!(m.positions(0).is_empty());
        assert_eq!(s.key_count(NAMESPACE), 0);
    }

    #[test]
    fn clear_keeps_freeform_flag() {
        let s = store();
        let mut m = open(&s);
        m.set_freeform(0, true);
        m.place(0, "a", 0.0, 0.0);
        m.clear_positions(0);
        assert!(m.is_freeform(0));
        assert!(open(&s).is_freeform(0));
    }

    #[test]
    fn empty_package_ignored() {
        let s = store();
        let mut m = open(&s);
        m.set_position(0, AppPosition::new("", 1.0, 1.0));
        assert!(m.positions(0).is_empty());
    }

    #[test]
    fn snap_rounds_to_cell() {
        let s = store();
        let mut m = open(&s);
        m.place(0, "a", 33.0, 47.0);
        m.snap_to_grid(0, 16.0);
        let p = m.position(0, "a").unwrap();
        assert_eq!((p.x, p.y), (32.0, 48.0));
        m.snap_to_grid(0, 0.0);
        assert_eq!(m.position(0, "a").unwrap().x, 32.0);
    }

    #[test]
    fn folder_lifecycle() {
        let s = store();
        let mut m = open(&s);
        m.place(0, "a", 0.0, 0.0);
        let id = m.create_folder(0, "Pair", ["a", "b"], 10.0, 10.0).unwrap();
        assert!(m.position(0, "a").is_none(), "foldered app loses loose position");
        assert!(m.add_to_folder(0, id, "c"));
        assert!(!m.add_to_folder(0, id, "c"));
        assert!(m.rename_folder(0, id, "Trio"));
        assert!(m.move_folder(0, id, 20.0, 30.0));
        let reloaded = open(&s).folder(0, id).unwrap();
        assert_eq!(reloaded.name, "Trio");
        assert_eq!(reloaded.apps, vec!["a", "b", "c"]);
        assert_eq!((reloaded.x, reloaded.y), (20.0, 30.0));
        assert_eq!(m.foldered_apps(0).len(), 3);
    }

    #[test]
    fn removing_last_app_deletes_folder() {
        let s = store();
        let mut m = open(&s);
        let id = m.create_folder(0, "Solo", ["only"], 0.0, 0.0).unwrap();
        assert!(m.remove_from_folder(0, id, "only"));
        assert!(m.folder(0, id).is_none());
        assert!(open(&s).folder(0, id).is_none());
    }

    #[test]
    fn create_empty_folder_rejected() {
        let s = store();
        let mut m = open(&s);
        assert!(m.create_folder(0, "None", Vec::<String>::new(), 0.0, 0.0).is_none());
        assert!(m.folders(0).is_empty());
    }

    #[test]
    fn delete_folder() {
        let s = store();
        let mut m = open(&s);
        let id = m.create_folder(1, "F", ["x"], 0.0, 0.0).unwrap();
        assert!(m.delete_folder(1, id));
        assert!(!m.delete_folder(1, id));
    }

    #[test]
    fn focus_points_follow_package_order() {
        let s = store();
        let mut m = open(&s);
        m.place(0, "b", 0.0, 50.0);
        m.place(0, "a", 0.0, 0.0);
        let (names, points) = m.focus_points(0);
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(points[&1], Point::new(0.0, 50.0));
    }

    #[test]
    fn corrupted_entry_degrades_to_rest() {
        let s = store();
        let mut batch = hearth_store::Batch::new();
        batch.put(
            "positions_page_0",
            PrefValue::Str("broken;a,1,2;also,broken".into()),
        );
        s.commit(NAMESPACE, &batch).unwrap();
        let m = open(&s);
        assert_eq!(m.positions(0), vec![AppPosition::new("a", 1.0, 2.0)]);
    }

    #[test]
    fn subscribers_get_page_updates() {
        let s = store();
        let mut m = open(&s);
        let rx = m.subscribe();
        m.place(1, "a", 1.0, 1.0);
        let update = rx.try_recv().unwrap();
        assert_eq!(update.page, 1);
        assert_eq!(update.value.positions.len(), 1);
    }

    #[test]
    fn replace_pages_records_seq() {
        let s = store();
        let mut m = open(&s);
        m.place(0, "a", 0.0, 0.0);
        m.place(1, "b", 0.0, 0.0);
        let rec = m.capture(1).unwrap();
        m.replace_pages(&[0, 1], vec![(0, rec)], 3);
        assert_eq!(m.applied_seq(), 3);
        let reopened = open(&s);
        assert_eq!(reopened.positions(0)[0].package_name, "b");
        assert!(reopened.positions(1).is_empty());
        assert_eq!(reopened.applied_seq(), 3);
    }

    #[test]
    fn insert_notifies_every_page_a_record_lands_on() {
        use crate::reindex::{Shift, reindex};

        let s = store();
        let mut m = open(&s);
        m.place(0, "a", 0.0, 0.0);
        m.place(2, "c", 0.0, 0.0);
        let rx = m.subscribe();
        let shift = Shift::Inserted {
            index: 0,
            new_count: 2,
        };
        assert!(reindex(&mut m, shift, 1));
        let pages: Vec<usize> = rx.try_iter().map(|u| u.page).collect();
        assert_eq!(pages, vec![0, 1, 2, 3]);
        assert_eq!(m.positions(3)[0].package_name, "c");
    }
}
