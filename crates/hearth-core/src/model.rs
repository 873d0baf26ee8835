//! The page model: registry plus per-page managers, kept in step.

use std::sync::Arc;

use uuid::Uuid;

use hearth_store::StoreHandle;
use hearth_types::config::HearthConfig;
use hearth_types::input::Direction;
use hearth_types::page::PageType;

use crate::index;
use crate::layouts::AppLayoutManager;
use crate::navigator::navigate;
use crate::pages::PageRegistry;
use crate::positions::AppPositionManager;
use crate::reindex::{Journal, PageScoped, Shift, reindex};
use crate::visibility::AppVisibilityManager;
use crate::widget_apps::WidgetAppsManager;

/// Owns the page registry and the four per-page managers.
///
/// Structural changes (insert, remove, move) go through here so every
/// manager follows the registry. Per-page edits go straight to the managers
/// via the `*_mut` accessors.
#[derive(Debug)]
pub struct PageModel {
    registry: PageRegistry,
    positions: AppPositionManager,
    visibility: AppVisibilityManager,
    layouts: AppLayoutManager,
    widget_apps: WidgetAppsManager,
}

impl PageModel {
    /// Open every namespace on `store` and finish any interrupted change.
    pub fn open(store: StoreHandle, config: &HearthConfig) -> Self {
        let mut model = Self {
            registry: PageRegistry::with_capacity(Arc::clone(&store), config.max_page_index),
            positions: AppPositionManager::with_icon_size(Arc::clone(&store), config.default_icon_size),
            visibility: AppVisibilityManager::with_default(
                Arc::clone(&store),
                config.new_apps_visible_by_default,
            ),
            layouts: AppLayoutManager::with_capacity(Arc::clone(&store), config.max_layouts_per_page),
            widget_apps: WidgetAppsManager::open(store),
        };
        model.recover();
        model
    }

    pub fn registry(&self) -> &PageRegistry {
        &self.registry
    }

    pub fn pages(&self) -> &[PageType] {
        self.registry.pages()
    }

    pub fn home_tab(&self) -> usize {
        self.registry.home_tab()
    }

    pub fn set_home_tab(&mut self, index: usize) -> bool {
        self.registry.set_home_tab(index)
    }

    pub fn subscribe_pages(&mut self) -> crossbeam_channel::Receiver<crate::pages::PagesSnapshot> {
        self.registry.subscribe()
    }

    pub fn positions(&self) -> &AppPositionManager {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut AppPositionManager {
        &mut self.positions
    }

    pub fn visibility(&self) -> &AppVisibilityManager {
        &self.visibility
    }

    pub fn visibility_mut(&mut self) -> &mut AppVisibilityManager {
        &mut self.visibility
    }

    pub fn layouts(&self) -> &AppLayoutManager {
        &self.layouts
    }

    pub fn layouts_mut(&mut self) -> &mut AppLayoutManager {
        &mut self.layouts
    }

    pub fn widget_apps(&self) -> &WidgetAppsManager {
        &self.widget_apps
    }

    pub fn widget_apps_mut(&mut self) -> &mut WidgetAppsManager {
        &mut self.widget_apps
    }

    // -- Index translation -------------------------------------------------

    /// Widget-page record backing the page at `page_position`.
    pub fn widget_page_index_for(&self, page_position: usize) -> Option<usize> {
        index::widget_page_index_for(self.registry.pages(), page_position)
    }

    /// Ordinal of the page among `AppsAndWidgets` pages.
    pub fn apps_and_widgets_tab_index_for(&self, page_position: usize) -> Option<usize> {
        index::apps_and_widgets_tab_index_for(self.registry.pages(), page_position)
    }

    // -- Structural changes ------------------------------------------------

    /// Append a page. No records move, so no reindex is needed.
    pub fn add_page(&mut self, page_type: PageType) -> Option<usize> {
        self.registry.add_page(page_type)
    }

    /// Insert a page at `index` (clamped to the end), shifting later records up.
    pub fn insert_page(&mut self, index: usize, page_type: PageType) -> Option<usize> {
        if !self.registry.can_add() {
            log::debug!("Pager full, not inserting {page_type}");
            return None;
        }
        let old = self.registry.pages().to_vec();
        let index = index.min(old.len());
        let mut new = old.clone();
        new.insert(index, page_type);
        let widgets = index::widget_page_index_for(&new, index).map(|w| Shift::Inserted {
            index: w,
            new_count: index::widget_page_count(&new),
        });
        let journal = Journal {
            seq: self.next_seq(),
            pages: Shift::Inserted {
                index,
                new_count: new.len(),
            },
            widgets,
        };
        let inserted = self
            .registry
            .insert_page_journaled(index, page_type, Some(&journal));
        if inserted.is_some() {
            self.finish(&journal);
        }
        inserted
    }

    /// Remove the page at `index`, closing the gap in every manager.
    pub fn remove_page(&mut self, index: usize) -> Option<PageType> {
        let old = self.registry.pages().to_vec();
        if index >= old.len() {
            log::debug!("Ignoring removal of missing page {index}");
            return None;
        }
        let mut new = old.clone();
        new.remove(index);
        let widgets = index::widget_page_index_for(&old, index).map(|w| Shift::Removed {
            index: w,
            new_count: index::widget_page_count(&new),
        });
        let journal = Journal {
            seq: self.next_seq(),
            pages: Shift::Removed {
                index,
                new_count: new.len(),
            },
            widgets,
        };
        let removed = self.registry.remove_page_journaled(index, Some(&journal));
        if removed.is_some() {
            self.finish(&journal);
        }
        removed
    }

    /// Move the page at `from` to `to`; its records travel with it.
    pub fn move_page(&mut self, from: usize, to: usize) -> bool {
        let old = self.registry.pages().to_vec();
        if from >= old.len() || to >= old.len() {
            return false;
        }
        if from == to {
            return true;
        }
        let mut new = old.clone();
        let moved = new.remove(from);
        new.insert(to, moved);
        let widgets = match (
            index::widget_page_index_for(&old, from),
            index::widget_page_index_for(&new, to),
        ) {
            (Some(wf), Some(wt)) if wf != wt => Some(Shift::Moved {
                from: wf,
                to: wt,
                count: index::widget_page_count(&old),
            }),
            _ => None,
        };
        let journal = Journal {
            seq: self.next_seq(),
            pages: Shift::Moved {
                from,
                to,
                count: old.len(),
            },
            widgets,
        };
        let ok = self.registry.move_page_journaled(from, to, Some(&journal));
        if ok {
            self.finish(&journal);
        }
        ok
    }

    /// Replay a structural change left unfinished by a crash.
    ///
    /// Managers that already applied it are skipped. Returns whether a
    /// journal was found.
    pub fn recover(&mut self) -> bool {
        let Some(journal) = self.registry.pending_journal() else {
            return false;
        };
        log::warn!(
            "Finishing interrupted page change {} ({})",
            journal.seq,
            journal.pages
        );
        self.finish(&journal);
        true
    }

    /// One past the highest change seen anywhere. Managers are consulted too,
    /// so losing the `pages` namespace cannot rewind the counter below a
    /// change a manager already applied.
    fn next_seq(&self) -> u64 {
        [
            self.registry.last_seq(),
            self.positions.applied_seq(),
            self.visibility.applied_seq(),
            self.layouts.applied_seq(),
            self.widget_apps.applied_seq(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    fn finish(&mut self, journal: &Journal) {
        let seq = journal.seq;
        reindex(&mut self.positions, journal.pages, seq);
        reindex(&mut self.visibility, journal.pages, seq);
        reindex(&mut self.layouts, journal.pages, seq);
        if let Some(widgets) = journal.widgets {
            reindex(&mut self.widget_apps, widgets, seq);
        }
        self.registry.clear_journal();
    }

    // -- Cross-manager helpers ---------------------------------------------

    /// Snapshot the live positions of `page` as a new layout.
    pub fn save_current_layout(&mut self, page: usize, name: &str) -> Option<Uuid> {
        let positions = self.positions.positions(page);
        self.layouts.save_layout(page, name, positions)
    }

    /// Copy a saved layout onto the live positions of `page` and mark it active.
    pub fn apply_layout(&mut self, page: usize, id: Uuid) -> bool {
        let Some(positions) = self.layouts.layout_positions(page, id) else {
            return false;
        };
        self.positions.set_positions(page, positions);
        self.layouts.set_active_layout(page, Some(id))
    }

    /// Package reached by moving focus from `package_name` in `direction`.
    pub fn navigate_focus(
        &self,
        page: usize,
        package_name: &str,
        direction: Direction,
    ) -> Option<String> {
        let (names, points) = self.positions.focus_points(page);
        let from = names.iter().position(|n| n == package_name)?;
        let to = navigate(&points, from, direction)?;
        names.get(to).cloned()
    }
}
