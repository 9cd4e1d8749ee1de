use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::mpsc::Receiver;

use lichen_core::config::CoreConfig;
use lichen_core::models::{can_have_children, parent_directories, ResourceId};
use lichen_core::output::save_output_file;
use lichen_core::runtime::CoreHandle;
use lichen_core::stats::SharedAggregationStats;
use lichen_core::store::AttributionStore;
use lichen_core::worker::{AggregationReply, AggregationRequest};

use super::panel::{SyncPanel, WorkerBackedPanel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Signals,
}

/// One visible row of the resource tree pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub resource_id: ResourceId,
    pub depth: usize,
    pub is_directory: bool,
    pub expanded: bool,
}

pub struct App {
    pub running: bool,
    /// Whether user pressed Ctrl+C once (pending quit confirmation)
    pub pending_quit: bool,
    pub focus: Focus,

    config: CoreConfig,

    /// Single source of truth for session data
    pub store: Rc<RefCell<AttributionStore>>,
    pub core_handle: Option<CoreHandle>,
    pub reply_rx: Option<Receiver<AggregationReply>>,
    pub stats: SharedAggregationStats,

    // Tree pane
    pub visible_rows: Vec<TreeRow>,
    pub selected_index: usize,
    expanded: HashSet<ResourceId>,

    // Attribution panels
    pub direct_external: SyncPanel,
    pub contained_external: WorkerBackedPanel,
    pub contained_manual: SyncPanel,
    pub panel_cursor: usize,

    status: Option<String>,
    frame: u64,
    next_manual_serial: u64,
}

impl App {
    pub fn new(
        config: CoreConfig,
        store: Rc<RefCell<AttributionStore>>,
        core_handle: Option<CoreHandle>,
        reply_rx: Option<Receiver<AggregationReply>>,
        stats: SharedAggregationStats,
    ) -> Self {
        let worker_available = core_handle.is_some();
        let mut app = Self {
            running: true,
            pending_quit: false,
            focus: Focus::Tree,
            config,
            store,
            core_handle,
            reply_rx,
            stats: stats.clone(),
            visible_rows: Vec::new(),
            selected_index: 0,
            expanded: HashSet::new(),
            direct_external: SyncPanel::default(),
            contained_external: WorkerBackedPanel::new(worker_available, stats),
            contained_manual: SyncPanel::default(),
            panel_cursor: 0,
            status: None,
            frame: 0,
            next_manual_serial: 0,
        };
        app.rebuild_visible_rows();
        app.refresh_panels();
        app
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) {
        self.frame += 1;
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = Some(status.to_string());
    }

    pub fn input_file_name(&self) -> String {
        self.config
            .input_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.config.input_path.display().to_string())
    }

    /// Seed (or refresh) the worker cache with the current external dataset.
    /// Called after load and after any edit of the external tables.
    pub fn seed_worker_cache(&mut self) {
        if let Some(handle) = &self.core_handle {
            let data = self.store.borrow().external_panel_data();
            if handle.send_request(AggregationRequest::refresh(data)).is_err() {
                tracing::warn!("could not seed aggregation worker cache");
                self.core_handle = None;
            }
        }
    }

    // ===== Tree navigation =====

    /// Recompute the visible tree rows: a resource shows up iff every
    /// ancestor directory below the root is expanded.
    pub fn rebuild_visible_rows(&mut self) {
        let previously_selected = self.selected_resource_id();
        let store = self.store.borrow();

        let mut rows = vec![TreeRow {
            resource_id: "/".to_string(),
            depth: 0,
            is_directory: true,
            expanded: true,
        }];
        for resource_id in store.resource_ids() {
            let parents = parent_directories(resource_id);
            // parents[0] is the root, which is always expanded.
            if !parents[1..].iter().all(|p| self.expanded.contains(p)) {
                continue;
            }
            rows.push(TreeRow {
                resource_id: resource_id.clone(),
                depth: parents.len(),
                is_directory: can_have_children(resource_id),
                expanded: self.expanded.contains(resource_id),
            });
        }
        drop(store);

        self.selected_index = rows
            .iter()
            .position(|row| row.resource_id == previously_selected)
            .unwrap_or(0);
        self.visible_rows = rows;
    }

    pub fn selected_resource_id(&self) -> ResourceId {
        self.visible_rows
            .get(self.selected_index)
            .map(|row| row.resource_id.clone())
            .unwrap_or_else(|| "/".to_string())
    }

    pub fn move_selection(&mut self, delta: isize) {
        match self.focus {
            Focus::Tree => {
                let last = self.visible_rows.len().saturating_sub(1);
                let index = self.selected_index as isize + delta;
                self.selected_index = index.clamp(0, last as isize) as usize;
                self.on_selection_changed();
            }
            Focus::Signals => {
                let last = self.contained_external.rows.len().saturating_sub(1) as isize;
                let cursor = self.panel_cursor as isize + delta;
                self.panel_cursor = cursor.clamp(0, last.max(0)) as usize;
            }
        }
    }

    pub fn toggle_expand(&mut self) {
        let Some(row) = self.visible_rows.get(self.selected_index) else {
            return;
        };
        if !row.is_directory || row.resource_id == "/" {
            return;
        }
        let resource_id = row.resource_id.clone();
        if !self.expanded.remove(&resource_id) {
            self.expanded.insert(resource_id);
        }
        self.rebuild_visible_rows();
    }

    fn on_selection_changed(&mut self) {
        let selected = self.selected_resource_id();
        let changed = self.store.borrow_mut().set_selected_resource(&selected);
        if changed {
            self.panel_cursor = 0;
            self.refresh_panels();
        }
    }

    /// Recompute all three panels for the current selection. The contained
    /// external panel goes through the worker; the other two are sync-only.
    pub fn refresh_panels(&mut self) {
        let store = self.store.borrow();
        self.direct_external.refresh_direct_external(&store);
        self.contained_external
            .refresh(self.core_handle.as_ref(), &store);
        self.contained_manual.refresh_contained_manual(&store);
    }

    /// Drain pending worker replies; called from the tick handler.
    pub fn check_for_worker_replies(&mut self) {
        let replies: Vec<AggregationReply> = self
            .reply_rx
            .as_ref()
            .map(|rx| std::iter::from_fn(|| rx.try_recv().ok()).collect())
            .unwrap_or_default();

        if replies.is_empty() {
            return;
        }
        let store = self.store.borrow();
        for reply in replies {
            self.contained_external.on_reply(reply, &store);
        }
    }

    // ===== Edits =====

    /// Toggle the resolved flag of the highlighted contained signal, then
    /// re-query the worker (the resolved set travels with each request, the
    /// cache itself stays valid) and persist.
    pub fn toggle_resolved_highlighted(&mut self) {
        let Some(row) = self.contained_external.rows.get(self.panel_cursor) else {
            return;
        };
        let attribution_id = row.attribution_id.clone();
        let now_resolved = self
            .store
            .borrow_mut()
            .toggle_resolved_external(&attribution_id);
        self.set_status(if now_resolved {
            "signal resolved"
        } else {
            "signal unresolved"
        });
        self.refresh_panels();
        self.save();
    }

    /// Adopt the highlighted external signal as a manual attribution on the
    /// selected resource (the "add to package" action).
    pub fn add_highlighted_to_manual(&mut self) {
        let Some(row) = self.contained_external.rows.get(self.panel_cursor) else {
            return;
        };
        let source_id = row.attribution_id.clone();
        let selected = self.selected_resource_id();

        let store_rc = Rc::clone(&self.store);
        let mut store = store_rc.borrow_mut();
        let Some(attribution) = store.external.attributions.get(&source_id).cloned() else {
            return;
        };
        let manual_id = self.unused_manual_id(&store);
        store.add_manual_attribution(&selected, manual_id, attribution);
        drop(store);

        self.set_status("attribution added");
        self.refresh_panels();
        self.save();
    }

    fn unused_manual_id(&mut self, store: &AttributionStore) -> String {
        loop {
            self.next_manual_serial += 1;
            let candidate = format!("manual-{:04}", self.next_manual_serial);
            if !store.manual.attributions.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub fn save(&mut self) {
        let result = save_output_file(&self.config.output_path, &self.store.borrow());
        match result {
            Ok(()) => {
                self.store.borrow_mut().mark_saved();
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to save output file");
                self.set_status(&format!("save failed: {}", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn test_app() -> (App, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("scan.json");
        let mut file = std::fs::File::create(&input_path).unwrap();
        file.write_all(
            br#"{
                "resources": { "a": { "b": { "file1": 1 }, "file2": 1 } },
                "externalAttributions": { "x": {}, "y": {} },
                "resourcesToAttributions": {
                    "/a/b/file1": ["x"],
                    "/a/file2": ["y"]
                }
            }"#,
        )
        .unwrap();

        let config = CoreConfig::new(&input_path, None);
        let input = lichen_core::input::load_input_file(&config.input_path).unwrap();
        let mut store = AttributionStore::new();
        store.load(input, None);

        // No worker: panels exercise the synchronous path deterministically.
        let app = App::new(
            config,
            Rc::new(RefCell::new(store)),
            None,
            None,
            SharedAggregationStats::new(),
        );
        (app, dir)
    }

    #[test]
    fn test_collapsed_tree_shows_top_level_only() {
        let (app, _dir) = test_app();
        let ids: Vec<_> = app
            .visible_rows
            .iter()
            .map(|row| row.resource_id.as_str())
            .collect();
        assert_eq!(ids, vec!["/", "/a/"]);
    }

    #[test]
    fn test_expand_reveals_children_and_collapse_hides_them() {
        let (mut app, _dir) = test_app();
        app.move_selection(1); // "/a/"
        app.toggle_expand();
        let ids: Vec<_> = app
            .visible_rows
            .iter()
            .map(|row| row.resource_id.as_str())
            .collect();
        assert_eq!(ids, vec!["/", "/a/", "/a/b/", "/a/file2"]);

        app.toggle_expand();
        assert_eq!(app.visible_rows.len(), 2);
    }

    #[test]
    fn test_selection_change_refreshes_panels() {
        let (mut app, _dir) = test_app();
        app.move_selection(1); // "/a/"
        assert_eq!(app.store.borrow().selected_resource_id(), "/a/");
        assert_eq!(app.contained_external.rows.len(), 2);

        app.toggle_expand();
        app.move_selection(2); // "/a/file2"
        assert!(app.contained_external.rows.is_empty());
        assert_eq!(app.direct_external.rows.len(), 1);
    }

    #[test]
    fn test_toggle_resolved_updates_panel_and_saves() {
        let (mut app, _dir) = test_app();
        app.move_selection(1); // "/a/"
        app.focus = Focus::Signals;
        app.toggle_resolved_highlighted();

        assert_eq!(app.contained_external.rows.len(), 1);
        assert!(!app.store.borrow().is_dirty());

        let output =
            lichen_core::output::load_output_file(&app.config.output_path).unwrap().unwrap();
        assert_eq!(output.resolved_external_attributions.len(), 1);
    }

    #[test]
    fn test_add_to_manual_populates_contained_manual_panel() {
        let (mut app, _dir) = test_app();
        app.move_selection(1); // "/a/"
        app.focus = Focus::Signals;
        app.add_highlighted_to_manual();

        assert_eq!(app.contained_manual.rows.len(), 0); // attached to /a/ itself, not below
        let store = app.store.borrow();
        assert_eq!(store.manual.attributions.len(), 1);
        assert_eq!(
            store.manual.resources_to_attributions["/a/"].len(),
            1
        );
    }

    #[test]
    fn test_manual_ids_never_collide() {
        let (mut app, _dir) = test_app();
        let store = AttributionStore::new();
        let first = app.unused_manual_id(&store);
        let second = app.unused_manual_id(&store);
        assert_ne!(first, second);
    }
}
