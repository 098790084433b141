//! The session registry.
//!
//! One exclusive critical section guards the entry sequence and the
//! selection index together; they are never observable in a mutually
//! inconsistent state. Engine side effects (observer registration, loads,
//! closes) and observer notifications are collected under the lock and
//! performed after it is released, so an engine or observer that calls back
//! into the registry cannot deadlock. Nested operations (remove adding a
//! default session) compose through internal `*_locked` functions instead of
//! reentrant locking.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use browser_state_core::{Error, Result, Session, SessionId, Thumbnail};
use browser_state_engine::{Engine, EngineHandle, EngineObserver, EngineState};

use crate::link::{EngineLink, LinkObserver};
use crate::observer::{ObserverSet, RegistryEvent, RegistryObserver};
use crate::selection;
use crate::snapshot::{Snapshot, SnapshotItem};

/// One session plus its engine attachment.
pub(crate) struct SessionEntry {
    pub(crate) session: Session,
    pub(crate) link: EngineLink,
}

/// The state guarded by the registry's lock.
pub(crate) struct RegistryState {
    pub(crate) entries: Vec<SessionEntry>,
    pub(crate) selected_index: Option<usize>,
}

impl RegistryState {
    fn index_of(&self, id: &SessionId) -> Option<usize> {
        self.entries.iter().position(|e| e.session.id() == id)
    }
}

/// Engine side effect deferred until the registry lock is released.
enum EngineEffect {
    /// Deregister the observer and release the surface.
    Close {
        handle: Arc<dyn EngineHandle>,
        observer: Arc<dyn EngineObserver>,
    },
    /// Restore pending state, register the observer, load the session URL.
    Attach {
        handle: Arc<dyn EngineHandle>,
        observer: Arc<dyn EngineObserver>,
        restore: Option<EngineState>,
        load: String,
    },
}

type DefaultSessionFactory = Box<dyn Fn() -> Session + Send + Sync>;

/// Concurrency-safe registry of browsing sessions.
///
/// Owns an ordered sequence of sessions, a single selection, and each
/// session's engine attachment. All operations are synchronous and
/// linearizable with respect to each other.
pub struct SessionRegistry {
    state: Arc<Mutex<RegistryState>>,
    observers: ObserverSet,
    engine: Arc<dyn Engine>,
    default_session: Option<DefaultSessionFactory>,
}

impl SessionRegistry {
    /// Create an empty registry backed by the given engine.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                entries: Vec::new(),
                selected_index: None,
            })),
            observers: ObserverSet::new(),
            engine,
            default_session: None,
        }
    }

    /// Create a registry that repopulates itself with a default session
    /// whenever the selection would otherwise become empty.
    pub fn with_default_session(
        engine: Arc<dyn Engine>,
        factory: impl Fn() -> Session + Send + Sync + 'static,
    ) -> Self {
        let mut registry = Self::new(engine);
        registry.default_session = Some(Box::new(factory));
        registry
    }

    /// Register an observer for registry events.
    pub fn register(&self, observer: Arc<dyn RegistryObserver>) {
        self.observers.register(observer);
    }

    /// Deregister a previously registered observer (by pointer identity).
    pub fn unregister(&self, observer: &Arc<dyn RegistryObserver>) {
        self.observers.unregister(observer);
    }

    /// Add a session to the registry.
    ///
    /// With `parent_id` given, the session is inserted immediately after its
    /// parent and the back-reference is recorded; otherwise it is appended.
    /// An engine handle, if given, is linked immediately. The session becomes
    /// selected when `selected` is set, or when nothing was selected yet and
    /// the session is not a custom tab.
    ///
    /// # Errors
    ///
    /// `InvalidParent` if `parent_id` does not resolve to a session in the
    /// registry; the session is not inserted in that case.
    pub fn add(
        &self,
        session: Session,
        selected: bool,
        engine_handle: Option<Arc<dyn EngineHandle>>,
        parent_id: Option<&SessionId>,
    ) -> Result<()> {
        let mut effects = Vec::new();
        let mut events = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            self.add_locked(
                &mut state,
                session,
                selected,
                engine_handle,
                parent_id,
                &mut effects,
                &mut events,
            )?;
        }
        self.run_effects(effects);
        self.observers.emit(&events);
        Ok(())
    }

    /// Restore a snapshot.
    ///
    /// A no-op for the empty snapshot. An out-of-range selection index in
    /// the snapshot is normalized to the first entry - persisted snapshots
    /// may be stale and must not crash the caller. Entries are inserted
    /// silently (no per-session events, no auto-select) preserving their
    /// relative order, then the resolved session is selected and a single
    /// `on_sessions_restored` is fired.
    pub fn restore(&self, snapshot: Snapshot) {
        if snapshot.is_empty() {
            return;
        }

        let mut effects = Vec::new();
        let mut events = Vec::new();
        {
            let mut state = self.state.lock().unwrap();

            // Lenient: default to the first entry on a stale index
            let resolved = if snapshot.selected_index < snapshot.items.len() {
                snapshot.selected_index
            } else {
                0
            };
            let selected_id = *snapshot.items[resolved].session.id();

            info!("Restoring {} session(s)", snapshot.items.len());
            for item in snapshot.items {
                let index = state.entries.len();
                self.insert_locked(
                    &mut state,
                    item.session,
                    index,
                    false,
                    item.engine_handle,
                    item.engine_state,
                    true,
                    &mut effects,
                    &mut events,
                );
            }

            let index = state
                .index_of(&selected_id)
                .expect("session inserted by restore must be present");
            Self::select_locked(&mut state, index, &mut events);
            events.push(RegistryEvent::Restored);
        }
        self.run_effects(effects);
        self.observers.emit(&events);
    }

    /// Create a snapshot of all ordinary (non-private, non-custom-tab)
    /// sessions. Pure projection; never inspects or mutates live engine
    /// state. Returns the empty marker if nothing ordinary remains.
    ///
    /// Panics if the live selection index resolves to no session - that is
    /// a registry bug, never a caller error.
    pub fn create_snapshot(&self) -> Snapshot {
        let state = self.state.lock().unwrap();
        if state.entries.is_empty() {
            return Snapshot::empty();
        }

        let items: Vec<SnapshotItem> = state
            .entries
            .iter()
            .filter(|e| !e.session.is_custom_tab() && !e.session.is_private())
            .map(|e| SnapshotItem {
                session: e.session.clone(),
                engine_handle: e.link.handle(),
                engine_state: e.link.saved_state().cloned(),
            })
            .collect();

        if items.is_empty() {
            return Snapshot::empty();
        }

        let selected_index = match state.selected_index {
            Some(index) => {
                let entry = state.entries.get(index).unwrap_or_else(|| {
                    panic!("data integrity violation: selected index {index} resolves to no session")
                });
                if entry.session.is_private() {
                    0
                } else {
                    // A custom-tab selection is filtered out; default to 0
                    items
                        .iter()
                        .position(|item| item.session.id() == entry.session.id())
                        .unwrap_or(0)
                }
            }
            None => 0,
        };

        Snapshot::new(items, selected_index)
    }

    /// Select the given session.
    ///
    /// # Errors
    ///
    /// `NotFound` if the session is not in the registry.
    pub fn select(&self, id: &SessionId) -> Result<()> {
        let mut events = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            let index = state.index_of(id).ok_or(Error::NotFound(*id))?;
            Self::select_locked(&mut state, index, &mut events);
        }
        self.observers.emit(&events);
        Ok(())
    }

    /// Remove the given session. A no-op if it is not present.
    ///
    /// Unlinks engine resources, recomputes the selection, promotes direct
    /// children to their grandparent, and fires `on_session_removed`. If the
    /// selection became empty and a default-session factory is configured, a
    /// default session is added (which selects itself); otherwise
    /// `on_session_selected` fires iff the selected session changed.
    pub fn remove(&self, id: &SessionId, select_parent_if_exists: bool) {
        let mut effects = Vec::new();
        let mut events = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            let Some(index) = state.index_of(id) else {
                return;
            };
            self.remove_locked(
                &mut state,
                index,
                select_parent_if_exists,
                &mut effects,
                &mut events,
            );
        }
        self.run_effects(effects);
        self.observers.emit(&events);
    }

    /// Remove the currently selected session.
    ///
    /// # Errors
    ///
    /// `NotSelected` if nothing is selected.
    pub fn remove_selected(&self, select_parent_if_exists: bool) -> Result<()> {
        let mut effects = Vec::new();
        let mut events = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            let index = state.selected_index.ok_or(Error::NotSelected)?;
            self.remove_locked(
                &mut state,
                index,
                select_parent_if_exists,
                &mut effects,
                &mut events,
            );
        }
        self.run_effects(effects);
        self.observers.emit(&events);
        Ok(())
    }

    /// Remove all ordinary sessions, keeping custom tabs.
    ///
    /// Clears the selection, fires one `on_all_sessions_removed`, then adds
    /// a default session if a factory is configured.
    pub fn remove_sessions(&self) {
        let mut effects = Vec::new();
        let mut events = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            info!("Removing all ordinary sessions: count={}", state.entries.len());

            let mut kept = Vec::new();
            for mut entry in std::mem::take(&mut state.entries) {
                if entry.session.is_custom_tab() {
                    kept.push(entry);
                } else {
                    Self::unlink_entry(&mut entry, &mut effects);
                }
            }
            state.entries = kept;
            state.selected_index = None;
            events.push(RegistryEvent::AllRemoved);

            self.add_default_locked(&mut state, &mut effects, &mut events);
        }
        self.run_effects(effects);
        self.observers.emit(&events);
    }

    /// Remove every session, custom tabs included.
    ///
    /// Clears the selection and fires one `on_all_sessions_removed`. A
    /// default session is added afterwards only if a factory is configured
    /// and the prior sequence was not exclusively custom tabs.
    pub fn remove_all(&self) {
        let mut effects = Vec::new();
        let mut events = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            info!("Removing all sessions: count={}", state.entries.len());

            let only_custom_tabs = !state.entries.is_empty()
                && state.entries.iter().all(|e| e.session.is_custom_tab());

            for mut entry in std::mem::take(&mut state.entries) {
                Self::unlink_entry(&mut entry, &mut effects);
            }
            state.selected_index = None;
            events.push(RegistryEvent::AllRemoved);

            if !only_custom_tabs {
                self.add_default_locked(&mut state, &mut effects, &mut events);
            }
        }
        self.run_effects(effects);
        self.observers.emit(&events);
    }

    /// Link a live engine handle to the given session.
    ///
    /// Any prior handle is unlinked (observer deregistered, surface closed)
    /// first. The registry registers its internal observer on the new handle
    /// and issues a load of the session's current URL.
    ///
    /// # Errors
    ///
    /// `NotFound` if the session is not in the registry.
    pub fn link(&self, id: &SessionId, handle: Arc<dyn EngineHandle>) -> Result<()> {
        let mut effects = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            let index = state.index_of(id).ok_or(Error::NotFound(*id))?;
            self.link_locked(&mut state, index, handle, None, &mut effects);
        }
        self.run_effects(effects);
        Ok(())
    }

    /// The engine handle currently linked to the given session, if any.
    pub fn get_engine_handle(&self, id: &SessionId) -> Option<Arc<dyn EngineHandle>> {
        let state = self.state.lock().unwrap();
        state.index_of(id).and_then(|i| state.entries[i].link.handle())
    }

    /// The linked engine handle, creating and linking one if necessary.
    ///
    /// A new handle is created scoped to the session's privacy mode. Pending
    /// serialized state is restored onto it and cleared before the link
    /// issues its load.
    ///
    /// # Errors
    ///
    /// `NotFound` if the session is not in the registry.
    pub fn get_or_create_engine_handle(&self, id: &SessionId) -> Result<Arc<dyn EngineHandle>> {
        let mut effects = Vec::new();
        let handle = {
            let mut state = self.state.lock().unwrap();
            let index = state.index_of(id).ok_or(Error::NotFound(*id))?;

            if let Some(handle) = state.entries[index].link.handle() {
                handle
            } else {
                let private = state.entries[index].session.is_private();
                let pending = state.entries[index].link.take_saved_state();
                debug!(
                    "Creating engine handle: id={}, private={}, pending_state={}",
                    id,
                    private,
                    pending.is_some()
                );
                let handle = self.engine.create_handle(private);
                self.link_locked(&mut state, index, Arc::clone(&handle), pending, &mut effects);
                handle
            }
        };
        self.run_effects(effects);
        Ok(handle)
    }

    /// Find a session by id. Linear scan, first match.
    pub fn find_by_id(&self, id: &SessionId) -> Option<Session> {
        let state = self.state.lock().unwrap();
        state.index_of(id).map(|i| state.entries[i].session.clone())
    }

    /// Replace the cached thumbnail of the given session.
    ///
    /// # Errors
    ///
    /// `NotFound` if the session is not in the registry.
    pub fn set_thumbnail(&self, id: &SessionId, thumbnail: Option<Thumbnail>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let index = state.index_of(id).ok_or(Error::NotFound(*id))?;
        state.entries[index].session.thumbnail = thumbnail;
        Ok(())
    }

    /// Drop cached thumbnails under memory pressure.
    ///
    /// Every non-custom-tab session except the currently selected one loses
    /// its thumbnail. Best-effort cache eviction only.
    pub fn on_low_memory(&self) {
        let mut state = self.state.lock().unwrap();
        debug!("Dropping cached thumbnails under memory pressure");
        let selected = state.selected_index;
        for (index, entry) in state.entries.iter_mut().enumerate() {
            if entry.session.is_custom_tab() || Some(index) == selected {
                continue;
            }
            entry.session.thumbnail = None;
        }
    }

    /// Number of sessions in the registry, custom tabs included.
    pub fn size(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// Whether the registry holds no sessions at all.
    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().entries.is_empty()
    }

    /// The currently selected session, if any.
    pub fn selected_session(&self) -> Option<Session> {
        let state = self.state.lock().unwrap();
        state
            .selected_index
            .map(|i| state.entries[i].session.clone())
    }

    /// The currently selected session.
    ///
    /// # Errors
    ///
    /// `NotSelected` if nothing is selected.
    pub fn require_selected(&self) -> Result<Session> {
        self.selected_session().ok_or(Error::NotSelected)
    }

    /// Index of the current selection, if any. Exposed for UIs that track
    /// tab positions.
    pub fn selected_index(&self) -> Option<usize> {
        self.state.lock().unwrap().selected_index
    }

    /// All ordinary sessions in tab order, custom tabs excluded.
    pub fn sessions(&self) -> Vec<Session> {
        let state = self.state.lock().unwrap();
        state
            .entries
            .iter()
            .filter(|e| !e.session.is_custom_tab())
            .map(|e| e.session.clone())
            .collect()
    }

    /// Every session in order, custom tabs included.
    pub fn all(&self) -> Vec<Session> {
        let state = self.state.lock().unwrap();
        state.entries.iter().map(|e| e.session.clone()).collect()
    }

    // ---- internal, called with the lock held ----

    #[allow(clippy::too_many_arguments)]
    fn add_locked(
        &self,
        state: &mut RegistryState,
        session: Session,
        selected: bool,
        engine_handle: Option<Arc<dyn EngineHandle>>,
        parent_id: Option<&SessionId>,
        effects: &mut Vec<EngineEffect>,
        events: &mut Vec<RegistryEvent>,
    ) -> Result<()> {
        let (index, session) = match parent_id {
            Some(parent_id) => {
                let parent_index = state
                    .index_of(parent_id)
                    .ok_or(Error::InvalidParent(*parent_id))?;
                let mut session = session;
                session.parent_id = Some(*parent_id);
                (parent_index + 1, session)
            }
            None => (state.entries.len(), session),
        };

        self.insert_locked(
            state,
            session,
            index,
            selected,
            engine_handle,
            None,
            false,
            effects,
            events,
        );
        Ok(())
    }

    /// Shared insertion path for `add`, `restore` and the default session.
    /// `silent` suppresses the added event and the auto-select rule.
    #[allow(clippy::too_many_arguments)]
    fn insert_locked(
        &self,
        state: &mut RegistryState,
        session: Session,
        index: usize,
        selected: bool,
        engine_handle: Option<Arc<dyn EngineHandle>>,
        engine_state: Option<EngineState>,
        silent: bool,
        effects: &mut Vec<EngineEffect>,
        events: &mut Vec<RegistryEvent>,
    ) {
        info!(
            "Adding session: id={}, url={}, index={}, private={}, custom_tab={}",
            session.id(),
            session.url,
            index,
            session.is_private(),
            session.is_custom_tab()
        );

        let link = match engine_state {
            Some(engine_state) => EngineLink::Saved(engine_state),
            None => EngineLink::None,
        };
        state.entries.insert(index, SessionEntry { session, link });

        // An insertion at or before the selection shifts it right
        if let Some(selected_index) = state.selected_index {
            if index <= selected_index {
                state.selected_index = Some(selected_index + 1);
            }
        }

        if let Some(handle) = engine_handle {
            self.link_locked(state, index, handle, None, effects);
        }

        let session = state.entries[index].session.clone();
        if !silent {
            events.push(RegistryEvent::Added(session.clone()));

            // Auto-select the first ordinary session so a fresh registry
            // always has a selection without an explicit call
            if selected || (state.selected_index.is_none() && !session.is_custom_tab()) {
                Self::select_locked(state, index, events);
            }
        }
    }

    fn remove_locked(
        &self,
        state: &mut RegistryState,
        index: usize,
        select_parent_if_exists: bool,
        effects: &mut Vec<EngineEffect>,
        events: &mut Vec<RegistryEvent>,
    ) {
        let selected_before = state
            .selected_index
            .map(|i| *state.entries[i].session.id());

        let mut entry = state.entries.remove(index);
        Self::unlink_entry(&mut entry, effects);
        let removed = entry.session;
        info!("Removing session: id={}, url={}", removed.id(), removed.url);

        let new_selection = selection::recompute_selection(
            &state.entries,
            state.selected_index,
            index,
            select_parent_if_exists,
            removed.is_private(),
            removed.parent_id.as_ref(),
        );

        // Promote direct children to their grandparent
        for entry in state.entries.iter_mut() {
            if entry.session.parent_id.as_ref() == Some(removed.id()) {
                entry.session.parent_id = removed.parent_id;
            }
        }

        state.selected_index = new_selection;
        events.push(RegistryEvent::Removed(removed));

        if state.selected_index.is_none() && self.default_session.is_some() {
            // The default session selects itself via the auto-select rule,
            // which covers the selection-changed notification
            self.add_default_locked(state, effects, events);
            return;
        }

        let selected_after = state
            .selected_index
            .map(|i| *state.entries[i].session.id());
        if selected_after != selected_before {
            if let Some(index) = state.selected_index {
                let session = state.entries[index].session.clone();
                events.push(RegistryEvent::Selected(session));
            }
        }
    }

    fn add_default_locked(
        &self,
        state: &mut RegistryState,
        effects: &mut Vec<EngineEffect>,
        events: &mut Vec<RegistryEvent>,
    ) {
        if let Some(factory) = &self.default_session {
            let session = factory();
            debug!("Adding default session: id={}", session.id());
            let index = state.entries.len();
            self.insert_locked(state, session, index, false, None, None, false, effects, events);
        }
    }

    fn select_locked(state: &mut RegistryState, index: usize, events: &mut Vec<RegistryEvent>) {
        state.selected_index = Some(index);
        let session = state.entries[index].session.clone();
        info!("Selecting session: id={}, index={}", session.id(), index);
        events.push(RegistryEvent::Selected(session));
    }

    fn link_locked(
        &self,
        state: &mut RegistryState,
        index: usize,
        handle: Arc<dyn EngineHandle>,
        restore: Option<EngineState>,
        effects: &mut Vec<EngineEffect>,
    ) {
        let weak = Arc::downgrade(&self.state);
        let entry = &mut state.entries[index];
        let session_id = *entry.session.id();

        Self::unlink_entry(entry, effects);

        let observer: Arc<dyn EngineObserver> = Arc::new(LinkObserver::new(weak, session_id));
        entry.link = EngineLink::Live {
            handle: Arc::clone(&handle),
            observer: Arc::clone(&observer),
        };
        debug!("Linking engine handle: id={}", session_id);
        effects.push(EngineEffect::Attach {
            handle,
            observer,
            restore,
            load: entry.session.url.clone(),
        });
    }

    /// Clear an entry's engine attachment. Idempotent: a second call on the
    /// same entry finds nothing to release.
    fn unlink_entry(entry: &mut SessionEntry, effects: &mut Vec<EngineEffect>) {
        match std::mem::replace(&mut entry.link, EngineLink::None) {
            EngineLink::Live { handle, observer } => {
                debug!("Unlinking engine handle: id={}", entry.session.id());
                effects.push(EngineEffect::Close { handle, observer });
            }
            EngineLink::Saved(_) | EngineLink::None => {}
        }
    }

    /// Perform deferred engine side effects, outside the critical section.
    fn run_effects(&self, effects: Vec<EngineEffect>) {
        for effect in effects {
            match effect {
                EngineEffect::Close { handle, observer } => {
                    handle.unregister_observer(&observer);
                    handle.close();
                }
                EngineEffect::Attach {
                    handle,
                    observer,
                    restore,
                    load,
                } => {
                    if let Some(state) = restore {
                        handle.restore_state(&state);
                    }
                    handle.register_observer(observer);
                    handle.load_url(&load);
                }
            }
        }
    }
}
