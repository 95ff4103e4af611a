//! In-memory host view.
//!
//! `SlotBoard` owns the secret slots, countdown visuals and tagged labels of
//! one view. Components only receive non-owning slot handles; once the board
//! is gone, writes through them are silently ignored.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;

use super::adapter::SlotPair;
use crate::models::SecretFamily;
use crate::traits::{CountdownSurface, LocalizedDocument, SecretSlot};

/// Snapshot of one secret slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotView {
    pub text: String,
    pub degraded: bool,
    pub instruction_key: Option<String>,
    pub instruction_text: String,
    /// Who this side belongs to, once a payload has named them.
    pub owner_name: Option<String>,
}

/// Slot ids and instruction keys of a family's two slots.
struct FamilyLayout {
    client_slot: &'static str,
    client_instruction: &'static str,
    advisor_slot: &'static str,
    advisor_instruction: &'static str,
}

fn layout(family: SecretFamily) -> FamilyLayout {
    match family {
        SecretFamily::Passkeys => FamilyLayout {
            client_slot: "client_passkey",
            client_instruction: "passkey_advisor_from_client",
            advisor_slot: "advisor_client_passkey",
            advisor_instruction: "passkey_advisor_to_client",
        },
        SecretFamily::Passwords => FamilyLayout {
            client_slot: "client_pwd",
            client_instruction: "password_advisor_from_client",
            advisor_slot: "advisor_client_pwd",
            advisor_instruction: "password_advisor_to_client",
        },
    }
}

#[derive(Default)]
struct BoardState {
    slots: BTreeMap<String, SlotView>,
    countdowns: BTreeMap<String, f64>,
    labels: BTreeMap<String, String>,
}

/// Display slots of one view, with a revision counter hosts can watch.
pub struct SlotBoard {
    state: StdMutex<BoardState>,
    revision: watch::Sender<u64>,
}

impl SlotBoard {
    pub fn new() -> Arc<Self> {
        let (revision, _) = watch::channel(0);
        Arc::new(Self {
            state: StdMutex::new(BoardState::default()),
            revision,
        })
    }

    /// Mount a secret slot, optionally next to an instruction label.
    pub fn mount_secret_slot(
        self: &Arc<Self>,
        id: &str,
        instruction_key: Option<&str>,
    ) -> Arc<BoardSlot> {
        self.mutate(|state| {
            state.slots.insert(
                id.to_string(),
                SlotView {
                    instruction_key: instruction_key.map(str::to_string),
                    instruction_text: instruction_key.unwrap_or_default().to_string(),
                    ..SlotView::default()
                },
            );
        });
        Arc::new(BoardSlot {
            board: Arc::downgrade(self),
            id: id.to_string(),
        })
    }

    /// Mount both slots of `family` with their instruction labels.
    pub fn mount_family(self: &Arc<Self>, family: SecretFamily) -> SlotPair {
        let layout = layout(family);
        let client = self.mount_secret_slot(layout.client_slot, Some(layout.client_instruction));
        let advisor =
            self.mount_secret_slot(layout.advisor_slot, Some(layout.advisor_instruction));
        SlotPair::new(client, advisor)
    }

    /// Mount the countdown visual for `key`, drawn empty.
    pub fn mount_countdown(&self, key: &str) {
        self.mutate(|state| {
            state.countdowns.insert(key.to_string(), 0.0);
        });
    }

    pub fn unmount_countdown(&self, key: &str) -> bool {
        self.mutate(|state| state.countdowns.remove(key).is_some())
    }

    /// Mount a static label tagged with a localization key.
    pub fn mount_label(&self, key: &str) {
        self.mutate(|state| {
            state.labels.insert(key.to_string(), key.to_string());
        });
    }

    pub fn slot(&self, id: &str) -> Option<SlotView> {
        self.lock().slots.get(id).cloned()
    }

    pub fn countdown_phase(&self, key: &str) -> Option<f64> {
        self.lock().countdowns.get(key).copied()
    }

    pub fn label(&self, key: &str) -> Option<String> {
        self.lock().labels.get(key).cloned()
    }

    /// Current revision; bumped on every change.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Watch the revision counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Plain-text rendering: one line per label, slot and countdown, with a
    /// slot's owner name on the line below it.
    pub fn render(&self) -> String {
        let state = self.lock();
        let mut out = String::new();

        for text in state.labels.values() {
            let _ = writeln!(out, "{}", text);
        }
        for view in state.slots.values() {
            let marker = if view.degraded { " (rotating)" } else { "" };
            if view.instruction_text.is_empty() {
                let _ = writeln!(out, "  {}{}", view.text, marker);
            } else {
                let _ = writeln!(out, "  {}: {}{}", view.instruction_text, view.text, marker);
            }
            if let Some(name) = &view.owner_name {
                let _ = writeln!(out, "    {}", name);
            }
        }
        for (key, degrees) in &state.countdowns {
            let _ = writeln!(out, "  [{}] {:>5.1}°", key, degrees);
        }
        out
    }

    fn update_slot(&self, id: &str, f: impl FnOnce(&mut SlotView)) {
        self.mutate(|state| {
            if let Some(view) = state.slots.get_mut(id) {
                f(view);
            }
        });
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut BoardState) -> R) -> R {
        let result = {
            let mut state = self.lock();
            f(&mut state)
        };
        self.revision.send_modify(|revision| *revision += 1);
        result
    }

    fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CountdownSurface for SlotBoard {
    fn draw_countdown(&self, key: &str, degrees: f64) -> bool {
        self.mutate(|state| match state.countdowns.get_mut(key) {
            Some(phase) => {
                *phase = degrees;
                true
            }
            None => false,
        })
    }
}

impl LocalizedDocument for SlotBoard {
    fn localized_keys(&self) -> Vec<String> {
        let state = self.lock();
        let mut keys: Vec<String> = state.labels.keys().cloned().collect();
        keys.extend(
            state
                .slots
                .values()
                .filter_map(|view| view.instruction_key.clone()),
        );
        keys.sort();
        keys.dedup();
        keys
    }

    fn set_localized_text(&self, key: &str, text: &str) {
        self.mutate(|state| {
            if let Some(label) = state.labels.get_mut(key) {
                *label = text.to_string();
            }
            for view in state.slots.values_mut() {
                if view.instruction_key.as_deref() == Some(key) {
                    view.instruction_text = text.to_string();
                }
            }
        });
    }
}

/// Non-owning handle to one slot of a [`SlotBoard`].
pub struct BoardSlot {
    board: Weak<SlotBoard>,
    id: String,
}

impl BoardSlot {
    pub fn id(&self) -> &str {
        &self.id
    }

    fn with_board(&self, f: impl FnOnce(&SlotBoard)) {
        if let Some(board) = self.board.upgrade() {
            f(&board);
        }
    }
}

impl SecretSlot for BoardSlot {
    fn set_secret_text(&self, text: &str) {
        self.with_board(|board| board.update_slot(&self.id, |view| view.text = text.to_string()));
    }

    fn set_degraded(&self, degraded: bool) {
        self.with_board(|board| board.update_slot(&self.id, |view| view.degraded = degraded));
    }

    fn instruction_key(&self) -> Option<String> {
        self.board
            .upgrade()
            .and_then(|board| board.slot(&self.id))
            .and_then(|view| view.instruction_key)
    }

    fn set_instruction_text(&self, text: &str) {
        self.with_board(|board| {
            board.update_slot(&self.id, |view| view.instruction_text = text.to_string())
        });
    }

    fn set_owner_name(&self, name: &str) {
        self.with_board(|board| {
            board.update_slot(&self.id, |view| view.owner_name = Some(name.to_string()))
        });
    }
}
