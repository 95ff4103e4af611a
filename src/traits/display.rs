//! Display surfaces provided by the host view.
//!
//! The host owns its slots; components only hold non-owning handles to
//! them and write through these traits.

/// A slot showing one side's secret, inside a box that may carry an
/// instruction label.
pub trait SecretSlot: Send + Sync {
    /// Replace the slot's visible text.
    fn set_secret_text(&self, text: &str);

    /// Toggle the degraded (mid-rotation) visual state.
    fn set_degraded(&self, degraded: bool);

    /// Symbolic key of the instruction label next to this slot, if rendered.
    fn instruction_key(&self) -> Option<String>;

    /// Replace the instruction label's text.
    fn set_instruction_text(&self, text: &str);

    /// Show the display name of the party this side belongs to.
    fn set_owner_name(&self, _name: &str) {}
}

/// Circular countdown visuals, addressed by key.
pub trait CountdownSurface: Send + Sync {
    /// Draw `degrees` of elapsed phase on the countdown for `key`.
    ///
    /// Returns false when no visual is mounted for `key`; that is not an
    /// error, the host may not have rendered it yet.
    fn draw_countdown(&self, key: &str, degrees: f64) -> bool;
}

/// A document whose labels are tagged with symbolic text keys.
pub trait LocalizedDocument: Send + Sync {
    /// Keys of every tagged label currently rendered.
    fn localized_keys(&self) -> Vec<String>;

    /// Rewrite every label tagged with `key`.
    fn set_localized_text(&self, key: &str, text: &str);
}
