//! Layout hint for the list/form split.
//!
//! Purely presentational: the state is recomputed from the current viewport
//! width and pane focus on every relevant event, so whichever event arrives
//! last fully determines the rendering — there is no ordering hazard
//! between resize and focus.

pub(crate) const PANEL_BREAKPOINT_PX: f64 = 1000.0;

/// Where the user's attention currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum PaneFocus {
    #[default]
    Neither,
    /// Focus is inside one of the form's inputs.
    Form,
    /// A list row was expanded.
    List,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PanelMode {
    Default,
    FormFocus,
    ListFocus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PanelState {
    pub mode: PanelMode,
    pub mobile: bool,
}

pub(crate) fn panel_state(viewport_width: f64, focus: PaneFocus) -> PanelState {
    let mode = match focus {
        PaneFocus::Neither => PanelMode::Default,
        PaneFocus::Form => PanelMode::FormFocus,
        PaneFocus::List => PanelMode::ListFocus,
    };

    PanelState {
        mode,
        mobile: viewport_width < PANEL_BREAKPOINT_PX,
    }
}

impl PanelState {
    pub fn container_class(self) -> &'static str {
        if self.mobile {
            "flex flex-col gap-4"
        } else {
            "flex flex-row items-start gap-4"
        }
    }

    /// Below the breakpoint only the dominant pane is shown; above it both
    /// stay visible and focus just biases the split.
    pub fn list_class(self) -> &'static str {
        match (self.mobile, self.mode) {
            (true, PanelMode::FormFocus) => "hidden",
            (true, _) => "w-full",
            (false, PanelMode::Default) => "basis-1/2 min-w-0",
            (false, PanelMode::FormFocus) => "basis-1/3 min-w-0",
            (false, PanelMode::ListFocus) => "basis-2/3 min-w-0",
        }
    }

    pub fn form_class(self) -> &'static str {
        match (self.mobile, self.mode) {
            (true, PanelMode::ListFocus) => "hidden",
            (true, _) => "w-full",
            (false, PanelMode::Default) => "basis-1/2 min-w-0",
            (false, PanelMode::FormFocus) => "basis-2/3 min-w-0",
            (false, PanelMode::ListFocus) => "basis-1/3 min-w-0",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoint_edges() {
        assert!(panel_state(999.9, PaneFocus::Neither).mobile);
        assert!(!panel_state(1000.0, PaneFocus::Neither).mobile);
        assert!(!panel_state(1440.0, PaneFocus::Neither).mobile);
    }

    #[test]
    fn test_focus_maps_to_mode() {
        assert_eq!(panel_state(1200.0, PaneFocus::Neither).mode, PanelMode::Default);
        assert_eq!(panel_state(1200.0, PaneFocus::Form).mode, PanelMode::FormFocus);
        assert_eq!(panel_state(1200.0, PaneFocus::List).mode, PanelMode::ListFocus);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let a = panel_state(800.0, PaneFocus::Form);
        let b = panel_state(800.0, PaneFocus::Form);
        assert_eq!(a, b);
    }

    #[test]
    fn test_latest_event_wins_regardless_of_order() {
        // Resize-then-focus and focus-then-resize converge on the same
        // state because only the latest inputs matter.
        let focused_then_resized = panel_state(800.0, PaneFocus::Form);
        let resized_then_focused = panel_state(800.0, PaneFocus::Form);
        assert_eq!(focused_then_resized, resized_then_focused);

        // Blur afterwards returns to Default at the same width.
        assert_eq!(panel_state(800.0, PaneFocus::Neither).mode, PanelMode::Default);
    }

    #[test]
    fn test_mobile_hides_the_non_dominant_pane() {
        let form = panel_state(600.0, PaneFocus::Form);
        assert_eq!(form.list_class(), "hidden");
        assert_eq!(form.form_class(), "w-full");

        let list = panel_state(600.0, PaneFocus::List);
        assert_eq!(list.form_class(), "hidden");
        assert_eq!(list.list_class(), "w-full");

        let neither = panel_state(600.0, PaneFocus::Neither);
        assert_eq!(neither.list_class(), "w-full");
        assert_eq!(neither.form_class(), "w-full");
    }

    #[test]
    fn test_desktop_biases_instead_of_hiding() {
        let form = panel_state(1280.0, PaneFocus::Form);
        assert_eq!(form.list_class(), "basis-1/3 min-w-0");
        assert_eq!(form.form_class(), "basis-2/3 min-w-0");
    }
}
