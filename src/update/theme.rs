//! Theme switching

use crate::commands::Cmd;
use crate::model::AppModel;
use crate::theme::ThemeId;

/// Replace the whole theme; applying the active theme again is a no-op
pub fn update_theme(model: &mut AppModel, id: ThemeId) -> Option<Cmd> {
    if model.theme_id != id {
        model.apply_theme(id);
        tracing::info!("Theme switched to {}", id.label());
    }
    model.ui.set_status(format!("Theme: {}", id.label()));
    Some(Cmd::Redraw)
}
