//! Current-program session state

use std::sync::Arc;

use log::info;

use crate::models::ProgramModel;

/// Holds the program model of the current session, if one has been loaded.
///
/// Loading a new document replaces the previous model; there is no history.
#[derive(Debug, Default)]
pub struct SessionState {
    current: Option<Arc<ProgramModel>>,
}

impl SessionState {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// The current model, if any
    pub fn get(&self) -> Option<Arc<ProgramModel>> {
        self.current.clone()
    }

    /// Replace the current model
    pub fn set(&mut self, model: ProgramModel) -> Arc<ProgramModel> {
        info!(
            "Loaded program '{}' ({} instructions, {} accounts)",
            model.name,
            model.instructions.len(),
            model.accounts.len()
        );
        let model = Arc::new(model);
        self.current = Some(Arc::clone(&model));
        model
    }

    /// Drop the current model
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Has nothing been loaded yet?
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }
}
