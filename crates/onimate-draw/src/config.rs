use serde::{Deserialize, Serialize};

/// When the host discards its render state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateScope {
    /// Reset at every `frame_start()`. Passes of one frame share state, since a producer may
    /// flush mid-frame.
    #[default]
    Frame,
    /// Reset at the start of every `draw`, with the clip stack required to balance by the
    /// pass's END.
    Pass,
    /// Never reset implicitly.
    Session,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConfig {
    pub state_scope: StateScope,
    /// Maximum number of records (END excluded) executed per pass.
    pub max_records: Option<usize>,
}

impl DrawConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state_scope(mut self, scope: StateScope) -> Self {
        self.state_scope = scope;
        self
    }

    pub fn max_records(mut self, limit: usize) -> Self {
        self.max_records = Some(limit);
        self
    }
}
