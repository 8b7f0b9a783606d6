use findor_core::ApiKey;

pub const FETCH_FAILED: &str = "Failed to fetch API keys";
pub const CREATE_FAILED: &str = "Failed to create API key";
pub const DELETE_FAILED: &str = "Failed to delete API key";

/// Primary lifecycle of the key list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No identity yet.
    #[default]
    Uninitialized,
    /// First foreground fetch in progress.
    Loading,
    Ready,
    /// The last foreground fetch failed. Any previous list is kept.
    Error,
}

/// Everything a view needs to draw the key dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerState {
    pub email: Option<String>,
    pub phase: Phase,
    pub keys: Vec<ApiKey>,
    pub background_refreshing: bool,
    /// User-visible banner text.
    pub error: Option<String>,
    pub creating: bool,
    pub deleting: bool,
    pub create_dialog_open: bool,
    /// Freshly created key shown in full exactly once.
    pub pending_reveal: Option<ApiKey>,
    /// Key awaiting delete confirmation.
    pub pending_delete: Option<ApiKey>,
}

impl ManagerState {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// The create dialog may only be opened once the list has loaded and
    /// no create is pending.
    pub fn can_open_create(&self) -> bool {
        self.email.is_some() && !self.is_loading() && !self.creating
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}
