/// Identifiers for tray menu items.
const MENU_ID_SETTINGS: &str = "settings";
const MENU_ID_SHOW_HIDE: &str = "show-hide";
const MENU_ID_QUIT: &str = "quit";

/// An entry of the tray menu, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    Settings,
    ShowHide,
    Quit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 3] = [MenuAction::Settings, MenuAction::ShowHide, MenuAction::Quit];

    pub fn id(self) -> &'static str {
        match self {
            Self::Settings => MENU_ID_SETTINGS,
            Self::ShowHide => MENU_ID_SHOW_HIDE,
            Self::Quit => MENU_ID_QUIT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Settings => "Settings",
            Self::ShowHide => "Show/Hide",
            Self::Quit => "Exit",
        }
    }

    /// Resolve a menu event id. Unknown ids are ignored by the caller.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.id() == id)
    }
}
