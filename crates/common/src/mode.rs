use std::fmt;

/// The top-level phase the application is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    /// Title screen with the intro world running behind it.
    #[default]
    Menu,
    /// Regular play.
    Normal,
    /// Scenario editor.
    Editor,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Menu => "menu",
            Self::Normal => "normal",
            Self::Editor => "editor",
        })
    }
}

/// Target of a requested mode transition.
///
/// Transitional targets (loads, saves, generation) always settle on one of
/// the [`GameMode`] values once the transition has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchMode {
    Menu,
    Editor,
    NewGame,
    LoadGame,
    LoadScenario,
    StartScenario,
    Save,
    GenerateRandomLand,
}

impl fmt::Display for SwitchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Menu => "menu",
            Self::Editor => "editor",
            Self::NewGame => "new-game",
            Self::LoadGame => "load-game",
            Self::LoadScenario => "load-scenario",
            Self::StartScenario => "start-scenario",
            Self::Save => "save",
            Self::GenerateRandomLand => "generate-random-land",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_menu() {
        assert_eq!(GameMode::default(), GameMode::Menu);
    }

    #[test]
    fn switch_targets_display_kebab_case() {
        assert_eq!(SwitchMode::GenerateRandomLand.to_string(), "generate-random-land");
        assert_eq!(SwitchMode::LoadScenario.to_string(), "load-scenario");
    }
}
