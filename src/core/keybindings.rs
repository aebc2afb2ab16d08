//! Viewer keybindings.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::core::input::parse_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerAction {
    LineDown,
    LineUp,
    PageDown,
    PageUp,
    HalfPageDown,
    HalfPageUp,
    Top,
    Bottom,
    ScrollLeft,
    ScrollRight,
    LineStart,
    RefreshNow,
    TogglePause,
    ToggleFollow,
    OlderCapture,
    NewerCapture,
    Quit,
}

pub type KeyId = String;

#[derive(Debug, Clone)]
pub enum KeyBinding {
    Single(KeyId),
    Multiple(Vec<KeyId>),
}

impl From<&str> for KeyBinding {
    fn from(value: &str) -> Self {
        KeyBinding::Single(value.to_string())
    }
}

impl From<Vec<&str>> for KeyBinding {
    fn from(value: Vec<&str>) -> Self {
        KeyBinding::Multiple(value.into_iter().map(|item| item.to_string()).collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewerKeybindingsConfig {
    entries: HashMap<ViewerAction, KeyBinding>,
}

impl ViewerKeybindingsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<K: Into<KeyBinding>>(&mut self, action: ViewerAction, keys: K) {
        self.entries.insert(action, keys.into());
    }
}

fn keys(ids: &[&str]) -> Vec<KeyId> {
    ids.iter().map(|id| id.to_string()).collect()
}

pub static DEFAULT_VIEWER_KEYBINDINGS: LazyLock<HashMap<ViewerAction, Vec<KeyId>>> =
    LazyLock::new(|| {
        use ViewerAction::*;

        let mut map = HashMap::new();
        map.insert(LineDown, keys(&["down", "j", "ctrl+n", "enter"]));
        map.insert(LineUp, keys(&["up", "k", "ctrl+p"]));
        map.insert(PageDown, keys(&["pageDown", "space", "ctrl+f"]));
        map.insert(PageUp, keys(&["pageUp", "b", "ctrl+b"]));
        map.insert(HalfPageDown, keys(&["d", "ctrl+d"]));
        map.insert(HalfPageUp, keys(&["u", "ctrl+u"]));
        map.insert(Top, keys(&["home", "g"]));
        map.insert(Bottom, keys(&["end", "G"]));
        map.insert(ScrollLeft, keys(&["left", "h"]));
        map.insert(ScrollRight, keys(&["right", "l"]));
        map.insert(LineStart, keys(&["0"]));
        map.insert(RefreshNow, keys(&["r", "ctrl+l"]));
        map.insert(TogglePause, keys(&["p"]));
        map.insert(ToggleFollow, keys(&["f"]));
        map.insert(OlderCapture, keys(&["["]));
        map.insert(NewerCapture, keys(&["]"]));
        map.insert(Quit, keys(&["q", "Q", "ctrl+c", "escape"]));
        map
    });

pub struct ViewerKeybindings {
    action_to_keys: HashMap<ViewerAction, Vec<KeyId>>,
    key_to_action: HashMap<KeyId, ViewerAction>,
}

impl Default for ViewerKeybindings {
    fn default() -> Self {
        Self::new(ViewerKeybindingsConfig::default())
    }
}

impl ViewerKeybindings {
    pub fn new(config: ViewerKeybindingsConfig) -> Self {
        let mut manager = Self {
            action_to_keys: HashMap::new(),
            key_to_action: HashMap::new(),
        };
        manager.build_maps(&config);
        manager
    }

    fn build_maps(&mut self, config: &ViewerKeybindingsConfig) {
        self.action_to_keys.clear();
        self.key_to_action.clear();

        for (action, keys) in DEFAULT_VIEWER_KEYBINDINGS.iter() {
            self.action_to_keys.insert(*action, keys.clone());
        }
        for (action, binding) in config.entries.iter() {
            let key_list = match binding {
                KeyBinding::Single(key) => vec![key.clone()],
                KeyBinding::Multiple(keys) => keys.clone(),
            };
            self.action_to_keys.insert(*action, key_list);
        }

        // Overrides win: drop default keys that an override reassigned.
        for (action, keys) in &self.action_to_keys {
            if config.entries.contains_key(action) {
                continue;
            }
            for key in keys {
                self.key_to_action.entry(key.clone()).or_insert(*action);
            }
        }
        for action in config.entries.keys() {
            if let Some(keys) = self.action_to_keys.get(action) {
                for key in keys {
                    self.key_to_action.insert(key.clone(), *action);
                }
            }
        }
    }

    /// Action bound to the key in `data`, if any.
    pub fn action_for(&self, data: &str) -> Option<ViewerAction> {
        let key = parse_key(data)?;
        self.key_to_action.get(&key).copied()
    }

    pub fn matches(&self, data: &str, action: ViewerAction) -> bool {
        self.action_for(data) == Some(action)
    }

    pub fn get_keys(&self, action: ViewerAction) -> Vec<KeyId> {
        self.action_to_keys.get(&action).cloned().unwrap_or_default()
    }

    pub fn set_config(&mut self, config: ViewerKeybindingsConfig) {
        self.build_maps(&config);
    }
}
