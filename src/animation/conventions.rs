//! Authoring conventions carried in animation names
//!
//! An animation name (or a follow-chain entry) may stand for an action
//! instead of naming a sibling animation:
//! - `openUrl:<url>` opens a link
//! - `SetActive` / `SetInActive` shows or hides the content node
//! - `ReloadLayerData` asks for a layer refresh

const OPEN_URL_PREFIX: &str = "openUrl:";
const SET_ACTIVE: &str = "SetActive";
const SET_INACTIVE: &str = "SetInActive";
const RELOAD_LAYER_DATA: &str = "ReloadLayerData";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameAction {
    OpenUrl(String),
    /// `true` for `SetActive`, `false` for `SetInActive`
    SetActive(bool),
    ReloadLayer,
}

impl NameAction {
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(url) = strip_prefix_ignore_case(name, OPEN_URL_PREFIX) {
            let url = url.trim();
            return (!url.is_empty()).then(|| Self::OpenUrl(url.to_string()));
        }
        if name.eq_ignore_ascii_case(SET_ACTIVE) {
            Some(Self::SetActive(true))
        } else if name.eq_ignore_ascii_case(SET_INACTIVE) {
            Some(Self::SetActive(false))
        } else if name.eq_ignore_ascii_case(RELOAD_LAYER_DATA) {
            Some(Self::ReloadLayer)
        } else {
            None
        }
    }

    /// Visibility to apply when an instance with this name starts (`true`)
    /// or stops (`false`)
    pub fn visibility_on(&self, starting: bool) -> Option<bool> {
        match self {
            Self::SetActive(show) => Some(if starting { *show } else { !*show }),
            _ => None,
        }
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
