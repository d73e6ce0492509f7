//! Caller-supplied visualization parameters.

use serde::{Deserialize, Serialize};

use crate::engine::RenderOptions;

/// A scalar or a list of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(f64),
    Many(Vec<f64>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            OneOrMany::One(v) => vec![*v],
            OneOrMany::Many(vs) => vs.clone(),
        }
    }
}

/// A list of names, or one comma-separated string (`"B4,B3,B2"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    Joined(String),
    List(Vec<String>),
}

impl NameList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            NameList::Joined(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            NameList::List(names) => names.clone(),
        }
    }
}

impl Default for NameList {
    fn default() -> Self {
        NameList::List(Vec::new())
    }
}

/// The `visualization` object of a request.
///
/// `bands` selects the composite bands; every other field is a rendering
/// override layered over `{min: 0, max: 1}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    #[serde(default)]
    pub bands: NameList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamma: Option<OneOrMany>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<NameList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl VisualizationConfig {
    pub fn with_bands<S: Into<String>>(bands: impl IntoIterator<Item = S>) -> Self {
        Self {
            bands: NameList::List(bands.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn band_names(&self) -> Vec<String> {
        self.bands.to_vec()
    }

    /// Rendering options for `bands`: the caller's overrides where given,
    /// `min = 0` and `max = 1` otherwise.
    pub fn merge(&self, bands: &[String]) -> RenderOptions {
        let defaults = RenderOptions::default();
        RenderOptions {
            bands: bands.to_vec(),
            min: self.min.as_ref().map_or(defaults.min, OneOrMany::to_vec),
            max: self.max.as_ref().map_or(defaults.max, OneOrMany::to_vec),
            gamma: self.gamma.as_ref().map(OneOrMany::to_vec),
            palette: self.palette.as_ref().map(NameList::to_vec),
            opacity: self.opacity,
        }
    }
}
