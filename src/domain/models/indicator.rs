//! Tri-state relevance indicator model.
//!
//! An indicator starts `Unset` until the user expresses an opinion. From then on a
//! click toggles between `Relevant` and `Irrelevant`; there is no way back to `Unset`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Style class carried by every indicator regardless of its state.
pub const INDICATOR_CLASS: &str = "eye";

/// Relevance value displayed by one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorState {
    /// No relevance record exists yet for this (user, activity) pair.
    #[default]
    Unset,
    /// The user marked the activity as relevant.
    Relevant,
    /// The user marked the activity as irrelevant.
    Irrelevant,
}

impl IndicatorState {
    /// State reached after one click.
    pub const fn next(self) -> Self {
        match self {
            Self::Unset | Self::Irrelevant => Self::Relevant,
            Self::Relevant => Self::Irrelevant,
        }
    }

    /// Style label rendered for this state.
    pub const fn style_label(self) -> &'static str {
        match self {
            Self::Unset => "eye-default",
            Self::Relevant => "eye-relevant",
            Self::Irrelevant => "eye-irrelevant",
        }
    }

    /// Full class attribute value: base class plus state label.
    pub fn class_list(self) -> String {
        format!("{INDICATOR_CLASS} {}", self.style_label())
    }

    /// Boolean carried by the remote record, `None` for `Unset`.
    pub const fn relevance(self) -> Option<bool> {
        match self {
            Self::Unset => None,
            Self::Relevant => Some(true),
            Self::Irrelevant => Some(false),
        }
    }

    pub const fn from_relevance(relevant: bool) -> Self {
        if relevant {
            Self::Relevant
        } else {
            Self::Irrelevant
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Relevant => "relevant",
            Self::Irrelevant => "irrelevant",
        }
    }
}

impl fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
