//! Rename pipelines that turn candidate names into match keys.
//!
//! A pipeline is an ordered list of stages. Some stages (the `trim-common-*`
//! family) need a value derived from every current key before they can
//! rewrite any one of them; that value is computed once per stage, from the
//! keys as the previous stages left them.

use crate::affix;
use crate::config::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Rewrites one key. The second argument is the stage's common affix, or an
/// empty string when the stage has no finder.
pub type RenameFn = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Computes a value shared by all keys of one side.
pub type CommonFn = fn(&[String]) -> String;

/// A declarative rename rule, as written in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum RenameRule {
    /// Replace every occurrence of `from` with `to`.
    Replace { from: String, to: String },
    /// Replace every match of `pattern` with `to` (`$1` style captures allowed).
    ReplaceRegex { pattern: String, to: String },
    Lower,
    Upper,
    TrimPrefix { prefix: String },
    TrimSuffix { suffix: String },
    TrimCommonPrefix,
    TrimCommonSuffix,
    TrimCommonWordPrefix,
    TrimCommonWordSuffix,
    /// Drop every stage registered so far.
    Reset,
}

impl RenameRule {
    /// Compile the rule into a stage. Returns `None` for [`RenameRule::Reset`],
    /// which is not a stage but an instruction to the pipeline.
    pub fn compile(&self) -> Result<Option<RenameStage>, ConfigError> {
        let stage = match self {
            RenameRule::Replace { from, to } => {
                let (from, to) = (from.clone(), to.clone());
                RenameStage::new(format!("replace({from:?}, {to:?})"), move |s, _| {
                    s.replace(&from, &to)
                })
            }
            RenameRule::ReplaceRegex { pattern, to } => {
                let re = Regex::new(pattern).map_err(|e| ConfigError::InvalidRegex {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                let to = to.clone();
                RenameStage::new(format!("replace-regex({pattern:?}, {to:?})"), move |s, _| {
                    re.replace_all(s, to.as_str()).into_owned()
                })
            }
            RenameRule::Lower => RenameStage::new("lower", |s, _| s.to_lowercase()),
            RenameRule::Upper => RenameStage::new("upper", |s, _| s.to_uppercase()),
            RenameRule::TrimPrefix { prefix } => {
                let prefix = prefix.clone();
                RenameStage::new(format!("trim-prefix({prefix:?})"), move |s, _| {
                    s.strip_prefix(prefix.as_str()).unwrap_or(s).to_string()
                })
            }
            RenameRule::TrimSuffix { suffix } => {
                let suffix = suffix.clone();
                RenameStage::new(format!("trim-suffix({suffix:?})"), move |s, _| {
                    s.strip_suffix(suffix.as_str()).unwrap_or(s).to_string()
                })
            }
            RenameRule::TrimCommonPrefix => RenameStage::with_common(
                "trim-common-prefix",
                affix::common_prefix::<String>,
                trim_prefix,
            ),
            RenameRule::TrimCommonSuffix => RenameStage::with_common(
                "trim-common-suffix",
                affix::common_suffix::<String>,
                trim_suffix,
            ),
            RenameRule::TrimCommonWordPrefix => RenameStage::with_common(
                "trim-common-word-prefix",
                affix::common_word_prefix::<String>,
                trim_prefix,
            ),
            RenameRule::TrimCommonWordSuffix => RenameStage::with_common(
                "trim-common-word-suffix",
                affix::common_word_suffix::<String>,
                trim_suffix,
            ),
            RenameRule::Reset => return Ok(None),
        };
        Ok(Some(stage))
    }
}

fn trim_prefix(s: &str, common: &str) -> String {
    s.strip_prefix(common).unwrap_or(s).to_string()
}

fn trim_suffix(s: &str, common: &str) -> String {
    s.strip_suffix(common).unwrap_or(s).to_string()
}

/// One step of a [`RenamePipeline`].
#[derive(Clone)]
pub struct RenameStage {
    label: String,
    rename: RenameFn,
    common: Option<CommonFn>,
}

impl RenameStage {
    /// A stage that looks at one key at a time.
    pub fn new(
        label: impl Into<String>,
        rename: impl Fn(&str, &str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            rename: Arc::new(rename),
            common: None,
        }
    }

    /// A stage that first derives a common value from all keys of the side.
    pub fn with_common(
        label: impl Into<String>,
        common: CommonFn,
        rename: impl Fn(&str, &str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            rename: Arc::new(rename),
            common: Some(common),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for RenameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RenameStage").field(&self.label).finish()
    }
}

/// Ordered rename stages for one side of a conversion.
#[derive(Debug, Clone, Default)]
pub struct RenamePipeline {
    stages: Vec<RenameStage>,
    /// Set once a reset was pushed, so that merging this pipeline into an
    /// inherited one also discards the inherited stages.
    reset: bool,
}

impl RenamePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: RenameStage) {
        self.stages.push(stage);
    }

    /// Truncate the stage list.
    pub fn reset(&mut self) {
        self.stages.clear();
        self.reset = true;
    }

    /// Append another pipeline's stages, honoring its reset.
    pub fn extend(&mut self, other: &RenamePipeline) {
        if other.reset {
            self.reset();
        }
        self.stages.extend(other.stages.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(RenameStage::label)
    }

    /// Rewrite all keys in place, stage by stage.
    ///
    /// Common affixes are only computed when there are at least two keys; a
    /// lone key is its own common prefix and would be trimmed to nothing.
    pub fn apply(&self, keys: &mut [String]) {
        for stage in &self.stages {
            let common = match stage.common {
                Some(find) if keys.len() > 1 => find(keys),
                _ => String::new(),
            };
            for key in keys.iter_mut() {
                *key = (stage.rename)(key.as_str(), &common);
            }
        }
    }

    /// Rename a single key. Stages with a common finder see an empty affix.
    pub fn apply_one(&self, key: &str) -> String {
        let mut keys = [key.to_string()];
        self.apply(&mut keys);
        let [key] = keys;
        key
    }
}
