//! Conversion configuration.
//!
//! A [`Config`] is built by applying [`Directive`]s in order. Directives come
//! from Rust code or from a TOML file ([`ConfigFile`]):
//!
//! ```toml
//! err_wraps = ["wrap_context"]
//!
//! [rename]
//! both = [{ rule = "lower" }]
//! source = [{ rule = "trim-prefix", prefix = "Get" }]
//!
//! [[import]]
//! name = "format_time"
//! source = "int64"
//! target = "string"
//!
//! [[match]]
//! source = "Nick"
//! target = "Alias"
//!
//! [[skip]]
//! source = "Secret"
//!
//! [discover]
//! getters = { prefix = "Get" }
//! nested = { target = ["Profile"] }
//!
//! [record]
//! rename = { target = [{ rule = "trim-common-prefix" }] }
//! ```
//!
//! Every directive read from a file gets a position in the [`SourceMap`], so
//! diagnostics point at the line that declared it.

use crate::rename::{RenamePipeline, RenameRule};
use crate::schema::{Pos, SourceMap, Type, TypeParseError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use toml::Spanned;

/// Error from building or loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid regex pattern `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error(transparent)]
    InvalidType(#[from] TypeParseError),

    #[error("{directive} needs at least one side")]
    NoSide { directive: &'static str, at: Pos },

    #[error("discover-by-sample already configured")]
    DuplicateSample { at: Pos },
}

impl ConfigError {
    pub fn at(&self) -> Pos {
        match self {
            ConfigError::NoSide { at, .. } | ConfigError::DuplicateSample { at } => *at,
            _ => Pos::NONE,
        }
    }
}

/// Which side of a conversion a directive applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
    Both,
}

impl Side {
    fn source(self) -> bool {
        matches!(self, Side::Source | Side::Both)
    }

    fn target(self) -> bool {
        matches!(self, Side::Target | Side::Both)
    }
}

/// A user-supplied conversion function for one exact type pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuncRef {
    pub name: String,
    pub source: Type,
    pub target: Type,
    pub fallible: bool,
    pub at: Pos,
}

/// A conversion function attached to one forced pair. Its types are those of
/// the matched members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFunc {
    pub name: String,
    #[serde(default)]
    pub fallible: bool,
}

/// A forced pair, by member path on each side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRule {
    pub x: String,
    pub y: String,
    pub func: Option<MatchFunc>,
    pub at: Pos,
}

/// A pair that must not be matched; `None` stands for "no counterpart".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRule {
    pub x: Option<String>,
    pub y: Option<String>,
    pub at: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrWrap {
    pub name: String,
    pub at: Pos,
}

/// Method-name affix selecting accessors for discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affix {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

impl Affix {
    pub fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix) && name.ends_with(&self.suffix)
    }

    /// The name without the affix, used as the match key.
    pub fn strip<'a>(&self, name: &'a str) -> &'a str {
        let name = name.strip_prefix(self.prefix.as_str()).unwrap_or(name);
        name.strip_suffix(self.suffix.as_str()).unwrap_or(name)
    }
}

/// Alternate declaration scopes for enumeration member and union variant
/// discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sample {
    pub x: Option<String>,
    pub y: Option<String>,
}

/// The kinds of conversion with their own overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Record,
    Union,
    Enum,
}

/// One configuration instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Rename { side: Side, rule: RenameRule },
    Match { x: String, y: String, func: Option<MatchFunc> },
    Skip { x: Option<String>, y: Option<String> },
    Import(FuncRef),
    ErrWrap(String),
    ErrWrapReset,
    /// Discover enumeration members or union variants in other scopes.
    DiscoverBySample { x: Option<String>, y: Option<String> },
    DiscoverUnexported { x: bool, y: bool },
    /// Discover source-side getters named `<prefix>Key<suffix>`.
    DiscoverGetters(Affix),
    /// Discover target-side setters named `<prefix>Key<suffix>`.
    DiscoverSetters(Affix),
    /// Turn off getter (source) or setter (target) discovery.
    DiscoverFieldsOnly { x: bool, y: bool },
    /// Flatten the members of a nested record field into its owner.
    DiscoverNested { x: Option<String>, y: Option<String> },
    For(Kind, Vec<(Directive, Pos)>),
}

/// The active configuration of one conversion.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub funcs: Vec<FuncRef>,
    pub err_wraps: Vec<ErrWrap>,
    pub rename_x: RenamePipeline,
    pub rename_y: RenamePipeline,
    pub matches: Vec<MatchRule>,
    pub skips: Vec<SkipRule>,
    pub sample: Option<Sample>,
    pub unexported: Option<(bool, bool)>,
    pub getters: Option<Affix>,
    pub setters: Option<Affix>,
    pub nested_x: Vec<String>,
    pub nested_y: Vec<String>,
    pub for_record: Option<Box<Config>>,
    pub for_union: Option<Box<Config>>,
    pub for_enum: Option<Box<Config>>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply directives in order.
    pub fn from_directives(
        directives: impl IntoIterator<Item = (Directive, Pos)>,
    ) -> Result<Self, ConfigError> {
        let mut cfg = Config::new();
        for (directive, at) in directives {
            cfg.apply(directive, at)?;
        }
        Ok(cfg)
    }

    /// Apply one more directive, without a position. Lets tests and callers
    /// chain directives onto [`Config::new`].
    pub fn with(mut self, directive: Directive) -> Result<Self, ConfigError> {
        self.apply(directive, Pos::NONE)?;
        Ok(self)
    }

    pub fn apply(&mut self, directive: Directive, at: Pos) -> Result<(), ConfigError> {
        match directive {
            Directive::Rename { side, rule } => {
                let stage = rule.compile()?;
                for (enabled, pipeline) in [
                    (side.source(), &mut self.rename_x),
                    (side.target(), &mut self.rename_y),
                ] {
                    if !enabled {
                        continue;
                    }
                    match &stage {
                        Some(stage) => pipeline.push(stage.clone()),
                        None => pipeline.reset(),
                    }
                }
            }
            Directive::Match { x, y, func } => self.matches.push(MatchRule { x, y, func, at }),
            Directive::Skip { x, y } => {
                if x.is_none() && y.is_none() {
                    return Err(ConfigError::NoSide { directive: "skip", at });
                }
                self.skips.push(SkipRule { x, y, at });
            }
            Directive::Import(mut func) => {
                if !func.at.is_valid() {
                    func.at = at;
                }
                self.funcs.push(func);
            }
            Directive::ErrWrap(name) => self.err_wraps.push(ErrWrap { name, at }),
            Directive::ErrWrapReset => self.err_wraps.clear(),
            Directive::DiscoverBySample { x, y } => {
                if self.sample.is_some() {
                    return Err(ConfigError::DuplicateSample { at });
                }
                if x.is_none() && y.is_none() {
                    let directive = "discover-by-sample";
                    return Err(ConfigError::NoSide { directive, at });
                }
                self.sample = Some(Sample { x, y });
            }
            Directive::DiscoverUnexported { x, y } => self.unexported = Some((x, y)),
            Directive::DiscoverGetters(affix) => self.getters = Some(affix),
            Directive::DiscoverSetters(affix) => self.setters = Some(affix),
            Directive::DiscoverFieldsOnly { x, y } => {
                if !x && !y {
                    let directive = "discover-fields-only";
                    return Err(ConfigError::NoSide { directive, at });
                }
                if x {
                    self.getters = None;
                }
                if y {
                    self.setters = None;
                }
            }
            Directive::DiscoverNested { x, y } => {
                if x.is_none() && y.is_none() {
                    let directive = "discover-nested";
                    return Err(ConfigError::NoSide { directive, at });
                }
                self.nested_x.extend(x);
                self.nested_y.extend(y);
            }
            Directive::For(kind, directives) => {
                let overlay = match kind {
                    Kind::Record => &mut self.for_record,
                    Kind::Union => &mut self.for_union,
                    Kind::Enum => &mut self.for_enum,
                };
                let overlay = overlay.get_or_insert_with(Box::default);
                for (directive, at) in directives {
                    overlay.apply(directive, at)?;
                }
            }
        }
        Ok(())
    }

    /// A copy for a nested conversion: renames and discovery toggles carry
    /// over, pair-specific directives do not.
    pub fn fork(&self) -> Config {
        Config {
            matches: Vec::new(),
            skips: Vec::new(),
            sample: None,
            nested_x: Vec::new(),
            nested_y: Vec::new(),
            ..self.clone()
        }
    }

    /// Merge an overlay into this configuration.
    pub fn update(&mut self, other: &Config) {
        self.funcs.extend(other.funcs.iter().cloned());
        self.err_wraps.extend(other.err_wraps.iter().cloned());
        self.rename_x.extend(&other.rename_x);
        self.rename_y.extend(&other.rename_y);

        self.matches = other.matches.clone();
        self.skips = other.skips.clone();
        self.nested_x = other.nested_x.clone();
        self.nested_y = other.nested_y.clone();

        if other.sample.is_some() {
            self.sample = other.sample.clone();
        }
        if other.unexported.is_some() {
            self.unexported = other.unexported;
        }
        if other.getters.is_some() {
            self.getters = other.getters.clone();
        }
        if other.setters.is_some() {
            self.setters = other.setters.clone();
        }
    }

    /// [`Config::fork`], then the overlay registered for `kind`.
    pub fn fork_for(&self, kind: Kind) -> Config {
        let mut cfg = self.fork();
        if let Some(overlay) = self.overlay(kind) {
            cfg.update(overlay);
        }
        cfg
    }

    pub fn overlay(&self, kind: Kind) -> Option<&Config> {
        match kind {
            Kind::Record => self.for_record.as_deref(),
            Kind::Union => self.for_union.as_deref(),
            Kind::Enum => self.for_enum.as_deref(),
        }
    }

    pub fn unexported_x(&self) -> bool {
        self.unexported.is_some_and(|(x, _)| x)
    }

    pub fn unexported_y(&self) -> bool {
        self.unexported.is_some_and(|(_, y)| y)
    }
}

/// Rename stage lists per side.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenameSection {
    pub both: Vec<RenameRule>,
    pub source: Vec<RenameRule>,
    pub target: Vec<RenameRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchEntry {
    pub source: String,
    pub target: String,
    pub func: Option<MatchFunc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkipEntry {
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportEntry {
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub fallible: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SidesFlag {
    pub source: bool,
    pub target: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SidesScope {
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SidesPaths {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoverSection {
    pub sample: Option<Spanned<SidesScope>>,
    pub unexported: Option<SidesFlag>,
    pub getters: Option<Affix>,
    pub setters: Option<Affix>,
    pub fields_only: Option<Spanned<SidesFlag>>,
    pub nested: Option<Spanned<SidesPaths>>,
}

/// The TOML form of a configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub err_wraps: Vec<Spanned<String>>,
    pub err_wrap_reset: bool,
    pub rename: RenameSection,
    #[serde(rename = "import")]
    pub imports: Vec<Spanned<ImportEntry>>,
    #[serde(rename = "match")]
    pub matches: Vec<Spanned<MatchEntry>>,
    #[serde(rename = "skip")]
    pub skips: Vec<Spanned<SkipEntry>>,
    pub discover: DiscoverSection,
    pub record: Option<Box<ConfigFile>>,
    pub union: Option<Box<ConfigFile>>,
    #[serde(rename = "enum")]
    pub enumeration: Option<Box<ConfigFile>>,
}

impl ConfigFile {
    /// Read and parse `path`, registering directive positions in `sources`.
    pub fn load(
        path: &Path,
        sources: &mut SourceMap,
    ) -> Result<Vec<(Directive, Pos)>, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string(), sources)
    }

    /// Parse TOML text. `file` names the text in positions.
    pub fn parse(
        text: &str,
        file: &str,
        sources: &mut SourceMap,
    ) -> Result<Vec<(Directive, Pos)>, ConfigError> {
        let parsed: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            file: file.to_string(),
            source,
        })?;
        tracing::debug!(file, "loaded conversion config");
        let mut lines = LineIndex::new(text, file, sources);
        parsed.into_directives(&mut lines)
    }

    fn into_directives(
        self,
        lines: &mut LineIndex<'_>,
    ) -> Result<Vec<(Directive, Pos)>, ConfigError> {
        let mut out = Vec::new();

        for (side, rules) in [
            (Side::Both, self.rename.both),
            (Side::Source, self.rename.source),
            (Side::Target, self.rename.target),
        ] {
            for rule in rules {
                out.push((Directive::Rename { side, rule }, Pos::NONE));
            }
        }

        if self.err_wrap_reset {
            out.push((Directive::ErrWrapReset, Pos::NONE));
        }
        for name in self.err_wraps {
            let at = lines.pos(name.span().start);
            out.push((Directive::ErrWrap(name.into_inner()), at));
        }

        for entry in self.imports {
            let at = lines.pos(entry.span().start);
            let entry = entry.into_inner();
            let func = FuncRef {
                name: entry.name,
                source: entry.source.parse()?,
                target: entry.target.parse()?,
                fallible: entry.fallible,
                at,
            };
            out.push((Directive::Import(func), at));
        }

        for entry in self.matches {
            let at = lines.pos(entry.span().start);
            let entry = entry.into_inner();
            let directive = Directive::Match {
                x: entry.source,
                y: entry.target,
                func: entry.func,
            };
            out.push((directive, at));
        }

        for entry in self.skips {
            let at = lines.pos(entry.span().start);
            let entry = entry.into_inner();
            let directive = Directive::Skip {
                x: entry.source,
                y: entry.target,
            };
            out.push((directive, at));
        }

        let discover = self.discover;
        if let Some(sample) = discover.sample {
            let at = lines.pos(sample.span().start);
            let sample = sample.into_inner();
            let directive = Directive::DiscoverBySample {
                x: sample.source,
                y: sample.target,
            };
            out.push((directive, at));
        }
        if let Some(flags) = discover.unexported {
            let directive = Directive::DiscoverUnexported {
                x: flags.source,
                y: flags.target,
            };
            out.push((directive, Pos::NONE));
        }
        if let Some(affix) = discover.getters {
            out.push((Directive::DiscoverGetters(affix), Pos::NONE));
        }
        if let Some(affix) = discover.setters {
            out.push((Directive::DiscoverSetters(affix), Pos::NONE));
        }
        if let Some(flags) = discover.fields_only {
            let at = lines.pos(flags.span().start);
            let flags = flags.into_inner();
            let directive = Directive::DiscoverFieldsOnly {
                x: flags.source,
                y: flags.target,
            };
            out.push((directive, at));
        }
        if let Some(nested) = discover.nested {
            let at = lines.pos(nested.span().start);
            let nested = nested.into_inner();
            for x in nested.source {
                out.push((Directive::DiscoverNested { x: Some(x), y: None }, at));
            }
            for y in nested.target {
                out.push((Directive::DiscoverNested { x: None, y: Some(y) }, at));
            }
        }

        for (kind, overlay) in [
            (Kind::Record, self.record),
            (Kind::Union, self.union),
            (Kind::Enum, self.enumeration),
        ] {
            if let Some(overlay) = overlay {
                let directives = overlay.into_directives(lines)?;
                out.push((Directive::For(kind, directives), Pos::NONE));
            }
        }

        Ok(out)
    }
}

/// Turns byte offsets into registered positions.
struct LineIndex<'a> {
    file: String,
    starts: Vec<usize>,
    sources: &'a mut SourceMap,
}

impl<'a> LineIndex<'a> {
    fn new(text: &str, file: &str, sources: &'a mut SourceMap) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            file: file.to_string(),
            starts,
            sources,
        }
    }

    fn pos(&mut self, offset: usize) -> Pos {
        let line = self.starts.partition_point(|&start| start <= offset);
        let column = offset - self.starts[line.saturating_sub(1)] + 1;
        let line = u32::try_from(line).unwrap_or(u32::MAX);
        let column = u32::try_from(column).unwrap_or(u32::MAX);
        self.sources.add(self.file.clone(), line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(directives: Vec<Directive>) -> Config {
        Config::from_directives(directives.into_iter().map(|d| (d, Pos::NONE))).unwrap()
    }

    #[test]
    fn test_rename_sides_and_reset() {
        let cfg = cfg(vec![
            Directive::Rename {
                side: Side::Both,
                rule: RenameRule::Lower,
            },
            Directive::Rename {
                side: Side::Target,
                rule: RenameRule::Reset,
            },
            Directive::Rename {
                side: Side::Target,
                rule: RenameRule::Upper,
            },
        ]);
        assert_eq!(cfg.rename_x.labels().collect::<Vec<_>>(), ["lower"]);
        assert_eq!(cfg.rename_y.labels().collect::<Vec<_>>(), ["upper"]);
    }

    #[test]
    fn test_fork_drops_pair_directives() {
        let cfg = cfg(vec![
            Directive::Match {
                x: "A".into(),
                y: "B".into(),
                func: None,
            },
            Directive::Skip {
                x: Some("C".into()),
                y: None,
            },
            Directive::DiscoverBySample {
                x: Some("other".into()),
                y: None,
            },
            Directive::DiscoverGetters(Affix {
                prefix: "Get".into(),
                suffix: String::new(),
            }),
            Directive::Rename {
                side: Side::Source,
                rule: RenameRule::Lower,
            },
        ]);
        let forked = cfg.fork();
        assert!(forked.matches.is_empty());
        assert!(forked.skips.is_empty());
        assert!(forked.sample.is_none());
        assert!(forked.getters.is_some());
        assert_eq!(forked.rename_x.labels().count(), 1);
    }

    #[test]
    fn test_overlay_for_kind() {
        let cfg = cfg(vec![
            Directive::Rename {
                side: Side::Both,
                rule: RenameRule::Lower,
            },
            Directive::For(
                Kind::Record,
                vec![(
                    Directive::Rename {
                        side: Side::Target,
                        rule: RenameRule::TrimCommonPrefix,
                    },
                    Pos::NONE,
                )],
            ),
        ]);
        let record = cfg.fork_for(Kind::Record);
        assert_eq!(
            record.rename_y.labels().collect::<Vec<_>>(),
            ["lower", "trim-common-prefix"]
        );
        let union = cfg.fork_for(Kind::Union);
        assert_eq!(union.rename_y.labels().collect::<Vec<_>>(), ["lower"]);
    }

    #[test]
    fn test_fields_only_turns_off_accessors() {
        let cfg = cfg(vec![
            Directive::DiscoverGetters(Affix::default()),
            Directive::DiscoverSetters(Affix::default()),
            Directive::DiscoverFieldsOnly { x: true, y: false },
        ]);
        assert!(cfg.getters.is_none());
        assert!(cfg.setters.is_some());
    }

    #[test]
    fn test_directive_errors() {
        let mut cfg = Config::new();
        let err = cfg
            .apply(Directive::Skip { x: None, y: None }, Pos::NONE)
            .unwrap_err();
        assert_eq!(err.to_string(), "skip needs at least one side");

        let sample = || Directive::DiscoverBySample {
            x: Some("a".into()),
            y: None,
        };
        cfg.apply(sample(), Pos::NONE).unwrap();
        assert!(matches!(
            cfg.apply(sample(), Pos::NONE),
            Err(ConfigError::DuplicateSample { .. })
        ));
    }

    #[test]
    fn test_affix() {
        let affix = Affix {
            prefix: "Get".into(),
            suffix: "Value".into(),
        };
        assert!(affix.matches("GetNameValue"));
        assert!(!affix.matches("SetNameValue"));
        assert_eq!(affix.strip("GetNameValue"), "Name");
    }

    #[test]
    fn test_parse_file_positions() {
        let mut sources = SourceMap::new();
        let text = r#"
match = [{ source = "Nick", target = "Alias" }]
skip = [{ source = "Secret" }]

[[import]]
name = "format_time"
source = "int64"
target = "string"
"#;
        let directives = ConfigFile::parse(text, "conv.toml", &mut sources).unwrap();
        assert_eq!(directives.len(), 3);
        assert!(matches!(&directives[0].0, Directive::Import(f) if f.name == "format_time"));
        assert_eq!(
            directives[1].0,
            Directive::Match {
                x: "Nick".into(),
                y: "Alias".into(),
                func: None
            }
        );
        let line = |at: Pos| sources.get(at).map(|loc| (loc.file.clone(), loc.line));
        assert_eq!(line(directives[1].1), Some(("conv.toml".into(), 2)));
        assert_eq!(line(directives[2].1), Some(("conv.toml".into(), 3)));
    }

    #[test]
    fn test_parse_overlays_and_discovery() {
        let mut sources = SourceMap::new();
        let text = r#"
err_wraps = ["wrap"]

[rename]
both = [{ rule = "lower" }]

[discover]
getters = { prefix = "Get" }
unexported = { source = true }

[record]
rename = { target = [{ rule = "trim-common-prefix" }] }
"#;
        let directives = ConfigFile::parse(text, "conv.toml", &mut sources).unwrap();
        let cfg = Config::from_directives(directives).unwrap();
        assert_eq!(cfg.err_wraps.len(), 1);
        assert_eq!(cfg.getters.as_ref().map(|a| a.prefix.as_str()), Some("Get"));
        assert!(cfg.unexported_x());
        assert!(!cfg.unexported_y());
        let record = cfg.fork_for(Kind::Record);
        assert_eq!(record.rename_y.labels().count(), 2);
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conv.toml");
        std::fs::write(&path, "skip = [{ target = \"Extra\" }]\n").unwrap();
        let mut sources = SourceMap::new();
        let directives = ConfigFile::load(&path, &mut sources).unwrap();
        assert_eq!(
            directives[0].0,
            Directive::Skip {
                x: None,
                y: Some("Extra".into())
            }
        );
        let loc = sources.get(directives[0].1).unwrap();
        assert!(loc.file.ends_with("conv.toml"));
        assert_eq!(loc.line, 1);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = SourceMap::new();
        let missing = ConfigFile::load(&dir.path().join("nope.toml"), &mut sources);
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let bad = ConfigFile::parse("[[match]]\nsource = 1\n", "bad.toml", &mut sources);
        assert!(matches!(bad, Err(ConfigError::Parse { .. })));

        let unknown = ConfigFile::parse("colour = true\n", "bad.toml", &mut sources);
        assert!(matches!(unknown, Err(ConfigError::Parse { .. })));
    }
}
