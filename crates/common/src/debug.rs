//! Per-category diagnostic levels parsed from a `-d` style debug string.
//!
//! Accepted forms: `"2"` (every category), `"misc=2,net=3"`, or both
//! (`"1 net=4"`). Each category name doubles as the `tracing` target used by
//! the code that logs under it.

use std::fmt;

/// A diagnostic category with its own verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugCategory {
    Misc,
    SpriteCache,
    Grf,
    Ai,
    Net,
}

impl DebugCategory {
    pub const ALL: [DebugCategory; 5] = [
        Self::Misc,
        Self::SpriteCache,
        Self::Grf,
        Self::Ai,
        Self::Net,
    ];

    /// The name used in debug strings and as the `tracing` target.
    pub fn name(self) -> &'static str {
        match self {
            Self::Misc => "misc",
            Self::SpriteCache => "spritecache",
            Self::Grf => "grf",
            Self::Ai => "ai",
            Self::Net => "net",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DebugCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A debug string named a category that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown debug level '{0}'")]
pub struct UnknownDebugCategory(pub String);

/// Verbosity per [`DebugCategory`]; 0 means silent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugLevels {
    levels: [u32; DebugCategory::ALL.len()],
}

impl DebugLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, category: DebugCategory) -> u32 {
        self.levels[category.slot()]
    }

    pub fn set(&mut self, category: DebugCategory, level: u32) {
        self.levels[category.slot()] = level;
    }

    /// Apply a debug string on top of the current levels.
    ///
    /// Parsing stops at the first unknown category; everything before it
    /// stays applied.
    pub fn apply(&mut self, s: &str) -> Result<(), UnknownDebugCategory> {
        let bytes = s.as_bytes();
        let mut pos = 0;

        if bytes.first().is_some_and(u8::is_ascii_digit) {
            let (v, next) = read_number(bytes, pos);
            pos = next;
            self.levels = [v; DebugCategory::ALL.len()];
        }

        loop {
            while pos < bytes.len() && matches!(bytes[pos], b' ' | b',' | b'\t') {
                pos += 1;
            }
            if pos >= bytes.len() {
                return Ok(());
            }

            let start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_lowercase() {
                pos += 1;
            }
            let name = &s[start..pos];
            let Some(category) = DebugCategory::from_name(name) else {
                let shown = if name.is_empty() {
                    s[start..].chars().next().map(String::from).unwrap_or_default()
                } else {
                    name.to_string()
                };
                return Err(UnknownDebugCategory(shown));
            };

            if bytes.get(pos) == Some(&b'=') {
                pos += 1;
            }
            let (v, next) = read_number(bytes, pos);
            pos = next;
            self.set(category, v);
        }
    }

    /// `tracing` filter directives for every non-silent category.
    ///
    /// Levels 1 to 4 map to `debug`, 5 and above to `trace`.
    pub fn filter_directives(&self) -> Vec<String> {
        DebugCategory::ALL
            .into_iter()
            .filter_map(|c| {
                let filter = match self.level(c) {
                    0 => return None,
                    1..=4 => "debug",
                    _ => "trace",
                };
                Some(format!("{}={filter}", c.name()))
            })
            .collect()
    }
}

fn read_number(bytes: &[u8], mut pos: usize) -> (u32, usize) {
    let mut v: u32 = 0;
    while let Some(b) = bytes.get(pos).filter(|b| b.is_ascii_digit()) {
        v = v.saturating_mul(10).saturating_add(u32::from(b - b'0'));
        pos += 1;
    }
    (v, pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<DebugLevels, UnknownDebugCategory> {
        let mut levels = DebugLevels::new();
        levels.apply(s)?;
        Ok(levels)
    }

    #[test]
    fn global_level_applies_everywhere() {
        let levels = parse("3").unwrap();
        for c in DebugCategory::ALL {
            assert_eq!(levels.level(c), 3);
        }
    }

    #[test]
    fn individual_levels() {
        let levels = parse("misc=2, net=5").unwrap();
        assert_eq!(levels.level(DebugCategory::Misc), 2);
        assert_eq!(levels.level(DebugCategory::Net), 5);
        assert_eq!(levels.level(DebugCategory::Ai), 0);
    }

    #[test]
    fn global_then_override() {
        let levels = parse("1 ai=4").unwrap();
        assert_eq!(levels.level(DebugCategory::Grf), 1);
        assert_eq!(levels.level(DebugCategory::Ai), 4);
    }

    #[test]
    fn unknown_category_keeps_earlier_tokens() {
        let mut levels = DebugLevels::new();
        let err = levels.apply("misc=2,sound=3,net=1").unwrap_err();
        assert_eq!(err, UnknownDebugCategory("sound".into()));
        assert_eq!(levels.level(DebugCategory::Misc), 2);
        assert_eq!(levels.level(DebugCategory::Net), 0);
    }

    #[test]
    fn uppercase_is_rejected() {
        assert!(parse("NET=2").is_err());
    }

    #[test]
    fn directives_skip_silent_categories() {
        let levels = parse("misc=1,net=7").unwrap();
        assert_eq!(levels.filter_directives(), vec!["misc=debug", "net=trace"]);
    }
}
