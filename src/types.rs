use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Build mode, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Production,
    #[default]
    Development,
}

impl BuildMode {
    pub fn is_production(self) -> bool {
        matches!(self, BuildMode::Production)
    }

    pub fn is_development(self) -> bool {
        matches!(self, BuildMode::Development)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Production => f.write_str("production"),
            BuildMode::Development => f.write_str("development"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(BuildMode::Production),
            "development" | "dev" => Ok(BuildMode::Development),
            other => Err(format!(
                "invalid mode: {other} (expected \"production\" or \"development\")"
            )),
        }
    }
}

/// Stylesheet layout: left-to-right only, or left-to-right plus a mirrored
/// right-to-left variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Ltr,
    LtrAndRtl,
}

impl Layout {
    /// Interpret the `--dir` selector. Only `"rtl"` enables the RTL variant;
    /// anything else (including an empty value) means LTR only.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "rtl" => Layout::LtrAndRtl,
            _ => Layout::Ltr,
        }
    }

    pub fn wants_rtl(self) -> bool {
        matches!(self, Layout::LtrAndRtl)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Ltr => f.write_str("ltr"),
            Layout::LtrAndRtl => f.write_str("ltr+rtl"),
        }
    }
}

/// Asset category. Each category owns one source tree and one destination
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Scripts,
    Styles,
    Templates,
    Fonts,
    Images,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Scripts,
        Category::Styles,
        Category::Templates,
        Category::Fonts,
        Category::Images,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Scripts => "scripts",
            Category::Styles => "styles",
            Category::Templates => "templates",
            Category::Fonts => "fonts",
            Category::Images => "images",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour when a category is triggered while one of its runs is in flight.
///
/// - `Queue`: remember the trigger (up to `queue_length` pending runs) and
///   replay it once the current run finishes. Runs of one category never
///   overlap.
/// - `Parallel`: dispatch every trigger immediately, so runs of the same
///   category may overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Parallel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "parallel" => Ok(TriggerWhileRunningBehaviour::Parallel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"parallel\")"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_rtl_selector_enables_rtl() {
        assert_eq!(Layout::from_selector(Some("rtl")), Layout::LtrAndRtl);
        assert_eq!(Layout::from_selector(Some(" RTL ")), Layout::LtrAndRtl);
        assert_eq!(Layout::from_selector(Some("ltr")), Layout::Ltr);
        assert_eq!(Layout::from_selector(None), Layout::Ltr);
    }

    #[test]
    fn mode_parses_short_forms() {
        assert_eq!("prod".parse::<BuildMode>(), Ok(BuildMode::Production));
        assert_eq!("Development".parse::<BuildMode>(), Ok(BuildMode::Development));
        assert!("staging".parse::<BuildMode>().is_err());
    }
}
