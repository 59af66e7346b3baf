//! Golden parse/serialize cases stored as TOML.
//!
//! ```toml
//! format = "tagtree-golden-v1"
//!
//! [[cases]]
//! name = "stray-end-tag"
//! input = "<div></span></div>"
//! outline = ["#document", "  <div>"]
//! xml = "<?xml version=\"1.0\" encoding=\"utf-8\"?><div />"
//!
//! [cases.options]
//! close_policy = "cascade"
//! ```
//!
//! `html` defaults to the input itself: an unedited document must serialize
//! back to its source.

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const GOLDEN_FORMAT_V1: &str = "tagtree-golden-v1";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GoldenFile {
    pub format: String,
    #[serde(default)]
    pub cases: Vec<GoldenCase>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GoldenCase {
    pub name: String,
    pub input: String,
    #[serde(default)]
    pub outline: Option<Vec<String>>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub xml: Option<String>,
    /// Expected parse failure, e.g. `"depth_limit"`.
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub options: FixtureOptions,
}

impl GoldenCase {
    pub fn expected_html(&self) -> &str {
        self.html.as_deref().unwrap_or(&self.input)
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixtureOptions {
    pub close_policy: Option<FixtureClosePolicy>,
    pub auto_close_on_end: Option<bool>,
    pub max_depth: Option<usize>,
    pub track_ids: Option<bool>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FixtureClosePolicy {
    ForceClose,
    Cascade,
}

/// Reads and validates a golden file. Panics with the path on any problem.
pub fn load_golden_file(path: &Path) -> GoldenFile {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read golden file {path:?}: {err}"));
    let file = parse_golden_file(&content)
        .unwrap_or_else(|err| panic!("failed to parse golden file {path:?}: {err}"));
    assert_eq!(
        file.format, GOLDEN_FORMAT_V1,
        "unsupported golden format in {path:?}"
    );
    let mut names = BTreeSet::new();
    for case in &file.cases {
        assert!(
            names.insert(case.name.as_str()),
            "duplicate golden case name in {path:?}: {}",
            case.name
        );
    }
    file
}

pub fn parse_golden_file(content: &str) -> Result<GoldenFile, toml::de::Error> {
    toml::from_str(content)
}
