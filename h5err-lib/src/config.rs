use std::{
    collections::{HashMap, HashSet},
    fs::File,
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::classify::normalize;
use crate::error::{Error, Result};
use crate::kind::ErrorKind;

/// Which error-stack entry decides the kind of a native failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramePolicy {
    /// The API call that failed.
    #[default]
    Outermost,
    /// The entry where the failure was first detected.
    Innermost,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MajorSpec {
    pub symbol: String,
    pub kind: ErrorKind,
    pub messages: Vec<String>,
}

// Major error classification table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub frame: FramePolicy,
    pub majors: Vec<MajorSpec>,
}

impl Config {
    fn validate(self) -> Result<Self> {
        let mut kinds: HashSet<ErrorKind> = HashSet::default();
        // Keyed the way the classifier matches, so no message can resolve to two kinds
        let mut messages: HashMap<String, ErrorKind> = HashMap::default();
        for major in &self.majors {
            if major.kind == ErrorKind::Unclassified {
                return Err(Error::ConfigInvalid(format!(
                    "{} may not be classified as unclassified",
                    major.symbol
                )));
            }
            if major.symbol.parse::<ErrorKind>().ok() != Some(major.kind) {
                return Err(Error::ConfigInvalid(format!(
                    "kind {:?} has symbol {}, not {}",
                    major.kind,
                    major.kind.symbol(),
                    major.symbol
                )));
            }
            if !kinds.insert(major.kind) {
                return Err(Error::ConfigInvalid(format!(
                    "{} is configured more than once",
                    major.symbol
                )));
            }
            if major.messages.is_empty() {
                return Err(Error::ConfigInvalid(format!(
                    "{} has no messages",
                    major.symbol
                )));
            }
            for msg in &major.messages {
                if let Some(other) = messages.insert(normalize(msg), major.kind) {
                    if other != major.kind {
                        return Err(Error::ConfigInvalid(format!(
                            "message {msg:?} is used by both {} and {}",
                            other.symbol(),
                            major.symbol
                        )));
                    }
                }
            }
        }

        Ok(self)
    }

    pub fn with_path<P: AsRef<Path>>(fpath: P) -> Result<Config> {
        let fin = File::open(fpath)?;
        let config: Config = serde_yaml::from_reader(fin)?;

        config.validate()
    }

    pub fn with_data(dat: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(dat)?;
        config.validate()
    }

    #[must_use]
    pub fn get_major(&self, kind: ErrorKind) -> Option<&MajorSpec> {
        self.majors.iter().find(|m| m.kind == kind)
    }
}

static DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/etc/majors.yaml"));

pub fn get_default_content() -> &'static str {
    DEFAULT_CONFIG
}

pub fn get_default() -> Result<Config> {
    Config::with_data(get_default_content())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn invalid(dat: &str) -> String {
        match Config::with_data(dat) {
            Err(Error::ConfigInvalid(msg)) => msg,
            zult => panic!("expected invalid config, got {zult:?}"),
        }
    }

    #[test]
    fn test_default() {
        let config = get_default().unwrap();
        assert_eq!(config.frame, FramePolicy::Outermost);
        for kind in ErrorKind::all() {
            if *kind == ErrorKind::Unclassified {
                assert!(config.get_major(*kind).is_none());
                continue;
            }
            let major = config.get_major(*kind).unwrap_or_else(|| panic!("{kind:?} missing"));
            assert!(
                major.messages.iter().any(|m| m == kind.description()),
                "{kind:?} missing canonical message"
            );
        }
    }

    #[test]
    fn test_frame_defaults_to_outermost() {
        let config = Config::with_data(
            "majors:\n  - {symbol: H5E_PLINE, kind: data_filters, messages: [Data filters layer]}\n",
        )
        .unwrap();
        assert_eq!(config.frame, FramePolicy::Outermost);
        assert_eq!(config.majors.len(), 1);
    }

    #[test]
    fn test_duplicate_kind() {
        let msg = invalid(
            r#"
majors:
  - {symbol: H5E_PLINE, kind: data_filters, messages: [Data filters layer]}
  - {symbol: H5E_PLINE, kind: data_filters, messages: [Data filters]}
"#,
        );
        assert!(msg.contains("more than once"), "{msg}");
    }

    #[test]
    fn test_symbol_mismatch() {
        let msg = invalid(
            "majors:\n  - {symbol: H5E_IO, kind: data_filters, messages: [Data filters layer]}\n",
        );
        assert!(msg.contains("H5E_PLINE"), "{msg}");
    }

    #[test]
    fn test_conflicting_message() {
        let msg = invalid(
            r#"
majors:
  - {symbol: H5E_PLINE, kind: data_filters, messages: [Heap]}
  - {symbol: H5E_HEAP, kind: heap, messages: [Heap]}
"#,
        );
        assert!(msg.contains("used by both"), "{msg}");
    }

    #[test]
    fn test_conflicting_folded_message() {
        let msg = invalid(
            r#"
majors:
  - {symbol: H5E_HEAP, kind: heap, messages: [Heap]}
  - {symbol: H5E_PLINE, kind: data_filters, messages: [" HEAP"]}
"#,
        );
        assert!(msg.contains("used by both"), "{msg}");
    }

    #[test]
    fn test_folded_duplicate_within_kind() {
        let config = Config::with_data(
            "majors:\n  - {symbol: H5E_HEAP, kind: heap, messages: [Heap, HEAP]}\n",
        )
        .unwrap();
        assert_eq!(config.majors[0].messages.len(), 2);
    }

    #[test]
    fn test_atom_symbol() {
        let config = Config::with_data(
            "majors:\n  - {symbol: H5E_ATOM, kind: id, messages: [Object atom]}\n",
        )
        .unwrap();
        assert_eq!(config.majors[0].kind, ErrorKind::Id);
        invalid("majors:\n  - {symbol: H5E_ATOM, kind: heap, messages: [Object atom]}\n");
    }

    #[test]
    fn test_unclassified_entry() {
        invalid("majors:\n  - {symbol: \"\", kind: unclassified, messages: [x]}\n");
    }

    #[test]
    fn test_no_messages() {
        let msg = invalid("majors:\n  - {symbol: H5E_HEAP, kind: heap, messages: []}\n");
        assert!(msg.contains("no messages"), "{msg}");
    }

    #[test]
    fn test_unknown_kind_fails_to_load() {
        let zult = Config::with_data(
            "majors:\n  - {symbol: H5E_PLINE, kind: compression, messages: [x]}\n",
        );
        assert!(matches!(zult, Err(Error::ConfigLoad { .. })), "{zult:?}");
    }

    #[test]
    fn test_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(get_default_content().as_bytes()).unwrap();

        let config = Config::with_path(file.path()).unwrap();
        assert_eq!(config.majors.len(), ErrorKind::all().len() - 1);
    }

    #[test]
    fn test_with_path_missing() {
        let zult = Config::with_path("/this/path/does/not/exist.yaml");
        assert!(matches!(zult, Err(Error::Io(_))), "{zult:?}");
    }
}
