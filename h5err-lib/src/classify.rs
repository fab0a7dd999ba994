use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::{get_default, Config, FramePolicy};
use crate::error::Result;
use crate::kind::ErrorKind;
use crate::library::{Frame, LibraryError};

pub(crate) fn normalize(msg: &str) -> String {
    msg.trim().to_ascii_lowercase()
}

/// Maps native major error messages to [ErrorKind]s.
#[derive(Debug, Clone)]
pub struct Classifier {
    policy: FramePolicy,
    exact: HashMap<String, ErrorKind>,
    folded: HashMap<String, ErrorKind>,
}

impl Classifier {
    pub fn new(config: &Config) -> Self {
        let mut exact = HashMap::default();
        let mut folded = HashMap::default();
        for major in &config.majors {
            for msg in &major.messages {
                exact.insert(msg.clone(), major.kind);
                folded.insert(normalize(msg), major.kind);
            }
        }
        Self {
            policy: config.frame,
            exact,
            folded,
        }
    }

    /// Classifier for the built-in table.
    pub fn try_default() -> Result<Self> {
        Ok(Self::new(&get_default()?))
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FramePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FramePolicy {
        self.policy
    }

    pub fn classify_major(&self, msg: &str) -> ErrorKind {
        if let Some(kind) = self.exact.get(msg) {
            return *kind;
        }
        match self.folded.get(&normalize(msg)) {
            Some(kind) => *kind,
            None => {
                warn!("unknown major error message {msg:?}");
                ErrorKind::Unclassified
            }
        }
    }

    /// Whether any frame of `err`'s stack belongs to `kind`, regardless of policy.
    pub fn involves(&self, err: &LibraryError, kind: ErrorKind) -> bool {
        err.stack()
            .iter()
            .any(|frame| self.classify_major(&frame.major) == kind)
    }

    /// Build the error for a native stack, outermost frame first.
    pub fn classify_stack(&self, stack: Vec<Frame>) -> LibraryError {
        let frame = match self.policy {
            FramePolicy::Outermost => stack.first(),
            FramePolicy::Innermost => stack.last(),
        };
        let Some(frame) = frame else {
            debug!("empty error stack");
            return LibraryError::new(ErrorKind::Unclassified);
        };

        let kind = self.classify_major(&frame.major);
        debug!(
            "classified {}() major={:?} as {kind:?}",
            frame.func, frame.major
        );
        let (desc, minor) = (frame.desc.clone(), frame.minor.clone());
        LibraryError::with_message(kind, desc)
            .with_minor(minor)
            .with_stack(stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(func: &str, major: &str, minor: &str, desc: &str) -> Frame {
        Frame {
            func: func.to_string(),
            file: "H5test.c".to_string(),
            line: 1,
            major: major.to_string(),
            minor: minor.to_string(),
            desc: desc.to_string(),
        }
    }

    fn read_failure() -> Vec<Frame> {
        vec![
            frame("H5Dread", "Dataset", "Read failed", "can't read data"),
            frame("H5D__read", "Dataset", "Read failed", "can't read data"),
            frame(
                "H5Z_pipeline",
                "Data filters layer",
                "Read failed",
                "required filter 'deflate' is not registered",
            ),
        ]
    }

    #[test]
    fn test_classify_major() {
        let classifier = Classifier::try_default().unwrap();
        for kind in ErrorKind::all() {
            if *kind == ErrorKind::Unclassified {
                continue;
            }
            assert_eq!(classifier.classify_major(kind.description()), *kind);
        }
        assert_eq!(classifier.classify_major("Object atom"), ErrorKind::Id);
        assert_eq!(
            classifier.classify_major("  data FILTERS layer "),
            ErrorKind::DataFilters
        );
        assert_eq!(
            classifier.classify_major("Quantum flux"),
            ErrorKind::Unclassified
        );
    }

    #[test]
    fn test_outermost() {
        let classifier = Classifier::try_default().unwrap();
        let err = classifier.classify_stack(read_failure());

        assert_eq!(err.kind(), ErrorKind::DatasetInterface);
        assert_eq!(err.message(), Some("can't read data"));
        assert_eq!(err.minor(), Some("Read failed"));
        assert_eq!(err.stack().len(), 3);
    }

    #[test]
    fn test_innermost() {
        let classifier = Classifier::try_default()
            .unwrap()
            .with_policy(FramePolicy::Innermost);
        let err = classifier.classify_stack(read_failure());

        assert_eq!(err.kind(), ErrorKind::DataFilters);
        assert_eq!(
            err.message(),
            Some("required filter 'deflate' is not registered")
        );
        assert_eq!(err.stack()[0].func, "H5Dread");
    }

    #[test]
    fn test_involves() {
        let classifier = Classifier::try_default().unwrap();
        let err = classifier.classify_stack(read_failure());

        assert!(err.is(ErrorKind::DatasetInterface));
        assert!(classifier.involves(&err, ErrorKind::DataFilters));
        assert!(!classifier.involves(&err, ErrorKind::Heap));
        assert!(!classifier.involves(
            &LibraryError::new(ErrorKind::DataFilters),
            ErrorKind::DataFilters
        ));
    }

    #[test]
    fn test_folded_messages_of_one_kind() {
        let config = Config::with_data(
            "majors:\n  - {symbol: H5E_HEAP, kind: heap, messages: [Heap, HEAP]}\n",
        )
        .unwrap();
        let classifier = Classifier::new(&config);
        assert_eq!(classifier.classify_major(" Heap "), ErrorKind::Heap);
        assert_eq!(classifier.classify_major("heap"), ErrorKind::Heap);
    }

    #[test]
    fn test_empty_stack() {
        let classifier = Classifier::try_default().unwrap();
        assert_eq!(
            classifier.classify_stack(Vec::default()),
            LibraryError::new(ErrorKind::Unclassified)
        );
    }

    #[test]
    fn test_custom_table() {
        let config = Config::with_data(
            "frame: innermost\nmajors:\n  - {symbol: H5E_PLINE, kind: data_filters, messages: [Filters]}\n",
        )
        .unwrap();
        let classifier = Classifier::new(&config);
        assert_eq!(classifier.policy(), FramePolicy::Innermost);
        assert_eq!(classifier.classify_major("Filters"), ErrorKind::DataFilters);
        assert_eq!(classifier.classify_major("Dataset"), ErrorKind::Unclassified);
    }
}
