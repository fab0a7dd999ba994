use h5err::config::{get_default, FramePolicy};
use h5err::{Classifier, ErrorKind, Frame, LibraryError};

#[test]
fn load_default_config() {
    let config = get_default().expect("embedded config is invalid");
    assert_eq!(config.majors.len(), ErrorKind::all().len() - 1);
}

#[test]
fn data_filters_error() {
    let err = LibraryError::with_message(ErrorKind::DataFilters, "deflate filter not available");
    assert_eq!(err.kind(), ErrorKind::DataFilters);
    assert_eq!(err.kind().symbol(), "H5E_PLINE");
    assert_eq!(err.message(), Some("deflate filter not available"));

    let err: h5err::Error = err.into();
    assert_eq!(
        err.to_string(),
        "Data filters layer: deflate filter not available"
    );
    assert!(err.library().unwrap().is(ErrorKind::DataFilters));
}

#[test]
fn write_failure_in_pipeline() {
    let stack = vec![
        Frame {
            func: "H5Dwrite".to_string(),
            file: "H5D.c".to_string(),
            line: 1,
            major: "Dataset".to_string(),
            minor: "Write failed".to_string(),
            desc: "can't write data".to_string(),
        },
        Frame {
            func: "H5Z_pipeline".to_string(),
            file: "H5Z.c".to_string(),
            line: 2,
            major: "Data filters".to_string(),
            minor: "Unable to initialize object".to_string(),
            desc: "filter returned failure".to_string(),
        },
    ];

    let classifier = Classifier::try_default().unwrap();
    assert!(classifier.classify_stack(stack.clone()).is(ErrorKind::DatasetInterface));

    let err = classifier
        .with_policy(FramePolicy::Innermost)
        .classify_stack(stack);
    assert!(err.is(ErrorKind::DataFilters));
    assert_eq!(err.minor(), Some("Unable to initialize object"));
}
