use super::*;
use pretty_assertions::assert_eq;

#[test]
fn fs_sink_creates_directories() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FsSink::new(dir.path());
    let outcome = sink.write("include/Neato/Dog.h", "int x;\n").unwrap();
    assert_eq!(outcome, WriteOutcome::Written);
    let text = fs::read_to_string(dir.path().join("include/Neato/Dog.h")).unwrap();
    assert_eq!(text, "int x;\n");
}

#[test]
fn fs_sink_skips_identical_content() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FsSink::new(dir.path());
    sink.write("a.h", "same").unwrap();
    let modified = fs::metadata(dir.path().join("a.h")).unwrap().modified().unwrap();

    assert_eq!(sink.write("a.h", "same").unwrap(), WriteOutcome::Unchanged);
    let again = fs::metadata(dir.path().join("a.h")).unwrap().modified().unwrap();
    assert_eq!(modified, again);

    assert_eq!(sink.write("a.h", "different").unwrap(), WriteOutcome::Written);
}

#[test]
fn fs_sink_rejects_escaping_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = FsSink::new(dir.path());
    for bad in ["../x.h", "a//b.h", "./a.h", ""] {
        assert!(matches!(
            sink.write(bad, ""),
            Err(SinkError::InvalidPath(_))
        ));
    }
}

#[test]
fn write_all_counts_changes() {
    let mut set = ArtifactSet::new();
    set.insert("a.h", "a".to_string()).unwrap();
    set.insert("b.h", "b".to_string()).unwrap();

    let mut sink = MemorySink::new();
    assert_eq!(sink.write_all(&set).unwrap(), 2);
    assert_eq!(sink.write_all(&set).unwrap(), 0);
    assert_eq!(sink.writes(), 2);
    assert_eq!(sink.get("b.h"), Some("b"));
}
