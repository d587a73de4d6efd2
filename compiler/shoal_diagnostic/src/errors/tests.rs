use super::*;

#[test]
fn test_get_existing_doc() {
    let doc = ErrorDocs::get(ErrorCode::E2001);
    assert!(doc.is_some());
    assert!(doc.unwrap().contains("Override Of Final Method"));
}

#[test]
fn test_get_internal_error_doc() {
    let doc = ErrorDocs::get(ErrorCode::E9001).unwrap();
    assert!(doc.contains("Internal Compiler Error"));
}

#[test]
fn test_every_code_is_documented() {
    for code in ErrorCode::ALL {
        assert!(ErrorDocs::has_docs(*code), "{code} has no documentation");
    }
}

#[test]
fn test_doc_titles_match_codes() {
    for code in ErrorDocs::all_codes() {
        let doc = ErrorDocs::get(code).unwrap();
        assert!(
            doc.starts_with(&format!("# {}:", code.as_str())),
            "{code} documentation starts with the wrong heading"
        );
    }
}
