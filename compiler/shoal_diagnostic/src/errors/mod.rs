//! Long-form error explanations shown by `shoalc --explain`.
//!
//! One markdown file per code lives next to this module and is compiled
//! into the binary. A new code needs both the file and a `DOCS` entry.

use crate::ErrorCode;

pub struct ErrorDocs;

impl ErrorDocs {
    pub fn get(code: ErrorCode) -> Option<&'static str> {
        DOCS.iter()
            .find_map(|&(documented, text)| (documented == code).then_some(text))
    }

    /// Codes with an explanation, in table order.
    pub fn all_codes() -> impl Iterator<Item = ErrorCode> {
        DOCS.iter().map(|&(code, _)| code)
    }

    pub fn has_docs(code: ErrorCode) -> bool {
        Self::get(code).is_some()
    }
}

static DOCS: &[(ErrorCode, &str)] = &[
    // Model errors (E1xxx)
    (ErrorCode::E1001, include_str!("E1001.md")),
    (ErrorCode::E1002, include_str!("E1002.md")),
    (ErrorCode::E1003, include_str!("E1003.md")),
    (ErrorCode::E1004, include_str!("E1004.md")),
    (ErrorCode::E1005, include_str!("E1005.md")),
    (ErrorCode::E1006, include_str!("E1006.md")),
    (ErrorCode::E1007, include_str!("E1007.md")),
    (ErrorCode::E1008, include_str!("E1008.md")),
    (ErrorCode::E1009, include_str!("E1009.md")),
    (ErrorCode::E1010, include_str!("E1010.md")),
    (ErrorCode::E1011, include_str!("E1011.md")),
    (ErrorCode::E1012, include_str!("E1012.md")),
    // Hierarchy errors (E2xxx)
    (ErrorCode::E2001, include_str!("E2001.md")),
    (ErrorCode::E2002, include_str!("E2002.md")),
    (ErrorCode::E2003, include_str!("E2003.md")),
    (ErrorCode::E2004, include_str!("E2004.md")),
    (ErrorCode::E2005, include_str!("E2005.md")),
    (ErrorCode::E2006, include_str!("E2006.md")),
    (ErrorCode::E2007, include_str!("E2007.md")),
    (ErrorCode::E2008, include_str!("E2008.md")),
    (ErrorCode::E2009, include_str!("E2009.md")),
    (ErrorCode::E2010, include_str!("E2010.md")),
    // Generator errors (E3xxx)
    (ErrorCode::E3001, include_str!("E3001.md")),
    (ErrorCode::E3002, include_str!("E3002.md")),
    (ErrorCode::E3003, include_str!("E3003.md")),
    // Driver errors (E5xxx)
    (ErrorCode::E5001, include_str!("E5001.md")),
    (ErrorCode::E5002, include_str!("E5002.md")),
    (ErrorCode::E5003, include_str!("E5003.md")),
    (ErrorCode::E5004, include_str!("E5004.md")),
    // Internal errors (E9xxx)
    (ErrorCode::E9001, include_str!("E9001.md")),
];

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
