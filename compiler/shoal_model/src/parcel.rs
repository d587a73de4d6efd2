//! Parcels: the namespaces that give generated identifiers their prefix.

use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};

use crate::Version;

/// The three spellings of a parcel's symbol prefix.
///
/// For the nickname `Neato` these are `neato_`, `Neato_` and `NEATO_`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Prefix {
    lower: String,
    title: String,
    upper: String,
}

impl Prefix {
    /// Derive all three spellings from a parcel nickname.
    pub fn from_nickname(nickname: &str) -> Self {
        Prefix {
            lower: format!("{}_", nickname.to_ascii_lowercase()),
            title: format!("{nickname}_"),
            upper: format!("{}_", nickname.to_ascii_uppercase()),
        }
    }

    /// Lower-case prefix used for types and functions (`neato_`).
    pub fn lower(&self) -> &str {
        &self.lower
    }

    /// Title-case prefix used for method invocation symbols (`Neato_`).
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Upper-case prefix used for macros and class variables (`NEATO_`).
    pub fn upper(&self) -> &str {
        &self.upper
    }
}

/// A namespace grouping classes under one symbol prefix.
///
/// Parcels are immutable once registered with a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parcel {
    name: String,
    nickname: String,
    version: Version,
    prefix: Prefix,
    is_included: bool,
}

impl Parcel {
    /// Create a parcel. The nickname defaults to the name.
    ///
    /// `is_included` marks parcels whose classes take part in resolution but
    /// get no generated artifacts of their own.
    pub fn new(
        name: &str,
        nickname: Option<&str>,
        version: Option<Version>,
        is_included: bool,
    ) -> DiagResult<Self> {
        validate_parcel_word(name, "name")?;
        let nickname = nickname.unwrap_or(name);
        validate_parcel_word(nickname, "nickname")?;

        Ok(Parcel {
            name: name.to_string(),
            nickname: nickname.to_string(),
            version: version.unwrap_or_default(),
            prefix: Prefix::from_nickname(nickname),
            is_included,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    pub fn is_included(&self) -> bool {
        self.is_included
    }

    /// Macro which, when defined, exposes this parcel's private symbols.
    pub fn privacy_sym(&self) -> String {
        format!("SHOAL_PARCEL_{}", self.nickname.to_ascii_uppercase())
    }
}

fn validate_parcel_word(word: &str, what: &str) -> DiagResult<()> {
    if word.is_empty() || !word.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(Diagnostic::error(ErrorCode::E1005)
            .with_message(format!("Invalid parcel {what}: '{word}'"))
            .with_label(word, "parcel names and nicknames must be alphabetic"));
    }
    Ok(())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn derives_prefixes_from_nickname() {
        let parcel = Parcel::new("Crustacean", Some("Crust"), None, false).unwrap();
        assert_eq!(parcel.prefix().lower(), "crust_");
        assert_eq!(parcel.prefix().title(), "Crust_");
        assert_eq!(parcel.prefix().upper(), "CRUST_");
        assert_eq!(parcel.privacy_sym(), "SHOAL_PARCEL_CRUST");
    }

    #[test]
    fn nickname_defaults_to_name() {
        let parcel = Parcel::new("Neato", None, None, true).unwrap();
        assert_eq!(parcel.nickname(), "Neato");
        assert!(parcel.is_included());
        assert_eq!(parcel.version().as_str(), "v0");
    }

    #[test]
    fn rejects_non_alphabetic_names() {
        for (name, nick) in [("Neato2", None), ("", None), ("Neato", Some("Ne_at"))] {
            let err = Parcel::new(name, nick, None, false).unwrap_err();
            assert_eq!(err.code, ErrorCode::E1005);
        }
    }
}
