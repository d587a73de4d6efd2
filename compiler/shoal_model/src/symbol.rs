//! Exposure, naming scope and identifier validation shared by variables,
//! functions and methods.

use serde::Deserialize;

use crate::{ClassName, Prefix};

/// Visibility of a symbol outside its declaring scope.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    Public,
    #[default]
    Parcel,
    Private,
    Local,
}

impl Exposure {
    pub fn is_public(self) -> bool {
        self == Exposure::Public
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Exposure::Public => "public",
            Exposure::Parcel => "parcel",
            Exposure::Private => "private",
            Exposure::Local => "local",
        }
    }
}

/// Naming scope of a declared symbol.
///
/// The full symbol is the parcel prefix, the owning class's nickname and the
/// symbol's own name: `neato_Dog_bark_count`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    exposure: Exposure,
    name: String,
    class: Option<ClassName>,
    prefix: Prefix,
}

impl Symbol {
    pub(crate) fn new(
        prefix: &Prefix,
        exposure: Exposure,
        class: Option<&ClassName>,
        name: &str,
    ) -> Self {
        Symbol {
            exposure,
            name: name.to_string(),
            class: class.cloned(),
            prefix: prefix.clone(),
        }
    }

    pub fn exposure(&self) -> Exposure {
        self.exposure
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> Option<&ClassName> {
        self.class.as_ref()
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// `Dog_bark_count`, or just the name for symbols outside any class.
    pub fn short_sym(&self) -> String {
        match &self.class {
            Some(class) => format!("{}_{}", class.nickname(), self.name),
            None => self.name.clone(),
        }
    }

    /// `neato_Dog_bark_count`.
    pub fn full_sym(&self) -> String {
        format!("{}{}", self.prefix.lower(), self.short_sym())
    }
}

/// Check a dispatch name: it must start with an uppercase letter, every
/// `_`-separated segment must also start with an uppercase letter, and only
/// ASCII letters and digits may appear otherwise.
pub fn validate_dispatch_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('_').all(|segment| {
            segment.starts_with(|c: char| c.is_ascii_uppercase())
                && segment.bytes().all(|b| b.is_ascii_alphanumeric())
        })
}

/// A single class name component: `Foo`, `FooJr`, `Obj2`.
pub fn is_class_component(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_uppercase())
        && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// A lowercase identifier used for variables, parameters and functions.
pub fn is_lower_identifier(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_lowercase() || c == '_')
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
