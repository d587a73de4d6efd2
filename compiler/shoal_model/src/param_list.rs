use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};
use smallvec::SmallVec;

use crate::Variable;

/// One parameter with its optional default-value expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub var: Variable,
    pub default: Option<String>,
}

/// Ordered parameters of a function or method.
///
/// Invariant: once a parameter has a default, every later one has one too.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParamList {
    params: SmallVec<[Param; 4]>,
}

impl ParamList {
    pub fn new() -> Self {
        ParamList::default()
    }

    /// Append a parameter, rejecting a required one after an optional one.
    pub fn push(&mut self, var: Variable, default: Option<String>) -> DiagResult<()> {
        let after_optional = self.params.last().is_some_and(|p| p.default.is_some());
        if after_optional && default.is_none() {
            return Err(Diagnostic::error(ErrorCode::E1006)
                .with_message(format!(
                    "Required parameter '{}' follows an optional parameter",
                    var.name()
                ))
                .with_label(var.name(), "needs a default value")
                .with_suggestion("move required parameters before optional ones"));
        }
        self.params.push(Param { var, default });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.params.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    pub fn first(&self) -> Option<&Param> {
        self.params.first()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.params.iter().map(|p| &p.var)
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Param> {
        self.params.iter_mut()
    }

    /// Number of leading parameters a caller must supply.
    pub fn min_required(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |i| i + 1)
    }

    /// C parameter list: `neato_Dog* self, int32_t count`, or `void`.
    pub fn to_c(&self) -> String {
        if self.params.is_empty() {
            return "void".to_string();
        }
        self.params
            .iter()
            .map(|p| p.var.local_c())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Argument names: `self, count`.
    pub fn name_list(&self) -> String {
        self.params
            .iter()
            .map(|p| p.var.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'a> IntoIterator for &'a ParamList {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use crate::{Exposure, Prefix, Primitive, Type};
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> Variable {
        Variable::new(
            &Prefix::from_nickname("Neato"),
            Exposure::Local,
            None,
            name,
            Type::primitive(Primitive::I32),
            false,
        )
        .unwrap()
    }

    #[test]
    fn c_rendering() {
        let mut list = ParamList::new();
        assert_eq!(list.to_c(), "void");
        list.push(var("a"), None).unwrap();
        list.push(var("b"), Some("2".into())).unwrap();
        assert_eq!(list.to_c(), "int32_t a, int32_t b");
        assert_eq!(list.name_list(), "a, b");
        assert_eq!(list.min_required(), 1);
    }

    #[test]
    fn required_after_optional_is_rejected() {
        let mut list = ParamList::new();
        list.push(var("a"), Some("1".into())).unwrap();
        let err = list.push(var("b"), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::E1006);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn all_optional_needs_nothing() {
        let mut list = ParamList::new();
        list.push(var("a"), Some("0".into())).unwrap();
        list.push(var("b"), Some("0".into())).unwrap();
        assert_eq!(list.min_required(), 0);
    }
}
