//! Value shapes: primitives with a bit width, object references with
//! nullability and ownership annotations, composites and opaque C types.
//!
//! Types are immutable values. The only mutation is prefix resolution of
//! object types, performed once by the session during `build()`.

use std::fmt;

use bitflags::bitflags;
use serde::Deserialize;
use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};

use crate::symbol::is_class_component;

/// Reference-count contract of an object value crossing a call boundary.
///
/// - `Incremented`: the callee hands the caller a reference it must release
///   (return values) or the caller hands over a new reference (arguments).
/// - `Decremented`: the callee consumes a reference the caller held.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ownership {
    #[default]
    None,
    Incremented,
    Decremented,
}

bitflags! {
    /// Qualifiers applying to any type.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// `const` qualified.
        const CONST = 1 << 0;
        /// Object value may be NULL.
        const NULLABLE = 1 << 1;
    }
}

/// Broad category of a primitive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Int,
    UInt,
    Float,
    Bool,
    Char,
    Size,
}

/// A primitive C type of fixed width.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Char,
    /// Pointer-sized unsigned integer; width is platform dependent.
    SizeT,
}

impl Primitive {
    /// Build a primitive from a kind and a width in bits.
    ///
    /// `SizeT` takes width 0 (platform dependent).
    pub fn new(kind: PrimitiveKind, width: u8) -> DiagResult<Self> {
        let prim = match (kind, width) {
            (PrimitiveKind::Int, 8) => Primitive::I8,
            (PrimitiveKind::Int, 16) => Primitive::I16,
            (PrimitiveKind::Int, 32) => Primitive::I32,
            (PrimitiveKind::Int, 64) => Primitive::I64,
            (PrimitiveKind::UInt, 8) => Primitive::U8,
            (PrimitiveKind::UInt, 16) => Primitive::U16,
            (PrimitiveKind::UInt, 32) => Primitive::U32,
            (PrimitiveKind::UInt, 64) => Primitive::U64,
            (PrimitiveKind::Float, 32) => Primitive::F32,
            (PrimitiveKind::Float, 64) => Primitive::F64,
            (PrimitiveKind::Bool, 8) => Primitive::Bool,
            (PrimitiveKind::Char, 8) => Primitive::Char,
            (PrimitiveKind::Size, 0) => Primitive::SizeT,
            _ => {
                return Err(Diagnostic::error(ErrorCode::E1011)
                    .with_message(format!("Unsupported width {width} for {kind:?} primitive"))
                    .with_label(format!("{kind:?}{width}"), "no such primitive type"));
            }
        };
        Ok(prim)
    }

    /// Look up a primitive by its C spelling (`int32_t`, `double`, ...).
    pub fn from_c(name: &str) -> Option<Self> {
        let prim = match name {
            "int8_t" => Primitive::I8,
            "int16_t" => Primitive::I16,
            "int32_t" => Primitive::I32,
            "int64_t" => Primitive::I64,
            "uint8_t" => Primitive::U8,
            "uint16_t" => Primitive::U16,
            "uint32_t" => Primitive::U32,
            "uint64_t" => Primitive::U64,
            "float" => Primitive::F32,
            "double" => Primitive::F64,
            "bool" => Primitive::Bool,
            "char" => Primitive::Char,
            "size_t" => Primitive::SizeT,
            _ => return None,
        };
        Some(prim)
    }

    pub fn c_name(self) -> &'static str {
        match self {
            Primitive::I8 => "int8_t",
            Primitive::I16 => "int16_t",
            Primitive::I32 => "int32_t",
            Primitive::I64 => "int64_t",
            Primitive::U8 => "uint8_t",
            Primitive::U16 => "uint16_t",
            Primitive::U32 => "uint32_t",
            Primitive::U64 => "uint64_t",
            Primitive::F32 => "float",
            Primitive::F64 => "double",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::SizeT => "size_t",
        }
    }

    pub fn kind(self) -> PrimitiveKind {
        match self {
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64 => PrimitiveKind::Int,
            Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 => {
                PrimitiveKind::UInt
            }
            Primitive::F32 | Primitive::F64 => PrimitiveKind::Float,
            Primitive::Bool => PrimitiveKind::Bool,
            Primitive::Char => PrimitiveKind::Char,
            Primitive::SizeT => PrimitiveKind::Size,
        }
    }

    /// Width in bits; 0 for `size_t`.
    pub fn width(self) -> u8 {
        match self {
            Primitive::I8 | Primitive::U8 | Primitive::Bool | Primitive::Char => 8,
            Primitive::I16 | Primitive::U16 => 16,
            Primitive::I32 | Primitive::U32 | Primitive::F32 => 32,
            Primitive::I64 | Primitive::U64 | Primitive::F64 => 64,
            Primitive::SizeT => 0,
        }
    }

    /// Integral types, including `bool`, `char` and `size_t`.
    pub fn is_integer(self) -> bool {
        !self.is_floating()
    }

    pub fn is_floating(self) -> bool {
        self.kind() == PrimitiveKind::Float
    }
}

/// A reference to an instance of a class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectType {
    specifier: String,
    prefix: Option<String>,
    ownership: Ownership,
}

impl ObjectType {
    /// Parse a class specifier, optionally carrying a parcel prefix:
    /// `Animal` or `neato_Animal`.
    ///
    /// Unprefixed specifiers get their prefix from the session at build time.
    pub fn parse(spec: &str) -> DiagResult<Self> {
        let (prefix, specifier) = match spec.find('_') {
            Some(idx) if spec.starts_with(|c: char| c.is_ascii_lowercase()) => {
                (Some(&spec[..=idx]), &spec[idx + 1..])
            }
            _ => (None, spec),
        };

        let prefix_ok = prefix.map_or(true, |p| {
            p.bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        });
        if !prefix_ok || !is_class_component(specifier) {
            return Err(Diagnostic::error(ErrorCode::E1004)
                .with_message(format!("Invalid object type specifier: '{spec}'"))
                .with_label(spec, "expected a class name, optionally prefixed like `neato_Foo`"));
        }

        Ok(ObjectType {
            specifier: specifier.to_string(),
            prefix: prefix.map(str::to_string),
            ownership: Ownership::None,
        })
    }

    /// Struct symbol of the referenced class, without prefix.
    pub fn specifier(&self) -> &str {
        &self.specifier
    }

    /// Parcel prefix, once declared or resolved.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Prefixed struct symbol, e.g. `neato_Animal`.
    pub fn full_struct_sym(&self) -> String {
        format!("{}{}", self.prefix.as_deref().unwrap_or(""), self.specifier)
    }

    /// Name of the class singleton variable, e.g. `NEATO_ANIMAL`.
    pub fn class_var(&self) -> String {
        self.full_struct_sym().to_ascii_uppercase()
    }

    pub(crate) fn set_prefix(&mut self, prefix: &str) {
        self.prefix = Some(prefix.to_string());
    }
}

/// A pointer and/or array over another type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeType {
    element: Box<Type>,
    indirection: u8,
    array: Option<String>,
}

impl CompositeType {
    pub fn element(&self) -> &Type {
        &self.element
    }

    /// Number of `*` after the element type.
    pub fn indirection(&self) -> u8 {
        self.indirection
    }

    /// Array postfix such as `[]` or `[16]`, emitted after the variable name.
    pub fn array(&self) -> Option<&str> {
        self.array.as_deref()
    }
}

/// The shape of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Primitive(Primitive),
    Object(ObjectType),
    Composite(CompositeType),
    /// An opaque C type the compiler passes through untouched (`FILE`).
    Arbitrary(String),
}

/// A type plus its qualifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Type {
    kind: TypeKind,
    flags: TypeFlags,
}

impl Type {
    pub fn void() -> Self {
        Type::from_kind(TypeKind::Void)
    }

    pub fn primitive(prim: Primitive) -> Self {
        Type::from_kind(TypeKind::Primitive(prim))
    }

    pub fn object(object: ObjectType) -> Self {
        Type::from_kind(TypeKind::Object(object))
    }

    /// Parse an object specifier and wrap it as a type.
    pub fn object_named(spec: &str) -> DiagResult<Self> {
        ObjectType::parse(spec).map(Type::object)
    }

    pub fn composite(element: Type, indirection: u8, array: Option<String>) -> Self {
        Type::from_kind(TypeKind::Composite(CompositeType {
            element: Box::new(element),
            indirection,
            array,
        }))
    }

    pub fn arbitrary(name: impl Into<String>) -> Self {
        Type::from_kind(TypeKind::Arbitrary(name.into()))
    }

    fn from_kind(kind: TypeKind) -> Self {
        Type {
            kind,
            flags: TypeFlags::empty(),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn nullable(self) -> Self {
        self.with_flags(TypeFlags::NULLABLE)
    }

    #[must_use]
    pub fn constant(self) -> Self {
        self.with_flags(TypeFlags::CONST)
    }

    /// Attach an ownership annotation. Only object types carry one.
    #[must_use]
    pub fn with_ownership(mut self, ownership: Ownership) -> Self {
        if let TypeKind::Object(object) = &mut self.kind {
            object.ownership = ownership;
        }
        self
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeKind::Object(_))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    pub fn is_integer(&self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_integer)
    }

    pub fn is_floating(&self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_floating)
    }

    pub fn is_nullable(&self) -> bool {
        self.flags.contains(TypeFlags::NULLABLE)
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(TypeFlags::CONST)
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self.kind {
            TypeKind::Primitive(prim) => Some(prim),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match &self.kind {
            TypeKind::Object(object) => Some(object),
            _ => None,
        }
    }

    pub(crate) fn as_object_mut(&mut self) -> Option<&mut ObjectType> {
        match &mut self.kind {
            TypeKind::Object(object) => Some(object),
            TypeKind::Composite(composite) => composite.element.as_object_mut(),
            _ => None,
        }
    }

    /// Ownership annotation; `None` for non-object types.
    pub fn ownership(&self) -> Ownership {
        self.as_object().map_or(Ownership::None, ObjectType::ownership)
    }

    pub fn is_incremented(&self) -> bool {
        self.ownership() == Ownership::Incremented
    }

    pub fn is_decremented(&self) -> bool {
        self.ownership() == Ownership::Decremented
    }

    /// Array postfix for variable declarations.
    pub fn array_postfix(&self) -> &str {
        match &self.kind {
            TypeKind::Composite(composite) => composite.array().unwrap_or(""),
            _ => "",
        }
    }

    /// C spelling of the type, without any array postfix.
    pub fn to_c(&self) -> String {
        let base = match &self.kind {
            TypeKind::Void => "void".to_string(),
            TypeKind::Primitive(prim) => prim.c_name().to_string(),
            TypeKind::Object(object) => format!("{}*", object.full_struct_sym()),
            TypeKind::Composite(composite) => format!(
                "{}{}",
                composite.element.to_c(),
                "*".repeat(usize::from(composite.indirection))
            ),
            TypeKind::Arbitrary(name) => name.clone(),
        };
        if self.is_const() {
            format!("const {base}")
        } else {
            base
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_c())
    }
}
