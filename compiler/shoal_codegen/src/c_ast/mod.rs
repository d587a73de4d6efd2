//! A small typed AST for the C artifacts the generators emit.
//!
//! Generators build [`Item`] trees; [`render`] turns them into text. The
//! renderer is the only place that decides spacing, indentation and line
//! breaks, so identical trees always produce identical bytes.

use crate::emitter::{Emitter, StringEmitter};

/// Indentation of statements and initializer fields.
const INDENT: usize = 4;

/// Indentation of preprocessor lines per nested `#ifdef`.
const PP_INDENT: usize = 2;

/// Storage class and linkage qualifiers in front of a declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    Plain,
    Static,
    StaticConst,
    StaticInline,
    /// Exported from the parcel's shared library: `NEATO_VISIBLE`.
    Exported(String),
}

impl Storage {
    /// `Exported` for the parcel whose upper-case prefix is `prefix_upper`.
    pub fn exported(prefix_upper: &str) -> Self {
        Storage::Exported(format!("{prefix_upper}VISIBLE"))
    }

    fn render(&self) -> String {
        match self {
            Storage::Plain => String::new(),
            Storage::Static => "static ".to_string(),
            Storage::StaticConst => "static const ".to_string(),
            Storage::StaticInline => "static SHOAL_INLINE ".to_string(),
            Storage::Exported(visible) => format!("{visible} "),
        }
    }
}

/// A function signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub storage: Storage,
    pub ret: String,
    pub name: String,
    /// Already joined parameter list: `neato_Dog* self, int32_t n`.
    pub params: String,
}

impl Signature {
    pub fn new(
        storage: Storage,
        ret: impl Into<String>,
        name: impl Into<String>,
        params: impl Into<String>,
    ) -> Self {
        Signature {
            storage,
            ret: ret.into(),
            name: name.into(),
            params: params.into(),
        }
    }
}

/// A statement inside a function body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// `expr;`
    Expr(String),
    /// `ty name = init;`
    Decl {
        ty: String,
        name: String,
        init: Option<String>,
    },
    /// `return expr;` or `return;`
    Return(Option<String>),
    If {
        cond: String,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    /// A line emitted as-is at the current indentation.
    Line(String),
}

impl Stmt {
    pub fn expr(expr: impl Into<String>) -> Self {
        Stmt::Expr(expr.into())
    }

    pub fn decl(ty: impl Into<String>, name: impl Into<String>, init: impl Into<String>) -> Self {
        Stmt::Decl {
            ty: ty.into(),
            name: name.into(),
            init: Some(init.into()),
        }
    }

    pub fn ret(expr: impl Into<String>) -> Self {
        Stmt::Return(Some(expr.into()))
    }
}

/// A value in an aggregate initializer, optionally followed by a comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Init {
    Expr(String),
    Fields(Vec<Field>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub value: Init,
    pub comment: Option<String>,
}

impl Field {
    pub fn new(value: impl Into<String>, comment: &str) -> Self {
        Field {
            value: Init::Expr(value.into()),
            comment: Some(comment.to_string()),
        }
    }
}

/// A top-level item of a C file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    /// `/* ... */`, one line per input line.
    Comment(String),
    /// `/** ... */` documentation block.
    DocComment(String),
    Blank,
    /// `#include "path"`, or `#include <path>` when `system`.
    Include { path: String, system: bool },
    /// `#define name body`, or a function-like macro with continuation
    /// lines when `params` is set.
    Define {
        name: String,
        params: Option<String>,
        body: Vec<String>,
    },
    /// `#ifdef symbol ... #endif /* symbol */`
    IfDef { symbol: String, items: Vec<Item> },
    /// `#if cond ... #else ... #endif`; the `#else` branch is omitted when
    /// `otherwise` is empty.
    If {
        cond: String,
        then: Vec<Item>,
        otherwise: Vec<Item>,
    },
    /// Include guard: `#ifndef symbol`, `#define symbol 1`, ..., `#endif`.
    Guard { symbol: String, items: Vec<Item> },
    /// Wraps items in `extern "C"` for C++ consumers.
    ExternC(Vec<Item>),
    /// `extern [storage]decl;`
    Extern { storage: Storage, decl: String },
    /// `[storage]ty name[ = init];`
    Var {
        storage: Storage,
        ty: String,
        name: String,
        init: Option<String>,
    },
    /// `typedef target alias;`
    Typedef { target: String, alias: String },
    /// `typedef ret\n(*name)(params);`
    FnPtrTypedef {
        ret: String,
        name: String,
        params: String,
    },
    /// `struct name {\n    field;\n};`
    Struct { name: String, fields: Vec<String> },
    /// A function declaration.
    Prototype(Signature),
    /// A function definition.
    Function { sig: Signature, body: Vec<Stmt> },
    /// A body headed by arbitrary text, for macro-declared functions such
    /// as `XS(name) { ... }`.
    Block { head: String, body: Vec<Stmt> },
    /// `[storage]ty name[] = { ... };`
    Array {
        storage: Storage,
        ty: String,
        name: String,
        elements: Vec<Init>,
    },
    /// Text emitted unchanged, e.g. user-supplied code.
    Verbatim(String),
}

impl Item {
    pub fn comment(text: impl Into<String>) -> Self {
        Item::Comment(text.into())
    }

    pub fn include(path: impl Into<String>) -> Self {
        Item::Include {
            path: path.into(),
            system: false,
        }
    }

    pub fn system_include(path: impl Into<String>) -> Self {
        Item::Include {
            path: path.into(),
            system: true,
        }
    }

    /// Object-like macro: `#define name value`.
    pub fn define(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Item::Define {
            name: name.into(),
            params: None,
            body: if value.is_empty() { Vec::new() } else { vec![value] },
        }
    }

    pub fn extern_decl(storage: Storage, decl: impl Into<String>) -> Self {
        Item::Extern {
            storage,
            decl: decl.into(),
        }
    }

    pub fn var(storage: Storage, ty: impl Into<String>, name: impl Into<String>) -> Self {
        Item::Var {
            storage,
            ty: ty.into(),
            name: name.into(),
            init: None,
        }
    }
}

/// Render items to C source text.
pub fn render(items: &[Item]) -> String {
    let mut emitter = StringEmitter::with_capacity(4096);
    let mut renderer = Renderer {
        out: &mut emitter,
        pp_depth: 0,
    };
    for item in items {
        renderer.item(item);
    }
    emitter.ensure_trailing_newline();
    emitter.output()
}

struct Renderer<'a, E: Emitter> {
    out: &'a mut E,
    pp_depth: usize,
}

impl<E: Emitter> Renderer<'_, E> {
    fn item(&mut self, item: &Item) {
        match item {
            Item::Comment(text) => self.comment("/*", text),
            Item::DocComment(text) => self.comment("/**", text),
            Item::Blank => self.out.emit_newline(),
            Item::Include { path, system } => {
                self.pp_line(&if *system {
                    format!("#include <{path}>")
                } else {
                    format!("#include \"{path}\"")
                });
            }
            Item::Define { name, params, body } => self.define(name, params.as_deref(), body),
            Item::IfDef { symbol, items } => {
                self.pp_line(&format!("#ifdef {symbol}"));
                self.nested(items);
                self.pp_line(&format!("#endif /* {symbol} */"));
            }
            Item::If {
                cond,
                then,
                otherwise,
            } => {
                self.pp_line(&format!("#if {cond}"));
                self.nested(then);
                if !otherwise.is_empty() {
                    self.pp_line("#else");
                    self.nested(otherwise);
                }
                self.pp_line("#endif");
            }
            Item::Guard { symbol, items } => {
                self.out.emit_line(&format!("#ifndef {symbol}"));
                self.out.emit_line(&format!("#define {symbol} 1"));
                self.out.emit_newline();
                for inner in items {
                    self.item(inner);
                }
                self.out.emit_newline();
                self.out.emit_line(&format!("#endif /* {symbol} */"));
            }
            Item::ExternC(items) => {
                self.out.emit_line("#ifdef __cplusplus");
                self.out.emit_line("extern \"C\" {");
                self.out.emit_line("#endif");
                self.out.emit_newline();
                for inner in items {
                    self.item(inner);
                }
                self.out.emit_newline();
                self.out.emit_line("#ifdef __cplusplus");
                self.out.emit_line("}");
                self.out.emit_line("#endif");
            }
            Item::Extern { storage, decl } => {
                self.out
                    .emit_line(&format!("extern {}{decl};", storage.render()));
            }
            Item::Var {
                storage,
                ty,
                name,
                init,
            } => {
                let init = init.as_ref().map_or_else(String::new, |i| format!(" = {i}"));
                self.out
                    .emit_line(&format!("{}{ty} {name}{init};", storage.render()));
            }
            Item::Typedef { target, alias } => {
                self.out.emit_line(&format!("typedef {target} {alias};"));
            }
            Item::FnPtrTypedef { ret, name, params } => {
                self.out.emit_line(&format!("typedef {ret}"));
                self.out.emit_line(&format!("(*{name})({params});"));
            }
            Item::Struct { name, fields } => {
                self.out.emit_line(&format!("struct {name} {{"));
                for field in fields {
                    self.out.emit_indent(INDENT);
                    self.out.emit_line(field);
                }
                self.out.emit_line("};");
            }
            Item::Prototype(sig) => {
                self.signature(sig);
                self.out.emit_line(";");
            }
            Item::Function { sig, body } => {
                self.signature(sig);
                self.out.emit_line(" {");
                self.stmts(body, 1);
                self.out.emit_line("}");
            }
            Item::Block { head, body } => {
                self.out.emit_line(&format!("{head} {{"));
                self.stmts(body, 1);
                self.out.emit_line("}");
            }
            Item::Array {
                storage,
                ty,
                name,
                elements,
            } => {
                self.out
                    .emit_line(&format!("{}{ty} {name}[] = {{", storage.render()));
                self.inits(elements, 1);
                self.out.emit_line("};");
            }
            Item::Verbatim(text) => {
                self.out.emit(text);
                if !text.is_empty() && !text.ends_with('\n') {
                    self.out.emit_newline();
                }
            }
        }
    }

    fn nested(&mut self, items: &[Item]) {
        self.pp_depth += 1;
        for inner in items {
            self.item(inner);
        }
        self.pp_depth -= 1;
    }

    fn comment(&mut self, open: &str, text: &str) {
        let mut lines = text.lines();
        let first = lines.next().unwrap_or("");
        if first.is_empty() {
            self.out.emit_line(open);
        } else {
            self.out.emit_line(&format!("{open} {first}"));
        }
        for line in lines {
            if line.is_empty() {
                self.out.emit_line(" *");
            } else {
                self.out.emit_line(&format!(" * {line}"));
            }
        }
        self.out.emit_line(" */");
    }

    fn pp_line(&mut self, line: &str) {
        self.out.emit_indent(PP_INDENT * self.pp_depth);
        self.out.emit_line(line);
    }

    fn define(&mut self, name: &str, params: Option<&str>, body: &[String]) {
        match params {
            None => match body {
                [] => self.pp_line(&format!("#define {name}")),
                [value] => self.pp_line(&format!("#define {name} {value}")),
                lines => {
                    self.pp_line(&format!("#define {name} \\"));
                    self.continuation(lines);
                }
            },
            Some(params) => {
                self.pp_line(&format!("#define {name}({params}) \\"));
                self.continuation(body);
            }
        }
    }

    fn continuation(&mut self, lines: &[String]) {
        let last = lines.len().saturating_sub(1);
        for (i, line) in lines.iter().enumerate() {
            self.out.emit_indent(INDENT);
            self.out.emit(line);
            if i != last {
                self.out.emit(" \\");
            }
            self.out.emit_newline();
        }
    }

    fn signature(&mut self, sig: &Signature) {
        self.out
            .emit_line(&format!("{}{}", sig.storage.render(), sig.ret));
        self.out.emit(&format!("{}({})", sig.name, sig.params));
    }

    fn stmts(&mut self, stmts: &[Stmt], depth: usize) {
        for stmt in stmts {
            self.out.emit_indent(INDENT * depth);
            match stmt {
                Stmt::Expr(expr) => self.out.emit_line(&format!("{expr};")),
                Stmt::Decl { ty, name, init } => {
                    let init = init.as_ref().map_or_else(String::new, |i| format!(" = {i}"));
                    self.out.emit_line(&format!("{ty} {name}{init};"));
                }
                Stmt::Return(Some(expr)) => self.out.emit_line(&format!("return {expr};")),
                Stmt::Return(None) => self.out.emit_line("return;"),
                Stmt::If {
                    cond,
                    then,
                    otherwise,
                } => {
                    self.out.emit_line(&format!("if ({cond}) {{"));
                    self.stmts(then, depth + 1);
                    self.out.emit_indent(INDENT * depth);
                    self.out.emit_line("}");
                    if !otherwise.is_empty() {
                        self.out.emit_indent(INDENT * depth);
                        self.out.emit_line("else {");
                        self.stmts(otherwise, depth + 1);
                        self.out.emit_indent(INDENT * depth);
                        self.out.emit_line("}");
                    }
                }
                Stmt::Line(line) => self.out.emit_line(line),
            }
        }
    }

    fn inits(&mut self, inits: &[Init], depth: usize) {
        let last = inits.len().saturating_sub(1);
        for (i, init) in inits.iter().enumerate() {
            self.init(init, None, depth, i != last);
        }
    }

    fn init(&mut self, init: &Init, comment: Option<&str>, depth: usize, comma: bool) {
        let comma = if comma { "," } else { "" };
        let comment = comment.map_or_else(String::new, |c| format!(" /* {c} */"));
        self.out.emit_indent(INDENT * depth);
        match init {
            Init::Expr(expr) => self.out.emit_line(&format!("{expr}{comma}{comment}")),
            Init::Fields(fields) => {
                self.out.emit_line("{");
                let last = fields.len().saturating_sub(1);
                for (i, field) in fields.iter().enumerate() {
                    self.init(&field.value, field.comment.as_deref(), depth + 1, i != last);
                }
                self.out.emit_indent(INDENT * depth);
                self.out.emit_line(&format!("}}{comma}{comment}"));
            }
        }
    }
}

#[cfg(test)]
mod tests;
