use super::*;

use pretty_assertions::assert_eq;

#[test]
fn emits_lines_and_indentation() {
    let mut emitter = StringEmitter::default();
    emitter.emit_line("void");
    emitter.emit("f(void) {");
    emitter.emit_newline();
    emitter.emit_indent(4);
    emitter.emit_line("return;");
    emitter.emit("}");
    assert_eq!(emitter.output(), "void\nf(void) {\n    return;\n}");
}

#[test]
fn trailing_newline_is_added_once() {
    let mut emitter = StringEmitter::with_capacity(16);
    emitter.emit("int x;");
    emitter.ensure_trailing_newline();
    emitter.ensure_trailing_newline();
    assert_eq!(emitter.output(), "int x;\n");
}

#[test]
fn empty_output_stays_empty() {
    let mut emitter = StringEmitter::default();
    emitter.ensure_trailing_newline();
    assert_eq!(emitter.output(), "");
}
