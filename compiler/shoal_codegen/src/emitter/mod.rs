//! Text output for the C renderer.

/// Where rendered C text goes.
pub trait Emitter {
    fn emit(&mut self, text: &str);

    /// `\n`, regardless of platform.
    fn emit_newline(&mut self);

    fn emit_indent(&mut self, spaces: usize);

    fn emit_line(&mut self, text: &str) {
        self.emit(text);
        self.emit_newline();
    }
}

/// Collects rendered text in memory.
#[derive(Debug, Default)]
pub struct StringEmitter {
    buffer: String,
}

impl StringEmitter {
    pub fn with_capacity(capacity: usize) -> Self {
        StringEmitter {
            buffer: String::with_capacity(capacity),
        }
    }

    /// Terminate a non-empty file with exactly one newline.
    pub fn ensure_trailing_newline(&mut self) {
        if !self.buffer.is_empty() && !self.buffer.ends_with('\n') {
            self.buffer.push('\n');
        }
    }

    pub fn output(self) -> String {
        self.buffer
    }
}

impl Emitter for StringEmitter {
    fn emit(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn emit_newline(&mut self) {
        self.buffer.push('\n');
    }

    fn emit_indent(&mut self, spaces: usize) {
        self.buffer.extend(std::iter::repeat(' ').take(spaces));
    }
}

#[cfg(test)]
mod tests;
