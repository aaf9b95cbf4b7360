//! Indented line writer for generated source.

const INDENT: &str = "    ";

/// Accumulates generated source one line at a time.
#[derive(Debug, Default)]
pub struct CodeWriter {
    out: String,
    depth: usize,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Writes `header {` and indents until the matching [`CodeWriter::close`].
    pub fn open(&mut self, header: impl AsRef<str>) {
        let header = header.as_ref();
        if header.is_empty() {
            self.line("{");
        } else {
            self.line(format!("{header} {{"));
        }
        self.depth += 1;
    }

    pub fn close(&mut self) {
        self.close_with("}");
    }

    /// Dedents and writes `text`, for closers like `})` or `};`.
    pub fn close_with(&mut self, text: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nests_blocks() {
        let mut w = CodeWriter::new();
        w.open("impl A");
        w.open("fn f()");
        w.line("g();");
        w.close();
        w.blank();
        w.close();
        assert_eq!(w.finish(), "impl A {\n    fn f() {\n        g();\n    }\n\n}\n");
    }
}
