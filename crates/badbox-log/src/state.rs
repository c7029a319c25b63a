use crate::resolver::Resolver;

/// What a single [`ParseState::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Consumed ordinary text or a line break.
    Skipped,
    /// A `(` opened the named file.
    Entered(String),
    /// A `)` closed the current file.
    Exited,
    /// A `(` that does not open a file.
    StrayOpen,
    /// A `)` matching an earlier stray `(`.
    StrayClose,
}

/// Cursor over a transcript plus the stack of files the engine has open.
///
/// `stray_paren_depth` counts unmatched `(` that did not open a file inside
/// the current file context, so that their `)` does not close the file.
#[derive(Debug, Clone)]
pub struct ParseState<'a> {
    text: &'a str,
    pos: usize,
    current_file: Option<String>,
    file_stack: Vec<Option<String>>,
    stray_paren_depth: usize,
}

impl<'a> ParseState<'a> {
    /// Starts at the beginning of `text` with `root` as the open file.
    pub fn new(text: &'a str, root: Option<String>) -> Self {
        Self {
            text,
            pos: 0,
            current_file: root,
            file_stack: Vec::new(),
            stray_paren_depth: 0,
        }
    }

    /// Unread part of the transcript.
    pub fn remaining(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.text.len()
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn file_stack(&self) -> &[Option<String>] {
        &self.file_stack
    }

    pub fn stray_paren_depth(&self) -> usize {
        self.stray_paren_depth
    }

    pub fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Moves past `len` bytes of matched text.
    pub fn advance(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.text.len());
    }

    /// Byte offset of the cursor within its physical line.
    fn column(&self) -> usize {
        let line_start = self.text[..self.pos].rfind('\n').map_or(0, |i| i + 1);
        self.pos - line_start
    }

    /// Consumes text up to the next structural character and applies it to
    /// the file stack. Always consumes at least one byte unless at the end.
    pub fn step(&mut self, resolver: &Resolver<'_>) -> Step {
        let rest = self.remaining();
        let run = rest
            .find(|c: char| matches!(c, '\n' | '(' | ')'))
            .unwrap_or(rest.len());
        self.pos += run;

        match self.remaining().chars().next() {
            Some(')') => {
                self.pos += 1;
                if self.stray_paren_depth > 0 {
                    self.stray_paren_depth -= 1;
                    Step::StrayClose
                } else {
                    self.exit_file();
                    Step::Exited
                }
            }
            Some('(') => match resolver.resolve(self.remaining(), self.column()) {
                Some(found) => {
                    self.pos += found.len;
                    self.enter_file(found.path.clone());
                    Step::Entered(found.path)
                }
                None => {
                    self.pos += 1;
                    self.stray_paren_depth += 1;
                    Step::StrayOpen
                }
            },
            Some('\n') => {
                self.pos += 1;
                Step::Skipped
            }
            _ => Step::Skipped,
        }
    }

    fn enter_file(&mut self, path: String) {
        log::debug!("Entering {:?}", path);
        let parent = self.current_file.replace(path);
        self.file_stack.push(parent);
        self.stray_paren_depth = 0;
    }

    fn exit_file(&mut self) {
        self.current_file = self.file_stack.pop().flatten();
        log::debug!("Back in {:?}", self.current_file);
    }
}
