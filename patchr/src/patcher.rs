//! Line dispatch loop
//!
//! A [`Patcher`] scans its input once, top to bottom. Every line is checked
//! for a directive token; lines without one are copied through, lines with
//! one are handed to the directive's visitor, which may consume further lines.
//! Output lines always end with a single `\n`.
//!
//! Lines are handled as bytes. Only directive lines and template block bodies
//! must be UTF-8; everything else is copied through byte for byte.

use std::borrow::Cow;
use std::io::{BufRead, Write};

use serde_json::Value;
use tracing::{debug, info};

use crate::directive::{Directive, DirectiveMatch, Lexicon};
use crate::error::PatchError;
use crate::resolver::InputResolver;
use crate::template::TemplateEngine;

/// Applies comment directives for one comment prefix
#[derive(Debug)]
pub struct Patcher {
    /// Comment prefix followed by a space, stripped from template block lines
    comment_marker: String,
    lexicon: Lexicon,
    engine: TemplateEngine,
}

/// Line source that remembers the current 1-based line number
struct LineReader<R> {
    src: R,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(src: R) -> Self {
        Self { src, line_no: 0 }
    }

    /// Next line with its `\n` or `\r\n` terminator removed
    fn next_line(&mut self) -> Result<Option<Vec<u8>>, PatchError> {
        let mut buf = Vec::new();
        if self.src.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        Ok(Some(buf))
    }
}

/// Text used for token matching; tokens are ASCII so lossy decoding is enough
fn scan_text(line: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(line)
}

fn decode(line: &[u8], line_no: usize) -> Result<&str, PatchError> {
    std::str::from_utf8(line).map_err(|_| PatchError::InvalidUtf8 { line: line_no })
}

fn push_line(out: &mut Vec<u8>, line: &[u8]) {
    out.extend_from_slice(line);
    out.push(b'\n');
}

impl Patcher {
    pub fn new(comment_prefix: &str, resolver: InputResolver) -> Self {
        debug!(%comment_prefix, "Patcher::new: called");
        Self {
            comment_marker: format!("{} ", comment_prefix),
            lexicon: Lexicon::new(comment_prefix),
            engine: TemplateEngine::new(resolver),
        }
    }

    /// Token table used to recognize directives
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Patch `src` into `dst`
    ///
    /// The output is buffered and written to `dst` only once the whole stream
    /// has been processed; on error nothing is written.
    pub fn apply<W: Write, R: BufRead>(&self, mut dst: W, src: R, data: &Value) -> Result<(), PatchError> {
        let mut reader = LineReader::new(src);
        let mut out = Vec::new();
        let mut applied = 0usize;

        while let Some(bytes) = reader.next_line()? {
            match self.lexicon.find(&scan_text(&bytes)) {
                Some(m) => {
                    let line = decode(&bytes, reader.line_no)?;
                    self.visit(m, line, &mut reader, &mut out, data)?;
                    applied += 1;
                }
                None => push_line(&mut out, &bytes),
            }
        }

        dst.write_all(&out)?;
        dst.flush()?;
        info!(lines = reader.line_no, directives = applied, "Patch applied");
        Ok(())
    }

    /// Patch an in-memory buffer
    pub fn apply_to_bytes(&self, src: &[u8], data: &Value) -> Result<Vec<u8>, PatchError> {
        let mut out = Vec::new();
        self.apply(&mut out, src, data)?;
        Ok(out)
    }

    /// Convenience wrapper returning the patched text
    pub fn apply_to_string(&self, src: &str, data: &Value) -> Result<String, PatchError> {
        let out = self.apply_to_bytes(src.as_bytes(), data)?;
        String::from_utf8(out).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }

    fn visit<R: BufRead>(
        &self,
        m: DirectiveMatch,
        line: &str,
        reader: &mut LineReader<R>,
        out: &mut Vec<u8>,
        data: &Value,
    ) -> Result<(), PatchError> {
        let line_no = reader.line_no;
        debug!(directive = %m.directive, line = line_no, "Patcher::visit: matched");
        match m.directive {
            Directive::Replace => {
                Self::consume_next(reader, m.directive, line_no)?;
                let rendered = self.engine.render(m.content(line), data, line_no)?;
                push_line(out, format!("{}{}", m.indent(line), rendered).as_bytes());
                Ok(())
            }
            Directive::Add => {
                let rendered = self.engine.render(m.content(line), data, line_no)?;
                push_line(out, format!("{}{}", m.indent(line), rendered).as_bytes());
                Ok(())
            }
            Directive::Remove => Self::consume_next(reader, m.directive, line_no),
            Directive::TemplateStart => self.visit_template(m.indent(line), reader, out, data, line_no),
            Directive::SkipStart => self.visit_skip(reader, line_no),
            Directive::TemplateEnd | Directive::SkipEnd => Err(PatchError::UnexpectedEndDirective {
                directive: m.directive,
                line: line_no,
            }),
        }
    }

    /// Drop the line following a Replace or Remove directive
    fn consume_next<R: BufRead>(
        reader: &mut LineReader<R>,
        directive: Directive,
        line_no: usize,
    ) -> Result<(), PatchError> {
        match reader.next_line()? {
            Some(dropped) => {
                debug!(line = reader.line_no, dropped = %scan_text(&dropped), "Patcher::consume_next: dropped line");
                Ok(())
            }
            None => Err(PatchError::UnexpectedEof {
                directive,
                line: line_no,
            }),
        }
    }

    fn visit_template<R: BufRead>(
        &self,
        indent: &str,
        reader: &mut LineReader<R>,
        out: &mut Vec<u8>,
        data: &Value,
        start_line: usize,
    ) -> Result<(), PatchError> {
        let mut body: Vec<String> = Vec::new();
        loop {
            let Some(line) = reader.next_line()? else {
                return Err(PatchError::UnterminatedBlock {
                    directive: Directive::TemplateStart,
                    line: start_line,
                });
            };
            if self.lexicon.contains(&scan_text(&line), Directive::TemplateEnd) {
                break;
            }
            body.push(self.strip_marker(indent, decode(&line, reader.line_no)?));
        }

        debug!(start_line, lines = body.len(), "Patcher::visit_template: rendering block");
        let rendered = self.engine.render(&body.join("\n"), data, start_line)?;
        for line in rendered.lines() {
            push_line(out, line.as_bytes());
        }
        Ok(())
    }

    /// Strip the comment marker from a template block line, keeping the indent
    ///
    /// `<indent><prefix> ` is tried first, then a bare `<prefix> `; either way
    /// the block's indent is put back in front. Other lines are returned
    /// unmodified.
    fn strip_marker(&self, indent: &str, line: &str) -> String {
        let marker = self.comment_marker.as_str();
        line.strip_prefix(indent)
            .and_then(|rest| rest.strip_prefix(marker))
            .or_else(|| line.strip_prefix(marker))
            .map(|body| format!("{}{}", indent, body))
            .unwrap_or_else(|| line.to_string())
    }

    fn visit_skip<R: BufRead>(&self, reader: &mut LineReader<R>, start_line: usize) -> Result<(), PatchError> {
        while let Some(line) = reader.next_line()? {
            if self.lexicon.contains(&scan_text(&line), Directive::SkipEnd) {
                debug!(start_line, end_line = reader.line_no, "Patcher::visit_skip: skipped block");
                return Ok(());
            }
        }
        Err(PatchError::UnterminatedBlock {
            directive: Directive::SkipStart,
            line: start_line,
        })
    }
}
