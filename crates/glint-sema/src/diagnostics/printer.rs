//! Builder-pattern printer for rendering diagnostics.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

use super::Diagnostics;
use super::message::Severity;

/// Builder for rendering diagnostics with various options.
///
/// Without sources every message renders on one line in the conventional
/// `ERROR: 0:12: 'x' : redefinition` shape. With sources, messages whose
/// string index has a source are rendered with the offending line annotated.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    sources: &'s [&'s str],
    path: Option<&'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            sources: &[],
            path: None,
            colored: false,
        }
    }

    pub fn sources(mut self, sources: &'s [&'s str]) -> Self {
        self.sources = sources;
        self
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        if self.sources.is_empty() {
            return self.format_plain(w);
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }

            let source = self.sources.get(diag.loc.string as usize).copied();
            let Some(range) = source.and_then(|s| line_range(s, diag.loc.line)) else {
                write!(w, "{}", diag)?;
                continue;
            };
            let source = source.unwrap_or_default();

            let text = diag.text();
            let mut snippet = Snippet::source(source)
                .line_start(1)
                .annotation(AnnotationKind::Primary.span(range).label(&text));
            if let Some(p) = self.path {
                snippet = snippet.path(p);
            }

            let level = severity_to_level(diag.severity);
            let report: Vec<Group> = vec![level.primary_title(&text).element(snippet)];
            write!(w, "{}", renderer.render(&report))?;
        }

        Ok(())
    }

    fn format_plain(&self, w: &mut impl Write) -> std::fmt::Result {
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", diag)?;
        }
        Ok(())
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

/// Byte range of the non-blank part of a 1-based line.
fn line_range(source: &str, line: u32) -> Option<std::ops::Range<usize>> {
    let index = (line as usize).checked_sub(1)?;
    let mut start = 0;
    for (i, text) in source.split('\n').enumerate() {
        if i == index {
            let trimmed = text.trim_end();
            let lead = trimmed.len() - trimmed.trim_start().len();
            let begin = start + lead;
            let end = (start + trimmed.len()).max(begin + 1).min(source.len().max(1));
            return Some(begin..end);
        }
        start += text.len() + 1;
    }
    None
}

impl Diagnostics {
    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }

    pub fn render(&self) -> String {
        self.printer().render()
    }
}
