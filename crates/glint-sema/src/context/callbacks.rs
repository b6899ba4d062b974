//! Host notification hooks and preprocessor relays.

use indexmap::IndexMap;

use glint_core::{ProfileMask, SourceLoc, Stage};

use crate::diagnostics::{DiagnosticKind, Origin, Severity};

use super::ParseContext;

type VersionHook = Box<dyn FnMut(u32, u32, &str)>;
type ExtensionHook = Box<dyn FnMut(u32, &str, &str)>;
type LineHook = Box<dyn FnMut(u32, u32, bool, u32, Option<&str>)>;
type PragmaHook = Box<dyn FnMut(u32, &[String])>;
type ErrorHook = Box<dyn FnMut(u32, &str)>;

/// Optional closures the host registers to observe directives.
///
/// An absent hook is a silent no-op.
#[derive(Default)]
pub struct Callbacks {
    version: Option<VersionHook>,
    extension: Option<ExtensionHook>,
    line: Option<LineHook>,
    pragma: Option<PragmaHook>,
    error: Option<ErrorHook>,
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("version", &self.version.is_some())
            .field("extension", &self.extension.is_some())
            .field("line", &self.line.is_some())
            .field("pragma", &self.pragma.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(line, version, profile)` for `#version`.
    pub fn on_version(mut self, hook: impl FnMut(u32, u32, &str) + 'static) -> Self {
        self.version = Some(Box::new(hook));
        self
    }

    /// `(line, name, behavior)` for `#extension`.
    pub fn on_extension(mut self, hook: impl FnMut(u32, &str, &str) + 'static) -> Self {
        self.extension = Some(Box::new(hook));
        self
    }

    /// `(current_line, new_line, has_source, source_number, source_name)` for `#line`.
    pub fn on_line(
        mut self,
        hook: impl FnMut(u32, u32, bool, u32, Option<&str>) + 'static,
    ) -> Self {
        self.line = Some(Box::new(hook));
        self
    }

    /// `(line, tokens)` for `#pragma`.
    pub fn on_pragma(mut self, hook: impl FnMut(u32, &[String]) + 'static) -> Self {
        self.pragma = Some(Box::new(hook));
        self
    }

    /// `(line, message)` for `#error`.
    pub fn on_error(mut self, hook: impl FnMut(u32, &str) + 'static) -> Self {
        self.error = Some(Box::new(hook));
        self
    }
}

/// State set by `#pragma` directives.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PragmaRecord {
    pub optimize: bool,
    pub debug: bool,
    /// `#pragma STDGL invariant(all)`.
    pub invariant_all: bool,
    /// Pragmas this front end does not interpret, by name.
    pub table: IndexMap<String, Vec<String>>,
}

impl Default for PragmaRecord {
    fn default() -> Self {
        Self {
            optimize: true,
            debug: false,
            invariant_all: false,
            table: IndexMap::new(),
        }
    }
}

impl ParseContext {
    pub fn notify_version(&mut self, line: u32, version: u32, profile: &str) {
        if let Some(hook) = &mut self.callbacks.version {
            hook(line, version, profile);
        }
    }

    pub fn notify_extension(&mut self, line: u32, name: &str, behavior: &str) {
        if let Some(hook) = &mut self.callbacks.extension {
            hook(line, name, behavior);
        }
    }

    pub fn notify_line_directive(
        &mut self,
        current_line: u32,
        new_line: u32,
        has_source: bool,
        source: u32,
        source_name: Option<&str>,
    ) {
        if let Some(hook) = &mut self.callbacks.line {
            hook(current_line, new_line, has_source, source, source_name);
        }
    }

    /// `#error`: relayed as a preprocessor error and to the host.
    pub fn notify_error_directive(&mut self, loc: SourceLoc, message: &str) {
        self.pp_error(loc, message, "#error", "");
        if let Some(hook) = &mut self.callbacks.error {
            hook(loc.line, message);
        }
    }

    /// Interpret a `#pragma` token list.
    pub fn handle_pragma(&mut self, loc: SourceLoc, tokens: &[String]) {
        if let Some(hook) = &mut self.callbacks.pragma {
            hook(loc.line, tokens);
        }
        let Some(name) = tokens.first() else {
            return;
        };
        let words: Vec<&str> = tokens.iter().map(String::as_str).collect();

        match words.as_slice() {
            ["optimize", "(", value, ")"] | ["debug", "(", value, ")"] => {
                let on = match *value {
                    "on" => true,
                    "off" => false,
                    _ => {
                        self.diagnostics
                            .report(DiagnosticKind::Pragma, loc)
                            .message("expected \"on\" or \"off\"")
                            .token("#pragma")
                            .extra(name.as_str())
                            .emit();
                        return;
                    }
                };
                if name == "optimize" {
                    self.pragma.optimize = on;
                } else {
                    self.pragma.debug = on;
                }
            }
            ["optimize" | "debug", ..] => {
                self.diagnostics
                    .report(DiagnosticKind::Pragma, loc)
                    .message("expected \"(on)\" or \"(off)\"")
                    .token("#pragma")
                    .extra(name.as_str())
                    .emit();
            }
            ["STDGL", "invariant", "(", "all", ")"] => {
                let modern = if self.is_es() {
                    self.version >= 300
                } else {
                    self.version >= 420
                };
                if self.stage == Stage::Fragment && modern {
                    self.diagnostics
                        .report(DiagnosticKind::Pragma, loc)
                        .message("'invariant(all)' is not allowed in a fragment shader")
                        .token("#pragma")
                        .severity(Severity::Error)
                        .emit();
                    return;
                }
                self.pragma.invariant_all = true;
                self.ast.set_invariant_all();
                tracing::debug!("invariant(all)");
            }
            _ => {
                self.pragma
                    .table
                    .insert(name.clone(), tokens[1..].to_vec());
            }
        }
    }

    /// Macro names reserved to the implementation.
    pub fn reserved_pp_error_check(&mut self, loc: SourceLoc, name: &str, op: &str) {
        if name.starts_with("GL_") {
            self.pp_error(loc, "names beginning with \"GL_\" can't be (un)defined:", op, name);
        } else if name.contains("__") {
            if self.is_es() && self.version >= 300 {
                self.pp_error(
                    loc,
                    "names containing consecutive underscores are reserved, and an error if version >= 300:",
                    op,
                    name,
                );
            } else {
                self.pp_warn(
                    loc,
                    "names containing consecutive underscores are reserved:",
                    op,
                    name,
                );
            }
        }
    }

    /// A backslash-newline outside a comment needs ES 300 or desktop 420.
    ///
    /// Returns whether the continuation is accepted.
    pub fn line_continuation_check(&mut self, loc: SourceLoc, end_of_comment: bool) -> bool {
        const MESSAGE: &str = "line continuation";
        let supported = if self.is_es() {
            self.version >= 300
        } else {
            self.version >= 420
        };
        if end_of_comment {
            if !supported {
                self.pp_warn(
                    loc,
                    "used at end of comment; the following line is still part of the comment",
                    MESSAGE,
                    "",
                );
            }
            return true;
        }
        if supported {
            return true;
        }
        if self.is_es() {
            self.pp_error(loc, "not supported for this version", MESSAGE, "");
            false
        } else {
            self.diagnostics
                .report(DiagnosticKind::Portability, loc)
                .message("not portable before version 420")
                .token(MESSAGE)
                .origin(Origin::Preprocessor)
                .emit();
            true
        }
    }

    /// Whether `#line N` names the next line (ES 300, desktop 330) rather
    /// than the current one.
    pub fn line_directive_should_set_next_line(&self) -> bool {
        if self.is_es() {
            self.version >= 300
        } else {
            self.version >= 330
        }
    }

    /// Deprecated storage keywords relayed by the grammar, e.g. `attribute`.
    pub fn deprecated_keyword_check(&mut self, loc: SourceLoc, keyword: &str) {
        match keyword {
            "attribute" | "varying" => {
                self.require_not_removed(loc, ProfileMask::ES, 300, keyword);
                self.check_deprecated(loc, ProfileMask::CORE, 130, keyword);
                self.require_not_removed(loc, ProfileMask::CORE, 420, keyword);
            }
            _ => {}
        }
    }
}
