mod message;
mod policy;
mod printer;

#[cfg(test)]
mod tests;

use glint_core::SourceLoc;

pub use message::{DiagnosticKind, DiagnosticMessage, Origin, Severity};
pub use policy::MessagePolicy;
pub use printer::DiagnosticsPrinter;

/// Accumulated diagnostics of one compilation, in emission order.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
    policy: MessagePolicy,
    /// Errors reported, including ones the policy later hid from the list.
    had_error: bool,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MessagePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &MessagePolicy {
        &self.policy
    }

    /// Create a diagnostic with the given kind and location.
    ///
    /// Uses the kind's default message and severity. Call `.message()` or
    /// `.warning()` on the builder to override.
    pub fn report(&mut self, kind: DiagnosticKind, loc: SourceLoc) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::new(kind, loc),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[DiagnosticMessage] {
        &self.messages
    }

    /// Whether any error was reported, whether or not it is listed.
    pub fn has_errors(&self) -> bool {
        self.had_error
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.is_warning())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_warning()).count()
    }

    /// Messages of one kind, mostly for tests and tooling.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter().filter(move |d| d.kind == kind)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.had_error |= other.had_error;
        self.messages.extend(other.messages);
    }

    fn push(&mut self, mut message: DiagnosticMessage) {
        let Some(severity) = self.policy.apply(message.kind, message.severity) else {
            return;
        };
        message.severity = severity;
        if message.is_error() {
            self.had_error = true;
        }
        tracing::trace!(loc = %message.loc, kind = ?message.kind, "{}", message.text());
        self.messages.push(message);
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Replace the kind's fallback reason.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        self.message.message = msg.into();
        self
    }

    /// The token the reason refers to.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.message.token = token.into();
        self
    }

    /// Additional detail appended after the reason.
    pub fn extra(mut self, extra: impl Into<String>) -> Self {
        self.message.extra = extra.into();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.message.severity = severity;
        self
    }

    pub fn warning(self) -> Self {
        self.severity(Severity::Warning)
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.message.origin = origin;
        self
    }

    pub fn emit(self) {
        self.diagnostics.push(self.message);
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticMessage;
    type IntoIter = std::vec::IntoIter<DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticMessage;
    type IntoIter = std::slice::Iter<'a, DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
