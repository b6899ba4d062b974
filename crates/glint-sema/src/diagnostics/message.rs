use glint_core::SourceLoc;

/// Diagnostic kinds ordered by the taxonomy of problems the checker reports.
///
/// Kinds group messages for policy decisions (suppression, escalation);
/// the specific reason is always carried by the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
pub enum DiagnosticKind {
    // Relayed from the grammar driver or an unrecoverable state
    Syntax,
    Fatal,

    // Names
    Redefinition,
    Undeclared,
    ReservedName,

    // Types
    TypeMismatch,
    InvalidOperand,
    NotLValue,
    NotConstant,
    Constructor,
    Overload,
    AmbiguousCall,

    // Storage, qualifiers, layout
    Storage,
    Qualifier,
    Layout,
    Precision,

    // Arrays
    ArraySize,
    IoArraySize,
    IndexOutOfRange,

    // Statements
    ControlFlow,
    Return,

    // Limits and gating
    ResourceLimit,
    VersionGate,
    ExtensionGate,

    // Usually warnings
    Deprecated,
    Extension,
    Pragma,
    Portability,

    // Preprocessor relay
    Preprocessor,
}

impl DiagnosticKind {
    /// Default severity for this kind. Can be overridden by policy or at the call site.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::Deprecated | Self::Extension | Self::Pragma | Self::Portability => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }

    /// Base message for this diagnostic kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::Syntax => "syntax error",
            Self::Fatal => "compilation terminated",
            Self::Redefinition => "redefinition",
            Self::Undeclared => "undeclared identifier",
            Self::ReservedName => "reserved built-in name",
            Self::TypeMismatch => "type mismatch",
            Self::InvalidOperand => "wrong operand types",
            Self::NotLValue => "l-value required",
            Self::NotConstant => "constant expression required",
            Self::Constructor => "invalid constructor",
            Self::Overload => "no matching overloaded function found",
            Self::AmbiguousCall => "ambiguous function signature match",
            Self::Storage => "invalid storage qualifier",
            Self::Qualifier => "invalid qualifier",
            Self::Layout => "invalid layout qualifier",
            Self::Precision => "invalid precision qualifier",
            Self::ArraySize => "invalid array size",
            Self::IoArraySize => "inconsistent input/output array size",
            Self::IndexOutOfRange => "index out of range",
            Self::ControlFlow => "invalid control flow",
            Self::Return => "invalid return",
            Self::ResourceLimit => "resource limit exceeded",
            Self::VersionGate => "not supported for this version or profile",
            Self::ExtensionGate => "required extension not enabled",
            Self::Deprecated => "deprecated",
            Self::Extension => "extension",
            Self::Pragma => "pragma",
            Self::Portability => "not portable",
            Self::Preprocessor => "preprocessor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// Which layer produced the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    #[default]
    Semantic,
    Preprocessor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) severity: Severity,
    pub(crate) origin: Origin,
    pub(crate) loc: SourceLoc,
    /// The offending token, quoted in rendered output.
    pub(crate) token: String,
    pub(crate) message: String,
    /// Free-form detail appended after the reason.
    pub(crate) extra: String,
}

impl DiagnosticMessage {
    pub(crate) fn new(kind: DiagnosticKind, loc: SourceLoc) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            origin: Origin::Semantic,
            loc,
            token: String::new(),
            message: kind.fallback_message().to_string(),
            extra: String::new(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn loc(&self) -> SourceLoc {
        self.loc
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn extra(&self) -> &str {
        &self.extra
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    /// Reason text with the extra detail appended, without location prefix.
    pub fn text(&self) -> String {
        let mut out = String::new();
        if !self.token.is_empty() {
            out.push('\'');
            out.push_str(&self.token);
            out.push_str("' : ");
        }
        out.push_str(&self.message);
        if !self.extra.is_empty() {
            out.push(' ');
            out.push_str(&self.extra);
        }
        out
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.severity, self.loc, self.text())
    }
}
