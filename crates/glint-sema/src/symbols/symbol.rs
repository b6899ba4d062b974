use glint_core::SourceLoc;

use crate::intermediate::{BuiltInOp, ConstValue};
use crate::types::Type;

/// Index of a symbol in a compilation's symbol space.
///
/// Built-in symbols occupy the first ids; user symbols follow.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a symbol came to live in the table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SymbolOrigin {
    /// Lives in the shared built-in table.
    BuiltIn,
    /// A built-in copied into the user global level before mutation.
    CopiedUp,
    /// Declared (or redeclared) by user source.
    Declared,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Variable {
    pub ty: Type,
    /// Folded value of a `const` variable with a constant initializer.
    pub const_value: Option<Vec<ConstValue>>,
    /// The name denotes a struct type rather than an object.
    pub user_type: bool,
    /// Writes through this name are rejected.
    pub read_only: bool,
}

impl Variable {
    pub fn new(ty: Type) -> Self {
        Self {
            ty,
            const_value: None,
            user_type: false,
            read_only: false,
        }
    }

    pub fn constant(ty: Type, values: Vec<ConstValue>) -> Self {
        Self {
            const_value: Some(values),
            ..Self::new(ty)
        }
    }

    pub fn user_type(ty: Type) -> Self {
        Self {
            user_type: true,
            ..Self::new(ty)
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Param {
    pub name: Option<String>,
    pub ty: Type,
    pub loc: SourceLoc,
}

impl Param {
    pub fn new(name: Option<&str>, ty: Type, loc: SourceLoc) -> Self {
        Self {
            name: name.map(str::to_string),
            ty,
            loc,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Function {
    pub return_type: Type,
    pub params: Vec<Param>,
    /// Name plus parameter types, e.g. `dot(vec3,vec3)`.
    pub mangled: String,
    pub defined: bool,
    pub prototyped: bool,
    /// Operator a built-in call maps to, if any.
    pub op: Option<BuiltInOp>,
}

impl Function {
    pub fn new(name: &str, return_type: Type, params: Vec<Param>) -> Self {
        let mangled = mangle(name, params.iter().map(|p| &p.ty));
        Self {
            return_type,
            params,
            mangled,
            defined: false,
            prototyped: false,
            op: None,
        }
    }

    pub fn with_op(mut self, op: BuiltInOp) -> Self {
        self.op = Some(op);
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}

/// Signature key shared by declarations and call sites: name and parameter types.
pub fn mangle<'a>(name: &str, params: impl IntoIterator<Item = &'a Type>) -> String {
    let params: Vec<String> = params.into_iter().map(Type::name).collect();
    format!("{name}({})", params.join(","))
}

#[derive(Clone, PartialEq, Debug)]
pub enum SymbolKind {
    Variable(Variable),
    Function(Function),
    /// Member of an anonymous block, visible at global scope by its own name.
    Member { block: SymbolId, index: usize },
}

#[derive(Clone, PartialEq, Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub loc: SourceLoc,
    pub kind: SymbolKind,
    pub origin: SymbolOrigin,
}

impl Symbol {
    pub fn is_built_in(&self) -> bool {
        self.origin != SymbolOrigin::Declared
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match &self.kind {
            SymbolKind::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut Variable> {
        match &mut self.kind {
            SymbolKind::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.kind {
            SymbolKind::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut Function> {
        match &mut self.kind {
            SymbolKind::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<(SymbolId, usize)> {
        match self.kind {
            SymbolKind::Member { block, index } => Some((block, index)),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function(_))
    }
}
