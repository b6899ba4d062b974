//! Typed AST nodes.

use glint_core::SourceLoc;

use crate::symbols::SymbolId;
use crate::types::{Storage, Type};

use super::constant::ConstValue;
use super::ops::Op;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BranchOp {
    Kill,
    Return,
    Break,
    Continue,
    Case,
    Default,
}

#[derive(Clone, PartialEq, Debug)]
pub enum NodeKind {
    /// Reference to a declared variable.
    Variable { id: SymbolId, name: String },
    /// Flattened scalar components.
    Constant(Vec<ConstValue>),
    Unary {
        op: Op,
        operand: Box<Node>,
    },
    Binary {
        op: Op,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Operator with any number of children: sequences, calls, constructors.
    Aggregate {
        op: Op,
        /// Function name for calls and definitions, empty otherwise.
        name: String,
        children: Vec<Node>,
    },
    Selection {
        condition: Box<Node>,
        then_branch: Option<Box<Node>>,
        else_branch: Option<Box<Node>>,
    },
    Loop {
        condition: Option<Box<Node>>,
        body: Option<Box<Node>>,
        terminal: Option<Box<Node>>,
        test_first: bool,
    },
    Branch {
        op: BranchOp,
        value: Option<Box<Node>>,
    },
    Switch {
        condition: Box<Node>,
        body: Box<Node>,
    },
    /// Placeholder standing in for an expression that failed to check.
    Error,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub ty: Type,
    pub loc: SourceLoc,
}

impl Node {
    pub fn new(kind: NodeKind, ty: Type, loc: SourceLoc) -> Self {
        Self { kind, ty, loc }
    }

    /// Best-effort placeholder so checking can continue after an error.
    pub fn error(ty: Type, loc: SourceLoc) -> Self {
        Self::new(NodeKind::Error, ty, loc)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NodeKind::Error)
    }

    pub fn constant_values(&self) -> Option<&[ConstValue]> {
        match &self.kind {
            NodeKind::Constant(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.kind, NodeKind::Constant(_))
    }

    /// Integer value of a scalar integer constant.
    pub fn const_int(&self) -> Option<i64> {
        match self.constant_values()? {
            [ConstValue::Int(v)] => Some(*v as i64),
            [ConstValue::Uint(v)] => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<(SymbolId, &str)> {
        match &self.kind {
            NodeKind::Variable { id, name } => Some((*id, name)),
            _ => None,
        }
    }

    pub fn op(&self) -> Option<Op> {
        match &self.kind {
            NodeKind::Unary { op, .. }
            | NodeKind::Binary { op, .. }
            | NodeKind::Aggregate { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Aggregate { children, .. } => children,
            _ => &[],
        }
    }

    /// The variable an l-value expression ultimately refers to.
    pub fn base_variable(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::Variable { .. } => Some(self),
            NodeKind::Binary {
                op: Op::IndexDirect | Op::IndexIndirect | Op::IndexDirectStruct | Op::VectorSwizzle,
                left,
                ..
            } => left.base_variable(),
            _ => None,
        }
    }

    pub fn storage(&self) -> Storage {
        self.ty.qualifier.storage
    }

    /// Pre-order visit of this node and all descendants.
    pub fn walk(&self, f: &mut impl FnMut(&Node)) {
        f(self);
        match &self.kind {
            NodeKind::Unary { operand, .. } => operand.walk(f),
            NodeKind::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            NodeKind::Aggregate { children, .. } => {
                for child in children {
                    child.walk(f);
                }
            }
            NodeKind::Selection {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.walk(f);
                for branch in [then_branch, else_branch].into_iter().flatten() {
                    branch.walk(f);
                }
            }
            NodeKind::Loop {
                condition,
                body,
                terminal,
                ..
            } => {
                for part in [condition, body, terminal].into_iter().flatten() {
                    part.walk(f);
                }
            }
            NodeKind::Branch { value, .. } => {
                if let Some(value) = value {
                    value.walk(f);
                }
            }
            NodeKind::Switch { condition, body } => {
                condition.walk(f);
                body.walk(f);
            }
            NodeKind::Variable { .. } | NodeKind::Constant(_) | NodeKind::Error => {}
        }
    }
}
