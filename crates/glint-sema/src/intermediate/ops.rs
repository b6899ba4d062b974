//! Operators carried by AST nodes.

/// Constructor flavors; the node's type gives the exact target.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ConstructOp {
    Scalar,
    Vector,
    Matrix,
    Struct,
    Array,
    /// Texture combined with a sampler, e.g. `sampler2D(t, s)`.
    TextureSampler,
}

/// Built-in functions that map to a dedicated operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BuiltInOp {
    Radians,
    Degrees,
    Sin,
    Cos,
    Tan,
    Pow,
    Exp,
    Log,
    Sqrt,
    Abs,
    Sign,
    Floor,
    Fract,
    Min,
    Max,
    Clamp,
    Mix,
    Step,
    Length,
    Distance,
    Dot,
    Cross,
    Normalize,
    Reflect,
    Texture,
    TextureOffset,
    TextureGather,
    TextureGatherOffset,
    TexelFetch,
    ImageLoad,
    ImageStore,
    AtomicCounterIncrement,
    Dfdx,
    Dfdy,
    Fwidth,
    InterpolateAtCentroid,
    InterpolateAtSample,
    InterpolateAtOffset,
    EmitVertex,
    EndPrimitive,
    EmitStreamVertex,
    EndStreamPrimitive,
    Barrier,
    MemoryBarrier,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Op {
    Null,
    Sequence,
    Linkage,
    FunctionDefinition,
    Parameters,
    FunctionCall,

    Negative,
    LogicalNot,
    BitwiseNot,
    PostIncrement,
    PostDecrement,
    PreIncrement,
    PreDecrement,
    /// Type conversion; the node type is the target.
    Convert,

    Add,
    Sub,
    Mul,
    Div,
    Mod,
    RightShift,
    LeftShift,
    And,
    InclusiveOr,
    ExclusiveOr,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    VectorTimesScalar,
    VectorTimesMatrix,
    MatrixTimesVector,
    MatrixTimesScalar,
    MatrixTimesMatrix,
    LogicalOr,
    LogicalXor,
    LogicalAnd,

    IndexDirect,
    IndexIndirect,
    IndexDirectStruct,
    VectorSwizzle,

    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    InclusiveOrAssign,
    ExclusiveOrAssign,
    LeftShiftAssign,
    RightShiftAssign,

    Comma,
    ArrayLength,
    Construct(ConstructOp),
    BuiltIn(BuiltInOp),
}

impl Op {
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Op::Assign
                | Op::AddAssign
                | Op::SubAssign
                | Op::MulAssign
                | Op::DivAssign
                | Op::ModAssign
                | Op::AndAssign
                | Op::InclusiveOrAssign
                | Op::ExclusiveOrAssign
                | Op::LeftShiftAssign
                | Op::RightShiftAssign
        )
    }

    /// Operators that write their operand.
    pub fn modifies_operand(self) -> bool {
        self.is_assignment()
            || matches!(
                self,
                Op::PostIncrement | Op::PostDecrement | Op::PreIncrement | Op::PreDecrement
            )
    }

    /// The binary operator behind a compound assignment.
    pub fn assignment_base(self) -> Option<Op> {
        Some(match self {
            Op::AddAssign => Op::Add,
            Op::SubAssign => Op::Sub,
            Op::MulAssign => Op::Mul,
            Op::DivAssign => Op::Div,
            Op::ModAssign => Op::Mod,
            Op::AndAssign => Op::And,
            Op::InclusiveOrAssign => Op::InclusiveOr,
            Op::ExclusiveOrAssign => Op::ExclusiveOr,
            Op::LeftShiftAssign => Op::LeftShift,
            Op::RightShiftAssign => Op::RightShift,
            _ => return None,
        })
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Op::LessThan | Op::GreaterThan | Op::LessThanEqual | Op::GreaterThanEqual
        )
    }

    pub fn is_constructor(self) -> bool {
        matches!(self, Op::Construct(_))
    }

    /// Source spelling, used in diagnostics.
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Negative | Op::Sub => "-",
            Op::LogicalNot => "!",
            Op::BitwiseNot => "~",
            Op::PostIncrement | Op::PreIncrement => "++",
            Op::PostDecrement | Op::PreDecrement => "--",
            Op::Add => "+",
            Op::Mul
            | Op::VectorTimesScalar
            | Op::VectorTimesMatrix
            | Op::MatrixTimesVector
            | Op::MatrixTimesScalar
            | Op::MatrixTimesMatrix => "*",
            Op::Div => "/",
            Op::Mod => "%",
            Op::RightShift => ">>",
            Op::LeftShift => "<<",
            Op::And => "&",
            Op::InclusiveOr => "|",
            Op::ExclusiveOr => "^",
            Op::Equal => "==",
            Op::NotEqual => "!=",
            Op::LessThan => "<",
            Op::GreaterThan => ">",
            Op::LessThanEqual => "<=",
            Op::GreaterThanEqual => ">=",
            Op::LogicalOr => "||",
            Op::LogicalXor => "^^",
            Op::LogicalAnd => "&&",
            Op::IndexDirect | Op::IndexIndirect => "[]",
            Op::IndexDirectStruct | Op::VectorSwizzle => ".",
            Op::Assign => "=",
            Op::AddAssign => "+=",
            Op::SubAssign => "-=",
            Op::MulAssign => "*=",
            Op::DivAssign => "/=",
            Op::ModAssign => "%=",
            Op::AndAssign => "&=",
            Op::InclusiveOrAssign => "|=",
            Op::ExclusiveOrAssign => "^=",
            Op::LeftShiftAssign => "<<=",
            Op::RightShiftAssign => ">>=",
            Op::Comma => ",",
            Op::ArrayLength => "length",
            _ => "",
        }
    }
}
