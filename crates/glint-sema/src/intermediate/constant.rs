//! Compile-time constant values and folding.

use crate::types::{BasicType, Type};

use super::ops::Op;

/// One scalar component of a constant.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ConstValue {
    Int(i32),
    Uint(u32),
    Float(f64),
    Double(f64),
    Bool(bool),
}

impl ConstValue {
    pub fn basic(self) -> BasicType {
        match self {
            ConstValue::Int(_) => BasicType::Int,
            ConstValue::Uint(_) => BasicType::Uint,
            ConstValue::Float(_) => BasicType::Float,
            ConstValue::Double(_) => BasicType::Double,
            ConstValue::Bool(_) => BasicType::Bool,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            ConstValue::Int(v) => v as f64,
            ConstValue::Uint(v) => v as f64,
            ConstValue::Float(v) | ConstValue::Double(v) => v,
            ConstValue::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            ConstValue::Int(v) => v as i64,
            ConstValue::Uint(v) => v as i64,
            ConstValue::Float(v) | ConstValue::Double(v) => v as i64,
            ConstValue::Bool(v) => v as i64,
        }
    }

    pub fn as_bool(self) -> bool {
        match self {
            ConstValue::Bool(v) => v,
            other => other.as_f64() != 0.0,
        }
    }

    /// Convert to another basic type with constructor semantics.
    pub fn convert(self, to: BasicType) -> ConstValue {
        match to {
            BasicType::Int => ConstValue::Int(self.as_i64() as i32),
            BasicType::Uint => ConstValue::Uint(self.as_i64() as u32),
            BasicType::Float => ConstValue::Float(self.as_f64() as f32 as f64),
            BasicType::Double => ConstValue::Double(self.as_f64()),
            BasicType::Bool => ConstValue::Bool(self.as_bool()),
            _ => self,
        }
    }
}

impl std::fmt::Display for ConstValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Uint(v) => write!(f, "{v}u"),
            ConstValue::Float(v) | ConstValue::Double(v) => write!(f, "{v:?}"),
            ConstValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Fold a component-wise binary operation. Scalars broadcast against vectors.
///
/// Integer division or remainder by zero folds to zero; the caller reports it.
/// Returns `None` for operations that are not folded here (matrix products
/// go through [`fold_matrix_product`]) so the caller keeps the runtime node.
pub fn fold_binary(op: Op, left: &[ConstValue], right: &[ConstValue]) -> Option<Vec<ConstValue>> {
    use ConstValue::*;

    if matches!(op, Op::Equal | Op::NotEqual) {
        let equal = left.len() == right.len() && left.iter().zip(right).all(|(a, b)| a == b);
        return Some(vec![Bool(equal == (op == Op::Equal))]);
    }

    let len = left.len().max(right.len());
    let pick = |values: &[ConstValue], i: usize| {
        if values.len() == 1 { values[0] } else { values[i] }
    };
    if (left.len() != 1 && left.len() != len) || (right.len() != 1 && right.len() != len) {
        return None;
    }

    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let (a, b) = (pick(left, i), pick(right, i));
        let value = match (a, b) {
            (Int(x), Int(y)) => match op {
                Op::Add => Int(x.wrapping_add(y)),
                Op::Sub => Int(x.wrapping_sub(y)),
                Op::Mul | Op::VectorTimesScalar | Op::MatrixTimesScalar => Int(x.wrapping_mul(y)),
                Op::Div | Op::Mod if y == 0 => Int(0),
                Op::Div => Int(x.wrapping_div(y)),
                Op::Mod => Int(x.wrapping_rem(y)),
                Op::And => Int(x & y),
                Op::InclusiveOr => Int(x | y),
                Op::ExclusiveOr => Int(x ^ y),
                Op::LeftShift => Int(x.wrapping_shl(y as u32)),
                Op::RightShift => Int(x.wrapping_shr(y as u32)),
                Op::LessThan => Bool(x < y),
                Op::GreaterThan => Bool(x > y),
                Op::LessThanEqual => Bool(x <= y),
                Op::GreaterThanEqual => Bool(x >= y),
                _ => return None,
            },
            (Uint(x), Uint(y)) => match op {
                Op::Add => Uint(x.wrapping_add(y)),
                Op::Sub => Uint(x.wrapping_sub(y)),
                Op::Mul | Op::VectorTimesScalar | Op::MatrixTimesScalar => Uint(x.wrapping_mul(y)),
                Op::Div | Op::Mod if y == 0 => Uint(0),
                Op::Div => Uint(x / y),
                Op::Mod => Uint(x % y),
                Op::And => Uint(x & y),
                Op::InclusiveOr => Uint(x | y),
                Op::ExclusiveOr => Uint(x ^ y),
                Op::LeftShift => Uint(x.wrapping_shl(y)),
                Op::RightShift => Uint(x.wrapping_shr(y)),
                Op::LessThan => Bool(x < y),
                Op::GreaterThan => Bool(x > y),
                Op::LessThanEqual => Bool(x <= y),
                Op::GreaterThanEqual => Bool(x >= y),
                _ => return None,
            },
            (Int(x), Uint(y)) | (Uint(y), Int(x))
                if matches!(op, Op::LeftShift | Op::RightShift) =>
            {
                // Shifts keep the left operand's type.
                match (a, op) {
                    (Int(_), Op::LeftShift) => Int(x.wrapping_shl(y)),
                    (Int(_), _) => Int(x.wrapping_shr(y)),
                    (_, Op::LeftShift) => Uint(y.wrapping_shl(x as u32)),
                    _ => Uint(y.wrapping_shr(x as u32)),
                }
            }
            (Float(x), Float(y)) | (Double(x), Double(y)) => {
                let wrap = |v: f64| if matches!(a, Float(_)) { Float(v) } else { Double(v) };
                match op {
                    Op::Add => wrap(x + y),
                    Op::Sub => wrap(x - y),
                    Op::Mul | Op::VectorTimesScalar | Op::MatrixTimesScalar => wrap(x * y),
                    Op::Div => wrap(x / y),
                    Op::LessThan => Bool(x < y),
                    Op::GreaterThan => Bool(x > y),
                    Op::LessThanEqual => Bool(x <= y),
                    Op::GreaterThanEqual => Bool(x >= y),
                    _ => return None,
                }
            }
            (Bool(x), Bool(y)) => match op {
                Op::LogicalAnd => Bool(x && y),
                Op::LogicalOr => Bool(x || y),
                Op::LogicalXor => Bool(x != y),
                _ => return None,
            },
            _ => return None,
        };
        out.push(value);
    }
    Some(out)
}

/// Fold a linear-algebra product. Matrices are stored column-major, so
/// component `c * rows + r` is column `c`, row `r`. A vector is one column
/// on the right and one row on the left.
pub fn fold_matrix_product(
    op: Op,
    left: &[ConstValue],
    left_ty: &Type,
    right: &[ConstValue],
    right_ty: &Type,
) -> Option<Vec<ConstValue>> {
    let wrap: fn(f64) -> ConstValue = match left.first()? {
        ConstValue::Double(_) => ConstValue::Double,
        ConstValue::Float(_) => ConstValue::Float,
        _ => return None,
    };
    let at = |values: &[ConstValue], i: usize| values.get(i).map(|v| v.as_f64());

    let (cols, rows, inner) = match op {
        Op::MatrixTimesMatrix => (right_ty.matrix_cols, left_ty.matrix_rows, left_ty.matrix_cols),
        Op::MatrixTimesVector => (1, left_ty.matrix_rows, left_ty.matrix_cols),
        Op::VectorTimesMatrix => (right_ty.matrix_cols, 1, right_ty.matrix_rows),
        _ => return None,
    };
    let (cols, rows, inner) = (cols as usize, rows as usize, inner as usize);

    let mut out = Vec::with_capacity(cols * rows);
    for c in 0..cols {
        for r in 0..rows {
            let mut sum = 0.0;
            for k in 0..inner {
                sum += at(left, k * rows + r)? * at(right, c * inner + k)?;
            }
            out.push(wrap(sum));
        }
    }
    Some(out)
}

/// Fold a component-wise unary operation.
pub fn fold_unary(op: Op, operand: &[ConstValue]) -> Option<Vec<ConstValue>> {
    use ConstValue::*;

    operand
        .iter()
        .map(|&v| match (op, v) {
            (Op::Negative, Int(x)) => Some(Int(x.wrapping_neg())),
            (Op::Negative, Uint(x)) => Some(Uint(x.wrapping_neg())),
            (Op::Negative, Float(x)) => Some(Float(-x)),
            (Op::Negative, Double(x)) => Some(Double(-x)),
            (Op::LogicalNot, Bool(x)) => Some(Bool(!x)),
            (Op::BitwiseNot, Int(x)) => Some(Int(!x)),
            (Op::BitwiseNot, Uint(x)) => Some(Uint(!x)),
            _ => None,
        })
        .collect()
}
