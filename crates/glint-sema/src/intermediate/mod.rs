//! AST factory and per-shader intermediate state.
//!
//! `Intermediate` builds typed nodes, inserts implicit conversions and folds
//! constant operands. It never reports diagnostics: every builder that can
//! fail returns `None` and leaves the wording to the caller.

mod constant;
mod node;
mod ops;


use std::collections::BTreeMap;

use indexmap::{IndexMap, IndexSet};

use glint_core::{Profile, SourceLoc, Stage};

use crate::symbols::SymbolId;
use crate::types::{
    BasicType, LayoutDepth, LayoutGeometry, Storage, Type, VertexOrder, VertexSpacing,
};

pub use constant::{ConstValue, fold_binary, fold_matrix_product, fold_unary};
pub use node::{BranchOp, Node, NodeKind};
pub use ops::{BuiltInOp, ConstructOp, Op};

/// Shader-wide layout state collected from `layout(...) in/out;` declarations.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ShaderLayout {
    pub input_primitive: Option<LayoutGeometry>,
    pub output_primitive: Option<LayoutGeometry>,
    /// Output vertex count: `max_vertices` or tessellation `vertices`.
    pub vertices: Option<u32>,
    pub invocations: Option<u32>,
    pub spacing: Option<VertexSpacing>,
    pub order: Option<VertexOrder>,
    pub point_mode: bool,
    pub local_size: [Option<u32>; 3],
    pub origin_upper_left: bool,
    pub pixel_center_integer: bool,
    pub early_fragment_tests: bool,
    pub depth: Option<LayoutDepth>,
    /// Declared stride per transform feedback buffer.
    pub xfb_strides: BTreeMap<u32, u32>,
}

fn set_once<T: PartialEq + Copy>(slot: &mut Option<T>, value: T) -> bool {
    match slot {
        Some(existing) => *existing == value,
        None => {
            *slot = Some(value);
            true
        }
    }
}

#[derive(Debug)]
pub struct Intermediate {
    stage: Stage,
    version: u32,
    profile: Profile,
    layout: ShaderLayout,
    linkage: Vec<Node>,
    invariant_all: bool,
    /// Caller signature to callee signatures, in first-call order.
    call_graph: IndexMap<String, IndexSet<String>>,
}

impl Intermediate {
    pub fn new(stage: Stage, version: u32, profile: Profile) -> Self {
        Self {
            stage,
            version,
            profile,
            layout: ShaderLayout::default(),
            linkage: Vec::new(),
            invariant_all: false,
            call_graph: IndexMap::new(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn is_es(&self) -> bool {
        self.profile == Profile::Es
    }

    pub fn layout(&self) -> &ShaderLayout {
        &self.layout
    }

    // Shader-level layout setters return false when a different value is
    // already set.

    pub fn set_input_primitive(&mut self, primitive: LayoutGeometry) -> bool {
        set_once(&mut self.layout.input_primitive, primitive)
    }

    pub fn set_output_primitive(&mut self, primitive: LayoutGeometry) -> bool {
        set_once(&mut self.layout.output_primitive, primitive)
    }

    pub fn set_vertices(&mut self, count: u32) -> bool {
        set_once(&mut self.layout.vertices, count)
    }

    pub fn set_invocations(&mut self, count: u32) -> bool {
        set_once(&mut self.layout.invocations, count)
    }

    pub fn set_vertex_spacing(&mut self, spacing: VertexSpacing) -> bool {
        set_once(&mut self.layout.spacing, spacing)
    }

    pub fn set_vertex_order(&mut self, order: VertexOrder) -> bool {
        set_once(&mut self.layout.order, order)
    }

    pub fn set_point_mode(&mut self) {
        self.layout.point_mode = true;
    }

    pub fn set_local_size(&mut self, dim: usize, size: u32) -> bool {
        match self.layout.local_size.get_mut(dim) {
            Some(slot) => set_once(slot, size),
            None => false,
        }
    }

    pub fn set_origin_upper_left(&mut self) {
        self.layout.origin_upper_left = true;
    }

    pub fn set_pixel_center_integer(&mut self) {
        self.layout.pixel_center_integer = true;
    }

    pub fn set_early_fragment_tests(&mut self) {
        self.layout.early_fragment_tests = true;
    }

    pub fn set_depth(&mut self, depth: LayoutDepth) -> bool {
        set_once(&mut self.layout.depth, depth)
    }

    pub fn set_xfb_buffer_stride(&mut self, buffer: u32, stride: u32) -> bool {
        match self.layout.xfb_strides.get(&buffer) {
            Some(&existing) => existing == stride,
            None => {
                self.layout.xfb_strides.insert(buffer, stride);
                true
            }
        }
    }

    pub fn set_invariant_all(&mut self) {
        self.invariant_all = true;
    }

    pub fn invariant_all(&self) -> bool {
        self.invariant_all
    }

    /// Record an object the linker needs even if the tree never references it.
    pub fn add_to_linkage(&mut self, node: Node) {
        self.linkage.push(node);
    }

    pub fn linkage(&self) -> &[Node] {
        &self.linkage
    }

    /// Wrap the linkage objects in a single aggregate.
    pub fn take_linkage(&mut self, loc: SourceLoc) -> Node {
        let children = std::mem::take(&mut self.linkage);
        Node::new(
            NodeKind::Aggregate {
                op: Op::Linkage,
                name: String::new(),
                children,
            },
            Type::void(),
            loc,
        )
    }

    pub fn add_to_call_graph(&mut self, caller: &str, callee: &str) {
        self.call_graph
            .entry(caller.to_string())
            .or_default()
            .insert(callee.to_string());
    }

    pub fn calls(&self, caller: &str) -> impl Iterator<Item = &str> {
        self.call_graph
            .get(caller)
            .into_iter()
            .flat_map(|callees| callees.iter().map(String::as_str))
    }

    /// Functions that take part in a call cycle, in discovery order.
    pub fn recursive_functions(&self) -> Vec<String> {
        let mut found = IndexSet::new();
        for start in self.call_graph.keys() {
            let mut stack: Vec<&str> = self.calls(start).collect();
            let mut seen = IndexSet::new();
            while let Some(next) = stack.pop() {
                if next == start {
                    found.insert(start.clone());
                    break;
                }
                if seen.insert(next) {
                    stack.extend(self.calls(next));
                }
            }
        }
        found.into_iter().collect()
    }

    /// Longest call chain starting at `root`, ignoring cycles.
    pub fn call_depth(&self, root: &str) -> u32 {
        fn depth<'a>(graph: &'a Intermediate, name: &'a str, path: &mut Vec<&'a str>) -> u32 {
            path.push(name);
            let callees: Vec<&str> = graph.calls(name).collect();
            let mut deepest = 0;
            for callee in callees {
                if !path.contains(&callee) {
                    deepest = deepest.max(1 + depth(graph, callee, path));
                }
            }
            path.pop();
            deepest
        }
        depth(self, root, &mut Vec::new())
    }

    // Node construction

    pub fn add_symbol(&self, id: SymbolId, name: &str, ty: &Type, loc: SourceLoc) -> Node {
        Node::new(
            NodeKind::Variable {
                id,
                name: name.to_string(),
            },
            ty.clone(),
            loc,
        )
    }

    pub fn add_constant(&self, values: Vec<ConstValue>, ty: &Type, loc: SourceLoc) -> Node {
        let mut ty = ty.clone();
        ty.qualifier.make_temporary();
        ty.qualifier.storage = Storage::Const;
        Node::new(NodeKind::Constant(values), ty, loc)
    }

    pub fn int_constant(&self, value: i32, loc: SourceLoc) -> Node {
        self.add_constant(
            vec![ConstValue::Int(value)],
            &Type::scalar(BasicType::Int),
            loc,
        )
    }

    pub fn uint_constant(&self, value: u32, loc: SourceLoc) -> Node {
        self.add_constant(
            vec![ConstValue::Uint(value)],
            &Type::scalar(BasicType::Uint),
            loc,
        )
    }

    pub fn float_constant(&self, value: f64, loc: SourceLoc) -> Node {
        self.add_constant(
            vec![ConstValue::Float(value)],
            &Type::scalar(BasicType::Float),
            loc,
        )
    }

    pub fn bool_constant(&self, value: bool, loc: SourceLoc) -> Node {
        self.add_constant(
            vec![ConstValue::Bool(value)],
            &Type::scalar(BasicType::Bool),
            loc,
        )
    }

    /// Whether `from` converts to `to` without an explicit constructor.
    pub fn can_implicitly_promote(&self, from: BasicType, to: BasicType) -> bool {
        if from == to {
            return true;
        }
        if self.is_es() || self.version < 120 {
            return false;
        }
        match (from, to) {
            (BasicType::Int, BasicType::Float) => true,
            (BasicType::Uint, BasicType::Float) => self.version >= 130,
            (BasicType::Int | BasicType::Uint | BasicType::Float, BasicType::Double) => {
                self.version >= 400
            }
            (BasicType::Int, BasicType::Uint) => self.version >= 400,
            _ => false,
        }
    }

    /// Convert `node` to the basic type of `to`, keeping its shape.
    ///
    /// Returns the node unchanged when no conversion is needed and `None`
    /// when the implicit conversion is not allowed or the shapes differ.
    pub fn add_conversion(&self, node: Node, to: &Type) -> Option<Node> {
        if !shape_matches(&node.ty, to) {
            return None;
        }
        if node.ty.basic == to.basic {
            return Some(node);
        }
        if !node.ty.basic.is_numeric() || !self.can_implicitly_promote(node.ty.basic, to.basic) {
            return None;
        }
        Some(self.convert(node, to.basic))
    }

    /// Unconditional conversion node, folded when the operand is constant.
    pub fn convert(&self, node: Node, basic: BasicType) -> Node {
        let mut ty = node.ty.clone();
        ty.basic = basic;
        let loc = node.loc;
        if let Some(values) = node.constant_values() {
            let values = values.iter().map(|v| v.convert(basic)).collect();
            return self.add_constant(values, &ty, loc);
        }
        ty.qualifier.make_temporary();
        Node::new(
            NodeKind::Unary {
                op: Op::Convert,
                operand: Box::new(node),
            },
            ty,
            loc,
        )
    }

    /// Bring two operands to a common basic type, promoting one of them.
    fn unify_operands(&self, left: Node, right: Node) -> Option<(Node, Node)> {
        let (lb, rb) = (left.ty.basic, right.ty.basic);
        if lb == rb {
            return Some((left, right));
        }
        if self.can_implicitly_promote(rb, lb) {
            Some((left, self.convert(right, lb)))
        } else if self.can_implicitly_promote(lb, rb) {
            Some((self.convert(left, rb), right))
        } else {
            None
        }
    }

    /// Type-check and build a binary arithmetic, bitwise, relational or
    /// logical operation. `None` means the operand types are not valid for
    /// the operator.
    pub fn add_binary_math(&self, op: Op, left: Node, right: Node, loc: SourceLoc) -> Option<Node> {
        let operands_ok =
            |ty: &Type| !ty.is_array() && !ty.is_struct() && !ty.is_opaque() && !ty.is_void();
        if !operands_ok(&left.ty) || !operands_ok(&right.ty) {
            return None;
        }

        let (left, right, op, result) = match op {
            Op::LogicalAnd | Op::LogicalOr | Op::LogicalXor => {
                if !left.ty.is_bool_scalar() || !right.ty.is_bool_scalar() {
                    return None;
                }
                (left, right, op, Type::scalar(BasicType::Bool))
            }
            Op::Equal | Op::NotEqual => {
                let (left, right) = self.unify_operands(left, right)?;
                if !left.ty.same_shape(&right.ty) {
                    return None;
                }
                (left, right, op, Type::scalar(BasicType::Bool))
            }
            Op::LessThan | Op::GreaterThan | Op::LessThanEqual | Op::GreaterThanEqual => {
                if !left.ty.is_scalar() || !right.ty.is_scalar() || !left.ty.basic.is_numeric() {
                    return None;
                }
                let (left, right) = self.unify_operands(left, right)?;
                (left, right, op, Type::scalar(BasicType::Bool))
            }
            Op::LeftShift | Op::RightShift => {
                if !left.ty.basic.is_integer()
                    || !right.ty.basic.is_integer()
                    || left.ty.is_matrix()
                    || right.ty.is_matrix()
                {
                    return None;
                }
                if !right.ty.is_scalar() && right.ty.vector_size != left.ty.vector_size {
                    return None;
                }
                let result = left.ty.clone();
                (left, right, op, result)
            }
            Op::And | Op::InclusiveOr | Op::ExclusiveOr | Op::Mod => {
                if !left.ty.basic.is_integer() || !right.ty.basic.is_integer() {
                    return None;
                }
                let (left, right) = self.unify_operands(left, right)?;
                let result = broadcast_shape(&left.ty, &right.ty)?;
                (left, right, op, result)
            }
            Op::Add | Op::Sub | Op::Div => {
                if !left.ty.basic.is_numeric() || !right.ty.basic.is_numeric() {
                    return None;
                }
                let (left, right) = self.unify_operands(left, right)?;
                let result = broadcast_shape(&left.ty, &right.ty)?;
                (left, right, op, result)
            }
            Op::Mul => {
                if !left.ty.basic.is_numeric() || !right.ty.basic.is_numeric() {
                    return None;
                }
                let (left, right) = self.unify_operands(left, right)?;
                let (op, result) = multiply_shape(&left.ty, &right.ty)?;
                (left, right, op, result)
            }
            _ => return None,
        };

        let mut result = result;
        result.qualifier = Default::default();
        result.qualifier.precision = left.ty.qualifier.precision.max(right.ty.qualifier.precision);

        if let (Some(l), Some(r)) = (left.constant_values(), right.constant_values()) {
            let folded = match op {
                Op::MatrixTimesMatrix | Op::MatrixTimesVector | Op::VectorTimesMatrix => {
                    fold_matrix_product(op, l, &left.ty, r, &right.ty)
                }
                _ => fold_binary(op, l, r),
            };
            if let Some(values) = folded {
                return Some(self.add_constant(values, &result, loc));
            }
        }

        Some(Node::new(
            NodeKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            result,
            loc,
        ))
    }

    pub fn add_unary_math(&self, op: Op, operand: Node, loc: SourceLoc) -> Option<Node> {
        let ty = &operand.ty;
        if ty.is_array() || ty.is_struct() || ty.is_opaque() || ty.is_void() {
            return None;
        }
        let valid = match op {
            Op::Negative => ty.basic.is_numeric(),
            Op::LogicalNot => ty.is_bool_scalar(),
            Op::BitwiseNot => ty.basic.is_integer(),
            Op::PostIncrement | Op::PostDecrement | Op::PreIncrement | Op::PreDecrement => {
                ty.basic.is_numeric()
            }
            _ => false,
        };
        if !valid {
            return None;
        }

        let mut result = operand.ty.clone();
        result.qualifier.make_temporary();
        if !op.modifies_operand()
            && let Some(values) = operand.constant_values()
            && let Some(folded) = fold_unary(op, values)
        {
            return Some(self.add_constant(folded, &result, loc));
        }
        Some(Node::new(
            NodeKind::Unary {
                op,
                operand: Box::new(operand),
            },
            result,
            loc,
        ))
    }

    /// Assignment or compound assignment; converts the right side to the
    /// left side's type.
    pub fn add_assign(&self, op: Op, left: Node, right: Node, loc: SourceLoc) -> Option<Node> {
        let right = match op.assignment_base() {
            None => {
                if left.ty.is_opaque() {
                    return None;
                }
                let right = self.add_conversion(right, &left.ty)?;
                if !left.ty.same_shape(&right.ty) {
                    return None;
                }
                right
            }
            Some(base) => {
                let right = if right.ty.basic != left.ty.basic
                    && !matches!(base, Op::LeftShift | Op::RightShift)
                {
                    if !self.can_implicitly_promote(right.ty.basic, left.ty.basic) {
                        return None;
                    }
                    self.convert(right, left.ty.basic)
                } else {
                    right
                };
                let math = self.add_binary_math(base, left.clone(), right.clone(), loc)?;
                if !math.ty.same_shape(&left.ty) {
                    return None;
                }
                right
            }
        };

        let mut ty = left.ty.clone();
        ty.qualifier.make_temporary();
        Some(Node::new(
            NodeKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            loc,
        ))
    }

    /// Index into an array, matrix or vector. Folds constant indexes of constants.
    pub fn add_index(&self, op: Op, base: Node, index: Node, loc: SourceLoc) -> Node {
        let mut ty = base.ty.dereference();
        if base.ty.storage() != Storage::Const {
            ty.qualifier.storage = base.ty.storage();
        }

        if let (Some(values), Some(i)) = (base.constant_values(), index.const_int())
            && i >= 0
        {
            let stride = ty.component_count() as usize;
            let start = i as usize * stride;
            if let Some(slice) = values.get(start..start + stride) {
                return self.add_constant(slice.to_vec(), &ty, loc);
            }
        }

        Node::new(
            NodeKind::Binary {
                op,
                left: Box::new(base),
                right: Box::new(index),
            },
            ty,
            loc,
        )
    }

    /// Member selection on a struct or block; `index` is the field position.
    pub fn add_field_select(&self, base: Node, index: usize, loc: SourceLoc) -> Option<Node> {
        let field = base.ty.fields().get(index)?;
        let mut ty = field.ty.clone();
        let outer = base.ty.storage();
        if ty.storage() == Storage::Temporary || base.ty.basic == BasicType::Block {
            ty.qualifier.storage = outer;
        }

        if let Some(values) = base.constant_values() {
            let start: usize = base.ty.fields()[..index]
                .iter()
                .map(|f| f.ty.component_count() as usize)
                .sum();
            let len = ty.component_count() as usize;
            if let Some(slice) = values.get(start..start + len) {
                return Some(self.add_constant(slice.to_vec(), &ty, loc));
            }
        }

        let index = self.int_constant(index as i32, loc);
        Some(Node::new(
            NodeKind::Binary {
                op: Op::IndexDirectStruct,
                left: Box::new(base),
                right: Box::new(index),
            },
            ty,
            loc,
        ))
    }

    /// Vector swizzle with already validated component offsets.
    pub fn add_swizzle(&self, base: Node, components: &[u8], loc: SourceLoc) -> Node {
        let mut ty = base.ty.clone();
        ty.vector_size = components.len() as u8;
        if base.ty.storage() != Storage::Const {
            ty.qualifier.storage = base.ty.storage();
        }

        if let Some(values) = base.constant_values() {
            let picked: Option<Vec<_>> = components
                .iter()
                .map(|&c| values.get(c as usize).copied())
                .collect();
            if let Some(picked) = picked {
                return self.add_constant(picked, &ty, loc);
            }
        }

        let selectors = components
            .iter()
            .map(|&c| self.int_constant(c as i32, loc))
            .collect();
        let selectors = Node::new(
            NodeKind::Aggregate {
                op: Op::Sequence,
                name: String::new(),
                children: selectors,
            },
            Type::void(),
            loc,
        );
        Node::new(
            NodeKind::Binary {
                op: Op::VectorSwizzle,
                left: Box::new(base),
                right: Box::new(selectors),
            },
            ty,
            loc,
        )
    }

    pub fn add_comma(&self, left: Node, right: Node, loc: SourceLoc) -> Node {
        let mut ty = right.ty.clone();
        ty.qualifier.make_temporary();
        Node::new(
            NodeKind::Binary {
                op: Op::Comma,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
            loc,
        )
    }

    /// `cond ? a : b`; both branches are converted to a common type.
    pub fn add_ternary(&self, cond: Node, a: Node, b: Node, loc: SourceLoc) -> Option<Node> {
        let (a, b) = self.unify_operands(a, b)?;
        if !a.ty.same_shape(&b.ty) {
            return None;
        }
        if let Some(value) = cond.constant_values().and_then(|v| v.first().copied())
            && a.is_constant()
            && b.is_constant()
        {
            return Some(if value.as_bool() { a } else { b });
        }

        let mut ty = a.ty.clone();
        ty.qualifier.make_temporary();
        Some(Node::new(
            NodeKind::Selection {
                condition: Box::new(cond),
                then_branch: Some(Box::new(a)),
                else_branch: Some(Box::new(b)),
            },
            ty,
            loc,
        ))
    }

    pub fn add_selection(
        &self,
        cond: Node,
        then_branch: Option<Node>,
        else_branch: Option<Node>,
        loc: SourceLoc,
    ) -> Node {
        Node::new(
            NodeKind::Selection {
                condition: Box::new(cond),
                then_branch: then_branch.map(Box::new),
                else_branch: else_branch.map(Box::new),
            },
            Type::void(),
            loc,
        )
    }

    pub fn add_loop(
        &self,
        body: Option<Node>,
        condition: Option<Node>,
        terminal: Option<Node>,
        test_first: bool,
        loc: SourceLoc,
    ) -> Node {
        Node::new(
            NodeKind::Loop {
                condition: condition.map(Box::new),
                body: body.map(Box::new),
                terminal: terminal.map(Box::new),
                test_first,
            },
            Type::void(),
            loc,
        )
    }

    pub fn add_branch(&self, op: BranchOp, value: Option<Node>, loc: SourceLoc) -> Node {
        Node::new(
            NodeKind::Branch {
                op,
                value: value.map(Box::new),
            },
            Type::void(),
            loc,
        )
    }

    pub fn add_switch(&self, condition: Node, body: Node, loc: SourceLoc) -> Node {
        Node::new(
            NodeKind::Switch {
                condition: Box::new(condition),
                body: Box::new(body),
            },
            Type::void(),
            loc,
        )
    }

    /// Append `right` to the sequence `left`, creating the sequence if needed.
    pub fn grow_aggregate(
        &self,
        left: Option<Node>,
        right: Option<Node>,
        loc: SourceLoc,
    ) -> Option<Node> {
        let Some(left) = left else {
            return right.map(|r| self.make_aggregate(r, loc));
        };
        let mut aggregate = match left.kind {
            NodeKind::Aggregate { op: Op::Null, .. } => left,
            _ => self.make_aggregate(left, loc),
        };
        if let (NodeKind::Aggregate { children, .. }, Some(right)) = (&mut aggregate.kind, right) {
            children.push(right);
        }
        Some(aggregate)
    }

    /// Single-child aggregate with no operator yet.
    pub fn make_aggregate(&self, node: Node, loc: SourceLoc) -> Node {
        Node::new(
            NodeKind::Aggregate {
                op: Op::Null,
                name: String::new(),
                children: vec![node],
            },
            Type::void(),
            loc,
        )
    }

    /// Give an aggregate its final operator and type. Non-aggregates are wrapped first.
    pub fn set_aggregate_operator(
        &self,
        node: Option<Node>,
        op: Op,
        ty: &Type,
        loc: SourceLoc,
    ) -> Node {
        let mut aggregate = match node {
            Some(
                n @ Node {
                    kind: NodeKind::Aggregate { op: Op::Null, .. },
                    ..
                },
            ) => n,
            Some(n) => self.make_aggregate(n, loc),
            None => Node::new(
                NodeKind::Aggregate {
                    op: Op::Null,
                    name: String::new(),
                    children: Vec::new(),
                },
                Type::void(),
                loc,
            ),
        };
        if let NodeKind::Aggregate { op: slot, .. } = &mut aggregate.kind {
            *slot = op;
        }
        aggregate.ty = ty.clone();
        aggregate.loc = loc;
        aggregate
    }

    /// Aggregate carrying a function name, for calls and definitions.
    pub fn add_named_aggregate(
        &self,
        op: Op,
        name: &str,
        children: Vec<Node>,
        ty: &Type,
        loc: SourceLoc,
    ) -> Node {
        Node::new(
            NodeKind::Aggregate {
                op,
                name: name.to_string(),
                children,
            },
            ty.clone(),
            loc,
        )
    }
}

/// Same vector or matrix shape, ignoring the basic type.
fn shape_matches(a: &Type, b: &Type) -> bool {
    a.vector_size == b.vector_size
        && a.matrix_cols == b.matrix_cols
        && a.matrix_rows == b.matrix_rows
        && a.is_struct() == b.is_struct()
        && match (&a.array_sizes, &b.array_sizes) {
            (None, None) => true,
            (Some(x), Some(y)) => x.same_dims(y),
            _ => false,
        }
}

/// Component-wise result shape; a scalar broadcasts against the other side.
fn broadcast_shape(left: &Type, right: &Type) -> Option<Type> {
    if left.is_scalar() {
        Some(right.clone())
    } else if right.is_scalar() || left.same_shape(right) {
        Some(left.clone())
    } else {
        None
    }
}

fn multiply_shape(left: &Type, right: &Type) -> Option<(Op, Type)> {
    let basic = left.basic;
    match (left.is_matrix(), right.is_matrix()) {
        (false, false) => {
            if left.is_scalar() != right.is_scalar() {
                let vector = if left.is_scalar() { right } else { left };
                Some((Op::VectorTimesScalar, vector.clone()))
            } else if left.vector_size == right.vector_size {
                Some((Op::Mul, left.clone()))
            } else {
                None
            }
        }
        (true, false) if right.is_scalar() => Some((Op::MatrixTimesScalar, left.clone())),
        (false, true) if left.is_scalar() => Some((Op::MatrixTimesScalar, right.clone())),
        (true, false) => (left.matrix_cols == right.vector_size)
            .then(|| (Op::MatrixTimesVector, Type::vector(basic, left.matrix_rows))),
        (false, true) => (left.vector_size == right.matrix_rows)
            .then(|| (Op::VectorTimesMatrix, Type::vector(basic, right.matrix_cols))),
        (true, true) => (left.matrix_cols == right.matrix_rows).then(|| {
            (
                Op::MatrixTimesMatrix,
                Type::matrix(basic, right.matrix_cols, left.matrix_rows),
            )
        }),
    }
}
