//! Constructor calls: `vec3(1.0)`, `S(a, b)`, `float[2](x, y)`, `sampler2D(t, s)`.

use glint_core::{ProfileMask, SourceLoc};

use crate::diagnostics::DiagnosticKind;
use crate::intermediate::{ConstValue, ConstructOp, Node, Op};
use crate::types::{ArraySizes, BasicType, Precision, PublicType, Storage, Type};

use super::ParseContext;

const CONSTRUCTOR: &str = "constructor";

impl ParseContext {
    /// A call whose callee is a type.
    pub fn handle_constructor_call(&mut self, loc: SourceLoc, public: &PublicType, args: Vec<Node>) -> Node {
        let mut ty = public.to_type();
        ty.qualifier.make_temporary();
        ty.qualifier.precision = Precision::None;

        if ty.is_array() {
            self.profile_requires(
                loc,
                ProfileMask::NONE,
                120,
                &["GL_3DL_array_objects"],
                "arrayed constructor",
            );
            self.profile_requires(loc, ProfileMask::ES, 300, &[], "arrayed constructor");
        }

        let Some(op) = self.map_type_to_constructor_op(&ty) else {
            self.report(DiagnosticKind::Constructor, loc)
                .message("cannot construct this type")
                .token(ty.basic_name())
                .emit();
            return self.ast.float_constant(0.0, loc);
        };
        if self.constructor_error(loc, &args, op, &mut ty) {
            return self.ast.float_constant(0.0, loc);
        }
        let name = ty.basic_name();
        match self.add_constructor(loc, args, &ty) {
            Some(node) => node,
            None => {
                self.report(DiagnosticKind::Constructor, loc)
                    .message("cannot construct with these arguments")
                    .token(name)
                    .emit();
                self.ast.float_constant(0.0, loc)
            }
        }
    }

    /// Constructor flavor for a target type, or `None` when the type cannot
    /// be constructed.
    pub fn map_type_to_constructor_op(&self, ty: &Type) -> Option<ConstructOp> {
        let element = match ty.basic {
            BasicType::Struct => ConstructOp::Struct,
            BasicType::Sampler if ty.sampler.combined && !ty.sampler.image => ConstructOp::TextureSampler,
            BasicType::Void | BasicType::Sampler | BasicType::AtomicUint | BasicType::Block => return None,
            _ if ty.is_matrix() => ConstructOp::Matrix,
            _ if ty.is_vector() => ConstructOp::Vector,
            _ => ConstructOp::Scalar,
        };
        if ty.is_array() && element != ConstructOp::TextureSampler {
            Some(ConstructOp::Array)
        } else {
            Some(element)
        }
    }

    /// Validate the argument list of a constructor. May size an unsized
    /// target array and marks the result `const` when every argument is.
    ///
    /// Returns true when an error was reported.
    pub fn constructor_error(&mut self, loc: SourceLoc, args: &[Node], op: ConstructOp, ty: &mut Type) -> bool {
        if op == ConstructOp::TextureSampler {
            return self.constructor_texture_sampler_error(loc, args, ty);
        }

        let constructing_matrix = op == ConstructOp::Matrix;
        let target_components = ty.component_count();
        let mut size = 0u32;
        let mut full = false;
        let mut over_full = false;
        let mut matrix_in_matrix = false;
        let mut array_arg = false;
        for arg in args {
            if arg.ty.is_array() {
                if arg.ty.is_unsized_array() {
                    self.report(DiagnosticKind::ArraySize, arg.loc)
                        .message("array argument must be sized")
                        .token(CONSTRUCTOR)
                        .emit();
                    return true;
                }
                array_arg = true;
            }
            size += arg.ty.component_count();
            if constructing_matrix && arg.ty.is_matrix() {
                matrix_in_matrix = true;
            }
            if full {
                over_full = true;
            }
            if op != ConstructOp::Struct && !ty.is_array() && size >= target_components {
                full = true;
            }
        }
        if !args.is_empty() && args.iter().all(Node::is_constant) {
            ty.qualifier.storage = Storage::Const;
        }

        if ty.is_array() {
            return self.array_constructor_error(loc, args, ty);
        }

        if array_arg && op != ConstructOp::Struct {
            self.report(DiagnosticKind::Constructor, loc)
                .message("constructing non-array constituent from array argument")
                .token(CONSTRUCTOR)
                .emit();
            return true;
        }

        if matrix_in_matrix {
            self.profile_requires(loc, ProfileMask::NONE, 120, &[], "constructing matrix from matrix");
            if args.len() != 1 {
                self.report(DiagnosticKind::Constructor, loc)
                    .message("matrix constructed from matrix can only have one argument")
                    .token(CONSTRUCTOR)
                    .emit();
                return true;
            }
            return false;
        }

        if over_full {
            self.report(DiagnosticKind::Constructor, loc)
                .message("too many arguments")
                .token(CONSTRUCTOR)
                .emit();
            return true;
        }

        if op == ConstructOp::Struct && ty.fields().len() != args.len() {
            self.report(DiagnosticKind::Constructor, loc)
                .message("Number of constructor parameters does not match the number of structure fields")
                .token(CONSTRUCTOR)
                .emit();
            return true;
        }

        let short = if op == ConstructOp::Struct {
            size < target_components
        } else {
            size != 1 && size < target_components
        };
        if short {
            self.report(DiagnosticKind::Constructor, loc)
                .message("not enough data provided for construction")
                .token(CONSTRUCTOR)
                .emit();
            return true;
        }

        if op != ConstructOp::Struct
            && let Some(first) = args.first()
        {
            let reason = match first.ty.basic {
                BasicType::Sampler => Some("cannot convert a sampler"),
                BasicType::AtomicUint => Some("cannot convert an atomic_uint"),
                BasicType::Void => Some("cannot convert a void"),
                _ => None,
            };
            if let Some(reason) = reason {
                self.report(DiagnosticKind::Constructor, loc)
                    .message(reason)
                    .token(CONSTRUCTOR)
                    .emit();
                return true;
            }
        }
        false
    }

    fn array_constructor_error(&mut self, loc: SourceLoc, args: &[Node], ty: &mut Type) -> bool {
        let Some(sizes) = ty.array_sizes.clone() else {
            return false;
        };
        let count = u32::try_from(args.len()).unwrap_or(u32::MAX);
        if args.is_empty() {
            self.report(DiagnosticKind::Constructor, loc)
                .message("array constructor must have at least one argument")
                .token(CONSTRUCTOR)
                .emit();
            return true;
        }

        let mut resized = sizes.clone();
        match sizes.outer_size() {
            None => resized.set_outer_size(count),
            Some(size) if size != count => {
                self.report(DiagnosticKind::Constructor, loc)
                    .message("array constructor needs one argument per array element")
                    .token(CONSTRUCTOR)
                    .emit();
                return true;
            }
            Some(_) => {}
        }

        if sizes.num_dims() > 1 {
            // Unsized inner dimensions take their size from the first argument.
            let inner = sizes.inner();
            let arg_sizes = args[0].ty.array_sizes.clone().unwrap_or_default();
            let fits = arg_sizes.num_dims() == inner.num_dims()
                && inner
                    .dims()
                    .iter()
                    .zip(arg_sizes.dims())
                    .all(|(want, have)| want.is_none() || want == have);
            if !fits {
                self.report(DiagnosticKind::Constructor, loc)
                    .message("array constructor argument not correct type to construct array element")
                    .token(CONSTRUCTOR)
                    .emit();
                return true;
            }
            let mut filled = ArraySizes::new();
            filled.add_inner(resized.outer_size());
            filled.add_inner_sizes(&arg_sizes);
            resized = filled;
        }
        ty.array_sizes = Some(resized);
        false
    }

    /// `sampler2D(texture2D, sampler)`-style construction.
    pub fn constructor_texture_sampler_error(&mut self, loc: SourceLoc, args: &[Node], ty: &Type) -> bool {
        let name = ty.basic_name();
        let fail = |ctx: &mut Self, message: &str| -> bool {
            ctx.report(DiagnosticKind::Constructor, loc)
                .message(message)
                .token(name.as_str())
                .emit();
            true
        };

        let [texture, sampler] = args else {
            return fail(self, "sampler-constructor requires two arguments");
        };
        if ty.is_array() {
            return fail(self, "sampler-constructor cannot make an array of samplers");
        }
        if texture.ty.basic != BasicType::Sampler || !texture.ty.sampler.is_texture() || texture.ty.is_array() {
            return fail(self, "sampler-constructor first argument must be a scalar textureXXX type");
        }
        let mut expected = ty.sampler;
        expected.combined = false;
        expected.shadow = false;
        if expected != texture.ty.sampler {
            return fail(
                self,
                "sampler-constructor first argument must match type and dimensionality of constructor type",
            );
        }
        if sampler.ty.basic != BasicType::Sampler || !sampler.ty.sampler.pure || sampler.ty.is_array() {
            return fail(self, "sampler-constructor second argument must be a scalar type 'sampler'");
        }
        false
    }

    /// Build the constructor node for already validated arguments. Constant
    /// arguments fold into a constant.
    pub fn add_constructor(&mut self, loc: SourceLoc, args: Vec<Node>, ty: &Type) -> Option<Node> {
        let op = self.map_type_to_constructor_op(ty)?;
        match op {
            ConstructOp::Struct | ConstructOp::Array => self.construct_aggregate(loc, args, ty, op),
            ConstructOp::TextureSampler => {
                Some(self.ast.add_named_aggregate(Op::Construct(op), "", args, ty, loc))
            }
            ConstructOp::Scalar | ConstructOp::Vector | ConstructOp::Matrix => {
                self.construct_built_in(loc, args, ty, op)
            }
        }
    }

    /// Structs and arrays: each argument converts to its member type.
    fn construct_aggregate(&mut self, loc: SourceLoc, args: Vec<Node>, ty: &Type, op: ConstructOp) -> Option<Node> {
        let members: Vec<Type> = if ty.is_array() {
            vec![ty.dereference(); args.len()]
        } else {
            ty.fields().iter().map(|f| f.ty.clone()).collect()
        };
        if members.len() != args.len() {
            return None;
        }

        let mut converted = Vec::with_capacity(args.len());
        for (i, (arg, member)) in args.into_iter().zip(&members).enumerate() {
            if arg.ty.same_shape(member) {
                converted.push(arg);
                continue;
            }
            let from = arg.ty.to_string();
            match self.ast.add_conversion(arg, member) {
                Some(node) => converted.push(node),
                None => {
                    self.report(DiagnosticKind::Constructor, loc)
                        .token(CONSTRUCTOR)
                        .extra(format!(
                            "cannot convert parameter {} from '{}' to '{}'",
                            i + 1,
                            from,
                            member
                        ))
                        .emit();
                    return None;
                }
            }
        }

        if converted.iter().all(Node::is_constant) {
            let values = converted
                .iter()
                .filter_map(Node::constant_values)
                .flatten()
                .copied()
                .collect();
            return Some(self.ast.add_constant(values, ty, loc));
        }
        let mut result_ty = ty.clone();
        result_ty.qualifier.make_temporary();
        Some(self.ast.add_named_aggregate(Op::Construct(op), "", converted, &result_ty, loc))
    }

    /// Scalars, vectors and matrices: arguments are converted explicitly and
    /// their components consumed in order.
    fn construct_built_in(&mut self, loc: SourceLoc, args: Vec<Node>, ty: &Type, op: ConstructOp) -> Option<Node> {
        let usable = |t: &Type| !t.is_array() && !t.is_struct() && !t.is_opaque() && !t.is_void();
        if args.is_empty() || !args.iter().all(|a| usable(&a.ty)) {
            return None;
        }
        let converted: Vec<Node> = args
            .into_iter()
            .map(|a| {
                if a.ty.basic == ty.basic {
                    a
                } else {
                    self.ast.convert(a, ty.basic)
                }
            })
            .collect();

        if converted.iter().all(Node::is_constant) {
            let values = fold_built_in_constructor(&converted, ty, op)?;
            return Some(self.ast.add_constant(values, ty, loc));
        }
        let mut result_ty = ty.clone();
        result_ty.qualifier.make_temporary();
        Some(self.ast.add_named_aggregate(Op::Construct(op), "", converted, &result_ty, loc))
    }
}

/// Component values of a scalar, vector or matrix built from constants
/// already converted to the target basic type.
fn fold_built_in_constructor(args: &[Node], ty: &Type, op: ConstructOp) -> Option<Vec<ConstValue>> {
    let components: Vec<ConstValue> = args
        .iter()
        .filter_map(Node::constant_values)
        .flatten()
        .copied()
        .collect();
    let first = *components.first()?;
    let zero = ConstValue::Int(0).convert(ty.basic);
    let one = ConstValue::Int(1).convert(ty.basic);

    match op {
        ConstructOp::Scalar => Some(vec![first]),
        ConstructOp::Vector => {
            let n = ty.vector_size as usize;
            if components.len() == 1 {
                Some(vec![first; n])
            } else {
                components.get(..n).map(<[ConstValue]>::to_vec)
            }
        }
        ConstructOp::Matrix => {
            let (cols, rows) = (ty.matrix_cols as usize, ty.matrix_rows as usize);
            let single = &args[0].ty;
            if args.len() == 1 && single.is_scalar() {
                return Some(
                    (0..cols * rows)
                        .map(|i| if i / rows == i % rows { first } else { zero })
                        .collect(),
                );
            }
            if args.len() == 1 && single.is_matrix() {
                let (src_cols, src_rows) = (single.matrix_cols as usize, single.matrix_rows as usize);
                return Some(
                    (0..cols * rows)
                        .map(|i| {
                            let (c, r) = (i / rows, i % rows);
                            if c < src_cols && r < src_rows {
                                components[c * src_rows + r]
                            } else if c == r {
                                one
                            } else {
                                zero
                            }
                        })
                        .collect(),
                );
            }
            components.get(..cols * rows).map(<[ConstValue]>::to_vec)
        }
        ConstructOp::Struct | ConstructOp::Array | ConstructOp::TextureSampler => None,
    }
}
