//! Function prototypes, definitions, calls and overload resolution.

use glint_core::{ProfileMask, SourceLoc, Stage};

use crate::diagnostics::DiagnosticKind;
use crate::intermediate::{BranchOp, BuiltInOp, Node, NodeKind, Op};
use crate::symbols::{Function, Param, SymbolId, SymbolKind, Variable, mangle};
use crate::types::{BasicType, PublicType, Storage, Type};

use super::ParseContext;

/// The function whose body is being checked.
#[derive(Clone, Debug)]
pub(crate) struct CurrentFunction {
    pub(crate) name: String,
    pub(crate) mangled: String,
    pub(crate) return_type: Type,
    /// A `return` with a value was seen.
    pub(crate) returns_value: bool,
    pub(crate) is_main: bool,
}

fn is_input(storage: Storage) -> bool {
    matches!(storage, Storage::In | Storage::InOut | Storage::ConstReadOnly)
}

fn is_output(storage: Storage) -> bool {
    matches!(storage, Storage::Out | Storage::InOut)
}

/// Same shape once the basic type of `to` is replaced by that of `from`.
fn same_shape_but_basic(from: &Type, to: &Type) -> bool {
    let mut retyped = to.clone();
    retyped.basic = from.basic;
    from.same_shape(&retyped)
}

/// Whether converting `from` to `to2` is better than converting it to `to1`.
fn better_conversion(from: &Type, to1: &Type, to2: &Type) -> bool {
    if from.same_shape(to2) {
        return !from.same_shape(to1);
    }
    if from.same_shape(to1) {
        return false;
    }
    if from.basic == BasicType::Float
        && to2.basic == BasicType::Double
        && to1.basic != BasicType::Double
    {
        return true;
    }
    to2.basic == BasicType::Float && to1.basic == BasicType::Double
}

impl ParseContext {
    /// A prototype, or the header of a definition.
    ///
    /// Returns the symbol the declaration resolves to: the new one, or the
    /// earlier declaration with the same signature.
    pub fn handle_function_declarator(
        &mut self,
        loc: SourceLoc,
        name: &str,
        return_type: &PublicType,
        params: Vec<Param>,
        prototype: bool,
    ) -> Option<SymbolId> {
        let mut ret = return_type.to_type();
        if !matches!(ret.storage(), Storage::Temporary | Storage::Global) {
            self.report(DiagnosticKind::Qualifier, loc)
                .message("no qualifiers allowed for function return")
                .token(ret.storage().name())
                .emit();
        }
        ret.qualifier.make_temporary();
        if ret.is_array() {
            self.require_profile(loc, ProfileMask::DESKTOP, "arrayed return type");
            self.profile_requires(
                loc,
                ProfileMask::NONE,
                120,
                &["GL_3DL_array_objects"],
                "arrayed return type",
            );
        }
        self.reserved_error_check(loc, name);
        if !self.symbols.at_global_level() {
            self.require_profile(loc, ProfileMask::DESKTOP, "local function declaration");
        }
        for param in &params {
            let label = param.name.as_deref().unwrap_or("parameter");
            self.void_error_check(param.loc, label, param.ty.basic);
        }

        let mut func = Function::new(name, ret.clone(), params);
        let previous = self.symbols.find_functions(name).into_iter().find(|&id| {
            self.symbols
                .get(id)
                .as_function()
                .is_some_and(|f| f.mangled == func.mangled)
        });
        if let Some(previous) = previous {
            if self.symbols.is_built_in(previous) {
                self.require_profile(loc, ProfileMask::DESKTOP, "redefinition of built-in function");
            } else {
                self.check_redeclared_signature(loc, name, previous, &func, prototype);
            }
        }
        self.array_object_check(loc, &ret, "array in function return type");

        func.prototyped = prototype;
        let mangled = func.mangled.clone();
        match self.symbols.insert(name, loc, SymbolKind::Function(func)) {
            Ok(id) => {
                tracing::debug!(function = %mangled, "function declared");
                Some(id)
            }
            Err(existing) => {
                let same = self
                    .symbols
                    .get(existing)
                    .as_function()
                    .is_some_and(|f| f.mangled == mangled);
                if !same {
                    self.report(DiagnosticKind::Redefinition, loc)
                        .message("function name is redeclaration of existing name")
                        .token(name)
                        .emit();
                    return None;
                }
                if prototype
                    && let Some(f) = self.symbols.get_mut(existing).and_then(|s| s.as_function_mut())
                {
                    f.prototyped = true;
                }
                Some(existing)
            }
        }
    }

    fn check_redeclared_signature(
        &mut self,
        loc: SourceLoc,
        name: &str,
        previous: SymbolId,
        func: &Function,
        prototype: bool,
    ) {
        let Some(prev) = self.symbols.get(previous).as_function().cloned() else {
            return;
        };
        if prev.prototyped && prototype {
            self.profile_requires(loc, ProfileMask::ES, 300, &[], "multiple prototypes for same function");
        }
        if !prev.return_type.same_shape(&func.return_type) {
            self.report(DiagnosticKind::Overload, loc)
                .message("overloaded functions must have the same return type")
                .token(name)
                .emit();
        }
        for (i, (old, new)) in prev.params.iter().zip(&func.params).enumerate() {
            if old.ty.storage() != new.ty.storage() {
                self.report(DiagnosticKind::Overload, loc)
                    .message(
                        "overloaded functions must have the same parameter storage qualifiers for argument",
                    )
                    .token(new.ty.storage().name())
                    .extra(format!("{}", i + 1))
                    .emit();
            }
            if old.ty.qualifier.precision != new.ty.qualifier.precision {
                self.report(DiagnosticKind::Overload, loc)
                    .message(
                        "overloaded functions must have the same parameter precision qualifiers for argument",
                    )
                    .token(new.ty.qualifier.precision.name())
                    .extra(format!("{}", i + 1))
                    .emit();
            }
        }
    }

    /// Open a function body: mark the declaration defined, enter its scope
    /// and declare the parameters. Returns the parameter sequence.
    pub fn handle_function_definition(&mut self, loc: SourceLoc, name: &str, params: &[Param]) -> Node {
        let mangled = mangle(name, params.iter().map(|p| &p.ty));
        let declared = self
            .symbols
            .find_functions(name)
            .into_iter()
            .filter(|&id| !self.symbols.is_built_in(id))
            .find(|&id| {
                self.symbols
                    .get(id)
                    .as_function()
                    .is_some_and(|f| f.mangled == mangled)
            });

        let mut return_type = Type::void();
        match declared {
            None => {
                self.report(DiagnosticKind::Undeclared, loc)
                    .message("can't find function")
                    .token(name)
                    .emit();
            }
            Some(id) => {
                let defined = self
                    .symbols
                    .get(id)
                    .as_function()
                    .is_some_and(|f| f.defined);
                if defined {
                    self.report(DiagnosticKind::Redefinition, loc)
                        .message("function already has a body")
                        .token(name)
                        .emit();
                } else if let Some(f) = self.symbols.get_mut(id).and_then(|s| s.as_function_mut()) {
                    f.defined = true;
                    return_type = f.return_type.clone();
                }
            }
        }

        let is_main = name == "main";
        if is_main {
            if !params.is_empty() {
                self.report(DiagnosticKind::TypeMismatch, loc)
                    .message("function cannot take any parameter(s)")
                    .token(name)
                    .emit();
            }
            if !return_type.is_void() {
                self.report(DiagnosticKind::TypeMismatch, loc)
                    .message("entry point cannot return a value")
                    .token(return_type.basic_name())
                    .emit();
            }
        }

        self.current_function = Some(CurrentFunction {
            name: name.to_string(),
            mangled: mangled.clone(),
            return_type,
            returns_value: false,
            is_main,
        });
        self.symbols.push_scope();

        let mut nodes = Vec::with_capacity(params.len());
        for param in params {
            let var = Variable::new(param.ty.clone());
            match &param.name {
                Some(param_name) => {
                    match self.symbols.insert(param_name, param.loc, SymbolKind::Variable(var)) {
                        Ok(id) => nodes.push(self.ast.add_symbol(id, param_name, &param.ty, param.loc)),
                        Err(_) => {
                            self.report(DiagnosticKind::Redefinition, param.loc)
                                .message("redefinition")
                                .token(param_name.as_str())
                                .emit();
                        }
                    }
                }
                None => {
                    let id = self.symbols.insert_anonymous(param.loc, var);
                    nodes.push(self.ast.add_symbol(id, "", &param.ty, param.loc));
                }
            }
        }

        self.nesting.reset_statements();
        self.post_main_return = false;
        tracing::debug!(function = %mangled, "function body");
        self.ast
            .add_named_aggregate(Op::Parameters, "", nodes, &Type::void(), loc)
    }

    /// Close the body opened by [`Self::handle_function_definition`] and
    /// append the definition to the tree.
    pub fn finish_function_definition(&mut self, loc: SourceLoc, params: Node, body: Option<Node>) {
        let Some(current) = self.current_function.take() else {
            return;
        };
        if !current.return_type.is_void() && !current.returns_value {
            self.report(DiagnosticKind::Return, loc)
                .message("function does not return a value:")
                .token(current.name.as_str())
                .emit();
        }
        self.symbols.pop_scope();

        let children = std::iter::once(params).chain(body).collect();
        let node = self.ast.add_named_aggregate(
            Op::FunctionDefinition,
            &current.mangled,
            children,
            &current.return_type,
            loc,
        );
        self.append_to_tree(node);
    }

    /// A call by name. Constructors go through
    /// [`Self::handle_constructor_call`] and `.length()` through
    /// [`Self::handle_length_method`].
    pub fn handle_function_call(&mut self, loc: SourceLoc, name: &str, args: Vec<Node>) -> Node {
        let Some(id) = self.find_function(loc, name, &args) else {
            return self.ast.float_constant(0.0, loc);
        };
        let built_in = self.symbols.is_built_in(id);
        let Some(func) = self.symbols.get(id).as_function().cloned() else {
            return self.ast.float_constant(0.0, loc);
        };

        for (arg, param) in args.iter().zip(&func.params) {
            if is_output(param.ty.storage()) && self.l_value_error_check(arg.loc, "assign", arg) {
                self.report(DiagnosticKind::NotLValue, arg.loc)
                    .message("Non-L-value cannot be passed for 'out' or 'inout' parameters.")
                    .token("out")
                    .emit();
            }
            let (actual, formal) = (arg.ty.qualifier, param.ty.qualifier);
            let dropped = [
                (actual.readonly && !formal.readonly, "readonly"),
                (actual.writeonly && !formal.writeonly, "writeonly"),
                (actual.coherent && !formal.coherent, "coherent"),
                (actual.volatile && !formal.volatile, "volatile"),
            ];
            for (lost, keyword) in dropped {
                if lost {
                    self.report(DiagnosticKind::Qualifier, arg.loc)
                        .message("argument cannot drop memory qualifier when passed to formal parameter")
                        .token(keyword)
                        .emit();
                }
            }
        }

        let args = self.add_input_argument_conversions(&func, args);
        let mut ret = func.return_type.clone();
        ret.qualifier.make_temporary();

        let result = match func.op.filter(|_| built_in) {
            Some(op) => {
                let call = self.ast.add_named_aggregate(Op::BuiltIn(op), name, args, &ret, loc);
                self.built_in_op_check(loc, op, &call);
                self.non_op_built_in_check(loc, &call);
                call
            }
            None => {
                let call = self
                    .ast
                    .add_named_aggregate(Op::FunctionCall, &func.mangled, args, &ret, loc);
                if !built_in {
                    let caller = match &self.current_function {
                        Some(current) => current.mangled.clone(),
                        None => {
                            self.require_profile(
                                loc,
                                ProfileMask::DESKTOP,
                                "calling user function from global scope",
                            );
                            "main()".to_string()
                        }
                    };
                    self.ast.add_to_call_graph(&caller, &func.mangled);
                }
                call
            }
        };
        self.add_output_argument_conversions(&func, result)
    }

    /// Select the function a call resolves to, with the matching rules of
    /// the current version.
    pub fn find_function(&mut self, loc: SourceLoc, name: &str, args: &[Node]) -> Option<SymbolId> {
        if let Some(found) = self.symbols.lookup(name)
            && !self.symbols.get(found.id).is_function()
        {
            self.report(DiagnosticKind::TypeMismatch, loc)
                .message("can't use function syntax on variable")
                .token(name)
                .emit();
            return None;
        }
        if self.is_es() || self.version < 120 {
            self.find_function_exact(loc, name, args)
        } else if self.version < 400 {
            self.find_function120(loc, name, args)
        } else {
            self.find_function400(loc, name, args)
        }
    }

    fn exact_match(&self, name: &str, args: &[Node]) -> Option<SymbolId> {
        let mangled = mangle(name, args.iter().map(|a| &a.ty));
        self.symbols.find_functions(name).into_iter().find(|&id| {
            self.symbols
                .get(id)
                .as_function()
                .is_some_and(|f| f.mangled == mangled)
        })
    }

    fn no_matching_overload(&mut self, loc: SourceLoc, name: &str) {
        self.report(DiagnosticKind::Overload, loc)
            .message("no matching overloaded function found")
            .token(name)
            .emit();
    }

    pub fn find_function_exact(&mut self, loc: SourceLoc, name: &str, args: &[Node]) -> Option<SymbolId> {
        let found = self.exact_match(name, args);
        if found.is_none() {
            self.no_matching_overload(loc, name);
        }
        found
    }

    /// Whether `func` accepts `args` under implicit conversion. In
    /// arguments must convert to the formal type, out arguments the other
    /// way round.
    fn viable(&self, func: &Function, args: &[Node]) -> bool {
        func.params.len() == args.len()
            && func.params.iter().zip(args).all(|(param, arg)| {
                let (from, to) = (&arg.ty, &param.ty);
                if from.same_shape(to) {
                    return true;
                }
                if from.is_array() || to.is_array() || !same_shape_but_basic(from, to) {
                    return false;
                }
                let storage = to.storage();
                (!is_input(storage) || self.ast.can_implicitly_promote(from.basic, to.basic))
                    && (!is_output(storage) || self.ast.can_implicitly_promote(to.basic, from.basic))
            })
    }

    fn viable_candidates(&self, name: &str, args: &[Node]) -> Vec<SymbolId> {
        self.symbols
            .find_functions(name)
            .into_iter()
            .filter(|&id| {
                self.symbols
                    .get(id)
                    .as_function()
                    .is_some_and(|f| self.viable(f, args))
            })
            .collect()
    }

    /// Exact match, otherwise the single signature reachable by implicit
    /// conversions.
    pub fn find_function120(&mut self, loc: SourceLoc, name: &str, args: &[Node]) -> Option<SymbolId> {
        if let Some(id) = self.exact_match(name, args) {
            return Some(id);
        }
        let viable = self.viable_candidates(name, args);
        match viable.as_slice() {
            [] => {
                self.no_matching_overload(loc, name);
                None
            }
            [only] => Some(*only),
            _ => {
                self.report(DiagnosticKind::AmbiguousCall, loc)
                    .message(
                        "ambiguous function signature match: multiple signatures match under implicit type conversion",
                    )
                    .token(name)
                    .emit();
                None
            }
        }
    }

    /// Exact match, otherwise the viable signature needing the fewest
    /// conversions. Remaining ties go to the candidate whose conversions
    /// are at least as good for every argument and better for one.
    pub fn find_function400(&mut self, loc: SourceLoc, name: &str, args: &[Node]) -> Option<SymbolId> {
        if let Some(id) = self.exact_match(name, args) {
            return Some(id);
        }
        let viable = self.viable_candidates(name, args);
        if viable.is_empty() {
            self.no_matching_overload(loc, name);
            return None;
        }

        let params_of = |id: SymbolId| -> Vec<Type> {
            self.symbols
                .get(id)
                .as_function()
                .map(|f| f.params.iter().map(|p| p.ty.clone()).collect())
                .unwrap_or_default()
        };
        let conversions = |params: &[Type]| -> usize {
            params
                .iter()
                .zip(args)
                .filter(|(param, arg)| !arg.ty.same_shape(param))
                .count()
        };
        let candidates: Vec<(SymbolId, Vec<Type>)> =
            viable.into_iter().map(|id| (id, params_of(id))).collect();
        let fewest = candidates
            .iter()
            .map(|(_, params)| conversions(params))
            .min()
            .unwrap_or(0);
        let best: Vec<&(SymbolId, Vec<Type>)> = candidates
            .iter()
            .filter(|(_, params)| conversions(params) == fewest)
            .collect();

        // `to` improves on `from` for at least one argument.
        let improves = |from: &[Type], to: &[Type]| {
            args.iter()
                .zip(from.iter().zip(to))
                .any(|(arg, (a, b))| better_conversion(&arg.ty, a, b))
        };
        let equivalent = |a: &[Type], b: &[Type]| {
            args.iter().zip(a.iter().zip(b)).all(|(arg, (x, y))| {
                !better_conversion(&arg.ty, x, y) && !better_conversion(&arg.ty, y, x)
            })
        };

        let mut incumbent = best[0];
        for &candidate in &best[1..] {
            if improves(&incumbent.1, &candidate.1) && !improves(&candidate.1, &incumbent.1) {
                incumbent = candidate;
            }
        }
        let tie = best.iter().any(|candidate| {
            candidate.0 != incumbent.0
                && (improves(&incumbent.1, &candidate.1) || equivalent(&incumbent.1, &candidate.1))
        });
        if tie {
            self.report(DiagnosticKind::AmbiguousCall, loc)
                .message("ambiguous best function under implicit type conversion")
                .token(name)
                .emit();
            return None;
        }
        Some(incumbent.0)
    }

    /// Convert in and inout arguments to their formal types.
    pub fn add_input_argument_conversions(&self, func: &Function, args: Vec<Node>) -> Vec<Node> {
        args.into_iter()
            .enumerate()
            .map(|(i, arg)| match func.params.get(i) {
                Some(param)
                    if is_input(param.ty.storage())
                        && !arg.ty.is_array()
                        && arg.ty.basic != param.ty.basic
                        && self.ast.can_implicitly_promote(arg.ty.basic, param.ty.basic) =>
                {
                    self.ast.convert(arg, param.ty.basic)
                }
                _ => arg,
            })
            .collect()
    }

    /// Out arguments whose type differs from the formal one are passed
    /// through temporaries and written back after the call:
    /// `(tempReturn = f(tempArg), arg = tempArg, tempReturn)`.
    pub fn add_output_argument_conversions(&mut self, func: &Function, mut call: Node) -> Node {
        let pending: Vec<usize> = func
            .params
            .iter()
            .enumerate()
            .filter(|(i, param)| {
                is_output(param.ty.storage())
                    && call
                        .children()
                        .get(*i)
                        .is_some_and(|arg| !arg.ty.same_shape(&param.ty))
            })
            .map(|(i, _)| i)
            .collect();
        if pending.is_empty() {
            return call;
        }

        let loc = call.loc;
        let mut write_backs = Vec::with_capacity(pending.len());
        for i in pending {
            let mut temp_ty = func.params[i].ty.clone();
            temp_ty.qualifier.make_temporary();
            let (temp_id, temp_name) = self.make_internal_variable("tempArg", &temp_ty, loc);
            let temp = self.ast.add_symbol(temp_id, &temp_name, &temp_ty, loc);
            let NodeKind::Aggregate { children, .. } = &mut call.kind else {
                break;
            };
            let Some(slot) = children.get_mut(i) else {
                continue;
            };
            let original = std::mem::replace(slot, temp.clone());
            if let Some(assign) = self.ast.add_assign(Op::Assign, original, temp, loc) {
                write_backs.push(assign);
            }
        }

        let ty = call.ty.clone();
        let mut sequence = Vec::with_capacity(write_backs.len() + 2);
        let temp_return = if ty.is_void() {
            sequence.push(call);
            None
        } else {
            let (id, name) = self.make_internal_variable("tempReturn", &ty, loc);
            let target = self.ast.add_symbol(id, &name, &ty, loc);
            if let Some(assign) = self.ast.add_assign(Op::Assign, target, call, loc) {
                sequence.push(assign);
            }
            Some((id, name))
        };
        sequence.extend(write_backs);
        if let Some((id, name)) = temp_return {
            sequence.push(self.ast.add_symbol(id, &name, &ty, loc));
        }
        self.ast.add_named_aggregate(Op::Comma, "", sequence, &ty, loc)
    }

    /// Compiler-generated variable in the current scope. The `@` keeps the
    /// name out of reach of source identifiers.
    fn make_internal_variable(&mut self, prefix: &str, ty: &Type, loc: SourceLoc) -> (SymbolId, String) {
        let name = format!("{prefix}@{}", self.temporaries);
        self.temporaries += 1;
        let var = SymbolKind::Variable(Variable::new(ty.clone()));
        let id = match self.symbols.insert(&name, loc, var) {
            Ok(id) | Err(id) => id,
        };
        (id, name)
    }

    /// `return;` or `return value;`.
    pub fn handle_return_value(&mut self, loc: SourceLoc, value: Option<Node>) -> Node {
        let Some((return_type, is_main)) = self
            .current_function
            .as_ref()
            .map(|f| (f.return_type.clone(), f.is_main))
        else {
            self.report(DiagnosticKind::Return, loc)
                .message("return statement outside of a function body")
                .token("return")
                .emit();
            return self.ast.add_branch(BranchOp::Return, None, loc);
        };

        let Some(value) = value else {
            if !return_type.is_void() {
                self.report(DiagnosticKind::Return, loc)
                    .message("non-void function must return a value")
                    .token("return")
                    .emit();
            }
            if is_main {
                self.post_main_return = true;
            }
            return self.ast.add_branch(BranchOp::Return, None, loc);
        };
        if let Some(current) = self.current_function.as_mut() {
            current.returns_value = true;
        }

        if return_type.is_void() {
            self.report(DiagnosticKind::Return, loc)
                .message("void function cannot return a value")
                .token("return")
                .emit();
            return self.ast.add_branch(BranchOp::Return, None, loc);
        }
        if value.ty.same_shape(&return_type) {
            return self.ast.add_branch(BranchOp::Return, Some(value), loc);
        }

        let convertible = !value.ty.is_array()
            && same_shape_but_basic(&value.ty, &return_type)
            && self.ast.can_implicitly_promote(value.ty.basic, return_type.basic);
        if !convertible {
            self.report(DiagnosticKind::Return, loc)
                .message("type does not match, or is not convertible to, the function's return type")
                .token("return")
                .emit();
            return self.ast.add_branch(BranchOp::Return, Some(value), loc);
        }
        if self.version < 420 {
            self.report(DiagnosticKind::Portability, loc)
                .message("type conversion on return values was not explicitly allowed until version 420")
                .token("return")
                .emit();
        }
        let converted = self.ast.convert(value, return_type.basic);
        self.ast.add_branch(BranchOp::Return, Some(converted), loc)
    }

    /// `base.length()`: a constant for sized arrays, vectors and matrices,
    /// a run-time query for the last member of a buffer block.
    pub fn handle_length_method(&mut self, loc: SourceLoc, base: Node, arg_count: usize) -> Node {
        if arg_count > 0 {
            self.report(DiagnosticKind::TypeMismatch, loc)
                .message("method does not accept any arguments")
                .token("length")
                .emit();
            return self.ast.int_constant(1, loc);
        }

        let ty = base.ty.clone();
        let mut length = 0;
        if ty.is_array() {
            self.profile_requires(loc, ProfileMask::NONE, 120, &["GL_3DL_array_objects"], ".length");
            self.profile_requires(loc, ProfileMask::ES, 300, &[], ".length");
            match ty.outer_array_size() {
                Some(size) => length = size,
                None => {
                    let io = base.as_variable().is_some() && self.is_io_resize_array(&ty);
                    if io && let (Some(size), _) = self.get_io_array_implicit_size() {
                        length = size;
                    }
                    if length == 0 {
                        if io {
                            self.report(DiagnosticKind::ArraySize, loc)
                                .message("array must first be sized by a redeclaration or layout qualifier")
                                .token("length")
                                .emit();
                        } else if ty.storage() == Storage::Buffer {
                            return Node::new(
                                NodeKind::Unary {
                                    op: Op::ArrayLength,
                                    operand: Box::new(base),
                                },
                                Type::scalar(BasicType::Int),
                                loc,
                            );
                        } else {
                            self.report(DiagnosticKind::ArraySize, loc)
                                .message("array must be declared with a size before using this method")
                                .token("length")
                                .emit();
                        }
                    }
                }
            }
        } else if ty.is_matrix() || ty.is_vector() {
            const FEATURE: &str = ".length() on vectors and matrices";
            self.require_profile(loc, ProfileMask::DESKTOP, FEATURE);
            self.profile_requires(
                loc,
                ProfileMask::DESKTOP,
                420,
                &["GL_ARB_shading_language_420pack"],
                FEATURE,
            );
            length = if ty.is_matrix() {
                ty.matrix_cols as u32
            } else {
                ty.vector_size as u32
            };
        } else {
            self.report(DiagnosticKind::TypeMismatch, loc)
                .message("does not operate on this type:")
                .token("length")
                .extra(ty.to_string())
                .emit();
        }
        let length = i32::try_from(length.max(1)).unwrap_or(i32::MAX);
        self.ast.int_constant(length, loc)
    }

    /// Operand rules of built-ins mapped to an operator.
    pub fn built_in_op_check(&mut self, loc: SourceLoc, op: BuiltInOp, call: &Node) {
        let NodeKind::Aggregate { name, children, .. } = &call.kind else {
            return;
        };
        match op {
            BuiltInOp::TextureOffset | BuiltInOp::TextureGatherOffset => {
                let Some(offset) = children.get(2) else {
                    return;
                };
                let variable_allowed =
                    op == BuiltInOp::TextureGatherOffset && !self.is_es() && self.version >= 400;
                match offset.constant_values() {
                    None if !variable_allowed => {
                        self.report(DiagnosticKind::NotConstant, loc)
                            .message("must be a compile-time constant:")
                            .token("texel offset")
                            .emit();
                    }
                    None => {}
                    Some(values) => {
                        let min = i64::from(self.resources.min_program_texel_offset);
                        let max = i64::from(self.resources.max_program_texel_offset);
                        if values.iter().any(|v| !(min..=max).contains(&v.as_i64())) {
                            self.report(DiagnosticKind::IndexOutOfRange, loc)
                                .message("value is out of range:")
                                .token("texel offset")
                                .extra("[gl_MinProgramTexelOffset, gl_MaxProgramTexelOffset]")
                                .emit();
                        }
                    }
                }
            }
            BuiltInOp::InterpolateAtCentroid
            | BuiltInOp::InterpolateAtSample
            | BuiltInOp::InterpolateAtOffset => {
                let interpolant = children
                    .first()
                    .and_then(Node::base_variable)
                    .is_some_and(|base| base.storage() == Storage::VaryingIn);
                if !interpolant {
                    self.report(DiagnosticKind::Storage, loc)
                        .message("first argument must be an interpolant, or interpolant-array element")
                        .token(name.as_str())
                        .emit();
                }
            }
            _ => {}
        }
    }

    /// Rules that depend on where a built-in is called rather than on its
    /// operands.
    pub fn non_op_built_in_check(&mut self, loc: SourceLoc, call: &Node) {
        let NodeKind::Aggregate { name, children, .. } = &call.kind else {
            return;
        };
        match name.as_str() {
            "EmitStreamVertex" | "EndStreamPrimitive" => {
                if !children.first().is_some_and(Node::is_constant) {
                    self.report(DiagnosticKind::NotConstant, loc)
                        .message("must be a compile-time constant:")
                        .token("stream")
                        .emit();
                }
            }
            "barrier" => self.check_location(loc, "barrier()"),
            _ => {}
        }
    }

    /// Tessellation control `barrier()` must sit directly in `main`,
    /// outside control flow and before any return.
    pub fn check_location(&mut self, loc: SourceLoc, feature: &str) {
        if self.stage != Stage::TessControl {
            return;
        }
        if self.nesting.control_flow > 0 {
            self.report(DiagnosticKind::ControlFlow, loc)
                .message("tessellation control barrier() cannot be placed within flow control")
                .token(feature)
                .emit();
        }
        let in_main = self.current_function.as_ref().is_some_and(|f| f.is_main);
        if !in_main {
            self.report(DiagnosticKind::ControlFlow, loc)
                .message("tessellation control barrier() must be in main()")
                .token(feature)
                .emit();
        } else if self.post_main_return {
            self.report(DiagnosticKind::ControlFlow, loc)
                .message("tessellation control barrier() cannot be placed after a return from main()")
                .token(feature)
                .emit();
        }
    }
}
