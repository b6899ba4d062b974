//! Test harness driving `ParseContext` the way a grammar driver would.
//!
//! Every action the harness forwards gets its own source line, starting at 1,
//! so rendered diagnostics read like a shader listing.

use glint_core::{Profile, SourceLoc, Stage};

use crate::context::{CompileOptions, CompileOutput, ParseContext};
use crate::intermediate::{BranchOp, Node};
use crate::symbols::{Param, SymbolId};
use crate::types::{ArraySizes, BasicType, Field, PublicType, Storage, Type};

pub struct Shader {
    pub ctx: ParseContext,
    line: u32,
}

impl Shader {
    /// Desktop core 450.
    pub fn new(stage: Stage) -> Self {
        Self::with_options(CompileOptions::new(stage))
    }

    pub fn version(stage: Stage, version: u32, profile: Profile) -> Self {
        Self::with_options(CompileOptions::new(stage).version(version, profile))
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            ctx: ParseContext::new(options).expect("default resources are valid"),
            line: 0,
        }
    }

    /// Location of the next action.
    pub fn loc(&mut self) -> SourceLoc {
        self.line += 1;
        SourceLoc::line(self.line)
    }

    pub fn declare(&mut self, name: &str, ty: Type) -> Option<Node> {
        let loc = self.loc();
        self.ctx.declare_variable(loc, name, &public(ty), None, None)
    }

    pub fn declare_init(&mut self, name: &str, ty: Type, init: Node) -> Option<Node> {
        let loc = self.loc();
        self.ctx.declare_variable(loc, name, &public(ty), None, Some(init))
    }

    /// `ty name[sizes];`
    pub fn declare_array(&mut self, name: &str, ty: Type, sizes: ArraySizes) -> Option<Node> {
        let loc = self.loc();
        self.ctx.declare_variable(loc, name, &public(ty), Some(&sizes), None)
    }

    pub fn declare_public(&mut self, name: &str, public_type: &PublicType) -> Option<Node> {
        let loc = self.loc();
        self.ctx.declare_variable(loc, name, public_type, None, None)
    }

    pub fn block(
        &mut self,
        name: &str,
        public_type: &PublicType,
        members: Vec<Field>,
        instance: Option<&str>,
    ) -> Option<SymbolId> {
        let loc = self.loc();
        self.ctx
            .declare_block(loc, name, members, public_type, instance, None)
    }

    pub fn prototype(&mut self, name: &str, ret: Type, params: Vec<Param>) -> Option<SymbolId> {
        let loc = self.loc();
        self.ctx
            .handle_function_declarator(loc, name, &public(ret), params, true)
    }

    /// Define a function; `body` builds the statements inside its scope.
    pub fn function(
        &mut self,
        name: &str,
        ret: Type,
        params: Vec<Param>,
        body: impl FnOnce(&mut Shader) -> Option<Node>,
    ) {
        let loc = self.loc();
        self.ctx
            .handle_function_declarator(loc, name, &public(ret), params.clone(), false);
        let parameters = self.ctx.handle_function_definition(loc, name, &params);
        let body = body(self);
        let end = self.loc();
        self.ctx.finish_function_definition(end, parameters, body);
    }

    pub fn main(&mut self, body: impl FnOnce(&mut Shader) -> Option<Node>) {
        self.function("main", Type::void(), Vec::new(), body);
    }

    pub fn empty_main(&mut self) {
        self.main(|_| None);
    }

    pub fn var(&mut self, name: &str) -> Node {
        let loc = self.loc();
        self.ctx.handle_variable(loc, name)
    }

    pub fn int(&self, value: i32) -> Node {
        self.ctx
            .intermediate()
            .int_constant(value, SourceLoc::line(self.line))
    }

    pub fn float(&self, value: f64) -> Node {
        self.ctx
            .intermediate()
            .float_constant(value, SourceLoc::line(self.line))
    }

    pub fn call(&mut self, name: &str, args: Vec<Node>) -> Node {
        let loc = self.loc();
        self.ctx.handle_function_call(loc, name, args)
    }

    pub fn ret(&mut self, value: Option<Node>) -> Node {
        let loc = self.loc();
        self.ctx.handle_branch(loc, BranchOp::Return, value)
    }

    /// Statement list as the grammar builds it.
    pub fn sequence(&self, nodes: Vec<Node>) -> Option<Node> {
        let loc = SourceLoc::line(self.line);
        nodes
            .into_iter()
            .fold(None, |acc, node| self.ctx.intermediate().grow_aggregate(acc, Some(node), loc))
    }

    /// Diagnostics so far, one per line.
    pub fn errors(&self) -> String {
        self.ctx.diagnostics().render()
    }

    pub fn finish(mut self) -> CompileOutput {
        let end = self.loc();
        self.ctx.finish(end).expect("compilation was not abandoned")
    }
}

pub fn public(ty: Type) -> PublicType {
    PublicType::from_type(SourceLoc::default(), &ty)
}

pub fn float() -> Type {
    Type::scalar(BasicType::Float)
}

pub fn int() -> Type {
    Type::scalar(BasicType::Int)
}

pub fn vec(size: u8) -> Type {
    Type::vector(BasicType::Float, size)
}

pub fn param(name: &str, ty: Type) -> Param {
    Param::new(Some(name), ty.with_storage(Storage::In), SourceLoc::default())
}

pub fn field(name: &str, ty: Type) -> Field {
    Field::new(name, ty, SourceLoc::default())
}
