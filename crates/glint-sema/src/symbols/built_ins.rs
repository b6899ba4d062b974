//! Shared table of predeclared variables, blocks and functions.

use indexmap::IndexMap;

use glint_core::{Profile, Resources, SourceLoc, Stage};

use crate::intermediate::{BuiltInOp, ConstValue};
use crate::types::{ArraySizes, Field, Qualifier, Storage, StructDef, Type};

use super::symbol::{Function, Param, Symbol, SymbolId, SymbolKind, SymbolOrigin, Variable};

/// Built-in symbols for one stage, version and profile.
///
/// Built once and shared read-only through an `Arc` by every compilation
/// with the same configuration. Ids are dense from zero.
#[derive(Debug, Clone, Default)]
pub struct BuiltInTable {
    symbols: Vec<Symbol>,
    names: IndexMap<String, Vec<SymbolId>>,
}

impl BuiltInTable {
    pub fn builder() -> BuiltInTableBuilder {
        BuiltInTableBuilder::default()
    }

    /// The predeclared symbols of the language for this configuration.
    pub fn new(stage: Stage, version: u32, profile: Profile, resources: &Resources) -> Self {
        let mut builder = Self::builder();
        super::stdlib::populate(&mut builder, stage, version, profile, resources);
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).and_then(|ids| ids.first().copied())
    }

    pub fn overloads(&self, name: &str) -> &[SymbolId] {
        self.names.get(name).map_or(&[], Vec::as_slice)
    }

    /// Members of an anonymous built-in block, in field order.
    pub fn members_of(&self, block: SymbolId) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.iter().filter_map(move |s| match s.kind {
            SymbolKind::Member { block: b, .. } if b == block => Some(s.id),
            _ => None,
        })
    }
}

#[derive(Debug, Default)]
pub struct BuiltInTableBuilder {
    table: BuiltInTable,
}

impl BuiltInTableBuilder {
    fn push(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
        let id = SymbolId::new(self.table.symbols.len() as u32);
        self.table.symbols.push(Symbol {
            id,
            name: name.to_string(),
            loc: SourceLoc::default(),
            kind,
            origin: SymbolOrigin::BuiltIn,
        });
        self.table
            .names
            .entry(name.to_string())
            .or_default()
            .push(id);
        id
    }

    /// Predeclared variable. The qualifier is marked built-in.
    pub fn variable(&mut self, name: &str, mut ty: Type) -> SymbolId {
        ty.qualifier.built_in = true;
        self.push(name, SymbolKind::Variable(Variable::new(ty)))
    }

    /// Predeclared `const` with a value, e.g. `gl_MaxDrawBuffers`.
    pub fn constant(&mut self, name: &str, ty: Type, values: Vec<ConstValue>) -> SymbolId {
        let mut ty = ty.with_storage(Storage::Const);
        ty.qualifier.built_in = true;
        self.push(name, SymbolKind::Variable(Variable::constant(ty, values)))
    }

    pub fn function(
        &mut self,
        name: &str,
        return_type: Type,
        params: &[Type],
        op: Option<BuiltInOp>,
    ) -> SymbolId {
        let params = params
            .iter()
            .map(|ty| Param::new(None, ty.clone().with_storage(Storage::In), SourceLoc::default()))
            .collect();
        let mut func = Function::new(name, return_type, params);
        func.op = op;
        func.defined = true;
        self.push(name, SymbolKind::Function(func))
    }

    /// Predeclared block. With an instance name the block is one variable;
    /// without, each field is visible by its own name.
    pub fn block(
        &mut self,
        block_name: &str,
        instance: Option<&str>,
        storage: Storage,
        fields: Vec<Field>,
        array: Option<ArraySizes>,
    ) -> SymbolId {
        let fields = fields
            .into_iter()
            .map(|mut f| {
                f.ty.qualifier.storage = storage;
                f.ty.qualifier.built_in = true;
                f
            })
            .collect();
        let def = std::sync::Arc::new(StructDef::new(block_name, fields));
        let mut ty = Type::structure(def.clone(), true).with_qualifier(Qualifier::new(storage));
        ty.array_sizes = array;
        ty.qualifier.built_in = true;

        match instance {
            Some(name) => self.push(name, SymbolKind::Variable(Variable::new(ty))),
            None => {
                let anon = format!("anon@{}", self.table.symbols.len());
                let container = self.push(&anon, SymbolKind::Variable(Variable::new(ty)));
                for (index, field) in def.fields.iter().enumerate() {
                    self.push(
                        &field.name,
                        SymbolKind::Member {
                            block: container,
                            index,
                        },
                    );
                }
                container
            }
        }
    }

    pub fn build(self) -> BuiltInTable {
        tracing::debug!(symbols = self.table.symbols.len(), "built-in table ready");
        self.table
    }
}
