//! Scoped symbol table over a shared, read-only built-in table.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use glint_core::SourceLoc;

use crate::types::Type;

use super::built_ins::BuiltInTable;
use super::symbol::{Symbol, SymbolId, SymbolKind, SymbolOrigin, Variable};

/// One lexical scope.
#[derive(Debug, Default, Clone)]
struct Level {
    names: IndexMap<String, SymbolId>,
    functions: IndexMap<String, Vec<SymbolId>>,
}

impl Level {
    fn find(&self, name: &str) -> Option<SymbolId> {
        self.names
            .get(name)
            .copied()
            .or_else(|| self.functions.get(name).and_then(|f| f.first().copied()))
    }
}

/// Result of a name lookup.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Lookup {
    pub id: SymbolId,
    /// Found in the innermost open scope.
    pub current_scope: bool,
    /// Found in the shared built-in table, not yet copied up.
    pub built_in: bool,
}

/// Symbols of one compilation.
///
/// Level 0 is the user global scope; the built-in table sits below it and
/// is never mutated. Mutating a built-in goes through [`SymbolTable::copy_up`].
#[derive(Debug, Clone)]
pub struct SymbolTable {
    built_ins: Arc<BuiltInTable>,
    symbols: Vec<Symbol>,
    levels: Vec<Level>,
    /// Built-in id to the id of its user-level copy.
    copies: IndexMap<SymbolId, SymbolId>,
    /// Built-in names removed by a block redeclaration.
    hidden: IndexSet<String>,
    anonymous: u32,
}

impl SymbolTable {
    pub fn new(built_ins: Arc<BuiltInTable>) -> Self {
        Self {
            built_ins,
            symbols: Vec::new(),
            levels: vec![Level::default()],
            copies: IndexMap::new(),
            hidden: IndexSet::new(),
            anonymous: 0,
        }
    }

    pub fn built_ins(&self) -> &BuiltInTable {
        &self.built_ins
    }

    pub fn push_scope(&mut self) {
        self.levels.push(Level::default());
        tracing::trace!(depth = self.levels.len(), "push scope");
    }

    pub fn pop_scope(&mut self) {
        if self.levels.len() > 1 {
            self.levels.pop();
        }
        tracing::trace!(depth = self.levels.len(), "pop scope");
    }

    /// Number of open user scopes; 1 at global scope.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn at_global_level(&self) -> bool {
        self.levels.len() == 1
    }

    pub fn is_built_in(&self, id: SymbolId) -> bool {
        id.index() < self.built_ins.len()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        match id.index().checked_sub(self.built_ins.len()) {
            Some(user) => &self.symbols[user],
            None => self.built_ins.get(id),
        }
    }

    /// Mutable access to a user symbol; built-ins must be copied up first.
    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        let user = id.index().checked_sub(self.built_ins.len())?;
        self.symbols.get_mut(user)
    }

    /// Type of a variable or anonymous block member.
    pub fn variable_type(&self, id: SymbolId) -> Option<&Type> {
        match &self.get(id).kind {
            SymbolKind::Variable(var) => Some(&var.ty),
            SymbolKind::Member { block, index } => {
                let block = self.get(*block).as_variable()?;
                block.ty.fields().get(*index).map(|f| &f.ty)
            }
            SymbolKind::Function(_) => None,
        }
    }

    fn allocate(
        &mut self,
        name: &str,
        loc: SourceLoc,
        kind: SymbolKind,
        origin: SymbolOrigin,
    ) -> SymbolId {
        let id = SymbolId::new((self.built_ins.len() + self.symbols.len()) as u32);
        self.symbols.push(Symbol {
            id,
            name: name.to_string(),
            loc,
            kind,
            origin,
        });
        id
    }

    fn current(&mut self) -> &mut Level {
        let last = self.levels.len() - 1;
        &mut self.levels[last]
    }

    /// Insert into the innermost scope.
    ///
    /// Fails with the conflicting symbol when the name is already used in
    /// that scope. Functions may share a name as long as their signatures
    /// differ, but never with a variable.
    pub fn insert(
        &mut self,
        name: &str,
        loc: SourceLoc,
        kind: SymbolKind,
    ) -> Result<SymbolId, SymbolId> {
        let level = self.levels.len() - 1;
        if let Some(existing) = self.levels[level].names.get(name) {
            return Err(*existing);
        }
        match &kind {
            SymbolKind::Function(func) => {
                let overloads = self.levels[level]
                    .functions
                    .get(name)
                    .cloned()
                    .unwrap_or_default();
                let same = overloads.into_iter().find(|&id| {
                    self.get(id)
                        .as_function()
                        .is_some_and(|f| f.mangled == func.mangled)
                });
                if let Some(same) = same {
                    return Err(same);
                }
                let id = self.allocate(name, loc, kind, SymbolOrigin::Declared);
                self.current()
                    .functions
                    .entry(name.to_string())
                    .or_default()
                    .push(id);
                Ok(id)
            }
            _ => {
                let function = self.levels[level]
                    .functions
                    .get(name)
                    .and_then(|f| f.first());
                if let Some(first) = function {
                    return Err(*first);
                }
                let id = self.allocate(name, loc, kind, SymbolOrigin::Declared);
                self.current().names.insert(name.to_string(), id);
                Ok(id)
            }
        }
    }

    /// Insert the hidden container of an anonymous block; members are
    /// inserted separately by name.
    pub fn insert_anonymous(&mut self, loc: SourceLoc, var: Variable) -> SymbolId {
        let name = format!("anon@{}", self.anonymous);
        self.anonymous += 1;
        let id = self.allocate(&name, loc, SymbolKind::Variable(var), SymbolOrigin::Declared);
        self.current().names.insert(name, id);
        id
    }

    /// Innermost symbol with this name, user scopes first, then built-ins.
    pub fn lookup(&self, name: &str) -> Option<Lookup> {
        let innermost = self.levels.len() - 1;
        for (depth, level) in self.levels.iter().enumerate().rev() {
            if let Some(id) = level.find(name) {
                return Some(Lookup {
                    id,
                    current_scope: depth == innermost,
                    built_in: false,
                });
            }
        }
        if self.hidden.contains(name) {
            return None;
        }
        self.built_ins.lookup(name).map(|id| Lookup {
            id,
            current_scope: false,
            built_in: true,
        })
    }

    /// All overloads visible under `name`: user declarations first, then
    /// built-ins whose signature no user function replaces.
    pub fn find_functions(&self, name: &str) -> Vec<SymbolId> {
        let mut found: Vec<SymbolId> = Vec::new();
        for level in self.levels.iter().rev() {
            if let Some(overloads) = level.functions.get(name) {
                found.extend(overloads);
            }
        }
        let user: IndexSet<&str> = found
            .iter()
            .filter_map(|&id| self.get(id).as_function().map(|f| f.mangled.as_str()))
            .collect();
        let built_in: Vec<SymbolId> = self
            .built_ins
            .overloads(name)
            .iter()
            .copied()
            .filter(|&id| {
                self.get(id)
                    .as_function()
                    .is_some_and(|f| !user.contains(f.mangled.as_str()))
            })
            .collect();
        found.extend(built_in);
        found
    }

    /// Clone a built-in into the user global level so it can be mutated.
    ///
    /// Returns the id of the copy, creating it on first call. Copying an
    /// anonymous block member copies the whole block with its members.
    /// User symbols are returned unchanged.
    pub fn copy_up(&mut self, id: SymbolId) -> SymbolId {
        if !self.is_built_in(id) {
            return id;
        }
        if let Some(&copy) = self.copies.get(&id) {
            return copy;
        }

        let original = self.built_ins.get(id).clone();
        if let SymbolKind::Member { block, .. } = original.kind {
            self.copy_up(block);
            return self.copies.get(&id).copied().unwrap_or(id);
        }

        let copy = self.allocate(
            &original.name,
            original.loc,
            original.kind,
            SymbolOrigin::CopiedUp,
        );
        self.levels[0].names.insert(original.name.clone(), copy);
        self.copies.insert(id, copy);
        tracing::debug!(name = %original.name, from = %id, to = %copy, "copy up built-in");

        let members: Vec<SymbolId> = self.built_ins.members_of(id).collect();
        for member in members {
            let source = self.built_ins.get(member).clone();
            let SymbolKind::Member { index, .. } = source.kind else {
                continue;
            };
            let member_copy = self.allocate(
                &source.name,
                source.loc,
                SymbolKind::Member { block: copy, index },
                SymbolOrigin::CopiedUp,
            );
            self.levels[0].names.insert(source.name.clone(), member_copy);
            self.copies.insert(member, member_copy);
        }
        copy
    }

    /// The user-level copy of a built-in, if one was made.
    pub fn copy_of(&self, id: SymbolId) -> Option<SymbolId> {
        self.copies.get(&id).copied()
    }

    /// Mark a copied-up built-in as redeclared by the user.
    pub fn mark_declared(&mut self, id: SymbolId) {
        if let Some(symbol) = self.get_mut(id) {
            symbol.origin = SymbolOrigin::Declared;
        }
    }

    /// Remove a name from the user global level and stop it from resolving
    /// to a built-in.
    pub fn hide(&mut self, name: &str) {
        self.levels[0].names.shift_remove(name);
        self.hidden.insert(name.to_string());
    }

    /// User global scope: variables and types, then functions.
    pub fn globals(&self) -> impl Iterator<Item = &Symbol> {
        let level = &self.levels[0];
        level
            .names
            .values()
            .chain(level.functions.values().flatten())
            .map(|&id| self.get(id))
    }

    /// All user-level symbols ever created, including inner scopes.
    pub fn user_symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Top-level declarations made by user source, counting each function
    /// signature once and anonymous block members not at all.
    pub fn declared_count(&self) -> usize {
        self.globals()
            .filter(|s| s.origin == SymbolOrigin::Declared)
            .filter(|s| !matches!(s.kind, SymbolKind::Member { .. }))
            .count()
    }
}
