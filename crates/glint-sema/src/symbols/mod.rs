//! Symbols: variables, functions and anonymous block members, organized in
//! scopes over a shared built-in table.

mod built_ins;
mod stdlib;
mod symbol;
mod table;

#[cfg(test)]
mod symbols_tests;

pub use built_ins::{BuiltInTable, BuiltInTableBuilder};
pub use symbol::{
    Function, Param, Symbol, SymbolId, SymbolKind, SymbolOrigin, Variable, mangle,
};
pub use table::{Lookup, SymbolTable};
