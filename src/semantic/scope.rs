use std::collections::HashMap;
use std::fmt::Display;

use itertools::Itertools;
use log::debug;

use super::types::Type;

pub type ScopeId = usize;

pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Debug, PartialEq, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SymbolEntry {
    pub name: String,
    pub ty: Type,
    pub scope: ScopeId,
    pub line: usize,
    pub column: usize,
}

/// The scope tree of one analysis run and every symbol declared in it,
/// keyed by (declaring scope, name).
#[derive(Debug, PartialEq, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    entries: HashMap<(ScopeId, String), SymbolEntry>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable {
            scopes: vec![Scope { id: GLOBAL_SCOPE, parent: None }],
            entries: HashMap::new(),
        }
    }
}

impl SymbolTable {
    pub fn open_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope { id, parent: Some(parent) });
        debug!("Opened scope {} under {}", id, parent);
        id
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes.get(scope).and_then(|s| s.parent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Every entry, ordered by scope then name
    pub fn entries(&self) -> Vec<&SymbolEntry> {
        self.entries.values()
            .sorted_by(|a, b| (a.scope, &a.name).cmp(&(b.scope, &b.name)))
            .collect()
    }

    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<&SymbolEntry> {
        self.entries.get(&(scope, name.to_string()))
    }

    // Looks in `scope`, then each enclosing scope up to the global one
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<&SymbolEntry> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(entry) = self.lookup_local(id, name) {
                return Some(entry);
            }
            current = self.parent(id);
        }
        None
    }

    /// Adds an entry to its declaring scope, handing back the existing entry
    /// if the name is already taken there.
    pub fn declare(&mut self, entry: SymbolEntry) -> Result<(), &SymbolEntry> {
        let key = (entry.scope, entry.name.clone());
        if self.entries.contains_key(&key) {
            return Err(&self.entries[&key]);
        }

        debug!("Declared `{}`: {} in scope {}", entry.name, entry.ty, entry.scope);
        self.entries.insert(key, entry);
        Ok(())
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in self.entries() {
            writeln!(f, "[{}] {}: {} at {}:{}", entry.scope, entry.name, entry.ty, entry.line, entry.column)?;
        }
        Ok(())
    }
}
