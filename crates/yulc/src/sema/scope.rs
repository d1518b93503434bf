//! Scope tree for name resolution
//!
//! Scopes live in an arena owned by [`ScopeTree`] and point to their parent
//! by [`ScopeId`]. Function bodies get a virtual scope for parameters and
//! return variables that is marked as a function scope: variables declared
//! outside of it are not visible from within.

use rustc_hash::FxHashMap;

use crate::names::{NameId, Type};

/// Index of a scope in its [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Something a name can be bound to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeIdentifier {
    Variable { ty: Type },
    Function { arguments: Vec<Type>, returns: Vec<Type> },
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    /// Parameters and return variables of a function; blocks lookups of
    /// outer variables
    pub function_scope: bool,
    identifiers: FxHashMap<NameId, ScopeIdentifier>,
}

impl Scope {
    /// Returns false if the name is already bound in this scope
    pub fn register_variable(&mut self, name: NameId, ty: Type) -> bool {
        if self.identifiers.contains_key(&name) {
            return false;
        }
        self.identifiers.insert(name, ScopeIdentifier::Variable { ty });
        true
    }

    /// Returns false if the name is already bound in this scope
    pub fn register_function(&mut self, name: NameId, arguments: Vec<Type>, returns: Vec<Type>) -> bool {
        if self.identifiers.contains_key(&name) {
            return false;
        }
        self.identifiers
            .insert(name, ScopeIdentifier::Function { arguments, returns });
        true
    }

    pub fn get(&self, name: NameId) -> Option<&ScopeIdentifier> {
        self.identifiers.get(&name)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn add(&mut self, parent: Option<ScopeId>, function_scope: bool) -> ScopeId {
        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or_else(|_| panic!("too many scopes")));
        self.scopes.push(Scope {
            parent,
            function_scope,
            identifiers: FxHashMap::default(),
        });
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Resolves `name` starting at `from` and walking up the parents.
    ///
    /// Functions are visible across function boundaries; a variable found
    /// after such a boundary was crossed ends the search without a result.
    pub fn lookup(&self, from: ScopeId, name: NameId) -> Option<(ScopeId, &ScopeIdentifier)> {
        let mut crossed_function = false;
        let mut current = Some(from);
        while let Some(id) = current {
            let scope = self.get(id);
            if let Some(identifier) = scope.get(name) {
                return match identifier {
                    ScopeIdentifier::Variable { .. } if crossed_function => None,
                    _ => Some((id, identifier)),
                };
            }
            if scope.function_scope {
                crossed_function = true;
            }
            current = scope.parent;
        }
        None
    }

    /// True if `scope` or one of its ancestors is a function scope
    pub fn inside_function(&self, scope: ScopeId) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.get(id);
            if scope.function_scope {
                return true;
            }
            current = scope.parent;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(index: usize) -> NameId {
        NameId::from_index(index)
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut tree = ScopeTree::default();
        let root = tree.add(None, false);
        let scope = tree.get_mut(root);
        assert!(scope.register_variable(name(10), name(1)));
        assert!(!scope.register_variable(name(10), name(1)));
        assert!(!scope.register_function(name(10), vec![], vec![]));
        assert!(scope.register_function(name(11), vec![name(1)], vec![]));
        assert_eq!(scope.len(), 2);
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut tree = ScopeTree::default();
        let root = tree.add(None, false);
        let inner = tree.add(Some(root), false);
        tree.get_mut(root).register_variable(name(10), name(1));

        let (found_in, identifier) = tree.lookup(inner, name(10)).unwrap();
        assert_eq!(found_in, root);
        assert_eq!(*identifier, ScopeIdentifier::Variable { ty: name(1) });
        assert!(tree.lookup(inner, name(12)).is_none());
    }

    #[test]
    fn test_function_scope_hides_outer_variables() {
        let mut tree = ScopeTree::default();
        let root = tree.add(None, false);
        tree.get_mut(root).register_variable(name(10), name(1));
        tree.get_mut(root).register_function(name(11), vec![], vec![]);
        let virtual_scope = tree.add(Some(root), true);
        let body = tree.add(Some(virtual_scope), false);

        assert!(tree.lookup(body, name(10)).is_none());
        assert!(matches!(
            tree.lookup(body, name(11)),
            Some((_, ScopeIdentifier::Function { .. }))
        ));
        assert!(tree.inside_function(body));
        assert!(!tree.inside_function(root));
    }

    #[test]
    fn test_parameters_visible_in_body() {
        let mut tree = ScopeTree::default();
        let root = tree.add(None, false);
        let virtual_scope = tree.add(Some(root), true);
        tree.get_mut(virtual_scope).register_variable(name(10), name(1));
        let body = tree.add(Some(virtual_scope), false);
        assert_eq!(tree.lookup(body, name(10)).map(|(id, _)| id), Some(virtual_scope));
    }
}
