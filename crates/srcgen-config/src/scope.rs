//! Variable scopes and name-based identity.
//!
//! Every configuration node owns a [`Scope`]: its locally declared
//! variables plus the map resolved from them and everything its ancestors
//! resolved. Resolved maps only ever flow from parent to child.

use serde::Serialize;
use std::collections::HashMap;

use crate::ConfigResult;
use crate::variables::{Variable, replace_vars, resolve};

/// Identity key of a configuration entity.
///
/// Entities with equal names are interchangeable for lookups, whatever
/// their other fields hold.
pub trait Named {
    fn name(&self) -> &str;
}

/// Implement `PartialEq`, `Eq` and `Hash` in terms of [`Named::name`].
macro_rules! name_identity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    $crate::scope::Named::name(self) == $crate::scope::Named::name(other)
                }
            }

            impl Eq for $ty {}

            impl std::hash::Hash for $ty {
                fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                    std::hash::Hash::hash($crate::scope::Named::name(self), state);
                }
            }
        )*
    };
}

pub(crate) use name_identity;

pub fn find_by_name<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == name)
}

pub fn find_by_name_mut<'a, T: Named>(items: &'a mut [T], name: &str) -> Option<&'a mut T> {
    items.iter_mut().find(|item| item.name() == name)
}

pub fn contains_name<T: Named>(items: &[T], name: &str) -> bool {
    find_by_name(items, name).is_some()
}

/// Replace the entry with the same name in place, or append.
///
/// Returns the replaced entry.
pub fn replace_or_insert<T: Named>(items: &mut Vec<T>, item: T) -> Option<T> {
    match items.iter().position(|existing| existing.name() == item.name()) {
        Some(index) => Some(std::mem::replace(&mut items[index], item)),
        None => {
            items.push(item);
            None
        }
    }
}

/// Local variables of a node and the map resolved for it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Scope {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    variables: Vec<Variable>,
    #[serde(skip)]
    resolved: HashMap<String, String>,
}

impl Scope {
    pub fn new(variables: Vec<Variable>) -> Self {
        Self {
            variables,
            resolved: HashMap::new(),
        }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Declare a variable, replacing one with the same name.
    pub fn set_variable(&mut self, variable: Variable) {
        replace_or_insert(&mut self.variables, variable);
    }

    /// The resolved map. Empty until [`Scope::inherit`] has run.
    pub fn var_map(&self) -> &HashMap<String, String> {
        &self.resolved
    }

    /// Combine the local variables with the parent's resolved map.
    ///
    /// Each local value gets one substitution pass against the map built so
    /// far and is stored back into the variable. The combined set is then
    /// resolved so local variables may reference each other. Local names
    /// shadow inherited ones.
    pub fn inherit(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        let mut combined = parent.clone();
        for variable in &mut self.variables {
            let value = replace_vars(variable.value()?, &combined);
            variable.set_value(value.clone());
            combined.insert(variable.name().to_string(), value);
        }
        self.resolved = resolve(&combined)?.resolved;
        Ok(())
    }

    /// Substitute the resolved variables into `text`.
    pub fn replace(&self, text: &str) -> String {
        replace_vars(text, &self.resolved)
    }

    pub fn replace_in_place(&self, field: &mut String) {
        *field = self.replace(field);
    }

    pub fn replace_opt_in_place(&self, field: &mut Option<String>) {
        if let Some(text) = field {
            *text = self.replace(text);
        }
    }
}

/// A configuration node owning a [`Scope`].
pub trait ScopeNode {
    fn scope(&self) -> &Scope;

    fn scope_mut(&mut self) -> &mut Scope;

    /// Resolve this node's variables on top of the parent's map.
    fn inherit_variables(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        self.scope_mut().inherit(parent)
    }

    fn var_map(&self) -> &HashMap<String, String> {
        self.scope().var_map()
    }
}

/// Implement [`ScopeNode`] for types with a `scope` field.
macro_rules! scope_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::scope::ScopeNode for $ty {
                fn scope(&self) -> &$crate::scope::Scope {
                    &self.scope
                }

                fn scope_mut(&mut self) -> &mut $crate::scope::Scope {
                    &mut self.scope
                }
            }
        )*
    };
}

pub(crate) use scope_node;
