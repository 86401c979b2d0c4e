use std::collections::HashMap;
use std::rc::Rc;

use gc::{Finalize, Gc, GcCell, Trace};

use crate::object::Object;

#[derive(Debug, Trace, Finalize)]
pub struct EnvironmentCore {
    store: HashMap<Rc<str>, Gc<Object>>,
    outer: Option<Environment>,
}

/// A scope in the lookup chain. Cloning shares the scope.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct Environment {
    environment: Gc<GcCell<EnvironmentCore>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            environment: Gc::new(GcCell::new(EnvironmentCore {
                store: HashMap::new(),
                outer: None,
            })),
        }
    }

    pub fn new_enclosed(outer: &Environment) -> Environment {
        Environment {
            environment: Gc::new(GcCell::new(EnvironmentCore {
                store: HashMap::new(),
                outer: Some(outer.clone()),
            })),
        }
    }

    pub fn get(&self, key: &str) -> Option<Gc<Object>> {
        let env = self.environment.borrow();
        match env.store.get(key) {
            Some(value) => Some(value.clone()),
            None => env.outer.as_ref().and_then(|outer| outer.get(key)),
        }
    }

    pub fn contains_local(&self, key: &str) -> bool {
        self.environment.borrow().store.contains_key(key)
    }

    /// Binds `key` in this scope, shadowing any outer binding.
    pub fn set(&self, key: Rc<str>, value: Gc<Object>) {
        self.environment.borrow_mut().store.insert(key, value);
    }

    /// Overwrites `key` in the nearest scope that defines it. Returns false
    /// when no scope in the chain does.
    pub fn assign(&self, key: &str, value: Gc<Object>) -> bool {
        let mut env = self.environment.borrow_mut();
        if let Some(slot) = env.store.get_mut(key) {
            *slot = value;
            return true;
        }
        match &env.outer {
            Some(outer) => outer.assign(key, value),
            None => false,
        }
    }

    pub fn names(&self) -> Vec<Rc<str>> {
        let env = self.environment.borrow();
        let mut names = env
            .outer
            .as_ref()
            .map(|outer| outer.names())
            .unwrap_or_default();
        names.extend(env.store.keys().cloned());
        names.sort();
        names.dedup();
        names
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.environment, &other.environment)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
