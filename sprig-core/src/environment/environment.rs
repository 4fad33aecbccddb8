use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::value::{Value, ValueKind};

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub immutable: bool,
}

/// One table in a scope chain. Environments are shared (`Rc<RefCell<_>>`)
/// so that closures alias the scopes they captured and observe each other's
/// assignments.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Binding>,
    parent: Option<Rc<RefCell<Environment>>>,
}

/// What `assign` found when it overwrote a binding; the interpreter turns
/// these into warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignOutcome {
    pub reassigned_let: bool,
    pub previous_kind: ValueKind,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            parent: Some(parent),
        }))
    }

    /// Insert a new binding. Fails when the name already exists in this
    /// table; shadowing an outer scope is fine.
    pub fn declare(&mut self, name: &str, value: Value, immutable: bool) -> bool {
        if self.store.contains_key(name) {
            return false;
        }

        self.store.insert(name.to_string(), Binding { value, immutable });
        true
    }

    /// Class bodies append duplicates instead of failing; the newer binding
    /// replaces the older one.
    pub fn declare_or_replace(&mut self, name: &str, value: Value, immutable: bool) {
        self.store.insert(name.to_string(), Binding { value, immutable });
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        match self.store.get(name) {
            Some(binding) => Some(binding.value.clone()),
            None => self.parent.as_ref().and_then(|parent| parent.borrow().get(name)),
        }
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.store.get(name).map(|binding| binding.value.clone())
    }

    /// Overwrite `name` in the first table of the chain that holds it.
    /// The write is visible to every holder of that environment; this is
    /// what makes closures over mutable state work. `None` means the name
    /// is not declared anywhere in the chain.
    pub fn assign(
        env: &Rc<RefCell<Environment>>,
        name: &str,
        value: Value
    ) -> Option<AssignOutcome> {
        let mut current = Rc::clone(env);

        loop {
            let parent = {
                let mut table = current.borrow_mut();

                if let Some(binding) = table.store.get_mut(name) {
                    let outcome = AssignOutcome {
                        reassigned_let: binding.immutable,
                        previous_kind: binding.value.kind(),
                    };

                    binding.value = value;
                    return Some(outcome);
                }

                table.parent.clone()
            };

            match parent {
                Some(parent) => current = parent,
                None => return None,
            }
        }
    }
}
