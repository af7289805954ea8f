use std::{collections::HashMap, rc::Rc};

use crate::ast::Procedure;

/// The variable scopes: the global one, then one per active procedure call.
#[derive(Debug)]
pub struct Scopes {
    // Invariant: this is always non-empty, and the first entry is the global scope.
    stack: Vec<HashMap<String, i32>>,
}

impl Default for Scopes {
    fn default() -> Self {
        Scopes {
            stack: vec![HashMap::new()],
        }
    }
}

impl Scopes {
    /// Looks through the innermost scope first, and the global scope last.
    pub fn get(&self, name: &str) -> Option<i32> {
        self.stack
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    pub fn set_global(&mut self, name: &str, value: i32) {
        self.stack[0].insert(name.to_owned(), value);
    }

    pub fn set_local(&mut self, name: &str, value: i32) {
        if let Some(scope) = self.stack.last_mut() {
            scope.insert(name.to_owned(), value);
        }
    }

    pub fn push(&mut self, locals: HashMap<String, i32>) {
        self.stack.push(locals);
    }

    /// Drops the innermost scope. The global scope is never popped.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Name to definition bindings, captured at the start of a unit so that they can be restored.
#[derive(Clone, Debug, Default)]
pub struct Shadow {
    bindings: HashMap<String, Rc<Procedure>>,
}

#[derive(Clone, Debug, Default)]
pub struct FunctionTable {
    table: HashMap<String, Rc<Procedure>>,
}

impl FunctionTable {
    /// Binds `proc` to its name, returning whatever was bound there before.
    pub fn insert(&mut self, proc: Rc<Procedure>) -> Option<Rc<Procedure>> {
        self.table.insert(proc.name.clone(), proc)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Procedure>> {
        self.table.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn shadow(&self) -> Shadow {
        Shadow {
            bindings: self.table.clone(),
        }
    }

    /// Undo everything that happened since `shadow` was taken: names that weren't there are
    /// removed, and names that were there get their old definitions back.
    pub fn restore(&mut self, shadow: Shadow) {
        let Shadow { bindings } = shadow;
        self.table.retain(|name, _| bindings.contains_key(name));
        for (name, proc) in bindings {
            self.table.insert(name, proc);
        }
    }
}
