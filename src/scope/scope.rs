use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
    #[error("{name:?} already declared in the current scope")]
    Redeclaration { name: String },
    #[error("attempted to exit the global scope")]
    Underflow,
}

/// One level of name bindings.
#[derive(Debug)]
struct Frame<T> {
    bindings: HashMap<String, T>,
}

impl<T> Frame<T> {
    fn new() -> Self {
        Frame {
            bindings: HashMap::new(),
        }
    }
}

/// A stack of lexical frames. The bottom frame is the global frame and is
/// never popped.
#[derive(Debug)]
pub struct ScopeStack<T> {
    frames: Vec<Frame<T>>,
}

impl<T> Default for ScopeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScopeStack<T> {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![Frame::new()],
        }
    }

    pub fn enter(&mut self) {
        self.frames.push(Frame::new());
        trace!(depth = self.frames.len(), "enter scope");
    }

    pub fn exit(&mut self) -> Result<(), ScopeError> {
        if self.frames.len() <= 1 {
            return Err(ScopeError::Underflow);
        }
        self.frames.pop();
        trace!(depth = self.frames.len(), "exit scope");
        Ok(())
    }

    /// Number of frames, including the global one.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Binds `name` in the innermost frame. Shadowing an outer binding is fine.
    pub fn declare(&mut self, name: impl Into<String>, value: T) -> Result<(), ScopeError> {
        let name = name.into();
        let frame = self.frames.last_mut().ok_or(ScopeError::Underflow)?;
        if frame.bindings.contains_key(&name) {
            return Err(ScopeError::Redeclaration { name });
        }
        frame.bindings.insert(name, value);
        Ok(())
    }

    /// Binds `name` in the global frame regardless of the current depth.
    pub fn declare_global(&mut self, name: impl Into<String>, value: T) -> Result<(), ScopeError> {
        let name = name.into();
        let frame = self.frames.first_mut().ok_or(ScopeError::Underflow)?;
        if frame.bindings.contains_key(&name) {
            return Err(ScopeError::Redeclaration { name });
        }
        frame.bindings.insert(name, value);
        Ok(())
    }

    /// Nearest enclosing binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name))
    }

    pub fn is_declared_in_current(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.bindings.contains_key(name))
    }
}

/// Anything that owns a scope stack and wants to run work inside a nested frame.
pub trait ScopeOwner {
    type Binding;

    fn scope_mut(&mut self) -> &mut ScopeStack<Self::Binding>;
}

impl<T> ScopeOwner for ScopeStack<T> {
    type Binding = T;

    fn scope_mut(&mut self) -> &mut ScopeStack<T> {
        self
    }
}

/// Runs `body` inside a fresh frame. The frame is popped on every path out,
/// so a failure inside `body` never leaks bindings into sibling constructs.
pub fn scoped<S, R, E>(owner: &mut S, body: impl FnOnce(&mut S) -> Result<R, E>) -> Result<R, E>
where
    S: ScopeOwner,
    E: From<ScopeError>,
{
    let depth = owner.scope_mut().depth();
    owner.scope_mut().enter();

    let result = body(owner);

    let scope = owner.scope_mut();
    while scope.depth() > depth {
        scope.exit()?;
    }

    result
}
