//! Unit tests for the scope stack.

use pretty_assertions::assert_eq;

use super::scope::{scoped, ScopeError, ScopeStack};

#[test]
fn test_declare_and_lookup() {
    let mut scope = ScopeStack::new();
    scope.declare("a", 1).unwrap();

    assert_eq!(scope.lookup("a"), Some(&1));
    assert_eq!(scope.lookup("b"), None);
}

#[test]
fn test_redeclaration_in_same_frame() {
    let mut scope = ScopeStack::new();
    scope.declare("a", 1).unwrap();

    assert_eq!(
        scope.declare("a", 2),
        Err(ScopeError::Redeclaration {
            name: "a".to_string()
        })
    );
    assert_eq!(scope.lookup("a"), Some(&1));
}

#[test]
fn test_shadowing_resolves_inner_then_outer() {
    let mut scope = ScopeStack::new();
    scope.declare("a", "outer").unwrap();

    scope.enter();
    scope.declare("a", "inner").unwrap();
    assert_eq!(scope.lookup("a"), Some(&"inner"));
    scope.exit().unwrap();

    assert_eq!(scope.lookup("a"), Some(&"outer"));
}

#[test]
fn test_global_frame_is_never_popped() {
    let mut scope: ScopeStack<()> = ScopeStack::new();
    assert_eq!(scope.exit(), Err(ScopeError::Underflow));
    assert_eq!(scope.depth(), 1);
}

#[test]
fn test_declare_global_from_nested_frame() {
    let mut scope = ScopeStack::new();
    scope.enter();
    scope.declare_global("f", 0).unwrap();
    assert!(!scope.is_declared_in_current("f"));
    scope.exit().unwrap();

    assert!(scope.is_declared_in_current("f"));
    assert_eq!(scope.lookup("f"), Some(&0));
}

#[test]
fn test_scoped_restores_depth_on_success() {
    let mut scope: ScopeStack<i32> = ScopeStack::new();
    let result: Result<i32, ScopeError> = scoped(&mut scope, |scope| {
        scope.declare("x", 5)?;
        Ok(*scope.lookup("x").unwrap())
    });

    assert_eq!(result, Ok(5));
    assert_eq!(scope.depth(), 1);
    assert_eq!(scope.lookup("x"), None);
}

#[test]
fn test_scoped_restores_depth_on_failure() {
    let mut scope: ScopeStack<i32> = ScopeStack::new();
    let result: Result<(), ScopeError> = scoped(&mut scope, |scope| {
        scope.declare("x", 1)?;
        scope.enter();
        scope.declare("y", 2)?;
        scope.declare("y", 3)?;
        Ok(())
    });

    assert!(result.is_err());
    assert_eq!(scope.depth(), 1);
    assert_eq!(scope.lookup("x"), None);
    assert_eq!(scope.lookup("y"), None);
}
