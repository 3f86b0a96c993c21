use std::cell::RefCell;
use std::rc::Rc;

use ecow::EcoString;
use tracing::debug;

use crate::builtins::BUILTINS;
use crate::eval::EvalError;
use crate::value::TlispValue;

/// Shared handle to an environment frame.
///
/// Frames link to their parent through this handle; a frame never holds a
/// handle to one of its children, so chains cannot form cycles.
pub type Env = Rc<RefCell<Environment>>;

/// One frame of bindings plus an optional link to the enclosing frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
  bindings: Vec<(EcoString, TlispValue)>,
  parent: Option<Env>,
}

impl Environment {
  pub fn new() -> Self {
    Self::default()
  }

  /// Root environment with every primitive installed.
  pub fn with_builtins() -> Self {
    let mut env = Self::new();
    for &(name, builtin) in BUILTINS {
      env.define_local(name, TlispValue::Builtin(builtin));
    }
    debug!(count = BUILTINS.len(), "registered builtins");
    env
  }

  pub fn into_shared(self) -> Env {
    Rc::new(RefCell::new(self))
  }

  pub fn is_root(&self) -> bool {
    self.parent.is_none()
  }

  pub fn len(&self) -> usize {
    self.bindings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty()
  }

  /// Bindings of this frame only, in definition order.
  pub fn bindings(&self) -> impl Iterator<Item = (&EcoString, &TlispValue)> {
    self.bindings.iter().map(|(name, value)| (name, value))
  }

  /// Binding in this frame only, without consulting parents.
  pub fn get(&self, name: &str) -> Option<&TlispValue> {
    self
      .bindings
      .iter()
      .find(|(bound, _)| bound.as_str() == name)
      .map(|(_, value)| value)
  }

  /// Resolve `name` through this frame and then its parents.
  pub fn lookup(&self, name: &str) -> Result<TlispValue, EvalError> {
    if let Some(value) = self.get(name) {
      return Ok(value.clone());
    }

    match &self.parent {
      Some(parent) => parent.borrow().lookup(name),
      None => Err(EvalError::UnboundSymbol(name.into())),
    }
  }

  pub fn define_local(&mut self, name: impl Into<EcoString>, value: TlispValue) {
    let name = name.into();
    match self.bindings.iter_mut().find(|(bound, _)| *bound == name) {
      Some((_, slot)) => *slot = value,
      None => self.bindings.push((name, value)),
    }
  }

  pub fn define_global(&mut self, name: impl Into<EcoString>, value: TlispValue) {
    match &self.parent {
      Some(parent) => parent.borrow_mut().define_global(name, value),
      None => self.define_local(name, value),
    }
  }

  /// Call-scoped frame for one closure application: a copy of these bindings
  /// whose parent is the caller's environment.
  pub fn fork_with_parent(&self, parent: &Env) -> Env {
    Environment {
      bindings: self.bindings.clone(),
      parent: Some(Rc::clone(parent)),
    }
    .into_shared()
  }

  /// Bindings a lambda built in this environment closes over.
  ///
  /// Every frame except the root is flattened into a parentless copy, inner
  /// frames shadowing outer ones. The root stays out: it terminates every
  /// caller chain, so globals are found at call time.
  pub fn capture(&self) -> Environment {
    let mut captured = Environment::new();
    self.capture_into(&mut captured);
    captured
  }

  fn capture_into(&self, captured: &mut Environment) {
    let Some(parent) = &self.parent else {
      return;
    };

    parent.borrow().capture_into(captured);
    for (name, value) in &self.bindings {
      captured.define_local(name.clone(), value.clone());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::qexpr;

  fn child_of(parent: &Env) -> Env {
    Environment::new().fork_with_parent(parent)
  }

  #[test]
  fn test_lookup_walks_parents() {
    let root = Environment::new().into_shared();
    root.borrow_mut().define_local("x", 1.into());
    let child = child_of(&root);
    child.borrow_mut().define_local("y", 2.into());

    assert_eq!(child.borrow().lookup("x"), Ok(TlispValue::Number(1)));
    assert_eq!(child.borrow().lookup("y"), Ok(TlispValue::Number(2)));
    assert_eq!(
      root.borrow().lookup("y"),
      Err(EvalError::UnboundSymbol("y".into()))
    );
  }

  #[test]
  fn test_inner_binding_shadows_outer() {
    let root = Environment::new().into_shared();
    root.borrow_mut().define_local("x", 1.into());
    let child = child_of(&root);
    child.borrow_mut().define_local("x", 2.into());

    assert_eq!(child.borrow().lookup("x"), Ok(TlispValue::Number(2)));
    assert_eq!(root.borrow().lookup("x"), Ok(TlispValue::Number(1)));
  }

  #[test]
  fn test_define_local_overwrites_in_place() {
    let mut env = Environment::new();
    env.define_local("a", 1.into());
    env.define_local("b", 2.into());
    env.define_local("a", 3.into());

    let names: Vec<_> = env.bindings().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(env.get("a"), Some(&TlispValue::Number(3)));
  }

  #[test]
  fn test_define_global_reaches_root() {
    let root = Environment::new().into_shared();
    let middle = child_of(&root);
    let leaf = child_of(&middle);

    leaf.borrow_mut().define_global("g", 7.into());

    assert!(leaf.borrow().get("g").is_none());
    assert!(middle.borrow().get("g").is_none());
    assert_eq!(root.borrow().get("g"), Some(&TlispValue::Number(7)));
  }

  #[test]
  fn test_lookup_returns_a_copy() {
    let mut env = Environment::new();
    env.define_local("xs", qexpr![1, 2]);

    let mut copy = env.lookup("xs").expect("xs should be bound");
    if let TlispValue::Qexpr(cells) = &mut copy {
      cells.push(3.into());
    }

    assert_eq!(env.get("xs"), Some(&qexpr![1, 2]));
  }

  #[test]
  fn test_fork_leaves_source_untouched() {
    let caller = Environment::new().into_shared();
    let mut captured = Environment::new();
    captured.define_local("a", 1.into());

    let call = captured.fork_with_parent(&caller);
    call.borrow_mut().define_local("b", 2.into());

    assert!(captured.is_root());
    assert_eq!(captured.len(), 1);
    assert_eq!(call.borrow().len(), 2);
  }

  #[test]
  fn test_capture_skips_root_and_flattens() {
    let root = Environment::with_builtins().into_shared();
    root.borrow_mut().define_local("global", 0.into());
    let outer = child_of(&root);
    outer.borrow_mut().define_local("x", 1.into());
    outer.borrow_mut().define_local("y", 1.into());
    let inner = child_of(&outer);
    inner.borrow_mut().define_local("y", 2.into());

    let captured = inner.borrow().capture();

    assert!(captured.is_root());
    assert_eq!(captured.get("x"), Some(&TlispValue::Number(1)));
    assert_eq!(captured.get("y"), Some(&TlispValue::Number(2)));
    assert!(captured.get("global").is_none());
    assert!(captured.get("+").is_none());
  }

  #[test]
  fn test_root_capture_is_empty() {
    let root = Environment::with_builtins();
    assert!(root.capture().is_empty());
  }

  #[test]
  fn test_builtins_are_registered() {
    let root = Environment::with_builtins();
    for &(name, builtin) in BUILTINS {
      assert_eq!(root.get(name), Some(&TlispValue::Builtin(builtin)));
    }
  }
}
