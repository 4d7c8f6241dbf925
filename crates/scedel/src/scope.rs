//! Lexical scope frames threaded through evaluation.
use ahash::AHashMap;
use serde_json::Value;

/// An immutable lexical frame: the document root, the value evaluation is
/// anchored at, the enclosing value, and the variables in view.
///
/// Frames are derived, never mutated; entering a child never changes the
/// parent's bindings.
#[derive(Clone, Debug)]
pub(crate) struct Scope<'v> {
    root: &'v Value,
    current: &'v Value,
    parent: Option<&'v Value>,
    variables: AHashMap<String, Value>,
}

impl<'v> Scope<'v> {
    /// The frame seeded at the start of a validation call: `current` is the
    /// whole document and there is no parent.
    pub(crate) fn new(root: &'v Value) -> Self {
        Scope {
            root,
            current: root,
            parent: None,
            variables: AHashMap::new(),
        }
    }

    #[inline]
    pub(crate) fn root(&self) -> &'v Value {
        self.root
    }

    #[inline]
    pub(crate) fn current(&self) -> &'v Value {
        self.current
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<&'v Value> {
        self.parent
    }

    pub(crate) fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub(crate) fn variables(&self) -> &AHashMap<String, Value> {
        &self.variables
    }

    /// Derive the frame for a child value: `current` moves to `current`'s
    /// child, the old `current` becomes the parent.
    pub(crate) fn child<'c>(&self, current: &'c Value) -> Scope<'c>
    where
        'v: 'c,
    {
        Scope {
            root: self.root,
            current,
            parent: Some(self.current),
            variables: self.variables.clone(),
        }
    }

    /// Derive the frame a user-defined validator body runs in: `current` is
    /// the value under validation, the enclosing value becomes the parent,
    /// and each bound argument is visible under its name and its `$`-form.
    pub(crate) fn enter_validator<'c>(
        &self,
        current: &'c Value,
        bindings: impl IntoIterator<Item = (String, Value)>,
    ) -> Scope<'c>
    where
        'v: 'c,
    {
        let mut scope = self.child(current);
        scope.extend(bindings);
        scope
    }

    /// A copy of this frame with extra variables in view. Used to evaluate
    /// parameter defaults against already-bound arguments.
    pub(crate) fn augmented(&self, bindings: impl IntoIterator<Item = (String, Value)>) -> Scope<'v> {
        let mut scope = self.clone();
        scope.extend(bindings);
        scope
    }

    fn extend(&mut self, bindings: impl IntoIterator<Item = (String, Value)>) {
        for (name, value) in bindings {
            let sigiled = if name.starts_with('$') {
                name.clone()
            } else {
                format!("${name}")
            };
            self.variables.insert(sigiled, value.clone());
            self.variables.insert(name, value);
        }
    }
}
