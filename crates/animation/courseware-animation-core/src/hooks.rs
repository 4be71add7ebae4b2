//! Named callback registry.
//!
//! Authored content refers to callbacks by dotted name (`startFunction`,
//! `endFunction`, page hooks). Content scripts register those names here;
//! calling a name nobody registered is a silent no-op.

use std::fmt;

use hashbrown::HashMap;

use crate::host::Target;
use crate::ids::ElementId;

type Callback<C> = Box<dyn FnMut(&mut C)>;

pub struct CallbackRegistry<C> {
    entries: HashMap<String, Callback<C>>,
}

impl<C> Default for CallbackRegistry<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C> fmt::Debug for CallbackRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("CallbackRegistry")
            .field("names", &names)
            .finish()
    }
}

fn canonical(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("window.").unwrap_or(name)
}

impl<C> CallbackRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a callback under `name`.
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: FnMut(&mut C) + 'static,
    {
        self.entries.insert(canonical(name).to_string(), Box::new(f));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.entries.remove(canonical(name)).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(canonical(name))
    }

    /// Invoke `name` if registered. Returns whether anything ran.
    ///
    /// The callback is taken out of the table for the duration of the call,
    /// so a callback that registers or replaces entries does not alias itself.
    pub fn call(&mut self, name: &str, ctx: &mut C) -> bool {
        let key = canonical(name);
        let Some((key, mut f)) = self.entries.remove_entry(key) else {
            return false;
        };
        f(ctx);
        self.entries.entry(key).or_insert(f);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A follow-up animation requested from inside a hook.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayRequest {
    pub target: Target,
    pub index: Option<i64>,
}

/// Argument handed to `startFunction`/`endFunction` callbacks.
#[derive(Debug)]
pub struct HookContext {
    pub element: ElementId,
    requests: Vec<PlayRequest>,
}

impl HookContext {
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            requests: Vec::new(),
        }
    }

    /// Ask the engine to play `target` after the current play is set up.
    pub fn play(&mut self, target: impl Into<Target>, index: Option<i64>) {
        self.requests.push(PlayRequest {
            target: target.into(),
            index,
        });
    }

    pub fn take_requests(&mut self) -> Vec<PlayRequest> {
        std::mem::take(&mut self.requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn call_registered_and_unknown() {
        let hits = Rc::new(Cell::new(0));
        let mut reg: CallbackRegistry<HookContext> = CallbackRegistry::new();
        let h = hits.clone();
        reg.register("Lesson1.onIntroDone", move |ctx| {
            h.set(h.get() + 1);
            ctx.play("#next", None);
        });

        let mut ctx = HookContext::new(ElementId(3));
        assert!(reg.call("window.Lesson1.onIntroDone", &mut ctx));
        assert!(!reg.call("Lesson1.missing", &mut ctx));
        assert_eq!(hits.get(), 1);
        let reqs = ctx.take_requests();
        assert_eq!(reqs.len(), 1);
        assert_eq!(reqs[0].target, Target::Selector("#next".into()));
        assert!(reg.contains("Lesson1.onIntroDone"));
        assert!(reg.unregister("Lesson1.onIntroDone"));
        assert!(reg.is_empty());
    }
}
