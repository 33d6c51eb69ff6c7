use std::{collections::HashMap, sync::Arc};

use crate::{Error, Result, Script, ScriptId, internal::FrameStack};

/// Labels assigned to scripts, used to jump to them later.
pub(crate) struct NameRegistry<S> {
    names: HashMap<Arc<str>, Script<S>>,
}

impl<S> NameRegistry<S> {
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Binds `label` to `script`, replacing any earlier binding.
    pub fn bind(&mut self, label: &str, script: Script<S>) -> Result<()> {
        validate(label)?;
        match self.names.get_mut(label) {
            Some(bound) => *bound = script,
            None => {
                self.names.insert(Arc::from(label), script);
            }
        }
        Ok(())
    }

    pub fn resolve(&self, label: &str) -> Result<&Script<S>> {
        validate(label)?;
        self.names
            .get(label)
            .ok_or_else(|| Error::UnknownLabel(Arc::from(label)))
    }

    /// Depth (0 = top) of the nearest frame running the script bound to `label`.
    pub fn find_in_stack(&self, label: &str, stack: &FrameStack<S>) -> Result<usize> {
        let id = self.resolve(label)?.id();
        stack
            .find(id)
            .ok_or_else(|| Error::LabelNotInStack(Arc::from(label)))
    }

    /// First label bound to the given script, if any.
    pub fn label_of(&self, id: ScriptId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, script)| script.id() == id)
            .map(|(label, _)| label.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }
}

fn validate(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::InvalidLabel);
    }
    Ok(())
}
