use crate::{Error, Result, Script, ScriptId};

/// Call history of a machine.
///
/// The root frame is the machine's initial script and is never popped, so
/// there is always a top frame to run.
pub(crate) struct FrameStack<S> {
    root: Script<S>,
    above: Vec<Script<S>>,
}

impl<S> FrameStack<S> {
    pub fn new(root: Script<S>) -> Self {
        Self {
            root,
            above: Vec::with_capacity(8),
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.above.len() + 1
    }

    #[inline]
    pub fn top(&self) -> &Script<S> {
        self.above.last().unwrap_or(&self.root)
    }

    #[inline]
    pub fn root(&self) -> &Script<S> {
        &self.root
    }

    pub fn push(&mut self, script: Script<S>) {
        self.above.push(script);
    }

    /// Removes `count` frames from the top. Fails without touching the stack
    /// if that would remove the root frame.
    pub fn pop(&mut self, count: usize) -> Result<()> {
        if count > self.above.len() {
            return Err(Error::StackUnderflow {
                requested: count,
                depth: self.depth(),
            });
        }
        let keep = self.above.len() - count;
        self.above.truncate(keep);
        Ok(())
    }

    /// Depth of the first frame with the given identity, counting from the
    /// top (0 = top).
    pub fn find(&self, id: ScriptId) -> Option<usize> {
        self.iter().position(|script| script.id() == id)
    }

    /// Frames from the top down.
    pub fn iter(&self) -> impl Iterator<Item = &Script<S>> {
        self.above.iter().rev().chain(std::iter::once(&self.root))
    }

    pub fn clear(&mut self) {
        self.above.clear();
    }
}
