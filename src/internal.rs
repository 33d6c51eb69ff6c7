mod frame_stack;
mod name_registry;
mod observers;

pub(crate) use frame_stack::FrameStack;
pub(crate) use name_registry::NameRegistry;
pub(crate) use observers::Observers;
