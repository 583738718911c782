pub mod events;
pub mod input;
pub mod selection;

pub use events::{EditorEvent, EventBus, SubscriptionId};
pub use input::{Modifiers, PointerEvent};
pub use selection::{SelectionManager, SelectionMode, SelectionState, Target};
