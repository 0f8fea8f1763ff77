pub mod coordinator;
pub mod instant;
pub mod overlay;

pub use coordinator::{CaptureCoordinator, CoordinatorError, CoordinatorState, EngineFactory};
pub use instant::InstantGate;
pub use overlay::Overlay;
