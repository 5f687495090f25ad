//! Input handler trait for subsystems

use super::events::InputEvent;
use super::state::InputState;

/// Trait for subsystems that handle input
///
/// Handlers are called in priority order (highest first).
/// When a handler consumes an event (returns true), propagation stops.
pub trait InputHandler {
    /// Name of this handler for lookup and logging
    fn name(&self) -> &str;

    /// Priority for input routing (higher = earlier)
    ///
    /// - 100+: overlay handlers
    /// - 0-99: scene and camera handlers
    fn priority(&self) -> u32;

    /// Handle an input event
    ///
    /// Returns `true` if the event was consumed.
    fn handle_event(&mut self, event: &InputEvent, state: &InputState) -> bool;

    /// Called every frame after all events, for held keys
    fn update(&mut self, _state: &InputState) {}

    /// Called at the start of each frame, before events are generated
    fn begin_frame(&mut self) {}

    /// Downcast to the concrete handler
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
