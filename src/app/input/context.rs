//! Input event routing and distribution

use tracing::trace;

use super::events::InputEvent;
use super::handler::InputHandler;
use super::state::InputState;

/// Central input routing and distribution system
pub struct InputContext {
    /// Registered input handlers, sorted by priority (highest first)
    handlers: Vec<Box<dyn InputHandler>>,
    /// Current input state
    state: InputState,
    /// Previous frame's input state
    prev_state: InputState,
}

impl InputContext {
    /// Creates a new input context
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            state: InputState::new(),
            prev_state: InputState::new(),
        }
    }

    /// Register an input handler
    ///
    /// Handlers are kept sorted by priority (highest first).
    pub fn register_handler(&mut self, handler: Box<dyn InputHandler>) {
        self.handlers.push(handler);
        self.handlers.sort_by_key(|h| std::cmp::Reverse(h.priority()));
    }

    /// Update input state from collector
    pub fn update_state(&mut self, state: InputState) {
        self.prev_state = std::mem::replace(&mut self.state, state);
    }

    /// Process input and dispatch events to handlers
    ///
    /// Call once per frame after updating state.
    pub fn process(&mut self) {
        for handler in &mut self.handlers {
            handler.begin_frame();
        }

        let events = self.generate_events();

        for event in events {
            trace!(?event, "Input event");
            for handler in &mut self.handlers {
                if handler.handle_event(&event, &self.state) {
                    break;
                }
            }
        }

        for handler in &mut self.handlers {
            handler.update(&self.state);
        }
    }

    /// Generate semantic events from state changes
    pub fn generate_events(&self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        let mut keys: Vec<_> = self.state.keyboard.iter().collect();
        keys.sort_by_key(|(key, _)| *key);
        for (key, state) in keys {
            if state.is_just_pressed() {
                events.push(InputEvent::KeyPress { key });
            } else if state.is_just_released() {
                events.push(InputEvent::KeyRelease { key });
            }
        }

        // The first position ever seen counts as a move
        if let Some(pos) = self.state.mouse.position
            && self.prev_state.mouse.position != Some(pos)
        {
            events.push(InputEvent::MouseMove { pos });
        }

        let motion = self.state.mouse.motion;
        if motion != [0.0, 0.0] {
            events.push(InputEvent::MouseMotion { delta: motion });
        }

        let scroll = self.state.mouse.scroll_delta;
        if scroll != 0.0 {
            events.push(InputEvent::Scroll { delta: scroll });
        }

        events
    }

    /// Get a mutable reference to a handler by name
    pub fn get_handler_mut(&mut self, name: &str) -> Option<&mut (dyn InputHandler + '_)> {
        self.handlers
            .iter_mut()
            .find(|h| h.name() == name)
            .map(|b| -> &mut (dyn InputHandler + '_) { b.as_mut() })
    }
}

impl Default for InputContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::input::KeyCode;

    struct Recorder {
        name: &'static str,
        priority: u32,
        consume: bool,
        seen: Vec<InputEvent>,
    }

    impl InputHandler for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn handle_event(&mut self, event: &InputEvent, _state: &InputState) -> bool {
            self.seen.push(event.clone());
            self.consume
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn recorder(name: &'static str, priority: u32, consume: bool) -> Box<Recorder> {
        Box::new(Recorder {
            name,
            priority,
            consume,
            seen: Vec::new(),
        })
    }

    fn seen(ctx: &mut InputContext, name: &str) -> Vec<InputEvent> {
        ctx.get_handler_mut(name)
            .and_then(|h| h.as_any_mut().downcast_mut::<Recorder>())
            .map(|r| r.seen.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_higher_priority_consumes_first() {
        let mut ctx = InputContext::new();
        // Registered first, but dispatched after the higher priority handler
        ctx.register_handler(recorder("low", 10, true));
        ctx.register_handler(recorder("high", 200, true));

        let mut state = InputState::new();
        state.keyboard.press(KeyCode::Space);
        ctx.update_state(state);
        ctx.process();

        assert_eq!(seen(&mut ctx, "high"), vec![InputEvent::KeyPress { key: KeyCode::Space }]);
        assert!(seen(&mut ctx, "low").is_empty());
    }

    #[test]
    fn test_mouse_move_only_on_change() {
        let mut ctx = InputContext::new();
        let mut state = InputState::new();
        state.mouse.position = Some([10.0, 10.0]);

        ctx.update_state(state.clone());
        assert_eq!(
            ctx.generate_events(),
            vec![InputEvent::MouseMove { pos: [10.0, 10.0] }]
        );

        ctx.update_state(state);
        assert!(ctx.generate_events().is_empty());
    }
}
