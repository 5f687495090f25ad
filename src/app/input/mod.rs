//! Input handling system
//!
//! ```text
//! Raw Input (winit) → InputCollector → InputState
//!                                          ↓
//!                                    InputContext
//!                                 (generates events)
//!                                          ↓
//!                                   InputHandlers
//!                                   (by priority)
//!                                          ↓
//!                                    SceneAction
//! ```
//!
//! Key presses are edge-triggered: a key held across frames produces one
//! `KeyPress`, and OS auto-repeat is dropped by the collector. Held keys are
//! read every frame through [`InputHandler::update`].

mod collector;
mod context;
mod events;
mod handler;
mod scene_handler;
mod state;

pub use collector::InputCollector;
pub use context::InputContext;
pub use events::{InputEvent, KeyCode};
pub use handler::InputHandler;
pub use scene_handler::{ExposureChange, SceneAction, SceneInputHandler};
pub use state::{ButtonState, InputState, KeyboardState, MouseState};
