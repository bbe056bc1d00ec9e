//! Zoompan core library
//!
//! Pan-and-zoom control for a content surface inside a host element.
//! Pointer drags translate the content, wheel ticks scale it around the
//! pointer, and the programmatic camera (center, move, zoom to scale)
//! composes with both.
//!
//! Everything is single-threaded and runs inside the host's event loop:
//! input arrives as [`Event`]s dispatched on an [`Element`], deferred work
//! runs when the host advances the [`Scheduler`].

pub mod config;
pub mod element;
pub mod error;
pub mod events;
pub mod notify;
pub mod pan;
pub mod pointer;
pub mod scheduler;
pub mod style;
pub mod zoom;
pub mod zoom_pan;

// Re-export commonly used types
pub use config::{ZoomPanConfig, ZoomStep};
pub use element::{Element, Layout};
pub use error::{Result, ZoomPanError};
pub use events::{Event, EventType, Touch};
pub use notify::{Notifier, Subscription};
pub use pan::{MoveOptions, Offset, Pan};
pub use scheduler::Scheduler;
pub use zoom::{Zoom, ZoomChange, ZoomDirection};
pub use zoom_pan::{CenterOptions, ZoomPan};
