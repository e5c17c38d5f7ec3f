//! # Events Module
//!
//! Progress reporting for the audit.
//!
//! ## Design
//! The library emits events through a channel so the CLI (or any other
//! front end) can render progress without the core knowing about terminals.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Hash(HashEvent::Progress(p)) = event {
//!             println!("hashed {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! auditor.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
