//! Record HTTP traffic into HAR (HTTP Archive) files.
//!
//! The [`Session`] wrapper issues requests through a reqwest blocking
//! client and captures every exchange into an owned [`Recorder`]:
//!
//! ```no_run
//! use reqwest_har::Session;
//!
//! # fn main() -> Result<(), reqwest_har::Error> {
//! let session = Session::new()?;
//! session.get("https://example.com/")?;
//! let written = session.save("/tmp/capture")?; // -> /tmp/capture.har
//! println!("saved {}", written.display());
//! # Ok(())
//! # }
//! ```
//!
//! The capture core is client-agnostic: fill a [`RequestSnapshot`] and
//! [`ResponseSnapshot`] from any HTTP client and feed them to a
//! [`ResponseHook`] (or [`build_entry`] directly) to populate a
//! [`Recorder`] by hand.

pub mod builder;
pub mod error;
pub mod har;
pub mod hook;
pub mod recorder;
pub mod session;
pub mod snapshot;

pub use builder::{build_entry, build_entry_with, BuildOptions, TimingHints};
pub use error::{Error, MalformedExchange, PersistError};
pub use hook::ResponseHook;
pub use recorder::{Recorder, HAR_VERSION};
pub use session::{Session, SessionResponse};
pub use snapshot::{Exchange, RequestSnapshot, ResponseSnapshot};
