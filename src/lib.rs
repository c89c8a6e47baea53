//! # Duckscript
//!
//! An interpreter for keystroke-injection scripts.
//!
//! Scripts are plain text, one instruction per line. Each line resolves to a
//! [`Directive`]: either keys to type, or a timing/control change. A
//! [`Runtime`] loads scripts by name from a [`ScriptSource`], runs them line
//! by line and sends the resulting key presses to a [`HidTransport`].
//!
//! ## Quick start
//!
//! ```no_run
//! use duckscript::{MemorySource, RecordingTransport, Runtime, Settings};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = MemorySource::new().with_script(
//!         "hello.txt",
//!         "GUI r\nDELAY 300\nSTRING notepad\nENTER\n",
//!     );
//!     let transport = Arc::new(RecordingTransport::new());
//!
//!     let runtime = Runtime::new(Arc::new(source), transport.clone(), Settings::default());
//!     let report = runtime.run("hello.txt").await?;
//!
//!     assert!(report.completed);
//!     println!("{} key events", transport.events().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Script syntax
//!
//! | Line | Effect |
//! |------|--------|
//! | `STRING text` | Type `text` character by character |
//! | `ENTER`, `TAB`, `F5`, ... | Press and release one key |
//! | `CTRL ALT DEL`, `GUI r` | Press keys in order, release in reverse |
//! | `DELAY 500` | Pause 500 ms before the next line |
//! | `DEFAULTDELAY 100` / `DEFAULT_DELAY 100` | Pause 100 ms after every following line |
//! | `REPEAT 3` / `REPLAY 3` | Run the previous keystroke line 3 more times |
//! | `LOCALE GB` | Type with a different keyboard layout |
//! | `LED 255 0 0` | Set the status indicator colour |
//! | `KEYCODE 0x02 0x04` | Raw modifier mask and HID usage IDs |
//! | `REM comment` | Ignored |
//!
//! Unknown lines are ignored so that scripts written for richer dialects
//! still run.
//!
//! ## Stopping a script from elsewhere
//!
//! [`Runtime`] handles are cheap to clone. `run` can be driven on one task
//! while another calls [`Runtime::stop_all`]; the running script stops at the
//! next line boundary.
//!
//! ```no_run
//! use duckscript::{DirSource, RecordingTransport, Runtime, Settings};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = Runtime::new(
//!         Arc::new(DirSource::new("scripts")),
//!         Arc::new(RecordingTransport::new()),
//!         Settings::default(),
//!     );
//!
//!     let driver = runtime.clone();
//!     let handle = tokio::spawn(async move { driver.run("long.txt").await });
//!
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//!     runtime.stop_all();
//!
//!     let report = handle.await??;
//!     println!("stopped after {} lines", report.lines);
//!     Ok(())
//! }
//! ```

pub mod directive;
pub mod emitter;
pub mod error;
pub mod evaluator;
pub mod keys;
pub mod layout;
pub mod parser;
pub mod runtime;
pub mod settings;
pub mod source;
pub mod status;
pub mod transport;

pub use directive::{Directive, KeyCombo};
pub use emitter::Emitter;
pub use error::{LineFault, RuntimeError};
pub use evaluator::{Evaluator, LineKind, LineOutcome};
pub use keys::Key;
pub use layout::{Layout, Stroke};
pub use parser::{parse_line, parse_str};
pub use runtime::{RunReport, Runtime, RuntimeState, Step};
pub use settings::Settings;
pub use source::{DirSource, MemorySource, ScriptSource, SourceError};
pub use status::{Rgb, Status, StatusIndicator, TracingIndicator};
pub use transport::{
    HidTransport, KeyEvent, Phase, PtyTransport, RecordingTransport, ReportTransport,
    TransportError,
};
