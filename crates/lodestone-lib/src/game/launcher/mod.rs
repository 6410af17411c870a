pub mod arguments;
pub mod classpath;
pub mod process;
pub mod types;

pub use arguments::build_command;
pub use process::{launch, LaunchError, ProcessHandle};
pub use types::{GameOutput, LaunchCommand, LaunchSpec, OutputStream, WindowMode, REDACTED_TOKEN};
