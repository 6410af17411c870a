pub mod hardware;
pub mod hash;
pub mod layout;
pub mod paths;
pub mod process;
