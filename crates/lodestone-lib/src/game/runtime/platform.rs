use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating systems a runtime build exists for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeOs {
    Windows,
    Linux,
    MacOs,
}

impl RuntimeOs {
    /// Detect the current OS
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "windows") {
            Some(RuntimeOs::Windows)
        } else if cfg!(target_os = "macos") {
            Some(RuntimeOs::MacOs)
        } else if cfg!(target_os = "linux") {
            Some(RuntimeOs::Linux)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeOs::Windows => "windows",
            RuntimeOs::Linux => "linux",
            RuntimeOs::MacOs => "macos",
        }
    }

    /// File name of the runtime's entry point
    pub fn java_executable(&self) -> &'static str {
        match self {
            RuntimeOs::Windows => "java.exe",
            _ => "java",
        }
    }

    /// Get the classpath separator for this OS
    pub fn classpath_separator(&self) -> &'static str {
        match self {
            RuntimeOs::Windows => ";",
            _ => ":",
        }
    }
}

/// CPU architectures a runtime build exists for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeArch {
    X64,
    X86,
    Arm64,
}

impl RuntimeArch {
    /// Detect the current architecture
    pub fn current() -> Option<Self> {
        if cfg!(target_arch = "x86_64") {
            Some(RuntimeArch::X64)
        } else if cfg!(target_arch = "x86") {
            Some(RuntimeArch::X86)
        } else if cfg!(target_arch = "aarch64") {
            Some(RuntimeArch::Arm64)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeArch::X64 => "x64",
            RuntimeArch::X86 => "x86",
            RuntimeArch::Arm64 => "arm64",
        }
    }
}

/// Which runtime build a client version needs on this host.
/// Used as the cache folder name and as the catalog lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeDescriptor {
    pub major: u32,
    pub os: RuntimeOs,
    pub arch: RuntimeArch,
}

impl RuntimeDescriptor {
    pub fn new(major: u32, os: RuntimeOs, arch: RuntimeArch) -> Self {
        Self { major, os, arch }
    }

    /// Descriptor for the host machine; None on unsupported platforms
    pub fn for_host(major: u32) -> Option<Self> {
        Some(Self::new(major, RuntimeOs::current()?, RuntimeArch::current()?))
    }

    /// Deterministic cache directory name, e.g. "java-17-linux-x64"
    pub fn cache_key(&self) -> String {
        format!("java-{}-{}-{}", self.major, self.os.as_str(), self.arch.as_str())
    }
}

impl fmt::Display for RuntimeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Java {} ({}/{})", self.major, self.os.as_str(), self.arch.as_str())
    }
}
