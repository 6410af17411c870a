/// Extension trait for client process spawning, providing unified
/// support for console suppression and process detachment.
pub trait LaunchCommandExt {
    /// Hides the console window on Windows. No-op on other platforms.
    fn suppress_console(&mut self) -> &mut Self;

    /// Detaches the process from its parent, allowing it to survive launcher exit.
    /// On Windows, this uses CREATE_NEW_PROCESS_GROUP.
    /// On Unix, this uses a new session via setsid.
    fn detach(&mut self) -> &mut Self;

    /// Removes inherited variables that would override the child JVM's own
    /// option and classpath resolution.
    fn strip_java_environment(&mut self) -> &mut Self;
}

/// Global JVM option overrides and classpath variables honoured by every JVM
pub const STRIPPED_JAVA_ENV: &[&str] = &[
    "JAVA_TOOL_OPTIONS",
    "_JAVA_OPTIONS",
    "JDK_JAVA_OPTIONS",
    "JAVA_OPTIONS",
    "CLASSPATH",
];

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;

impl LaunchCommandExt for tokio::process::Command {
    fn suppress_console(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            self.creation_flags(CREATE_NO_WINDOW);
        }
        self
    }

    fn detach(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            // creation_flags replaces earlier flags, so keep CREATE_NO_WINDOW here
            self.creation_flags(CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
        }
        #[cfg(unix)]
        {
            unsafe {
                self.pre_exec(|| {
                    libc::setsid();
                    Ok(())
                });
            }
        }
        self
    }

    fn strip_java_environment(&mut self) -> &mut Self {
        for key in STRIPPED_JAVA_ENV {
            self.env_remove(key);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_java_overrides() {
        let mut command = tokio::process::Command::new("java");
        command.env("JAVA_TOOL_OPTIONS", "-Xmx1M").strip_java_environment();

        let removed: Vec<String> = command
            .as_std()
            .get_envs()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key.to_string_lossy().to_string())
            .collect();

        for key in STRIPPED_JAVA_ENV {
            assert!(removed.iter().any(|k| k == key), "{} should be removed", key);
        }
    }
}
