use once_cell::sync::Lazy;
use std::sync::Mutex;
use sysinfo::System;

static SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| {
    let mut sys = System::new();
    sys.refresh_memory();
    Mutex::new(sys)
});

const DEFAULT_MIN_MEMORY_MB: u32 = 1024;
const DEFAULT_MAX_MEMORY_MB: u32 = 4096;

/// Returns the total physical memory in Megabytes
pub fn get_total_memory_mb() -> u64 {
    match SYSTEM.lock() {
        Ok(mut sys) => {
            sys.refresh_memory();
            sys.total_memory() / 1024 / 1024
        }
        Err(_) => 0,
    }
}

/// Heap limit used when the user has not chosen one
pub fn recommended_memory_mb() -> u32 {
    recommended_memory_for(get_total_memory_mb())
}

/// A quarter of physical memory, clamped to a range the client runs well in
pub fn recommended_memory_for(total_mb: u64) -> u32 {
    let quarter = (total_mb / 4).min(u32::MAX as u64) as u32;
    quarter.clamp(DEFAULT_MIN_MEMORY_MB, DEFAULT_MAX_MEMORY_MB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommended_memory_is_clamped() {
        assert_eq!(recommended_memory_for(0), 1024);
        assert_eq!(recommended_memory_for(8192), 2048);
        assert_eq!(recommended_memory_for(65536), 4096);
    }
}
