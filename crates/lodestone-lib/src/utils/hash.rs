use crate::config::IO_CHUNK_SIZE;
use anyhow::{Context, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// MD5 of zero bytes, the digest an empty file must carry
pub const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

/// Streaming MD5 of a file as lowercase hex
pub fn calculate_md5(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Open {:?} for hashing", path))?;
    let mut hasher = Md5::new();
    let mut buffer = [0u8; IO_CHUNK_SIZE];

    loop {
        let n = file
            .read(&mut buffer)
            .with_context(|| format!("Read {:?} for hashing", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Case-insensitive hex digest comparison
pub fn hashes_match(actual: &str, expected: &str) -> bool {
    actual.trim().eq_ignore_ascii_case(expected.trim())
}
