//! Locating external tools.

use std::path::PathBuf;

/// Finds an executable by name.
///
/// Checks `{NAME}_PATH` first (e.g. `FFMPEG_PATH`), then each entry of `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let override_var = format!("{}_PATH", name.to_uppercase());
    if let Ok(path) = std::env::var(&override_var) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
    }

    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable() {
        assert!(find_executable("definitely-not-a-real-tool-0x1").is_none());
    }
}
