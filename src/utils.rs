use std::path::PathBuf;

/// Default configuration file name, looked up next to the binary.
pub const CONFIG_FILE: &str = "config.ini";

/// Resolve a file name next to the running executable.
///
/// Falls back to the current working directory when the executable path
/// cannot be determined (e.g. under some test harnesses).
pub fn exe_relative_path(file_name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(file_name)))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

/// Resolve the archive path: absolute paths are taken as-is, relative ones
/// land next to the binary like the config file does.
pub fn resolve_output_path(output_file: &str) -> PathBuf {
    let path = std::path::Path::new(output_file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        exe_relative_path(output_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exe_relative_path_keeps_file_name() {
        let path = exe_relative_path("config.ini");
        assert_eq!(path.file_name().unwrap(), "config.ini");
    }

    #[test]
    fn test_absolute_output_path_untouched() {
        let path = resolve_output_path("/data/prices.csv");
        assert_eq!(path, PathBuf::from("/data/prices.csv"));
    }
}
