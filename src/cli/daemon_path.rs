use std::path::PathBuf;

/// The daemon binary is installed next to the CLI.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name("worklogger-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_daemon_next_to_cli() {
        assert_eq!(
            to_daemon_path(PathBuf::from("/usr/local/bin/worklogger")),
            Path::new("/usr/local/bin/worklogger-daemon")
        );
    }
}
