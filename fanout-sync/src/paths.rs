use std::path::{Path, PathBuf};

pub const REPORT_FILE: &str = "status.json";

pub fn fanout_root(home: &Path) -> PathBuf {
    home.join(".fanout")
}

/// `<home>/.fanout/status.json`
pub fn default_report_path(home: &Path) -> PathBuf {
    fanout_root(home).join(REPORT_FILE)
}

/// Expand a leading `~/` against `home`; other paths are returned as-is.
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_report_lives_under_dot_fanout() {
        let path = default_report_path(Path::new("/home/ci"));
        assert!(path.ends_with(".fanout/status.json"));
    }

    #[test]
    fn tilde_expands_only_as_leading_component() {
        let home = Path::new("/home/ci");
        assert_eq!(
            expand_home(Path::new("~/reports/s.json"), home),
            PathBuf::from("/home/ci/reports/s.json")
        );
        assert_eq!(
            expand_home(Path::new("/var/~/s.json"), home),
            PathBuf::from("/var/~/s.json")
        );
    }
}
