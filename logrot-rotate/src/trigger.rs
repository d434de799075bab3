//! Rotation trigger policy.

use std::path::Path;

use logrot_fs::{Filesystem, FsError};

/// Decides whether a rotation run should happen at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerPolicy {
    /// Rotate on every invocation.
    #[default]
    Always,
    /// Rotate only once the base file has reached this many bytes.
    MinSize(u64),
}

impl TriggerPolicy {
    /// Check the policy against the base file at `path`.
    ///
    /// A missing base file never triggers a size-based rotation.
    pub fn should_rotate<F: Filesystem>(&self, fs: &F, path: &Path) -> Result<bool, FsError> {
        match self {
            TriggerPolicy::Always => Ok(true),
            TriggerPolicy::MinSize(threshold) => Ok(fs
                .metadata(path)?
                .map_or(false, |meta| meta.len >= *threshold)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logrot_fs::MockFilesystem;

    #[test]
    fn test_default_is_always() {
        assert_eq!(TriggerPolicy::default(), TriggerPolicy::Always);
    }

    #[test]
    fn test_always_triggers_even_without_file() {
        let fs = MockFilesystem::new();
        let policy = TriggerPolicy::Always;
        assert!(policy.should_rotate(&fs, Path::new("/logs/app.log")).unwrap());
    }

    #[test]
    fn test_min_size_below_threshold() {
        let fs = MockFilesystem::new();
        fs.add_file("/logs/app.log", 25599);
        let policy = TriggerPolicy::MinSize(25600);
        assert!(!policy.should_rotate(&fs, Path::new("/logs/app.log")).unwrap());
    }

    #[test]
    fn test_min_size_exactly_at_threshold() {
        let fs = MockFilesystem::new();
        fs.add_file("/logs/app.log", 25600);
        let policy = TriggerPolicy::MinSize(25600);
        assert!(policy.should_rotate(&fs, Path::new("/logs/app.log")).unwrap());
    }

    #[test]
    fn test_min_size_missing_file() {
        let fs = MockFilesystem::new();
        let policy = TriggerPolicy::MinSize(1);
        assert!(!policy.should_rotate(&fs, Path::new("/logs/app.log")).unwrap());
    }

    #[test]
    fn test_min_size_zero_triggers_on_empty_file() {
        let fs = MockFilesystem::new();
        fs.add_file("/logs/app.log", 0);
        let policy = TriggerPolicy::MinSize(0);
        assert!(policy.should_rotate(&fs, Path::new("/logs/app.log")).unwrap());
    }
}
