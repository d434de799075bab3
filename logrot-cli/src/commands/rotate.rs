//! Rotate command orchestration.

use std::path::PathBuf;

use logrot_fs::Filesystem;
use logrot_rotate::Rotation;

use crate::cli::RotateArgs;
use crate::logger::Logger;

use super::{action_label, CommandResult};

/// Result of rotate command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotateResult {
    /// Paths removed or renamed, highest index first, base file last.
    pub paths: Vec<PathBuf>,
    /// Whether the run was simulated.
    pub dry_run: bool,
}

/// Execute the rotate command.
pub fn execute_rotate<F, L>(args: &RotateArgs, fs: F, logger: &L) -> CommandResult<RotateResult>
where
    F: Filesystem,
    L: Logger,
{
    args.validate()?;

    let mut rotation = Rotation::with_filesystem(fs, args.file.clone())
        .in_dir(&args.dir)
        .dry_run(args.dry_run);
    if let Some(keep) = args.keep {
        rotation = rotation.keep(keep);
    }
    if let Some(bytes) = args.size_bytes()? {
        rotation = rotation.size_bytes(bytes);
    }

    logger.verbose(&format!("file: {}", rotation.base_path().display()));
    match rotation.keep_count() {
        Some(keep) => logger.verbose(&format!("keep: {}", keep)),
        None => logger.verbose("keep: all"),
    }
    logger.debug(&format!("trigger: {:?}", rotation.trigger()));

    let paths = rotation.run()?;

    if paths.is_empty() {
        logger.info(&format!(
            "{}: nothing to rotate",
            rotation.base_path().display()
        ));
    } else {
        let label = action_label(args.dry_run, "rotated", "would rotate");
        for path in &paths {
            logger.verbose(&format!("{} {}", label, path.display()));
        }
        logger.info(&format!(
            "{} {}: {} path(s) affected",
            label,
            rotation.base_path().display(),
            paths.len()
        ));
    }

    Ok(RotateResult {
        paths,
        dry_run: args.dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliError;
    use crate::commands::CommandError;
    use crate::logger::{MockLogger, Verbosity};
    use logrot_fs::MockFilesystem;
    use std::path::Path;

    fn args(file: &str) -> RotateArgs {
        RotateArgs {
            file: file.to_string(),
            dir: PathBuf::from("/logs"),
            keep: None,
            size: None,
            dry_run: false,
            verbose: 0,
        }
    }

    fn chain_fs() -> MockFilesystem {
        let fs = MockFilesystem::new();
        fs.add_file("/logs/orders.log", 100);
        fs.add_file("/logs/orders.log.1", 100);
        fs.add_file("/logs/orders.log.2", 100);
        fs
    }

    #[test]
    fn test_execute_rotate_shifts_chain() {
        let fs = chain_fs();
        let logger = MockLogger::new();

        let result = execute_rotate(&args("orders.log"), fs.clone(), &logger).unwrap();

        assert_eq!(
            result.paths,
            vec![
                PathBuf::from("/logs/orders.log.2"),
                PathBuf::from("/logs/orders.log.1"),
                PathBuf::from("/logs/orders.log"),
            ]
        );
        assert!(!result.dry_run);
        assert!(!fs.exists(Path::new("/logs/orders.log")));
        assert!(fs.exists(Path::new("/logs/orders.log.3")));
        assert!(logger.contains("rotated /logs/orders.log: 3 path(s) affected"));
    }

    #[test]
    fn test_execute_rotate_dry_run() {
        let fs = chain_fs();
        let logger = MockLogger::new();
        let mut a = args("orders.log");
        a.dry_run = true;
        a.keep = Some(2);

        let result = execute_rotate(&a, fs.clone(), &logger).unwrap();

        assert_eq!(result.paths.len(), 3);
        assert!(result.dry_run);
        assert!(fs.exists(Path::new("/logs/orders.log")));
        assert!(!fs.exists(Path::new("/logs/orders.log.3")));
        assert!(logger.contains("would rotate"));
        assert_eq!(logger.messages_at_level(Verbosity::Verbose)[1], "keep: 2");
    }

    #[test]
    fn test_execute_rotate_below_size() {
        let fs = chain_fs();
        let logger = MockLogger::new();
        let mut a = args("orders.log");
        a.size = Some("1K".to_string());

        let result = execute_rotate(&a, fs.clone(), &logger).unwrap();

        assert!(result.paths.is_empty());
        assert!(fs.exists(Path::new("/logs/orders.log")));
        assert!(logger.contains("nothing to rotate"));
    }

    #[test]
    fn test_execute_rotate_missing_file() {
        let fs = MockFilesystem::new();
        fs.add_dir("/logs");
        let logger = MockLogger::new();

        let result = execute_rotate(&args("orders.log"), fs, &logger).unwrap();
        assert!(result.paths.is_empty());
    }

    #[test]
    fn test_execute_rotate_invalid_size() {
        let logger = MockLogger::new();
        let mut a = args("orders.log");
        a.size = Some("lots".to_string());

        let err = execute_rotate(&a, chain_fs(), &logger).unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidArgument(CliError::InvalidSize(_))
        ));
        assert_eq!(logger.count(), 0);
    }
}
