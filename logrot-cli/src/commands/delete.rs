//! Delete command orchestration.

use std::path::PathBuf;

use logrot_clock::Clock;
use logrot_delete::{AgeBasis, DeleteError, Deletion};
use logrot_fs::Filesystem;

use crate::cli::DeleteArgs;
use crate::logger::Logger;

use super::{action_label, CommandResult};

/// Result of delete command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Paths deleted, directory contents before the directory itself.
    pub paths: Vec<PathBuf>,
    /// Whether the run was simulated.
    pub dry_run: bool,
}

/// Execute the delete command.
pub fn execute_delete<F, C, L>(
    args: &DeleteArgs,
    fs: F,
    clock: C,
    logger: &L,
) -> CommandResult<DeleteResult>
where
    F: Filesystem,
    C: Clock,
    L: Logger,
{
    args.validate()?;
    let threshold = args.threshold()?;

    let mut deletion = Deletion::with_filesystem(fs, clock, args.pattern.clone())
        .in_dir(&args.dir)
        .dry_run(args.dry_run);
    // Logging and deletion share one reading of the clock
    let now = match args.fixed_now()? {
        Some(now) => now,
        None => deletion.now(),
    };
    deletion.set_now(now);
    for root in &args.safe_roots {
        deletion.add_safe_recursive_delete_root(root)?;
    }

    let cutoff = threshold.cutoff(now).map_err(DeleteError::from)?;
    logger.verbose(&format!("pattern: {} in {}", args.pattern, args.dir.display()));
    logger.verbose(&format!(
        "cutoff: {} ({:?})",
        cutoff.to_rfc3339(),
        AgeBasis::from(args.by)
    ));
    for root in deletion.safe_roots() {
        logger.debug(&format!("safe root: {}", root.display()));
    }

    let paths = match AgeBasis::from(args.by) {
        AgeBasis::FilenameTime => deletion.delete_by_filename_time(&threshold)?,
        AgeBasis::ModifiedTime => deletion.delete_by_modified_time(&threshold)?,
    };

    let label = action_label(args.dry_run, "removed", "would remove");
    for path in &paths {
        logger.verbose(&format!("{} {}", label, path.display()));
    }
    logger.info(&format!("{} {} path(s)", label, paths.len()));

    Ok(DeleteResult {
        paths,
        dry_run: args.dry_run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{AgeBasisArg, CliError};
    use crate::commands::CommandError;
    use crate::logger::MockLogger;
    use chrono::{DateTime, TimeZone, Utc};
    use logrot_clock::MockClock;
    use std::sync::atomic::{AtomicI64, Ordering};
    use logrot_fs::MockFilesystem;
    use std::path::Path;

    fn args(pattern: &str, older_than: &str) -> DeleteArgs {
        DeleteArgs {
            pattern: pattern.to_string(),
            older_than: older_than.to_string(),
            by: AgeBasisArg::Filename,
            dir: PathBuf::from("/logs"),
            now: None,
            safe_roots: Vec::new(),
            dry_run: false,
            verbose: 0,
        }
    }

    fn clock() -> MockClock {
        MockClock::new(Utc.with_ymd_and_hms(2016, 4, 26, 0, 0, 0).unwrap())
    }

    fn payment_fs() -> MockFilesystem {
        let fs = MockFilesystem::new();
        for day in ["20160324", "20160325", "20160326", "20160401"] {
            fs.add_file(format!("/logs/payment.{}.log", day), 1);
        }
        fs
    }

    #[test]
    fn test_execute_delete_by_filename() {
        let fs = payment_fs();
        let logger = MockLogger::new();

        let result =
            execute_delete(&args("payment.{Ymd}.log", "1 month"), fs.clone(), clock(), &logger)
                .unwrap();

        assert_eq!(
            result.paths,
            vec![
                PathBuf::from("/logs/payment.20160324.log"),
                PathBuf::from("/logs/payment.20160325.log"),
            ]
        );
        assert!(!fs.exists(Path::new("/logs/payment.20160324.log")));
        assert!(fs.exists(Path::new("/logs/payment.20160326.log")));
        assert!(logger.contains("removed 2 path(s)"));
        assert!(logger.contains("cutoff: 2016-03-26T00:00:00+00:00"));
    }

    #[test]
    fn test_execute_delete_fixed_now_dry_run() {
        let fs = payment_fs();
        let logger = MockLogger::new();
        let mut a = args("payment.{Ymd}.log", "1 month");
        a.now = Some("2016-04-07".to_string());
        a.dry_run = true;

        let before = fs.paths();

        let result = execute_delete(&a, fs.clone(), clock(), &logger).unwrap();

        assert!(result.paths.is_empty());
        assert!(result.dry_run);
        assert_eq!(fs.paths(), before);
        assert!(logger.contains("would remove 0 path(s)"));
    }

    #[test]
    fn test_execute_delete_by_modified() {
        let fs = MockFilesystem::new();
        let now = Utc.with_ymd_and_hms(2016, 4, 26, 0, 0, 0).unwrap();
        fs.add_file_modified("/logs/old.log", 1, now - chrono::Duration::days(8));
        fs.add_file_modified("/logs/new.log", 1, now - chrono::Duration::days(1));
        let logger = MockLogger::new();
        let mut a = args("*.log", "7d");
        a.by = AgeBasisArg::Modified;

        let result = execute_delete(&a, fs.clone(), clock(), &logger).unwrap();

        assert_eq!(result.paths, vec![PathBuf::from("/logs/old.log")]);
        assert!(fs.exists(Path::new("/logs/new.log")));
    }

    /// Clock that moves forward one day on every read.
    struct AdvancingClock {
        start: DateTime<Utc>,
        reads: AtomicI64,
    }

    impl Clock for AdvancingClock {
        fn now(&self) -> DateTime<Utc> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            self.start + chrono::Duration::days(n)
        }
    }

    #[test]
    fn test_execute_delete_reads_clock_once() {
        let start = Utc.with_ymd_and_hms(2016, 4, 26, 0, 0, 0).unwrap();
        let fs = MockFilesystem::new();
        fs.add_file_modified("/logs/old.log", 1, start - chrono::Duration::hours(7 * 24 + 12));
        fs.add_file_modified("/logs/edge.log", 1, start - chrono::Duration::hours(6 * 24 + 12));
        let clock = AdvancingClock {
            start,
            reads: AtomicI64::new(0),
        };
        let logger = MockLogger::new();
        let mut a = args("*.log", "7 days");
        a.by = AgeBasisArg::Modified;

        let result = execute_delete(&a, fs.clone(), &clock, &logger).unwrap();

        assert_eq!(result.paths, vec![PathBuf::from("/logs/old.log")]);
        assert!(fs.exists(Path::new("/logs/edge.log")));
        assert_eq!(clock.reads.load(Ordering::SeqCst), 1);
        assert!(logger.contains("cutoff: 2016-04-19T00:00:00+00:00"));
    }

    #[test]
    fn test_execute_delete_safety_violation() {
        let fs = MockFilesystem::new();
        fs.add_file("/srv/tmp/folders/2/test.2.log", 1);
        let logger = MockLogger::new();
        let mut a = args("2", "1 month");
        a.dir = PathBuf::from("/srv/tmp/folders");

        let err = execute_delete(&a, fs.clone(), clock(), &logger).unwrap_err();
        assert!(matches!(
            err,
            CommandError::Delete(DeleteError::SafetyViolation { .. })
        ));
        assert!(fs.exists(Path::new("/srv/tmp/folders/2/test.2.log")));

        a.safe_roots = vec![PathBuf::from("/srv/tmp")];
        let result = execute_delete(&a, fs.clone(), clock(), &logger).unwrap();
        assert_eq!(result.paths.len(), 2);
        assert!(!fs.exists(Path::new("/srv/tmp/folders/2")));
    }

    #[test]
    fn test_execute_delete_invalid_threshold() {
        let logger = MockLogger::new();
        let err = execute_delete(&args("*.log", "whenever"), payment_fs(), clock(), &logger)
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidArgument(CliError::InvalidThreshold(_))
        ));
    }
}
