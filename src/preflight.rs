//! Checks for external tools that must exist before anything is downloaded.
use crate::config::Requirement;
use crate::error::UpdateError;
use crate::exec::Executor;
use crate::logging::Log;

/// Return the first program of `requirement` found on `PATH`.
#[must_use]
pub fn satisfied_by<'a>(requirement: &'a Requirement, executor: &dyn Executor) -> Option<&'a str> {
    requirement
        .any_of
        .iter()
        .map(String::as_str)
        .find(|program| executor.which(program))
}

/// Verify every requirement in order.
///
/// # Errors
///
/// Returns [`UpdateError::MissingDependency`] for the first requirement with
/// none of its programs on `PATH`.
pub fn check(
    requirements: &[Requirement],
    executor: &dyn Executor,
    log: &dyn Log,
) -> Result<(), UpdateError> {
    for requirement in requirements {
        match satisfied_by(requirement, executor) {
            Some(program) => log.debug(&format!("{}: found {program}", requirement.name)),
            None => {
                return Err(UpdateError::MissingDependency {
                    tool: requirement.name.clone(),
                    hint: requirement.hint.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::exec::fake::FakeExecutor;
    use crate::logging::isolated_logger;

    #[test]
    fn either_fuse_helper_satisfies_default() {
        let (log, _tmp, _guard) = isolated_logger();
        let requirements = Config::default().requirements;

        let fuse3 = FakeExecutor::new().with_available(&["fusermount3"]);
        check(&requirements, &fuse3, &log).unwrap();
        assert_eq!(satisfied_by(&requirements[0], &fuse3), Some("fusermount3"));

        let fuse2 = FakeExecutor::new().with_available(&["fusermount", "fusermount3"]);
        assert_eq!(satisfied_by(&requirements[0], &fuse2), Some("fusermount"));
    }

    #[test]
    fn missing_fuse_is_reported_with_hint() {
        let (log, _tmp, _guard) = isolated_logger();
        let err = check(&Config::default().requirements, &FakeExecutor::new(), &log).unwrap_err();

        match &err {
            UpdateError::MissingDependency { tool, hint } => {
                assert_eq!(tool, "FUSE");
                assert!(hint.contains("libfuse2"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Required tool 'FUSE' not found."));
    }

    #[test]
    fn empty_requirement_list_passes() {
        let (log, _tmp, _guard) = isolated_logger();
        check(&[], &FakeExecutor::new(), &log).unwrap();
    }
}
