//! The external fit engine capability.
//!
//! A fit engine takes a theoretical curve and an experimental data file,
//! fits the scale (and constant background) of the one to the other, and
//! reports a chi-squared goodness of fit. The sweep only depends on the
//! [`FitEngine`] trait; [`OligomerFitEngine`] drives the ATSAS `oligomer`
//! program through a [`ProcessRunner`].

use super::process::{CommandSpec, ProcessError, ProcessRunner, SystemProcessRunner};
use super::workspace::{Workspace, WorkspaceError};
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

static CHI_SQUARED_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\.dat.*?(\d+\.\d+)").ok());

#[derive(Debug, Error)]
pub enum FitEngineError {
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("exited with status {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("no chi-squared value found in '{}'", log.display())]
    Unparseable { log: PathBuf },
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

/// Paths and options of one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitRequest {
    pub theoretical: PathBuf,
    pub experimental: PathBuf,
    pub fit: PathBuf,
    pub log: PathBuf,
    pub units: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub chi_squared: f64,
}

pub trait FitEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Checks that the engine can be invoked at all.
    fn check_available(&self) -> Result<(), FitEngineError>;

    /// Fits one theoretical curve that has already been written to the workspace.
    fn fit(&self, request: &FitRequest, workspace: &dyn Workspace)
    -> Result<FitOutcome, FitEngineError>;
}

/// Extracts the chi-squared value from an `oligomer` log.
///
/// The log mentions the data file twice; the value following the second
/// mention is the goodness of fit.
pub fn parse_chi_squared(log: &str) -> Option<f64> {
    CHI_SQUARED_PATTERN
        .as_ref()?
        .captures_iter(log)
        .nth(1)
        .and_then(|captures| captures.get(1))
        .and_then(|value| value.as_str().parse().ok())
}

#[derive(Debug, Clone)]
pub struct OligomerFitEngine<R: ProcessRunner = SystemProcessRunner> {
    executable: PathBuf,
    timeout: Option<Duration>,
    runner: R,
}

impl OligomerFitEngine<SystemProcessRunner> {
    pub fn new(executable: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self::with_runner(executable, timeout, SystemProcessRunner)
    }
}

impl<R: ProcessRunner> OligomerFitEngine<R> {
    pub fn with_runner(executable: impl Into<PathBuf>, timeout: Option<Duration>, runner: R) -> Self {
        Self {
            executable: executable.into(),
            timeout,
            runner,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, request: &FitRequest) -> CommandSpec {
        CommandSpec::new(&self.executable)
            .arg("-ff")
            .arg(request.theoretical.display().to_string())
            .arg(request.experimental.display().to_string())
            .arg(format!("--fit={}", request.fit.display()))
            .arg(format!("--out={}", request.log.display()))
            .arg("-cst")
            .arg("-ws")
            .arg(format!("-un={}", request.units))
            .timeout(self.timeout)
    }
}

fn search_path(program: &Path) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

impl<R: ProcessRunner> FitEngine for OligomerFitEngine<R> {
    fn name(&self) -> &str {
        "oligomer"
    }

    fn check_available(&self) -> Result<(), FitEngineError> {
        let is_bare_name = self.executable.components().count() == 1;
        let found = if is_bare_name {
            search_path(&self.executable).is_some()
        } else {
            self.executable.is_file()
        };
        if found {
            Ok(())
        } else {
            Err(FitEngineError::Unavailable(format!(
                "executable '{}' not found",
                self.executable.display()
            )))
        }
    }

    fn fit(
        &self,
        request: &FitRequest,
        workspace: &dyn Workspace,
    ) -> Result<FitOutcome, FitEngineError> {
        let output = self.runner.run(&self.command(request))?;
        if !output.success() {
            return Err(FitEngineError::NonZeroExit {
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let log = workspace.read_artifact(&request.log)?;
        let chi_squared = parse_chi_squared(&log).ok_or_else(|| FitEngineError::Unparseable {
            log: request.log.clone(),
        })?;
        debug!(chi_squared, log = %request.log.display(), "Parsed fit log.");
        Ok(FitOutcome { chi_squared })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::process::ProcessOutput;
    use crate::engine::workspace::{ArtifactKind, MemoryWorkspace};
    use std::sync::Mutex;

    const SAMPLE_LOG: &str = "\
 Experimental data: exp_36uM.dat  smax: 0.2500
 Number of points: 500
 File exp_36uM.dat  Chi^2:   1.234   Fractions: 0.40 0.60
";

    struct ScriptedRunner {
        exit_code: Option<i32>,
        log: Option<(PathBuf, String)>,
        workspace: std::sync::Arc<MemoryWorkspace>,
        seen: Mutex<Vec<CommandSpec>>,
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
            self.seen.lock().unwrap().push(command.clone());
            if let Some((path, text)) = &self.log {
                self.workspace.write_artifact(path, text).unwrap();
            }
            Ok(ProcessOutput {
                exit_code: self.exit_code,
                stdout: String::new(),
                stderr: "bad input".to_string(),
            })
        }
    }

    fn request(workspace: &MemoryWorkspace) -> FitRequest {
        FitRequest {
            theoretical: workspace.artifact_path(ArtifactKind::TheoreticalCurve, "36.00_1.50"),
            experimental: PathBuf::from("exp_36uM.dat"),
            fit: workspace.artifact_path(ArtifactKind::FitCurve, "36.00_1.50"),
            log: workspace.artifact_path(ArtifactKind::FitLog, "36.00_1.50"),
            units: 2,
        }
    }

    #[test]
    fn parse_takes_the_value_after_the_second_data_file_mention() {
        assert!(CHI_SQUARED_PATTERN.is_some());
        assert_eq!(parse_chi_squared(SAMPLE_LOG), Some(1.234));
        assert_eq!(parse_chi_squared("a.dat 1.0\nb.dat 2.50\n"), Some(2.5));
    }

    #[test]
    fn parse_returns_none_with_a_single_mention() {
        assert_eq!(parse_chi_squared("exp.dat 3.5\nnothing else\n"), None);
        assert_eq!(parse_chi_squared(""), None);
    }

    #[test]
    fn fit_builds_the_oligomer_command_line_and_parses_the_log() {
        let workspace = std::sync::Arc::new(MemoryWorkspace::new());
        let req = request(&workspace);
        let runner = ScriptedRunner {
            exit_code: Some(0),
            log: Some((req.log.clone(), SAMPLE_LOG.to_string())),
            workspace: workspace.clone(),
            seen: Mutex::new(Vec::new()),
        };
        let engine = OligomerFitEngine::with_runner(
            "/opt/atsas/bin/oligomer",
            Some(Duration::from_secs(5)),
            runner,
        );

        let outcome = engine.fit(&req, workspace.as_ref()).unwrap();
        assert_eq!(outcome.chi_squared, 1.234);

        let seen = engine.runner.seen.lock().unwrap();
        let args = &seen[0].args;
        assert_eq!(args[0], "-ff");
        assert_eq!(args[1], "theoretical_int/theoretical_36.00_1.50.int");
        assert_eq!(args[2], "exp_36uM.dat");
        assert_eq!(args[3], "--fit=fits/fit_36.00_1.50.fit");
        assert_eq!(args[4], "--out=logs/oligomer_36.00_1.50.log");
        assert_eq!(&args[5..], &["-cst", "-ws", "-un=2"]);
        assert_eq!(seen[0].timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn non_zero_exit_is_a_failure() {
        let workspace = std::sync::Arc::new(MemoryWorkspace::new());
        let engine = OligomerFitEngine::with_runner(
            "oligomer",
            None,
            ScriptedRunner {
                exit_code: Some(1),
                log: None,
                workspace: workspace.clone(),
                seen: Mutex::new(Vec::new()),
            },
        );
        let err = engine.fit(&request(&workspace), workspace.as_ref()).unwrap_err();
        assert!(matches!(err, FitEngineError::NonZeroExit { code: Some(1), ref stderr } if stderr == "bad input"));
    }

    #[test]
    fn unparseable_log_is_a_failure() {
        let workspace = std::sync::Arc::new(MemoryWorkspace::new());
        let req = request(&workspace);
        let engine = OligomerFitEngine::with_runner(
            "oligomer",
            None,
            ScriptedRunner {
                exit_code: Some(0),
                log: Some((req.log.clone(), "no numbers here".to_string())),
                workspace: workspace.clone(),
                seen: Mutex::new(Vec::new()),
            },
        );
        let err = engine.fit(&req, workspace.as_ref()).unwrap_err();
        assert!(matches!(err, FitEngineError::Unparseable { .. }));
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let engine = OligomerFitEngine::new("/nonexistent/atsas/oligomer", None);
        assert!(matches!(
            engine.check_available(),
            Err(FitEngineError::Unavailable(_))
        ));
        let engine = OligomerFitEngine::new("kdscan-no-such-program", None);
        assert!(engine.check_available().is_err());
    }

    #[test]
    fn existing_executable_is_available() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("oligomer");
        std::fs::write(&program, "#!/bin/sh\n").unwrap();
        assert!(OligomerFitEngine::new(&program, None).check_available().is_ok());
    }
}
