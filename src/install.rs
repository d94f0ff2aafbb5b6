// Install step: resolves the package path (upload result first, configured
// path second), posts `?cmd=install` to the HTML service endpoint and turns
// the classified response into a report or an error. Every error line from
// the response is logged before an error is returned.

use crate::api::PackageService;
use crate::config::{BuildContext, InstallConfig};
use crate::error::{CrxError, Result};
use crate::parser::{classify, InstallStatus};
use crate::upload::UploadResult;
use std::fmt;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotExecutionRoot,
    Requested,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotExecutionRoot => f.write_str("not the execution root"),
            Self::Requested => f.write_str("skip requested"),
        }
    }
}

/// What a non-failing install run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallReport {
    Skipped(SkipReason),
    /// Neither an upload result nor a configured path was available.
    MissingPackagePath,
    Installed,
    /// Errors were reported but `ignore_success_errors` tolerated them.
    InstalledWithErrors(Vec<String>),
}

pub(crate) fn skip_reason(
    skip: bool,
    run_only_at_execution_root: bool,
    context: BuildContext,
) -> Option<SkipReason> {
    if run_only_at_execution_root && !context.is_execution_root {
        Some(SkipReason::NotExecutionRoot)
    } else if skip {
        Some(SkipReason::Requested)
    } else {
        None
    }
}

/// Pick the path to install: a non-empty upload result wins over the
/// configured path. Empty strings count as absent.
pub fn resolve_package_path<'a>(
    uploaded: Option<&'a UploadResult>,
    configured: Option<&'a str>,
) -> Option<&'a str> {
    uploaded
        .map(|u| u.path.as_str())
        .filter(|p| !p.is_empty())
        .or_else(|| configured.filter(|p| !p.is_empty()))
}

pub fn install_url(html_target_url: &str, package_path: &str) -> String {
    format!("{html_target_url}{package_path}/?cmd=install")
}

pub struct Installer<'a, S: PackageService> {
    service: &'a S,
    config: &'a InstallConfig,
    context: BuildContext,
}

impl<'a, S: PackageService> Installer<'a, S> {
    pub fn new(service: &'a S, config: &'a InstallConfig, context: BuildContext) -> Self {
        Self {
            service,
            config,
            context,
        }
    }

    pub fn run(&self, uploaded: Option<&UploadResult>) -> Result<InstallReport> {
        match skip_reason(
            self.config.skip,
            self.config.run_only_at_execution_root,
            self.context,
        ) {
            Some(SkipReason::NotExecutionRoot) => {
                info!("Skipping install in this project because it's not the execution root");
                return Ok(InstallReport::Skipped(SkipReason::NotExecutionRoot));
            }
            Some(SkipReason::Requested) => {
                info!("Skipping package installation as instructed");
                return Ok(InstallReport::Skipped(SkipReason::Requested));
            }
            None => {}
        }

        let Some(path) = resolve_package_path(uploaded, self.config.package_path.as_deref())
        else {
            error!("Upload step hasn't set up path for package!");
            return Ok(InstallReport::MissingPackagePath);
        };

        let url = install_url(&self.config.html_target_url(), path);
        info!("Installing package using command: {url}");
        let body = self.service.post(&url)?;
        let parsed = classify(&body);

        match parsed.status {
            InstallStatus::Success if parsed.errors.is_empty() => {
                info!("Package successfully installed.");
                Ok(InstallReport::Installed)
            }
            InstallStatus::Success => {
                warn!("Package installed with errors");
                self.tolerate(parsed.errors)
            }
            InstallStatus::SuccessWithErrors => {
                error!("Package installed with errors.");
                self.tolerate(parsed.errors)
            }
            InstallStatus::Fail => {
                error!("Installation failed.");
                display_errors(&parsed.errors);
                Err(CrxError::InstallIncomplete {
                    errors: parsed.errors,
                })
            }
        }
    }

    fn tolerate(&self, errors: Vec<String>) -> Result<InstallReport> {
        display_errors(&errors);
        if self.config.ignore_success_errors {
            Ok(InstallReport::InstalledWithErrors(errors))
        } else {
            Err(CrxError::InstallCompletedWithErrors { errors })
        }
    }
}

fn display_errors(errors: &[String]) {
    for e in errors {
        error!("CRX: {e}");
    }
}
