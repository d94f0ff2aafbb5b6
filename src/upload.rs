// Upload step: sends the package archive to the JSON endpoint and hands
// the repository path it was stored under to the install step.

use crate::api::{PackageService, UploadResponse};
use crate::config::{BuildContext, UploadConfig};
use crate::error::{CrxError, Result};
use crate::install::{skip_reason, SkipReason};
use std::path::Path;
use tracing::{error, info};

/// Where the package manager stored an uploaded package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadReport {
    Skipped(SkipReason),
    Uploaded(UploadResult),
}

impl UploadReport {
    pub fn result(&self) -> Option<&UploadResult> {
        match self {
            Self::Uploaded(result) => Some(result),
            Self::Skipped(_) => None,
        }
    }
}

pub fn upload_url(json_target_url: &str) -> String {
    format!("{json_target_url}/?cmd=upload")
}

pub struct Uploader<'a, S: PackageService> {
    service: &'a S,
    config: &'a UploadConfig,
    context: BuildContext,
}

impl<'a, S: PackageService> Uploader<'a, S> {
    pub fn new(service: &'a S, config: &'a UploadConfig, context: BuildContext) -> Self {
        Self {
            service,
            config,
            context,
        }
    }

    pub fn run(&self, file: &Path) -> Result<UploadReport> {
        if let Some(reason) = skip_reason(
            self.config.skip,
            self.config.run_only_at_execution_root,
            self.context,
        ) {
            info!("Skipping package upload: {reason}");
            return Ok(UploadReport::Skipped(reason));
        }

        let url = upload_url(&self.config.json_target_url());
        info!("Uploading package {} to {url}", file.display());
        let body = self.service.upload(&url, file, self.config.force)?;
        let result = parse_upload_response(&body)?;
        info!(path = %result.path, "{}", result.message);
        Ok(UploadReport::Uploaded(result))
    }
}

fn parse_upload_response(body: &str) -> Result<UploadResult> {
    let response: UploadResponse = serde_json::from_str(body)?;
    match response {
        UploadResponse {
            success: true,
            msg,
            path: Some(path),
        } if !path.is_empty() => Ok(UploadResult { path, message: msg }),
        UploadResponse { success: true, .. } => {
            error!("Package manager accepted the upload but returned no path");
            Err(CrxError::UploadFailed("no package path in response".to_string()))
        }
        UploadResponse { msg, .. } => {
            error!("Package upload failed: {msg}");
            Err(CrxError::UploadFailed(msg))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockPackageService;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn config() -> UploadConfig {
        UploadConfig {
            base_url: "http://localhost:4502".to_string(),
            force: true,
            skip: false,
            run_only_at_execution_root: false,
        }
    }

    #[test]
    fn successful_upload_yields_path() {
        let mut service = MockPackageService::new();
        service
            .expect_upload()
            .withf(|url, file, force| {
                url == "http://localhost:4502/crx/packmgr/service/.json/?cmd=upload"
                    && file == Path::new("target/site.zip")
                    && *force
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(r#"{"success":true,"msg":"Package uploaded","path":"/etc/packages/g/site.zip"}"#.to_string())
            });

        let config = config();
        let report = Uploader::new(&service, &config, BuildContext::default())
            .run(&PathBuf::from("target/site.zip"))
            .unwrap();

        assert_eq!(
            report,
            UploadReport::Uploaded(UploadResult {
                path: "/etc/packages/g/site.zip".to_string(),
                message: "Package uploaded".to_string(),
            })
        );
    }

    #[test]
    fn rejected_upload_is_an_error() {
        let mut service = MockPackageService::new();
        service.expect_upload().returning(|_, _, _| {
            Ok(r#"{"success":false,"msg":"Package already exists"}"#.to_string())
        });

        let config = config();
        let err = Uploader::new(&service, &config, BuildContext::default())
            .run(Path::new("site.zip"))
            .unwrap_err();
        assert!(matches!(err, CrxError::UploadFailed(msg) if msg == "Package already exists"));
    }

    #[test]
    fn non_json_reply_is_invalid_response() {
        let mut service = MockPackageService::new();
        service
            .expect_upload()
            .returning(|_, _, _| Ok("<html>login</html>".to_string()));

        let config = config();
        let err = Uploader::new(&service, &config, BuildContext::default())
            .run(Path::new("site.zip"))
            .unwrap_err();
        assert!(matches!(err, CrxError::InvalidUploadResponse(_)));
    }

    #[test]
    fn skip_avoids_request() {
        let mut service = MockPackageService::new();
        service.expect_upload().never();

        let config = UploadConfig {
            skip: true,
            ..config()
        };
        let report = Uploader::new(&service, &config, BuildContext::default())
            .run(Path::new("site.zip"))
            .unwrap();
        assert_eq!(report, UploadReport::Skipped(SkipReason::Requested));
        assert_eq!(report.result(), None);
    }

    #[test]
    fn force_flag_is_forwarded() {
        let mut service = MockPackageService::new();
        service
            .expect_upload()
            .with(mockall::predicate::always(), mockall::predicate::always(), eq(false))
            .times(1)
            .returning(|_, _, _| Ok(r#"{"success":true,"msg":"ok","path":"/etc/packages/p.zip"}"#.to_string()));

        let config = UploadConfig {
            force: false,
            ..config()
        };
        Uploader::new(&service, &config, BuildContext::default())
            .run(Path::new("p.zip"))
            .unwrap();
    }
}
