// Configuration: command-line arguments (with environment fallbacks) and
// the plain structs the library works from.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:4502";
const SERVICE_PATH: &str = "/crx/packmgr/service";

#[derive(Parser, Debug)]
#[command(name = "crxpkg", version, about = "Upload and install content packages on a CRX instance")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a package file to the package manager
    Upload(UploadArgs),
    /// Install a package, uploading it first when --file is given
    Install(InstallArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the CRX instance
    #[arg(long, env = "CRX_URL", default_value = DEFAULT_URL, global = true)]
    pub url: String,

    #[arg(long, env = "CRX_USER", default_value = "admin", global = true)]
    pub user: String,

    #[arg(long, env = "CRX_PASSWORD", default_value = "admin", hide_env_values = true, global = true)]
    pub password: String,

    /// Prompt for the password instead of using --password
    #[arg(long, global = true)]
    pub ask_password: bool,

    /// Request timeout in seconds (client default when unset)
    #[arg(long, env = "CRX_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct StepArgs {
    /// Do nothing
    #[arg(long, env = "CRX_SKIP")]
    pub skip: bool,

    /// Act only when the project directory is the execution root
    #[arg(long)]
    pub run_only_at_execution_root: bool,

    /// Directory of the project being built
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Directory the overall build was started from
    #[arg(long, default_value = ".")]
    pub execution_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Package archive to upload
    #[arg(long)]
    pub file: PathBuf,

    /// Overwrite an existing package with the same name
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub force: bool,

    #[command(flatten)]
    pub step: StepArgs,
}

#[derive(Args, Debug, Clone)]
pub struct InstallArgs {
    /// Package archive to upload before installing
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Repository path of an already uploaded package; ignored when --file
    /// produced one
    #[arg(long, env = "CRX_PACKAGE_PATH")]
    pub package_path: Option<String>,

    /// Overwrite an existing package with the same name when uploading
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub force: bool,

    /// Don't fail if the install succeeded but reported errors
    #[arg(long, env = "CRX_IGNORE_SUCCESS_ERRORS")]
    pub ignore_success_errors: bool,

    #[command(flatten)]
    pub step: StepArgs,
}

/// Everything the install step needs to know, independent of where the
/// values came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    pub base_url: String,
    pub package_path: Option<String>,
    pub ignore_success_errors: bool,
    pub skip: bool,
    pub run_only_at_execution_root: bool,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            package_path: None,
            ignore_success_errors: false,
            skip: false,
            run_only_at_execution_root: false,
        }
    }
}

impl InstallConfig {
    pub fn from_args(url: &str, args: &InstallArgs) -> Self {
        Self {
            base_url: url.to_string(),
            package_path: args.package_path.clone(),
            ignore_success_errors: args.ignore_success_errors,
            skip: args.step.skip,
            run_only_at_execution_root: args.step.run_only_at_execution_root,
        }
    }

    pub fn html_target_url(&self) -> String {
        html_target_url(&self.base_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    pub base_url: String,
    pub force: bool,
    pub skip: bool,
    pub run_only_at_execution_root: bool,
}

impl UploadConfig {
    pub fn from_args(url: &str, force: bool, step: &StepArgs) -> Self {
        Self {
            base_url: url.to_string(),
            force,
            skip: step.skip,
            run_only_at_execution_root: step.run_only_at_execution_root,
        }
    }

    pub fn json_target_url(&self) -> String {
        json_target_url(&self.base_url)
    }
}

/// Connection settings for the HTTP client.
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(user: &str, password: &str, timeout_secs: Option<u64>) -> Self {
        Self {
            credentials: Credentials {
                user: user.to_string(),
                password: password.to_string(),
            },
            timeout: timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Where this invocation sits within the wider build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildContext {
    pub is_execution_root: bool,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            is_execution_root: true,
        }
    }
}

impl BuildContext {
    pub fn from_dirs(project_dir: &Path, execution_root: &Path) -> Self {
        Self {
            is_execution_root: same_dir(project_dir, execution_root),
        }
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn service_url(base_url: &str, extension: &str) -> String {
    format!("{}{}/{}", base_url.trim_end_matches('/'), SERVICE_PATH, extension)
}

pub fn html_target_url(base_url: &str) -> String {
    service_url(base_url, ".html")
}

pub fn json_target_url(base_url: &str) -> String {
    service_url(base_url, ".json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn target_urls_trim_trailing_slash() {
        assert_eq!(
            html_target_url("http://localhost:4502/"),
            "http://localhost:4502/crx/packmgr/service/.html"
        );
        assert_eq!(
            json_target_url("http://author:4502"),
            "http://author:4502/crx/packmgr/service/.json"
        );
    }

    #[test]
    fn install_args_map_onto_config() {
        let cli = Cli::parse_from([
            "crxpkg",
            "install",
            "--package-path",
            "/etc/packages/g/site.zip",
            "--ignore-success-errors",
            "--url",
            "http://publish:4503",
        ]);
        let Command::Install(args) = cli.command else {
            panic!("expected install command");
        };
        let config = InstallConfig::from_args(&cli.connection.url, &args);
        assert_eq!(
            config,
            InstallConfig {
                base_url: "http://publish:4503".to_string(),
                package_path: Some("/etc/packages/g/site.zip".to_string()),
                ignore_success_errors: true,
                skip: false,
                run_only_at_execution_root: false,
            }
        );
    }

    #[test]
    fn file_is_accepted_alongside_env_package_path() {
        std::env::set_var("CRX_PACKAGE_PATH", "/etc/packages/g/from-env.zip");
        let parsed = Cli::try_parse_from(["crxpkg", "install", "--file", "site.zip"]);
        std::env::remove_var("CRX_PACKAGE_PATH");

        let cli = parsed.unwrap();
        let Command::Install(args) = cli.command else {
            panic!("expected install command");
        };
        assert_eq!(args.file, Some(PathBuf::from("site.zip")));
        assert_eq!(
            args.package_path.as_deref(),
            Some("/etc/packages/g/from-env.zip")
        );
    }

    #[test]
    fn file_and_package_path_flags_parse_together() {
        let parsed = Cli::try_parse_from([
            "crxpkg",
            "install",
            "--file",
            "site.zip",
            "--package-path",
            "/etc/packages/g/site.zip",
        ]);
        assert!(parsed.is_ok());
    }

    #[test]
    fn same_directory_is_execution_root() {
        let dir = tempfile::tempdir().unwrap();
        let child = dir.path().join("module");
        std::fs::create_dir(&child).unwrap();

        assert!(BuildContext::from_dirs(dir.path(), dir.path()).is_execution_root);
        assert!(!BuildContext::from_dirs(&child, dir.path()).is_execution_root);
    }

    #[test]
    fn debug_output_hides_password() {
        let config = ClientConfig::new("admin", "s3cret", None);
        assert!(!format!("{config:?}").contains("s3cret"));
    }
}
