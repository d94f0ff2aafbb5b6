// UI layer: spinner while a request is in flight, the optional password
// prompt, and the one-line summaries printed after each step.

use crate::api::CrxClient;
use crate::config::{
    BuildContext, ClientConfig, ConnectionArgs, InstallArgs, InstallConfig, UploadArgs,
    UploadConfig,
};
use crate::install::{InstallReport, Installer};
use crate::logging;
use crate::upload::{UploadReport, Uploader};
use anyhow::{Context, Result};
use dialoguer::Password;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Build the HTTP client, prompting for the password when asked to.
pub fn connect(args: &ConnectionArgs) -> Result<CrxClient> {
    let password = if args.ask_password {
        Password::new()
            .with_prompt(format!("Password for {}", args.user))
            .interact()
            .context("Failed to read password")?
    } else {
        args.password.clone()
    };
    let config = ClientConfig::new(&args.user, &password, args.timeout_secs);
    CrxClient::new(config).context("Failed to build HTTP client")
}

/// Run `f` with a spinner showing `message`; the spinner is cleared once
/// `f` returns. Log lines emitted meanwhile suspend it (see `logging`).
fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let progress = logging::progress();
    let spinner = progress.add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    progress.remove(&spinner);
    out
}

/// `upload` command: upload the file and print the repository path.
pub fn handle_upload(client: &CrxClient, url: &str, args: &UploadArgs) -> Result<()> {
    let config = UploadConfig::from_args(url, args.force, &args.step);
    let context = BuildContext::from_dirs(&args.step.project_dir, &args.step.execution_root);

    let report = with_spinner("Uploading...", || {
        Uploader::new(client, &config, context).run(&args.file)
    })
    .with_context(|| format!("Uploading {}", args.file.display()))?;

    if let UploadReport::Uploaded(result) = report {
        println!("{}", result.path);
    }
    Ok(())
}

/// `install` command: optionally upload first, then install whatever path
/// the upload produced or the one configured.
pub fn handle_install(client: &CrxClient, url: &str, args: &InstallArgs) -> Result<()> {
    let context = BuildContext::from_dirs(&args.step.project_dir, &args.step.execution_root);

    let upload = match &args.file {
        Some(file) => {
            let config = UploadConfig::from_args(url, args.force, &args.step);
            let report = with_spinner("Uploading...", || {
                Uploader::new(client, &config, context).run(file)
            })
            .with_context(|| format!("Uploading {}", file.display()))?;
            Some(report)
        }
        None => None,
    };

    let config = InstallConfig::from_args(url, args);
    let report = with_spinner("Installing...", || {
        let uploaded = upload.as_ref().and_then(UploadReport::result);
        Installer::new(client, &config, context).run(uploaded)
    })?;

    match report {
        InstallReport::Installed => println!("Package installed."),
        InstallReport::InstalledWithErrors(errors) => {
            println!("Package installed with {} ignored error(s).", errors.len())
        }
        InstallReport::Skipped(_) | InstallReport::MissingPackagePath => {}
    }
    Ok(())
}
