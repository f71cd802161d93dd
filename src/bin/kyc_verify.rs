//! Command-line front end: verify one ID image against form values

use clap::Parser;
use kyc_verify::analyzers::ela::render_ela_image;
use kyc_verify::config::ReasonerConfig;
use kyc_verify::{IdentityForm, KycError, KycVerifier, Submission, VerificationConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "kyc-verify", version, about = "Verify an identity document against form values")]
struct Cli {
    /// Document image (png, jpg or jpeg)
    image: PathBuf,

    #[arg(long, default_value = "", help = "Applicant's full name")]
    full_name: String,

    #[arg(long, visible_alias = "date-of-birth", default_value = "", help = "Date of birth, any format")]
    dob: String,

    #[arg(long, default_value = "", help = "Nationality")]
    nationality: String,

    #[arg(long, default_value = "", help = "Document number")]
    id_number: String,

    #[arg(long, help = "TOML configuration overrides")]
    config: Option<PathBuf>,

    #[arg(long, help = "Also write the error-level image to this path")]
    ela_output: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Run analyzers one after another")]
    sequential: bool,

    #[arg(long, default_value_t = false, help = "Print single-line JSON")]
    compact: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), KycError> {
    let form = IdentityForm {
        full_name: cli.full_name,
        date_of_birth: cli.dob,
        nationality: cli.nationality,
        id_number: cli.id_number,
    };
    form.require_complete()?;

    let config = load_config(cli.config.as_ref(), cli.sequential)?;
    let submission = Submission::from_path(form, &cli.image)?;

    if let Some(path) = &cli.ela_output {
        render_ela_image(submission.image(), &config.ela)?.save(path)?;
        log::info!("Wrote error-level image to {}", path.display());
    }

    let report = KycVerifier::new(config)?.verify(&submission);
    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", json);
    Ok(())
}

/// File overrides on top of defaults; the environment supplies every
/// reasoner setting the file leaves unset
fn load_config(path: Option<&PathBuf>, sequential: bool) -> Result<VerificationConfig, KycError> {
    let from_env = ReasonerConfig::from_env()?;
    let mut config = match path {
        Some(path) => VerificationConfig::from_toml_file_over(path, from_env)?,
        None => VerificationConfig {
            reasoner: from_env,
            ..Default::default()
        },
    };

    if sequential {
        config.parallel_analyzers = false;
    }
    log::debug!("Configuration: {:?}", config);
    Ok(config)
}
