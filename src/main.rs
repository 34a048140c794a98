mod ui;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use fypass::{
    Fingerprint, FingerprintSource, GenerationRequest, HardwareFingerprinter, PasswordCore,
    Pbkdf2Config, Source,
};
use fypass::password::{DEFAULT_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use std::time::Instant;
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(
    name = "fypass",
    version,
    author,
    about = "Deterministic password generator using PBKDF2-HMAC-SHA256"
)]
struct Cli {
    /// Master key: this machine's hardware fingerprint or a manual key
    #[arg(long, value_enum, default_value = "fingerprint")]
    source: MasterSource,

    /// Use this fingerprint instead of probing the local hardware
    #[arg(long, value_name = "HEX")]
    fingerprint: Option<Fingerprint>,

    /// Keyword, in order (repeatable, up to 10). Prompted when omitted
    #[arg(short = 'k', long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Password length (8-128)
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_PASSWORD_LENGTH,
        value_parser = parse_length
    )]
    length: usize,

    #[arg(short, long, value_enum, default_value = "standard")]
    security: SecurityLevel,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Print only the password
    #[arg(short, long)]
    quiet: bool,

    /// Print this machine's fingerprint and exit
    #[arg(long)]
    show_fingerprint: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum MasterSource {
    Fingerprint,
    Manual,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
enum SecurityLevel {
    Standard,
    Paranoid,
}

fn parse_length(s: &str) -> Result<usize, String> {
    let length: usize = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        Ok(length)
    } else {
        Err(format!(
            "must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH}"
        ))
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("FYPASS_LOG", default_filter))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let kdf_config = match cli.security {
        SecurityLevel::Standard => Pbkdf2Config::STANDARD,
        SecurityLevel::Paranoid => Pbkdf2Config::PARANOID,
    };

    let (fingerprinter, probe_name) = match cli.fingerprint.clone() {
        Some(fp) => (Box::new(fp) as Box<dyn FingerprintSource>, None),
        None => {
            let hw = HardwareFingerprinter::new();
            let name = hw.probe_name();
            (Box::new(hw) as Box<dyn FingerprintSource>, Some(name))
        }
    };
    let core = PasswordCore::with_fingerprinter(fingerprinter).with_kdf_config(kdf_config);

    if cli.show_fingerprint {
        println!("{}", core.fingerprint());
        return Ok(());
    }

    let options = ui::DisplayOptions {
        unicode_support: ui::detect_unicode_support(),
        color_support: ui::detect_color_support(),
        quiet: cli.quiet,
    };

    let use_default_fingerprint = cli.source == MasterSource::Fingerprint;
    let source = if use_default_fingerprint {
        Source::Fingerprint
    } else {
        Source::Manual
    };
    log::debug!(
        "master key source: {}, {} PBKDF2 iterations",
        source.as_str(),
        core.kdf_config().iterations
    );
    let master_key = if use_default_fingerprint {
        Zeroizing::new(String::new())
    } else {
        ui::prompt_master_key()?
    };

    let interactive = cli.keywords.is_empty();
    let preset_keywords = ui::normalize_keywords(&cli.keywords)?;

    loop {
        let keywords = if interactive {
            ui::prompt_keywords()?
        } else {
            preset_keywords.clone()
        };

        let request = GenerationRequest {
            master_key: master_key.as_str().to_string(),
            user_keys: keywords,
            length: cli.length,
            use_default_fingerprint,
        };

        let (result, elapsed) = if cli.json || cli.quiet {
            let start = Instant::now();
            (core.generate(&request), start.elapsed())
        } else {
            ui::show_progress(options.unicode_support, || Ok(core.generate(&request)))?
        };

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        } else if let Some(error) = result.error.as_deref() {
            ui::display_error(error, &options);
            if !interactive {
                std::process::exit(1);
            }
        } else {
            let info = ui::InputInfo {
                source: result.source,
                probe_name,
                master_byte_length: master_key.len(),
                master_char_count: master_key.chars().count(),
                keywords: ui::KeywordInfo::describe(&result.keys_used),
            };
            ui::display_output(&result, &info, &core.kdf_config(), elapsed, &options);
        }

        if !interactive || !ui::prompt_again()? {
            break;
        }
        println!();
    }

    Ok(())
}
