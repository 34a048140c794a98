use anyhow::{Context, Result};
use console::{Style, Term};
use fypass::generator::ALPHABET;
use fypass::password::{MAX_KEYWORDS, MIN_PASSWORD_LENGTH};
use fypass::{GenerationResult, Pbkdf2Config, Source};
use indicatif::{ProgressBar, ProgressStyle};
use rpassword::read_password;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

pub const MIN_SAFE_ENTROPY: f64 = 100.0;
pub const PARANOID_ENTROPY: f64 = 300.0;

pub const MIN_MASTER_BYTES: usize = 16;
pub const MIN_KEYWORD_BYTES: usize = 4;
pub const MIN_KEYWORDS_COUNT: usize = 2;

pub const MAX_MASTER_BYTES: usize = 1024 * 1024;
pub const MAX_KEYWORD_BYTES: usize = 1024 * 1024;

pub const MIN_KDF_ITERATIONS: u32 = 200_000;

pub const MIN_SAFE_PASSWORD_LENGTH: usize = 20;

pub struct InputInfo {
    pub source: Source,
    pub probe_name: Option<&'static str>,
    pub master_byte_length: usize,
    pub master_char_count: usize,
    pub keywords: Vec<KeywordInfo>,
}

pub struct KeywordInfo {
    pub index: usize,
    pub byte_length: usize,
    pub char_count: usize,
}

impl KeywordInfo {
    pub fn describe(keywords: &[String]) -> Vec<Self> {
        keywords
            .iter()
            .enumerate()
            .map(|(i, k)| Self {
                index: i + 1,
                byte_length: k.len(),
                char_count: k.chars().count(),
            })
            .collect()
    }
}

pub struct DisplayOptions {
    pub unicode_support: bool,
    pub color_support: bool,
    pub quiet: bool,
}

pub fn detect_unicode_support() -> bool {
    supports_unicode::on(supports_unicode::Stream::Stdout)
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn get_status_symbols(unicode_support: bool) -> (&'static str, &'static str) {
    if unicode_support {
        ("✓", "!")
    } else {
        ("+", "!")
    }
}

fn tree_glyphs(unicode_support: bool) -> (&'static str, &'static str, &'static str) {
    if unicode_support {
        ("├─", "└─", "│ ")
    } else {
        ("|-", "`-", "| ")
    }
}

fn validate_control_characters(s: &str, input_name: &str) -> Result<String> {
    let positions: Vec<String> = s
        .chars()
        .enumerate()
        .filter(|(_, c)| c.is_control())
        .map(|(pos, _)| pos.to_string())
        .collect();

    if !positions.is_empty() {
        let term = Term::stderr();

        term.write_line(&format!(
            "WARNING: {} contains {} control character(s) at position(s): {}",
            input_name,
            positions.len(),
            positions.join(", ")
        ))?;
        term.write_str("Continue anyway? [y/N]: ")?;
        term.flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;
        let response = response.trim().to_lowercase();

        term.clear_last_lines(2)?;

        if response != "y" && response != "yes" {
            anyhow::bail!("Aborted: {} contains control characters", input_name);
        }
    }

    Ok(s.to_string())
}

/// Trims and NFC-normalizes user input so that visually identical keywords
/// always reach the deriver as the same bytes.
pub fn normalize_and_validate(s: &str, input_name: &str) -> Result<String> {
    let normalized: String = s.trim().nfc().collect();
    validate_control_characters(&normalized, input_name)
}

pub fn prompt_master_key() -> Result<Zeroizing<String>> {
    print!("Master key: ");
    io::stdout().flush()?;

    let key = Zeroizing::new(read_password().context("Failed to read master key")?);
    let normalized = Zeroizing::new(normalize_and_validate(&key, "Master key")?);

    if normalized.is_empty() {
        anyhow::bail!("Master key cannot be empty");
    }
    if normalized.len() > MAX_MASTER_BYTES {
        anyhow::bail!(
            "Master key too long ({} bytes, maximum is {})",
            normalized.len(),
            MAX_MASTER_BYTES
        );
    }

    Ok(normalized)
}

pub fn normalize_keywords(raw: &[String]) -> Result<Vec<String>> {
    raw.iter()
        .enumerate()
        .map(|(i, k)| {
            let normalized = normalize_and_validate(k, &format!("Keyword {}", i + 1))?;
            check_keyword_length(i + 1, &normalized)?;
            Ok(normalized)
        })
        .collect()
}

fn check_keyword_length(index: usize, keyword: &str) -> Result<()> {
    if keyword.len() > MAX_KEYWORD_BYTES {
        anyhow::bail!(
            "Keyword {} too long ({} bytes, maximum is {})",
            index,
            keyword.len(),
            MAX_KEYWORD_BYTES
        );
    }
    Ok(())
}

pub fn prompt_keywords() -> Result<Vec<String>> {
    let mut keywords = Vec::new();

    while keywords.len() < MAX_KEYWORDS {
        let index = keywords.len() + 1;
        print!("In [{}]: ", index);
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let trimmed = input.trim();
        if trimmed.is_empty() {
            if keywords.is_empty() {
                eprintln!("At least one keyword is required");
                continue;
            }
            break;
        }

        let normalized = normalize_and_validate(trimmed, &format!("Keyword {}", index))?;
        check_keyword_length(index, &normalized)?;
        keywords.push(normalized);
    }

    if keywords.is_empty() {
        anyhow::bail!("At least one keyword is required");
    }
    if keywords.len() == MAX_KEYWORDS {
        eprintln!("Maximum of {} keywords reached", MAX_KEYWORDS);
    }

    Ok(keywords)
}

pub fn prompt_again() -> Result<bool> {
    print!("\nGenerate another? [Y/n]: ");
    io::stdout().flush()?;

    let mut response = String::new();
    if io::stdin().read_line(&mut response)? == 0 {
        return Ok(false);
    }
    let response = response.trim().to_lowercase();
    Ok(response.is_empty() || response == "y" || response == "yes")
}

pub fn show_progress<F, T>(unicode_support: bool, f: F) -> Result<(T, Duration)>
where
    F: FnOnce() -> Result<T>,
{
    println!();

    let term = Term::stdout();
    term.hide_cursor().ok();

    let pb = ProgressBar::new_spinner();

    if unicode_support {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
    } else {
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("-\\|/-"),
        );
    }

    pb.set_message("Deriving password...");
    pb.enable_steady_tick(Duration::from_millis(80));

    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();

    pb.finish_and_clear();
    term.show_cursor().ok();

    result.map(|r| (r, elapsed))
}

pub fn entropy_bits(length: usize) -> f64 {
    length as f64 * (ALPHABET.len() as f64).log2()
}

fn status_style(secure: bool, options: &DisplayOptions) -> Style {
    if !options.color_support {
        Style::new()
    } else if secure {
        Style::new().green()
    } else {
        Style::new().yellow()
    }
}

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 { one } else { many }
}

pub fn display_output(
    result: &GenerationResult,
    input_info: &InputInfo,
    kdf_config: &Pbkdf2Config,
    elapsed: Duration,
    options: &DisplayOptions,
) {
    let password = result.password.as_deref().unwrap_or_default();

    if options.quiet {
        println!("{}", password);
        return;
    }

    println!("Out[0]:\n{}\n", password);
    display_settings(input_info, result.length, kdf_config, options);
    display_stats(entropy_bits(result.length), result.length, elapsed, options);
}

fn display_settings(
    input_info: &InputInfo,
    length: usize,
    kdf_config: &Pbkdf2Config,
    options: &DisplayOptions,
) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let (branch, last, pipe) = tree_glyphs(options.unicode_support);

    let kdf_secure = kdf_config.iterations >= MIN_KDF_ITERATIONS;
    let kdf_style = status_style(kdf_secure, options);

    println!("Settings:");

    println!(
        "  {} KDF        {} PBKDF2-HMAC-SHA256 ({} iterations, fixed salt)",
        branch,
        kdf_style.apply_to(format!("[{}]", if kdf_secure { check_ok } else { check_warn })),
        kdf_style.apply_to(kdf_config.iterations)
    );

    match input_info.source {
        Source::Fingerprint => {
            println!(
                "  {} Master     [{}] hardware fingerprint ({} probe)",
                branch,
                check_ok,
                input_info.probe_name.unwrap_or("fixed")
            );
        }
        Source::Manual => {
            let secure = input_info.master_byte_length >= MIN_MASTER_BYTES;
            let style = status_style(secure, options);
            println!(
                "  {} Master     {} {} {} ({} {})",
                branch,
                style.apply_to(format!("[{}]", if secure { check_ok } else { check_warn })),
                style.apply_to(input_info.master_byte_length),
                plural(input_info.master_byte_length, "byte", "bytes"),
                style.apply_to(input_info.master_char_count),
                plural(input_info.master_char_count, "char", "chars")
            );
        }
    }

    let keywords_secure = input_info.keywords.len() >= MIN_KEYWORDS_COUNT;
    let keywords_style = status_style(keywords_secure, options);

    println!(
        "  {} Keywords   {} {} {}",
        branch,
        keywords_style.apply_to(format!(
            "[{}]",
            if keywords_secure { check_ok } else { check_warn }
        )),
        keywords_style.apply_to(input_info.keywords.len()),
        plural(input_info.keywords.len(), "keyword", "keywords")
    );

    for (i, keyword) in input_info.keywords.iter().enumerate() {
        let prefix = if i == input_info.keywords.len() - 1 {
            last
        } else {
            branch
        };
        let secure = keyword.byte_length >= MIN_KEYWORD_BYTES;
        let style = status_style(secure, options);

        println!(
            "  {}  {} {} In [{}]: {} {} ({} {})",
            pipe,
            prefix,
            style.apply_to(format!("[{}]", if secure { check_ok } else { check_warn })),
            keyword.index,
            style.apply_to(keyword.byte_length),
            plural(keyword.byte_length, "byte", "bytes"),
            style.apply_to(keyword.char_count),
            plural(keyword.char_count, "char", "chars")
        );
    }

    println!("  {} Classes    upper, lower, digit, symbol", branch);
    println!("  {} Shuffle    ChaCha20 keystream (256-bit)", branch);
    println!("  {} Output     {} {}", last, length, plural(length, "char", "chars"));

    println!();
}

fn display_stats(entropy: f64, length: usize, elapsed: Duration, options: &DisplayOptions) {
    let (check_ok, check_warn) = get_status_symbols(options.unicode_support);
    let (branch, last, _) = tree_glyphs(options.unicode_support);

    let (status_icon, entropy_style, status_text) = if entropy >= PARANOID_ENTROPY {
        (check_ok, status_style(true, options), "Paranoid")
    } else if entropy >= MIN_SAFE_ENTROPY {
        (check_ok, status_style(true, options), "Strong")
    } else {
        (check_warn, status_style(false, options), "Weak")
    };

    let length_secure = length >= MIN_SAFE_PASSWORD_LENGTH;
    let length_style = status_style(length_secure, options);
    let length_status = if length_secure { check_ok } else { check_warn };

    println!("Stats:");

    println!(
        "  {} Entropy    {} {} bits ({})",
        branch,
        entropy_style.apply_to(format!("[{}]", status_icon)),
        entropy_style.apply_to(format!("{:.1}", entropy)),
        entropy_style.apply_to(status_text)
    );

    println!(
        "  {} Length     {} {} {} (minimum {})",
        branch,
        length_style.apply_to(format!("[{}]", length_status)),
        length_style.apply_to(length),
        plural(length, "char", "chars"),
        MIN_PASSWORD_LENGTH
    );

    println!("  {} Charset    {} chars", branch, ALPHABET.len());
    println!("  {} Time       {:.1}s", last, elapsed.as_secs_f64());

    println!(
        "\n{} Security: {}",
        entropy_style.apply_to(format!("[{}]", status_icon)),
        entropy_style.apply_to(status_text)
    );
}

pub fn display_error(message: &str, options: &DisplayOptions) {
    let style = if options.color_support {
        Style::new().red()
    } else {
        Style::new()
    };
    eprintln!("{} {}", style.apply_to("Error:"), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_status_symbols_unicode() {
        let (ok, warn) = get_status_symbols(true);
        assert_eq!(ok, "✓");
        assert_eq!(warn, "!");
    }

    #[test]
    fn test_get_status_symbols_ascii() {
        let (ok, warn) = get_status_symbols(false);
        assert_eq!(ok, "+");
        assert_eq!(warn, "!");
    }

    #[test]
    fn test_normalize_nfc() {
        let nfc = "café";
        let nfd = "cafe\u{0301}";

        assert_ne!(nfc.as_bytes(), nfd.as_bytes());

        let normalized_nfc = normalize_and_validate(nfc, "test").unwrap();
        let normalized_nfd = normalize_and_validate(nfd, "test").unwrap();

        assert_eq!(normalized_nfc.as_bytes(), normalized_nfd.as_bytes());
    }

    #[test]
    fn test_trim_whitespace() {
        let cases = vec![
            ("  github  ", "github"),
            ("\tgithub\t", "github"),
            ("\ngithub\n", "github"),
            ("  work mail  ", "work mail"),
        ];

        for (input, expected) in cases {
            assert_eq!(normalize_and_validate(input, "test").unwrap(), expected);
        }
    }

    #[test]
    fn test_normalize_keywords() {
        let raw = vec!["  Site ".to_string(), "cafe\u{0301}".to_string()];
        let keywords = normalize_keywords(&raw).unwrap();
        assert_eq!(keywords, vec!["Site".to_string(), "café".to_string()]);
    }

    #[test]
    fn test_keyword_info() {
        let infos = KeywordInfo::describe(&["site".to_string(), "жизнь".to_string()]);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].index, 1);
        assert_eq!(infos[1].byte_length, 10);
        assert_eq!(infos[1].char_count, 5);
    }

    #[test]
    fn test_entropy_bits() {
        assert!((entropy_bits(1) - 88f64.log2()).abs() < 1e-9);
        assert!(entropy_bits(8) < MIN_SAFE_ENTROPY);
        assert!(entropy_bits(32) > MIN_SAFE_ENTROPY);
        assert!(entropy_bits(128) > PARANOID_ENTROPY);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "char", "chars"), "char");
        assert_eq!(plural(2, "char", "chars"), "chars");
    }
}
