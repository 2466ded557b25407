use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

// Import from prcheck-core
use prcheck_core::config::{CheckConfig, ReportFormat, SpellingBackend};
use prcheck_core::{aborted_report, report_path, FormProcessor, Report};

// Import CLI utilities
use prcheck_cli::locations::CONFIG_FILE;
use prcheck_cli::Locations;

#[derive(Parser)]
#[command(name = "prcheck")]
#[command(version)]
#[command(about = "Check a performance report form against the PR Structure rules workbook")]
struct Args {
    /// Path to the XFDL form to check
    #[arg(required_unless_present = "show_configs")]
    input: Option<String>,

    /// Rules workbook (default: "PR Structure.ods" in the working or config directory)
    #[arg(short, long)]
    rules: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Report OK results as well as failures and warnings
    #[arg(short, long)]
    verbose: bool,

    /// With --verbose, list the loaded rule tables in the report
    #[arg(long)]
    dump_rules: bool,

    /// Report file path (default: <form file name>.out next to the working directory)
    #[arg(short, long)]
    output: Option<String>,

    /// Report format
    #[arg(short = 'f', long, value_enum)]
    format: Option<FormatArg>,

    /// Spell checker backend
    #[arg(long, value_enum)]
    spell: Option<SpellArg>,

    /// Hunspell dictionary (.dic/.aff pair or their stem) for the dictionary spell checker
    #[arg(long)]
    dictionary: Option<String>,

    /// Print the report to stdout as well as saving it
    #[arg(long)]
    print: bool,

    /// Enable detailed profiling of all run steps
    #[arg(long)]
    profile: bool,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ReportFormat::Text,
            FormatArg::Json => ReportFormat::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SpellArg {
    Auto,
    Command,
    Dictionary,
    Off,
}

impl From<SpellArg> for SpellingBackend {
    fn from(arg: SpellArg) -> Self {
        match arg {
            SpellArg::Auto => SpellingBackend::Auto,
            SpellArg::Command => SpellingBackend::Command,
            SpellArg::Dictionary => SpellingBackend::Dictionary,
            SpellArg::Off => SpellingBackend::Off,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("prcheck=info".parse()?))
        .init();

    println!("🦀 PR Checker v{}", env!("CARGO_PKG_VERSION"));

    if args.show_configs {
        show_help(&Locations::new());
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        anyhow::bail!("No form given. Usage: prcheck [OPTIONS] <INPUT>");
    };

    // Check if input file exists
    if !Path::new(input).exists() {
        eprintln!("⚠️  Form not found at: {input}");
        std::process::exit(1);
    }

    let locations = Locations::new();

    // Load config using functional pattern, then apply CLI overrides
    let config_path = locations.config_file(args.config.as_deref());
    let mut config = CheckConfig::load_with_fallback(config_path.as_deref().and_then(Path::to_str));
    match &config_path {
        Some(path) => println!("📋 Loaded config from: {}", path.display()),
        None => println!("📋 Using default config"),
    }
    apply_overrides(&mut config, &args);
    debug!(?config, "effective config");

    println!("📄 Checking: {input}");

    let output_path = match &args.output {
        Some(path) => PathBuf::from(path),
        None => report_path(Path::new(input), &config.output),
    };
    let rules_path = match locations.rules_file(args.rules.as_deref()) {
        Ok(path) => path,
        Err(e) => {
            let report = aborted_report(Path::new(input), e.to_string());
            save_report(&report, &output_path, config.output.format)?;
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };
    println!("📚 Rules: {}", rules_path.display());
    let mut processor = FormProcessor::new(config).with_profiling(args.profile);
    let format = processor.config().output.format;
    if !processor.accepts_form(Path::new(input)) {
        println!("⚠️  {input} does not have an .xfdl extension, checking anyway");
    }
    if !processor.accepts_rules(&rules_path) {
        println!("⚠️  {} does not have an .ods extension, checking anyway", rules_path.display());
    }
    let report = processor.check_files(&rules_path, Path::new(input));

    save_report(&report, &output_path, format)?;
    if args.print {
        println!("\n{}", report.render(format)?);
    }

    if report.is_aborted() {
        eprintln!("❌ Form could not be checked, see {}", output_path.display());
        std::process::exit(1);
    }

    if let Some(summary) = report.summary() {
        let status = if summary.passed() { "✅" } else { "⚠️ " };
        println!(
            "{status} {}, {}",
            summary.warning_line(),
            summary.fail_line()
        );
        if summary.version_failures > 0 {
            println!("⚠️  Form version does not match the rules workbook");
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut CheckConfig, args: &Args) {
    if args.verbose {
        config.verbose = true;
    }
    if args.dump_rules {
        config.dump_rules = true;
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    if let Some(spell) = args.spell {
        config.spelling.backend = spell.into();
    }
    if let Some(dictionary) = &args.dictionary {
        config.spelling.dictionary = Some(PathBuf::from(dictionary));
        // A word list on the command line means: use it
        if args.spell.is_none() {
            config.spelling.backend = SpellingBackend::Dictionary;
        }
    }
}

fn save_report(report: &Report, output_path: &Path, format: ReportFormat) -> Result<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    report
        .save_with_format(&output_path.to_string_lossy(), format)
        .with_context(|| format!("writing report {}", output_path.display()))?;
    println!("💾 Report saved to: {}", output_path.display());
    Ok(())
}

fn show_help(locations: &Locations) {
    println!("\n📋 Available Configuration Options:");
    println!("  <INPUT>                 XFDL form to check");
    println!("  --rules <path>          Rules workbook (default: \"PR Structure.ods\")");
    println!("  --config <path>         Load custom config file (default: prcheck.yaml)");
    println!("  --verbose               Report OK results too");
    println!("  --dump-rules            With --verbose, list the loaded rule tables");
    println!("  --output <path>         Report path (default: <form>.out)");
    println!("  --format <fmt>          Report format: text or json");
    println!("  --spell <backend>       Spell checker: auto, command, dictionary or off");
    println!("  --dictionary <path>     Hunspell .dic/.aff pair for the dictionary spell checker");
    println!("  --print                 Also print the report to stdout");
    println!("  --profile               Time each run step");

    println!("\n📄 Config file keys (YAML):");
    println!("  verbose, dump_rules");
    println!("  document_types   - title marker → type code, e.g. Officer → OPR");
    println!("  sheets           - rule sheet names; {{TYPE}} is replaced by the type code");
    println!("  spelling         - backend, command, dictionary, timeout_ms, max_suggestions");
    println!("  output           - format, directory");

    println!("\n📁 Config lookup order:");
    println!("  1. --config <path>");
    println!("  2. ./prcheck.yaml");
    match locations.config_dir() {
        Some(dir) => println!("  3. {}", dir.join(CONFIG_FILE).display()),
        None => println!("  3. <user config dir>/prcheck/prcheck.yaml"),
    }

    println!("\n📝 Usage Examples:");
    println!("  prcheck jones_opr.xfdl");
    println!("  prcheck jones_opr.xfdl --rules \"PR Structure.ods\" -v");
    println!("  prcheck jones_opr.xfdl --format json -o reports/jones.json");
    println!("  prcheck jones_opr.xfdl --spell dictionary --dictionary /usr/share/hunspell/en_US");
}
