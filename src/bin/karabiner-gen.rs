// Karabiner Config Generator CLI
// Compiles a TOML rule file into karabiner.json

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use karabiner_core::config::Config;
use karabiner_core::KarabinerConfig;

/// Karabiner-Elements configuration compiler
#[derive(Parser, Debug)]
#[command(name = "karabiner-gen")]
#[command(version)]
#[command(about = "Compile a TOML rule file into karabiner.json", long_about = None)]
struct Args {
    /// TOML rule file
    #[arg(short, long, value_name = "CONFIG")]
    config: PathBuf,

    /// Output file (default: ~/.config/karabiner/karabiner.json)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the document to stdout instead of writing a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Validate the rule file and exit
    #[arg(long)]
    check_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn output_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.output {
            return Ok(path.clone());
        }
        let home = dirs::home_dir().context("cannot determine home directory; pass --output")?;
        Ok(home.join(".config").join("karabiner").join("karabiner.json"))
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn render(document: &KarabinerConfig) -> Result<String> {
    let mut text = document.to_json().context("failed to serialize document")?;
    text.push('\n');
    Ok(text)
}

/// Write through a sibling temporary file so a failed run never leaves a
/// truncated document behind
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let file_name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => bail!("output path {} has no file name", path.display()),
    };
    let tmp = dir.join(format!(".{file_name}.tmp"));

    let mut file =
        fs::File::create(&tmp).with_context(|| format!("failed to create {}", tmp.display()))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.sync_all())
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("failed to replace {}", path.display()));
    }
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = Config::from_toml_path(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let text = render(&config.to_document())?;

    if args.check_config {
        println!(
            "Configuration is valid: {} rule(s) in profile '{}'",
            config.profile.complex_rules().len(),
            config.profile.name()
        );
        return Ok(());
    }

    if args.stdout {
        print!("{text}");
        return Ok(());
    }

    let path = args.output_path()?;
    write_atomically(&path, &text)?;
    info!("wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(&args)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"
        [[rule]]
        description = "caps"
        [[rule.remap]]
        from = "caps_lock"
        to = "right_control"
        alone = "escape"
    "#;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["karabiner-gen", "--config", "/tmp/rules.toml"]);

        assert_eq!(args.config, PathBuf::from("/tmp/rules.toml"));
        assert!(args.output.is_none());
        assert!(!args.stdout);
        assert!(!args.check_config);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_with_options() {
        let args = Args::parse_from([
            "karabiner-gen",
            "-c",
            "rules.toml",
            "--output",
            "/tmp/karabiner.json",
            "--verbose",
            "--check-config",
        ]);

        assert_eq!(args.output, Some(PathBuf::from("/tmp/karabiner.json")));
        assert_eq!(args.output_path().unwrap(), PathBuf::from("/tmp/karabiner.json"));
        assert!(args.verbose);
        assert!(args.check_config);
    }

    #[test]
    fn test_config_is_required() {
        assert!(Args::try_parse_from(["karabiner-gen", "--stdout"]).is_err());
    }

    #[test]
    fn test_stdout_conflicts_with_output() {
        let result = Args::try_parse_from([
            "karabiner-gen",
            "--config",
            "rules.toml",
            "--stdout",
            "--output",
            "out.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.toml");
        fs::write(&rules, RULES).unwrap();
        let output = dir.path().join("nested").join("karabiner.json");

        let args = Args::parse_from([
            "karabiner-gen",
            "--config",
            rules.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        run(&args).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\"to_if_alone\""));
        assert!(!dir.path().join("nested").join(".karabiner.json.tmp").exists());
    }

    #[test]
    fn test_run_reports_bad_rules() {
        let dir = tempfile::tempdir().unwrap();
        let rules = dir.path().join("rules.toml");
        fs::write(&rules, "[[rule]]\ndescription = \"x\"\n[[rule.remap]]\nto = \"a\"\n").unwrap();
        let output = dir.path().join("karabiner.json");

        let args = Args::parse_from([
            "karabiner-gen",
            "--config",
            rules.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ]);
        let err = run(&args).unwrap_err();

        assert!(format!("{err:#}").contains("from()"));
        assert!(!output.exists());
    }
}
