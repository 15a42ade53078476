//! Command-line interface for dolphin.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use colored::*;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use crate::analysis::GoScanner;
use crate::config::{Assume, Config, DEFAULT_CONFIG_NAMES};
use crate::context::{AnalysisResult, Analyzer};
use crate::existing::ExistingTests;
use crate::generate::{Generator, OllamaGenerator};
use crate::prompt;
use crate::resolve::{GoModLocator, GopathLocator, GorootLocator, LocatorChain, WorkspaceLocator};
use crate::select::{Confirm, Decision, FixedConfirm, SelectionConfig, Selector, TerminalConfirm};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Starter configuration written by `dolphin init`.
const CONFIG_TEMPLATE: &str = include_str!("templates/dolphin.yaml");

/// Unit-test prompt builder for Go.
///
/// Dolphin reads a Go file, picks the functions that need tests, resolves
/// the structs their parameters use (across packages), and renders a prompt
/// for a local model. With --generate the prompt is sent to Ollama.
#[derive(Parser)]
#[command(name = "dolphin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a test-generation prompt for a Go file or package
    #[command(visible_alias = "generate")]
    Gen(GenArgs),
    /// Write a starter dolphin.yaml
    Init(InitArgs),
}

/// Arguments for the gen command.
#[derive(Parser)]
pub struct GenArgs {
    /// Go file or directory to analyze
    pub path: PathBuf,

    /// Only this function (disables the existing-test check)
    #[arg(short = 'f', long = "func")]
    pub function: Option<String>,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory that import paths are resolved against
    #[arg(long, alias = "workspace-root")]
    pub module_path: Option<PathBuf>,

    /// Mock library named in the prompt
    #[arg(long)]
    pub mock_lib: Option<String>,

    /// Mock directory named in the prompt
    #[arg(long)]
    pub mock_dir: Option<String>,

    /// Output format: prompt or json
    #[arg(long, default_value = "prompt")]
    pub format: String,

    /// Send the prompt to Ollama and print the generated test
    #[arg(short, long)]
    pub generate: bool,

    /// Ollama model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Ollama base URL
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// Sampling temperature for --generate
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Generate even when a test already exists
    #[arg(short, long, conflicts_with = "skip_existing")]
    pub yes: bool,

    /// Skip functions that already have a test, without asking
    #[arg(long)]
    pub skip_existing: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "dolphin.yaml")]
    pub output: PathBuf,
}

impl GenArgs {
    /// Overlay command-line flags on the file configuration.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.module_path {
            config.module_path = Some(dir.clone());
        }
        if let Some(lib) = &self.mock_lib {
            config.mock_lib = Some(lib.clone());
        }
        if let Some(dir) = &self.mock_dir {
            config.mock_dir = Some(dir.clone());
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(url) = &self.ollama_url {
            config.ollama_url = Some(url.clone());
        }
        if let Some(t) = self.temperature {
            config.temperature = Some(t);
        }
        if self.yes {
            config.assume = Some(Assume::Yes);
        } else if self.skip_existing {
            config.assume = Some(Assume::Skip);
        }
        config
    }
}

/// Locators tried in order: explicit root, go.mod, GOPATH, GOROOT.
pub fn build_locator(module_path: Option<&Path>, target: &Path) -> LocatorChain {
    let mut chain = LocatorChain::new();
    if let Some(root) = module_path {
        chain.push(Box::new(WorkspaceLocator::new(root)));
    }
    if let Some(gomod) = GoModLocator::discover(target) {
        tracing::debug!("module {} at {}", gomod.module(), gomod.root().display());
        chain.push(Box::new(gomod));
    }
    if let Some(gopath) = GopathLocator::from_env() {
        chain.push(Box::new(gopath));
    }
    if let Some(goroot) = GorootLocator::from_env() {
        chain.push(Box::new(goroot));
    }
    chain
}

fn confirm_for(assume: Assume) -> Box<dyn Confirm> {
    match assume {
        Assume::Ask => Box::new(TerminalConfirm::stdio()),
        Assume::Yes => Box::new(FixedConfirm(Decision::Proceed)),
        Assume::Skip => Box::new(FixedConfirm(Decision::SkipAll)),
    }
}

/// Run the gen command.
pub fn run_gen(args: &GenArgs) -> anyhow::Result<i32> {
    if args.format != "prompt" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'prompt' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let cwd = std::env::current_dir()?;
    let config = match Config::load(args.config.as_deref(), &cwd) {
        Ok(c) => args.apply(c),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return Ok(EXIT_ERROR);
    }

    let abs_path = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };

    let existing_tests = if args.function.is_none() && config.should_check_existing() {
        let index = ExistingTests::index(&abs_path, &GoScanner::new())?;
        tracing::info!("found {} existing tests", index.len());
        Some(index)
    } else {
        None
    };

    let selector = Selector::new(
        SelectionConfig {
            function_name: args.function.clone(),
            existing_tests,
        },
        confirm_for(config.assume()),
    );
    let locator = build_locator(config.module_path.as_deref(), &abs_path);
    let mut analyzer = Analyzer::new(Box::new(locator), selector, config.mock());

    let results: Vec<AnalysisResult> = analyzer
        .analyze_path(&abs_path)?
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect();

    let (hits, misses) = analyzer.cache().stats();
    tracing::debug!("struct cache: {} hits, {} misses", hits, misses);

    if results.is_empty() {
        eprintln!("{}", "No functions selected; nothing to generate".yellow());
        return Ok(EXIT_FAILED);
    }

    if args.generate {
        generate_tests(&results, &config)?;
    } else if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for result in &results {
            write_header(result);
            println!("{}", prompt::render(result));
        }
    }

    Ok(EXIT_SUCCESS)
}

fn generate_tests(results: &[AnalysisResult], config: &Config) -> anyhow::Result<()> {
    let mut generator =
        OllamaGenerator::new(config.ollama_url.as_deref(), config.model.as_deref())?;
    if let Some(t) = config.temperature {
        generator = generator.with_temperature(t);
    }
    if !io::stderr().is_terminal() {
        generator = generator.quiet();
    }

    for result in results {
        write_header(result);
        let request = prompt::render(result);

        let mut stdout = io::stdout();
        let mut write_error: Option<io::Error> = None;
        let mut echo = |chunk: &str| {
            if write_error.is_none() {
                write_error = echo_chunk(&mut stdout, chunk).err();
            }
        };
        let code = generator.generate(&request, &mut echo)?;
        if let Some(e) = write_error {
            return Err(anyhow::Error::new(e).context("failed to write streamed output"));
        }

        println!();
        println!("{}", "Generated test:".green().bold());
        println!("{}", code.trim_end());
    }
    Ok(())
}

fn echo_chunk<W: Write>(out: &mut W, chunk: &str) -> io::Result<()> {
    out.write_all(chunk.as_bytes())?;
    out.flush()
}

fn write_header(result: &AnalysisResult) {
    eprintln!(
        "{} {} ({})",
        "==>".cyan().bold(),
        result.file.display().to_string().bold(),
        result.functions.join(", ")
    );
}

/// Run the init command.
///
/// The template is checked against `Config` first, so `init` never writes a
/// file that `gen` would reject.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    let path = &args.output;
    if path.exists() {
        eprintln!(
            "Error: {} already exists; pass --output for another path",
            path.display()
        );
        return Ok(EXIT_ERROR);
    }

    Config::parse(CONFIG_TEMPLATE)
        .and_then(|config| config.validate())
        .context("built-in config template is invalid")?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create {}", dir.display()))?;
    }
    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("cannot write {}", path.display()))?;

    eprintln!("{} {}", "Created".green().bold(), path.display());
    let discoverable = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| DEFAULT_CONFIG_NAMES.contains(&n));
    if discoverable {
        eprintln!("dolphin gen picks it up when run from {}", display_dir(path));
    } else {
        eprintln!("Pass it to dolphin gen with --config {}", path.display());
    }

    Ok(EXIT_SUCCESS)
}

fn display_dir(path: &Path) -> String {
    match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => dir.display().to_string(),
        None => ".".to_string(),
    }
}
