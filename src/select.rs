//! Function selection.
//!
//! Decides which functions of a file get a test generated. The rules are a
//! pure function of the configuration (`SelectionConfig::evaluate`); the
//! only side effect, asking whether to regenerate a test that already
//! exists, goes through the `Confirm` port.

use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::*;

use crate::analysis::FunctionDecl;
use crate::existing::ExistingTests;
use crate::resolve::TypeRef;

/// Answer to "this function already has a test, generate anyway?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Generate anyway.
    Proceed,
    /// Skip this function.
    Skip,
    /// Skip this and every later overlapping function without asking.
    SkipAll,
}

impl Decision {
    /// Interpret a typed answer. Anything unrecognized skips the function.
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim() {
            "y" | "Y" => Decision::Proceed,
            "s" | "S" => Decision::SkipAll,
            _ => Decision::Skip,
        }
    }
}

/// Confirmation port consulted when a function overlaps an existing test.
pub trait Confirm {
    fn confirm(&mut self, function: &str, test_file: &Path) -> Decision;
}

/// Always gives the same answer; for non-interactive runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirm(pub Decision);

impl Confirm for FixedConfirm {
    fn confirm(&mut self, _function: &str, _test_file: &Path) -> Decision {
        self.0
    }
}

/// Asks on a terminal (or any reader/writer pair).
pub struct TerminalConfirm<R, W> {
    input: R,
    output: W,
}

impl TerminalConfirm<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stderr, read answers from stdin.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalConfirm<R, W> {
    fn confirm(&mut self, function: &str, test_file: &Path) -> Decision {
        let prompt = format!(
            "Function {} already has a unit test in {},\ngenerate anyway? [y/N] or [s] to skip all: ",
            function.bold(),
            test_file.display().to_string().cyan()
        );
        if self.output.write_all(prompt.as_bytes()).is_err() || self.output.flush().is_err() {
            return Decision::Skip;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => Decision::from_answer(&answer),
            Err(_) => Decision::Skip,
        }
    }
}

/// Selection inputs.
#[derive(Debug, Clone, Default)]
pub struct SelectionConfig {
    /// Restrict to this function; disables overlap checks.
    pub function_name: Option<String>,
    /// Tests that already exist.
    pub existing_tests: Option<ExistingTests>,
}

/// Outcome of the selection rules for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<'a> {
    Include,
    Exclude,
    /// Overlaps an existing test; needs confirmation.
    Overlaps { test: &'a str, file: &'a Path },
}

impl SelectionConfig {
    /// Apply the selection rules to a function name.
    pub fn evaluate(&self, function: &str) -> Verdict<'_> {
        if let Some(name) = &self.function_name {
            return if name == function {
                Verdict::Include
            } else {
                Verdict::Exclude
            };
        }

        match self
            .existing_tests
            .as_ref()
            .and_then(|tests| tests.find_overlap(function))
        {
            Some((test, file)) => Verdict::Overlaps { test, file },
            None => Verdict::Include,
        }
    }
}

/// Applies the selection rules and owns the run-wide "skip all" latch.
pub struct Selector {
    config: SelectionConfig,
    confirm: Box<dyn Confirm>,
    skip_all: bool,
}

impl Selector {
    pub fn new(config: SelectionConfig, confirm: Box<dyn Confirm>) -> Self {
        Self {
            config,
            confirm,
            skip_all: false,
        }
    }

    /// Selector that includes every function and never asks.
    pub fn all() -> Self {
        Self::new(SelectionConfig::default(), Box::new(FixedConfirm(Decision::Proceed)))
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Whether "skip all" has been chosen during this run.
    pub fn skip_all_latched(&self) -> bool {
        self.skip_all
    }

    /// Decide whether `func` gets a test, asking the confirm port if needed.
    pub fn qualifies(&mut self, func: &FunctionDecl) -> bool {
        match self.config.evaluate(&func.name) {
            Verdict::Include => true,
            Verdict::Exclude => false,
            Verdict::Overlaps { test, file } => {
                if self.skip_all {
                    tracing::debug!("skipping {}: overlaps {} (skip all)", func.name, test);
                    return false;
                }
                match self.confirm.confirm(&func.name, file) {
                    Decision::Proceed => true,
                    Decision::Skip => {
                        tracing::debug!("skipping {}: overlaps {}", func.name, test);
                        false
                    }
                    Decision::SkipAll => {
                        self.skip_all = true;
                        false
                    }
                }
            }
        }
    }
}

/// Parameter types of `func` that may name structs, left to right.
pub fn candidates(func: &FunctionDecl) -> Vec<TypeRef> {
    func.params
        .iter()
        .filter_map(|param| TypeRef::from_type(&param.ty))
        .collect()
}
