use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{Element, ElementTree, StoreError};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Element dump (.json) or directory of dumps
    pub input: PathBuf,

    /// List files without issues too
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub rule: &'static str,
    pub message: String,
}

impl Diagnostic {
    fn error(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            rule,
            message: message.into(),
        }
    }

    fn warning(rule: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            rule,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FileReport<'a> {
    file: String,
    diagnostics: &'a [Diagnostic],
}

fn rule_name(error: &StoreError) -> &'static str {
    match error {
        StoreError::NotFound(_) => "missing-element",
        StoreError::DuplicateId(_) => "duplicate-id",
        StoreError::DanglingChild { .. } => "dangling-child",
        StoreError::DuplicateChild { .. } => "duplicate-child",
        StoreError::MultipleParents { .. } => "multiple-parents",
        StoreError::Cycle(_) => "cycle",
        StoreError::Body(_) => "body",
        StoreError::SectionPairing { .. } => "section-pairing",
        StoreError::IdMismatch { .. } => "id-mismatch",
        StoreError::OrphanedDescendant { .. } => "orphaned-descendant",
    }
}

/// Diagnostics for one parsed element dump
pub fn check_elements(elements: Vec<Element>) -> Vec<Diagnostic> {
    let tree = match ElementTree::from_elements(elements) {
        Ok(tree) => tree,
        Err(err) => return vec![Diagnostic::error(rule_name(&err), err.to_string())],
    };

    let mut diagnostics: Vec<Diagnostic> = tree
        .check()
        .iter()
        .map(|err| Diagnostic::error(rule_name(err), err.to_string()))
        .collect();

    for element in tree.floating() {
        diagnostics.push(Diagnostic::warning(
            "floating-element",
            format!("{} is not attached to any parent", element.id),
        ));
    }

    let selected = tree.selected();
    if selected.len() > 1 && selected.iter().any(|e| e.is_body) {
        diagnostics.push(Diagnostic::warning(
            "body-selected",
            "the body is selected together with other elements",
        ));
    }

    for element in tree.iter() {
        if !element.visibility.desktop && !element.visibility.mobile {
            diagnostics.push(Diagnostic::warning(
                "hidden-everywhere",
                format!("{} is hidden on every breakpoint", element.id),
            ));
        }
    }

    diagnostics
}

pub fn check(args: CheckArgs, _cwd: &str) -> Result<()> {
    let json = args.format == "json";
    if !json {
        println!("🔍 {} Pagecraft document check", "Starting".green().bold());
        println!("   Input: {}", args.input.display());
        println!();
    }

    let files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        let files = find_dump_files(&args.input);
        if !json {
            println!("   Found {} .json files", files.len());
            println!();
        }
        files
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    };

    let mut total_errors = 0;
    let mut total_warnings = 0;
    let mut reports = Vec::new();

    for file in &files {
        let diagnostics = check_file(file)?;
        total_errors += diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count();
        total_warnings += diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Warning)
            .count();

        if json {
            reports.push((file.display().to_string(), diagnostics));
        } else {
            print_text(file, &diagnostics, args.verbose);
        }
    }

    if json {
        let reports: Vec<FileReport> = reports
            .iter()
            .map(|(file, diagnostics)| FileReport {
                file: file.clone(),
                diagnostics,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!();
        println!(
            "✨ {} Check complete!",
            if total_errors > 0 {
                "Done".red().bold()
            } else {
                "Done".green().bold()
            }
        );
        println!("   Files checked: {}", files.len());
        if total_errors > 0 {
            println!("   {} {}", "Errors:".red(), total_errors);
        }
        if total_warnings > 0 {
            println!("   {} {}", "Warnings:".yellow(), total_warnings);
        }
        if total_errors == 0 && total_warnings == 0 {
            println!("   {} No issues found!", "✓".green());
        }
    }

    if total_errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn check_file(path: &Path) -> Result<Vec<Diagnostic>> {
    let source = fs::read_to_string(path)?;
    match serde_json::from_str::<Vec<Element>>(&source) {
        Ok(elements) => {
            tracing::debug!(file = %path.display(), elements = elements.len(), "checking dump");
            Ok(check_elements(elements))
        }
        Err(err) => Ok(vec![Diagnostic::error("parse", err.to_string())]),
    }
}

fn print_text(path: &Path, diagnostics: &[Diagnostic], verbose: bool) {
    if diagnostics.is_empty() {
        if verbose {
            println!("{} {}", "✓".green(), path.display());
        }
        return;
    }

    println!("{}", path.display());
    for diagnostic in diagnostics {
        let level = match diagnostic.level {
            DiagnosticLevel::Error => "error".red().bold(),
            DiagnosticLevel::Warning => "warning".yellow().bold(),
        };
        println!("  {} [{}] {}", level, diagnostic.rule, diagnostic.message);
    }
    println!();
}

fn find_dump_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false))
        .collect()
}
