use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{Breakpoint, Element, ElementId, ElementTree, StageContext};
use std::fmt::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Element dump (.json)
    pub input: PathBuf,

    /// Page to show; elements scoped to other pages are marked hidden
    #[arg(short, long)]
    pub page: Option<String>,

    /// Use the mobile breakpoint
    #[arg(short, long)]
    pub mobile: bool,
}

pub fn tree(args: TreeArgs, _cwd: &str) -> Result<()> {
    let source = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    let elements: Vec<Element> = serde_json::from_str(&source)
        .with_context(|| format!("{} is not an element dump", args.input.display()))?;
    let tree = ElementTree::from_elements(elements)?;

    let breakpoint = if args.mobile {
        Breakpoint::Mobile
    } else {
        Breakpoint::Desktop
    };
    let context = StageContext::new(args.page, breakpoint);

    print!("{}", render_tree(&tree, &context, true));
    Ok(())
}

/// Indented outline of `tree`, body first, floating elements last
pub fn render_tree(tree: &ElementTree, context: &StageContext, color: bool) -> String {
    let mut out = String::new();
    let mut visited = std::collections::HashSet::new();

    if let Some(body) = tree.body() {
        render_node(tree, context, &body.id, 0, true, color, &mut visited, &mut out);
    }

    let floating: Vec<&Element> = tree.floating();
    if !floating.is_empty() {
        let _ = writeln!(out, "floating:");
        for element in floating {
            render_node(tree, context, &element.id, 1, true, color, &mut visited, &mut out);
        }
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn render_node(
    tree: &ElementTree,
    context: &StageContext,
    id: &ElementId,
    depth: usize,
    parent_shown: bool,
    color: bool,
    visited: &mut std::collections::HashSet<ElementId>,
    out: &mut String,
) {
    if !visited.insert(id.clone()) {
        return;
    }
    let Some(element) = tree.get(id) else {
        let _ = writeln!(out, "{}{} (missing)", "  ".repeat(depth), id);
        return;
    };

    let shown = parent_shown && (element.is_body || context.shows(element));
    let mut line = format!("{}{} {}", "  ".repeat(depth), element_label(element), element.id);
    if element.selected {
        line.push_str(" *");
    }
    if !element.page_names.is_empty() {
        let _ = write!(line, " [{}]", element.page_names.join(", "));
    }
    if !shown {
        line.push_str(" (hidden)");
    }

    if color && !shown {
        let _ = writeln!(out, "{}", line.dimmed());
    } else {
        let _ = writeln!(out, "{}", line);
    }

    for child in &element.children {
        render_node(tree, context, child, depth + 1, shown, color, visited, out);
    }
}

fn element_label(element: &Element) -> String {
    if element.is_body {
        return "body".to_string();
    }
    serde_json::to_value(element.element_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| element.tag_name.clone())
}
