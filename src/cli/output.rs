//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use itertools::Itertools;
use termtree::Tree;

use crate::application::{Diagnostic, Severity};
use crate::domain::{DomainObject, ObjectGraph, ObjectKind, Value};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Print one diagnostic with its severity prefix.
pub fn diagnostic(d: &Diagnostic) {
    match d.severity {
        Severity::Error => error(d),
        Severity::Warning => warning(d),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::List(items) => items.iter().join(", "),
        other => other.to_string(),
    }
}

fn object_node(graph: &ObjectGraph, object: &DomainObject) -> Tree<String> {
    let label = match &object.source_uri {
        Some(uri) => format!("{} [{}]", object.key_name, uri),
        None => format!("{} (constructed)", object.key_name),
    };
    let mut node = Tree::new(label);
    if object.display_name != object.key_name {
        node.push(Tree::new(format!("name: {}", object.display_name)));
    }
    for (tag, value) in &object.attributes {
        node.push(Tree::new(format!("{tag}: {}", value_text(value))));
    }
    for (tag, links) in &object.links {
        let targets = links
            .iter()
            .filter_map(|l| graph.get(l.target))
            .map(|o| o.key_name.as_str())
            .join(", ");
        node.push(Tree::new(format!("{tag} -> {targets}")));
    }
    node
}

/// Render the graph grouped by kind, objects sorted by key.
pub fn graph_tree(graph: &ObjectGraph, only: Option<ObjectKind>) -> Tree<String> {
    let mut root = Tree::new(format!("{} objects", graph.len()));
    for kind in ObjectKind::ALL {
        if only.is_some_and(|k| k != kind) {
            continue;
        }
        let objects = graph.objects_of(kind);
        if objects.is_empty() {
            continue;
        }
        let mut kind_node = Tree::new(format!("{kind} ({})", objects.len()));
        for object in objects {
            kind_node.push(object_node(graph, object));
        }
        root.push(kind_node);
    }
    root
}
