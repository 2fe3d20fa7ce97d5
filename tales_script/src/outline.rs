//! Tree-shaped text rendering of a parsed [`Program`], used by `tales_script outline`.

use crate::ast::{Element, ElementId, Program};
use std::fmt::Write;

const TEE: &str = "├── ";
const ELBOW: &str = "└── ";
const PIPE: &str = "│   ";
const BLANK: &str = "    ";

/// Longest text excerpt shown per node.
const EXCERPT: usize = 40;

/// Render every scene as an indented tree.
pub fn render_outline(program: &Program) -> String {
    let mut out = String::new();
    let scenes = program.scene_ids();
    if scenes.is_empty() {
        out.push_str("(no scenes)\n");
        return out;
    }
    for (idx, id) in scenes.iter().enumerate() {
        render_node(program, *id, "", idx + 1 == scenes.len(), &mut out);
    }
    out
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(EXCERPT).collect();
        format!("{cut}...")
    }
}

fn render_list(program: &Program, list: &[ElementId], prefix: &str, out: &mut String) {
    for (idx, id) in list.iter().enumerate() {
        render_node(program, *id, prefix, idx + 1 == list.len(), out);
    }
}

fn render_node(program: &Program, id: ElementId, prefix: &str, last: bool, out: &mut String) {
    let connector = if last { ELBOW } else { TEE };
    let child_prefix = format!("{prefix}{}", if last { BLANK } else { PIPE });
    let Some(element) = program.get(id) else {
        let _ = writeln!(out, "{prefix}{connector}<missing {id}>");
        return;
    };
    match element {
        Element::Scene(scene) => {
            let _ = writeln!(out, "{prefix}{connector}scene '{}' {id} (line {})", scene.name, scene.line);
            render_list(program, &scene.content, &child_prefix, out);
        },
        Element::Dialogue(dialogue) => {
            let _ = writeln!(
                out,
                "{prefix}{connector}{}: \"{}\" {id}",
                dialogue.speaker,
                excerpt(&dialogue.text)
            );
            for effect in &dialogue.effects {
                let _ = writeln!(out, "{child_prefix}  effect {{{effect}}}");
            }
        },
        Element::Choice(choice) => {
            let _ = writeln!(
                out,
                "{prefix}{connector}{} {} {id}",
                "*".repeat(choice.level),
                excerpt(&choice.text)
            );
            if let Some(condition) = &choice.condition {
                let _ = writeln!(out, "{child_prefix}  when {{{condition}}}");
            }
            for effect in &choice.effects {
                let _ = writeln!(out, "{child_prefix}  effect {{{effect}}}");
            }
            if let Some(dest) = &choice.transition {
                let _ = writeln!(out, "{child_prefix}  -> {dest}");
            }
        },
        Element::If(block) => {
            let _ = writeln!(out, "{prefix}{connector}@if {} {id}", block.condition);
            let has_else = block.else_branch.is_some();
            let then_connector = if has_else { TEE } else { ELBOW };
            let _ = writeln!(out, "{child_prefix}{then_connector}then");
            let then_prefix = format!("{child_prefix}{}", if has_else { PIPE } else { BLANK });
            render_list(program, &block.then_branch, &then_prefix, out);
            if let Some(else_branch) = &block.else_branch {
                let _ = writeln!(out, "{child_prefix}{ELBOW}else");
                render_list(program, else_branch, &format!("{child_prefix}{BLANK}"), out);
            }
        },
    }
}
