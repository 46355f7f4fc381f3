//! Overlay directive collector
//!
//! Classifies scanned lines and buffers `.COPY`/`.MOD`/`.FORGET` lines for the
//! merge passes. MOD lines are grouped by target key in first-seen order so a
//! multi-line MOD is applied as one unit.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::domain::line::{classify, LineKind};
use crate::domain::{DirectiveKind, OverlayDirective, SourceEntry, SourceMap};

/// MOD directives targeting one key, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModGroup {
    pub key: String,
    pub directives: Vec<OverlayDirective>,
}

/// Everything buffered during one scan, drained for the merge passes.
#[derive(Debug, Clone, Default)]
pub struct CollectedDirectives {
    pub copies: Vec<OverlayDirective>,
    pub mods: Vec<ModGroup>,
    pub forgets: Vec<OverlayDirective>,
}

impl CollectedDirectives {
    pub fn is_empty(&self) -> bool {
        self.copies.is_empty() && self.mods.is_empty() && self.forgets.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DirectiveCollector {
    buffered: CollectedDirectives,
    mod_index: HashMap<String, usize>,
}

impl DirectiveCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer the line if it is a directive.
    ///
    /// Returns the classification of lines the caller must handle itself
    /// (`SOURCE` lines and plain definitions), `None` when buffered.
    pub fn offer<'l>(
        &mut self,
        line: &'l str,
        line_number: usize,
        source: &Arc<SourceEntry>,
        source_map: Option<&SourceMap>,
    ) -> Option<LineKind<'l>> {
        let kind = classify(line);
        let directive = |kind| {
            OverlayDirective::new(kind, line, Arc::clone(source), line_number, source_map.cloned())
        };
        match kind {
            LineKind::Copy { .. } => {
                trace!(line_number, "buffer copy");
                self.buffered.copies.push(directive(DirectiveKind::Copy));
            }
            LineKind::Mod { key, .. } => {
                trace!(line_number, key, "buffer mod");
                let d = directive(DirectiveKind::Mod);
                match self.mod_index.get(key) {
                    Some(&idx) => self.buffered.mods[idx].directives.push(d),
                    None => {
                        self.mod_index.insert(key.to_string(), self.buffered.mods.len());
                        self.buffered.mods.push(ModGroup {
                            key: key.to_string(),
                            directives: vec![d],
                        });
                    }
                }
            }
            LineKind::Forget { .. } => {
                trace!(line_number, "buffer forget");
                self.buffered.forgets.push(directive(DirectiveKind::Forget));
            }
            LineKind::Source | LineKind::Definition { .. } => return Some(kind),
        }
        None
    }

    /// Drain the buffers; a second call returns nothing.
    pub fn take(&mut self) -> CollectedDirectives {
        self.mod_index.clear();
        std::mem::take(&mut self.buffered)
    }

    pub fn is_empty(&self) -> bool {
        self.buffered.is_empty()
    }
}
