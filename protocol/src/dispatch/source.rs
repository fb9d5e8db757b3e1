//! Loading Cadence files and resolving their import placeholders.
//!
//! Transactions and scripts are written against placeholder addresses
//! (`import OmniverseNFT from 0xOmniverseNFT`) or string imports
//! (`import "OmniverseNFT"`). Before a file is shipped, every placeholder
//! with a configured alias is replaced by the real deployment address.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::DispatchError;
use crate::identity::FlowAddress;

/// Reads Cadence files below a root directory and rewrites their imports.
#[derive(Debug, Clone)]
pub struct CadenceSource {
    root: PathBuf,
    aliases: BTreeMap<String, FlowAddress>,
}

impl CadenceSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            aliases: BTreeMap::new(),
        }
    }

    /// Register a contract alias. `name` may be given with or without the
    /// `0x` placeholder prefix.
    pub fn with_alias(mut self, name: &str, address: FlowAddress) -> Self {
        self.aliases.insert(bare_name(name).to_string(), address);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read `reference` (relative to the root) and resolve its imports.
    pub fn load(&self, reference: &str) -> Result<String, DispatchError> {
        let path = self.root.join(reference);
        let code = std::fs::read_to_string(&path)
            .map_err(|source| DispatchError::Source { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), bytes = code.len(), "loaded Cadence source");
        Ok(self.resolve_imports(&code))
    }

    /// Rewrite import lines whose placeholder has a configured alias. Other
    /// lines, and imports without an alias, pass through untouched.
    pub fn resolve_imports(&self, code: &str) -> String {
        let mut out = String::with_capacity(code.len());
        for (i, line) in code.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&self.resolve_line(line));
        }
        out
    }

    fn resolve_line(&self, line: &str) -> String {
        let trimmed = line.trim_start();
        let Some(rest) = trimmed.strip_prefix("import ") else {
            return line.to_string();
        };
        let indent = &line[..line.len() - trimmed.len()];
        let rest = rest.trim();

        // import "Name"
        if let Some(name) = rest.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
            return match self.aliases.get(name) {
                Some(address) => format!("{indent}import {name} from {address}"),
                None => line.to_string(),
            };
        }

        // import Name from 0xName
        let resolved: Vec<String> = rest
            .split_whitespace()
            .map(|token| match token.strip_prefix("0x").and_then(|n| self.aliases.get(n)) {
                Some(address) => address.to_string(),
                None => token.to_string(),
            })
            .collect();
        format!("{indent}import {}", resolved.join(" "))
    }
}

fn bare_name(name: &str) -> &str {
    name.strip_prefix("0x").unwrap_or(name)
}
