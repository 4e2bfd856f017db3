//! Processor configuration.

use projql_proto::JoinKind;
use serde::{Deserialize, Serialize};

/// Default bound on alias rewrites for a single path.
pub const DEFAULT_MAX_ALIAS_REWRITES: usize = 32;

/// Tuning knobs for query building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Join kind used when no declaration matches a path prefix.
    pub default_join_kind: JoinKind,
    /// Maximum number of alias rewrites applied to one path.
    pub max_alias_rewrites: usize,
    /// Resolve `relation.<identifier>` on a LEFT to-one relation through the
    /// foreign key instead of joining.
    pub skip_identifier_joins: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            default_join_kind: JoinKind::Inner,
            max_alias_rewrites: DEFAULT_MAX_ALIAS_REWRITES,
            skip_identifier_joins: false,
        }
    }
}

impl ProcessorConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback join kind.
    pub fn with_default_join_kind(mut self, kind: JoinKind) -> Self {
        self.default_join_kind = kind;
        self
    }

    /// Set the alias rewrite bound.
    pub fn with_max_alias_rewrites(mut self, max: usize) -> Self {
        self.max_alias_rewrites = max;
        self
    }

    /// Enable or disable the identifier join shortcut.
    pub fn with_skip_identifier_joins(mut self, enabled: bool) -> Self {
        self.skip_identifier_joins = enabled;
        self
    }
}
