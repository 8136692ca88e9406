//! Core domain types: the file-extension contract and run identifiers.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Recognized file extensions. These are fixed; every stage keys its
/// file selection on them.
pub mod extensions {
    /// Single-file component (template + logic + optional style block).
    pub const COMPONENT_SOURCE: &str = "vue";
    /// Extracted, uncompiled style text.
    pub const STYLE_SOURCE: &str = "less";
    /// Output of the external style compiler.
    pub const COMPILED_STYLESHEET: &str = "css";
    /// Compiled JavaScript module.
    pub const COMPILED_MODULE: &str = "js";
}

// ---------------------------------------------------------------------------
// FileKind
// ---------------------------------------------------------------------------

/// The file kinds of the extension contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    ComponentSource,
    StyleSource,
    CompiledStylesheet,
    CompiledModule,
}

impl FileKind {
    /// Classify a path by its extension (case-sensitive). `None` for files
    /// outside the contract.
    pub fn of(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str())? {
            extensions::COMPONENT_SOURCE => Some(Self::ComponentSource),
            extensions::STYLE_SOURCE => Some(Self::StyleSource),
            extensions::COMPILED_STYLESHEET => Some(Self::CompiledStylesheet),
            extensions::COMPILED_MODULE => Some(Self::CompiledModule),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::ComponentSource => extensions::COMPONENT_SOURCE,
            Self::StyleSource => extensions::STYLE_SOURCE,
            Self::CompiledStylesheet => extensions::COMPILED_STYLESHEET,
            Self::CompiledModule => extensions::COMPILED_MODULE,
        }
    }

    /// Sibling path of `path` with its extension swapped for this kind's.
    pub fn sibling_of(self, path: &Path) -> PathBuf {
        path.with_extension(self.extension())
    }
}

// ---------------------------------------------------------------------------
// GenerationId
// ---------------------------------------------------------------------------

/// A UUID v7 identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationId(pub Uuid);

impl GenerationId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GenerationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GenerationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
