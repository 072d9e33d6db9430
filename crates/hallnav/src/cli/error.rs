//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Image file does not exist
    pub fn image_not_found(path: &Path) -> Self {
        Self::new(format!("Image not found: {}", path.display()))
            .with_context("The scan command needs a photo of the lecture hall")
            .with_suggestions([
                format!("TRY: Check that the file exists: ls -la {}", path.display()),
                "TRY: Check for typos in the path".to_string(),
            ])
    }

    /// No `[store]` section and no HALLNAV_STORE_DIR
    pub fn store_not_configured() -> Self {
        Self::new("No hall store is configured")
            .with_context("Hall details and the admin panel read the `halls` collection")
            .with_suggestions([
                "TRY: Add a [store] section to ~/.hallnav/config.toml".to_string(),
                "TRY: export HALLNAV_STORE_DIR=/path/to/store".to_string(),
            ])
    }

    /// Invalid coordinates argument
    pub fn invalid_coordinates(raw: &str, reason: impl fmt::Display) -> Self {
        Self::new(format!("Invalid position '{}'", raw))
            .with_context(reason.to_string())
            .with_suggestion("TRY: --from 34.0522,-118.2437   # LAT,LON in decimal degrees")
    }

    /// Hall id not present in the store
    pub fn hall_not_found(id: &str) -> Self {
        Self::new(format!("Hall '{}' not found", id))
            .with_suggestion("TRY: hallnav admin list   # List halls and their ids")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}
