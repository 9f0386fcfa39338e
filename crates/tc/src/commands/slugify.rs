//! `tc slugify` command implementation.

use clap::Args;
use tc_site::slugify;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the slugify command.
#[derive(Args)]
pub(crate) struct SlugifyArgs {
    /// Title to convert; several words are joined with spaces.
    #[arg(required = true)]
    title: Vec<String>,
}

impl SlugifyArgs {
    /// Execute the slugify command.
    ///
    /// # Errors
    ///
    /// Returns an error if the title has no characters usable in a slug.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let title = self.title.join(" ");
        let slug = slugify(&title);
        if slug.is_empty() {
            return Err(CliError::Validation(format!(
                "'{title}' has no letters or digits to build a slug from"
            )));
        }
        Output::new().result(&slug);
        Ok(())
    }
}
