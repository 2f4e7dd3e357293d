/// Ontology metadata editor server.
#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Default)]
pub(crate) enum Command {
    /// Runs the web server
    #[default]
    Run,
    /// Migrates the database to the latest schema
    Migrate,
    /// Prints the form fields configured for a template
    Fields {
        /// Template name, without the `.tsv` extension
        template: String,
    },
}
