//! project command - Seed a project folder from a language template

use clap::Args;
use osync_core::ProjectTemplate;

use super::Session;
use crate::exit_code::ExitCode;

/// Create a project from a template
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Project identifier; the folder becomes <project_root>/<id>/
    pub id: String,

    /// Template language; copied from <template_root>/<language>/
    #[arg(short, long)]
    pub language: String,
}

/// Execute the project command
pub async fn execute(args: ProjectArgs, session: &Session) -> ExitCode {
    let template = ProjectTemplate::from(&session.config.project);
    let prefixes = match template.prefixes(&args.id, &args.language) {
        Ok(prefixes) => prefixes,
        Err(e) => {
            session.formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let progress = session.progress();
    let result = template
        .create(
            session.store.clone(),
            session.transfer_options(&progress),
            &args.id,
            &args.language,
        )
        .await;
    progress.finish_and_clear();

    session.finish("project", &prefixes.source, &prefixes.destination, result)
}
