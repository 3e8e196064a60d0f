use anyhow::{bail, Result};
use clap::Args;
use zawiyah_lib::ServiceFactory;

use crate::output::{print_lessons, OutputFormat};

#[derive(Args)]
pub struct LessonsArgs {
    /// Get a single lesson by ID
    #[arg(long)]
    pub id: Option<String>,

    /// Filter by category (e.g. spirituality, texts, jurisprudence)
    #[arg(long)]
    pub category: Option<String>,
}

pub async fn run(args: &LessonsArgs, services: &ServiceFactory, format: OutputFormat) -> Result<()> {
    let lessons = services.lessons();

    if let Some(ref id) = args.id {
        return match lessons.get_lesson(id).await? {
            Some(lesson) => print_lessons(&[lesson], format),
            None => bail!("Lesson {} not found", id),
        };
    }

    let list = lessons.list_lessons(args.category.as_deref()).await?;
    print_lessons(&list, format)
}
