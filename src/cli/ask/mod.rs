//! Ask command - answer one question from the terminal

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use futures::{Stream, StreamExt};

use crate::domain::query::{AnswerMode, Query, SupplementaryDocument};
use crate::domain::stream::StreamEvent;
use crate::domain::Source;
use crate::infrastructure::logging::init_cli_logging;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    pub query: String,

    /// Print the answer fragment by fragment as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Attach a local text file as a supplementary document (implies --stream)
    #[arg(long)]
    pub document: Option<PathBuf>,

    /// Caller identity recorded in the audit log
    #[arg(long, default_value = "cli")]
    pub caller: String,
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    init_cli_logging("warn");

    let service = crate::create_answer_service(&config).await?;

    let document = match &args.document {
        Some(path) => Some(read_document(path).await?),
        None => None,
    };
    let mode = if args.stream || document.is_some() {
        AnswerMode::Streaming
    } else {
        AnswerMode::Sync
    };

    let query = Query::parse(&args.query, mode, document, &args.caller, service.limits())?;
    let mut out = std::io::stdout().lock();

    match mode {
        AnswerMode::Sync => {
            let answer = service.answer(&query).await?;
            writeln!(out, "{}\n", answer.answer)?;
            write!(out, "{}", render_sources(&answer.sources))?;
        }
        AnswerMode::Streaming => {
            let events = service.answer_stream(&query).await?;
            write_stream(events, &mut out).await?;
        }
    }

    Ok(())
}

async fn read_document(path: &PathBuf) -> anyhow::Result<SupplementaryDocument> {
    let content = tokio::fs::read_to_string(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SupplementaryDocument::new(name, content))
}

/// Print streamed events; an in-band error becomes the command's error
async fn write_stream<S, W>(mut events: S, out: &mut W) -> anyhow::Result<()>
where
    S: Stream<Item = StreamEvent> + Unpin,
    W: Write,
{
    let mut sources = Vec::new();

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Sources { sources: list } => sources = list,
            StreamEvent::Text { content } => {
                write!(out, "{}", content)?;
                out.flush()?;
            }
            StreamEvent::Done => {
                writeln!(out, "\n")?;
                write!(out, "{}", render_sources(&sources))?;
                return Ok(());
            }
            StreamEvent::Error { message } => {
                writeln!(out)?;
                anyhow::bail!("answer failed: {}", message);
            }
        }
    }

    anyhow::bail!("answer stream ended without a terminal event")
}

fn render_sources(sources: &[Source]) -> String {
    if sources.is_empty() {
        return "No sources.\n".to_string();
    }

    let mut rendered = String::from("Sources:\n");
    for source in sources {
        rendered.push_str(&format!("{} {} {}", source.marker(), source.icon, source.title));
        if let Some(section) = &source.section {
            rendered.push_str(&format!(" (section {})", section));
        }
        if let Some(url) = &source.url {
            rendered.push_str(&format!(" <{}>", url));
        }
        rendered.push('\n');
    }
    rendered
}
