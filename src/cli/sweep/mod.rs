//! Sweep command - similarity threshold diagnostic
//!
//! Embeds the question once and runs the search at each threshold, so an
//! operator can see where relevant chunks start dropping out before tuning
//! `retrieval.similarity_threshold` or `retrieval.fallback_threshold`.

use std::io::Write;

use clap::Args;

use crate::domain::knowledge::RetrievedChunk;
use crate::domain::retrieval::RetrievalOrchestrator;
use crate::infrastructure::factory::CollaboratorFactory;
use crate::infrastructure::logging::init_cli_logging;

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// The question to search for
    pub query: String,

    /// Thresholds to try, highest first
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = vec![0.7, 0.6, 0.5, 0.4, 0.3, 0.2, 0.1]
    )]
    pub thresholds: Vec<f32>,

    /// Maximum chunks returned per search
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

/// Result of one search in the ladder
#[derive(Debug)]
struct SweepRow {
    threshold: f32,
    matches: Vec<RetrievedChunk>,
}

pub async fn run(args: SweepArgs) -> anyhow::Result<()> {
    let config = super::load_config()?;
    init_cli_logging("warn");

    // Generation is never called here, so its credentials are not required.
    let embedder = CollaboratorFactory::embedding(&config.embedding)?;
    let gateway = CollaboratorFactory::vector_store(&config.vector_store).await?;
    let policy = config.retrieval.policy().with_match_count(args.limit.max(1));
    let orchestrator = RetrievalOrchestrator::new(embedder, gateway, policy);

    let vector = orchestrator.embed_query(&args.query).await?;

    let mut rows = Vec::with_capacity(args.thresholds.len());
    for threshold in args.thresholds {
        let matches = orchestrator.search_at(&vector, threshold).await?;
        rows.push(SweepRow { threshold, matches });
    }

    let mut out = std::io::stdout().lock();
    write!(
        out,
        "{}",
        render_ladder(&rows, config.retrieval.similarity_threshold)
    )?;

    Ok(())
}

fn render_ladder(rows: &[SweepRow], configured: f32) -> String {
    let mut rendered = format!("{:>9}  {:>7}  {:>7}  top match\n", "threshold", "matches", "best");

    for row in rows {
        let best = row.matches.first();
        let marker = if (row.threshold - configured).abs() < f32::EPSILON {
            " *"
        } else {
            ""
        };

        rendered.push_str(&format!(
            "{:>9.2}  {:>7}  {:>7}  {}{}\n",
            row.threshold,
            row.matches.len(),
            best.map(|m| format!("{:.3}", m.similarity()))
                .unwrap_or_else(|| "-".to_string()),
            best.map(|m| m.chunk().source_title.as_str()).unwrap_or("-"),
            marker,
        ));
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge::{KnowledgeChunk, SourceType};

    fn retrieved(title: &str, similarity: f32) -> RetrievedChunk {
        RetrievedChunk::new(
            KnowledgeChunk::new("id", "content", SourceType::Statute, title),
            similarity,
        )
    }

    #[test]
    fn test_render_ladder() {
        let rows = vec![
            SweepRow {
                threshold: 0.5,
                matches: vec![],
            },
            SweepRow {
                threshold: 0.3,
                matches: vec![retrieved("Termination of periodic tenancy", 0.41)],
            },
        ];

        let rendered = render_ladder(&rows, 0.3);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("0.50"));
        assert!(lines[1].trim_end().ends_with('-'));
        assert!(lines[2].contains("0.410"));
        assert!(lines[2].ends_with("Termination of periodic tenancy *"));
    }

    #[test]
    fn test_default_ladder_descends() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: SweepArgs,
        }

        let parsed = Wrapper::parse_from(["sweep", "late fee"]);
        assert_eq!(parsed.args.thresholds.first(), Some(&0.7));
        assert!(parsed.args.thresholds.windows(2).all(|w| w[0] > w[1]));

        let custom = Wrapper::parse_from(["sweep", "late fee", "--thresholds", "0.4,0.2"]);
        assert_eq!(custom.args.thresholds, vec![0.4, 0.2]);
    }
}
