//! Markdown rendering of the daily report.
//!
//! The section order is fixed: title, statistics, trending topics, overall
//! summary, per-blog detail, tags footer. `README.md` links to the file by the
//! name [`report_file_name`] derives from the date.

use crate::models::{Article, DailyResult};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// `daily-summary-<date>.md`
pub fn report_file_name(date_key: &str) -> String {
    format!("daily-summary-{date_key}.md")
}

fn or_placeholder(s: &str, placeholder: &'static str) -> String {
    if s.trim().is_empty() {
        placeholder.to_string()
    } else {
        s.trim().to_string()
    }
}

fn render_article(md: &mut String, article: &Article) -> std::fmt::Result {
    writeln!(md, "#### [{}]({})\n", article.title, article.url)?;
    writeln!(md, "**Published**: {}  ", article.published_display())?;
    writeln!(md, "**Author**: {}\n", article.author.as_deref().unwrap_or("N/A"))?;
    writeln!(md, "**AI Summary**:")?;
    writeln!(md, "{}\n", or_placeholder(&article.ai_summary, "_Summary unavailable._"))?;
    let keywords = if article.keywords.is_empty() {
        "-".to_string()
    } else {
        article.keywords.join(", ")
    };
    writeln!(md, "**Keywords**: {keywords}\n")?;
    writeln!(md, "---\n")?;
    Ok(())
}

/// Render `result` as the daily report. `generated_at` is shown in the
/// statistics block.
pub fn render_report(result: &DailyResult, generated_at: DateTime<Utc>) -> Result<String, std::fmt::Error> {
    let date = result.date_key();
    let mut md = String::new();

    writeln!(md, "# Tech Blog Daily Digest - {date}\n")?;
    writeln!(md, "> Posts collected from engineering blogs and summarized automatically.\n")?;

    writeln!(md, "## Statistics\n")?;
    writeln!(md, "- **Articles collected**: {}", result.total_article_count)?;
    writeln!(md, "- **Blogs crawled**: {}", result.articles_by_source.len())?;
    writeln!(md, "- **Generated at**: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;

    writeln!(md, "## Trending Topics\n")?;
    if result.trending_topics.is_empty() {
        writeln!(md, "_No trending topics today._\n")?;
    }
    for (i, topic) in result.trending_topics.iter().enumerate() {
        writeln!(md, "{}. **{}** ({} mentions)", i + 1, topic.topic, topic.count)?;
        writeln!(md, "   - {}\n", or_placeholder(&topic.description, "-"))?;
    }

    writeln!(md, "## Overall Summary\n")?;
    writeln!(md, "{}\n", or_placeholder(&result.daily_summary, "_Summary unavailable._"))?;
    writeln!(md, "---\n")?;

    writeln!(md, "## Details by Blog\n")?;
    for source in &result.articles_by_source {
        writeln!(md, "### {} ({} articles)\n", source.name, source.count)?;
        writeln!(md, "**Source**: [{}]({})\n", source.name, source.source_url)?;
        for article in &source.articles {
            render_article(&mut md, article)?;
        }
    }

    writeln!(md, "## Tags\n")?;
    writeln!(
        md,
        "`#techblog` `#dailydigest` `#aisummary` `#automation` `#{}`\n",
        date.replace('-', "")
    )?;
    writeln!(md, "---\n")?;
    writeln!(md, "*Generated automatically. Check the original posts for accuracy.*")?;
    Ok(md)
}

/// Render and write the report to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(result: &DailyResult, generated_at: DateTime<Utc>, path: &Path) -> Result<(), Box<dyn Error>> {
    let md = render_report(result, generated_at)?;
    fs::write(path, &md).await?;
    info!(bytes = md.len(), "Wrote Markdown report");
    Ok(())
}
