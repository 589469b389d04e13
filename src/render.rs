use chrono::{DateTime, SecondsFormat};

use crate::youtrack::Issue;

/// Renders the single flat-text file written into each issue folder. The
/// layout is fixed; comments and reactions keep the API's order.
pub fn render_issue_content(issue: &Issue) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {} - {}\n\n", issue.id_readable, issue.summary));
    out.push_str(&format!(
        "{}\n\n",
        issue.description.as_deref().unwrap_or("No description")
    ));
    out.push_str("\n# Comments");

    for comment in &issue.comments {
        out.push_str(&format!(
            "\n\n---\n---\nComment by {} at {}\n",
            comment.author.name,
            format_comment_timestamp(comment.created)
        ));
        out.push_str(&format!("Deleted: {}\n", comment.deleted));
        out.push_str("Reactions:\n");
        for reaction in &comment.reactions {
            out.push_str(&format!(
                "    {}: {}\n",
                reaction.author.name, reaction.reaction
            ));
        }
        out.push_str(&format!("\n{}\n", comment.text.as_deref().unwrap_or("")));
    }

    out
}

/// Epoch milliseconds to ISO-8601 UTC with second precision.
pub fn format_comment_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Secs, false))
        .unwrap_or_else(|| "Unknown".to_string())
}
