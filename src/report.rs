// src/report.rs
//! Terminal rendering of clustering runs.

use std::fmt::Write;

use anyhow::Result;
use colored::Colorize;

use crate::descent::SummaryStats;
use crate::pipeline::{ClusterSummary, ConfusionMatrix};

/// Formats the run summary.
#[must_use]
pub fn format_summary(summary: &ClusterSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", "═".repeat(60));
    let _ = writeln!(out, "{}", "CLUSTERING COMPLETE".bold());
    let _ = writeln!(out, "{}", "═".repeat(60));
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "k-NN descent".cyan().bold());
    let _ = writeln!(out, "  Points:            {}", summary.points);
    let _ = writeln!(out, "  Friends per point: {}", summary.k);
    let _ = writeln!(
        out,
        "  Rounds:            {} of {} (expander bound {})",
        summary.rounds, summary.max_rounds, summary.expander_round_count
    );
    if let Some(rate) = summary.clustering_rates.last() {
        let _ = writeln!(out, "  Friend clustering: {rate:.4}");
    }
    let _ = writeln!(out, "  Co-friend sizes:   {}", format_stats(&summary.co_friend_stats));
    if let Some(quality) = &summary.quality {
        let _ = writeln!(
            out,
            "  True k-NN found:   {} over {} points",
            format_share(quality.mean),
            quality.count
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "Cohesion".cyan().bold());
    let _ = writeln!(out, "  Focus edges:       {}", summary.focus_edges);
    let _ = writeln!(
        out,
        "  Mutual pairs:      {} ({:.3} of friend slots)",
        summary.mutual_pairs, summary.mutual_friend_proportion
    );
    let _ = writeln!(out, "  Cohesion arcs:     {}", summary.cohesion_arcs);
    let _ = writeln!(
        out,
        "  Mean cohesion:     {:.4} empirical, {:.4} theoretical",
        summary.empirical_mean_cohesion, summary.theoretical_mean_cohesion
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "{}", "Clusters".cyan().bold());
    let _ = writeln!(out, "  Cluster edges:     {}", summary.cluster_edges);
    let nontrivial = summary.non_trivial_components.to_string();
    let nontrivial = if summary.non_trivial_components == 0 {
        nontrivial.yellow()
    } else {
        nontrivial.green().bold()
    };
    let _ = writeln!(
        out,
        "  Components:        {} ({nontrivial} non-trivial)",
        summary.components
    );
    let _ = writeln!(out, "  Size tally:");
    for (size, count) in &summary.size_tally {
        let _ = writeln!(out, "    size {size:>5}: {count}");
    }
    let _ = writeln!(out);

    out
}

/// Formats a labelled-pair confusion matrix with its error rates.
#[must_use]
pub fn format_confusion(matrix: &ConfusionMatrix) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Cluster quality".cyan().bold());
    let _ = writeln!(out, "{}", "─".repeat(60));
    let _ = writeln!(out, "                    same label   different label");
    let _ = writeln!(
        out,
        "  same component    {:>10}   {:>15}",
        matrix.true_positive, matrix.false_positive
    );
    let _ = writeln!(
        out,
        "  split             {:>10}   {:>15}",
        matrix.false_negative, matrix.true_negative
    );
    let _ = writeln!(out, "  {} pairs sampled", matrix.pairs());

    if let Some(rate) = matrix.false_negative_rate() {
        let _ = writeln!(
            out,
            "  Same-label pairs split:         {}",
            format_rate(rate)
        );
    }
    if let Some(rate) = matrix.false_positive_rate() {
        let _ = writeln!(
            out,
            "  Different-label pairs merged:   {}",
            format_rate(rate)
        );
    }
    out
}

fn format_stats(stats: &SummaryStats) -> String {
    format!(
        "min {:.0}, max {:.0}, mean {:.2}",
        stats.min, stats.max, stats.mean
    )
}

fn format_share(share: f64) -> colored::ColoredString {
    let text = format!("{:.1}%", 100.0 * share);
    if share >= 0.9 {
        text.green().bold()
    } else if share >= 0.6 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

fn format_rate(rate: f64) -> colored::ColoredString {
    let text = format!("{:.1}%", 100.0 * rate);
    if rate <= 0.1 {
        text.green()
    } else if rate <= 0.3 {
        text.yellow()
    } else {
        text.red()
    }
}

/// Prints a serializable object as JSON to stdout.
///
/// # Errors
/// Returns error if serialization fails.
pub fn print_json<T: serde::Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{json}");
    Ok(())
}
