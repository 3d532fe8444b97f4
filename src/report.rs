use std::fmt::Write;
use std::path::Path;

use chrono::DateTime;
use plotters::prelude::*;

use crate::error::{CreditScoreError, Result};
use crate::models::{HistogramBin, ScoreRecord, ScoreSummary};
use crate::pipeline::BatchOutcome;

pub const HISTOGRAM_BINS: usize = 20;

const BAR_FILL: RGBColor = RGBColor(135, 206, 235);

/// Writes `wallet,credit_score` rows in the order given.
pub fn write_scores(path: &Path, scores: &[ScoreRecord]) -> Result<()> {
    write_table(path, scores).map_err(|source| CreditScoreError::TableWrite {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), rows = scores.len(), "saved scores");
    Ok(())
}

fn write_table(path: &Path, scores: &[ScoreRecord]) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(["wallet", "credit_score"])?;
    for score in scores {
        writer.serialize(score)?;
    }
    writer.flush()?;
    Ok(())
}

/// Splits the observed score range into `bins` equal-width buckets.
///
/// The last bucket includes its right edge. A single distinct score is
/// centred in a range one point wide, and no scores at all yield empty
/// buckets over `[0, 1]`.
pub fn histogram(scores: &[ScoreRecord], bins: usize) -> Vec<HistogramBin> {
    let bins = bins.max(1);
    let values = scores.iter().map(|score| score.credit_score as f64);
    let (mut lo, mut hi) = values
        .clone()
        .fold(None, |range: Option<(f64, f64)>, value| match range {
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
            None => Some((value, value)),
        })
        .unwrap_or((0.0, 1.0));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut buckets: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for value in values {
        let slot = (((value - lo) / width) as usize).min(bins - 1);
        buckets[slot].count += 1;
    }
    buckets
}

/// Renders the score distribution as an SVG bar chart.
pub fn render_histogram(path: &Path, scores: &[ScoreRecord]) -> Result<()> {
    let bins = histogram(scores, HISTOGRAM_BINS);
    draw_histogram(path, &bins).map_err(|err| CreditScoreError::PlotWrite {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    tracing::info!(path = %path.display(), "saved plot");
    Ok(())
}

fn draw_histogram(
    path: &Path,
    bins: &[HistogramBin],
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let (lo, hi) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => (0.0, 1.0),
    };
    let peak = bins.iter().map(|bin| bin.count).max().unwrap_or(0);

    let root = SVGBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Wallet Credit Score Distribution", ("sans-serif", 22).into_font())
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(lo..hi, 0u32..peak + 1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Credit Score")
        .y_desc("Number of Wallets")
        .draw()?;

    chart.draw_series(
        bins.iter()
            .map(|bin| Rectangle::new([(bin.start, 0), (bin.end, bin.count)], BAR_FILL.filled())),
    )?;
    chart.draw_series(bins.iter().map(|bin| {
        Rectangle::new([(bin.start, 0), (bin.end, bin.count)], BLACK.stroke_width(1))
    }))?;

    root.present()?;
    Ok(())
}

pub fn summarize(scores: &[ScoreRecord]) -> Option<ScoreSummary> {
    let mut values: Vec<u32> = scores.iter().map(|score| score.credit_score).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();

    let count = values.len();
    let total: u64 = values.iter().map(|&value| value as u64).sum();
    let median_score = if count % 2 == 0 {
        (values[count / 2 - 1] as f64 + values[count / 2] as f64) / 2.0
    } else {
        values[count / 2] as f64
    };

    Some(ScoreSummary {
        wallet_count: count,
        min_score: values[0],
        max_score: values[count - 1],
        mean_score: total as f64 / count as f64,
        median_score,
    })
}

pub fn build_summary(outcome: &BatchOutcome) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Wallet credit scores");
    let _ = writeln!(
        output,
        "- {} transactions read, {} skipped without a wallet",
        outcome.records_seen, outcome.skipped_records
    );

    match summarize(&outcome.scores) {
        Some(summary) => {
            let _ = writeln!(output, "- {} wallets scored", summary.wallet_count);
            let _ = writeln!(
                output,
                "- score min {} / median {:.1} / mean {:.1} / max {}",
                summary.min_score, summary.median_score, summary.mean_score, summary.max_score
            );
        }
        None => {
            let _ = writeln!(output, "- no wallets scored");
        }
    }

    if let (Some(first), Some(last)) = (outcome.first_ts, outcome.last_ts) {
        let _ = writeln!(output, "- activity from {} to {}", format_ts(first), format_ts(last));
    }

    output
}

fn format_ts(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|moment| moment.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
