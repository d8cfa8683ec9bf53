//! Output formatting for CLI reports

use crate::{
    grid::TerminationReasons,
    pipeline::{EvaluationResult, MetricsSummary, TrainingResult},
};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Format `count / total` as a percentage
pub fn format_share(count: usize, total: usize) -> String {
    let percent = if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    format!("{} ({percent:.1}%)", format_number(count))
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

pub fn describe_reasons(reasons: &TerminationReasons) -> String {
    let mut parts = Vec::new();
    if reasons.reached_target {
        parts.push("reached target");
    }
    if reasons.out_of_bounds {
        parts.push("left the map");
    }
    if reasons.step_limit {
        parts.push("step limit");
    }
    if parts.is_empty() {
        "running".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn print_training_result(result: &TrainingResult) {
    print_section("Training Complete");
    print_kv("Episodes", &format_number(result.episodes));
    print_kv("Epochs", &format_number(result.epochs));
    print_kv("Wins", &format_share(result.wins, result.episodes));
    print_kv("Reached target", &format_number(result.reached_target));
    print_kv("Left the map", &format_number(result.out_of_bounds));
    print_kv("Step limit", &format_number(result.step_limit));
    print_kv("Penalties", &format_number(result.penalties));
    print_kv("Mean reward", &format!("{:.3}", result.mean_reward));
}

pub fn print_evaluation_result(result: &EvaluationResult) {
    print_section("Evaluation Results");
    print_kv("Episodes", &format_number(result.episodes));
    print_kv("Wins", &format_share(result.wins, result.episodes));
    print_kv("Reached target", &format_number(result.reached_target));
    print_kv("Left the map", &format_number(result.out_of_bounds));
    print_kv("Step limit", &format_number(result.step_limit));
    print_kv("Mean steps", &format!("{:.2}", result.mean_steps));
    print_kv("Mean reward", &format!("{:.3}", result.mean_reward));
}

/// Loss as text, or `n/a` when nothing was learned
pub fn format_loss(loss: Option<f64>) -> String {
    loss.map_or_else(|| "n/a".to_string(), |loss| format!("{loss:.5}"))
}

pub fn print_metrics(metrics: &MetricsSummary) {
    print_kv("Avg episode length", &format!("{:.2}", metrics.avg_episode_length));
    print_kv("Avg loss", &format_loss(metrics.avg_loss));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups_thousands() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(100_000), "100,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_share() {
        assert_eq!(format_share(25, 100), "25 (25.0%)");
        assert_eq!(format_share(0, 0), "0 (0.0%)");
    }

    #[test]
    fn test_format_loss() {
        assert_eq!(format_loss(Some(0.123456)), "0.12346");
        assert_eq!(format_loss(None), "n/a");
    }

    #[test]
    fn test_describe_reasons() {
        let both = TerminationReasons {
            reached_target: true,
            step_limit: true,
            ..TerminationReasons::NONE
        };
        assert_eq!(describe_reasons(&both), "reached target, step limit");
        assert_eq!(describe_reasons(&TerminationReasons::NONE), "running");
    }
}
