use chrono::{DateTime, Duration, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::domain::{Category, DerivedScores, RecommendationResult, ScoreSource};
use crate::ensemble::{EngineStatus, TrainingReport};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Score on the 0..100 display scale, one decimal.
/// Model scores are 0..1 and get rescaled.
pub fn format_score(score: f64, source: ScoreSource) -> String {
    let display = match source {
        ScoreSource::Rules => score,
        ScoreSource::Model => score * 100.0,
    };
    format!("{:.1}", display)
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a program name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn colored_category(category: Category, padded: &str) -> String {
    match category {
        Category::Safe => padded.green().to_string(),
        Category::Realistic => padded.yellow().to_string(),
        Category::Dream => padded.red().to_string(),
    }
}

/// Format results as a ranked table with columns: Index, Score, Category, Name, Option id
/// No headers.
pub fn format_results_table(results: &[RecommendationResult], use_colors: bool) -> String {
    if results.is_empty() {
        return "No matching options.".to_string();
    }

    let term_width = get_terminal_width();
    let index_width = 3;
    let score_width = 5;
    let category_width = 9;
    let separator = "  ";

    results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_padded = format!(
                "{:>width$}",
                format_score(result.final_score, result.source),
                width = score_width
            );
            let category = result.category();
            let category_padded = format!("{:<width$}", category.label(), width = category_width);
            let id_str = format!("#{}", result.option_id);

            let fixed_width = index_width
                + 1
                + score_width
                + category_width
                + separator.len() * 3
                + id_str.len();
            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(&result.option_name, width - fixed_width)
                }
                Some(_) => truncate_name(&result.option_name, 20),
                None => result.option_name.clone(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    colored_category(category, &category_padded),
                    separator,
                    name,
                    separator,
                    id_str.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}",
                    index_str,
                    score_padded,
                    separator,
                    category_padded,
                    separator,
                    name,
                    separator,
                    id_str
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format results as tab-separated values for scripting
/// Columns: option_id, final, compatibility, success, preference, category,
/// source, name, reason (no headers, no colors)
pub fn format_tsv(results: &[RecommendationResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.option_id,
                format_score(r.final_score, r.source),
                format_score(r.compatibility, r.source),
                format_score(r.success_likelihood, r.source),
                format_score(r.preference_fit, r.source),
                r.category().label(),
                source_label(r.source),
                r.option_name,
                r.reason
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_json(results: &[RecommendationResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}

fn source_label(source: ScoreSource) -> &'static str {
    match source {
        ScoreSource::Rules => "rules",
        ScoreSource::Model => "model",
    }
}

/// Multi-line view of normalized scores
pub fn format_derived(derived: &DerivedScores, use_colors: bool) -> String {
    let combined = format!("{:.2}", derived.combined_score);
    let combined = if use_colors {
        combined.bold().to_string()
    } else {
        combined
    };
    format!(
        "Stage 1:    {:.2}\nStage 2:    {:.2}\nCombined:   {}\nRank:       ~{}\nPercentile: {:.2}",
        derived.stage1_score, derived.stage2_score, combined, derived.rank, derived.percentile
    )
}

pub fn format_status(status: &EngineStatus, use_colors: bool) -> String {
    if !status.is_trained {
        return "Ensemble: untrained (recommendations use the rule engine)".to_string();
    }
    let age = status
        .trained_at
        .map(|at| format!(" {} ago", format_age(Utc::now() - at)))
        .unwrap_or_default();
    let state = if use_colors {
        "trained".green().to_string()
    } else {
        "trained".to_string()
    };
    format!(
        "Ensemble: {}{}\nTargets:  {}",
        state,
        age,
        status.available_targets.join(", ")
    )
}

pub fn format_training_report(report: &TrainingReport) -> String {
    let mut lines = vec![format!(
        "Trained {} targets on {} examples ({} held out) at {}",
        report.available_targets.len(),
        report.training_examples,
        report.validation_examples,
        format_timestamp(report.trained_at)
    )];
    for target in &report.available_targets {
        let rounds = report.rounds.get(target).copied().unwrap_or(0);
        match report.validation_rmse.get(target) {
            Some(rmse) => lines.push(format!("  {:<14} {:>3} rounds  rmse {:.4}", target, rounds, rmse)),
            None => lines.push(format!("  {:<14} {:>3} rounds", target, rounds)),
        }
    }
    lines.join("\n")
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(option_id: u64, final_score: f64, success: f64, source: ScoreSource) -> RecommendationResult {
        let category = match source {
            ScoreSource::Rules => Category::from_success(success, 100.0),
            ScoreSource::Model => Category::from_success(success, 1.0),
        };
        RecommendationResult {
            candidate_id: 1,
            option_id,
            option_name: "Mechanical Engineering".to_string(),
            compatibility: final_score,
            success_likelihood: success,
            preference_fit: final_score,
            final_score,
            is_safe_choice: category == Category::Safe,
            is_realistic_choice: category == Category::Realistic,
            is_dream_choice: category == Category::Dream,
            reason: "strong fit; high chance".to_string(),
            source,
        }
    }

    #[test]
    fn test_format_score_scales_model_output() {
        assert_eq!(format_score(87.54, ScoreSource::Rules), "87.5");
        assert_eq!(format_score(0.875, ScoreSource::Model), "87.5");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Short", 10), "Short");
        assert_eq!(truncate_name("Electrical Engineering", 10), "Electri...");
        assert_eq!(truncate_name("Çevre Mühendisliği", 8), "Çevre...");
    }

    #[test]
    fn test_table_without_colors() {
        let table = format_results_table(
            &[result(7, 91.0, 95.0, ScoreSource::Rules), result(3, 40.0, 10.0, ScoreSource::Rules)],
            false,
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" 1.  91.0  safe"));
        assert!(lines[0].ends_with("#7"));
        assert!(lines[1].contains("dream"));
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(format_results_table(&[], false), "No matching options.");
        assert_eq!(format_tsv(&[]), "");
    }

    #[test]
    fn test_tsv_columns() {
        let tsv = format_tsv(&[result(7, 0.5, 0.5, ScoreSource::Model)]);
        let cols: Vec<&str> = tsv.split('\t').collect();
        assert_eq!(cols.len(), 9);
        assert_eq!(cols[0], "7");
        assert_eq!(cols[1], "50.0");
        assert_eq!(cols[5], "realistic");
        assert_eq!(cols[6], "model");
    }

    #[test]
    fn test_json_output_uses_snake_case_source() {
        let json = format_json(&[result(7, 80.0, 85.0, ScoreSource::Rules)]).unwrap();
        assert!(json.contains("\"source\": \"rules\""));
        assert!(json.contains("\"is_safe_choice\": true"));
    }

    #[test]
    fn test_format_derived() {
        let derived = DerivedScores {
            stage1_score: 100.0,
            stage2_score: 100.0,
            combined_score: 100.0,
            rank: 900_000,
            percentile: 0.0,
        };
        let text = format_derived(&derived, false);
        assert!(text.contains("Combined:   100.00"));
        assert!(text.contains("Rank:       ~900000"));
    }

    #[test]
    fn test_status_untrained() {
        let status = EngineStatus {
            is_trained: false,
            available_targets: vec![],
            trained_at: None,
        };
        assert!(format_status(&status, false).contains("untrained"));
    }

    #[test]
    fn test_status_trained_shows_age_and_targets() {
        let status = EngineStatus {
            is_trained: true,
            available_targets: vec!["compatibility".into(), "success".into(), "preference".into()],
            trained_at: Some(Utc::now() - Duration::days(3)),
        };
        let text = format_status(&status, false);
        assert!(text.contains("trained 3d ago"));
        assert!(text.contains("compatibility, success, preference"));
    }

    #[test]
    fn test_training_report_lists_targets() {
        let mut rmse = BTreeMap::new();
        rmse.insert("success".to_string(), 0.0123);
        let mut rounds = BTreeMap::new();
        rounds.insert("success".to_string(), 42);
        let report = TrainingReport {
            available_targets: vec!["success".into()],
            training_examples: 80,
            validation_examples: 20,
            validation_rmse: rmse,
            rounds,
            trained_at: Utc::now(),
        };
        let text = format_training_report(&report);
        assert!(text.contains("80 examples (20 held out)"));
        assert!(text.contains("42 rounds  rmse 0.0123"));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::minutes(30)), "30m");
        assert_eq!(format_age(Duration::hours(5)), "5h");
        assert_eq!(format_age(Duration::days(3)), "3d");
        assert_eq!(format_age(Duration::days(14)), "2w");
        assert_eq!(format_age(Duration::seconds(30)), "now");
    }
}
