/// Tier labels for sub-scores on a 0..100 scale.
pub fn compatibility_label(compatibility: f64) -> &'static str {
    if compatibility >= 80.0 {
        "strong academic fit"
    } else if compatibility >= 60.0 {
        "moderate academic fit"
    } else {
        "weak academic fit"
    }
}

pub fn success_label(success: f64) -> &'static str {
    if success >= 80.0 {
        "high admission chance"
    } else if success > 30.0 {
        "fair admission chance"
    } else {
        "low admission chance"
    }
}

pub fn preference_label(preference: f64) -> &'static str {
    if preference >= 70.0 {
        "matches your preferences"
    } else if preference >= 50.0 {
        "partially matches your preferences"
    } else {
        "few preference matches"
    }
}

pub fn margin_note(margin: Option<f64>) -> String {
    match margin {
        None => "threshold unknown".to_string(),
        Some(m) if m > 0.0 => format!("{:.1} points above threshold", m),
        Some(m) if m < 0.0 => format!("{:.1} points below threshold", -m),
        Some(_) => "at threshold".to_string(),
    }
}

/// Reason for a rule-engine result. Inputs on the 0..100 scale.
pub fn rule_reason(compatibility: f64, success: f64, preference: f64, margin: Option<f64>) -> String {
    [
        compatibility_label(compatibility).to_string(),
        success_label(success).to_string(),
        preference_label(preference).to_string(),
        margin_note(margin),
    ]
    .join("; ")
}

/// Reason for an ensemble result. Inputs are model predictions in 0..1.
pub fn model_reason(compatibility: f64, success: f64, preference: f64) -> String {
    format!(
        "model estimate: {}; {}; {}",
        compatibility_label(compatibility * 100.0),
        success_label(success * 100.0),
        preference_label(preference * 100.0)
    )
}
