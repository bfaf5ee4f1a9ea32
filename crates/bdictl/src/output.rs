//! Output formatting - plain ASCII report with optional colour
//!
//! Renderers return Strings so they can be tested without a terminal.

use bdi_common::{AnalysisRun, Level, SeverityBand, SymptomDescriptor, SymptomResult};
use owo_colors::OwoColorize;
use std::fmt::Write;

pub const THIN_SEPARATOR: &str = "------------------------------------------------------------";

pub const DISCLAIMER: &str = "This analysis is based on text patterns only and should not replace \
professional medical advice. If you are concerned about your mental health, please consult \
with a healthcare professional.";

pub const REMINDER: &str = "Remember: this analysis should not be used for self-diagnosis. \
Please consult a mental health professional for proper evaluation and treatment.";

/// Terminal styling preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

impl Style {
    /// Colour unless disabled by flag or NO_COLOR
    pub fn detect(no_color_flag: bool) -> Self {
        Self {
            color: !no_color_flag && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    fn level(&self, level: Level, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match level {
            Level::Minimal => text.green().to_string(),
            Level::Mild => text.yellow().to_string(),
            Level::Moderate => text.red().to_string(),
            Level::Severe => text.bright_red().bold().to_string(),
        }
    }

    fn band(&self, band: SeverityBand, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match band {
            SeverityBand::Minimal => text.green().to_string(),
            SeverityBand::Mild | SeverityBand::Moderate => text.yellow().to_string(),
            SeverityBand::Severe => text.bright_red().to_string(),
        }
    }

    fn warn(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Capitalize the first letter of every word ("him/herself" -> "Him/Herself")
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// "Level 2 - Moderate"
pub fn level_tag(level: Level) -> String {
    format!("Level {} - {}", level, level.label())
}

/// Progress line shown while a symptom is being analyzed
pub fn progress_message(symptom: &SymptomDescriptor, index: usize, total: usize) -> String {
    format!("Analyzing: {} ({}/{})", symptom.question, index + 1, total)
}

/// One symptom block
pub fn format_symptom(result: &SymptomResult, style: Style) -> String {
    let mut out = String::new();
    let tag = level_tag(result.level);

    let _ = write!(
        out,
        "{}: {}  {}",
        result.id,
        title_case(&result.question),
        style.level(result.level, &tag)
    );
    if !result.assessed {
        let _ = write!(out, "  {}", style.warn("[not assessed]"));
    }
    out.push('\n');

    for line in result.explanation.lines().filter(|l| !l.trim().is_empty()) {
        let _ = writeln!(out, "    {}", line.trim_end());
    }
    out
}

/// Overall assessment, interpretation guide and follow-up notes
pub fn format_summary(run: &AnalysisRun, style: Style) -> String {
    let mut out = String::new();
    let band = run.severity_band;

    let _ = writeln!(out, "{}", THIN_SEPARATOR);
    let _ = writeln!(out, "{}", style.heading("[OVERALL ASSESSMENT]"));
    let _ = writeln!(out, "  Total BDI Score:      {} / 63", run.total_score);
    let _ = writeln!(out, "  Severity Level:       {}", style.band(band, band.label()));
    let _ = writeln!(out, "  High-Level Symptoms:  {}", run.high_severity_count);
    let _ = writeln!(
        out,
        "  {}",
        style.band(band, &format!("Overall Assessment: {} Depression Indicators", band.label()))
    );

    if run.is_degraded() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "  {}",
            style.warn("Could not connect to the model: no symptom was assessed, so this score does not reflect the text.")
        );
    } else if run.unassessed_count() > 0 {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "  {}",
            style.warn(&format!(
                "{} of {} symptoms could not be assessed and were scored as 0.",
                run.unassessed_count(),
                run.results.len()
            ))
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", style.heading("[SCORE INTERPRETATION]"));
    for guide_band in SeverityBand::ALL {
        let marker = if guide_band == band { ">" } else { " " };
        let _ = writeln!(
            out,
            "  {} {:<6} {} depression",
            marker,
            guide_band.range_label(),
            guide_band.label()
        );
    }

    let concerning: Vec<_> = run.concerning_symptoms().collect();
    if !concerning.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", style.heading("[SYMPTOMS REQUIRING ATTENTION]"));
        for result in concerning {
            let _ = writeln!(
                out,
                "  * {}: {} - {}",
                result.id,
                result.question,
                style.level(result.level, &format!("Level {}", result.level))
            );
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", REMINDER);
    out
}

/// Catalog listing for `bdictl symptoms`
pub fn format_catalog(catalog: &[SymptomDescriptor]) -> String {
    let mut out = String::new();
    for symptom in catalog {
        let _ = writeln!(out, "{:<4} {}", symptom.id, title_case(symptom.question));
    }
    out
}
