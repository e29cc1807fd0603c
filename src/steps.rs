use once_cell::sync::Lazy;
use regex::Regex;

/// Steps used when the user left the step box empty.
pub const PLACEHOLDER_STEPS: [&str; 3] = [
    "Start of the flow (replace this)",
    "Associated with the second step",
    "Associated with the third step",
];

// One leading "12." / "3)" ordinal or "•" / "-" bullet.
static STEP_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s*|^[•\-]\s*").expect("step marker regex"));

/// Turns the free-form step box into an ordered list of steps.
///
/// Blank input yields [`PLACEHOLDER_STEPS`]. Otherwise every non-blank line
/// becomes a step with one list marker removed; lines that are nothing but
/// a marker are dropped.
pub fn parse_flow_steps(input: &str) -> Vec<String> {
    if input.trim().is_empty() {
        return PLACEHOLDER_STEPS.iter().map(|s| s.to_string()).collect();
    }
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| STEP_MARKER_RE.replace(line, "").trim().to_string())
        .filter(|step| !step.is_empty())
        .collect()
}
