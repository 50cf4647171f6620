use crate::analysis::{Persona, Presenter, RunPhase};
use crate::client::CallResult;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::time::Duration;

// RGB tuples for the `colored` crate's `.truecolor()`
pub mod rgb {
    pub const ELECTRIC_PURPLE: (u8, u8, u8) = (225, 53, 255);
    pub const NEON_CYAN: (u8, u8, u8) = (128, 255, 234);
    pub const CORAL: (u8, u8, u8) = (255, 106, 193);
    pub const ELECTRIC_YELLOW: (u8, u8, u8) = (241, 250, 140);
    pub const SUCCESS_GREEN: (u8, u8, u8) = (80, 250, 123);
    pub const ERROR_RED: (u8, u8, u8) = (255, 99, 99);
    pub const DIM_WHITE: (u8, u8, u8) = (180, 180, 190);
    pub const DIM_SEPARATOR: (u8, u8, u8) = (60, 60, 70);
}

/// Track quiet mode state
static QUIET_MODE: std::sync::LazyLock<Mutex<bool>> =
    std::sync::LazyLock::new(|| Mutex::new(false));

/// Enable or disable quiet mode
pub fn set_quiet_mode(enabled: bool) {
    *QUIET_MODE.lock() = enabled;
}

/// Check if quiet mode is enabled
pub fn is_quiet_mode() -> bool {
    *QUIET_MODE.lock()
}

pub fn create_spinner(message: &str) -> ProgressBar {
    if is_quiet_mode() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("✦✧✶✷✸✹✺✻✼✽")
        .template("{spinner:.bright_cyan.bold} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_info(message: &str) {
    if !is_quiet_mode() {
        let (r, g, b) = rgb::NEON_CYAN;
        println!("{}", message.truecolor(r, g, b).bold());
    }
}

pub fn print_warning(message: &str) {
    let (r, g, b) = rgb::ELECTRIC_YELLOW;
    eprintln!("{}", message.truecolor(r, g, b).bold());
}

pub fn print_error(message: &str) {
    let (r, g, b) = rgb::ERROR_RED;
    eprintln!("{}", message.truecolor(r, g, b).bold());
}

pub fn print_success(message: &str) {
    if !is_quiet_mode() {
        let (r, g, b) = rgb::SUCCESS_GREEN;
        println!("{}", message.truecolor(r, g, b).bold());
    }
}

pub fn print_version(version: &str) {
    let (pr, pg, pb) = rgb::ELECTRIC_PURPLE;
    let (cr, cg, cb) = rgb::CORAL;
    println!(
        "{} {}",
        "triad".truecolor(pr, pg, pb).bold(),
        format!("v{version}").truecolor(cr, cg, cb)
    );
}

fn separator() -> String {
    let (r, g, b) = rgb::DIM_SEPARATOR;
    "─".repeat(60).truecolor(r, g, b).to_string()
}

fn persona_color(persona: Persona) -> (u8, u8, u8) {
    match persona {
        Persona::Security => rgb::ELECTRIC_PURPLE,
        Persona::Design => rgb::CORAL,
        Persona::Efficiency => rgb::NEON_CYAN,
    }
}

/// Section text: output as-is, failures in red
fn format_result(result: &CallResult) -> String {
    match result {
        Ok(text) => text.trim_end().to_string(),
        Err(error) => {
            let (r, g, b) = rgb::ERROR_RED;
            error.placeholder().truecolor(r, g, b).to_string()
        }
    }
}

fn phase_message(phase: RunPhase) -> Option<&'static str> {
    match phase {
        RunPhase::Validating => Some("Checking the problem statement..."),
        RunPhase::PersonasRunning => Some("Consulting the security, design and efficiency experts..."),
        RunPhase::Synthesizing => Some("Synthesizing a recommendation..."),
        _ => None,
    }
}

/// Prints results as they settle, with a spinner while calls are in flight
pub struct TerminalPresenter {
    spinner: ProgressBar,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self {
            spinner: create_spinner("Starting analysis..."),
        }
    }

    fn print_section(&self, title: &str, color: (u8, u8, u8), body: &str) {
        let (r, g, b) = color;
        let heading = format!("◆ {title}").truecolor(r, g, b).bold().to_string();
        self.spinner.suspend(|| {
            println!("\n{heading}\n{}\n{body}\n", separator());
        });
    }
}

impl Default for TerminalPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for TerminalPresenter {
    fn on_phase(&self, phase: RunPhase) {
        if let Some(message) = phase_message(phase) {
            self.spinner.set_message(message);
        }
        if phase.is_terminal() {
            self.spinner.finish_and_clear();
        }
    }

    fn on_persona_result(&self, persona: Persona, result: &CallResult) {
        self.print_section(persona.label(), persona_color(persona), &format_result(result));
    }

    fn on_synthesis_result(&self, result: &CallResult) {
        self.print_section(
            "Synthesized Recommendation",
            rgb::SUCCESS_GREEN,
            &format_result(result),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_mode_hides_spinner() {
        set_quiet_mode(true);
        assert!(create_spinner("x").is_hidden());
        set_quiet_mode(false);
        assert!(!is_quiet_mode());
    }

    #[test]
    fn test_phase_messages_only_for_active_phases() {
        assert!(phase_message(RunPhase::PersonasRunning).is_some());
        assert!(phase_message(RunPhase::Complete).is_none());
    }
}
