//! Name lexicons used to recognize clock and reset ports.
//!
//! Matching is an exact, case-insensitive comparison against fixed word
//! lists. Clock-enable style names are rejected explicitly so that they are
//! never mistaken for clocks.

const CLOCK_NAMES: &[&str] = &["clk", "clock", "clk_i", "clock_i"];

const RESET_NAMES: &[&str] = &[
    "rst", "reset", "rst_i", "reset_i", "nreset", "nreset_i", "nrst", "nrst_i", "n_reset",
    "n_reset_i", "n_rst", "n_rst_i", "rst_n", "rst_n_i", "reset_n", "reset_n_i",
];

const NOT_CLOCK_NAMES: &[&str] = &[
    "clk_en",
    "clock_en",
    "clk_enable",
    "clock_enable",
    "clk_e",
    "clock_e",
    "clk_enable_i",
    "clock_enable_i",
    "clk_enable_n",
    "clock_enable_n",
];

/// Role of a port as far as testbench generation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalRole {
    Clock,
    Reset,
    Data,
}

fn matches_any(name: &str, lexicon: &[&str]) -> bool {
    lexicon.iter().any(|entry| entry.eq_ignore_ascii_case(name))
}

pub fn is_clock_name(name: &str) -> bool {
    !matches_any(name, NOT_CLOCK_NAMES) && matches_any(name, CLOCK_NAMES)
}

pub fn is_reset_name(name: &str) -> bool {
    matches_any(name, RESET_NAMES)
}

/// Classify a port name. Clock takes precedence, so a name is never both.
pub fn classify_port(name: &str) -> SignalRole {
    if is_clock_name(name) {
        SignalRole::Clock
    } else if is_reset_name(name) {
        SignalRole::Reset
    } else {
        SignalRole::Data
    }
}
