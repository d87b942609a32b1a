//! Text reports and diagrams over a normalized program model
//!
//! Every view is a pure function of [`ProgramModel`]. Empty collections get an
//! explicit empty-state line instead of an empty section.

pub mod diagram;
pub mod instructions;
pub mod overview;
pub mod programs;
pub mod state;

use std::fmt;
use std::str::FromStr;

use crate::models::ProgramModel;

pub use self::diagram::DiagramKind;
pub use self::programs::{aggregate, ProgramUsage};

/// Text report selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    Instructions,
    State,
    Programs,
    All,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Instructions => "instructions",
            View::State => "state",
            View::Programs => "programs",
            View::All => "all",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "overview" => Ok(View::Overview),
            "instructions" => Ok(View::Instructions),
            "state" | "accounts" => Ok(View::State),
            "programs" => Ok(View::Programs),
            "all" => Ok(View::All),
            _ => Err(format!(
                "unknown view '{}' (expected one of: overview, instructions, state, programs, all)",
                s
            )),
        }
    }
}

/// Render one report, or all of them separated by blank lines
pub fn render(model: &ProgramModel, view: View) -> String {
    match view {
        View::Overview => overview::render(model),
        View::Instructions => instructions::render(model),
        View::State => state::render(model),
        View::Programs => programs::render(model),
        View::All => [
            overview::render(model),
            instructions::render(model),
            state::render(model),
            programs::render(model),
        ]
        .join("\n"),
    }
}
