//! Program summary

use std::fmt::Write;

use crate::models::ProgramModel;

/// Render the program header and collection counts
pub fn render(model: &ProgramModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} v{}", model.name, model.version);
    let _ = writeln!(out, "{}", model.description);
    let _ = writeln!(
        out,
        "Address: {}",
        model.program_address.as_deref().unwrap_or("Not specified")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Instructions: {}", model.instructions.len());
    let _ = writeln!(out, "Accounts:     {}", model.accounts.len());
    let _ = writeln!(out, "Types:        {}", model.types.len());
    let _ = writeln!(out, "PDAs:         {}", model.pdas.len());
    let _ = writeln!(out, "Program refs: {}", model.system_programs.len());
    out
}
