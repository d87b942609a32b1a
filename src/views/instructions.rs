//! Instruction browser

use std::fmt::Write;

use crate::discriminator::matches_anchor_instruction;
use crate::models::{Instruction, ProgramModel};

/// Format bytes as `[1, 2, 3]`
pub fn format_bytes(bytes: &[u8]) -> String {
    let parts: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

/// Render every instruction with its accounts and arguments
pub fn render(model: &ProgramModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Instructions ({})", model.instructions.len());

    if model.instructions.is_empty() {
        let _ = writeln!(out, "  No instructions found in this IDL");
        return out;
    }

    for instruction in &model.instructions {
        let _ = writeln!(out);
        render_instruction(&mut out, instruction);
    }
    out
}

fn render_instruction(out: &mut String, instruction: &Instruction) {
    let anchor = if matches_anchor_instruction(instruction) {
        " (anchor)"
    } else {
        ""
    };
    let _ = writeln!(out, "== {}", instruction.name);
    let _ = writeln!(
        out,
        "  Discriminator: {}{}",
        format_bytes(&instruction.discriminator),
        anchor
    );

    let _ = writeln!(out, "  Accounts:");
    if instruction.accounts.is_empty() {
        let _ = writeln!(out, "    No accounts");
    }
    let width = instruction
        .accounts
        .iter()
        .map(|a| a.name.len())
        .max()
        .unwrap_or(0);
    for account in &instruction.accounts {
        let flags = account
            .flags()
            .into_iter()
            .filter(|f| *f != "pda" && *f != "address")
            .collect::<Vec<_>>()
            .join(", ");
        let kind = if account.is_pda() { "PDA" } else { "-" };
        let _ = write!(out, "    {:<width$}  {:<18} {}", account.name, flags, kind, width = width);
        if let Some(address) = &account.address {
            let _ = write!(out, "  {}", address);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "  Arguments:");
    if instruction.args.is_empty() {
        let _ = writeln!(out, "    No arguments");
    }
    for arg in &instruction.args {
        let _ = writeln!(out, "    {}: {}", arg.name, arg.ty);
    }
}
