//! External program usage

use std::collections::HashMap;
use std::fmt::Write;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::models::ProgramModel;

/// System program address
pub const SYSTEM_PROGRAM: &str = "11111111111111111111111111111111";
/// SPL Token program address
pub const TOKEN_PROGRAM: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
/// Associated Token Account program address
pub const ASSOCIATED_TOKEN_PROGRAM: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
/// Rent sysvar address
pub const RENT_SYSVAR: &str = "SysvarRent111111111111111111111111111111111";

static KNOWN_PROGRAMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut known = HashMap::new();
    known.insert(SYSTEM_PROGRAM, "System Program");
    known.insert(TOKEN_PROGRAM, "Token Program");
    known.insert(ASSOCIATED_TOKEN_PROGRAM, "Associated Token Program");
    known.insert(RENT_SYSVAR, "Rent Sysvar");
    known
});

/// Display name for a well-known address
pub fn program_name(address: &str) -> &'static str {
    KNOWN_PROGRAMS.get(address).copied().unwrap_or("Unknown Program")
}

/// One referenced program and the instructions that reference it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramUsage {
    pub address: String,
    pub name: String,
    pub instructions: Vec<String>,
}

/// Group fixed-address accounts by address, in order of first reference.
pub fn aggregate(model: &ProgramModel) -> Vec<ProgramUsage> {
    let mut usages: Vec<ProgramUsage> = Vec::new();

    for instruction in &model.instructions {
        for address in instruction.accounts.iter().filter_map(|a| a.address.as_deref()) {
            let usage = match usages.iter().position(|u| u.address == address) {
                Some(pos) => &mut usages[pos],
                None => {
                    usages.push(ProgramUsage {
                        address: address.to_string(),
                        name: program_name(address).to_string(),
                        instructions: Vec::new(),
                    });
                    let last = usages.len() - 1;
                    &mut usages[last]
                }
            };
            if !usage.instructions.contains(&instruction.name) {
                usage.instructions.push(instruction.name.clone());
            }
        }
    }

    usages
}

/// Render the programs report
pub fn render(model: &ProgramModel) -> String {
    let usages = aggregate(model);
    let mut out = String::new();

    let _ = writeln!(out, "System Programs ({})", usages.len());
    if usages.is_empty() {
        let _ = writeln!(out, "  No external programs referenced");
        return out;
    }

    for usage in &usages {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {}", usage.name);
        let _ = writeln!(out, "  {}", usage.address);
        let _ = writeln!(out, "  Used in instructions: {}", usage.instructions.join(", "));
    }
    out
}
