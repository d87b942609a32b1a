//! Account and state layouts

use std::fmt::Write;

use crate::discriminator::matches_anchor_account;
use crate::models::ProgramModel;
use crate::views::instructions::format_bytes;

/// Render every declared account joined with its type definition
pub fn render(model: &ProgramModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Accounts ({})", model.accounts.len());

    if model.accounts.is_empty() {
        let _ = writeln!(out, "  No accounts found in this IDL");
        return out;
    }

    for account in &model.accounts {
        let anchor = if matches_anchor_account(account) {
            " (anchor)"
        } else {
            ""
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "== {}", account.name);
        let _ = writeln!(
            out,
            "  Discriminator: {}{}",
            format_bytes(&account.discriminator),
            anchor
        );

        match model.type_def(&account.name) {
            Some(type_def) if !type_def.fields.is_empty() => {
                let _ = writeln!(out, "  Fields:");
                for field in &type_def.fields {
                    let _ = writeln!(out, "    {}: {}", field.name, field.ty);
                }
            }
            Some(_) => {
                let _ = writeln!(out, "  No fields");
            }
            None => {
                let _ = writeln!(out, "  No type definition found");
            }
        }
    }
    out
}
