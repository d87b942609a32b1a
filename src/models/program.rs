//! Normalized program model

use serde::Serialize;

use crate::models::account::{AccountDescriptor, TypeDescriptor};
use crate::models::instruction::Instruction;
use crate::models::pda::PdaDescriptor;

/// Name used when the IDL metadata has none
pub const DEFAULT_NAME: &str = "Unknown Program";
/// Version used when the IDL metadata has none
pub const DEFAULT_VERSION: &str = "N/A";
/// Description used when the IDL metadata has none
pub const DEFAULT_DESCRIPTION: &str = "No description available";

/// Normalized view of a program IDL. Every view reads this and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramModel {
    /// Program address, when the IDL declares one
    pub program_address: Option<String>,
    /// Program name
    pub name: String,
    /// Program version
    pub version: String,
    /// Program description
    pub description: String,
    /// Instructions in source order
    pub instructions: Vec<Instruction>,
    /// Declared account layouts
    pub accounts: Vec<AccountDescriptor>,
    /// PDA accounts, one per name
    pub pdas: Vec<PdaDescriptor>,
    /// Fixed addresses referenced by instruction accounts, one entry per reference
    pub system_programs: Vec<String>,
    /// User-defined types
    pub types: Vec<TypeDescriptor>,
}

impl Default for ProgramModel {
    fn default() -> Self {
        Self {
            program_address: None,
            name: DEFAULT_NAME.to_string(),
            version: DEFAULT_VERSION.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            instructions: Vec::new(),
            accounts: Vec::new(),
            pdas: Vec::new(),
            system_programs: Vec::new(),
            types: Vec::new(),
        }
    }
}

impl ProgramModel {
    /// Find the declared account an instruction account name refers to, with
    /// its position in `accounts`.
    ///
    /// Anchor names instruction accounts in snake_case and account types in
    /// PascalCase, so `user_profile` resolves to `UserProfile`. Exact matches win.
    /// An empty name never resolves.
    pub fn resolve_account(&self, name: &str) -> Option<(usize, &AccountDescriptor)> {
        let wanted = fold_name(name);
        if wanted.is_empty() {
            return None;
        }
        self.accounts
            .iter()
            .position(|a| a.name == name)
            .or_else(|| self.accounts.iter().position(|a| fold_name(&a.name) == wanted))
            .map(|index| (index, &self.accounts[index]))
    }

    /// Find a type definition by name
    pub fn type_def(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Does any instruction account carry this fixed address?
    pub fn references_address(&self, address: &str) -> bool {
        self.system_programs.iter().any(|a| a == address)
    }
}

fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
