//! Instruction metadata for Solana programs

use serde::Serialize;

use crate::models::field_type::FieldType;

/// Represents a program instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    /// Instruction name
    pub name: String,
    /// Discriminator bytes, copied verbatim from the IDL
    pub discriminator: Vec<u8>,
    /// Accounts in declaration order
    pub accounts: Vec<InstructionAccount>,
    /// Instruction arguments
    pub args: Vec<Argument>,
}

/// Represents an instruction argument
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    /// Argument name
    pub name: String,
    /// Argument type
    #[serde(rename = "type")]
    pub ty: FieldType,
}

/// Represents an account used by an instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionAccount {
    /// Account name
    pub name: String,
    /// Is this account writable?
    pub writable: bool,
    /// Is this account a signer?
    pub signer: bool,
    /// Fixed address, for program and sysvar accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Seed kinds when the account is a PDA
    pub pda: Option<Vec<String>>,
}

impl Instruction {
    /// Create a new instruction
    pub fn new(name: impl Into<String>, discriminator: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            discriminator,
            accounts: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Add an account to the instruction
    pub fn add_account(&mut self, account: InstructionAccount) {
        self.accounts.push(account);
    }

    /// Add an argument to the instruction
    pub fn add_arg(&mut self, name: impl Into<String>, ty: FieldType) {
        self.args.push(Argument {
            name: name.into(),
            ty,
        });
    }
}

impl InstructionAccount {
    /// Create a read-only, non-signer account
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            writable: false,
            signer: false,
            address: None,
            pda: None,
        }
    }

    /// Is this account derived from seeds?
    pub fn is_pda(&self) -> bool {
        self.pda.is_some()
    }

    /// Short flag list used by the text views, e.g. `writable, signer`.
    pub fn flags(&self) -> Vec<&'static str> {
        let mut flags = Vec::new();
        if self.writable {
            flags.push("writable");
        }
        if self.signer {
            flags.push("signer");
        }
        if self.address.is_some() {
            flags.push("address");
        }
        if self.pda.is_some() {
            flags.push("pda");
        }
        flags
    }
}
