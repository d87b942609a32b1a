//! Data models for normalized Solana program IDLs

pub mod account;
pub mod field_type;
pub mod instruction;
pub mod pda;
pub mod program;

pub use self::account::{AccountDescriptor, Field, TypeDescriptor};
pub use self::field_type::FieldType;
pub use self::instruction::{Argument, Instruction, InstructionAccount};
pub use self::pda::{PdaDescriptor, Seed};
pub use self::program::ProgramModel;
