//! Anchor discriminator derivation

use sha2::{Digest, Sha256};

use crate::models::{AccountDescriptor, Instruction};

/// Namespace prefix Anchor hashes instruction names under
pub const INSTRUCTION_NAMESPACE: &str = "global";
/// Namespace prefix Anchor hashes account names under
pub const ACCOUNT_NAMESPACE: &str = "account";

fn sighash(namespace: &str, name: &str) -> [u8; 8] {
    let preimage = format!("{}:{}", namespace, name);
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    let hash = hasher.finalize();

    let mut result = [0u8; 8];
    result.copy_from_slice(&hash[..8]);
    result
}

/// Convert `initializeMint` or `InitializeMint` to `initialize_mint`
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch);
        }
    }
    out
}

/// Anchor discriminator of an instruction handler
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    sighash(INSTRUCTION_NAMESPACE, &to_snake_case(name))
}

/// Anchor discriminator of an account type
pub fn account_discriminator(name: &str) -> [u8; 8] {
    sighash(ACCOUNT_NAMESPACE, name)
}

/// Does the instruction carry the discriminator Anchor would generate for its name?
pub fn matches_anchor_instruction(instruction: &Instruction) -> bool {
    instruction.discriminator == instruction_discriminator(&instruction.name)
}

/// Does the account carry the discriminator Anchor would generate for its name?
pub fn matches_anchor_account(account: &AccountDescriptor) -> bool {
    account.discriminator == account_discriminator(&account.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("initializeMint"), "initialize_mint");
        assert_eq!(to_snake_case("InitializeMint"), "initialize_mint");
        assert_eq!(to_snake_case("initialize"), "initialize");
        assert_eq!(to_snake_case("set_authority"), "set_authority");
    }

    #[test]
    fn test_instruction_discriminator_matches_anchor() {
        // sha256("global:initialize")[..8]
        assert_eq!(
            instruction_discriminator("initialize"),
            [175, 175, 109, 31, 13, 152, 155, 237]
        );
        assert_eq!(
            instruction_discriminator("initialize"),
            instruction_discriminator("Initialize")
        );
    }

    #[test]
    fn test_matches_anchor_instruction() {
        let ix = Instruction::new("initialize", vec![175, 175, 109, 31, 13, 152, 155, 237]);
        assert!(matches_anchor_instruction(&ix));

        let ix = Instruction::new("initialize", vec![1, 2]);
        assert!(!matches_anchor_instruction(&ix));
    }

    #[test]
    fn test_account_discriminator_is_stable() {
        let account = AccountDescriptor::new("Counter", account_discriminator("Counter").to_vec());
        assert!(matches_anchor_account(&account));
        assert_ne!(account_discriminator("Counter"), account_discriminator("counter"));
    }
}
