//! IDL normalization
//!
//! Turns a loosely structured Anchor-style IDL document into a [`ProgramModel`].
//! Every optional field has an explicit default and wrongly shaped collections
//! are logged and treated as empty. The only hard failure is a document that is
//! not a JSON object, plus a missing or non-array `instructions` in strict mode.

mod pdas;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::errors::{ViewerError, ViewerResult};
use crate::models::program::{DEFAULT_DESCRIPTION, DEFAULT_NAME, DEFAULT_VERSION};
use crate::models::{
    AccountDescriptor, FieldType, Instruction, InstructionAccount, ProgramModel,
    TypeDescriptor,
};

pub use self::pdas::collect_pdas;

/// Knobs for [`normalize_with`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Fail with `MissingRequiredField` when `instructions` is absent, and with
    /// `InvalidFormat` when it is not an array, instead of treating it as empty.
    pub strict: bool,
}

impl NormalizeOptions {
    /// Strict options
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Normalize a raw IDL document with default options.
pub fn normalize(raw: &Value) -> ViewerResult<ProgramModel> {
    normalize_with(raw, &NormalizeOptions::default())
}

/// Decode and normalize IDL JSON text.
pub fn parse_idl_str(text: &str) -> ViewerResult<ProgramModel> {
    let raw: Value = serde_json::from_str(text)
        .map_err(|e| ViewerError::InvalidFormat(format!("not valid JSON: {}", e)))?;
    normalize(&raw)
}

/// Decode and normalize IDL JSON bytes.
pub fn parse_idl_slice(bytes: &[u8]) -> ViewerResult<ProgramModel> {
    let raw: Value = serde_json::from_slice(bytes)
        .map_err(|e| ViewerError::InvalidFormat(format!("not valid JSON: {}", e)))?;
    normalize(&raw)
}

/// Normalize a raw IDL document.
pub fn normalize_with(raw: &Value, options: &NormalizeOptions) -> ViewerResult<ProgramModel> {
    let idl = raw.as_object().ok_or_else(|| {
        ViewerError::InvalidFormat(format!("expected a JSON object, found {}", kind_of(raw)))
    })?;

    let program_address = match idl.get("address") {
        Some(Value::String(address)) => Some(address.clone()),
        _ => None,
    };

    let metadata = idl.get("metadata").and_then(Value::as_object);
    let name = metadata_string(metadata, "name", DEFAULT_NAME);
    let version = metadata_string(metadata, "version", DEFAULT_VERSION);
    let description = metadata_string(metadata, "description", DEFAULT_DESCRIPTION);

    let raw_instructions: &[Value] = match idl.get("instructions") {
        Some(Value::Array(items)) => items.as_slice(),
        None | Some(Value::Null) if options.strict => {
            return Err(ViewerError::MissingRequiredField("instructions".to_string()));
        }
        None | Some(Value::Null) => {
            debug!("IDL has no instructions; treating as empty");
            &[]
        }
        Some(other) if options.strict => {
            return Err(ViewerError::InvalidFormat(format!(
                "`instructions` must be an array, found {}",
                kind_of(other)
            )));
        }
        Some(other) => {
            warn!("`instructions` is {}, not an array; treating as empty", kind_of(other));
            &[]
        }
    };

    let raw_instructions: Vec<&Map<String, Value>> =
        objects(raw_instructions, "instruction").collect();
    let instructions: Vec<Instruction> = raw_instructions
        .iter()
        .map(|raw| normalize_instruction(raw))
        .collect();

    let accounts: Vec<AccountDescriptor> = objects(optional_array(idl, "accounts"), "account")
        .map(|acc| AccountDescriptor::new(string_field(acc, "name"), bytes_field(acc, "discriminator")))
        .collect();

    let types: Vec<TypeDescriptor> = objects(optional_array(idl, "types"), "type")
        .map(normalize_type)
        .collect();

    let pdas = collect_pdas(raw_instructions.iter().copied());

    let system_programs: Vec<String> = instructions
        .iter()
        .flat_map(|ix| ix.accounts.iter())
        .filter_map(|acc| acc.address.clone())
        .collect();

    debug!(
        "Normalized IDL '{}': {} instructions, {} accounts, {} pdas, {} program references, {} types",
        name,
        instructions.len(),
        accounts.len(),
        pdas.len(),
        system_programs.len(),
        types.len()
    );

    Ok(ProgramModel {
        program_address,
        name,
        version,
        description,
        instructions,
        accounts,
        pdas,
        system_programs,
        types,
    })
}

fn normalize_instruction(raw: &Map<String, Value>) -> Instruction {
    let mut instruction =
        Instruction::new(string_field(raw, "name"), bytes_field(raw, "discriminator"));

    if let Some(Value::Array(accounts)) = raw.get("accounts") {
        for acc in objects(accounts, "instruction account") {
            instruction.add_account(normalize_instruction_account(acc));
        }
    }

    if let Some(Value::Array(args)) = raw.get("args") {
        for arg in objects(args, "argument") {
            instruction.add_arg(string_field(arg, "name"), type_field(arg));
        }
    }

    instruction
}

fn normalize_instruction_account(raw: &Map<String, Value>) -> InstructionAccount {
    let writable = match raw.get("writable") {
        Some(Value::Bool(flag)) => *flag,
        _ => false,
    };
    let signer = match raw.get("signer") {
        Some(Value::Bool(flag)) => *flag,
        _ => false,
    };
    let address = match raw.get("address") {
        Some(Value::String(address)) if !address.is_empty() => Some(address.clone()),
        _ => None,
    };
    let pda = match raw.get("pda") {
        Some(Value::Object(pda)) => Some(seed_kinds(pda)),
        _ => None,
    };

    InstructionAccount {
        name: string_field(raw, "name"),
        writable,
        signer,
        address,
        pda,
    }
}

fn seed_kinds(pda: &Map<String, Value>) -> Vec<String> {
    match pda.get("seeds") {
        Some(Value::Array(seeds)) => seeds
            .iter()
            .map(|seed| match seed.get("kind") {
                Some(Value::String(kind)) => kind.clone(),
                _ => String::new(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn normalize_type(raw: &Map<String, Value>) -> TypeDescriptor {
    let mut type_def = TypeDescriptor::new(string_field(raw, "name"));

    // Anchor nests fields under `type`; older exports put them at the top level
    let fields = raw
        .get("type")
        .and_then(|ty| ty.get("fields"))
        .or_else(|| raw.get("fields"));

    if let Some(Value::Array(fields)) = fields {
        // tuple struct members have no name and are skipped
        for field in fields.iter().filter_map(Value::as_object) {
            type_def.add_field(string_field(field, "name"), type_field(field));
        }
    }

    type_def
}

fn metadata_string(metadata: Option<&Map<String, Value>>, key: &str, default: &str) -> String {
    match metadata.and_then(|m| m.get(key)) {
        Some(Value::String(value)) if !value.is_empty() => value.clone(),
        _ => default.to_string(),
    }
}

fn string_field(raw: &Map<String, Value>, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(value)) => value.clone(),
        _ => String::new(),
    }
}

/// Byte array field. Any entry outside `0..=255` discards the whole value.
fn bytes_field(raw: &Map<String, Value>, key: &str) -> Vec<u8> {
    let Some(Value::Array(items)) = raw.get(key) else {
        return Vec::new();
    };
    let bytes: Option<Vec<u8>> = items
        .iter()
        .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect();
    match bytes {
        Some(bytes) => bytes,
        None => {
            warn!(
                "Ignoring `{}` of '{}': entries must be bytes",
                key,
                string_field(raw, "name")
            );
            Vec::new()
        }
    }
}

fn type_field(raw: &Map<String, Value>) -> FieldType {
    match raw.get("type") {
        Some(ty) => FieldType::from_value(ty),
        None => FieldType::Opaque("null".to_string()),
    }
}

fn optional_array<'a>(idl: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match idl.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        None | Some(Value::Null) => &[],
        Some(other) => {
            warn!("`{}` is {}, not an array; treating as empty", key, kind_of(other));
            &[]
        }
    }
}

/// Iterate the object entries of a raw array, skipping anything else.
pub(crate) fn objects<'a>(
    items: &'a [Value],
    what: &'static str,
) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
    items.iter().filter_map(move |item| match item {
        Value::Object(map) => Some(map),
        other => {
            warn!("Skipping {} entry that is not an object: {}", what, kind_of(other));
            None
        }
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
