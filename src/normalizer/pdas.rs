//! PDA aggregation across instructions

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::models::{PdaDescriptor, Seed};

/// Collect one [`PdaDescriptor`] per PDA account name.
///
/// Keyed-map semantics: a later account with the same name replaces the
/// earlier seeds, but keeps the position where the name was first seen.
pub fn collect_pdas<'a, I>(raw_instructions: I) -> Vec<PdaDescriptor>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut pdas: Vec<PdaDescriptor> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for instruction in raw_instructions {
        let Some(Value::Array(accounts)) = instruction.get("accounts") else {
            continue;
        };
        for account in accounts.iter().filter_map(Value::as_object) {
            let Some(Value::Object(pda)) = account.get("pda") else {
                continue;
            };
            let name = match account.get("name") {
                Some(Value::String(name)) => name.clone(),
                _ => String::new(),
            };
            let descriptor = PdaDescriptor {
                name: name.clone(),
                seeds: project_seeds(pda),
            };
            match index.get(&name) {
                Some(&slot) => pdas[slot] = descriptor,
                None => {
                    index.insert(name, pdas.len());
                    pdas.push(descriptor);
                }
            }
        }
    }

    pdas
}

fn project_seeds(pda: &Map<String, Value>) -> Vec<Seed> {
    let Some(Value::Array(seeds)) = pda.get("seeds") else {
        return Vec::new();
    };
    seeds.iter().map(project_seed).collect()
}

fn project_seed(seed: &Value) -> Seed {
    let kind = match seed.get("kind") {
        Some(Value::String(kind)) => kind.clone(),
        _ => String::new(),
    };
    let value = match seed.get("value") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.clone()),
    };
    // some exports reference the account under `account` instead of `path`
    let path = seed
        .get("path")
        .or_else(|| seed.get("account"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Seed { kind, value, path }
}
