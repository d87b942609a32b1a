//! Mermaid diagram generation
//!
//! Each generator returns graph-description text for the mermaid renderer.
//! Node ids are sanitized to `[A-Za-z0-9_]` and unique within a diagram.
//! Flowchart and ER ids are also prefixed by role (`ix_`, `acc_`). Unnamed
//! nodes become `unnamed_<position>`. Flowchart labels keep the original names
//! with double quotes escaped.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};
use std::str::FromStr;

use crate::models::{FieldType, Instruction, ProgramModel};
use crate::views::programs::{ASSOCIATED_TOKEN_PROGRAM, SYSTEM_PROGRAM, TOKEN_PROGRAM};

/// Which diagram to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    /// Accounts, instructions and programs with usage edges
    Flow,
    /// Account classes with their fields and PDA derivations
    Accounts,
    /// Instruction classes with their arguments and used accounts
    Instructions,
    /// One entity-relationship diagram per instruction
    Er,
    /// One flowchart per instruction
    Overview,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 5] = [
        DiagramKind::Flow,
        DiagramKind::Accounts,
        DiagramKind::Instructions,
        DiagramKind::Er,
        DiagramKind::Overview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramKind::Flow => "flow",
            DiagramKind::Accounts => "accounts",
            DiagramKind::Instructions => "instructions",
            DiagramKind::Er => "er",
            DiagramKind::Overview => "overview",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiagramKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown diagram kind '{}' (expected one of: flow, accounts, instructions, er, overview)",
                    s
                )
            })
    }
}

/// Generate the diagrams of one kind. Per-instruction kinds yield one text per instruction.
pub fn render(model: &ProgramModel, kind: DiagramKind) -> Vec<String> {
    match kind {
        DiagramKind::Flow => vec![flow_diagram(model)],
        DiagramKind::Accounts => vec![accounts_diagram(model)],
        DiagramKind::Instructions => vec![instructions_diagram(model)],
        DiagramKind::Er => er_diagrams(model),
        DiagramKind::Overview => overview_diagrams(model),
    }
}

fn node_id(prefix: &str, name: &str) -> String {
    let mut id = String::with_capacity(prefix.len() + name.len());
    id.push_str(prefix);
    id.extend(
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }),
    );
    id
}

/// Node ids of one diagram.
///
/// A (role, name) pair always maps to the same id. Unnamed nodes are told
/// apart by their position. Names that sanitize to an id already in use get a
/// numeric suffix.
struct NodeIds {
    prefixed: bool,
    assigned: HashMap<(&'static str, String), String>,
    taken: HashSet<String>,
}

impl NodeIds {
    /// Ids carry their role as a prefix, as flowcharts need
    fn prefixed() -> Self {
        Self {
            prefixed: true,
            assigned: HashMap::new(),
            taken: HashSet::new(),
        }
    }

    /// Ids are the bare sanitized names, as class diagrams show them
    fn bare() -> Self {
        Self {
            prefixed: false,
            ..Self::prefixed()
        }
    }

    fn reserve(&mut self, id: &str) {
        self.taken.insert(id.to_string());
    }

    fn id(&mut self, role: &'static str, name: &str, index: usize) -> String {
        let key = if name.is_empty() {
            format!("#{}", index)
        } else {
            name.to_string()
        };
        if let Some(id) = self.assigned.get(&(role, key.clone())) {
            return id.clone();
        }

        let prefix = if self.prefixed { role } else { "" };
        let base = if name.is_empty() {
            format!("{}unnamed_{}", prefix, index)
        } else {
            node_id(prefix, name)
        };
        let mut id = base.clone();
        let mut suffix = 2;
        while self.taken.contains(&id) {
            id = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        self.taken.insert(id.clone());
        self.assigned.insert((role, key), id.clone());
        id
    }
}

fn label(name: &str) -> String {
    name.replace('"', "#quot;")
}

// classDiagram writes generics with tildes
fn class_type(ty: &FieldType) -> String {
    ty.to_string()
        .replace(['<', '>'], "~")
        .replace(|c: char| c.is_whitespace(), "")
}

fn known_program_node(address: &str) -> Option<&'static str> {
    match address {
        SYSTEM_PROGRAM => Some("prog_SystemProgram"),
        TOKEN_PROGRAM => Some("prog_TokenProgram"),
        ASSOCIATED_TOKEN_PROGRAM => Some("prog_AssociatedTokenProgram"),
        _ => None,
    }
}

/// Flowchart of accounts, instructions and the programs they call.
pub fn flow_diagram(model: &ProgramModel) -> String {
    let mut ids = NodeIds::prefixed();
    for program in ["prog_SystemProgram", "prog_TokenProgram", "prog_AssociatedTokenProgram"] {
        ids.reserve(program);
    }
    let mut out = String::from("flowchart TB\n");

    out.push_str("subgraph Accounts\n");
    for (index, account) in model.accounts.iter().enumerate() {
        let id = ids.id("acc_", &account.name, index);
        let _ = writeln!(out, "  {}[\"{}\"]", id, label(&account.name));
    }
    out.push_str("end\n\n");

    out.push_str("subgraph Instructions\n");
    for (index, instruction) in model.instructions.iter().enumerate() {
        let id = ids.id("ix_", &instruction.name, index);
        let _ = writeln!(out, "  {}[\"{}\"]", id, label(&instruction.name));
    }
    out.push_str("end\n\n");

    out.push_str("subgraph Programs\n");
    out.push_str("  prog_SystemProgram[\"System Program\"]\n");
    out.push_str("  prog_TokenProgram[\"Token Program\"]\n");
    if model.references_address(ASSOCIATED_TOKEN_PROGRAM) {
        out.push_str("  prog_AssociatedTokenProgram[\"Associated Token Program\"]\n");
    }
    out.push_str("end\n\n");

    for (index, instruction) in model.instructions.iter().enumerate() {
        let ix = ids.id("ix_", &instruction.name, index);
        for account in &instruction.accounts {
            if let Some((position, declared)) = model.resolve_account(&account.name) {
                let _ = writeln!(out, "{} --> {}", ix, ids.id("acc_", &declared.name, position));
            }
            if let Some(program) = account.address.as_deref().and_then(known_program_node) {
                let _ = writeln!(out, "{} --> {}", ix, program);
            }
        }
    }

    out
}

/// Class diagram of declared accounts, their fields and PDA derivations.
pub fn accounts_diagram(model: &ProgramModel) -> String {
    let mut ids = NodeIds::bare();
    let mut out = String::from("classDiagram\n");

    for (index, account) in model.accounts.iter().enumerate() {
        let _ = writeln!(out, "class {} {{", ids.id("acc_", &account.name, index));
        if let Some(type_def) = model.type_def(&account.name) {
            for field in &type_def.fields {
                let _ = writeln!(out, "  +{} {}", class_type(&field.ty), field.name);
            }
        }
        out.push_str("}\n");
    }

    let mut seen = HashSet::new();
    for pda in &model.pdas {
        let Some((target_index, target)) = model.resolve_account(&pda.name) else {
            continue;
        };
        for source in pda.seeds.iter().filter_map(|seed| seed.referenced_account()) {
            let Some((source_index, source)) = model.resolve_account(source) else {
                continue;
            };
            if seen.insert((source_index, target_index)) {
                let _ = writeln!(
                    out,
                    "{} <.. {} : derives",
                    ids.id("acc_", &source.name, source_index),
                    ids.id("acc_", &target.name, target_index)
                );
            }
        }
    }

    out
}

/// Class diagram of instructions, their arguments and the accounts they use.
pub fn instructions_diagram(model: &ProgramModel) -> String {
    let mut ids = NodeIds::bare();
    let mut out = String::from("classDiagram\n");

    for (index, instruction) in model.instructions.iter().enumerate() {
        let _ = writeln!(out, "class {} {{", ids.id("ix_", &instruction.name, index));
        for arg in &instruction.args {
            let _ = writeln!(out, "  +{} {}", class_type(&arg.ty), arg.name);
        }
        out.push_str("}\n");
    }

    let mut used: Vec<(usize, &str)> = Vec::new();
    for instruction in &model.instructions {
        for account in &instruction.accounts {
            if let Some((position, declared)) = model.resolve_account(&account.name) {
                if !used.iter().any(|(seen, _)| *seen == position) {
                    used.push((position, &declared.name));
                }
            }
        }
    }
    for (position, name) in &used {
        let _ = writeln!(out, "class {} {{", ids.id("acc_", name, *position));
        out.push_str("  +Account\n");
        out.push_str("}\n");
    }

    for (index, instruction) in model.instructions.iter().enumerate() {
        let ix = ids.id("ix_", &instruction.name, index);
        for account in &instruction.accounts {
            if let Some((position, declared)) = model.resolve_account(&account.name) {
                let acc = ids.id("acc_", &declared.name, position);
                let _ = writeln!(out, "{} --> {} : uses", ix, acc);
            }
        }
    }

    out
}

/// Entity-relationship diagram of one instruction and its accounts.
pub fn er_diagram(instruction: &Instruction) -> String {
    let mut ids = NodeIds::prefixed();
    let mut out = String::from("erDiagram\n");
    let ix = ids.id("ix_", &instruction.name, 0);

    if instruction.accounts.is_empty() {
        let _ = writeln!(out, "    {}", ix);
    }
    for (index, account) in instruction.accounts.iter().enumerate() {
        let flags = account.flags();
        let relation = if flags.is_empty() {
            "uses".to_string()
        } else {
            flags.join(" ")
        };
        let _ = writeln!(
            out,
            "    {} ||--o| {} : \"{}\"",
            ix,
            ids.id("acc_", &account.name, index),
            relation
        );
    }
    out
}

/// One ER diagram per instruction
pub fn er_diagrams(model: &ProgramModel) -> Vec<String> {
    model.instructions.iter().map(er_diagram).collect()
}

/// Top-down flowchart of one instruction and its accounts.
pub fn overview_diagram(instruction: &Instruction) -> String {
    let mut ids = NodeIds::prefixed();
    let mut out = String::from("graph TD;\n");
    let ix = ids.id("inst_", &instruction.name, 0);
    let _ = writeln!(out, "{}[\"{}\"]:::instruction", ix, label(&instruction.name));
    for (index, account) in instruction.accounts.iter().enumerate() {
        let _ = writeln!(
            out,
            "{} --> {}[\"{}\"]:::account",
            ix,
            ids.id("acc_", &account.name, index),
            label(&account.name)
        );
    }
    out.push_str("classDef instruction fill:#ffcc80,stroke:#e65100,stroke-width:3px,font-style:italic;\n");
    out.push_str("classDef account fill:#80cbc4,stroke:#004d40,stroke-width:2px,font-style:italic;\n");
    out
}

/// One overview flowchart per instruction
pub fn overview_diagrams(model: &ProgramModel) -> Vec<String> {
    model.instructions.iter().map(overview_diagram).collect()
}
