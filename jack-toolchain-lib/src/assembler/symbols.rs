//! The assembler's symbol table.

use lazy_static::lazy_static;

use std::collections::HashMap;

lazy_static! {
    /// Symbols every Hack program can use without defining them.
    static ref PREDEFINED: HashMap<String, u16> = {
        let mut map: HashMap<String, u16> = [
            ("SP", 0),
            ("LCL", 1),
            ("ARG", 2),
            ("THIS", 3),
            ("THAT", 4),
            ("SCREEN", 0x4000),
            ("KBD", 0x6000),
        ]
        .iter()
        .map(|&(name, address)| (name.to_string(), address))
        .collect();
        for nr in 0..16 {
            map.insert(format!("R{}", nr), nr);
        }
        map
    };
}

/// Maps identifiers to 15-bit addresses.
///
/// Seeded with the predefined Hack symbols. Labels bind ROM addresses during
/// the first pass; identifiers that are still unknown when an A-instruction
/// is encoded become RAM variables, allocated densely from address 16 in
/// order of first use.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, u16>,
    next_variable: u16,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: PREDEFINED.clone(),
            next_variable: 16,
        }
    }
    /// Bind `label` to a ROM address.
    pub fn define(&mut self, label: &str, address: u16) {
        self.symbols.insert(label.to_string(), address);
    }
    /// Resolve `name`, allocating a fresh variable address if it is unknown.
    pub fn resolve(&mut self, name: &str) -> u16 {
        if let Some(&address) = self.symbols.get(name) {
            return address;
        }
        let address = self.next_variable;
        self.symbols.insert(name.to_string(), address);
        self.next_variable += 1;
        address
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
