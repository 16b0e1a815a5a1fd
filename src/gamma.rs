//! The table of free symbols ("gamma").
//!
//! Slots are appended in first-declaration order and never move, so a slot number
//! baked into a term by the parser stays valid for the lifetime of the table.

use std::fmt::Display;

use crate::tt::Term;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub label: String,
    pub value: Term,
}

impl Symbol {
    pub fn is_assigned(&self) -> bool {
        self.value != Term::Empty
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Returns the slot of `label`, appending an unassigned slot if there is none yet.
    pub fn declare(&mut self, label: &str) -> usize {
        if let Some(slot) = self.find_by_label(label) {
            return slot;
        }
        self.symbols.push(Symbol {
            label: label.to_owned(),
            value: Term::Empty,
        });
        log::debug!("declared symbol {label} at slot {}", self.symbols.len() - 1);
        self.symbols.len() - 1
    }

    pub fn find_by_label(&self, label: &str) -> Option<usize> {
        self.symbols.iter().position(|symbol| symbol.label == label)
    }

    pub fn get(&self, slot: usize) -> Option<&Symbol> {
        self.symbols.get(slot)
    }

    pub fn get_by_label(&self, label: &str) -> Option<&Symbol> {
        self.find_by_label(label).and_then(|slot| self.get(slot))
    }

    /// Returns false if `label` has never been declared.
    pub fn set(&mut self, label: &str, value: Term) -> bool {
        match self.find_by_label(label) {
            Some(slot) => self.set_slot(slot, value),
            None => false,
        }
    }

    /// Returns false if `slot` does not exist.
    pub fn set_slot(&mut self, slot: usize, value: Term) -> bool {
        match self.symbols.get_mut(slot) {
            Some(symbol) => {
                symbol.value = value;
                true
            }
            None => false,
        }
    }

    /// Resets the value of `slot` to [Term::Empty], keeping its label and position.
    pub fn clear(&mut self, slot: usize) -> bool {
        self.set_slot(slot, Term::Empty)
    }

    pub fn reset(&mut self) {
        self.symbols.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Symbol)> {
        self.symbols.iter().enumerate()
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (slot, symbol) in self.iter() {
            writeln!(f, "{slot} {} = {}", symbol.label, symbol.value)?;
        }
        Ok(())
    }
}
