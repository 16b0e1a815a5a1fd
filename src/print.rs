use std::collections::HashSet;

use crate::gamma::SymbolTable;
use crate::tt::Term;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// `(f x y)` on one line
    #[default]
    Flat,
    /// one argument per line, indented by application nesting
    Indented,
}

/// Renders nameless terms with synthetic binder names.
///
/// Binders are named `a`, `b`, ... `z`, `a1`, ... avoiding the names already bound on the
/// way down; a binder never referred to in its body is printed as `_`. Free names print
/// as their gamma label in upper case.
pub struct Printer<'a> {
    gamma: &'a SymbolTable,
    layout: Layout,
}

impl<'a> Printer<'a> {
    pub fn new(gamma: &'a SymbolTable) -> Self {
        Printer {
            gamma,
            layout: Layout::Flat,
        }
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn print(&self, m: &Term) -> String {
        let mut names = vec![];
        let (s, _) = self.print_help(m, &mut names, 0, false);
        assert!(names.is_empty());
        s
    }

    fn fresh(names: &[String]) -> String {
        (0..)
            .map(|i: usize| {
                let letter = char::from(b'a' + (i % 26) as u8);
                match i / 26 {
                    0 => letter.to_string(),
                    suffix => format!("{letter}{suffix}"),
                }
            })
            .find(|candidate| !names.contains(candidate))
            .expect("infinitely many candidates")
    }

    fn free_name(&self, slot: usize) -> String {
        match self.gamma.get(slot) {
            Some(symbol) => symbol.label.to_uppercase(),
            None => format!("#{slot}"),
        }
    }

    /// Returns the rendering together with the binder names it refers to.
    fn print_help(
        &self,
        m: &Term,
        names: &mut Vec<String>,
        indent: usize,
        omit_parens: bool,
    ) -> (String, HashSet<String>) {
        match m {
            Term::Var(i) => {
                if *i < names.len() {
                    let name = names[names.len() - i - 1].clone();
                    let used = HashSet::from([name.clone()]);
                    (name, used)
                } else {
                    (self.free_name(i - names.len()), HashSet::new())
                }
            }
            Term::Abs(inner) => {
                let param = Self::fresh(names);
                names.push(param);
                let (body, mut used) = self.print_help(&inner.body, names, indent, false);
                let param = names.pop().expect("pushed above");
                if used.remove(&param) {
                    (format!("\\{param}.{body}"), used)
                } else {
                    (format!("\\_.{body}"), used)
                }
            }
            Term::App(inner) => {
                let group = if omit_parens { indent } else { indent + 1 };
                let (fun, mut used) = self.print_help(&inner.fun, names, group, true);
                let (arg, used_arg) = self.print_help(&inner.arg, names, group, false);
                used.extend(used_arg);
                let sep = match self.layout {
                    Layout::Flat => " ".to_owned(),
                    Layout::Indented => format!("\n{}", "  ".repeat(group)),
                };
                if omit_parens {
                    (format!("{fun}{sep}{arg}"), used)
                } else {
                    (format!("({fun}{sep}{arg})"), used)
                }
            }
            Term::Assign(inner) => {
                let (name, _) = self.print_help(&Term::Var(inner.name), names, indent, false);
                let (value, used) = self.print_help(&inner.value, names, indent, false);
                (format!("<{name}, {value}>"), used)
            }
            Term::Empty => ("nil".to_owned(), HashSet::new()),
        }
    }
}

pub fn prettify(m: &Term, gamma: &SymbolTable) -> String {
    Printer::new(gamma).print(m)
}
