//! Gate kinds and their boolean functions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kind of a circuit node.
///
/// `Input` marks a primary input; every other kind is a gate evaluated from
/// its fan-in values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    Input,
    Buf,
    Not,
    And,
    Or,
    Nand,
    Nor,
    Xor,
    Xnor,
}

/// Number of fan-in wires a gate kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    One,
    AtLeastTwo,
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::None => n == 0,
            Arity::One => n == 1,
            Arity::AtLeastTwo => n >= 2,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Arity::None => "no",
            Arity::One => "exactly one",
            Arity::AtLeastTwo => "at least two",
        }
    }
}

impl GateKind {
    pub const ALL: [GateKind; 9] = [
        GateKind::Input,
        GateKind::Buf,
        GateKind::Not,
        GateKind::And,
        GateKind::Or,
        GateKind::Nand,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Xnor,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GateKind::Input => "INPUT",
            GateKind::Buf => "BUF",
            GateKind::Not => "NOT",
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Nand => "NAND",
            GateKind::Nor => "NOR",
            GateKind::Xor => "XOR",
            GateKind::Xnor => "XNOR",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            GateKind::Input => Arity::None,
            GateKind::Buf | GateKind::Not => Arity::One,
            _ => Arity::AtLeastTwo,
        }
    }

    pub fn is_input(self) -> bool {
        self == GateKind::Input
    }

    /// Evaluate the gate over its fan-in values.
    ///
    /// XOR/XNOR over more than two inputs compute odd/even parity. `Input`
    /// has no function of its own; callers supply primary input values, and
    /// evaluating it returns `false`.
    pub fn eval(self, inputs: &[bool]) -> bool {
        match self {
            GateKind::Input => false,
            GateKind::Buf => inputs.first().copied().unwrap_or(false),
            GateKind::Not => !inputs.first().copied().unwrap_or(false),
            GateKind::And => inputs.iter().all(|&v| v),
            GateKind::Or => inputs.iter().any(|&v| v),
            GateKind::Nand => !inputs.iter().all(|&v| v),
            GateKind::Nor => !inputs.iter().any(|&v| v),
            GateKind::Xor => inputs.iter().filter(|&&v| v).count() % 2 == 1,
            GateKind::Xnor => inputs.iter().filter(|&&v| v).count() % 2 == 0,
        }
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for GateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INPUT" | "IN" | "PI" => Ok(GateKind::Input),
            "BUF" | "BUFFER" => Ok(GateKind::Buf),
            "NOT" | "INV" => Ok(GateKind::Not),
            "AND" => Ok(GateKind::And),
            "OR" => Ok(GateKind::Or),
            "NAND" => Ok(GateKind::Nand),
            "NOR" => Ok(GateKind::Nor),
            "XOR" => Ok(GateKind::Xor),
            "XNOR" => Ok(GateKind::Xnor),
            _ => Err(format!("unknown gate kind: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_input_truth_tables() {
        let rows = [[false, false], [false, true], [true, false], [true, true]];
        let expect = |kind: GateKind| rows.iter().map(|r| kind.eval(r)).collect::<Vec<_>>();
        assert_eq!(expect(GateKind::And), [false, false, false, true]);
        assert_eq!(expect(GateKind::Or), [false, true, true, true]);
        assert_eq!(expect(GateKind::Nand), [true, true, true, false]);
        assert_eq!(expect(GateKind::Nor), [true, false, false, false]);
        assert_eq!(expect(GateKind::Xor), [false, true, true, false]);
        assert_eq!(expect(GateKind::Xnor), [true, false, false, true]);
    }

    #[test]
    fn unary_gates() {
        assert!(GateKind::Buf.eval(&[true]));
        assert!(!GateKind::Buf.eval(&[false]));
        assert!(GateKind::Not.eval(&[false]));
        assert!(!GateKind::Not.eval(&[true]));
    }

    #[test]
    fn wide_xor_is_parity() {
        assert!(GateKind::Xor.eval(&[true, true, true]));
        assert!(!GateKind::Xor.eval(&[true, true, false]));
        assert!(GateKind::Xnor.eval(&[true, true, false]));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("and".parse::<GateKind>().unwrap(), GateKind::And);
        assert_eq!(" Xnor ".parse::<GateKind>().unwrap(), GateKind::Xnor);
        assert_eq!("inv".parse::<GateKind>().unwrap(), GateKind::Not);
        assert!("MUX".parse::<GateKind>().is_err());
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in GateKind::ALL {
            assert_eq!(kind.name().parse::<GateKind>().unwrap(), kind);
        }
    }

    #[test]
    fn arity_rules() {
        assert!(GateKind::Input.arity().accepts(0));
        assert!(!GateKind::Input.arity().accepts(1));
        assert!(GateKind::Not.arity().accepts(1));
        assert!(!GateKind::Not.arity().accepts(2));
        assert!(GateKind::And.arity().accepts(3));
        assert!(!GateKind::And.arity().accepts(1));
    }
}
