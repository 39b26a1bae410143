//! Graphviz DOT export.
//!
//! Images are left to `dot -Tpng`; this module only writes text.

use std::fmt::Write;

use crate::circuit::{Circuit, NodeId};
use crate::simulate::Fault;

const INPUT_FILL: &str = "#B0E0E6";
const GATE_FILL: &str = "#F5F5F5";
const OUTPUT_FILL: &str = "#90EE90";
const HIGHLIGHT_FILL: &str = "#FFB6C1";

/// Render the circuit as a left-to-right DOT digraph.
///
/// Nodes in `highlighted` (typically the nodes a fault changes) are filled
/// red; primary outputs get a double border.
pub fn to_dot(circuit: &Circuit, highlighted: &[NodeId]) -> String {
    to_dot_with_fault(circuit, highlighted, None)
}

/// Like [`to_dot`], also marking the faulted node and titling the graph
/// with the fault.
pub fn to_dot_with_fault(circuit: &Circuit, highlighted: &[NodeId], fault: Option<Fault>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph \"{}\" {{", escape(circuit.name()));
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [fontname=\"Helvetica\", style=filled];\n");
    out.push_str("  edge [fontname=\"Helvetica\"];\n");
    if let Some(f) = fault {
        let _ = writeln!(
            out,
            "  labelloc=\"t\";\n  label=\"{}\";",
            escape(&f.label(circuit))
        );
    }
    out.push('\n');

    for (id, node) in circuit.nodes() {
        let shape = if node.is_input() { "ellipse" } else { "box" };
        let fill = if highlighted.contains(&id) {
            HIGHLIGHT_FILL
        } else if node.is_input() {
            INPUT_FILL
        } else if circuit.is_output(id) {
            OUTPUT_FILL
        } else {
            GATE_FILL
        };
        let label = match fault {
            Some(f) if f.node == id => {
                format!("{}\\n{} (sa{})", node.name(), node.kind(), f.stuck_value())
            }
            _ if node.is_input() => node.name().to_string(),
            _ => format!("{}\\n{}", node.name(), node.kind()),
        };
        let peripheries = if circuit.is_output(id) { 2 } else { 1 };
        let _ = writeln!(
            out,
            "  \"{}\" [label=\"{}\", shape={}, fillcolor=\"{}\", peripheries={}];",
            escape(node.name()),
            escape_label(&label),
            shape,
            fill,
            peripheries
        );
    }
    out.push('\n');

    for (id, node) in circuit.nodes() {
        for &src in node.fanin() {
            let _ = writeln!(
                out,
                "  \"{}\" -> \"{}\";",
                escape(circuit.name_of(src)),
                escape(circuit.name_of(id))
            );
        }
    }

    out.push_str("}\n");
    out
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape quotes but keep the `\n` line breaks DOT labels use.
fn escape_label(s: &str) -> String {
    s.replace('"', "\\\"")
}
