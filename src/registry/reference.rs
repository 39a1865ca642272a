use std::fmt::Write;

use super::{all_operations, lookup, OperationCategory, OperationSignature, ParamTypes};

fn signature_line(op: &OperationSignature) -> String {
    let params: Vec<String> = op
        .parameters
        .iter()
        .map(|p| if p.required { p.name.to_string() } else { format!("{}?", p.name) })
        .collect();
    format!("{}({})", op.system_name, params.join(", "))
}

fn accepted(types: &ParamTypes) -> String {
    types.describe().join(" \\| ")
}

fn dataflow(names: &[&str]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.iter().map(|n| format!("`{n}`")).collect::<Vec<_>>().join(", ")
    }
}

/// Markdown table of operations, grouped by category.
fn operations_table() -> String {
    let mut out = String::new();
    out.push_str("## Operations\n\n");

    for category in OperationCategory::all() {
        let ops: Vec<_> = all_operations().filter(|op| op.category == *category).collect();
        if ops.is_empty() {
            continue;
        }

        let _ = writeln!(out, "### {} ({})", category.slug(), category.description());
        out.push_str("| Operation | Description | Reads | Writes |\n");
        out.push_str("|-----------|-------------|-------|--------|\n");
        for op in &ops {
            let _ = writeln!(
                out,
                "| `{}` | {} | {} | {} |",
                signature_line(op),
                op.description,
                dataflow(op.dependencies),
                dataflow(op.outputs),
            );
        }
        out.push('\n');
    }

    out
}

/// Detailed parameter listing for one operation, or `None` if unknown.
pub fn describe_operation(name: &str) -> Option<String> {
    let op = lookup(name)?;
    let mut out = String::new();
    let _ = writeln!(out, "## {}\n", signature_line(op));
    let _ = writeln!(out, "{}\n", op.description);

    if op.parameters.is_empty() {
        out.push_str("Takes no parameters.\n");
    } else {
        out.push_str("| Parameter | Accepts | Required | Default | Description |\n");
        out.push_str("|-----------|---------|----------|---------|-------------|\n");
        for p in op.parameters {
            let _ = writeln!(
                out,
                "| `{}` | {} | {} | {} | {} |",
                p.name,
                accepted(&p.types),
                if p.required { "yes" } else { "no" },
                p.default.unwrap_or("-"),
                p.description,
            );
        }
    }

    if !op.dependencies.is_empty() {
        let _ = writeln!(out, "\nReads: {}", dataflow(op.dependencies));
    }
    if !op.outputs.is_empty() {
        let _ = writeln!(out, "\nWrites: {}", dataflow(op.outputs));
    }
    Some(out)
}

/// Complete operation reference, generated from the registry.
pub fn operation_reference() -> String {
    let mut out = String::new();

    out.push_str(
        r"# Eligius Operation Reference

Every operation call in an action body is checked against this table.
Arguments bind positionally: required parameters first, then optional ones.
A single object literal whose keys name the remaining parameters is
flattened, so `animate({opacity: 1}, 500)` and
`animate({animationProperties: {opacity: 1}, animationDuration: 500})`
produce the same operation data.

An operation that reads a value (`Reads`) needs an earlier operation in the
same sequence that writes it (`Writes`).

## Runtime references
| Source | Lowered form |
|--------|--------------|
| action parameter `p` | `$operationdata.p` |
| event action parameter (position `i`) | `$operationdata.eventArgs[i]` |
| `@@name` | `$scope.name` |
| loop variable | `$scope.currentItem` |
| non-constant local `x` | `$scope.variables.x` |
| non-constant global `g` | `$globaldata.g` |

",
    );

    out.push_str(&operations_table());

    out.push_str(
        r"## Control flow
| Source | Operations |
|--------|------------|
| `if (c) { A } else { B }` | `when(c)`, A, `otherwise()`, B, `endWhen()` |
| `for (x in xs) { A }` | `forEach(xs, x)`, A, `endForEach()` |
| `break` / `continue` | `breakForEach()` / `continueForEach()` |
| `name(args)` (custom action) | `requestAction(name)`, `startAction({actionOperationData})` |
",
    );

    out
}
