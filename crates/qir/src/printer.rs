//! Text format printer.
//!
//! Values are numbered in definition order, starting over for every
//! function:
//!
//! ```text
//! func.func @main(%0: qubit) {
//!   %1 = arith.constf {value = 0.25} : f64
//!   %2 = quantum.rotate %1, %0 {axis = z} : qubit
//!   func.return %2
//! }
//! ```
//!
//! The format is for diagnostics and snapshots; there is no parser for it.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;

use crate::context::IrContext;
use crate::kind::OpKind;
use crate::refs::*;

/// Print state for value numbering.
struct PrintState<'a> {
    ctx: &'a IrContext,
    value_names: HashMap<ValueRef, String>,
    next_value_num: usize,
}

impl<'a> PrintState<'a> {
    fn new(ctx: &'a IrContext) -> Self {
        Self {
            ctx,
            value_names: HashMap::new(),
            next_value_num: 0,
        }
    }

    fn assign_value_name(&mut self, v: ValueRef) -> String {
        let name = format!("%{}", self.next_value_num);
        self.next_value_num += 1;
        self.value_names.insert(v, name.clone());
        name
    }

    fn get_value_name(&self, v: ValueRef) -> &str {
        self.value_names.get(&v).map(|s| s.as_str()).unwrap_or("%?")
    }

    fn reset_numbering(&mut self) {
        self.next_value_num = 0;
        self.value_names.clear();
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Print an operation (and everything nested in it) as IR text.
pub fn print_op(ctx: &IrContext, op: OpRef) -> String {
    let mut state = PrintState::new(ctx);
    let mut out = String::new();
    print_operation(&mut state, &mut out, op, 0).expect("fmt::Write to String never fails");
    out
}

// ============================================================================
// Operation printing
// ============================================================================

fn print_operation(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    op: OpRef,
    indent: usize,
) -> fmt::Result {
    if state.ctx.op_kind(op) == OpKind::Func {
        return print_func_op(state, f, op, indent);
    }
    print_generic_op(state, f, op, indent)
}

fn print_generic_op(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    op: OpRef,
    indent: usize,
) -> fmt::Result {
    let indent_str = " ".repeat(indent);
    write!(f, "{indent_str}")?;

    // Operands are named before results so that a (malformed) self
    // reference prints as `%?` instead of its own name.
    let operands: Vec<String> = state
        .ctx
        .op_operands(op)
        .iter()
        .map(|&v| state.get_value_name(v).to_owned())
        .collect();

    let results = state.ctx.op_results(op);
    if !results.is_empty() {
        for (i, &v) in results.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let name = state.assign_value_name(v);
            f.write_str(&name)?;
        }
        f.write_str(" = ")?;
    }

    let data = state.ctx.op(op);
    write!(f, "{}", data.kind)?;

    if !operands.is_empty() {
        write!(f, " {}", operands.join(", "))?;
    }

    if !data.attributes.is_empty() {
        f.write_str(" {")?;
        for (i, (key, val)) in data.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key} = {val}")?;
        }
        f.write_char('}')?;
    }

    if !data.results.is_empty() {
        f.write_str(" : ")?;
        for (i, ty) in data.results.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{ty}")?;
        }
    }

    for &region in &data.regions {
        f.write_str(" {\n")?;
        print_region(state, f, region, indent + 2)?;
        write!(f, "{indent_str}}}")?;
    }

    f.write_char('\n')
}

fn print_region(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    region: RegionRef,
    indent: usize,
) -> fmt::Result {
    let blocks: Vec<BlockRef> = state.ctx.region(region).blocks.to_vec();
    let can_elide_label = blocks.len() == 1 && state.ctx.block_args(blocks[0]).is_empty();

    for (i, &block) in blocks.iter().enumerate() {
        if !can_elide_label {
            let indent_str = " ".repeat(indent.saturating_sub(2));
            write!(f, "{indent_str}^bb{i}")?;
            let args = state.ctx.block_args(block);
            if !args.is_empty() {
                f.write_char('(')?;
                for (j, &arg) in args.iter().enumerate() {
                    if j > 0 {
                        f.write_str(", ")?;
                    }
                    let name = state.assign_value_name(arg);
                    write!(f, "{name}: {}", state.ctx.value_ty(arg))?;
                }
                f.write_char(')')?;
            }
            f.write_str(":\n")?;
        }
        print_block_ops(state, f, block, indent)?;
    }
    Ok(())
}

fn print_block_ops(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    block: BlockRef,
    indent: usize,
) -> fmt::Result {
    let ops: Vec<OpRef> = state.ctx.block(block).ops.to_vec();
    for op in ops {
        print_operation(state, f, op, indent)?;
    }
    Ok(())
}

fn print_func_op(
    state: &mut PrintState<'_>,
    f: &mut impl Write,
    op: OpRef,
    indent: usize,
) -> fmt::Result {
    let indent_str = " ".repeat(indent);
    let data = state.ctx.op(op);

    write!(f, "{indent_str}func.func")?;
    if let Some(name) = data.attributes.get("sym_name").and_then(|a| a.as_str()) {
        write!(f, " @{name}")?;
    }

    state.reset_numbering();

    let Some(&body) = data.regions.first() else {
        return f.write_char('\n');
    };
    let blocks: Vec<BlockRef> = state.ctx.region(body).blocks.to_vec();

    // Entry block arguments form the signature
    f.write_char('(')?;
    if let Some(&entry) = blocks.first() {
        for (i, &arg) in state.ctx.block_args(entry).iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let name = state.assign_value_name(arg);
            write!(f, "{name}: {}", state.ctx.value_ty(arg))?;
        }
    }
    f.write_str(") {\n")?;

    for (i, &block) in blocks.iter().enumerate() {
        if i > 0 {
            write!(f, "{indent_str}^bb{i}")?;
            let args = state.ctx.block_args(block);
            if !args.is_empty() {
                f.write_char('(')?;
                for (j, &arg) in args.iter().enumerate() {
                    if j > 0 {
                        f.write_str(", ")?;
                    }
                    let name = state.assign_value_name(arg);
                    write!(f, "{name}: {}", state.ctx.value_ty(arg))?;
                }
                f.write_char(')')?;
            }
            f.write_str(":\n")?;
        }
        print_block_ops(state, f, block, indent + 2)?;
    }

    writeln!(f, "{indent_str}}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_func;
    use crate::dialect::DialectOp;
    use crate::types::{Axis, Type};

    #[test]
    fn prints_function_with_nested_region() {
        let mut ctx = IrContext::new();
        let (f, _) = build_func(&mut ctx, "main", &[Type::Qubit], |b, args| {
            let a = b.constf(0.25);
            let q = b.rotate(Axis::Z, a, args[0]);
            let m = b.measure(q);
            b.if_(m, &[], |inner| {
                let two = inner.constf(2.0);
                inner.addf(a, two);
                inner.yield_(&[]);
            });
            b.ret(&[q]);
        });

        insta::assert_snapshot!(print_op(&ctx, f.op_ref()), @r"
        func.func @main(%0: qubit) {
          %1 = arith.constf {value = 0.25} : f64
          %2 = quantum.rotate %1, %0 {axis = z} : qubit
          %3 = quantum.measure %2 : i1
          scf.if %3 {
            %4 = arith.constf {value = 2.0} : f64
            %5 = arith.addf %1, %4 : f64
            scf.yield
          }
          func.return %2
        }
        ");
    }

    #[test]
    fn numbering_restarts_per_function() {
        let mut ctx = IrContext::new();
        let (f, _) = build_func(&mut ctx, "first", &[], |b, _| {
            let q = b.alloc();
            let q = b.h(q);
            b.ret(&[q]);
        });
        let (g, _) = build_func(&mut ctx, "second", &[], |b, _| {
            let q = b.alloc();
            let q = b.x(q);
            b.ret(&[q]);
        });

        let first = print_op(&ctx, f.op_ref());
        let second = print_op(&ctx, g.op_ref());
        assert!(first.contains("%1 = quantum.h %0 : qubit"), "{first}");
        assert!(second.contains("%1 = quantum.x %0 : qubit"), "{second}");
    }
}
