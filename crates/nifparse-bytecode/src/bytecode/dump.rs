//! Human-readable schema disassembly.

use std::fmt::Write as _;

use nifparse_core::{Colors, Symbol};

use super::instruction::Instruction;
use super::opcode::Opcode;
use super::schema::Schema;

/// Disassemble the whole schema: symbols, type index and every program.
pub fn dump(schema: &Schema, colors: Colors) -> String {
    let mut out = String::new();
    let ctx = DumpContext::new(schema, colors);

    dump_symbols(&mut out, &ctx);
    dump_types(&mut out, &ctx);
    for (sym, _) in schema.types() {
        dump_program(&mut out, &ctx, sym);
    }

    out
}

/// Disassemble the program of a single type.
pub fn dump_type(schema: &Schema, ty: Symbol, colors: Colors) -> String {
    let mut out = String::new();
    let ctx = DumpContext::new(schema, colors);
    dump_program(&mut out, &ctx, ty);
    out
}

/// Decimal digits needed for indices below `count`.
pub fn width_for_count(count: usize) -> usize {
    if count <= 1 {
        1
    } else {
        ((count - 1) as f64).log10().floor() as usize + 1
    }
}

struct DumpContext<'s> {
    schema: &'s Schema,
    /// Width for symbol indices (S#).
    sym_width: usize,
    /// Width for program offsets.
    offset_width: usize,
    colors: Colors,
}

impl<'s> DumpContext<'s> {
    fn new(schema: &'s Schema, colors: Colors) -> Self {
        let code_len = schema.bytes().len() - schema.programs_start();
        Self {
            schema,
            sym_width: width_for_count(schema.symbol_count()),
            offset_width: width_for_count(code_len).max(2),
            colors,
        }
    }

    fn type_name(&self, sym: Symbol) -> String {
        let c = &self.colors;
        format!("{}{}{}", c.blue, self.schema.name(sym), c.reset)
    }

    fn field_name(&self, sym: Symbol) -> String {
        format!("{:?}", self.schema.name(sym))
    }

    fn number(&self, value: impl std::fmt::Display) -> String {
        let c = &self.colors;
        format!("{}{}{}", c.yellow, value, c.reset)
    }

    /// Name a symbol operand the way the interpreter will treat it.
    fn operand(&self, sym: Symbol) -> String {
        if self.schema.is_type_name(sym) {
            self.type_name(sym)
        } else {
            self.field_name(sym)
        }
    }
}

fn dump_symbols(out: &mut String, ctx: &DumpContext<'_>) {
    let c = &ctx.colors;
    let w = ctx.sym_width;

    writeln!(out, "{}[symbols]{}", c.blue, c.reset).unwrap();
    for (sym, text) in ctx.schema.interner().iter() {
        writeln!(out, "S{:0w$} {}{text:?}{}", sym.as_u32(), c.green, c.reset).unwrap();
    }
    out.push('\n');
}

fn dump_types(out: &mut String, ctx: &DumpContext<'_>) {
    let c = &ctx.colors;
    let ow = ctx.offset_width;

    writeln!(out, "{}[types]{}", c.blue, c.reset).unwrap();
    let max_len = ctx
        .schema
        .types()
        .map(|(sym, _)| ctx.schema.name(sym).len())
        .max()
        .unwrap_or(0);
    for (sym, offset) in ctx.schema.types() {
        let name = ctx.schema.name(sym);
        writeln!(
            out,
            "{}{name:max_len$}{} = {:0ow$}",
            c.blue, c.reset, offset
        )
        .unwrap();
    }
    out.push('\n');
}

fn dump_program(out: &mut String, ctx: &DumpContext<'_>, ty: Symbol) {
    let c = &ctx.colors;
    let ow = ctx.offset_width;
    let base = ctx.schema.programs_start();

    writeln!(out, "{}{}{}:", c.blue, ctx.schema.name(ty), c.reset).unwrap();

    let mut cursor = match ctx.schema.program(ty) {
        Ok(cursor) => cursor,
        Err(e) => {
            writeln!(out, "  {}; {e}{}", c.dim, c.reset).unwrap();
            out.push('\n');
            return;
        }
    };

    loop {
        let at = cursor.position() - base;
        let instr = match cursor.read_instruction() {
            Ok(instr) => instr,
            Err(e) => {
                writeln!(out, "  {}{at:0ow$}{}  {}; {e}{}", c.dim, c.reset, c.dim, c.reset)
                    .unwrap();
                break;
            }
        };

        let text = format_instruction(ctx, instr, cursor.position() - base);
        writeln!(out, "  {}{at:0ow$}{}  {text}", c.dim, c.reset).unwrap();

        if instr.opcode() == Opcode::End {
            break;
        }
    }
    out.push('\n');
}

/// Format one instruction. `next` is the relative offset after it.
fn format_instruction(ctx: &DumpContext<'_>, instr: Instruction, next: usize) -> String {
    let mnemonic = instr.opcode().mnemonic();
    match instr {
        Instruction::Simple(_) => mnemonic.to_string(),
        Instruction::NamedType(sym) | Instruction::Begin(sym) => {
            format!("{mnemonic} {}", ctx.type_name(sym))
        }
        Instruction::Field(sym)
        | Instruction::FieldIndirection(sym)
        | Instruction::HeaderField(sym) => format!("{mnemonic} {}", ctx.field_name(sym)),
        Instruction::FieldValue(sym) => format!("{mnemonic} {}", ctx.operand(sym)),
        Instruction::StaticArray(n) | Instruction::Literal(n) => {
            format!("{mnemonic} {}", ctx.number(n))
        }
        Instruction::Option { name, value } => {
            let c = &ctx.colors;
            format!(
                "{mnemonic} {}{}{} = {}",
                c.green,
                ctx.schema.name(name),
                c.reset,
                ctx.number(value)
            )
        }
        Instruction::Branch { displacement, .. } => {
            let ow = ctx.offset_width;
            let target = next - 2 + displacement as usize;
            format!("{mnemonic} {target:0ow$}")
        }
    }
}
