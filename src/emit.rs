use crate::ir::{Expr, Keyword, Literal, Module, Segment, SequenceKind, Stmt};

fn escape_str(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

fn render_bytes(bytes: &[u8]) -> String {
    let mut out = String::from("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(char::from(b)),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push('\'');
    out
}

fn render_float(f: f64) -> String {
    if f.is_infinite() {
        // Smallest literal that overflows to infinity
        return if f > 0.0 { "1e309" } else { "-1e309" }.to_string();
    }
    // Debug keeps a trailing `.0` on integral values
    format!("{:?}", f)
}

pub fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::Bool(true) => "True".to_string(),
        Literal::Bool(false) => "False".to_string(),
        Literal::None => "None".to_string(),
        Literal::Int(n) => n.to_string(),
        Literal::BigInt(digits) => digits.clone(),
        Literal::Float(f) => render_float(*f),
        Literal::Str(s) => format!("'{}'", escape_str(s, '\'')),
        Literal::Bytes(b) => render_bytes(b),
        Literal::Ellipsis => "...".to_string(),
    }
}

fn join(exprs: &[Expr]) -> String {
    exprs.iter().map(render_expr).collect::<Vec<_>>().join(", ")
}

fn render_call(func: &Expr, args: &[Expr], keywords: &[Keyword]) -> String {
    let mut parts: Vec<String> = args.iter().map(render_expr).collect();
    parts.extend(
        keywords
            .iter()
            .map(|k| format!("{}={}", k.arg, render_expr(&k.value))),
    );
    format!("{}({})", render_operand(func), parts.join(", "))
}

fn render_operand(expr: &Expr) -> String {
    match expr {
        Expr::Assign { .. } => format!("({})", render_expr(expr)),
        _ => render_expr(expr),
    }
}

fn render_interpolated(parts: &[Segment]) -> String {
    let mut out = String::from("f\"");
    for part in parts {
        match part {
            Segment::Text(text) => {
                out.push_str(&escape_str(text, '"').replace('{', "{{").replace('}', "}}"))
            }
            Segment::Expr(expr) => {
                out.push('{');
                out.push_str(&render_expr(expr));
                out.push('}');
            }
        }
    }
    out.push('"');
    out
}

pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Literal { value } => render_literal(value),
        Expr::Name { id, .. } => id.clone(),
        Expr::Assign { target, value } => {
            format!("{} := {}", render_expr(target), render_expr(value))
        }
        Expr::Call {
            func,
            args,
            keywords,
        } => render_call(func, args, keywords),
        Expr::Attribute { value, attr, .. } => format!("{}.{}", render_operand(value), attr),
        Expr::Sequence { kind, elts, .. } => match kind {
            SequenceKind::List => format!("[{}]", join(elts)),
            SequenceKind::Tuple if elts.len() == 1 => format!("({},)", join(elts)),
            SequenceKind::Tuple => format!("({})", join(elts)),
            SequenceKind::Set if elts.is_empty() => "set()".to_string(),
            SequenceKind::Set => format!("{{{}}}", join(elts)),
        },
        Expr::Mapping { entries } => {
            let items: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("'{}': {}", escape_str(k, '\''), render_expr(v)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
        Expr::Interpolated { parts } => render_interpolated(parts),
    }
}

pub fn render_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Expr { value } => render_expr(value),
        Stmt::Assign { target, value } => {
            format!("{} = {}", render_expr(target), render_expr(value))
        }
    }
}

pub fn to_source(module: &Module) -> String {
    let mut out = String::new();
    for stmt in &module.body {
        out.push_str(&render_stmt(stmt));
        out.push('\n');
    }
    out
}
