use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    Bool(bool),
    None,
    Int(i64),
    // Canonical decimal digits of an integer outside the i64 range
    BigInt(String),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Ellipsis,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExprContext {
    #[default]
    Load,
    Store,
}

impl ExprContext {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "load" => Some(ExprContext::Load),
            "store" => Some(ExprContext::Store),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceKind {
    List,
    Tuple,
    Set,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub arg: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "segment", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Expr {
    Literal {
        value: Literal,
    },
    Name {
        id: String,
        ctx: ExprContext,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
        ctx: ExprContext,
    },
    Sequence {
        kind: SequenceKind,
        elts: Vec<Expr>,
        ctx: ExprContext,
    },
    Mapping {
        entries: Vec<(String, Expr)>,
    },
    Interpolated {
        parts: Vec<Segment>,
    },
}

impl Expr {
    pub fn literal(value: Literal) -> Self {
        Expr::Literal { value }
    }

    pub fn name(id: &str, ctx: ExprContext) -> Self {
        Expr::Name {
            id: id.to_string(),
            ctx,
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Expr { value: Expr },
    Assign { target: Expr, value: Expr },
}

impl From<Expr> for Stmt {
    fn from(expr: Expr) -> Self {
        match expr {
            Expr::Assign { target, value } => Stmt::Assign {
                target: *target,
                value: *value,
            },
            value => Stmt::Expr { value },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}
