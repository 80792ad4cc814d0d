use crate::config::Config;
use crate::error::{Error, Result};
use crate::ir::{Expr, ExprContext, Keyword, Segment, SequenceKind};
use crate::literal;
use crate::node::{NodeId, NodeTree};

// Only `Expr` counts as a produced value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Expr(Expr),
    Item { key: String, value: Box<Value> },
    Attr(AttrAccess),
}

impl Value {
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            Value::Expr(expr) => Some(expr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    pub args: Vec<Expr>,
    pub keywords: Vec<Keyword>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrAccess {
    pub name: String,
    pub store: Option<Expr>,
    pub call: Option<Arguments>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Element,
    Sequence(SequenceKind),
    Mapping,
    DictItem,
    Interpolated,
    Attribute,
    Name,
}

impl Rule {
    pub fn for_tag(tag: &str) -> Self {
        match tag {
            "e" => Rule::Element,
            "list" => Rule::Sequence(SequenceKind::List),
            "tuple" => Rule::Sequence(SequenceKind::Tuple),
            "set" => Rule::Sequence(SequenceKind::Set),
            "dict" => Rule::Mapping,
            "item" => Rule::DictItem,
            "fstring" => Rule::Interpolated,
            "attr" => Rule::Attribute,
            _ => Rule::Name,
        }
    }
}

pub struct Evaluator<'t, 'a> {
    tree: &'t NodeTree<'a>,
    config: &'t Config,
}

impl<'t, 'a> Evaluator<'t, 'a> {
    pub fn new(tree: &'t NodeTree<'a>, config: &'t Config) -> Self {
        Evaluator { tree, config }
    }

    pub fn evaluate(&self, id: NodeId) -> Result<Value> {
        let rule = Rule::for_tag(&self.tree.element(id).tag);
        tracing::trace!(path = %self.tree.path(id), ?rule, "evaluating node");
        match rule {
            Rule::Element => self.element(id),
            Rule::Sequence(kind) => self.sequence(id, kind).map(Value::Expr),
            Rule::Mapping => self.mapping(id).map(Value::Expr),
            Rule::DictItem => self.dict_item(id),
            Rule::Interpolated => self.interpolated(id).map(Value::Expr),
            Rule::Attribute => self.attribute(id).map(Value::Attr),
            Rule::Name => self.name(id).map(Value::Expr),
        }
    }

    fn flag(&self, id: NodeId, attribute: &str) -> Result<bool> {
        match self.tree.element(id).attr(attribute) {
            None => Ok(false),
            Some(value) => literal::parse_bool(value).ok_or_else(|| Error::InvalidFlag {
                path: self.tree.path(id),
                attribute: attribute.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn required_attr(&self, id: NodeId, attribute: &str) -> Result<&'a str> {
        self.tree
            .element(id)
            .attr(attribute)
            .ok_or_else(|| Error::MissingAttribute {
                path: self.tree.path(id),
                attribute: attribute.to_string(),
            })
    }

    // Python has no expression form for assigning to an attribute.
    fn embed(&self, at: NodeId, expr: Expr) -> Result<Expr> {
        if let Expr::Assign { target, .. } = &expr {
            if !matches!(**target, Expr::Name { .. }) {
                return Err(Error::malformed(
                    self.tree.path(at),
                    "attribute assignment used as a value",
                ));
            }
        }
        Ok(expr)
    }

    fn child_expr(&self, child: NodeId) -> Result<Expr> {
        match self.tree.value(child)? {
            Value::Expr(expr) => self.embed(child, expr.clone()),
            _ => Err(Error::malformed(
                self.tree.path(child),
                "expected an expression",
            )),
        }
    }

    fn child_exprs(&self, id: NodeId) -> Result<Vec<Expr>> {
        let mut exprs = Vec::new();
        for child in self.tree.children(id) {
            if let Some(expr) = self.tree.value(*child)?.as_expr() {
                exprs.push(self.embed(*child, expr.clone())?);
            }
        }
        Ok(exprs)
    }

    // `ctx` attribute, then the inherited hint, then load
    fn context(&self, id: NodeId) -> ExprContext {
        let node = self.tree.get(id);
        let name = node
            .element
            .attr("ctx")
            .or_else(|| node.meta.get("ctx").map(String::as_str));
        match name {
            None => ExprContext::Load,
            Some(name) => ExprContext::from_name(name).unwrap_or_else(|| {
                tracing::warn!(path = %self.tree.path(id), ctx = name, "unknown ctx, using load");
                ExprContext::Load
            }),
        }
    }

    fn arguments(&self, id: NodeId) -> Result<(Arguments, Vec<AttrAccess>)> {
        let mut arguments = Arguments::default();
        let mut attrs = Vec::new();
        for child in self.tree.children(id) {
            match self.tree.value(*child)? {
                Value::Attr(access) => attrs.push(access.clone()),
                Value::Item { key, value } => {
                    let value = value.as_expr().cloned().ok_or_else(|| {
                        Error::malformed(self.tree.path(*child), "keyword value is not an expression")
                    })?;
                    arguments.keywords.push(Keyword {
                        arg: key.clone(),
                        value: self.embed(*child, value)?,
                    });
                }
                Value::Expr(expr) => arguments.args.push(self.embed(*child, expr.clone())?),
            }
        }
        Ok((arguments, attrs))
    }

    fn element(&self, id: NodeId) -> Result<Value> {
        let element = self.tree.element(id);
        if !element.is_leaf() {
            if self.flag(id, "f")? {
                return self.interpolated(id).map(Value::Expr);
            }
            return match self.tree.children(id) {
                [only] => Ok(self.tree.value(*only)?.clone()),
                _ => Err(Error::malformed(
                    self.tree.path(id),
                    format!(
                        "element with {} child elements must be interpolated",
                        element.children.len()
                    ),
                )),
            };
        }

        let text = element.trimmed_text();
        let value = match element.attr("cast") {
            Some(kind) => {
                let encoding = element
                    .attr("encoding")
                    .unwrap_or(self.config.default_encoding.as_str());
                literal::cast(text, kind, encoding).map_err(|source| Error::Cast {
                    path: self.tree.path(id),
                    source,
                })?
            }
            None => literal::coerce(text),
        };
        Ok(Value::Expr(Expr::literal(value)))
    }

    fn sequence(&self, id: NodeId, kind: SequenceKind) -> Result<Expr> {
        Ok(Expr::Sequence {
            kind,
            elts: self.child_exprs(id)?,
            ctx: self.context(id),
        })
    }

    fn mapping(&self, id: NodeId) -> Result<Expr> {
        let mut entries = Vec::new();
        for child in self.tree.children(id) {
            match self.tree.value(*child)? {
                Value::Item { key, value } => match value.as_expr() {
                    Some(expr) => entries.push((key.clone(), self.embed(*child, expr.clone())?)),
                    None => {
                        tracing::warn!(path = %self.tree.path(*child), "dropping non-expression dict value")
                    }
                },
                _ => tracing::warn!(path = %self.tree.path(*child), "dropping non-item dict entry"),
            }
        }
        Ok(Expr::Mapping { entries })
    }

    fn dict_item(&self, id: NodeId) -> Result<Value> {
        let key = self.required_attr(id, "name")?.to_string();
        let value = self.element(id)?;
        Ok(Value::Item {
            key,
            value: Box::new(value),
        })
    }

    fn interpolated(&self, id: NodeId) -> Result<Expr> {
        let element = self.tree.element(id);
        let mut parts = Vec::new();
        let leading = element.trimmed_text();
        if !leading.is_empty() {
            parts.push(Segment::Text(leading.to_string()));
        }
        for (child, raw) in self.tree.children(id).iter().zip(&element.children) {
            if let Some(expr) = self.tree.value(*child)?.as_expr() {
                parts.push(Segment::Expr(self.embed(*child, expr.clone())?));
            }
            let tail = raw.tail.as_deref().map_or("", str::trim);
            if !tail.is_empty() {
                parts.push(Segment::Text(tail.to_string()));
            }
        }
        Ok(Expr::Interpolated { parts })
    }

    fn attribute(&self, id: NodeId) -> Result<AttrAccess> {
        let name = self.required_attr(id, "name")?.to_string();
        let store = if self.tree.element(id).trimmed_text().is_empty() {
            None
        } else {
            match self.element(id)? {
                Value::Expr(expr) => Some(self.embed(id, expr)?),
                _ => {
                    return Err(Error::malformed(
                        self.tree.path(id),
                        "attribute value is not an expression",
                    ))
                }
            }
        };
        let call = if self.flag(id, "call")? {
            if store.is_some() {
                return Err(Error::malformed(
                    self.tree.path(id),
                    "an assigned attribute cannot be called",
                ));
            }
            Some(self.arguments(id)?.0)
        } else {
            None
        };
        Ok(AttrAccess { name, store, call })
    }

    fn name(&self, id: NodeId) -> Result<Expr> {
        let element = self.tree.element(id);
        let tag = element.tag.as_str();

        if !element.trimmed_text().is_empty() {
            let value = match self.element(id)? {
                Value::Expr(expr) => self.embed(id, expr)?,
                _ => {
                    return Err(Error::malformed(
                        self.tree.path(id),
                        "assigned value is not an expression",
                    ))
                }
            };
            return Ok(Expr::assign(Expr::name(tag, ExprContext::Store), value));
        }

        let call = self.flag(id, "call")?;
        let (arguments, attrs) = self.arguments(id)?;
        let mut value = Expr::name(tag, ExprContext::Load);

        if !call && attrs.is_empty() {
            if let [only] = self.tree.children(id) {
                return Ok(Expr::assign(
                    Expr::name(tag, ExprContext::Store),
                    self.child_expr(*only)?,
                ));
            }
            return Ok(value);
        }

        if call {
            value = Expr::Call {
                func: Box::new(value),
                args: arguments.args,
                keywords: arguments.keywords,
            };
        }
        for access in attrs {
            if matches!(value, Expr::Assign { .. }) {
                return Err(Error::malformed(
                    self.tree.path(id),
                    format!("attribute '{}' follows an attribute assignment", access.name),
                ));
            }
            value = chain(value, access);
        }
        Ok(value)
    }
}

fn chain(value: Expr, access: AttrAccess) -> Expr {
    let mut value = match access.store {
        Some(stored) => Expr::assign(
            Expr::Attribute {
                value: Box::new(value),
                attr: access.name,
                ctx: ExprContext::Store,
            },
            stored,
        ),
        None => Expr::Attribute {
            value: Box::new(value),
            attr: access.name,
            ctx: ExprContext::Load,
        },
    };
    if let Some(arguments) = access.call {
        value = Expr::Call {
            func: Box::new(value),
            args: arguments.args,
            keywords: arguments.keywords,
        };
    }
    value
}
