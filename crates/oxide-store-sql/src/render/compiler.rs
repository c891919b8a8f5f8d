//! Token compiler: turns one token into a text fragment.

use super::Renderer;
use crate::condition::Condition;
use crate::error::Result;
use crate::token::{Token, TokenKind};
use crate::value::SqlValue;

/// Marks a bind position until the linker numbers placeholders.
pub(crate) const PLACEHOLDER: char = '\u{1a}';

/// Starts an escaped marker character in prepared statement text: `p` for
/// [`PLACEHOLDER`], `e` for the escape itself.
pub(crate) const ESCAPE: char = '\u{1b}';

/// Compiled text of a single token plus the values it binds.
#[derive(Debug, Clone)]
pub(crate) struct Fragment {
    pub kind: TokenKind,
    pub text: String,
    pub binds: Vec<SqlValue>,
}

/// Compiles one token in the renderer's current build context.
pub(crate) fn compile(renderer: &mut Renderer<'_>, token: &Token) -> Result<Fragment> {
    let mut binds = Vec::new();
    let text = match token {
        Token::Value(value) => value_text(renderer, value, &mut binds),
        Token::Set { column, value, .. } => {
            let column = escaped(renderer, column.clone());
            format!("{column}={}", value_text(renderer, value, &mut binds))
        }
        Token::Condition(condition) => {
            format!("{} ", condition_text(renderer, condition, &mut binds)?)
        }
        _ => {
            let text = statement_text(renderer, token)?;
            escaped(renderer, text)
        }
    };
    Ok(Fragment {
        kind: token.kind(),
        text,
        binds,
    })
}

/// Text of a token that binds no values.
fn statement_text(renderer: &mut Renderer<'_>, token: &Token) -> Result<String> {
    let dialect = renderer.dialect();
    let text = match token {
        Token::Create { table } => format!("{} {table} ", dialect.keyword(TokenKind::CreateTable)),
        Token::Drop { table } => format!("{} {table} ", dialect.keyword(TokenKind::DropTable)),
        Token::Select => format!("{} ", dialect.keyword(TokenKind::Select)),
        Token::Distinct => format!("{} ", dialect.keyword(TokenKind::Distinct)),
        Token::Insert { table } => format!("{} {table} ", dialect.keyword(TokenKind::Insert)),
        Token::Values => format!("{} ", dialect.keyword(TokenKind::Values)),
        Token::Update { table } => format!("{} {table} ", dialect.keyword(TokenKind::Update)),
        Token::Delete { table } => format!("{} {table} ", dialect.keyword(TokenKind::Delete)),
        Token::Column(column) => {
            renderer.inc_column_count();
            dialect.column_definition(column)?
        }
        Token::From { table } => format!("{} {table} ", dialect.keyword(TokenKind::From)),
        Token::Where => format!("{} ", dialect.keyword(TokenKind::Where)),
        Token::And => format!("{} ", dialect.keyword(TokenKind::And)),
        Token::Or => format!("{} ", dialect.keyword(TokenKind::Or)),
        Token::OrderBy { column, order } => match order {
            Some(order) => format!(
                "{} {column} {} ",
                dialect.keyword(TokenKind::OrderBy),
                dialect.keyword(order.kind())
            ),
            None => format!("{} {column} ", dialect.keyword(TokenKind::OrderBy)),
        },
        Token::GroupBy { column } => format!("{} {column} ", dialect.keyword(TokenKind::GroupBy)),
        Token::Limit(count) => format!("{} {count} ", dialect.keyword(TokenKind::Limit)),
        Token::Value(_) | Token::Set { .. } | Token::Condition(_) => String::new(),
    };
    Ok(text)
}

/// Escapes marker characters in statement text while preparing, so the
/// linker numbers real bind positions only.
fn escaped(renderer: &Renderer<'_>, text: String) -> String {
    if !renderer.is_preparing() || !text.contains([PLACEHOLDER, ESCAPE]) {
        return text;
    }
    let mut out = String::with_capacity(text.len() + 2);
    for ch in text.chars() {
        match ch {
            PLACEHOLDER => {
                out.push(ESCAPE);
                out.push('p');
            }
            ESCAPE => {
                out.push(ESCAPE);
                out.push('e');
            }
            _ => out.push(ch),
        }
    }
    out
}

fn value_text(renderer: &mut Renderer<'_>, value: &SqlValue, binds: &mut Vec<SqlValue>) -> String {
    if renderer.is_preparing() {
        renderer.inc_bind_count();
        binds.push(value.clone());
        String::from(PLACEHOLDER)
    } else {
        renderer.dialect().literal(value)
    }
}

fn condition_text(
    renderer: &mut Renderer<'_>,
    condition: &Condition,
    binds: &mut Vec<SqlValue>,
) -> Result<String> {
    let dialect = renderer.dialect();
    let text = match condition {
        Condition::Compare { column, op, value } => {
            let column = escaped(renderer, column.clone());
            format!("{column} {} {}", op.as_sql(), value_text(renderer, value, binds))
        }
        Condition::In { column, values } => {
            let column = escaped(renderer, column.clone());
            let items: Vec<String> = values
                .iter()
                .map(|value| value_text(renderer, value, binds))
                .collect();
            format!("{column} IN ({})", items.join(", "))
        }
        Condition::Between { column, low, high } => {
            let column = escaped(renderer, column.clone());
            let low = value_text(renderer, low, binds);
            let high = value_text(renderer, high, binds);
            format!("{column} BETWEEN {low} {} {high}", dialect.keyword(TokenKind::And))
        }
        Condition::Null { column, negated } => {
            let column = escaped(renderer, column.clone());
            if *negated {
                format!("{column} IS NOT NULL")
            } else {
                format!("{column} IS NULL")
            }
        }
        Condition::And(left, right) => {
            let left = operand(renderer, left, binds)?;
            let right = operand(renderer, right, binds)?;
            format!("({left} {} {right})", dialect.keyword(TokenKind::And))
        }
        Condition::Or(left, right) => {
            let left = operand(renderer, left, binds)?;
            let right = operand(renderer, right, binds)?;
            format!("({left} {} {right})", dialect.keyword(TokenKind::Or))
        }
        Condition::Not(inner) => format!("NOT ({})", operand(renderer, inner, binds)?),
        Condition::Raw(sql) => escaped(renderer, sql.clone()),
    };
    Ok(text)
}

/// Compiles a compound operand in its own nested build context.
fn operand(
    renderer: &mut Renderer<'_>,
    condition: &Condition,
    binds: &mut Vec<SqlValue>,
) -> Result<String> {
    let (text, nested_binds) = renderer.nested(vec![Token::Condition(condition.clone())])?;
    binds.extend(nested_binds);
    Ok(text)
}
