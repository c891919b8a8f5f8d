//! Fragment linker: joins compiled fragments into final statement text.
//!
//! The linker owns every rewrite that needs more than one fragment:
//! list separators and parentheses, clause reordering, `TOP` placement and
//! placeholder numbering.

use super::compiler::{Fragment, ESCAPE, PLACEHOLDER};
use crate::dialect::{Dialect, LimitStyle};
use crate::token::TokenKind;
use crate::value::SqlValue;

/// Linked statement text and its bindings in placeholder order.
#[derive(Debug, Default)]
pub(crate) struct Linked {
    pub sql: String,
    pub bindings: Vec<SqlValue>,
}

/// Links fragments; numbers placeholders when `number` is set.
pub(crate) fn link(dialect: &dyn Dialect, mut fragments: Vec<Fragment>, number: bool) -> Linked {
    group_before_order(&mut fragments);
    if dialect.limit_style() == LimitStyle::Top {
        hoist_limit(&mut fragments);
    }

    let mut linked = Linked::default();
    let mut previous: Option<TokenKind> = None;
    let mut fragments = fragments.into_iter().peekable();
    while let Some(fragment) = fragments.next() {
        let kind = fragment.kind;
        if kind.is_list_item() {
            let mut items = vec![fragment.text];
            linked.bindings.extend(fragment.binds);
            while let Some(next) = fragments.next_if(|f| f.kind == kind) {
                items.push(next.text);
                linked.bindings.extend(next.binds);
            }
            let list = items.join(", ");
            match (kind, previous) {
                (TokenKind::Set, _) => {
                    linked.sql.push_str(dialect.keyword(TokenKind::Set));
                    linked.sql.push(' ');
                    linked.sql.push_str(&list);
                    linked.sql.push(' ');
                }
                (_, Some(TokenKind::CreateTable | TokenKind::Insert | TokenKind::Values)) => {
                    linked.sql.push('(');
                    linked.sql.push_str(&list);
                    linked.sql.push_str(") ");
                }
                _ => {
                    linked.sql.push_str(&list);
                    linked.sql.push(' ');
                }
            }
        } else {
            linked.sql.push_str(&fragment.text);
            linked.bindings.extend(fragment.binds);
        }
        previous = Some(kind);
    }

    if number {
        linked.sql = number_placeholders(dialect, &linked.sql);
    }
    linked
}

fn position(fragments: &[Fragment], kind: TokenKind) -> Option<usize> {
    fragments.iter().position(|f| f.kind == kind)
}

/// `GROUP BY` must precede `ORDER BY` whatever order they were added in.
fn group_before_order(fragments: &mut Vec<Fragment>) {
    if let (Some(order), Some(group)) = (
        position(fragments, TokenKind::OrderBy),
        position(fragments, TokenKind::GroupBy),
    ) {
        if group > order {
            let fragment = fragments.remove(group);
            fragments.insert(order, fragment);
        }
    }
}

/// Moves the limit right after `SELECT` (and `DISTINCT`) for `TOP n` dialects.
fn hoist_limit(fragments: &mut Vec<Fragment>) {
    let (Some(limit), Some(select)) = (
        position(fragments, TokenKind::Limit),
        position(fragments, TokenKind::Select),
    ) else {
        return;
    };
    let fragment = fragments.remove(limit);
    let mut at = select + 1;
    if fragments.get(at).is_some_and(|f| f.kind == TokenKind::Distinct) {
        at += 1;
    }
    fragments.insert(at, fragment);
}

fn number_placeholders(dialect: &dyn Dialect, sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut position = 0;
    let mut chars = sql.chars();
    while let Some(ch) = chars.next() {
        match ch {
            PLACEHOLDER => {
                position += 1;
                out.push_str(&dialect.placeholder(position));
            }
            ESCAPE => match chars.next() {
                Some('p') => out.push(PLACEHOLDER),
                Some('e') => out.push(ESCAPE),
                Some(other) => {
                    out.push(ESCAPE);
                    out.push(other);
                }
                None => out.push(ESCAPE),
            },
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{GenericDialect, MsSqlDialect, PostgresDialect};

    fn fragment(kind: TokenKind, text: &str) -> Fragment {
        Fragment {
            kind,
            text: String::from(text),
            binds: Vec::new(),
        }
    }

    #[test]
    fn test_parenthesizes_lists_after_insert_and_values() {
        let fragments = vec![
            fragment(TokenKind::Insert, "INSERT INTO t "),
            fragment(TokenKind::Column, "a"),
            fragment(TokenKind::Column, "b"),
            fragment(TokenKind::Values, "VALUES "),
            fragment(TokenKind::Value, "1"),
            fragment(TokenKind::Value, "2"),
        ];
        let linked = link(&GenericDialect::new(), fragments, false);
        assert_eq!(linked.sql, "INSERT INTO t (a, b) VALUES (1, 2) ");
    }

    #[test]
    fn test_set_list_gets_single_keyword() {
        let fragments = vec![
            fragment(TokenKind::Update, "UPDATE t "),
            fragment(TokenKind::Set, "a=1"),
            fragment(TokenKind::Set, "b=2"),
        ];
        let linked = link(&GenericDialect::new(), fragments, false);
        assert_eq!(linked.sql, "UPDATE t SET a=1, b=2 ");
    }

    #[test]
    fn test_group_by_moves_before_order_by() {
        let fragments = vec![
            fragment(TokenKind::Select, "SELECT "),
            fragment(TokenKind::Column, "a"),
            fragment(TokenKind::From, "FROM t "),
            fragment(TokenKind::OrderBy, "ORDER BY a "),
            fragment(TokenKind::GroupBy, "GROUP BY a "),
        ];
        let linked = link(&GenericDialect::new(), fragments, false);
        assert_eq!(linked.sql, "SELECT a FROM t GROUP BY a ORDER BY a ");
    }

    #[test]
    fn test_top_is_hoisted() {
        let fragments = vec![
            fragment(TokenKind::Select, "SELECT "),
            fragment(TokenKind::Distinct, "DISTINCT "),
            fragment(TokenKind::Column, "a"),
            fragment(TokenKind::From, "FROM t "),
            fragment(TokenKind::Limit, "TOP 5 "),
        ];
        let linked = link(&MsSqlDialect::new(), fragments, false);
        assert_eq!(linked.sql, "SELECT DISTINCT TOP 5 a FROM t ");
    }

    #[test]
    fn test_placeholders_numbered_in_final_order() {
        let mut first = fragment(TokenKind::Value, "\u{1a}");
        first.binds.push(SqlValue::Int(1));
        let mut second = fragment(TokenKind::Value, "\u{1a}");
        second.binds.push(SqlValue::Int(2));
        let fragments = vec![
            fragment(TokenKind::Insert, "INSERT INTO t "),
            fragment(TokenKind::Values, "VALUES "),
            first,
            second,
        ];
        let linked = link(&PostgresDialect::new(), fragments, true);
        assert_eq!(linked.sql, "INSERT INTO t VALUES ($1, $2) ");
        assert_eq!(linked.bindings, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }
}
