//! Query language parser.
//!
//! Built with chumsky combinators over raw characters. Keywords are
//! case-insensitive and reserved; word operators (`AND`, `OR`, `NOT`,
//! `IN`) must be whitespace-separated from their operands. Comparison
//! operators do not chain: `1 < x < 10` is a syntax error, write
//! `1 < x AND x < 10`.
//!
//! Operator precedence, tightest first: unary `-`, then `*` `/`, then
//! `+` `-`, then comparisons, then `NOT`, then `AND`, then `OR`.

use chumsky::prelude::*;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::ast::{
    BalancesQuery, BinaryOperator, CloseClause, Expr, FromClause, JournalQuery, Literal,
    OrderSpec, PrintQuery, Query, SelectQuery, SortDirection, Target, UnaryOperator,
};
use crate::error::{ParseError, ParseErrorKind};

type ParserInput<'a> = &'a str;
type ParserExtra<'a> = extra::Err<Rich<'a, char>>;

/// Words that cannot be used as column or function names.
const RESERVED: &[&str] = &[
    "SELECT", "DISTINCT", "FROM", "WHERE", "GROUP", "BY", "HAVING", "ORDER", "ASC", "DESC",
    "LIMIT", "AS", "AND", "OR", "NOT", "IN", "OPEN", "CLOSE", "CLEAR", "ON", "AT", "TRUE",
    "FALSE", "NULL", "PRINT", "BALANCES", "JOURNAL",
];

/// Parse a query statement.
///
/// # Errors
///
/// Returns a [`ParseError`] with the source span of the first problem.
pub fn parse(source: &str) -> Result<Query, ParseError> {
    let (output, errors) = query_parser()
        .then_ignore(ws())
        .then_ignore(end())
        .parse(source)
        .into_output_errors();

    if let Some(query) = output {
        return Ok(query);
    }

    Err(errors.into_iter().next().map_or_else(
        || ParseError::new(ParseErrorKind::UnexpectedEof, (source.len(), source.len())),
        |e| {
            let span = (e.span().start, e.span().end);
            let message = e.to_string();
            let trimmed = source.trim_end().len();
            // A keyword mismatch reported against the final word of the
            // input means the statement was cut short, not that the
            // word itself is wrong. Other custom errors (bad dates,
            // reserved identifiers) keep their message even at the end.
            let truncated = e.found().is_none()
                && (span.0 >= trimmed
                    || (span.1 >= trimmed && message.starts_with("expected ")));
            if truncated {
                ParseError::new(ParseErrorKind::UnexpectedEof, span)
            } else {
                ParseError::new(ParseErrorKind::SyntaxError(message), span)
            }
        },
    ))
}

fn query_parser<'a>() -> impl Parser<'a, ParserInput<'a>, Query, ParserExtra<'a>> + Clone {
    ws().ignore_then(choice((
        select_query().map(Query::Select),
        print_query().map(Query::Print),
        balances_query().map(Query::Balances),
        journal_query().map(Query::Journal),
    )))
    .then_ignore(ws().then(just(';')).or_not())
}

// ==================== whitespace and atoms ====================

fn ws<'a>() -> impl Parser<'a, ParserInput<'a>, (), ParserExtra<'a>> + Clone {
    one_of(" \t\r\n").repeated().ignored()
}

fn ws1<'a>() -> impl Parser<'a, ParserInput<'a>, (), ParserExtra<'a>> + Clone {
    one_of(" \t\r\n").repeated().at_least(1).ignored()
}

/// Match one keyword, case-insensitively, at an identifier boundary.
fn kw<'a>(keyword: &'static str) -> impl Parser<'a, ParserInput<'a>, (), ParserExtra<'a>> + Clone {
    text::ident().try_map(move |s: &str, span| {
        if s.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(Rich::custom(span, format!("expected {keyword}")))
        }
    })
}

/// A column or function name. Reserved words are rejected so that
/// clause boundaries stay unambiguous.
fn identifier<'a>() -> impl Parser<'a, ParserInput<'a>, String, ParserExtra<'a>> + Clone {
    text::ident().try_map(|s: &str, span| {
        if RESERVED.iter().any(|r| s.eq_ignore_ascii_case(r)) {
            Err(Rich::custom(
                span,
                format!("'{s}' is a reserved word, not an identifier"),
            ))
        } else {
            Ok(s.to_string())
        }
    })
}

fn digits<'a>() -> impl Parser<'a, ParserInput<'a>, &'a str, ParserExtra<'a>> + Clone {
    one_of("0123456789").repeated().at_least(1).to_slice()
}

fn quoted_string<'a>() -> impl Parser<'a, ParserInput<'a>, String, ParserExtra<'a>> + Clone {
    let double = just('"')
        .ignore_then(
            none_of("\"\\")
                .or(just('\\').ignore_then(any()))
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just('"'));
    let single = just('\'')
        .ignore_then(
            none_of("'\\")
                .or(just('\\').ignore_then(any()))
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just('\''));
    double.or(single)
}

fn date_literal<'a>() -> impl Parser<'a, ParserInput<'a>, NaiveDate, ParserExtra<'a>> + Clone {
    digits()
        .then_ignore(just('-'))
        .then(digits())
        .then_ignore(just('-'))
        .then(digits())
        .try_map(|((y, m), d): ((&str, &str), &str), span| {
            let year: i32 = y
                .parse()
                .map_err(|_| Rich::custom(span, format!("invalid year '{y}'")))?;
            let month: u32 = m
                .parse()
                .map_err(|_| Rich::custom(span, format!("invalid month '{m}'")))?;
            let day: u32 = d
                .parse()
                .map_err(|_| Rich::custom(span, format!("invalid day '{d}'")))?;
            NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| Rich::custom(span, format!("invalid date {year}-{month}-{day}")))
        })
}

/// A signed decimal or integer literal. A fractional part makes it a
/// decimal; otherwise it is an integer.
fn number_literal<'a>() -> impl Parser<'a, ParserInput<'a>, Literal, ParserExtra<'a>> + Clone {
    just('-')
        .or_not()
        .then(digits())
        .then(just('.').ignore_then(digits()).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            if s.contains('.') {
                s.parse::<Decimal>()
                    .map(Literal::Number)
                    .map_err(|_| Rich::custom(span, format!("invalid number '{s}'")))
            } else {
                s.parse::<i64>()
                    .map(Literal::Integer)
                    .map_err(|_| Rich::custom(span, format!("integer '{s}' out of range")))
            }
        })
}

fn literal<'a>() -> impl Parser<'a, ParserInput<'a>, Literal, ParserExtra<'a>> + Clone {
    choice((
        quoted_string().map(Literal::String),
        date_literal().map(Literal::Date),
        number_literal(),
        kw("TRUE").to(Literal::Boolean(true)),
        kw("FALSE").to(Literal::Boolean(false)),
        kw("NULL").to(Literal::Null),
    ))
}

// ==================== expressions ====================

fn expression<'a>() -> impl Parser<'a, ParserInput<'a>, Expr, ParserExtra<'a>> + Clone {
    recursive(|expr| {
        // Function names may be reserved words (`distinct(payee)`); the
        // parenthesized call shape keeps clause keywords unambiguous.
        let call = text::ident()
            .map(|s: &str| s.to_string())
            .then_ignore(ws())
            .then_ignore(just('('))
            .then_ignore(ws())
            .then(
                expr.clone()
                    .separated_by(ws().then(just(',')).then(ws()))
                    .collect::<Vec<_>>(),
            )
            .then_ignore(ws())
            .then_ignore(just(')'))
            .map(|(name, args)| Expr::function(name, args));

        let primary = choice((
            just('*').to(Expr::Wildcard),
            expr.delimited_by(just('(').then(ws()), ws().then(just(')')))
                .map(|e| Expr::Paren(Box::new(e))),
            literal().map(Expr::Literal),
            call,
            identifier().map(Expr::Column),
        ));

        // A leading '-' binds to the literal when directly adjacent, so
        // `-5` stays a literal and `- 5` or `-(...)` become a negation.
        let unary = choice((
            primary.clone(),
            just('-')
                .ignore_then(ws())
                .ignore_then(primary)
                .map(|e| Expr::unary(UnaryOperator::Neg, e)),
        ));

        let multiplicative = unary.clone().foldl(
            ws().ignore_then(one_of("*/"))
                .then_ignore(ws())
                .then(unary)
                .repeated(),
            |left, (op, right)| {
                let op = if op == '*' {
                    BinaryOperator::Mul
                } else {
                    BinaryOperator::Div
                };
                Expr::binary(op, left, right)
            },
        );

        let additive = multiplicative.clone().foldl(
            ws().ignore_then(one_of("+-"))
                .then_ignore(ws())
                .then(multiplicative)
                .repeated(),
            |left, (op, right)| {
                let op = if op == '+' {
                    BinaryOperator::Add
                } else {
                    BinaryOperator::Sub
                };
                Expr::binary(op, left, right)
            },
        );

        let comparison = additive
            .clone()
            .then(
                ws().ignore_then(comparison_op())
                    .then_ignore(ws())
                    .then(additive)
                    .or_not(),
            )
            .map(|(left, rest)| match rest {
                Some((op, right)) => Expr::binary(op, left, right),
                None => left,
            });

        let negation = kw("NOT")
            .then_ignore(ws1())
            .repeated()
            .collect::<Vec<_>>()
            .then(comparison)
            .map(|(nots, e)| {
                nots.into_iter()
                    .fold(e, |acc, ()| Expr::unary(UnaryOperator::Not, acc))
            });

        let conjunction = negation.clone().foldl(
            ws1()
                .ignore_then(kw("AND"))
                .ignore_then(ws1())
                .ignore_then(negation)
                .repeated(),
            |left, right| Expr::binary(BinaryOperator::And, left, right),
        );

        conjunction.clone().foldl(
            ws1()
                .ignore_then(kw("OR"))
                .ignore_then(ws1())
                .ignore_then(conjunction)
                .repeated(),
            |left, right| Expr::binary(BinaryOperator::Or, left, right),
        )
    })
}

fn comparison_op<'a>() -> impl Parser<'a, ParserInput<'a>, BinaryOperator, ParserExtra<'a>> + Clone
{
    choice((
        just("!=").to(BinaryOperator::Ne),
        just("<=").to(BinaryOperator::Le),
        just(">=").to(BinaryOperator::Ge),
        just('=').to(BinaryOperator::Eq),
        just('<').to(BinaryOperator::Lt),
        just('>').to(BinaryOperator::Gt),
        just('~').to(BinaryOperator::Regex),
        kw("IN").to(BinaryOperator::In),
    ))
}

// ==================== clauses ====================

fn target_list<'a>() -> impl Parser<'a, ParserInput<'a>, Vec<Target>, ParserExtra<'a>> + Clone {
    expression()
        .then(
            ws1()
                .ignore_then(kw("AS"))
                .ignore_then(ws1())
                .ignore_then(identifier())
                .or_not(),
        )
        .map(|(expr, alias)| Target { expr, alias })
        .separated_by(ws().then(just(',')).then(ws()))
        .at_least(1)
        .collect::<Vec<_>>()
}

/// `FROM [expr] [OPEN ON date] [CLOSE [ON date]] [CLEAR]`.
///
/// Every part is optional here; a `FROM` with nothing after it is
/// rejected during compilation, where the message can be better.
fn from_clause<'a>() -> impl Parser<'a, ParserInput<'a>, FromClause, ParserExtra<'a>> + Clone {
    kw("FROM")
        .ignore_then(ws1().ignore_then(expression()).or_not())
        .then(
            ws1()
                .ignore_then(kw("OPEN"))
                .ignore_then(ws1())
                .ignore_then(kw("ON"))
                .ignore_then(ws1())
                .ignore_then(date_literal())
                .or_not(),
        )
        .then(
            ws1()
                .ignore_then(kw("CLOSE"))
                .ignore_then(
                    ws1()
                        .ignore_then(kw("ON"))
                        .ignore_then(ws1())
                        .ignore_then(date_literal())
                        .map(CloseClause::On)
                        .or_not()
                        .map(|date| date.unwrap_or(CloseClause::Implicit)),
                )
                .or_not(),
        )
        .then(ws1().ignore_then(kw("CLEAR")).or_not())
        .map(|(((filter, open_on), close), clear)| FromClause {
            filter,
            open_on,
            close,
            clear: clear.is_some(),
        })
}

fn group_by_clause<'a>(
) -> impl Parser<'a, ParserInput<'a>, (Vec<Expr>, Option<Expr>), ParserExtra<'a>> + Clone {
    ws1()
        .ignore_then(kw("GROUP"))
        .ignore_then(ws1())
        .ignore_then(kw("BY"))
        .ignore_then(ws1())
        .ignore_then(
            expression()
                .separated_by(ws().then(just(',')).then(ws()))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then(
            ws1()
                .ignore_then(kw("HAVING"))
                .ignore_then(ws1())
                .ignore_then(expression())
                .or_not(),
        )
}

fn order_by_clause<'a>(
) -> impl Parser<'a, ParserInput<'a>, Vec<OrderSpec>, ParserExtra<'a>> + Clone {
    ws1()
        .ignore_then(kw("ORDER"))
        .ignore_then(ws1())
        .ignore_then(kw("BY"))
        .ignore_then(ws1())
        .ignore_then(
            expression()
                .then(
                    ws1()
                        .ignore_then(choice((
                            kw("ASC").to(SortDirection::Ascending),
                            kw("DESC").to(SortDirection::Descending),
                        )))
                        .or_not(),
                )
                .map(|(expr, direction)| OrderSpec {
                    expr,
                    direction: direction.unwrap_or_default(),
                })
                .separated_by(ws().then(just(',')).then(ws()))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
}

fn limit_count<'a>() -> impl Parser<'a, ParserInput<'a>, u64, ParserExtra<'a>> + Clone {
    digits().try_map(|s: &str, span| {
        s.parse::<u64>()
            .map_err(|_| Rich::custom(span, format!("limit '{s}' out of range")))
    })
}

// ==================== statements ====================

fn select_query<'a>() -> impl Parser<'a, ParserInput<'a>, SelectQuery, ParserExtra<'a>> + Clone {
    kw("SELECT")
        .ignore_then(ws1())
        .ignore_then(kw("DISTINCT").then_ignore(ws1()).or_not())
        .then(target_list())
        .then(ws1().ignore_then(from_clause()).or_not())
        .then(
            ws1()
                .ignore_then(kw("WHERE"))
                .ignore_then(ws1())
                .ignore_then(expression())
                .or_not(),
        )
        .then(group_by_clause().or_not())
        .then(order_by_clause().or_not())
        .then(
            ws1()
                .ignore_then(kw("LIMIT"))
                .ignore_then(ws1())
                .ignore_then(limit_count())
                .or_not(),
        )
        .then(ws1().ignore_then(kw("DISTINCT")).or_not())
        .map(
            |(((((((distinct, targets), from), where_clause), group), order_by), limit), trailing)| {
                let (group_by, having) = match group {
                    Some((exprs, having)) => (Some(exprs), having),
                    None => (None, None),
                };
                SelectQuery {
                    distinct: distinct.is_some() || trailing.is_some(),
                    targets,
                    from,
                    where_clause,
                    group_by,
                    having,
                    order_by,
                    limit,
                }
            },
        )
}

fn print_query<'a>() -> impl Parser<'a, ParserInput<'a>, PrintQuery, ParserExtra<'a>> + Clone {
    kw("PRINT")
        .ignore_then(ws1().ignore_then(from_clause()).or_not())
        .map(|from| PrintQuery { from })
}

fn balances_query<'a>() -> impl Parser<'a, ParserInput<'a>, BalancesQuery, ParserExtra<'a>> + Clone
{
    kw("BALANCES")
        .ignore_then(
            ws1()
                .ignore_then(kw("AT"))
                .ignore_then(ws1())
                .ignore_then(identifier())
                .or_not(),
        )
        .then(ws1().ignore_then(from_clause()).or_not())
        .map(|(at, from)| BalancesQuery { at, from })
}

fn journal_query<'a>() -> impl Parser<'a, ParserInput<'a>, JournalQuery, ParserExtra<'a>> + Clone {
    kw("JOURNAL")
        .ignore_then(ws1().ignore_then(quoted_string()).or_not())
        .then(
            ws1()
                .ignore_then(kw("AT"))
                .ignore_then(ws1())
                .ignore_then(identifier())
                .or_not(),
        )
        .then(ws1().ignore_then(from_clause()).or_not())
        .map(|((account_pattern, at), from)| JournalQuery {
            account_pattern,
            at,
            from,
        })
}
