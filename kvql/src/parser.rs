use crate::ast;
use crate::error::ParseError;
use crate::grammar::{self, KvqlParser, Rule};
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest::Parser;
use tracing::trace;

/// Print a parse tree node and its children recursively
#[cfg(test)]
fn print_tree(pair: Pair<Rule>, indent: usize) {
    if matches!(pair.as_rule(), Rule::EOI) {
        return;
    }
    println!("{:indent$}{:?}: '{}'", "", pair.as_rule(), pair.as_str().trim(), indent = indent);
    for inner in pair.into_inner() {
        print_tree(inner, indent + 2);
    }
}

/// Parse a full `SELECT`, `UPDATE` or `DELETE` statement.
pub fn parse_statement(input: &str) -> Result<ast::Statement, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::EmptyStatement);
    }
    let mut pairs = KvqlParser::parse(Rule::Statement, input)?;

    #[cfg(test)]
    for pair in pairs.clone() {
        print_tree(pair, 0);
    }

    // Statement is silent, so the first pair is the concrete statement kind
    let pair = pairs.next().ok_or(ParseError::EmptyStatement)?;
    let statement = match pair.as_rule() {
        Rule::SelectStatement => ast::Statement::Select(parse_select(pair)?),
        Rule::UpdateStatement => ast::Statement::Update(parse_update(pair)?),
        Rule::DeleteStatement => ast::Statement::Delete(parse_delete(pair)?),
        got => return Err(ParseError::UnexpectedRule { expected: "statement", got }),
    };
    trace!("parsed statement on table {}", statement.table());
    Ok(statement)
}

/// Parse a bare boolean expression, the part of a statement after `WHERE`.
pub fn parse_selection(input: &str) -> Result<ast::Predicate, ParseError> {
    let mut pairs = KvqlParser::parse(Rule::Selection, input)?;
    let expr = pairs.next().ok_or(ParseError::MissingOperand("expression"))?;
    if expr.as_rule() != Rule::Expr {
        return Err(ParseError::UnexpectedRule { expected: "Expr", got: expr.as_rule() });
    }
    parse_expr(expr)
}

fn parse_select(pair: Pair<Rule>) -> Result<ast::Select, ParseError> {
    let mut select =
        ast::Select { projection: Vec::new(), table: String::new(), selection: None, group_by: Vec::new(), order_by: Vec::new(), limit: None };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::Projection => select.projection = parse_projection(inner)?,
            Rule::Table => select.table = inner.as_str().to_string(),
            Rule::WhereClause => select.selection = Some(parse_where(inner)?),
            Rule::GroupByClause => {
                select.group_by = inner.into_inner().filter(|p| p.as_rule() == Rule::Column).map(parse_identifier).collect::<Result<_, _>>()?
            }
            Rule::OrderByClause => select.order_by = parse_order_by(inner)?,
            Rule::LimitClause => select.limit = Some(parse_limit(inner)?),
            _ => {}
        }
    }
    Ok(select)
}

fn parse_update(pair: Pair<Rule>) -> Result<ast::Update, ParseError> {
    let mut update = ast::Update { table: String::new(), assignments: Vec::new(), selection: None, order_by: Vec::new(), limit: None };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::Table => update.table = inner.as_str().to_string(),
            Rule::Assignment => {
                let mut parts = inner.into_inner();
                let column = parse_identifier(parts.next().ok_or(ParseError::MissingOperand("assignment column"))?)?;
                let value = parse_operand(parts.next().ok_or(ParseError::MissingOperand("assignment value"))?)?;
                update.assignments.push(ast::Assignment { column: column.column().to_string(), value });
            }
            Rule::WhereClause => update.selection = Some(parse_where(inner)?),
            Rule::OrderByClause => update.order_by = parse_order_by(inner)?,
            Rule::LimitClause => update.limit = Some(parse_limit(inner)?),
            _ => {}
        }
    }
    Ok(update)
}

fn parse_delete(pair: Pair<Rule>) -> Result<ast::Delete, ParseError> {
    let mut delete = ast::Delete { table: String::new(), selection: None, order_by: Vec::new(), limit: None };
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::Table => delete.table = inner.as_str().to_string(),
            Rule::WhereClause => delete.selection = Some(parse_where(inner)?),
            Rule::OrderByClause => delete.order_by = parse_order_by(inner)?,
            Rule::LimitClause => delete.limit = Some(parse_limit(inner)?),
            _ => {}
        }
    }
    Ok(delete)
}

fn parse_projection(pair: Pair<Rule>) -> Result<Vec<ast::SelectItem>, ParseError> {
    let mut items = Vec::new();
    for item in pair.into_inner() {
        let mut parts = item.into_inner();
        let head = parts.next().ok_or(ParseError::MissingOperand("select item"))?;
        let expr = match head.as_rule() {
            Rule::Star => ast::Expr::Wildcard,
            Rule::Column => ast::Expr::Identifier(parse_identifier(head)?),
            Rule::Aggregate => {
                let mut agg = head.into_inner();
                let name = agg.next().ok_or(ParseError::MissingOperand("aggregate function"))?;
                let function = ast::AggregateFunction::from_name(name.as_str())
                    .ok_or_else(|| ParseError::InvalidLiteral(format!("unknown aggregate {}", name.as_str())))?;
                let arg = agg.next().ok_or(ParseError::MissingOperand("aggregate argument"))?;
                let arg = match arg.as_rule() {
                    Rule::Star => ast::Expr::Wildcard,
                    _ => ast::Expr::Identifier(parse_identifier(arg)?),
                };
                ast::Expr::Aggregate { function, arg: Box::new(arg) }
            }
            got => return Err(ParseError::UnexpectedRule { expected: "select item", got }),
        };
        let alias = parts.find(|p| p.as_rule() == Rule::Alias).map(|p| p.as_str().to_string());
        items.push(ast::SelectItem { expr, alias });
    }
    Ok(items)
}

fn parse_where(pair: Pair<Rule>) -> Result<ast::Predicate, ParseError> {
    let expr = pair.into_inner().find(|p| p.as_rule() == Rule::Expr).ok_or(ParseError::MissingOperand("WHERE expression"))?;
    parse_expr(expr)
}

fn parse_order_by(pair: Pair<Rule>) -> Result<Vec<ast::OrderByItem>, ParseError> {
    let mut items = Vec::new();
    for item in pair.into_inner().filter(|p| p.as_rule() == Rule::OrderByItem) {
        let mut parts = item.into_inner();
        let identifier = parse_identifier(parts.next().ok_or(ParseError::MissingOperand("ORDER BY column"))?)?;
        let direction = match parts.next().map(|p| p.as_rule()) {
            Some(Rule::Desc) => ast::OrderDirection::Desc,
            _ => ast::OrderDirection::Asc,
        };
        items.push(ast::OrderByItem { identifier, direction });
    }
    Ok(items)
}

/// `LIMIT count`, `LIMIT offset, count` or `LIMIT count OFFSET offset`
fn parse_limit(pair: Pair<Rule>) -> Result<ast::Limit, ParseError> {
    let mut first = None;
    let mut second = None;
    let mut offset_keyword = false;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::Unsigned => {
                let n = inner.as_str().parse::<u64>().map_err(|e| ParseError::InvalidLiteral(format!("{}: {e}", inner.as_str())))?;
                if first.is_none() {
                    first = Some(n);
                } else {
                    second = Some(n);
                }
            }
            Rule::KwOffset => offset_keyword = true,
            _ => {}
        }
    }
    let first = first.ok_or(ParseError::MissingOperand("LIMIT count"))?;
    Ok(match second {
        None => ast::Limit { offset: 0, count: first },
        Some(second) if offset_keyword => ast::Limit { offset: second, count: first },
        Some(second) => ast::Limit { offset: first, count: second },
    })
}

fn pratt() -> PrattParser<Rule> {
    PrattParser::new()
        .op(Op::infix(Rule::Or, Assoc::Left))
        .op(Op::infix(Rule::Xor, Assoc::Left))
        .op(Op::infix(Rule::And, Assoc::Left))
        .op(Op::prefix(Rule::Not))
}

/// Parse a boolean expression. Precedence from loosest to tightest is OR, XOR, AND, NOT.
fn parse_expr(pair: Pair<Rule>) -> Result<ast::Predicate, ParseError> {
    debug_assert_eq!(pair.as_rule(), Rule::Expr);
    parse_expr_pairs(pair.into_inner())
}

fn parse_expr_pairs(pairs: Pairs<Rule>) -> Result<ast::Predicate, ParseError> {
    pratt()
        .map_primary(parse_condition)
        .map_prefix(|_not, rhs| Ok(ast::Predicate::Not(Box::new(rhs?))))
        .map_infix(|lhs, op, rhs| {
            let (lhs, rhs) = (Box::new(lhs?), Box::new(rhs?));
            match op.as_rule() {
                Rule::And => Ok(ast::Predicate::And(lhs, rhs)),
                Rule::Or => Ok(ast::Predicate::Or(lhs, rhs)),
                Rule::Xor => Ok(ast::Predicate::Xor(lhs, rhs)),
                got => Err(ParseError::UnexpectedRule { expected: "AND, OR or XOR", got }),
            }
        })
        .parse(pairs)
}

fn parse_condition(pair: Pair<Rule>) -> Result<ast::Predicate, ParseError> {
    let rule = pair.as_rule();
    if rule == Rule::Parenthesized {
        let inner = pair.into_inner().next().ok_or(ParseError::MissingOperand("parenthesized expression"))?;
        return parse_expr(inner);
    }

    let mut negated = false;
    let mut operands = Vec::new();
    let mut operator = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::Not => negated = true,
            Rule::Eq | Rule::NotEq | Rule::Lt | Rule::LtEq | Rule::Gt | Rule::GtEq => operator = Some(comparison_operator(inner.as_rule())?),
            // keyword tokens carry no information beyond the enclosing rule
            Rule::KwBetween | Rule::KwIn | Rule::KwLike | Rule::KwIs | Rule::And => {}
            _ => operands.push(parse_operand(inner)?),
        }
    }

    let mut operands = operands.into_iter();
    let mut next = |side: &'static str| operands.next().map(Box::new).ok_or(ParseError::MissingOperand(side));
    match rule {
        Rule::Comparison => {
            let left = next("left operand")?;
            let operator = operator.ok_or(ParseError::MissingOperand("comparison operator"))?;
            let right = next("right operand")?;
            Ok(ast::Predicate::Comparison { left, operator, right })
        }
        Rule::Between => Ok(ast::Predicate::Between { expr: next("BETWEEN subject")?, low: next("BETWEEN low")?, high: next("BETWEEN high")?, negated }),
        Rule::IsNull => Ok(ast::Predicate::Is { expr: next("IS subject")?, right: next("IS operand")?, negated }),
        Rule::Like => Ok(ast::Predicate::Like { expr: next("LIKE subject")?, pattern: next("LIKE pattern")?, negated }),
        Rule::InList => {
            let expr = next("IN subject")?;
            let list = operands.collect();
            Ok(ast::Predicate::In { expr, list, negated })
        }
        got => Err(ParseError::UnexpectedRule { expected: "condition", got }),
    }
}

fn comparison_operator(rule: Rule) -> Result<ast::ComparisonOperator, ParseError> {
    match rule {
        Rule::Eq => Ok(ast::ComparisonOperator::Equal),
        Rule::NotEq => Ok(ast::ComparisonOperator::NotEqual),
        Rule::Lt => Ok(ast::ComparisonOperator::LessThan),
        Rule::LtEq => Ok(ast::ComparisonOperator::LessThanOrEqual),
        Rule::Gt => Ok(ast::ComparisonOperator::GreaterThan),
        Rule::GtEq => Ok(ast::ComparisonOperator::GreaterThanOrEqual),
        got => Err(ParseError::UnexpectedRule { expected: "comparison operator", got }),
    }
}

/// Parse a column reference or a literal
fn parse_operand(pair: Pair<Rule>) -> Result<ast::Expr, ParseError> {
    Ok(match pair.as_rule() {
        Rule::Column => ast::Expr::Identifier(parse_identifier(pair)?),
        Rule::StringLiteral => {
            let inner = pair.into_inner().next().map(|p| p.as_str()).unwrap_or_default();
            ast::Expr::Literal(ast::Literal::String(inner.replace("''", "'")))
        }
        Rule::NumberLiteral => ast::Expr::Literal(parse_number(pair.as_str())?),
        Rule::NullLiteral => ast::Expr::Literal(ast::Literal::Null),
        Rule::TrueLiteral => ast::Expr::Literal(ast::Literal::Boolean(true)),
        Rule::FalseLiteral => ast::Expr::Literal(ast::Literal::Boolean(false)),
        got => return Err(ParseError::UnexpectedRule { expected: "column or literal", got }),
    })
}

fn parse_number(text: &str) -> Result<ast::Literal, ParseError> {
    if text.contains('.') {
        text.parse::<f64>().map(ast::Literal::Float).map_err(|e| ParseError::InvalidLiteral(format!("{text}: {e}")))
    } else {
        text.parse::<i64>().map(ast::Literal::Integer).map_err(|e| ParseError::InvalidLiteral(format!("{text}: {e}")))
    }
}

fn parse_identifier(pair: Pair<Rule>) -> Result<ast::Identifier, ParseError> {
    if pair.as_rule() != grammar::Rule::Column {
        return Err(ParseError::UnexpectedRule { expected: "Column", got: pair.as_rule() });
    }
    let mut parts = pair.into_inner();
    let first = parts.next().ok_or(ParseError::MissingOperand("column name"))?.as_str().to_string();
    Ok(match parts.next() {
        Some(second) => ast::Identifier::Qualified(first, second.as_str().to_string()),
        None => ast::Identifier::Column(first),
    })
}
