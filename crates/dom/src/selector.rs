//! A small CSS selector engine: type, universal, `#id`, `.class`, `[attr]`,
//! `[attr=value]`, descendant and child combinators, and selector lists.

use crate::document::{Document, NodeId};
use crate::error::DomError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{map, opt, peek, value},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded},
};

#[derive(Debug, Clone, PartialEq)]
enum SimpleSelector {
    Id(String),
    Class(String),
    Attr { name: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Compound {
    tag: Option<String>,
    filters: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

/// Compound selectors right to left, each with the combinator that links
/// it to the next one on its left.
#[derive(Debug, Clone, PartialEq)]
struct Complex {
    rightmost: Compound,
    rest: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<Complex>,
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_').parse(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), is_not("\""), char('"')),
        delimited(char('\''), is_not("'"), char('\'')),
    ))
    .parse(input)
}

fn attr_selector(input: &str) -> IResult<&str, SimpleSelector> {
    map(
        delimited(
            pair(char('['), multispace0),
            pair(
                ident,
                opt(preceded(
                    (multispace0, char('='), multispace0),
                    alt((quoted, ident)),
                )),
            ),
            pair(multispace0, char(']')),
        ),
        |(name, value): (&str, Option<&str>)| SimpleSelector::Attr {
            name: name.to_ascii_lowercase(),
            value: value.map(str::to_string),
        },
    )
    .parse(input)
}

fn simple(input: &str) -> IResult<&str, SimpleSelector> {
    alt((
        map(preceded(char('#'), ident), |s| SimpleSelector::Id(s.to_string())),
        map(preceded(char('.'), ident), |s| SimpleSelector::Class(s.to_string())),
        attr_selector,
    ))
    .parse(input)
}

fn type_selector(input: &str) -> IResult<&str, Option<String>> {
    alt((
        value(None, char('*')),
        map(ident, |s: &str| Some(s.to_ascii_lowercase())),
    ))
    .parse(input)
}

fn compound(input: &str) -> IResult<&str, Compound> {
    let (rest, tag) = opt(type_selector).parse(input)?;
    let (rest, filters) = many0(simple).parse(rest)?;
    if tag.is_none() && filters.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((
        rest,
        Compound {
            tag: tag.flatten(),
            filters,
        },
    ))
}

fn compound_start(input: &str) -> IResult<&str, char> {
    peek(nom::character::complete::satisfy(|c: char| {
        c.is_alphanumeric() || matches!(c, '*' | '#' | '.' | '[' | '-' | '_')
    }))
    .parse(input)
}

fn combinator(input: &str) -> IResult<&str, Combinator> {
    alt((
        value(Combinator::Child, (multispace0, char('>'), multispace0)),
        value(Combinator::Descendant, pair(multispace1, compound_start)),
    ))
    .parse(input)
}

fn complex(input: &str) -> IResult<&str, Complex> {
    map(
        pair(compound, many0(pair(combinator, compound))),
        |(first, chain): (Compound, Vec<(Combinator, Compound)>)| {
            // Re-link right to left: each compound keeps the combinator
            // that separates it from its right neighbour.
            let mut compounds = vec![first];
            let mut combinators = Vec::new();
            for (comb, c) in chain {
                combinators.push(comb);
                compounds.push(c);
            }
            let rightmost = compounds.pop().unwrap_or_default();
            let rest = combinators
                .into_iter()
                .rev()
                .zip(compounds.into_iter().rev())
                .collect();
            Complex { rightmost, rest }
        },
    )
    .parse(input)
}

fn selector_list(input: &str) -> IResult<&str, Vec<Complex>> {
    delimited(
        multispace0,
        separated_list1((multispace0, tag(","), multispace0), complex),
        multispace0,
    )
    .parse(input)
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        match selector_list(selector) {
            Ok(("", selectors)) => Ok(Self { selectors }),
            Ok((rest, _)) => Err(DomError::InvalidSelector {
                selector: selector.to_string(),
                reason: format!("unexpected input at '{rest}'"),
            }),
            Err(e) => Err(DomError::InvalidSelector {
                selector: selector.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.selectors.iter().any(|c| matches_complex(doc, node, c))
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    if let Some(tag) = &compound.tag
        && &element.tag != tag
    {
        return false;
    }
    compound.filters.iter().all(|f| match f {
        SimpleSelector::Id(id) => doc.attr(node, "id") == Some(id.as_str()),
        SimpleSelector::Class(class) => doc.has_class(node, class),
        SimpleSelector::Attr { name, value } => match (doc.attr(node, name), value) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        },
    })
}

fn matches_complex(doc: &Document, node: NodeId, complex: &Complex) -> bool {
    matches_compound(doc, node, &complex.rightmost) && matches_chain(doc, node, &complex.rest)
}

fn matches_chain(doc: &Document, node: NodeId, chain: &[(Combinator, Compound)]) -> bool {
    let Some(((comb, compound), rest)) = chain.split_first() else {
        return true;
    };
    match comb {
        Combinator::Child => doc
            .parent(node)
            .is_some_and(|p| matches_compound(doc, p, compound) && matches_chain(doc, p, rest)),
        Combinator::Descendant => doc
            .ancestors(node)
            .any(|a| matches_compound(doc, a, compound) && matches_chain(doc, a, rest)),
    }
}
