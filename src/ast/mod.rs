//! AST construction from completed Earley items.
//!
//! Builds the tree in a single left-to-right pass over the token positions, per the
//! component design: at each position, close finished nodes, then open the completed items
//! starting there, keeping only `important` alternatives as real nodes and hoisting the
//! single child of everything else.
use crate::earley::{EarleyItem, ParseError, ParseResult, StateSets};
use crate::grammar::{NonTerminal, GRAMMAR};
use crate::lexer::Token;

/// One AST node: a completed grammar alternative (tagged with the non-terminal and the
/// alternative index that produced it, which is what [`crate::bytecode::translators`] keys
/// off of) or a single leaf token.
#[derive(Debug, Clone)]
pub enum AstNode<'src> {
    Node {
        rule: NonTerminal,
        alt_index: usize,
        children: Vec<AstNode<'src>>,
    },
    Leaf(Token<'src>),
}

impl<'src> AstNode<'src> {
    pub fn as_leaf(&self) -> Option<Token<'src>> {
        match self {
            AstNode::Leaf(token) => Some(*token),
            AstNode::Node { .. } => None,
        }
    }

    /// Returns the children that are themselves nodes (leaves other than the one this
    /// method is called on are still reachable positionally, but most translators only care
    /// about the structural children).
    pub fn node_children(&self) -> &[AstNode<'src>] {
        match self {
            AstNode::Node { children, .. } => children,
            AstNode::Leaf(_) => &[],
        }
    }
}

/// A completed item discovered during recognition, carrying the span it covers. Used only
/// as the builder's internal open/close bookkeeping unit.
#[derive(Clone, Copy)]
struct Completed {
    item: EarleyItem,
    end: usize,
}

/// Collects every completed item in every state set, keyed by the origin position they
/// start at, so the builder can ask "what completes starting here" while scanning
/// left-to-right.
fn completed_by_origin(sets: &StateSets) -> Vec<Vec<Completed>> {
    let set_count = sets.sets.len();
    let mut by_origin: Vec<Vec<Completed>> = (0..set_count).map(|_| Vec::new()).collect();
    for (end, set) in sets.sets.iter().enumerate() {
        for item in set {
            if item.dot == GRAMMAR.alternatives(item.rule)[item.alt_index].symbols.len() {
                by_origin[item.origin].push(Completed { item: *item, end });
            }
        }
    }
    by_origin
}

struct Builder<'src> {
    by_origin: Vec<Vec<Completed>>,
    /// Open node frames, each paired with the end position it is waiting to close at.
    stack: Vec<(AstNode<'src>, usize)>,
}

impl<'src> Builder<'src> {
    fn close_finished(&mut self, position: usize) {
        while let Some(&(_, end)) = self.stack.last() {
            if end <= position {
                let (node, _) = self.stack.pop().unwrap();
                self.attach(node);
            } else {
                break;
            }
        }
    }

    fn attach(&mut self, node: AstNode<'src>) {
        match self.stack.last_mut() {
            Some((AstNode::Node { children, .. }, _)) => children.push(node),
            _ => self.stack.push((node, usize::MAX)),
        }
    }

    fn open_at(&mut self, position: usize) {
        let mut candidates = self.by_origin[position].clone();
        // Greater end first so wider items end up outer; equal-end ties keep discovery
        // order, which is stable because `Vec` preserves insertion order.
        candidates.sort_by(|a, b| b.end.cmp(&a.end));

        for completed in candidates {
            let alt = &GRAMMAR.alternatives(completed.item.rule)[completed.item.alt_index];

            if let Some(&(_, top_end)) = self.stack.last() {
                if top_end < completed.end {
                    // hoist: replace the current top with its sole child before going wider
                    if let Some((AstNode::Node { mut children, .. }, _)) = self.stack.pop() {
                        if children.len() == 1 {
                            self.attach(children.remove(0));
                        } else {
                            // Not a true single-child pass-through; put it back unchanged.
                            self.stack.push((
                                AstNode::Node {
                                    rule: completed.item.rule,
                                    alt_index: completed.item.alt_index,
                                    children,
                                },
                                top_end,
                            ));
                        }
                    }
                }
            }

            if alt.important {
                self.stack.push((
                    AstNode::Node {
                        rule: completed.item.rule,
                        alt_index: completed.item.alt_index,
                        children: Vec::new(),
                    },
                    completed.end,
                ));
            }
            // Unimportant alternatives are never opened as their own frame; their tokens
            // and nested important nodes attach directly to whatever is currently open,
            // which is exactly the hoisting behavior the spec calls for.
        }
    }
}

/// Builds the AST for an accepted token stream. `sets` must be the result of
/// [`crate::earley::recognize`] on the same `tokens`.
pub fn build(tokens: &[Token<'_>], sets: &StateSets) -> ParseResult<AstNode<'_>> {
    let by_origin = completed_by_origin(sets);
    let mut builder = Builder { by_origin, stack: Vec::new() };

    for position in 0..=tokens.len() {
        builder.close_finished(position);
        builder.open_at(position);
        if let Some(token) = tokens.get(position) {
            builder.attach(AstNode::Leaf(*token));
        }
    }
    builder.close_finished(tokens.len());

    match builder.stack.pop() {
        Some((root, _)) if builder.stack.is_empty() => Ok(root),
        _ => Err(ParseError::InvalidInput { position: tokens.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earley::recognize;
    use crate::grammar::NonTerminal;
    use crate::lexer::lex;

    #[test]
    fn builds_a_node_for_a_var_decl() {
        let tokens = lex("let x = 1;").unwrap();
        let sets = recognize(&tokens).unwrap();
        let ast = build(&tokens, &sets).unwrap();
        let found = contains_rule(&ast, NonTerminal::VarDecl);
        assert!(found);
    }

    fn contains_rule(node: &AstNode<'_>, rule: NonTerminal) -> bool {
        match node {
            AstNode::Node { rule: r, children, .. } => {
                *r == rule || children.iter().any(|c| contains_rule(c, rule))
            }
            AstNode::Leaf(_) => false,
        }
    }
}
