//! Per-alternative translation: walks the AST and emits [`super::ByteCodeItem`]s and
//! position requests/replies into a [`CommandBuffer`].
//!
//! Unlike the command buffer's own `task` mechanism (exercised directly in
//! `command_buffer`'s tests), these translators call each other through Rust's own call
//! stack rather than deferring every step through a boxed closure: recursion already gives
//! the same "newly produced commands are emitted before their siblings" ordering the
//! deferred-task design exists to provide, and is the idiomatic way to walk a tree in Rust.
//! The buffer's position-index request/reply scheme is still used in full, since forward
//! jump targets genuinely are not known until later in the walk.
use crate::ast::AstNode;
use crate::grammar::NonTerminal;
use crate::lexer::{Token, TokenKind};

use super::command_buffer::{CommandBuffer, TranslationError, TranslationResult};
use super::{ByteCodeItem, OpCode};

pub fn translate_program<'src>(root: &AstNode<'src>) -> TranslationResult<Vec<ByteCodeItem<'src>>> {
    let mut buf = CommandBuffer::new();
    translate_node(&mut buf, root)?;
    buf.generate()
}

fn nodes_of<'a, 'src>(children: &'a [AstNode<'src>]) -> impl Iterator<Item = &'a AstNode<'src>> {
    children.iter().filter(|c| matches!(c, AstNode::Node { .. }))
}

fn find_leaf<'src>(children: &[AstNode<'src>], kind: TokenKind) -> Option<Token<'src>> {
    children.iter().find_map(|c| match c {
        AstNode::Leaf(token) if token.kind == kind => Some(*token),
        _ => None,
    })
}

fn emit_defblock(buf: &mut CommandBuffer<'_>) {
    buf.push(ByteCodeItem::Op(OpCode::DefBlock));
    buf.enter_block();
}

fn emit_delblock(buf: &mut CommandBuffer<'_>) {
    buf.push(ByteCodeItem::Op(OpCode::DelBlock));
    buf.leave_block();
}

/// Flattens a left-recursive `X -> Y Xtail | ε` pair (`ArgList`/`ArgListTail` or
/// `ParamList`/`ParamListTail`) into an ordered `Vec` of the `Y` nodes. Both pairs share the
/// same cons/nil shape (alt 0 = cons, alt 1 = nil), so one function handles either.
fn flatten_cons_list<'a, 'src>(node: &'a AstNode<'src>) -> Vec<&'a AstNode<'src>> {
    match node {
        AstNode::Node { alt_index: 0, children, .. } => {
            let mut it = nodes_of(children);
            let mut items = Vec::new();
            if let Some(head) = it.next() {
                items.push(head);
            }
            if let Some(tail) = it.next() {
                items.extend(flatten_cons_list(tail));
            }
            items
        }
        _ => Vec::new(),
    }
}

fn param_info<'src>(node: &AstNode<'src>) -> TranslationResult<(bool, &'src str)> {
    let AstNode::Node { alt_index, children, .. } = node else {
        return Err(TranslationError::MalformedNode("expected a parameter node"));
    };
    let name = find_leaf(children, TokenKind::Identifier)
        .ok_or(TranslationError::MalformedNode("parameter missing a name"))?;
    Ok((*alt_index == 0, name.lexeme))
}

/// Extracts a `Block`'s inner `StmtList` node, so callers that want to share a single pair
/// of `DEFBLOCK`/`DELBLOCK` with something else (function declarations) can translate the
/// statements without `Block`'s own default translator adding a second, nested pair.
fn block_stmt_list<'a, 'src>(block: &'a AstNode<'src>) -> TranslationResult<&'a AstNode<'src>> {
    nodes_of_node(block)
        .next()
        .ok_or(TranslationError::MalformedNode("block missing its statement list"))
}

fn nodes_of_node<'a, 'src>(node: &'a AstNode<'src>) -> impl Iterator<Item = &'a AstNode<'src>> {
    match node {
        AstNode::Node { children, .. } => nodes_of(children),
        AstNode::Leaf(_) => nodes_of(&[]),
    }
}

fn translate_node<'src>(buf: &mut CommandBuffer<'src>, node: &AstNode<'src>) -> TranslationResult<()> {
    let (rule, alt_index, children) = match node {
        AstNode::Node { rule, alt_index, children } => (*rule, *alt_index, children),
        AstNode::Leaf(_) => return Ok(()),
    };

    match rule {
        NonTerminal::StmtListTop | NonTerminal::StmtList | NonTerminal::Cond => {
            translate_children(buf, children)
        }
        NonTerminal::Stmt => translate_var_decl_stmt(buf, children),
        NonTerminal::FuncDecl => translate_func_decl(buf, children),
        NonTerminal::VarDecl => translate_var_decl(buf, alt_index, children),
        NonTerminal::ForLoop => translate_for_loop(buf, children),
        NonTerminal::DoWhileLoop => translate_do_while(buf, children),
        NonTerminal::WhileLoop => translate_while(buf, children),
        NonTerminal::IfStmt => translate_if(buf, children),
        NonTerminal::IfElseStmt => translate_if_else(buf, children),
        NonTerminal::ReturnStmt => translate_return(buf, alt_index, children),
        NonTerminal::BreakStmt => translate_break(buf),
        NonTerminal::ContinueStmt => translate_continue(buf),
        NonTerminal::ExprStmt => translate_expr_stmt(buf, children),
        NonTerminal::Block => translate_block(buf, children),
        NonTerminal::Assignment => translate_assignment(buf, children),
        NonTerminal::LogicalOr => translate_binary(buf, children, OpCode::Or),
        NonTerminal::LogicalAnd => translate_binary(buf, children, OpCode::And),
        NonTerminal::Equality => {
            translate_binary(buf, children, if alt_index == 0 { OpCode::Eq } else { OpCode::Neq })
        }
        NonTerminal::Relational => translate_binary(
            buf,
            children,
            match alt_index {
                0 => OpCode::Lt,
                1 => OpCode::Le,
                2 => OpCode::Gt,
                _ => OpCode::Ge,
            },
        ),
        NonTerminal::Additive => {
            translate_binary(buf, children, if alt_index == 0 { OpCode::Add } else { OpCode::Sub })
        }
        NonTerminal::Multiplicative => {
            translate_binary(buf, children, if alt_index == 0 { OpCode::Mul } else { OpCode::Div })
        }
        NonTerminal::Unary => translate_unary(buf, alt_index, children),
        NonTerminal::Postfix => translate_postfix(buf, alt_index, children),
        NonTerminal::Primary => translate_primary(buf, alt_index, children),
        _ => Err(TranslationError::MalformedNode("this non-terminal has no translator")),
    }
}

fn translate_children<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    for child in nodes_of(children) {
        translate_node(buf, child)?;
    }
    Ok(())
}

fn translate_block<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    emit_defblock(buf);
    translate_children(buf, children)?;
    emit_delblock(buf);
    Ok(())
}

fn translate_var_decl_stmt<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    // The only alternative of `Stmt` that is ever its own node is `VarDecl ";"`; everything
    // else is an unimportant pass-through hoisted away before reaching `translate_node`.
    translate_children(buf, children)
}

fn translate_var_decl<'src>(buf: &mut CommandBuffer<'src>, alt_index: usize, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let name = find_leaf(children, TokenKind::Identifier)
        .ok_or(TranslationError::MalformedNode("variable declaration missing a name"))?;
    let has_ref = matches!(alt_index, 0 | 1);
    let has_initializer = matches!(alt_index, 0 | 2);

    buf.push(ByteCodeItem::Ident(name.lexeme));
    buf.push(ByteCodeItem::Op(OpCode::DeclVar));

    if has_initializer {
        buf.push(ByteCodeItem::Ident(name.lexeme));
        let expr = nodes_of(children)
            .next()
            .ok_or(TranslationError::MalformedNode("variable declaration missing its initializer"))?;
        translate_node(buf, expr)?;
        buf.push(ByteCodeItem::Op(if has_ref { OpCode::AssignRef } else { OpCode::Assign }));
    }
    Ok(())
}

fn translate_func_decl<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let name = find_leaf(children, TokenKind::Identifier)
        .ok_or(TranslationError::MalformedNode("function declaration missing a name"))?;
    let mut nodes = nodes_of(children);
    let param_list = nodes.next().ok_or(TranslationError::MalformedNode("function declaration missing its parameter list"))?;
    let body_block = nodes.next().ok_or(TranslationError::MalformedNode("function declaration missing its body"))?;

    let start_ix = buf.create_position_index();
    let end_ix = buf.create_position_index();

    buf.push(ByteCodeItem::Ident(name.lexeme));
    buf.request_position(start_ix);
    buf.push(ByteCodeItem::Op(OpCode::DeclFun));
    buf.request_position(end_ix);
    buf.push(ByteCodeItem::Op(OpCode::Jmp));

    buf.reply_position(start_ix);
    emit_defblock(buf);

    for param in flatten_cons_list(param_list) {
        let (is_ref, param_name) = param_info(param)?;
        buf.push(ByteCodeItem::Ident(param_name));
        buf.push(ByteCodeItem::Op(OpCode::DeclVar));
        buf.push(ByteCodeItem::Ident(param_name));
        buf.push(ByteCodeItem::Op(OpCode::PopArg));
        buf.push(ByteCodeItem::Op(if is_ref { OpCode::AssignRef } else { OpCode::Assign }));
    }

    let stmt_list = block_stmt_list(body_block)?;
    translate_node(buf, stmt_list)?;

    emit_delblock(buf);
    buf.push(ByteCodeItem::Op(OpCode::Ret));
    buf.reply_position(end_ix);
    Ok(())
}

fn translate_if<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let mut nodes = nodes_of(children);
    let cond = nodes.next().ok_or(TranslationError::MalformedNode("`if` missing its condition"))?;
    let body = nodes.next().ok_or(TranslationError::MalformedNode("`if` missing its body"))?;

    let true_ix = buf.create_position_index();
    let false_ix = buf.create_position_index();

    translate_node(buf, cond)?;
    buf.request_position(true_ix);
    buf.request_position(false_ix);
    buf.push(ByteCodeItem::Op(OpCode::If));

    buf.reply_position(true_ix);
    translate_node(buf, body)?;
    buf.reply_position(false_ix);
    Ok(())
}

fn translate_if_else<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let mut nodes = nodes_of(children);
    let cond = nodes.next().ok_or(TranslationError::MalformedNode("`if` missing its condition"))?;
    let then_body = nodes.next().ok_or(TranslationError::MalformedNode("`if` missing its then-branch"))?;
    let else_body = nodes.next().ok_or(TranslationError::MalformedNode("`if` missing its else-branch"))?;

    let true_ix = buf.create_position_index();
    let false_ix = buf.create_position_index();
    let end_ix = buf.create_position_index();

    translate_node(buf, cond)?;
    buf.request_position(true_ix);
    buf.request_position(false_ix);
    buf.push(ByteCodeItem::Op(OpCode::If));

    buf.reply_position(true_ix);
    translate_node(buf, then_body)?;
    buf.request_position(end_ix);
    buf.push(ByteCodeItem::Op(OpCode::Jmp));

    buf.reply_position(false_ix);
    translate_node(buf, else_body)?;
    buf.reply_position(end_ix);
    Ok(())
}

fn translate_while<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let mut nodes = nodes_of(children);
    let cond = nodes.next().ok_or(TranslationError::MalformedNode("`while` missing its condition"))?;
    let body = nodes.next().ok_or(TranslationError::MalformedNode("`while` missing its body"))?;

    let start_ix = buf.create_position_index();
    let body_ix = buf.create_position_index();
    let end_ix = buf.create_position_index();

    buf.push_loop_bounds(start_ix, end_ix);
    buf.reply_position(start_ix);
    translate_node(buf, cond)?;
    buf.request_position(body_ix);
    buf.request_position(end_ix);
    buf.push(ByteCodeItem::Op(OpCode::If));

    buf.reply_position(body_ix);
    translate_node(buf, body)?;
    buf.request_position(start_ix);
    buf.push(ByteCodeItem::Op(OpCode::Jmp));
    buf.reply_position(end_ix);
    buf.pop_loop_bounds();
    Ok(())
}

fn translate_do_while<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let mut nodes = nodes_of(children);
    let body = nodes.next().ok_or(TranslationError::MalformedNode("`do` missing its body"))?;
    let cond = nodes.next().ok_or(TranslationError::MalformedNode("`do..while` missing its condition"))?;

    let body_ix = buf.create_position_index();
    let end_ix = buf.create_position_index();

    buf.push_loop_bounds(body_ix, end_ix);
    buf.reply_position(body_ix);
    translate_node(buf, body)?;
    translate_node(buf, cond)?;
    buf.request_position(body_ix);
    buf.request_position(end_ix);
    buf.push(ByteCodeItem::Op(OpCode::If));
    buf.reply_position(end_ix);
    buf.pop_loop_bounds();
    Ok(())
}

fn translate_for_loop<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let mut nodes = nodes_of(children);
    let init = nodes.next().ok_or(TranslationError::MalformedNode("`for` missing its init slot"))?;
    let cond = nodes.next().ok_or(TranslationError::MalformedNode("`for` missing its condition"))?;
    let step = nodes.next().ok_or(TranslationError::MalformedNode("`for` missing its step slot"))?;
    let body = nodes.next().ok_or(TranslationError::MalformedNode("`for` missing its body"))?;

    emit_defblock(buf);
    translate_node(buf, init)?;

    let start_ix = buf.create_position_index();
    let body_ix = buf.create_position_index();
    let end_ix = buf.create_position_index();

    buf.push_loop_bounds(start_ix, end_ix);
    buf.reply_position(start_ix);
    translate_node(buf, cond)?;
    buf.request_position(body_ix);
    buf.request_position(end_ix);
    buf.push(ByteCodeItem::Op(OpCode::If));

    buf.reply_position(body_ix);
    translate_node(buf, body)?;
    translate_node(buf, step)?;
    buf.request_position(start_ix);
    buf.push(ByteCodeItem::Op(OpCode::Jmp));
    buf.reply_position(end_ix);
    buf.pop_loop_bounds();

    emit_delblock(buf);
    Ok(())
}

fn unwind_to_loop_depth(buf: &mut CommandBuffer<'_>) -> TranslationResult<()> {
    let loop_depth = buf.loop_scope_depth()?;
    let current = buf.scope_depth();
    for _ in loop_depth..current {
        buf.push(ByteCodeItem::Op(OpCode::DelBlock));
    }
    Ok(())
}

fn translate_break(buf: &mut CommandBuffer<'_>) -> TranslationResult<()> {
    unwind_to_loop_depth(buf)?;
    let end_ix = buf.loop_end_index()?;
    buf.request_position(end_ix);
    buf.push(ByteCodeItem::Op(OpCode::Jmp));
    Ok(())
}

fn translate_continue(buf: &mut CommandBuffer<'_>) -> TranslationResult<()> {
    unwind_to_loop_depth(buf)?;
    let start_ix = buf.loop_start_index()?;
    buf.request_position(start_ix);
    buf.push(ByteCodeItem::Op(OpCode::Jmp));
    Ok(())
}

fn translate_return<'src>(buf: &mut CommandBuffer<'src>, alt_index: usize, children: &[AstNode<'src>]) -> TranslationResult<()> {
    if alt_index == 0 {
        let expr = nodes_of(children)
            .next()
            .ok_or(TranslationError::MalformedNode("`return` missing its expression"))?;
        translate_node(buf, expr)?;
        buf.push(ByteCodeItem::Op(OpCode::Deref));
    }
    buf.push(ByteCodeItem::Op(OpCode::DelBlock));
    buf.push(ByteCodeItem::Op(OpCode::Ret));
    Ok(())
}

fn translate_expr_stmt<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let expr = nodes_of(children)
        .next()
        .ok_or(TranslationError::MalformedNode("expression statement missing its expression"))?;
    translate_node(buf, expr)?;
    buf.push(ByteCodeItem::Op(OpCode::Pop));
    Ok(())
}

fn translate_assignment<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let name = find_leaf(children, TokenKind::Identifier)
        .ok_or(TranslationError::MalformedNode("assignment missing its target"))?;
    let rhs = nodes_of(children)
        .next()
        .ok_or(TranslationError::MalformedNode("assignment missing its right-hand side"))?;

    buf.push(ByteCodeItem::Ident(name.lexeme));
    translate_node(buf, rhs)?;
    buf.push(ByteCodeItem::Op(OpCode::Assign));
    Ok(())
}

fn translate_binary<'src>(buf: &mut CommandBuffer<'src>, children: &[AstNode<'src>], op: OpCode) -> TranslationResult<()> {
    let mut nodes = nodes_of(children);
    let lhs = nodes.next().ok_or(TranslationError::MalformedNode("binary operator missing its left operand"))?;
    let rhs = nodes.next().ok_or(TranslationError::MalformedNode("binary operator missing its right operand"))?;
    translate_node(buf, lhs)?;
    translate_node(buf, rhs)?;
    buf.push(ByteCodeItem::Op(op));
    Ok(())
}

fn translate_unary<'src>(buf: &mut CommandBuffer<'src>, alt_index: usize, children: &[AstNode<'src>]) -> TranslationResult<()> {
    let operand = nodes_of(children)
        .next()
        .ok_or(TranslationError::MalformedNode("unary operator missing its operand"))?;
    translate_node(buf, operand)?;
    buf.push(ByteCodeItem::Op(if alt_index == 0 { OpCode::Not } else { OpCode::Unm }));
    Ok(())
}

fn translate_postfix<'src>(buf: &mut CommandBuffer<'src>, alt_index: usize, children: &[AstNode<'src>]) -> TranslationResult<()> {
    match alt_index {
        0 => {
            let object = nodes_of(children)
                .next()
                .ok_or(TranslationError::MalformedNode("member access missing its object"))?;
            let member = find_leaf(children, TokenKind::Identifier)
                .ok_or(TranslationError::MalformedNode("member access missing a member name"))?;
            translate_node(buf, object)?;
            buf.push(ByteCodeItem::Ident(member.lexeme));
            buf.push(ByteCodeItem::Op(OpCode::StructRef));
            Ok(())
        }
        1 => {
            let mut nodes = nodes_of(children);
            let callee = nodes.next().ok_or(TranslationError::MalformedNode("call missing its callee"))?;
            let arg_list = nodes.next();
            if let Some(arg_list) = arg_list {
                for arg in flatten_cons_list(arg_list) {
                    translate_node(buf, arg)?;
                    buf.push(ByteCodeItem::Op(OpCode::PushArg));
                }
            }
            translate_node(buf, callee)?;
            buf.push(ByteCodeItem::Op(OpCode::Call));
            Ok(())
        }
        _ => Err(TranslationError::MalformedNode("unrecognized postfix alternative")),
    }
}

fn translate_primary<'src>(buf: &mut CommandBuffer<'src>, alt_index: usize, children: &[AstNode<'src>]) -> TranslationResult<()> {
    match alt_index {
        0 => {
            let name = find_leaf(children, TokenKind::Identifier)
                .ok_or(TranslationError::MalformedNode("identifier expression missing its token"))?;
            buf.push(ByteCodeItem::Ident(name.lexeme));
        }
        1 => buf.push(ByteCodeItem::Null),
        2 => buf.push(ByteCodeItem::Bool(true)),
        3 => buf.push(ByteCodeItem::Bool(false)),
        4 => {
            let token = find_leaf(children, TokenKind::Number)
                .ok_or(TranslationError::MalformedNode("number literal missing its token"))?;
            let value: f64 = token
                .lexeme
                .parse()
                .map_err(|_| TranslationError::MalformedNode("number literal failed to parse"))?;
            buf.push(ByteCodeItem::Number(value));
        }
        5 => {
            let token = find_leaf(children, TokenKind::String)
                .ok_or(TranslationError::MalformedNode("string literal missing its token"))?;
            buf.push(ByteCodeItem::Str(string_literal_value(token.lexeme)));
        }
        _ => return Err(TranslationError::MalformedNode("unrecognized primary alternative")),
    }
    Ok(())
}

fn string_literal_value(lexeme: &str) -> String {
    let inner = lexeme.strip_prefix('"').unwrap_or(lexeme);
    let inner = inner.strip_suffix('"').unwrap_or(inner);
    unescape::unescape(inner).unwrap_or_else(|| inner.to_string())
}
