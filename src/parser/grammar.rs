//! Token-stream grammar (spec.md §6), built with chumsky's pratt parser
//! for expressions and straightforward recursive descent for statements
//! and declarations.

use super::lexer::{Span, Token};
use crate::ast::*;
use chumsky::input::{Stream, ValueInput};
use chumsky::pratt::*;
use chumsky::prelude::*;

pub type TokenStream<'tokens, 'src> =
    chumsky::input::SpannedInput<Token<'src>, Span, &'tokens [(Token<'src>, Span)]>;

pub fn token_stream<'tokens, 'src>(
    tokens: &'tokens [(Token<'src>, Span)],
) -> TokenStream<'tokens, 'src> {
    let eoi: Span = tokens
        .last()
        .map(|(_, s)| (s.end..s.end).into())
        .unwrap_or((0..0).into());
    Stream::from_iter(tokens.iter().cloned()).map(eoi, |(t, s)| (t, s))
}

type Extra<'tokens, 'src> = extra::Err<Rich<'tokens, Token<'src>, Span>>;

fn ident<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, String, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    select! { Token::Ident(s) => s.to_string() }
}

fn type_expr<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, TypeExpr, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    recursive(|type_expr| {
        let base = choice((
            just(Token::Bool).to(TypeExpr::Bool),
            just(Token::Int_).to(TypeExpr::Int),
            just(Token::Float_).to(TypeExpr::Float),
            just(Token::StringKw).to(TypeExpr::String),
            just(Token::Float2).to(TypeExpr::Vec2),
            just(Token::Float3).to(TypeExpr::Vec3),
            ident().map(TypeExpr::Named),
        ));
        base.clone().then(just(Token::LBracket).then(just(Token::RBracket)).repeated().count()).map(
            |(base, dims)| {
                let mut t = base;
                for _ in 0..dims {
                    t = TypeExpr::Array(Box::new(t));
                }
                t
            },
        )
    })
}

fn expr_parser<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, Expr, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    recursive(|expr| {
        let atom = choice((
            select! { Token::Int(i) => ExprKind::IntLit(i) },
            select! { Token::Float(f) => ExprKind::FloatLit(f) },
            select! { Token::Str(s) => ExprKind::StringLit(s.to_string()) },
            just(Token::True).to(ExprKind::BoolLit(true)),
            just(Token::False).to(ExprKind::BoolLit(false)),
            just(Token::Environment)
                .ignore_then(just(Token::Dot))
                .ignore_then(ident())
                .map(|field| ExprKind::EnvironmentAccess { field }),
            just(Token::New)
                .ignore_then(ident())
                .then(
                    expr.clone()
                        .separated_by(just(Token::Comma))
                        .allow_trailing()
                        .collect::<Vec<_>>()
                        .delimited_by(just(Token::LParen), just(Token::RParen)),
                )
                .map(|(agent_name, args)| ExprKind::AgentCreation { agent_name, args }),
            just(Token::New)
                .ignore_then(type_expr())
                .then(expr.clone().delimited_by(just(Token::LBracket), just(Token::RBracket)))
                .map(|(elem_type, size)| ExprKind::NewArray { elem_type, size }),
            ident()
                .then(
                    expr.clone()
                        .separated_by(just(Token::Comma))
                        .allow_trailing()
                        .collect::<Vec<_>>()
                        .delimited_by(just(Token::LParen), just(Token::RParen))
                        .or_not(),
                )
                .map(|(name, args)| match args {
                    Some(args) => ExprKind::Call { name, args },
                    None => ExprKind::Var { name, id: None },
                }),
            expr.clone()
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace))
                .map(|elements| ExprKind::ArrayInit { elements }),
            expr.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen))
                .map(|e: Expr| *e.kind),
        ))
        .map_with(|kind, e| Expr::new(kind, e.span().into_range()));

        let postfixed = atom
            .pratt((
                postfix(9, just(Token::LBracket).ignore_then(expr.clone()).then_ignore(just(Token::RBracket)), |base: Expr, index: Expr, e: &mut chumsky::input::MapExtra<_, _>| {
                    Expr::new(ExprKind::ArrayAccess { base, index }, e.span().into_range())
                }),
                postfix(9, just(Token::Dot).ignore_then(ident()), |base: Expr, member: String, e: &mut chumsky::input::MapExtra<_, _>| {
                    Expr::new(ExprKind::Member { base, member }, e.span().into_range())
                }),
            ));

        postfixed.pratt((
            prefix(8, just(Token::Minus), |_, rhs: Expr, e: &mut chumsky::input::MapExtra<_, _>| {
                Expr::new(ExprKind::Unary { op: UnaryOp::Minus, operand: rhs }, e.span().into_range())
            }),
            prefix(8, just(Token::Plus), |_, rhs: Expr, e: &mut chumsky::input::MapExtra<_, _>| {
                Expr::new(ExprKind::Unary { op: UnaryOp::Plus, operand: rhs }, e.span().into_range())
            }),
            prefix(8, just(Token::Bang), |_, rhs: Expr, e: &mut chumsky::input::MapExtra<_, _>| {
                Expr::new(ExprKind::Unary { op: UnaryOp::LogicalNot, operand: rhs }, e.span().into_range())
            }),
            prefix(8, just(Token::Tilde), |_, rhs: Expr, e: &mut chumsky::input::MapExtra<_, _>| {
                Expr::new(ExprKind::Unary { op: UnaryOp::BitwiseNot, operand: rhs }, e.span().into_range())
            }),
            infix(left(7), just(Token::Star), mk_bin(BinOp::Mul)),
            infix(left(7), just(Token::Slash), mk_bin(BinOp::Div)),
            infix(left(7), just(Token::Percent), mk_bin(BinOp::Mod)),
            infix(left(6), just(Token::Plus), mk_bin(BinOp::Add)),
            infix(left(6), just(Token::Minus), mk_bin(BinOp::Sub)),
            infix(left(5), just(Token::Shl), mk_bin(BinOp::ShiftLeft)),
            infix(left(5), just(Token::Shr), mk_bin(BinOp::ShiftRight)),
            infix(left(4), just(Token::Lt), mk_bin(BinOp::Lt)),
            infix(left(4), just(Token::Le), mk_bin(BinOp::Le)),
            infix(left(4), just(Token::Gt), mk_bin(BinOp::Gt)),
            infix(left(4), just(Token::Ge), mk_bin(BinOp::Ge)),
            infix(left(3), just(Token::EqEq), mk_bin(BinOp::Eq)),
            infix(left(3), just(Token::Ne), mk_bin(BinOp::Ne)),
            infix(left(2), just(Token::Amp), mk_bin(BinOp::BitwiseAnd)),
            infix(left(2), just(Token::Caret), mk_bin(BinOp::BitwiseXor)),
            infix(left(2), just(Token::Pipe), mk_bin(BinOp::BitwiseOr)),
            infix(left(1), just(Token::AndAnd), mk_bin(BinOp::And)),
            infix(left(1), just(Token::OrOr), mk_bin(BinOp::Or)),
            infix(left(0), just(Token::DotDot), mk_bin(BinOp::Range)),
        ))
        .then(
            just(Token::Question)
                .ignore_then(expr.clone())
                .then_ignore(just(Token::Colon))
                .then(expr.clone())
                .or_not(),
        )
        .map_with(|(cond, rest), e| match rest {
            Some((then_branch, else_branch)) => Expr::new(
                ExprKind::Ternary {
                    cond,
                    then_branch,
                    else_branch,
                },
                e.span().into_range(),
            ),
            None => cond,
        })
    })
}

/// Build an infix fold callback for a given operator; factored out since
/// every binary operator shares the same `(lhs, _tok, rhs, extra) -> Expr`
/// shape in the pratt table above.
fn mk_bin(op: BinOp) -> impl Fn(Expr, Expr, &mut chumsky::input::MapExtra<'_, '_, impl Sized>) -> Expr + Clone {
    move |left, right, e| Expr::new(ExprKind::Binary { op, left, right }, e.span().into_range())
}

fn stmt_parser<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, Stmt, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    recursive(|stmt| {
        let expr = expr_parser();

        let block = stmt
            .clone()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with(|stmts, e| Stmt::new(StmtKind::Block(stmts), e.span().into_range()));

        let var_decl = just(Token::Const)
            .to(true)
            .or(just(Token::Param).to(true))
            .or_not()
            .then(type_expr().or_not())
            .then(ident())
            .then(just(Token::Eq).ignore_then(expr.clone()).or_not())
            .then_ignore(just(Token::Semi))
            .map_with(|(((is_const, ty), name), init), e| {
                Stmt::new(
                    StmtKind::VarDecl {
                        name,
                        id: None,
                        is_const: is_const.unwrap_or(false),
                        declared_type: ty,
                        resolved_type: crate::types::Type::Invalid,
                        init,
                    },
                    e.span().into_range(),
                )
            });

        let assign = expr
            .clone()
            .then(
                choice((
                    just(Token::Eq).to(None),
                    just(Token::PlusEq).to(Some(BinOp::Add)),
                    just(Token::MinusEq).to(Some(BinOp::Sub)),
                    just(Token::StarEq).to(Some(BinOp::Mul)),
                    just(Token::SlashEq).to(Some(BinOp::Div)),
                ))
                .then(expr.clone()),
            )
            .then_ignore(just(Token::Semi))
            .map_with(|(target, (op, value)), e| {
                let span = e.span().into_range();
                match op {
                    None => Stmt::new(StmtKind::Assign { target, value }, span),
                    Some(op) => Stmt::new(StmtKind::AssignOp { op, target, value }, span),
                }
            });

        let expr_stmt = expr
            .clone()
            .then_ignore(just(Token::Semi))
            .map_with(|e, ex| Stmt::new(StmtKind::Expr(e), ex.span().into_range()));

        let if_stmt = just(Token::If)
            .ignore_then(expr.clone().delimited_by(just(Token::LParen), just(Token::RParen)))
            .then(stmt.clone())
            .then(just(Token::Else).ignore_then(stmt.clone()).or_not())
            .map_with(|((cond, then_branch), else_branch), e| {
                Stmt::new(
                    StmtKind::If {
                        cond,
                        then_branch: Box::new(then_branch),
                        else_branch: else_branch.map(Box::new),
                    },
                    e.span().into_range(),
                )
            });

        let while_stmt = just(Token::While)
            .ignore_then(expr.clone().delimited_by(just(Token::LParen), just(Token::RParen)))
            .then(stmt.clone())
            .map_with(|(cond, body), e| {
                Stmt::new(
                    StmtKind::While {
                        cond,
                        body: Box::new(body),
                    },
                    e.span().into_range(),
                )
            });

        // `for (a : near(center, radius, AgentName))`
        let near_for = ident()
            .then_ignore(just(Token::Colon))
            .then_ignore(just(Token::Ident("near")))
            .then(
                expr.clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .try_map(|(var_name, args), span| {
                if args.len() != 3 {
                    return Err(Rich::custom(span, "near(...) takes exactly 3 arguments"));
                }
                let mut it = args.into_iter();
                let center = it.next().unwrap();
                let radius = it.next().unwrap();
                let agent_expr = it.next().unwrap();
                let agent_name = match *agent_expr.kind {
                    ExprKind::Var { name, .. } => name,
                    _ => return Err(Rich::custom(span, "near(...)'s third argument must be an agent type name")),
                };
                Ok((var_name, agent_name, NearFilter { center, radius }))
            });

        // `for (a : AgentName)`
        let plain_agent_for = ident().then_ignore(just(Token::Colon)).then(ident());

        let for_stmt = just(Token::For)
            .ignore_then(just(Token::LParen))
            .ignore_then(
                near_for
                    .map(|(var_name, agent_name, near)| (var_name, agent_name, Some(near)))
                    .or(plain_agent_for.map(|(var_name, agent_name)| (var_name, agent_name, None))),
            )
            .then_ignore(just(Token::RParen))
            .then(stmt.clone())
            .map_with(|((var_name, agent_name, near), body), e| {
                Stmt::new(
                    StmtKind::For {
                        var_name,
                        var_id: None,
                        kind: ForKind::Agent { agent_name, near },
                        body: Box::new(body),
                    },
                    e.span().into_range(),
                )
            });

        let range_for_stmt = just(Token::For)
            .ignore_then(just(Token::LParen))
            .ignore_then(ident())
            .then_ignore(just(Token::Colon))
            .then(expr.clone())
            .then_ignore(just(Token::DotDot))
            .then(expr.clone())
            .then_ignore(just(Token::RParen))
            .then(stmt.clone())
            .map_with(|(((var_name, start), end), body), e| {
                Stmt::new(
                    StmtKind::For {
                        var_name,
                        var_id: None,
                        kind: ForKind::Range { start, end },
                        body: Box::new(body),
                    },
                    e.span().into_range(),
                )
            });

        // `simulate(N)` or `simulate(N; f1, f2, ...)`.
        let simulate_stmt = just(Token::Simulate)
            .ignore_then(just(Token::LParen))
            .ignore_then(expr.clone())
            .then(
                just(Token::Semi)
                    .ignore_then(ident().separated_by(just(Token::Comma)).allow_trailing().collect::<Vec<_>>())
                    .or_not(),
            )
            .then_ignore(just(Token::RParen))
            .then_ignore(just(Token::Semi))
            .map_with(|(step_count, step_names), e| {
                let span = e.span().into_range();
                Stmt::new(
                    StmtKind::Simulate(SimulateStmt {
                        step_count,
                        step_names: step_names.unwrap_or_default(),
                        resolved_steps: Vec::new(),
                        span: span.clone(),
                    }),
                    span,
                )
            });

        let return_stmt = just(Token::Return)
            .ignore_then(expr.clone().or_not())
            .then_ignore(just(Token::Semi))
            .map_with(|e, ex| Stmt::new(StmtKind::Return(e), ex.span().into_range()));

        let break_stmt = just(Token::Break)
            .then_ignore(just(Token::Semi))
            .map_with(|_, e| Stmt::new(StmtKind::Break, e.span().into_range()));
        let continue_stmt = just(Token::Continue)
            .then_ignore(just(Token::Semi))
            .map_with(|_, e| Stmt::new(StmtKind::Continue, e.span().into_range()));

        choice((
            block,
            if_stmt,
            while_stmt,
            range_for_stmt,
            for_stmt,
            simulate_stmt,
            return_stmt,
            break_stmt,
            continue_stmt,
            var_decl,
            assign,
            expr_stmt,
        ))
    })
}

fn param_list<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, Vec<Param>, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    just(Token::Out)
        .or_not()
        .then(type_expr())
        .then(ident())
        .map_with(|((_out, declared_type), name), e| Param {
            name,
            id: None,
            declared_type,
            resolved_type: crate::types::Type::Invalid,
            span: e.span().into_range(),
        })
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect()
        .delimited_by(just(Token::LParen), just(Token::RParen))
}

fn agent_decl<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, AgentDecl, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    let member = just(Token::Position)
        .to(true)
        .or_not()
        .then(type_expr())
        .then(ident())
        .then_ignore(just(Token::Semi))
        .map_with(|((is_position, declared_type), name), e| AgentMember {
            name,
            declared_type,
            resolved_type: crate::types::Type::Invalid,
            is_position: is_position.unwrap_or(false),
            span: e.span().into_range(),
        });

    just(Token::Agent)
        .ignore_then(ident())
        .then(member.repeated().collect::<Vec<_>>().delimited_by(just(Token::LBrace), just(Token::RBrace)))
        .map_with(|(name, members), e| AgentDecl {
            name,
            members,
            steps: Vec::new(),
            span: e.span().into_range(),
        })
}

fn function_decl<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, FunctionDecl, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    let step_kw = just(Token::Step).ignore_then(just(Token::Seq).or_not());

    // `AgentName step { ... }` / `AgentName step seq { ... }`
    let step_fn = ident()
        .then(step_kw.clone())
        .then(stmt_parser())
        .map_with(|((agent_name, is_seq), body), e| {
            let kind = if is_seq.is_some() { FunctionKind::SeqStep } else { FunctionKind::Step };
            (Some(agent_name), None, kind, Vec::new(), TypeExpr::Void, body, e.span().into_range())
        });

    let plain_fn = just(Token::Function)
        .ignore_then(type_expr().or(just(Token::Ident("void")).to(TypeExpr::Void)).or_not())
        .then(ident())
        .then(param_list())
        .then(stmt_parser())
        .map_with(|(((ret, name), params), body), e| {
            (None, Some(name), FunctionKind::Plain, params, ret.unwrap_or(TypeExpr::Void), body, e.span().into_range())
        });

    choice((step_fn, plain_fn)).map(|(agent_name, name, kind, params, ret, body, span)| FunctionDecl {
        name: name.unwrap_or_else(|| agent_name.clone().unwrap_or_default()),
        kind,
        flags: FunctionFlags::default(),
        self_agent: None,
        params,
        out_vars: Vec::new(),
        return_type: ret,
        resolved_return_type: crate::types::Type::Invalid,
        body,
        step_metadata: StepMetadata::default(),
        span,
    })
}

fn const_decl<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, ConstDecl, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    choice((just(Token::Const).to(false), just(Token::Param).to(true)))
        .then(type_expr().or_not())
        .then(ident())
        .then_ignore(just(Token::Eq))
        .then(expr_parser())
        .then_ignore(just(Token::Semi))
        .map_with(|(((is_param, ty), name), value), e| ConstDecl {
            name,
            id: None,
            declared_type: ty,
            resolved_type: crate::types::Type::Invalid,
            value,
            is_param,
            span: e.span().into_range(),
        })
}

fn environment_decl<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, EnvironmentDecl, Extra<'tokens, 'src>> + Clone
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    just(Token::Environment)
        .ignore_then(
            ident()
                .then_ignore(just(Token::Eq))
                .then(expr_parser())
                .then_ignore(just(Token::Semi))
                .repeated()
                .collect::<Vec<_>>(),
        )
        .delimited_by(just(Token::LBrace), just(Token::RBrace))
        .map_with(|fields, e| {
            let mut decl = EnvironmentDecl {
                span: Some(e.span().into_range()),
                ..Default::default()
            };
            for (name, value) in fields {
                match name.as_str() {
                    "min" => decl.min = Some(value),
                    "max" => decl.max = Some(value),
                    "dimension" => decl.dimension = Some(value),
                    "granularity" => decl.granularity = Some(value),
                    _ => {}
                }
            }
            decl
        })
}

pub fn script_parser<'tokens, 'src: 'tokens, I>() -> impl Parser<'tokens, I, Script, Extra<'tokens, 'src>>
where
    I: ValueInput<'tokens, Token = Token<'src>, Span = Span>,
{
    enum Item {
        Agent(AgentDecl),
        Const(ConstDecl),
        Environment(EnvironmentDecl),
        Function(FunctionDecl),
    }

    let item = choice((
        agent_decl().map(Item::Agent),
        const_decl().map(Item::Const),
        environment_decl().map(Item::Environment),
        function_decl().map(Item::Function),
    ));

    item.repeated().collect::<Vec<_>>().map(|items| {
        let mut script = Script::default();
        for item in items {
            match item {
                Item::Agent(a) => script.agents.push(a),
                Item::Const(c) => script.consts.push(c),
                Item::Environment(e) => script.environment = e,
                Item::Function(f) => script.functions.push(f),
            }
        }
        // Resolve step functions' `self_agent` now that every agent name
        // is known: a step's owning agent is recovered from its name
        // having matched an agent identifier during parsing.
        for func in script.functions.iter_mut() {
            if matches!(func.kind, FunctionKind::Step | FunctionKind::SeqStep) {
                if let Some(idx) = script.agents.iter().position(|a| a.name == func.name) {
                    func.self_agent = Some(crate::types::AgentRef(idx as u32));
                }
            }
        }
        script
    })
}
