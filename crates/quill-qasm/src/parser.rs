//! Parser for `OpenQASM` 2.

use std::sync::Arc;

use quill_ir::{
    Arg, Circuit, CircuitDag, ClassicalCondition, Gate, GateDefinition, GateLibrary,
    GateLibraryBuilder, Instruction, InstructionSet, IrResult, ParameterExpression, QubitId,
    WireRef,
};
use rustc_hash::FxHashSet;

use crate::ast::{BinOp, Expression, GateDef, OpCall, Operand, Program, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Name given to circuits read from text.
pub const PARSED_CIRCUIT_NAME: &str = "circuit";

/// Parse a QASM source string into a Circuit over the standard gate library.
pub fn parse(source: &str) -> ParseResult<Circuit> {
    parse_with_library(source, GateLibrary::standard())
}

/// Parse a QASM source string into a Circuit.
///
/// `gate` and `opaque` declarations in the source extend `library` for this
/// circuit only.
pub fn parse_with_library(source: &str, library: Arc<GateLibrary>) -> ParseResult<Circuit> {
    let program = parse_ast(source)?;
    lower_to_circuit(&program, library)
}

/// Parse a QASM source string straight into its DAG.
pub fn parse_dag(source: &str) -> ParseResult<CircuitDag> {
    Ok(parse(source)?.to_dag()?)
}

/// Parse a QASM source string into an AST Program.
pub fn parse_ast(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

#[allow(clippy::cast_possible_truncation)]
impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err(e) => {
                    return Err(ParseError::LexerError {
                        line: e.line,
                        message: e.message,
                    });
                }
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    /// Check if we've reached the end.
    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Line of the current token.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    /// Peek at the current token.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance and return the current token.
    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.line(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let line = self.line();
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(ParseError::UnexpectedToken {
                line,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Check if current token matches.
    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        self.expect(Token::OpenQasm)?;
        let version = self.parse_version()?;
        self.expect(Token::Semicolon)?;

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse version number. Only 2.x is accepted.
    fn parse_version(&mut self) -> ParseResult<String> {
        let version = match self.advance() {
            Some(Token::FloatLiteral(v)) => format!("{v:.1}"),
            Some(Token::IntLiteral(v)) => format!("{v}.0"),
            Some(other) => return Err(ParseError::InvalidVersion(other.to_string())),
            None => return Err(ParseError::UnexpectedEof("version number".into())),
        };
        if !version.starts_with("2.") {
            return Err(ParseError::InvalidVersion(version));
        }
        Ok(version)
    }

    /// Parse a statement.
    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        match token {
            Token::Include => self.parse_include(),
            Token::QReg | Token::CReg => self.parse_register_decl(),
            Token::Gate => self.parse_gate_def(),
            Token::Opaque => self.parse_opaque(),
            Token::If => self.parse_conditioned(),
            Token::Measure | Token::Reset | Token::Barrier | Token::Inv | Token::Identifier(_) => {
                Ok(Statement::Op(self.parse_op()?))
            }
            _ => Err(self.unexpected("statement", &token)),
        }
    }

    /// Parse include statement.
    fn parse_include(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Include)?;
        let path = match self.advance() {
            Some(Token::StringLiteral(s)) => s,
            Some(other) => return Err(self.unexpected("string literal", &other)),
            None => return Err(ParseError::UnexpectedEof("include path".into())),
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    /// Parse `qreg` or `creg`.
    fn parse_register_decl(&mut self) -> ParseResult<Statement> {
        let quantum = self.consume(&Token::QReg);
        if !quantum {
            self.expect(Token::CReg)?;
        }
        let name = self.parse_identifier()?;
        self.expect(Token::LBracket)?;
        let size = self.parse_int_literal()? as u32;
        self.expect(Token::RBracket)?;
        self.expect(Token::Semicolon)?;
        Ok(if quantum {
            Statement::QReg { name, size }
        } else {
            Statement::CReg { name, size }
        })
    }

    /// Parse `name[(params)] qubits` shared by `gate` and `opaque`.
    fn parse_gate_signature(&mut self) -> ParseResult<(String, Vec<String>, Vec<String>)> {
        let name = self.parse_identifier()?;
        let params = if self.consume(&Token::LParen) {
            let params = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect(Token::RParen)?;
            params
        } else {
            vec![]
        };
        let qubits = self.parse_identifier_list()?;
        Ok((name, params, qubits))
    }

    /// Parse gate definition.
    fn parse_gate_def(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Gate)?;
        let (name, params, qubits) = self.parse_gate_signature()?;
        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.consume(&Token::RBrace) {
            if self.is_eof() {
                return Err(ParseError::UnexpectedEof(format!("end of gate '{name}'")));
            }
            body.push(self.parse_op()?);
        }
        Ok(Statement::GateDef(GateDef {
            name,
            params,
            qubits,
            body,
        }))
    }

    /// Parse opaque declaration.
    fn parse_opaque(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Opaque)?;
        let (name, params, qubits) = self.parse_gate_signature()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Opaque {
            name,
            params,
            qubits,
        })
    }

    /// Parse `if(creg==value) op`.
    fn parse_conditioned(&mut self) -> ParseResult<Statement> {
        self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let register = self.parse_identifier()?;
        self.expect(Token::EqEq)?;
        let value = self.parse_int_literal()?;
        self.expect(Token::RParen)?;
        let mut op = self.parse_op()?;
        op.condition = Some((register, value));
        Ok(Statement::Op(op))
    }

    /// Parse one operation up to and including its semicolon.
    fn parse_op(&mut self) -> ParseResult<OpCall> {
        let token = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("operation".into()))?;

        let call = |name: &str, params, args, adjoint| OpCall {
            name: name.to_string(),
            params,
            args,
            condition: None,
            adjoint,
        };

        let op = match token {
            Token::Measure => {
                let qubit = self.parse_operand()?;
                self.expect(Token::Arrow)?;
                let clbit = self.parse_operand()?;
                call("measure", vec![], vec![qubit, clbit], false)
            }
            Token::Reset => {
                let qubit = self.parse_operand()?;
                call("reset", vec![], vec![qubit], false)
            }
            Token::Barrier => {
                let args = self.parse_operand_list()?;
                call("barrier", vec![], args, false)
            }
            Token::Inv => {
                self.expect(Token::At)?;
                let name = self.parse_identifier()?;
                let (params, args) = self.parse_call_tail()?;
                call(&name, params, args, true)
            }
            Token::Identifier(name) => {
                let (params, args) = self.parse_call_tail()?;
                call(&name, params, args, false)
            }
            other => return Err(self.unexpected("operation", &other)),
        };
        self.expect(Token::Semicolon)?;
        Ok(op)
    }

    /// Parse `[(params)] [operands]` after an operation name.
    fn parse_call_tail(&mut self) -> ParseResult<(Vec<Expression>, Vec<Operand>)> {
        let params = if self.consume(&Token::LParen) {
            let params = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            params
        } else {
            vec![]
        };
        let args = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_operand_list()?
        };
        Ok((params, args))
    }

    fn parse_operand_list(&mut self) -> ParseResult<Vec<Operand>> {
        let mut operands = vec![self.parse_operand()?];
        while self.consume(&Token::Comma) {
            operands.push(self.parse_operand()?);
        }
        Ok(operands)
    }

    fn parse_operand(&mut self) -> ParseResult<Operand> {
        let name = self.parse_identifier()?;
        if self.consume(&Token::LBracket) {
            let index = self.parse_int_literal()? as u32;
            self.expect(Token::RBracket)?;
            Ok(Operand::Wire(name, index))
        } else {
            Ok(Operand::Register(name))
        }
    }

    /// Parse an expression.
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expression> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance();

            // `^` is right-associative.
            let next = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next)?;
            left = Expression::BinOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parse unary expression.
    fn parse_unary_expr(&mut self) -> ParseResult<Expression> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expr()?;
            return Ok(Expression::Neg(Box::new(expr)));
        }
        if self.consume(&Token::Plus) {
            return self.parse_unary_expr();
        }
        self.parse_primary_expr()
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expression> {
        let token = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;

        match token {
            Token::IntLiteral(v) => Ok(Expression::Int(v)),
            Token::FloatLiteral(v) => Ok(Expression::Float(v)),
            Token::Pi => Ok(Expression::Pi),
            Token::Identifier(name) => {
                if self.consume(&Token::LParen) {
                    let args = self.parse_expression_list()?;
                    self.expect(Token::RParen)?;
                    Ok(Expression::FnCall { name, args })
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(Expression::Paren(Box::new(expr)))
            }
            other => Err(self.unexpected("expression", &other)),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Caret => Some(BinOp::Pow),
            _ => None,
        }
    }

    /// Parse expression list.
    fn parse_expression_list(&mut self) -> ParseResult<Vec<Expression>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    /// Parse identifier list.
    fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse an identifier.
    fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(other) => Err(self.unexpected("identifier", &other)),
            None => Err(ParseError::UnexpectedEof("identifier".into())),
        }
    }

    /// Parse an integer literal.
    fn parse_int_literal(&mut self) -> ParseResult<u64> {
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(v),
            Some(other) => Err(self.unexpected("integer", &other)),
            None => Err(ParseError::UnexpectedEof("integer".into())),
        }
    }
}

/// Get operator precedence.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
        BinOp::Pow => 3,
    }
}

/// Built-in `U` and `CX` map onto their library names.
fn library_name(name: &str) -> &str {
    match name {
        "U" => "u3",
        "CX" => "cx",
        other => other,
    }
}

/// Lower an AST Program to a Circuit.
fn lower_to_circuit(program: &Program, library: Arc<GateLibrary>) -> ParseResult<Circuit> {
    // Definitions first: the circuit's library is fixed once it exists.
    let mut library = library;
    for stmt in &program.statements {
        match stmt {
            Statement::GateDef(def) => library = define_gate(&library, def)?,
            Statement::Opaque {
                name,
                params,
                qubits,
            } => {
                check_new_name(&library, name, params, qubits)?;
                let definition =
                    GateDefinition::opaque(name, qubits.len() as u32, params.len());
                library = GateLibraryBuilder::from_library(&library)
                    .define(definition)
                    .build()?;
            }
            _ => {}
        }
    }

    let mut circuit = Circuit::with_library(PARSED_CIRCUIT_NAME, library);
    for stmt in &program.statements {
        match stmt {
            Statement::Include(path) => {
                if path != "qelib1.inc" {
                    return Err(ParseError::UnsupportedInclude(path.clone()));
                }
            }
            Statement::QReg { name, size } => {
                circuit.add_qreg(name, *size)?;
            }
            Statement::CReg { name, size } => {
                circuit.add_creg(name, *size)?;
            }
            Statement::Op(call) => lower_op(&mut circuit, call)?,
            Statement::GateDef(_) | Statement::Opaque { .. } => {}
        }
    }
    Ok(circuit)
}

fn lower_op(circuit: &mut Circuit, call: &OpCall) -> ParseResult<()> {
    let params = call
        .params
        .iter()
        .map(|e| expr_to_param(e).map(|p| p.simplify()))
        .collect::<ParseResult<Vec<_>>>()?;
    let args: Vec<Arg> = call
        .args
        .iter()
        .map(|operand| match operand {
            Operand::Register(name) => Arg::Register(name.clone()),
            Operand::Wire(name, index) => Arg::Wire(WireRef::new(name, *index)),
        })
        .collect();
    let condition = call
        .condition
        .as_ref()
        .map(|(register, value)| ClassicalCondition::new(register, *value));
    let name = library_name(&call.name);

    if call.adjoint {
        // Each broadcast member is inverted in place; they stay in order.
        let set = circuit.prepare(name, &params, &args, condition)?;
        let inverted = set
            .iter()
            .map(Instruction::inverse)
            .collect::<IrResult<Vec<_>>>()?;
        circuit.append(&InstructionSet::new(inverted)?)?;
    } else {
        circuit.apply(name, &params, &args, condition)?;
    }
    Ok(())
}

fn check_new_name(
    library: &GateLibrary,
    name: &str,
    params: &[String],
    qubits: &[String],
) -> ParseResult<()> {
    if library.contains(name) {
        return Err(ParseError::DuplicateDeclaration(name.to_string()));
    }
    let mut seen = FxHashSet::default();
    for formal in params.iter().chain(qubits) {
        if !seen.insert(formal.as_str()) {
            return Err(ParseError::DuplicateDeclaration(format!(
                "'{formal}' in gate '{name}'"
            )));
        }
    }
    Ok(())
}

/// One operation of a gate body, with parameters still over the formals.
struct BodyOp {
    /// `None` for a barrier.
    gate: Option<Gate>,
    qubits: Vec<QubitId>,
}

/// Turn a `gate` definition into a library rule.
fn define_gate(library: &Arc<GateLibrary>, def: &GateDef) -> ParseResult<Arc<GateLibrary>> {
    check_new_name(library, &def.name, &def.params, &def.qubits)?;

    let mut body = Vec::with_capacity(def.body.len());
    for call in &def.body {
        if call.condition.is_some() {
            return Err(ParseError::Generic(format!(
                "Conditioned operation in body of gate '{}'",
                def.name
            )));
        }
        let qubits = call
            .args
            .iter()
            .map(|operand| match operand {
                Operand::Register(name) => def
                    .qubits
                    .iter()
                    .position(|q| q == name)
                    .map(|i| QubitId(i as u32))
                    .ok_or_else(|| ParseError::UndefinedIdentifier(name.clone())),
                Operand::Wire(name, index) => Err(ParseError::Generic(format!(
                    "Indexed operand {name}[{index}] in body of gate '{}'",
                    def.name
                ))),
            })
            .collect::<ParseResult<Vec<_>>>()?;

        let mut params = Vec::with_capacity(call.params.len());
        for expr in &call.params {
            let param = expr_to_param(expr)?.simplify();
            if let Some(unknown) = param.symbols().into_iter().find(|s| !def.params.contains(s)) {
                return Err(ParseError::UndefinedIdentifier(unknown));
            }
            params.push(param);
        }

        let gate = match call.name.as_str() {
            "barrier" => None,
            name => {
                let gate = library.instantiate(library_name(name), &params)?;
                Some(if call.adjoint { gate.inverse() } else { gate })
            }
        };
        body.push(BodyOp { gate, qubits });
    }

    let formals = def.params.clone();
    let rule = move |actual: &[ParameterExpression]| -> Vec<Instruction> {
        let bind = |p: &ParameterExpression| {
            p.map_symbols(&|s| {
                formals
                    .iter()
                    .position(|f| f == s)
                    .and_then(|i| actual.get(i).cloned())
            })
            .simplify()
        };
        body.iter()
            .map(|op| match &op.gate {
                Some(gate) => Instruction::gate(gate.map_params(&bind), op.qubits.iter().copied()),
                None => Instruction::barrier(op.qubits.iter().copied()),
            })
            .collect()
    };

    let definition =
        GateDefinition::composite(&def.name, def.qubits.len() as u32, def.params.len(), rule);
    Ok(GateLibraryBuilder::from_library(library)
        .define(definition)
        .build()?)
}

/// Convert AST expression to `ParameterExpression`.
#[allow(clippy::cast_precision_loss)]
fn expr_to_param(expr: &Expression) -> ParseResult<ParameterExpression> {
    Ok(match expr {
        Expression::Int(v) => ParameterExpression::Constant(*v as f64),
        Expression::Float(v) => ParameterExpression::Constant(*v),
        Expression::Pi => ParameterExpression::Pi,
        Expression::Identifier(name) => ParameterExpression::Symbol(name.clone()),
        Expression::Neg(e) => ParameterExpression::Neg(Box::new(expr_to_param(e)?)),
        Expression::Paren(e) => expr_to_param(e)?,
        Expression::BinOp { left, op, right } => {
            let l = Box::new(expr_to_param(left)?);
            let r = Box::new(expr_to_param(right)?);
            match op {
                BinOp::Add => ParameterExpression::Add(l, r),
                BinOp::Sub => ParameterExpression::Sub(l, r),
                BinOp::Mul => ParameterExpression::Mul(l, r),
                BinOp::Div => ParameterExpression::Div(l, r),
                BinOp::Pow => ParameterExpression::Constant(expr.as_f64().ok_or_else(|| {
                    ParseError::Generic("Cannot raise a symbolic parameter to a power".into())
                })?),
            }
        }
        Expression::FnCall { name, .. } => {
            ParameterExpression::Constant(expr.as_f64().ok_or_else(|| {
                ParseError::Generic(format!(
                    "Cannot evaluate function {name} with these arguments"
                ))
            })?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_ir::{CircuitSource, InstructionKind, IrError, SimulatorCommand};

    fn names(circuit: &Circuit) -> Vec<String> {
        circuit
            .instructions()
            .iter()
            .map(|i| i.name().to_string())
            .collect()
    }

    #[test]
    fn test_parse_bell_state() {
        let source = r#"
            OPENQASM 2.0;
            include "qelib1.inc";
            qreg q[2];
            creg c[2];
            h q[0];
            cx q[0],q[1];
            measure q -> c;
        "#;

        let circuit = parse(source).unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(names(&circuit), ["h", "cx", "measure", "measure"]);
    }

    #[test]
    fn test_parse_parameterized() {
        let source = r"
            OPENQASM 2.0;
            qreg q[1];
            u1(pi/2) q[0];
            u3(0.5, -pi, 2^2) q[0];
            U(1,2,3) q[0];
        ";

        let circuit = parse(source).unwrap();
        let gate = circuit.instructions()[1].as_gate().unwrap();
        let values: Vec<f64> = gate.parameters().iter().map(|p| p.as_f64().unwrap()).collect();
        assert_eq!(values, [0.5, -std::f64::consts::PI, 4.0]);
        assert_eq!(circuit.instructions()[2].name(), "u3");
    }

    #[test]
    fn test_parse_condition() {
        let source = r"
            OPENQASM 2.0;
            qreg q[1];
            creg c[2];
            if(c==3) x q[0];
        ";
        let circuit = parse(source).unwrap();
        let inst = &circuit.instructions()[0];
        assert_eq!(inst.condition, Some(ClassicalCondition::new("c", 3)));
    }

    #[test]
    fn test_parse_simulator_commands() {
        let source = r"
            OPENQASM 2.0;
            qreg q[2];
            load(1) q[0],q[1];
            noise(0) q;
            save(4);
        ";
        let circuit = parse(source).unwrap();
        let kinds: Vec<_> = circuit.instructions().iter().map(|i| i.kind.clone()).collect();
        assert_eq!(
            kinds,
            [
                InstructionKind::Simulator(SimulatorCommand::Load(1)),
                InstructionKind::Simulator(SimulatorCommand::Noise(0)),
                InstructionKind::Simulator(SimulatorCommand::Noise(0)),
                InstructionKind::Simulator(SimulatorCommand::Save(4)),
            ]
        );
        assert_eq!(circuit.instructions()[3].qubits.len(), 2);
    }

    #[test]
    fn test_parse_gate_definition() {
        let source = r"
            OPENQASM 2.0;
            gate rot2(a, b) t {
                u1(a) t;
                u3(b, 0, 0) t;
            }
            qreg q[1];
            rot2(0.1, 0.2) q[0];
        ";
        let circuit = parse(source).unwrap();
        let def = circuit.library().get("rot2").unwrap();
        let body = def
            .decompose(&[0.1.into(), 0.2.into()])
            .unwrap()
            .unwrap();
        let text: Vec<String> = body.iter().map(ToString::to_string).collect();
        assert_eq!(text, ["u1(0.1) q0;", "u3(0.2,0,0) q0;"]);
        assert_eq!(circuit.instructions()[0].name(), "rot2");
    }

    #[test]
    fn test_parse_adjoint() {
        let source = r"
            OPENQASM 2.0;
            gate rot2(a, b) t { u1(a) t; u3(b, 0, 0) t; }
            qreg q[2];
            inv @ rot2(0.1, 0.2) q[1];
            inv @ s q;
        ";
        let circuit = parse(source).unwrap();
        assert!(circuit.instructions()[0].as_gate().unwrap().is_adjoint());
        assert_eq!(names(&circuit), ["rot2", "sdg", "sdg"]);
        assert_eq!(
            circuit.to_qasm_lines()[0],
            "inv @ rot2(0.1,0.2) q[1];"
        );
    }

    #[test]
    fn test_parse_errors() {
        let undefined = "OPENQASM 2.0;\nh undefined[0];";
        assert!(matches!(
            parse(undefined),
            Err(ParseError::CircuitError(IrError::UnknownRegister { .. }))
        ));

        let version = "OPENQASM 3.0;";
        assert!(matches!(parse(version), Err(ParseError::InvalidVersion(_))));

        let duplicate = "OPENQASM 2.0;\ngate h a { u2(0, pi) a; }";
        assert!(matches!(parse(duplicate), Err(ParseError::DuplicateDeclaration(_))));

        let free = "OPENQASM 2.0;\ngate g(a) t { u1(b) t; }";
        assert!(matches!(parse(free), Err(ParseError::UndefinedIdentifier(ref s)) if s == "b"));

        let missing = "OPENQASM 2.0;\nqreg q[1];\nh q[0]\nx q[0];";
        match parse(missing) {
            Err(ParseError::UnexpectedToken { line, .. }) => assert_eq!(line, 4),
            other => panic!("Expected UnexpectedToken, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_dag_order() {
        let source = r"
            OPENQASM 2.0;
            qreg q[2];
            h q[1];
            x q[0];
            cx q[0],q[1];
        ";
        let dag = parse_dag(source).unwrap();
        let names: Vec<_> = dag.ordered_instructions().iter().map(|i| i.name()).collect();
        assert_eq!(names, ["h", "x", "cx"]);
    }
}
