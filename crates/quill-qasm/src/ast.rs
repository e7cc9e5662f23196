//! Abstract syntax tree for `OpenQASM` 2.

/// A parsed program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Version string (e.g. "2.0").
    pub version: String,
    /// Statements in source order.
    pub statements: Vec<Statement>,
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `include "path";`
    Include(String),
    /// `qreg name[size];`
    QReg { name: String, size: u32 },
    /// `creg name[size];`
    CReg { name: String, size: u32 },
    /// `gate name(params) qubits { body }`
    GateDef(GateDef),
    /// `opaque name(params) qubits;`
    Opaque {
        name: String,
        params: Vec<String>,
        qubits: Vec<String>,
    },
    /// Any operation: gate call, measure, reset, barrier or simulator command.
    Op(OpCall),
}

/// A gate definition.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDef {
    pub name: String,
    /// Formal parameter names.
    pub params: Vec<String>,
    /// Formal qubit names.
    pub qubits: Vec<String>,
    /// Body operations over the formal qubits.
    pub body: Vec<OpCall>,
}

/// One operation statement.
#[derive(Debug, Clone, PartialEq)]
pub struct OpCall {
    pub name: String,
    pub params: Vec<Expression>,
    /// Qubit operands, then classical operands for `measure`.
    pub args: Vec<Operand>,
    /// `if(register==value)` prefix.
    pub condition: Option<(String, u64)>,
    /// `inv @` prefix.
    pub adjoint: bool,
}

/// An operand: a whole register or one indexed wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(String),
    Wire(String, u32),
}

/// A parameter expression as written.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Int(u64),
    Float(f64),
    Pi,
    Identifier(String),
    Neg(Box<Expression>),
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    Paren(Box<Expression>),
    FnCall { name: String, args: Vec<Expression> },
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Expression {
    /// Evaluate the expression if it holds no identifiers.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Expression::Int(v) => Some(*v as f64),
            Expression::Float(v) => Some(*v),
            Expression::Pi => Some(std::f64::consts::PI),
            Expression::Identifier(_) => None,
            Expression::Neg(e) => e.as_f64().map(|v| -v),
            Expression::Paren(e) => e.as_f64(),
            Expression::BinOp { left, op, right } => {
                let l = left.as_f64()?;
                let r = right.as_f64()?;
                Some(match op {
                    BinOp::Add => l + r,
                    BinOp::Sub => l - r,
                    BinOp::Mul => l * r,
                    BinOp::Div => l / r,
                    BinOp::Pow => l.powf(r),
                })
            }
            Expression::FnCall { name, args } => {
                let [arg] = args.as_slice() else {
                    return None;
                };
                let v = arg.as_f64()?;
                match name.as_str() {
                    "sin" => Some(v.sin()),
                    "cos" => Some(v.cos()),
                    "tan" => Some(v.tan()),
                    "exp" => Some(v.exp()),
                    "ln" => Some(v.ln()),
                    "sqrt" => Some(v.sqrt()),
                    _ => None,
                }
            }
        }
    }
}
