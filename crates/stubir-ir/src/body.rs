//! Bodies and expressions of synthesized declarations.
//!
//! Only the handful of shapes enum synthesis needs; general expression
//! building is outside this layer.

use crate::decl::DeclId;
use crate::types::IrType;
use crate::well_known::CtorRef;
use smallvec::SmallVec;
use stubir_common::ConstValue;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Const(ConstValue),
    /// Read the `index`-th value parameter of a function or constructor.
    GetValueParam { owner: DeclId, index: u32 },
    GetThis { class: DeclId },
    GetField { receiver: Box<Expr>, field: DeclId },
    Return(Box<Expr>),
    /// Call of an enum constructor (the base `Enum<E>` one or the enum's own).
    EnumConstructorCall {
        target: CtorRef,
        type_args: SmallVec<[IrType; 1]>,
        args: Vec<Expr>,
    },
    /// `super(...)` call from a constructor.
    DelegatingConstructorCall { target: CtorRef, args: Vec<Expr> },
    /// Runs the instance initializers of `class`.
    InstanceInitializerCall { class: DeclId },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Block(Vec<Expr>),
    Expr(Expr),
}

impl Body {
    pub fn statements(&self) -> &[Expr] {
        match self {
            Body::Block(stmts) => stmts,
            Body::Expr(expr) => std::slice::from_ref(expr),
        }
    }
}
