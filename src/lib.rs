// src/lib.rs
//
// Évaluateur d'expressions arithmétiques embarquable.
// Le front-end egui n'est compilé qu'avec la feature `gui`.

pub mod noyau;

#[cfg(feature = "gui")]
pub mod app;

pub use noyau::{
    eval_avec_liaisons, eval_expression, ArithmeticError, Decimal, DemarcheNoyau, Error, Expression,
    ExpressionError, Function, LazyValue, MathContext, Operator, Result, RoundingMode, Token,
    TokenKind, Tokenizer, VariableValue, VARIADIQUE,
};
