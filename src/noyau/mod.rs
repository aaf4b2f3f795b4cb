//! Noyau — compilateur / évaluateur d'expressions
//!
//! Organisation interne :
//! - decimal.rs    : décimal à précision arbitraire + MathContext
//! - erreur.rs     : erreurs d'expression / arithmétiques
//! - jetons.rs     : tokenisation (unaire vs binaire, opérateurs gloutons)
//! - registre.rs   : tables insensibles à la casse (opérateurs, fonctions, variables)
//! - paresseux.rs  : valeurs différées
//! - rpn.rs        : shunting-yard + validation des arités
//! - eval.rs       : parcours de la RPN + API front-end
//! - racines.rs    : puissance décimale, √, racine n-ième
//! - standard.rs   : opérateurs, fonctions et constantes installés d'office
//! - expression.rs : façade (cache RPN, liaisons, sous-expressions)

pub mod decimal;
pub mod erreur;
pub mod eval;
pub mod expression;
pub mod jetons;
pub mod paresseux;
pub mod racines;
pub mod registre;
pub mod rpn;
pub mod standard;

#[cfg(test)]
mod tests_evaluation;

#[cfg(test)]
mod tests_stats;

#[cfg(test)]
mod tests_fuzz_safe;

pub use decimal::{Decimal, MathContext, RoundingMode};
pub use erreur::{ArithmeticError, Error, ExpressionError, Result};
pub use eval::{eval_avec_liaisons, eval_expression, DemarcheNoyau};
pub use expression::{Expression, VariableValue};
pub use jetons::{Token, TokenKind, Tokenizer};
pub use paresseux::LazyValue;
pub use registre::{Function, Operator, VARIADIQUE};
