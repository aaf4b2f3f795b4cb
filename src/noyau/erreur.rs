// src/noyau/erreur.rs
//
// Deux familles d'erreurs disjointes :
// - ExpressionError : syntaxe / sémantique (levée au parsing ou à la validation statique)
// - ArithmeticError : levée paresseusement, au moment où une valeur est forcée
//
// Les messages sont stables : ils sont comparés tels quels dans les tests.

use thiserror::Error;

/// Erreurs de syntaxe ou de sémantique.
///
/// Les positions `position` sont 1-based (message "at position"),
/// les positions `offset` sont 0-based (message "at character position").
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("Unknown operator '{operator}' at position {position}")]
    UnknownOperator { operator: String, position: usize },

    #[error("Unknown unary operator '{operator}' at position {position}")]
    UnknownUnaryOperator { operator: String, position: usize },

    #[error("Unknown function '{name}' at position {position}")]
    UnknownFunction { name: String, position: usize },

    /// Variable sans liaison rencontrée pendant l'évaluation.
    #[error("Unknown operator or function: {0}")]
    UnknownVariable(String),

    #[error("Missing parameter(s) for operator {0}")]
    MissingOperand(String),

    #[error("Missing parameter(s) for operator {operator} at character position {offset}")]
    MissingOperandAt { operator: String, offset: usize },

    #[error("Invalid position for unary operator {operator} at character position {offset}")]
    InvalidUnaryPosition { operator: String, offset: usize },

    #[error("Mismatched parentheses")]
    MismatchedParentheses,

    #[error("Unexpected comma at character position {offset}")]
    UnexpectedComma { offset: usize },

    #[error("Parse error for function '{function}' at character position {offset}")]
    FunctionParse { function: String, offset: usize },

    #[error("Function {function} expected {expected} parameters, got {got}")]
    ArityMismatch {
        function: String,
        expected: i32,
        got: usize,
    },

    #[error("Too many function calls, maximum scope exceeded")]
    ScopeExceeded,

    #[error("Too many unhandled function parameter lists")]
    UnhandledParameterLists,

    #[error("Too many numbers or variables")]
    TooManyValues,

    #[error("Empty expression")]
    EmptyExpression,

    #[error("Unexpected token '{surface}' at character position {offset}")]
    UnexpectedToken { surface: String, offset: usize },

    /// Littéral décimal ou hexadécimal mal formé.
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    /// Sous-expression forcée après la disparition de l'expression qui la portait.
    #[error("Expression tables are no longer available")]
    DetachedTables,

    /// Erreur libre levée par une fonction du catalogue (ex: MIN sans paramètre).
    #[error("{0}")]
    Function(String),
}

/// Erreurs arithmétiques, levées seulement quand la valeur fautive est forcée.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    #[error("Operand may not be null")]
    NullOperand,

    #[error("First operand may not be null")]
    NullFirstOperand,

    #[error("Second operand may not be null")]
    NullSecondOperand,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Non-terminating decimal expansion; no exact representable decimal result.")]
    NonTerminating,

    #[error("Infinite or NaN")]
    NotFinite,

    #[error("Overflow")]
    Overflow,

    /// Échelle trop grande : valeur trop proche de zéro pour être représentée.
    #[error("Underflow")]
    Underflow,

    /// Itération de Newton arrêtée sans atteindre la tolérance.
    #[error("{0} did not converge")]
    NoConvergence(&'static str),

    #[error("Invalid operation")]
    InvalidOperation,

    /// Argument hors domaine (racine d'un négatif, |x| >= 1 pour ATANH, ...).
    #[error("{0}")]
    Domain(String),
}

/// Erreur publique du noyau.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl Error {
    /// Vrai pour une erreur de syntaxe / sémantique (détectée sans rien évaluer).
    pub fn is_expression(&self) -> bool {
        matches!(self, Error::Expression(_))
    }

    /// Vrai pour une erreur arithmétique (levée au forçage).
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Error::Arithmetic(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
