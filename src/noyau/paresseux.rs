// src/noyau/paresseux.rs
//
// Valeurs différées : rien n'est calculé avant `force()`.
// `force()` rend `Ok(None)` pour « pas de valeur » (null) ; seule une
// opération arithmétique qui reçoit un null lève une erreur.

use log::debug;
use num_bigint::BigInt;
use std::fmt;
use std::rc::Rc;

use super::decimal::{Decimal, MathContext};
use super::erreur::{ExpressionError, Result};
use super::expression::Expression;
use super::registre::{
    ApplicationBinaire, ApplicationUnaire, Contexte, Function, RegistreFaible,
};

#[derive(Clone)]
pub enum LazyValue {
    /// Valeur déjà connue (`None` = null).
    Constant(Option<Decimal>),

    /// Littéral décimal, lu et arrondi au contexte courant au forçage.
    Literal { text: String, contexte: Contexte },

    /// Littéral `0x…`, lu en base 16 au forçage.
    HexLiteral { text: String, contexte: Contexte },

    /// Référence par nom : la liaison est relue à chaque forçage.
    /// Poignée faible : une valeur liée peut capturer les mêmes tables.
    Variable {
        name: String,
        registre: RegistreFaible,
        contexte: Contexte,
    },

    Unary {
        apply: Rc<ApplicationUnaire>,
        operand: Box<LazyValue>,
    },

    Binary {
        apply: Rc<ApplicationBinaire>,
        left: Box<LazyValue>,
        right: Box<LazyValue>,
    },

    Function {
        def: Rc<Function>,
        args: Vec<LazyValue>,
    },

    /// Chaîne entre guillemets : n'a pas de valeur numérique.
    StringParam(String),

    /// Texte d'expression évalué dans les tables de l'expression parente.
    SubExpression {
        text: String,
        registre: RegistreFaible,
        mc: MathContext,
    },
}

impl LazyValue {
    pub fn null() -> Self {
        LazyValue::Constant(None)
    }

    pub fn force(&self) -> Result<Option<Decimal>> {
        match self {
            LazyValue::Constant(v) => Ok(v.clone()),

            LazyValue::Literal { text, contexte } => {
                let d: Decimal = text.parse()?;
                Ok(Some(d.round(contexte.get())?))
            }

            LazyValue::HexLiteral { text, contexte } => {
                let chiffres = text.get(2..).unwrap_or_default();
                let n = BigInt::parse_bytes(chiffres.as_bytes(), 16)
                    .ok_or_else(|| ExpressionError::InvalidNumber(text.clone()))?;
                Ok(Some(Decimal::from(n).round(contexte.get())?))
            }

            LazyValue::Variable {
                name,
                registre,
                contexte,
            } => {
                let liaison = registre
                    .upgrade()?
                    .variable(name)
                    .ok_or_else(|| ExpressionError::UnknownVariable(name.clone()))?;
                let mc = contexte.get();
                Ok(liaison.force()?.map(|d| d.round(mc)).transpose()?)
            }

            LazyValue::Unary { apply, operand } => apply(&**operand),

            LazyValue::Binary { apply, left, right } => apply(&**left, &**right),

            LazyValue::Function { def, args } => def.apply(args)?.force(),

            LazyValue::StringParam(_) => Ok(None),

            LazyValue::SubExpression { text, registre, mc } => {
                debug!("évaluation imbriquée de '{text}'");
                Expression::nested(text, registre.upgrade()?, *mc).eval()
            }
        }
    }

    /// Texte porté par la valeur : nom de variable, contenu de chaîne,
    /// texte de sous-expression ou de littéral. `None` pour un calcul.
    pub fn text(&self) -> Option<String> {
        match self {
            LazyValue::Constant(v) => v.as_ref().map(Decimal::to_plain_string),
            LazyValue::Literal { text, .. }
            | LazyValue::HexLiteral { text, .. }
            | LazyValue::StringParam(text)
            | LazyValue::SubExpression { text, .. } => Some(text.clone()),
            LazyValue::Variable { name, .. } => Some(name.clone()),
            LazyValue::Unary { .. } | LazyValue::Binary { .. } | LazyValue::Function { .. } => None,
        }
    }

    /// Texte de la sous-expression, si la valeur en est une.
    pub fn sub_expression(&self) -> Option<&str> {
        match self {
            LazyValue::SubExpression { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl From<Decimal> for LazyValue {
    fn from(d: Decimal) -> Self {
        LazyValue::Constant(Some(d))
    }
}

impl From<Option<Decimal>> for LazyValue {
    fn from(d: Option<Decimal>) -> Self {
        LazyValue::Constant(d)
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyValue::Constant(Some(d)) => write!(f, "Constant({d})"),
            LazyValue::Constant(None) => f.write_str("Constant(null)"),
            LazyValue::Literal { text, .. } => write!(f, "Literal({text})"),
            LazyValue::HexLiteral { text, .. } => write!(f, "HexLiteral({text})"),
            LazyValue::Variable { name, .. } => write!(f, "Variable({name})"),
            LazyValue::Unary { operand, .. } => write!(f, "Unary({operand:?})"),
            LazyValue::Binary { left, right, .. } => write!(f, "Binary({left:?}, {right:?})"),
            LazyValue::Function { def, args } => write!(f, "{}({args:?})", def.name()),
            LazyValue::StringParam(s) => write!(f, "StringParam({s:?})"),
            LazyValue::SubExpression { text, .. } => write!(f, "SubExpression({text:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noyau::registre::Registre;
    use std::cell::Cell;

    fn ctx(p: u32) -> Contexte {
        Rc::new(Cell::new(MathContext::with_precision(p)))
    }

    #[test]
    fn litteraux_arrondis_au_forcage() {
        let c = ctx(3);
        let v = LazyValue::Literal {
            text: "3.14159".into(),
            contexte: c.clone(),
        };
        assert_eq!(v.force().unwrap().unwrap().to_string(), "3.14");

        // le contexte est relu à chaque forçage
        c.set(MathContext::with_precision(5));
        assert_eq!(v.force().unwrap().unwrap().to_string(), "3.1416");
    }

    #[test]
    fn hexadecimal() {
        let v = LazyValue::HexLiteral {
            text: "0xcafe".into(),
            contexte: ctx(7),
        };
        assert_eq!(v.force().unwrap().unwrap().to_string(), "51966");

        let vide = LazyValue::HexLiteral {
            text: "0x".into(),
            contexte: ctx(7),
        };
        assert!(vide.force().is_err());
    }

    fn variable(r: &Registre) -> LazyValue {
        LazyValue::Variable {
            name: "a".into(),
            registre: r.downgrade(),
            contexte: ctx(7),
        }
    }

    #[test]
    fn variable_relue() {
        let r = Registre::new();
        let v = variable(&r);
        assert!(v.force().is_err());

        r.set_variable("A", Decimal::from(2).into());
        assert_eq!(v.force().unwrap(), Some(Decimal::from(2)));
        r.set_variable("a", LazyValue::null());
        assert_eq!(v.force().unwrap(), None);
    }

    #[test]
    fn textes() {
        assert_eq!(LazyValue::StringParam("X".into()).text().as_deref(), Some("X"));
        assert_eq!(LazyValue::null().text(), None);
        assert_eq!(LazyValue::StringParam("X".into()).force().unwrap(), None);
    }

    #[test]
    fn variable_sans_cycle() {
        let r = Registre::new();
        // la valeur liée à `a` renvoie à `a` elle-même
        r.set_variable("a", variable(&r));
        let faible = r.downgrade();
        drop(r);
        assert_eq!(
            faible.upgrade().err(),
            Some(ExpressionError::DetachedTables.into())
        );
    }

    #[test]
    fn variable_detachee() {
        let r = Registre::new();
        let v = variable(&r);
        drop(r);
        assert_eq!(
            v.force().unwrap_err(),
            ExpressionError::DetachedTables.into()
        );
    }
}
