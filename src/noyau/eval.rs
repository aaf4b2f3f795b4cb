//! Noyau — évaluation (pipeline réel)
//!
//! texte -> jetons -> RPN (shunting-yard) -> validation -> pile de valeurs
//! différées -> forçage de la dernière valeur.
//!
//! Rien n'est calculé pendant le parcours de la RPN : chaque opérateur ou
//! fonction empile une valeur différée, et c'est le forçage final qui
//! déclenche les calculs réellement nécessaires (IF, &&, || court-circuitent).

use log::trace;

use super::decimal::Decimal;
use super::erreur::{ExpressionError, Result};
use super::expression::Expression;
use super::jetons::{format_tokens, Token, TokenKind};
use super::paresseux::LazyValue;
use super::registre::{Application, Contexte, Registre};

/// Case de la pile d'évaluation.
enum Case {
    Valeur(LazyValue),
    /// Début de la liste de paramètres d'une fonction.
    DebutParametres,
}

fn depiler(pile: &mut Vec<Case>, t: &Token) -> Result<LazyValue> {
    match pile.pop() {
        Some(Case::Valeur(v)) => Ok(v),
        _ => Err(ExpressionError::MissingOperand(t.key()).into()),
    }
}

/// Parcourt une RPN validée et rend la valeur différée du résultat.
pub fn evaluate(rpn: &[Token], registre: &Registre, contexte: &Contexte) -> Result<LazyValue> {
    let mut pile: Vec<Case> = Vec::with_capacity(rpn.len());

    for t in rpn {
        trace!("évaluation {:?} '{}'", t.kind, t.surface);
        let valeur = match t.kind {
            TokenKind::UnaryOperator => {
                let operande = depiler(&mut pile, t)?;
                match operateur(registre, t)? {
                    Application::Unaire(apply) => LazyValue::Unary {
                        apply,
                        operand: Box::new(operande),
                    },
                    Application::Binaire(_) => return Err(operateur_inconnu(t).into()),
                }
            }

            TokenKind::Operator => {
                // ordre de dépilement : droite puis gauche
                let droite = depiler(&mut pile, t)?;
                let gauche = depiler(&mut pile, t)?;
                match operateur(registre, t)? {
                    Application::Binaire(apply) => LazyValue::Binary {
                        apply,
                        left: Box::new(gauche),
                        right: Box::new(droite),
                    },
                    Application::Unaire(_) => return Err(operateur_inconnu(t).into()),
                }
            }

            TokenKind::Variable => {
                if !registre.has_variable(&t.surface) {
                    return Err(ExpressionError::UnknownVariable(t.surface.clone()).into());
                }
                LazyValue::Variable {
                    name: t.surface.clone(),
                    registre: registre.downgrade(),
                    contexte: contexte.clone(),
                }
            }

            TokenKind::Function => {
                let def = registre.function(&t.surface).ok_or_else(|| {
                    ExpressionError::UnknownFunction {
                        name: t.surface.clone(),
                        position: t.pos + 1,
                    }
                })?;
                let mut args = Vec::new();
                while let Some(Case::Valeur(v)) = pile.pop() {
                    args.push(v);
                }
                // le marqueur a été consommé par le `while let`
                args.reverse();
                LazyValue::Function { def, args }
            }

            TokenKind::OpenParen => {
                pile.push(Case::DebutParametres);
                continue;
            }

            TokenKind::Literal => LazyValue::Literal {
                text: t.surface.clone(),
                contexte: contexte.clone(),
            },

            TokenKind::HexLiteral => LazyValue::HexLiteral {
                text: t.surface.clone(),
                contexte: contexte.clone(),
            },

            TokenKind::StringParam => LazyValue::StringParam(t.surface.clone()),

            TokenKind::CloseParen | TokenKind::Comma => {
                return Err(ExpressionError::UnexpectedToken {
                    surface: t.surface.clone(),
                    offset: t.pos,
                }
                .into())
            }
        };
        pile.push(Case::Valeur(valeur));
    }

    match pile.pop() {
        Some(Case::Valeur(v)) => Ok(v),
        _ => Err(ExpressionError::EmptyExpression.into()),
    }
}

fn operateur(registre: &Registre, t: &Token) -> Result<Application> {
    registre
        .operator(&t.key())
        .map(|op| op.application().clone())
        .ok_or_else(|| operateur_inconnu(t).into())
}

fn operateur_inconnu(t: &Token) -> ExpressionError {
    match t.kind {
        TokenKind::UnaryOperator => ExpressionError::UnknownUnaryOperator {
            operator: t.surface.clone(),
            position: t.pos + 1,
        },
        _ => ExpressionError::UnknownOperator {
            operator: t.surface.clone(),
            position: t.pos + 1,
        },
    }
}

/* ------------------------ Démarche (front-end) ------------------------ */

#[derive(Default, Clone, Debug)]
pub struct DemarcheNoyau {
    pub jetons: String,
    pub rpn: String,
    pub contexte: String,
    pub note: String,
}

/// API publique : évalue une expression à `digits` chiffres significatifs et retourne:
/// - le résultat (texte simple, "null" si pas de valeur)
/// - la démarche (jetons, rpn, contexte)
pub fn eval_expression(expr_str: &str, digits: u32) -> Result<(String, DemarcheNoyau)> {
    eval_avec_liaisons::<&str>(expr_str, digits, &[])
}

/// Comme `eval_expression`, après avoir lié chaque `(nom, texte)` :
/// un texte numérique donne un nombre, tout autre texte une sous-expression.
pub fn eval_avec_liaisons<S: AsRef<str>>(
    expr_str: &str,
    digits: u32,
    liaisons: &[(S, S)],
) -> Result<(String, DemarcheNoyau)> {
    let mut e = Expression::new(expr_str);
    e.set_precision(digits);
    for (nom, texte) in liaisons {
        e.set_variable(nom.as_ref(), texte.as_ref());
    }

    let jetons: Vec<Token> = e.tokenizer().collect();
    let rpn = e.to_rpn()?;
    let resultat = e.eval()?;

    let d = DemarcheNoyau {
        jetons: format_tokens(&jetons),
        rpn,
        contexte: format!("{:?}", e.math_context()),
        note: if e.is_boolean()? {
            "Expression booléenne (1 = vrai, 0 = faux).".into()
        } else {
            "Pipeline : jetons → RPN (shunting-yard) → validation → valeurs différées → forçage."
                .into()
        },
    };

    Ok((texte_resultat(resultat.as_ref()), d))
}

/// Résultat en écriture simple, "null" pour l'absence de valeur.
pub fn texte_resultat(v: Option<&Decimal>) -> String {
    v.map_or_else(|| "null".to_string(), Decimal::to_plain_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pipeline_complet() {
        let (r, d) = eval_expression("2*(3+4)", 7).unwrap();
        assert_eq!(r, "14");
        assert_eq!(d.jetons, "2 * ( 3 + 4 )");
        assert_eq!(d.rpn, "2 3 4 + *");
    }

    #[test]
    fn resultat_null() {
        let (r, _) = eval_expression("null", 7).unwrap();
        assert_eq!(r, "null");
    }

    #[test]
    fn precision_demandee() {
        let (r, _) = eval_expression("1/3", 3).unwrap();
        assert_eq!(r, "0.333");
    }

    #[test]
    fn liaisons() {
        let (r, d) = eval_avec_liaisons("x * y", 7, &[("x", "3"), ("y", "x + 1")]).unwrap();
        assert_eq!(r, "12");
        assert_eq!(d.rpn, "x x 1 + *");

        let (r, d) = eval_avec_liaisons("x > 2", 7, &[("x", "3")]).unwrap();
        assert_eq!(r, "1");
        assert!(d.note.contains("booléenne"));
    }

    #[test]
    fn erreurs_remontees() {
        assert!(eval_expression("1/0", 7).unwrap_err().is_arithmetic());
        assert!(eval_expression("1+", 7).unwrap_err().is_expression());
    }
}
