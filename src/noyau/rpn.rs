// src/noyau/rpn.rs
//
// Shunting-yard -> RPN, puis validation statique des arités.
//
// Règles:
// - littéral / hexa / variable : sortie directe
// - chaîne : empilée (consommée par la fonction englobante)
// - fonction : empilée ; sa parenthèse ouvrante part AUSSI en sortie
//   (marqueur de début de liste de paramètres)
// - "(" juste après une valeur ou ")" : multiplication implicite,
//   "*" empilé tel quel, sans dépilement
// - ")" : dépile jusqu'à "(", puis sort la fonction si elle est au sommet
//
// NOTE:
// - Les positions "at position" sont 1-based, "at character position" 0-based.

use log::{debug, trace};

use super::erreur::ExpressionError;
use super::jetons::{Token, TokenKind};
use super::registre::{Operator, Registre};

type Resultat<T> = Result<T, ExpressionError>;

/// Convertit une suite de jetons en RPN (notation polonaise inversée).
///
/// Exemple:
///   jetons: max ( 1 , 2 ) * 3
///   rpn:    ( 1 2 max 3 *
pub fn to_rpn(jetons: impl IntoIterator<Item = Token>, registre: &Registre) -> Resultat<Vec<Token>> {
    let mut sortie: Vec<Token> = Vec::new();
    let mut pile: Vec<Token> = Vec::new();

    let mut derniere_fonction: Option<Token> = None;
    let mut precedent: Option<Token> = None;

    for token in jetons {
        let kind_prec = precedent.as_ref().map(|p| p.kind);

        match token.kind {
            TokenKind::StringParam => pile.push(token.clone()),

            TokenKind::Literal | TokenKind::HexLiteral | TokenKind::Variable => {
                sortie.push(token.clone())
            }

            TokenKind::Function => {
                pile.push(token.clone());
                derniere_fonction = Some(token.clone());
            }

            TokenKind::Comma => {
                operande_manquant_avant(precedent.as_ref())?;
                depiler_jusqua_parenthese(&mut pile, &mut sortie);
                if pile.is_empty() {
                    return Err(match &derniere_fonction {
                        None => ExpressionError::UnexpectedComma { offset: token.pos },
                        Some(f) => ExpressionError::FunctionParse {
                            function: f.surface.clone(),
                            offset: token.pos,
                        },
                    });
                }
            }

            TokenKind::Operator => {
                if matches!(kind_prec, Some(TokenKind::Comma | TokenKind::OpenParen)) {
                    return Err(ExpressionError::MissingOperandAt {
                        operator: token.surface.clone(),
                        offset: token.pos,
                    });
                }
                let op = registre.operator(&token.key()).ok_or_else(|| {
                    ExpressionError::UnknownOperator {
                        operator: token.surface.clone(),
                        position: token.pos + 1,
                    }
                })?;
                depiler_operateurs(&mut sortie, &mut pile, &op, registre);
                pile.push(token.clone());
            }

            TokenKind::UnaryOperator => {
                let bien_place = matches!(
                    kind_prec,
                    None | Some(TokenKind::Operator | TokenKind::Comma | TokenKind::OpenParen)
                );
                if !bien_place {
                    return Err(ExpressionError::InvalidUnaryPosition {
                        operator: token.key(),
                        offset: token.pos,
                    });
                }
                let op = registre.operator(&token.key()).ok_or_else(|| {
                    ExpressionError::UnknownUnaryOperator {
                        operator: token.surface.clone(),
                        position: token.pos + 1,
                    }
                })?;
                depiler_operateurs(&mut sortie, &mut pile, &op, registre);
                pile.push(token.clone());
            }

            TokenKind::OpenParen => {
                if let Some(p) = &precedent {
                    // 23(a+b), (a+b)(a-b)
                    if p.is_value() {
                        pile.push(Token::new("*", TokenKind::Operator, token.pos));
                    }
                    if p.kind == TokenKind::Function {
                        sortie.push(token.clone());
                    }
                }
                pile.push(token.clone());
            }

            TokenKind::CloseParen => {
                operande_manquant_avant(precedent.as_ref())?;
                depiler_jusqua_parenthese(&mut pile, &mut sortie);
                if pile.pop().is_none() {
                    return Err(ExpressionError::MismatchedParentheses);
                }
                if pile.last().is_some_and(|t| t.kind == TokenKind::Function) {
                    if let Some(f) = pile.pop() {
                        sortie.push(f);
                    }
                }
            }
        }

        precedent = Some(token);
    }

    while let Some(t) = pile.pop() {
        if matches!(t.kind, TokenKind::OpenParen | TokenKind::CloseParen) {
            return Err(ExpressionError::MismatchedParentheses);
        }
        sortie.push(t);
    }

    debug!("rpn: {}", format_rpn(&sortie));
    Ok(sortie)
}

/// Un opérateur binaire juste avant "," ou ")" n'a pas d'opérande droit.
fn operande_manquant_avant(precedent: Option<&Token>) -> Resultat<()> {
    match precedent {
        Some(p) if p.kind == TokenKind::Operator => Err(ExpressionError::MissingOperandAt {
            operator: p.surface.clone(),
            offset: p.pos,
        }),
        _ => Ok(()),
    }
}

fn depiler_jusqua_parenthese(pile: &mut Vec<Token>, sortie: &mut Vec<Token>) {
    while pile.last().is_some_and(|t| t.kind != TokenKind::OpenParen) {
        if let Some(t) = pile.pop() {
            sortie.push(t);
        }
    }
}

/// Sort les opérateurs du sommet qui lient plus fort que `o1`
/// (ou autant, si `o1` est associatif à gauche).
fn depiler_operateurs(sortie: &mut Vec<Token>, pile: &mut Vec<Token>, o1: &Operator, registre: &Registre) {
    while let Some(sommet) = pile.last() {
        if !matches!(sommet.kind, TokenKind::Operator | TokenKind::UnaryOperator) {
            break;
        }
        let Some(o2) = registre.operator(&sommet.key()) else {
            break;
        };
        let p2 = o2.precedence();
        if !((o1.is_left_assoc() && o1.precedence() <= p2) || o1.precedence() < p2) {
            break;
        }
        if let Some(t) = pile.pop() {
            sortie.push(t);
        }
    }
}

/// Vérifie qu'opérateurs et fonctions reçoivent le bon nombre d'opérandes
/// et qu'il reste exactement une valeur.
///
/// Une pile de portées : chaque "(" de fonction ouvre une portée qui compte
/// les valeurs disponibles ; la fonction la referme et compte pour une valeur
/// dans la portée englobante.
pub fn validate(rpn: &[Token], registre: &Registre) -> Resultat<()> {
    let mut portees: Vec<usize> = vec![0];

    for t in rpn {
        trace!("validation {:?} '{}' portées={portees:?}", t.kind, t.surface);
        match t.kind {
            TokenKind::UnaryOperator => {
                if *sommet(&mut portees)? < 1 {
                    return Err(ExpressionError::MissingOperand(t.key()));
                }
            }
            TokenKind::Operator => {
                let n = sommet(&mut portees)?;
                if *n < 2 {
                    return Err(ExpressionError::MissingOperand(t.surface.clone()));
                }
                *n -= 1;
            }
            TokenKind::Function => {
                let f = registre.function(&t.surface).ok_or_else(|| {
                    ExpressionError::UnknownFunction {
                        name: t.surface.clone(),
                        position: t.pos + 1,
                    }
                })?;
                let recus = portees.pop().ok_or(ExpressionError::ScopeExceeded)?;
                if !f.is_variadic() && usize::try_from(f.num_params()) != Ok(recus) {
                    return Err(ExpressionError::ArityMismatch {
                        function: t.surface.clone(),
                        expected: f.num_params(),
                        got: recus,
                    });
                }
                *sommet(&mut portees)? += 1;
            }
            TokenKind::OpenParen => portees.push(0),
            _ => *sommet(&mut portees)? += 1,
        }
    }

    if portees.len() > 1 {
        return Err(ExpressionError::UnhandledParameterLists);
    }
    match sommet(&mut portees)? {
        n if *n > 1 => Err(ExpressionError::TooManyValues),
        0 => Err(ExpressionError::EmptyExpression),
        _ => Ok(()),
    }
}

fn sommet(portees: &mut [usize]) -> Resultat<&mut usize> {
    portees.last_mut().ok_or(ExpressionError::ScopeExceeded)
}

/// RPN en texte : jetons séparés par des espaces, unaires suffixés (`-u`).
pub fn format_rpn(rpn: &[Token]) -> String {
    rpn.iter()
        .map(|t| match t.kind {
            TokenKind::UnaryOperator => t.key(),
            _ => t.surface.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
