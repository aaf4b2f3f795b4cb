// src/noyau/standard.rs
//
// Jeu standard installé dans toute nouvelle expression :
// opérateurs, catalogue de fonctions, constantes.
//
// Les fermetures capturent le contexte partagé (relu à chaque application)
// et, pour les fonctions de liste, une poignée faible sur les tables.

use log::debug;
use num_bigint::BigInt;

use super::decimal::{Decimal, MathContext, RoundingMode};
use super::erreur::{ArithmeticError, ExpressionError, Result};
use super::expression::Expression;
use super::paresseux::LazyValue;
use super::racines::{puissance, racine_carree, racine_nieme};
use super::registre::{Contexte, Function, Operator, Registre, RegistreFaible, VARIADIQUE};

/* ------------------------ Précédences ------------------------ */

pub const PRECEDENCE_OU: i32 = 2;
pub const PRECEDENCE_ET: i32 = 4;
pub const PRECEDENCE_EGALITE: i32 = 7;
pub const PRECEDENCE_COMPARAISON: i32 = 10;
pub const PRECEDENCE_ADDITIVE: i32 = 20;
pub const PRECEDENCE_MULTIPLICATIVE: i32 = 30;
pub const PRECEDENCE_PUISSANCE: i32 = 40;
pub const PRECEDENCE_UNAIRE: i32 = 60;

/* ------------------------ Constantes ------------------------ */

pub const PI: &str = "3.1415926535897932384626433832795028841971693993751058209749445923078164062862089986280348253421170679";
pub const E: &str = "2.71828182845904523536028747135266249775724709369995957496696762772407663";
pub const PHI: &str = "1.61803398874989484820458683436563811772030917980576286213544862270526046281890244970720720418939113";
pub const SQ2: &str = "1.4142135623730950488016887242096980785696718753769480731766797379907324784621070388503875343276415727";
pub const SQ3: &str = "1.7320508075688772935274463415058723669428052538103806280558069794519330169088000370811461867572485756";
pub const SQ5: &str = "2.2360679774997896964091736687312762354406183596115257242708972454105209256378048994144144083787822749";

/// Installe opérateurs, fonctions et constantes dans `registre`.
pub fn installer(registre: &Registre, contexte: &Contexte) {
    operateurs(registre, contexte);
    fonctions(registre, contexte);
    statistiques(registre, contexte);
    constantes(registre, contexte);
    debug!(
        "jeu standard installé : {} opérateurs, {} fonctions",
        registre.operateurs.borrow().len(),
        registre.fonctions.borrow().len()
    );
}

/* ------------------------ Outils ------------------------ */

fn booleen(b: bool) -> Decimal {
    if b {
        Decimal::one()
    } else {
        Decimal::zero()
    }
}

fn operande(p: &[Option<Decimal>]) -> Result<&Decimal> {
    p.first()
        .and_then(Option::as_ref)
        .ok_or_else(|| ArithmeticError::NullOperand.into())
}

fn operandes(p: &[Option<Decimal>]) -> Result<(&Decimal, &Decimal)> {
    let a = p
        .first()
        .and_then(Option::as_ref)
        .ok_or(ArithmeticError::NullFirstOperand)?;
    let b = p
        .get(1)
        .and_then(Option::as_ref)
        .ok_or(ArithmeticError::NullSecondOperand)?;
    Ok((a, b))
}

/// Flottant converti exactement (binaire IEEE), puis arrondi au contexte.
fn depuis_flottant(x: f64, mc: MathContext) -> Result<Decimal> {
    let d = Decimal::from_f64(x).ok_or(ArithmeticError::NotFinite)?;
    Ok(d.round(mc)?)
}

fn domaine(message: &str) -> ArithmeticError {
    ArithmeticError::Domain(message.to_string())
}

/* ------------------------ Opérateurs ------------------------ */

fn egal(a: Option<Decimal>, b: Option<Decimal>) -> Result<Option<Decimal>> {
    let r = match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    Ok(Some(booleen(r)))
}

fn different(a: Option<Decimal>, b: Option<Decimal>) -> Result<Option<Decimal>> {
    let r = match (a, b) {
        (None, None) => false,
        (Some(a), Some(b)) => a != b,
        _ => true,
    };
    Ok(Some(booleen(r)))
}

fn operateurs(r: &Registre, contexte: &Contexte) {
    let c = contexte.clone();
    r.add_operator(Operator::binary("+", PRECEDENCE_ADDITIVE, true, false, move |a, b| {
        Ok(a.add_ctx(&b, c.get())?)
    }));
    let c = contexte.clone();
    r.add_operator(Operator::binary("-", PRECEDENCE_ADDITIVE, true, false, move |a, b| {
        Ok(a.sub_ctx(&b, c.get())?)
    }));
    let c = contexte.clone();
    r.add_operator(Operator::binary("*", PRECEDENCE_MULTIPLICATIVE, true, false, move |a, b| {
        Ok(a.mul_ctx(&b, c.get())?)
    }));
    let c = contexte.clone();
    r.add_operator(Operator::binary("/", PRECEDENCE_MULTIPLICATIVE, true, false, move |a, b| {
        Ok(a.div(&b, c.get())?)
    }));
    let c = contexte.clone();
    r.add_operator(Operator::binary("%", PRECEDENCE_MULTIPLICATIVE, true, false, move |a, b| {
        Ok(a.rem(&b, c.get())?)
    }));
    let c = contexte.clone();
    r.add_operator(Operator::binary("^", PRECEDENCE_PUISSANCE, false, false, move |a, b| {
        Ok(puissance(&a, &b, c.get())?)
    }));

    // court-circuit : l'opérande droit n'est forcé que si nécessaire
    r.add_operator(Operator::lazy_binary("&&", PRECEDENCE_ET, false, true, |a, b| {
        let gauche = a.force()?.ok_or(ArithmeticError::NullFirstOperand)?;
        if gauche.is_zero() {
            return Ok(Some(Decimal::zero()));
        }
        let droite = b.force()?.ok_or(ArithmeticError::NullSecondOperand)?;
        Ok(Some(booleen(!droite.is_zero())))
    }));
    r.add_operator(Operator::lazy_binary("||", PRECEDENCE_OU, false, true, |a, b| {
        let gauche = a.force()?.ok_or(ArithmeticError::NullFirstOperand)?;
        if !gauche.is_zero() {
            return Ok(Some(Decimal::one()));
        }
        let droite = b.force()?.ok_or(ArithmeticError::NullSecondOperand)?;
        Ok(Some(booleen(!droite.is_zero())))
    }));

    r.add_operator(Operator::binary(">", PRECEDENCE_COMPARAISON, false, true, |a, b| {
        Ok(booleen(a > b))
    }));
    r.add_operator(Operator::binary(">=", PRECEDENCE_COMPARAISON, false, true, |a, b| {
        Ok(booleen(a >= b))
    }));
    r.add_operator(Operator::binary("<", PRECEDENCE_COMPARAISON, false, true, |a, b| {
        Ok(booleen(a < b))
    }));
    r.add_operator(Operator::binary("<=", PRECEDENCE_COMPARAISON, false, true, |a, b| {
        Ok(booleen(a <= b))
    }));

    r.add_operator(Operator::nullable_binary("=", PRECEDENCE_EGALITE, false, true, egal));
    r.add_operator(Operator::nullable_binary("==", PRECEDENCE_EGALITE, false, true, egal));
    r.add_operator(Operator::nullable_binary("!=", PRECEDENCE_EGALITE, false, true, different));
    r.add_operator(Operator::binary("<>", PRECEDENCE_EGALITE, false, true, |a, b| {
        Ok(booleen(a != b))
    }));

    r.add_operator(Operator::unary("-", PRECEDENCE_UNAIRE, false, |a| Ok(-a)));
    r.add_operator(Operator::unary("+", PRECEDENCE_UNAIRE, false, |a| Ok(a)));
}

/* ------------------------ Fonctions ------------------------ */

/// Fonction d'un paramètre calculée en flottant.
fn flottante(
    r: &Registre,
    contexte: &Contexte,
    nom: &str,
    f: impl Fn(f64) -> Result<f64> + 'static,
) {
    let c = contexte.clone();
    r.add_function(Function::new(nom, 1, false, move |p| {
        let x = operande(p)?.to_f64();
        depuis_flottant(f(x)?, c.get()).map(Some)
    }));
}

fn extremum(nom: &'static str, garder: fn(&Decimal, &Decimal) -> bool) -> Function {
    Function::new(nom, VARIADIQUE, false, move |p| {
        let mut retenu: Option<&Decimal> = None;
        for v in p {
            let v = v.as_ref().ok_or(ArithmeticError::NullOperand)?;
            if retenu.map_or(true, |m| garder(v, m)) {
                retenu = Some(v);
            }
        }
        match retenu {
            Some(v) => Ok(Some(v.clone())),
            None => Err(ExpressionError::Function(format!(
                "{nom} requires at least one parameter"
            ))
            .into()),
        }
    })
}

fn fonctions(r: &Registre, contexte: &Contexte) {
    r.add_function(Function::new("FACT", 1, false, |p| {
        let n = operande(p)?.to_i64().ok_or(ArithmeticError::Overflow)?;
        let produit: BigInt = (1..=n).map(BigInt::from).product();
        Ok(Some(Decimal::from(produit)))
    }));

    r.add_function(Function::new("NOT", 1, true, |p| {
        Ok(Some(booleen(operande(p)?.is_zero())))
    }));

    // seule la branche retenue sera forcée
    r.add_function(Function::lazy("IF", 3, false, |p| {
        let [condition, alors, sinon] = p else {
            return Err(ExpressionError::ArityMismatch {
                function: "IF".into(),
                expected: 3,
                got: p.len(),
            }
            .into());
        };
        let condition = condition.force()?.ok_or(ArithmeticError::NullOperand)?;
        Ok(if condition.is_zero() {
            sinon.clone()
        } else {
            alors.clone()
        })
    }));

    let c = contexte.clone();
    r.add_function(Function::new("RANDOM", 0, false, move |_| {
        depuis_flottant(rand::random::<f64>(), c.get()).map(Some)
    }));

    // angles en degrés
    let simples: [(&str, fn(f64) -> f64); 20] = [
        ("SIN", |x| x.to_radians().sin()),
        ("COS", |x| x.to_radians().cos()),
        ("TAN", |x| x.to_radians().tan()),
        ("ASIN", |x| x.asin().to_degrees()),
        ("ACOS", |x| x.acos().to_degrees()),
        ("ATAN", |x| x.atan().to_degrees()),
        ("SINH", f64::sinh),
        ("COSH", f64::cosh),
        ("TANH", f64::tanh),
        ("SEC", |x| 1.0 / x.to_radians().cos()),
        ("CSC", |x| 1.0 / x.to_radians().sin()),
        ("SECH", |x| 1.0 / x.cosh()),
        ("CSCH", |x| 1.0 / x.sinh()),
        ("COT", |x| 1.0 / x.to_radians().tan()),
        ("COTH", |x| 1.0 / x.tanh()),
        ("ASINH", |x| (x + (x * x + 1.0).sqrt()).ln()),
        ("RAD", f64::to_radians),
        ("DEG", f64::to_degrees),
        ("LOG", f64::ln),
        ("LOG10", f64::log10),
    ];
    for (nom, f) in simples {
        flottante(r, contexte, nom, move |x| Ok(f(x)));
    }

    flottante(r, contexte, "ACOT", |x| {
        if x == 0.0 {
            return Err(domaine("Number must not be 0").into());
        }
        Ok((1.0 / x).atan().to_degrees())
    });
    flottante(r, contexte, "ACOSH", |x| {
        if x < 1.0 {
            return Err(domaine("Number must be x >= 1").into());
        }
        Ok((x + (x * x - 1.0).sqrt()).ln())
    });
    flottante(r, contexte, "ATANH", |x| {
        if x.abs() >= 1.0 {
            return Err(domaine("Number must be |x| < 1").into());
        }
        Ok(0.5 * ((1.0 + x) / (1.0 - x)).ln())
    });

    let c = contexte.clone();
    r.add_function(Function::new("ATAN2", 2, false, move |p| {
        let (y, x) = operandes(p)?;
        depuis_flottant(y.to_f64().atan2(x.to_f64()).to_degrees(), c.get()).map(Some)
    }));

    r.add_function(extremum("MAX", |v, m| v > m));
    r.add_function(extremum("MIN", |v, m| v < m));

    let c = contexte.clone();
    r.add_function(Function::new("ABS", 1, false, move |p| {
        Ok(Some(operande(p)?.abs_ctx(c.get())?))
    }));

    let c = contexte.clone();
    r.add_function(Function::new("ROUND", 2, false, move |p| {
        let (x, echelle) = operandes(p)?;
        let echelle = echelle.to_i64().ok_or(ArithmeticError::Overflow)?;
        Ok(Some(x.set_scale(echelle, c.get().rounding)?))
    }));
    r.add_function(Function::new("FLOOR", 1, false, |p| {
        Ok(Some(operande(p)?.set_scale(0, RoundingMode::Floor)?))
    }));
    r.add_function(Function::new("CEILING", 1, false, |p| {
        Ok(Some(operande(p)?.set_scale(0, RoundingMode::Ceiling)?))
    }));

    let c = contexte.clone();
    r.add_function(Function::new("SQRT", 1, false, move |p| {
        Ok(Some(racine_carree(operande(p)?, c.get())?))
    }));
    let c = contexte.clone();
    r.add_function(Function::new("ROOTN", 2, false, move |p| {
        let (x, n) = operandes(p)?;
        Ok(Some(racine_nieme(x, n, c.get())?))
    }));
}

/* ------------------------ Fonctions de liste ------------------------ */

/// Valeurs de la liste nommée par le paramètre (nom de variable ou chaîne) :
/// le texte lié à la variable, découpé sur les virgules.
fn liste(tables: &RegistreFaible, param: Option<&LazyValue>) -> Result<Vec<Decimal>> {
    let nom = param
        .and_then(LazyValue::text)
        .ok_or(ArithmeticError::NullOperand)?;
    let liaison = tables
        .upgrade()?
        .variable(&nom)
        .ok_or_else(|| ExpressionError::UnknownVariable(nom.clone()))?;

    let texte = liaison.text().unwrap_or_default();
    let mut morceaux: Vec<&str> = texte.split(',').collect();
    while morceaux.last().is_some_and(|m| m.is_empty()) {
        morceaux.pop();
    }
    morceaux
        .iter()
        .map(|m| -> Result<Decimal> { Ok(m.trim().parse()?) })
        .collect()
}

fn liste_non_vide(tables: &RegistreFaible, param: Option<&LazyValue>) -> Result<Vec<Decimal>> {
    let valeurs = liste(tables, param)?;
    if valeurs.is_empty() {
        return Err(domaine("Array length cannot be zero").into());
    }
    Ok(valeurs)
}

/// Réévalue `texte` dans une expression neuve où `X` désigne `valeurs`.
fn sur_liste(texte: &str, valeurs: &[Decimal], mc: MathContext) -> Result<Decimal> {
    Expression::with_context(texte, mc)
        .where_list("X", valeurs)
        .eval()?
        .ok_or_else(|| ArithmeticError::NullOperand.into())
}

fn statistiques(r: &Registre, contexte: &Contexte) {
    let tables = r.downgrade();
    r.add_function(Function::lazy("SUM", 1, false, move |p| {
        let somme = liste(&tables, p.first())?
            .iter()
            .fold(Decimal::zero(), |acc, v| acc.add(v));
        Ok(somme.into())
    }));

    let tables = r.downgrade();
    let c = contexte.clone();
    r.add_function(Function::lazy("MEAN", 1, false, move |p| {
        let valeurs = liste_non_vide(&tables, p.first())?;
        let mc = c.get();
        let somme = sur_liste("SUM(X)", &valeurs, mc)?;
        let n = Decimal::from(valeurs.len() as u64);
        Ok(somme.div(&n, mc)?.into())
    }));

    let tables = r.downgrade();
    let c = contexte.clone();
    r.add_function(Function::lazy("VARIANCE", 1, false, move |p| {
        let valeurs = liste_non_vide(&tables, p.first())?;
        let mc = c.get();
        let moyenne = sur_liste("MEAN(X)", &valeurs, mc)?;
        let carres = valeurs
            .iter()
            .map(|v| v.sub(&moyenne).pow_int(2, mc))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sur_liste("MEAN(X)", &carres, mc)?.into())
    }));

    let tables = r.downgrade();
    let c = contexte.clone();
    r.add_function(Function::lazy("STDDEV", 1, false, move |p| {
        let valeurs = liste_non_vide(&tables, p.first())?;
        let mc = c.get();
        let variance = sur_liste("VARIANCE(X)", &valeurs, mc)?;
        let ecart_type = Expression::with_context("SQRT(X)", mc)
            .where_decimal("X", variance)
            .eval()?;
        Ok(ecart_type.into())
    }));
}

/* ------------------------ Variables prédéfinies ------------------------ */

fn constantes(r: &Registre, contexte: &Contexte) {
    for (nom, texte) in [
        ("e", E),
        ("PI", PI),
        ("PHI", PHI),
        ("sq2", SQ2),
        ("sq3", SQ3),
        ("sq5", SQ5),
    ] {
        r.set_variable(
            nom,
            LazyValue::Literal {
                text: texte.to_string(),
                contexte: contexte.clone(),
            },
        );
    }
    r.set_variable("NULL", LazyValue::null());
    r.set_variable("TRUE", Decimal::one().into());
    r.set_variable("FALSE", Decimal::zero().into());
}
