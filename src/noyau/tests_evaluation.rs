//! Tests d'évaluation : scénarios complets via la façade `Expression`.
//!
//! Valeurs attendues en écriture simple (`to_plain_string`), zéros de queue
//! retirés, contexte par défaut (7 chiffres, HALF_UP) sauf mention.

use pretty_assertions::assert_eq;

use super::decimal::{Decimal, MathContext, RoundingMode};
use super::erreur::{ArithmeticError, Error};
use super::expression::Expression;
use super::paresseux::LazyValue;
use super::registre::{Function, Operator};

fn ev(expr: &str) -> String {
    ev_expr(&Expression::new(expr))
}

fn ev_p(expr: &str, precision: u32) -> String {
    let mut e = Expression::new(expr);
    e.set_precision(precision);
    ev_expr(&e)
}

/// Journal visible avec `RUST_LOG=debug cargo test -- --nocapture`.
fn journal() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ev_expr(e: &Expression) -> String {
    journal();
    e.eval()
        .unwrap_or_else(|err| panic!("expr={:?} err={err}", e.expression()))
        .map_or_else(|| "null".into(), |d| d.to_plain_string())
}

fn err(expr: &str) -> String {
    match Expression::new(expr).eval() {
        Ok(v) => panic!("expr={expr:?} : erreur attendue, obtenu {v:?}"),
        Err(e) => e.to_string(),
    }
}

/* ------------------------ Arithmétique ------------------------ */

#[test]
fn parentheses() {
    assert_eq!(ev("(1+2)"), "3");
    assert_eq!(ev("((1+2))"), "3");
    assert_eq!(ev("(((1+2)))"), "3");
    assert_eq!(ev("(1+2)*(1+2)"), "9");
    assert_eq!(ev("(1+2)*(1+2)+1"), "10");
    assert_eq!(ev("(1+2)*((1+2)+1)"), "12");
}

#[test]
fn operations_de_base() {
    assert_eq!(ev("1+2"), "3");
    assert_eq!(ev("4/2"), "2");
    assert_eq!(ev("3+4/2"), "5");
    assert_eq!(ev("(3+4)/2"), "3.5");
    assert_eq!(ev("4.2*1.9"), "7.98");
    assert_eq!(ev("8%3"), "2");
    assert_eq!(ev("8%2"), "0");
    assert_eq!(ev("2*.1"), "0.2");
}

#[test]
fn moins_unaire() {
    assert_eq!(ev("-3"), "-3");
    assert_eq!(ev("-SQRT(4)"), "-2");
    assert_eq!(ev("-(5*3+(+10-13))"), "-12");
    assert_eq!(ev("-2+3/4*-1"), "-2.75");
    // l'unaire lie plus fort que ^
    assert_eq!(ev("-3^2"), "9");
    assert_eq!(ev("4^-0.5"), "0.5");
    assert_eq!(ev("-2+3/4"), "-1.25");
    assert_eq!(ev("-(3+-4*-1/-2)"), "-1");
    assert_eq!(ev("2+-.2"), "1.8");
}

#[test]
fn plus_unaire() {
    assert_eq!(ev("+3"), "3");
    assert_eq!(ev("+(3-1+2)"), "4");
    assert_eq!(ev("+(3-(+1)+2)"), "4");
    assert_eq!(ev("+3^2"), "9");
}

#[test]
fn puissances() {
    assert_eq!(ev("2^4"), "16");
    assert_eq!(ev("2^8"), "256");
    assert_eq!(ev("3^2"), "9");
    assert_eq!(ev("2.5^2"), "6.25");
    assert_eq!(ev("2.6^3.5"), "28.34045");
    assert_eq!(ev("2^3^2"), "512");
}

#[test]
fn decimaux_sans_zero_de_tete() {
    assert_eq!(ev("0.1 + .1"), "0.2");
    assert_eq!(ev(".2*.3"), "0.06");
    assert_eq!(ev(".2*.3+.1"), "0.16");
}

#[test]
fn hexadecimal() {
    assert_eq!(ev("0xcafe"), "51966");
    assert_eq!(ev("0XCAFE"), "51966");
    assert_eq!(ev("0xcafe + 0xbabe"), "99772");
    let e = Expression::with_context("0xcafebabe", MathContext::DECIMAL128);
    assert_eq!(ev_expr(&e), "3405691582");

    assert_eq!(err("0x"), "Invalid number '0x'");
    assert!(Expression::new("0xbaby").eval().unwrap_err().is_expression());
}

#[test]
fn exposants_extremes() {
    // échelle hors d'un i32 : littéral refusé, jamais tronqué
    assert_eq!(err("1e4294967296 + 1"), "Invalid number '1e4294967296'");
    assert_eq!(err("1e4294967296 > 1"), "Invalid number '1e4294967296'");
    assert_eq!(
        err("1.5e-9223372036854775807"),
        "Invalid number '1.5e-9223372036854775807'"
    );
    assert_eq!(err("1e2147483647 * 1e2147483647"), "Overflow");
    assert_eq!(err("1e-2147483647 * 1e-2147483647"), "Underflow");

    // dans les bornes : comparaisons et sommes sans aligner les échelles
    assert_eq!(ev("1e2000000000 > 1"), "1");
    assert_eq!(ev("1e-2000000000 < 1"), "1");
    assert_eq!(ev("1e2000000000 - 1 == 1e2000000000"), "1");
    assert_eq!(ev("1e-2000000000 + 1"), "1");
}

#[test]
fn multiplication_implicite() {
    assert_eq!(ev("22(3+1)"), "88");

    let mut e = Expression::new("(a+b)(a-b)");
    e.where_str("a", "1").where_str("b", "2");
    assert_eq!(ev_expr(&e), "-3");

    let mut e = Expression::new("0xA(a+b)");
    e.where_str("a", "1").where_str("b", "2");
    assert_eq!(ev_expr(&e), "30");
}

/* ------------------------ Racines ------------------------ */

#[test]
fn racines_carrees() {
    assert_eq!(ev("SQRT(16)"), "4");
    assert_eq!(ev_p("SQRT(2)", 11), "1.41421356237");
    assert_eq!(ev_p("SQRT(5.8654786)", 11), "2.42187501742");
    assert_eq!(ev("SQRT(5)"), "2.236068");
    assert_eq!(ev("SQRT(9875)"), "99.3730346");
    assert_eq!(ev("SQRT(5.55)"), "2.3558438");
    assert_eq!(ev("SQRT(0)"), "0");
    assert_eq!(err("SQRT(-4)"), "Argument to SQRT() function must not be negative");
}

#[test]
fn racines_niemes() {
    assert_eq!(ev("ROOTN(8,3)"), "2");
    assert_eq!(ev_p("ROOTN(9,3)", 10), "2.0800838231");
    assert_eq!(ev("ROOTN(9,3)"), "2.0800838");
    assert_eq!(ev("ROOTN(225,4)"), "3.8729833");
    assert_eq!(ev_p("ROOTN(225,4)", 13), "3.8729833462074");
    assert_eq!(ev("ROOTN(9,.5)"), "81");
    assert_eq!(err("ROOTN(-9,3)"), "First argument for ROOTN(X,Y) must not be negative");
}

/* ------------------------ Fonctions ------------------------ */

#[test]
fn extremums_et_imbrications() {
    assert_eq!(ev("MAX(-7,8)"), "8");
    assert_eq!(ev("MAX(3,max(4,5))"), "5");
    assert_eq!(ev("MAX(3,max(MAX(9.6,-4.2),Min(5,9)))"), "9.6");
    assert_eq!(ev("MAX(3.78787,3.78786)"), "3.78787");
    assert_eq!(ev("max(3.78786,3.78787)"), "3.78787");
    assert_eq!(ev("MIN(3.78787,3.78786)"), "3.78786");
    assert_eq!(ev("Min(3.78786,3.78787)"), "3.78786");
    assert_eq!(ev("min(1)"), "1");
    assert_eq!(ev("min(1, 2, 3)"), "1");
    assert_eq!(ev("max(3, 2, 1, 4, 5, 6, 7, 8, 9, 0)"), "9");
    assert_eq!(ev("MIN(0, SIN(SIN(COS(23.6))), 0-MAX(3,4,MAX(0,SIN(1))), 10)"), "-4");
}

#[test]
fn extremum_sans_parametre() {
    assert_eq!(err("min()"), "MIN requires at least one parameter");
    assert_eq!(err("MAX()"), "MAX requires at least one parameter");
}

#[test]
fn valeur_absolue_et_arrondis() {
    assert_eq!(ev("aBs(-2.123)"), "2.123");
    assert_eq!(ev("abs(2.123)"), "2.123");
    assert_eq!(ev("round(3.78787,1)"), "3.8");
    assert_eq!(ev("round(3.78787,3)"), "3.788");
    assert_eq!(ev("round(3.7345,3)"), "3.735");
    assert_eq!(ev("round(-3.7345,3)"), "-3.735");
    assert_eq!(ev("round(-3.78787,2)"), "-3.79");
    assert_eq!(ev("round(123.78787,2)"), "123.79");
    assert_eq!(ev("floor(3.78787)"), "3");
    assert_eq!(ev("ceiling(3.78787)"), "4");
    assert_eq!(ev("floor(-2.1)"), "-3");
    assert_eq!(ev("ceiling(-2.1)"), "-2");
}

#[test]
fn trigonometrie_en_degres() {
    assert_eq!(ev("SIN(30)"), "0.5");
    assert_eq!(ev("cos(30)"), "0.8660254");
    assert_eq!(ev("TAN(30)"), "0.5773503");
    assert_eq!(ev("RAD(30)"), "0.5235988");
    assert_eq!(ev("DEG(30)"), "1718.873");
    assert_eq!(ev("atan2(2, 3)"), "33.69007");
    assert_eq!(ev("atan2(2, -3)"), "146.3099");
    assert_eq!(ev("atan2(-2, -3)"), "-146.3099");
    assert_eq!(ev("SEC(60)"), "2");
    assert_eq!(ev("CSC(30)"), "2");
    assert_eq!(ev("COT(45)"), "1");
    assert_eq!(ev("ACOT(30)"), "1.909152");
}

#[test]
fn hyperboliques_et_logarithmes() {
    assert_eq!(ev("SINH(30)"), "5343237000000");
    assert_eq!(ev("TANH(30)"), "1");
    assert_eq!(ev("ACOSH(1)"), "0");
    assert_eq!(ev("ATANH(0)"), "0");
    assert_eq!(ev("ATANH(0.5)"), "0.5493061");
    assert_eq!(ev("ATANH(-0.5)"), "-0.5493061");
    assert_eq!(ev("LOG(10)"), "2.302585");
    assert_eq!(ev("LOG10(1000)"), "3");
    assert_eq!(err("ATANH(1)"), "Number must be |x| < 1");
    assert_eq!(err("ACOSH(0.5)"), "Number must be x >= 1");
    assert_eq!(err("ACOT(0)"), "Number must not be 0");
}

#[test]
fn factorielle_et_aleatoire() {
    assert_eq!(ev("FACT(5)"), "120");
    assert_eq!(ev("FACT(0)"), "1");
    assert_eq!(ev_p("FACT(25)", 0), "15511210043330985984000000");

    for _ in 0..20 {
        let r: Decimal = ev("RANDOM()").parse().unwrap();
        assert!(r >= Decimal::zero() && r <= Decimal::one(), "{r}");
    }
}

/* ------------------------ Booléens ------------------------ */

#[test]
fn comparaisons() {
    assert_eq!(ev("1 < 2"), "1");
    assert_eq!(ev("2 <= 2"), "1");
    assert_eq!(ev("3 > 4"), "0");
    assert_eq!(ev("4 >= 5"), "0");
    assert_eq!(ev("2 = 2.0"), "1");
    assert_eq!(ev("2 == 3"), "0");
    assert_eq!(ev("2 != 3"), "1");
    assert_eq!(ev("2 <> 2"), "0");
    // les comparaisons lient plus fort que && et ||
    assert_eq!(ev("1 < 2 && 3 < 2 || 1"), "1");
    assert_eq!(ev("NOT(1 > 2)"), "1");
    assert_eq!(ev("TRUE && FALSE"), "0");
}

#[test]
fn if_paresseux() {
    assert_eq!(ev("IF(1 > 0, 5, 1/0)"), "5");
    assert_eq!(ev("if(0, 1/0, 7)"), "7");
    assert_eq!(err("IF(1/0, 1, 2)"), "Division by zero");
    assert_eq!(err("IF(NULL, 1, 2)"), "Operand may not be null");
}

#[test]
fn court_circuit_logique() {
    assert_eq!(ev("0 && 1/0"), "0");
    assert_eq!(ev("1 || 1/0"), "1");
    assert_eq!(err("1 && 1/0"), "Division by zero");
}

/* ------------------------ Null ------------------------ */

#[test]
fn null_et_operandes() {
    assert_eq!(Expression::new("null").eval().unwrap(), None);
    assert_eq!(err("null+1"), "First operand may not be null");
    assert_eq!(err("1 + NULL"), "Second operand may not be null");
    assert_eq!(err("round(NULL, 1)"), "First operand may not be null");
    assert_eq!(err("round(1, NulL)"), "Second operand may not be null");
    assert_eq!(ev("NULL == null"), "1");
    assert_eq!(ev("NULL != 1"), "1");
}

/* ------------------------ Contexte ------------------------ */

#[test]
fn precision_et_mode_d_arrondi() {
    assert_eq!(ev_p("2.5/3", 2), "0.83");
    assert_eq!(ev_p("2.5/3", 3), "0.833");
    assert_eq!(ev_p("2.5/3", 8), "0.83333333");

    let mut e = Expression::new("2.5/3");
    e.set_rounding_mode(RoundingMode::Down);
    assert_eq!(ev_expr(&e), "0.8333333");
    e.set_rounding_mode(RoundingMode::Up);
    assert_eq!(ev_expr(&e), "0.8333334");
}

#[test]
fn contexte_illimite() {
    assert_eq!(ev_p("1/8", 0), "0.125");
    let mut e = Expression::new("1/3");
    e.set_math_context(MathContext::UNLIMITED);
    assert_eq!(e.eval().unwrap_err(), Error::from(ArithmeticError::NonTerminating));
}

#[test]
fn zeros_de_queue() {
    let e = Expression::new("200.40000 / 2");
    assert_eq!(e.eval().unwrap().unwrap().to_plain_string(), "100.2");
    assert_eq!(e.eval_with(false).unwrap().unwrap().to_plain_string(), "100.2000");
}

/* ------------------------ Erreurs ------------------------ */

#[test]
fn erreurs_de_syntaxe() {
    assert_eq!(err("12 18 2"), "Too many numbers or variables");
    assert_eq!(err("12 + * 18"), "Unknown unary operator '*' at position 6");
    assert_eq!(err(""), "Empty expression");
    assert_eq!(err("/"), "Unknown unary operator '/' at position 1");
    assert_eq!(err("3/"), "Missing parameter(s) for operator /");
    assert_eq!(err("SIN(MAX(23,45,12))/"), "Missing parameter(s) for operator /");
    assert_eq!(err("min(/)"), "Unknown unary operator '/' at position 5");
    assert_eq!(
        err("SIN(MAX(23,45,12/,23.6))"),
        "Missing parameter(s) for operator / at character position 16"
    );
    assert_eq!(err("SIN(MAX(>=23,45,12,23.6))"), "Unknown unary operator '>=' at position 9");
    assert_eq!(err("unk(1,2,3)"), "Unknown function 'unk' at position 1");
    assert_eq!(err("a |*| b"), "Unknown operator '|*|' at position 3");
    assert_eq!(err("Random(1)"), "Function Random expected 0 parameters, got 1");
    assert_eq!(err("SIN(1, 6)"), "Function SIN expected 1 parameters, got 2");
    assert_eq!(err("2+3,8"), "Unexpected comma at character position 3");
}

#[test]
fn variable_inconnue() {
    assert_eq!(err("sin(a+x)"), "Unknown operator or function: a");
}

#[test]
fn erreurs_classees() {
    assert!(Expression::new("1+").eval().unwrap_err().is_expression());
    assert!(Expression::new("1/0").eval().unwrap_err().is_arithmetic());
}

/* ------------------------ Extensions ------------------------ */

#[test]
fn operateur_ajoute() {
    let mut e = Expression::new("2 >> 3 + 1");
    e.add_operator(Operator::binary(">>", 30, true, false, |a, b| {
        Ok(a.mul(&Decimal::from(10))?.add(&b))
    }));
    // >> lie comme *, donc avant +
    assert_eq!(ev_expr(&e), "24");
}

#[test]
fn fonction_ajoutee() {
    let mut e = Expression::new("average(1, 2, 3, 6)");
    e.add_function(Function::new("AVERAGE", -1, false, |p| {
        let mut somme = Decimal::zero();
        for v in p {
            somme = somme.add(v.as_ref().ok_or(ArithmeticError::NullOperand)?);
        }
        Ok(Some(somme.div(
            &Decimal::from(p.len() as u64),
            MathContext::default(),
        )?))
    }));
    assert_eq!(ev_expr(&e), "3");
}

#[test]
fn fonction_paresseuse_ajoutee() {
    // rend le second paramètre sans jamais forcer le premier
    let mut e = Expression::new("SECOND(1/0, 4) * 2");
    e.add_function(Function::lazy("SECOND", 2, false, |p| {
        Ok(p.get(1).cloned().unwrap_or_else(LazyValue::null))
    }));
    assert_eq!(ev_expr(&e), "8");
}

#[test]
fn remplacement_d_une_fonction_standard() {
    let mut e = Expression::new("sqrt(9)");
    let ancienne = e.add_function(Function::new("SQRT", 1, false, |_| Ok(Some(Decimal::from(42)))));
    assert!(ancienne.is_some());
    assert_eq!(ev_expr(&e), "42");
}
