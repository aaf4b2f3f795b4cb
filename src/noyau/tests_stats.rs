//! Fonctions de liste : SUM, MEAN, VARIANCE, STDDEV.
//!
//! La liste est liée par nom (`where_list`, ou un texte `a, b, c`) ;
//! le paramètre est ce nom, en variable ou entre guillemets.

use pretty_assertions::assert_eq;

use super::decimal::Decimal;
use super::expression::Expression;

fn valeurs(v: &[i64]) -> Vec<Decimal> {
    v.iter().copied().map(Decimal::from).collect()
}

fn sur_liste(expr: &str, v: &[i64]) -> String {
    let mut e = Expression::new(expr);
    e.where_list("X", &valeurs(v));
    e.eval()
        .unwrap_or_else(|err| panic!("expr={expr:?} err={err}"))
        .map_or_else(|| "null".into(), |d| d.to_plain_string())
}

#[test]
fn somme() {
    assert_eq!(sur_liste("SUM(X)", &[1, 2, 3, 4]), "10");
    assert_eq!(sur_liste("sum(\"X\")", &[1, 2, 3, 4]), "10");
    assert_eq!(sur_liste("SUM(X)", &[]), "0");
}

#[test]
fn moyenne() {
    assert_eq!(sur_liste("MEAN(X)", &[1, 2, 3, 4]), "2.5");
    assert_eq!(sur_liste("Mean(X) * 2", &[1, 2, 3, 4]), "5");
}

#[test]
fn variance_et_ecart_type() {
    assert_eq!(sur_liste("VARIANCE(X)", &[1, 2, 3, 4]), "1.25");
    assert_eq!(sur_liste("STDDEV(X)", &[1, 2, 3, 4]), "1.118034");
    assert_eq!(sur_liste("STDDEV(X)", &[5, 5, 5]), "0");
}

#[test]
fn liste_en_texte() {
    let mut e = Expression::new("SUM(notes) / 2");
    e.where_str("notes", "1.5, 2.5, 4,");
    assert_eq!(e.eval().unwrap().unwrap().to_plain_string(), "4");
}

#[test]
fn liste_vide() {
    for f in ["MEAN", "VARIANCE", "STDDEV"] {
        let mut e = Expression::new(&format!("{f}(X)"));
        e.where_list("X", &[]);
        assert_eq!(
            e.eval().unwrap_err().to_string(),
            "Array length cannot be zero",
            "{f}"
        );
    }
}

#[test]
fn liste_inconnue() {
    let e = Expression::new("SUM(\"Y\")");
    assert_eq!(
        e.eval().unwrap_err().to_string(),
        "Unknown operator or function: Y"
    );
}

#[test]
fn element_illisible() {
    let mut e = Expression::new("SUM(X)");
    e.where_str("X", "1, deux, 3");
    assert!(e.eval().unwrap_err().is_expression());
}
